//! Parse-transform-write pipeline for one record.
//!
//! A [`TransformPipeline`] processes exactly one record: it snapshots the
//! record's attributes into a [`ControlMap`], parses the content stream
//! with its [`RecordFormat`] (skipped for empty content), hands the parsed
//! value to the registered [`Transform`], resolves the transform's result
//! into a writable, serializes it into the sink, and reports the attribute
//! delta together with a transfer-or-drop decision.
//!
//! The pipeline never closes the streams it borrows; it flushes the sink
//! and leaves closing to the hosting runtime. Errors in any stage abort
//! before a delta exists, so the hosting runtime can never apply a partial
//! attribute update. The cleanup hook runs exactly once on every path.

use crate::attrs::{AttributeDelta, ControlMap};
use crate::error::{BoxError, PipelineError};
use crate::format::{FormatValue, RecordFormat};
use crate::text::Encoding;
use crate::tree::TreeValue;
use crate::writable::{StreamWritable, bytes_writable, text_writable, tree_writable};
use std::collections::HashMap;
use std::io::{Read, Write};
use tracing::debug;

/// Options recognized by the parse and write stages, fixed at pipeline
/// construction time.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Text encoding for decoding content and encoding output.
    pub encoding: Encoding,
    /// Pretty-print tree output.
    pub indent: bool,
    /// Lenient parsing, where the format supports it.
    pub relax: bool,
}

impl PipelineOptions {
    /// Build options from a flat string mapping with keys `encoding`,
    /// `indent`, and `relax`. Unrecognized keys are ignored so hosts can
    /// pass format-specific extras through.
    pub fn from_map(options: &HashMap<String, String>) -> Result<Self, PipelineError> {
        let mut result = Self::default();
        if let Some(label) = options.get("encoding") {
            result.encoding = Encoding::from_label(label)?;
        }
        if let Some(value) = options.get("indent") {
            result.indent = parse_bool("indent", value)?;
        }
        if let Some(value) = options.get("relax") {
            result.relax = parse_bool("relax", value)?;
        }
        Ok(result)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, PipelineError> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(PipelineError::InvalidOption(format!("{key}={value}"))),
    }
}

/// Structured result of the parse stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedValue {
    /// Content was empty; parse was never invoked.
    Null,
    /// A generic tree value.
    Tree(TreeValue),
    /// Decoded text.
    Text(String),
    /// Raw bytes, for pass-through pipelines.
    Raw(Vec<u8>),
}

impl ParsedValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParsedValue::Null)
    }

    pub fn into_tree(self) -> Option<TreeValue> {
        match self {
            ParsedValue::Tree(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            ParsedValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_raw(self) -> Option<Vec<u8>> {
        match self {
            ParsedValue::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// What a transform returned, tagged once at the point of return.
///
/// The variant decides the write strategy: `Empty` drops the record,
/// `Tree` goes through the tree writer, `Passthrough` copies bytes
/// verbatim, `Writable` serializes itself, `Text` is written under UTF-8,
/// and `Custom` is delegated to the format, which fails with
/// `UnsupportedResultType` if it does not recognize the value.
pub enum TransformResult {
    Empty,
    Tree(TreeValue),
    Text(String),
    Passthrough(Vec<u8>),
    Writable(Box<dyn StreamWritable>),
    Custom(Box<dyn FormatValue>),
}

impl TransformResult {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TransformResult::Empty => "empty",
            TransformResult::Tree(_) => "tree",
            TransformResult::Text(_) => "text",
            TransformResult::Passthrough(_) => "passthrough",
            TransformResult::Writable(_) => "writable",
            TransformResult::Custom(value) => value.type_name(),
        }
    }
}

/// User transform with its attribute requirement declared up front.
pub enum Transform<'a> {
    /// Transform that only looks at the parsed value.
    Value(Box<dyn FnOnce(ParsedValue) -> Result<TransformResult, BoxError> + 'a>),
    /// Transform that also reads and mutates the attribute map.
    WithAttributes(
        Box<dyn FnOnce(ParsedValue, &mut ControlMap) -> Result<TransformResult, BoxError> + 'a>,
    ),
}

impl<'a> Transform<'a> {
    pub fn value<F>(f: F) -> Self
    where
        F: FnOnce(ParsedValue) -> Result<TransformResult, BoxError> + 'a,
    {
        Transform::Value(Box::new(f))
    }

    pub fn with_attributes<F>(f: F) -> Self
    where
        F: FnOnce(ParsedValue, &mut ControlMap) -> Result<TransformResult, BoxError> + 'a,
    {
        Transform::WithAttributes(Box::new(f))
    }
}

/// Terminal decision for the processed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// A result was written; the hosting runtime should transfer the record.
    Transferred,
    /// The transform returned no result; the record should be dropped.
    Dropped,
}

/// What one pipeline run reports back to the hosting runtime.
#[derive(Debug)]
pub struct Outcome {
    pub decision: Decision,
    /// Attribute changes to apply: removed keys as a bulk removal,
    /// modified keys as upserts. Computed and reported even for dropped
    /// records.
    pub delta: AttributeDelta,
}

/// Processes one record from parse to a terminal decision.
pub struct TransformPipeline {
    format: Box<dyn RecordFormat>,
    options: PipelineOptions,
    on_finalize: Option<Box<dyn FnOnce()>>,
}

impl TransformPipeline {
    pub fn new(format: Box<dyn RecordFormat>, options: PipelineOptions) -> Self {
        Self {
            format,
            options,
            on_finalize: None,
        }
    }

    /// Register a cleanup hook, invoked exactly once when processing
    /// finishes, whether it succeeded, dropped the record, or failed.
    pub fn with_finalizer(mut self, hook: impl FnOnce() + 'static) -> Self {
        self.on_finalize = Some(Box::new(hook));
        self
    }

    /// Process one record.
    ///
    /// `content` and `sink` are borrowed for this single pass; the
    /// pipeline flushes the sink but leaves both streams open. On success
    /// the returned [`Outcome`] carries the attribute delta and the
    /// transfer-or-drop decision; on failure no delta is reported, so the
    /// record store stays untouched.
    pub fn process(
        mut self,
        content: &mut dyn Read,
        content_len: u64,
        sink: &mut dyn Write,
        attributes: &HashMap<String, String>,
        transform: Transform<'_>,
    ) -> Result<Outcome, PipelineError> {
        let result = self.run(content, content_len, sink, attributes, transform);
        if let Some(hook) = self.on_finalize.take() {
            hook();
        }
        result
    }

    fn run(
        &mut self,
        content: &mut dyn Read,
        content_len: u64,
        sink: &mut dyn Write,
        attributes: &HashMap<String, String>,
        transform: Transform<'_>,
    ) -> Result<Outcome, PipelineError> {
        let mut attrs = ControlMap::new(attributes);
        debug!(format = self.format.name(), content_len, "record accepted");

        // Parse is never invoked on empty content; the transform sees null.
        let parsed = if content_len == 0 {
            ParsedValue::Null
        } else {
            debug!("parsing");
            self.format.parse(content)?
        };

        debug!("transforming");
        let result = match transform {
            Transform::Value(f) => f(parsed),
            Transform::WithAttributes(f) => f(parsed, &mut attrs),
        }
        .map_err(PipelineError::Transform)?;

        debug!(result = result.kind_name(), "writing");
        let decision = match self.resolve(result)? {
            None => Decision::Dropped,
            Some(mut writable) => {
                writable.write_bytes(sink)?;
                sink.flush()?;
                Decision::Transferred
            }
        };

        let delta = attrs.into_delta();
        debug!(
            ?decision,
            removed = delta.removed.len(),
            upserts = delta.upserts.len(),
            "finalizing"
        );
        Ok(Outcome { decision, delta })
    }

    /// Resolution order for a transform result: an explicit writable wins,
    /// tree values go through the tree writer with the configured encoding
    /// and indent, raw bytes are copied verbatim, text is written under
    /// UTF-8, and format-specific values are delegated to the format.
    fn resolve(
        &self,
        result: TransformResult,
    ) -> Result<Option<Box<dyn StreamWritable>>, PipelineError> {
        match result {
            TransformResult::Empty => Ok(None),
            TransformResult::Writable(writable) => Ok(Some(writable)),
            TransformResult::Tree(value) => Ok(Some(tree_writable(
                value,
                self.options.encoding,
                self.options.indent,
            ))),
            TransformResult::Passthrough(bytes) => Ok(Some(bytes_writable(bytes))),
            TransformResult::Text(text) => Ok(Some(text_writable(text))),
            TransformResult::Custom(value) => self.format.writable(value).map(Some),
        }
    }
}
