//! Record formats and the format registry.
//!
//! A [`RecordFormat`] supplies the parse stage for one kind of record
//! content and may resolve format-specific transform results into
//! writables. Formats are registered by name in an explicit
//! [`FormatRegistry`] table and created from the pipeline options.

use crate::error::PipelineError;
use crate::pipeline::{ParsedValue, PipelineOptions};
use crate::text::Encoding;
use crate::writable::StreamWritable;
use std::any::Any;
use std::collections::HashMap;
use std::io::Read;

/// A format-specific structured value (for example a DOM-like node) that
/// only the owning format knows how to serialize.
pub trait FormatValue: Any {
    /// Reported type name, used in `UnsupportedResultType` errors.
    fn type_name(&self) -> &'static str;

    fn as_any(self: Box<Self>) -> Box<dyn Any>;
}

/// Parse and output behavior for one record content format.
pub trait RecordFormat {
    fn name(&self) -> &'static str;

    /// Parse the record's content stream into a structured value. Never
    /// called for zero-length content.
    fn parse(&self, input: &mut dyn Read) -> Result<ParsedValue, PipelineError>;

    /// Resolve a format-specific transform result into a writable.
    ///
    /// The default recognizes nothing and fails with the value's reported
    /// type name.
    fn writable(
        &self,
        value: Box<dyn FormatValue>,
    ) -> Result<Box<dyn StreamWritable>, PipelineError> {
        Err(PipelineError::UnsupportedResultType {
            type_name: value.type_name().to_string(),
        })
    }
}

/// JSON content: parsed with serde_json into a tree value.
///
/// With `relax` enabled, framing is lenient: the first JSON document is
/// taken and trailing content is ignored. A leading byte-order mark is
/// tolerated in both modes.
pub struct JsonFormat {
    encoding: Encoding,
    relax: bool,
}

impl JsonFormat {
    pub fn new(options: &PipelineOptions) -> Self {
        Self {
            encoding: options.encoding,
            relax: options.relax,
        }
    }
}

impl RecordFormat for JsonFormat {
    fn name(&self) -> &'static str {
        "json"
    }

    fn parse(&self, input: &mut dyn Read) -> Result<ParsedValue, PipelineError> {
        let text = read_text(input, self.encoding)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
        let value: serde_json::Value = if self.relax {
            let mut stream =
                serde_json::Deserializer::from_str(text).into_iter::<serde_json::Value>();
            match stream.next() {
                Some(value) => value.map_err(|e| PipelineError::Parse(Box::new(e)))?,
                None => return Err(PipelineError::Parse("no json document in content".into())),
            }
        } else {
            serde_json::from_str(text).map_err(|e| PipelineError::Parse(Box::new(e)))?
        };
        Ok(ParsedValue::Tree(value.into()))
    }
}

/// Plain text content: decoded to a string with the configured encoding.
pub struct TextFormat {
    encoding: Encoding,
}

impl TextFormat {
    pub fn new(options: &PipelineOptions) -> Self {
        Self {
            encoding: options.encoding,
        }
    }
}

impl RecordFormat for TextFormat {
    fn name(&self) -> &'static str {
        "text"
    }

    fn parse(&self, input: &mut dyn Read) -> Result<ParsedValue, PipelineError> {
        Ok(ParsedValue::Text(read_text(input, self.encoding)?))
    }
}

/// Opaque content: bytes pass through unparsed.
pub struct RawFormat;

impl RecordFormat for RawFormat {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn parse(&self, input: &mut dyn Read) -> Result<ParsedValue, PipelineError> {
        Ok(ParsedValue::Raw(read_bytes(input)?))
    }
}

fn read_bytes(input: &mut dyn Read) -> Result<Vec<u8>, PipelineError> {
    let mut bytes = Vec::new();
    input
        .read_to_end(&mut bytes)
        .map_err(|e| PipelineError::Parse(Box::new(e)))?;
    Ok(bytes)
}

fn read_text(input: &mut dyn Read, encoding: Encoding) -> Result<String, PipelineError> {
    Ok(encoding.decode(&read_bytes(input)?))
}

/// Factory that builds a format from the pipeline options.
pub type FormatFactory =
    Box<dyn Fn(&PipelineOptions) -> Result<Box<dyn RecordFormat>, PipelineError> + Send + Sync>;

/// Explicit name-to-factory table of available formats.
pub struct FormatRegistry {
    factories: HashMap<String, FormatFactory>,
}

impl FormatRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry with the built-in `json`, `text`, and `raw` formats.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("json", Box::new(|o| Ok(Box::new(JsonFormat::new(o)))));
        registry.register("text", Box::new(|o| Ok(Box::new(TextFormat::new(o)))));
        registry.register("raw", Box::new(|_| Ok(Box::new(RawFormat))));
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, factory: FormatFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Build the named format from the given options.
    pub fn create(
        &self,
        name: &str,
        options: &PipelineOptions,
    ) -> Result<Box<dyn RecordFormat>, PipelineError> {
        match self.factories.get(name) {
            Some(factory) => factory(options),
            None => Err(PipelineError::UnknownFormat(name.to_string())),
        }
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
