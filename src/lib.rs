//! # recordflow
//!
//! A parse-transform-write pipeline for single-record processing.
//!
//! One record is a byte stream plus a string-keyed attribute set, both
//! owned by a hosting runtime. The pipeline parses the content into a
//! structured value, applies a user transform, serializes the result back
//! into the runtime's sink, and reports exactly which attributes the
//! transform added, changed, or removed so the runtime applies only the
//! delta.
//!
//! ## Overview
//!
//! Processing one record involves:
//! - **Attribute tracking**: the attribute snapshot is wrapped in a
//!   [`ControlMap`] that records modified and removed keys.
//! - **Parsing**: a [`RecordFormat`] (looked up by name in a
//!   [`FormatRegistry`]) turns the content stream into a [`ParsedValue`];
//!   empty content skips parsing entirely.
//! - **Transforming**: a [`Transform`] maps the parsed value (and
//!   optionally the attributes) to a [`TransformResult`].
//! - **Writing**: the result resolves to a [`StreamWritable`] (tree
//!   values render through the indenting tree writer) and is serialized
//!   into the sink.
//! - **Finalizing**: the pipeline reports an [`Outcome`] with the
//!   attribute delta and a transfer-or-drop [`Decision`].
//!
//! ## Example
//!
//! ```
//! use recordflow::{
//!     Decision, FormatRegistry, PipelineOptions, Transform, TransformPipeline,
//!     TransformResult, TreeValue,
//! };
//! use std::collections::HashMap;
//!
//! let options = PipelineOptions::default();
//! let registry = FormatRegistry::with_builtins();
//! let format = registry.create("json", &options).unwrap();
//!
//! let content = br#"{"name":"ada","age":36}"#;
//! let mut input = &content[..];
//! let mut sink = Vec::new();
//! let attributes = HashMap::new();
//!
//! let outcome = TransformPipeline::new(format, options)
//!     .process(
//!         &mut input,
//!         content.len() as u64,
//!         &mut sink,
//!         &attributes,
//!         Transform::with_attributes(|parsed, attrs| {
//!             let mut tree = parsed.into_tree().expect("json parses to a tree");
//!             if let TreeValue::Map(entries) = &mut tree {
//!                 entries.insert("checked".to_string(), TreeValue::Bool(true));
//!             }
//!             attrs.set("content.kind", Some("json"));
//!             Ok(TransformResult::Tree(tree))
//!         }),
//!     )
//!     .unwrap();
//!
//! assert_eq!(outcome.decision, Decision::Transferred);
//! assert_eq!(sink, br#"{"name":"ada","age":36,"checked":true}"#);
//! assert!(outcome.delta.upserts.contains_key("content.kind"));
//! ```

pub mod attrs;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod text;
pub mod tree;
pub mod tree_writer;
pub mod writable;

pub use attrs::{AttributeDelta, ControlMap};
pub use error::{BoxError, PipelineError};
pub use format::{
    FormatFactory, FormatRegistry, FormatValue, JsonFormat, RawFormat, RecordFormat, TextFormat,
};
pub use pipeline::{
    Decision, Outcome, ParsedValue, PipelineOptions, Transform, TransformPipeline, TransformResult,
};
pub use text::{Encoding, TextWriter};
pub use tree::TreeValue;
pub use tree_writer::{TreeWriter, write_document, write_tree};
pub use writable::{
    StreamWritable, as_stream, as_writer, bytes_writable, text_writable, tree_writable,
};
