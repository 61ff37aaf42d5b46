//! Error types for the transform pipeline.

use std::io;
use thiserror::Error;

/// Boxed error type used to carry user-supplied failure causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while processing a single record.
///
/// All variants are fatal for the record being processed: the pipeline
/// releases its resources, runs the cleanup hook, and re-raises to the
/// hosting runtime, which decides routing. Nothing is retried locally.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Content could not be read or parsed. Carries the original cause.
    #[error("parse failed: {0}")]
    Parse(#[source] BoxError),

    /// The user transform returned an error.
    #[error("transform failed: {0}")]
    Transform(#[source] BoxError),

    /// The transform returned a value no output strategy can serialize.
    #[error("unsupported transform result type: {type_name}")]
    UnsupportedResultType { type_name: String },

    /// A tree mapping was built with a null key.
    #[error("null as map key not supported")]
    UnsupportedKey,

    /// The requested text encoding is not available.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// No format with this name is registered.
    #[error("unknown format: {0}")]
    UnknownFormat(String),

    /// A writable implements neither `write_chars` nor `write_bytes`.
    #[error("writable implements neither character nor byte output")]
    CharWriterUnsupported,

    /// An option in the flat configuration mapping could not be parsed.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
