//! Output strategies: values that know how to serialize themselves.
//!
//! A [`StreamWritable`] can be implemented in one of two styles: character
//! oriented ([`StreamWritable::write_chars`]) or byte oriented
//! ([`StreamWritable::write_bytes`]). The byte style has a default that
//! wraps the sink in an encoding-aware [`TextWriter`], delegates to the
//! character style, and flushes, so a concrete type only overrides one of
//! the two.

use crate::error::PipelineError;
use crate::text::{Encoding, TextWriter};
use crate::tree::TreeValue;
use crate::tree_writer::write_tree;
use std::io::{self, Write};

/// A value-to-bytes adapter, consumed exactly once by the write stage.
pub trait StreamWritable {
    /// Text encoding used when bridging character output to bytes.
    fn encoding(&self) -> Encoding {
        Encoding::Utf8
    }

    /// Character-stream style. Implement this when the output is text.
    fn write_chars(&mut self, out: &mut TextWriter<'_>) -> Result<(), PipelineError> {
        let _ = out;
        Err(PipelineError::CharWriterUnsupported)
    }

    /// Byte-stream style. The default wraps `out` in a buffered
    /// [`TextWriter`] with this writable's encoding, calls
    /// [`write_chars`](Self::write_chars), and flushes. The underlying sink
    /// stays open.
    fn write_bytes(&mut self, out: &mut dyn Write) -> Result<(), PipelineError> {
        let mut writer = TextWriter::new(out, self.encoding());
        self.write_chars(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Writable built from a character-writing closure.
///
/// ```
/// use recordflow::{StreamWritable, as_writer, Encoding};
///
/// let mut writable = as_writer(Encoding::Utf8, |out| out.write_str("hello"));
/// let mut sink = Vec::new();
/// writable.write_bytes(&mut sink).unwrap();
/// assert_eq!(sink, b"hello");
/// ```
pub fn as_writer<F>(encoding: Encoding, write: F) -> Box<dyn StreamWritable>
where
    F: FnOnce(&mut TextWriter<'_>) -> io::Result<()> + 'static,
{
    Box::new(CharFn {
        encoding,
        write: Some(write),
    })
}

/// Writable built from a byte-writing closure, for binary content or to
/// avoid a character round-trip.
pub fn as_stream<F>(write: F) -> Box<dyn StreamWritable>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()> + 'static,
{
    Box::new(ByteFn { write: Some(write) })
}

/// Default writable for a tree value: renders through the tree writer.
pub fn tree_writable(value: TreeValue, encoding: Encoding, indent: bool) -> Box<dyn StreamWritable> {
    Box::new(TreeWritable {
        value,
        encoding,
        indent,
    })
}

/// Writable that copies bytes verbatim.
pub fn bytes_writable(bytes: Vec<u8>) -> Box<dyn StreamWritable> {
    Box::new(BytesWritable { bytes })
}

/// Writable that writes text verbatim under UTF-8.
pub fn text_writable(text: String) -> Box<dyn StreamWritable> {
    Box::new(TextValueWritable { text })
}

struct CharFn<F> {
    encoding: Encoding,
    write: Option<F>,
}

impl<F> StreamWritable for CharFn<F>
where
    F: FnOnce(&mut TextWriter<'_>) -> io::Result<()>,
{
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn write_chars(&mut self, out: &mut TextWriter<'_>) -> Result<(), PipelineError> {
        if let Some(write) = self.write.take() {
            write(out)?;
        }
        Ok(())
    }
}

struct ByteFn<F> {
    write: Option<F>,
}

impl<F> StreamWritable for ByteFn<F>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    fn write_bytes(&mut self, out: &mut dyn Write) -> Result<(), PipelineError> {
        if let Some(write) = self.write.take() {
            write(out)?;
        }
        Ok(())
    }
}

struct TreeWritable {
    value: TreeValue,
    encoding: Encoding,
    indent: bool,
}

impl StreamWritable for TreeWritable {
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn write_chars(&mut self, out: &mut TextWriter<'_>) -> Result<(), PipelineError> {
        write_tree(&self.value, out, if self.indent { 0 } else { -1 })
    }
}

struct BytesWritable {
    bytes: Vec<u8>,
}

impl StreamWritable for BytesWritable {
    fn write_bytes(&mut self, out: &mut dyn Write) -> Result<(), PipelineError> {
        out.write_all(&self.bytes)?;
        Ok(())
    }
}

struct TextValueWritable {
    text: String,
}

impl StreamWritable for TextValueWritable {
    fn write_chars(&mut self, out: &mut TextWriter<'_>) -> Result<(), PipelineError> {
        out.write_str(&self.text)?;
        Ok(())
    }
}
