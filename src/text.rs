//! Text encodings and the encoding-aware character adapter.
//!
//! Output strategies that write character data do so through a
//! [`TextWriter`], which buffers encoded bytes over a borrowed byte sink.
//! The adapter flushes its own buffer and the sink, but never closes the
//! sink; closing stays with whoever owns the stream.

use crate::error::PipelineError;
use std::io::{self, Write};

/// Supported text encodings. The default is UTF-8.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    Latin1,
    Ascii,
}

impl Encoding {
    /// Resolve an encoding label such as `"UTF-8"` or `"iso-8859-1"`.
    pub fn from_label(label: &str) -> Result<Self, PipelineError> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            "us-ascii" | "ascii" => Ok(Self::Ascii),
            _ => Err(PipelineError::UnsupportedEncoding(label.to_string())),
        }
    }

    /// Canonical label for this encoding.
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Latin1 => "ISO-8859-1",
            Self::Ascii => "US-ASCII",
        }
    }

    /// Decode bytes into text, replacing unmappable input with U+FFFD.
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b < 0x80 { b as char } else { '\u{fffd}' })
                .collect(),
        }
    }
}

const BUFFER_LIMIT: usize = 8 * 1024;

/// Buffered, encoding-aware character adapter over a byte sink.
///
/// Characters the target encoding cannot represent are written as `?`.
pub struct TextWriter<'a> {
    out: &'a mut dyn Write,
    encoding: Encoding,
    buf: Vec<u8>,
}

impl<'a> TextWriter<'a> {
    pub fn new(out: &'a mut dyn Write, encoding: Encoding) -> Self {
        Self {
            out,
            encoding,
            buf: Vec::with_capacity(BUFFER_LIMIT),
        }
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn write_str(&mut self, s: &str) -> io::Result<()> {
        match self.encoding {
            Encoding::Utf8 => self.buf.extend_from_slice(s.as_bytes()),
            _ => {
                for c in s.chars() {
                    self.push_char(c);
                }
            }
        }
        self.spill()
    }

    pub fn write_char(&mut self, c: char) -> io::Result<()> {
        self.push_char(c);
        self.spill()
    }

    /// Drain the adapter's buffer and flush the underlying sink. The sink
    /// itself is left open.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.out.write_all(&self.buf)?;
            self.buf.clear();
        }
        self.out.flush()
    }

    fn push_char(&mut self, c: char) {
        match self.encoding {
            Encoding::Utf8 => {
                let mut utf8 = [0u8; 4];
                self.buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
            Encoding::Latin1 => {
                let code = c as u32;
                self.buf.push(if code < 0x100 { code as u8 } else { b'?' });
            }
            Encoding::Ascii => {
                let code = c as u32;
                self.buf.push(if code < 0x80 { code as u8 } else { b'?' });
            }
        }
    }

    fn spill(&mut self) -> io::Result<()> {
        if self.buf.len() >= BUFFER_LIMIT {
            self.out.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written(encoding: Encoding, text: &str) -> Vec<u8> {
        let mut sink = Vec::new();
        let mut writer = TextWriter::new(&mut sink, encoding);
        writer.write_str(text).unwrap();
        writer.flush().unwrap();
        sink
    }

    #[test]
    fn test_from_label_accepts_common_names() {
        assert_eq!(Encoding::from_label("UTF-8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::from_label("utf8").unwrap(), Encoding::Utf8);
        assert_eq!(Encoding::from_label("ISO-8859-1").unwrap(), Encoding::Latin1);
        assert_eq!(Encoding::from_label("ascii").unwrap(), Encoding::Ascii);
    }

    #[test]
    fn test_from_label_rejects_unknown() {
        let err = Encoding::from_label("ebcdic").unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedEncoding(ref name) if name == "ebcdic"));
    }

    #[test]
    fn test_utf8_roundtrip() {
        assert_eq!(written(Encoding::Utf8, "héllo ☃"), "héllo ☃".as_bytes());
    }

    #[test]
    fn test_latin1_maps_high_bytes() {
        assert_eq!(written(Encoding::Latin1, "héllo"), b"h\xe9llo");
        // unmappable characters become '?'
        assert_eq!(written(Encoding::Latin1, "☃"), b"?");
    }

    #[test]
    fn test_ascii_replaces_non_ascii() {
        assert_eq!(written(Encoding::Ascii, "héllo"), b"h?llo");
    }

    #[test]
    fn test_decode_latin1() {
        assert_eq!(Encoding::Latin1.decode(b"h\xe9llo"), "héllo");
    }

    #[test]
    fn test_decode_lossy_utf8() {
        assert_eq!(Encoding::Utf8.decode(b"ok\xff"), "ok\u{fffd}");
    }

    #[test]
    fn test_flush_leaves_sink_usable() {
        let mut sink = Vec::new();
        let mut writer = TextWriter::new(&mut sink, Encoding::Utf8);
        writer.write_str("ab").unwrap();
        writer.flush().unwrap();
        writer.write_char('c').unwrap();
        writer.flush().unwrap();
        assert_eq!(sink, b"abc");
    }
}
