use std::io::Write;

use encoding_rs::WINDOWS_1252;
use tracing::debug;

use crate::error::{Error, Result};

/// A primitive writer over any byte sink.
///
/// Mirrors [`InputStream`](super::InputStream): little-endian fixed-width
/// integers plus the length-escaped string conventions of the native
/// container. Sink failures surface as [`Error::StreamWrite`] and the
/// caller aborts on the first one; nothing is retried.
pub struct OutputStream<W: Write> {
    sink: W,
    written: u64,
}

impl<W: Write> OutputStream<W> {
    pub fn new(sink: W) -> Self {
        Self { sink, written: 0 }
    }

    /// Returns the number of bytes written so far.
    pub fn position(&self) -> u64 {
        self.written
    }

    /// Consumes the stream, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.sink
            .write_all(bytes)
            .map_err(|e| Error::StreamWrite(e.to_string()))?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&[value as u8])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    /// Writes a length-escaped Windows-1252 string: u8 byte count, with
    /// `0xFF` + u16 escape for counts of 255 and above.
    ///
    /// Characters outside Windows-1252 are replaced and logged; legacy
    /// readers of this family have no way to represent them.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        let (encoded, _, had_errors) = WINDOWS_1252.encode(text);
        if had_errors {
            debug!("string {text:?} contains characters outside Windows-1252");
        }
        self.write_escaped_length(encoded.len())?;
        self.write_bytes(&encoded)
    }

    /// Writes a length-escaped wide string as UTF-16LE code units.
    ///
    /// The length counts code units, not bytes.
    pub fn write_wide_string(&mut self, text: &str) -> Result<()> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.write_escaped_length(units.len())?;
        for unit in units {
            self.write_u16(unit)?;
        }
        Ok(())
    }

    fn write_escaped_length(&mut self, len: usize) -> Result<()> {
        if len < 0xFF {
            self.write_u8(len as u8)
        } else {
            let len = u16::try_from(len).map_err(|_| {
                Error::inconsistent("string length", format!("{len} exceeds u16 escape"))
            })?;
            self.write_u8(0xFF)?;
            self.write_u16(len)
        }
    }
}
