use encoding_rs::{UTF_16LE, WINDOWS_1252};
use tracing::debug;

use crate::error::{Error, Result};

/// A position-tracking reader for parsing binary tablature data.
///
/// `InputStream` wraps a byte slice and maintains a current position,
/// allowing sequential reads of primitive types and the length-prefixed
/// string encodings used by the supported dialects. Reads past the end of
/// the buffer return [`Error::ReadPastEnd`]; decoders convert that to a
/// stage-named truncation error once per logical record.
///
/// # Example
///
/// ```
/// use fretwork_core::stream::InputStream;
///
/// let data = [0x78, 0x56, 0x34, 0x12];
/// let mut stream = InputStream::new(&data);
///
/// assert_eq!(stream.read_u32().unwrap(), 0x12345678);
/// assert_eq!(stream.position(), 4);
/// ```
pub struct InputStream<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> InputStream<'a> {
    /// Creates a new `InputStream` wrapping the given byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Returns the current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes remaining from the current position.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Sets the current read position.
    ///
    /// Used only between version detection and decoding; decoders never
    /// rewind mid-record.
    ///
    /// # Errors
    ///
    /// Returns an error if the position is beyond the buffer length.
    pub fn set_position(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::ReadPastEnd {
                position: pos,
                count: 0,
                length: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skips the specified number of bytes.
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.read_bytes(count)?;
        Ok(())
    }

    /// Reads the specified number of bytes and advances the position.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(count).ok_or(Error::ReadPastEnd {
            position: self.pos,
            count,
            length: self.data.len(),
        })?;

        if end > self.data.len() {
            return Err(Error::ReadPastEnd {
                position: self.pos,
                count,
                length: self.data.len(),
            });
        }

        let result = &self.data[self.pos..end];
        self.pos = end;
        Ok(result)
    }

    /// Reads an unsigned 8-bit integer and advances the position.
    pub fn read_u8(&mut self) -> Result<u8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0])
    }

    /// Reads a signed 8-bit integer and advances the position.
    pub fn read_i8(&mut self) -> Result<i8> {
        let bytes = self.read_bytes(1)?;
        Ok(bytes[0] as i8)
    }

    /// Reads an unsigned 16-bit integer (little-endian) and advances the position.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads an unsigned 32-bit integer (little-endian) and advances the position.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a signed 32-bit integer (little-endian) and advances the position.
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a bool stored as a single byte (zero = false).
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a plain byte string: u8 length followed by Windows-1252 bytes.
    pub fn read_byte_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        Ok(decode_windows_1252(bytes))
    }

    /// Reads a "long" string: u32 field length, u8 string length, then the
    /// string bytes plus any declared padding.
    ///
    /// The field length counts the length byte itself, so it must be at
    /// least `len + 1`; anything smaller is inconsistent data.
    pub fn read_long_string(&mut self) -> Result<String> {
        let field_len = self.read_u32()? as usize;
        let len = self.read_u8()? as usize;

        let padding = field_len
            .checked_sub(len + 1)
            .ok_or_else(|| {
                Error::inconsistent(
                    "string length",
                    format!("field length {field_len} shorter than string length {len}"),
                )
            })?;

        let bytes = self.read_bytes(len)?;
        let text = decode_windows_1252(bytes);
        self.skip(padding)?;
        Ok(text)
    }

    /// Reads a string stored in a fixed-size block: u8 length followed by
    /// exactly `block` bytes, of which the first `length` are significant.
    pub fn read_fixed_string(&mut self, block: usize) -> Result<String> {
        let len = self.read_u8()? as usize;
        if len > block {
            return Err(Error::inconsistent(
                "string length",
                format!("length {len} exceeds fixed block of {block} bytes"),
            ));
        }
        let bytes = self.read_bytes(block)?;
        Ok(decode_windows_1252(&bytes[..len]))
    }

    /// Reads a length-escaped string (u8 count, `0xFF` + u16 escape for
    /// longer strings) holding Windows-1252 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_escaped_length()?;
        let bytes = self.read_bytes(len)?;
        Ok(decode_windows_1252(bytes))
    }

    /// Reads a length-escaped wide string holding UTF-16LE code units.
    ///
    /// The length counts code units, not bytes.
    pub fn read_wide_string(&mut self) -> Result<String> {
        let units = self.read_escaped_length()?;
        let bytes = self.read_bytes(units * 2)?;
        let (decoded, _, had_errors) = UTF_16LE.decode(bytes);
        if had_errors {
            return Err(Error::Encoding(format!(
                "invalid UTF-16 sequence in {units}-unit string"
            )));
        }
        Ok(decoded.into_owned())
    }

    fn read_escaped_length(&mut self) -> Result<usize> {
        let short = self.read_u8()?;
        if short < 0xFF {
            Ok(short as usize)
        } else {
            Ok(self.read_u16()? as usize)
        }
    }
}

/// Decodes Windows-1252 bytes to a `String`.
///
/// Windows-1252 is total over all byte values aside from a handful of
/// undefined control slots; those decode to replacement characters and are
/// logged rather than treated as fatal.
pub fn decode_windows_1252(bytes: &[u8]) -> String {
    let (decoded, _, had_errors) = WINDOWS_1252.decode(bytes);
    if had_errors {
        debug!(
            "Windows-1252 decoding had errors for bytes: {:?}",
            &bytes[..bytes.len().min(20)]
        );
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_primitives() {
        let data = [
            0x2A, // u8
            0xFE, // i8: -2
            0x34, 0x12, // u16
            0x78, 0x56, 0x34, 0x12, // u32
            0xFF, 0xFF, 0xFF, 0xFF, // i32: -1
        ];
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_u8().unwrap(), 0x2A);
        assert_eq!(stream.read_i8().unwrap(), -2);
        assert_eq!(stream.read_u16().unwrap(), 0x1234);
        assert_eq!(stream.read_u32().unwrap(), 0x12345678);
        assert_eq!(stream.read_i32().unwrap(), -1);
        assert_eq!(stream.position(), 12);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_read_past_end() {
        let data = [0x01, 0x02];
        let mut stream = InputStream::new(&data);

        let result = stream.read_u32();
        assert!(matches!(result, Err(Error::ReadPastEnd { .. })));
    }

    #[test]
    fn test_read_byte_string() {
        let data = [0x03, b'a', b'b', b'c', 0xFF];
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_byte_string().unwrap(), "abc");
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_read_byte_string_windows_1252() {
        // 0xE9 is 'é' in Windows-1252
        let data = [0x04, b'c', b'a', b'f', 0xE9];
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_byte_string().unwrap(), "café");
    }

    #[test]
    fn test_read_long_string() {
        // field length 4 = length byte + 3 chars
        let data = [0x04, 0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o'];
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_long_string().unwrap(), "foo");
        assert_eq!(stream.position(), 8);
    }

    #[test]
    fn test_read_long_string_bad_field_length() {
        // field length 2 cannot hold a 3-char string
        let data = [0x02, 0x00, 0x00, 0x00, 0x03, b'f', b'o', b'o'];
        let mut stream = InputStream::new(&data);

        let result = stream.read_long_string();
        assert!(matches!(result, Err(Error::InconsistentData { .. })));
    }

    #[test]
    fn test_read_fixed_string() {
        let mut data = vec![0x02, b'h', b'i'];
        data.resize(1 + 8, 0);
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_fixed_string(8).unwrap(), "hi");
        assert_eq!(stream.position(), 9);
    }

    #[test]
    fn test_read_fixed_string_overlong() {
        let data = [0x09, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut stream = InputStream::new(&data);

        let result = stream.read_fixed_string(8);
        assert!(matches!(result, Err(Error::InconsistentData { .. })));
    }

    #[test]
    fn test_read_wide_string() {
        let data = [0x02, b'h', 0x00, b'i', 0x00];
        let mut stream = InputStream::new(&data);

        assert_eq!(stream.read_wide_string().unwrap(), "hi");
    }

    #[test]
    fn test_read_string_escaped_length() {
        let mut data = vec![0xFF, 0x00, 0x01]; // escape: u16 length 256
        data.extend(std::iter::repeat_n(b'x', 256));
        let mut stream = InputStream::new(&data);

        let text = stream.read_string().unwrap();
        assert_eq!(text.len(), 256);
    }

    #[test]
    fn test_set_position() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut stream = InputStream::new(&data);

        stream.set_position(2).unwrap();
        assert_eq!(stream.read_u16().unwrap(), 0x0403);
        assert!(stream.set_position(10).is_err());
    }
}
