use crate::core::error::{Error, ErrorKind, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Encode single u64 value
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, ..., u64::MAX uses 10
    pub fn encode_u64(output: &mut Vec<u8>, mut value: u64) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // Set continuation bit
            value >>= 7;
        }
        output.push(value as u8);  // Last byte without continuation bit
    }

    /// Decode single u64 value, returns (value, bytes_consumed)
    pub fn decode_u64(input: &[u8]) -> Result<(u64, usize)> {
        let mut value = 0u64;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            let bits = (byte & 127) as u64;
            if shift == 63 && bits > 1 {
                return Err(Error::new(ErrorKind::Parse, "VByte overflow".to_string()));
            }
            value |= bits << shift;

            if byte & 128 == 0 {  // No continuation bit
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 63 {  // Max 10 bytes for u64
                return Err(Error::new(ErrorKind::Parse, "VByte overflow".to_string()));
            }
        }

        Err(Error::new(ErrorKind::Parse, "Incomplete VByte".to_string()))
    }
}

/// Cursor over a vbyte stream.
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let (value, consumed) = VByteEncoder::decode_u64(&self.data[self.pos..])?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| Error::new(ErrorKind::Parse, "Truncated byte run".to_string()))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_values_take_one_byte() {
        let mut out = Vec::new();
        VByteEncoder::encode_u64(&mut out, 127);
        assert_eq!(out, vec![127]);
    }

    #[test]
    fn max_value_survives() {
        let mut out = Vec::new();
        VByteEncoder::encode_u64(&mut out, u64::MAX);
        assert_eq!(out.len(), 10);
        assert_eq!(VByteEncoder::decode_u64(&out).unwrap(), (u64::MAX, 10));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let err = VByteEncoder::decode_u64(&[0x80, 0x80]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }

    #[test]
    fn overlong_input_is_rejected() {
        let bytes = [0xFF; 11];
        assert!(VByteEncoder::decode_u64(&bytes).is_err());
        let mut too_big = vec![0xFF; 9];
        too_big.push(0x02);
        assert!(VByteEncoder::decode_u64(&too_big).is_err());
    }
}
