use crate::{DecodeError, Pubkey};

/// A bounds-checked cursor over account data.
///
/// Every read names the field it is for, so a short buffer reports exactly
/// which field did not fit and how many bytes were missing.
pub struct AccountReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> AccountReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current position from the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Take the next `length` bytes.
    pub fn take(&mut self, length: usize, field: &'static str) -> Result<&'a [u8], DecodeError> {
        if length > self.remaining() {
            return Err(DecodeError::CorruptAccountData {
                field,
                needed: length,
                available: self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + length];
        self.offset += length;
        Ok(slice)
    }

    pub fn skip(&mut self, length: usize, field: &'static str) -> Result<(), DecodeError> {
        self.take(length, field).map(|_| ())
    }

    pub fn read_array<const N: usize>(
        &mut self,
        field: &'static str,
    ) -> Result<[u8; N], DecodeError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N, field)?);
        Ok(array)
    }

    pub fn read_u8(&mut self, field: &'static str) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>(field)?[0])
    }

    pub fn read_u32(&mut self, field: &'static str) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_u64(&mut self, field: &'static str) -> Result<u64, DecodeError> {
        Ok(u64::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_i64(&mut self, field: &'static str) -> Result<i64, DecodeError> {
        Ok(i64::from_le_bytes(self.read_array(field)?))
    }

    pub fn read_pubkey(&mut self, field: &'static str) -> Result<Pubkey, DecodeError> {
        Ok(Pubkey::new_from_array(self.read_array(field)?))
    }

    /// A `u32` length prefix followed by that many bytes.
    pub fn read_bytes(&mut self, field: &'static str) -> Result<&'a [u8], DecodeError> {
        let length = self.read_u32(field)? as usize;
        self.take(length, field)
    }

    /// A `u32` length prefix followed by that many UTF-8 bytes.
    pub fn read_string(&mut self, field: &'static str) -> Result<String, DecodeError> {
        let bytes = self.read_bytes(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { field })
    }
}
