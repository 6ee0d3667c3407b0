use super::{RawSignature, SCALAR_LENGTH};
use crate::FormatError;

const SEQUENCE_TAG: u8 = 0x30;
const INTEGER_TAG: u8 = 0x02;
const LONG_FORM_ONE_BYTE: u8 = 0x81;

/// Decode an ASN.1 DER ECDSA signature into its fixed-width `r || s` form.
///
/// ```text
/// 30 <len> 02 <len_r> <r...> 02 <len_s> <s...>
/// ```
///
/// A sign-padding `0x00` in front of a scalar is dropped, scalars shorter
/// than 32 bytes are left-padded with zeros and longer ones keep their low
/// 32 bytes.
///
/// # Errors
///
/// [`FormatError::MalformedSignature`] when the outer tag is not `0x30`, an
/// INTEGER tag is missing where one is expected, or any declared length runs
/// past the end of the input. [`FormatError::InvalidSignatureFormat`] when
/// bytes are left over after `s` or after the SEQUENCE, with `expected` the
/// length the encoding accounts for.
pub fn der_to_raw(der: &[u8]) -> Result<RawSignature, FormatError> {
    let mut outer = DerReader::new(der);
    outer.expect_tag(SEQUENCE_TAG, "SEQUENCE")?;
    let sequence_length = outer.read_length()?;
    let body = outer.take(sequence_length, "SEQUENCE body")?;

    let header_length = outer.offset - sequence_length;
    if outer.offset != der.len() {
        return Err(FormatError::InvalidSignatureFormat {
            expected: outer.offset,
            actual: der.len(),
        });
    }

    let mut inner = DerReader::new(body);
    let r = inner.read_integer("r")?;
    let s = inner.read_integer("s")?;
    if inner.offset != body.len() {
        return Err(FormatError::InvalidSignatureFormat {
            expected: header_length + inner.offset,
            actual: der.len(),
        });
    }

    Ok(RawSignature::from_scalars(
        to_fixed_width(r),
        to_fixed_width(s),
    ))
}

fn to_fixed_width(value: &[u8]) -> [u8; SCALAR_LENGTH] {
    let value = match value {
        [0x00, rest @ ..] if value.len() == SCALAR_LENGTH + 1 => rest,
        _ => value,
    };
    let mut scalar = [0u8; SCALAR_LENGTH];
    if value.len() >= SCALAR_LENGTH {
        scalar.copy_from_slice(&value[value.len() - SCALAR_LENGTH..]);
    } else {
        scalar[SCALAR_LENGTH - value.len()..].copy_from_slice(value);
    }
    scalar
}

struct DerReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> DerReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn read_byte(&mut self, what: &str) -> Result<u8, FormatError> {
        let byte = self.bytes.get(self.offset).copied().ok_or_else(|| {
            FormatError::malformed(format!(
                "unexpected end of input reading {what} at offset {}",
                self.offset
            ))
        })?;
        self.offset += 1;
        Ok(byte)
    }

    fn expect_tag(&mut self, tag: u8, what: &str) -> Result<(), FormatError> {
        let offset = self.offset;
        let found = self.read_byte(what)?;
        if found != tag {
            return Err(FormatError::malformed(format!(
                "expected {what} tag {tag:#04x} at offset {offset}, found {found:#04x}"
            )));
        }
        Ok(())
    }

    fn read_length(&mut self) -> Result<usize, FormatError> {
        match self.read_byte("length")? {
            short if short < 0x80 => Ok(short as usize),
            LONG_FORM_ONE_BYTE => Ok(self.read_byte("length")? as usize),
            other => Err(FormatError::malformed(format!(
                "unsupported length encoding {other:#04x} at offset {}",
                self.offset - 1
            ))),
        }
    }

    fn take(&mut self, length: usize, what: &str) -> Result<&'a [u8], FormatError> {
        let end = self
            .offset
            .checked_add(length)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| {
                FormatError::malformed(format!(
                    "{what} declares {length} bytes at offset {} but only {} remain",
                    self.offset,
                    self.bytes.len() - self.offset
                ))
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn read_integer(&mut self, name: &str) -> Result<&'a [u8], FormatError> {
        self.expect_tag(INTEGER_TAG, &format!("INTEGER {name}"))?;
        let length = self.read_length()?;
        if length == 0 {
            return Err(FormatError::malformed(format!("INTEGER {name} is empty")));
        }
        self.take(length, &format!("INTEGER {name}"))
    }
}
