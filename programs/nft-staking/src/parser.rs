use crate::error::DecodeError;
use anchor_lang::prelude::Pubkey;
use arrayref::array_ref;

pub const DISCRIMINATOR_LEN: usize = 8;

/// Cursor over raw account bytes. Every read is bounds checked and little-endian.
#[derive(Debug, Clone)]
pub struct BufferParser<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> BufferParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Verifies the leading discriminator byte for byte and returns a parser
    /// positioned right after it.
    pub fn from_account_data(
        data: &'a [u8],
        expected: &[u8; DISCRIMINATOR_LEN],
        account: &'static str,
    ) -> Result<Self, DecodeError> {
        if data.len() < DISCRIMINATOR_LEN {
            return Err(DecodeError::AccountTooShort {
                account,
                min: DISCRIMINATOR_LEN,
                len: data.len(),
            });
        }
        let found = array_ref![data, 0, DISCRIMINATOR_LEN];
        if found != expected {
            return Err(DecodeError::DiscriminatorMismatch {
                account,
                expected: *expected,
                found: found.to_vec(),
            });
        }
        Ok(Self {
            data,
            offset: DISCRIMINATOR_LEN,
        })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn has_remaining(&self) -> bool {
        self.offset < self.data.len()
    }

    fn take(&mut self, size: usize) -> Result<&'a [u8], DecodeError> {
        let end = self
            .offset
            .checked_add(size)
            .filter(|end| *end <= self.data.len())
            .ok_or(DecodeError::BufferTooSmall {
                needed: size,
                offset: self.offset,
                len: self.data.len(),
            })?;
        let bytes = &self.data[self.offset..end];
        self.offset = end;
        Ok(bytes)
    }

    pub fn parse_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.take(1)?[0])
    }

    pub fn parse_u16(&mut self) -> Result<u16, DecodeError> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes(*array_ref![bytes, 0, 2]))
    }

    pub fn parse_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(*array_ref![bytes, 0, 4]))
    }

    pub fn parse_u64(&mut self) -> Result<u64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(*array_ref![bytes, 0, 8]))
    }

    pub fn parse_i64(&mut self) -> Result<i64, DecodeError> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(*array_ref![bytes, 0, 8]))
    }

    /// Reads a u64 and widens it to `f64`. Values above 2^53 lose precision.
    pub fn parse_u64_lossy(&mut self) -> Result<f64, DecodeError> {
        Ok(self.parse_u64()? as f64)
    }

    pub fn parse_bool(&mut self) -> Result<bool, DecodeError> {
        Ok(self.parse_u8()? != 0)
    }

    pub fn parse_pubkey(&mut self) -> Result<Pubkey, DecodeError> {
        let bytes = self.take(32)?;
        Ok(Pubkey::new_from_array(*array_ref![bytes, 0, 32]))
    }

    pub fn parse_bytes(&mut self, size: usize) -> Result<&'a [u8], DecodeError> {
        self.take(size)
    }

    /// Reads a `size`-byte field and keeps the bytes before the first NUL.
    /// The cursor always advances by `size`.
    pub fn parse_fixed_string(&mut self, size: usize) -> Result<String, DecodeError> {
        let start = self.offset;
        let bytes = self.take(size)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(size);
        String::from_utf8(bytes[..end].to_vec())
            .map_err(|_| DecodeError::InvalidUtf8 { offset: start })
    }

    /// Reads a u32 length followed by that many UTF-8 bytes.
    pub fn parse_string(&mut self) -> Result<String, DecodeError> {
        let len = self.parse_u32()? as usize;
        let start = self.offset;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { offset: start })
    }

    /// Reads a trailing field that older account versions may not have.
    /// Falls back to `default` when no bytes remain or the read fails.
    pub fn parse_optional<T>(
        &mut self,
        default: T,
        read: impl FnOnce(&mut Self) -> Result<T, DecodeError>,
    ) -> T {
        if !self.has_remaining() {
            return default;
        }
        let checkpoint = self.offset;
        match read(self) {
            Ok(value) => value,
            Err(_) => {
                self.offset = checkpoint;
                default
            }
        }
    }
}

/// Checks the generic envelope of an account buffer before any field is read.
pub fn validate_account_data(
    data: &[u8],
    expected: &[u8; DISCRIMINATOR_LEN],
    account: &'static str,
    min_len: usize,
) -> Result<(), DecodeError> {
    BufferParser::from_account_data(data, expected, account)?;
    if data.len() < min_len {
        return Err(DecodeError::AccountTooShort {
            account,
            min: min_len,
            len: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISC: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];

    #[test]
    fn reads_little_endian_primitives() {
        let mut data = vec![0xab];
        data.extend_from_slice(&0x1234u16.to_le_bytes());
        data.extend_from_slice(&0xdead_beefu32.to_le_bytes());
        data.extend_from_slice(&u64::MAX.to_le_bytes());
        data.extend_from_slice(&(-42i64).to_le_bytes());
        data.push(1);

        let mut parser = BufferParser::new(&data);
        assert_eq!(parser.parse_u8().unwrap(), 0xab);
        assert_eq!(parser.parse_u16().unwrap(), 0x1234);
        assert_eq!(parser.parse_u32().unwrap(), 0xdead_beef);
        assert_eq!(parser.parse_u64().unwrap(), u64::MAX);
        assert_eq!(parser.parse_i64().unwrap(), -42);
        assert!(parser.parse_bool().unwrap());
        assert!(!parser.has_remaining());
    }

    #[test]
    fn u64_keeps_full_precision() {
        let value = (1u64 << 53) + 1;
        let bytes = value.to_le_bytes();
        assert_eq!(BufferParser::new(&bytes).parse_u64().unwrap(), value);
        assert_eq!(
            BufferParser::new(&bytes).parse_u64_lossy().unwrap(),
            (1u64 << 53) as f64
        );
    }

    #[test]
    fn out_of_bounds_reports_size_and_offset() {
        let data = [0u8; 10];
        let mut parser = BufferParser::new(&data);
        parser.parse_u64().unwrap();
        let err = parser.parse_u32().unwrap_err();
        assert_eq!(
            err,
            DecodeError::BufferTooSmall {
                needed: 4,
                offset: 8,
                len: 10
            }
        );
        // failed reads leave the cursor untouched
        assert_eq!(parser.offset(), 8);
    }

    #[test]
    fn raw_bytes_borrow_from_the_buffer() {
        let data = [1u8, 2, 3, 4, 5];
        let mut parser = BufferParser::new(&data);
        assert_eq!(parser.parse_bytes(3).unwrap(), &[1, 2, 3]);
        assert_eq!(parser.offset(), 3);
        assert_eq!(parser.parse_bytes(0).unwrap(), &[] as &[u8]);
        assert_eq!(
            parser.parse_bytes(3).unwrap_err(),
            DecodeError::BufferTooSmall {
                needed: 3,
                offset: 3,
                len: 5
            }
        );
        assert_eq!(parser.offset(), 3);
        assert_eq!(
            parser.parse_bytes(usize::MAX).unwrap_err(),
            DecodeError::BufferTooSmall {
                needed: usize::MAX,
                offset: 3,
                len: 5
            }
        );
        assert_eq!(parser.parse_bytes(2).unwrap(), &[4, 5]);
        assert!(!parser.has_remaining());
    }

    #[test]
    fn fixed_string_stops_at_nul_but_advances_full_width() {
        let mut data = b"QmHash".to_vec();
        data.resize(10, 0);
        data.push(7);
        let mut parser = BufferParser::new(&data);
        assert_eq!(parser.parse_fixed_string(10).unwrap(), "QmHash");
        assert_eq!(parser.offset(), 10);
        assert_eq!(parser.parse_u8().unwrap(), 7);

        let full = b"abcd";
        assert_eq!(BufferParser::new(full).parse_fixed_string(4).unwrap(), "abcd");
    }

    #[test]
    fn length_prefixed_string() {
        let mut data = 5u32.to_le_bytes().to_vec();
        data.extend_from_slice(b"hello");
        let mut parser = BufferParser::new(&data);
        assert_eq!(parser.parse_string().unwrap(), "hello");

        let mut truncated = 50u32.to_le_bytes().to_vec();
        truncated.extend_from_slice(b"short");
        assert!(matches!(
            BufferParser::new(&truncated).parse_string(),
            Err(DecodeError::BufferTooSmall { needed: 50, offset: 4, .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&[0xff, 0xfe]);
        assert_eq!(
            BufferParser::new(&data).parse_string(),
            Err(DecodeError::InvalidUtf8 { offset: 4 })
        );
    }

    #[test]
    fn from_account_data_requires_exact_discriminator() {
        let mut data = DISC.to_vec();
        data.extend_from_slice(&[9; 4]);
        let parser = BufferParser::from_account_data(&data, &DISC, "Test").unwrap();
        assert_eq!(parser.offset(), 8);

        data[7] = 0;
        let err = BufferParser::from_account_data(&data, &DISC, "Test").unwrap_err();
        assert!(matches!(err, DecodeError::DiscriminatorMismatch { account: "Test", .. }));

        let err = BufferParser::from_account_data(&DISC[..4], &DISC, "Test").unwrap_err();
        assert!(matches!(err, DecodeError::AccountTooShort { min: 8, len: 4, .. }));
    }

    #[test]
    fn validate_checks_min_len_after_discriminator() {
        let data = DISC.to_vec();
        assert!(validate_account_data(&data, &DISC, "Test", 8).is_ok());
        assert!(matches!(
            validate_account_data(&data, &DISC, "Test", 16),
            Err(DecodeError::AccountTooShort { min: 16, len: 8, .. })
        ));
    }

    #[test]
    fn optional_falls_back_without_consuming() {
        let data = [1u8, 2, 3];
        let mut parser = BufferParser::new(&data);
        assert_eq!(parser.parse_optional(99, |p| p.parse_u64()), 99);
        assert_eq!(parser.offset(), 0);
        assert_eq!(parser.parse_optional(0, |p| p.parse_u8()), 1);

        let mut exhausted = BufferParser::new(&[]);
        assert_eq!(exhausted.parse_optional(5u8, |p| p.parse_u8()), 5);
    }
}
