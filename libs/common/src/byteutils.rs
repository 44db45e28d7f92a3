use std::fmt;

/// Value does not fit a fixed-width word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteUtilsError {
    pub len: usize,
    pub max: usize,
}

impl fmt::Display for ByteUtilsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cannot convert byte array of length {} to a {}-byte word",
            self.len, self.max
        )
    }
}

impl std::error::Error for ByteUtilsError {}

/// Left-pads a big-endian magnitude into a 32-byte word.
///
/// Leading zero bytes are not significant and are dropped before the width
/// check, so a zero-padded 33-byte encoding of a 256-bit value still fits.
pub fn bytes_to_32_byte(bytes: &[u8]) -> Result<[u8; 32], ByteUtilsError> {
    let first_significant = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    let magnitude = &bytes[first_significant..];

    if magnitude.len() > 32 {
        return Err(ByteUtilsError {
            len: magnitude.len(),
            max: 32,
        });
    }

    let mut word = [0u8; 32];
    word[32 - magnitude.len()..].copy_from_slice(magnitude);
    Ok(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_value_is_left_padded() {
        let word = bytes_to_32_byte(&[0x01, 0x02]).unwrap();
        assert_eq!(word[..30], [0u8; 30]);
        assert_eq!(word[30..], [0x01, 0x02]);
    }

    #[test]
    fn test_full_width_value_is_unchanged() {
        let value = [0xab; 32];
        assert_eq!(bytes_to_32_byte(&value).unwrap(), value);
    }

    #[test]
    fn test_empty_value_is_zero_word() {
        assert_eq!(bytes_to_32_byte(&[]).unwrap(), [0u8; 32]);
    }

    #[test]
    fn test_leading_zeros_do_not_count() {
        let mut value = vec![0u8; 3];
        value.extend_from_slice(&[0xff; 32]);
        assert_eq!(bytes_to_32_byte(&value).unwrap(), [0xff; 32]);
    }

    #[test]
    fn test_oversized_value_is_rejected() {
        let err = bytes_to_32_byte(&[0x01; 33]).unwrap_err();
        assert_eq!(err, ByteUtilsError { len: 33, max: 32 });
    }
}
