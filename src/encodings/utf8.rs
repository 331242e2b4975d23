//! UTF-8, strict form.
//!
//! Overlong forms, encoded surrogates and values above U+10FFFF are illegal.
//! A truncated sequence is only reported as incomplete while every byte seen
//! so far is still a valid prefix; the first byte that breaks the prefix makes
//! the whole unit illegal.

use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

/// Stateless UTF-8 decoder and encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8;

impl Decoder for Utf8 {
    fn decode_unit(&self, _: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        let lead = input[0];
        // (length, allowed range of the second byte, payload bits of the lead)
        let (len, second, init) = match lead {
            0x00..=0x7F => {
                return DecodeOutcome::Consumed {
                    code_point: CodePoint::from(lead),
                    len: 1,
                };
            }
            0xC2..=0xDF => (2, 0x80..=0xBF, lead & 0x1F),
            0xE0 => (3, 0xA0..=0xBF, lead & 0x0F),
            0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80..=0xBF, lead & 0x0F),
            0xED => (3, 0x80..=0x9F, lead & 0x0F),
            0xF0 => (4, 0x90..=0xBF, lead & 0x07),
            0xF1..=0xF3 => (4, 0x80..=0xBF, lead & 0x07),
            0xF4 => (4, 0x80..=0x8F, lead & 0x07),
            _ => return DecodeOutcome::Invalid,
        };

        let mut code_point = CodePoint::from(init);
        for i in 1..len {
            let Some(&byte) = input.get(i) else {
                return DecodeOutcome::Incomplete;
            };
            let valid = if i == 1 {
                second.contains(&byte)
            } else {
                (0x80..=0xBF).contains(&byte)
            };
            if !valid {
                return DecodeOutcome::Invalid;
            }
            code_point = (code_point << 6) | CodePoint::from(byte & 0x3F);
        }

        DecodeOutcome::Consumed { code_point, len }
    }
}

impl Encoder for Utf8 {
    fn encode_unit(
        &self,
        _: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        match char::from_u32(code_point) {
            Some(ch) => {
                let mut buf = [0u8; 4];
                emit(ch.encode_utf8(&mut buf).as_bytes(), output)
            }
            None => EncodeOutcome::Unrepresentable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> DecodeOutcome {
        Utf8.decode_unit(&mut ConversionState::INITIAL, input)
    }

    #[test]
    fn test_decode_all_lengths() {
        for ch in ['A', 'é', '€', '😀'] {
            let mut buf = [0u8; 4];
            let bytes = ch.encode_utf8(&mut buf).as_bytes();
            assert_eq!(
                decode(bytes),
                DecodeOutcome::Consumed {
                    code_point: ch as CodePoint,
                    len: bytes.len()
                }
            );
        }
    }

    #[test]
    fn test_valid_prefix_is_incomplete() {
        assert_eq!(decode(&[0xE2, 0x82]), DecodeOutcome::Incomplete);
        assert_eq!(decode(&[0xF0]), DecodeOutcome::Incomplete);
        assert_eq!(decode(&[0xF0, 0x9F, 0x98]), DecodeOutcome::Incomplete);
    }

    #[test]
    fn test_broken_prefix_is_invalid() {
        // overlong
        assert_eq!(decode(&[0xC0, 0x80]), DecodeOutcome::Invalid);
        assert_eq!(decode(&[0xE0, 0x80]), DecodeOutcome::Invalid);
        // surrogate U+D800
        assert_eq!(decode(&[0xED, 0xA0, 0x80]), DecodeOutcome::Invalid);
        // above U+10FFFF
        assert_eq!(decode(&[0xF4, 0x90]), DecodeOutcome::Invalid);
        assert_eq!(decode(&[0xF5]), DecodeOutcome::Invalid);
        // stray continuation and non-continuation in the middle
        assert_eq!(decode(&[0x80]), DecodeOutcome::Invalid);
        assert_eq!(decode(&[0xE2, 0x41]), DecodeOutcome::Invalid);
        assert_eq!(decode(&[0xE2, 0x82, 0x41]), DecodeOutcome::Invalid);
    }

    #[test]
    fn test_encode_rejects_non_scalars() {
        let mut out = [0u8; 4];
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Utf8.encode_unit(&mut state, 0xD800, &mut out),
            EncodeOutcome::Unrepresentable
        );
        assert_eq!(
            Utf8.encode_unit(&mut state, 0x110000, &mut out),
            EncodeOutcome::Unrepresentable
        );
        assert_eq!(
            Utf8.encode_unit(&mut state, 0x20AC, &mut out[..2]),
            EncodeOutcome::CapacityTooSmall
        );
        assert_eq!(
            Utf8.encode_unit(&mut state, 0x20AC, &mut out),
            EncodeOutcome::Written(3)
        );
        assert_eq!(&out[..3], &[0xE2, 0x82, 0xAC]);
    }
}
