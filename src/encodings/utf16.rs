//! UTF-16 in fixed and byte-order-marked variants.

use super::ByteOrder;
use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

/// Byte order not yet known; big-endian unless a mark says otherwise.
const UNDETERMINED: u32 = 0;
const BIG: u32 = 1;
const LITTLE: u32 = 2;

/// Encoder state once the byte order mark is out.
const MARK_WRITTEN: ConversionState = ConversionState::from_bits(1);

const BYTE_ORDER_MARK: u16 = 0xFEFF;
const SWAPPED_MARK: u16 = 0xFFFE;

/// UTF-16 decoder and encoder.
///
/// The [`ByteOrder::Marked`] form reads an optional byte order mark at the
/// start of the stream and writes a big-endian one in front of the first
/// character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf16 {
    order: ByteOrder,
}

impl Utf16 {
    /// UTF-16BE
    pub const BIG_ENDIAN: Utf16 = Utf16 {
        order: ByteOrder::Big,
    };
    /// UTF-16LE
    pub const LITTLE_ENDIAN: Utf16 = Utf16 {
        order: ByteOrder::Little,
    };
    /// UTF-16 with a byte order mark
    pub const MARKED: Utf16 = Utf16 {
        order: ByteOrder::Marked,
    };

    fn read(little: bool, bytes: &[u8]) -> u16 {
        let pair = [bytes[0], bytes[1]];
        if little {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    }

    fn write(little: bool, unit: u16) -> [u8; 2] {
        if little {
            unit.to_le_bytes()
        } else {
            unit.to_be_bytes()
        }
    }
}

impl Decoder for Utf16 {
    fn decode_unit(&self, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        if input.len() < 2 {
            return DecodeOutcome::Incomplete;
        }

        let little = match self.order {
            ByteOrder::Big => false,
            ByteOrder::Little => true,
            ByteOrder::Marked => match state.bits() {
                UNDETERMINED => match Self::read(false, input) {
                    BYTE_ORDER_MARK => {
                        *state = ConversionState::from_bits(BIG);
                        return DecodeOutcome::ShiftOnly(2);
                    }
                    SWAPPED_MARK => {
                        *state = ConversionState::from_bits(LITTLE);
                        return DecodeOutcome::ShiftOnly(2);
                    }
                    _ => false,
                },
                LITTLE => true,
                _ => false,
            },
        };

        let first = Self::read(little, input);
        let code_point = match first {
            0xD800..=0xDBFF => {
                if input.len() < 4 {
                    return DecodeOutcome::Incomplete;
                }
                let second = Self::read(little, &input[2..]);
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return DecodeOutcome::Invalid;
                }
                let high = CodePoint::from(first - 0xD800);
                let low = CodePoint::from(second - 0xDC00);
                0x10000 + ((high << 10) | low)
            }
            0xDC00..=0xDFFF => return DecodeOutcome::Invalid,
            unit => CodePoint::from(unit),
        };

        if self.order == ByteOrder::Marked && state.bits() == UNDETERMINED {
            *state = ConversionState::from_bits(BIG);
        }

        let len = if code_point >= 0x10000 { 4 } else { 2 };
        DecodeOutcome::Consumed { code_point, len }
    }

    fn unit_len(&self, _: ConversionState) -> usize {
        2
    }
}

impl Encoder for Utf16 {
    fn encode_unit(
        &self,
        state: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        if (0xD800..=0xDFFF).contains(&code_point) || code_point > 0x10FFFF {
            return EncodeOutcome::Unrepresentable;
        }

        let little = self.order == ByteOrder::Little;
        let mut buf = [0u8; 6];
        let mut len = 0;

        let needs_mark = self.order == ByteOrder::Marked && state.is_initial();
        if needs_mark {
            buf[..2].copy_from_slice(&Self::write(false, BYTE_ORDER_MARK));
            len = 2;
        }

        if code_point >= 0x10000 {
            let offset = code_point - 0x10000;
            let high = 0xD800 | (offset >> 10) as u16;
            let low = 0xDC00 | (offset & 0x3FF) as u16;
            buf[len..len + 2].copy_from_slice(&Self::write(little, high));
            buf[len + 2..len + 4].copy_from_slice(&Self::write(little, low));
            len += 4;
        } else {
            buf[len..len + 2].copy_from_slice(&Self::write(little, code_point as u16));
            len += 2;
        }

        let outcome = emit(&buf[..len], output);
        if needs_mark && matches!(outcome, EncodeOutcome::Written(_)) {
            *state = MARK_WRITTEN;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_orders() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Utf16::LITTLE_ENDIAN.decode_unit(&mut state, &[0x41, 0x00]),
            DecodeOutcome::Consumed {
                code_point: 0x41,
                len: 2
            }
        );
        assert_eq!(
            Utf16::BIG_ENDIAN.decode_unit(&mut state, &[0x41, 0x00]),
            DecodeOutcome::Consumed {
                code_point: 0x4100,
                len: 2
            }
        );
        assert!(state.is_initial());
    }

    #[test]
    fn test_surrogate_pairs() {
        let mut state = ConversionState::INITIAL;
        // U+1F600 as big-endian surrogates
        let bytes = [0xD8, 0x3D, 0xDE, 0x00];
        assert_eq!(
            Utf16::BIG_ENDIAN.decode_unit(&mut state, &bytes),
            DecodeOutcome::Consumed {
                code_point: 0x1F600,
                len: 4
            }
        );
        assert_eq!(
            Utf16::BIG_ENDIAN.decode_unit(&mut state, &bytes[..3]),
            DecodeOutcome::Incomplete
        );
        assert_eq!(
            Utf16::BIG_ENDIAN.decode_unit(&mut state, &[0xDE, 0x00]),
            DecodeOutcome::Invalid
        );
        assert_eq!(
            Utf16::BIG_ENDIAN.decode_unit(&mut state, &[0xD8, 0x3D, 0x00, 0x41]),
            DecodeOutcome::Invalid
        );

        let mut out = [0u8; 4];
        assert_eq!(
            Utf16::LITTLE_ENDIAN.encode_unit(&mut state, 0x1F600, &mut out),
            EncodeOutcome::Written(4)
        );
        assert_eq!(out, [0x3D, 0xD8, 0x00, 0xDE]);
    }

    #[test]
    fn test_marked_reads_byte_order_mark_once() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Utf16::MARKED.decode_unit(&mut state, &[0xFF, 0xFE, 0x41, 0x00]),
            DecodeOutcome::ShiftOnly(2)
        );
        assert_eq!(state.bits(), LITTLE);
        assert_eq!(
            Utf16::MARKED.decode_unit(&mut state, &[0x41, 0x00]),
            DecodeOutcome::Consumed {
                code_point: 0x41,
                len: 2
            }
        );
        // a later mark is an ordinary character
        assert_eq!(
            Utf16::MARKED.decode_unit(&mut state, &[0xFF, 0xFE]),
            DecodeOutcome::Consumed {
                code_point: 0xFEFF,
                len: 2
            }
        );
    }

    #[test]
    fn test_marked_defaults_to_big_endian() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Utf16::MARKED.decode_unit(&mut state, &[0x00, 0x41]),
            DecodeOutcome::Consumed {
                code_point: 0x41,
                len: 2
            }
        );
        assert_eq!(state.bits(), BIG);
    }

    #[test]
    fn test_marked_encoder_writes_mark_first() {
        let mut state = ConversionState::INITIAL;
        let mut out = [0u8; 4];

        assert_eq!(
            Utf16::MARKED.encode_unit(&mut state, 0x41, &mut out[..3]),
            EncodeOutcome::CapacityTooSmall
        );
        assert!(state.is_initial());

        assert_eq!(
            Utf16::MARKED.encode_unit(&mut state, 0x41, &mut out),
            EncodeOutcome::Written(4)
        );
        assert_eq!(out, [0xFE, 0xFF, 0x00, 0x41]);
        assert_eq!(
            Utf16::MARKED.encode_unit(&mut state, 0x42, &mut out),
            EncodeOutcome::Written(2)
        );
        assert_eq!(&out[..2], &[0x00, 0x42]);
    }

    #[test]
    fn test_odd_trailing_byte_is_incomplete() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Utf16::LITTLE_ENDIAN.decode_unit(&mut state, &[0x41]),
            DecodeOutcome::Incomplete
        );
    }
}
