//! UTF-32 in fixed and byte-order-marked variants.

use super::ByteOrder;
use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

const UNDETERMINED: u32 = 0;
const BIG: u32 = 1;
const LITTLE: u32 = 2;

const BYTE_ORDER_MARK: u32 = 0xFEFF;
const SWAPPED_MARK: u32 = 0xFFFE_0000;

/// UTF-32 decoder and encoder, laid out like [`Utf16`](super::Utf16).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Utf32 {
    order: ByteOrder,
}

impl Utf32 {
    /// UTF-32BE
    pub const BIG_ENDIAN: Utf32 = Utf32 {
        order: ByteOrder::Big,
    };
    /// UTF-32LE
    pub const LITTLE_ENDIAN: Utf32 = Utf32 {
        order: ByteOrder::Little,
    };
    /// UTF-32 with a byte order mark
    pub const MARKED: Utf32 = Utf32 {
        order: ByteOrder::Marked,
    };

    fn read(little: bool, bytes: &[u8]) -> u32 {
        let quad = [bytes[0], bytes[1], bytes[2], bytes[3]];
        if little {
            u32::from_le_bytes(quad)
        } else {
            u32::from_be_bytes(quad)
        }
    }
}

fn is_scalar(value: u32) -> bool {
    value <= 0x10FFFF && !(0xD800..=0xDFFF).contains(&value)
}

impl Decoder for Utf32 {
    fn decode_unit(&self, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        if input.len() < 4 {
            return DecodeOutcome::Incomplete;
        }

        let little = match self.order {
            ByteOrder::Big => false,
            ByteOrder::Little => true,
            ByteOrder::Marked => match state.bits() {
                UNDETERMINED => match Self::read(false, input) {
                    BYTE_ORDER_MARK => {
                        *state = ConversionState::from_bits(BIG);
                        return DecodeOutcome::ShiftOnly(4);
                    }
                    SWAPPED_MARK => {
                        *state = ConversionState::from_bits(LITTLE);
                        return DecodeOutcome::ShiftOnly(4);
                    }
                    _ => false,
                },
                LITTLE => true,
                _ => false,
            },
        };

        let code_point = Self::read(little, input);
        if !is_scalar(code_point) {
            return DecodeOutcome::Invalid;
        }

        if self.order == ByteOrder::Marked && state.bits() == UNDETERMINED {
            *state = ConversionState::from_bits(BIG);
        }
        DecodeOutcome::Consumed { code_point, len: 4 }
    }

    fn unit_len(&self, _: ConversionState) -> usize {
        4
    }
}

impl Encoder for Utf32 {
    fn encode_unit(
        &self,
        state: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        if !is_scalar(code_point) {
            return EncodeOutcome::Unrepresentable;
        }

        let mut buf = [0u8; 8];
        let needs_mark = self.order == ByteOrder::Marked && state.is_initial();
        let start = if needs_mark {
            buf[..4].copy_from_slice(&BYTE_ORDER_MARK.to_be_bytes());
            4
        } else {
            0
        };
        let unit = if self.order == ByteOrder::Little {
            code_point.to_le_bytes()
        } else {
            code_point.to_be_bytes()
        };
        buf[start..start + 4].copy_from_slice(&unit);

        let outcome = emit(&buf[..start + 4], output);
        if needs_mark && matches!(outcome, EncodeOutcome::Written(_)) {
            *state = ConversionState::from_bits(BIG);
        }
        outcome
    }
}
