//! ISO-2022-JP (RFC 1468).
//!
//! Escape sequences switch between three character sets:
//!
//! | Escape    | Set                    | State |
//! |-----------|------------------------|-------|
//! | `ESC ( B` | ASCII                  | 0     |
//! | `ESC ( J` | JIS X 0201 Roman       | 1     |
//! | `ESC $ @` | JIS X 0208 (1978)      | 2     |
//! | `ESC $ B` | JIS X 0208 (1983)      | 2     |
//!
//! The JIS X 0208 repertoire covered here is the part that maps to Unicode by
//! arithmetic: ideographic space and the two full stops, full-width digits
//! and Latin letters, hiragana, katakana and Greek. Kanji rows need an
//! external table and decode as illegal input.

use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

const ESC: u8 = 0x1B;
const SO: u8 = 0x0E;
const SI: u8 = 0x0F;

const ASCII: u32 = 0;
const ROMAN: u32 = 1;
const JIS0208: u32 = 2;

fn designation(charset: u32) -> &'static [u8; 3] {
    match charset {
        ROMAN => b"\x1B(J",
        JIS0208 => b"\x1B$B",
        _ => b"\x1B(B",
    }
}

/// JIS X 0208 row and column (both 0x21..=0x7E) to a code point.
fn jis0208_to_unicode(row: u8, col: u8) -> Option<CodePoint> {
    let col = CodePoint::from(col);
    let cp = match (row, col) {
        (0x21, 0x21..=0x23) => [0x3000, 0x3001, 0x3002][(col - 0x21) as usize],
        (0x23, 0x30..=0x39) => 0xFF10 + (col - 0x30),
        (0x23, 0x41..=0x5A) => 0xFF21 + (col - 0x41),
        (0x23, 0x61..=0x7A) => 0xFF41 + (col - 0x61),
        (0x24, 0x21..=0x73) => 0x3041 + (col - 0x21),
        (0x25, 0x21..=0x76) => 0x30A1 + (col - 0x21),
        (0x26, 0x21..=0x31) => 0x0391 + (col - 0x21),
        (0x26, 0x32..=0x38) => 0x03A3 + (col - 0x32),
        (0x26, 0x41..=0x51) => 0x03B1 + (col - 0x41),
        (0x26, 0x52..=0x58) => 0x03C3 + (col - 0x52),
        _ => return None,
    };
    Some(cp)
}

fn unicode_to_jis0208(code_point: CodePoint) -> Option<[u8; 2]> {
    let (row, col) = match code_point {
        0x3000..=0x3002 => (0x21, 0x21 + (code_point - 0x3000)),
        0xFF10..=0xFF19 => (0x23, 0x30 + (code_point - 0xFF10)),
        0xFF21..=0xFF3A => (0x23, 0x41 + (code_point - 0xFF21)),
        0xFF41..=0xFF5A => (0x23, 0x61 + (code_point - 0xFF41)),
        0x3041..=0x3093 => (0x24, 0x21 + (code_point - 0x3041)),
        0x30A1..=0x30F6 => (0x25, 0x21 + (code_point - 0x30A1)),
        0x0391..=0x03A1 => (0x26, 0x21 + (code_point - 0x0391)),
        0x03A3..=0x03A9 => (0x26, 0x32 + (code_point - 0x03A3)),
        0x03B1..=0x03C1 => (0x26, 0x41 + (code_point - 0x03B1)),
        0x03C3..=0x03C9 => (0x26, 0x52 + (code_point - 0x03C3)),
        _ => return None,
    };
    Some([row, col as u8])
}

/// Stateful ISO-2022-JP decoder and encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso2022Jp;

impl Decoder for Iso2022Jp {
    fn decode_unit(&self, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        let mut charset = state.bits();
        let mut count = 0;

        // any number of designations may precede a character
        loop {
            let window = &input[count..];
            match window {
                [] => {
                    *state = ConversionState::from_bits(charset);
                    return DecodeOutcome::starved_after(count);
                }
                [ESC] | [ESC, b'(' | b'$'] => {
                    *state = ConversionState::from_bits(charset);
                    return DecodeOutcome::starved_after(count);
                }
                [ESC, b'(', b'B', ..] => charset = ASCII,
                [ESC, b'(', b'J', ..] => charset = ROMAN,
                [ESC, b'$', b'@' | b'B', ..] => charset = JIS0208,
                [ESC, ..] => {
                    *state = ConversionState::from_bits(charset);
                    return DecodeOutcome::invalid_after(count);
                }
                _ => break,
            }
            count += 3;
        }

        let window = &input[count..];
        let byte = window[0];
        let decoded = if byte >= 0x80 || byte == SO || byte == SI {
            None
        } else {
            match charset {
                ASCII => Some((CodePoint::from(byte), 1)),
                ROMAN => match byte {
                    0x5C => Some((0x00A5, 1)),
                    0x7E => Some((0x203E, 1)),
                    _ => Some((CodePoint::from(byte), 1)),
                },
                _ if !(0x21..=0x7E).contains(&byte) => None,
                _ => match window.get(1) {
                    None => {
                        *state = ConversionState::from_bits(charset);
                        return DecodeOutcome::starved_after(count);
                    }
                    Some(&col) if (0x21..=0x7E).contains(&col) => {
                        jis0208_to_unicode(byte, col).map(|cp| (cp, 2))
                    }
                    Some(_) => None,
                },
            }
        };

        *state = ConversionState::from_bits(charset);
        match decoded {
            Some((code_point, len)) => DecodeOutcome::Consumed {
                code_point,
                len: count + len,
            },
            None => DecodeOutcome::invalid_after(count),
        }
    }

    // JIS X 0208 characters are byte pairs
    fn unit_len(&self, state: ConversionState) -> usize {
        if state.bits() == JIS0208 { 2 } else { 1 }
    }
}

impl Encoder for Iso2022Jp {
    fn encode_unit(
        &self,
        state: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        let (charset, bytes, len) = match code_point {
            // ESC, SO and SI would be read back as control functions
            0x1B | 0x0E | 0x0F => return EncodeOutcome::Unrepresentable,
            0x00..=0x7F => (ASCII, [code_point as u8, 0], 1),
            0x00A5 => (ROMAN, [0x5C, 0], 1),
            0x203E => (ROMAN, [0x7E, 0], 1),
            _ => match unicode_to_jis0208(code_point) {
                Some(pair) => (JIS0208, pair, 2),
                None => return EncodeOutcome::Unrepresentable,
            },
        };

        let mut buf = [0u8; 5];
        let mut written = 0;
        if state.bits() != charset {
            buf[..3].copy_from_slice(designation(charset));
            written = 3;
        }
        buf[written..written + len].copy_from_slice(&bytes[..len]);
        written += len;

        let outcome = emit(&buf[..written], output);
        if matches!(outcome, EncodeOutcome::Written(_)) {
            *state = ConversionState::from_bits(charset);
        }
        outcome
    }

    fn reset(&self, state: &mut ConversionState, output: &mut [u8]) -> EncodeOutcome {
        if state.bits() == ASCII {
            return EncodeOutcome::Written(0);
        }
        let outcome = emit(designation(ASCII), output);
        if matches!(outcome, EncodeOutcome::Written(_)) {
            *state = ConversionState::INITIAL;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_designation_alone_is_shift_only() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B$B"),
            DecodeOutcome::ShiftOnly(3)
        );
        assert_eq!(state.bits(), JIS0208);

        // hiragana A
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x24\x22"),
            DecodeOutcome::Consumed {
                code_point: 0x3042,
                len: 2
            }
        );
    }

    #[test]
    fn test_partial_escape_is_incomplete() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B$"),
            DecodeOutcome::Incomplete
        );
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B"),
            DecodeOutcome::Incomplete
        );
        assert!(state.is_initial());
    }

    #[test]
    fn test_escape_and_character_in_one_unit() {
        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B$B\x25\x22\x1B(B"),
            DecodeOutcome::Consumed {
                code_point: 0x30A2,
                len: 5
            }
        );
        assert_eq!(state.bits(), JIS0208);
    }

    #[test]
    fn test_invalid_after_shift() {
        let mut state = ConversionState::INITIAL;
        // kanji row
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B$B\x30\x21"),
            DecodeOutcome::InvalidAfterShift(3)
        );
        assert_eq!(state.bits(), JIS0208);

        let mut state = ConversionState::INITIAL;
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\x1B(Z"),
            DecodeOutcome::Invalid
        );
        assert_eq!(Iso2022Jp.decode_unit(&mut state, &[0xA4]), DecodeOutcome::Invalid);
    }

    #[test]
    fn test_unit_len_follows_designation() {
        assert_eq!(Iso2022Jp.unit_len(ConversionState::INITIAL), 1);
        assert_eq!(Iso2022Jp.unit_len(ConversionState::from_bits(ROMAN)), 1);
        assert_eq!(Iso2022Jp.unit_len(ConversionState::from_bits(JIS0208)), 2);
    }

    #[test]
    fn test_roman_differs_from_ascii() {
        let mut state = ConversionState::from_bits(ROMAN);
        assert_eq!(
            Iso2022Jp.decode_unit(&mut state, b"\\"),
            DecodeOutcome::Consumed {
                code_point: 0xA5,
                len: 1
            }
        );
    }

    #[test]
    fn test_encoder_switches_sets() {
        let mut state = ConversionState::INITIAL;
        let mut out = Vec::new();
        let mut buf = [0u8; 8];

        for cp in [0x41, 0x3042, 0x3044, 0xA5, 0x42] {
            let EncodeOutcome::Written(n) = Iso2022Jp.encode_unit(&mut state, cp, &mut buf) else {
                panic!("cannot encode U+{cp:04X}");
            };
            out.extend_from_slice(&buf[..n]);
        }
        let EncodeOutcome::Written(n) = Iso2022Jp.reset(&mut state, &mut buf) else {
            panic!("reset failed");
        };
        out.extend_from_slice(&buf[..n]);

        assert_eq!(out, b"A\x1B$B\x24\x22\x24\x24\x1B(J\x5C\x1B(BB");
        assert!(state.is_initial());
    }

    #[test]
    fn test_encoder_reset_returns_to_ascii() {
        let mut state = ConversionState::INITIAL;
        let mut buf = [0u8; 8];
        Iso2022Jp.encode_unit(&mut state, 0x3042, &mut buf);

        assert_eq!(
            Iso2022Jp.reset(&mut state, &mut buf[..2]),
            EncodeOutcome::CapacityTooSmall
        );
        assert_eq!(state.bits(), JIS0208);
        assert_eq!(Iso2022Jp.reset(&mut state, &mut buf), EncodeOutcome::Written(3));
        assert_eq!(&buf[..3], b"\x1B(B");
    }

    #[test]
    fn test_repertoire_round_trips() {
        for cp in (0x3041..=0x3093).chain(0x30A1..=0x30F6).chain(0x0391..=0x03C9) {
            if cp == 0x03A2 || cp == 0x03C2 || (0x03AA..=0x03B0).contains(&cp) {
                continue;
            }
            let [row, col] = unicode_to_jis0208(cp).unwrap();
            assert_eq!(jis0208_to_unicode(row, col), Some(cp));
        }
        assert_eq!(unicode_to_jis0208(0x4E00), None);
    }
}
