//! UTF-7 (RFC 2152).
//!
//! Characters outside the directly encoded set travel as UTF-16 units packed
//! into base64 runs opened by `+`. A run is not aligned to characters: one
//! base64 byte may carry the tail of one unit and the head of the next, so the
//! leftover bits live in the conversion state between units.
//!
//! State layout, both directions: bit 8 is set inside a base64 run, bits 4..8
//! hold the number of leftover bits (0, 2 or 4) and bits 0..4 their value.

use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

const ACTIVE: u32 = 1 << 8;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

#[derive(Debug, Clone, Copy)]
struct Run {
    active: bool,
    nbits: u32,
    bits: u32,
}

impl Run {
    const DIRECT: Run = Run {
        active: false,
        nbits: 0,
        bits: 0,
    };

    fn unpack(state: ConversionState) -> Run {
        let raw = state.bits();
        Run {
            active: raw & ACTIVE != 0,
            nbits: (raw >> 4) & 0xF,
            bits: raw & 0xF,
        }
    }

    fn pack(self) -> ConversionState {
        if !self.active {
            return ConversionState::INITIAL;
        }
        ConversionState::from_bits(ACTIVE | (self.nbits << 4) | self.bits)
    }

    /// The leftover bits padded with zeros to one base64 byte, if any.
    fn pending_sextet(self) -> Option<u8> {
        (self.nbits > 0).then(|| BASE64[(self.bits << (6 - self.nbits)) as usize])
    }
}

fn base64_value(byte: u8) -> Option<u32> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(u32::from(value))
}

/// Accepted outside base64 runs: everything printable except `+`, `\` and `~`.
fn is_direct_input(byte: u8) -> bool {
    matches!(byte, b'\t' | b'\n' | b'\r')
        || ((0x20..=0x7E).contains(&byte) && !matches!(byte, b'+' | b'\\' | b'~'))
}

/// Written outside base64 runs: RFC 2152 set D plus white space.
fn is_direct_output(code_point: CodePoint) -> Option<u8> {
    let byte = u8::try_from(code_point).ok()?;
    let direct = byte.is_ascii_alphanumeric()
        || matches!(
            byte,
            b'\'' | b'(' | b')' | b',' | b'-' | b'.' | b'/' | b':' | b'?' | b' ' | b'\t' | b'\r' | b'\n'
        );
    direct.then_some(byte)
}

/// UTF-7 decoder and encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf7;

impl Utf7 {
    fn decode_direct(state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        match input[0] {
            b'+' => match input.get(1) {
                None => DecodeOutcome::Incomplete,
                Some(b'-') => DecodeOutcome::Consumed {
                    code_point: CodePoint::from(b'+'),
                    len: 2,
                },
                Some(&next) if base64_value(next).is_some() => {
                    *state = Run {
                        active: true,
                        ..Run::DIRECT
                    }
                    .pack();
                    DecodeOutcome::ShiftOnly(1)
                }
                Some(_) => DecodeOutcome::Invalid,
            },
            byte if is_direct_input(byte) => DecodeOutcome::Consumed {
                code_point: CodePoint::from(byte),
                len: 1,
            },
            _ => DecodeOutcome::Invalid,
        }
    }

    /// Read one character (one unit, or a surrogate pair) from a base64 run.
    fn decode_run(run: Run, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        let mut acc = run.bits;
        let mut have = run.nbits;
        let mut pos = 0;
        let mut high: Option<u32> = None;

        let code_point = loop {
            while have < 16 {
                let Some(&byte) = input.get(pos) else {
                    return DecodeOutcome::Incomplete;
                };
                // a run may not end inside a unit
                let Some(value) = base64_value(byte) else {
                    return DecodeOutcome::Invalid;
                };
                acc = (acc << 6) | value;
                have += 6;
                pos += 1;
            }
            have -= 16;
            let unit = (acc >> have) & 0xFFFF;
            acc &= (1 << have) - 1;

            match (high, unit) {
                (None, 0xD800..=0xDBFF) => high = Some(unit),
                (None, 0xDC00..=0xDFFF) => return DecodeOutcome::Invalid,
                (None, _) => break unit,
                (Some(high), 0xDC00..=0xDFFF) => {
                    break 0x10000 + (((high - 0xD800) << 10) | (unit - 0xDC00));
                }
                (Some(_), _) => return DecodeOutcome::Invalid,
            }
        };

        *state = Run {
            active: true,
            nbits: have,
            bits: acc,
        }
        .pack();
        DecodeOutcome::Consumed {
            code_point,
            len: pos,
        }
    }
}

impl Decoder for Utf7 {
    fn decode_unit(&self, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        let run = Run::unpack(*state);
        if !run.active {
            return Self::decode_direct(state, input);
        }
        if base64_value(input[0]).is_some() {
            return Self::decode_run(run, state, input);
        }

        // the run ends here; its padding bits must be zero
        if run.bits != 0 {
            return DecodeOutcome::Invalid;
        }
        if input[0] == b'-' {
            *state = ConversionState::INITIAL;
            return DecodeOutcome::ShiftOnly(1);
        }
        let mut direct = ConversionState::INITIAL;
        let outcome = Self::decode_direct(&mut direct, input);
        if matches!(
            outcome,
            DecodeOutcome::Consumed { .. } | DecodeOutcome::ShiftOnly(_)
        ) {
            *state = direct;
        }
        outcome
    }
}

impl Encoder for Utf7 {
    fn encode_unit(
        &self,
        state: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        if code_point > 0x10FFFF || (0xD800..=0xDFFF).contains(&code_point) {
            return EncodeOutcome::Unrepresentable;
        }

        let run = Run::unpack(*state);
        let mut buf = [0u8; 12];
        let mut len = 0;

        let next = if let Some(byte) = is_direct_output(code_point) {
            if run.active {
                if let Some(sextet) = run.pending_sextet() {
                    buf[len] = sextet;
                    len += 1;
                }
                if byte == b'-' || base64_value(byte).is_some() {
                    buf[len] = b'-';
                    len += 1;
                }
            }
            buf[len] = byte;
            len += 1;
            Run::DIRECT
        } else if code_point == CodePoint::from(b'+') && !run.active {
            buf[..2].copy_from_slice(b"+-");
            len = 2;
            Run::DIRECT
        } else {
            let (mut acc, mut have) = if run.active {
                (run.bits, run.nbits)
            } else {
                buf[0] = b'+';
                len = 1;
                (0, 0)
            };

            let (units, count) = if code_point >= 0x10000 {
                let offset = code_point - 0x10000;
                ([0xD800 | (offset >> 10), 0xDC00 | (offset & 0x3FF)], 2)
            } else {
                ([code_point, 0], 1)
            };

            for &unit in &units[..count] {
                acc = (acc << 16) | unit;
                have += 16;
                while have >= 6 {
                    have -= 6;
                    buf[len] = BASE64[((acc >> have) & 0x3F) as usize];
                    len += 1;
                }
                acc &= (1 << have) - 1;
            }

            Run {
                active: true,
                nbits: have,
                bits: acc,
            }
        };

        let outcome = emit(&buf[..len], output);
        if matches!(outcome, EncodeOutcome::Written(_)) {
            *state = next.pack();
        }
        outcome
    }

    fn reset(&self, state: &mut ConversionState, output: &mut [u8]) -> EncodeOutcome {
        let run = Run::unpack(*state);
        if !run.active {
            *state = ConversionState::INITIAL;
            return EncodeOutcome::Written(0);
        }

        let mut buf = [0u8; 2];
        let mut len = 0;
        if let Some(sextet) = run.pending_sextet() {
            buf[0] = sextet;
            len = 1;
        }
        buf[len] = b'-';
        len += 1;

        let outcome = emit(&buf[..len], output);
        if matches!(outcome, EncodeOutcome::Written(_)) {
            *state = ConversionState::INITIAL;
        }
        outcome
    }
}
