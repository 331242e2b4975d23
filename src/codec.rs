//! Decoder and encoder contracts implemented once per encoding.
//!
//! A decoder turns bytes into one [`CodePoint`] at a time, an encoder turns one
//! [`CodePoint`] back into bytes. Both are stateless objects: the per-direction
//! [`ConversionState`] lives in the [`Converter`](crate::Converter) and is
//! threaded into every call, so one registered implementation can serve any
//! number of concurrent conversions.

use crate::{CodePoint, ConversionState};

/// Result of asking a decoder for the next unit of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// A complete unit was read.
    Consumed {
        /// The decoded code point
        code_point: CodePoint,
        /// Bytes used, including any shift sequence in front of the unit (always >= 1)
        len: usize,
    },
    /// The bytes at the cursor can never form a valid unit.
    Invalid,
    /// A shift sequence of the given length was consumed, then invalid input followed.
    InvalidAfterShift(usize),
    /// The window holds a valid prefix; more bytes are needed at the same position.
    Incomplete,
    /// Only a shift sequence of the given length was read; state changed, no code point.
    ShiftOnly(usize),
}

impl DecodeOutcome {
    /// Invalid input after `shift_len` bytes of shift sequence.
    ///
    /// Folds the zero-length case into [`DecodeOutcome::Invalid`].
    #[inline]
    pub fn invalid_after(shift_len: usize) -> Self {
        if shift_len == 0 {
            DecodeOutcome::Invalid
        } else {
            DecodeOutcome::InvalidAfterShift(shift_len)
        }
    }

    /// Ran out of input after `shift_len` bytes of shift sequence.
    ///
    /// Folds the zero-length case into [`DecodeOutcome::Incomplete`].
    #[inline]
    pub fn starved_after(shift_len: usize) -> Self {
        if shift_len == 0 {
            DecodeOutcome::Incomplete
        } else {
            DecodeOutcome::ShiftOnly(shift_len)
        }
    }
}

/// Result of asking an encoder to write one code point (or its reset sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// This many bytes were written at the start of the output slice.
    Written(usize),
    /// The encoding has no byte sequence for the code point.
    Unrepresentable,
    /// The output slice is too short; nothing was committed.
    CapacityTooSmall,
}

/// Byte to code point half of an encoding.
///
/// Implementations update `state` only when bytes were legitimately consumed
/// (`Consumed`, `ShiftOnly`, `InvalidAfterShift`). On `Incomplete` and
/// `Invalid` the state must be left as it was passed in.
pub trait Decoder: Send + Sync {
    /// Decode the unit starting at `input[0]`.
    ///
    /// `input` is never empty.
    fn decode_unit(&self, state: &mut ConversionState, input: &[u8]) -> DecodeOutcome;

    /// Return to the initial state at end of input, surfacing a code point
    /// that was held back waiting for look-ahead, if any.
    fn flush(&self, state: &mut ConversionState) -> Option<CodePoint> {
        *state = ConversionState::INITIAL;
        None
    }

    /// Size of one code unit in `state`, used as the skip length in discard
    /// mode.
    fn unit_len(&self, state: ConversionState) -> usize {
        let _ = state;
        1
    }
}

/// Code point to byte half of an encoding.
///
/// The output capacity is `output.len()`. `state` must only change when
/// `Written` is returned; `CapacityTooSmall` has to be retriable with a
/// larger slice without any side effect.
pub trait Encoder: Send + Sync {
    /// Encode one code point at the start of `output`.
    fn encode_unit(
        &self,
        state: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome;

    /// Write whatever is needed to return to the initial state.
    ///
    /// Stateless encodings write nothing.
    fn reset(&self, state: &mut ConversionState, output: &mut [u8]) -> EncodeOutcome {
        let _ = output;
        *state = ConversionState::INITIAL;
        EncodeOutcome::Written(0)
    }
}

/// Copy `bytes` to the front of `output` if they fit.
///
/// Encoders build a unit in a scratch buffer first and commit it through this,
/// which keeps `CapacityTooSmall` free of partial writes.
#[inline]
pub(crate) fn emit(bytes: &[u8], output: &mut [u8]) -> EncodeOutcome {
    match output.get_mut(..bytes.len()) {
        Some(dst) => {
            dst.copy_from_slice(bytes);
            EncodeOutcome::Written(bytes.len())
        }
        None => EncodeOutcome::CapacityTooSmall,
    }
}

/// Encoder for entries that can only be used as a source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl Encoder for RejectAll {
    fn encode_unit(&self, _: &mut ConversionState, _: CodePoint, _: &mut [u8]) -> EncodeOutcome {
        EncodeOutcome::Unrepresentable
    }
}

impl Decoder for RejectAll {
    fn decode_unit(&self, _: &mut ConversionState, _: &[u8]) -> DecodeOutcome {
        DecodeOutcome::Invalid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shift_folds_into_plain_outcomes() {
        assert_eq!(DecodeOutcome::invalid_after(0), DecodeOutcome::Invalid);
        assert_eq!(
            DecodeOutcome::invalid_after(3),
            DecodeOutcome::InvalidAfterShift(3)
        );
        assert_eq!(DecodeOutcome::starved_after(0), DecodeOutcome::Incomplete);
        assert_eq!(DecodeOutcome::starved_after(2), DecodeOutcome::ShiftOnly(2));
    }

    #[test]
    fn test_emit_never_writes_partially() {
        let mut out = [0u8; 2];
        assert_eq!(emit(&[1, 2, 3], &mut out), EncodeOutcome::CapacityTooSmall);
        assert_eq!(out, [0, 0]);
        assert_eq!(emit(&[7, 8], &mut out), EncodeOutcome::Written(2));
        assert_eq!(out, [7, 8]);
    }

    #[test]
    fn test_default_reset_writes_nothing() {
        let mut state = ConversionState::from_bits(5);
        let mut out = [0u8; 0];
        assert_eq!(RejectAll.reset(&mut state, &mut out), EncodeOutcome::Written(0));
        assert!(state.is_initial());
    }
}
