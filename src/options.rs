//! Per-converter configuration and caller-supplied callbacks.

use serde::{Deserialize, Serialize};

use crate::CodePoint;

/// Conversion-wide flags held by each [`Converter`](crate::Converter).
///
/// Deserializes from a JSON object where every field is optional:
///
/// ```rust
/// use fast_iconv::ConversionOptions;
///
/// let options: ConversionOptions = serde_json::from_str(r#"{"transliterate": true}"#).unwrap();
/// assert!(options.transliterate);
/// assert!(!options.discard_illegal);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionOptions {
    /// Substitute an approximation for characters the target cannot represent
    pub transliterate: bool,
    /// Skip illegal input sequences (and drop unrepresentable characters)
    /// instead of stopping
    pub discard_illegal: bool,
}

impl ConversionOptions {
    /// Split `//TRANSLIT` and `//IGNORE` suffixes off a target name.
    ///
    /// Suffixes are matched case-insensitively and may appear in any order.
    /// Returns the bare name and the flags the suffixes switch on.
    pub fn parse_target(target: &str) -> (&str, ConversionOptions) {
        let mut options = ConversionOptions::default();
        let mut name = target;

        while let Some(pos) = name.rfind("//") {
            let suffix = &name[pos + 2..];
            if suffix.eq_ignore_ascii_case("TRANSLIT") {
                options.transliterate = true;
            } else if suffix.eq_ignore_ascii_case("IGNORE") {
                options.discard_illegal = true;
            } else if !suffix.is_empty() {
                break;
            }
            name = &name[..pos];
        }

        (name, options)
    }

    /// Union of two flag sets
    pub fn merge(self, other: ConversionOptions) -> ConversionOptions {
        ConversionOptions {
            transliterate: self.transliterate || other.transliterate,
            discard_illegal: self.discard_illegal || other.discard_illegal,
        }
    }
}

/// Replacement policy for input the engine cannot convert on its own.
///
/// Both methods decline by default. A returned sequence may be empty, which
/// drops the offending input.
pub trait Fallbacks {
    /// Replacement code points for an illegal input unit.
    ///
    /// Consulted only when discard mode is off.
    fn invalid_input(&mut self, bytes: &[u8]) -> Option<Vec<CodePoint>> {
        let _ = bytes;
        None
    }

    /// Replacement code points for a character the target cannot encode.
    ///
    /// Every replacement goes through the target encoder again; if one of them
    /// is unrepresentable too the whole replacement is rejected.
    fn unrepresentable(&mut self, code_point: CodePoint) -> Option<Vec<CodePoint>> {
        let _ = code_point;
        None
    }
}

/// Observer for converted characters.
pub trait Hooks {
    /// Called once per code point after it was written to the output.
    ///
    /// A character written through an unrepresentable fallback or
    /// transliteration is reported as itself; illegal input replaced by
    /// [`Fallbacks::invalid_input`] is reported as the replacement code points.
    /// Dropped characters are not reported.
    fn converted(&mut self, code_point: CodePoint);
}
