//! Approximations for characters a target encoding cannot represent.
//!
//! The mapping is plain data: Latin letters with diacritics fall back to their
//! base letters, typographic punctuation to ASCII punctuation, a handful of
//! symbols to spelled-out forms, and full-width ASCII variants to ASCII.
//! Replacements are tried as a whole; a converter only uses one if every
//! character of it is representable in the target.

use crate::CodePoint;

/// Base letters for U+00C0..U+017F (Latin-1 Supplement letters and Latin Extended-A).
const LATIN_BASE_START: CodePoint = 0xC0;

#[rustfmt::skip]
static LATIN_BASE: [&str; 0x180 - 0xC0] = [
    // U+00C0
    "A", "A", "A", "A", "A", "A", "AE", "C", "E", "E", "E", "E", "I", "I", "I", "I",
    // U+00D0
    "D", "N", "O", "O", "O", "O", "O", "x", "O", "U", "U", "U", "U", "Y", "TH", "ss",
    // U+00E0
    "a", "a", "a", "a", "a", "a", "ae", "c", "e", "e", "e", "e", "i", "i", "i", "i",
    // U+00F0
    "d", "n", "o", "o", "o", "o", "o", ":", "o", "u", "u", "u", "u", "y", "th", "y",
    // U+0100
    "A", "a", "A", "a", "A", "a", "C", "c", "C", "c", "C", "c", "C", "c", "D", "d",
    // U+0110
    "D", "d", "E", "e", "E", "e", "E", "e", "E", "e", "E", "e", "G", "g", "G", "g",
    // U+0120
    "G", "g", "G", "g", "H", "h", "H", "h", "I", "i", "I", "i", "I", "i", "I", "i",
    // U+0130
    "I", "i", "IJ", "ij", "J", "j", "K", "k", "q", "L", "l", "L", "l", "L", "l", "L",
    // U+0140
    "l", "L", "l", "N", "n", "N", "n", "N", "n", "'n", "N", "n", "O", "o", "O", "o",
    // U+0150
    "O", "o", "OE", "oe", "R", "r", "R", "r", "R", "r", "S", "s", "S", "s", "S", "s",
    // U+0160
    "S", "s", "T", "t", "T", "t", "T", "t", "U", "u", "U", "u", "U", "u", "U", "u",
    // U+0170
    "U", "u", "U", "u", "W", "w", "Y", "y", "Y", "Z", "z", "Z", "z", "Z", "z", "s",
];

/// Everything else, sorted by code point.
static SYMBOLS: &[(CodePoint, &str)] = &[
    (0x00A0, " "),
    (0x00A1, "!"),
    (0x00A2, "c"),
    (0x00A3, "GBP"),
    (0x00A5, "JPY"),
    (0x00A6, "|"),
    (0x00A9, "(C)"),
    (0x00AA, "a"),
    (0x00AB, "<<"),
    (0x00AD, "-"),
    (0x00AE, "(R)"),
    (0x00B1, "+/-"),
    (0x00B2, "2"),
    (0x00B3, "3"),
    (0x00B5, "u"),
    (0x00B7, "."),
    (0x00B9, "1"),
    (0x00BA, "o"),
    (0x00BB, ">>"),
    (0x00BC, " 1/4 "),
    (0x00BD, " 1/2 "),
    (0x00BE, " 3/4 "),
    (0x00BF, "?"),
    (0x0192, "f"),
    (0x02C6, "^"),
    (0x02DC, "~"),
    (0x2002, " "),
    (0x2003, " "),
    (0x2009, " "),
    (0x2010, "-"),
    (0x2011, "-"),
    (0x2012, "-"),
    (0x2013, "-"),
    (0x2014, "-"),
    (0x2015, "-"),
    (0x2018, "'"),
    (0x2019, "'"),
    (0x201A, ","),
    (0x201B, "'"),
    (0x201C, "\""),
    (0x201D, "\""),
    (0x201E, ",,"),
    (0x201F, "\""),
    (0x2020, "+"),
    (0x2022, "o"),
    (0x2026, "..."),
    (0x2030, " 0/00"),
    (0x2039, "<"),
    (0x203A, ">"),
    (0x20AC, "EUR"),
    (0x2122, "TM"),
    (0x2190, "<-"),
    (0x2192, "->"),
    (0x2194, "<->"),
    (0x2212, "-"),
    (0x2264, "<="),
    (0x2265, ">="),
    (0x3000, " "),
    (0xFB00, "ff"),
    (0xFB01, "fi"),
    (0xFB02, "fl"),
];

/// Full-width forms of U+0021..U+007E.
const FULLWIDTH: std::ops::RangeInclusive<CodePoint> = 0xFF01..=0xFF5E;
const FULLWIDTH_OFFSET: CodePoint = 0xFF01 - 0x21;

/// Approximation for `code_point`, if one is known.
pub fn lookup(code_point: CodePoint) -> Option<Vec<CodePoint>> {
    if FULLWIDTH.contains(&code_point) {
        return Some(vec![code_point - FULLWIDTH_OFFSET]);
    }

    let text = match code_point.checked_sub(LATIN_BASE_START) {
        Some(index) if (index as usize) < LATIN_BASE.len() => LATIN_BASE[index as usize],
        _ => SYMBOLS
            .binary_search_by_key(&code_point, |&(cp, _)| cp)
            .ok()
            .map(|found| SYMBOLS[found].1)?,
    };

    Some(text.chars().map(CodePoint::from).collect())
}
