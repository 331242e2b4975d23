//! Encodings bundled with the crate.
//!
//! Each type implements both [`Decoder`](crate::Decoder) and
//! [`Encoder`](crate::Encoder), and can be registered in any
//! [`Registry`]. [`Registry::builtin`] holds all of them under their
//! canonical names.

mod iso2022_jp;
mod single_byte;
mod utf16;
mod utf32;
mod utf7;
mod utf8;

pub use iso2022_jp::Iso2022Jp;
pub use single_byte::{Ascii, Latin1, SingleByte};
pub use utf7::Utf7;
pub use utf8::Utf8;
pub use utf16::Utf16;
pub use utf32::Utf32;

use crate::registry::Registry;

/// Serialization order of a UTF-16 or UTF-32 code unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
    /// Decided by a byte order mark at the start of the stream; big-endian
    /// when there is none
    Marked,
}

/// Registry holding every bundled encoding.
pub(crate) fn builtin_registry() -> Registry {
    Registry::builder()
        .with_entry("US-ASCII", Ascii, Ascii)
        .with_entry("ISO-8859-1", Latin1, Latin1)
        .with_entry(
            "ISO-8859-15",
            SingleByte::iso_8859_15(),
            SingleByte::iso_8859_15(),
        )
        .with_entry(
            "WINDOWS-1252",
            SingleByte::windows_1252(),
            SingleByte::windows_1252(),
        )
        .with_entry("IBM037", SingleByte::ibm037(), SingleByte::ibm037())
        .with_entry("UTF-8", Utf8, Utf8)
        .with_entry("UTF-16", Utf16::MARKED, Utf16::MARKED)
        .with_entry("UTF-16BE", Utf16::BIG_ENDIAN, Utf16::BIG_ENDIAN)
        .with_entry("UTF-16LE", Utf16::LITTLE_ENDIAN, Utf16::LITTLE_ENDIAN)
        .with_entry("UTF-32", Utf32::MARKED, Utf32::MARKED)
        .with_entry("UTF-32BE", Utf32::BIG_ENDIAN, Utf32::BIG_ENDIAN)
        .with_entry("UTF-32LE", Utf32::LITTLE_ENDIAN, Utf32::LITTLE_ENDIAN)
        .with_entry("UTF-7", Utf7, Utf7)
        .with_entry("ISO-2022-JP", Iso2022Jp, Iso2022Jp)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_is_bidirectional() {
        let registry = builtin_registry();
        assert_eq!(registry.len(), 14);
        for (_, entry) in registry.entries() {
            assert!(entry.directions().decode && entry.directions().encode);
        }
    }

    #[test]
    fn test_unit_lengths() {
        let registry = builtin_registry();
        let unit_len = |name: &str| registry
            .get(name)
            .unwrap()
            .decoder()
            .unit_len(crate::ConversionState::INITIAL);
        assert_eq!(unit_len("UTF-8"), 1);
        assert_eq!(unit_len("utf-16le"), 2);
        assert_eq!(unit_len("UTF-32"), 4);
        assert_eq!(unit_len("ISO-2022-JP"), 1);
    }
}
