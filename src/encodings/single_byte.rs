//! Stateless 8-bit character sets.
//!
//! [`Ascii`] and [`Latin1`] are computed directly. Every other set is a
//! [`SingleByte`] driven by a 256-entry table, with a reverse index built once
//! when the registry is assembled.

use crate::codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder, emit};
use crate::{CodePoint, ConversionState};

/// Table slot for bytes the set leaves undefined.
const UNMAPPED: u16 = 0xFFFF;

/// 7-bit US-ASCII.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii;

impl Decoder for Ascii {
    #[inline]
    fn decode_unit(&self, _: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        match input[0] {
            byte @ 0x00..=0x7F => DecodeOutcome::Consumed {
                code_point: CodePoint::from(byte),
                len: 1,
            },
            _ => DecodeOutcome::Invalid,
        }
    }
}

impl Encoder for Ascii {
    #[inline]
    fn encode_unit(
        &self,
        _: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        match u8::try_from(code_point) {
            Ok(byte) if byte < 0x80 => emit(&[byte], output),
            _ => EncodeOutcome::Unrepresentable,
        }
    }
}

/// ISO-8859-1, whose bytes are the first 256 code points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latin1;

impl Decoder for Latin1 {
    #[inline]
    fn decode_unit(&self, _: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        DecodeOutcome::Consumed {
            code_point: CodePoint::from(input[0]),
            len: 1,
        }
    }
}

impl Encoder for Latin1 {
    #[inline]
    fn encode_unit(
        &self,
        _: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        match u8::try_from(code_point) {
            Ok(byte) => emit(&[byte], output),
            Err(_) => EncodeOutcome::Unrepresentable,
        }
    }
}

/// Table-driven 8-bit character set.
pub struct SingleByte {
    to_unicode: &'static [u16; 256],
    /// `(code point, byte)` pairs sorted by code point
    from_unicode: Vec<(u16, u8)>,
}

impl SingleByte {
    /// Build a set from its byte to code point table.
    ///
    /// Entries equal to `0xFFFF` mark undefined bytes.
    pub fn new(to_unicode: &'static [u16; 256]) -> Self {
        let mut from_unicode: Vec<(u16, u8)> = (0..=u8::MAX)
            .zip(to_unicode.iter())
            .filter(|&(_, &cp)| cp != UNMAPPED)
            .map(|(byte, &cp)| (cp, byte))
            .collect();
        from_unicode.sort_unstable();
        from_unicode.dedup_by_key(|&mut (cp, _)| cp);

        Self {
            to_unicode,
            from_unicode,
        }
    }

    /// ISO-8859-15 (Latin-9): Latin-1 with the euro sign and French and Finnish letters
    pub fn iso_8859_15() -> Self {
        Self::new(&ISO_8859_15)
    }

    /// Windows code page 1252 (Western European)
    pub fn windows_1252() -> Self {
        Self::new(&WINDOWS_1252)
    }

    /// IBM EBCDIC code page 037 (US/Canada)
    pub fn ibm037() -> Self {
        Self::new(&IBM037)
    }

    /// Number of bytes with a defined mapping
    pub fn mapped_count(&self) -> usize {
        self.from_unicode.len()
    }
}

impl std::fmt::Debug for SingleByte {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleByte")
            .field("mapped", &self.from_unicode.len())
            .finish()
    }
}

impl Decoder for SingleByte {
    #[inline]
    fn decode_unit(&self, _: &mut ConversionState, input: &[u8]) -> DecodeOutcome {
        match self.to_unicode[usize::from(input[0])] {
            UNMAPPED => DecodeOutcome::Invalid,
            cp => DecodeOutcome::Consumed {
                code_point: CodePoint::from(cp),
                len: 1,
            },
        }
    }
}

impl Encoder for SingleByte {
    fn encode_unit(
        &self,
        _: &mut ConversionState,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> EncodeOutcome {
        let Ok(key) = u16::try_from(code_point) else {
            return EncodeOutcome::Unrepresentable;
        };
        if key == UNMAPPED {
            return EncodeOutcome::Unrepresentable;
        }

        match self.from_unicode.binary_search_by_key(&key, |&(cp, _)| cp) {
            Ok(found) => emit(&[self.from_unicode[found].1], output),
            Err(_) => EncodeOutcome::Unrepresentable,
        }
    }
}

/// Identity table patched at the given bytes.
const fn latin1_with(patches: &[(u8, u16)]) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = i as u16;
        i += 1;
    }
    let mut j = 0;
    while j < patches.len() {
        table[patches[j].0 as usize] = patches[j].1;
        j += 1;
    }
    table
}

static ISO_8859_15: [u16; 256] = latin1_with(&[
    (0xA4, 0x20AC),
    (0xA6, 0x0160),
    (0xA8, 0x0161),
    (0xB4, 0x017D),
    (0xB8, 0x017E),
    (0xBC, 0x0152),
    (0xBD, 0x0153),
    (0xBE, 0x0178),
]);

static WINDOWS_1252: [u16; 256] = latin1_with(&[
    (0x80, 0x20AC),
    (0x81, UNMAPPED),
    (0x82, 0x201A),
    (0x83, 0x0192),
    (0x84, 0x201E),
    (0x85, 0x2026),
    (0x86, 0x2020),
    (0x87, 0x2021),
    (0x88, 0x02C6),
    (0x89, 0x2030),
    (0x8A, 0x0160),
    (0x8B, 0x2039),
    (0x8C, 0x0152),
    (0x8D, UNMAPPED),
    (0x8E, 0x017D),
    (0x8F, UNMAPPED),
    (0x90, UNMAPPED),
    (0x91, 0x2018),
    (0x92, 0x2019),
    (0x93, 0x201C),
    (0x94, 0x201D),
    (0x95, 0x2022),
    (0x96, 0x2013),
    (0x97, 0x2014),
    (0x98, 0x02DC),
    (0x99, 0x2122),
    (0x9A, 0x0161),
    (0x9B, 0x203A),
    (0x9C, 0x0153),
    (0x9D, UNMAPPED),
    (0x9E, 0x017E),
    (0x9F, 0x0178),
]);

#[rustfmt::skip]
static IBM037: [u16; 256] = [
    0x0000, 0x0001, 0x0002, 0x0003, 0x009C, 0x0009, 0x0086, 0x007F, 0x0097, 0x008D, 0x008E, 0x000B, 0x000C, 0x000D, 0x000E, 0x000F,
    0x0010, 0x0011, 0x0012, 0x0013, 0x009D, 0x0085, 0x0008, 0x0087, 0x0018, 0x0019, 0x0092, 0x008F, 0x001C, 0x001D, 0x001E, 0x001F,
    0x0080, 0x0081, 0x0082, 0x0083, 0x0084, 0x000A, 0x0017, 0x001B, 0x0088, 0x0089, 0x008A, 0x008B, 0x008C, 0x0005, 0x0006, 0x0007,
    0x0090, 0x0091, 0x0016, 0x0093, 0x0094, 0x0095, 0x0096, 0x0004, 0x0098, 0x0099, 0x009A, 0x009B, 0x0014, 0x0015, 0x009E, 0x001A,
    0x0020, 0x00A0, 0x00E2, 0x00E4, 0x00E0, 0x00E1, 0x00E3, 0x00E5, 0x00E7, 0x00F1, 0x00A2, 0x002E, 0x003C, 0x0028, 0x002B, 0x007C,
    0x0026, 0x00E9, 0x00EA, 0x00EB, 0x00E8, 0x00ED, 0x00EE, 0x00EF, 0x00EC, 0x00DF, 0x0021, 0x0024, 0x002A, 0x0029, 0x003B, 0x00AC,
    0x002D, 0x002F, 0x00C2, 0x00C4, 0x00C0, 0x00C1, 0x00C3, 0x00C5, 0x00C7, 0x00D1, 0x00A6, 0x002C, 0x0025, 0x005F, 0x003E, 0x003F,
    0x00F8, 0x00C9, 0x00CA, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC, 0x0060, 0x003A, 0x0023, 0x0040, 0x0027, 0x003D, 0x0022,
    0x00D8, 0x0061, 0x0062, 0x0063, 0x0064, 0x0065, 0x0066, 0x0067, 0x0068, 0x0069, 0x00AB, 0x00BB, 0x00F0, 0x00FD, 0x00FE, 0x00B1,
    0x00B0, 0x006A, 0x006B, 0x006C, 0x006D, 0x006E, 0x006F, 0x0070, 0x0071, 0x0072, 0x00AA, 0x00BA, 0x00E6, 0x00B8, 0x00C6, 0x00A4,
    0x00B5, 0x007E, 0x0073, 0x0074, 0x0075, 0x0076, 0x0077, 0x0078, 0x0079, 0x007A, 0x00A1, 0x00BF, 0x00D0, 0x00DD, 0x00DE, 0x00AE,
    0x005E, 0x00A3, 0x00A5, 0x00B7, 0x00A9, 0x00A7, 0x00B6, 0x00BC, 0x00BD, 0x00BE, 0x005B, 0x005D, 0x00AF, 0x00A8, 0x00B4, 0x00D7,
    0x007B, 0x0041, 0x0042, 0x0043, 0x0044, 0x0045, 0x0046, 0x0047, 0x0048, 0x0049, 0x00AD, 0x00F4, 0x00F6, 0x00F2, 0x00F3, 0x00F5,
    0x007D, 0x004A, 0x004B, 0x004C, 0x004D, 0x004E, 0x004F, 0x0050, 0x0051, 0x0052, 0x00B9, 0x00FB, 0x00FC, 0x00F9, 0x00FA, 0x00FF,
    0x005C, 0x00F7, 0x0053, 0x0054, 0x0055, 0x0056, 0x0057, 0x0058, 0x0059, 0x005A, 0x00B2, 0x00D4, 0x00D6, 0x00D2, 0x00D3, 0x00D5,
    0x0030, 0x0031, 0x0032, 0x0033, 0x0034, 0x0035, 0x0036, 0x0037, 0x0038, 0x0039, 0x00B3, 0x00DB, 0x00DC, 0x00D9, 0x00DA, 0x009F,
];
