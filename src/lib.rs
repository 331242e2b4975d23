//! # fast-iconv - Stateful Character Encoding Transcoding
//!
//! A transcoding engine that converts byte streams between arbitrary text
//! encodings by routing every unit through a canonical code point.
//!
//! ## Features
//!
//! - **One uniform interface** for stateless 8-bit sets, variable-width Unicode
//!   forms, escape-based ISO-2022 encodings and bit-packed UTF-7
//! - **Resumable conversions**: incomplete input and full output buffers are
//!   reported precisely so the next call picks up at the exact same unit
//! - **Pluggable encodings** registered as decoder/encoder pairs
//! - **Transliteration, discard mode and fallback callbacks** for input that
//!   does not map cleanly
//!
//! ## Quick Start
//!
//! ```rust
//! use fast_iconv::{Converter, Status};
//!
//! let mut converter = Converter::new("ISO-8859-1", "UTF-8").unwrap();
//!
//! let mut output = [0u8; 16];
//! let result = converter.convert(b"caf\xE9", &mut output);
//! assert_eq!(result.status, Status::Complete);
//! assert_eq!(&output[..result.produced], "café".as_bytes());
//! ```

#![deny(missing_docs)]

use std::fmt;

pub mod codec;
mod converter;
pub mod encodings;
mod options;
pub mod registry;
mod stream;
pub mod translit;

pub use codec::{DecodeOutcome, Decoder, EncodeOutcome, Encoder};
pub use converter::{Conversion, Converter, Status};
pub use options::{ConversionOptions, Fallbacks, Hooks};
pub use registry::{Directions, EncodingEntry, EncodingId, Registry, RegistryBuilder};
pub use stream::StreamingConverter;

/// Canonical intermediate value: one abstract character, encoding independent.
pub type CodePoint = u32;

/// Result type for setup and whole-buffer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by setup and by the whole-buffer helpers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Source or target name is not in the registry
    #[error("unknown encoding: {name}")]
    UnknownEncoding {
        /// The name that was looked up
        name: String,
    },
    /// An encoding with the same name is already registered
    #[error("encoding {name} is already registered")]
    DuplicateEncoding {
        /// The conflicting name
        name: String,
    },
    /// The source cannot decode or the target cannot encode
    #[error("unsupported conversion from {from} to {to}")]
    UnsupportedPairing {
        /// Source encoding name
        from: String,
        /// Target encoding name
        to: String,
    },
    /// Input bytes are not valid in the source encoding
    #[error("illegal input sequence at byte offset {offset}")]
    IllegalSequence {
        /// Offset of the first byte of the offending unit
        offset: usize,
    },
    /// Input ended inside a multi-byte unit
    #[error("incomplete input sequence at byte offset {offset}")]
    IncompleteSequence {
        /// Offset where the truncated unit starts
        offset: usize,
    },
    /// The target encoding cannot represent a decoded character
    #[error("cannot convert U+{code_point:04X} (input byte offset {offset})")]
    Unrepresentable {
        /// The character that could not be encoded
        code_point: CodePoint,
        /// Offset of the input unit that produced it
        offset: usize,
    },
    /// The output buffer cannot hold the next unit or reset sequence
    #[error("output buffer too small")]
    OutputTooSmall,
}

/// Opaque per-direction conversion state.
///
/// Zero is always the initial state. Every other value is private to the
/// decoder or encoder that produced it; the driving loop only stores,
/// snapshots and restores it.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ConversionState(u32);

impl ConversionState {
    /// The neutral state every conversion direction starts in
    pub const INITIAL: ConversionState = ConversionState(0);

    /// Wrap implementation-defined state bits
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        ConversionState(bits)
    }

    /// Implementation-defined state bits
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether this is the neutral state
    #[inline]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConversionState({:#010x})", self.0)
    }
}
