//! Catalog of encodings available as conversion source or target.
//!
//! A [`Registry`] is assembled once through a [`RegistryBuilder`] and is
//! read-only afterwards, so a single instance can back any number of
//! [`Converter`](crate::Converter)s on any number of threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use crate::codec::{Decoder, Encoder};
use crate::encodings;
use crate::{Error, Result};

/// Index of an entry inside one [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncodingId(usize);

impl EncodingId {
    /// Position of the entry in registration order
    pub fn index(self) -> usize {
        self.0
    }
}

/// Which directions an entry can serve in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Directions {
    /// Usable as a conversion source
    pub decode: bool,
    /// Usable as a conversion target
    pub encode: bool,
}

impl Directions {
    /// Both directions
    pub const BOTH: Directions = Directions {
        decode: true,
        encode: true,
    };
    /// Source only; the entry's encoder is a placeholder
    pub const DECODE_ONLY: Directions = Directions {
        decode: true,
        encode: false,
    };
    /// Target only; the entry's decoder is a placeholder
    pub const ENCODE_ONLY: Directions = Directions {
        decode: false,
        encode: true,
    };
}

/// One registered encoding: a name plus both halves of its behavior.
pub struct EncodingEntry {
    name: String,
    decoder: Box<dyn Decoder>,
    encoder: Box<dyn Encoder>,
    directions: Directions,
}

impl EncodingEntry {
    /// Canonical name as registered
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte to code point half
    pub fn decoder(&self) -> &dyn Decoder {
        self.decoder.as_ref()
    }

    /// Code point to byte half
    pub fn encoder(&self) -> &dyn Encoder {
        self.encoder.as_ref()
    }

    /// Directions this entry supports
    pub fn directions(&self) -> Directions {
        self.directions
    }
}

impl fmt::Debug for EncodingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodingEntry")
            .field("name", &self.name)
            .field("directions", &self.directions)
            .finish_non_exhaustive()
    }
}

/// Collects entries before freezing them into a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    entries: Vec<EncodingEntry>,
    by_name: HashMap<String, EncodingId>,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an encoding usable in both directions
    pub fn register<D, E>(self, name: &str, decoder: D, encoder: E) -> Result<Self>
    where
        D: Decoder + 'static,
        E: Encoder + 'static,
    {
        self.register_with(name, decoder, encoder, Directions::BOTH)
    }

    /// Register an encoding with explicit direction support
    ///
    /// Both halves are always required, even when one of them is never
    /// reachable through `directions`.
    pub fn register_with<D, E>(
        mut self,
        name: &str,
        decoder: D,
        encoder: E,
        directions: Directions,
    ) -> Result<Self>
    where
        D: Decoder + 'static,
        E: Encoder + 'static,
    {
        let key = name.to_ascii_uppercase();
        if self.by_name.contains_key(&key) {
            return Err(Error::DuplicateEncoding {
                name: name.to_string(),
            });
        }

        let id = EncodingId(self.entries.len());
        self.by_name.insert(key, id);
        self.entries.push(EncodingEntry {
            name: name.to_string(),
            decoder: Box::new(decoder),
            encoder: Box::new(encoder),
            directions,
        });
        Ok(self)
    }

    /// Infallible registration for the bundled table, whose names are known unique.
    pub(crate) fn with_entry<D, E>(mut self, name: &str, decoder: D, encoder: E) -> Self
    where
        D: Decoder + 'static,
        E: Encoder + 'static,
    {
        let id = EncodingId(self.entries.len());
        let previous = self.by_name.insert(name.to_ascii_uppercase(), id);
        debug_assert!(previous.is_none(), "duplicate builtin encoding {name}");
        self.entries.push(EncodingEntry {
            name: name.to_string(),
            decoder: Box::new(decoder),
            encoder: Box::new(encoder),
            directions: Directions::BOTH,
        });
        self
    }

    /// Freeze the collected entries
    pub fn build(self) -> Registry {
        Registry {
            entries: self.entries,
            by_name: self.by_name,
        }
    }
}

/// Immutable name to decoder/encoder mapping.
pub struct Registry {
    entries: Vec<EncodingEntry>,
    by_name: HashMap<String, EncodingId>,
}

impl Registry {
    /// Start assembling a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Process-wide registry holding the bundled encodings
    pub fn builtin() -> &'static Registry {
        static BUILTIN: OnceLock<Registry> = OnceLock::new();
        BUILTIN.get_or_init(encodings::builtin_registry)
    }

    /// Resolve a name (ASCII case-insensitive) to its entry id
    pub fn lookup(&self, name: &str) -> Result<EncodingId> {
        self.by_name
            .get(&name.to_ascii_uppercase())
            .copied()
            .ok_or_else(|| Error::UnknownEncoding {
                name: name.to_string(),
            })
    }

    /// Entry for an id, or `None` if `id` was handed out by a larger registry
    pub fn entry(&self, id: EncodingId) -> Option<&EncodingEntry> {
        self.entries.get(id.0)
    }

    /// Resolve a name straight to its entry
    pub fn get(&self, name: &str) -> Result<&EncodingEntry> {
        let id = self.lookup(name)?;
        // ids in `by_name` always index `entries`
        Ok(&self.entries[id.0])
    }

    /// All entries in registration order
    pub fn entries(&self) -> impl Iterator<Item = (EncodingId, &EncodingEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (EncodingId(index), entry))
    }

    /// Number of registered encodings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RejectAll;
    use crate::encodings::{Ascii, Utf8};

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = Registry::builder()
            .register("US-ASCII", Ascii, Ascii)
            .unwrap()
            .build();

        let id = registry.lookup("us-ascii").unwrap();
        assert_eq!(registry.entry(id).map(EncodingEntry::name), Some("US-ASCII"));
        assert_eq!(id.index(), 0);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let err = Registry::builder()
            .register("UTF-8", Utf8, Utf8)
            .unwrap()
            .register("utf-8", Utf8, Utf8)
            .err();

        assert_eq!(
            err.map(|e| e.to_string()),
            Some("encoding utf-8 is already registered".to_string())
        );
    }

    #[test]
    fn test_unknown_name() {
        let registry = Registry::builder().build();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.lookup("UTF-8"),
            Err(Error::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn test_decode_only_entry_keeps_both_halves() {
        let registry = Registry::builder()
            .register_with("SINK", Ascii, RejectAll, Directions::DECODE_ONLY)
            .unwrap()
            .build();

        let entry = registry.get("SINK").unwrap();
        assert!(entry.directions().decode);
        assert!(!entry.directions().encode);
    }

    #[test]
    fn test_builtin_registry_lists_in_order() {
        let registry = Registry::builtin();
        let names: Vec<_> = registry.entries().map(|(_, e)| e.name()).collect();

        assert_eq!(names.first(), Some(&"US-ASCII"));
        assert!(names.contains(&"UTF-8"));
        assert!(names.contains(&"ISO-2022-JP"));
        assert_eq!(names.len(), registry.len());
    }

    #[test]
    fn test_builtin_is_shared() {
        assert!(std::ptr::eq(Registry::builtin(), Registry::builtin()));
    }
}
