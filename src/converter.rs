//! Conversion descriptor and the loop that drives decoder and encoder.

use tracing::{debug, trace};

use crate::codec::{DecodeOutcome, EncodeOutcome};
use crate::options::{ConversionOptions, Fallbacks, Hooks};
use crate::registry::{EncodingEntry, EncodingId, Registry};
use crate::translit;
use crate::{CodePoint, ConversionState, Error, Result};

/// Why a [`Converter::convert`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// All input was converted
    Complete,
    /// The unit at `offset` is not valid in the source encoding.
    ///
    /// `shift_len` bytes of shift sequence in front of the bad bytes were
    /// recognized; the offending bytes start at `offset + shift_len`.
    IllegalSequence {
        /// Start of the unit, relative to this call's input
        offset: usize,
        /// Length of the valid shift sequence preceding the bad bytes
        shift_len: usize,
    },
    /// Input ends inside a unit; resupply from `offset` with more bytes appended
    IncompleteSequence {
        /// Start of the truncated unit
        offset: usize,
    },
    /// The unit at `offset` decodes to a character the target cannot encode
    Unrepresentable {
        /// Start of the unit
        offset: usize,
        /// The character that could not be placed
        code_point: CodePoint,
    },
    /// The output buffer cannot hold the unit at `offset`
    OutputTooSmall {
        /// Start of the unit that did not fit
        offset: usize,
    },
}

impl Status {
    /// Whether the call ran to the end of its input
    pub fn is_complete(&self) -> bool {
        matches!(self, Status::Complete)
    }

    /// Whether calling again with more input or more output space can continue
    pub fn is_resumable(&self) -> bool {
        matches!(
            self,
            Status::Complete | Status::IncompleteSequence { .. } | Status::OutputTooSmall { .. }
        )
    }

    /// Map a non-complete status onto [`Error`], shifting offsets by `base`.
    ///
    /// Illegal sequences are reported at the first offending byte, after any
    /// recognized shift sequence.
    pub fn to_error(self, base: usize) -> Option<Error> {
        match self {
            Status::Complete => None,
            Status::IllegalSequence { offset, shift_len } => Some(Error::IllegalSequence {
                offset: base + offset + shift_len,
            }),
            Status::IncompleteSequence { offset } => Some(Error::IncompleteSequence {
                offset: base + offset,
            }),
            Status::Unrepresentable { offset, code_point } => Some(Error::Unrepresentable {
                code_point,
                offset: base + offset,
            }),
            Status::OutputTooSmall { .. } => Some(Error::OutputTooSmall),
        }
    }
}

/// Outcome of one [`Converter::convert`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Input bytes that decoded to characters or shift sequences
    pub consumed: usize,
    /// Input bytes skipped as illegal in discard mode
    pub discarded: usize,
    /// Bytes written to the output buffer
    pub produced: usize,
    /// Characters replaced by a fallback or transliteration, or dropped
    pub irreversible: usize,
    /// Why the call stopped
    pub status: Status,
}

impl Conversion {
    /// How far the input cursor moved: the next call starts at this offset
    pub fn advanced(&self) -> usize {
        self.consumed + self.discarded
    }

    /// `Ok(self)` when complete, the matching [`Error`] otherwise
    pub fn into_result(self) -> Result<Conversion> {
        match self.status.to_error(0) {
            None => Ok(self),
            Some(err) => Err(err),
        }
    }
}

/// Running totals of one call.
#[derive(Default)]
struct Totals {
    consumed: usize,
    discarded: usize,
    produced: usize,
    irreversible: usize,
}

impl Totals {
    fn finish(self, status: Status) -> Conversion {
        Conversion {
            consumed: self.consumed,
            discarded: self.discarded,
            produced: self.produced,
            irreversible: self.irreversible,
            status,
        }
    }
}

/// Why a character could not be placed in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Unrepresentable(CodePoint),
    OutputTooSmall,
}

impl Stop {
    fn into_error(self, offset: usize) -> Error {
        match self {
            Stop::Unrepresentable(code_point) => Error::Unrepresentable { code_point, offset },
            Stop::OutputTooSmall => Error::OutputTooSmall,
        }
    }

    fn at(self, offset: usize) -> Status {
        match self {
            Stop::Unrepresentable(code_point) => Status::Unrepresentable { offset, code_point },
            Stop::OutputTooSmall => Status::OutputTooSmall { offset },
        }
    }
}

/// What became of one decoded character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Written as itself or as a replacement
    Written(usize),
    /// Dropped under discard mode or transliteration
    Dropped,
}

impl Placement {
    fn len(self) -> usize {
        match self {
            Placement::Written(written) => written,
            Placement::Dropped => 0,
        }
    }
}

/// Unicode tag characters carry no visible text. Transliteration drops them
/// when the target cannot hold them.
fn is_tag_character(code_point: CodePoint) -> bool {
    (0xE0000..=0xE007F).contains(&code_point)
}

/// Live conversion handle binding one source decoder and one target encoder.
///
/// A converter owns both conversion states exclusively. It is a sequential
/// state machine: `convert` takes `&mut self`, so one converter is never
/// driven from two places at once, while independent converters (even over
/// the same registry entries) share nothing mutable.
///
/// Dropping a converter does not flush it; call [`Converter::flush`] to
/// terminate a stream cleanly.
pub struct Converter<'r> {
    source: &'r EncodingEntry,
    target: &'r EncodingEntry,
    trivial: bool,
    decode_state: ConversionState,
    encode_state: ConversionState,
    options: ConversionOptions,
    fallbacks: Option<Box<dyn Fallbacks + 'r>>,
    hooks: Option<Box<dyn Hooks + 'r>>,
}

impl Converter<'static> {
    /// Open a converter over the built-in registry
    ///
    /// `to` may carry `//TRANSLIT` and `//IGNORE` suffixes.
    pub fn new(from: &str, to: &str) -> Result<Self> {
        Converter::open(Registry::builtin(), from, to)
    }
}

impl<'r> Converter<'r> {
    /// Open a converter between two entries of `registry`
    ///
    /// `to` may carry `//TRANSLIT` and `//IGNORE` suffixes.
    pub fn open(registry: &'r Registry, from: &str, to: &str) -> Result<Self> {
        let (to_name, options) = ConversionOptions::parse_target(to);
        let source_id = registry.lookup(from)?;
        let target_id = registry.lookup(to_name)?;
        let converter = Self::from_ids(registry, source_id, target_id)?;
        Ok(converter.with_options(options))
    }

    /// Open a converter from already resolved ids
    ///
    /// Fails with [`Error::UnknownEncoding`] if an id was not handed out by
    /// `registry`.
    pub fn from_ids(registry: &'r Registry, from: EncodingId, to: EncodingId) -> Result<Self> {
        let resolve = |id: EncodingId| {
            registry.entry(id).ok_or_else(|| Error::UnknownEncoding {
                name: format!("#{}", id.index()),
            })
        };
        let source = resolve(from)?;
        let target = resolve(to)?;

        if !source.directions().decode || !target.directions().encode {
            return Err(Error::UnsupportedPairing {
                from: source.name().to_string(),
                to: target.name().to_string(),
            });
        }

        debug!(from = source.name(), to = target.name(), "opened converter");

        Ok(Self {
            source,
            target,
            trivial: from == to,
            decode_state: ConversionState::INITIAL,
            encode_state: ConversionState::INITIAL,
            options: ConversionOptions::default(),
            fallbacks: None,
            hooks: None,
        })
    }

    /// Builder-style variant of [`Converter::set_options`]
    pub fn with_options(mut self, options: ConversionOptions) -> Self {
        self.options = options;
        self
    }

    /// Source encoding name
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Target encoding name
    pub fn target_name(&self) -> &str {
        self.target.name()
    }

    /// Whether source and target are the same encoding
    pub fn is_trivial(&self) -> bool {
        self.trivial
    }

    /// Current option flags
    pub fn options(&self) -> ConversionOptions {
        self.options
    }

    /// Replace all option flags
    pub fn set_options(&mut self, options: ConversionOptions) {
        self.options = options;
    }

    /// Toggle transliteration of unrepresentable characters
    pub fn set_transliterate(&mut self, enabled: bool) {
        self.options.transliterate = enabled;
    }

    /// Toggle skipping of illegal input
    pub fn set_discard_illegal(&mut self, enabled: bool) {
        self.options.discard_illegal = enabled;
    }

    /// Install replacement callbacks
    pub fn set_fallbacks(&mut self, fallbacks: Box<dyn Fallbacks + 'r>) {
        self.fallbacks = Some(fallbacks);
    }

    /// Remove replacement callbacks
    pub fn clear_fallbacks(&mut self) {
        self.fallbacks = None;
    }

    /// Install a per-character observer
    pub fn set_hooks(&mut self, hooks: Box<dyn Hooks + 'r>) {
        self.hooks = Some(hooks);
    }

    /// Remove the per-character observer
    pub fn clear_hooks(&mut self) {
        self.hooks = None;
    }

    /// Current decoder state
    pub fn decode_state(&self) -> ConversionState {
        self.decode_state
    }

    /// Current encoder state
    pub fn encode_state(&self) -> ConversionState {
        self.encode_state
    }

    /// Return both directions to the initial state without writing anything
    pub fn reset(&mut self) {
        debug!(from = self.source.name(), to = self.target.name(), "reset converter");
        self.decode_state = ConversionState::INITIAL;
        self.encode_state = ConversionState::INITIAL;
    }

    /// Convert as much of `input` into `output` as possible.
    ///
    /// The call stops when input runs out, when a unit is illegal, truncated
    /// or unrepresentable, or when the next unit does not fit. In every
    /// stopping case the states and [`Conversion::advanced`] are left such
    /// that calling again with `&input[advanced..]` (plus more input, or more
    /// output space) continues exactly where this call left off.
    pub fn convert(&mut self, input: &[u8], output: &mut [u8]) -> Conversion {
        let decoder = self.source.decoder();
        let mut totals = Totals::default();
        let mut pos = 0;

        let status = loop {
            let window = &input[pos..];
            if window.is_empty() {
                break Status::Complete;
            }

            let saved = self.decode_state;
            match decoder.decode_unit(&mut self.decode_state, window) {
                DecodeOutcome::Consumed { code_point, len } => {
                    debug_assert!(len >= 1 && len <= window.len());
                    let out = &mut output[totals.produced..];
                    match self.place(code_point, out, &mut totals.irreversible) {
                        Ok(placement) => {
                            totals.produced += placement.len();
                            totals.consumed += len;
                            pos += len;
                            if let Placement::Written(_) = placement {
                                self.notify(&[code_point]);
                            }
                        }
                        Err(stop) => {
                            self.decode_state = saved;
                            break stop.at(pos);
                        }
                    }
                }
                DecodeOutcome::ShiftOnly(len) => {
                    debug_assert!(len >= 1 && len <= window.len());
                    totals.consumed += len;
                    pos += len;
                }
                DecodeOutcome::Incomplete => {
                    self.decode_state = saved;
                    break Status::IncompleteSequence { offset: pos };
                }
                DecodeOutcome::Invalid => {
                    if let Some(status) = self.recover(window, 0, saved, output, &mut totals, &mut pos) {
                        break status;
                    }
                }
                DecodeOutcome::InvalidAfterShift(shift_len) => {
                    debug_assert!(shift_len <= window.len());
                    if let Some(status) =
                        self.recover(window, shift_len, saved, output, &mut totals, &mut pos)
                    {
                        break status;
                    }
                }
            }
        };

        if !status.is_resumable() {
            debug!(
                from = self.source.name(),
                to = self.target.name(),
                ?status,
                consumed = totals.consumed,
                "conversion stopped"
            );
        }

        totals.finish(status)
    }

    /// Terminate the stream: surface any held-back character, then write the
    /// target's return-to-initial sequence. Returns the bytes written.
    ///
    /// On failure both states are restored, so the flush can be retried with
    /// a larger buffer. Hooks only see the surfaced character once the whole
    /// flush succeeded.
    pub fn flush(&mut self, output: &mut [u8]) -> Result<usize> {
        let saved_decode = self.decode_state;
        let saved_encode = self.encode_state;
        let mut produced = 0;
        let mut irreversible = 0;
        let mut placed = None;

        if let Some(code_point) = self.source.decoder().flush(&mut self.decode_state) {
            match self.place(code_point, output, &mut irreversible) {
                Ok(placement) => {
                    produced = placement.len();
                    if let Placement::Written(_) = placement {
                        placed = Some(code_point);
                    }
                }
                Err(stop) => {
                    self.decode_state = saved_decode;
                    self.encode_state = saved_encode;
                    return Err(stop.into_error(0));
                }
            }
        }

        match self
            .target
            .encoder()
            .reset(&mut self.encode_state, &mut output[produced..])
        {
            EncodeOutcome::Written(written) => produced += written,
            EncodeOutcome::CapacityTooSmall => {
                self.decode_state = saved_decode;
                self.encode_state = saved_encode;
                return Err(Error::OutputTooSmall);
            }
            // a reset has no character to represent
            EncodeOutcome::Unrepresentable => self.encode_state = ConversionState::INITIAL,
        }

        if let Some(code_point) = placed {
            self.notify(&[code_point]);
        }

        debug!(from = self.source.name(), to = self.target.name(), produced, "flushed converter");
        Ok(produced)
    }

    /// Handle an illegal unit: skip it in discard mode, replace it through the
    /// fallbacks, or stop. Returns the status to stop with, if any.
    fn recover(
        &mut self,
        window: &[u8],
        shift_len: usize,
        saved: ConversionState,
        output: &mut [u8],
        totals: &mut Totals,
        pos: &mut usize,
    ) -> Option<Status> {
        let unit_len = self.source.decoder().unit_len(self.decode_state);
        let unit_end = (shift_len + unit_len).min(window.len());

        if self.options.discard_illegal {
            trace!(offset = *pos + shift_len, len = unit_end - shift_len, "discarding illegal input");
            totals.consumed += shift_len;
            totals.discarded += unit_end - shift_len;
            *pos += unit_end;
            return None;
        }

        let replacement = self
            .fallbacks
            .as_mut()
            .and_then(|fallbacks| fallbacks.invalid_input(&window[shift_len..unit_end]));

        if let Some(replacement) = replacement {
            trace!(offset = *pos + shift_len, ?replacement, "replacing illegal input");
            match self.place_sequence(&replacement, &mut output[totals.produced..]) {
                Ok(written) => {
                    totals.produced += written;
                    totals.consumed += unit_end;
                    totals.irreversible += 1;
                    *pos += unit_end;
                    self.notify(&replacement);
                    return None;
                }
                Err(Stop::OutputTooSmall) => {
                    self.decode_state = saved;
                    return Some(Status::OutputTooSmall { offset: *pos });
                }
                Err(Stop::Unrepresentable(_)) => {}
            }
        }

        self.decode_state = saved;
        Some(Status::IllegalSequence {
            offset: *pos,
            shift_len,
        })
    }

    /// Encode one decoded character, resolving it when the target cannot
    /// represent it.
    fn place(
        &mut self,
        code_point: CodePoint,
        output: &mut [u8],
        irreversible: &mut usize,
    ) -> std::result::Result<Placement, Stop> {
        let encoder = self.target.encoder();
        match encoder.encode_unit(&mut self.encode_state, code_point, output) {
            EncodeOutcome::Written(written) => Ok(Placement::Written(written)),
            EncodeOutcome::CapacityTooSmall => Err(Stop::OutputTooSmall),
            EncodeOutcome::Unrepresentable => match self.substitute(code_point, output)? {
                Some(written) => {
                    *irreversible += 1;
                    Ok(Placement::Written(written))
                }
                None if is_tag_character(code_point) && self.options.transliterate => {
                    trace!(code_point, "dropping tag character");
                    *irreversible += 1;
                    Ok(Placement::Dropped)
                }
                None if self.options.discard_illegal => {
                    trace!(code_point, "dropping unrepresentable character");
                    *irreversible += 1;
                    Ok(Placement::Dropped)
                }
                None => Err(Stop::Unrepresentable(code_point)),
            },
        }
    }

    /// Report written characters to the installed hooks.
    fn notify(&mut self, code_points: &[CodePoint]) {
        if let Some(hooks) = self.hooks.as_mut() {
            for &code_point in code_points {
                hooks.converted(code_point);
            }
        }
    }

    /// Try the installed fallback, then transliteration. `Ok(None)` means
    /// neither produced an encodable replacement.
    fn substitute(
        &mut self,
        code_point: CodePoint,
        output: &mut [u8],
    ) -> std::result::Result<Option<usize>, Stop> {
        let replacement = self
            .fallbacks
            .as_mut()
            .and_then(|fallbacks| fallbacks.unrepresentable(code_point));
        if let Some(replacement) = replacement {
            match self.place_sequence(&replacement, output) {
                Ok(written) => {
                    trace!(code_point, ?replacement, "fallback replacement");
                    return Ok(Some(written));
                }
                Err(Stop::OutputTooSmall) => return Err(Stop::OutputTooSmall),
                Err(Stop::Unrepresentable(_)) => {}
            }
        }

        if self.options.transliterate {
            if let Some(replacement) = translit::lookup(code_point) {
                match self.place_sequence(&replacement, output) {
                    Ok(written) => {
                        trace!(code_point, ?replacement, "transliterated");
                        return Ok(Some(written));
                    }
                    Err(Stop::OutputTooSmall) => return Err(Stop::OutputTooSmall),
                    Err(Stop::Unrepresentable(_)) => {}
                }
            }
        }

        Ok(None)
    }

    /// Encode a replacement sequence all-or-nothing.
    fn place_sequence(
        &mut self,
        sequence: &[CodePoint],
        output: &mut [u8],
    ) -> std::result::Result<usize, Stop> {
        let encoder = self.target.encoder();
        let saved = self.encode_state;
        let mut written = 0;

        for &code_point in sequence {
            match encoder.encode_unit(&mut self.encode_state, code_point, &mut output[written..]) {
                EncodeOutcome::Written(n) => written += n,
                EncodeOutcome::CapacityTooSmall => {
                    self.encode_state = saved;
                    return Err(Stop::OutputTooSmall);
                }
                EncodeOutcome::Unrepresentable => {
                    self.encode_state = saved;
                    return Err(Stop::Unrepresentable(code_point));
                }
            }
        }

        Ok(written)
    }
}

impl std::fmt::Debug for Converter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("source", &self.source.name())
            .field("target", &self.target.name())
            .field("decode_state", &self.decode_state)
            .field("encode_state", &self.encode_state)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
