//! Chunked conversion on top of [`Converter::convert`].

use tracing::trace;

use crate::converter::{Converter, Status};
use crate::{Error, Result};

/// Default output buffer size for [`StreamingConverter`].
const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

const MIN_BUFFER_SIZE: usize = 16;

/// A conversion that stopped on a unit it cannot get past.
struct Stopped {
    /// Input advanced over before the failing unit, shift sequence included
    advanced: usize,
    error: Error,
}

/// Run `input` through the converter until it is used up or cannot go on.
///
/// Output is appended to `output`, growing `buffer` whenever not even one unit
/// fits. Returns how many input bytes were advanced over; errors carry
/// offsets shifted by `base`.
fn drive(
    converter: &mut Converter<'_>,
    input: &[u8],
    base: usize,
    buffer: &mut Vec<u8>,
    output: &mut Vec<u8>,
) -> std::result::Result<usize, Stopped> {
    let mut start = 0;

    loop {
        let result = converter.convert(&input[start..], buffer);
        output.extend_from_slice(&buffer[..result.produced]);
        let call_start = start;
        start += result.advanced();

        match result.status {
            Status::Complete | Status::IncompleteSequence { .. } => return Ok(start),
            Status::OutputTooSmall { .. } => {
                if result.advanced() == 0 && result.produced == 0 {
                    let grown = buffer.len().max(MIN_BUFFER_SIZE) * 2;
                    trace!(from = buffer.len(), to = grown, "growing output buffer");
                    buffer.resize(grown, 0);
                }
            }
            status => {
                // the decoder state is back to where the unit started, so the
                // cursor has to stay there too
                return Err(Stopped {
                    advanced: start,
                    error: status
                        .to_error(base + call_start)
                        .unwrap_or(Error::OutputTooSmall),
                });
            }
        }
    }
}

/// Terminate the conversion, growing `buffer` until the flush fits.
fn finish_into(
    converter: &mut Converter<'_>,
    position: usize,
    buffer: &mut Vec<u8>,
    output: &mut Vec<u8>,
) -> Result<()> {
    loop {
        match converter.flush(buffer) {
            Ok(written) => {
                output.extend_from_slice(&buffer[..written]);
                return Ok(());
            }
            Err(Error::OutputTooSmall) => {
                let grown = buffer.len().max(MIN_BUFFER_SIZE) * 2;
                buffer.resize(grown, 0);
            }
            Err(Error::Unrepresentable { code_point, .. }) => {
                return Err(Error::Unrepresentable {
                    code_point,
                    offset: position,
                });
            }
            Err(err) => return Err(err),
        }
    }
}

impl Converter<'_> {
    /// Convert a complete input in one go, then flush.
    ///
    /// Fails on the first illegal, truncated or unrepresentable unit that
    /// the converter's options do not resolve.
    pub fn convert_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; input.len().saturating_mul(2).max(MIN_BUFFER_SIZE)];
        let mut output = Vec::with_capacity(input.len());

        let advanced =
            drive(self, input, 0, &mut buffer, &mut output).map_err(|stopped| stopped.error)?;
        if advanced < input.len() {
            return Err(Error::IncompleteSequence { offset: advanced });
        }
        finish_into(self, advanced, &mut buffer, &mut output)?;
        Ok(output)
    }
}

/// Feeds arbitrarily split input through a [`Converter`].
///
/// A unit cut in half by a chunk boundary is held back and completed by the
/// next chunk, so the output does not depend on how the input was split.
///
/// ```rust
/// use fast_iconv::{Converter, StreamingConverter};
///
/// let converter = Converter::new("UTF-8", "UTF-16LE").unwrap();
/// let mut stream = StreamingConverter::new(converter);
///
/// let mut output = stream.process_chunk(&[b'a', 0xE2, 0x82]).unwrap();
/// output.extend(stream.process_chunk(&[0xAC]).unwrap());
/// output.extend(stream.finish().unwrap());
///
/// assert_eq!(output, [0x61, 0x00, 0xAC, 0x20]);
/// ```
#[derive(Debug)]
pub struct StreamingConverter<'r> {
    converter: Converter<'r>,
    pending: Vec<u8>,
    /// Stream offset of `pending[0]`
    position: usize,
    buffer: Vec<u8>,
}

impl<'r> StreamingConverter<'r> {
    /// Wrap a converter with the default 64 KiB output buffer
    pub fn new(converter: Converter<'r>) -> Self {
        Self::with_buffer_size(converter, DEFAULT_BUFFER_SIZE)
    }

    /// Wrap a converter with a custom initial output buffer size
    pub fn with_buffer_size(converter: Converter<'r>, buffer_size: usize) -> Self {
        Self {
            converter,
            pending: Vec::new(),
            position: 0,
            buffer: vec![0u8; buffer_size.max(MIN_BUFFER_SIZE)],
        }
    }

    /// Convert the next chunk of input.
    ///
    /// Errors report absolute offsets within the whole stream. After an error
    /// the stream is positioned at the start of the offending unit, including
    /// any shift sequence in front of it, so changing the converter's options
    /// and calling again resumes there.
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        self.pending.extend_from_slice(chunk);

        let mut output = Vec::with_capacity(self.pending.len());
        let (advanced, result) = match drive(
            &mut self.converter,
            &self.pending,
            self.position,
            &mut self.buffer,
            &mut output,
        ) {
            Ok(advanced) => (advanced, Ok(output)),
            Err(stopped) => (stopped.advanced, Err(stopped.error)),
        };

        self.pending.drain(..advanced);
        self.position += advanced;
        if result.is_ok() && !self.pending.is_empty() {
            trace!(held = self.pending.len(), "holding incomplete unit");
        }
        result
    }

    /// End the stream and flush the converter.
    ///
    /// Fails with [`Error::IncompleteSequence`] if a truncated unit is still
    /// held back.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        if !self.pending.is_empty() {
            return Err(Error::IncompleteSequence {
                offset: self.position,
            });
        }

        let mut output = Vec::new();
        finish_into(
            &mut self.converter,
            self.position,
            &mut self.buffer,
            &mut output,
        )?;
        Ok(output)
    }

    /// Input bytes converted so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes of a truncated unit waiting for the next chunk
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// The wrapped converter
    pub fn converter(&self) -> &Converter<'r> {
        &self.converter
    }

    /// The wrapped converter, for changing options mid-stream
    pub fn converter_mut(&mut self) -> &mut Converter<'r> {
        &mut self.converter
    }

    /// Give back the wrapped converter without flushing it
    pub fn into_inner(self) -> Converter<'r> {
        self.converter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_multibyte_sequence_is_carried_over() {
        let converter = Converter::new("UTF-8", "ISO-8859-1").unwrap();
        let mut stream = StreamingConverter::new(converter);

        let first = stream.process_chunk(&[b'x', 0xC3]).unwrap();
        assert_eq!(first, b"x");
        assert_eq!(stream.pending(), &[0xC3]);
        assert_eq!(stream.position(), 1);

        let second = stream.process_chunk(&[0xA9]).unwrap();
        assert_eq!(second, [0xE9]);
        assert!(stream.finish().unwrap().is_empty());
    }

    #[test]
    fn test_errors_use_stream_offsets() {
        let converter = Converter::new("UTF-8", "US-ASCII").unwrap();
        let mut stream = StreamingConverter::new(converter);

        stream.process_chunk(b"abc").unwrap();
        let err = stream.process_chunk(b"d\xFFe").unwrap_err();

        assert_eq!(err, Error::IllegalSequence { offset: 4 });
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_resume_after_illegal_unit_behind_escape() {
        let converter = Converter::new("ISO-2022-JP", "UTF-8").unwrap();
        let mut stream = StreamingConverter::new(converter);

        let err = stream.process_chunk(b"\x1B$B\x30\x21").unwrap_err();
        assert_eq!(err, Error::IllegalSequence { offset: 3 });
        // the escape stays pending together with the bad pair
        assert_eq!(stream.position(), 0);
        assert_eq!(stream.pending(), b"\x1B$B\x30\x21");
        assert!(stream.converter().decode_state().is_initial());

        // retrying unchanged fails the same way instead of misreading the pair
        assert_eq!(
            stream.process_chunk(b"").unwrap_err(),
            Error::IllegalSequence { offset: 3 }
        );

        stream.converter_mut().set_discard_illegal(true);
        let output = stream.process_chunk(b"\x24\x22").unwrap();
        assert_eq!(output, "あ".as_bytes());
        assert_eq!(stream.position(), 7);
        assert!(stream.finish().unwrap().is_empty());
    }

    #[test]
    fn test_truncated_tail_fails_at_finish() {
        let converter = Converter::new("UTF-8", "UTF-16BE").unwrap();
        let mut stream = StreamingConverter::new(converter);

        stream.process_chunk(&[b'a', b'b', 0xE2, 0x82]).unwrap();
        assert_eq!(
            stream.finish().unwrap_err(),
            Error::IncompleteSequence { offset: 2 }
        );
    }

    #[test]
    fn test_tiny_buffer_grows() {
        let converter = Converter::new("ISO-8859-1", "UTF-32BE").unwrap();
        let mut stream = StreamingConverter::with_buffer_size(converter, 1);

        let output = stream.process_chunk(&[0x41; 40]).unwrap();
        assert_eq!(output.len(), 160);
    }

    #[test]
    fn test_finish_writes_reset_sequence() {
        let converter = Converter::new("UTF-8", "ISO-2022-JP").unwrap();
        let mut stream = StreamingConverter::new(converter);

        let mut output = stream.process_chunk("あ".as_bytes()).unwrap();
        output.extend(stream.finish().unwrap());

        assert_eq!(output, b"\x1B$B\x24\x22\x1B(B");
    }

    #[test]
    fn test_convert_all_reports_truncation() {
        let mut converter = Converter::new("UTF-16LE", "UTF-8").unwrap();
        assert_eq!(
            converter.convert_all(&[0x41, 0x00, 0x42]),
            Err(Error::IncompleteSequence { offset: 2 })
        );
    }

    #[test]
    fn test_convert_all_utf7_round_trip() {
        let text = "Hi Mom -☺-! 日本語 😀";
        let mut to_utf7 = Converter::new("UTF-8", "UTF-7").unwrap();
        let encoded = to_utf7.convert_all(text.as_bytes()).unwrap();
        assert!(encoded.is_ascii());

        let mut from_utf7 = Converter::new("UTF-7", "UTF-8").unwrap();
        let decoded = from_utf7.convert_all(&encoded).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), text);
    }
}
