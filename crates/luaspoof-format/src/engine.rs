//! Streaming LZMA1 encoder and decoder
//!
//! Both sides are driven one chunk at a time through liblzma's "LZMA alone"
//! coders, so memory stays bounded by the chunk size and the coder's own
//! dictionary no matter how large the payload is.
//!
//! The encoder always terminates its stream with an end-of-payload marker.
//! It also emits a 13-byte `.lzma` header of its own; [`LzmaEncoder`] checks
//! and swallows it, because the container writes that header itself.

use liblzma::stream::{Action, LzmaOptions, Status, Stream};
use tracing::trace;

use crate::error::{SpoofError, SpoofResult};
use crate::header::{LZMA_HEADER_LEN, UNKNOWN_SIZE};

/// Dictionary size used unless configured otherwise (64 KiB)
pub const DEFAULT_DICT_SIZE: u32 = 64 * 1024;

/// Smallest dictionary liblzma accepts
pub const MIN_DICT_SIZE: u32 = 4096;

/// Largest dictionary liblzma's encoder accepts (1.5 GiB)
pub const MAX_DICT_SIZE: u32 = (1 << 30) + (1 << 29);

/// Read size used when streaming payloads and containers
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Encoder preset the remaining LZMA options are taken from
pub const LZMA_PRESET: u32 = 6;

const LITERAL_CONTEXT_BITS: u32 = 3;
const LITERAL_POSITION_BITS: u32 = 0;
const POSITION_BITS: u32 = 2;

/// Output is grown in steps of this many bytes
const OUTPUT_STEP: usize = 4096;

/// Encode lc/lp/pb into the single `.lzma` properties byte
pub const fn properties_byte(lc: u32, lp: u32, pb: u32) -> u8 {
    ((pb * 5 + lp) * 9 + lc) as u8
}

/// Dictionary size as liblzma records it in a `.lzma` header
///
/// The alone encoder rounds up to the next `2^n` or `2^n + 2^(n-1)`.
pub const fn header_dict_size(dict_size: u32) -> u32 {
    let mut d = dict_size.saturating_sub(1);
    d |= d >> 2;
    d |= d >> 3;
    d |= d >> 4;
    d |= d >> 8;
    d |= d >> 16;
    if d == u32::MAX { d } else { d + 1 }
}

/// Result of running input through a coder
struct Pumped {
    output: Vec<u8>,
    unconsumed: usize,
    stream_end: bool,
}

/// Run `input` through `stream` until it is consumed (or, when finishing,
/// until the stream ends), growing the output as needed.
fn pump(stream: &mut Stream, mut input: &[u8], finish: bool) -> SpoofResult<Pumped> {
    let action = if finish { Action::Finish } else { Action::Run };
    let mut output = Vec::with_capacity(OUTPUT_STEP);

    loop {
        if output.len() == output.capacity() {
            output.reserve(OUTPUT_STEP);
        }

        let in_before = stream.total_in();
        let out_before = output.len();
        let status = stream.process_vec(input, &mut output, action)?;
        let consumed = (stream.total_in() - in_before) as usize;
        input = &input[consumed..];

        if matches!(status, Status::StreamEnd) {
            return Ok(Pumped {
                output,
                unconsumed: input.len(),
                stream_end: true,
            });
        }

        // Input gone and the coder stopped short of filling the buffer: it
        // has nothing more to say until it gets more input.
        if !finish && input.is_empty() && output.len() < output.capacity() {
            return Ok(Pumped {
                output,
                unconsumed: 0,
                stream_end: false,
            });
        }

        if consumed == 0 && output.len() == out_before {
            return Err(if finish {
                SpoofError::TruncatedStream
            } else {
                SpoofError::Lzma(format!("coder stalled with {} bytes of input", input.len()))
            });
        }
    }
}

/// Chunked LZMA1 encoder
pub struct LzmaEncoder {
    stream: Stream,
    properties: u8,
    dict_size: u32,
    header: Vec<u8>,
}

impl LzmaEncoder {
    /// Open an encoder with the given dictionary size
    pub fn new(dict_size: u32) -> SpoofResult<Self> {
        if !(MIN_DICT_SIZE..=MAX_DICT_SIZE).contains(&dict_size) {
            return Err(SpoofError::InvalidOptions(format!(
                "dictionary size {dict_size} outside {MIN_DICT_SIZE}..={MAX_DICT_SIZE}"
            )));
        }

        let mut options = LzmaOptions::new_preset(LZMA_PRESET)?;
        options
            .dict_size(dict_size)
            .literal_context_bits(LITERAL_CONTEXT_BITS)
            .literal_position_bits(LITERAL_POSITION_BITS)
            .position_bits(POSITION_BITS);

        let stream = Stream::new_lzma_encoder(&options)?;

        let properties =
            properties_byte(LITERAL_CONTEXT_BITS, LITERAL_POSITION_BITS, POSITION_BITS);

        Ok(Self {
            stream,
            properties,
            dict_size: header_dict_size(dict_size),
            header: Vec::with_capacity(LZMA_HEADER_LEN),
        })
    }

    /// Properties byte the stream is encoded with
    pub fn properties(&self) -> u8 {
        self.properties
    }

    /// Dictionary size as recorded in the header
    pub fn dict_size(&self) -> u32 {
        self.dict_size
    }

    /// Compress one chunk; may return nothing while the encoder buffers
    pub fn feed(&mut self, chunk: &[u8]) -> SpoofResult<Vec<u8>> {
        let pumped = pump(&mut self.stream, chunk, false)?;
        trace!(
            "encoder consumed {} bytes, produced {}",
            chunk.len(),
            pumped.output.len()
        );
        self.strip_header(pumped.output)
    }

    /// Flush the encoder and return the tail of the stream
    pub fn finish(mut self) -> SpoofResult<Vec<u8>> {
        let pumped = pump(&mut self.stream, &[], true)?;
        let tail = self.strip_header(pumped.output)?;

        if self.header.len() < LZMA_HEADER_LEN {
            return Err(SpoofError::EncoderHeaderMismatch(format!(
                "stream ended after {} header bytes",
                self.header.len()
            )));
        }

        Ok(tail)
    }

    fn expected_header(&self) -> [u8; LZMA_HEADER_LEN] {
        let mut header = [0u8; LZMA_HEADER_LEN];
        header[0] = self.properties;
        header[1..5].copy_from_slice(&self.dict_size.to_le_bytes());
        header[5..].copy_from_slice(&UNKNOWN_SIZE.to_le_bytes());
        header
    }

    fn strip_header(&mut self, mut output: Vec<u8>) -> SpoofResult<Vec<u8>> {
        if self.header.len() < LZMA_HEADER_LEN {
            let needed = (LZMA_HEADER_LEN - self.header.len()).min(output.len());
            self.header.extend(output.drain(..needed));

            if self.header.len() == LZMA_HEADER_LEN && self.header != self.expected_header() {
                return Err(SpoofError::EncoderHeaderMismatch(format!(
                    "expected {}, got {}",
                    hex::encode(self.expected_header()),
                    hex::encode(&self.header)
                )));
            }
        }

        Ok(output)
    }
}

/// Chunked LZMA1 decoder
///
/// Termination comes from the stream's end-of-payload marker only.
pub struct LzmaDecoder {
    stream: Stream,
    ended: bool,
}

impl LzmaDecoder {
    /// Open a decoder for a `.lzma` stream (header included)
    pub fn new() -> SpoofResult<Self> {
        Ok(Self {
            stream: Stream::new_lzma_decoder(u64::MAX)?,
            ended: false,
        })
    }

    /// Whether the end-of-payload marker has been seen
    pub fn is_finished(&self) -> bool {
        self.ended
    }

    /// Decompress one chunk of the compressed stream
    pub fn feed(&mut self, chunk: &[u8]) -> SpoofResult<Vec<u8>> {
        if chunk.is_empty() {
            return Ok(Vec::new());
        }

        if self.ended {
            return Err(SpoofError::TrailingData(chunk.len()));
        }

        let pumped = pump(&mut self.stream, chunk, false)?;
        trace!(
            "decoder consumed {} bytes, produced {}",
            chunk.len() - pumped.unconsumed,
            pumped.output.len()
        );

        if pumped.stream_end {
            self.ended = true;
            if pumped.unconsumed > 0 {
                return Err(SpoofError::TrailingData(pumped.unconsumed));
            }
        }

        Ok(pumped.output)
    }

    /// Signal end of input; fails if the stream was cut short
    pub fn finish(mut self) -> SpoofResult<Vec<u8>> {
        if self.ended {
            return Ok(Vec::new());
        }

        let pumped = pump(&mut self.stream, &[], true)?;
        self.ended = pumped.stream_end;
        Ok(pumped.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encode_all(data: &[u8], dict_size: u32, chunk_size: usize) -> (u8, u32, Vec<u8>) {
        let mut encoder = LzmaEncoder::new(dict_size).expect("open encoder");
        let mut body = Vec::new();
        for chunk in data.chunks(chunk_size) {
            body.extend(encoder.feed(chunk).expect("feed encoder"));
        }
        let properties = encoder.properties();
        let dict = encoder.dict_size();
        body.extend(encoder.finish().expect("finish encoder"));
        (properties, dict, body)
    }

    fn decode_all(
        properties: u8,
        dict_size: u32,
        body: &[u8],
        chunk_size: usize,
    ) -> SpoofResult<Vec<u8>> {
        let mut decoder = LzmaDecoder::new()?;
        let mut header = vec![properties];
        header.extend_from_slice(&dict_size.to_le_bytes());
        header.extend_from_slice(&UNKNOWN_SIZE.to_le_bytes());

        let mut out = decoder.feed(&header)?;
        for chunk in body.chunks(chunk_size) {
            out.extend(decoder.feed(chunk)?);
        }
        out.extend(decoder.finish()?);
        Ok(out)
    }

    #[test]
    fn test_properties_byte() {
        assert_eq!(properties_byte(3, 0, 2), 0x5D);
        assert_eq!(properties_byte(0, 0, 0), 0);
        assert_eq!(properties_byte(8, 4, 4), 224);
    }

    #[test]
    fn test_header_dict_size() {
        assert_eq!(header_dict_size(65536), 65536);
        assert_eq!(header_dict_size(4096), 4096);
        assert_eq!(header_dict_size(65537), 98304);
        assert_eq!(header_dict_size(100_000), 131_072);
        assert_eq!(header_dict_size(3 << 20), 3 << 20);
    }

    #[test]
    fn test_round_trip_chunked() {
        let data: Vec<u8> = b"local function f(x) return x * 2 end\n"
            .iter()
            .copied()
            .cycle()
            .take(20_000)
            .collect();

        let (properties, dict, body) = encode_all(&data, DEFAULT_DICT_SIZE, 1024);
        assert_eq!(properties, 0x5D);
        assert_eq!(dict, DEFAULT_DICT_SIZE);
        assert!(body.len() < data.len());

        for chunk_size in [1, 7, 1024, body.len()] {
            let decoded = decode_all(properties, dict, &body, chunk_size).expect("decode");
            assert_eq!(decoded, data);
        }
    }

    #[test]
    fn test_empty_stream() {
        let (properties, dict, body) = encode_all(b"", DEFAULT_DICT_SIZE, 1024);
        assert!(!body.is_empty(), "end marker must still be written");

        let decoded = decode_all(properties, dict, &body, 1024).expect("decode");
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_incompressible_data() {
        // xorshift noise
        let mut state = 0x2545_F491_u32;
        let data: Vec<u8> = (0..50_000)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state as u8
            })
            .collect();

        let (properties, dict, body) = encode_all(&data, DEFAULT_DICT_SIZE, 1024);
        let decoded = decode_all(properties, dict, &body, 333).expect("decode");
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_truncated_stream() {
        let (properties, dict, body) =
            encode_all(b"return 1 return 1 return 1", DEFAULT_DICT_SIZE, 1024);
        let err = decode_all(properties, dict, &body[..body.len() - 3], 1024).unwrap_err();
        assert!(
            matches!(err, SpoofError::TruncatedStream | SpoofError::Lzma(_)),
            "actual error: {err:?}"
        );
    }

    #[test]
    fn test_trailing_data() {
        let (properties, dict, mut body) = encode_all(b"return 1", DEFAULT_DICT_SIZE, 1024);
        body.extend_from_slice(b"junk");

        let err = decode_all(properties, dict, &body, 4096).unwrap_err();
        assert!(matches!(err, SpoofError::TrailingData(4)), "actual error: {err:?}");
    }

    #[test]
    fn test_invalid_dict_size() {
        assert!(matches!(
            LzmaEncoder::new(1024),
            Err(SpoofError::InvalidOptions(_))
        ));
        assert!(matches!(
            LzmaEncoder::new(u32::MAX),
            Err(SpoofError::InvalidOptions(_))
        ));
    }

    #[test]
    fn test_non_power_of_two_dict() {
        let data = b"print('dict sizes get rounded in the header')".repeat(50);
        let (properties, dict, body) = encode_all(&data, 100_000, 1024);
        assert_eq!(dict, 131_072);

        let decoded = decode_all(properties, dict, &body, 1024).expect("decode");
        assert_eq!(decoded, data);
    }
}
