//! Container compression
//!
//! [`Compressor`] writes the header with a placeholder size, streams the
//! payload through the encoder chunk by chunk while keeping a running CRC32,
//! appends a forged correction suffix if the payload's checksum differs from
//! the asserted one, then patches the real decompressed size into the header.

use std::fmt;
use std::io::{self, Cursor, Read};

use tracing::{debug, trace};

use crate::checksum::RunningCrc;
use crate::engine::{
    DEFAULT_CHUNK_SIZE, DEFAULT_DICT_SIZE, LzmaEncoder, MAX_DICT_SIZE, MIN_DICT_SIZE,
};
use crate::error::{SpoofError, SpoofResult};
use crate::forge::{SUFFIX_LEN, correction_suffix};
use crate::header::{HEADER_LEN, patch_uncompressed_size, write_header};
use crate::sink::PatchableSink;

/// Compression settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressOptions {
    /// LZMA dictionary size in bytes
    pub dict_size: u32,
    /// How many payload bytes are read and encoded at a time
    pub chunk_size: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            dict_size: DEFAULT_DICT_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl CompressOptions {
    /// Reject settings the encoder cannot work with
    pub fn validate(&self) -> SpoofResult<()> {
        if self.chunk_size == 0 {
            return Err(SpoofError::InvalidOptions("chunk size cannot be zero".into()));
        }

        if !(MIN_DICT_SIZE..=MAX_DICT_SIZE).contains(&self.dict_size) {
            return Err(SpoofError::InvalidOptions(format!(
                "dictionary size {} outside {MIN_DICT_SIZE}..={MAX_DICT_SIZE}",
                self.dict_size
            )));
        }

        Ok(())
    }
}

/// Compressor life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressState {
    /// Encoder open, header written with a placeholder size
    Init,
    /// At least one payload chunk has been encoded
    Streaming,
    /// Suffix and flush in progress
    Finalizing,
    /// Container complete
    Done,
}

/// What a finished compression produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressSummary {
    /// Checksum written into the header
    pub asserted_checksum: u32,
    /// CRC32 of the payload alone
    pub payload_crc: u32,
    /// Forged bytes appended to the payload, if any
    pub suffix: Option<[u8; SUFFIX_LEN]>,
    /// Decompressed length recorded in the header
    pub uncompressed_size: u64,
    /// Total container length, header included
    pub compressed_size: u64,
}

impl fmt::Display for CompressSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "crc {:08x} -> {:08x}, {} -> {} bytes",
            self.payload_crc,
            self.asserted_checksum,
            self.uncompressed_size,
            self.compressed_size
        )?;
        if let Some(suffix) = self.suffix {
            write!(f, ", suffix {}", hex::encode(suffix))?;
        }
        Ok(())
    }
}

/// Streaming container writer
///
/// The container is written from the sink's current position onwards; bytes
/// already in the sink are left alone.
pub struct Compressor<'a, S: PatchableSink + ?Sized> {
    sink: &'a mut S,
    encoder: Option<LzmaEncoder>,
    crc: RunningCrc,
    target: u32,
    start: u64,
    written: u64,
    state: CompressState,
}

impl<'a, S: PatchableSink + ?Sized> Compressor<'a, S> {
    /// Open the encoder and write the header with a placeholder size
    pub fn new(sink: &'a mut S, target: u32, options: &CompressOptions) -> SpoofResult<Self> {
        options.validate()?;

        let encoder = LzmaEncoder::new(options.dict_size)?;
        let header = write_header(target, encoder.properties(), encoder.dict_size())?;
        let start = sink.position()?;
        sink.append(&header)?;

        debug!(
            "Container header at offset {start}: checksum {target:08x}, properties {:#04x}, \
             dictionary {}",
            encoder.properties(),
            encoder.dict_size()
        );

        Ok(Self {
            sink,
            encoder: Some(encoder),
            crc: RunningCrc::new(),
            target,
            start,
            written: HEADER_LEN as u64,
            state: CompressState::Init,
        })
    }

    /// Current life cycle state
    pub fn state(&self) -> CompressState {
        self.state
    }

    /// Payload bytes consumed so far
    pub fn payload_len(&self) -> u64 {
        self.crc.len()
    }

    /// Encode the next payload chunk and write whatever the encoder emits
    pub fn update(&mut self, chunk: &[u8]) -> SpoofResult<()> {
        if matches!(self.state, CompressState::Finalizing | CompressState::Done) {
            return Err(SpoofError::AlreadyFinished);
        }

        self.state = CompressState::Streaming;
        self.crc.update(chunk);
        self.encode(chunk)?;
        trace!("Encoded chunk of {} bytes", chunk.len());
        Ok(())
    }

    /// Append the correction suffix if needed, flush, and patch the size
    ///
    /// Can only succeed once; afterwards [`Compressor::update`] and `finish`
    /// fail with [`SpoofError::AlreadyFinished`].
    pub fn finish(&mut self) -> SpoofResult<CompressSummary> {
        if matches!(self.state, CompressState::Finalizing | CompressState::Done) {
            return Err(SpoofError::AlreadyFinished);
        }
        self.state = CompressState::Finalizing;

        let payload_crc = self.crc.value();
        let payload_len = self.crc.len();
        let suffix = correction_suffix(payload_crc, self.target);

        let uncompressed_size = match suffix {
            Some(suffix) => {
                debug!(
                    "Payload crc {payload_crc:08x} != {:08x}, appending suffix {}",
                    self.target,
                    hex::encode(suffix)
                );
                self.encode(&suffix)?;
                payload_len + SUFFIX_LEN as u64
            }
            None => {
                debug!("Payload crc already {payload_crc:08x}, no suffix needed");
                payload_len
            }
        };

        let encoder = self.encoder.take().ok_or(SpoofError::AlreadyFinished)?;
        let tail = encoder.finish()?;
        self.sink.append(&tail)?;
        self.written += tail.len() as u64;

        patch_uncompressed_size(&mut *self.sink, self.start, uncompressed_size)?;
        self.sink.flush_sink()?;
        self.state = CompressState::Done;

        Ok(CompressSummary {
            asserted_checksum: self.target,
            payload_crc,
            suffix,
            uncompressed_size,
            compressed_size: self.written,
        })
    }

    fn encode(&mut self, chunk: &[u8]) -> SpoofResult<()> {
        let encoder = self.encoder.as_mut().ok_or(SpoofError::AlreadyFinished)?;
        let compressed = encoder.feed(chunk)?;
        if !compressed.is_empty() {
            self.sink.append(&compressed)?;
            self.written += compressed.len() as u64;
        }
        Ok(())
    }
}

/// Read up to `buf.len()` bytes, stopping early only at end of input
pub(crate) fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Compress everything `input` yields into `sink`, asserting `target` as the
/// payload checksum
pub fn compress<R, S>(input: R, sink: &mut S, target: u32) -> SpoofResult<CompressSummary>
where
    R: Read,
    S: PatchableSink + ?Sized,
{
    compress_with_options(input, sink, target, &CompressOptions::default())
}

/// [`compress`] with explicit settings
pub fn compress_with_options<R, S>(
    mut input: R,
    sink: &mut S,
    target: u32,
    options: &CompressOptions,
) -> SpoofResult<CompressSummary>
where
    R: Read,
    S: PatchableSink + ?Sized,
{
    let mut compressor = Compressor::new(sink, target, options)?;
    let mut buf = vec![0u8; options.chunk_size];

    loop {
        let n = read_chunk(&mut input, &mut buf)?;
        if n == 0 {
            break;
        }
        compressor.update(&buf[..n])?;
    }

    let summary = compressor.finish()?;
    debug!("Compressed: {summary}");
    Ok(summary)
}

/// Compress an in-memory payload into a new container
pub fn compress_to_vec(payload: &[u8], target: u32) -> SpoofResult<Vec<u8>> {
    let mut sink = Cursor::new(Vec::with_capacity(HEADER_LEN + payload.len() / 2));
    compress(payload, &mut sink, target)?;
    Ok(sink.into_inner())
}
