//! Container decompression
//!
//! The asserted checksum is reported but never checked against the output:
//! it exists for a downstream consumer that trusts it as-is.

use std::io::{Read, Write};

use tracing::{debug, trace, warn};

use crate::compress::read_chunk;
use crate::engine::{DEFAULT_CHUNK_SIZE, LzmaDecoder};
use crate::error::{SpoofError, SpoofResult};
use crate::header::{ContainerHeader, HEADER_LEN, read_header};

/// Decompression settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressOptions {
    /// How many container bytes are read and decoded at a time
    pub chunk_size: usize,
}

impl Default for DecompressOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DecompressOptions {
    /// Reject settings the decoder cannot work with
    pub fn validate(&self) -> SpoofResult<()> {
        if self.chunk_size == 0 {
            return Err(SpoofError::InvalidOptions("chunk size cannot be zero".into()));
        }
        Ok(())
    }
}

/// What a finished decompression produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecompressSummary {
    /// Checksum found in the header, unverified
    pub asserted_checksum: u32,
    /// Size recorded in the header, if it was ever patched
    pub recorded_size: Option<u64>,
    /// Bytes actually produced
    pub decoded_size: u64,
}

/// Streaming container reader
pub struct Decompressor {
    header: ContainerHeader,
    decoder: LzmaDecoder,
    decoded: u64,
}

impl Decompressor {
    /// Parse the fixed header and prime the decoder with it
    pub fn new(header_bytes: &[u8]) -> SpoofResult<Self> {
        let header = read_header(header_bytes)?;
        debug!(
            "Container header: checksum {:08x}, properties {:#04x}, dictionary {}, size {}",
            header.asserted_checksum,
            header.lzma_properties,
            header.dict_size,
            header.uncompressed_size
        );

        let mut decoder = LzmaDecoder::new()?;
        let primed = decoder.feed(&header.lzma_header_unknown_size())?;
        debug_assert!(primed.is_empty());

        Ok(Self {
            header,
            decoder,
            decoded: 0,
        })
    }

    /// The parsed container header
    pub fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Decode the next chunk of the compressed stream
    pub fn update(&mut self, chunk: &[u8]) -> SpoofResult<Vec<u8>> {
        let plain = self.decoder.feed(chunk)?;
        self.decoded += plain.len() as u64;
        trace!("Decoded {} bytes from a {} byte chunk", plain.len(), chunk.len());
        Ok(plain)
    }

    /// End of input; returns any remaining output and the summary
    pub fn finish(mut self) -> SpoofResult<(Vec<u8>, DecompressSummary)> {
        let tail = self.decoder.finish()?;
        self.decoded += tail.len() as u64;

        let recorded_size = self
            .header
            .has_known_size()
            .then_some(self.header.uncompressed_size);

        match recorded_size {
            Some(recorded) if recorded != self.decoded => warn!(
                "Header records {recorded} bytes but the stream decoded to {}",
                self.decoded
            ),
            None => debug!("Header size was never patched"),
            _ => {}
        }

        Ok((
            tail,
            DecompressSummary {
                asserted_checksum: self.header.asserted_checksum,
                recorded_size,
                decoded_size: self.decoded,
            },
        ))
    }
}

/// Decompress a container from `input`, writing the payload to `output`
pub fn decompress<R, W>(input: R, output: &mut W) -> SpoofResult<DecompressSummary>
where
    R: Read,
    W: Write + ?Sized,
{
    decompress_with_options(input, output, &DecompressOptions::default())
}

/// [`decompress`] with explicit settings
pub fn decompress_with_options<R, W>(
    mut input: R,
    output: &mut W,
    options: &DecompressOptions,
) -> SpoofResult<DecompressSummary>
where
    R: Read,
    W: Write + ?Sized,
{
    options.validate()?;

    let mut header = [0u8; HEADER_LEN];
    let n = read_chunk(&mut input, &mut header)?;
    let mut decompressor = Decompressor::new(&header[..n])?;

    let mut buf = vec![0u8; options.chunk_size];
    loop {
        let n = read_chunk(&mut input, &mut buf)?;
        if n == 0 {
            break;
        }
        output.write_all(&decompressor.update(&buf[..n])?)?;
    }

    let (tail, summary) = decompressor.finish()?;
    output.write_all(&tail)?;
    output.flush()?;

    debug!(
        "Decompressed {} bytes, asserted checksum {:08x}",
        summary.decoded_size, summary.asserted_checksum
    );
    Ok(summary)
}

/// Decompress an in-memory container
pub fn decompress_to_vec(container: &[u8]) -> SpoofResult<Vec<u8>> {
    let mut payload = Vec::new();
    decompress(container, &mut payload)?;
    Ok(payload)
}
