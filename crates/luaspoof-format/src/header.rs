//! Container header
//!
//! ```text
//! offset  size  field
//!      0     4  asserted_checksum   (u32 LE)
//!      4     1  lzma_properties     (lc/lp/pb byte)
//!      5     4  dict_size           (u32 LE)
//!      9     8  uncompressed_size   (u64 LE)
//!     17     -  LZMA1 compressed stream with end-of-payload marker
//! ```
//!
//! Bytes 4..17 are a standard `.lzma` ("LZMA alone") header, so stripping the
//! checksum field leaves a file any `.lzma` decoder accepts.

use binrw::io::Cursor;
use binrw::{BinRead, BinWrite};
use std::io;

use crate::error::{SpoofError, SpoofResult};
use crate::sink::PatchableSink;

/// Size of the asserted checksum field
pub const CHECKSUM_LEN: usize = 4;

/// Size of the embedded LZMA header (properties + dictionary + size)
pub const LZMA_HEADER_LEN: usize = 13;

/// Total size of the fixed container header
pub const HEADER_LEN: usize = CHECKSUM_LEN + LZMA_HEADER_LEN;

/// Offset of the `uncompressed_size` field from the start of the container
pub const UNCOMPRESSED_SIZE_OFFSET: u64 = 9;

/// `uncompressed_size` value meaning "unknown"; written while streaming
pub const UNKNOWN_SIZE: u64 = u64::MAX;

/// Fixed-size container header
#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct ContainerHeader {
    /// CRC32 the consumer is meant to trust
    pub asserted_checksum: u32,
    /// Encoder literal context / literal position / position bits byte
    pub lzma_properties: u8,
    /// Dictionary size used by the encoder
    pub dict_size: u32,
    /// Length of the decompressed output, [`UNKNOWN_SIZE`] until patched
    pub uncompressed_size: u64,
}

impl ContainerHeader {
    /// Header as written at the start of compression, before the size is known
    pub fn placeholder(asserted_checksum: u32, lzma_properties: u8, dict_size: u32) -> Self {
        Self {
            asserted_checksum,
            lzma_properties,
            dict_size,
            uncompressed_size: UNKNOWN_SIZE,
        }
    }

    /// Whether `uncompressed_size` holds a real value
    pub fn has_known_size(&self) -> bool {
        self.uncompressed_size != UNKNOWN_SIZE
    }

    /// Serialize to the on-disk layout
    pub fn to_bytes(&self) -> SpoofResult<[u8; HEADER_LEN]> {
        let mut cursor = Cursor::new([0u8; HEADER_LEN]);
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// The embedded `.lzma` header with the size field forced to "unknown"
    ///
    /// Feeding this to an LZMA alone decoder makes it stop on the stream's
    /// end-of-payload marker regardless of what the size field says.
    pub fn lzma_header_unknown_size(&self) -> [u8; LZMA_HEADER_LEN] {
        let mut header = [0u8; LZMA_HEADER_LEN];
        header[0] = self.lzma_properties;
        header[1..5].copy_from_slice(&self.dict_size.to_le_bytes());
        header[5..].copy_from_slice(&UNKNOWN_SIZE.to_le_bytes());
        header
    }
}

/// Serialize the header that opens a container, with a placeholder size
pub fn write_header(
    asserted_checksum: u32,
    lzma_properties: u8,
    dict_size: u32,
) -> SpoofResult<[u8; HEADER_LEN]> {
    ContainerHeader::placeholder(asserted_checksum, lzma_properties, dict_size).to_bytes()
}

/// Overwrite the `uncompressed_size` field of a container being written
///
/// `container_start` is the sink offset the container's header was appended at.
pub fn patch_uncompressed_size<S: PatchableSink + ?Sized>(
    sink: &mut S,
    container_start: u64,
    final_size: u64,
) -> SpoofResult<()> {
    let offset = container_start
        .checked_add(UNCOMPRESSED_SIZE_OFFSET)
        .ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "container offset out of range")
        })?;
    sink.write_at(offset, &final_size.to_le_bytes())?;
    Ok(())
}

/// Parse the fixed header from the start of a container
///
/// The asserted checksum is returned as-is; nothing here checks it.
pub fn read_header(bytes: &[u8]) -> SpoofResult<ContainerHeader> {
    if bytes.len() < HEADER_LEN {
        return Err(SpoofError::TruncatedHeader {
            expected: HEADER_LEN,
            actual: bytes.len(),
        });
    }

    Ok(ContainerHeader::read(&mut Cursor::new(&bytes[..HEADER_LEN]))?)
}

/// Split a container into its asserted checksum and the `.lzma` stream
pub fn strip_checksum(bytes: &[u8]) -> SpoofResult<(u32, &[u8])> {
    let Some((checksum, rest)) = bytes.split_first_chunk::<CHECKSUM_LEN>() else {
        return Err(SpoofError::TruncatedHeader {
            expected: CHECKSUM_LEN,
            actual: bytes.len(),
        });
    };

    Ok((u32::from_le_bytes(*checksum), rest))
}
