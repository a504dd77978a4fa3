//! CRC-forging LZMA container
//!
//! Packs a payload (typically compiled Lua) into a small container whose
//! first four bytes are a CRC32 chosen by the caller. When the payload's real
//! checksum differs, four forged bytes are appended before compression so
//! that the CRC32 of the decompressed output matches the asserted value.
//!
//! # Container layout
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 0 | 4 | asserted CRC32 (LE) |
//! | 4 | 1 | LZMA properties |
//! | 5 | 4 | dictionary size (LE) |
//! | 9 | 8 | uncompressed size (LE) |
//! | 17 | … | LZMA1 stream with end marker |
//!
//! # Example
//!
//! ```
//! use luaspoof_format::{checksum::crc32, compress_to_vec, decompress_to_vec};
//!
//! let container = compress_to_vec(b"return 1", 0)?;
//! let payload = decompress_to_vec(&container)?;
//!
//! assert_eq!(&payload[..8], b"return 1");
//! assert_eq!(payload.len(), 12);
//! assert_eq!(crc32(&payload), 0);
//! # Ok::<(), luaspoof_format::SpoofError>(())
//! ```
//!
//! Compression and decompression own all of their state, so independent
//! containers can be processed on separate threads without coordination.

#![warn(missing_docs)]

pub mod checksum;
pub mod compress;
pub mod decompress;
pub mod engine;
pub mod error;
pub mod forge;
pub mod header;
pub mod sink;

pub use checksum::{RunningCrc, crc32};
pub use compress::{
    CompressOptions, CompressState, CompressSummary, Compressor, compress, compress_to_vec,
    compress_with_options,
};
pub use decompress::{
    DecompressOptions, DecompressSummary, Decompressor, decompress, decompress_to_vec,
    decompress_with_options,
};
pub use error::{SpoofError, SpoofResult};
pub use forge::{correction_suffix, forge_apply, forge_suffix};
pub use header::{ContainerHeader, HEADER_LEN, read_header, strip_checksum};
pub use sink::{BufferedSink, PatchableSink};
