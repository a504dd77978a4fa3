//! Running CRC32 accumulator
//!
//! Wraps [`crc32fast::Hasher`] so the state can be carried across chunk
//! boundaries by the compressor and queried at any point without consuming it.
//! The checksum is the standard reflected CRC32 (polynomial `0xEDB88320`,
//! initial value and final complement `0xFFFFFFFF`), identical to zlib's.

use crc32fast::Hasher;
use std::fmt;

/// CRC32 of a complete byte slice
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Running CRC32 over a stream of chunks
#[derive(Clone, Default)]
pub struct RunningCrc {
    hasher: Hasher,
    len: u64,
}

impl fmt::Debug for RunningCrc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningCrc")
            .field("crc", &format_args!("{:08x}", self.value()))
            .field("len", &self.len)
            .finish()
    }
}

impl RunningCrc {
    /// Start a new accumulator (CRC of the empty sequence is 0)
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously computed CRC and byte count
    pub fn resume(crc: u32, len: u64) -> Self {
        Self {
            hasher: Hasher::new_with_initial_len(crc, len),
            len,
        }
    }

    /// Feed the next chunk
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.len += chunk.len() as u64;
    }

    /// CRC32 of everything fed so far
    pub fn value(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Number of bytes fed so far
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether nothing has been fed yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
