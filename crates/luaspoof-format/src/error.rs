//! Container error types

use thiserror::Error;

/// Error type for container compression and decompression
#[derive(Debug, Error)]
pub enum SpoofError {
    /// I/O error on the input or output resource
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary parsing error
    #[error("binary parsing error: {0}")]
    BinRw(#[from] binrw::Error),

    /// Container is shorter than its fixed header
    #[error("truncated header: expected {expected} bytes, got {actual}")]
    TruncatedHeader {
        /// Header length in bytes
        expected: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Encoder or decoder failure reported by liblzma
    #[error("LZMA error: {0}")]
    Lzma(String),

    /// Compressed stream ended before its end-of-payload marker
    #[error("compressed stream is truncated")]
    TruncatedStream,

    /// Bytes follow the end-of-payload marker
    #[error("{0} bytes of trailing data after end of compressed stream")]
    TrailingData(usize),

    /// The encoder produced an LZMA header that disagrees with its options
    #[error("encoder produced an unexpected LZMA header: {0}")]
    EncoderHeaderMismatch(String),

    /// The compressor was used after it started finalizing
    #[error("compressor already finished")]
    AlreadyFinished,

    /// Invalid compression or decompression options
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl From<liblzma::stream::Error> for SpoofError {
    fn from(err: liblzma::stream::Error) -> Self {
        Self::Lzma(err.to_string())
    }
}

/// Result type for container operations
pub type SpoofResult<T> = Result<T, SpoofError>;
