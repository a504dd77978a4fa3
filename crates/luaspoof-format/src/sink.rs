//! Output abstraction for containers
//!
//! A container's size field is only known after the compressed stream has
//! been written, so outputs must support appending plus overwriting a small
//! region they already hold. Anything `Write + Seek` qualifies; for
//! append-only writers (pipes, stdout) use [`BufferedSink`].
//!
//! A container does not have to start at the beginning of the sink: offsets
//! passed to [`PatchableSink::write_at`] are absolute, so callers record
//! [`PatchableSink::position`] before writing and patch relative to it.

use std::io::{self, Seek, SeekFrom, Write};

/// Append-and-patch output
pub trait PatchableSink {
    /// Offset the next append will land at
    fn position(&mut self) -> io::Result<u64>;

    /// Append bytes at the end of the output
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Overwrite bytes already written, starting at `offset`
    ///
    /// Subsequent appends continue where they left off.
    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;

    /// Flush any buffered output
    fn flush_sink(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Write + Seek> PatchableSink for T {
    fn position(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let position = self.stream_position()?;
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(bytes)?;
        self.seek(SeekFrom::Start(position))?;
        Ok(())
    }

    fn flush_sink(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// Two-pass sink for writers that cannot seek
///
/// Holds the whole container in memory and emits it on [`BufferedSink::finish`].
#[derive(Debug)]
pub struct BufferedSink<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> BufferedSink<W> {
    /// Wrap an append-only writer
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Bytes buffered so far
    pub fn buffered(&self) -> &[u8] {
        &self.buffer
    }

    /// Write the buffered container to the inner writer and return it
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.write_all(&self.buffer)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> PatchableSink for BufferedSink<W> {
    fn position(&mut self) -> io::Result<u64> {
        Ok(self.buffer.len() as u64)
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn write_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
        let end = start
            .checked_add(bytes.len())
            .filter(|&end| end <= self.buffer.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "patch of {} bytes at offset {start} is outside the {} buffered bytes",
                        bytes.len(),
                        self.buffer.len()
                    ),
                )
            })?;

        self.buffer[start..end].copy_from_slice(bytes);
        Ok(())
    }
}
