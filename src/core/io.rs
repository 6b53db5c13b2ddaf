//! Byte-level writer and reader over any `std::io` sink or source.
//!
//! Both are protocol agnostic: every protocol decision arrives as a call argument,
//! the I/O objects only move bytes. A reader is forward-only with no seeking or
//! pushback.

use crate::config;
use crate::error::{CodecError, Result};
use std::io::{ErrorKind, Read, Write};
use tracing::warn;

/// Append-only byte sink.
pub struct Writer<'a> {
    sink: &'a mut dyn Write,
    written: u64,
}

impl<'a> Writer<'a> {
    pub fn new<W: Write>(sink: &'a mut W) -> Self {
        Self { sink, written: 0 }
    }

    pub fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.write_bytes(&[byte])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.sink.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Writes `count` zero bytes.
    pub fn write_zeros(&mut self, count: usize) -> Result<()> {
        const ZEROS: [u8; 64] = [0; 64];
        let mut left = count;
        while left > 0 {
            let chunk = left.min(ZEROS.len());
            self.write_bytes(&ZEROS[..chunk])?;
            left -= chunk;
        }
        Ok(())
    }

    /// Total bytes accepted by the sink through this writer.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Forward-only byte source.
pub struct Reader<'a> {
    source: &'a mut dyn Read,
    consumed: u64,
}

impl<'a> Reader<'a> {
    pub fn new<R: Read>(source: &'a mut R) -> Self {
        Self { source, consumed: 0 }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_bytes(&mut byte)?;
        Ok(byte[0])
    }

    /// Fills `buf` completely or fails with `UnexpectedEof`.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => {
                    self.consumed += filled as u64;
                    return Err(CodecError::UnexpectedEof {
                        needed: buf.len() - filled,
                    });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::Io(e)),
            }
        }
        self.consumed += filled as u64;
        Ok(())
    }

    /// Reads exactly `len` bytes into a fresh vector. Callers check `len` against
    /// the configured limits first.
    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_bytes(&mut buf)?;
        Ok(buf)
    }

    /// Total bytes consumed from the source through this reader.
    pub fn bytes_read(&self) -> u64 {
        self.consumed
    }

    /// Ends the session. With `strict_eof` set, any byte still available in the
    /// source is a `TrailingBytes` error (downgraded to a warning under `Ignore`).
    pub fn finish(mut self) -> Result<()> {
        let cfg = config::current()?;
        if !cfg.strict_eof {
            return Ok(());
        }
        let mut extra = [0u8; 1];
        loop {
            match self.source.read(&mut extra) {
                Ok(0) => return Ok(()),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CodecError::Io(e)),
            }
        }
        if cfg.error_policy.tolerates_lossy_decode() {
            warn!(consumed = self.consumed, "Trailing bytes after decoded value ignored");
            return Ok(());
        }
        Err(CodecError::TrailingBytes { remaining: 1 })
    }
}
