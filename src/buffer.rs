//! Receive buffer backing the reply decoder.

use crate::error::{Error, Result};
use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, Read};

/// Default size of a single blocking read from the transport.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Accumulates bytes read from the transport until the decoder can consume a
/// full line or payload.
///
/// Bytes are only ever removed from the front once consumed; anything read
/// past the current reply stays buffered for the next one.
pub struct ReplyBuffer {
    buffer: BytesMut,
    chunk: Box<[u8]>,
    // Prefix of `buffer` already searched for CRLF without success.
    scanned: usize,
}

impl Default for ReplyBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ReplyBuffer {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            chunk: vec![0; chunk_size.max(1)].into_boxed_slice(),
            scanned: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop everything buffered. Used when the connection is replaced.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Consume the next CRLF-terminated line, without the terminator.
    pub fn read_line<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<Bytes> {
        loop {
            let from = self.scanned.saturating_sub(1);
            if let Some(pos) = self.buffer[from..].windows(2).position(|w| w == b"\r\n") {
                let line = self.buffer.split_to(from + pos).freeze();
                self.buffer.advance(2);
                self.scanned = 0;
                return Ok(line);
            }
            self.scanned = self.buffer.len();
            self.fill(source)?;
        }
    }

    /// Consume exactly `len` payload bytes followed by their CRLF terminator.
    pub fn read_payload<R: Read + ?Sized>(&mut self, source: &mut R, len: usize) -> Result<Bytes> {
        self.ensure(source, len + 2)?;
        let payload = self.buffer.split_to(len).freeze();
        if &self.buffer[..2] != b"\r\n" {
            return Err(Error::Protocol(
                "bulk string not terminated by CRLF".to_string(),
            ));
        }
        self.buffer.advance(2);
        self.scanned = 0;
        Ok(payload)
    }

    /// Block until at least `n` bytes are buffered.
    pub fn ensure<R: Read + ?Sized>(&mut self, source: &mut R, n: usize) -> Result<()> {
        while self.buffer.len() < n {
            self.fill(source)?;
        }
        Ok(())
    }

    fn fill<R: Read + ?Sized>(&mut self, source: &mut R) -> Result<usize> {
        loop {
            match source.read(&mut self.chunk) {
                Ok(0) => return Err(Error::ConnectionClosed),
                Ok(n) => {
                    tracing::trace!("Read {} bytes, {} buffered", n, self.buffer.len() + n);
                    self.buffer.extend_from_slice(&self.chunk[..n]);
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
    }
}
