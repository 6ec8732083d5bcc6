//! The byte buffer shared by the frame parser and the chunked body decoder.
//!
//! Every protocol decision in this crate is made at line granularity, and
//! lines arrive split across arbitrary transport chunk boundaries.
//! Centralizing the CRLF scan here avoids duplicating partial-match logic
//! between the head parser and the chunked decoder.

use bytes::{Buf, Bytes, BytesMut};

/// A growable byte buffer with CRLF-line and fixed-prefix extraction.
///
/// Lines are terminated by the exact two-byte sequence `CR LF` (`0x0D 0x0A`)
/// — no other line terminator is recognized, matching RFC 7230 framing.
#[derive(Debug, Default)]
pub struct ByteAccumulator {
    buf: BytesMut,
}

impl ByteAccumulator {
    pub fn new() -> ByteAccumulator {
        ByteAccumulator { buf: BytesMut::new() }
    }

    /// Seed a fresh accumulator with leftover bytes from a previous message.
    pub fn from_bytes(bytes: Bytes) -> ByteAccumulator {
        let mut buf = BytesMut::with_capacity(bytes.len());
        buf.extend_from_slice(&bytes);
        ByteAccumulator { buf }
    }

    pub fn append(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Scan from the start for the first `CRLF`. If found, decode the bytes
    /// before it as ISO-8859-1 (every byte maps to the identical code
    /// point; this can never fail) and remove that prefix, including the
    /// terminator, from the buffer. Returns `None` without mutating the
    /// buffer if no complete line is currently available.
    pub fn try_consume_crlf_line(&mut self) -> Option<String> {
        let end = find_crlf(&self.buf)?;
        let line = self.buf.split_to(end);
        self.buf.advance(2); // the CRLF itself
        Some(latin1_decode(&line))
    }

    /// Remove and return the first `n` bytes. `None` if `n` exceeds the
    /// current size.
    pub fn consume_prefix(&mut self, n: usize) -> Option<Bytes> {
        if n > self.buf.len() {
            return None;
        }
        Some(self.buf.split_to(n).freeze())
    }

    /// A read-only view of bytes `[start, start + len)`, without consuming.
    pub fn subrange(&self, start: usize, len: usize) -> &[u8] {
        &self.buf[start..start + len]
    }

    /// Hand the remaining bytes to the caller, leaving this accumulator
    /// empty. Used when retiring an accumulator into a `LeftoverBaton`.
    pub fn take_remaining(&mut self) -> Bytes {
        std::mem::take(&mut self.buf).freeze()
    }

    /// A read-only view of every byte currently buffered.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

/// Index of the first byte of the first `CRLF` sequence in `data`, i.e. the
/// length of the line preceding it. `None` if no complete `CRLF` has
/// arrived yet.
fn find_crlf(data: &[u8]) -> Option<usize> {
    let mut start = 0;
    loop {
        let idx = memchr::memchr(b'\r', &data[start..])? + start;
        if idx + 1 < data.len() {
            if data[idx + 1] == b'\n' {
                return Some(idx);
            }
            start = idx + 1;
        } else {
            // the `\r` is the last byte we have; wait for more data to
            // learn whether it's followed by `\n`
            return None;
        }
    }
}

fn latin1_decode(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn line_across_appends() {
        let mut acc = ByteAccumulator::new();
        acc.append(b"GET / HTTP/1.1\r");
        assert_eq!(acc.try_consume_crlf_line(), None);
        acc.append(b"\nHost: x\r\n");
        assert_eq!(acc.try_consume_crlf_line().as_deref(), Some("GET / HTTP/1.1"));
        assert_eq!(acc.try_consume_crlf_line().as_deref(), Some("Host: x"));
        assert_eq!(acc.try_consume_crlf_line(), None);
    }

    #[test]
    fn empty_line_is_empty_string() {
        let mut acc = ByteAccumulator::new();
        acc.append(b"\r\nrest");
        assert_eq!(acc.try_consume_crlf_line().as_deref(), Some(""));
        assert_eq!(acc.len(), 4);
    }

    #[test]
    fn lone_cr_does_not_terminate() {
        let mut acc = ByteAccumulator::new();
        acc.append(b"a\rb\r\n");
        assert_eq!(acc.try_consume_crlf_line().as_deref(), Some("a\rb"));
    }

    #[test]
    fn consume_prefix_bounds() {
        let mut acc = ByteAccumulator::new();
        acc.append(b"hello");
        assert!(acc.consume_prefix(10).is_none());
        assert_eq!(acc.consume_prefix(3).unwrap().as_ref(), b"hel");
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn latin1_is_never_lossy() {
        let mut acc = ByteAccumulator::new();
        acc.append(&[0xff, 0x80, b'\r', b'\n']);
        let line = acc.try_consume_crlf_line().unwrap();
        assert_eq!(line.chars().count(), 2);
        assert_eq!(line.chars().next().unwrap() as u32, 0xff);
    }
}
