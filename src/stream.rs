//! Delta-framed term output.
//!
//! One `OutputStream` owns one split's [`BufferedSocket`] plus the cache of
//! the previously emitted term. The cache is what makes delta framing
//! possible: a new term is encoded relative to the last one emitted on the
//! same stream, omitting unchanged leading content, and the receiver retains
//! the last full term per stream to reconstruct it.
//!
//! # Wire format
//!
//! A stream is a sequence of term frames. Each frame is a one-byte tag
//! followed by a payload:
//!
//! | tag    | frame     | payload                                              |
//! |--------|-----------|------------------------------------------------------|
//! | `0x01` | INT_FULL  | zigzag-LEB128 value                                  |
//! | `0x02` | INT_DELTA | zigzag-LEB128 (value − previous), wrapping           |
//! | `0x03` | STR_FULL  | LEB128 length, then the bytes                        |
//! | `0x04` | STR_DELTA | LEB128 shared-prefix length, LEB128 suffix length, suffix bytes |
//!
//! A delta frame is emitted only when a previous term of the same type is
//! cached; a type change or a fresh stream forces a full frame. Group-stats
//! payloads interleave with term frames on the same socket; their encoding
//! belongs to the task iterators, which write them through
//! [`OutputStream::socket_mut`].

use std::os::unix::io::RawFd;

use crate::socket::{BufferedSocket, RuntimeError};
use crate::term::{Term, TermRef, TermType};

/// Full integer term frame.
pub const TAG_INT_FULL: u8 = 0x01;
/// Integer term frame encoded as a wrapping delta against the previous term.
pub const TAG_INT_DELTA: u8 = 0x02;
/// Full string term frame.
pub const TAG_STR_FULL: u8 = 0x03;
/// String term frame sharing a prefix with the previous term.
pub const TAG_STR_DELTA: u8 = 0x04;

/// Per-split output stream: buffered socket plus previous-term cache.
///
/// # Invariants
/// - The cache starts in the no-term state; the first frame on a stream is
///   always a full frame.
/// - The stream's term-type tag tracks the last emitted term and starts as
///   integer.
#[derive(Debug)]
pub struct OutputStream {
    socket: BufferedSocket,
    term_type: TermType,
    prev: Option<Term>,
}

impl OutputStream {
    /// Opens a stream over `fd` with the default buffer capacity.
    ///
    /// The descriptor stays owned by the caller.
    pub fn open(fd: RawFd) -> Self {
        Self::with_capacity(fd, crate::socket::DEFAULT_BUFFER_SIZE)
    }

    /// Opens with an explicit socket buffer capacity.
    pub fn with_capacity(fd: RawFd, capacity: usize) -> Self {
        Self {
            socket: BufferedSocket::with_capacity(fd, capacity),
            term_type: TermType::Int,
            prev: None,
        }
    }

    /// Type of the last emitted term (integer before any emission).
    #[inline]
    pub fn term_type(&self) -> TermType {
        self.term_type
    }

    /// Last captured socket failure, if any.
    #[inline]
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.socket.last_error()
    }

    /// The underlying buffered socket, for interleaved stats payloads.
    #[inline]
    pub fn socket_mut(&mut self) -> &mut BufferedSocket {
        &mut self.socket
    }

    /// Emits one term frame.
    ///
    /// The frame is delta-encoded against the cached previous term when the
    /// types match; otherwise a full frame is emitted. The cache is updated
    /// in place afterwards, reusing its string buffer across terms.
    pub fn write_term(&mut self, term: TermRef<'_>) {
        match (term, &self.prev) {
            (TermRef::Int(value), Some(Term::Int(prev))) => {
                self.socket.write_u8(TAG_INT_DELTA);
                write_varint(&mut self.socket, zigzag(value.wrapping_sub(*prev)));
            }
            (TermRef::Str(bytes), Some(Term::Str(prev))) => {
                let prefix = common_prefix_len(prev, bytes);
                self.socket.write_u8(TAG_STR_DELTA);
                write_varint(&mut self.socket, prefix as u64);
                write_varint(&mut self.socket, (bytes.len() - prefix) as u64);
                self.socket.write_all(&bytes[prefix..]);
            }
            (TermRef::Int(value), _) => {
                self.socket.write_u8(TAG_INT_FULL);
                write_varint(&mut self.socket, zigzag(value));
            }
            (TermRef::Str(bytes), _) => {
                self.socket.write_u8(TAG_STR_FULL);
                write_varint(&mut self.socket, bytes.len() as u64);
                self.socket.write_all(bytes);
            }
        }

        self.term_type = term.term_type();
        match &mut self.prev {
            Some(prev) => prev.assign(term),
            None => self.prev = Some(term.to_term()),
        }
    }

    /// Returns the cache to the no-term state, e.g. at a field boundary.
    ///
    /// The next frame on this stream will be a full frame.
    pub fn reset_term(&mut self) {
        self.prev = None;
        self.term_type = TermType::Int;
    }

    /// Drains buffered bytes to the socket.
    pub fn flush(&mut self) {
        self.socket.flush();
    }
}

/// Maps a signed value onto the unsigned LEB128 domain, small-magnitude
/// values first.
#[inline]
fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Writes an unsigned LEB128 varint.
fn write_varint(socket: &mut BufferedSocket, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        socket.write_u8(byte);
        if value == 0 {
            return;
        }
    }
}

/// Length of the longest shared prefix of `a` and `b`.
#[inline]
fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}
