//! Buffered writes over a caller-owned socket descriptor.
//!
//! One `BufferedSocket` fronts one split's result socket. The write buffer
//! has a fixed capacity chosen at open time and is never resized; filling it
//! triggers a blocking flush to the descriptor. A slow consumer on one split
//! therefore throttles only that split's task (accepted backpressure).
//!
//! Write failures are captured on the socket as a sticky `(code, message)`
//! record instead of aborting the run: a bad split degrades that split only,
//! and callers poll [`BufferedSocket::last_error`] before trusting further
//! writes.
//!
//! # Ownership
//! The descriptor belongs to the caller. This type writes through it and
//! never closes it.

use std::fmt;
use std::io;
use std::os::unix::io::RawFd;

/// Default write-buffer capacity in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Captured OS-level failure: errno plus its decoded message.
///
/// Allocated lazily on the first failure and retained until the socket is
/// torn down. Later failures overwrite the record in place; later successes
/// leave it set; only teardown clears it.
#[derive(Debug)]
pub struct RuntimeError {
    code: i32,
    message: String,
}

impl RuntimeError {
    /// Raw OS error code (errno).
    #[inline]
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Human-readable message decoded from the code.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "os error {}: {}", self.code, self.message)
    }
}

/// Fixed-capacity write buffer bound to one socket descriptor.
///
/// # Invariants
/// - The write cursor never exceeds the buffer capacity.
/// - The buffer is owned exclusively by this socket and freed on drop.
pub struct BufferedSocket {
    fd: RawFd,
    buf: Box<[u8]>,
    pos: usize,
    err: Option<Box<RuntimeError>>,
}

impl BufferedSocket {
    /// Opens a buffered writer over `fd` with the default capacity.
    pub fn open(fd: RawFd) -> Self {
        Self::with_capacity(fd, DEFAULT_BUFFER_SIZE)
    }

    /// Opens with an explicit buffer capacity.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    pub fn with_capacity(fd: RawFd, capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be > 0");
        Self {
            fd,
            buf: vec![0u8; capacity].into_boxed_slice(),
            pos: 0,
            err: None,
        }
    }

    /// The underlying descriptor.
    #[inline]
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Buffer capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently buffered and not yet flushed to the descriptor.
    #[inline]
    pub fn buffered(&self) -> usize {
        self.pos
    }

    /// Last captured OS failure, if any.
    #[inline]
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.err.as_deref()
    }

    /// Appends `bytes`, flushing to the descriptor whenever the buffer fills.
    ///
    /// Failures are captured (see [`Self::last_error`]), not returned; the
    /// unsent remainder is dropped at the failing flush boundary. Later
    /// writes still attempt delivery; the error record stays as evidence.
    pub fn write_all(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let free = self.buf.len() - self.pos;
            if free == 0 {
                if !self.flush_buffer() {
                    return;
                }
                continue;
            }
            let n = free.min(bytes.len());
            self.buf[self.pos..self.pos + n].copy_from_slice(&bytes[..n]);
            self.pos += n;
            bytes = &bytes[n..];
        }
    }

    /// Appends a single byte.
    #[inline]
    pub fn write_u8(&mut self, byte: u8) {
        if self.pos == self.buf.len() && !self.flush_buffer() {
            return;
        }
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    /// Drains the buffer to the descriptor.
    ///
    /// Blocks until the kernel accepts the bytes. On failure the remainder
    /// is dropped and the error is captured.
    pub fn flush(&mut self) {
        self.flush_buffer();
    }

    fn flush_buffer(&mut self) -> bool {
        let mut start = 0;
        while start < self.pos {
            // SAFETY: `buf[start..pos]` is initialized and in-bounds; `fd`
            // is a caller-owned socket we only write through. MSG_NOSIGNAL
            // turns a peer hangup into EPIPE instead of SIGPIPE.
            let n = unsafe {
                libc::send(
                    self.fd,
                    self.buf[start..].as_ptr().cast(),
                    self.pos - start,
                    libc::MSG_NOSIGNAL,
                )
            };
            if n < 0 {
                let code = io::Error::last_os_error().raw_os_error().unwrap_or(0);
                if code == libc::EINTR {
                    continue;
                }
                self.capture_error(code);
                self.pos = 0;
                return false;
            }
            start += n as usize;
        }
        self.pos = 0;
        true
    }

    /// Records an OS failure, overwriting any previous record in place.
    fn capture_error(&mut self, code: i32) {
        let message = io::Error::from_raw_os_error(code).to_string();
        match &mut self.err {
            Some(err) => {
                err.code = code;
                err.message = message;
            }
            None => self.err = Some(Box::new(RuntimeError { code, message })),
        }
    }
}

impl fmt::Debug for BufferedSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedSocket")
            .field("fd", &self.fd)
            .field("capacity", &self.buf.len())
            .field("buffered", &self.pos)
            .field("err", &self.err)
            .finish()
    }
}
