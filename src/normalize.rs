//! CRLF line-ending normalization for outbound bytes
//!
//! NNTP requires every line on the wire to end in CRLF. [`NormalizedWriter`]
//! wraps any [`AsyncWrite`] and rewrites line endings on the way through, so
//! callers can hand it text with LF, CRLF, or a mix of both:
//!
//! - CRLF stays CRLF
//! - a bare LF becomes CRLF
//! - a run of CRs directly before LF collapses into one CRLF (never `\r\r\n`)
//! - a CR that is not followed by LF is passed through untouched
//!
//! The rewrite is idempotent: normalizing already-normalized bytes is a no-op.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::AsyncWrite;

/// Streaming line-ending rewriter
///
/// CRs are held back until the next byte shows whether they end a line, so a
/// CRLF split across two writes is still recognized.
#[derive(Debug, Default, Clone)]
pub struct LineEndingNormalizer {
    held_cr: usize,
}

impl LineEndingNormalizer {
    /// Create a normalizer with no held state
    pub fn new() -> Self {
        Self::default()
    }

    /// Rewrite `input`, appending the result to `out`
    pub fn feed(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len() + input.len() / 16);
        for &byte in input {
            match byte {
                b'\r' => self.held_cr += 1,
                b'\n' => {
                    self.held_cr = 0;
                    out.extend_from_slice(b"\r\n");
                }
                _ => {
                    self.release(out);
                    out.push(byte);
                }
            }
        }
    }

    /// Emit any CRs still held back
    pub fn finish(&mut self, out: &mut Vec<u8>) {
        self.release(out);
    }

    /// True when CRs are waiting for the next byte
    pub fn has_pending(&self) -> bool {
        self.held_cr > 0
    }

    fn release(&mut self, out: &mut Vec<u8>) {
        out.extend(std::iter::repeat_n(b'\r', self.held_cr));
        self.held_cr = 0;
    }
}

/// Normalize a complete byte sequence to CRLF line endings
///
/// # Example
///
/// ```
/// use nntp_submit::normalize;
///
/// assert_eq!(normalize(b"a\nb\r\nc\r\r\n"), b"a\r\nb\r\nc\r\n");
/// assert_eq!(normalize(&normalize(b"x\n")), normalize(b"x\n"));
/// ```
pub fn normalize(bytes: &[u8]) -> Vec<u8> {
    let mut normalizer = LineEndingNormalizer::new();
    let mut out = Vec::with_capacity(bytes.len());
    normalizer.feed(bytes, &mut out);
    normalizer.finish(&mut out);
    out
}

/// Write-side decorator that normalizes line endings before bytes reach `W`
///
/// Accepted bytes are rewritten into an internal buffer which is drained into
/// the inner writer on the next write, on `flush`, and on `shutdown`. Callers
/// must flush to guarantee delivery, as with any buffered writer.
#[derive(Debug)]
pub struct NormalizedWriter<W> {
    inner: W,
    normalizer: LineEndingNormalizer,
    pending: Vec<u8>,
    written: usize,
}

impl<W: AsyncWrite + Unpin> NormalizedWriter<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            normalizer: LineEndingNormalizer::new(),
            pending: Vec::with_capacity(1024),
            written: 0,
        }
    }

    /// Shared reference to the wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwrap, discarding any bytes not yet drained
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while self.written < self.pending.len() {
            let n = ready!(
                Pin::new(&mut self.inner).poll_write(cx, &self.pending[self.written..])
            )?;
            if n == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.written += n;
        }
        self.pending.clear();
        self.written = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for NormalizedWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        ready!(this.poll_drain(cx))?;
        this.normalizer.feed(buf, &mut this.pending);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.normalizer.has_pending() {
            this.normalizer.finish(&mut this.pending);
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.normalizer.has_pending() {
            this.normalizer.finish(&mut this.pending);
        }
        ready!(this.poll_drain(cx))?;
        Pin::new(&mut this.inner).poll_shutdown(cx)
    }
}
