//! NETCONF 1.0 end-of-message framing.
//!
//! See [RFC6242 4.3](https://www.rfc-editor.org/rfc/rfc6242.html#section-4.3).

use crate::MESSAGE_SEPARATOR;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

const READ_CHUNK_SIZE: usize = 4096;

/// Adapts a session's stdout stream into an [`AsyncRead`] that reports
/// end-of-stream at the end of every NETCONF message.
///
/// The whole message is absorbed into an internal buffer before any bytes
/// are handed out, so the `]]>]]>` delimiter is detected no matter how the
/// caller sizes its buffers. The delimiter and the whitespace around it are
/// stripped; a single reply can then be drained with standard utilities like
/// `tokio::io::copy` or `read_to_end`, after which reads return `Ok(0)`.
///
/// [`reset`](FrameReader::reset) must be called once a complete message has
/// been read, to clear the end-of-stream state before the next message.
/// Reusing one reader per session avoids repeated buffer allocations.
pub struct FrameReader<R> {
    /// Upstream reader, treated as a pipe attached to the session's stdout.
    inner: R,
    /// Accumulates the entire message.
    buffer: Vec<u8>,
    /// Read offset into `buffer`.
    pos: usize,
    /// Set once the message separator was found.
    done: bool,
    /// Preserves upstream errors between reads.
    err: Option<PreservedError>,
    /// Scratch space handed to the upstream reader.
    chunk: Box<[u8]>,
}

/// An `io::Error` is not `Clone`; keep what is needed to resurface it on
/// every subsequent read.
struct PreservedError {
    kind: io::ErrorKind,
    message: String,
}

impl PreservedError {
    fn to_io_error(&self) -> io::Error {
        io::Error::new(self.kind, self.message.clone())
    }
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader {
            inner,
            buffer: Vec::new(),
            pos: 0,
            done: false,
            err: None,
            chunk: vec![0u8; READ_CHUNK_SIZE].into_boxed_slice(),
        }
    }

    /// Clears the end-of-stream state, the internal buffer and any preserved
    /// error, preparing the reader for the next message.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.pos = 0;
        self.done = false;
        self.err = None;
    }

    /// Returns the upstream reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Right-trims whitespace from the accumulated buffer and truncates at
    /// the separator if the trimmed tail ends with one.
    fn check_separator(&mut self) {
        let sep = MESSAGE_SEPARATOR.as_bytes();
        let trimmed_len = self
            .buffer
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        if self.buffer[..trimmed_len].ends_with(sep) {
            self.buffer.truncate(trimmed_len - sep.len());
            self.done = true;
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for FrameReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        while !this.done && this.err.is_none() {
            let mut chunk = ReadBuf::new(&mut this.chunk);
            match Pin::new(&mut this.inner).poll_read(cx, &mut chunk) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(err)) => {
                    // only non end-of-stream errors exist in this model;
                    // preserve for every subsequent read
                    this.err = Some(PreservedError {
                        kind: err.kind(),
                        message: err.to_string(),
                    });
                    break;
                }
                Poll::Ready(Ok(())) => {
                    let filled = chunk.filled();
                    if filled.is_empty() {
                        // upstream end-of-stream before a separator; serve
                        // what was buffered
                        break;
                    }
                    this.buffer.extend_from_slice(filled);
                    this.check_separator();
                }
            }
        }

        // always prefer a preserved upstream error over the buffer contents
        if let Some(err) = &this.err {
            return Poll::Ready(Err(err.to_io_error()));
        }

        let available = this.buffer.len() - this.pos;
        if available == 0 {
            return Poll::Ready(Ok(()));
        }
        let n = available.min(buf.remaining());
        buf.put_slice(&this.buffer[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}
