//! Per-operation I/O deadlines.
//!
//! [`DeadlineReader`] and [`DeadlineWriter`] decorate a stream half so every
//! read or write call races against a timer armed when the call starts. On
//! expiry the operation fails with [`io::ErrorKind::TimedOut`] carrying a
//! [`DeadlineError`]. A reader that timed out mid-message leaves the session
//! unusable; close it instead of reading on.

use crate::error::DeadlineError;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep, Sleep};

/// Arms a fresh timer for each read call on the inner reader. `None`
/// disables the deadline entirely.
pub struct DeadlineReader<R> {
    inner: R,
    timeout: Option<Duration>,
    deadline: Option<OpDeadline>,
}

/// Same contract as [`DeadlineReader`], for writes. Flush and shutdown pass
/// through untimed.
pub struct DeadlineWriter<W> {
    inner: W,
    timeout: Option<Duration>,
    deadline: Option<OpDeadline>,
}

struct OpDeadline {
    sleep: Pin<Box<Sleep>>,
    begin: std::time::Instant,
}

impl OpDeadline {
    fn arm(timeout: Duration) -> Self {
        OpDeadline {
            sleep: Box::pin(sleep(timeout)),
            begin: std::time::Instant::now(),
        }
    }
}

/// Polls the operation deadline, arming it on the first poll of a call.
/// Returns the timeout error once the timer fires.
fn poll_deadline(
    deadline: &mut Option<OpDeadline>,
    timeout: Option<Duration>,
    op: &'static str,
    cx: &mut Context<'_>,
) -> Result<(), io::Error> {
    let Some(timeout) = timeout else {
        return Ok(());
    };
    let armed = deadline.get_or_insert_with(|| OpDeadline::arm(timeout));
    match armed.sleep.as_mut().poll(cx) {
        Poll::Pending => Ok(()),
        Poll::Ready(()) => {
            let begin = armed.begin;
            *deadline = None;
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                DeadlineError {
                    op,
                    begin,
                    fail: std::time::Instant::now(),
                    deadline: timeout,
                },
            ))
        }
    }
}

impl<R> DeadlineReader<R> {
    pub fn new(inner: R, timeout: Option<Duration>) -> Self {
        DeadlineReader {
            inner,
            timeout,
            deadline: None,
        }
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for DeadlineReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Err(err) = poll_deadline(&mut this.deadline, this.timeout, "read", cx) {
            return Poll::Ready(Err(err));
        }
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                this.deadline = None;
                Poll::Ready(result)
            }
        }
    }
}

impl<W> DeadlineWriter<W> {
    pub fn new(inner: W, timeout: Option<Duration>) -> Self {
        DeadlineWriter {
            inner,
            timeout,
            deadline: None,
        }
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for DeadlineWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Err(err) = poll_deadline(&mut this.deadline, this.timeout, "write", cx) {
            return Poll::Ready(Err(err));
        }
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(result) => {
                this.deadline = None;
                Poll::Ready(result)
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
