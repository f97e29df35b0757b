//! Framed XML decoding of NETCONF replies.

use crate::error::{DeadlineError, Error, Result};
use crate::message::{HelloMessage, Reply};
use crate::MESSAGE_SEPARATOR;
use log::trace;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Streaming decoder for one NETCONF session's inbound byte stream.
///
/// The reader is buffered and consumed line by line: a message ends either
/// at a line whose trimmed content is the `]]>]]>` separator (raw streams)
/// or at end-of-stream (the boundary a [`FrameReader`] reports). Decoding a
/// token stream manually is possible through [`read_message`] and
/// [`skip_sep`]; most uses call [`decode`] or [`decode_hello`].
///
/// [`FrameReader`]: crate::framer::FrameReader
/// [`read_message`]: Decoder::read_message
/// [`skip_sep`]: Decoder::skip_sep
/// [`decode`]: Decoder::decode
/// [`decode_hello`]: Decoder::decode_hello
pub struct Decoder<R> {
    reader: BufReader<R>,
    deadline: Option<Duration>,
    tag: &'static str,
}

impl<R: AsyncRead + Unpin> Decoder<R> {
    /// Buffers the given reader and wraps it in a `Decoder`.
    pub fn new(reader: R) -> Decoder<R> {
        Decoder {
            reader: BufReader::new(reader),
            deadline: None,
            tag: "?",
        }
    }

    pub fn tagged(mut self, tag: &'static str) -> Decoder<R> { self.tag = tag; self }

    /// Guards every subsequent message read with an overall wall-clock
    /// deadline. On expiry the read fails with [`DeadlineError`] and the
    /// session should be closed: the server may still complete its write and
    /// leave stale bytes in the transport.
    pub fn with_deadline(mut self, deadline: Duration) -> Decoder<R> {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the underlying reader, e.g. to reset a
    /// [`FrameReader`](crate::framer::FrameReader) at a reply boundary.
    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Reads one complete message, up to but excluding the message
    /// separator line (or end-of-stream).
    pub async fn read_message(&mut self) -> Result<String> {
        match self.deadline {
            Some(deadline) => {
                let begin = Instant::now();
                match tokio::time::timeout(deadline, self.read_until_sep()).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Deadline(DeadlineError {
                        op: "read",
                        begin,
                        fail: Instant::now(),
                        deadline,
                    })),
                }
            }
            None => self.read_until_sep().await,
        }
    }

    async fn read_until_sep(&mut self) -> Result<String> {
        let mut message = Vec::new();
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = self.reader.read_until(b'\n', &mut line).await?;
            eprintln!("DEBUG[{}] read_until_sep n={} line={:?}", self.tag, n, String::from_utf8_lossy(&line));
            if n == 0 {
                break;
            }
            if line.trim_ascii() == MESSAGE_SEPARATOR.as_bytes() {
                break;
            }
            message.extend_from_slice(&line);
        }
        Ok(String::from_utf8(message)?)
    }

    /// Discards everything up to and including the next message separator
    /// line. Only needed when the XML token stream is consumed manually;
    /// [`decode`](Decoder::decode) handles the separator itself.
    pub async fn skip_sep(&mut self) -> Result<()> {
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = self.reader.read_until(b'\n', &mut line).await?;
            if n == 0 || line.trim_ascii() == MESSAGE_SEPARATOR.as_bytes() {
                return Ok(());
            }
        }
    }

    /// Reads the server's capabilities message. A distinct decode case: the
    /// root element is `<hello>`, not `<rpc-reply>`.
    pub async fn decode_hello(&mut self) -> Result<HelloMessage> {
        let message = self.read_message().await?;
        trace!("hello:\n{}", message.trim());
        Ok(quick_xml::de::from_str(&message)?)
    }

    /// Reads and decodes one rpc-reply. The first `<rpc-error>` with
    /// severity `error` is promoted to [`Error::Rpc`]; warnings stay in
    /// [`Reply::errors`].
    pub async fn decode<T: DeserializeOwned>(&mut self) -> Result<Reply<T>> {
        let message = self.read_message().await?;
        trace!("reply:\n{}", message.trim());
        Reply::from_xml_checked(&message)
    }
}

/// Maps one in-memory rpc-reply document into a [`Reply`], discarding any
/// trailing message separator and promoting the first error-severity
/// `<rpc-error>` like [`Decoder::decode`] does.
pub fn unmarshal<T: DeserializeOwned>(xml: &str) -> Result<Reply<T>> {
    Reply::from_xml_checked(xml)
}
