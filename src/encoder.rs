//! Framed XML encoding of NETCONF requests.

use crate::error::Result;
use crate::message::{HelloMessage, Method};
use crate::MESSAGE_SEPARATOR;
use log::debug;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Serializes RPC envelopes onto one NETCONF session's outbound byte
/// stream, appending the message separator and flushing after every
/// message.
pub struct Encoder<W> {
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> Encoder<W> {
    /// Buffers the given writer and wraps it in an `Encoder`.
    pub fn new(writer: W) -> Encoder<W> {
        Encoder {
            writer: BufWriter::new(writer),
        }
    }

    /// Returns the underlying writer, e.g. to shut the stream down.
    pub fn get_mut(&mut self) -> &mut W {
        self.writer.get_mut()
    }

    /// Wraps the payload in a counter-stamped [`Method`] envelope and emits
    /// it. Payloads that already carry their envelope go through
    /// [`encode_method`](Encoder::encode_method) instead.
    pub async fn encode<M: Serialize>(&mut self, payload: &M) -> Result<()> {
        let method = Method::wrap(payload);
        self.encode_method(&method).await
    }

    /// Emits an envelope as-is, follows it with the message separator and
    /// flushes.
    pub async fn encode_method<M: Serialize>(&mut self, method: &Method<M>) -> Result<()> {
        let xml = method.to_xml()?;
        debug!("rpc:\n{}", xml);
        self.writer.write_all(xml.as_bytes()).await?;
        self.write_sep().await
    }

    /// Emits a hello message followed by the message separator.
    pub async fn encode_hello(&mut self, hello: &HelloMessage) -> Result<()> {
        let mut buffer = String::with_capacity(206);
        let ser = quick_xml::se::Serializer::new(&mut buffer);
        hello.serialize(ser)?;
        self.writer.write_all(buffer.as_bytes()).await?;
        self.write_sep().await
    }

    /// Writes the message separator and a trailing newline, then flushes.
    /// Only needed when the XML token stream is produced manually;
    /// [`encode`](Encoder::encode) handles the separator itself.
    pub async fn write_sep(&mut self) -> Result<()> {
        self.writer.write_all(MESSAGE_SEPARATOR.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Writes the given bytes verbatim and flushes. Used for pre-rendered
    /// messages such as [`DEFAULT_HELLO_MESSAGE`](crate::DEFAULT_HELLO_MESSAGE);
    /// the caller is responsible for the separator.
    pub async fn write_raw(&mut self, message: &str) -> Result<()> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Returns the NETCONF encoding of the payload wrapped in a counter-stamped
/// envelope, message separator and trailing newline included.
pub fn marshal<M: Serialize>(payload: &M) -> Result<String> {
    marshal_method(&Method::wrap(payload))
}

/// Returns the NETCONF encoding of an explicit envelope, message separator
/// and trailing newline included.
pub fn marshal_method<M: Serialize>(method: &Method<M>) -> Result<String> {
    let mut xml = method.to_xml()?;
    xml.push_str(MESSAGE_SEPARATOR);
    xml.push('\n');
    Ok(xml)
}
