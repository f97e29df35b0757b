//! Serial RPC sessions over an open transport.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, Result};
use crate::framer::FrameReader;
use crate::message::{HelloMessage, Reply};
use crate::transport::Transport;
use crate::DEFAULT_HELLO_MESSAGE;
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// One NETCONF conversation over a transport's stream pair. RPCs are
/// strictly serial: an exchange owns the session exclusively until its reply
/// is decoded, and the XML codec state is never shared.
///
/// The transport must have the `netconf` subsystem requested before the
/// session is opened; [`SshTransport`](crate::transport::ssh::SshTransport)
/// does both.
pub struct Session<R, W> {
    decoder: Decoder<FrameReader<R>>,
    encoder: Encoder<W>,
    transport: Option<Box<dyn Transport>>,
    client: Option<Box<dyn Transport>>,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Performs the capabilities exchange on the given stream pair: decodes
    /// the server's hello, then emits [`DEFAULT_HELLO_MESSAGE`]. Returns the
    /// session and the server's hello.
    pub async fn open(reader: R, writer: W) -> Result<(Session<R, W>, HelloMessage)> {
        let mut decoder = Decoder::new(FrameReader::new(reader));
        let mut encoder = Encoder::new(writer);

        let hello = decoder.decode_hello().await?;
        decoder.get_mut().reset();
        encoder.write_raw(DEFAULT_HELLO_MESSAGE).await?;
        debug!(
            "session established, server advertised {} capabilities",
            hello.capabilities().len()
        );

        Ok((
            Session {
                decoder,
                encoder,
                transport: None,
                client: None,
            },
            hello,
        ))
    }

    /// Attaches the transport session handle closed by
    /// [`close`](Session::close).
    pub fn set_transport(&mut self, transport: Box<dyn Transport>) {
        self.transport = Some(transport);
    }

    /// Attaches the owning transport client handle closed last by
    /// [`close`](Session::close).
    pub fn set_client(&mut self, client: Box<dyn Transport>) {
        self.client = Some(client);
    }

    /// Executes one method and decodes its reply.
    ///
    /// Encode and decode each race against the cancellation token; a fired
    /// token yields [`Error::Cancelled`]. Cancelling after the request was
    /// committed to the wire does not unsend it: treat the session as soiled
    /// and close it, or the next read returns a stale reply.
    pub async fn exec_one<M, T>(
        &mut self,
        cancel: &CancellationToken,
        method: &M,
    ) -> Result<Reply<T>>
    where
        M: Serialize,
        T: DeserializeOwned,
    {
        eprintln!("DEBUG before encode");
        let encoded = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.encoder.encode(method) => result,
        };
        eprintln!("DEBUG after encode: {:?}", encoded.is_ok());
        encoded?;

        eprintln!("DEBUG before decode");
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            result = self.decoder.decode::<T>() => result,
        };
        eprintln!("DEBUG after decode");
        self.decoder.get_mut().reset();
        result
    }

    /// Returns a lazy reply sequence that executes the given methods one at
    /// a time, in order.
    pub fn exec<'a, M: Serialize>(
        &'a mut self,
        cancel: CancellationToken,
        methods: &'a [M],
    ) -> Replies<'a, R, W, M> {
        Replies {
            session: self,
            cancel,
            methods: methods.iter(),
        }
    }

    /// Closes the outbound stream, the transport session and the owning
    /// client, in that order. Every close is attempted regardless of earlier
    /// failures; the first error is surfaced.
    pub async fn close(&mut self) -> Result<()> {
        let mut first_err: Option<Error> = None;

        if let Err(err) = self.encoder.get_mut().shutdown().await {
            first_err = Some(err.into());
        }
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close().await {
                first_err.get_or_insert(err);
            }
        }
        if let Some(mut client) = self.client.take() {
            if let Err(err) = client.close().await {
                first_err.get_or_insert(err);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Lazy result sequence returned by [`Session::exec`]. Each call to
/// [`next`](Replies::next) drives one complete encode/decode exchange.
pub struct Replies<'a, R, W, M> {
    session: &'a mut Session<R, W>,
    cancel: CancellationToken,
    methods: std::slice::Iter<'a, M>,
}

impl<R, W, M> Replies<'_, R, W, M>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    M: Serialize,
{
    /// Executes the next method, or returns `None` once all methods ran.
    pub async fn next<T: DeserializeOwned>(&mut self) -> Option<Result<Reply<T>>> {
        let method = self.methods.next()?;
        Some(self.session.exec_one(&self.cancel, method).await)
    }
}
