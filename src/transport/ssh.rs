//! SSH transport via `async-ssh2-lite`.

use crate::config::Config;
use crate::deadline::{DeadlineReader, DeadlineWriter};
use crate::error::{Error, Result};
use crate::message::HelloMessage;
use crate::session::Session;
use crate::transport::Transport;
use async_ssh2_lite::{ssh2, AsyncChannel, AsyncSession, SessionConfiguration};
use async_trait::async_trait;
use log::{debug, warn};
use std::io;
use std::time::Duration;
use tokio::io::{ReadHalf, WriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Session type produced by [`SshTransport::open_session`]: channel halves
/// behind the per-operation deadline adapters.
pub type SshSession = Session<
    DeadlineReader<ReadHalf<AsyncChannel<TcpStream>>>,
    DeadlineWriter<WriteHalf<AsyncChannel<TcpStream>>>,
>;

/// An authenticated SSH connection to a NETCONF server.
pub struct SshTransport {
    session: AsyncSession<TcpStream>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl SshTransport {
    /// Connects to the config's target and authenticates, with password
    /// when one is configured, otherwise with agent identities.
    pub async fn dial(config: &Config) -> Result<SshTransport> {
        if config.network() != "tcp" {
            return Err(Error::new(format!(
                "unsupported network {:?}, only tcp is available",
                config.network()
            )));
        }

        let addr = config.normalized_address();
        let stream = match config.dial_timeout {
            Some(limit) => timeout(limit, TcpStream::connect(&addr))
                .await
                .map_err(|_| Error::new(format!("dial timeout connecting to {addr}")))??,
            None => TcpStream::connect(&addr).await?,
        };

        let mut configuration = SessionConfiguration::new();
        configuration.set_timeout(10_000);
        if let Some(keepalive) = config.keepalive {
            debug!(target: &addr, "Setting keepalive interval: {} seconds", keepalive.as_secs());
            configuration.set_keepalive(true, keepalive.as_secs() as u32);
        }

        let mut session = AsyncSession::new(stream, configuration)?;
        session.handshake().await?;

        if let Some(password) = &config.password {
            session.userauth_password(&config.username, password).await?;
        } else {
            authenticate_with_agent(&session, &addr, &config.username).await?;
        }

        if !session.authenticated() {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(SshTransport {
            session,
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
        })
    }

    /// Opens an SSH channel, requests the `netconf` subsystem and performs
    /// the hello exchange. The returned session owns a handle that
    /// disconnects this transport on [`Session::close`].
    pub async fn open_session(self) -> Result<(SshSession, HelloMessage)> {
        let mut channel = self.session.channel_session().await?;
        channel.subsystem("netconf").await?;

        let (read_half, write_half) = tokio::io::split(channel);
        let reader = DeadlineReader::new(read_half, self.read_timeout);
        let writer = DeadlineWriter::new(write_half, self.write_timeout);

        let (mut session, hello) = Session::open(reader, writer).await?;
        session.set_client(Box::new(SshClient {
            session: self.session,
        }));
        Ok((session, hello))
    }
}

async fn authenticate_with_agent(
    session: &AsyncSession<TcpStream>,
    addr: &str,
    username: &str,
) -> Result<()> {
    let mut agent = session.agent()?;
    agent.connect().await?;
    agent.list_identities().await?;

    for identity in agent.identities()? {
        debug!(
            target: addr,
            "Trying authentication with public key '{}'",
            identity.comment()
        );
        match agent.userauth(username, &identity).await {
            Ok(_) => break,
            Err(err) => {
                warn!(
                    target: addr,
                    "Public key '{}' authentication failed: {}",
                    identity.comment(),
                    err
                );
                continue;
            }
        }
    }
    Ok(())
}

struct SshClient {
    session: AsyncSession<TcpStream>,
}

#[async_trait]
impl Transport for SshClient {
    async fn close(&mut self) -> Result<()> {
        self.session
            .disconnect(Some(ssh2::ByApplication), "Shutdown", None)
            .await?;
        Ok(())
    }
}
