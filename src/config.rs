//! Dial configuration.

use crate::DEFAULT_PORT;
use std::time::Duration;

/// All available options for dialing a NETCONF target.
///
/// ```rust
/// use netconf_client::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     read_timeout: Some(Duration::from_secs(30)),
///     ..Config::new("172.30.15.1", "admin")
/// };
/// assert_eq!(config.normalized_address(), "172.30.15.1:830");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Username for SSH authentication.
    pub username: String,
    /// Password for SSH authentication. Agent identities are tried when
    /// unset.
    pub password: Option<String>,
    /// Interval of transport keepalive messages. `None` disables them.
    pub keepalive: Option<Duration>,
    /// Maximum time to establish the transport. `None` waits indefinitely.
    pub dial_timeout: Option<Duration>,
    /// Deadline armed before every read on the transport. `None` disables
    /// it.
    pub read_timeout: Option<Duration>,
    /// Deadline armed before every write on the transport. `None` disables
    /// it.
    pub write_timeout: Option<Duration>,
    /// Network to dial with. Defaults to `tcp`, the only supported value.
    pub network: Option<String>,
    /// Dial target. Value can include a port, eg. `172.30.15.1:22`; port
    /// 830 is used otherwise.
    pub address: String,
}

impl Config {
    pub fn new(address: impl Into<String>, username: impl Into<String>) -> Config {
        Config {
            address: address.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn network(&self) -> &str {
        self.network.as_deref().unwrap_or("tcp")
    }

    /// Joins the default NETCONF port to targets that do not include one.
    pub fn normalized_address(&self) -> String {
        if self.address.contains(':') {
            self.address.clone()
        } else {
            format!("{}:{}", self.address, DEFAULT_PORT)
        }
    }
}
