//! # netconf-client
//!
//! A NETCONF ([RFC6241]) client library. NETCONF messages are XML documents
//! exchanged over a secure transport and framed with the 1.0 end-of-message
//! delimiter `]]>]]>` ([RFC6242]). This crate provides the framing and codec
//! pipeline between the transport byte streams and typed RPC values:
//!
//! * [`FrameReader`] turns the inbound byte stream into discrete messages,
//! * [`Decoder`] and [`Encoder`] map messages to and from serde types,
//! * [`Session`] drives the hello exchange and serial request/reply RPCs,
//! * [`transport::ssh`] dials devices over SSH with the `netconf` subsystem.
//!
//! ```toml
//! netconf-client = "^0.1.0"
//! ```
//!
//! [RFC6241]: https://www.rfc-editor.org/rfc/rfc6241.html
//! [RFC6242]: https://www.rfc-editor.org/rfc/rfc6242.html

pub mod config;
pub mod counter;
pub mod deadline;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod framer;
pub mod message;
pub mod session;
pub mod transport;

pub use config::Config;
pub use counter::{MessageCounter, MESSAGE_COUNTER};
pub use deadline::{DeadlineReader, DeadlineWriter};
pub use decoder::{unmarshal, Decoder};
pub use encoder::{marshal, marshal_method, Encoder};
pub use error::{
    DeadlineError, Error, ErrorInfo, ErrorSeverity, ErrorTag, ErrorType, ReplyError, Result,
    TextParseError,
};
pub use framer::FrameReader;
pub use message::{HelloMessage, Method, Reply};
pub use session::{Replies, Session};

/// End-of-message delimiter for NETCONF 1.0 framing. Explicitly invalid XML,
/// so it can never appear inside a well-formed message.
pub const MESSAGE_SEPARATOR: &str = "]]>]]>";

/// The base NETCONF namespace, default for all RPC envelopes.
pub const BASE_NAMESPACE: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Capability URI for the base 1.1 protocol version.
pub const BASE_11_CAPABILITY: &str = "urn:ietf:params:netconf:base:1.1";

/// Port used when the configured address does not include one.
pub const DEFAULT_PORT: u16 = 830;

/// Hello sent to the server when the client application does not send one
/// manually. Written verbatim, separator included.
pub const DEFAULT_HELLO_MESSAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<hello xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
<capabilities>
<capability>urn:ietf:params:netconf:base:1.1</capability>
</capabilities>
</hello>
]]>]]>
"#;
