//! NETCONF message envelopes: hello, rpc and rpc-reply.

use crate::counter::MESSAGE_COUNTER;
use crate::error::{Error, ErrorSeverity, ReplyError, Result};
use crate::BASE_NAMESPACE;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;
use std::ops::Range;

/// Capabilities exchange message, root element `<hello>`. The root element
/// name is not enforced when deserializing, to tolerate namespace variation
/// between servers.
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename = "hello")]
pub struct HelloMessage {
    #[serde(rename = "@xmlns", default)]
    xmlns: String,
    capabilities: Capabilities,
    /// Server-assigned session id; never sent by the client.
    #[serde(rename = "session-id", default, skip_serializing_if = "Option::is_none")]
    session_id: Option<u64>,
}

impl HelloMessage {
    /// The hello a client sends: declares the base 1.1 capability only, no
    /// session id.
    pub fn new() -> HelloMessage {
        HelloMessage {
            xmlns: BASE_NAMESPACE.to_string(),
            session_id: None,
            capabilities: Capabilities {
                capability: vec![crate::BASE_11_CAPABILITY.to_string()],
            },
        }
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities.capability
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.capability.iter().any(|cap| cap == capability)
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }
}

impl Display for HelloMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use serde::Serialize;
        let mut buffer = String::with_capacity(206);
        let ser = quick_xml::se::Serializer::new(&mut buffer);
        self.serialize(ser).map_err(|_| fmt::Error)?;
        write!(f, "{}", buffer)
    }
}

#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Capabilities {
    capability: Vec<String>,
}

/// The `<rpc>` envelope around one request. The body is emitted under the
/// envelope as-is, so a `Vec` body renders multiple methods as sibling
/// children of `<rpc>`.
#[derive(Debug, Serialize)]
#[serde(rename = "rpc")]
pub struct Method<M> {
    #[serde(rename = "@xmlns")]
    xmlns: String,
    #[serde(rename = "@message-id")]
    message_id: String,
    #[serde(rename = "$value")]
    body: M,
}

impl<M> Method<M> {
    /// Wraps the given method body with outer rpc tags, stamping the base
    /// namespace and the next value of the process-wide message counter.
    pub fn wrap(body: M) -> Method<M> {
        let id = MESSAGE_COUNTER.add(1);
        Method {
            xmlns: BASE_NAMESPACE.to_string(),
            message_id: id.to_string(),
            body,
        }
    }

    /// Wraps with an explicit `message-id`, leaving the counter untouched.
    pub fn with_message_id(body: M, message_id: impl Into<String>) -> Method<M> {
        Method {
            xmlns: BASE_NAMESPACE.to_string(),
            message_id: message_id.into(),
            body,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }
}

impl<M: serde::Serialize> Method<M> {
    /// Serializes the envelope, without the message separator.
    pub fn to_xml(&self) -> Result<String> {
        let mut buffer = String::with_capacity(256);
        let ser = quick_xml::se::Serializer::new(&mut buffer);
        serde::Serialize::serialize(self, ser)?;
        Ok(buffer)
    }
}

/// A decoded `<rpc-reply>`.
///
/// The envelope content (`message-id`, the `<ok/>` marker and any
/// `<rpc-error>` children, in document order) is captured here; the first
/// element the envelope does not recognize is deserialized into the
/// caller-supplied `T`. The data is owned by the caller once decoding
/// returns.
#[derive(Debug, PartialEq)]
pub struct Reply<T = ()> {
    pub message_id: Option<String>,
    /// Presence of the `<ok/>` marker element.
    pub ok: bool,
    pub errors: Vec<ReplyError>,
    pub data: Option<T>,
}

impl<T> Reply<T> {
    pub fn is_ok(&self) -> bool {
        self.ok && self.errors.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// First entry with severity [`ErrorSeverity::Error`], in document
    /// order. Warnings never qualify.
    pub fn first_error(&self) -> Option<&ReplyError> {
        self.errors
            .iter()
            .find(|err| err.error_severity == ErrorSeverity::Error)
    }
}

impl<T: DeserializeOwned> Reply<T> {
    /// Parses one rpc-reply document. Anything after the closing root tag,
    /// the message separator included, is ignored.
    ///
    /// The data element is only deserialized when no error-severity
    /// `<rpc-error>` is present; a reply that failed rarely carries the
    /// elements the caller's type expects.
    pub fn from_xml(xml: &str) -> Result<Reply<T>> {
        let mut reader = Reader::from_str(xml);
        let mut reply = Reply {
            message_id: None,
            ok: false,
            errors: Vec::new(),
            data: None,
        };
        let mut root_seen = false;
        let mut data_span: Option<Range<usize>> = None;

        loop {
            let pos = reader.buffer_position() as usize;
            match reader.read_event()? {
                Event::Start(element) => {
                    if !root_seen {
                        root_seen = true;
                        if let Some(attr) = element
                            .try_get_attribute("message-id")
                            .map_err(quick_xml::Error::from)?
                        {
                            reply.message_id = Some(attr.unescape_value()?.into_owned());
                        }
                        continue;
                    }
                    match element.local_name().as_ref() {
                        b"ok" => {
                            reader.read_to_end(element.name())?;
                            reply.ok = true;
                        }
                        b"rpc-error" => {
                            reader.read_to_end(element.name())?;
                            let end = reader.buffer_position() as usize;
                            reply.errors.push(quick_xml::de::from_str(&xml[pos..end])?);
                        }
                        _ => {
                            reader.read_to_end(element.name())?;
                            let end = reader.buffer_position() as usize;
                            if data_span.is_none() {
                                data_span = Some(pos..end);
                            }
                        }
                    }
                }
                Event::Empty(element) => {
                    if !root_seen {
                        // empty reply element, attributes only
                        if let Some(attr) = element
                            .try_get_attribute("message-id")
                            .map_err(quick_xml::Error::from)?
                        {
                            reply.message_id = Some(attr.unescape_value()?.into_owned());
                        }
                        break;
                    }
                    match element.local_name().as_ref() {
                        b"ok" => reply.ok = true,
                        b"rpc-error" => {}
                        _ => {
                            let end = reader.buffer_position() as usize;
                            if data_span.is_none() {
                                data_span = Some(pos..end);
                            }
                        }
                    }
                }
                Event::End(_) => break,
                Event::Eof => break,
                _ => {}
            }
        }

        if reply.first_error().is_none() {
            if let Some(span) = data_span {
                reply.data = Some(quick_xml::de::from_str(&xml[span])?);
            }
        }

        Ok(reply)
    }
}

impl<T: DeserializeOwned> Reply<T> {
    /// [`from_xml`](Reply::from_xml) followed by promotion of the first
    /// error-severity `<rpc-error>` into [`Error::Rpc`].
    pub(crate) fn from_xml_checked(xml: &str) -> Result<Reply<T>> {
        let reply = Self::from_xml(xml)?;
        match reply.first_error() {
            Some(err) => Err(Error::Rpc(err.clone())),
            None => Ok(reply),
        }
    }
}
