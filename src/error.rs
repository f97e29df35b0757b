//! Crate error type and the NETCONF error taxonomy.
//!
//! The `error-severity`, `error-type` and `error-tag` enumerations follow
//! [RFC6241 Appendix A]. Each enum stores its wire strings in a table sorted
//! lexicographically, so one table both renders a value (direct index) and
//! parses text (binary search). The variants are declared in table order;
//! tests guard the sortedness.
//!
//! [RFC6241 Appendix A]: https://www.rfc-editor.org/rfc/rfc6241.html#appendix-A

use serde_derive::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Ssh(#[from] async_ssh2_lite::Error),
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    SerializingFailure(#[from] quick_xml::DeError),
    #[error(transparent)]
    SerializeFailure(#[from] quick_xml::SeError),
    #[error("remote procedure call failed:\n{0}")]
    Rpc(#[from] ReplyError),
    #[error(transparent)]
    TextParse(#[from] TextParseError),
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    #[error("invalid utf-8 in message: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("operation cancelled")]
    Cancelled,
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    pub fn new(msg: String) -> Self {
        Error::Anyhow(anyhow::Error::msg(msg))
    }
}

/// Returned when an enum's text conversion fails. The original text is kept
/// verbatim for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("netconf: unknown {kind} parsing {value:?}")]
pub struct TextParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Returned when a whole-message read deadline expires. The session should
/// be closed after receiving one: the pending read may still complete and
/// leave stale bytes in the transport.
#[derive(Debug)]
pub struct DeadlineError {
    pub op: &'static str,
    pub begin: Instant,
    pub fail: Instant,
    pub deadline: Duration,
}

impl fmt::Display for DeadlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "netconf: {} deadline {:?} exceeded after {:?}",
            self.op,
            self.deadline,
            self.fail.duration_since(self.begin)
        )
    }
}

impl std::error::Error for DeadlineError {}

/// Lowercases and trims the text, then binary-searches a sorted wire-string
/// table. Empty (or all-whitespace) input hits the tables' zero entry.
fn search_table(table: &[&str], text: &str) -> Option<usize> {
    let text = text.trim().to_ascii_lowercase();
    table.binary_search(&text.as_str()).ok()
}

/// Severity of an `<rpc-error>`, either warning or error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Uninitialized severity.
    #[default]
    Zero,
    /// The error level; every RFC 6241 error tag carries it.
    Error,
    /// The severity could not be identified, which may indicate an internal
    /// error.
    Unknown,
    /// Not yet utilized, according to RFC 6241.
    Warning,
}

/// Sorted by value only by accident: `"" < "error" < "unknown" < "warning"`.
/// Verify the sortedness test when adding variants.
const ERROR_SEVERITY_STRINGS: [&str; 4] = ["", "error", "unknown", "warning"];

const ERROR_SEVERITY_VALUES: [ErrorSeverity; 4] = [
    ErrorSeverity::Zero,
    ErrorSeverity::Error,
    ErrorSeverity::Unknown,
    ErrorSeverity::Warning,
];

impl ErrorSeverity {
    /// Returns the wire representation.
    pub fn as_str(self) -> &'static str {
        ERROR_SEVERITY_STRINGS[self as usize]
    }

    /// Parses the wire representation, ignoring surrounding whitespace and
    /// case. Empty input parses to [`ErrorSeverity::Zero`].
    pub fn parse_text(text: &str) -> std::result::Result<Self, TextParseError> {
        match search_table(&ERROR_SEVERITY_STRINGS, text) {
            Some(i) => Ok(ERROR_SEVERITY_VALUES[i]),
            None => Err(TextParseError {
                kind: "ErrorSeverity",
                value: text.to_string(),
            }),
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorSeverity {
    type Err = TextParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_text(s)
    }
}

impl<'de> serde::de::Deserialize<'de> for ErrorSeverity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let text = <String as serde::de::Deserialize>::deserialize(deserializer)?;
        // unparseable text decodes as Unknown so the reply decode continues
        Ok(Self::parse_text(&text).unwrap_or(ErrorSeverity::Unknown))
    }
}

/// Conceptual layer an `<rpc-error>` occurred on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorType {
    /// Uninitialized type.
    #[default]
    Zero,
    /// Content layer.
    Application,
    /// Operations layer, the base protocol operations invoked as RPC
    /// methods.
    Protocol,
    /// Messages layer, the transport-independent framing for RPCs and
    /// notifications.
    Rpc,
    /// Secure Transport layer between client and server.
    Transport,
    /// Unexpected condition.
    Unknown,
}

const ERROR_TYPE_STRINGS: [&str; 6] = [
    "",
    "application",
    "protocol",
    "rpc",
    "transport",
    "unknown",
];

const ERROR_TYPE_VALUES: [ErrorType; 6] = [
    ErrorType::Zero,
    ErrorType::Application,
    ErrorType::Protocol,
    ErrorType::Rpc,
    ErrorType::Transport,
    ErrorType::Unknown,
];

impl ErrorType {
    pub fn as_str(self) -> &'static str {
        ERROR_TYPE_STRINGS[self as usize]
    }

    pub fn parse_text(text: &str) -> std::result::Result<Self, TextParseError> {
        match search_table(&ERROR_TYPE_STRINGS, text) {
            Some(i) => Ok(ERROR_TYPE_VALUES[i]),
            None => Err(TextParseError {
                kind: "ErrorType",
                value: text.to_string(),
            }),
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorType {
    type Err = TextParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_text(s)
    }
}

impl<'de> serde::de::Deserialize<'de> for ErrorType {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let text = <String as serde::de::Deserialize>::deserialize(deserializer)?;
        Ok(Self::parse_text(&text).unwrap_or(ErrorType::Unknown))
    }
}

/// Error condition of an `<rpc-error>`.
///
/// Variants are declared in the lexicographic order of their wire strings;
/// the table index doubles as the discriminant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorTag {
    /// Uninitialized tag.
    #[default]
    Zero,
    /// Access to the requested operation or data is denied because
    /// authorization failed.
    AccessDenied,
    /// An attribute value is not correct; wrong type, out of range, pattern
    /// mismatch.
    BadAttribute,
    /// An element value is not correct; `ErrorInfo::bad_element` names it.
    BadElement,
    /// The relevant data model content already exists.
    DataExists,
    /// The relevant data model content does not exist.
    DataMissing,
    /// The request requires a resource that is already in use.
    InUse,
    /// The request specifies an unacceptable value for one or more
    /// parameters.
    InvalidValue,
    /// The requested lock is held by another entity.
    LockDenied,
    /// The message could not be parsed; not well-formed XML or an invalid
    /// character set.
    MalformedMessage,
    /// An expected attribute is missing.
    MissingAttribute,
    /// An expected element is missing; `ErrorInfo::bad_element` names it.
    MissingElement,
    /// The operation failed for a reason not covered by any other condition.
    OperationFailed,
    /// The operation is not supported by the implementation.
    OperationNotSupported,
    /// Some part of the operation failed or was not attempted; `ErrorInfo`
    /// identifies which portions succeeded, failed and were skipped.
    PartialOperation,
    /// Insufficient resources to complete the request.
    ResourceDenied,
    /// A configuration rollback was requested but not completed.
    RollbackFailed,
    /// The request or the response it would generate is too large.
    TooBig,
    /// The tag could not be identified, which probably indicates an internal
    /// error.
    Unknown,
    /// An unexpected attribute is present.
    UnknownAttribute,
    /// An unexpected element is present; `ErrorInfo::bad_element` names it.
    UnknownElement,
    /// An unexpected namespace is present.
    UnknownNamespace,
}

const ERROR_TAG_STRINGS: [&str; 22] = [
    "",
    "access-denied",
    "bad-attribute",
    "bad-element",
    "data-exists",
    "data-missing",
    "in-use",
    "invalid-value",
    "lock-denied",
    "malformed-message",
    "missing-attribute",
    "missing-element",
    "operation-failed",
    "operation-not-supported",
    "partial-operation",
    "resource-denied",
    "rollback-failed",
    "too-big",
    "unknown",
    "unknown-attribute",
    "unknown-element",
    "unknown-namespace",
];

const ERROR_TAG_VALUES: [ErrorTag; 22] = [
    ErrorTag::Zero,
    ErrorTag::AccessDenied,
    ErrorTag::BadAttribute,
    ErrorTag::BadElement,
    ErrorTag::DataExists,
    ErrorTag::DataMissing,
    ErrorTag::InUse,
    ErrorTag::InvalidValue,
    ErrorTag::LockDenied,
    ErrorTag::MalformedMessage,
    ErrorTag::MissingAttribute,
    ErrorTag::MissingElement,
    ErrorTag::OperationFailed,
    ErrorTag::OperationNotSupported,
    ErrorTag::PartialOperation,
    ErrorTag::ResourceDenied,
    ErrorTag::RollbackFailed,
    ErrorTag::TooBig,
    ErrorTag::Unknown,
    ErrorTag::UnknownAttribute,
    ErrorTag::UnknownElement,
    ErrorTag::UnknownNamespace,
];

impl ErrorTag {
    /// Returns the XML tag text that stores this value.
    pub fn as_str(self) -> &'static str {
        ERROR_TAG_STRINGS[self as usize]
    }

    /// Severity this tag implies. Every RFC 6241 tag carries
    /// [`ErrorSeverity::Error`].
    pub fn severity(self) -> ErrorSeverity {
        match self {
            ErrorTag::Zero => ErrorSeverity::Zero,
            ErrorTag::Unknown => ErrorSeverity::Unknown,
            _ => ErrorSeverity::Error,
        }
    }

    pub fn parse_text(text: &str) -> std::result::Result<Self, TextParseError> {
        match search_table(&ERROR_TAG_STRINGS, text) {
            Some(i) => Ok(ERROR_TAG_VALUES[i]),
            None => Err(TextParseError {
                kind: "ErrorTag",
                value: text.to_string(),
            }),
        }
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorTag {
    type Err = TextParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse_text(s)
    }
}

impl<'de> serde::de::Deserialize<'de> for ErrorTag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let text = <String as serde::de::Deserialize>::deserialize(deserializer)?;
        Ok(Self::parse_text(&text).unwrap_or(ErrorTag::Unknown))
    }
}

/// Protocol or data model specific content of an `<error-info>` element.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ErrorInfo {
    /// Name of the bad, missing or unexpected attribute.
    #[serde(default)]
    pub bad_attribute: Option<String>,
    /// Name of the element containing the bad, missing or unexpected
    /// attribute or element.
    #[serde(default)]
    pub bad_element: Option<String>,
    /// Name of the unexpected namespace.
    #[serde(default)]
    pub bad_namespace: Option<String>,
    /// Parent elements for which all children completed the requested
    /// operation.
    #[serde(default)]
    pub ok_element: Vec<String>,
    /// Parent elements for which all children failed to complete the
    /// requested operation.
    #[serde(default)]
    pub err_element: Vec<String>,
    /// Parent elements identifying children for which the operation was not
    /// attempted.
    #[serde(default)]
    pub noop_element: Vec<String>,
    #[serde(default)]
    pub session_id: Option<u64>,
}

/// A single `<rpc-error>` element of an rpc-reply.
///
/// Implements [`std::error::Error`]; [`Decoder::decode`] promotes the first
/// error-severity entry of a reply to the returned error.
///
/// [`Decoder::decode`]: crate::decoder::Decoder::decode
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ReplyError {
    #[serde(default)]
    pub error_type: ErrorType,
    #[serde(default)]
    pub error_tag: ErrorTag,
    #[serde(default)]
    pub error_severity: ErrorSeverity,
    #[serde(default)]
    pub error_app_tag: Option<String>,
    /// XPath expression identifying the node the error applies to.
    #[serde(default)]
    pub error_path: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub error_info: ErrorInfo,
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error_message.as_deref().filter(|m| !m.is_empty()) {
            Some(message) => f.write_str(message),
            None => write!(
                f,
                "{} {} {}",
                self.error_severity,
                self.error_tag,
                self.error_info.bad_element.as_deref().unwrap_or_default()
            ),
        }
    }
}

impl std::error::Error for ReplyError {}
