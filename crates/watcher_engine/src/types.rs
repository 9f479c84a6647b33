use std::fmt;

use crate::retry::Retryable;

/// A page body decoded to UTF-8, with what was learned fetching it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub html: String,
    pub metadata: FetchMetadata,
}

impl RawDocument {
    /// A document that was never fetched, e.g. a saved page or a test fixture.
    pub fn from_html(url: &str, html: impl Into<String>) -> Self {
        let html = html.into();
        Self {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirected: false,
                content_type: Some("text/html".to_string()),
                encoding_label: "UTF-8".to_string(),
                byte_len: html.len() as u64,
                attempts: 0,
            },
            html,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    /// Where the last redirect landed. Relative links resolve against this.
    pub final_url: String,
    pub redirected: bool,
    pub content_type: Option<String>,
    pub encoding_label: String,
    pub byte_len: u64,
    /// Attempts spent, including the successful one.
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("GET {url}: {kind} ({message})")]
pub struct FetchError {
    pub url: String,
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(url: &str, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind,
            message: message.into(),
        }
    }
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl FailureKind {
    /// Connection errors, timeouts and 5xx are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            FailureKind::Timeout | FailureKind::Network => true,
            FailureKind::HttpStatus(code) => (500..600).contains(code),
            _ => false,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => f.write_str("malformed url"),
            FailureKind::HttpStatus(code) => write!(f, "status {code}"),
            FailureKind::Timeout => f.write_str("timed out"),
            FailureKind::RedirectLimitExceeded => f.write_str("too many redirects"),
            FailureKind::TooLarge { max_bytes, actual: Some(actual) } => {
                write!(f, "{actual} bytes exceeds the {max_bytes} byte limit")
            }
            FailureKind::TooLarge { max_bytes, actual: None } => {
                write!(f, "body exceeds the {max_bytes} byte limit")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "content type {content_type} is not html")
            }
            FailureKind::Network => f.write_str("connection failed"),
        }
    }
}
