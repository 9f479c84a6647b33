use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{header, Response};
use watcher_logging::{watcher_debug, watcher_trace, watcher_warn};

use crate::decode::decode_html;
use crate::retry::RetryPolicy;
use crate::{FailureKind, FetchError, FetchMetadata, RawDocument};

/// HTTP limits for listing and detail pages.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    /// Whole-request deadline, body included.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Media types accepted without parameters, compared case-insensitively.
    /// A response with no Content-Type header is accepted.
    pub html_media_types: Vec<String>,
    pub user_agent: String,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            html_media_types: vec!["text/html".into(), "application/xhtml+xml".into()],
            user_agent: concat!("listing-watcher/", env!("CARGO_PKG_VERSION")).to_string(),
            retry: RetryPolicy::standard(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// GET `url` and decode the body, retrying transient failures.
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError>;
}

/// `reqwest`-backed fetcher. One client, and so one connection pool, serves
/// every attempt.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .user_agent(settings.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()?;
        Ok(Self { settings, client })
    }

    fn accepts(&self, content_type: &str) -> bool {
        let media_type = content_type
            .split_once(';')
            .map_or(content_type, |(media, _)| media)
            .trim();
        self.settings
            .html_media_types
            .iter()
            .any(|accepted| accepted.eq_ignore_ascii_case(media_type))
    }

    fn too_large(&self, url: &str, actual: u64) -> FetchError {
        FetchError::new(
            url,
            FailureKind::TooLarge {
                max_bytes: self.settings.max_bytes,
                actual: Some(actual),
            },
            "body exceeds the size limit",
        )
    }

    /// Rejects a response before its body is read.
    fn screen(&self, url: &str, response: &Response) -> Result<Option<String>, FetchError> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                url,
                FailureKind::HttpStatus(status.as_u16()),
                status.canonical_reason().unwrap_or("unexpected status"),
            ));
        }

        if let Some(declared) = response.content_length().filter(|&n| n > self.settings.max_bytes) {
            return Err(self.too_large(url, declared));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        match content_type {
            Some(ct) if !self.accepts(&ct) => Err(FetchError::new(
                url,
                FailureKind::UnsupportedContentType { content_type: ct },
                "not an html page",
            )),
            other => Ok(other),
        }
    }

    /// Streams the body, giving up as soon as it outgrows `max_bytes`. The
    /// declared length is not trusted.
    async fn read_capped(&self, url: &str, response: Response) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = chunk.map_err(|err| classify(url, err))?;
            let total = (body.len() + chunk.len()) as u64;
            if total > self.settings.max_bytes {
                return Err(self.too_large(url, total));
            }
            body.extend_from_slice(&chunk);
        }
        watcher_trace!("GET {} read {} byte(s)", url, body.len());
        Ok(body)
    }

    async fn attempt(&self, url: &str) -> Result<RawDocument, FetchError> {
        let target = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(url, FailureKind::InvalidUrl, err.to_string()))?;
        let response = self
            .client
            .get(target.clone())
            .send()
            .await
            .map_err(|err| classify(url, err))?;

        let content_type = self.screen(url, &response)?;
        // Compared parsed; reqwest normalizes `http://host` to `http://host/`.
        let redirected = *response.url() != target;
        let final_url = response.url().to_string();
        let body = self.read_capped(url, response).await?;
        let decoded = decode_html(&body, content_type.as_deref());

        Ok(RawDocument {
            html: decoded.html,
            metadata: FetchMetadata {
                redirected,
                original_url: url.to_string(),
                final_url,
                content_type,
                encoding_label: decoded.encoding_label,
                byte_len: body.len() as u64,
                attempts: 1,
            },
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<RawDocument, FetchError> {
        let label = format!("GET {url}");
        let (mut document, attempts) = self
            .settings
            .retry
            .run(&label, |_| self.attempt(url))
            .await
            .map_err(|(err, attempts)| {
                watcher_warn!("GET {} gave up after {} attempt(s): {}", url, attempts, err);
                err
            })?;
        document.metadata.attempts = attempts;
        watcher_debug!(
            "GET {} -> {} ({} bytes, {})",
            url,
            document.metadata.final_url,
            document.metadata.byte_len,
            document.metadata.encoding_label
        );
        Ok(document)
    }
}

fn classify(url: &str, err: reqwest::Error) -> FetchError {
    let kind = if err.is_timeout() {
        FailureKind::Timeout
    } else if err.is_redirect() {
        FailureKind::RedirectLimitExceeded
    } else {
        FailureKind::Network
    };
    FetchError::new(url, kind, err.to_string())
}
