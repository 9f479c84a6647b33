use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    #[error("item title is empty")]
    EmptyTitle,
    #[error("item link {link:?} is not an absolute url: {reason}")]
    InvalidLink { link: String, reason: String },
    #[error("item link {link:?} uses unsupported scheme {scheme:?}")]
    UnsupportedScheme { link: String, scheme: String },
}

/// The most recent listing entry observed on a poll.
///
/// Built once by the extractor and never mutated; `with_body` produces a new
/// value carrying the detail text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    title: String,
    link: Url,
    #[serde(skip)]
    body_text: Option<String>,
}

impl Item {
    pub fn new(title: impl AsRef<str>, link: impl AsRef<str>) -> Result<Self, ItemError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(ItemError::EmptyTitle);
        }
        let raw = link.as_ref().trim();
        let link = Url::parse(raw).map_err(|err| ItemError::InvalidLink {
            link: raw.to_string(),
            reason: err.to_string(),
        })?;
        if !matches!(link.scheme(), "http" | "https") {
            return Err(ItemError::UnsupportedScheme {
                link: raw.to_string(),
                scheme: link.scheme().to_string(),
            });
        }
        Ok(Self {
            title: title.to_string(),
            link,
            body_text: None,
        })
    }

    pub fn with_body(&self, body: impl Into<String>) -> Self {
        Self {
            title: self.title.clone(),
            link: self.link.clone(),
            body_text: Some(body.into()),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn link(&self) -> &Url {
        &self.link
    }

    pub fn body_text(&self) -> Option<&str> {
        self.body_text.as_deref()
    }
}
