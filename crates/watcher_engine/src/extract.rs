use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;
use watcher_core::text::{normalize_whitespace, word_count};
use watcher_core::{Item, ItemError};
use watcher_logging::{watcher_debug, watcher_info};

use crate::RawDocument;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
    #[error("no listing entry matched strategies [{tried}]")]
    NoListingEntry { tried: String },
    #[error("listing entry found by {strategy} is not a valid item: {source}")]
    InvalidItem {
        strategy: String,
        #[source]
        source: ItemError,
    },
    #[error("detail page has no extractable body text")]
    EmptyBody,
}

/// One way of locating the most recent entry on the listing page. `title`
/// and `link` are evaluated inside the first element matching `entry`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingSelectors {
    pub name: String,
    pub entry: String,
    pub title: String,
    pub link: String,
}

impl ListingSelectors {
    fn new(name: &str, entry: &str, title: &str, link: &str) -> Self {
        Self {
            name: name.to_string(),
            entry: entry.to_string(),
            title: title.to_string(),
            link: link.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorSettings {
    /// Tried in order; the first strategy yielding a valid item wins.
    pub listing: Vec<ListingSelectors>,
    /// Candidate body containers on the detail page, tried in order.
    pub body_containers: Vec<String>,
    pub paragraph: String,
    /// Bodies shorter than this are still returned, only logged.
    pub min_body_words: usize,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            listing: vec![
                ListingSelectors::new(
                    "post-list",
                    "li.wp-block-post",
                    "h2.wp-block-post-title",
                    "h2.wp-block-post-title a[href]",
                ),
                ListingSelectors::new("article", "article", "h2, h3", "h2 a[href], h3 a[href]"),
                ListingSelectors::new("heading-link", "body", "h2 a[href]", "h2 a[href]"),
            ],
            body_containers: vec![
                "div.wp-block-whitehouse-post-template__content".to_string(),
                "article".to_string(),
                "main".to_string(),
                "body".to_string(),
            ],
            paragraph: "p".to_string(),
            min_body_words: 50,
        }
    }
}

pub trait Extractor: Send + Sync {
    /// Most recent entry of a listing page.
    fn extract_listing(&self, document: &RawDocument) -> Result<Item, ExtractionError>;
    /// Plain body text of a detail page.
    fn extract_body(&self, document: &RawDocument) -> Result<String, ExtractionError>;
}

struct CompiledListing {
    name: String,
    entry: Selector,
    title: Selector,
    link: Selector,
}

/// CSS-selector extractor with an ordered fallback chain, since the source
/// page's markup changes without notice.
pub struct SelectorExtractor {
    listing: Vec<CompiledListing>,
    containers: Vec<Selector>,
    paragraph: Selector,
    min_body_words: usize,
}

impl SelectorExtractor {
    pub fn new(settings: &ExtractorSettings) -> Result<Self, ExtractionError> {
        let listing = settings
            .listing
            .iter()
            .map(|s| {
                Ok(CompiledListing {
                    name: s.name.clone(),
                    entry: compile(&s.entry)?,
                    title: compile(&s.title)?,
                    link: compile(&s.link)?,
                })
            })
            .collect::<Result<Vec<_>, ExtractionError>>()?;
        let containers = settings
            .body_containers
            .iter()
            .map(|s| compile(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            listing,
            containers,
            paragraph: compile(&settings.paragraph)?,
            min_body_words: settings.min_body_words,
        })
    }

    fn try_strategy(
        &self,
        strategy: &CompiledListing,
        doc: &Html,
        base: Option<&Url>,
    ) -> Option<Result<Item, ItemError>> {
        let entry = doc.select(&strategy.entry).next()?;
        let title = entry
            .select(&strategy.title)
            .map(element_text)
            .find(|t| !t.is_empty())?;
        let href = entry
            .select(&strategy.link)
            .filter_map(|a| a.value().attr("href"))
            .find_map(|href| resolve_url(href, base))?;
        Some(Item::new(title, href.as_str()))
    }
}

impl Extractor for SelectorExtractor {
    fn extract_listing(&self, document: &RawDocument) -> Result<Item, ExtractionError> {
        let doc = Html::parse_document(&document.html);
        let base = Url::parse(&document.metadata.final_url).ok();
        let mut last_invalid = None;

        for (idx, strategy) in self.listing.iter().enumerate() {
            match self.try_strategy(strategy, &doc, base.as_ref()) {
                Some(Ok(item)) => {
                    if idx > 0 {
                        watcher_info!(
                            "listing matched fallback strategy {:?} after {} miss(es)",
                            strategy.name,
                            idx
                        );
                    }
                    return Ok(item);
                }
                Some(Err(err)) => {
                    watcher_debug!("strategy {:?} found an invalid entry: {}", strategy.name, err);
                    last_invalid = Some(ExtractionError::InvalidItem {
                        strategy: strategy.name.clone(),
                        source: err,
                    });
                }
                None => watcher_debug!("strategy {:?} matched nothing", strategy.name),
            }
        }

        Err(last_invalid.unwrap_or_else(|| ExtractionError::NoListingEntry {
            tried: self
                .listing
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        }))
    }

    fn extract_body(&self, document: &RawDocument) -> Result<String, ExtractionError> {
        let doc = Html::parse_document(&document.html);
        for container in self.containers.iter().filter_map(|sel| doc.select(sel).next()) {
            let paragraphs: Vec<String> = container
                .select(&self.paragraph)
                .map(element_text)
                .filter(|p| !p.is_empty())
                .collect();
            let body = if paragraphs.is_empty() {
                element_text(container)
            } else {
                paragraphs.join(" ")
            };
            if body.is_empty() {
                continue;
            }
            let words = word_count(&body);
            if words < self.min_body_words {
                watcher_debug!(
                    "body has {} word(s), below the {} word threshold; keeping it",
                    words,
                    self.min_body_words
                );
            }
            return Ok(body);
        }
        Err(ExtractionError::EmptyBody)
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|err| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn element_text(element: ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return Some(url);
    }
    base.and_then(|base| base.join(trimmed).ok())
}
