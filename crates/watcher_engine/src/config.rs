//! Configuration loaded from a RON file.
//!
//! The file never holds secrets or private endpoints. Channel entries name the
//! environment variables that carry them, and [`WatcherConfig::resolve`]
//! reads those through a caller-supplied lookup.
//!
//! ```ron
//! (
//!     listing_url: "https://www.whitehouse.gov/presidential-actions/",
//!     state_path: "state/last_title.txt",
//!     summary: (strategy: Extractive, bound: Sentences(3)),
//!     channels: [
//!         Discord(name: "discord", webhook_url_env: "DISCORD_WEBHOOK_URL"),
//!         Email(
//!             name: "inbox",
//!             smtp_host: "smtp.gmail.com",
//!             smtp_port: 465,
//!             username_env: "SMTP_USERNAME",
//!             password_env: "SMTP_PASSWORD",
//!             from: "watcher@example.org",
//!             to: ["alerts@example.org"],
//!         ),
//!     ],
//! )
//! ```

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;
use watcher_core::LengthBound;

use crate::extract::ExtractorSettings;
use crate::fetch::FetchSettings;
use crate::notify::{ChannelConfig, ChannelKind, EmailSettings, SmtpTls, DEFAULT_NOTICE_LABEL};
use crate::retry::RetryPolicy;
use crate::summarize::GenerativeSettings;

/// A credential or private endpoint. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("environment variable {var} required by {owner} is not set")]
    MissingEnv { var: String, owner: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatcherConfig {
    pub listing_url: String,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub extractor: ExtractorSettings,
    #[serde(default = "default_dispatch_timeout_secs")]
    pub dispatch_timeout_secs: u64,
    /// Shown in chat messages, e.g. "New Executive Order".
    #[serde(default = "default_notice_label")]
    pub notice_label: String,
    #[serde(default)]
    pub channels: Vec<ChannelEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_bytes: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_bytes: 5 * 1024 * 1024,
            max_attempts: 3,
            initial_backoff_ms: 500,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    pub strategy: SummaryStrategy,
    pub bound: LengthBound,
    pub min_input_words: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            strategy: SummaryStrategy::Extractive,
            bound: LengthBound::Sentences(3),
            min_input_words: 40,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum SummaryStrategy {
    Extractive,
    Generative {
        #[serde(default = "default_generative_base_url")]
        base_url: String,
        model: String,
        api_key_env: String,
        #[serde(default = "default_generative_timeout_secs")]
        timeout_secs: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum ChannelEntry {
    Webhook {
        name: String,
        url_env: String,
        #[serde(default)]
        token_env: Option<String>,
    },
    Discord {
        name: String,
        webhook_url_env: String,
    },
    Email {
        name: String,
        smtp_host: String,
        smtp_port: u16,
        #[serde(default)]
        tls: SmtpTls,
        username_env: String,
        password_env: String,
        from: String,
        to: Vec<String>,
        #[serde(default)]
        subject: Option<String>,
    },
}

impl ChannelEntry {
    pub fn name(&self) -> &str {
        match self {
            ChannelEntry::Webhook { name, .. }
            | ChannelEntry::Discord { name, .. }
            | ChannelEntry::Email { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SummarizerChoice {
    Extractive { min_input_words: usize },
    Generative(GenerativeSettings),
}

/// Configuration with every secret looked up and every value validated.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub listing_url: String,
    pub state_path: PathBuf,
    pub fetch: FetchSettings,
    pub summarizer: SummarizerChoice,
    pub bound: LengthBound,
    pub extractor: ExtractorSettings,
    pub dispatch_timeout: Duration,
    pub notice_label: String,
    pub channels: Vec<ChannelConfig>,
}

impl WatcherConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&content)
    }

    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(content)?)
    }

    /// Validates the config and pulls secrets through `lookup`, typically
    /// `|var| std::env::var(var).ok()`. Blank values count as unset.
    pub fn resolve<F>(&self, lookup: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listing = Url::parse(&self.listing_url)
            .map_err(|err| ConfigError::Invalid(format!("listing_url: {err}")))?;
        if !matches!(listing.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "listing_url must be http(s), got {}",
                listing.scheme()
            )));
        }
        if self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid("dispatch_timeout_secs must be positive".into()));
        }

        let require = |var: &str, owner: &str| -> Result<Secret, ConfigError> {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .map(Secret::new)
                .ok_or_else(|| ConfigError::MissingEnv {
                    var: var.to_string(),
                    owner: owner.to_string(),
                })
        };

        let summarizer = match &self.summary.strategy {
            SummaryStrategy::Extractive => SummarizerChoice::Extractive {
                min_input_words: self.summary.min_input_words,
            },
            SummaryStrategy::Generative {
                base_url,
                model,
                api_key_env,
                timeout_secs,
            } => SummarizerChoice::Generative(GenerativeSettings {
                base_url: base_url.clone(),
                api_key: require(api_key_env, "summary")?,
                model: model.clone(),
                request_timeout: Duration::from_secs(*timeout_secs),
                retry: RetryPolicy::standard(),
                min_input_words: self.summary.min_input_words,
            }),
        };

        let dispatch_timeout = Duration::from_secs(self.dispatch_timeout_secs);
        let mut seen = HashSet::new();
        let mut channels = Vec::with_capacity(self.channels.len());
        for entry in &self.channels {
            if !seen.insert(entry.name()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate channel name {:?}",
                    entry.name()
                )));
            }
            channels.push(resolve_channel(entry, &require, dispatch_timeout)?);
        }

        let mut fetch = FetchSettings {
            connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.fetch.request_timeout_secs),
            max_bytes: self.fetch.max_bytes,
            retry: RetryPolicy {
                max_attempts: self.fetch.max_attempts,
                initial_backoff: Duration::from_millis(self.fetch.initial_backoff_ms),
                ..RetryPolicy::standard()
            },
            ..FetchSettings::default()
        };
        if let Some(agent) = &self.fetch.user_agent {
            fetch.user_agent = agent.clone();
        }

        Ok(ResolvedConfig {
            listing_url: listing.to_string(),
            state_path: self.state_path.clone(),
            fetch,
            summarizer,
            bound: self.summary.bound,
            extractor: self.extractor.clone(),
            dispatch_timeout,
            notice_label: self.notice_label.clone(),
            channels,
        })
    }
}

fn resolve_channel<R>(
    entry: &ChannelEntry,
    require: &R,
    timeout: Duration,
) -> Result<ChannelConfig, ConfigError>
where
    R: Fn(&str, &str) -> Result<Secret, ConfigError>,
{
    let kind = match entry {
        ChannelEntry::Webhook {
            name,
            url_env,
            token_env,
        } => ChannelKind::Webhook {
            url: require(url_env, name)?,
            bearer_token: token_env
                .as_deref()
                .map(|var| require(var, name))
                .transpose()?,
        },
        ChannelEntry::Discord {
            name,
            webhook_url_env,
        } => ChannelKind::Discord {
            webhook_url: require(webhook_url_env, name)?,
        },
        ChannelEntry::Email {
            name,
            smtp_host,
            smtp_port,
            tls,
            username_env,
            password_env,
            from,
            to,
            subject,
        } => {
            if to.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "email channel {name:?} has no recipients"
                )));
            }
            ChannelKind::Email(EmailSettings {
                smtp_host: smtp_host.clone(),
                smtp_port: *smtp_port,
                tls: *tls,
                username: require(username_env, name)?,
                password: require(password_env, name)?,
                from: from.clone(),
                to: to.clone(),
                subject: subject
                    .clone()
                    .unwrap_or_else(|| crate::notify::DEFAULT_SUBJECT.to_string()),
                timeout,
            })
        }
    };
    Ok(ChannelConfig {
        name: entry.name().to_string(),
        kind,
    })
}

fn default_state_path() -> PathBuf {
    PathBuf::from("last_title.txt")
}

fn default_dispatch_timeout_secs() -> u64 {
    15
}

fn default_notice_label() -> String {
    DEFAULT_NOTICE_LABEL.to_string()
}

fn default_generative_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_generative_timeout_secs() -> u64 {
    30
}
