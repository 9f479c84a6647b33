use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use watcher_core::{LengthBound, Summary, SummarySource};
use watcher_logging::watcher_debug;

use super::{passthrough, SummarizationError, Summarizer};
use crate::config::Secret;
use crate::retry::RetryPolicy;

const SYSTEM_PROMPT: &str = "You summarize official documents for a short notification. \
Reply with plain prose only: no headings, no lists, no preamble.";

#[derive(Debug, Clone)]
pub struct GenerativeSettings {
    /// Base of an OpenAI-compatible API, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: Secret,
    pub model: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub min_input_words: usize,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Summaries from a chat-completions model. Non-deterministic and may fail;
/// the pipeline degrades to the raw body when it does.
pub struct GenerativeSummarizer {
    settings: GenerativeSettings,
    client: reqwest::Client,
}

impl GenerativeSummarizer {
    pub fn new(settings: GenerativeSettings) -> Result<Self, SummarizationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| SummarizationError::Permanent(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.settings.base_url.trim_end_matches('/'))
    }

    async fn request_once(&self, prompt: &str) -> Result<String, SummarizationError> {
        let body = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.settings.api_key.expose()),
            )
            .json(&body)
            .send()
            .await
            .map_err(|err| SummarizationError::Transient(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!("{status}: {}", detail.trim());
            return Err(if is_transient_status(status.as_u16()) {
                SummarizationError::Transient(message)
            } else {
                SummarizationError::Permanent(message)
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| SummarizationError::Permanent(format!("malformed response: {err}")))?;
        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| SummarizationError::Permanent("response had no content".into()))
    }
}

#[async_trait::async_trait]
impl Summarizer for GenerativeSummarizer {
    fn name(&self) -> &'static str {
        "generative"
    }

    async fn summarize(
        &self,
        text: &str,
        bound: LengthBound,
    ) -> Result<Summary, SummarizationError> {
        if let Some(summary) = passthrough(text, bound, self.settings.min_input_words) {
            return Ok(summary);
        }

        let prompt = build_prompt(text, bound);
        let (content, attempts) = self
            .settings
            .retry
            .run("summarize", |_| self.request_once(&prompt))
            .await
            .map_err(|(err, _)| err)?;
        watcher_debug!(
            "model {} answered after {} attempt(s)",
            self.settings.model,
            attempts
        );
        Ok(Summary::bounded(content, bound, SummarySource::Summarized))
    }
}

fn is_transient_status(code: u16) -> bool {
    code == 408 || code == 429 || (500..600).contains(&code)
}

fn build_prompt(text: &str, bound: LengthBound) -> String {
    let limit = match bound {
        LengthBound::Sentences(n) => format!("at most {n} sentence(s)"),
        LengthBound::Chars(n) => format!("at most {n} characters"),
    };
    format!("Summarize the following text in {limit}.\n\n{text}")
}
