//! [`OpenAiOracle`]: the chat-completions client.

use std::time::Duration;

use reqwest::Client;
use travia_core::{
  corpus::{RuleCorpus, Vocabulary},
  oracle::ClassificationOracle,
};

use crate::{
  Error, Result,
  config::OracleConfig,
  parse,
  prompt::{self, Prompt},
  wire::{ChatMessage, ChatRequest, ChatResponse},
};

/// Async client for an OpenAI-compatible chat-completions endpoint.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiOracle {
  client:  Client,
  config:  OracleConfig,
  api_key: String,
}

impl OpenAiOracle {
  pub fn new(config: OracleConfig) -> Result<Self> {
    let api_key = config
      .api_key
      .clone()
      .filter(|k| !k.trim().is_empty())
      .ok_or(Error::MissingApiKey)?;
    let client = Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client, config, api_key })
  }

  fn url(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  /// One attempt: `POST /chat/completions`, returning the first choice.
  async fn send(&self, request: &ChatRequest<'_>) -> Result<String> {
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.api_key)
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Status { status, body });
    }

    let body: ChatResponse = resp.json().await?;
    body
      .choices
      .into_iter()
      .next()
      .map(|c| c.message.content.unwrap_or_default())
      .ok_or(Error::EmptyResponse)
  }

  /// Send `prompt`, retrying transient failures with linear backoff.
  async fn complete(&self, model: &str, prompt: &Prompt, max_tokens: u32) -> Result<String> {
    let request = ChatRequest {
      model,
      messages: [ChatMessage::system(&prompt.system), ChatMessage::user(&prompt.user)],
      temperature: prompt.temperature,
      max_tokens,
    };

    let mut attempt = 0;
    loop {
      match self.send(&request).await {
        Ok(content) => return Ok(content),
        Err(e) if e.is_transient() && attempt < self.config.max_retries => {
          attempt += 1;
          let delay = Duration::from_millis(self.config.retry_backoff_ms * u64::from(attempt));
          tracing::warn!(attempt, ?delay, error = %e, "oracle call failed, retrying");
          tokio::time::sleep(delay).await;
        }
        Err(e) => return Err(e),
      }
    }
  }
}

impl ClassificationOracle for OpenAiOracle {
  type Error = Error;

  async fn extract(&self, text: &str, vocabulary: &Vocabulary) -> Result<Vec<String>> {
    let prompt = prompt::extraction(text, vocabulary);
    let content = self
      .complete(&self.config.extract_model, &prompt, self.config.extract_max_tokens)
      .await?;
    Ok(parse::tag_list(&content))
  }

  async fn classify(&self, tags: &[String], corpus: &RuleCorpus) -> Result<Option<i64>> {
    let prompt = prompt::classification(tags, corpus);
    let content = self
      .complete(&self.config.classify_model, &prompt, self.config.classify_max_tokens)
      .await?;

    let id = parse::category_id(&content);
    if id.is_none() {
      tracing::warn!(reply = %content.trim(), "classifier reply contained no id");
    }
    Ok(id)
  }
}
