use serde::{Deserialize, Serialize};

/// Connection and sampling settings for [`crate::OpenAiOracle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
  /// Base URL up to and including the API version, e.g.
  /// `https://api.openai.com/v1`.
  pub base_url:            String,
  pub api_key:             Option<String>,
  pub extract_model:       String,
  pub classify_model:      String,
  /// Per-request timeout.
  pub timeout_secs:        u64,
  /// Retries after the first attempt, for transient failures only.
  pub max_retries:         u32,
  /// Delay before retry `n` is `n * retry_backoff_ms`.
  pub retry_backoff_ms:    u64,
  pub extract_max_tokens:  u32,
  /// The classifier only answers with an id.
  pub classify_max_tokens: u32,
}

impl Default for OracleConfig {
  fn default() -> Self {
    Self {
      base_url:            "https://api.openai.com/v1".to_owned(),
      api_key:             None,
      extract_model:       "gpt-3.5-turbo".to_owned(),
      classify_model:      "gpt-3.5-turbo".to_owned(),
      timeout_secs:        30,
      max_retries:         2,
      retry_backoff_ms:    500,
      extract_max_tokens:  100,
      classify_max_tokens: 10,
    }
  }
}
