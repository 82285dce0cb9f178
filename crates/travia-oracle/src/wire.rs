//! Request and response bodies for `POST /chat/completions`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
  pub model:       &'a str,
  pub messages:    [ChatMessage<'a>; 2],
  pub temperature: f32,
  pub max_tokens:  u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
  pub role:    &'static str,
  pub content: &'a str,
}

impl<'a> ChatMessage<'a> {
  pub fn system(content: &'a str) -> Self { Self { role: "system", content } }

  pub fn user(content: &'a str) -> Self { Self { role: "user", content } }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
  pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
  pub message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ReplyMessage {
  /// Absent when the model refuses or only calls tools.
  #[serde(default)]
  pub content: Option<String>,
}
