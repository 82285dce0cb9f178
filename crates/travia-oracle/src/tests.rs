//! Tests for `OpenAiOracle` against a local fake of the completions API.

use std::{
  collections::VecDeque,
  sync::{Arc, Mutex},
};

use axum::{
  Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode},
  routing::post,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use travia_core::{
  character::{CategoryId, Character, CharacterRules},
  corpus::{RuleCorpus, Vocabulary},
  oracle::ClassificationOracle,
};

use crate::{Error, OpenAiOracle, OracleConfig};

// ─── Fake server ─────────────────────────────────────────────────────────────

/// Replies are served in order; every request body and auth header is kept.
#[derive(Clone, Default)]
struct Fake {
  replies:  Arc<Mutex<VecDeque<(StatusCode, String)>>>,
  requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl Fake {
  fn reply(&self, status: StatusCode, content: &str) -> &Self {
    self.replies.lock().unwrap().push_back((status, content.to_owned()));
    self
  }

  fn requests(&self) -> Vec<(Option<String>, Value)> { self.requests.lock().unwrap().clone() }
}

async fn completions(
  State(fake): State<Fake>,
  headers: HeaderMap,
  Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
  let auth = headers
    .get("authorization")
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  fake.requests.lock().unwrap().push((auth, body));

  let (status, content) = fake
    .replies
    .lock()
    .unwrap()
    .pop_front()
    .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, "no reply queued".into()));

  if status.is_success() {
    (
      status,
      Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })),
    )
  } else {
    (status, Json(json!({ "error": { "message": content } })))
  }
}

async fn oracle(fake: &Fake) -> OpenAiOracle {
  let app = Router::new()
    .route("/v1/chat/completions", post(completions))
    .with_state(fake.clone());
  let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
  let address = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

  OpenAiOracle::new(OracleConfig {
    base_url: format!("http://{address}/v1/"),
    api_key: Some("sk-test".into()),
    max_retries: 2,
    retry_backoff_ms: 1,
    ..Default::default()
  })
  .unwrap()
}

fn corpus() -> RuleCorpus {
  RuleCorpus::build(vec![CharacterRules {
    character: Character {
      character_id: CategoryId(7),
      name:         "수다쟁이".into(),
      description:  "말이 많다".into(),
      image_ref:    None,
    },
    tags:      vec!["TMI".into()],
  }])
  .unwrap()
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn extract_sends_an_authenticated_chat_request() {
  let fake = Fake::default();
  fake.reply(StatusCode::OK, "TMI, 친절함");
  let oracle = oracle(&fake).await;

  let vocabulary = Vocabulary::Closed(["TMI".to_owned(), "친절함".to_owned()].into());
  let tags = oracle.extract("말이 많으셨어요", &vocabulary).await.unwrap();
  assert_eq!(tags, vec!["TMI", "친절함"]);

  let requests = fake.requests();
  assert_eq!(requests.len(), 1);
  let (auth, body) = &requests[0];
  assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
  assert_eq!(body["model"], "gpt-3.5-turbo");
  assert_eq!(body["temperature"], 0.0);
  assert_eq!(body["max_tokens"], 100);
  assert_eq!(body["messages"][0]["role"], "system");
  assert!(body["messages"][1]["content"].as_str().unwrap().contains("말이 많으셨어요"));
}

#[tokio::test]
async fn classify_reads_the_first_number() {
  let fake = Fake::default();
  fake.reply(StatusCode::OK, "7").reply(StatusCode::OK, "I cannot decide.");
  let oracle = oracle(&fake).await;
  let tags = vec!["TMI".to_owned()];

  assert_eq!(oracle.classify(&tags, &corpus()).await.unwrap(), Some(7));
  assert_eq!(oracle.classify(&tags, &corpus()).await.unwrap(), None);
  assert_eq!(fake.requests()[0].1["max_tokens"], 10);
}

// ─── Retries ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn transient_failures_are_retried() {
  let fake = Fake::default();
  fake
    .reply(StatusCode::TOO_MANY_REQUESTS, "slow down")
    .reply(StatusCode::BAD_GATEWAY, "upstream")
    .reply(StatusCode::OK, "야경");
  let oracle = oracle(&fake).await;

  let vocabulary = Vocabulary::Open(Default::default());
  let tags = oracle.extract("밤바다", &vocabulary).await.unwrap();
  assert_eq!(tags, vec!["야경"]);
  assert_eq!(fake.requests().len(), 3);
}

#[tokio::test]
async fn retries_are_bounded() {
  let fake = Fake::default();
  for _ in 0..5 {
    fake.reply(StatusCode::SERVICE_UNAVAILABLE, "down");
  }
  let oracle = oracle(&fake).await;

  let err = oracle.classify(&["TMI".into()], &corpus()).await.unwrap_err();
  assert!(matches!(err, Error::Status { status, .. } if status == 503));
  assert_eq!(fake.requests().len(), 3);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
  let fake = Fake::default();
  fake.reply(StatusCode::UNAUTHORIZED, "bad key");
  let oracle = oracle(&fake).await;

  let err = oracle
    .extract("본문", &Vocabulary::Open(Default::default()))
    .await
    .unwrap_err();
  assert!(!err.is_transient());
  assert_eq!(fake.requests().len(), 1);
}

#[test]
fn an_api_key_is_required() {
  let config = OracleConfig { api_key: Some("  ".into()), ..Default::default() };
  assert!(matches!(OpenAiOracle::new(config), Err(Error::MissingApiKey)));
}
