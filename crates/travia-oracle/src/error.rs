use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no API key configured for the oracle")]
  MissingApiKey,

  #[error("HTTP error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("oracle returned {status}: {body}")]
  Status { status: reqwest::StatusCode, body: String },

  #[error("oracle response contained no choices")]
  EmptyResponse,
}

impl Error {
  /// Whether a retry of the same request has a chance of succeeding.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
      Self::Status { status, .. } => {
        *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
      }
      Self::MissingApiKey | Self::EmptyResponse => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
