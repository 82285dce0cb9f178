use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Run-aborting failures. Per-review oracle failures never reach this type;
/// they are counted as skips.
#[derive(Debug, Error)]
pub enum PipelineError {
  /// A read failed before any oracle call or write was made.
  #[error("store unavailable: {0}")]
  StoreUnavailable(#[source] BoxError),

  #[error("rule corpus is empty: seed characters before classifying")]
  CorpusEmpty,

  /// A write failed; the store rolled the whole run back.
  #[error("commit failed, run rolled back: {0}")]
  Commit(#[source] BoxError),

  #[error(transparent)]
  Core(travia_core::Error),
}

impl PipelineError {
  pub(crate) fn unavailable<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::StoreUnavailable(Box::new(e))
  }

  pub(crate) fn commit<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Commit(Box::new(e))
  }
}

impl From<travia_core::Error> for PipelineError {
  fn from(e: travia_core::Error) -> Self {
    match e {
      travia_core::Error::CorpusEmpty => Self::CorpusEmpty,
      other => Self::Core(other),
    }
  }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
