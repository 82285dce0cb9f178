//! Layered configuration: defaults, then the TOML file, then `TRAVIA__*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use travia_core::{corpus::ExtractionPolicy, promotion::PromotionPolicy};
use travia_oracle::OracleConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub store_path: PathBuf,
  pub oracle:     OracleConfig,
  pub extraction: ExtractionPolicy,
  pub promotion:  PromotionPolicy,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("travia.db"),
      oracle:     OracleConfig::default(),
      extraction: ExtractionPolicy::default(),
      promotion:  PromotionPolicy::default(),
    }
  }
}

impl Settings {
  /// Load settings from `path` (optional) and the environment.
  ///
  /// Nested keys use `__`, e.g. `TRAVIA__ORACLE__API_KEY` or
  /// `TRAVIA__PROMOTION__TOP_K`. If no API key is configured,
  /// `OPENAI_API_KEY` is used.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let mut settings: Self = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("TRAVIA").separator("__"))
      .build()
      .with_context(|| format!("failed to read config from {}", path.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")?;

    if settings.oracle.api_key.is_none() {
      settings.oracle.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn file_values_override_defaults() {
    let raw = r#"
      store_path = "/var/lib/travia/travia.db"

      [oracle]
      classify_model = "gpt-4o-mini"
      max_retries = 5

      [promotion]
      top_k = 3

      [promotion.filter]
      max_length = 10
    "#;
    let settings: Settings = config::Config::builder()
      .add_source(config::File::from_str(raw, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap();

    assert_eq!(settings.store_path, PathBuf::from("/var/lib/travia/travia.db"));
    assert_eq!(settings.oracle.classify_model, "gpt-4o-mini");
    assert_eq!(settings.oracle.extract_model, "gpt-3.5-turbo");
    assert_eq!(settings.oracle.max_retries, 5);
    assert_eq!(settings.promotion.top_k, 3);
    assert_eq!(settings.promotion.filter.max_length, 10);
    assert_eq!(settings.promotion.filter.min_length, 2);
    assert!(!settings.promotion.filter.denylist.is_empty());
    assert_eq!(settings.extraction.max_tags, 3);
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs.db")), PathBuf::from("/abs.db"));
  }
}
