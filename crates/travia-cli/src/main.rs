//! `travia` — batch entry points for the review-tagging pipeline.
//!
//! Reads `travia.toml` (or the path given with `--config`) layered under
//! `TRAVIA__*` environment variables, opens the SQLite store and runs one
//! job. Any fatal error exits non-zero.
//!
//! # Usage
//!
//! ```
//! travia seed --file characters.toml
//! travia tag-reviews
//! travia tag-characters
//! travia promote --top-k 5
//! travia update-profiles
//! ```

mod seed;
mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use travia_core::oracle::OracleAdapter;
use travia_oracle::OpenAiOracle;
use travia_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Travia review tagging pipeline")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "travia.toml", global = true)]
  config: PathBuf,

  /// SQLite store path; overrides `store_path` from the config.
  #[arg(long, env = "TRAVIA_STORE", global = true)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Extract open-vocabulary tags from unprocessed product reviews.
  TagReviews,

  /// Extract character keywords from guide and traveler reviews and
  /// classify each review into a character.
  TagCharacters,

  /// Recompute every product's AI-promoted tags from the evidence.
  Promote {
    /// Maximum promoted tags per product.
    #[arg(long)]
    top_k: Option<usize>,
  },

  /// Set each guide's and traveler's representative character.
  UpdateProfiles,

  /// Load characters and their rule tags from a TOML file.
  Seed {
    #[arg(short, long, default_value = "characters.toml")]
    file: PathBuf,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut settings = Settings::load(&cli.config)?;
  if let Some(store) = cli.store {
    settings.store_path = store;
  }

  let store = SqliteStore::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  match cli.command {
    Command::TagReviews => {
      let oracle = oracle(&settings)?;
      let summary = travia_pipeline::tag_reviews(&store, &oracle, &settings.extraction)
        .await
        .context("product review tagging failed")?;
      tracing::info!(run_id = %summary.run_id, selected = summary.selected, "done");
    }
    Command::TagCharacters => {
      let oracle = oracle(&settings)?;
      let summary = travia_pipeline::tag_characters(&store, &oracle)
        .await
        .context("character classification failed")?;
      tracing::info!(run_id = %summary.run_id, selected = summary.selected, "done");
    }
    Command::Promote { top_k } => {
      let mut policy = settings.promotion;
      if let Some(k) = top_k {
        policy.top_k = k;
      }
      let summary = travia_pipeline::promote_tags(&store, &policy)
        .await
        .context("promotion failed")?;
      tracing::info!(products = summary.products, promoted = summary.promoted, "done");
    }
    Command::UpdateProfiles => {
      let summary = travia_pipeline::update_profiles(&store)
        .await
        .context("profile update failed")?;
      tracing::info!(changed = summary.changed, "done");
    }
    Command::Seed { file } => {
      let count = seed::SeedFile::read(&file)?.apply(&store).await?;
      tracing::info!(characters = count, "done");
    }
  }

  Ok(())
}

fn oracle(settings: &Settings) -> anyhow::Result<OracleAdapter<OpenAiOracle>> {
  let client = OpenAiOracle::new(settings.oracle.clone())
    .context("failed to build oracle client; set oracle.api_key or OPENAI_API_KEY")?;
  Ok(OracleAdapter::new(client))
}
