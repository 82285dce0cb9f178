//! Rolling classified reviews up into one character per guide and traveler.

use travia_core::{
  profile::{self, ProfileRole},
  store::TaggingStore,
};

use crate::{PipelineError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileSummary {
  /// (subject, role) pairs with at least one classified review.
  pub subjects: usize,
  /// Profiles whose character was set or changed.
  pub changed:  usize,
}

pub async fn update_profiles<S: TaggingStore>(store: &S) -> Result<ProfileSummary> {
  let mut profiles = Vec::new();
  for role in [ProfileRole::Guide, ProfileRole::Traveler] {
    let tallies = store
      .character_tallies(role.review_kind())
      .await
      .map_err(PipelineError::unavailable)?;
    profiles.extend(profile::representatives(role, &tallies));
  }

  let subjects = profiles.len();
  let changed = store
    .upsert_profile_characters(profiles)
    .await
    .map_err(PipelineError::commit)?;
  tracing::info!(subjects, changed, "profiles updated");
  Ok(ProfileSummary { subjects, changed })
}
