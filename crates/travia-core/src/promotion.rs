//! Promotion — turning raw per-review evidence into a bounded per-product
//! display set.
//!
//! The store supplies aggregated counts; this module filters and ranks them.
//! Replacing the previous promoted set is the store's job and happens in one
//! transaction.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  tag::{TagFilter, TagId},
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

/// How often one tag occurs across all evidence for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
  pub product_id: ProductId,
  pub tag_id:     TagId,
  pub name:       String,
  pub mentions:   u64,
}

/// A tag chosen for display on a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotedTag {
  pub product_id: ProductId,
  pub tag_id:     TagId,
  pub name:       String,
  pub mentions:   u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionPolicy {
  /// Maximum promoted tags per product.
  pub top_k:  usize,
  pub filter: TagFilter,
}

impl Default for PromotionPolicy {
  fn default() -> Self { Self { top_k: 5, filter: TagFilter::default() } }
}

/// The result of ranking, before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionPlan {
  pub promoted: Vec<PromotedTag>,
  /// Aggregates dropped by the filter.
  pub rejected: usize,
  /// Products that had at least one aggregate, filtered or not.
  pub products: usize,
}

impl PromotionPlan {
  pub fn for_product(&self, product_id: ProductId) -> impl Iterator<Item = &PromotedTag> {
    self.promoted.iter().filter(move |p| p.product_id == product_id)
  }
}

/// Filter, rank and cap `counts` per product.
///
/// Ranking is by descending mention count, then ascending tag id, so the
/// same counts always produce the same plan regardless of input order.
pub fn plan(counts: Vec<TagCount>, policy: &PromotionPolicy) -> Result<PromotionPlan> {
  policy.filter.validate()?;

  let mut by_product: BTreeMap<ProductId, Vec<TagCount>> = BTreeMap::new();
  for count in counts {
    by_product.entry(count.product_id).or_default().push(count);
  }

  let mut out = PromotionPlan { products: by_product.len(), ..Default::default() };

  for (product_id, mut counts) in by_product {
    let before = counts.len();
    counts.retain(|c| match policy.filter.rejection(&c.name) {
      None => true,
      Some(reason) => {
        tracing::debug!(
          product_id = %product_id,
          tag = %c.name,
          mentions = c.mentions,
          ?reason,
          "tag filtered out of promotion"
        );
        false
      }
    });
    out.rejected += before - counts.len();

    counts.sort_by(|a, b| b.mentions.cmp(&a.mentions).then(a.tag_id.cmp(&b.tag_id)));

    out.promoted.extend(counts.into_iter().take(policy.top_k).map(|c| {
      PromotedTag {
        product_id: c.product_id,
        tag_id:     c.tag_id,
        name:       c.name,
        mentions:   c.mentions,
      }
    }));
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn count(product: i64, tag: i64, name: &str, mentions: u64) -> TagCount {
    TagCount {
      product_id: ProductId(product),
      tag_id: TagId(tag),
      name: name.into(),
      mentions,
    }
  }

  fn names(plan: &PromotionPlan, product: i64) -> Vec<&str> {
    plan.for_product(ProductId(product)).map(|p| p.name.as_str()).collect()
  }

  #[test]
  fn night_view_scenario() {
    let policy = PromotionPolicy {
      top_k:  2,
      filter: TagFilter::lengths(2, 10),
    };
    let plan = plan(
      vec![
        count(1, 12, "사진촬영", 5),
        count(1, 11, "야경", 5),
        count(1, 13, "주차불편", 1),
        count(1, 14, "이건완전한문장입니다태그아님", 1),
      ],
      &policy,
    )
    .unwrap();

    assert_eq!(names(&plan, 1), vec!["야경", "사진촬영"]);
    assert_eq!(plan.rejected, 1);
  }

  #[test]
  fn filtered_tag_loses_even_with_the_highest_count() {
    let policy = PromotionPolicy::default();
    let plan = plan(
      vec![
        count(1, 1, "추출된 키워드", 99),
        count(1, 2, "이건태그가아니라긴문장이라서잘려야함", 50),
        count(1, 3, "야경", 1),
      ],
      &policy,
    )
    .unwrap();
    assert_eq!(names(&plan, 1), vec!["야경"]);
  }

  #[test]
  fn cap_applies_per_product() {
    // "태그" is denylisted by default; use a bare length filter instead.
    let policy = PromotionPolicy { top_k: 2, filter: TagFilter::lengths(1, 20) };
    let counts = (1..=6)
      .flat_map(|t| [count(1, t, &format!("태그{t}"), t as u64), count(2, t, &format!("명소{t}"), 1)])
      .collect();
    let plan = plan(counts, &policy).unwrap();

    assert_eq!(names(&plan, 1), vec!["태그6", "태그5"]);
    assert_eq!(names(&plan, 2), vec!["명소1", "명소2"]);
    assert_eq!(plan.products, 2);
  }

  #[test]
  fn fewer_than_k_promotes_everything_and_zero_is_fine() {
    let policy = PromotionPolicy::default();
    let plan = plan(vec![count(1, 1, "야경", 1), count(2, 2, "-", 9)], &policy).unwrap();
    assert_eq!(names(&plan, 1), vec!["야경"]);
    assert!(names(&plan, 2).is_empty());
    assert_eq!(plan.products, 2);
  }

  #[test]
  fn ranking_ignores_input_order() {
    let policy = PromotionPolicy { top_k: 3, ..Default::default() };
    let forward = vec![count(1, 3, "바다", 2), count(1, 1, "야경", 2), count(1, 2, "카페", 2)];
    let mut reversed = forward.clone();
    reversed.reverse();

    let a = plan(forward, &policy).unwrap();
    let b = plan(reversed, &policy).unwrap();
    assert_eq!(a, b);
    assert_eq!(names(&a, 1), vec!["야경", "카페", "바다"]);
  }
}
