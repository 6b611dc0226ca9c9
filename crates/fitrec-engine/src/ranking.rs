//! Score normalization and hybrid blending.
//!
//! The two candidate lists carry incomparable score scales (factor dot
//! products vs distance-derived similarities), so each list is min-max
//! scaled to [0, 1] independently before the convex blend. The whole
//! pipeline is deterministic regardless of input ordering.

use std::collections::{HashMap, HashSet};

use fitrec_core::config::ranking;
use fitrec_core::error::RankingError;
use fitrec_core::types::{ItemId, ScoredItem};

/// Min-max scale a candidate list to [0, 1].
///
/// An empty list normalizes to an empty mapping (absent items later score 0
/// in the blend). A non-empty list whose scores are all equal maps every
/// member to 1.0; dividing by the zero range would poison the blend with
/// NaN.
pub fn min_max_normalize(candidates: &[ScoredItem]) -> HashMap<ItemId, f32> {
    let Some(first) = candidates.first() else {
        return HashMap::new();
    };

    let mut min = first.score;
    let mut max = first.score;
    for c in candidates {
        min = min.min(c.score);
        max = max.max(c.score);
    }

    if max > min {
        let range = max - min;
        candidates
            .iter()
            .map(|c| (c.item_id, (c.score - min) / range))
            .collect()
    } else {
        candidates.iter().map(|c| (c.item_id, 1.0)).collect()
    }
}

/// Convex blend of the two normalized score mappings.
///
/// `final = alpha * cf + (1 - alpha) * content`; an item absent from one
/// mapping contributes 0 for that term. Items in `exclude` are dropped from
/// the union. Result is sorted by descending blended score, ties by
/// ascending item id, truncated to `n`.
pub fn blend(
    cf: &HashMap<ItemId, f32>,
    content: &HashMap<ItemId, f32>,
    exclude: &HashSet<ItemId>,
    alpha: f32,
    n: usize,
) -> Vec<ScoredItem> {
    debug_assert!((0.0..=1.0).contains(&alpha), "alpha validated at boundary");

    let mut blended: Vec<ScoredItem> = cf
        .keys()
        .chain(content.keys())
        .filter(|id| !exclude.contains(*id))
        .collect::<HashSet<_>>()
        .into_iter()
        .map(|id| {
            let cf_score = cf.get(id).copied().unwrap_or(0.0);
            let cb_score = content.get(id).copied().unwrap_or(0.0);
            ScoredItem::new(*id, alpha * cf_score + (1.0 - alpha) * cb_score)
        })
        .collect();

    blended.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.item_id.cmp(&b.item_id))
    });
    blended.truncate(n);
    blended
}

/// Deterministic blending ranker over the two candidate lists.
#[derive(Debug, Clone, Copy)]
pub struct HybridRanker {
    alpha: f32,
}

impl Default for HybridRanker {
    fn default() -> Self {
        Self {
            alpha: ranking::DEFAULT_ALPHA,
        }
    }
}

impl HybridRanker {
    /// Create a ranker with the given blend weight.
    ///
    /// # Errors
    ///
    /// `RankingError::InvalidAlpha` for `alpha` outside [0, 1] (including
    /// NaN), rejected before any computation.
    pub fn new(alpha: f32) -> Result<Self, RankingError> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(RankingError::InvalidAlpha(alpha));
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Rank the union of both candidate lists.
    ///
    /// The content list may be empty when no anchor item was supplied; the
    /// blend then degenerates to the scaled CF ranking (and vice versa).
    pub fn rank(
        &self,
        cf_candidates: &[ScoredItem],
        content_candidates: &[ScoredItem],
        exclude: &HashSet<ItemId>,
        n: usize,
    ) -> Vec<ScoredItem> {
        let cf = min_max_normalize(cf_candidates);
        let content = min_max_normalize(content_candidates);
        blend(&cf, &content, exclude, self.alpha, n)
    }
}
