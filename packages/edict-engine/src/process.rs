use std::{cmp::Ordering, collections::HashMap};

use edict_domain::Evidence;

/// Separation applied below the weakest active result when superseded
/// evidence is re-scored underneath it.
const SUPERSEDED_STEP: f32 = 1e-3;

pub fn cmp_score_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Deterministic ranking order: score descending, chunk id as tiebreak.
pub fn sort_by_score(candidates: &mut [Evidence]) {
	candidates.sort_by(|lhs, rhs| {
		cmp_score_desc(lhs.score, rhs.score).then_with(|| lhs.chunk_id.cmp(&rhs.chunk_id))
	});
}

/// Collapses duplicate chunk ids, keeping the highest-scored instance and
/// merging raw-score audit trails by per-key maximum. Idempotent.
pub fn dedup(candidates: Vec<Evidence>) -> Vec<Evidence> {
	let mut best: HashMap<String, Evidence> = HashMap::new();

	for candidate in candidates {
		match best.get_mut(&candidate.chunk_id) {
			Some(existing) => {
				existing.raw_scores.merge_max(&candidate.raw_scores);

				if cmp_score_desc(candidate.score, existing.score) == Ordering::Less {
					let merged_scores = existing.raw_scores.clone();
					let mut replacement = candidate;

					replacement.raw_scores = merged_scores;
					*existing = replacement;
				}
			},
			None => {
				best.insert(candidate.chunk_id.clone(), candidate);
			},
		}
	}

	let mut out: Vec<Evidence> = best.into_values().collect();

	sort_by_score(&mut out);

	out
}

/// Adaptive score normalization over the aggregated candidate set. Z-score is
/// used only when the spread is wide relative to the mean; min-max otherwise.
/// Order-preserving in both branches.
pub fn normalize_scores(candidates: &mut [Evidence]) {
	if candidates.len() < 2 {
		return;
	}

	let scores: Vec<f32> = candidates.iter().map(|candidate| candidate.score).collect();
	let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
	let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
	let mean = scores.iter().sum::<f32>() / scores.len() as f32;

	if !min.is_finite() || !max.is_finite() {
		return;
	}

	if max - min > 2.0 * mean.abs() {
		let variance =
			scores.iter().map(|score| (score - mean).powi(2)).sum::<f32>() / scores.len() as f32;
		let stddev = variance.sqrt();

		if stddev <= f32::EPSILON {
			return;
		}

		for candidate in candidates.iter_mut() {
			candidate.score = (candidate.score - mean) / stddev;
		}
	} else {
		let spread = max - min;

		if spread <= f32::EPSILON {
			return;
		}

		for candidate in candidates.iter_mut() {
			candidate.score = (candidate.score - min) / spread;
		}
	}
}

/// Partitions superseded evidence below every active result. Actives keep
/// their order; superseded results keep their relative order but are
/// re-scored under the weakest active so the strict score ordering and the
/// supersession invariant hold simultaneously. Superseded evidence is only
/// dropped when the caller opted out of it.
pub fn apply_supersession(candidates: Vec<Evidence>, include_superseded: bool) -> Vec<Evidence> {
	let (active, superseded): (Vec<Evidence>, Vec<Evidence>) =
		candidates.into_iter().partition(|candidate| !candidate.metadata.is_superseded);

	if !include_superseded {
		return active;
	}
	if superseded.is_empty() {
		return active;
	}
	if active.is_empty() {
		return superseded;
	}

	let floor = active.last().map(|candidate| candidate.score).unwrap_or(0.0);
	let mut out = active;

	for (idx, mut candidate) in superseded.into_iter().enumerate() {
		candidate.score = floor - SUPERSEDED_STEP * (idx + 1) as f32;

		out.push(candidate);
	}

	out
}

/// Caps the candidate set for the reranking stage at twice the plan's final
/// budget.
pub fn cap_for_rerank(mut candidates: Vec<Evidence>, top_k_total: usize) -> Vec<Evidence> {
	candidates.truncate(top_k_total.saturating_mul(2));

	candidates
}

#[cfg(test)]
mod tests {
	use super::*;
	use edict_domain::{EvidenceMetadata, RawScores, Vertical};

	fn evidence(chunk_id: &str, score: f32) -> Evidence {
		Evidence {
			chunk_id: chunk_id.to_string(),
			doc_id: format!("doc/{chunk_id}"),
			vertical: Vertical::Legal,
			text: String::new(),
			score,
			raw_scores: RawScores::default(),
			metadata: EvidenceMetadata::default(),
		}
	}

	#[test]
	fn dedup_keeps_highest_score_and_merges_raw_scores() {
		let mut first = evidence("a", 0.4);
		let mut second = evidence("a", 0.9);

		first.raw_scores.record("dense", 0.4);
		second.raw_scores.record("sparse", 2.0);

		let out = dedup(vec![first, second, evidence("b", 0.5)]);

		assert_eq!(out.len(), 2);
		assert_eq!(out[0].chunk_id, "a");
		assert_eq!(out[0].score, 0.9);
		assert_eq!(out[0].raw_scores.get("dense"), Some(0.4));
		assert_eq!(out[0].raw_scores.get("sparse"), Some(2.0));
	}

	#[test]
	fn dedup_is_idempotent() {
		let input = vec![evidence("a", 0.4), evidence("a", 0.9), evidence("b", 0.5)];
		let once = dedup(input);
		let twice = dedup(once.clone());

		assert_eq!(once, twice);
	}

	#[test]
	fn normalization_picks_minmax_for_tight_spread() {
		let mut candidates = vec![evidence("a", 0.8), evidence("b", 0.6), evidence("c", 0.7)];

		normalize_scores(&mut candidates);

		assert!((candidates[0].score - 1.0).abs() < 1e-6);
		assert!((candidates[1].score - 0.0).abs() < 1e-6);
	}

	#[test]
	fn normalization_picks_zscore_for_wide_spread() {
		let mut candidates = vec![evidence("a", 10.0), evidence("b", 0.1), evidence("c", 0.2)];

		normalize_scores(&mut candidates);

		// Z-scored output is centered: the outlier sits well above zero and
		// the cluster below.
		assert!(candidates[0].score > 1.0);
		assert!(candidates[1].score < 0.0);
	}

	#[test]
	fn normalization_preserves_order() {
		let mut candidates = vec![evidence("a", 9.0), evidence("b", 3.0), evidence("c", 1.0)];

		normalize_scores(&mut candidates);

		assert!(candidates[0].score > candidates[1].score);
		assert!(candidates[1].score > candidates[2].score);
	}

	#[test]
	fn supersession_pushes_stale_results_below_actives() {
		let mut stale = evidence("old", 0.95);

		stale.metadata.is_superseded = true;

		let out = apply_supersession(vec![stale, evidence("new", 0.4)], true);

		assert_eq!(out[0].chunk_id, "new");
		assert_eq!(out[1].chunk_id, "old");
		assert!(out[1].score < out[0].score);
	}

	#[test]
	fn supersession_preserves_relative_order_of_stale_results() {
		let mut stale_high = evidence("old-high", 0.9);
		let mut stale_low = evidence("old-low", 0.5);

		stale_high.metadata.is_superseded = true;
		stale_low.metadata.is_superseded = true;

		let out =
			apply_supersession(vec![stale_high, evidence("new", 0.6), stale_low], true);

		assert_eq!(out[0].chunk_id, "new");
		assert_eq!(out[1].chunk_id, "old-high");
		assert_eq!(out[2].chunk_id, "old-low");
		assert!(out[1].score > out[2].score);
	}

	#[test]
	fn supersession_drops_stale_results_on_request() {
		let mut stale = evidence("old", 0.95);

		stale.metadata.is_superseded = true;

		let out = apply_supersession(vec![stale, evidence("new", 0.4)], false);

		assert_eq!(out.len(), 1);
		assert_eq!(out[0].chunk_id, "new");
	}

	#[test]
	fn rerank_cap_is_twice_the_budget() {
		let candidates: Vec<Evidence> =
			(0..50).map(|idx| evidence(&format!("c{idx}"), 1.0 - idx as f32 * 0.01)).collect();

		assert_eq!(cap_for_rerank(candidates, 10).len(), 20);
	}
}
