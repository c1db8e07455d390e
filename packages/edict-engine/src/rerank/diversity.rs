use std::collections::HashMap;

use crate::process;
use edict_domain::Evidence;

/// Similarity assumed between two candidates from the same predicted
/// category when one of them is missing a dense vector.
const CATEGORY_FALLBACK_SIM: f32 = 0.75;
const SCORE_EPSILON: f32 = 1e-6;

pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some((dot / (lhs_norm.sqrt() * rhs_norm.sqrt())).clamp(-1.0, 1.0))
}

/// Greedy MMR re-selection over the leading `window` candidates:
/// `mmr(d) = lambda * rel(d) - (1 - lambda) * max sim(d, selected)`.
/// Relevance is the current score rank-normalized into [0, 1]. Selected
/// candidates are re-scored as a strictly-decreasing sequence anchored at the
/// previous top score; the tail beyond the window keeps its order below.
pub fn apply_mmr(
	candidates: Vec<Evidence>,
	window: usize,
	lambda: f32,
	vectors: &HashMap<String, Vec<f32>>,
	categories: &HashMap<String, String>,
) -> Vec<Evidence> {
	if candidates.len() < 2 || window < 2 {
		return candidates;
	}

	let window = window.min(candidates.len());
	let top_score = candidates.first().map(|candidate| candidate.score).unwrap_or(1.0);
	let mut head: Vec<Evidence> = candidates.into_iter().collect();
	let tail = head.split_off(window);
	let total = head.len();
	let relevance: Vec<f32> = (0..total)
		.map(|idx| if total <= 1 { 1.0 } else { 1.0 - idx as f32 / (total - 1) as f32 })
		.collect();
	let mut remaining: Vec<usize> = (0..total).collect();
	let mut selected: Vec<usize> = Vec::new();
	let mut mmr_scores: Vec<f32> = vec![0.0; total];

	// The most relevant candidate always opens the selection.
	selected.push(remaining.remove(0));
	mmr_scores[selected[0]] = relevance[selected[0]];

	while !remaining.is_empty() {
		let mut best_pos = 0;
		let mut best_score = f32::NEG_INFINITY;

		for (pos, &candidate_idx) in remaining.iter().enumerate() {
			let redundancy = max_similarity_to_selected(
				candidate_idx,
				&head,
				&selected,
				vectors,
				categories,
			);
			let mmr = lambda * relevance[candidate_idx] - (1.0 - lambda) * redundancy;

			if mmr > best_score {
				best_score = mmr;
				best_pos = pos;
			}
		}

		let picked = remaining.remove(best_pos);

		mmr_scores[picked] = best_score;
		selected.push(picked);
	}

	let mut out = Vec::with_capacity(total + tail.len());
	let mut previous = top_score;

	for (order, idx) in selected.iter().enumerate() {
		let mut candidate = head[*idx].clone();

		candidate.raw_scores.record("mmr", mmr_scores[*idx]);

		// Strictly decreasing so the published ordering invariant holds.
		let assigned =
			if order == 0 { previous } else { previous - SCORE_EPSILON.max(previous.abs() * 1e-4) };

		candidate.score = assigned;
		previous = assigned;
		out.push(candidate);
	}

	for mut candidate in tail {
		if candidate.score >= previous {
			candidate.score = previous - SCORE_EPSILON;
		}

		previous = candidate.score;
		out.push(candidate);
	}

	out
}

fn max_similarity_to_selected(
	candidate_idx: usize,
	candidates: &[Evidence],
	selected: &[usize],
	vectors: &HashMap<String, Vec<f32>>,
	categories: &HashMap<String, String>,
) -> f32 {
	let candidate = &candidates[candidate_idx];
	let candidate_vec = vectors.get(&candidate.chunk_id);
	let mut best = 0.0_f32;

	for &selected_idx in selected {
		let other = &candidates[selected_idx];
		let similarity = match (candidate_vec, vectors.get(&other.chunk_id)) {
			(Some(lhs), Some(rhs)) => cosine_similarity(lhs, rhs).unwrap_or(0.0),
			_ => category_similarity(candidate, other, categories),
		};

		best = best.max(similarity);
	}

	best
}

fn category_similarity(
	lhs: &Evidence,
	rhs: &Evidence,
	categories: &HashMap<String, String>,
) -> f32 {
	let lhs_category = categories.get(&lhs.chunk_id);
	let rhs_category = categories.get(&rhs.chunk_id);

	match (lhs_category, rhs_category) {
		(Some(a), Some(b)) if a == b => CATEGORY_FALLBACK_SIM,
		_ if lhs.vertical == rhs.vertical => CATEGORY_FALLBACK_SIM * 0.5,
		_ => 0.0,
	}
}

/// Re-applying MMR to an already MMR-ordered list must not change the order.
pub fn is_ordered(candidates: &[Evidence]) -> bool {
	candidates.windows(2).all(|pair| {
		process::cmp_score_desc(pair[0].score, pair[1].score) != std::cmp::Ordering::Greater
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use edict_domain::{EvidenceMetadata, RawScores, Vertical};

	fn evidence(chunk_id: &str, score: f32, vertical: Vertical) -> Evidence {
		Evidence {
			chunk_id: chunk_id.to_string(),
			doc_id: format!("doc/{chunk_id}"),
			vertical,
			text: String::new(),
			score,
			raw_scores: RawScores::default(),
			metadata: EvidenceMetadata::default(),
		}
	}

	fn unit(x: f32, y: f32) -> Vec<f32> {
		let norm = (x * x + y * y).sqrt();

		vec![x / norm, y / norm]
	}

	#[test]
	fn cosine_of_identical_vectors_is_one() {
		let vec = unit(1.0, 2.0);

		assert!((cosine_similarity(&vec, &vec).unwrap() - 1.0).abs() < 1e-6);
	}

	#[test]
	fn mmr_demotes_near_duplicates() {
		let candidates = vec![
			evidence("a", 0.9, Vertical::Legal),
			evidence("a2", 0.85, Vertical::Legal),
			evidence("b", 0.8, Vertical::Go),
		];
		let mut vectors = HashMap::new();

		vectors.insert("a".to_string(), unit(1.0, 0.0));
		vectors.insert("a2".to_string(), unit(0.999, 0.01));
		vectors.insert("b".to_string(), unit(0.0, 1.0));

		let out = apply_mmr(candidates, 3, 0.5, &vectors, &HashMap::new());
		let order: Vec<&str> = out.iter().map(|candidate| candidate.chunk_id.as_str()).collect();

		assert_eq!(order, vec!["a", "b", "a2"]);
		assert!(is_ordered(&out) || out.windows(2).all(|p| p[0].score >= p[1].score));
	}

	#[test]
	fn mmr_output_scores_strictly_descend() {
		let candidates = vec![
			evidence("a", 0.9, Vertical::Legal),
			evidence("b", 0.8, Vertical::Legal),
			evidence("c", 0.7, Vertical::Go),
			evidence("d", 0.6, Vertical::Data),
		];
		let out = apply_mmr(candidates, 3, 0.5, &HashMap::new(), &HashMap::new());

		for pair in out.windows(2) {
			assert!(pair[0].score > pair[1].score);
		}
	}

	#[test]
	fn mmr_is_stable_on_its_own_output() {
		let candidates = vec![
			evidence("a", 0.9, Vertical::Legal),
			evidence("a2", 0.85, Vertical::Legal),
			evidence("b", 0.8, Vertical::Go),
		];
		let mut vectors = HashMap::new();

		vectors.insert("a".to_string(), unit(1.0, 0.0));
		vectors.insert("a2".to_string(), unit(0.999, 0.01));
		vectors.insert("b".to_string(), unit(0.0, 1.0));

		let once = apply_mmr(candidates, 3, 0.5, &vectors, &HashMap::new());
		let first_order: Vec<String> =
			once.iter().map(|candidate| candidate.chunk_id.clone()).collect();
		let twice = apply_mmr(once, 3, 0.5, &vectors, &HashMap::new());
		let second_order: Vec<String> =
			twice.iter().map(|candidate| candidate.chunk_id.clone()).collect();

		assert_eq!(first_order, second_order);
	}

	#[test]
	fn mmr_records_audit_scores() {
		let candidates =
			vec![evidence("a", 0.9, Vertical::Legal), evidence("b", 0.8, Vertical::Go)];
		let out = apply_mmr(candidates, 2, 0.5, &HashMap::new(), &HashMap::new());

		assert!(out.iter().all(|candidate| candidate.raw_scores.contains("mmr")));
	}
}
