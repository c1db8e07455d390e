use std::collections::HashSet;

use crate::Engine;
use edict_domain::{Evidence, QueryInterpretation, RelationKind};

const EXPANSION_SOURCE_DEPTH: usize = 20;
const EXPANSION_NEIGHBOR_LIMIT: usize = 5;
const EXPANSION_FETCH_BUDGET: usize = EXPANSION_SOURCE_DEPTH * EXPANSION_NEIGHBOR_LIMIT;
const EXPANSION_DECAY: f32 = 0.5;
const ENTITY_MATCH_WEIGHT: f32 = 0.15;

fn relation_bonus(kind: RelationKind) -> f32 {
	match kind {
		RelationKind::Amends => 0.25,
		RelationKind::Supersedes => 0.20,
		RelationKind::Implements => 0.15,
		RelationKind::Cites => 0.10,
	}
}

/// Additive score deltas from relation scoring (phase a) and entity matching
/// (phase b), indexed to the candidate slice. Pure.
pub fn score_deltas(
	engine: &Engine,
	interpretation: &QueryInterpretation,
	candidates: &[Evidence],
) -> Vec<f32> {
	let cfg = &engine.cfg.rerank.relation_entity;
	let query_entities: Vec<&String> = interpretation.all_entity_values().collect();
	let query_entity_set: HashSet<String> =
		query_entities.iter().map(|value| value.to_lowercase()).collect();
	let mut deltas = vec![0.0_f32; candidates.len()];

	for (idx, candidate) in candidates.iter().enumerate() {
		let mut delta = 0.0;

		if cfg.relation_scoring {
			for edge in &candidate.metadata.relations {
				let references_query = query_entities
					.iter()
					.any(|value| edge.to_id.contains(*value) || edge.from_id.contains(*value));

				if references_query {
					delta += relation_bonus(edge.kind);
				}
			}
		}
		if cfg.entity_matching && !query_entity_set.is_empty() {
			delta += entity_overlap_bonus(&query_entity_set, &candidate.metadata.entities);
		}

		deltas[idx] = delta;
	}

	deltas
}

/// Cosine of the binary entity-overlap vectors:
/// `|A intersect B| / sqrt(|A| * |B|)`, scaled by the match weight.
fn entity_overlap_bonus(query_entities: &HashSet<String>, candidate_entities: &[String]) -> f32 {
	if candidate_entities.is_empty() {
		return 0.0;
	}

	let candidate_set: HashSet<String> =
		candidate_entities.iter().map(|value| value.to_lowercase()).collect();
	let overlap = query_entities.intersection(&candidate_set).count();

	if overlap == 0 {
		return 0.0;
	}

	let denom = ((query_entities.len() * candidate_set.len()) as f32).sqrt();

	ENTITY_MATCH_WEIGHT * overlap as f32 / denom
}

/// Phase c: pulls up to five neighbors per top-20 candidate along
/// amends/supersedes edges, by id lookup against the neighbor's collection.
/// Added candidates carry a decayed score. Targets are interleaved one per
/// source candidate before seconds, so a trim to the fetch budget drops the
/// deepest neighbors first instead of whole candidates. Nothing here
/// recurses.
pub async fn expand_neighbors(
	engine: &Engine,
	plan: &crate::plan::Plan,
	candidates: &[Evidence],
) -> Vec<Evidence> {
	let cfg = &engine.cfg.rerank.relation_entity;

	if !cfg.entity_expansion {
		return Vec::new();
	}

	let mut targets = collect_expansion_targets(candidates);

	if targets.len() > EXPANSION_FETCH_BUDGET {
		tracing::debug!(
			dropped = targets.len() - EXPANSION_FETCH_BUDGET,
			"Neighbor expansion target list trimmed to the fetch budget."
		);
		targets.truncate(EXPANSION_FETCH_BUDGET);
	}

	let mut out = Vec::new();

	for (doc_id, decayed_score) in targets {
		let filter = edict_index::IndexFilter::matching("doc_id", &doc_id);

		for collection in &plan.collections {
			let payloads =
				match engine.index.fetch_by_filter(collection, &filter, 2).await {
					Ok(payloads) => payloads,
					Err(err) => {
						tracing::debug!(
							collection = collection.as_str(),
							error = %err,
							"Neighbor expansion lookup failed."
						);

						continue;
					},
				};

			for payload in payloads {
				if cfg.bidirectional_currency && payload.metadata.is_superseded {
					continue;
				}

				let mut evidence = Evidence {
					chunk_id: payload.chunk_id.clone(),
					doc_id: payload.doc_id.clone(),
					vertical: payload
						.vertical
						.unwrap_or(edict_domain::Vertical::Legal),
					text: payload.text.clone(),
					score: decayed_score,
					raw_scores: Default::default(),
					metadata: payload.metadata.clone(),
				};

				evidence.raw_scores.record("relation", decayed_score);
				out.push(evidence);
			}

			if !out.is_empty() && out.last().map(|last| last.doc_id == doc_id).unwrap_or(false) {
				break;
			}
		}
	}

	out
}

/// Neighbor doc ids with decayed scores, deduplicated against the candidate
/// set and interleaved round-robin: every source candidate's first neighbor
/// comes before any candidate's second.
fn collect_expansion_targets(candidates: &[Evidence]) -> Vec<(String, f32)> {
	let present: HashSet<&str> =
		candidates.iter().map(|candidate| candidate.doc_id.as_str()).collect();
	let mut seen: HashSet<String> = HashSet::new();
	let mut per_candidate: Vec<Vec<(String, f32)>> = Vec::new();

	for candidate in candidates.iter().take(EXPANSION_SOURCE_DEPTH) {
		let mut neighbors = Vec::new();

		for edge in &candidate.metadata.relations {
			if !matches!(edge.kind, RelationKind::Amends | RelationKind::Supersedes) {
				continue;
			}
			if neighbors.len() >= EXPANSION_NEIGHBOR_LIMIT {
				break;
			}

			let neighbor = if edge.from_id == candidate.doc_id {
				edge.to_id.as_str()
			} else {
				edge.from_id.as_str()
			};

			if present.contains(neighbor) || !seen.insert(neighbor.to_string()) {
				continue;
			}

			neighbors.push((neighbor.to_string(), candidate.score * EXPANSION_DECAY));
		}

		per_candidate.push(neighbors);
	}

	let mut out = Vec::new();

	for depth in 0..EXPANSION_NEIGHBOR_LIMIT {
		for neighbors in &per_candidate {
			if let Some(target) = neighbors.get(depth) {
				out.push(target.clone());
			}
		}
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use edict_domain::{EvidenceMetadata, RawScores, RelationEdge, Vertical};

	fn candidate_with_edges(doc_id: &str, score: f32, neighbors: &[&str]) -> Evidence {
		let relations = neighbors
			.iter()
			.map(|neighbor| RelationEdge {
				from_id: doc_id.to_string(),
				to_id: (*neighbor).to_string(),
				kind: RelationKind::Amends,
			})
			.collect();

		Evidence {
			chunk_id: format!("{doc_id}/c0"),
			doc_id: doc_id.to_string(),
			vertical: Vertical::Go,
			text: String::new(),
			score,
			raw_scores: RawScores::default(),
			metadata: EvidenceMetadata { relations, ..Default::default() },
		}
	}

	#[test]
	fn expansion_targets_interleave_across_candidates() {
		let candidates = vec![
			candidate_with_edges("go/1", 1.0, &["go/10", "go/11"]),
			candidate_with_edges("go/2", 0.9, &["go/20", "go/21"]),
			candidate_with_edges("go/3", 0.8, &["go/30"]),
		];
		let targets = collect_expansion_targets(&candidates);
		let order: Vec<&str> = targets.iter().map(|(doc_id, _)| doc_id.as_str()).collect();

		assert_eq!(order, vec!["go/10", "go/20", "go/30", "go/11", "go/21"]);
		assert!((targets[0].1 - 0.5).abs() < 1e-6);
	}

	#[test]
	fn expansion_targets_skip_present_and_duplicate_neighbors() {
		let candidates = vec![
			candidate_with_edges("go/1", 1.0, &["go/2", "go/10"]),
			candidate_with_edges("go/2", 0.9, &["go/10", "go/20"]),
		];
		let targets = collect_expansion_targets(&candidates);
		let order: Vec<&str> = targets.iter().map(|(doc_id, _)| doc_id.as_str()).collect();

		// go/2 is already a candidate; go/10 only counts once.
		assert_eq!(order, vec!["go/10", "go/20"]);
	}

	#[test]
	fn expansion_respects_per_candidate_limit() {
		let neighbors: Vec<String> = (0..8).map(|idx| format!("go/n{idx}")).collect();
		let neighbor_refs: Vec<&str> = neighbors.iter().map(String::as_str).collect();
		let candidates = vec![candidate_with_edges("go/1", 1.0, &neighbor_refs)];

		assert_eq!(collect_expansion_targets(&candidates).len(), EXPANSION_NEIGHBOR_LIMIT);
	}

	#[test]
	fn overlap_bonus_is_zero_without_intersection() {
		let query: HashSet<String> = ["12".to_string()].into_iter().collect();

		assert_eq!(entity_overlap_bonus(&query, &["54".to_string()]), 0.0);
	}

	#[test]
	fn overlap_bonus_scales_with_cosine() {
		let query: HashSet<String> = ["12".to_string(), "rte act".to_string()].into_iter().collect();
		let full = entity_overlap_bonus(&query, &["12".to_string(), "RTE Act".to_string()]);
		let partial = entity_overlap_bonus(&query, &["12".to_string(), "other".to_string()]);

		assert!((full - ENTITY_MATCH_WEIGHT).abs() < 1e-6);
		assert!(partial < full);
		assert!(partial > 0.0);
	}

	#[test]
	fn relation_bonuses_follow_kind_order() {
		assert!(relation_bonus(RelationKind::Amends) > relation_bonus(RelationKind::Supersedes));
		assert!(relation_bonus(RelationKind::Supersedes) > relation_bonus(RelationKind::Implements));
		assert!(relation_bonus(RelationKind::Implements) > relation_bonus(RelationKind::Cites));
	}
}
