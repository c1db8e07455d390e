use std::{collections::HashMap, sync::Arc};

use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
	Engine,
	deadline::Deadline,
	output::step,
	plan::Plan,
	process,
};
use edict_domain::{
	Evidence, Mode, QueryInterpretation, SectionType, Vertical,
};
use edict_index::{IndexFilter, IndexHit};

const MAX_HOP_QUERIES: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Modality {
	Dense,
	Sparse,
}

#[derive(Debug, Default)]
pub struct HybridResult {
	pub candidates: Vec<Evidence>,
	/// Dense vectors for candidates that carried one, keyed by chunk id.
	/// Consumed later by MMR diversity.
	pub vectors: HashMap<String, Vec<f32>>,
	pub steps: Vec<String>,
	pub timed_out: bool,
}

/// Per-rewrite, per-vertical concurrent dense+sparse search with RRF fusion
/// and section-type boosting, expanded over up to `plan.hops` hops. Any
/// single (rewrite, collection, modality) failure yields an empty list; the
/// stage always completes with whatever arrived in time.
pub async fn execute(
	engine: &Engine,
	plan: &Plan,
	interpretation: &QueryInterpretation,
	queries: &[String],
	deadline: Deadline,
) -> HybridResult {
	let workers = crate::plan::workers_for(&engine.cfg, plan.mode);
	let semaphore = Arc::new(Semaphore::new(workers));
	let mut result = HybridResult::default();
	let mut hop_queries: Vec<String> = queries.to_vec();
	let mut queried: Vec<String> = queries.to_vec();

	for hop in 1..=plan.hops.max(1) {
		if hop > 1 {
			if let Some(reason) = hop_gate(plan.mode, &result) {
				result.steps.push(reason.to_string());

				break;
			}

			hop_queries = derive_hop_queries(&result.candidates, interpretation, &queried);

			if hop_queries.is_empty() {
				break;
			}

			queried.extend(hop_queries.iter().cloned());
		}
		if deadline.expired() {
			result.timed_out = true;

			break;
		}

		let k = if hop == 1 {
			plan.top_k_per_vertical
		} else {
			(plan.top_k_per_vertical / 2).max(1)
		};

		run_hop(engine, plan, &hop_queries, k, semaphore.clone(), deadline, &mut result).await;
	}

	result
}

/// Hop 2 is skipped when the first hop already answered a qa query with high
/// confidence, or produced too little to expand from.
fn hop_gate(mode: Mode, result: &HybridResult) -> Option<&'static str> {
	if result.candidates.len() < 3 {
		return Some(step::HOP_SKIPPED_LOW_YIELD);
	}

	let max_dense = result
		.candidates
		.iter()
		.filter_map(|candidate| candidate.raw_scores.get("dense"))
		.fold(f32::NEG_INFINITY, f32::max);

	if mode == Mode::Qa && max_dense >= 0.8 {
		return Some(step::HOP_SKIPPED_HIGH_CONFIDENCE);
	}

	None
}

async fn run_hop(
	engine: &Engine,
	plan: &Plan,
	queries: &[String],
	k: usize,
	semaphore: Arc<Semaphore>,
	deadline: Deadline,
	result: &mut HybridResult,
) {
	let vectors = match engine.embed_batch(queries, deadline).await {
		Ok(vectors) => Some(vectors),
		Err(err) => {
			tracing::warn!(error = %err, "Query embedding failed; dense search skipped for this hop.");

			None
		},
	};
	let filter = plan.force_filter.clone();
	let mut tasks: JoinSet<(usize, Vertical, Modality, Vec<IndexHit>)> = JoinSet::new();

	for (query_idx, query) in queries.iter().enumerate() {
		for (vertical_idx, vertical) in plan.verticals.iter().enumerate() {
			let Some(collection) = plan.collections.get(vertical_idx) else { continue };

			if collection.is_empty() {
				continue;
			}

			let dense_vector =
				vectors.as_ref().and_then(|vectors| vectors.get(query_idx)).cloned();

			if let Some(vector) = dense_vector {
				tasks.spawn(search_task(
					engine.index.clone(),
					semaphore.clone(),
					SearchTask {
						query_idx,
						vertical: *vertical,
						modality: Modality::Dense,
						collection: collection.clone(),
						query: query.clone(),
						vector: Some(vector),
						k,
						filter: filter.clone(),
						timeout: deadline.cap(engine.stage_timeout("dense")),
					},
					engine.index_error_log.clone(),
				));
			}

			tasks.spawn(search_task(
				engine.index.clone(),
				semaphore.clone(),
				SearchTask {
					query_idx,
					vertical: *vertical,
					modality: Modality::Sparse,
					collection: collection.clone(),
					query: query.clone(),
					vector: None,
					k,
					filter: filter.clone(),
					timeout: deadline.cap(engine.stage_timeout("sparse")),
				},
				engine.index_error_log.clone(),
			));
		}
	}

	let mut runs: HashMap<usize, Vec<(Vertical, Modality, Vec<IndexHit>)>> = HashMap::new();

	while let Some(joined) = tasks.join_next().await {
		let Ok((query_idx, vertical, modality, hits)) = joined else { continue };

		runs.entry(query_idx).or_default().push((vertical, modality, hits));

		if deadline.expired() {
			result.timed_out = true;

			tasks.abort_all();

			break;
		}
	}

	let rrf_k = engine.cfg.retrieval.rrf_k as f32;

	for query_idx in 0..queries.len() {
		let Some(query_runs) = runs.remove(&query_idx) else { continue };

		result.candidates.extend(fuse_runs(engine, query_runs, rrf_k, &mut result.vectors));
	}
}

struct SearchTask {
	query_idx: usize,
	vertical: Vertical,
	modality: Modality,
	collection: String,
	query: String,
	vector: Option<Vec<f32>>,
	k: usize,
	filter: Option<IndexFilter>,
	timeout: std::time::Duration,
}

async fn search_task(
	index: Arc<dyn edict_index::IndexClient>,
	semaphore: Arc<Semaphore>,
	task: SearchTask,
	error_log: Arc<dashmap::DashMap<String, ()>>,
) -> (usize, Vertical, Modality, Vec<IndexHit>) {
	let Ok(_permit) = semaphore.acquire().await else {
		return (task.query_idx, task.vertical, task.modality, Vec::new());
	};
	let call = async {
		match (task.modality, task.vector.as_ref()) {
			(Modality::Dense, Some(vector)) =>
				index.knn(&task.collection, vector, task.k, task.filter.as_ref()).await,
			(Modality::Dense, None) => Ok(Vec::new()),
			(Modality::Sparse, _) =>
				index.bm25(&task.collection, &task.query, task.k, task.filter.as_ref()).await,
		}
	};

	match tokio::time::timeout(task.timeout, call).await {
		Ok(Ok(hits)) => (task.query_idx, task.vertical, task.modality, hits),
		Ok(Err(err)) => {
			// Collection problems are logged once per collection per process.
			if error_log.insert(task.collection.clone(), ()).is_none() {
				tracing::warn!(
					collection = task.collection.as_str(),
					error = %err,
					"Index search failed; contributing empty results."
				);
			}

			(task.query_idx, task.vertical, task.modality, Vec::new())
		},
		Err(_) => (task.query_idx, task.vertical, task.modality, Vec::new()),
	}
}

/// Reciprocal Rank Fusion over every (collection, modality) run of a single
/// rewrite: `rrf(d) = sum over runs of 1 / (k + rank)`. Dense and sparse
/// scores survive in the audit trail; the fused score is then section-boosted.
fn fuse_runs(
	engine: &Engine,
	runs: Vec<(Vertical, Modality, Vec<IndexHit>)>,
	rrf_k: f32,
	vectors: &mut HashMap<String, Vec<f32>>,
) -> Vec<Evidence> {
	struct Fused {
		evidence: Evidence,
		rrf: f32,
		dense: Option<f32>,
		sparse: Option<f32>,
	}

	let mut by_chunk: HashMap<String, Fused> = HashMap::new();

	for (vertical, modality, hits) in runs {
		for (rank, hit) in hits.into_iter().enumerate() {
			let contribution = 1.0 / (rrf_k + rank as f32 + 1.0);

			if let Some(vector) = hit.payload.vector.clone() {
				vectors.entry(hit.chunk_id.clone()).or_insert(vector);
			}

			let entry = by_chunk.entry(hit.chunk_id.clone()).or_insert_with(|| Fused {
				evidence: Evidence {
					chunk_id: hit.chunk_id.clone(),
					doc_id: hit.payload.doc_id.clone(),
					vertical: hit.payload.vertical.unwrap_or(vertical),
					text: hit.payload.text.clone(),
					score: 0.0,
					raw_scores: Default::default(),
					metadata: hit.payload.metadata.clone(),
				},
				rrf: 0.0,
				dense: None,
				sparse: None,
			});

			entry.rrf += contribution;

			match modality {
				Modality::Dense =>
					entry.dense = Some(entry.dense.map_or(hit.score, |value| value.max(hit.score))),
				Modality::Sparse =>
					entry.sparse =
						Some(entry.sparse.map_or(hit.score, |value| value.max(hit.score))),
			}
		}
	}

	let boost = &engine.cfg.retrieval.section_boost;
	let mut out = Vec::with_capacity(by_chunk.len());

	for fused in by_chunk.into_values() {
		let Fused { mut evidence, rrf, dense, sparse } = fused;

		if let Some(dense) = dense {
			evidence.raw_scores.record("dense", dense);
		}
		if let Some(sparse) = sparse {
			evidence.raw_scores.record("sparse", sparse);
		}

		evidence.raw_scores.record("rrf", rrf);
		evidence.score = rrf;

		let multiplier = match evidence.metadata.section_type.as_ref() {
			Some(SectionType::Orders) => boost.orders,
			Some(SectionType::Preamble) => boost.preamble,
			Some(SectionType::Annexure) => boost.annexure,
			_ => 1.0,
		};

		if (multiplier - 1.0).abs() > f32::EPSILON {
			evidence.score *= multiplier;
			evidence.raw_scores.record("section_boost", multiplier);
		}

		out.push(evidence);
	}

	process::sort_by_score(&mut out);

	out
}

/// Derives follow-up queries from the best candidates so far: GO references,
/// section citations, and metadata entities not yet searched.
fn derive_hop_queries(
	candidates: &[Evidence],
	interpretation: &QueryInterpretation,
	queried: &[String],
) -> Vec<String> {
	let mut sorted: Vec<&Evidence> = candidates.iter().collect();

	sorted.sort_by(|lhs, rhs| {
		process::cmp_score_desc(lhs.score, rhs.score)
			.then_with(|| lhs.chunk_id.cmp(&rhs.chunk_id))
	});

	let known: Vec<&String> = interpretation.all_entity_values().collect();
	let mut out: Vec<String> = Vec::new();
	let mut push = |candidate_query: String| {
		if out.len() < MAX_HOP_QUERIES
			&& !queried.iter().any(|existing| existing == &candidate_query)
			&& !out.contains(&candidate_query)
		{
			out.push(candidate_query);
		}
	};

	for candidate in sorted.iter().take(10) {
		if let Some(go_number) = candidate.metadata.go_number.as_ref()
			&& !known.iter().any(|value| *value == go_number)
		{
			push(format!("government order {go_number}"));
		}
		if let Some(section) = candidate.metadata.section_number.as_ref()
			&& !known.iter().any(|value| *value == section)
		{
			push(format!("section {section}"));
		}

		for entity in &candidate.metadata.entities {
			if !known.iter().any(|value| *value == entity) {
				push(entity.clone());
			}
		}
	}

	out
}
