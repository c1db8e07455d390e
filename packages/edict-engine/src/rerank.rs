mod category;
mod diversity;
mod relation;

use std::collections::HashMap;

use crate::{
	Engine,
	deadline::Deadline,
	output::step,
	plan::Plan,
	process,
};
use edict_domain::{Evidence, Mode, QueryInterpretation, Vertical, citation};

const QA_FAST_PATH_TOP_SCORE: f32 = 0.7;
const QA_FAST_PATH_AVG_SCORE: f32 = 0.65;
const QA_FAST_PATH_CONFIDENCE: f32 = 0.8;
const QA_FAST_PATH_MAX_WORDS: usize = 8;
const BM25_BOOST_FACTOR: f32 = 0.2;
const CLAUSE_FALLBACK_MIN_RESULTS: usize = 3;

pub struct RerankContext<'a> {
	pub normalized: &'a str,
	pub interpretation: &'a QueryInterpretation,
	pub plan: &'a Plan,
	pub vectors: &'a HashMap<String, Vec<f32>>,
	pub deadline: Deadline,
}

pub struct RerankOutcome {
	pub candidates: Vec<Evidence>,
	pub steps: Vec<String>,
}

/// Stage order: category prediction, then BM25 boost and relation/entity
/// processing concurrently (their deltas sum), then cross-encoder, then MMR
/// diversity, then the clause-indexer fallback. Every stage is conditional
/// and every stage failure is a no-op plus a breaker increment.
pub async fn run(
	engine: &Engine,
	ctx: RerankContext<'_>,
	mut candidates: Vec<Evidence>,
) -> RerankOutcome {
	let mut steps = Vec::new();
	let mut stage_timeouts = 0_u32;

	process::sort_by_score(&mut candidates);

	let categories = category::predict(&candidates);
	let relation_enabled = decide_relation_entity(engine, &ctx, &candidates, &mut steps);
	let bm25_applicable = bm25_boost_applicable(&candidates);
	let bm25_deltas = if bm25_applicable { bm25_boost_deltas(&candidates) } else { Vec::new() };
	let (relation_deltas, expansion) = if relation_enabled {
		let relation_timeout = ctx.deadline.cap(engine.stage_timeout("relation"));
		let work = async {
			let deltas = relation::score_deltas(engine, ctx.interpretation, &candidates);
			let expansion = relation::expand_neighbors(engine, ctx.plan, &candidates).await;

			(deltas, expansion)
		};

		match tokio::time::timeout(relation_timeout, work).await {
			Ok(outcome) => outcome,
			Err(_) => {
				stage_timeouts += 1;

				tracing::warn!("Relation/entity stage timed out; skipped.");

				(Vec::new(), Vec::new())
			},
		}
	} else {
		(Vec::new(), Vec::new())
	};

	for (idx, candidate) in candidates.iter_mut().enumerate() {
		let mut delta = 0.0;

		if let Some(bm25_delta) = bm25_deltas.get(idx) {
			delta += bm25_delta;
		}
		if let Some(relation_delta) = relation_deltas.get(idx) {
			if *relation_delta > 0.0 {
				candidate.raw_scores.record("relation", *relation_delta);
			}

			delta += relation_delta;
		}

		candidate.score += delta;
	}

	candidates.extend(expansion);
	process::sort_by_score(&mut candidates);

	if cross_encode(engine, &ctx, &mut candidates).await.is_err() {
		stage_timeouts += 1;
	}

	if should_apply_mmr(ctx.plan, &candidates) {
		let lambda = if ctx.plan.diversity_weight > 0.0 {
			1.0 - ctx.plan.diversity_weight
		} else {
			engine.cfg.diversity.mmr_lambda
		};

		candidates = diversity::apply_mmr(
			candidates,
			ctx.plan.rerank_top_k.max(2),
			lambda,
			ctx.vectors,
			&categories,
		);
	}

	if candidates.len() < CLAUSE_FALLBACK_MIN_RESULTS
		&& citation::is_citation_query(ctx.normalized)
	{
		clause_fallback(engine, ctx.normalized, &mut candidates, &mut steps).await;
	}

	process::sort_by_score(&mut candidates);

	if stage_timeouts == 0 {
		engine.breaker.record_success();
	} else {
		for _ in 0..stage_timeouts {
			engine.breaker.record_timeout();
			engine.stats.record_breaker_trip();
		}
	}

	RerankOutcome { candidates, steps }
}

/// The clause fast path reranks with stage 4 only: no boosts, no relation
/// processing, no diversity.
pub(crate) async fn lightweight_rerank(
	engine: &Engine,
	normalized: &str,
	interpretation: &QueryInterpretation,
	plan: &Plan,
	deadline: Deadline,
	mut candidates: Vec<Evidence>,
) -> Vec<Evidence> {
	let vectors = HashMap::new();
	let ctx = RerankContext { normalized, interpretation, plan, vectors: &vectors, deadline };

	process::sort_by_score(&mut candidates);

	if cross_encode(engine, &ctx, &mut candidates).await.is_err() {
		engine.breaker.record_timeout();
		engine.stats.record_breaker_trip();
	}

	candidates
}

/// Stage-3 gating. Comprehensive modes force the stage on; the circuit
/// breaker (with a relaxed threshold for those modes) can still shed it; a
/// confidently-answered short qa query skips it.
fn decide_relation_entity(
	engine: &Engine,
	ctx: &RerankContext<'_>,
	candidates: &[Evidence],
	steps: &mut Vec<String>,
) -> bool {
	let cfg = &engine.cfg.rerank.relation_entity;

	if !cfg.enabled {
		return false;
	}

	let threshold = if ctx.plan.mode.is_comprehensive() {
		engine.cfg.rerank.breaker.comprehensive_threshold
	} else {
		engine.cfg.rerank.breaker.threshold
	};

	if engine.breaker.is_open(threshold) {
		steps.push(step::RELATION_ENTITY_SKIPPED_BREAKER.to_string());

		return false;
	}
	if ctx.plan.mode.is_comprehensive() {
		steps.push(step::RELATION_ENTITY_FORCED.to_string());

		return true;
	}
	if ctx.plan.mode == Mode::Qa && qa_fast_path(ctx, candidates) {
		steps.push(step::RELATION_ENTITY_SKIPPED_QA.to_string());

		return false;
	}

	true
}

fn qa_fast_path(ctx: &RerankContext<'_>, candidates: &[Evidence]) -> bool {
	if candidates.len() < 3 {
		return false;
	}

	let top3: Vec<f32> = candidates.iter().take(3).map(|candidate| candidate.score).collect();
	let avg = top3.iter().sum::<f32>() / top3.len() as f32;
	let word_count = ctx.normalized.split_whitespace().count();

	top3.iter().all(|score| *score > QA_FAST_PATH_TOP_SCORE)
		&& avg > QA_FAST_PATH_AVG_SCORE
		&& ctx.interpretation.confidence > QA_FAST_PATH_CONFIDENCE
		&& word_count < QA_FAST_PATH_MAX_WORDS
}

fn bm25_boost_applicable(candidates: &[Evidence]) -> bool {
	candidates.iter().any(|candidate| {
		matches!(candidate.vertical, Vertical::Infrastructure | Vertical::Schemes)
			&& candidate.raw_scores.get("sparse").map(|score| score > 0.0).unwrap_or(false)
	})
}

/// Multiplicative sparse amplification for infrastructure/schemes evidence,
/// expressed as an additive delta so it can sum with the relation stage.
fn bm25_boost_deltas(candidates: &[Evidence]) -> Vec<f32> {
	candidates
		.iter()
		.map(|candidate| {
			let qualifies =
				matches!(candidate.vertical, Vertical::Infrastructure | Vertical::Schemes)
					&& candidate.raw_scores.get("sparse").map(|s| s > 0.0).unwrap_or(false);

			if qualifies { candidate.score * BM25_BOOST_FACTOR } else { 0.0 }
		})
		.collect()
}

/// Cross-encoder re-scoring over the leading `M` candidates. Internet
/// evidence is down-weighted before selection; scored candidates take the
/// model's relevance value; the unscored tail is re-anchored strictly below.
async fn cross_encode(
	engine: &Engine,
	ctx: &RerankContext<'_>,
	candidates: &mut Vec<Evidence>,
) -> Result<(), ()> {
	if candidates.is_empty() {
		return Ok(());
	}

	for candidate in candidates.iter_mut() {
		if candidate.vertical == Vertical::Internet {
			candidate.score *= engine.cfg.internet.down_weight;
		}
	}

	process::sort_by_score(candidates);

	let m = cross_encoder_top_m(engine, ctx.plan.mode).min(candidates.len());

	if m == 0 {
		return Ok(());
	}

	let passages: Vec<String> = candidates
		.iter()
		.take(m)
		.map(|candidate| candidate.text.chars().take(512).collect())
		.collect();
	let timeout = ctx.deadline.cap(engine.stage_timeout("cross_encoder"));
	let call = engine.providers.cross_encoder.score(
		&engine.cfg.providers.cross_encoder,
		ctx.normalized,
		&passages,
	);
	let scores = match tokio::time::timeout(timeout, call).await {
		Ok(Ok(scores)) if scores.len() == m => scores,
		Ok(Ok(_)) => {
			tracing::warn!("Cross-encoder returned a mismatched score count; stage skipped.");

			return Ok(());
		},
		Ok(Err(err)) => {
			tracing::warn!(error = %err, "Cross-encoder failed; stage skipped.");

			return if matches!(err, edict_providers::Error::Timeout) { Err(()) } else { Ok(()) };
		},
		Err(_) => {
			tracing::warn!("Cross-encoder timed out; stage skipped.");

			return Err(());
		},
	};

	let mut min_scored = f32::INFINITY;

	for (idx, score) in scores.iter().enumerate() {
		let candidate = &mut candidates[idx];

		candidate.raw_scores.record("rerank", *score);
		candidate.score = *score;
		min_scored = min_scored.min(*score);
	}

	// Tail candidates were never scored by the model; keep their relative
	// order strictly under the scored block.
	let mut previous = min_scored;

	for candidate in candidates.iter_mut().skip(m) {
		if candidate.score >= previous {
			candidate.score = previous - 1e-6;
		}

		previous = candidate.score;
	}

	process::sort_by_score(candidates);

	Ok(())
}

fn cross_encoder_top_m(engine: &Engine, mode: Mode) -> usize {
	let cfg = &engine.cfg.rerank.cross_encoder_top_m;

	match mode {
		Mode::Qa | Mode::Compliance => cfg.qa,
		Mode::Policy | Mode::Framework => cfg.policy,
		Mode::Deepthink | Mode::Brainstorm => cfg.deepthink,
	}
}

fn should_apply_mmr(plan: &Plan, candidates: &[Evidence]) -> bool {
	if candidates.len() < 3 {
		return plan.use_mmr && candidates.len() >= 2;
	}
	if plan.use_mmr {
		return true;
	}

	let first = candidates[0].vertical;

	candidates.iter().take(3).all(|candidate| candidate.vertical == first)
}

/// When reranking left fewer than three results for a citation query, direct
/// clause-index hits are merged on top of whatever survived.
async fn clause_fallback(
	engine: &Engine,
	normalized: &str,
	candidates: &mut Vec<Evidence>,
	steps: &mut Vec<String>,
) {
	let hits = engine.clause_hits(normalized).await;

	if hits.is_empty() {
		return;
	}

	steps.push(step::CLAUSE_FALLBACK.to_string());

	let ceiling = candidates.first().map(|candidate| candidate.score).unwrap_or(0.0);
	let total = hits.len();

	// Clause hits land above everything else, keeping their lookup order.
	for (idx, mut evidence) in hits.into_iter().enumerate() {
		if candidates.iter().any(|existing| existing.chunk_id == evidence.chunk_id) {
			continue;
		}

		evidence.score = ceiling + 0.05 * (total - idx) as f32;
		candidates.push(evidence);
	}
}
