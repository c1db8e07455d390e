use std::{sync::Arc, time::Duration};

use edict_domain::{EntityKind, Mode, Vertical};
use edict_engine::{Error, Overrides, step};
use edict_testkit::{
	self as testkit,
	providers::{
		CannedWebSearch, HashEmbedding, OverlapCrossEncoder, RewriterScript, ScriptedRewriter,
		SlowEmbedding, StallingCrossEncoder,
	},
};

fn providers_with_rewriter(rewriter: ScriptedRewriter) -> edict_engine::Providers {
	edict_engine::Providers::new(
		Arc::new(HashEmbedding),
		Arc::new(rewriter),
		Arc::new(OverlapCrossEncoder),
		Arc::new(CannedWebSearch { hits: Vec::new() }),
	)
}

#[tokio::test]
async fn legal_citation_takes_the_clause_fast_path() {
	testkit::init_tracing();

	let engine = testkit::policy_engine();
	let output = engine.retrieve_planned("What is Section 12?", None, None).await.expect("retrieves");

	assert_eq!(output.interpretation.r#type, Mode::Qa);
	assert_eq!(output.interpretation.entity_values(EntityKind::Section), ["12"]);
	assert!(output.steps.iter().any(|step| step == step::CLAUSE_FAST_PATH), "steps: {:?}", output.steps);
	assert_eq!(output.verticals_searched, vec![Vertical::Legal]);
	assert!(output.final_count >= 2, "final_count: {}", output.final_count);
	assert!(!output.partial);
}

#[tokio::test]
async fn recent_go_query_pins_filter_and_vertical() {
	let engine = testkit::policy_engine();
	let output = engine
		.retrieve_planned("recent GOs from school education department", None, None)
		.await
		.expect("retrieves");
	let filter = output.plan.force_filter.as_ref().expect("force filter attached");
	let repr = filter.canonical_repr();

	assert!(repr.contains("vertical=go"), "repr: {repr}");
	assert!(repr.contains("date_issued_ts"), "repr: {repr}");
	assert!(repr.contains("department=School Education"), "repr: {repr}");
	assert!(output.final_count > 0);
	assert!(output.results.iter().all(|evidence| evidence.vertical == Vertical::Go));

	// The stale GO falls outside the 18-month window entirely.
	assert!(output.results.iter().all(|evidence| evidence.doc_id != "go/88"));

	// The superseded GO survives but never outranks the active one.
	let active_pos = output.results.iter().position(|evidence| evidence.doc_id == "go/54");
	let stale_pos = output.results.iter().position(|evidence| evidence.doc_id == "go/23");

	if let (Some(active), Some(stale)) = (active_pos, stale_pos) {
		assert!(active < stale, "superseded GO ranked above the active one");
	}
}

#[tokio::test]
async fn superseded_results_can_be_excluded() {
	let engine = testkit::policy_engine();
	let overrides = Overrides { include_superseded: Some(false), ..Default::default() };
	let output = engine
		.retrieve_planned("recent GOs from school education department", None, Some(overrides))
		.await
		.expect("retrieves");

	assert!(output.results.iter().all(|evidence| !evidence.metadata.is_superseded));
}

#[tokio::test]
async fn deepthink_searches_everything_and_forces_relation_stage() {
	let engine = testkit::policy_engine();
	let output = engine
		.retrieve_planned("Analyze teacher transfer policy comprehensively", None, None)
		.await
		.expect("retrieves");

	assert_eq!(output.interpretation.r#type, Mode::Deepthink);
	assert_eq!(output.plan.rewrites, 5);
	assert_eq!(output.plan.hops, 2);
	assert_eq!(output.rewrites.len(), 5);
	assert!(
		output.steps.iter().any(|step| step == step::RELATION_ENTITY_FORCED),
		"steps: {:?}",
		output.steps
	);

	let mut verticals: Vec<Vertical> =
		output.results.iter().map(|evidence| evidence.vertical).collect();

	verticals.sort();
	verticals.dedup();

	assert!(verticals.len() >= 4, "verticals in results: {verticals:?}");
}

#[tokio::test]
async fn rewriter_auth_failure_downgrades_permanently() {
	let rewriter = ScriptedRewriter::new(RewriterScript::Unauthorized);
	let calls = rewriter.call_counter();
	let engine = testkit::policy_engine_with(testkit::config(), providers_with_rewriter(rewriter));
	let query = "implications of the new teacher recruitment notification for districts";

	let first = engine.retrieve_planned(query, None, None).await.expect("retrieves");

	assert!(
		first.steps.iter().any(|step| step == step::REWRITER_AUTH_DENIED),
		"steps: {:?}",
		first.steps
	);

	let second = engine.retrieve_planned(query, None, None).await.expect("retrieves");

	assert!(
		second.steps.iter().any(|step| step == step::REWRITER_FALLBACK),
		"steps: {:?}",
		second.steps
	);
	assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1, "rewriter retried after 403");
	assert_eq!(second.rewrites.len(), second.plan.rewrites);
}

#[tokio::test]
async fn rewriter_timeout_falls_back_to_rules() {
	let mut cfg = testkit::config();

	cfg.runtime.stage_timeouts.rewrite_ms = 20;

	let rewriter = ScriptedRewriter::new(RewriterScript::Slow(Duration::from_millis(500)));
	let engine = testkit::policy_engine_with(cfg, providers_with_rewriter(rewriter));
	let output = engine
		.retrieve_planned("implications of the new teacher recruitment notification for districts", None, None)
		.await
		.expect("retrieves");

	assert_eq!(output.rewrites.len(), output.plan.rewrites);
	assert!(
		output.steps.iter().any(|step| step == step::REWRITER_FALLBACK),
		"steps: {:?}",
		output.steps
	);
}

#[tokio::test]
async fn cache_hit_returns_identical_results_fast() {
	let engine = testkit::policy_engine();
	let first = engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");

	assert!(!first.cache_hit);

	let second = engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");

	assert!(second.cache_hit);
	assert!(second.steps.iter().any(|step| step == step::CACHE_HIT));
	assert_eq!(first.results, second.results);
	assert!(second.timings.total_ms < 50, "total_ms: {}", second.timings.total_ms);
}

#[tokio::test]
async fn hard_timeout_yields_partial_output() {
	let mut cfg = testkit::config();

	cfg.runtime.hard_margin_ms = 5;

	let providers = edict_engine::Providers::new(
		Arc::new(SlowEmbedding { delay: Duration::from_millis(300) }),
		Arc::new(ScriptedRewriter::new(RewriterScript::Paraphrases(vec![
			"transfer policy study".to_string(),
		]))),
		Arc::new(OverlapCrossEncoder),
		Arc::new(CannedWebSearch { hits: Vec::new() }),
	);
	let engine = testkit::policy_engine_with(cfg, providers);
	let overrides = Overrides { timeout_ms: Some(50), ..Default::default() };
	let output = engine
		.retrieve_planned("Analyze teacher transfer policy comprehensively", None, Some(overrides))
		.await
		.expect("returns partial output, not an error");

	assert!(output.partial);
	assert!(output.steps.iter().any(|step| step == step::HARD_TIMEOUT), "steps: {:?}", output.steps);

	// Whatever came back still honors the ordering invariants.
	for pair in output.results.windows(2) {
		assert!(pair[0].score >= pair[1].score);
	}
}

#[tokio::test]
async fn empty_query_is_rejected() {
	let engine = testkit::policy_engine();

	assert!(matches!(
		engine.retrieve("   ", None, None).await,
		Err(Error::InvalidQuery { .. })
	));
}

#[tokio::test]
async fn empty_indexes_return_empty_output() {
	let engine = testkit::empty_engine();
	let output = engine
		.retrieve_planned("implications of the new teacher recruitment notification for districts", None, None)
		.await
		.expect("empty result, not an error");

	assert_eq!(output.final_count, 0);
	assert_eq!(output.total_candidates, 0);
	assert!(
		output.steps.iter().any(|step| step == "empty:hybrid_retrieval"),
		"steps: {:?}",
		output.steps
	);
}

#[tokio::test]
async fn single_clause_hit_declines_the_fast_path() {
	let engine = testkit::policy_engine();
	let output = engine.retrieve_planned("What is GO 54?", None, None).await.expect("retrieves");

	assert!(
		!output.steps.iter().any(|step| step == step::CLAUSE_FAST_PATH),
		"steps: {:?}",
		output.steps
	);
	assert!(output.final_count > 0);
}

#[tokio::test]
async fn repeated_rerank_timeouts_open_the_circuit_breaker() {
	let mut cfg = testkit::config();

	cfg.runtime.stage_timeouts.cross_encoder_ms = 20;

	let providers = edict_engine::Providers::new(
		Arc::new(HashEmbedding),
		Arc::new(ScriptedRewriter::new(RewriterScript::Paraphrases(vec![
			"teacher posting guidelines".to_string(),
			"transfer norms for teachers".to_string(),
		]))),
		Arc::new(StallingCrossEncoder { delay: Duration::from_millis(200) }),
		Arc::new(CannedWebSearch { hits: Vec::new() }),
	);
	let engine = testkit::policy_engine_with(cfg, providers);
	let query = "implications of the new teacher recruitment notification for districts";

	for _ in 0..3 {
		engine.retrieve_planned(query, None, None).await.expect("retrieves");
	}

	let output = engine.retrieve_planned(query, None, None).await.expect("retrieves");

	assert!(
		output.steps.iter().any(|step| step == step::RELATION_ENTITY_SKIPPED_BREAKER),
		"steps: {:?}",
		output.steps
	);
}

#[tokio::test]
async fn identical_runs_are_bit_identical_without_internet() {
	let engine = testkit::policy_engine();
	let query = "Analyze teacher transfer policy comprehensively";
	let first = engine.retrieve_planned(query, None, None).await.expect("retrieves");
	let second = engine.retrieve_planned(query, None, None).await.expect("retrieves");

	assert_eq!(first.results, second.results);
	assert_eq!(first.rewrites, second.rewrites);
	assert_eq!(first.verticals_searched, second.verticals_searched);
}

#[tokio::test]
async fn results_are_unique_and_ordered() {
	let engine = testkit::policy_engine();

	for query in [
		"What is Section 12?",
		"recent GOs from school education department",
		"Analyze teacher transfer policy comprehensively",
		"midday meal scheme coverage statistics",
	] {
		let output = engine.retrieve_planned(query, None, None).await.expect("retrieves");
		let mut ids: Vec<&str> =
			output.results.iter().map(|evidence| evidence.chunk_id.as_str()).collect();

		for pair in output.results.windows(2) {
			assert!(pair[0].score >= pair[1].score, "query: {query}");
		}

		ids.sort_unstable();
		ids.dedup();

		assert_eq!(ids.len(), output.results.len(), "duplicate chunk ids for: {query}");
		assert_eq!(output.final_count, output.results.len());
		assert!(output.final_count <= output.plan.top_k_total);
	}
}

#[tokio::test]
async fn internet_evidence_joins_the_candidate_pool() {
	let hits = vec![
		edict_providers::websearch::WebHit {
			title: "Teacher transfer best practices".to_string(),
			url: "https://example.org/transfers".to_string(),
			snippet: "global overview of teacher transfer policy approaches".to_string(),
			rank: 0,
		},
	];
	let providers = edict_engine::Providers::new(
		Arc::new(HashEmbedding),
		Arc::new(ScriptedRewriter::new(RewriterScript::Paraphrases(vec![
			"teacher movement ideas".to_string(),
		]))),
		Arc::new(OverlapCrossEncoder),
		Arc::new(CannedWebSearch { hits }),
	);
	let engine = testkit::policy_engine_with(testkit::config(), providers);
	let output = engine
		.retrieve_planned("innovative global ideas for teacher transfer policy", None, None)
		.await
		.expect("retrieves");

	assert_eq!(output.interpretation.r#type, Mode::Brainstorm);
	assert!(output.plan.use_internet);
	assert!(
		output.results.iter().any(|evidence| evidence.vertical == Vertical::Internet),
		"no internet evidence in results"
	);
}

#[tokio::test]
async fn stats_reflect_cache_traffic() {
	let engine = testkit::policy_engine();

	engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");
	engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");

	let snapshot = engine.stats_snapshot();

	assert!(snapshot.cache_hit_rate > 0.0);
	assert!(snapshot.stages.contains_key("total"));
}

#[tokio::test]
async fn lifecycle_warmup_and_teardown() {
	let engine = testkit::policy_engine();

	engine.warmup().await.expect("warmup succeeds");
	engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");
	engine.teardown();

	// A teardown drains the result cache; the next identical query misses.
	let output = engine.retrieve("What is Section 12?", None, None).await.expect("retrieves");

	assert!(!output.cache_hit);
}
