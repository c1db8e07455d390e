pub mod corpus;
pub mod memory_index;
pub mod providers;

pub use memory_index::MemoryIndex;

use std::sync::Arc;

use edict_config::*;
use edict_engine::{Engine, Providers as EngineProviders};
use edict_index::ClauseIndex;

use crate::providers::{CannedWebSearch, HashEmbedding, OverlapCrossEncoder, ScriptedRewriter};

/// Installs a test-friendly subscriber honoring `RUST_LOG`. Safe to call
/// from every test; only the first installation wins.
pub fn init_tracing() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A fully-populated config with the documented defaults, pointed at
/// loopback endpoints nothing should ever reach in tests.
pub fn config() -> Config {
	Config {
		runtime: Runtime {
			hard_margin_ms: 2_000,
			include_superseded: true,
			force_filter: Default::default(),
			max_workers: WorkerCounts {
				qa: 4,
				compliance: 6,
				policy: 10,
				framework: 10,
				deepthink: 6,
				brainstorm: 10,
			},
			stage_timeouts: StageTimeouts {
				interpret_ms: 1_000,
				rewrite_ms: 5_000,
				expand_ms: 1_000,
				embed_ms: 3_000,
				dense_ms: 5_000,
				sparse_ms: 2_000,
				cross_encoder_ms: 3_000,
				relation_ms: 3_000,
				internet_ms: 10_000,
			},
		},
		cache: Cache { enabled: true, ttl_qa_secs: 600, ttl_comprehensive_secs: 1_800, max_entries: 256 },
		retrieval: Retrieval {
			rrf_k: 60,
			section_boost: SectionBoost { orders: 1.2, preamble: 0.9, annexure: 0.85 },
		},
		rerank: Rerank {
			cross_encoder_top_m: CrossEncoderTopM { qa: 25, policy: 30, deepthink: 30 },
			relation_entity: RelationEntity {
				enabled: true,
				relation_scoring: true,
				entity_matching: true,
				entity_expansion: true,
				bidirectional_currency: false,
			},
			breaker: Breaker { threshold: 3, comprehensive_threshold: 5 },
		},
		diversity: Diversity {
			mmr_lambda: 0.5,
			weights: DiversityWeights {
				qa: 0.0,
				compliance: 0.2,
				policy: 0.3,
				framework: 0.3,
				deepthink: 0.3,
				brainstorm: 0.5,
			},
		},
		internet: Internet { enabled: true, max_results: 5, down_weight: 0.9 },
		providers: Providers {
			embedding: EmbeddingProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/embed".to_string(),
				model: "test-embed".to_string(),
				dimensions: 768,
				max_batch: 64,
				timeout_ms: 3_000,
				default_headers: Default::default(),
			},
			rewriter: LlmProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/chat".to_string(),
				model: "test-llm".to_string(),
				temperature: 0.2,
				timeout_ms: 5_000,
				default_headers: Default::default(),
			},
			cross_encoder: ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/rerank".to_string(),
				model: "test-ce".to_string(),
				timeout_ms: 3_000,
				default_headers: Default::default(),
			},
			websearch: ProviderConfig {
				provider_id: "test".to_string(),
				api_base: "http://127.0.0.1:9".to_string(),
				api_key: "test-key".to_string(),
				path: "/search".to_string(),
				model: "test-web".to_string(),
				timeout_ms: 10_000,
				default_headers: Default::default(),
			},
		},
		index: Index {
			url: "http://127.0.0.1:6334".to_string(),
			vector_dim: 768,
			collections: Collections {
				legal: corpus::LEGAL.to_string(),
				go: corpus::GO.to_string(),
				judicial: corpus::JUDICIAL.to_string(),
				data: corpus::DATA.to_string(),
				schemes: corpus::SCHEMES.to_string(),
			},
		},
	}
}

/// Deterministic providers: hash embeddings, a paraphrase script, overlap
/// cross-encoding, and no web hits.
pub fn deterministic_providers() -> EngineProviders {
	EngineProviders::new(
		Arc::new(HashEmbedding),
		Arc::new(ScriptedRewriter::new(providers::RewriterScript::Paraphrases(vec![
			"teacher posting guidelines".to_string(),
			"transfer norms for teachers".to_string(),
			"seniority based counselling".to_string(),
			"school staffing rules".to_string(),
		]))),
		Arc::new(OverlapCrossEncoder),
		Arc::new(CannedWebSearch { hits: Vec::new() }),
	)
}

/// Engine over the policy corpus with deterministic providers.
pub fn policy_engine() -> Engine {
	policy_engine_with(config(), deterministic_providers())
}

pub fn policy_engine_with(cfg: Config, providers: EngineProviders) -> Engine {
	Engine::with_providers(
		cfg,
		Arc::new(corpus::policy_corpus()),
		corpus::policy_clause_index(),
		providers,
	)
	.expect("test config is valid")
}

/// Engine whose collections exist but hold nothing.
pub fn empty_engine() -> Engine {
	let mut index = MemoryIndex::new();

	for collection in [corpus::LEGAL, corpus::GO, corpus::JUDICIAL, corpus::DATA, corpus::SCHEMES] {
		index.ensure_collection(collection);
	}

	Engine::with_providers(config(), Arc::new(index), ClauseIndex::default(), deterministic_providers())
		.expect("test config is valid")
}
