use serde::{Deserialize, Serialize};

use crate::plan::Plan;
use edict_domain::{Evidence, QueryInterpretation, Vertical};

/// Stable trace-step labels. Tests and downstream synthesis key off these.
pub mod step {
	pub const CACHE_HIT: &str = "cache_hit";
	pub const CLAUSE_FAST_PATH: &str = "clause_fast_path";
	pub const CLAUSE_FALLBACK: &str = "clause_fallback";
	pub const REWRITER_FALLBACK: &str = "rewriter_fallback";
	pub const REWRITER_AUTH_DENIED: &str = "rewriter_auth_denied";
	pub const RELATION_ENTITY_FORCED: &str = "relation_entity:enabled(forced)";
	pub const RELATION_ENTITY_SKIPPED_BREAKER: &str = "relation_entity_skipped:circuit_breaker";
	pub const RELATION_ENTITY_SKIPPED_QA: &str = "relation_entity_skipped:qa_fast_path";
	pub const HOP_SKIPPED_HIGH_CONFIDENCE: &str = "hop_skipped:high_confidence";
	pub const HOP_SKIPPED_LOW_YIELD: &str = "hop_skipped:low_yield";
	pub const INTERNET_FAILED: &str = "internet_failed";
	pub const HARD_TIMEOUT: &str = "hard_timeout";

	pub fn empty(stage: &str) -> String {
		format!("empty:{stage}")
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTimings {
	pub understanding_ms: u64,
	pub retrieval_ms: u64,
	pub aggregation_ms: u64,
	pub reranking_ms: u64,
	pub total_ms: u64,
}

/// The engine's single output boundary: ranked evidence plus the processing
/// trace downstream answer synthesis consumes. Immutable once published.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOutput {
	pub query: String,
	pub normalized_query: String,
	pub cache_hit: bool,
	#[serde(default)]
	pub partial: bool,
	pub interpretation: QueryInterpretation,
	pub plan: Plan,
	pub rewrites: Vec<String>,
	pub verticals_searched: Vec<Vertical>,
	pub results: Vec<Evidence>,
	pub total_candidates: usize,
	pub final_count: usize,
	pub timings: StageTimings,
	pub steps: Vec<String>,
}
