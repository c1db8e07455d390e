use std::collections::HashMap;

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub runtime: Runtime,
	pub cache: Cache,
	pub retrieval: Retrieval,
	pub rerank: Rerank,
	pub diversity: Diversity,
	pub internet: Internet,
	pub providers: Providers,
	pub index: Index,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Runtime {
	pub hard_margin_ms: u64,
	#[serde(default = "default_true")]
	pub include_superseded: bool,
	/// Opaque filter merged into every collection query. Keys are payload
	/// fields; values are exact matches.
	#[serde(default)]
	pub force_filter: HashMap<String, String>,
	pub max_workers: WorkerCounts,
	pub stage_timeouts: StageTimeouts,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkerCounts {
	pub qa: usize,
	pub compliance: usize,
	pub policy: usize,
	pub framework: usize,
	pub deepthink: usize,
	pub brainstorm: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct StageTimeouts {
	pub interpret_ms: u64,
	pub rewrite_ms: u64,
	pub expand_ms: u64,
	pub embed_ms: u64,
	pub dense_ms: u64,
	pub sparse_ms: u64,
	pub cross_encoder_ms: u64,
	pub relation_ms: u64,
	pub internet_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Cache {
	pub enabled: bool,
	pub ttl_qa_secs: u64,
	pub ttl_comprehensive_secs: u64,
	pub max_entries: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Retrieval {
	pub rrf_k: u32,
	pub section_boost: SectionBoost,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SectionBoost {
	pub orders: f32,
	pub preamble: f32,
	pub annexure: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Rerank {
	pub cross_encoder_top_m: CrossEncoderTopM,
	pub relation_entity: RelationEntity,
	pub breaker: Breaker,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CrossEncoderTopM {
	pub qa: usize,
	pub policy: usize,
	pub deepthink: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RelationEntity {
	pub enabled: bool,
	pub relation_scoring: bool,
	pub entity_matching: bool,
	pub entity_expansion: bool,
	#[serde(default)]
	pub bidirectional_currency: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Breaker {
	pub threshold: u32,
	pub comprehensive_threshold: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Diversity {
	pub mmr_lambda: f32,
	pub weights: DiversityWeights,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DiversityWeights {
	pub qa: f32,
	pub compliance: f32,
	pub policy: f32,
	pub framework: f32,
	pub deepthink: f32,
	pub brainstorm: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Internet {
	pub enabled: bool,
	pub max_results: usize,
	pub down_weight: f32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rewriter: LlmProviderConfig,
	pub cross_encoder: ProviderConfig,
	pub websearch: ProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub max_batch: usize,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Index {
	pub url: String,
	pub vector_dim: u32,
	pub collections: Collections,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Collections {
	pub legal: String,
	pub go: String,
	pub judicial: String,
	pub data: String,
	pub schemes: String,
}

fn default_true() -> bool {
	true
}
