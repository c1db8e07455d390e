mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Breaker, Cache, Collections, Config, CrossEncoderTopM, Diversity, DiversityWeights,
	EmbeddingProviderConfig, Index, Internet, LlmProviderConfig, ProviderConfig, Providers,
	Rerank, RelationEntity, Retrieval, Runtime, SectionBoost, StageTimeouts, WorkerCounts,
};

use std::{fs, path::Path};

/// The embedding contract is fixed at 768 dimensions; other widths indicate a
/// mis-deployed backend and are rejected up front.
pub const VECTOR_DIM: u32 = 768;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	validate_runtime(cfg)?;
	validate_cache(cfg)?;
	validate_retrieval(cfg)?;
	validate_rerank(cfg)?;
	validate_diversity(cfg)?;
	validate_internet(cfg)?;
	validate_providers(cfg)?;
	validate_index(cfg)?;

	Ok(())
}

fn validate_runtime(cfg: &Config) -> Result<()> {
	if cfg.runtime.hard_margin_ms == 0 {
		return Err(Error::Validation {
			message: "runtime.hard_margin_ms must be greater than zero.".to_string(),
		});
	}

	for (path, count) in [
		("runtime.max_workers.qa", cfg.runtime.max_workers.qa),
		("runtime.max_workers.compliance", cfg.runtime.max_workers.compliance),
		("runtime.max_workers.policy", cfg.runtime.max_workers.policy),
		("runtime.max_workers.framework", cfg.runtime.max_workers.framework),
		("runtime.max_workers.deepthink", cfg.runtime.max_workers.deepthink),
		("runtime.max_workers.brainstorm", cfg.runtime.max_workers.brainstorm),
	] {
		if count == 0 {
			return Err(Error::Validation { message: format!("{path} must be greater than zero.") });
		}
	}

	let timeouts = &cfg.runtime.stage_timeouts;

	for (path, value) in [
		("runtime.stage_timeouts.interpret_ms", timeouts.interpret_ms),
		("runtime.stage_timeouts.rewrite_ms", timeouts.rewrite_ms),
		("runtime.stage_timeouts.expand_ms", timeouts.expand_ms),
		("runtime.stage_timeouts.embed_ms", timeouts.embed_ms),
		("runtime.stage_timeouts.dense_ms", timeouts.dense_ms),
		("runtime.stage_timeouts.sparse_ms", timeouts.sparse_ms),
		("runtime.stage_timeouts.cross_encoder_ms", timeouts.cross_encoder_ms),
		("runtime.stage_timeouts.relation_ms", timeouts.relation_ms),
		("runtime.stage_timeouts.internet_ms", timeouts.internet_ms),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{path} must be greater than zero.") });
		}
	}

	Ok(())
}

fn validate_cache(cfg: &Config) -> Result<()> {
	if cfg.cache.ttl_qa_secs == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_qa_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.ttl_comprehensive_secs == 0 {
		return Err(Error::Validation {
			message: "cache.ttl_comprehensive_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.cache.enabled && cfg.cache.max_entries == 0 {
		return Err(Error::Validation {
			message: "cache.max_entries must be greater than zero when the cache is enabled."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_retrieval(cfg: &Config) -> Result<()> {
	if cfg.retrieval.rrf_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.rrf_k must be greater than zero.".to_string(),
		});
	}

	for (path, value) in [
		("retrieval.section_boost.orders", cfg.retrieval.section_boost.orders),
		("retrieval.section_boost.preamble", cfg.retrieval.section_boost.preamble),
		("retrieval.section_boost.annexure", cfg.retrieval.section_boost.annexure),
	] {
		if !value.is_finite() || value <= 0.0 {
			return Err(Error::Validation {
				message: format!("{path} must be a positive finite number."),
			});
		}
	}

	Ok(())
}

fn validate_rerank(cfg: &Config) -> Result<()> {
	for (path, value) in [
		("rerank.cross_encoder_top_m.qa", cfg.rerank.cross_encoder_top_m.qa),
		("rerank.cross_encoder_top_m.policy", cfg.rerank.cross_encoder_top_m.policy),
		("rerank.cross_encoder_top_m.deepthink", cfg.rerank.cross_encoder_top_m.deepthink),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{path} must be greater than zero.") });
		}
	}
	if cfg.rerank.breaker.threshold == 0 {
		return Err(Error::Validation {
			message: "rerank.breaker.threshold must be greater than zero.".to_string(),
		});
	}
	if cfg.rerank.breaker.comprehensive_threshold < cfg.rerank.breaker.threshold {
		return Err(Error::Validation {
			message: "rerank.breaker.comprehensive_threshold must be at least rerank.breaker.threshold."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_diversity(cfg: &Config) -> Result<()> {
	if !cfg.diversity.mmr_lambda.is_finite() || !(0.0..=1.0).contains(&cfg.diversity.mmr_lambda) {
		return Err(Error::Validation {
			message: "diversity.mmr_lambda must be in the range 0.0-1.0.".to_string(),
		});
	}

	for (path, value) in [
		("diversity.weights.qa", cfg.diversity.weights.qa),
		("diversity.weights.compliance", cfg.diversity.weights.compliance),
		("diversity.weights.policy", cfg.diversity.weights.policy),
		("diversity.weights.framework", cfg.diversity.weights.framework),
		("diversity.weights.deepthink", cfg.diversity.weights.deepthink),
		("diversity.weights.brainstorm", cfg.diversity.weights.brainstorm),
	] {
		if !value.is_finite() || !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{path} must be in the range 0.0-1.0."),
			});
		}
	}

	Ok(())
}

fn validate_internet(cfg: &Config) -> Result<()> {
	if cfg.internet.enabled && cfg.internet.max_results == 0 {
		return Err(Error::Validation {
			message: "internet.max_results must be greater than zero when internet is enabled."
				.to_string(),
		});
	}
	if !cfg.internet.down_weight.is_finite() || !(0.0..=1.0).contains(&cfg.internet.down_weight) {
		return Err(Error::Validation {
			message: "internet.down_weight must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

fn validate_providers(cfg: &Config) -> Result<()> {
	if cfg.providers.embedding.dimensions != VECTOR_DIM {
		return Err(Error::Validation {
			message: format!("providers.embedding.dimensions must be {VECTOR_DIM}."),
		});
	}
	if cfg.providers.embedding.max_batch == 0 || cfg.providers.embedding.max_batch > 64 {
		return Err(Error::Validation {
			message: "providers.embedding.max_batch must be in the range 1-64.".to_string(),
		});
	}

	Ok(())
}

fn validate_index(cfg: &Config) -> Result<()> {
	if cfg.index.vector_dim != VECTOR_DIM {
		return Err(Error::Validation {
			message: format!("index.vector_dim must be {VECTOR_DIM}."),
		});
	}

	for (path, name) in [
		("index.collections.legal", &cfg.index.collections.legal),
		("index.collections.go", &cfg.index.collections.go),
		("index.collections.judicial", &cfg.index.collections.judicial),
		("index.collections.data", &cfg.index.collections.data),
		("index.collections.schemes", &cfg.index.collections.schemes),
	] {
		if name.trim().is_empty() {
			return Err(Error::Validation { message: format!("{path} must be non-empty.") });
		}
	}

	Ok(())
}
