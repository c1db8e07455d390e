use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use edict_engine::{
	BoxFuture, CrossEncoderProvider, EmbeddingProvider, ProviderError, ProviderResult,
	RewriteProvider, WebSearchProvider,
};
use edict_providers::websearch::WebHit;

use crate::memory_index::tokenize;

const DIM: usize = 768;

/// Deterministic bag-of-words embedding: every token hashes to a dimension.
/// Shared by the test embedding provider and the corpus builder so query and
/// document vectors live in the same space.
pub fn embed_text(text: &str) -> Vec<f32> {
	let mut vec = vec![0.0_f32; DIM];

	for token in tokenize(text) {
		let mut hash: u64 = 1469598103934665603;

		for byte in token.bytes() {
			hash ^= byte as u64;
			hash = hash.wrapping_mul(1099511628211);
		}

		vec[(hash % DIM as u64) as usize] += 1.0;
	}

	let norm = vec.iter().map(|value| value * value).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in vec.iter_mut() {
			*value /= norm;
		}
	}

	vec
}

pub struct HashEmbedding;
impl EmbeddingProvider for HashEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a edict_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<Vec<f32>>>> {
		Box::pin(async move { Ok(texts.iter().map(|text| embed_text(text)).collect()) })
	}
}

/// Embedding provider that sleeps long enough to blow any small deadline.
pub struct SlowEmbedding {
	pub delay: Duration,
}
impl EmbeddingProvider for SlowEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a edict_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<Vec<f32>>>> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(texts.iter().map(|text| embed_text(text)).collect())
		})
	}
}

#[derive(Clone, Debug)]
pub enum RewriterScript {
	Paraphrases(Vec<String>),
	Unauthorized,
	Refused,
	Slow(Duration),
}

/// Scripted rewriter that counts invocations, for asserting the permanent
/// auth downgrade.
pub struct ScriptedRewriter {
	script: RewriterScript,
	calls: Arc<AtomicUsize>,
}
impl ScriptedRewriter {
	pub fn new(script: RewriterScript) -> Self {
		Self { script, calls: Arc::new(AtomicUsize::new(0)) }
	}

	pub fn call_counter(&self) -> Arc<AtomicUsize> {
		self.calls.clone()
	}
}
impl RewriteProvider for ScriptedRewriter {
	fn rewrite<'a>(
		&'a self,
		_cfg: &'a edict_config::LlmProviderConfig,
		query: &'a str,
		n: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<String>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			match &self.script {
				RewriterScript::Paraphrases(list) =>
					Ok(list.iter().take(n).cloned().collect()),
				RewriterScript::Unauthorized => Err(ProviderError::Unauthorized { status: 403 }),
				RewriterScript::Refused =>
					Err(ProviderError::Refused { message: "declined".to_string() }),
				RewriterScript::Slow(delay) => {
					tokio::time::sleep(*delay).await;

					Ok(vec![format!("{query} rephrased")])
				},
			}
		})
	}
}

/// Token-overlap relevance: deterministic stand-in for a cross-encoder.
pub struct OverlapCrossEncoder;
impl CrossEncoderProvider for OverlapCrossEncoder {
	fn score<'a>(
		&'a self,
		_cfg: &'a edict_config::ProviderConfig,
		query: &'a str,
		passages: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<f32>>> {
		Box::pin(async move {
			let query_tokens = tokenize(query);
			let scores = passages
				.iter()
				.map(|passage| {
					if query_tokens.is_empty() {
						return 0.0;
					}

					let passage_tokens = tokenize(passage);
					let overlap = query_tokens
						.iter()
						.filter(|token| passage_tokens.contains(token))
						.count();

					overlap as f32 / query_tokens.len() as f32
				})
				.collect();

			Ok(scores)
		})
	}
}

/// Cross-encoder that always sleeps past its timeout; used to trip the
/// circuit breaker.
pub struct StallingCrossEncoder {
	pub delay: Duration,
}
impl CrossEncoderProvider for StallingCrossEncoder {
	fn score<'a>(
		&'a self,
		_cfg: &'a edict_config::ProviderConfig,
		_query: &'a str,
		passages: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<f32>>> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(vec![0.0; passages.len()])
		})
	}
}

pub struct CannedWebSearch {
	pub hits: Vec<WebHit>,
}
impl WebSearchProvider for CannedWebSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a edict_config::ProviderConfig,
		_query: &'a str,
		max_results: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<WebHit>>> {
		Box::pin(async move { Ok(self.hits.iter().take(max_results).cloned().collect()) })
	}
}

pub struct FailingWebSearch;
impl WebSearchProvider for FailingWebSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a edict_config::ProviderConfig,
		_query: &'a str,
		_max_results: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<WebHit>>> {
		Box::pin(async move { Err(ProviderError::Http { status: 502 }) })
	}
}
