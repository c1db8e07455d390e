pub mod breaker;
pub mod cache;
pub mod hybrid;
pub mod internet;
pub mod output;
pub mod plan;
pub mod process;
pub mod rerank;
pub mod stats;
pub mod understand;

mod deadline;
mod error;

pub use self::{
	breaker::CircuitBreaker,
	cache::QueryCache,
	deadline::Deadline,
	error::{Error, Result, StageError},
	output::{RetrievalOutput, StageTimings, step},
	plan::{Overrides, Plan, build_plan},
	stats::{StatsRegistry, StatsSnapshot},
};
pub use edict_providers::Error as ProviderError;

use std::{
	future::Future,
	pin::Pin,
	sync::{Arc, atomic::AtomicBool},
	time::{Duration, Instant},
};

use dashmap::DashMap;
use time::OffsetDateTime;

use edict_config::Config;
use edict_domain::{
	Evidence, Mode, QueryInterpretation, citation, interpret, normalize_query,
};
use edict_index::{ClauseIndex, IndexClient};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

const MAX_QUERY_CHARS: usize = 2_000;
const EMBED_CACHE_CAPACITY: u64 = 4_096;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a edict_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<Vec<f32>>>>;
}

pub trait RewriteProvider
where
	Self: Send + Sync,
{
	fn rewrite<'a>(
		&'a self,
		cfg: &'a edict_config::LlmProviderConfig,
		query: &'a str,
		n: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<String>>>;
}

pub trait CrossEncoderProvider
where
	Self: Send + Sync,
{
	fn score<'a>(
		&'a self,
		cfg: &'a edict_config::ProviderConfig,
		query: &'a str,
		passages: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<f32>>>;
}

pub trait WebSearchProvider
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a edict_config::ProviderConfig,
		query: &'a str,
		max_results: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<edict_providers::websearch::WebHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rewriter: Arc<dyn RewriteProvider>,
	pub cross_encoder: Arc<dyn CrossEncoderProvider>,
	pub websearch: Arc<dyn WebSearchProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rewriter: Arc<dyn RewriteProvider>,
		cross_encoder: Arc<dyn CrossEncoderProvider>,
		websearch: Arc<dyn WebSearchProvider>,
	) -> Self {
		Self { embedding, rewriter, cross_encoder, websearch }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			embedding: provider.clone(),
			rewriter: provider.clone(),
			cross_encoder: provider.clone(),
			websearch: provider,
		}
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a edict_config::EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<Vec<f32>>>> {
		Box::pin(edict_providers::embedding::embed(cfg, texts))
	}
}

impl RewriteProvider for DefaultProviders {
	fn rewrite<'a>(
		&'a self,
		cfg: &'a edict_config::LlmProviderConfig,
		query: &'a str,
		n: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<String>>> {
		Box::pin(edict_providers::rewrite::rewrite(cfg, query, n))
	}
}

impl CrossEncoderProvider for DefaultProviders {
	fn score<'a>(
		&'a self,
		cfg: &'a edict_config::ProviderConfig,
		query: &'a str,
		passages: &'a [String],
	) -> BoxFuture<'a, ProviderResult<Vec<f32>>> {
		Box::pin(edict_providers::cross_encode::score(cfg, query, passages))
	}
}

impl WebSearchProvider for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a edict_config::ProviderConfig,
		query: &'a str,
		max_results: usize,
	) -> BoxFuture<'a, ProviderResult<Vec<edict_providers::websearch::WebHit>>> {
		Box::pin(edict_providers::websearch::search(cfg, query, max_results))
	}
}

/// The retrieval core. Owns every dependency's lifecycle; construction
/// captures all configuration, and no stage reads global state.
pub struct Engine {
	pub cfg: Config,
	pub(crate) index: Arc<dyn IndexClient>,
	pub(crate) clause: ClauseIndex,
	pub(crate) providers: Providers,
	pub(crate) cache: QueryCache,
	pub(crate) stats: StatsRegistry,
	pub(crate) breaker: CircuitBreaker,
	pub(crate) rewriter_auth_denied: AtomicBool,
	pub(crate) embed_cache: moka::sync::Cache<String, Arc<Vec<f32>>>,
	pub(crate) index_error_log: Arc<DashMap<String, ()>>,
}
impl Engine {
	pub fn new(cfg: Config, index: Arc<dyn IndexClient>, clause: ClauseIndex) -> Result<Self> {
		Self::with_providers(cfg, index, clause, Providers::default())
	}

	pub fn with_providers(
		cfg: Config,
		index: Arc<dyn IndexClient>,
		clause: ClauseIndex,
		providers: Providers,
	) -> Result<Self> {
		edict_config::validate(&cfg)
			.map_err(|err| Error::InvalidConfig { message: err.to_string() })?;

		let cache = QueryCache::new(if cfg.cache.enabled { cfg.cache.max_entries } else { 0 });

		Ok(Self {
			cfg,
			index,
			clause,
			providers,
			cache,
			stats: StatsRegistry::default(),
			breaker: CircuitBreaker::default(),
			rewriter_auth_denied: AtomicBool::new(false),
			embed_cache: moka::sync::Cache::new(EMBED_CACHE_CAPACITY),
			index_error_log: Arc::new(DashMap::new()),
		})
	}

	/// Primes the embedding path and cache structures. Index clients that can
	/// report collection health do so here rather than mid-query.
	pub async fn warmup(&self) -> Result<()> {
		let canary = vec!["warmup".to_string()];

		if let Err(err) = self.embed_batch(&canary, Deadline::after(Duration::from_secs(10))).await {
			tracing::warn!(error = %err, "Warmup embedding failed; continuing.");
		}

		Ok(())
	}

	pub fn teardown(&self) {
		self.cache.clear();
		self.embed_cache.invalidate_all();
	}

	pub fn stats_snapshot(&self) -> StatsSnapshot {
		self.stats.snapshot()
	}

	/// The single entry point: normalized query in, ranked evidence out.
	/// Per-stage failures never raise; only an invalid query or a broken
	/// internal invariant does.
	pub async fn retrieve(
		&self,
		query: &str,
		top_k: Option<usize>,
		overrides: Option<Overrides>,
	) -> Result<RetrievalOutput> {
		let started = Instant::now();
		let overrides = overrides.unwrap_or_default();
		let prepared = self.prepare(query, &overrides)?;

		if self.cfg.cache.enabled {
			if let Some(hit) = self.cache_lookup(&prepared.cache_key, started) {
				return Ok(hit);
			}

			self.stats.record_cache(false);

			// Request coalescing: one computation per key; waiters re-read.
			let lock = self.cache.lock_for(&prepared.cache_key);
			let _guard = lock.lock().await;

			if let Some(hit) = self.cache_lookup(&prepared.cache_key, started) {
				return Ok(hit);
			}

			let output = self.execute(&prepared, top_k, started).await?;

			if !output.partial {
				self.cache.insert(
					prepared.cache_key.clone(),
					output.clone(),
					self.ttl_for(output.plan.mode),
				);
			}

			return Ok(output);
		}

		self.execute(&prepared, top_k, started).await
	}

	/// Cache-free variant used by diagnostics and determinism tests.
	pub async fn retrieve_planned(
		&self,
		query: &str,
		top_k: Option<usize>,
		overrides: Option<Overrides>,
	) -> Result<RetrievalOutput> {
		let started = Instant::now();
		let overrides = overrides.unwrap_or_default();
		let prepared = self.prepare(query, &overrides)?;

		self.execute(&prepared, top_k, started).await
	}

	fn prepare(&self, query: &str, overrides: &Overrides) -> Result<PreparedQuery> {
		let trimmed = query.trim();

		if trimmed.is_empty() {
			return Err(Error::InvalidQuery { message: "Query is empty.".to_string() });
		}
		if trimmed.chars().count() > MAX_QUERY_CHARS {
			return Err(Error::InvalidQuery {
				message: format!("Query exceeds {MAX_QUERY_CHARS} characters."),
			});
		}

		let normalized = normalize_query(trimmed);
		let interpretation = interpret::interpret(&normalized);
		let now_ts = OffsetDateTime::now_utc().unix_timestamp();
		let plan = build_plan(&self.cfg, &interpretation, &normalized, overrides, now_ts);
		let filter_repr = plan
			.force_filter
			.as_ref()
			.map(|filter| filter.canonical_repr())
			.unwrap_or_default();
		let cache_key = QueryCache::key(&normalized, &filter_repr, plan.mode);

		Ok(PreparedQuery {
			query: trimmed.to_string(),
			normalized,
			interpretation,
			plan,
			cache_key,
		})
	}

	fn cache_lookup(&self, key: &str, started: Instant) -> Option<RetrievalOutput> {
		let mut hit = self.cache.get(key)?;

		self.stats.record_cache(true);

		// A hit does not re-run any stage; the published timings reflect
		// this call, not the original computation.
		hit.timings = StageTimings {
			total_ms: started.elapsed().as_millis() as u64,
			..Default::default()
		};
		hit.steps.push(step::CACHE_HIT.to_string());

		Some(hit)
	}

	async fn execute(
		&self,
		prepared: &PreparedQuery,
		top_k: Option<usize>,
		started: Instant,
	) -> Result<RetrievalOutput> {
		let plan = &prepared.plan;
		let deadline =
			Deadline::after(plan.timeout() + Duration::from_millis(self.cfg.runtime.hard_margin_ms));
		let mut steps = Vec::new();
		let mut timings = StageTimings::default();

		if let Some(output) =
			self.try_clause_fast_path(prepared, top_k, started, deadline).await?
		{
			return Ok(output);
		}

		let understanding_started = Instant::now();
		let understanding = understand::run(
			self,
			&prepared.normalized,
			&prepared.interpretation,
			plan,
			deadline,
		)
		.await;

		timings.understanding_ms = understanding_started.elapsed().as_millis() as u64;
		steps.extend(understanding.steps.iter().cloned());
		self.stats.record_stage("understanding", timings.understanding_ms);

		let retrieval_started = Instant::now();
		let internet_future = async {
			if plan.use_internet {
				internet::fetch(self, &prepared.normalized, deadline).await
			} else {
				(Vec::new(), Vec::new())
			}
		};
		let hybrid_future = hybrid::execute(
			self,
			plan,
			&prepared.interpretation,
			&understanding.expanded,
			deadline,
		);
		let (mut hybrid_result, (internet_evidence, internet_steps)) =
			tokio::join!(hybrid_future, internet_future);

		timings.retrieval_ms = retrieval_started.elapsed().as_millis() as u64;
		steps.extend(hybrid_result.steps.drain(..));
		steps.extend(internet_steps);
		self.stats.record_stage("retrieval", timings.retrieval_ms);

		let mut partial = hybrid_result.timed_out;
		let mut candidates = hybrid_result.candidates;

		candidates.extend(internet_evidence);

		let total_candidates = candidates.len();

		if total_candidates == 0 {
			steps.push(step::empty("hybrid_retrieval"));
		}

		let aggregation_started = Instant::now();
		let mut candidates = process::dedup(candidates);

		process::normalize_scores(&mut candidates);

		let candidates = process::apply_supersession(candidates, plan.include_superseded);
		let candidates = process::cap_for_rerank(candidates, plan.top_k_total);

		timings.aggregation_ms = aggregation_started.elapsed().as_millis() as u64;
		self.stats.record_stage("aggregation", timings.aggregation_ms);

		let reranking_started = Instant::now();
		let rerank_outcome = rerank::run(
			self,
			rerank::RerankContext {
				normalized: &prepared.normalized,
				interpretation: &prepared.interpretation,
				plan,
				vectors: &hybrid_result.vectors,
				deadline,
			},
			candidates,
		)
		.await;

		timings.reranking_ms = reranking_started.elapsed().as_millis() as u64;
		steps.extend(rerank_outcome.steps);
		self.stats.record_stage("reranking", timings.reranking_ms);

		let mut results = rerank_outcome.candidates;

		process::sort_by_score(&mut results);

		// Rerank stages may lift a superseded result back above an active
		// one; the supersession ordering is re-imposed on the final list.
		let mut results = process::apply_supersession(results, plan.include_superseded);

		results.truncate(top_k.unwrap_or(plan.top_k_total).min(plan.top_k_total));

		if results.is_empty() && total_candidates > 0 {
			steps.push(step::empty("reranking"));
		}
		if deadline.expired() {
			partial = true;
		}
		if partial {
			steps.push(step::HARD_TIMEOUT.to_string());
		}

		check_invariants(&results)?;

		timings.total_ms = started.elapsed().as_millis() as u64;
		self.stats.record_stage("total", timings.total_ms);
		tracing::debug!(
			final_count = results.len(),
			total_candidates,
			partial,
			"Retrieval complete."
		);

		Ok(RetrievalOutput {
			query: prepared.query.clone(),
			normalized_query: prepared.normalized.clone(),
			cache_hit: false,
			partial,
			interpretation: prepared.interpretation.clone(),
			plan: plan.clone(),
			rewrites: understanding.rewrites,
			verticals_searched: plan.verticals.clone(),
			results,
			total_candidates,
			final_count: 0,
			timings,
			steps,
		}
		.with_final_count())
	}

	/// Clause fast path: an exact-citation query with at least two clause
	/// index hits skips understanding, routing, and hybrid search entirely.
	async fn try_clause_fast_path(
		&self,
		prepared: &PreparedQuery,
		top_k: Option<usize>,
		started: Instant,
		deadline: Deadline,
	) -> Result<Option<RetrievalOutput>> {
		let citations = citation::detect_citations(&prepared.normalized);

		if citations.is_empty() {
			return Ok(None);
		}

		let exact_hits: usize = citations
			.iter()
			.map(|cite| self.clause.lookup(&citation::clause_key(cite)).len())
			.sum();

		if exact_hits < 2 {
			return Ok(None);
		}

		let retrieval_started = Instant::now();
		let evidence = self.clause_hits(&prepared.normalized).await;

		if evidence.len() < 2 {
			return Ok(None);
		}

		let mut timings = StageTimings::default();

		timings.retrieval_ms = retrieval_started.elapsed().as_millis() as u64;
		self.stats.record_stage("retrieval", timings.retrieval_ms);

		let steps = vec![step::CLAUSE_FAST_PATH.to_string()];
		let candidates =
			process::apply_supersession(evidence, prepared.plan.include_superseded);
		let reranking_started = Instant::now();
		let mut results = rerank::lightweight_rerank(
			self,
			&prepared.normalized,
			&prepared.interpretation,
			&prepared.plan,
			deadline,
			candidates,
		)
		.await;

		timings.reranking_ms = reranking_started.elapsed().as_millis() as u64;
		self.stats.record_stage("reranking", timings.reranking_ms);
		process::sort_by_score(&mut results);

		let mut results =
			process::apply_supersession(results, prepared.plan.include_superseded);

		results.truncate(top_k.unwrap_or(prepared.plan.top_k_total).min(prepared.plan.top_k_total));
		check_invariants(&results)?;

		timings.total_ms = started.elapsed().as_millis() as u64;
		self.stats.record_stage("total", timings.total_ms);

		let total_candidates = results.len();
		let verticals_searched = {
			let mut verticals: Vec<_> =
				results.iter().map(|candidate| candidate.vertical).collect();

			verticals.sort();
			verticals.dedup();

			verticals
		};

		Ok(Some(
			RetrievalOutput {
				query: prepared.query.clone(),
				normalized_query: prepared.normalized.clone(),
				cache_hit: false,
				partial: false,
				interpretation: prepared.interpretation.clone(),
				plan: prepared.plan.clone(),
				rewrites: vec![prepared.normalized.clone()],
				verticals_searched,
				results,
				total_candidates,
				final_count: 0,
				timings,
				steps,
			}
			.with_final_count(),
		))
	}

	/// Resolves every citation in the query through the clause index and
	/// fetches the referenced chunks. Scores seed in lookup order.
	pub(crate) async fn clause_hits(&self, normalized: &str) -> Vec<Evidence> {
		let citations = citation::detect_citations(normalized);
		let mut by_collection: Vec<(String, Vec<String>)> = Vec::new();

		for cite in &citations {
			for entry in self.clause.lookup(&citation::clause_key(cite)) {
				match by_collection
					.iter_mut()
					.find(|(collection, _)| *collection == entry.collection)
				{
					Some((_, ids)) =>
						if !ids.contains(&entry.chunk_id) {
							ids.push(entry.chunk_id.clone());
						},
					None => by_collection
						.push((entry.collection.clone(), vec![entry.chunk_id.clone()])),
				}
			}
		}

		let mut out = Vec::new();

		for (collection, ids) in by_collection {
			let payloads = match self.index.get_by_ids(&collection, &ids).await {
				Ok(payloads) => payloads,
				Err(err) => {
					if self.index_error_log.insert(collection.clone(), ()).is_none() {
						tracing::warn!(
							collection = collection.as_str(),
							error = %err,
							"Clause chunk fetch failed."
						);
					}

					continue;
				},
			};

			for payload in payloads {
				if out.iter().any(|existing: &Evidence| existing.chunk_id == payload.chunk_id) {
					continue;
				}

				let mut evidence = Evidence {
					chunk_id: payload.chunk_id.clone(),
					doc_id: payload.doc_id.clone(),
					vertical: payload.vertical.unwrap_or(edict_domain::Vertical::Legal),
					text: payload.text.clone(),
					score: 1.0 - 0.01 * out.len() as f32,
					raw_scores: Default::default(),
					metadata: payload.metadata.clone(),
				};

				evidence.raw_scores.record("clause", evidence.score);
				out.push(evidence);
			}
		}

		out
	}

	pub(crate) fn stage_timeout(&self, stage: &str) -> Duration {
		let timeouts = &self.cfg.runtime.stage_timeouts;
		let ms = match stage {
			"interpret" => timeouts.interpret_ms,
			"rewrite" => timeouts.rewrite_ms,
			"expand" => timeouts.expand_ms,
			"embed" => timeouts.embed_ms,
			"dense" => timeouts.dense_ms,
			"sparse" => timeouts.sparse_ms,
			"cross_encoder" => timeouts.cross_encoder_ms,
			"relation" => timeouts.relation_ms,
			"internet" => timeouts.internet_ms,
			_ => timeouts.dense_ms,
		};

		Duration::from_millis(ms)
	}

	/// Batch embedding through the in-memory LRU. Misses go to the provider
	/// in one batched call; widths are re-checked at this boundary.
	pub(crate) async fn embed_batch(
		&self,
		texts: &[String],
		deadline: Deadline,
	) -> std::result::Result<Vec<Vec<f32>>, StageError> {
		let mut out: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
		let mut misses: Vec<(usize, String)> = Vec::new();

		for (idx, text) in texts.iter().enumerate() {
			match self.embed_cache.get(text) {
				Some(vector) => out.push(Some(vector.as_ref().clone())),
				None => {
					out.push(None);
					misses.push((idx, text.clone()));
				},
			}
		}

		if !misses.is_empty() {
			let miss_texts: Vec<String> = misses.iter().map(|(_, text)| text.clone()).collect();
			let timeout = deadline.cap(self.stage_timeout("embed"));
			let call = self.providers.embedding.embed(&self.cfg.providers.embedding, &miss_texts);
			let vectors = match tokio::time::timeout(timeout, call).await {
				Ok(Ok(vectors)) => vectors,
				Ok(Err(err)) => return Err(StageError::from_provider("embedding", err)),
				Err(_) => return Err(StageError::DependencyTimeout { stage: "embedding" }),
			};

			if vectors.len() != misses.len() {
				return Err(StageError::Provider {
					message: "Embedding provider returned a mismatched vector count.".to_string(),
				});
			}

			for ((idx, text), vector) in misses.into_iter().zip(vectors) {
				if vector.len() != edict_config::VECTOR_DIM as usize {
					return Err(StageError::Provider {
						message: format!(
							"Embedding width {} violates the {}-dim contract.",
							vector.len(),
							edict_config::VECTOR_DIM
						),
					});
				}

				self.embed_cache.insert(text, Arc::new(vector.clone()));
				out[idx] = Some(vector);
			}
		}

		Ok(out.into_iter().map(|vector| vector.unwrap_or_default()).collect())
	}

	fn ttl_for(&self, mode: Mode) -> Duration {
		let secs = match mode {
			Mode::Qa | Mode::Compliance => self.cfg.cache.ttl_qa_secs,
			_ => self.cfg.cache.ttl_comprehensive_secs,
		};

		Duration::from_secs(secs)
	}
}

struct PreparedQuery {
	query: String,
	normalized: String,
	interpretation: QueryInterpretation,
	plan: Plan,
	cache_key: String,
}

impl RetrievalOutput {
	fn with_final_count(mut self) -> Self {
		self.final_count = self.results.len();

		self
	}
}

fn check_invariants(results: &[Evidence]) -> Result<()> {
	let mut seen = std::collections::HashSet::new();

	for candidate in results {
		if !seen.insert(candidate.chunk_id.as_str()) {
			return Err(Error::InvariantViolation {
				message: format!("Duplicate chunk id {} in results.", candidate.chunk_id),
			});
		}
	}

	for pair in results.windows(2) {
		if pair[1].score > pair[0].score {
			return Err(Error::InvariantViolation {
				message: "Results are not ordered by descending score.".to_string(),
			});
		}
	}

	Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
	use edict_config::*;

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
			cache: Cache {
				enabled: true,
				ttl_qa_secs: 600,
				ttl_comprehensive_secs: 1_800,
				max_entries: 256,
			},
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
					api_base: "http://localhost:9".to_string(),
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
					api_base: "http://localhost:9".to_string(),
					api_key: "test-key".to_string(),
					path: "/chat".to_string(),
					model: "test-llm".to_string(),
					temperature: 0.2,
					timeout_ms: 5_000,
					default_headers: Default::default(),
				},
				cross_encoder: ProviderConfig {
					provider_id: "test".to_string(),
					api_base: "http://localhost:9".to_string(),
					api_key: "test-key".to_string(),
					path: "/rerank".to_string(),
					model: "test-ce".to_string(),
					timeout_ms: 3_000,
					default_headers: Default::default(),
				},
				websearch: ProviderConfig {
					provider_id: "test".to_string(),
					api_base: "http://localhost:9".to_string(),
					api_key: "test-key".to_string(),
					path: "/search".to_string(),
					model: "test-web".to_string(),
					timeout_ms: 10_000,
					default_headers: Default::default(),
				},
			},
			index: Index {
				url: "http://localhost:6334".to_string(),
				vector_dim: 768,
				collections: Collections {
					legal: "legal_chunks".to_string(),
					go: "go_chunks".to_string(),
					judicial: "judicial_chunks".to_string(),
					data: "data_chunks".to_string(),
					schemes: "schemes_chunks".to_string(),
				},
			},
		}
	}
}
