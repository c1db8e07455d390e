use std::collections::HashMap;

use edict_index::{
	BoxFuture, ChunkPayload, Error, FilterCond, IndexClient, IndexFilter, IndexHit, Result,
};

/// Deterministic in-memory index for tests: brute-force cosine for `knn`,
/// token-overlap scoring for `bm25`, full filter support. Results are sorted
/// by score with chunk id as tiebreak so identical inputs always produce
/// identical rankings.
#[derive(Clone, Debug, Default)]
pub struct MemoryIndex {
	collections: HashMap<String, Vec<ChunkPayload>>,
}
impl MemoryIndex {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, collection: &str, payload: ChunkPayload) {
		self.collections.entry(collection.to_string()).or_default().push(payload);
	}

	/// Registers a collection so lookups against it return empty results
	/// instead of a missing-collection error.
	pub fn ensure_collection(&mut self, collection: &str) {
		self.collections.entry(collection.to_string()).or_default();
	}

	pub fn chunk_count(&self, collection: &str) -> usize {
		self.collections.get(collection).map(Vec::len).unwrap_or(0)
	}

	fn chunks(&self, collection: &str) -> Result<&[ChunkPayload]> {
		self.collections
			.get(collection)
			.map(Vec::as_slice)
			.ok_or_else(|| Error::CollectionMissing { collection: collection.to_string() })
	}
}

impl IndexClient for MemoryIndex {
	fn knn<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let mut hits: Vec<IndexHit> = self
				.chunks(collection)?
				.iter()
				.filter(|payload| matches_filter(payload, filter))
				.filter_map(|payload| {
					let stored = payload.vector.as_ref()?;
					let score = cosine(vector, stored)?;

					Some(IndexHit {
						chunk_id: payload.chunk_id.clone(),
						score,
						payload: payload.clone(),
					})
				})
				.collect();

			sort_hits(&mut hits);
			hits.truncate(k);

			Ok(hits)
		})
	}

	fn bm25<'a>(
		&'a self,
		collection: &'a str,
		text: &'a str,
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>> {
		Box::pin(async move {
			let query_tokens = tokenize(text);
			let mut hits: Vec<IndexHit> = self
				.chunks(collection)?
				.iter()
				.filter(|payload| matches_filter(payload, filter))
				.filter_map(|payload| {
					let score = overlap_score(&query_tokens, &payload.text);

					(score > 0.0).then(|| IndexHit {
						chunk_id: payload.chunk_id.clone(),
						score,
						payload: payload.clone(),
					})
				})
				.collect();

			sort_hits(&mut hits);
			hits.truncate(k);

			Ok(hits)
		})
	}

	fn fetch_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a IndexFilter,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>> {
		Box::pin(async move {
			let mut out: Vec<ChunkPayload> = self
				.chunks(collection)?
				.iter()
				.filter(|payload| matches_filter(payload, Some(filter)))
				.cloned()
				.collect();

			out.sort_by(|lhs, rhs| lhs.chunk_id.cmp(&rhs.chunk_id));
			out.truncate(limit);

			Ok(out)
		})
	}

	fn get_by_ids<'a>(
		&'a self,
		collection: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>> {
		Box::pin(async move {
			let chunks = self.chunks(collection)?;
			let mut out = Vec::new();

			for id in ids {
				if let Some(payload) = chunks.iter().find(|payload| &payload.chunk_id == id) {
					out.push(payload.clone());
				}
			}

			Ok(out)
		})
	}
}

fn sort_hits(hits: &mut [IndexHit]) {
	hits.sort_by(|lhs, rhs| {
		rhs.score
			.partial_cmp(&lhs.score)
			.unwrap_or(std::cmp::Ordering::Equal)
			.then_with(|| lhs.chunk_id.cmp(&rhs.chunk_id))
	});
}

fn matches_filter(payload: &ChunkPayload, filter: Option<&IndexFilter>) -> bool {
	let Some(filter) = filter else { return true };

	filter.must.iter().all(|cond| match cond {
		FilterCond::Match { key, value } => field_value(payload, key)
			.map(|field| field.eq_ignore_ascii_case(value))
			.unwrap_or(false),
		FilterCond::Range { key, gte, lte } => numeric_field(payload, key)
			.map(|field| {
				gte.map(|bound| field >= bound).unwrap_or(true)
					&& lte.map(|bound| field <= bound).unwrap_or(true)
			})
			.unwrap_or(false),
	})
}

fn field_value(payload: &ChunkPayload, key: &str) -> Option<String> {
	match key {
		"chunk_id" => Some(payload.chunk_id.clone()),
		"doc_id" => Some(payload.doc_id.clone()),
		"vertical" => payload.vertical.map(|vertical| vertical.as_str().to_string()),
		"department" => payload.metadata.department.clone(),
		"go_number" => payload.metadata.go_number.clone(),
		"section_number" => payload.metadata.section_number.clone(),
		"case_number" => payload.metadata.case_number.clone(),
		"section_type" =>
			payload.metadata.section_type.as_ref().map(|value| value.as_str().to_string()),
		_ => payload.metadata.extras.get(key).and_then(|value| value.as_str().map(String::from)),
	}
}

fn numeric_field(payload: &ChunkPayload, key: &str) -> Option<i64> {
	match key {
		"date_issued_ts" => payload.metadata.date_issued_ts,
		"year" => payload.metadata.year.map(i64::from),
		_ => payload.metadata.extras.get(key).and_then(|value| value.as_i64()),
	}
}

pub fn tokenize(text: &str) -> Vec<String> {
	text.to_lowercase()
		.split_whitespace()
		.map(|token| {
			token
				.trim_matches(|ch: char| !ch.is_alphanumeric())
				.to_string()
		})
		.filter(|token| !token.is_empty())
		.collect()
}

fn overlap_score(query_tokens: &[String], text: &str) -> f32 {
	if query_tokens.is_empty() {
		return 0.0;
	}

	let text_tokens = tokenize(text);
	let mut score = 0.0;

	for token in query_tokens {
		let count = text_tokens.iter().filter(|candidate| *candidate == token).count();

		score += count as f32;
	}

	score
}

fn cosine(lhs: &[f32], rhs: &[f32]) -> Option<f32> {
	if lhs.is_empty() || lhs.len() != rhs.len() {
		return None;
	}

	let mut dot = 0.0_f32;
	let mut lhs_norm = 0.0_f32;
	let mut rhs_norm = 0.0_f32;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm <= f32::EPSILON || rhs_norm <= f32::EPSILON {
		return None;
	}

	Some(dot / (lhs_norm.sqrt() * rhs_norm.sqrt()))
}
