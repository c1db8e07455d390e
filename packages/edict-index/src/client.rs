use std::{future::Future, pin::Pin};

use serde::{Deserialize, Serialize};

use crate::Result;
use edict_domain::{EvidenceMetadata, Vertical};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Metadata predicate applied server-side by the index backend.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexFilter {
	pub must: Vec<FilterCond>,
}
impl IndexFilter {
	pub fn matching(key: &str, value: &str) -> Self {
		Self { must: vec![FilterCond::Match { key: key.to_string(), value: value.to_string() }] }
	}

	pub fn and_match(mut self, key: &str, value: &str) -> Self {
		self.must.push(FilterCond::Match { key: key.to_string(), value: value.to_string() });

		self
	}

	pub fn and_range(mut self, key: &str, gte: Option<i64>, lte: Option<i64>) -> Self {
		self.must.push(FilterCond::Range { key: key.to_string(), gte, lte });

		self
	}

	pub fn merge(mut self, other: &Self) -> Self {
		self.must.extend(other.must.iter().cloned());

		self
	}

	pub fn is_empty(&self) -> bool {
		self.must.is_empty()
	}

	/// Stable textual form used in cache keys and traces. Conditions are
	/// sorted so logically-equal filters produce identical keys.
	pub fn canonical_repr(&self) -> String {
		let mut parts: Vec<String> = self
			.must
			.iter()
			.map(|cond| match cond {
				FilterCond::Match { key, value } => format!("{key}={value}"),
				FilterCond::Range { key, gte, lte } => format!(
					"{key}:[{}..{}]",
					gte.map(|v| v.to_string()).unwrap_or_default(),
					lte.map(|v| v.to_string()).unwrap_or_default()
				),
			})
			.collect();

		parts.sort();

		parts.join("&")
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCond {
	Match { key: String, value: String },
	Range { key: String, gte: Option<i64>, lte: Option<i64> },
}

/// The stored form of a chunk, as the ingestion pipeline wrote it. `vector`
/// is populated only when the backend was asked to return vectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
	pub chunk_id: String,
	pub doc_id: String,
	pub vertical: Option<Vertical>,
	#[serde(default)]
	pub text: String,
	#[serde(default)]
	pub metadata: EvidenceMetadata,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub vector: Option<Vec<f32>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexHit {
	pub chunk_id: String,
	pub score: f32,
	pub payload: ChunkPayload,
}

/// The three index capabilities the engine consumes. Implementations must be
/// safe for concurrent use; the engine shares one client across all stages.
pub trait IndexClient
where
	Self: Send + Sync,
{
	fn knn<'a>(
		&'a self,
		collection: &'a str,
		vector: &'a [f32],
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>>;

	fn bm25<'a>(
		&'a self,
		collection: &'a str,
		text: &'a str,
		k: usize,
		filter: Option<&'a IndexFilter>,
	) -> BoxFuture<'a, Result<Vec<IndexHit>>>;

	fn fetch_by_filter<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a IndexFilter,
		limit: usize,
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>>;

	fn get_by_ids<'a>(
		&'a self,
		collection: &'a str,
		ids: &'a [String],
	) -> BoxFuture<'a, Result<Vec<ChunkPayload>>>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn canonical_repr_is_order_independent() {
		let lhs = IndexFilter::matching("vertical", "go").and_range("date_issued_ts", Some(10), None);
		let rhs = IndexFilter::default()
			.and_range("date_issued_ts", Some(10), None)
			.and_match("vertical", "go");

		assert_eq!(lhs.canonical_repr(), rhs.canonical_repr());
	}

	#[test]
	fn merge_keeps_both_sides() {
		let merged = IndexFilter::matching("vertical", "go")
			.merge(&IndexFilter::matching("department", "School Education"));

		assert_eq!(merged.must.len(), 2);
	}
}
