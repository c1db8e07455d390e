use std::{
	sync::Arc,
	time::{Duration, Instant},
};

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::output::RetrievalOutput;
use edict_domain::Mode;

/// Mode-aware TTL cache of completed retrievals, with per-key coalescing so
/// two identical in-flight queries do the work once. Readers either see a
/// fully-formed output or nothing; entries never escape their TTL window.
#[derive(Debug, Default)]
pub struct QueryCache {
	entries: DashMap<String, CacheEntry>,
	locks: DashMap<String, Arc<Mutex<()>>>,
	max_entries: usize,
}

#[derive(Debug)]
struct CacheEntry {
	output: RetrievalOutput,
	expires_at: Instant,
}

impl QueryCache {
	pub fn new(max_entries: usize) -> Self {
		Self { entries: DashMap::new(), locks: DashMap::new(), max_entries }
	}

	pub fn key(normalized_query: &str, filter_repr: &str, mode: Mode) -> String {
		format!("{}|{}|{}", normalized_query, filter_repr, mode.as_str())
	}

	/// The coalescing lock for a key. The engine holds this across
	/// miss-compute-store so a concurrent identical query waits and then
	/// re-reads instead of recomputing.
	pub fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
		self.locks.entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
	}

	pub fn get(&self, key: &str) -> Option<RetrievalOutput> {
		let entry = self.entries.get(key)?;

		if entry.expires_at <= Instant::now() {
			drop(entry);
			self.entries.remove(key);

			return None;
		}

		let mut output = entry.output.clone();

		output.cache_hit = true;

		Some(output)
	}

	pub fn insert(&self, key: String, output: RetrievalOutput, ttl: Duration) {
		if self.max_entries == 0 {
			return;
		}

		if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
			self.evict_one();
		}

		self.entries.insert(key, CacheEntry { output, expires_at: Instant::now() + ttl });
	}

	pub fn clear(&self) {
		self.entries.clear();
		self.locks.clear();
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	fn evict_one(&self) {
		let victim = self
			.entries
			.iter()
			.min_by_key(|entry| entry.expires_at)
			.map(|entry| entry.key().clone());

		if let Some(key) = victim {
			self.entries.remove(&key);
			self.locks.remove(&key);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::plan::Plan;
	use edict_domain::interpret;

	fn dummy_output(query: &str) -> RetrievalOutput {
		let interpretation = interpret(query);
		let plan = Plan::for_tests(Mode::Qa);

		RetrievalOutput {
			query: query.to_string(),
			normalized_query: query.to_string(),
			cache_hit: false,
			partial: false,
			interpretation,
			plan,
			rewrites: vec![query.to_string()],
			verticals_searched: Vec::new(),
			results: Vec::new(),
			total_candidates: 0,
			final_count: 0,
			timings: Default::default(),
			steps: Vec::new(),
		}
	}

	#[test]
	fn hit_marks_cache_flag() {
		let cache = QueryCache::new(4);
		let key = QueryCache::key("q", "", Mode::Qa);

		cache.insert(key.clone(), dummy_output("q"), Duration::from_secs(60));

		let hit = cache.get(&key).expect("entry cached");

		assert!(hit.cache_hit);
	}

	#[test]
	fn expired_entries_are_invisible() {
		let cache = QueryCache::new(4);
		let key = QueryCache::key("q", "", Mode::Qa);

		cache.insert(key.clone(), dummy_output("q"), Duration::ZERO);

		assert!(cache.get(&key).is_none());
		assert!(cache.is_empty());
	}

	#[test]
	fn capacity_evicts_soonest_expiry() {
		let cache = QueryCache::new(2);

		cache.insert("a".to_string(), dummy_output("a"), Duration::from_secs(1));
		cache.insert("b".to_string(), dummy_output("b"), Duration::from_secs(600));
		cache.insert("c".to_string(), dummy_output("c"), Duration::from_secs(600));

		assert_eq!(cache.len(), 2);
		assert!(cache.get("a").is_none());
		assert!(cache.get("b").is_some());
	}

	#[test]
	fn key_distinguishes_mode_and_filter() {
		let base = QueryCache::key("q", "", Mode::Qa);

		assert_ne!(base, QueryCache::key("q", "", Mode::Policy));
		assert_ne!(base, QueryCache::key("q", "vertical=go", Mode::Qa));
	}
}
