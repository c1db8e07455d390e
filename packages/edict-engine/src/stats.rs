use std::{
	collections::{BTreeMap, VecDeque},
	sync::{
		Mutex,
		atomic::{AtomicU64, Ordering},
	},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

const SAMPLE_WINDOW: usize = 256;

/// Process-wide retrieval diagnostics: per-stage wall times, cache hit rate,
/// breaker trips. Updated under fine-grained locks; no retrieval stage ever
/// blocks on a snapshot.
#[derive(Debug, Default)]
pub struct StatsRegistry {
	stages: DashMap<&'static str, Mutex<StageWindow>>,
	cache_hits: AtomicU64,
	cache_misses: AtomicU64,
	breaker_trips: AtomicU64,
}

#[derive(Debug, Default)]
struct StageWindow {
	count: u64,
	total_ms: u64,
	samples: VecDeque<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
	pub count: u64,
	pub avg_ms: f64,
	pub p50_ms: u64,
	pub p95_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
	pub stages: BTreeMap<String, StageSnapshot>,
	pub cache_hit_rate: f64,
	pub breaker_trips: u64,
}

impl StatsRegistry {
	pub fn record_stage(&self, stage: &'static str, elapsed_ms: u64) {
		let entry = self.stages.entry(stage).or_default();
		let mut window = entry.lock().unwrap_or_else(|err| err.into_inner());

		window.count += 1;
		window.total_ms += elapsed_ms;
		window.samples.push_back(elapsed_ms);

		if window.samples.len() > SAMPLE_WINDOW {
			window.samples.pop_front();
		}
	}

	pub fn record_cache(&self, hit: bool) {
		if hit {
			self.cache_hits.fetch_add(1, Ordering::Relaxed);
		} else {
			self.cache_misses.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub fn record_breaker_trip(&self) {
		self.breaker_trips.fetch_add(1, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> StatsSnapshot {
		let mut stages = BTreeMap::new();

		for entry in self.stages.iter() {
			let window = entry.value().lock().unwrap_or_else(|err| err.into_inner());
			let mut sorted: Vec<u64> = window.samples.iter().copied().collect();

			sorted.sort_unstable();

			let avg_ms = if window.count == 0 {
				0.0
			} else {
				window.total_ms as f64 / window.count as f64
			};

			stages.insert(
				(*entry.key()).to_string(),
				StageSnapshot {
					count: window.count,
					avg_ms,
					p50_ms: percentile(&sorted, 50),
					p95_ms: percentile(&sorted, 95),
				},
			);
		}

		let hits = self.cache_hits.load(Ordering::Relaxed);
		let misses = self.cache_misses.load(Ordering::Relaxed);
		let lookups = hits + misses;
		let cache_hit_rate = if lookups == 0 { 0.0 } else { hits as f64 / lookups as f64 };

		StatsSnapshot {
			stages,
			cache_hit_rate,
			breaker_trips: self.breaker_trips.load(Ordering::Relaxed),
		}
	}
}

fn percentile(sorted: &[u64], pct: u64) -> u64 {
	if sorted.is_empty() {
		return 0;
	}

	let rank = (pct as usize * (sorted.len() - 1)).div_ceil(100);

	sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snapshot_reports_percentiles() {
		let stats = StatsRegistry::default();

		for ms in 1..=100 {
			stats.record_stage("retrieval", ms);
		}

		let snapshot = stats.snapshot();
		let stage = &snapshot.stages["retrieval"];

		assert_eq!(stage.count, 100);
		assert!(stage.p50_ms >= 49 && stage.p50_ms <= 51);
		assert!(stage.p95_ms >= 94 && stage.p95_ms <= 96);
	}

	#[test]
	fn cache_hit_rate_tracks_lookups() {
		let stats = StatsRegistry::default();

		stats.record_cache(true);
		stats.record_cache(false);
		stats.record_cache(false);
		stats.record_cache(false);

		assert!((stats.snapshot().cache_hit_rate - 0.25).abs() < f64::EPSILON);
	}

	#[test]
	fn empty_registry_snapshot_is_zeroed() {
		let snapshot = StatsRegistry::default().snapshot();

		assert!(snapshot.stages.is_empty());
		assert_eq!(snapshot.cache_hit_rate, 0.0);
	}
}
