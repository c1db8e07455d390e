use std::sync::atomic::{AtomicU32, Ordering};

/// Gates the expensive relation/entity stage when recent reranker stages have
/// been timing out. The counter rises on stage timeouts and decays by one on
/// every fully-successful coordinator run.
#[derive(Debug, Default)]
pub struct CircuitBreaker {
	recent_timeouts: AtomicU32,
}
impl CircuitBreaker {
	pub fn record_timeout(&self) -> u32 {
		self.recent_timeouts.fetch_add(1, Ordering::Relaxed) + 1
	}

	pub fn record_success(&self) {
		let _ = self.recent_timeouts.fetch_update(
			Ordering::Relaxed,
			Ordering::Relaxed,
			|current| current.checked_sub(1),
		);
	}

	pub fn recent_timeouts(&self) -> u32 {
		self.recent_timeouts.load(Ordering::Relaxed)
	}

	pub fn is_open(&self, threshold: u32) -> bool {
		self.recent_timeouts() >= threshold
	}
}
