use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A chunk known to carry the full text of a cited clause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseEntry {
	pub chunk_id: String,
	pub collection: String,
}

/// Deterministic lookup from canonical citation keys (`section:12(1)(c)`,
/// `go:54`, `case:1234/2019`) to the chunks holding those clauses. Populated
/// once from the ingestion pipeline's output; read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct ClauseIndex {
	entries: HashMap<String, Vec<ClauseEntry>>,
}
impl ClauseIndex {
	pub fn from_entries<I>(entries: I) -> Self
	where
		I: IntoIterator<Item = (String, ClauseEntry)>,
	{
		let mut map: HashMap<String, Vec<ClauseEntry>> = HashMap::new();

		for (key, entry) in entries {
			let bucket = map.entry(key).or_default();

			if !bucket.contains(&entry) {
				bucket.push(entry);
			}
		}

		Self { entries: map }
	}

	pub fn lookup(&self, key: &str) -> &[ClauseEntry] {
		self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(chunk_id: &str) -> ClauseEntry {
		ClauseEntry { chunk_id: chunk_id.to_string(), collection: "legal_chunks".to_string() }
	}

	#[test]
	fn lookup_returns_all_entries_for_key() {
		let index = ClauseIndex::from_entries([
			("section:12".to_string(), entry("rte/s12/c0")),
			("section:12".to_string(), entry("rte/s12/c1")),
			("go:54".to_string(), entry("go/54/c0")),
		]);

		assert_eq!(index.lookup("section:12").len(), 2);
		assert_eq!(index.lookup("go:54").len(), 1);
		assert!(index.lookup("section:99").is_empty());
	}

	#[test]
	fn duplicate_entries_collapse() {
		let index = ClauseIndex::from_entries([
			("section:12".to_string(), entry("rte/s12/c0")),
			("section:12".to_string(), entry("rte/s12/c0")),
		]);

		assert_eq!(index.lookup("section:12").len(), 1);
	}
}
