use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::relation::RelationEdge;

/// A logical document collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vertical {
	Legal,
	Go,
	Judicial,
	Data,
	Schemes,
	Infrastructure,
	Internet,
}
impl Vertical {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Legal => "legal",
			Self::Go => "go",
			Self::Judicial => "judicial",
			Self::Data => "data",
			Self::Schemes => "schemes",
			Self::Infrastructure => "infrastructure",
			Self::Internet => "internet",
		}
	}
}

/// Structural role of a chunk within its source document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SectionType {
	Orders,
	Preamble,
	Annexure,
	Definitions,
	Other(String),
}
impl SectionType {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Orders => "orders",
			Self::Preamble => "preamble",
			Self::Annexure => "annexure",
			Self::Definitions => "definitions",
			Self::Other(label) => label.as_str(),
		}
	}
}

impl From<String> for SectionType {
	fn from(value: String) -> Self {
		match value.as_str() {
			"orders" => Self::Orders,
			"preamble" => Self::Preamble,
			"annexure" => Self::Annexure,
			"definitions" => Self::Definitions,
			_ => Self::Other(value),
		}
	}
}

impl From<SectionType> for String {
	fn from(value: SectionType) -> Self {
		value.as_str().to_string()
	}
}

/// Per-stage score audit trail. Append-only: the first value recorded under a
/// name wins, so a later stage can never rewrite an earlier stage's signal.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RawScores(BTreeMap<String, f32>);
impl RawScores {
	pub fn record(&mut self, name: &str, value: f32) {
		if self.0.contains_key(name) {
			tracing::debug!(name, value, "Ignoring re-record of existing raw score.");

			return;
		}

		self.0.insert(name.to_string(), value);
	}

	pub fn get(&self, name: &str) -> Option<f32> {
		self.0.get(name).copied()
	}

	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Keeps the per-name maximum across two audit trails. Used when the same
	/// chunk arrives from several rewrites or hops.
	pub fn merge_max(&mut self, other: &Self) {
		for (name, value) in &other.0 {
			self.0
				.entry(name.clone())
				.and_modify(|existing| *existing = existing.max(*value))
				.or_insert(*value);
		}
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
		self.0.iter().map(|(name, value)| (name.as_str(), *value))
	}
}

/// Typed chunk metadata. Known fields are strongly typed; anything else the
/// ingestion pipeline attached survives in `extras`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub section_type: Option<SectionType>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub section_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub go_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub case_number: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub date_issued_ts: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub year: Option<i32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub department: Option<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub entities: Vec<String>,
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub relations: Vec<RelationEdge>,
	#[serde(default)]
	pub is_superseded: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub superseded_by: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub source_url: Option<String>,
	#[serde(flatten)]
	pub extras: Map<String, Value>,
}

/// A retrieved passage, the retrieval atom flowing through every stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
	pub chunk_id: String,
	pub doc_id: String,
	pub vertical: Vertical,
	pub text: String,
	pub score: f32,
	#[serde(default)]
	pub raw_scores: RawScores,
	#[serde(default)]
	pub metadata: EvidenceMetadata,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn raw_scores_never_overwrite() {
		let mut scores = RawScores::default();

		scores.record("dense", 0.8);
		scores.record("dense", 0.1);

		assert_eq!(scores.get("dense"), Some(0.8));
	}

	#[test]
	fn raw_scores_merge_takes_max() {
		let mut lhs = RawScores::default();
		let mut rhs = RawScores::default();

		lhs.record("rrf", 0.02);
		rhs.record("rrf", 0.05);
		rhs.record("sparse", 3.1);
		lhs.merge_max(&rhs);

		assert_eq!(lhs.get("rrf"), Some(0.05));
		assert_eq!(lhs.get("sparse"), Some(3.1));
	}

	#[test]
	fn section_type_round_trips_unknown_labels() {
		let parsed: SectionType = serde_json::from_value(serde_json::json!("schedule"))
			.expect("section type decodes");

		assert_eq!(parsed, SectionType::Other("schedule".to_string()));
		assert_eq!(serde_json::to_value(&parsed).expect("encodes"), serde_json::json!("schedule"));
	}

	#[test]
	fn metadata_keeps_unknown_keys_in_extras() {
		let metadata: EvidenceMetadata = serde_json::from_value(serde_json::json!({
			"section_type": "orders",
			"go_number": "54",
			"page_span": [3, 7]
		}))
		.expect("metadata decodes");

		assert_eq!(metadata.section_type, Some(SectionType::Orders));
		assert_eq!(metadata.go_number.as_deref(), Some("54"));
		assert!(metadata.extras.contains_key("page_span"));
	}
}
