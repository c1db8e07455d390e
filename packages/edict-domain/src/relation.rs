use serde::{Deserialize, Serialize};

/// Cross-document relationship kinds carried in chunk metadata and consulted
/// during relation-aware re-scoring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
	Amends,
	Supersedes,
	Implements,
	Cites,
}
impl RelationKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Amends => "amends",
			Self::Supersedes => "supersedes",
			Self::Implements => "implements",
			Self::Cites => "cites",
		}
	}
}

/// A directed edge in the document graph. Edges are plain value triples held
/// in chunk payloads; neighbor documents are fetched by id, never traversed
/// recursively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
	pub from_id: String,
	pub to_id: String,
	pub kind: RelationKind,
}
