use std::time::{SystemTime, UNIX_EPOCH};

use edict_domain::{EvidenceMetadata, RelationEdge, RelationKind, SectionType, Vertical};
use edict_index::{ChunkPayload, ClauseEntry, ClauseIndex};

use crate::{memory_index::MemoryIndex, providers::embed_text};

pub const LEGAL: &str = "legal_chunks";
pub const GO: &str = "go_chunks";
pub const JUDICIAL: &str = "judicial_chunks";
pub const DATA: &str = "data_chunks";
pub const SCHEMES: &str = "schemes_chunks";

const DAY_SECS: i64 = 86_400;

fn now_ts() -> i64 {
	SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

struct ChunkSpec {
	collection: &'static str,
	chunk_id: &'static str,
	doc_id: &'static str,
	vertical: Vertical,
	text: &'static str,
	metadata: EvidenceMetadata,
}

fn chunk(spec: ChunkSpec) -> (String, ChunkPayload) {
	(
		spec.collection.to_string(),
		ChunkPayload {
			chunk_id: spec.chunk_id.to_string(),
			doc_id: spec.doc_id.to_string(),
			vertical: Some(spec.vertical),
			text: spec.text.to_string(),
			metadata: spec.metadata,
			vector: Some(embed_text(spec.text)),
		},
	)
}

fn edge(from: &str, to: &str, kind: RelationKind) -> RelationEdge {
	RelationEdge { from_id: from.to_string(), to_id: to.to_string(), kind }
}

/// A small but realistic policy-document corpus: legal sections, government
/// orders with a supersession chain, a ruling, statistics, and schemes. Every
/// chunk carries a vector from the same deterministic embedding the test
/// providers use.
pub fn policy_corpus() -> MemoryIndex {
	let now = now_ts();
	let recent = now - 90 * DAY_SECS;
	let recent_older = now - 200 * DAY_SECS;
	let stale = now - 3 * 365 * DAY_SECS;
	let mut index = MemoryIndex::new();

	for collection in [LEGAL, GO, JUDICIAL, DATA, SCHEMES] {
		index.ensure_collection(collection);
	}

	let chunks = vec![
		chunk(ChunkSpec {
			collection: LEGAL,
			chunk_id: "rte/s12/c0",
			doc_id: "rte/s12",
			vertical: Vertical::Legal,
			text: "Section 12 of the RTE Act mandates that private unaided schools reserve \
				twenty five percent of entry level seats for children from disadvantaged groups.",
			metadata: EvidenceMetadata {
				section_number: Some("12".to_string()),
				year: Some(2009),
				entities: vec!["12".to_string(), "rte act".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: LEGAL,
			chunk_id: "rte/s12/c1",
			doc_id: "rte/s12",
			vertical: Vertical::Legal,
			text: "Section 12 1 c of the RTE Act requires specified category schools to admit \
				children belonging to weaker sections up to twenty five percent of strength.",
			metadata: EvidenceMetadata {
				section_number: Some("12(1)(c)".to_string()),
				year: Some(2009),
				entities: vec!["12(1)(c)".to_string(), "rte act".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: LEGAL,
			chunk_id: "transfer-rules/c0",
			doc_id: "transfer-rules",
			vertical: Vertical::Legal,
			text: "The teacher transfer rules empower the school education department to regulate \
				transfer of teachers working in government schools through counselling.",
			metadata: EvidenceMetadata {
				entities: vec!["teacher transfer".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: GO,
			chunk_id: "go/54/c0",
			doc_id: "go/54",
			vertical: Vertical::Go,
			text: "G.O. Ms. No. 54 School Education Department orders web based counselling for \
				transfer of teachers in government schools and rationalization of posts.",
			metadata: EvidenceMetadata {
				section_type: Some(SectionType::Orders),
				go_number: Some("54".to_string()),
				date_issued_ts: Some(recent),
				department: Some("School Education".to_string()),
				entities: vec!["54".to_string(), "teacher transfer".to_string()],
				relations: vec![edge("go/54", "go/23", RelationKind::Supersedes)],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: GO,
			chunk_id: "go/54/c1",
			doc_id: "go/54",
			vertical: Vertical::Go,
			text: "In the references read above the government reviewed the teacher transfer \
				policy and decided to revise the counselling schedule.",
			metadata: EvidenceMetadata {
				section_type: Some(SectionType::Preamble),
				go_number: Some("54".to_string()),
				date_issued_ts: Some(recent),
				department: Some("School Education".to_string()),
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: GO,
			chunk_id: "go/23/c0",
			doc_id: "go/23",
			vertical: Vertical::Go,
			text: "G.O. Ms. No. 23 School Education Department issued earlier instructions on \
				transfer of teachers, since revised.",
			metadata: EvidenceMetadata {
				section_type: Some(SectionType::Orders),
				go_number: Some("23".to_string()),
				date_issued_ts: Some(recent_older),
				department: Some("School Education".to_string()),
				is_superseded: true,
				superseded_by: Some("go/54".to_string()),
				relations: vec![edge("go/54", "go/23", RelationKind::Supersedes)],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: GO,
			chunk_id: "go/88/c0",
			doc_id: "go/88",
			vertical: Vertical::Go,
			text: "G.O. Ms. No. 88 School Education Department sanctioned funds for the midday \
				meal scheme kitchen infrastructure.",
			metadata: EvidenceMetadata {
				section_type: Some(SectionType::Orders),
				go_number: Some("88".to_string()),
				date_issued_ts: Some(stale),
				department: Some("School Education".to_string()),
				entities: vec!["88".to_string(), "midday meal".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: JUDICIAL,
			chunk_id: "wp/1234-2019/c0",
			doc_id: "wp/1234-2019",
			vertical: Vertical::Judicial,
			text: "In W.P. No. 1234/2019 the High Court directed the school education department \
				to complete teacher transfer counselling within eight weeks.",
			metadata: EvidenceMetadata {
				case_number: Some("1234/2019".to_string()),
				year: Some(2019),
				entities: vec!["1234/2019".to_string(), "teacher transfer".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: DATA,
			chunk_id: "data/enrolment/c0",
			doc_id: "data/enrolment",
			vertical: Vertical::Data,
			text: "Enrolment statistics show the dropout rate declined after teacher transfer \
				rationalization and expansion of the midday meal scheme.",
			metadata: EvidenceMetadata {
				year: Some(2023),
				entities: vec!["dropout rate".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: SCHEMES,
			chunk_id: "schemes/midday/c0",
			doc_id: "schemes/midday",
			vertical: Vertical::Schemes,
			text: "The midday meal scheme provides hot cooked meals in government schools; the \
				guidelines assign supervision duties to the head teacher.",
			metadata: EvidenceMetadata {
				entities: vec!["midday meal".to_string()],
				..Default::default()
			},
		}),
		chunk(ChunkSpec {
			collection: SCHEMES,
			chunk_id: "schemes/nadunedu/c0",
			doc_id: "schemes/nadunedu",
			vertical: Vertical::Schemes,
			text: "The Nadu-Nedu programme upgrades school infrastructure facilities including \
				classrooms, toilets, and drinking water.",
			metadata: EvidenceMetadata {
				entities: vec!["nadu-nedu".to_string()],
				..Default::default()
			},
		}),
	];

	for (collection, payload) in chunks {
		index.insert(&collection, payload);
	}

	index
}

/// Clause index matching [`policy_corpus`]: Section 12 resolves to two
/// chunks (fast-path eligible), GO 54 to one (fast-path declined).
pub fn policy_clause_index() -> ClauseIndex {
	ClauseIndex::from_entries([
		(
			"section:12".to_string(),
			ClauseEntry { chunk_id: "rte/s12/c0".to_string(), collection: LEGAL.to_string() },
		),
		(
			"section:12".to_string(),
			ClauseEntry { chunk_id: "rte/s12/c1".to_string(), collection: LEGAL.to_string() },
		),
		(
			"section:12(1)(c)".to_string(),
			ClauseEntry { chunk_id: "rte/s12/c1".to_string(), collection: LEGAL.to_string() },
		),
		(
			"go:54".to_string(),
			ClauseEntry { chunk_id: "go/54/c0".to_string(), collection: GO.to_string() },
		),
		(
			"case:1234/2019".to_string(),
			ClauseEntry {
				chunk_id: "wp/1234-2019/c0".to_string(),
				collection: JUDICIAL.to_string(),
			},
		),
	])
}
