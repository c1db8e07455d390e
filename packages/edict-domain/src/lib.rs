pub mod citation;
pub mod evidence;
pub mod interpret;
pub mod lexicon;
pub mod normalize;
pub mod relation;

pub use self::{
	citation::{Citation, CitationKind, detect_citations, is_citation_query},
	evidence::{Evidence, EvidenceMetadata, RawScores, SectionType, Vertical},
	interpret::{EntityKind, Mode, QueryInterpretation, Scope, interpret},
	normalize::normalize_query,
	relation::{RelationEdge, RelationKind},
};
