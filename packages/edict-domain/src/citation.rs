use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bsection\s+(\d+[A-Z]?(?:\s*\(\s*\d+\s*\))*(?:\s*\(\s*[a-z]\s*\))*)")
		.expect("section pattern is valid")
});
static GO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bg\.?\s*o\.?\s*(?:(?:ms|rt)\.?\s*)?(?:no\.?\s*)?(\d+)\b")
		.expect("go pattern is valid")
});
static CASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)\bw\.?\s*p\.?\s*(?:no\.?\s*)?(\d+(?:\s*/\s*\d{4})?)")
		.expect("case pattern is valid")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
	Section,
	GoNumber,
	CaseNumber,
}

/// A legal-citation span recognized inside a query.
///
/// `text` is the span exactly as it appeared; `normalized` is the canonical
/// reference used for clause-index lookup and entity values, e.g.
/// `Section 12 (1) (c)` -> `12(1)(c)` and `G.O. Ms. No. 54` -> `54`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
	pub kind: CitationKind,
	pub text: String,
	pub normalized: String,
	pub start: usize,
	pub end: usize,
}

pub fn detect_citations(query: &str) -> Vec<Citation> {
	let mut out = Vec::new();

	for (kind, pattern) in [
		(CitationKind::Section, &*SECTION_PATTERN),
		(CitationKind::GoNumber, &*GO_PATTERN),
		(CitationKind::CaseNumber, &*CASE_PATTERN),
	] {
		for caps in pattern.captures_iter(query) {
			let whole = caps.get(0).expect("capture group zero always exists");
			let reference = caps.get(1).map(|m| m.as_str()).unwrap_or_default();

			out.push(Citation {
				kind,
				text: whole.as_str().to_string(),
				normalized: normalize_reference(reference),
				start: whole.start(),
				end: whole.end(),
			});
		}
	}

	out.sort_by_key(|citation| (citation.start, citation.end));
	out.dedup_by(|next, prev| next.start < prev.end);

	out
}

pub fn is_citation_query(query: &str) -> bool {
	!detect_citations(query).is_empty()
}

/// Canonical lookup key for the clause index: `section:12(1)(c)`, `go:54`,
/// `case:1234/2019`.
pub fn clause_key(citation: &Citation) -> String {
	let prefix = match citation.kind {
		CitationKind::Section => "section",
		CitationKind::GoNumber => "go",
		CitationKind::CaseNumber => "case",
	};

	format!("{prefix}:{}", citation.normalized)
}

fn normalize_reference(reference: &str) -> String {
	let mut out = String::with_capacity(reference.len());

	for ch in reference.chars() {
		if ch.is_whitespace() {
			continue;
		}

		out.push(ch.to_ascii_uppercase());
	}

	// Sub-clause letters stay lowercase: 12(1)(C) and 12(1)(c) are the same
	// clause in every source corpus.
	let mut normalized = String::with_capacity(out.len());
	let mut in_parens = false;

	for ch in out.chars() {
		match ch {
			'(' => {
				in_parens = true;

				normalized.push(ch);
			},
			')' => {
				in_parens = false;

				normalized.push(ch);
			},
			_ if in_parens => normalized.push(ch.to_ascii_lowercase()),
			_ => normalized.push(ch),
		}
	}

	normalized
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_section_with_subclauses() {
		let citations = detect_citations("What does Section 12 (1) (c) require?");

		assert_eq!(citations.len(), 1);
		assert_eq!(citations[0].kind, CitationKind::Section);
		assert_eq!(citations[0].normalized, "12(1)(c)");
	}

	#[test]
	fn detects_go_variants() {
		for query in ["GO 54 details", "G.O. Ms. No. 54 details", "g.o. rt 54"] {
			let citations = detect_citations(query);

			assert_eq!(citations.len(), 1, "query: {query}");
			assert_eq!(citations[0].kind, CitationKind::GoNumber);
			assert_eq!(citations[0].normalized, "54");
		}
	}

	#[test]
	fn detects_case_number_with_year() {
		let citations = detect_citations("status of W.P. No. 1234/2019");

		assert_eq!(citations.len(), 1);
		assert_eq!(citations[0].kind, CitationKind::CaseNumber);
		assert_eq!(citations[0].normalized, "1234/2019");
	}

	#[test]
	fn plain_query_has_no_citation() {
		assert!(!is_citation_query("teacher transfer rules in government schools"));
	}

	#[test]
	fn clause_key_is_prefixed() {
		let citations = detect_citations("Section 12");

		assert_eq!(clause_key(&citations[0]), "section:12");
	}
}
