use unicode_normalization::UnicodeNormalization;

use crate::citation::detect_citations;

/// Canonicalizes a raw user query for caching, interpretation, and retrieval.
///
/// NFC-composes, lowercases, strips control characters, and collapses runs of
/// whitespace. Spans that match a legal-citation pattern are carried through
/// verbatim so `Section 12(1)(c)` and `W.P. No. 1234/2019` survive with their
/// original casing and punctuation. Idempotent: normalizing a normalized
/// query is a no-op.
pub fn normalize_query(query: &str) -> String {
	let citations = detect_citations(query);
	let mut out = String::with_capacity(query.len());
	let mut cursor = 0;

	for citation in &citations {
		normalize_segment(&query[cursor..citation.start], &mut out);
		push_collapsed(&citation.text, &mut out);

		cursor = citation.end;
	}

	normalize_segment(&query[cursor..], &mut out);

	out.trim().to_string()
}

fn normalize_segment(segment: &str, out: &mut String) {
	let composed: String = segment.nfc().collect();
	let cleaned: String = composed.chars().filter(|ch| !ch.is_control()).collect();

	for ch in cleaned.chars() {
		if ch.is_whitespace() {
			if !out.ends_with(' ') && !out.is_empty() {
				out.push(' ');
			}

			continue;
		}

		out.extend(ch.to_lowercase());
	}
}

fn push_collapsed(text: &str, out: &mut String) {
	for ch in text.chars() {
		if ch.is_whitespace() {
			if !out.ends_with(' ') && !out.is_empty() {
				out.push(' ');
			}

			continue;
		}

		out.push(ch);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_and_collapses() {
		assert_eq!(
			normalize_query("  Teacher   TRANSFER\t\tpolicy "),
			"teacher transfer policy"
		);
	}

	#[test]
	fn preserves_citation_spans() {
		assert_eq!(
			normalize_query("What is Section 12(1)(c) of the RTE Act?"),
			"what is Section 12(1)(c) of the rte act?"
		);
	}

	#[test]
	fn strips_control_characters() {
		assert_eq!(normalize_query("hello\u{0000}\u{0007} world"), "hello world");
	}

	#[test]
	fn double_normalization_is_identity() {
		for query in [
			"What is Section 12?",
			"  Recent   GOs from School Education DEPARTMENT ",
			"Analyze W.P. No. 1234/2019 comprehensively",
			"caf\u{00e9} polici\u{0065}\u{0301}s",
		] {
			let once = normalize_query(query);
			let twice = normalize_query(&once);

			assert_eq!(once, twice, "query: {query}");
		}
	}
}
