//! Fixed domain vocabulary for the education-policy corpus: synonym clusters
//! for rule-based query rewriting, keyword clusters for recall expansion, and
//! the entity word lists the interpreter leans on.

pub const STOPWORDS: &[&str] = &[
	"a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "how", "in", "is", "it", "of",
	"on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "which", "who", "why",
	"will", "with",
];

/// Head word -> interchangeable phrasings. Order matters: the rule rewriter
/// walks clusters deterministically.
pub const SYNONYM_CLUSTERS: &[(&str, &[&str])] = &[
	("teacher", &["educator", "teaching staff"]),
	("transfer", &["reassignment", "posting"]),
	("policy", &["guidelines", "regulation"]),
	("school", &["institution", "educational institution"]),
	("student", &["pupil", "learner"]),
	("admission", &["enrolment", "intake"]),
	("scheme", &["programme", "welfare scheme"]),
	("order", &["directive", "proceedings"]),
	("rule", &["provision", "norm"]),
	("fund", &["grant", "allocation"]),
	("exam", &["examination", "assessment"]),
	("salary", &["pay", "remuneration"]),
	("infrastructure", &["facilities", "amenities"]),
	("compliance", &["adherence", "conformity"]),
];

/// Topic -> expansion keywords appended to rewrites. Topics are selected from
/// detected entity kinds and the query's dominant nouns.
pub const KEYWORD_CLUSTERS: &[(&str, &[&str])] = &[
	("legal", &["statute", "provision", "act", "clause", "amendment"]),
	("go", &["government order", "memo", "proceedings", "circular", "notification"]),
	("judicial", &["judgment", "writ petition", "high court", "ruling", "direction"]),
	("data", &["statistics", "enrolment", "dropout rate", "indicator", "survey"]),
	("schemes", &["welfare scheme", "beneficiary", "eligibility", "implementation", "coverage"]),
	("teacher", &["transfer counselling", "seniority", "vacancy", "rationalization", "deputation"]),
	("school", &["recognition", "infrastructure norms", "pupil teacher ratio", "academic calendar"]),
	("finance", &["budget", "sanction", "expenditure", "utilization certificate"]),
	("exam", &["board examination", "evaluation", "results", "pass percentage"]),
];

pub const ACT_NAMES: &[&str] = &[
	"rte act",
	"right to education act",
	"right of children to free and compulsory education act",
	"education act",
	"ncte act",
	"apprentices act",
];

pub const DEPARTMENTS: &[&str] = &[
	"school education",
	"higher education",
	"finance",
	"health",
	"revenue",
	"panchayat raj",
	"women and child welfare",
	"tribal welfare",
	"municipal administration",
];

pub const SCHEME_MARKERS: &[&str] = &[
	"midday meal",
	"mid-day meal",
	"scholarship",
	"amma vodi",
	"nadu-nedu",
	"sarva shiksha abhiyan",
	"samagra shiksha",
	"vidya deevena",
	"fee reimbursement",
];

pub const METRIC_MARKERS: &[&str] = &[
	"rate", "ratio", "percentage", "statistics", "enrolment", "enrollment", "dropout", "literacy",
	"count", "number of", "how many", "data",
];

const GENERIC_SUFFIXES: &[&str] = &["guidelines", "overview", "key provisions", "in detail"];

/// Deterministic rule-based rewriter used when the LLM path is unavailable.
/// The original query is always rewrite #1; variants substitute one synonym
/// cluster at a time, in cluster order, until `n` rewrites exist. Always
/// returns exactly `n` rewrites (generic suffix variants pad the tail when
/// the vocabulary offers too few substitutions).
pub fn rule_rewrites(query: &str, n: usize) -> Vec<String> {
	let mut out = vec![query.to_string()];

	if n <= 1 {
		return out;
	}

	for (head, alternates) in SYNONYM_CLUSTERS {
		if out.len() >= n {
			break;
		}
		if !contains_word(query, head) {
			continue;
		}

		for alternate in *alternates {
			if out.len() >= n {
				break;
			}

			let variant = replace_word(query, head, alternate);

			if !out.contains(&variant) {
				out.push(variant);
			}
		}
	}

	// Morphological fallback keeps the count honest for vocabulary-poor
	// queries: plural/singular flips still shift sparse matching. Citation
	// spans are never touched.
	if out.len() < n {
		let citations = crate::citation::detect_citations(query);

		for word in query.split_whitespace() {
			if out.len() >= n {
				break;
			}
			if word.len() < 5 || STOPWORDS.contains(&word) {
				continue;
			}
			if citations
				.iter()
				.any(|cite| cite.text.split_whitespace().any(|token| token == word))
			{
				continue;
			}

			let variant = if let Some(stem) = word.strip_suffix('s') {
				replace_word(query, word, stem)
			} else {
				replace_word(query, word, &format!("{word}s"))
			};

			if !out.contains(&variant) {
				out.push(variant);
			}
		}
	}

	for suffix in GENERIC_SUFFIXES {
		if out.len() >= n {
			break;
		}

		let variant = format!("{query} {suffix}");

		if !out.contains(&variant) {
			out.push(variant);
		}
	}

	out.truncate(n);

	out
}

/// Expansion keywords for a rewrite: up to `k` terms drawn from the clusters
/// matching the given topics, deduplicated against the query's own words.
pub fn expansion_keywords(query: &str, topics: &[&str], k: usize) -> Vec<String> {
	let mut out = Vec::new();

	for (topic, keywords) in KEYWORD_CLUSTERS {
		if !topics.contains(topic) {
			continue;
		}

		for keyword in *keywords {
			if out.len() >= k {
				return out;
			}
			if contains_word(query, keyword) {
				continue;
			}
			if !out.iter().any(|existing: &String| existing == keyword) {
				out.push(keyword.to_string());
			}
		}
	}

	out
}

fn contains_word(text: &str, word: &str) -> bool {
	text.split_whitespace().any(|token| token.trim_matches(|ch: char| !ch.is_alphanumeric()) == word)
		|| (word.contains(' ') && text.contains(word))
}

fn replace_word(text: &str, from: &str, to: &str) -> String {
	let mut out = Vec::new();

	for token in text.split_whitespace() {
		if token.trim_matches(|ch: char| !ch.is_alphanumeric()) == from {
			out.push(token.replace(from, to));
		} else {
			out.push(token.to_string());
		}
	}

	out.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn original_is_always_first() {
		let rewrites = rule_rewrites("teacher transfer policy", 3);

		assert_eq!(rewrites[0], "teacher transfer policy");
		assert_eq!(rewrites.len(), 3);
	}

	#[test]
	fn rewrites_are_deterministic() {
		let first = rule_rewrites("teacher transfer policy in schools", 5);
		let second = rule_rewrites("teacher transfer policy in schools", 5);

		assert_eq!(first, second);
	}

	#[test]
	fn rewrites_substitute_synonyms() {
		let rewrites = rule_rewrites("teacher transfer policy", 4);

		assert!(rewrites.contains(&"educator transfer policy".to_string()));
	}

	#[test]
	fn pads_to_exact_count_for_sparse_vocabulary() {
		let rewrites = rule_rewrites("xyzzy", 5);

		assert_eq!(rewrites.len(), 5);
		assert_eq!(rewrites[0], "xyzzy");
	}

	#[test]
	fn expansion_skips_terms_already_present() {
		let keywords = expansion_keywords("statute of limitations", &["legal"], 3);

		assert!(!keywords.contains(&"statute".to_string()));
		assert_eq!(keywords.len(), 3);
	}

	#[test]
	fn expansion_respects_budget() {
		let keywords = expansion_keywords("query", &["legal", "go", "schemes"], 4);

		assert_eq!(keywords.len(), 4);
	}
}
