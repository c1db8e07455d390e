use std::collections::HashMap;

use edict_domain::Evidence;

const CATEGORY_DEPTH: usize = 20;

/// Coarse category tags for the leading candidates, computed once per
/// coordinator run and reused by diversity selection and tracing. Pure
/// function of the top-N passages.
pub fn predict(candidates: &[Evidence]) -> HashMap<String, String> {
	let mut out = HashMap::new();

	for candidate in candidates.iter().take(CATEGORY_DEPTH) {
		out.insert(candidate.chunk_id.clone(), category_of(candidate));
	}

	out
}

pub fn category_of(candidate: &Evidence) -> String {
	match candidate.metadata.section_type.as_ref() {
		Some(section_type) =>
			format!("{}/{}", candidate.vertical.as_str(), section_type.as_str()),
		None => candidate.vertical.as_str().to_string(),
	}
}
