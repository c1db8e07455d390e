use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, embedding::check_status};

static NUMBERING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*(?:\d+[\.\)]|[-*•])\s*").expect("numbering pattern is valid")
});

/// Asks the LLM for up to `n` paraphrases of `query`. The response may be a
/// JSON object `{"queries": [...]}` or a numbered plain-text list; either way
/// numbering and preamble lines are stripped. Refusals and empty outputs
/// surface as [`Error::Refused`] so the caller can fall back to rules.
pub async fn rewrite(
	cfg: &edict_config::LlmProviderConfig,
	query: &str,
	n: usize,
) -> Result<Vec<String>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": build_rewrite_messages(query, n),
	});
	let res = client
		.post(&url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = check_status(res)?.json().await?;
	let content = extract_content(&json)?;
	let rewrites = parse_rewrites(&content, n);

	if rewrites.is_empty() {
		return Err(Error::Refused { message: "Rewriter returned no usable paraphrases.".to_string() });
	}

	Ok(rewrites)
}

fn build_rewrite_messages(query: &str, n: usize) -> Vec<Value> {
	let system_prompt = "You are a query paraphrasing engine for a policy-document retrieval \
		system. Return ONLY a JSON object of the form {\"queries\": [\"...\"]}. Each entry is a \
		distinct rephrasing of the user's query that preserves every legal citation, number, and \
		named entity exactly. No explanations.";
	let user_prompt = format!("Produce {n} paraphrases of this query:\n{query}");

	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

fn extract_content(json: &Value) -> Result<String> {
	let refusal = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("refusal"))
		.and_then(|r| r.as_str());

	if let Some(reason) = refusal {
		return Err(Error::Refused { message: reason.to_string() });
	}

	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
		.map(|c| c.to_string())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Rewriter response is missing message content.".to_string(),
		})
}

fn parse_rewrites(content: &str, n: usize) -> Vec<String> {
	let mut out = Vec::new();

	if let Ok(value) = serde_json::from_str::<Value>(content)
		&& let Some(queries) = value.get("queries").and_then(|v| v.as_array())
	{
		for query in queries {
			if let Some(text) = query.as_str() {
				push_rewrite(&mut out, text, n);
			}
		}

		return out;
	}

	for line in content.lines() {
		let stripped = NUMBERING_PATTERN.replace(line, "");
		let trimmed = stripped.trim();

		// Preamble chatter ("Here are 3 paraphrases:") ends with a colon.
		if trimmed.is_empty() || trimmed.ends_with(':') {
			continue;
		}

		push_rewrite(&mut out, trimmed, n);
	}

	out
}

fn push_rewrite(out: &mut Vec<String>, text: &str, n: usize) {
	if out.len() >= n {
		return;
	}

	let candidate = text.trim().trim_matches('"').to_string();

	if !candidate.is_empty() && !out.contains(&candidate) {
		out.push(candidate);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_json_queries() {
		let rewrites = parse_rewrites(r#"{"queries": ["one", "two", "three"]}"#, 2);

		assert_eq!(rewrites, vec!["one".to_string(), "two".to_string()]);
	}

	#[test]
	fn strips_numbering_and_preamble() {
		let content = "Here are the paraphrases:\n1. teacher posting rules\n2) transfer norms\n- seniority order";
		let rewrites = parse_rewrites(content, 5);

		assert_eq!(
			rewrites,
			vec![
				"teacher posting rules".to_string(),
				"transfer norms".to_string(),
				"seniority order".to_string()
			]
		);
	}

	#[test]
	fn refusal_field_is_surfaced() {
		let json = serde_json::json!({
			"choices": [{ "message": { "refusal": "cannot comply" } }]
		});

		assert!(matches!(extract_content(&json), Err(Error::Refused { .. })));
	}
}
