use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result, embedding::check_status};

/// Joint `(query, passage)` relevance scoring. Scores come back aligned to
/// the input passage order; missing indices default to 0.0.
pub async fn score(
	cfg: &edict_config::ProviderConfig,
	query: &str,
	passages: &[String],
) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "query": query, "documents": passages });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = check_status(res)?.json().await?;

	parse_score_response(json, passages.len())
}

fn parse_score_response(json: Value, passage_count: usize) -> Result<Vec<f32>> {
	let mut scores = vec![0.0_f32; passage_count];
	let results = json
		.get("results")
		.or_else(|| json.get("data"))
		.and_then(|v| v.as_array())
		.ok_or_else(|| Error::InvalidResponse {
			message: "Cross-encoder response is missing results array.".to_string(),
		})?;

	for item in results {
		let index = item.get("index").and_then(|v| v.as_u64()).ok_or_else(|| {
			Error::InvalidResponse { message: "Cross-encoder result missing index.".to_string() }
		})? as usize;
		let score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Cross-encoder result missing score.".to_string(),
			})? as f32;

		if index < scores.len() {
			scores[index] = score;
		}
	}

	Ok(scores)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn aligns_scores_by_index() {
		let json = serde_json::json!({
			"results": [
				{ "index": 1, "relevance_score": 0.2 },
				{ "index": 0, "relevance_score": 0.9 }
			]
		});
		let scores = parse_score_response(json, 2).expect("parse failed");

		assert_eq!(scores, vec![0.9, 0.2]);
	}
}
