use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Result, embedding::check_status};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebHit {
	pub title: String,
	pub url: String,
	pub snippet: String,
	pub rank: usize,
}

/// Live web search. Tolerant of the common result shapes (`results`,
/// `organic`, `items`); entries missing a url are dropped.
pub async fn search(
	cfg: &edict_config::ProviderConfig,
	query: &str,
	max_results: usize,
) -> Result<Vec<WebHit>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "q": query, "num": max_results });
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = check_status(res)?.json().await?;

	Ok(parse_search_response(json, max_results))
}

fn parse_search_response(json: Value, max_results: usize) -> Vec<WebHit> {
	let entries = json
		.get("results")
		.or_else(|| json.get("organic"))
		.or_else(|| json.get("items"))
		.and_then(|v| v.as_array())
		.cloned()
		.unwrap_or_default();
	let mut out = Vec::new();

	for entry in entries {
		if out.len() >= max_results {
			break;
		}

		let Some(url) = entry.get("url").or_else(|| entry.get("link")).and_then(|v| v.as_str())
		else {
			continue;
		};
		let title =
			entry.get("title").and_then(|v| v.as_str()).unwrap_or_default().to_string();
		let snippet = entry
			.get("snippet")
			.or_else(|| entry.get("description"))
			.and_then(|v| v.as_str())
			.unwrap_or_default()
			.to_string();

		out.push(WebHit { title, url: url.to_string(), snippet, rank: out.len() });
	}

	out
}
