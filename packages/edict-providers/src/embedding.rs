use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds a batch of texts, splitting into provider-sized sub-batches.
/// Vectors come back in input order and are checked against the configured
/// width before anything downstream sees them.
pub async fn embed(
	cfg: &edict_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let mut out = Vec::with_capacity(texts.len());

	for batch in texts.chunks(cfg.max_batch.max(1)) {
		let body = serde_json::json!({
			"model": cfg.model,
			"input": batch,
			"dimensions": cfg.dimensions,
		});
		let res = client
			.post(&url)
			.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
			.json(&body)
			.send()
			.await?;
		let json: Value = check_status(res)?.json().await?;
		let vectors = parse_embedding_response(json, cfg.dimensions as usize)?;

		if vectors.len() != batch.len() {
			return Err(Error::InvalidResponse {
				message: "Embedding response count does not match batch size.".to_string(),
			});
		}

		out.extend(vectors);
	}

	Ok(out)
}

pub(crate) fn check_status(res: reqwest::Response) -> Result<reqwest::Response> {
	let status = res.status();

	if status.as_u16() == 401 || status.as_u16() == 403 {
		return Err(Error::Unauthorized { status: status.as_u16() });
	}
	if !status.is_success() {
		return Err(Error::Http { status: status.as_u16() });
	}

	Ok(res)
}

fn parse_embedding_response(json: Value, dimensions: usize) -> Result<Vec<Vec<f32>>> {
	let data = json.get("data").and_then(|v| v.as_array()).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());

	for (fallback_index, item) in data.iter().enumerate() {
		let index = item
			.get("index")
			.and_then(|v| v.as_u64())
			.map(|v| v as usize)
			.unwrap_or(fallback_index);
		let embedding = item.get("embedding").and_then(|v| v.as_array()).ok_or_else(|| {
			Error::InvalidResponse { message: "Embedding item missing embedding array.".to_string() }
		})?;

		if embedding.len() != dimensions {
			return Err(Error::InvalidResponse {
				message: format!(
					"Embedding width {} does not match the {dimensions}-dim contract.",
					embedding.len()
				),
			});
		}

		let mut vec = Vec::with_capacity(embedding.len());

		for value in embedding {
			let number = value.as_f64().ok_or_else(|| Error::InvalidResponse {
				message: "Embedding value must be numeric.".to_string(),
			})?;

			vec.push(number as f32);
		}

		indexed.push((index, vec));
	}

	indexed.sort_by_key(|(index, _)| *index);

	Ok(indexed.into_iter().map(|(_, vec)| vec).collect())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_embeddings_in_index_order() {
		let json = serde_json::json!({
			"data": [
				{ "index": 1, "embedding": [2.0, 3.0] },
				{ "index": 0, "embedding": [0.5, 1.5] }
			]
		});
		let parsed = parse_embedding_response(json, 2).expect("parse failed");

		assert_eq!(parsed.len(), 2);
		assert_eq!(parsed[0], vec![0.5, 1.5]);
		assert_eq!(parsed[1], vec![2.0, 3.0]);
	}

	#[test]
	fn rejects_wrong_width() {
		let json = serde_json::json!({
			"data": [{ "index": 0, "embedding": [1.0, 2.0, 3.0] }]
		});

		assert!(matches!(
			parse_embedding_response(json, 2),
			Err(Error::InvalidResponse { .. })
		));
	}
}
