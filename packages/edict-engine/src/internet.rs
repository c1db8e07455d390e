use crate::{Engine, deadline::Deadline, output::step};
use edict_domain::{Evidence, EvidenceMetadata, Vertical};
use edict_providers::websearch::WebHit;

/// Runs the web search bounded by its stage timeout and maps hits into
/// evidence. Failures contribute zero results and a trace step, never an
/// error.
pub async fn fetch(engine: &Engine, query: &str, deadline: Deadline) -> (Vec<Evidence>, Vec<String>) {
	let timeout = deadline.cap(engine.stage_timeout("internet"));
	let call = engine.providers.websearch.search(
		&engine.cfg.providers.websearch,
		query,
		engine.cfg.internet.max_results,
	);

	match tokio::time::timeout(timeout, call).await {
		Ok(Ok(hits)) => (to_evidence(hits), Vec::new()),
		Ok(Err(err)) => {
			tracing::warn!(error = %err, "Web search failed; continuing without internet evidence.");

			(Vec::new(), vec![step::INTERNET_FAILED.to_string()])
		},
		Err(_) => {
			tracing::warn!("Web search timed out; continuing without internet evidence.");

			(Vec::new(), vec![step::INTERNET_FAILED.to_string()])
		},
	}
}

/// `score = 0.85 - 0.05 * rank`, floor 0. Internet evidence competes with
/// index evidence on equal footing from here on.
pub fn to_evidence(hits: Vec<WebHit>) -> Vec<Evidence> {
	hits.into_iter()
		.map(|hit| {
			let metadata =
				EvidenceMetadata { source_url: Some(hit.url.clone()), ..Default::default() };
			let text = if hit.snippet.is_empty() {
				hit.title.clone()
			} else if hit.title.is_empty() {
				hit.snippet.clone()
			} else {
				format!("{}: {}", hit.title, hit.snippet)
			};

			Evidence {
				chunk_id: format!("web:{}", hit.url),
				doc_id: hit.url,
				vertical: Vertical::Internet,
				text,
				score: (0.85 - 0.05 * hit.rank as f32).max(0.0),
				raw_scores: Default::default(),
				metadata,
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scores_decay_with_rank() {
		let hits = vec![
			WebHit { title: "a".into(), url: "https://a".into(), snippet: "".into(), rank: 0 },
			WebHit { title: "b".into(), url: "https://b".into(), snippet: "sb".into(), rank: 1 },
		];
		let evidence = to_evidence(hits);

		assert!((evidence[0].score - 0.85).abs() < 1e-6);
		assert!((evidence[1].score - 0.80).abs() < 1e-6);
		assert_eq!(evidence[0].vertical, Vertical::Internet);
		assert_eq!(evidence[1].metadata.source_url.as_deref(), Some("https://b"));
	}
}
