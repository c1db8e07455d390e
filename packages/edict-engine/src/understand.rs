use std::sync::atomic::Ordering;

use crate::{Engine, deadline::Deadline, output::step, plan::Plan};
use edict_domain::{QueryInterpretation, interpret, lexicon};

/// Rewrites plus their keyword-expanded forms, in matching order. Expanded
/// text is what the hybrid executor actually searches with.
#[derive(Clone, Debug)]
pub struct Understanding {
	pub rewrites: Vec<String>,
	pub expanded: Vec<String>,
	pub steps: Vec<String>,
}

pub async fn run(
	engine: &Engine,
	normalized: &str,
	interpretation: &QueryInterpretation,
	plan: &Plan,
	deadline: Deadline,
) -> Understanding {
	let mut steps = Vec::new();
	let rewrites = produce_rewrites(engine, normalized, plan, deadline, &mut steps).await;
	let expanded = expand_rewrites(normalized, interpretation, plan, &rewrites, deadline);

	Understanding { rewrites, expanded, steps }
}

async fn produce_rewrites(
	engine: &Engine,
	normalized: &str,
	plan: &Plan,
	deadline: Deadline,
	steps: &mut Vec<String>,
) -> Vec<String> {
	let n = plan.rewrites.max(1);

	if n == 1 {
		return vec![normalized.to_string()];
	}
	if engine.rewriter_auth_denied.load(Ordering::Relaxed) {
		steps.push(step::REWRITER_FALLBACK.to_string());

		return lexicon::rule_rewrites(normalized, n);
	}

	let timeout = deadline.cap(engine.stage_timeout("rewrite"));
	let call = engine.providers.rewriter.rewrite(&engine.cfg.providers.rewriter, normalized, n - 1);

	match tokio::time::timeout(timeout, call).await {
		Ok(Ok(paraphrases)) => assemble_rewrites(normalized, paraphrases, n),
		Ok(Err(edict_providers::Error::Unauthorized { status })) => {
			engine.rewriter_auth_denied.store(true, Ordering::Relaxed);
			tracing::warn!(status, "Rewriter authorization denied; downgrading to rules for this process.");
			steps.push(step::REWRITER_AUTH_DENIED.to_string());

			lexicon::rule_rewrites(normalized, n)
		},
		Ok(Err(err)) => {
			tracing::warn!(error = %err, "Rewriter failed; using rule-based rewrites.");
			steps.push(step::REWRITER_FALLBACK.to_string());

			lexicon::rule_rewrites(normalized, n)
		},
		Err(_) => {
			tracing::warn!("Rewriter timed out; using rule-based rewrites.");
			steps.push(step::REWRITER_FALLBACK.to_string());

			lexicon::rule_rewrites(normalized, n)
		},
	}
}

/// The original normalized query is always rewrite #1. LLM paraphrases fill
/// the rest; rule variants top the list up if the LLM under-delivered.
fn assemble_rewrites(normalized: &str, paraphrases: Vec<String>, n: usize) -> Vec<String> {
	let mut out = vec![normalized.to_string()];

	for paraphrase in paraphrases {
		if out.len() >= n {
			break;
		}

		let trimmed = paraphrase.trim().to_string();

		if !trimmed.is_empty() && !out.contains(&trimmed) {
			out.push(trimmed);
		}
	}

	if out.len() < n {
		for variant in lexicon::rule_rewrites(normalized, n) {
			if out.len() >= n {
				break;
			}
			if !out.contains(&variant) {
				out.push(variant);
			}
		}
	}

	out
}

fn expand_rewrites(
	normalized: &str,
	interpretation: &QueryInterpretation,
	plan: &Plan,
	rewrites: &[String],
	deadline: Deadline,
) -> Vec<String> {
	if deadline.expired() || plan.expansion_keywords == 0 {
		return rewrites.to_vec();
	}

	let topics = interpret::dominant_topics(normalized, interpretation);

	rewrites
		.iter()
		.map(|rewrite| {
			let keywords = lexicon::expansion_keywords(rewrite, &topics, plan.expansion_keywords);

			if keywords.is_empty() {
				rewrite.clone()
			} else {
				format!("{rewrite} {}", keywords.join(" "))
			}
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn assemble_puts_original_first_and_dedups() {
		let rewrites = assemble_rewrites(
			"teacher transfer policy",
			vec!["teacher transfer policy".to_string(), "posting norms for teachers".to_string()],
			3,
		);

		assert_eq!(rewrites[0], "teacher transfer policy");
		assert_eq!(rewrites[1], "posting norms for teachers");
		assert_eq!(rewrites.len(), 3);
	}

	#[test]
	fn assemble_tops_up_from_rules() {
		let rewrites = assemble_rewrites("teacher transfer policy", Vec::new(), 4);

		assert_eq!(rewrites.len(), 4);
		assert_eq!(rewrites[0], "teacher transfer policy");
	}
}
