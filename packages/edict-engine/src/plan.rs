use std::time::Duration;

use serde::{Deserialize, Serialize};

use edict_config::Config;
use edict_domain::{EntityKind, Mode, QueryInterpretation, Scope, Vertical, lexicon};
use edict_index::IndexFilter;

const EIGHTEEN_MONTHS_SECS: i64 = 18 * 30 * 86_400;

/// Caller-supplied knobs for a single retrieval. `mode` wins over the
/// interpreter's detection; `use_internet` is still subject to the master
/// switch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Overrides {
	pub mode: Option<Mode>,
	pub use_internet: Option<bool>,
	pub include_superseded: Option<bool>,
	pub force_filter: Option<IndexFilter>,
	pub timeout_ms: Option<u64>,
}

/// Deterministic execution parameters for one query, derived from
/// `(mode, scope, entities)` plus config. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	pub mode: Mode,
	pub rewrites: usize,
	pub hops: usize,
	pub top_k_per_vertical: usize,
	pub top_k_total: usize,
	pub rerank_top_k: usize,
	pub use_mmr: bool,
	pub diversity_weight: f32,
	pub timeout_ms: u64,
	pub expansion_keywords: usize,
	pub verticals: Vec<Vertical>,
	pub collections: Vec<String>,
	pub use_internet: bool,
	pub include_superseded: bool,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub force_filter: Option<IndexFilter>,
}
impl Plan {
	pub fn timeout(&self) -> Duration {
		Duration::from_millis(self.timeout_ms)
	}

	/// A minimal plan for unit tests that do not exercise routing.
	pub fn for_tests(mode: Mode) -> Self {
		Self {
			mode,
			rewrites: 1,
			hops: 1,
			top_k_per_vertical: 10,
			top_k_total: 10,
			rerank_top_k: 10,
			use_mmr: false,
			diversity_weight: 0.0,
			timeout_ms: 2_000,
			expansion_keywords: 3,
			verticals: vec![Vertical::Legal],
			collections: vec!["legal_chunks".to_string()],
			use_internet: false,
			include_superseded: true,
			force_filter: None,
		}
	}
}

/// Pure routing + planning. `now_ts` feeds the recent-GO auto-filter so the
/// function stays deterministic under test.
pub fn build_plan(
	cfg: &Config,
	interpretation: &QueryInterpretation,
	normalized: &str,
	overrides: &Overrides,
	now_ts: i64,
) -> Plan {
	let mode = overrides.mode.unwrap_or(interpretation.r#type);
	let shape = mode_shape(mode, interpretation.scope);
	let verticals = select_verticals(mode, interpretation, normalized);
	let collections = verticals
		.iter()
		.map(|vertical| collection_name(cfg, *vertical).to_string())
		.collect();
	let use_internet = cfg.internet.enabled
		&& (overrides.use_internet.unwrap_or(false)
			|| interpretation.needs_internet
			|| mode == Mode::Brainstorm);
	let force_filter = build_force_filter(cfg, interpretation, normalized, overrides, now_ts);

	Plan {
		mode,
		rewrites: shape.rewrites,
		hops: shape.hops,
		top_k_per_vertical: shape.top_k_per_vertical,
		top_k_total: shape.top_k_total,
		rerank_top_k: shape.rerank_top_k,
		use_mmr: shape.use_mmr,
		diversity_weight: diversity_weight(cfg, mode),
		timeout_ms: overrides.timeout_ms.unwrap_or(shape.timeout_ms),
		expansion_keywords: shape.expansion_keywords,
		verticals,
		collections,
		use_internet,
		include_superseded: overrides
			.include_superseded
			.unwrap_or(cfg.runtime.include_superseded),
		force_filter,
	}
}

struct ModeShape {
	rewrites: usize,
	hops: usize,
	top_k_per_vertical: usize,
	top_k_total: usize,
	rerank_top_k: usize,
	use_mmr: bool,
	timeout_ms: u64,
	expansion_keywords: usize,
}

fn mode_shape(mode: Mode, scope: Scope) -> ModeShape {
	match mode {
		Mode::Qa => ModeShape {
			rewrites: if scope == Scope::Narrow { 1 } else { 2 },
			hops: 1,
			top_k_per_vertical: 20,
			top_k_total: 40,
			rerank_top_k: 10,
			use_mmr: false,
			timeout_ms: 2_000,
			expansion_keywords: 3,
		},
		Mode::Policy => ModeShape {
			rewrites: 3,
			hops: 2,
			top_k_per_vertical: 30,
			top_k_total: 60,
			rerank_top_k: 25,
			use_mmr: false,
			timeout_ms: 8_000,
			expansion_keywords: 8,
		},
		Mode::Framework => ModeShape {
			rewrites: 5,
			hops: 2,
			top_k_per_vertical: 40,
			top_k_total: 100,
			rerank_top_k: 30,
			use_mmr: false,
			timeout_ms: 10_000,
			expansion_keywords: 8,
		},
		Mode::Deepthink => ModeShape {
			rewrites: 5,
			hops: 2,
			top_k_per_vertical: 50,
			top_k_total: 120,
			rerank_top_k: 30,
			use_mmr: false,
			timeout_ms: 10_000,
			expansion_keywords: 10,
		},
		Mode::Compliance => ModeShape {
			rewrites: 2,
			hops: 1,
			top_k_per_vertical: 15,
			top_k_total: 30,
			rerank_top_k: 15,
			use_mmr: false,
			timeout_ms: 3_000,
			expansion_keywords: 3,
		},
		Mode::Brainstorm => ModeShape {
			rewrites: 5,
			hops: 2,
			top_k_per_vertical: 40,
			top_k_total: 100,
			rerank_top_k: 30,
			use_mmr: true,
			timeout_ms: 8_000,
			expansion_keywords: 10,
		},
	}
}

fn diversity_weight(cfg: &Config, mode: Mode) -> f32 {
	match mode {
		Mode::Qa => cfg.diversity.weights.qa,
		Mode::Compliance => cfg.diversity.weights.compliance,
		Mode::Policy => cfg.diversity.weights.policy,
		Mode::Framework => cfg.diversity.weights.framework,
		Mode::Deepthink => cfg.diversity.weights.deepthink,
		Mode::Brainstorm => cfg.diversity.weights.brainstorm,
	}
}

pub fn workers_for(cfg: &Config, mode: Mode) -> usize {
	match mode {
		Mode::Qa => cfg.runtime.max_workers.qa,
		Mode::Compliance => cfg.runtime.max_workers.compliance,
		Mode::Policy => cfg.runtime.max_workers.policy,
		Mode::Framework => cfg.runtime.max_workers.framework,
		Mode::Deepthink => cfg.runtime.max_workers.deepthink,
		Mode::Brainstorm => cfg.runtime.max_workers.brainstorm,
	}
}

fn select_verticals(
	mode: Mode,
	interpretation: &QueryInterpretation,
	normalized: &str,
) -> Vec<Vertical> {
	if matches!(mode, Mode::Deepthink | Mode::Framework) {
		return vec![Vertical::Legal, Vertical::Go, Vertical::Judicial, Vertical::Data, Vertical::Schemes];
	}

	let mut out = Vec::new();
	let mut push = |vertical: Vertical| {
		if !out.contains(&vertical) {
			out.push(vertical);
		}
	};

	if mode == Mode::Brainstorm {
		push(Vertical::Schemes);
		push(Vertical::Data);
	}
	if interpretation.entities.contains_key(&EntityKind::Section)
		|| interpretation.entities.contains_key(&EntityKind::ActName)
	{
		push(Vertical::Legal);
	}
	if interpretation.entities.contains_key(&EntityKind::GoNumber) || has_go_marker(normalized) {
		push(Vertical::Go);
	}
	if interpretation.entities.contains_key(&EntityKind::CaseNumber) {
		push(Vertical::Judicial);
	}
	if lexicon::METRIC_MARKERS.iter().any(|marker| normalized.contains(marker)) {
		push(Vertical::Data);
	}
	if interpretation.entities.contains_key(&EntityKind::Scheme) {
		push(Vertical::Schemes);
	}

	if out.is_empty() {
		out = match mode {
			Mode::Qa | Mode::Compliance => vec![Vertical::Legal, Vertical::Go],
			_ => vec![Vertical::Legal, Vertical::Go, Vertical::Schemes],
		};
	}
	if mode == Mode::Qa {
		out.truncate(2);
	}

	out
}

fn collection_name(cfg: &Config, vertical: Vertical) -> &str {
	match vertical {
		Vertical::Legal => &cfg.index.collections.legal,
		Vertical::Go => &cfg.index.collections.go,
		Vertical::Judicial => &cfg.index.collections.judicial,
		Vertical::Data => &cfg.index.collections.data,
		Vertical::Schemes | Vertical::Infrastructure => &cfg.index.collections.schemes,
		Vertical::Internet => "",
	}
}

fn build_force_filter(
	cfg: &Config,
	interpretation: &QueryInterpretation,
	normalized: &str,
	overrides: &Overrides,
	now_ts: i64,
) -> Option<IndexFilter> {
	let mut filter = IndexFilter::default();

	if normalized.contains("recent") && has_go_marker(normalized) {
		filter = filter
			.and_match("vertical", Vertical::Go.as_str())
			.and_range("date_issued_ts", Some(now_ts - EIGHTEEN_MONTHS_SECS), None);

		if let Some(department) =
			interpretation.entity_values(EntityKind::Department).first()
		{
			filter = filter.and_match("department", &title_case(department));
		}
	}

	for (key, value) in &cfg.runtime.force_filter {
		filter = filter.and_match(key, value);
	}
	if let Some(extra) = overrides.force_filter.as_ref() {
		filter = filter.merge(extra);
	}

	(!filter.is_empty()).then_some(filter)
}

fn has_go_marker(normalized: &str) -> bool {
	normalized
		.split_whitespace()
		.any(|token| matches!(token.trim_matches(|ch: char| !ch.is_alphanumeric()), "go" | "gos"))
		|| normalized.contains("government order")
}

fn title_case(value: &str) -> String {
	value
		.split_whitespace()
		.map(|word| {
			let mut chars = word.chars();

			match chars.next() {
				Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
				None => String::new(),
			}
		})
		.collect::<Vec<_>>()
		.join(" ")
}

#[cfg(test)]
mod tests {
	use super::*;
	use edict_domain::{interpret, normalize_query};

	fn cfg() -> Config {
		crate::test_support::config()
	}

	fn plan_for(query: &str) -> Plan {
		let normalized = normalize_query(query);
		let interpretation = interpret(&normalized);

		build_plan(&cfg(), &interpretation, &normalized, &Overrides::default(), 1_700_000_000)
	}

	#[test]
	fn qa_keeps_at_most_two_verticals() {
		let plan = plan_for("What is Section 12?");

		assert_eq!(plan.mode, Mode::Qa);
		assert!(plan.verticals.len() <= 2);
		assert_eq!(plan.rewrites, 1);
		assert_eq!(plan.hops, 1);
		assert_eq!(plan.timeout_ms, 2_000);
	}

	#[test]
	fn deepthink_selects_all_five_verticals() {
		let plan = plan_for("Analyze teacher transfer policy comprehensively");

		assert_eq!(plan.mode, Mode::Deepthink);
		assert_eq!(plan.verticals.len(), 5);
		assert_eq!(plan.rewrites, 5);
		assert_eq!(plan.hops, 2);
		assert_eq!(plan.top_k_total, 120);
	}

	#[test]
	fn brainstorm_prefers_schemes_and_data() {
		let plan = plan_for("innovative ideas for reducing dropout");

		assert_eq!(plan.mode, Mode::Brainstorm);
		assert_eq!(plan.verticals[0], Vertical::Schemes);
		assert_eq!(plan.verticals[1], Vertical::Data);
		assert!(plan.use_mmr);
		assert!(plan.use_internet);
	}

	#[test]
	fn mode_override_wins() {
		let normalized = normalize_query("What is Section 12?");
		let interpretation = interpret(&normalized);
		let overrides = Overrides { mode: Some(Mode::Deepthink), ..Default::default() };
		let plan = build_plan(&cfg(), &interpretation, &normalized, &overrides, 1_700_000_000);

		assert_eq!(plan.mode, Mode::Deepthink);
		assert_eq!(plan.rewrites, 5);
	}

	#[test]
	fn recent_go_query_attaches_force_filter() {
		let plan = plan_for("recent GOs from school education department");
		let filter = plan.force_filter.expect("force filter attached");
		let repr = filter.canonical_repr();

		assert!(repr.contains("vertical=go"), "repr: {repr}");
		assert!(repr.contains("date_issued_ts"), "repr: {repr}");
		assert!(repr.contains("department=School Education"), "repr: {repr}");
	}

	#[test]
	fn internet_master_switch_overrides_requests() {
		let mut cfg = cfg();

		cfg.internet.enabled = false;

		let normalized = normalize_query("global best practices for teacher training");
		let interpretation = interpret(&normalized);
		let overrides = Overrides { use_internet: Some(true), ..Default::default() };
		let plan = build_plan(&cfg, &interpretation, &normalized, &overrides, 1_700_000_000);

		assert!(!plan.use_internet);
	}
}
