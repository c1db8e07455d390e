use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
	citation::{self, CitationKind},
	lexicon,
};

static YEAR_PATTERN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern is valid"));

const DEEPTHINK_MARKERS: &[&str] =
	&["analyze", "comprehensive", "framework", "deep", "policy analysis"];
const BRAINSTORM_MARKERS: &[&str] = &["idea", "innovative", "creative", "best practices", "global"];
const INTERNET_MARKERS: &[&str] =
	&["latest", "news", "current", "today", "international", "worldwide"];

/// Interpretive category of a query; selects the retrieval plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
	Qa,
	Policy,
	Framework,
	Compliance,
	Deepthink,
	Brainstorm,
}
impl Mode {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Qa => "qa",
			Self::Policy => "policy",
			Self::Framework => "framework",
			Self::Compliance => "compliance",
			Self::Deepthink => "deepthink",
			Self::Brainstorm => "brainstorm",
		}
	}

	/// Deepthink and brainstorm carry a comprehensive-retrieval contract:
	/// optional stages are forced on and breaker thresholds are relaxed.
	pub fn is_comprehensive(&self) -> bool {
		matches!(self, Self::Deepthink | Self::Brainstorm)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
	Narrow,
	Medium,
	Broad,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Section,
	GoNumber,
	Year,
	CaseNumber,
	ActName,
	Department,
	Scheme,
}

/// What the rule classifier understood about a query. Immutable once built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryInterpretation {
	pub r#type: Mode,
	pub scope: Scope,
	pub entities: BTreeMap<EntityKind, Vec<String>>,
	pub keywords: Vec<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub temporal_range: Option<(i64, i64)>,
	pub needs_internet: bool,
	pub confidence: f32,
}
impl QueryInterpretation {
	pub fn entity_values(&self, kind: EntityKind) -> &[String] {
		self.entities.get(&kind).map(Vec::as_slice).unwrap_or_default()
	}

	pub fn all_entity_values(&self) -> impl Iterator<Item = &String> {
		self.entities.values().flatten()
	}
}

/// Rule-based classification over a normalized query. Pure and deterministic.
pub fn interpret(normalized: &str) -> QueryInterpretation {
	let citations = citation::detect_citations(normalized);
	let word_count = normalized.split_whitespace().count();
	let mode = detect_mode(normalized, word_count, !citations.is_empty());
	let entities = extract_entities(normalized, &citations);
	let keywords = extract_keywords(normalized);
	let temporal_range = entities
		.get(&EntityKind::Year)
		.and_then(|years| years.first())
		.and_then(|year| year.parse::<i32>().ok())
		.map(year_unix_range);
	let needs_internet = mode == Mode::Brainstorm
		|| INTERNET_MARKERS.iter().any(|marker| normalized.contains(marker));
	let keyword_hits = count_keyword_hits(normalized, &entities);
	let confidence = (0.6 + 0.05 * keyword_hits as f32).min(1.0);
	let scope = detect_scope(mode, !citations.is_empty());

	QueryInterpretation {
		r#type: mode,
		scope,
		entities,
		keywords,
		temporal_range,
		needs_internet,
		confidence,
	}
}

fn detect_mode(normalized: &str, word_count: usize, has_citation: bool) -> Mode {
	let interrogative = ["what is", "define", "which"]
		.iter()
		.any(|prefix| normalized.starts_with(prefix));

	// A citation or a "what is" opener is answerable directly no matter what
	// other markers ride along; the short-query rule alone yields to the
	// analysis markers.
	if has_citation || interrogative {
		return Mode::Qa;
	}

	let deepthink_hits =
		DEEPTHINK_MARKERS.iter().filter(|marker| normalized.contains(*marker)).count();

	if deepthink_hits >= 2 || (word_count >= 12 && deepthink_hits >= 1) {
		return Mode::Deepthink;
	}
	if BRAINSTORM_MARKERS.iter().any(|marker| normalized.contains(marker)) {
		return Mode::Brainstorm;
	}
	if word_count <= 6 {
		return Mode::Qa;
	}

	Mode::Policy
}

fn detect_scope(mode: Mode, has_citation: bool) -> Scope {
	if has_citation {
		return Scope::Narrow;
	}

	match mode {
		Mode::Qa | Mode::Compliance => Scope::Narrow,
		Mode::Policy | Mode::Framework => Scope::Medium,
		Mode::Deepthink | Mode::Brainstorm => Scope::Broad,
	}
}

fn extract_entities(
	normalized: &str,
	citations: &[citation::Citation],
) -> BTreeMap<EntityKind, Vec<String>> {
	let mut entities: BTreeMap<EntityKind, Vec<String>> = BTreeMap::new();
	let mut push = |kind: EntityKind, value: String| {
		let values = entities.entry(kind).or_default();

		if !values.contains(&value) {
			values.push(value);
		}
	};

	for citation in citations {
		let kind = match citation.kind {
			CitationKind::Section => EntityKind::Section,
			CitationKind::GoNumber => EntityKind::GoNumber,
			CitationKind::CaseNumber => EntityKind::CaseNumber,
		};

		push(kind, citation.normalized.clone());
	}

	for found in YEAR_PATTERN.find_iter(normalized) {
		push(EntityKind::Year, found.as_str().to_string());
	}

	for act in lexicon::ACT_NAMES {
		if normalized.contains(act) {
			push(EntityKind::ActName, (*act).to_string());
		}
	}

	for department in lexicon::DEPARTMENTS {
		if normalized.contains(department) {
			push(EntityKind::Department, (*department).to_string());
		}
	}

	for scheme in lexicon::SCHEME_MARKERS {
		if normalized.contains(scheme) {
			push(EntityKind::Scheme, (*scheme).to_string());
		}
	}

	entities
}

fn extract_keywords(normalized: &str) -> Vec<String> {
	let mut out = Vec::new();

	for token in normalized.split_whitespace() {
		let word = token.trim_matches(|ch: char| !ch.is_alphanumeric() && ch != '(' && ch != ')');

		if word.len() < 2 || lexicon::STOPWORDS.contains(&word) {
			continue;
		}
		if !out.iter().any(|existing: &String| existing == word) {
			out.push(word.to_string());
		}
	}

	out
}

fn count_keyword_hits(normalized: &str, entities: &BTreeMap<EntityKind, Vec<String>>) -> usize {
	let marker_hits = DEEPTHINK_MARKERS
		.iter()
		.chain(BRAINSTORM_MARKERS)
		.filter(|marker| normalized.contains(*marker))
		.count();
	let cluster_hits = lexicon::SYNONYM_CLUSTERS
		.iter()
		.filter(|(head, _)| normalized.split_whitespace().any(|token| token == *head))
		.count();
	let entity_hits = entities.values().map(Vec::len).sum::<usize>();

	marker_hits + cluster_hits + entity_hits
}

/// Expansion topics for the keyword expander, derived from entities and the
/// query's vocabulary.
pub fn dominant_topics(normalized: &str, interpretation: &QueryInterpretation) -> Vec<&'static str> {
	let mut out = Vec::new();
	let mut push = |topic: &'static str| {
		if !out.contains(&topic) {
			out.push(topic);
		}
	};

	if interpretation.entities.contains_key(&EntityKind::Section)
		|| interpretation.entities.contains_key(&EntityKind::ActName)
	{
		push("legal");
	}
	if interpretation.entities.contains_key(&EntityKind::GoNumber) {
		push("go");
	}
	if interpretation.entities.contains_key(&EntityKind::CaseNumber) {
		push("judicial");
	}
	if interpretation.entities.contains_key(&EntityKind::Scheme) {
		push("schemes");
	}
	if lexicon::METRIC_MARKERS.iter().any(|marker| normalized.contains(marker)) {
		push("data");
	}

	for topic in ["teacher", "school", "finance", "exam"] {
		if normalized.split_whitespace().any(|token| token.starts_with(topic)) {
			push(topic);
		}
	}

	out
}

fn year_unix_range(year: i32) -> (i64, i64) {
	(year_start_ts(year), year_start_ts(year + 1) - 1)
}

fn year_start_ts(year: i32) -> i64 {
	let mut days = 0_i64;

	if year >= 1970 {
		for y in 1970..year {
			days += if is_leap(y) { 366 } else { 365 };
		}
	} else {
		for y in year..1970 {
			days -= if is_leap(y) { 366 } else { 365 };
		}
	}

	days * 86_400
}

fn is_leap(year: i32) -> bool {
	(year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::normalize::normalize_query;

	fn interpret_raw(query: &str) -> QueryInterpretation {
		interpret(&normalize_query(query))
	}

	#[test]
	fn short_citation_query_is_qa() {
		let interpretation = interpret_raw("What is Section 12?");

		assert_eq!(interpretation.r#type, Mode::Qa);
		assert_eq!(interpretation.entity_values(EntityKind::Section), ["12"]);
		assert_eq!(interpretation.scope, Scope::Narrow);
	}

	#[test]
	fn analysis_markers_outrank_short_query_rule() {
		let interpretation = interpret_raw("Analyze teacher transfer policy comprehensively");

		assert_eq!(interpretation.r#type, Mode::Deepthink);
		assert_eq!(interpretation.scope, Scope::Broad);
	}

	#[test]
	fn long_marker_query_is_deepthink() {
		let interpretation = interpret_raw(
			"please provide a deep review of the state school infrastructure program and its \
			 funding gaps over time",
		);

		assert_eq!(interpretation.r#type, Mode::Deepthink);
	}

	#[test]
	fn brainstorm_markers_detected() {
		let interpretation =
			interpret_raw("innovative ideas to improve student attendance in rural schools");

		assert_eq!(interpretation.r#type, Mode::Brainstorm);
		assert!(interpretation.needs_internet);
	}

	#[test]
	fn default_mode_is_policy() {
		let interpretation =
			interpret_raw("implications of the new teacher recruitment notification for districts");

		assert_eq!(interpretation.r#type, Mode::Policy);
		assert_eq!(interpretation.scope, Scope::Medium);
	}

	#[test]
	fn department_and_year_entities() {
		let interpretation =
			interpret_raw("school education department orders from 2021 on midday meal");

		assert_eq!(
			interpretation.entity_values(EntityKind::Department),
			["school education"]
		);
		assert_eq!(interpretation.entity_values(EntityKind::Year), ["2021"]);
		assert_eq!(interpretation.entity_values(EntityKind::Scheme), ["midday meal"]);
		assert!(interpretation.temporal_range.is_some());
	}

	#[test]
	fn confidence_grows_with_hits_and_saturates() {
		let sparse = interpret_raw("hello there");
		let dense = interpret_raw(
			"analyze comprehensive framework for teacher transfer policy scheme fund exam \
			 compliance in school education department 2020 2021 2022 under the rte act",
		);

		assert!(sparse.confidence >= 0.6);
		assert!(dense.confidence > sparse.confidence);
		assert!(dense.confidence <= 1.0);
	}

	#[test]
	fn year_range_covers_calendar_year() {
		let (from, to) = year_unix_range(2021);

		assert_eq!(from, 1_609_459_200);
		assert_eq!(to, 1_640_995_199);
	}
}
