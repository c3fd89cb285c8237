//! Fuzzy search over the entity catalog
//!
//! Matching is typo-tolerant and multi-field:
//! - Each field (name, area, id, domain) is scored by the smallest edit
//!   distance between the term and any substring of the field, normalised by
//!   the term length (0.0 is a perfect hit, 1.0 nothing in common)
//! - Fields scoring above the threshold are ignored
//! - Passing fields are blended by their weights into one entity score
//!
//! Highlight positions come from the skim algorithm when the term is a
//! subsequence of the field, otherwise from the aligned substring.

use std::cmp::Ordering;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher as FuzzyMatcherTrait;
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Maximum normalised edit distance for a field to count as a match
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Shortest matched run for a field to count as a hit
pub const DEFAULT_MIN_MATCH_LENGTH: usize = 1;

/// Default number of autocomplete suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Searchable entity fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Name,
    Area,
    Id,
    Domain,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::Name,
        SearchField::Area,
        SearchField::Id,
        SearchField::Domain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SearchField::Name => "name",
            SearchField::Area => "area",
            SearchField::Id => "id",
            SearchField::Domain => "domain",
        }
    }

    fn value(self, entity: &Entity) -> Option<&str> {
        match self {
            SearchField::Name => Some(entity.name.as_str()),
            SearchField::Area => entity.area(),
            SearchField::Id => Some(entity.id.as_str()),
            SearchField::Domain => Some(entity.domain.as_str()),
        }
        .filter(|v| !v.is_empty())
    }
}

/// Relative importance of each field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub name: f64,
    pub area: f64,
    pub id: f64,
    pub domain: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            name: 0.4,
            area: 0.3,
            id: 0.2,
            domain: 0.1,
        }
    }
}

impl FieldWeights {
    pub fn get(&self, field: SearchField) -> f64 {
        match field {
            SearchField::Name => self.name,
            SearchField::Area => self.area,
            SearchField::Id => self.id,
            SearchField::Domain => self.domain,
        }
    }

    /// Scale the weights so they sum to 1
    ///
    /// Negative or non-finite weights count as zero. If nothing is left the
    /// default weights are used.
    pub fn normalized(&self) -> FieldWeights {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (name, area, id, domain) = (
            clean(self.name),
            clean(self.area),
            clean(self.id),
            clean(self.domain),
        );
        let total = name + area + id + domain;
        if total <= 0.0 {
            return FieldWeights::default().normalized();
        }
        FieldWeights {
            name: name / total,
            area: area / total,
            id: id / total,
            domain: domain / total,
        }
    }
}

/// Index construction options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub weights: FieldWeights,
    pub threshold: f64,
    pub min_match_length: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            weights: FieldWeights::default(),
            threshold: DEFAULT_THRESHOLD,
            min_match_length: DEFAULT_MIN_MATCH_LENGTH,
        }
    }
}

/// Matched character ranges within one field
///
/// Ranges are inclusive `(start, end)` character positions into `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMatch {
    pub field: SearchField,
    pub value: String,
    pub indices: Vec<(usize, usize)>,
}

/// An entity ranked by a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub entity: Entity,
    /// Lower is better; never above the index threshold
    pub score: f64,
    pub matches: Vec<FieldMatch>,
}

impl SearchResult {
    fn unranked(entity: &Entity) -> Self {
        Self {
            entity: entity.clone(),
            score: 0.0,
            matches: Vec::new(),
        }
    }

    pub fn field_match(&self, field: SearchField) -> Option<&FieldMatch> {
        self.matches.iter().find(|m| m.field == field)
    }
}

/// Autocomplete entry with the display name marked up
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub entity: Entity,
    pub score: f64,
    pub highlight: String,
}

/// Markers wrapped around matched runs in a highlight
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlight {
    pub open: String,
    pub close: String,
}

impl Default for Highlight {
    fn default() -> Self {
        Self {
            open: "<mark>".to_string(),
            close: "</mark>".to_string(),
        }
    }
}

impl Highlight {
    /// Wrap the given inclusive character ranges of `text`
    pub fn apply(&self, text: &str, ranges: &[(usize, usize)]) -> String {
        let ranges = merge_ranges(ranges);
        if ranges.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len() + ranges.len() * 16);
        let mut pending = ranges.iter().peekable();
        let mut open_until: Option<usize> = None;

        for (i, c) in text.chars().enumerate() {
            if open_until.is_none() {
                if let Some(&&(start, end)) = pending.peek() {
                    if start == i {
                        out.push_str(&self.open);
                        open_until = Some(end);
                        pending.next();
                    }
                }
            }
            out.push(c);
            if open_until == Some(i) {
                out.push_str(&self.close);
                open_until = None;
            }
        }

        // Range running past the end of the text
        if open_until.is_some() {
            out.push_str(&self.close);
        }
        out
    }
}

/// Per-entity lowercase field characters, precomputed once per index
#[derive(Debug, Clone)]
struct IndexedRecord {
    fields: [Option<Vec<char>>; 4],
}

impl IndexedRecord {
    fn new(entity: &Entity) -> Self {
        let fields = SearchField::ALL.map(|field| field.value(entity).map(fold_chars));
        Self { fields }
    }
}

/// Searchable snapshot of a catalog
///
/// The index owns a copy of the entities it was built from, so results stay
/// consistent until the caller replaces the index.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    entities: Vec<Entity>,
    records: Vec<IndexedRecord>,
    options: SearchOptions,
}

impl SearchIndex {
    pub fn build(entities: &[Entity], options: SearchOptions) -> Self {
        let options = SearchOptions {
            weights: options.weights.normalized(),
            threshold: if options.threshold.is_finite() {
                options.threshold.clamp(0.0, 1.0)
            } else {
                DEFAULT_THRESHOLD
            },
            min_match_length: options.min_match_length.max(1),
        };

        let records = entities.iter().map(IndexedRecord::new).collect();
        log::debug!(
            "Built search index over {} entities (threshold {})",
            entities.len(),
            options.threshold
        );

        Self {
            entities: entities.to_vec(),
            records,
            options,
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Rank entities against `term`
    ///
    /// A blank term returns every entity in catalog order, unscored. A term
    /// that matches nothing returns an empty list. Ties keep catalog order.
    pub fn search(&self, term: &str) -> Vec<SearchResult> {
        let term = term.trim();
        if term.is_empty() {
            return self.entities.iter().map(SearchResult::unranked).collect();
        }

        let pattern = fold_chars(term);
        let matcher = SkimMatcherV2::default().ignore_case();

        let mut results: Vec<SearchResult> = self
            .entities
            .iter()
            .zip(&self.records)
            .filter_map(|(entity, record)| self.score_entity(entity, record, term, &pattern, &matcher))
            .collect();

        // Stable sort keeps catalog order between equal scores
        results.sort_by(|a, b| a.score.total_cmp(&b.score));

        log::trace!("Search '{term}' matched {} of {}", results.len(), self.len());
        results
    }

    /// Top `limit` results for `term`, with the matched parts of the name marked
    pub fn suggestions(&self, term: &str, limit: usize, highlight: &Highlight) -> Vec<Suggestion> {
        if term.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        self.search(term)
            .into_iter()
            .take(limit)
            .map(|result| {
                let highlight = match result.field_match(SearchField::Name) {
                    Some(m) => highlight.apply(&result.entity.name, &m.indices),
                    None => result.entity.name.clone(),
                };
                Suggestion {
                    score: result.score,
                    highlight,
                    entity: result.entity,
                }
            })
            .collect()
    }

    fn score_entity(
        &self,
        entity: &Entity,
        record: &IndexedRecord,
        term: &str,
        pattern: &[char],
        matcher: &SkimMatcherV2,
    ) -> Option<SearchResult> {
        let threshold = self.options.threshold;
        let mut weighted = 0.0;
        let mut covered = 0.0;
        let mut matches = Vec::new();

        for (field, chars) in SearchField::ALL.iter().zip(&record.fields) {
            let Some(chars) = chars else { continue };
            let Some(hit) = approximate_substring(pattern, chars) else {
                continue;
            };

            let field_score = hit.distance as f64 / pattern.len() as f64;
            if field_score > threshold {
                continue;
            }

            // A field counts only if some matched run survives `min_match_length`
            let value = field.value(entity).unwrap_or_default();
            let indices = match_indices(matcher, value, term, &hit, self.options.min_match_length);
            if indices.is_empty() {
                continue;
            }

            let weight = self.options.weights.get(*field);
            weighted += weight * field_score;
            covered += weight;

            matches.push(FieldMatch {
                field: *field,
                value: value.to_string(),
                indices,
            });
        }

        if matches.is_empty() {
            return None;
        }

        let score = if covered > 0.0 {
            let mean = weighted / covered;
            (mean + (threshold - mean) * (1.0 - covered)).min(threshold)
        } else {
            threshold
        };

        Some(SearchResult {
            entity: entity.clone(),
            score,
            matches,
        })
    }
}

/// Best approximate occurrence of a pattern inside a text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SubstringHit {
    distance: usize,
    /// Inclusive character range of the aligned substring
    start: usize,
    end: usize,
}

/// Smallest edit distance between `pattern` and any substring of `text`
///
/// Dynamic programming with a free starting column; the start of each
/// alignment is carried along so the matched range can be reported.
fn approximate_substring(pattern: &[char], text: &[char]) -> Option<SubstringHit> {
    if pattern.is_empty() || text.is_empty() {
        return None;
    }

    let n = text.len();
    // (distance, start) for the previous and current pattern row
    let mut prev: Vec<(usize, usize)> = (0..=n).map(|j| (0, j)).collect();
    let mut curr = vec![(0usize, 0usize); n + 1];

    for (i, p) in pattern.iter().enumerate() {
        curr[0] = (i + 1, 0);
        for (j, t) in text.iter().enumerate() {
            let cost = usize::from(p != t);
            let diagonal = (prev[j].0 + cost, prev[j].1);
            let up = (prev[j + 1].0 + 1, prev[j + 1].1);
            let left = (curr[j].0 + 1, curr[j].1);

            curr[j + 1] = [up, left]
                .into_iter()
                .fold(diagonal, |best, cand| if cand.0 < best.0 { cand } else { best });
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let (end, &(distance, start)) = prev
        .iter()
        .enumerate()
        .skip(1)
        .min_by(|a, b| match a.1 .0.cmp(&b.1 .0) {
            Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        })?;

    Some(SubstringHit {
        distance,
        start: start.min(end - 1),
        end: end - 1,
    })
}

/// Highlight ranges for a passing field
fn match_indices(
    matcher: &SkimMatcherV2,
    value: &str,
    term: &str,
    hit: &SubstringHit,
    min_match_length: usize,
) -> Vec<(usize, usize)> {
    let ranges = match matcher.fuzzy_indices(value, term) {
        Some((_, positions)) => positions_to_ranges(&positions),
        None => vec![(hit.start, hit.end)],
    };

    ranges
        .into_iter()
        .filter(|(start, end)| end + 1 - start >= min_match_length)
        .collect()
}

/// Collapse sorted character positions into inclusive runs
fn positions_to_ranges(positions: &[usize]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for &pos in positions {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == pos => *end = pos,
            _ => ranges.push((pos, pos)),
        }
    }
    ranges
}

fn merge_ranges(ranges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut sorted: Vec<(usize, usize)> = ranges
        .iter()
        .copied()
        .filter(|(start, end)| start <= end)
        .collect();
    sorted.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(sorted.len());
    for (start, end) in sorted {
        match merged.last_mut() {
            Some((_, last_end)) if start <= *last_end + 1 => *last_end = (*last_end).max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

/// Lowercase one character at a time so positions stay aligned
fn fold_chars(s: &str) -> Vec<char> {
    s.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str, name: &str, area: Option<&str>, state: &str) -> Entity {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "area": area,
            "state": state,
        }))
        .unwrap()
    }

    fn create_test_index() -> SearchIndex {
        let entities = vec![
            entity("light.kitchen", "Kitchen Light", Some("Kitchen"), "on"),
            entity("light.living_room", "Living Room Light", Some("Living Room"), "off"),
            entity("switch.bedroom_fan", "Bedroom Fan", Some("Bedroom"), "off"),
            entity("sensor.outdoor_temp", "Outdoor Temperature", None, "12.5"),
            entity("lock.front_door", "Front Door", Some("Hallway"), "locked"),
        ];
        SearchIndex::build(&entities, SearchOptions::default())
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.entity.id.as_str()).collect()
    }

    #[test]
    fn test_approximate_substring_exact() {
        let hit = approximate_substring(&fold_chars("kitch"), &fold_chars("Kitchen Light")).unwrap();
        assert_eq!(hit.distance, 0);
        assert_eq!((hit.start, hit.end), (0, 4));
    }

    #[test]
    fn test_approximate_substring_typo() {
        let hit = approximate_substring(&fold_chars("bedrom"), &fold_chars("Bedroom Fan")).unwrap();
        assert_eq!(hit.distance, 1);
        assert_eq!(hit.start, 0);

        let hit = approximate_substring(&fold_chars("door"), &fold_chars("front door")).unwrap();
        assert_eq!(hit.distance, 0);
        assert_eq!((hit.start, hit.end), (6, 9));
    }

    #[test]
    fn test_approximate_substring_longer_than_text() {
        let hit = approximate_substring(&fold_chars("lights"), &fold_chars("light")).unwrap();
        assert_eq!(hit.distance, 1);
        assert!(approximate_substring(&[], &fold_chars("x")).is_none());
    }

    #[test]
    fn test_empty_term_returns_everything() {
        let index = create_test_index();
        let results = index.search("");
        assert_eq!(results.len(), index.len());
        assert_eq!(ids(&results), ids(&index.search("   ")));
        assert_eq!(results[0].entity.id, "light.kitchen");
        assert!(results.iter().all(|r| r.matches.is_empty()));
    }

    #[test]
    fn test_no_match_returns_empty() {
        let index = create_test_index();
        assert!(index.search("zzzzqqq").is_empty());
    }

    #[test]
    fn test_single_entity_partial_term() {
        let entities = vec![serde_json::from_value::<Entity>(json!({
            "id": "light.kitchen",
            "domain": "light",
            "area": "Kitchen",
            "state": "on"
        }))
        .unwrap()];
        let index = SearchIndex::build(&entities, SearchOptions::default());

        assert_eq!(index.search("").len(), 1);

        let results = index.search("kitch");
        assert_eq!(results.len(), 1);
        assert!(results[0]
            .matches
            .iter()
            .any(|m| matches!(m.field, SearchField::Area | SearchField::Name)));
    }

    #[test]
    fn test_scores_sorted_and_within_threshold() {
        let index = create_test_index();
        for term in ["light", "kitchen", "livng", "door", "fan", "temp", "l"] {
            let results = index.search(term);
            for pair in results.windows(2) {
                assert!(pair[0].score <= pair[1].score, "unsorted for '{term}'");
            }
            for r in &results {
                assert!(r.score <= index.options().threshold);
                assert!(r.score >= 0.0);
            }
        }
    }

    #[test]
    fn test_name_hit_outranks_domain_hit() {
        let entities = vec![
            entity("light.porch", "Porch Lamp", None, "off"),
            entity("switch.light_strip", "Light Strip", None, "off"),
        ];
        let index = SearchIndex::build(&entities, SearchOptions::default());
        let results = index.search("light");

        assert_eq!(ids(&results), vec!["switch.light_strip", "light.porch"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let entities = vec![
            entity("switch.a", "Pump", None, "off"),
            entity("switch.b", "Pump", None, "off"),
            entity("switch.c", "Pump", None, "off"),
        ];
        let index = SearchIndex::build(&entities, SearchOptions::default());
        assert_eq!(ids(&index.search("pump")), vec!["switch.a", "switch.b", "switch.c"]);
    }

    #[test]
    fn test_typo_tolerance_respects_threshold() {
        let index = create_test_index();
        // one edit over six characters
        assert!(ids(&index.search("bedrom")).contains(&"switch.bedroom_fan"));

        let strict = SearchIndex::build(
            index.entities(),
            SearchOptions {
                threshold: 0.0,
                ..SearchOptions::default()
            },
        );
        assert!(strict.search("bedrom").is_empty());
        assert_eq!(ids(&strict.search("bedroom")), vec!["switch.bedroom_fan"]);
    }

    #[test]
    fn test_match_indices_for_name() {
        let index = create_test_index();
        let results = index.search("front");
        let name = results[0].field_match(SearchField::Name).unwrap();
        assert_eq!(name.indices, vec![(0, 4)]);
    }

    #[test]
    fn test_min_match_length_filters_short_runs() {
        let entities = vec![entity("light.kitchen", "Kitchen", None, "on")];
        let index = SearchIndex::build(
            &entities,
            SearchOptions {
                min_match_length: 3,
                ..SearchOptions::default()
            },
        );
        let results = index.search("kitchen");
        assert_eq!(results.len(), 1);
        let name = results[0].field_match(SearchField::Name).unwrap();
        assert!(name.indices.iter().all(|(s, e)| e + 1 - s >= 3));
    }

    #[test]
    fn test_min_match_length_drops_fields_without_long_run() {
        let entities = vec![entity("light.x", "Xyz", None, "on")];
        let index = SearchIndex::build(
            &entities,
            SearchOptions {
                min_match_length: 3,
                ..SearchOptions::default()
            },
        );
        assert!(index.search("l").is_empty());

        let loose = SearchIndex::build(&entities, SearchOptions::default());
        let results = loose.search("l");
        assert_eq!(results.len(), 1);
        assert!(!results[0].matches.is_empty());
    }

    #[test]
    fn test_build_clamps_threshold() {
        let entities = vec![entity("light.x", "Xyz", None, "on")];
        let index = SearchIndex::build(
            &entities,
            SearchOptions {
                threshold: 1.5,
                ..SearchOptions::default()
            },
        );
        assert_eq!(index.options().threshold, 1.0);
    }

    #[test]
    fn test_missing_area_is_tolerated() {
        let index = create_test_index();
        let results = index.search("outdoor");
        assert_eq!(results[0].entity.id, "sensor.outdoor_temp");
        assert!(results[0].field_match(SearchField::Area).is_none());
    }

    #[test]
    fn test_suggestions_limit_and_prefix() {
        let index = create_test_index();
        let all = index.search("o");
        let suggestions = index.suggestions("o", 2, &Highlight::default());

        assert!(suggestions.len() <= 2);
        for (s, r) in suggestions.iter().zip(&all) {
            assert_eq!(s.entity.id, r.entity.id);
        }
        assert!(index.suggestions("", 5, &Highlight::default()).is_empty());
    }

    #[test]
    fn test_suggestion_highlight() {
        let index = create_test_index();
        let suggestions = index.suggestions("front", 5, &Highlight::default());
        assert_eq!(suggestions[0].highlight, "<mark>Front</mark> Door");
    }

    #[test]
    fn test_suggestion_without_name_match_is_plain() {
        let entities = vec![entity("light.x", "Lamp", Some("Kitchen"), "on")];
        let index = SearchIndex::build(&entities, SearchOptions::default());
        let suggestions = index.suggestions("kitchen", 5, &Highlight::default());
        assert_eq!(suggestions[0].highlight, "Lamp");
    }

    #[test]
    fn test_highlight_apply() {
        let h = Highlight {
            open: "[".to_string(),
            close: "]".to_string(),
        };
        assert_eq!(h.apply("Kitchen", &[(0, 2)]), "[Kit]chen");
        assert_eq!(h.apply("Kitchen", &[(0, 1), (2, 3), (6, 6)]), "[Kitc]he[n]");
        assert_eq!(h.apply("Kitchen", &[]), "Kitchen");
        assert_eq!(h.apply("Ok", &[(1, 9)]), "O[k]");
    }

    #[test]
    fn test_weights_normalized() {
        let w = FieldWeights {
            name: 2.0,
            area: 2.0,
            id: 0.0,
            domain: -1.0,
        }
        .normalized();
        assert!((w.name - 0.5).abs() < 1e-9);
        assert!((w.area - 0.5).abs() < 1e-9);
        assert_eq!(w.domain, 0.0);

        let fallback = FieldWeights {
            name: 0.0,
            area: 0.0,
            id: 0.0,
            domain: 0.0,
        }
        .normalized();
        assert!((fallback.name - 0.4).abs() < 1e-9);
    }
}
