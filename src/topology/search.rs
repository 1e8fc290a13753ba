use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::entity::EntityReference;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

/// Indices of nodes whose name or id fuzzily matches `query`.
/// `None` for a blank query, meaning "no filter".
pub fn matching_nodes(nodes: &[EntityReference], query: &str) -> Option<HashSet<usize>> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }

    let matcher = SkimMatcherV2::default();
    let matches = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| {
            fuzzy_match_score(&matcher, &node.name, query).is_some()
                || fuzzy_match_score(&matcher, &node.id, query).is_some()
        })
        .map(|(index, _)| index)
        .collect();
    Some(matches)
}
