//! Mapping of free-text diagnosis names to canonical condition tags.

use crate::types::{ConditionAliasTable, ConditionTag};
use serde::{Deserialize, Serialize};

/// A diagnosis as entered, with the tag it resolved to (if any)
///
/// Unresolved names are kept for display but take no part in
/// condition-driven features.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ResolvedCondition {
    pub name: String,
    pub tag: Option<ConditionTag>,
}

/// Lowercase, trim, treat `_`/`-` as spaces and collapse runs of whitespace
fn normalize_name(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Map a diagnosis name to its canonical condition tag
///
/// Lookup order:
/// 1. exact match against the alias table
/// 2. a tag label (or tag key) contained in the name, longest first
/// 3. an alias contained in the name, longest first
///
/// The result depends only on the input and the table.
pub fn map_condition(disease_name: &str, aliases: &ConditionAliasTable) -> Option<ConditionTag> {
    let name = normalize_name(disease_name);
    if name.is_empty() {
        return None;
    }

    if let Some(entry) = aliases
        .entries
        .iter()
        .find(|e| normalize_name(&e.alias) == name)
    {
        return Some(entry.tag);
    }

    let mut labels: Vec<(String, ConditionTag)> = ConditionTag::ALL
        .iter()
        .flat_map(|tag| {
            [
                (tag.label().to_string(), *tag),
                (normalize_name(tag.key()), *tag),
            ]
        })
        .collect();
    labels.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    if let Some((_, tag)) = labels.iter().find(|(label, _)| contains_phrase(&name, label)) {
        return Some(*tag);
    }

    let mut candidates: Vec<(String, ConditionTag)> = aliases
        .entries
        .iter()
        .map(|e| (normalize_name(&e.alias), e.tag))
        .filter(|(alias, _)| !alias.is_empty())
        .collect();
    candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

    let found = candidates
        .iter()
        .find(|(alias, _)| contains_phrase(&name, alias))
        .map(|(_, tag)| *tag);

    if found.is_none() {
        tracing::debug!("Could not map condition '{}'", disease_name);
    }
    found
}

/// Substring match that does not split words on either side
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

/// Map every diagnosis, preserving input order
pub fn resolve_conditions<S: AsRef<str>>(
    names: &[S],
    aliases: &ConditionAliasTable,
) -> Vec<ResolvedCondition> {
    names
        .iter()
        .map(|name| ResolvedCondition {
            name: name.as_ref().to_string(),
            tag: map_condition(name.as_ref(), aliases),
        })
        .collect()
}

/// Distinct resolved tags in first-seen order
pub fn condition_tags(resolved: &[ResolvedCondition]) -> Vec<ConditionTag> {
    let mut tags = Vec::new();
    for tag in resolved.iter().filter_map(|c| c.tag) {
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}
