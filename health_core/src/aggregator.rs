//! Merges classifier, interaction and condition outputs into one report.

use crate::classifier::ClassifiedValue;
use crate::interactions::InteractionReport;
use crate::types::{ConditionTag, EngineWarning, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Structured advice for one evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub summary: String,
    pub concerns: Vec<String>,
    /// Deduplicated, first occurrence kept
    pub recommendations: Vec<String>,
    pub severity: Severity,
    pub possible_conditions: Vec<ConditionTag>,
    pub warnings: Vec<EngineWarning>,
    /// Optional prose attached by a narrative generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative: Option<String>,
}

/// Insertion-ordered unique sequence
pub(crate) fn dedupe_preserving_order<T, I>(items: I) -> Vec<T>
where
    T: Eq + Hash + Clone,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Build the report from already-computed component outputs
///
/// Recommendations come from abnormal lab values in panel order, followed by
/// interaction-derived advice. The overall severity only reflects lab
/// values; interaction severities appear in `concerns`.
pub fn aggregate_recommendations(
    classified: &[ClassifiedValue],
    interactions: &InteractionReport,
    condition_tags: &[ConditionTag],
) -> Report {
    let abnormal: Vec<&ClassifiedValue> = classified.iter().filter(|c| c.is_abnormal()).collect();

    let recommendations = dedupe_preserving_order(
        abnormal
            .iter()
            .flat_map(|c| c.dietary_recommendations().iter().cloned())
            .chain(interactions.dietary_recommendations()),
    );

    let severity = abnormal
        .iter()
        .filter_map(|c| c.severity())
        .max()
        .unwrap_or(Severity::Normal);

    let mut concerns: Vec<String> = abnormal
        .iter()
        .map(|c| {
            format!(
                "{}: {} {} ({})",
                c.parameter,
                c.value,
                c.unit,
                c.status_token().unwrap_or_default()
            )
        })
        .collect();
    concerns.extend(interactions.drug_interactions.iter().map(|d| {
        format!(
            "{} + {}: {} interaction. {}",
            d.pair.0, d.pair.1, d.severity, d.description
        )
    }));

    let possible_conditions = dedupe_preserving_order(
        condition_tags
            .iter()
            .copied()
            .chain(abnormal.iter().flat_map(|c| c.possible_conditions().iter().copied())),
    );

    let mut warnings: Vec<EngineWarning> = classified.iter().filter_map(|c| c.warning()).collect();
    warnings.extend(interactions.warnings());

    let summary = summarize(
        classified.len(),
        abnormal.len(),
        interactions.drug_interactions.len(),
        severity,
    );

    tracing::info!(
        "Aggregated report: {} concerns, {} recommendations, severity {}",
        concerns.len(),
        recommendations.len(),
        severity
    );

    Report {
        summary,
        concerns,
        recommendations,
        severity,
        possible_conditions,
        warnings,
        narrative: None,
    }
}

fn summarize(total: usize, abnormal: usize, interactions: usize, severity: Severity) -> String {
    let values = match (total, abnormal) {
        (0, _) => "No lab values were provided".to_string(),
        (_, 0) => format!("All {} lab values are within their normal ranges", total),
        (_, n) => format!("{} of {} lab values are outside their normal ranges", n, total),
    };
    let interactions = match interactions {
        0 => "no drug interactions were found".to_string(),
        1 => "1 drug interaction was found".to_string(),
        n => format!("{} drug interactions were found", n),
    };
    format!("{} and {}. Overall severity: {}.", values, interactions, severity)
}
