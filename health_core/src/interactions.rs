//! Drug-drug and drug-food interaction checking.
//!
//! Medications are resolved against the medicine catalog, deduplicated and
//! sorted by canonical name before any pairing, so the report does not
//! depend on the order of the input list.

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An interaction between two distinct resolved medicines
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugInteractionFinding {
    /// Canonical names, alphabetically ordered
    pub pair: (String, String),
    pub severity: Severity,
    pub description: String,
}

/// Single-medicine guidance gathered from its record
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodInteractionSummary {
    pub medicine: String,
    pub interactions: Vec<FoodInteraction>,
    pub dietary_recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct InteractionReport {
    pub drug_interactions: Vec<DrugInteractionFinding>,
    pub food_interactions: Vec<FoodInteractionSummary>,
    /// Identifiers that matched no medicine record, sorted and distinct
    pub unresolved: Vec<String>,
}

impl InteractionReport {
    /// Canonical names of every resolved medicine
    pub fn resolved_medicines(&self) -> impl Iterator<Item = &str> {
        self.food_interactions.iter().map(|f| f.medicine.as_str())
    }

    /// Dietary advice derived from the resolved medicines, in report order
    ///
    /// Per medicine: its dietary recommendations, then "Avoid ..." and
    /// "Limit ..." lines for avoid/limit food interactions.
    pub fn dietary_recommendations(&self) -> Vec<String> {
        let mut out = Vec::new();
        for summary in &self.food_interactions {
            out.extend(summary.dietary_recommendations.iter().cloned());
            for interaction in &summary.interactions {
                match interaction.kind {
                    FoodInteractionKind::Avoid => out.push(format!("Avoid {}", interaction.food)),
                    FoodInteractionKind::Limit => out.push(format!("Limit {}", interaction.food)),
                    FoodInteractionKind::Caution | FoodInteractionKind::Timing => {}
                }
            }
        }
        out
    }

    /// Highest drug-drug interaction severity, if any pair interacts
    pub fn max_severity(&self) -> Option<Severity> {
        self.drug_interactions.iter().map(|d| d.severity).max()
    }

    pub fn warnings(&self) -> Vec<EngineWarning> {
        self.unresolved
            .iter()
            .map(|identifier| EngineWarning::UnresolvedMedicineAlias {
                identifier: identifier.clone(),
            })
            .collect()
    }
}

/// Check every resolved medication pair and gather per-medicine guidance
///
/// Unresolved identifiers are reported but never block the rest of the
/// report. When both records of a pair hold an entry for the other, the
/// higher severity wins.
pub fn check_interactions<S: AsRef<str>>(
    medication_ids: &[S],
    medicines: &MedicineCatalog,
) -> InteractionReport {
    let mut resolved: Vec<&MedicineRecord> = Vec::new();
    let mut unresolved = BTreeSet::new();

    for id in medication_ids {
        let id = id.as_ref().trim();
        if id.is_empty() {
            continue;
        }
        match medicines.resolve(id) {
            Some(record) => {
                if !resolved.iter().any(|r| r.name == record.name) {
                    resolved.push(record);
                }
            }
            None => {
                tracing::warn!("Unknown medication '{}', excluded from interaction check", id);
                unresolved.insert(id.to_string());
            }
        }
    }

    resolved.sort_by(|a, b| a.name.cmp(&b.name));

    let mut drug_interactions = Vec::new();
    for (i, a) in resolved.iter().enumerate() {
        for b in &resolved[i + 1..] {
            if let Some(finding) = pair_interaction(a, b) {
                tracing::debug!(
                    "Interaction {} + {}: {}",
                    finding.pair.0,
                    finding.pair.1,
                    finding.severity
                );
                drug_interactions.push(finding);
            }
        }
    }

    let food_interactions = resolved
        .iter()
        .map(|record| FoodInteractionSummary {
            medicine: record.name.clone(),
            interactions: record.food_interactions.clone(),
            dietary_recommendations: record.dietary_recommendations.clone(),
            warnings: record.warnings.clone(),
        })
        .collect();

    tracing::info!(
        "Checked {} medications: {} resolved, {} interactions, {} unresolved",
        medication_ids.len(),
        resolved.len(),
        drug_interactions.len(),
        unresolved.len()
    );

    InteractionReport {
        drug_interactions,
        food_interactions,
        unresolved: unresolved.into_iter().collect(),
    }
}

/// Entry that `holder` stores about `other`, matched by name or alias
fn entry_about<'a>(holder: &'a MedicineRecord, other: &MedicineRecord) -> Option<&'a DrugInteractionEntry> {
    let mut matches: Vec<(&String, &DrugInteractionEntry)> = holder
        .drug_interactions
        .iter()
        .filter(|(name, _)| other.is_known_as(name))
        .collect();
    // HashMap order is unspecified; pick deterministically
    matches.sort_by(|x, y| y.1.severity.cmp(&x.1.severity).then_with(|| x.0.cmp(y.0)));
    matches.first().map(|(_, entry)| *entry)
}

/// `a` must sort before `b`
fn pair_interaction(a: &MedicineRecord, b: &MedicineRecord) -> Option<DrugInteractionFinding> {
    let entry = match (entry_about(a, b), entry_about(b, a)) {
        (Some(x), Some(y)) => {
            if x.severity != y.severity {
                tracing::debug!(
                    "{} and {} disagree on severity ({} vs {}), using the higher",
                    a.name,
                    b.name,
                    x.severity,
                    y.severity
                );
            }
            if y.severity > x.severity {
                y
            } else {
                x
            }
        }
        (Some(x), None) => x,
        (None, Some(y)) => y,
        (None, None) => return None,
    };

    Some(DrugInteractionFinding {
        pair: (a.name.clone(), b.name.clone()),
        severity: entry.severity,
        description: entry.description.clone(),
    })
}
