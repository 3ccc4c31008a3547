//! Selection of predefined meal plans for a set of conditions.

use crate::catalog::normalize_key;
use crate::classifier::ClassifiedValue;
use crate::types::{ConditionTag, LabTrigger, MealPlanCatalog, PredefinedMealPlan};
use serde::Serialize;
use std::collections::HashSet;

/// A candidate plan and what selected it
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct MealPlanMatch<'a> {
    pub plan: &'a PredefinedMealPlan,
    /// Plan targets present in the input tags, in plan order
    pub matched_conditions: Vec<ConditionTag>,
    /// Plan lab triggers hit by a classified value, in plan order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matched_lab_triggers: Vec<&'a LabTrigger>,
}

/// Active plans that target at least one tag and conflict with no medication
///
/// Medication exclusion happens before ordering, so a higher-priority plan
/// never displaces an eligible one once excluded. The sort is stable by
/// descending priority; equal priorities keep catalog order.
pub fn match_meal_plans<'a, S: AsRef<str>>(
    condition_tags: &[ConditionTag],
    medication_ids: &[S],
    plans: &'a MealPlanCatalog,
) -> Vec<MealPlanMatch<'a>> {
    match_meal_plans_with_labs(condition_tags, &[], medication_ids, plans)
}

/// Like [`match_meal_plans`], but a plan is also selected when one of its lab
/// triggers matches a classified value's canonical parameter and status
pub fn match_meal_plans_with_labs<'a, S: AsRef<str>>(
    condition_tags: &[ConditionTag],
    classified: &[ClassifiedValue],
    medication_ids: &[S],
    plans: &'a MealPlanCatalog,
) -> Vec<MealPlanMatch<'a>> {
    let medications: HashSet<String> = medication_ids
        .iter()
        .map(|m| normalize_key(m.as_ref()))
        .filter(|m| !m.is_empty())
        .collect();

    let findings: HashSet<(String, &str)> = classified
        .iter()
        .filter_map(|c| c.status_token().map(|status| (normalize_key(&c.parameter), status)))
        .collect();

    let mut matches: Vec<MealPlanMatch<'a>> = plans
        .plans
        .iter()
        .filter(|plan| plan.is_active)
        .filter_map(|plan| {
            let matched_conditions: Vec<ConditionTag> = plan
                .target_conditions
                .iter()
                .copied()
                .filter(|t| condition_tags.contains(t))
                .collect();
            let matched_lab_triggers: Vec<&LabTrigger> = plan
                .lab_triggers
                .iter()
                .filter(|t| findings.contains(&(normalize_key(&t.parameter), t.status_token.as_str())))
                .collect();
            if matched_conditions.is_empty() && matched_lab_triggers.is_empty() {
                return None;
            }

            if let Some(conflict) = plan
                .incompatible_medicines
                .iter()
                .find(|m| medications.contains(&normalize_key(m)))
            {
                tracing::debug!("Excluding meal plan '{}': incompatible with {}", plan.id, conflict);
                return None;
            }

            Some(MealPlanMatch {
                plan,
                matched_conditions,
                matched_lab_triggers,
            })
        })
        .collect();

    matches.sort_by(|a, b| b.plan.priority.cmp(&a.plan.priority));

    tracing::debug!("Matched {} meal plans", matches.len());
    matches
}
