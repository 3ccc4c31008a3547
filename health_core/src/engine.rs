//! Evaluation of a profile snapshot against the reference catalogs.
//!
//! `evaluate` runs the full sequence over one snapshot:
//! 1. Classify every value of the latest active panel
//! 2. Map diagnosed conditions to tags
//! 3. Check medication interactions
//! 4. Aggregate the report
//! 5. Match meal plans against diagnosed and lab-derived conditions and lab
//!    triggers
//! 6. Analyze trends across the panel history

use crate::aggregator::{aggregate_recommendations, dedupe_preserving_order, Report};
use crate::classifier::{classify_panel_for, ClassifiedValue};
use crate::conditions::{condition_tags, resolve_conditions, ResolvedCondition};
use crate::interactions::{check_interactions, InteractionReport};
use crate::meal_plans::{match_meal_plans_with_labs, MealPlanMatch};
use crate::profile::ProfileSnapshot;
use crate::trends::{analyze_trend_set, TrendReport};
use crate::{Catalogs, Config, EngineWarning};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Everything one evaluation produces
#[derive(Clone, Debug, Serialize)]
pub struct HealthAnalysis<'a> {
    pub evaluated_at: DateTime<Utc>,
    /// Panel the lab findings come from, if the snapshot had one
    pub panel_id: Option<Uuid>,
    pub classified: Vec<ClassifiedValue>,
    pub conditions: Vec<ResolvedCondition>,
    pub interactions: InteractionReport,
    pub report: Report,
    pub meal_plans: Vec<MealPlanMatch<'a>>,
    pub trends: TrendReport,
}

/// Evaluate a snapshot
///
/// Never fails on data problems; those come back as warnings on the report.
pub fn evaluate<'a>(snapshot: &ProfileSnapshot, catalogs: &'a Catalogs, config: &Config) -> HealthAnalysis<'a> {
    let latest = snapshot.latest_panel();
    let classified = match latest {
        Some(panel) => classify_panel_for(panel, snapshot.sex, &catalogs.rules),
        None => {
            tracing::debug!("Snapshot has no active lab panel");
            Vec::new()
        }
    };

    let conditions = resolve_conditions(&snapshot.conditions, &catalogs.conditions);
    let tags = condition_tags(&conditions);

    let interactions = check_interactions(&snapshot.medications, &catalogs.medicines);

    let mut report = aggregate_recommendations(&classified, &interactions, &tags);
    report.warnings.extend(
        conditions
            .iter()
            .filter(|c| c.tag.is_none())
            .map(|c| EngineWarning::UnresolvedCondition { name: c.name.clone() }),
    );

    // Plans list incompatible medicines by any name, so pass raw and canonical
    let medication_names = dedupe_preserving_order(
        snapshot
            .medications
            .iter()
            .map(String::as_str)
            .chain(interactions.resolved_medicines()),
    );
    let meal_plans = match_meal_plans_with_labs(
        &report.possible_conditions,
        &classified,
        &medication_names,
        &catalogs.meal_plans,
    );

    let trends = analyze_trend_set(&snapshot.panels, &catalogs.rules, &config.trends);

    tracing::info!(
        "Evaluation complete: severity {}, {} warnings, {} meal plans, {} trends",
        report.severity,
        report.warnings.len(),
        meal_plans.len(),
        trends.trends.len()
    );

    HealthAnalysis {
        evaluated_at: Utc::now(),
        panel_id: latest.map(|p| p.id),
        classified,
        conditions,
        interactions,
        report,
        meal_plans,
        trends,
    }
}
