//! Trend analysis of lab parameters across panel history.
//!
//! Each parameter is compared between its earliest and latest measurement:
//! - the relative change is graded against the configured thresholds
//! - the direction follows the rule's polarity
//! - directions roll up into an overall progression weighted by the latest
//!   severity of each parameter

use crate::classifier::{classify, match_interpretation, ClassificationOutcome};
use crate::config::TrendConfig;
use crate::types::{LabPanel, LabParameterRule, Polarity, RuleCatalog, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Stable,
    Worsening,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendDirection::Improving => "improving",
            TrendDirection::Stable => "stable",
            TrendDirection::Worsening => "worsening",
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Significance {
    Negligible,
    Moderate,
    Significant,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub taken_at: DateTime<Utc>,
    pub value: f64,
}

/// One parameter's values in the rule's unit, oldest first
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterHistory {
    pub parameter: String,
    pub points: Vec<TrendPoint>,
}

impl ParameterHistory {
    pub fn new(parameter: impl Into<String>, mut points: Vec<TrendPoint>) -> Self {
        points.sort_by_key(|p| p.taken_at);
        Self {
            parameter: parameter.into(),
            points,
        }
    }

    /// Gather one parameter from every active panel
    ///
    /// Entries are matched through the rule catalog (so aliases count) and
    /// converted to the rule's unit. Entries whose unit cannot be converted
    /// are left out.
    pub fn from_panels(parameter_key: &str, panels: &[LabPanel], rules: &RuleCatalog) -> Self {
        let canonical = rules
            .find_rule(parameter_key)
            .map(|r| r.key.clone())
            .unwrap_or_else(|| parameter_key.to_string());

        let mut points = Vec::new();
        for panel in panels.iter().filter(|p| p.is_active()) {
            for entry in &panel.entries {
                let classified = classify(&entry.parameter, entry.value, &entry.unit, rules);
                if classified.parameter != canonical {
                    continue;
                }
                match classified.outcome {
                    ClassificationOutcome::UnitMismatch { .. } => {
                        tracing::warn!(
                            "Skipping {} from panel {}: cannot convert {}",
                            canonical,
                            panel.id,
                            entry.unit
                        );
                    }
                    _ => points.push(TrendPoint {
                        taken_at: panel.taken_at,
                        value: classified.value,
                    }),
                }
            }
        }

        Self::new(canonical, points)
    }
}

/// Comparison of the earliest and latest values of one parameter
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterTrend {
    pub parameter: String,
    pub earliest: TrendPoint,
    pub latest: TrendPoint,
    pub data_points: usize,
    /// Relative change; `None` when the earliest value is zero
    pub percent_change: Option<f64>,
    pub significance: Significance,
    pub direction: TrendDirection,
    pub latest_severity: Severity,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendResult {
    Analyzed(ParameterTrend),
    InsufficientData { parameter: String, available: usize },
}

impl TrendResult {
    pub fn parameter(&self) -> &str {
        match self {
            TrendResult::Analyzed(trend) => &trend.parameter,
            TrendResult::InsufficientData { parameter, .. } => parameter,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TrendReport {
    pub trends: Vec<TrendResult>,
    /// `None` when no parameter had enough data
    pub overall_progression: Option<TrendDirection>,
}

fn grade(percent_change: Option<f64>, earliest: f64, latest: f64, config: &TrendConfig) -> Significance {
    match percent_change {
        Some(pct) => {
            let magnitude = pct.abs();
            if magnitude < config.negligible_below {
                Significance::Negligible
            } else if magnitude > config.significant_above {
                Significance::Significant
            } else {
                Significance::Moderate
            }
        }
        // Zero baseline: any movement at all is significant
        None if latest != earliest => Significance::Significant,
        None => Significance::Negligible,
    }
}

fn direction_of(rule: &LabParameterRule, earliest: f64, latest: f64) -> TrendDirection {
    let better = match rule.polarity {
        Polarity::HigherIsBetter => latest.partial_cmp(&earliest),
        Polarity::LowerIsBetter => earliest.partial_cmp(&latest),
        Polarity::RangeIsBetter => {
            let mid = rule.normal_range.midpoint();
            (earliest - mid).abs().partial_cmp(&(latest - mid).abs())
        }
    };
    match better {
        Some(std::cmp::Ordering::Greater) => TrendDirection::Improving,
        Some(std::cmp::Ordering::Less) => TrendDirection::Worsening,
        _ => TrendDirection::Stable,
    }
}

/// Analyze one parameter's history against its rule
pub fn analyze_trends(history: &ParameterHistory, rule: &LabParameterRule, config: &TrendConfig) -> TrendResult {
    let (earliest, latest) = match (history.points.first(), history.points.last()) {
        (Some(first), Some(last)) if history.points.len() >= 2 => (*first, *last),
        _ => {
            tracing::debug!(
                "Not enough data for {} trend ({} points)",
                history.parameter,
                history.points.len()
            );
            return TrendResult::InsufficientData {
                parameter: history.parameter.clone(),
                available: history.points.len(),
            };
        }
    };

    let percent_change = if earliest.value == 0.0 {
        None
    } else {
        Some((latest.value - earliest.value) / earliest.value.abs())
    };
    let significance = grade(percent_change, earliest.value, latest.value, config);

    let direction = if significance == Significance::Negligible {
        TrendDirection::Stable
    } else {
        direction_of(rule, earliest.value, latest.value)
    };

    let latest_severity = match match_interpretation(rule, latest.value, None) {
        ClassificationOutcome::Matched { severity, .. } => severity,
        _ => Severity::Normal,
    };

    tracing::debug!(
        "{}: {} -> {} ({:?}, {:?})",
        history.parameter,
        earliest.value,
        latest.value,
        significance,
        direction
    );

    TrendResult::Analyzed(ParameterTrend {
        parameter: history.parameter.clone(),
        earliest,
        latest,
        data_points: history.points.len(),
        percent_change,
        significance,
        direction,
        latest_severity,
    })
}

/// Analyze every rule-backed parameter that appears in the active panels
///
/// Parameters are reported in order of first appearance in the
/// chronological history. Parameters with no rule are skipped.
pub fn analyze_trend_set(panels: &[LabPanel], rules: &RuleCatalog, config: &TrendConfig) -> TrendReport {
    let mut ordered: Vec<&LabPanel> = panels.iter().filter(|p| p.is_active()).collect();
    ordered.sort_by_key(|p| p.taken_at);

    let mut parameters: Vec<&LabParameterRule> = Vec::new();
    for panel in &ordered {
        for entry in &panel.entries {
            match rules.find_rule(&entry.parameter) {
                Some(rule) => {
                    if !parameters.iter().any(|r| r.key == rule.key) {
                        parameters.push(rule);
                    }
                }
                None => tracing::debug!("No rule for '{}', skipping trend", entry.parameter),
            }
        }
    }

    let trends: Vec<TrendResult> = parameters
        .iter()
        .map(|rule| {
            let history = ParameterHistory::from_panels(&rule.key, panels, rules);
            analyze_trends(&history, rule, config)
        })
        .collect();

    let overall_progression = overall_progression(&trends);
    tracing::info!(
        "Analyzed {} parameter trends, overall {:?}",
        trends.len(),
        overall_progression
    );

    TrendReport {
        trends,
        overall_progression,
    }
}

/// Direction with the largest severity-weighted total
///
/// Ties resolve toward the more cautious reading: worsening, then stable.
pub fn overall_progression(trends: &[TrendResult]) -> Option<TrendDirection> {
    let mut totals = [
        (TrendDirection::Worsening, 0u32),
        (TrendDirection::Stable, 0u32),
        (TrendDirection::Improving, 0u32),
    ];
    let mut analyzed = 0;

    for trend in trends {
        if let TrendResult::Analyzed(t) = trend {
            analyzed += 1;
            if let Some(slot) = totals.iter_mut().find(|(d, _)| *d == t.direction) {
                slot.1 += t.latest_severity.weight();
            }
        }
    }

    if analyzed == 0 {
        return None;
    }

    let mut best = totals[0];
    for candidate in &totals[1..] {
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }
    Some(best.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalogs;
    use crate::types::PanelEntry;
    use chrono::{Duration, TimeZone};

    fn at(day: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap() + Duration::days(day)
    }

    fn history(parameter: &str, values: &[(i64, f64)]) -> ParameterHistory {
        ParameterHistory::new(
            parameter,
            values
                .iter()
                .map(|(day, value)| TrendPoint {
                    taken_at: at(*day),
                    value: *value,
                })
                .collect(),
        )
    }

    fn rule(key: &str) -> &'static LabParameterRule {
        get_default_catalogs().rules.find_rule(key).unwrap()
    }

    fn analyzed(result: TrendResult) -> ParameterTrend {
        match result {
            TrendResult::Analyzed(t) => t,
            other => panic!("expected analyzed trend, got {:?}", other),
        }
    }

    #[test]
    fn test_lower_is_better_drop_is_improving() {
        let config = TrendConfig::default();
        let trend = analyzed(analyze_trends(
            &history("fasting_glucose", &[(0, 140.0), (30, 118.0), (60, 105.0)]),
            rule("fasting_glucose"),
            &config,
        ));

        assert_eq!(trend.direction, TrendDirection::Improving);
        assert_eq!(trend.significance, Significance::Significant);
        assert_eq!(trend.data_points, 3);
        assert!((trend.percent_change.unwrap() + 0.25).abs() < 1e-9);
        assert_eq!(trend.latest_severity, Severity::Moderate);
    }

    #[test]
    fn test_higher_is_better_drop_is_worsening() {
        let trend = analyzed(analyze_trends(
            &history("hdl", &[(0, 50.0), (90, 44.0)]),
            rule("hdl"),
            &TrendConfig::default(),
        ));
        assert_eq!(trend.significance, Significance::Moderate);
        assert_eq!(trend.direction, TrendDirection::Worsening);
    }

    #[test]
    fn test_negligible_change_is_stable() {
        let trend = analyzed(analyze_trends(
            &history("fasting_glucose", &[(0, 100.0), (10, 104.0)]),
            rule("fasting_glucose"),
            &TrendConfig::default(),
        ));
        assert_eq!(trend.significance, Significance::Negligible);
        assert_eq!(trend.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_thresholds_come_from_config() {
        let hist = history("fasting_glucose", &[(0, 100.0), (10, 110.0)]);
        let default = analyzed(analyze_trends(&hist, rule("fasting_glucose"), &TrendConfig::default()));
        assert_eq!(default.significance, Significance::Moderate);

        let strict = TrendConfig {
            negligible_below: 0.01,
            significant_above: 0.08,
        };
        let strict = analyzed(analyze_trends(&hist, rule("fasting_glucose"), &strict));
        assert_eq!(strict.significance, Significance::Significant);

        let loose = TrendConfig {
            negligible_below: 0.2,
            significant_above: 0.5,
        };
        let loose = analyzed(analyze_trends(&hist, rule("fasting_glucose"), &loose));
        assert_eq!(loose.significance, Significance::Negligible);
        assert_eq!(loose.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_range_is_better_uses_distance_to_midpoint() {
        // Hemoglobin normal range 12-17, midpoint 14.5
        let toward = analyzed(analyze_trends(
            &history("hemoglobin", &[(0, 10.0), (60, 13.0)]),
            rule("hemoglobin"),
            &TrendConfig::default(),
        ));
        assert_eq!(toward.direction, TrendDirection::Improving);
        assert_eq!(toward.latest_severity, Severity::Normal);

        let away = analyzed(analyze_trends(
            &history("hemoglobin", &[(0, 15.0), (60, 11.0)]),
            rule("hemoglobin"),
            &TrendConfig::default(),
        ));
        assert_eq!(away.direction, TrendDirection::Worsening);

        let across = analyzed(analyze_trends(
            &history("hemoglobin", &[(0, 12.5), (60, 16.5)]),
            rule("hemoglobin"),
            &TrendConfig::default(),
        ));
        assert_eq!(across.significance, Significance::Significant);
        assert_eq!(across.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_zero_baseline() {
        let config = TrendConfig::default();
        let moved = analyzed(analyze_trends(&history("ldl", &[(0, 0.0), (5, 90.0)]), rule("ldl"), &config));
        assert_eq!(moved.percent_change, None);
        assert_eq!(moved.significance, Significance::Significant);
        assert_eq!(moved.direction, TrendDirection::Worsening);

        let flat = analyzed(analyze_trends(&history("ldl", &[(0, 0.0), (5, 0.0)]), rule("ldl"), &config));
        assert_eq!(flat.significance, Significance::Negligible);
        assert_eq!(flat.direction, TrendDirection::Stable);
    }

    #[test]
    fn test_insufficient_data() {
        let config = TrendConfig::default();
        assert_eq!(
            analyze_trends(&history("tsh", &[(0, 2.0)]), rule("tsh"), &config),
            TrendResult::InsufficientData {
                parameter: "tsh".into(),
                available: 1
            }
        );
        assert_eq!(
            analyze_trends(&history("tsh", &[]), rule("tsh"), &config),
            TrendResult::InsufficientData {
                parameter: "tsh".into(),
                available: 0
            }
        );
    }

    #[test]
    fn test_history_is_sorted_chronologically() {
        let hist = history("hdl", &[(30, 45.0), (0, 60.0), (15, 50.0)]);
        let values: Vec<f64> = hist.points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![60.0, 50.0, 45.0]);
    }

    #[test]
    fn test_from_panels_converts_and_skips_deleted() {
        let rules = &get_default_catalogs().rules;
        let mut deleted = LabPanel::new(at(20), vec![PanelEntry::new("glucose", 200.0, "mg/dL")]);
        deleted.deleted_at = Some(at(21));

        let panels = vec![
            LabPanel::new(at(40), vec![PanelEntry::new("fbs", 5.5, "mmol/L")]),
            deleted,
            LabPanel::new(
                at(0),
                vec![
                    PanelEntry::new("fasting_glucose", 130.0, "mg/dL"),
                    PanelEntry::new("hdl", 50.0, "mg/dL"),
                ],
            ),
            LabPanel::new(at(50), vec![PanelEntry::new("glucose", 6.0, "furlongs")]),
        ];

        let hist = ParameterHistory::from_panels("Fasting Glucose", &panels, rules);
        assert_eq!(hist.parameter, "fasting_glucose");
        assert_eq!(hist.points.len(), 2);
        assert_eq!(hist.points[0].value, 130.0);
        assert!((hist.points[1].value - 5.5 * 18.016).abs() < 1e-9);
    }

    #[test]
    fn test_overall_progression_weighted_by_severity() {
        let catalogs = get_default_catalogs();
        let panels = vec![
            LabPanel::new(
                at(0),
                vec![
                    PanelEntry::new("hemoglobin", 13.0, "g/dL"),
                    PanelEntry::new("hdl", 60.0, "mg/dL"),
                    PanelEntry::new("fasting_glucose", 110.0, "mg/dL"),
                    PanelEntry::new("platelets", 250.0, "10^3/uL"),
                ],
            ),
            LabPanel::new(
                at(90),
                vec![
                    PanelEntry::new("hemoglobin", 14.5, "g/dL"),
                    PanelEntry::new("hdl", 70.0, "mg/dL"),
                    PanelEntry::new("fasting_glucose", 140.0, "mg/dL"),
                    PanelEntry::new("tsh", 2.0, "mIU/L"),
                ],
            ),
        ];

        let report = analyze_trend_set(&panels, &catalogs.rules, &TrendConfig::default());
        let params: Vec<&str> = report.trends.iter().map(|t| t.parameter()).collect();
        assert_eq!(params, vec!["hemoglobin", "hdl", "fasting_glucose", "tsh"]);

        // Two improving normals (weight 1 each) against one concerning worsening (weight 4)
        assert_eq!(report.overall_progression, Some(TrendDirection::Worsening));
        assert!(matches!(report.trends[3], TrendResult::InsufficientData { available: 1, .. }));
    }

    #[test]
    fn test_overall_ties_prefer_worsening_then_stable() {
        let trend = |direction| {
            TrendResult::Analyzed(ParameterTrend {
                parameter: "x".into(),
                earliest: TrendPoint {
                    taken_at: at(0),
                    value: 1.0,
                },
                latest: TrendPoint {
                    taken_at: at(1),
                    value: 2.0,
                },
                data_points: 2,
                percent_change: Some(1.0),
                significance: Significance::Significant,
                direction,
                latest_severity: Severity::Mild,
            })
        };

        assert_eq!(
            overall_progression(&[trend(TrendDirection::Improving), trend(TrendDirection::Worsening)]),
            Some(TrendDirection::Worsening)
        );
        assert_eq!(
            overall_progression(&[trend(TrendDirection::Improving), trend(TrendDirection::Stable)]),
            Some(TrendDirection::Stable)
        );
        assert_eq!(overall_progression(&[]), None);
    }
}
