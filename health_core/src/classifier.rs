//! Range classification of single lab values.
//!
//! A value is resolved to its parameter rule, unit-checked (with optional
//! conversion), then matched against the rule's interpretations in declared
//! order. The first interpretation whose inclusive range contains the value
//! wins, even when ranges overlap or leave gaps. Adjacent bands may share a
//! boundary value; the band declared first owns it.
//!
//! Sex-specific bands are only considered when the subject's sex is known
//! and matches; unqualified bands apply to everyone.

use crate::catalog::normalize_unit;
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Why a value could not be given a status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnclassifiedReason {
    UnknownParameter,
    NoMatchingInterpretation,
}

/// Result of classifying one value against its rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClassificationOutcome {
    Matched {
        status_token: String,
        severity: Severity,
        meaning: String,
        possible_conditions: Vec<ConditionTag>,
        dietary_recommendations: Vec<String>,
        abnormal: bool,
    },
    Unclassified {
        reason: UnclassifiedReason,
    },
    UnitMismatch {
        expected: String,
    },
}

/// A classified lab value
///
/// `parameter` is the rule's canonical key when the parameter resolved, the
/// caller's key otherwise. When a unit conversion was applied, `value` and
/// `unit` are in the rule's unit and `source_unit` holds the reported unit.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedValue {
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_unit: Option<String>,
    #[serde(flatten)]
    pub outcome: ClassificationOutcome,
}

impl ClassifiedValue {
    pub fn is_abnormal(&self) -> bool {
        matches!(self.outcome, ClassificationOutcome::Matched { abnormal: true, .. })
    }

    pub fn status_token(&self) -> Option<&str> {
        match &self.outcome {
            ClassificationOutcome::Matched { status_token, .. } => Some(status_token),
            _ => None,
        }
    }

    pub fn severity(&self) -> Option<Severity> {
        match &self.outcome {
            ClassificationOutcome::Matched { severity, .. } => Some(*severity),
            _ => None,
        }
    }

    pub fn possible_conditions(&self) -> &[ConditionTag] {
        match &self.outcome {
            ClassificationOutcome::Matched {
                possible_conditions,
                ..
            } => possible_conditions,
            _ => &[],
        }
    }

    pub fn dietary_recommendations(&self) -> &[String] {
        match &self.outcome {
            ClassificationOutcome::Matched {
                dietary_recommendations,
                ..
            } => dietary_recommendations,
            _ => &[],
        }
    }

    /// Warning describing why this value has no status, if any
    pub fn warning(&self) -> Option<EngineWarning> {
        match &self.outcome {
            ClassificationOutcome::Unclassified {
                reason: UnclassifiedReason::UnknownParameter,
            } => Some(EngineWarning::UnknownParameter {
                parameter: self.parameter.clone(),
            }),
            ClassificationOutcome::Unclassified {
                reason: UnclassifiedReason::NoMatchingInterpretation,
            } => Some(EngineWarning::UnmatchedValue {
                parameter: self.parameter.clone(),
                value: self.value,
                unit: self.unit.clone(),
            }),
            ClassificationOutcome::UnitMismatch { expected } => Some(EngineWarning::UnitMismatch {
                parameter: self.parameter.clone(),
                expected: expected.clone(),
                found: self.unit.clone(),
            }),
            ClassificationOutcome::Matched { .. } => None,
        }
    }
}

/// Classify one raw lab value against the rule catalog
///
/// Never fails: unknown parameters and unmatched values come back as
/// `Unclassified`, and a unit with no conversion as `UnitMismatch`, with the
/// value preserved for display.
pub fn classify(parameter_key: &str, value: f64, unit: &str, rules: &RuleCatalog) -> ClassifiedValue {
    classify_for(parameter_key, value, unit, None, rules)
}

/// Classify one raw lab value for a subject of known (or unknown) sex
pub fn classify_for(
    parameter_key: &str,
    value: f64,
    unit: &str,
    sex: Option<Sex>,
    rules: &RuleCatalog,
) -> ClassifiedValue {
    let Some(rule) = rules.find_rule(parameter_key) else {
        tracing::debug!("No rule for lab parameter '{}'", parameter_key);
        return ClassifiedValue {
            parameter: parameter_key.to_string(),
            value,
            unit: unit.to_string(),
            source_unit: None,
            outcome: ClassificationOutcome::Unclassified {
                reason: UnclassifiedReason::UnknownParameter,
            },
        };
    };

    let mut classified = ClassifiedValue {
        parameter: rule.key.clone(),
        value,
        unit: if unit.trim().is_empty() {
            rule.unit.clone()
        } else {
            unit.to_string()
        },
        source_unit: None,
        outcome: ClassificationOutcome::Unclassified {
            reason: UnclassifiedReason::NoMatchingInterpretation,
        },
    };

    if normalize_unit(&classified.unit) != normalize_unit(&rule.unit) {
        match rules.conversion_factor(rule, &classified.unit) {
            Some(factor) => {
                tracing::debug!(
                    "Converted {} {} {} to {} (x{})",
                    rule.key,
                    value,
                    classified.unit,
                    rule.unit,
                    factor
                );
                classified.source_unit = Some(std::mem::replace(&mut classified.unit, rule.unit.clone()));
                classified.value = value * factor;
            }
            None => {
                tracing::warn!(
                    "Unit mismatch for {}: expected {}, got {}",
                    rule.key,
                    rule.unit,
                    classified.unit
                );
                classified.outcome = ClassificationOutcome::UnitMismatch {
                    expected: rule.unit.clone(),
                };
                return classified;
            }
        }
    }

    classified.outcome = match_interpretation(rule, classified.value, sex);
    classified
}

/// First applicable interpretation (in declared order) containing the value
pub(crate) fn match_interpretation(
    rule: &LabParameterRule,
    value: f64,
    sex: Option<Sex>,
) -> ClassificationOutcome {
    match rule
        .interpretations
        .iter()
        .find(|i| i.applies_to(sex) && i.range.contains(value))
    {
        Some(interp) => {
            tracing::debug!(
                "{} = {} classified as '{}' ({})",
                rule.key,
                value,
                interp.status_token,
                interp.severity
            );
            ClassificationOutcome::Matched {
                status_token: interp.status_token.clone(),
                severity: interp.severity,
                meaning: interp.meaning.clone(),
                possible_conditions: interp.possible_conditions.clone(),
                dietary_recommendations: interp.dietary_recommendations.clone(),
                abnormal: interp.status_token != rule.normal_token,
            }
        }
        None => {
            tracing::debug!("{} = {} matched no interpretation", rule.key, value);
            ClassificationOutcome::Unclassified {
                reason: UnclassifiedReason::NoMatchingInterpretation,
            }
        }
    }
}

/// Classify every entry of a panel, preserving panel order
pub fn classify_panel(panel: &LabPanel, rules: &RuleCatalog) -> Vec<ClassifiedValue> {
    classify_panel_for(panel, None, rules)
}

pub fn classify_panel_for(panel: &LabPanel, sex: Option<Sex>, rules: &RuleCatalog) -> Vec<ClassifiedValue> {
    panel
        .entries
        .iter()
        .map(|entry| classify_for(&entry.parameter, entry.value, &entry.unit, sex, rules))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::get_default_catalogs;

    fn single_rule(interpretations: Vec<Interpretation>, normal_range: (f64, f64), unit: &str) -> RuleCatalog {
        RuleCatalog {
            rules: vec![LabParameterRule {
                key: "hemoglobin".into(),
                name: "Hemoglobin".into(),
                aliases: vec!["hb".into()],
                unit: unit.into(),
                normal_range: ValueRange::new(normal_range.0, normal_range.1),
                normal_token: "normal".into(),
                interpretations,
                polarity: Polarity::RangeIsBetter,
            }],
            conversions: vec![],
        }
    }

    fn interp(min: f64, max: f64, token: &str, severity: Severity) -> Interpretation {
        Interpretation {
            range: ValueRange::new(min, max),
            status_token: token.into(),
            severity,
            meaning: String::new(),
            possible_conditions: vec![],
            dietary_recommendations: vec![],
            sex: None,
        }
    }

    #[test]
    fn test_low_hemoglobin_is_moderate() {
        let rules = single_rule(
            vec![
                interp(0.0, 12.0, "low", Severity::Moderate),
                interp(12.0, 17.0, "normal", Severity::Normal),
            ],
            (12.0, 17.0),
            "g/dL",
        );

        let result = classify("hemoglobin", 10.0, "g/dL", &rules);
        assert_eq!(result.status_token(), Some("low"));
        assert_eq!(result.severity(), Some(Severity::Moderate));
        assert!(result.is_abnormal());
    }

    #[test]
    fn test_values_in_normal_range_get_normal_token() {
        let rules = single_rule(
            vec![
                interp(0.0, 11.99, "low", Severity::Moderate),
                interp(12.0, 17.0, "normal", Severity::Normal),
                interp(17.01, 30.0, "high", Severity::Mild),
            ],
            (12.0, 17.0),
            "g/dL",
        );

        for value in [12.0, 13.3, 15.0, 16.99, 17.0] {
            let result = classify("hb", value, "g/dL", &rules);
            assert_eq!(result.status_token(), Some("normal"), "value {}", value);
            assert!(!result.is_abnormal());
        }
    }

    #[test]
    fn test_overlapping_ranges_first_declared_wins() {
        let first = single_rule(
            vec![
                interp(10.0, 20.0, "a", Severity::Mild),
                interp(15.0, 25.0, "b", Severity::Severe),
            ],
            (0.0, 30.0),
            "g/dL",
        );
        let second = single_rule(
            vec![
                interp(15.0, 25.0, "b", Severity::Severe),
                interp(10.0, 20.0, "a", Severity::Mild),
            ],
            (0.0, 30.0),
            "g/dL",
        );

        assert_eq!(classify("hemoglobin", 17.0, "g/dL", &first).status_token(), Some("a"));
        assert_eq!(classify("hemoglobin", 17.0, "g/dL", &second).status_token(), Some("b"));
    }

    #[test]
    fn test_gap_yields_unclassified() {
        let rules = single_rule(
            vec![
                interp(0.0, 10.0, "low", Severity::Mild),
                interp(12.0, 17.0, "normal", Severity::Normal),
            ],
            (12.0, 17.0),
            "g/dL",
        );

        let result = classify("hemoglobin", 11.0, "g/dL", &rules);
        assert_eq!(
            result.outcome,
            ClassificationOutcome::Unclassified {
                reason: UnclassifiedReason::NoMatchingInterpretation
            }
        );
        assert_eq!(result.value, 11.0);
        assert_eq!(
            result.warning(),
            Some(EngineWarning::UnmatchedValue {
                parameter: "hemoglobin".into(),
                value: 11.0,
                unit: "g/dL".into(),
            })
        );
    }

    #[test]
    fn test_shared_boundary_goes_to_first_declared_band() {
        let rules = single_rule(
            vec![
                interp(12.0, 17.0, "normal", Severity::Normal),
                interp(8.0, 12.0, "low", Severity::Moderate),
                interp(0.0, 8.0, "very_low", Severity::Severe),
            ],
            (12.0, 17.0),
            "g/dL",
        );

        assert_eq!(classify("hb", 12.0, "g/dL", &rules).status_token(), Some("normal"));
        assert_eq!(classify("hb", 11.995, "g/dL", &rules).status_token(), Some("low"));
        assert_eq!(classify("hb", 8.0, "g/dL", &rules).status_token(), Some("low"));
        assert_eq!(classify("hb", 7.9999, "g/dL", &rules).status_token(), Some("very_low"));
    }

    #[test]
    fn test_converted_values_near_band_edges_are_classified() {
        let catalog = &get_default_catalogs().rules;
        let cases = [
            ("creatinine", 115.5, "umol/L", "high"),
            ("creatinine", 115.0, "umol/L", "normal"),
            ("vitamin_d", 74.99, "nmol/L", "low"),
            ("vitamin_d", 75.0, "nmol/L", "normal"),
            ("glucose", 5.5508, "mmol/L", "high"),
            ("hemoglobin", 119.95, "g/L", "low"),
            ("tsh", 0.395, "mIU/L", "low"),
            ("fasting_glucose", 100.005, "mg/dL", "high"),
        ];

        for (parameter, value, unit, expected) in cases {
            let result = classify(parameter, value, unit, catalog);
            assert_eq!(
                result.status_token(),
                Some(expected),
                "{} {} {} -> {}",
                parameter,
                value,
                unit,
                result.value
            );
            assert!(result.warning().is_none());
        }
    }

    #[test]
    fn test_sex_specific_band_needs_matching_sex() {
        let mut male_low = interp(12.0, 13.5, "low", Severity::Mild);
        male_low.sex = Some(Sex::Male);
        let rules = single_rule(
            vec![
                male_low,
                interp(12.0, 17.0, "normal", Severity::Normal),
                interp(0.0, 12.0, "low", Severity::Moderate),
            ],
            (12.0, 17.0),
            "g/dL",
        );

        let male = classify_for("hemoglobin", 12.8, "g/dL", Some(Sex::Male), &rules);
        assert_eq!(male.status_token(), Some("low"));
        assert_eq!(male.severity(), Some(Severity::Mild));

        let female = classify_for("hemoglobin", 12.8, "g/dL", Some(Sex::Female), &rules);
        assert_eq!(female.status_token(), Some("normal"));
        assert_eq!(classify("hemoglobin", 12.8, "g/dL", &rules).status_token(), Some("normal"));
    }

    #[test]
    fn test_unknown_parameter_preserves_value() {
        let result = classify("platelets", 250.0, "10^3/uL", &get_default_catalogs().rules);
        assert_eq!(result.parameter, "platelets");
        assert_eq!(result.value, 250.0);
        assert_eq!(
            result.warning(),
            Some(EngineWarning::UnknownParameter {
                parameter: "platelets".into()
            })
        );
    }

    #[test]
    fn test_unit_mismatch_is_field_level() {
        let catalog = &get_default_catalogs().rules;
        let panel = LabPanel::new(
            chrono::Utc::now(),
            vec![
                PanelEntry::new("hemoglobin", 10.0, "mmol/L"),
                PanelEntry::new("fasting_glucose", 130.0, "mg/dL"),
            ],
        );

        let results = classify_panel(&panel, catalog);
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].outcome,
            ClassificationOutcome::UnitMismatch { ref expected } if expected == "g/dL"
        ));
        assert!(results[1].is_abnormal());
    }

    #[test]
    fn test_unit_conversion_applies() {
        let catalog = &get_default_catalogs().rules;
        // 7.2 mmol/L is roughly 130 mg/dL
        let result = classify("glucose", 7.2, "mmol/L", catalog);
        assert_eq!(result.unit, "mg/dL");
        assert_eq!(result.source_unit.as_deref(), Some("mmol/L"));
        assert!((result.value - 129.7152).abs() < 1e-6);
        assert_eq!(result.status_token(), Some("very_high"));
    }

    #[test]
    fn test_empty_unit_uses_rule_unit() {
        let catalog = &get_default_catalogs().rules;
        let result = classify("hemoglobin", 14.0, "", catalog);
        assert_eq!(result.unit, "g/dL");
        assert_eq!(result.status_token(), Some("normal"));
    }

    #[test]
    fn test_unit_comparison_ignores_case_and_spacing() {
        let catalog = &get_default_catalogs().rules;
        let result = classify("tsh", 6.0, "miu/l", catalog);
        assert_eq!(result.status_token(), Some("high"));
    }
}
