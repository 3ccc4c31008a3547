//! Core domain types for the health rule engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Severity tiers and trend polarity
//! - Lab parameter rules and the rule catalog
//! - Medicine records and the medicine catalog
//! - Canonical condition tags and the alias table
//! - Predefined meal plans
//! - Lab panels, medications and diagnosed conditions
//! - Non-fatal evaluation warnings

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Severity and Polarity
// ============================================================================

/// Ordered severity tier shared by lab interpretations and interactions
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Normal,
    Mild,
    Moderate,
    Concerning,
    Severe,
    #[serde(alias = "contraindicated")]
    Critical,
}

impl Severity {
    /// Weight used when rolling trend directions up into an overall progression
    pub fn weight(self) -> u32 {
        self as u32 + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Concerning => "concerning",
            Severity::Severe => "severe",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which direction of change is clinically preferable for a parameter
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
    #[default]
    RangeIsBetter,
}

/// Biological sex, used to pick sex-specific interpretation bands
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Female,
    Male,
}

impl Sex {
    pub const ALL: [Sex; 2] = [Sex::Female, Sex::Male];

    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Lab Rules
// ============================================================================

/// Inclusive numeric range
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// One rule entry mapping a numeric range to a status and advice
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Interpretation {
    pub range: ValueRange,
    pub status_token: String,
    pub severity: Severity,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub possible_conditions: Vec<ConditionTag>,
    #[serde(default)]
    pub dietary_recommendations: Vec<String>,
    /// Restricts the band to one sex; unqualified bands apply to everyone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
}

impl Interpretation {
    /// True if the band is considered for a subject of the given sex
    ///
    /// Sex-specific bands are skipped when the sex is unknown.
    pub fn applies_to(&self, sex: Option<Sex>) -> bool {
        match self.sex {
            None => true,
            Some(required) => sex == Some(required),
        }
    }
}

/// Interpretation rule for a single lab parameter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LabParameterRule {
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub unit: String,
    pub normal_range: ValueRange,
    #[serde(default = "default_normal_token")]
    pub normal_token: String,
    pub interpretations: Vec<Interpretation>,
    #[serde(default)]
    pub polarity: Polarity,
}

fn default_normal_token() -> String {
    "normal".into()
}

/// Multiplicative conversion from a reported unit into a rule's unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnitConversion {
    /// Restricts the conversion to one parameter key; `None` applies to all
    #[serde(default)]
    pub parameter: Option<String>,
    pub from: String,
    pub to: String,
    pub factor: f64,
}

/// The lab rule catalog plus its unit conversion table
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RuleCatalog {
    #[serde(default)]
    pub rules: Vec<LabParameterRule>,
    #[serde(default)]
    pub conversions: Vec<UnitConversion>,
}

// ============================================================================
// Medicines
// ============================================================================

/// How a food relates to a medicine
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FoodInteractionKind {
    Avoid,
    Limit,
    Caution,
    Timing,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FoodInteraction {
    pub food: String,
    pub kind: FoodInteractionKind,
    #[serde(default)]
    pub description: String,
}

/// Drug-drug interaction entry stored on one side of the pair
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrugInteractionEntry {
    pub severity: Severity,
    pub description: String,
}

/// A medicine with its aliases, interactions and dietary guidance
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicineRecord {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Keyed by the other medicine's name (or one of its aliases)
    #[serde(default)]
    pub drug_interactions: HashMap<String, DrugInteractionEntry>,
    #[serde(default)]
    pub food_interactions: Vec<FoodInteraction>,
    #[serde(default)]
    pub dietary_recommendations: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MedicineCatalog {
    #[serde(default)]
    pub medicines: Vec<MedicineRecord>,
}

// ============================================================================
// Conditions
// ============================================================================

/// Canonical condition tag (fixed vocabulary)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTag {
    DiabetesType1,
    DiabetesType2,
    Prediabetes,
    HighCholesterol,
    HighBloodPressure,
    HeartDisease,
    KidneyDisease,
    FattyLiver,
    IronDeficiency,
    VitaminDDeficiency,
    VitaminB12Deficiency,
    Hypothyroid,
    Hyperthyroid,
    Gout,
    Obesity,
    Underweight,
    GeneralHealthy,
    WeightLoss,
    Pregnancy,
}

impl ConditionTag {
    pub const ALL: [ConditionTag; 19] = [
        ConditionTag::DiabetesType1,
        ConditionTag::DiabetesType2,
        ConditionTag::Prediabetes,
        ConditionTag::HighCholesterol,
        ConditionTag::HighBloodPressure,
        ConditionTag::HeartDisease,
        ConditionTag::KidneyDisease,
        ConditionTag::FattyLiver,
        ConditionTag::IronDeficiency,
        ConditionTag::VitaminDDeficiency,
        ConditionTag::VitaminB12Deficiency,
        ConditionTag::Hypothyroid,
        ConditionTag::Hyperthyroid,
        ConditionTag::Gout,
        ConditionTag::Obesity,
        ConditionTag::Underweight,
        ConditionTag::GeneralHealthy,
        ConditionTag::WeightLoss,
        ConditionTag::Pregnancy,
    ];

    /// Stable identifier, identical to the serialized form
    pub fn key(self) -> &'static str {
        match self {
            ConditionTag::DiabetesType1 => "diabetes_type1",
            ConditionTag::DiabetesType2 => "diabetes_type2",
            ConditionTag::Prediabetes => "prediabetes",
            ConditionTag::HighCholesterol => "high_cholesterol",
            ConditionTag::HighBloodPressure => "high_blood_pressure",
            ConditionTag::HeartDisease => "heart_disease",
            ConditionTag::KidneyDisease => "kidney_disease",
            ConditionTag::FattyLiver => "fatty_liver",
            ConditionTag::IronDeficiency => "iron_deficiency",
            ConditionTag::VitaminDDeficiency => "vitamin_d_deficiency",
            ConditionTag::VitaminB12Deficiency => "vitamin_b12_deficiency",
            ConditionTag::Hypothyroid => "hypothyroid",
            ConditionTag::Hyperthyroid => "hyperthyroid",
            ConditionTag::Gout => "gout",
            ConditionTag::Obesity => "obesity",
            ConditionTag::Underweight => "underweight",
            ConditionTag::GeneralHealthy => "general_healthy",
            ConditionTag::WeightLoss => "weight_loss",
            ConditionTag::Pregnancy => "pregnancy",
        }
    }

    /// Human-readable label, lowercase
    pub fn label(self) -> &'static str {
        match self {
            ConditionTag::DiabetesType1 => "type 1 diabetes",
            ConditionTag::DiabetesType2 => "type 2 diabetes",
            ConditionTag::Prediabetes => "prediabetes",
            ConditionTag::HighCholesterol => "high cholesterol",
            ConditionTag::HighBloodPressure => "high blood pressure",
            ConditionTag::HeartDisease => "heart disease",
            ConditionTag::KidneyDisease => "kidney disease",
            ConditionTag::FattyLiver => "fatty liver",
            ConditionTag::IronDeficiency => "iron deficiency",
            ConditionTag::VitaminDDeficiency => "vitamin d deficiency",
            ConditionTag::VitaminB12Deficiency => "vitamin b12 deficiency",
            ConditionTag::Hypothyroid => "hypothyroidism",
            ConditionTag::Hyperthyroid => "hyperthyroidism",
            ConditionTag::Gout => "gout",
            ConditionTag::Obesity => "obesity",
            ConditionTag::Underweight => "underweight",
            ConditionTag::GeneralHealthy => "general healthy",
            ConditionTag::WeightLoss => "weight loss",
            ConditionTag::Pregnancy => "pregnancy",
        }
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ConditionAlias {
    pub alias: String,
    pub tag: ConditionTag,
}

/// Many-to-one mapping from diagnosis text variants to a condition tag
///
/// Entries keep insertion order so that lookups are reproducible.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConditionAliasTable {
    #[serde(default)]
    pub entries: Vec<ConditionAlias>,
}

// ============================================================================
// Meal Plans
// ============================================================================

/// Lab finding that selects a plan on its own: a parameter classified
/// with the given status token
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabTrigger {
    pub parameter: String,
    pub status_token: String,
}

impl LabTrigger {
    pub fn new(parameter: impl Into<String>, status_token: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            status_token: status_token.into(),
        }
    }
}

/// A pre-built meal plan targeted at specific conditions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PredefinedMealPlan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub target_conditions: Vec<ConditionTag>,
    #[serde(default)]
    pub lab_triggers: Vec<LabTrigger>,
    #[serde(default)]
    pub incompatible_medicines: Vec<String>,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub include_foods: Vec<String>,
    #[serde(default)]
    pub avoid_foods: Vec<String>,
    #[serde(default = "default_duration_days")]
    pub duration_days: u32,
}

fn default_priority() -> i32 {
    1
}

fn default_active() -> bool {
    true
}

fn default_duration_days() -> u32 {
    7
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MealPlanCatalog {
    #[serde(default)]
    pub plans: Vec<PredefinedMealPlan>,
}

// ============================================================================
// Catalog Bundle
// ============================================================================

/// All read-only reference data one evaluation runs against
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalogs {
    #[serde(default)]
    pub rules: RuleCatalog,
    #[serde(default)]
    pub medicines: MedicineCatalog,
    #[serde(default)]
    pub meal_plans: MealPlanCatalog,
    #[serde(default)]
    pub conditions: ConditionAliasTable,
}

// ============================================================================
// Panels and Profile Entities
// ============================================================================

/// A single measured value as reported
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PanelEntry {
    pub parameter: String,
    pub value: f64,
    #[serde(default)]
    pub unit: String,
}

impl PanelEntry {
    pub fn new(parameter: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            value,
            unit: unit.into(),
        }
    }
}

/// Timestamped set of lab measurements; never mutated, only soft-deleted
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LabPanel {
    pub id: Uuid,
    pub taken_at: DateTime<Utc>,
    #[serde(default)]
    pub source: Option<String>,
    pub entries: Vec<PanelEntry>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LabPanel {
    pub fn new(taken_at: DateTime<Utc>, entries: Vec<PanelEntry>) -> Self {
        Self {
            id: Uuid::new_v4(),
            taken_at,
            source: None,
            entries,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A medication the user currently takes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub dosage: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub started_on: Option<NaiveDate>,
}

/// A diagnosis as the user entered it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DiagnosedCondition {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub diagnosed_on: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// Warnings
// ============================================================================

/// Non-fatal problem found while evaluating; never aborts the evaluation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineWarning {
    UnknownParameter {
        parameter: String,
    },
    /// Value of a known parameter that falls outside every band
    UnmatchedValue {
        parameter: String,
        value: f64,
        unit: String,
    },
    UnitMismatch {
        parameter: String,
        expected: String,
        found: String,
    },
    UnresolvedMedicineAlias {
        identifier: String,
    },
    UnresolvedCondition {
        name: String,
    },
}

impl fmt::Display for EngineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineWarning::UnknownParameter { parameter } => {
                write!(f, "unknown lab parameter '{}'", parameter)
            }
            EngineWarning::UnmatchedValue {
                parameter,
                value,
                unit,
            } => write!(f, "no interpretation of '{}' covers {} {}", parameter, value, unit),
            EngineWarning::UnitMismatch {
                parameter,
                expected,
                found,
            } => write!(
                f,
                "unit mismatch for '{}': expected {}, got {}",
                parameter, expected, found
            ),
            EngineWarning::UnresolvedMedicineAlias { identifier } => {
                write!(f, "unknown medicine '{}'", identifier)
            }
            EngineWarning::UnresolvedCondition { name } => {
                write!(f, "unrecognized condition '{}'", name)
            }
        }
    }
}
