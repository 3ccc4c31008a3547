//! Reference catalogs: built-in seed data, lookups and validation.
//!
//! Catalogs are read-only snapshots during an evaluation. The built-in set
//! covers the common lab parameters, medicines and meal plans of the
//! nutrition tracker; deployments normally inject their own snapshot via
//! [`load_catalogs`].

use crate::types::*;
use crate::Result;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Cached default catalogs - built once and reused across all evaluations
static DEFAULT_CATALOGS: Lazy<Catalogs> = Lazy::new(build_default_catalogs);

/// Get a reference to the cached default catalogs
pub fn get_default_catalogs() -> &'static Catalogs {
    &DEFAULT_CATALOGS
}

/// Load a catalog snapshot from a JSON file
pub fn load_catalogs(path: &Path) -> Result<Catalogs> {
    let contents = std::fs::read_to_string(path)?;
    let catalogs: Catalogs = serde_json::from_str(&contents)?;
    tracing::info!(
        "Loaded catalogs from {:?}: {} rules, {} medicines, {} meal plans, {} condition aliases",
        path,
        catalogs.rules.rules.len(),
        catalogs.medicines.medicines.len(),
        catalogs.meal_plans.plans.len(),
        catalogs.conditions.entries.len()
    );
    Ok(catalogs)
}

// ============================================================================
// Normalization
// ============================================================================

/// Lookup key for parameter and medicine names: lowercase, with
/// whitespace, `_` and `-` removed.
pub(crate) fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Unit comparison key: lowercase, whitespace removed, `µ` folded to `u`
pub(crate) fn normalize_unit(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == 'µ' || c == 'μ' { 'u' } else { c })
        .flat_map(char::to_lowercase)
        .collect()
}

// ============================================================================
// Lookups
// ============================================================================

impl RuleCatalog {
    /// Resolve a parameter key through canonical keys, then aliases
    pub fn find_rule(&self, parameter_key: &str) -> Option<&LabParameterRule> {
        let wanted = normalize_key(parameter_key);
        if wanted.is_empty() {
            return None;
        }

        self.rules
            .iter()
            .find(|r| normalize_key(&r.key) == wanted)
            .or_else(|| {
                self.rules
                    .iter()
                    .find(|r| r.aliases.iter().any(|a| normalize_key(a) == wanted))
            })
    }

    /// Factor converting `from_unit` into the rule's unit, if one is declared
    ///
    /// Parameter-specific entries take precedence over global ones.
    pub fn conversion_factor(&self, rule: &LabParameterRule, from_unit: &str) -> Option<f64> {
        let from = normalize_unit(from_unit);
        let to = normalize_unit(&rule.unit);
        let key = normalize_key(&rule.key);

        let applies = |c: &&UnitConversion| normalize_unit(&c.from) == from && normalize_unit(&c.to) == to;

        self.conversions
            .iter()
            .filter(applies)
            .find(|c| c.parameter.as_deref().map(normalize_key).as_deref() == Some(key.as_str()))
            .or_else(|| {
                self.conversions
                    .iter()
                    .filter(applies)
                    .find(|c| c.parameter.is_none())
            })
            .map(|c| c.factor)
    }
}

impl MedicineRecord {
    /// True if the identifier names this medicine or one of its aliases
    pub fn is_known_as(&self, identifier: &str) -> bool {
        let wanted = normalize_key(identifier);
        !wanted.is_empty()
            && (normalize_key(&self.name) == wanted
                || self.aliases.iter().any(|a| normalize_key(a) == wanted))
    }
}

impl MedicineCatalog {
    /// Resolve a medication identifier (name or alias) to its record
    pub fn resolve(&self, identifier: &str) -> Option<&MedicineRecord> {
        self.medicines.iter().find(|m| m.is_known_as(identifier))
    }
}

impl ConditionAliasTable {
    pub fn insert(&mut self, alias: impl Into<String>, tag: ConditionTag) {
        self.entries.push(ConditionAlias {
            alias: alias.into(),
            tag,
        });
    }
}

// ============================================================================
// Validation
// ============================================================================

impl Catalogs {
    /// Validate the catalogs for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    /// Overlapping and gapped interpretations are reported, but
    /// classification still takes the first declared match. Bands that only
    /// touch at a boundary value do not overlap.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen_keys = HashSet::new();
        for rule in &self.rules.rules {
            let key = normalize_key(&rule.key);
            if key.is_empty() {
                errors.push("Lab rule has empty key".to_string());
                continue;
            }
            if !seen_keys.insert(key) {
                errors.push(format!("Duplicate lab rule key '{}'", rule.key));
            }
            if rule.unit.trim().is_empty() {
                errors.push(format!("Lab rule '{}' has empty unit", rule.key));
            }
            if rule.normal_range.min > rule.normal_range.max {
                errors.push(format!(
                    "Lab rule '{}': normal range min {} > max {}",
                    rule.key, rule.normal_range.min, rule.normal_range.max
                ));
            }
            if rule.interpretations.is_empty() {
                errors.push(format!("Lab rule '{}' has no interpretations", rule.key));
            }
            if !rule
                .interpretations
                .iter()
                .any(|i| i.status_token == rule.normal_token)
            {
                errors.push(format!(
                    "Lab rule '{}' has no '{}' interpretation",
                    rule.key, rule.normal_token
                ));
            }

            for (idx, interp) in rule.interpretations.iter().enumerate() {
                if interp.range.min > interp.range.max {
                    errors.push(format!(
                        "Lab rule '{}': interpretation '{}' has min {} > max {}",
                        rule.key, interp.status_token, interp.range.min, interp.range.max
                    ));
                }
                for earlier in rule.interpretations[..idx].iter().filter(|e| e.sex == interp.sex) {
                    if earlier.range.min < interp.range.max && interp.range.min < earlier.range.max {
                        errors.push(format!(
                            "Lab rule '{}': interpretation '{}' overlaps earlier '{}'",
                            rule.key, interp.status_token, earlier.status_token
                        ));
                    }
                }
            }

            let shared_gaps = coverage_gaps(rule, None);
            for (from, to) in &shared_gaps {
                errors.push(format!(
                    "Lab rule '{}': values between {} and {} match no interpretation",
                    rule.key, from, to
                ));
            }
            for sex in Sex::ALL {
                if !rule.interpretations.iter().any(|i| i.sex == Some(sex)) {
                    continue;
                }
                for (from, to) in coverage_gaps(rule, Some(sex)) {
                    if !shared_gaps.contains(&(from, to)) {
                        errors.push(format!(
                            "Lab rule '{}': values between {} and {} match no interpretation for {}",
                            rule.key, from, to, sex
                        ));
                    }
                }
            }
        }

        for conversion in &self.rules.conversions {
            if !(conversion.factor.is_finite() && conversion.factor > 0.0) {
                errors.push(format!(
                    "Unit conversion {} -> {} has invalid factor {}",
                    conversion.from, conversion.to, conversion.factor
                ));
            }
        }

        let mut seen_names: HashMap<String, &str> = HashMap::new();
        for medicine in &self.medicines.medicines {
            if medicine.name.trim().is_empty() {
                errors.push("Medicine has empty name".to_string());
                continue;
            }
            for name in std::iter::once(&medicine.name).chain(medicine.aliases.iter()) {
                let key = normalize_key(name);
                if let Some(owner) = seen_names.insert(key, medicine.name.as_str()) {
                    if owner != medicine.name {
                        errors.push(format!(
                            "Medicine name '{}' is claimed by both '{}' and '{}'",
                            name, owner, medicine.name
                        ));
                    }
                }
            }
        }

        let mut seen_plans = HashSet::new();
        for plan in &self.meal_plans.plans {
            if plan.id.is_empty() {
                errors.push("Meal plan has empty ID".to_string());
            }
            if !seen_plans.insert(plan.id.as_str()) {
                errors.push(format!("Duplicate meal plan ID '{}'", plan.id));
            }
            if plan.target_conditions.is_empty() && plan.lab_triggers.is_empty() {
                errors.push(format!(
                    "Meal plan '{}' has no target conditions or lab triggers",
                    plan.id
                ));
            }
            for trigger in &plan.lab_triggers {
                match self.rules.find_rule(&trigger.parameter) {
                    None => errors.push(format!(
                        "Meal plan '{}' is triggered by unknown lab parameter '{}'",
                        plan.id, trigger.parameter
                    )),
                    Some(rule) if normalize_key(&rule.key) != normalize_key(&trigger.parameter) => {
                        errors.push(format!(
                            "Meal plan '{}': lab trigger '{}' should use the canonical key '{}'",
                            plan.id, trigger.parameter, rule.key
                        ));
                    }
                    Some(rule) => {
                        if !rule
                            .interpretations
                            .iter()
                            .any(|i| i.status_token == trigger.status_token)
                        {
                            errors.push(format!(
                                "Meal plan '{}': lab rule '{}' has no '{}' interpretation",
                                plan.id, rule.key, trigger.status_token
                            ));
                        }
                    }
                }
            }
        }

        for entry in &self.conditions.entries {
            if entry.alias.trim().is_empty() {
                errors.push(format!("Empty alias for condition '{}'", entry.tag));
            }
        }

        errors
    }
}

/// Uncovered spans between the lowest `min` and the highest `max` of the
/// bands that apply to `sex`
fn coverage_gaps(rule: &LabParameterRule, sex: Option<Sex>) -> Vec<(f64, f64)> {
    let mut ranges: Vec<ValueRange> = rule
        .interpretations
        .iter()
        .filter(|i| i.applies_to(sex) && i.range.min <= i.range.max)
        .map(|i| i.range)
        .collect();
    ranges.sort_by(|a, b| a.min.total_cmp(&b.min));

    let mut gaps = Vec::new();
    let mut ranges = ranges.into_iter();
    let Some(first) = ranges.next() else {
        return gaps;
    };
    let mut covered = first.max;
    for range in ranges {
        if range.min > covered {
            gaps.push((covered, range.min));
        }
        covered = covered.max(range.max);
    }
    gaps
}

// ============================================================================
// Built-in Catalogs
// ============================================================================

/// Builds the default catalogs with built-in rules, medicines and plans
///
/// **Note**: For production use, prefer `get_default_catalogs()` which
/// returns a cached reference.
pub fn build_default_catalogs() -> Catalogs {
    Catalogs {
        rules: default_rules(),
        medicines: default_medicines(),
        meal_plans: default_meal_plans(),
        conditions: default_condition_aliases(),
    }
}

fn interp(
    min: f64,
    max: f64,
    status: &str,
    severity: Severity,
    meaning: &str,
    conditions: &[ConditionTag],
    recommendations: &[&str],
) -> Interpretation {
    Interpretation {
        range: ValueRange::new(min, max),
        status_token: status.into(),
        severity,
        meaning: meaning.into(),
        possible_conditions: conditions.to_vec(),
        dietary_recommendations: recommendations.iter().map(|r| r.to_string()).collect(),
        sex: None,
    }
}

fn for_sex(sex: Sex, interpretation: Interpretation) -> Interpretation {
    Interpretation {
        sex: Some(sex),
        ..interpretation
    }
}

fn normal(min: f64, max: f64) -> Interpretation {
    interp(min, max, "normal", Severity::Normal, "Within the normal range", &[], &[])
}

fn rule(
    key: &str,
    name: &str,
    aliases: &[&str],
    unit: &str,
    normal_range: (f64, f64),
    polarity: Polarity,
    interpretations: Vec<Interpretation>,
) -> LabParameterRule {
    LabParameterRule {
        key: key.into(),
        name: name.into(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        unit: unit.into(),
        normal_range: ValueRange::new(normal_range.0, normal_range.1),
        normal_token: "normal".into(),
        interpretations,
        polarity,
    }
}

const IRON_RICH_FOODS: &str = "Eat iron-rich foods such as red meat, spinach and legumes";
const VITAMIN_C_WITH_IRON: &str = "Pair iron sources with vitamin C to improve absorption";
const REDUCE_SIMPLE_CARBS: &str = "Reduce sugar and simple carbohydrates";
const INCREASE_ACTIVITY: &str = "Increase daily physical activity";
const REDUCE_SATURATED_FAT: &str = "Reduce saturated fat intake";
const MORE_FIBER: &str = "Increase fiber and vegetable intake";
const REGULAR_EXERCISE: &str = "Exercise regularly";

fn default_rules() -> RuleCatalog {
    use ConditionTag::*;
    use Severity::*;

    // Adjacent bands share their boundary value and the band declared first
    // owns it, so the order below decides which status an edge value gets.
    let rules = vec![
        rule(
            "hemoglobin",
            "Hemoglobin",
            &["hb", "hgb", "haemoglobin"],
            "g/dL",
            (12.0, 17.0),
            Polarity::RangeIsBetter,
            vec![
                for_sex(
                    Sex::Male,
                    interp(12.0, 13.5, "low", Mild, "Below the usual range for men", &[IronDeficiency], &[
                        IRON_RICH_FOODS,
                    ]),
                ),
                normal(12.0, 17.0),
                interp(8.0, 12.0, "low", Moderate, "Low hemoglobin, possible anemia", &[IronDeficiency], &[
                    IRON_RICH_FOODS,
                    VITAMIN_C_WITH_IRON,
                ]),
                interp(0.0, 8.0, "very_low", Severe, "Severe anemia", &[IronDeficiency], &[
                    IRON_RICH_FOODS,
                    VITAMIN_C_WITH_IRON,
                ]),
                interp(17.0, 25.0, "high", Mild, "Elevated hemoglobin", &[], &["Stay well hydrated"]),
            ],
        ),
        rule(
            "fasting_glucose",
            "Fasting glucose",
            &["glucose", "fbs", "fasting blood sugar", "blood sugar"],
            "mg/dL",
            (70.0, 100.0),
            Polarity::LowerIsBetter,
            vec![
                normal(70.0, 100.0),
                interp(126.0, 999.0, "very_high", Concerning, "Fasting glucose in the diabetic range", &[DiabetesType2], &[
                    REDUCE_SIMPLE_CARBS,
                    INCREASE_ACTIVITY,
                    "Consult an endocrinologist",
                ]),
                interp(100.0, 126.0, "high", Moderate, "Impaired fasting glucose", &[Prediabetes], &[
                    REDUCE_SIMPLE_CARBS,
                    INCREASE_ACTIVITY,
                ]),
                interp(54.0, 70.0, "low", Mild, "Low blood sugar", &[], &[
                    "Eat regular meals and do not skip breakfast",
                ]),
                interp(0.0, 54.0, "very_low", Severe, "Severe hypoglycemia", &[], &[
                    "Eat regular meals and do not skip breakfast",
                ]),
            ],
        ),
        rule(
            "hba1c",
            "Hemoglobin A1c",
            &["a1c", "glycated hemoglobin"],
            "%",
            (4.0, 5.6),
            Polarity::LowerIsBetter,
            vec![
                interp(6.5, 20.0, "very_high", Moderate, "Diabetic range", &[DiabetesType2], &[
                    REDUCE_SIMPLE_CARBS,
                    INCREASE_ACTIVITY,
                ]),
                interp(5.7, 6.5, "high", Mild, "Prediabetic range", &[Prediabetes], &[REDUCE_SIMPLE_CARBS]),
                normal(0.0, 5.7),
            ],
        ),
        rule(
            "total_cholesterol",
            "Total cholesterol",
            &["cholesterol", "tc"],
            "mg/dL",
            (125.0, 200.0),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 200.0),
                interp(240.0, 1000.0, "very_high", Moderate, "High cholesterol", &[HighCholesterol, HeartDisease], &[
                    REDUCE_SATURATED_FAT,
                    MORE_FIBER,
                    REGULAR_EXERCISE,
                ]),
                interp(200.0, 240.0, "high", Mild, "Borderline high cholesterol", &[HighCholesterol], &[
                    REDUCE_SATURATED_FAT,
                    MORE_FIBER,
                    REGULAR_EXERCISE,
                ]),
            ],
        ),
        rule(
            "ldl",
            "LDL cholesterol",
            &["ldl cholesterol", "ldl-c"],
            "mg/dL",
            (0.0, 130.0),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 130.0),
                interp(160.0, 1000.0, "very_high", Moderate, "High LDL", &[HighCholesterol, HeartDisease], &[
                    REDUCE_SATURATED_FAT,
                    MORE_FIBER,
                    REGULAR_EXERCISE,
                ]),
                interp(130.0, 160.0, "high", Mild, "Borderline high LDL", &[HighCholesterol], &[
                    REDUCE_SATURATED_FAT,
                    MORE_FIBER,
                    REGULAR_EXERCISE,
                ]),
            ],
        ),
        rule(
            "hdl",
            "HDL cholesterol",
            &["hdl cholesterol", "hdl-c"],
            "mg/dL",
            (40.0, 100.0),
            Polarity::HigherIsBetter,
            vec![
                normal(40.0, 200.0),
                interp(0.0, 40.0, "low", Moderate, "Low protective cholesterol", &[HeartDisease], &[
                    "Choose healthy fats such as olive oil, nuts and oily fish",
                    REGULAR_EXERCISE,
                ]),
            ],
        ),
        rule(
            "triglycerides",
            "Triglycerides",
            &["tg", "trigs"],
            "mg/dL",
            (0.0, 150.0),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 150.0),
                interp(500.0, 5000.0, "very_high", Severe, "Very high triglycerides", &[HighCholesterol], &[
                    "Limit sugar and alcohol",
                    "Eat oily fish twice a week",
                ]),
                interp(150.0, 500.0, "high", Mild, "Elevated triglycerides", &[HighCholesterol], &[
                    "Limit sugar and alcohol",
                    "Eat oily fish twice a week",
                ]),
            ],
        ),
        rule(
            "vitamin_d",
            "Vitamin D (25-OH)",
            &["vitamind", "25-oh vitamin d", "vit d"],
            "ng/mL",
            (30.0, 100.0),
            Polarity::HigherIsBetter,
            vec![
                normal(30.0, 100.0),
                interp(12.0, 30.0, "low", Mild, "Vitamin D insufficiency", &[VitaminDDeficiency], &[
                    "Get regular safe sun exposure",
                    "Consider a vitamin D supplement",
                ]),
                interp(0.0, 12.0, "very_low", Moderate, "Vitamin D deficiency", &[VitaminDDeficiency], &[
                    "Get regular safe sun exposure",
                    "Consider a vitamin D supplement",
                ]),
                interp(100.0, 300.0, "high", Mild, "Vitamin D above the usual range", &[], &[
                    "Review vitamin D supplement dose",
                ]),
            ],
        ),
        rule(
            "vitamin_b12",
            "Vitamin B12",
            &["b12", "cobalamin", "vit b12"],
            "pg/mL",
            (200.0, 900.0),
            Polarity::HigherIsBetter,
            vec![
                normal(200.0, 2000.0),
                interp(0.0, 200.0, "low", Mild, "Low vitamin B12", &[VitaminB12Deficiency], &[
                    "Eat meat, eggs and dairy",
                    "Consider a B12 supplement if vegetarian",
                ]),
            ],
        ),
        rule(
            "ferritin",
            "Ferritin",
            &["serum ferritin"],
            "ng/mL",
            (30.0, 300.0),
            Polarity::RangeIsBetter,
            vec![
                normal(30.0, 300.0),
                interp(0.0, 30.0, "low", Mild, "Low iron stores", &[IronDeficiency], &[
                    IRON_RICH_FOODS,
                    VITAMIN_C_WITH_IRON,
                ]),
                interp(300.0, 5000.0, "high", Mild, "High iron stores", &[], &[
                    "Avoid iron supplements unless prescribed",
                ]),
            ],
        ),
        rule(
            "tsh",
            "Thyroid stimulating hormone",
            &["thyrotropin"],
            "mIU/L",
            (0.4, 4.0),
            Polarity::RangeIsBetter,
            vec![
                normal(0.4, 4.0),
                interp(0.0, 0.4, "low", Moderate, "Possible overactive thyroid", &[Hyperthyroid], &[
                    "Limit caffeine",
                ]),
                interp(4.0, 100.0, "high", Moderate, "Possible underactive thyroid", &[Hypothyroid], &[
                    "Ensure adequate iodine intake",
                    "Limit raw cruciferous vegetables in large amounts",
                ]),
            ],
        ),
        rule(
            "creatinine",
            "Creatinine",
            &["serum creatinine", "cr"],
            "mg/dL",
            (0.6, 1.3),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 1.3),
                interp(1.3, 20.0, "high", Moderate, "Reduced kidney filtration", &[KidneyDisease], &[
                    "Limit sodium intake",
                    "Moderate protein intake",
                ]),
            ],
        ),
        rule(
            "alt",
            "Alanine aminotransferase",
            &["sgpt", "alanine transaminase"],
            "U/L",
            (7.0, 56.0),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 56.0),
                interp(56.0, 1000.0, "high", Mild, "Elevated liver enzyme", &[FattyLiver], &[
                    "Avoid alcohol",
                    "Reduce added sugar and fried foods",
                ]),
            ],
        ),
        rule(
            "uric_acid",
            "Uric acid",
            &["urate"],
            "mg/dL",
            (3.5, 7.2),
            Polarity::LowerIsBetter,
            vec![
                normal(0.0, 7.2),
                interp(7.2, 20.0, "high", Mild, "Elevated uric acid", &[Gout], &[
                    "Limit red meat and organ meats",
                    "Stay well hydrated",
                ]),
            ],
        ),
    ];

    let conversion = |parameter: Option<&str>, from: &str, to: &str, factor: f64| UnitConversion {
        parameter: parameter.map(str::to_string),
        from: from.into(),
        to: to.into(),
        factor,
    };

    let conversions = vec![
        conversion(Some("fasting_glucose"), "mmol/L", "mg/dL", 18.016),
        conversion(Some("total_cholesterol"), "mmol/L", "mg/dL", 38.67),
        conversion(Some("ldl"), "mmol/L", "mg/dL", 38.67),
        conversion(Some("hdl"), "mmol/L", "mg/dL", 38.67),
        conversion(Some("triglycerides"), "mmol/L", "mg/dL", 88.57),
        conversion(Some("creatinine"), "umol/L", "mg/dL", 0.0113),
        conversion(Some("vitamin_d"), "nmol/L", "ng/mL", 0.4),
        conversion(None, "g/L", "g/dL", 0.1),
    ];

    RuleCatalog { rules, conversions }
}

fn medicine(
    name: &str,
    aliases: &[&str],
    drug_interactions: &[(&str, Severity, &str)],
    food_interactions: &[(&str, FoodInteractionKind, &str)],
    dietary_recommendations: &[&str],
    warnings: &[&str],
) -> MedicineRecord {
    MedicineRecord {
        name: name.into(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
        drug_interactions: drug_interactions
            .iter()
            .map(|(other, severity, description)| {
                (
                    other.to_string(),
                    DrugInteractionEntry {
                        severity: *severity,
                        description: description.to_string(),
                    },
                )
            })
            .collect(),
        food_interactions: food_interactions
            .iter()
            .map(|(food, kind, description)| FoodInteraction {
                food: food.to_string(),
                kind: *kind,
                description: description.to_string(),
            })
            .collect(),
        dietary_recommendations: dietary_recommendations.iter().map(|r| r.to_string()).collect(),
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
    }
}

fn default_medicines() -> MedicineCatalog {
    use FoodInteractionKind::*;
    use Severity::*;

    let medicines = vec![
        medicine(
            "Metformin",
            &["Glucophage", "metformin hydrochloride"],
            &[(
                "warfarin",
                Moderate,
                "Metformin may change the anticoagulant effect of warfarin; monitor INR",
            )],
            &[("alcohol", Avoid, "Alcohol raises the risk of lactic acidosis")],
            &["Take with meals to reduce stomach upset", "Include vitamin B12 sources in the diet"],
            &["Long-term use can lower vitamin B12 levels"],
        ),
        medicine(
            "Warfarin",
            &["Coumadin", "Jantoven"],
            &[
                ("aspirin", Severe, "Combined use greatly increases bleeding risk"),
                ("atorvastatin", Mild, "May slightly raise INR"),
            ],
            &[
                ("leafy green vegetables", Caution, "Large swings in vitamin K intake change the effect of warfarin"),
                ("cranberry juice", Avoid, "Cranberry can increase bleeding risk"),
                ("alcohol", Limit, "Alcohol changes how warfarin is cleared"),
            ],
            &["Keep vitamin K intake consistent from day to day"],
            &["Report unusual bruising or bleeding"],
        ),
        medicine(
            "Aspirin",
            &["acetylsalicylic acid", "ASA", "Bayer"],
            &[("warfarin", Moderate, "Aspirin adds to the anticoagulant effect of warfarin")],
            &[("alcohol", Limit, "Alcohol increases the risk of stomach bleeding")],
            &["Take with food"],
            &["Stop and seek help if you notice black stools"],
        ),
        medicine(
            "Atorvastatin",
            &["Lipitor"],
            &[],
            &[("grapefruit juice", Avoid, "Grapefruit raises statin blood levels")],
            &["Follow a low saturated fat diet"],
            &["Report unexplained muscle pain"],
        ),
        medicine(
            "Simvastatin",
            &["Zocor"],
            &[],
            &[("grapefruit juice", Avoid, "Grapefruit raises statin blood levels")],
            &["Follow a low saturated fat diet"],
            &["Report unexplained muscle pain"],
        ),
        medicine(
            "Lisinopril",
            &["Zestril", "Prinivil"],
            &[("spironolactone", Severe, "Both raise potassium; risk of hyperkalemia")],
            &[("potassium salt substitutes", Avoid, "Can raise potassium to unsafe levels")],
            &["Limit high-potassium salt substitutes"],
            &["A dry cough is a common side effect"],
        ),
        medicine("Spironolactone", &["Aldactone"], &[], &[(
            "bananas",
            Limit,
            "Potassium-rich foods add to potassium retention",
        )], &[], &[]),
        medicine(
            "Levothyroxine",
            &["Synthroid", "Euthyrox", "Levoxyl"],
            &[(
                "calcium carbonate",
                Moderate,
                "Calcium reduces levothyroxine absorption; separate doses by 4 hours",
            )],
            &[
                ("soy", Limit, "Soy can reduce absorption"),
                ("coffee", Timing, "Wait at least 30 minutes after the dose before coffee"),
            ],
            &["Take on an empty stomach 30 to 60 minutes before breakfast"],
            &[],
        ),
        medicine("Calcium carbonate", &["Tums", "calcium"], &[], &[], &["Take with food"], &[]),
    ];

    MedicineCatalog { medicines }
}

fn plan(
    id: &str,
    name: &str,
    targets: &[ConditionTag],
    incompatible: &[&str],
    priority: i32,
    include_foods: &[&str],
    avoid_foods: &[&str],
) -> PredefinedMealPlan {
    PredefinedMealPlan {
        id: id.into(),
        name: name.into(),
        description: String::new(),
        target_conditions: targets.to_vec(),
        lab_triggers: vec![],
        incompatible_medicines: incompatible.iter().map(|m| m.to_string()).collect(),
        priority,
        is_active: true,
        include_foods: include_foods.iter().map(|f| f.to_string()).collect(),
        avoid_foods: avoid_foods.iter().map(|f| f.to_string()).collect(),
        duration_days: 7,
    }
}

fn triggered_by(mut plan: PredefinedMealPlan, triggers: &[(&str, &str)]) -> PredefinedMealPlan {
    plan.lab_triggers = triggers
        .iter()
        .map(|(parameter, status)| LabTrigger::new(*parameter, *status))
        .collect();
    plan
}

fn default_meal_plans() -> MealPlanCatalog {
    use ConditionTag::*;

    let mut general = plan(
        "general_balanced",
        "General Balanced Week",
        &[GeneralHealthy],
        &[],
        1,
        &["whole grains", "vegetables", "lean protein"],
        &[],
    );
    general.is_active = false;

    let plans = vec![
        triggered_by(
            plan(
                "diabetic_balanced",
                "Balanced Diabetic Plan",
                &[DiabetesType2, Prediabetes],
                &[],
                5,
                &["non-starchy vegetables", "legumes", "whole grains"],
                &["sugary drinks", "white bread"],
            ),
            &[("fasting_glucose", "high"), ("hba1c", "high")],
        ),
        plan(
            "low_gi_intensive",
            "Low Glycemic Intensive Plan",
            &[DiabetesType2, DiabetesType1],
            &["insulin"],
            8,
            &["lentils", "oats", "nuts"],
            &["sweets", "fruit juice"],
        ),
        plan(
            "leafy_mediterranean",
            "Leafy Mediterranean Plan",
            &[HeartDisease, HighCholesterol],
            &["warfarin"],
            9,
            &["kale", "spinach", "olive oil", "oily fish"],
            &["processed meat"],
        ),
        plan(
            "heart_healthy",
            "Heart Healthy Plan",
            &[HighCholesterol, HeartDisease, HighBloodPressure],
            &[],
            6,
            &["oats", "oily fish", "beans"],
            &["fried food", "butter"],
        ),
        plan(
            "dash",
            "DASH Plan",
            &[HighBloodPressure],
            &["lisinopril", "spironolactone"],
            7,
            &["bananas", "low-fat dairy", "vegetables"],
            &["salty snacks"],
        ),
        triggered_by(
            plan(
                "iron_rich",
                "Iron Rich Plan",
                &[IronDeficiency],
                &[],
                4,
                &["red meat", "spinach", "lentils", "citrus fruit"],
                &["tea with meals"],
            ),
            &[("hemoglobin", "low"), ("hemoglobin", "very_low"), ("ferritin", "low")],
        ),
        triggered_by(
            plan(
                "kidney_friendly",
                "Kidney Friendly Plan",
                &[KidneyDisease],
                &[],
                6,
                &["cauliflower", "egg whites"],
                &["processed food", "salt"],
            ),
            &[("creatinine", "high")],
        ),
        triggered_by(
            plan(
                "thyroid_support",
                "Thyroid Support Plan",
                &[Hypothyroid],
                &[],
                3,
                &["seafood", "eggs", "dairy"],
                &["excess soy"],
            ),
            &[("tsh", "high")],
        ),
        triggered_by(
            plan(
                "liver_reset",
                "Liver Reset Plan",
                &[FattyLiver, Obesity],
                &[],
                4,
                &["vegetables", "coffee", "oily fish"],
                &["alcohol", "added sugar"],
            ),
            &[("alt", "high")],
        ),
        plan(
            "weight_loss",
            "Calorie Controlled Plan",
            &[Obesity, WeightLoss],
            &[],
            2,
            &["high-fiber vegetables", "lean protein"],
            &["sugary drinks"],
        ),
        general,
    ];

    MealPlanCatalog { plans }
}

fn default_condition_aliases() -> ConditionAliasTable {
    use ConditionTag::*;

    let mut table = ConditionAliasTable::default();
    for (alias, tag) in [
        ("diabetes", DiabetesType2),
        ("type 1 diabetes", DiabetesType1),
        ("type i diabetes", DiabetesType1),
        ("t1d", DiabetesType1),
        ("type 2 diabetes", DiabetesType2),
        ("type ii diabetes", DiabetesType2),
        ("t2d", DiabetesType2),
        ("prediabetes", Prediabetes),
        ("insulin resistance", Prediabetes),
        ("high cholesterol", HighCholesterol),
        ("hypercholesterolemia", HighCholesterol),
        ("hyperlipidemia", HighCholesterol),
        ("dyslipidemia", HighCholesterol),
        ("hypertension", HighBloodPressure),
        ("high blood pressure", HighBloodPressure),
        ("htn", HighBloodPressure),
        ("heart disease", HeartDisease),
        ("cardiovascular", HeartDisease),
        ("coronary artery disease", HeartDisease),
        ("kidney disease", KidneyDisease),
        ("ckd", KidneyDisease),
        ("renal", KidneyDisease),
        ("fatty liver", FattyLiver),
        ("nafld", FattyLiver),
        ("anemia", IronDeficiency),
        ("anaemia", IronDeficiency),
        ("iron deficiency", IronDeficiency),
        ("vitamin d deficiency", VitaminDDeficiency),
        ("b12 deficiency", VitaminB12Deficiency),
        ("hypothyroidism", Hypothyroid),
        ("hashimoto", Hypothyroid),
        ("hyperthyroidism", Hyperthyroid),
        ("graves", Hyperthyroid),
        ("gout", Gout),
        ("obesity", Obesity),
        ("overweight", Obesity),
        ("underweight", Underweight),
        ("pregnant", Pregnancy),
        ("pregnancy", Pregnancy),
    ] {
        table.insert(alias, tag);
    }
    table
}
