//! Integration tests for the healthrules binary.
//!
//! These tests verify end-to-end behavior including:
//! - Single value classification and unit conversion
//! - Interaction and condition lookups
//! - Meal plan selection
//! - Full evaluation from CSV panels and profile files
//! - Catalog and config handling

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary, isolated from any user config
fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("healthrules"));
    cmd.env("XDG_CONFIG_HOME", "/nonexistent/healthrules-test-config");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

fn stdout_json(cmd: &mut Command) -> serde_json::Value {
    let output = cmd.output().expect("Failed to run CLI");
    assert!(output.status.success(), "CLI failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lab-driven health rule engine"));
}

#[test]
fn test_classify_low_hemoglobin() {
    cli()
        .args(["classify", "hemoglobin", "10", "--unit", "g/dL"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hemoglobin: 10 g/dL -> low [moderate]"))
        .stdout(predicate::str::contains("iron-rich foods"));
}

#[test]
fn test_classify_converts_units() {
    let json = stdout_json(cli().args(["classify", "glucose", "7.2", "--unit", "mmol/L", "--json"]));

    assert_eq!(json["parameter"], "fasting_glucose");
    assert_eq!(json["outcome"], "matched");
    assert_eq!(json["status_token"], "very_high");
    assert_eq!(json["unit"], "mg/dL");
    assert_eq!(json["source_unit"], "mmol/L");
}

#[test]
fn test_classify_converted_value_on_band_edge() {
    cli()
        .args(["classify", "creatinine", "115.5", "--unit", "umol/L"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(from umol/L) -> high [moderate]"));
}

#[test]
fn test_classify_uses_sex_specific_range() {
    cli()
        .args(["classify", "hemoglobin", "12.8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> normal [normal]"));

    cli()
        .args(["classify", "hemoglobin", "12.8", "--sex", "male"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> low [mild]"));

    cli()
        .args(["classify", "hemoglobin", "12.8", "--sex", "other"])
        .assert()
        .failure();
}

#[test]
fn test_classify_unknown_parameter_still_succeeds() {
    cli()
        .args(["classify", "platelets", "250"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unknown lab parameter 'platelets'"));
}

#[test]
fn test_classify_with_custom_catalog() {
    let temp_dir = setup_test_dir();
    let catalog = serde_json::json!({
        "rules": {
            "rules": [{
                "key": "fasting_glucose",
                "aliases": ["fastingGlucose"],
                "unit": "mg/dL",
                "normal_range": {"min": 70.0, "max": 100.0},
                "interpretations": [
                    {"range": {"min": 70.0, "max": 100.0}, "status_token": "normal", "severity": "normal"},
                    {
                        "range": {"min": 100.0, "max": 999.0},
                        "status_token": "high",
                        "severity": "moderate",
                        "dietary_recommendations": [
                            "Reduce simple carbohydrates",
                            "Increase physical activity"
                        ]
                    }
                ]
            }]
        }
    });
    let path = write_file(temp_dir.path(), "catalog.json", &catalog.to_string());

    cli()
        .arg("--catalog")
        .arg(&path)
        .args(["classify", "fastingGlucose", "130", "--unit", "mg/dL"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-> high [moderate]"))
        .stdout(predicate::str::contains("Reduce simple carbohydrates"))
        .stdout(predicate::str::contains("Increase physical activity"));
}

#[test]
fn test_interactions_are_order_invariant() {
    let forward = cli()
        .args(["interactions", "Glucophage", "Coumadin"])
        .output()
        .expect("Failed to run CLI");
    let reverse = cli()
        .args(["interactions", "Coumadin", "Glucophage"])
        .output()
        .expect("Failed to run CLI");

    assert!(forward.status.success());
    assert_eq!(forward.stdout, reverse.stdout);
    let text = String::from_utf8_lossy(&forward.stdout);
    assert!(text.contains("Metformin + Warfarin [moderate]"));
    assert!(text.contains("Avoid alcohol"));
}

#[test]
fn test_unknown_medication_is_a_warning() {
    cli()
        .args(["interactions", "Lipitor", "moon dust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grapefruit juice"))
        .stderr(predicate::str::contains("unknown medication 'moon dust'"));
}

#[test]
fn test_conditions_mapping() {
    cli()
        .args(["conditions", "Type 2 Diabetes", "Tennis elbow", "HTN"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Type 2 Diabetes -> diabetes_type2"))
        .stdout(predicate::str::contains("Tennis elbow -> unrecognized"))
        .stdout(predicate::str::contains("HTN -> high_blood_pressure"));
}

#[test]
fn test_meal_plans_exclude_incompatible_medication() {
    cli()
        .args(["meal-plans", "--condition", "diabetes_type2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Low Glycemic Intensive Plan"));

    cli()
        .args(["meal-plans", "--condition", "diabetes_type2", "--medication", "insulin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Balanced Diabetic Plan"))
        .stdout(predicate::str::contains("Low Glycemic").not());
}

#[test]
fn test_meal_plans_brand_name_excludes_plan() {
    let json = stdout_json(cli().args([
        "meal-plans",
        "--condition",
        "high cholesterol",
        "--medication",
        "Coumadin",
        "--json",
    ]));

    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["plan"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["heart_healthy"]);
}

#[test]
fn test_evaluate_panel_csv() {
    let temp_dir = setup_test_dir();
    let panel = write_file(
        temp_dir.path(),
        "panel.csv",
        "parameter,value,unit\nhemoglobin,10,g/dL\nfasting_glucose,118,mg/dL\nbogus_row\n",
    );

    let json = stdout_json(
        cli()
            .arg("evaluate")
            .arg("--panel")
            .arg(&panel)
            .args(["--medication", "Metformin", "--condition", "Gout", "--json"]),
    );

    let report = &json["report"];
    assert_eq!(report["severity"], "moderate");
    assert_eq!(
        report["recommendations"][0],
        "Eat iron-rich foods such as red meat, spinach and legumes"
    );
    assert_eq!(report["possible_conditions"][0], "gout");
    assert_eq!(json["classified"].as_array().unwrap().len(), 2);
    assert!(json["meal_plans"].as_array().unwrap().len() >= 2);
}

#[test]
fn test_evaluate_text_output_and_warnings() {
    let temp_dir = setup_test_dir();
    let panel = write_file(
        temp_dir.path(),
        "panel.csv",
        "parameter,value,unit\nhemoglobin,14,g/dL\nplatelets,250,10^3/uL\n",
    );

    cli()
        .arg("evaluate")
        .arg("--panel")
        .arg(&panel)
        .args(["--taken-at", "2024-05-01", "--condition", "Tennis elbow"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 of 2 lab values").not())
        .stdout(predicate::str::contains("Overall severity: normal"))
        .stderr(predicate::str::contains("unknown lab parameter 'platelets'"))
        .stderr(predicate::str::contains("unrecognized condition 'Tennis elbow'"));
}

#[test]
fn test_evaluate_lab_trigger_and_sex() {
    let temp_dir = setup_test_dir();
    let panel = write_file(
        temp_dir.path(),
        "panel.csv",
        "parameter,value,unit\nhemoglobin,12.8,g/dL\n",
    );

    let json = stdout_json(cli().arg("evaluate").arg("--panel").arg(&panel).arg("--json"));
    assert_eq!(json["classified"][0]["status_token"], "normal");
    assert!(json["meal_plans"].as_array().unwrap().is_empty());

    let json = stdout_json(
        cli()
            .arg("evaluate")
            .arg("--panel")
            .arg(&panel)
            .args(["--sex", "male", "--json"]),
    );
    assert_eq!(json["classified"][0]["status_token"], "low");
    assert_eq!(json["meal_plans"][0]["plan"]["id"], "iron_rich");
    assert_eq!(json["meal_plans"][0]["matched_lab_triggers"][0]["parameter"], "hemoglobin");
}

#[test]
fn test_narrative_prompt_follows_config() {
    let temp_dir = setup_test_dir();
    let panel = write_file(
        temp_dir.path(),
        "panel.csv",
        "parameter,value,unit\nhemoglobin,10,g/dL\n",
    );
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[narrative]\nbackend = \"open_router\"\nmodel = \"mistral-small\"\n",
    );

    let json = stdout_json(
        cli()
            .arg("--config")
            .arg(&config)
            .arg("evaluate")
            .arg("--panel")
            .arg(&panel)
            .args(["--narrative-prompt", "--json"]),
    );
    assert_eq!(json["backend"], "open_router");
    assert_eq!(json["model"], "mistral-small");
    assert!(json["prompt"]
        .as_str()
        .unwrap()
        .contains("- hemoglobin: 10 g/dL (low)"));

    cli()
        .arg("evaluate")
        .arg("--panel")
        .arg(&panel)
        .arg("--narrative-prompt")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend: open_ai (gpt-4o-mini)"))
        .stdout(predicate::str::contains("Explain these health findings"));
}

#[test]
fn test_evaluate_requires_lab_data() {
    cli()
        .args(["evaluate", "--medication", "Metformin"])
        .assert()
        .failure();
}

#[test]
fn test_evaluate_profile_file() {
    let temp_dir = setup_test_dir();
    let mut profile = health_core::HealthProfile::new();
    profile.add_medication("Levothyroxine");
    profile.add_condition("Hashimoto thyroiditis");
    profile.append_panel(health_core::LabPanel::new(
        chrono::Utc::now(),
        vec![health_core::PanelEntry::new("tsh", 6.5, "mIU/L")],
    ));
    let path = temp_dir.path().join("profile.json");
    profile.save(&path).unwrap();

    cli()
        .arg("evaluate")
        .arg("--profile")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("tsh: 6.5 mIU/L -> high [moderate]"))
        .stdout(predicate::str::contains("Thyroid Support Plan"));
}

#[test]
fn test_trends_from_history() {
    let temp_dir = setup_test_dir();
    let history = write_file(
        temp_dir.path(),
        "history.csv",
        "taken_at,parameter,value,unit\n\
         2024-01-10,fasting_glucose,150,mg/dL\n\
         2024-04-10,glucose,7.0,mmol/L\n\
         2024-04-10,hdl,50,mg/dL\n",
    );

    cli()
        .arg("trends")
        .arg("--history")
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("fasting_glucose: 150 ->"))
        .stdout(predicate::str::contains("Significant, improving"))
        .stdout(predicate::str::contains("Overall: improving"))
        .stdout(predicate::str::contains("hdl: insufficient data (1 point(s))"));
}

#[test]
fn test_trend_thresholds_from_config() {
    let temp_dir = setup_test_dir();
    let history = write_file(
        temp_dir.path(),
        "history.csv",
        "taken_at,parameter,value,unit\n2024-01-10,glucose,100,mg/dL\n2024-03-10,glucose,110,mg/dL\n",
    );
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[trends]\nnegligible_below = 0.02\nsignificant_above = 0.08\n",
    );

    cli()
        .arg("trends")
        .arg("--history")
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("(+10.0%, Moderate, worsening)"));

    cli()
        .arg("--config")
        .arg(&config)
        .arg("trends")
        .arg("--history")
        .arg(&history)
        .assert()
        .success()
        .stdout(predicate::str::contains("(+10.0%, Significant, worsening)"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config = write_file(
        temp_dir.path(),
        "config.toml",
        "[trends]\nnegligible_below = 0.4\nsignificant_above = 0.1\n",
    );

    cli()
        .arg("--config")
        .arg(&config)
        .args(["classify", "hb", "13"])
        .assert()
        .failure();
}

#[test]
fn test_validate_builtin_catalog() {
    cli()
        .arg("validate-catalog")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ built-in catalog is valid"));
}

#[test]
fn test_validate_catalog_reports_overlaps() {
    let temp_dir = setup_test_dir();
    let catalog = serde_json::json!({
        "rules": {
            "rules": [{
                "key": "ferritin",
                "unit": "ng/mL",
                "normal_range": {"min": 30.0, "max": 300.0},
                "interpretations": [
                    {"range": {"min": 0.0, "max": 40.0}, "status_token": "low", "severity": "mild"},
                    {"range": {"min": 30.0, "max": 300.0}, "status_token": "normal", "severity": "normal"}
                ]
            }]
        }
    });
    let path = write_file(temp_dir.path(), "catalog.json", &catalog.to_string());

    cli()
        .arg("--catalog")
        .arg(&path)
        .arg("validate-catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("overlaps"));
}

#[test]
fn test_validate_catalog_reports_gaps() {
    let temp_dir = setup_test_dir();
    let catalog = serde_json::json!({
        "rules": {
            "rules": [{
                "key": "ferritin",
                "unit": "ng/mL",
                "normal_range": {"min": 30.0, "max": 300.0},
                "interpretations": [
                    {"range": {"min": 30.0, "max": 300.0}, "status_token": "normal", "severity": "normal"},
                    {"range": {"min": 0.0, "max": 29.99}, "status_token": "low", "severity": "mild"}
                ]
            }]
        }
    });
    let path = write_file(temp_dir.path(), "catalog.json", &catalog.to_string());

    cli()
        .arg("--catalog")
        .arg(&path)
        .arg("validate-catalog")
        .assert()
        .failure()
        .stderr(predicate::str::contains("values between 29.99 and 30 match no interpretation"));
}

#[test]
fn test_missing_catalog_file_fails() {
    cli()
        .args(["--catalog", "/nonexistent/catalog.json", "validate-catalog"])
        .assert()
        .failure();
}
