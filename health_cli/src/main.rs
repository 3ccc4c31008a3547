use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use health_core::classifier::ClassificationOutcome;
use health_core::conditions::resolve_conditions;
use health_core::panel_csv::{load_history_csv, load_panel_csv, parse_timestamp};
use health_core::trends::TrendResult;
use health_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "healthrules")]
#[command(about = "Lab-driven health rule engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON catalog snapshot (overrides config; built-in catalog otherwise)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/healthrules/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a single lab value
    Classify {
        /// Parameter key or alias (e.g. hemoglobin, hb, glucose)
        parameter: String,

        value: f64,

        /// Unit as reported; defaults to the rule's unit
        #[arg(long, default_value = "")]
        unit: String,

        /// Sex for sex-specific ranges (female or male)
        #[arg(long, value_parser = parse_sex)]
        sex: Option<Sex>,
    },

    /// Check drug-drug and drug-food interactions
    Interactions {
        /// Medication names, brand names or aliases
        #[arg(required = true)]
        medications: Vec<String>,
    },

    /// Map diagnosis names to condition tags
    Conditions {
        #[arg(required = true)]
        names: Vec<String>,
    },

    /// List meal plans matching conditions and medications
    MealPlans {
        /// Condition name or tag (repeatable)
        #[arg(long = "condition", required = true)]
        conditions: Vec<String>,

        /// Medication name (repeatable)
        #[arg(long = "medication")]
        medications: Vec<String>,
    },

    /// Evaluate a profile or panel and print the full analysis
    Evaluate {
        /// Profile JSON file
        #[arg(long)]
        profile: Option<PathBuf>,

        /// CSV panel (parameter,value,unit)
        #[arg(long)]
        panel: Option<PathBuf>,

        /// When the CSV panel was taken (RFC 3339 or YYYY-MM-DD); defaults to now
        #[arg(long, requires = "panel")]
        taken_at: Option<String>,

        /// CSV panel history (taken_at,parameter,value,unit)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Medication name (repeatable)
        #[arg(long = "medication")]
        medications: Vec<String>,

        /// Diagnosed condition (repeatable)
        #[arg(long = "condition")]
        conditions: Vec<String>,

        /// Sex for sex-specific ranges (female or male); overrides the profile
        #[arg(long, value_parser = parse_sex)]
        sex: Option<Sex>,

        /// Print the narrative request for the configured backend instead of the analysis
        #[arg(long)]
        narrative_prompt: bool,
    },

    /// Analyze lab trends across a panel history
    Trends {
        /// CSV panel history (taken_at,parameter,value,unit)
        #[arg(long, conflicts_with = "profile")]
        history: Option<PathBuf>,

        /// Profile JSON file
        #[arg(long)]
        profile: Option<PathBuf>,
    },

    /// Validate the catalog and report any problems
    ValidateCatalog,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    health_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let catalog_path = cli.catalog.clone().or_else(|| config.data.catalog_path.clone());
    let loaded;
    let catalogs: &Catalogs = match &catalog_path {
        Some(path) => {
            loaded = load_catalogs(path)?;
            &loaded
        }
        None => {
            tracing::debug!("Using built-in catalog");
            get_default_catalogs()
        }
    };

    match cli.command {
        Commands::Classify {
            parameter,
            value,
            unit,
            sex,
        } => cmd_classify(catalogs, &parameter, value, &unit, sex, cli.json),
        Commands::Interactions { medications } => cmd_interactions(catalogs, &medications, cli.json),
        Commands::Conditions { names } => cmd_conditions(catalogs, &names, cli.json),
        Commands::MealPlans {
            conditions,
            medications,
        } => cmd_meal_plans(catalogs, &conditions, &medications, cli.json),
        Commands::Evaluate {
            profile,
            panel,
            taken_at,
            history,
            medications,
            conditions,
            sex,
            narrative_prompt,
        } => {
            let mut snapshot = build_snapshot(
                profile.as_deref(),
                panel.as_deref(),
                taken_at.as_deref(),
                history.as_deref(),
                medications,
                conditions,
            )?;
            if sex.is_some() {
                snapshot.sex = sex;
            }
            if narrative_prompt {
                cmd_narrative_prompt(catalogs, &config, &snapshot, cli.json)
            } else {
                cmd_evaluate(catalogs, &config, &snapshot, cli.json)
            }
        }
        Commands::Trends { history, profile } => {
            let snapshot = build_snapshot(profile.as_deref(), None, None, history.as_deref(), vec![], vec![])?;
            cmd_trends(catalogs, &config, &snapshot, cli.json)
        }
        Commands::ValidateCatalog => cmd_validate_catalog(catalogs, catalog_path.as_deref(), cli.json),
    }
}

fn parse_sex(raw: &str) -> std::result::Result<Sex, String> {
    match raw.trim().to_lowercase().as_str() {
        "female" | "f" => Ok(Sex::Female),
        "male" | "m" => Ok(Sex::Male),
        other => Err(format!("expected 'female' or 'male', got '{}'", other)),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_snapshot(
    profile: Option<&Path>,
    panel: Option<&Path>,
    taken_at: Option<&str>,
    history: Option<&Path>,
    medications: Vec<String>,
    conditions: Vec<String>,
) -> Result<ProfileSnapshot> {
    if profile.is_none() && panel.is_none() && history.is_none() {
        return Err(Error::Other(
            "Provide lab data with --profile, --panel or --history".into(),
        ));
    }

    let mut snapshot = match profile {
        Some(path) => HealthProfile::load(path)?.snapshot(),
        None => ProfileSnapshot::default(),
    };

    if let Some(path) = history {
        snapshot.panels.extend(load_history_csv(path)?);
    }

    if let Some(path) = panel {
        let taken_at: DateTime<Utc> = match taken_at {
            Some(raw) => parse_timestamp(raw)?,
            None => Utc::now(),
        };
        snapshot.panels.push(load_panel_csv(path, taken_at)?);
    }

    snapshot.panels.sort_by_key(|p| p.taken_at);
    snapshot.medications.extend(medications);
    snapshot.conditions.extend(conditions);
    Ok(snapshot)
}

fn describe(value: &ClassifiedValue) -> String {
    let shown = match &value.source_unit {
        Some(source) => format!("{:.2} {} (from {})", value.value, value.unit, source),
        None => format!("{} {}", value.value, value.unit),
    };
    match &value.outcome {
        ClassificationOutcome::Matched {
            status_token,
            severity,
            meaning,
            ..
        } => {
            if meaning.is_empty() {
                format!("{}: {} -> {} [{}]", value.parameter, shown, status_token, severity)
            } else {
                format!(
                    "{}: {} -> {} [{}] {}",
                    value.parameter, shown, status_token, severity, meaning
                )
            }
        }
        ClassificationOutcome::Unclassified { .. } | ClassificationOutcome::UnitMismatch { .. } => {
            match value.warning() {
                Some(warning) => format!("{}: {} -> unclassified ({})", value.parameter, shown, warning),
                None => format!("{}: {} -> unclassified (no matching range)", value.parameter, shown),
            }
        }
    }
}

fn cmd_classify(
    catalogs: &Catalogs,
    parameter: &str,
    value: f64,
    unit: &str,
    sex: Option<Sex>,
    json: bool,
) -> Result<()> {
    let classified = classify_for(parameter, value, unit, sex, &catalogs.rules);
    if json {
        return print_json(&classified);
    }

    println!("{}", describe(&classified));
    for rec in classified.dietary_recommendations() {
        println!("  → {}", rec);
    }
    Ok(())
}

fn cmd_interactions(catalogs: &Catalogs, medications: &[String], json: bool) -> Result<()> {
    let report = check_interactions(medications, &catalogs.medicines);
    if json {
        return print_json(&report);
    }

    if report.drug_interactions.is_empty() {
        println!("No drug interactions found.");
    } else {
        println!("Drug interactions:");
        for finding in &report.drug_interactions {
            println!(
                "  {} + {} [{}]: {}",
                finding.pair.0, finding.pair.1, finding.severity, finding.description
            );
        }
    }

    for summary in &report.food_interactions {
        if summary.interactions.is_empty() && summary.warnings.is_empty() {
            continue;
        }
        println!();
        println!("{}:", summary.medicine);
        for food in &summary.interactions {
            println!("  {:?} {}: {}", food.kind, food.food, food.description);
        }
        for warning in &summary.warnings {
            println!("  ! {}", warning);
        }
    }

    let advice = report.dietary_recommendations();
    if !advice.is_empty() {
        println!();
        println!("Dietary advice:");
        for rec in advice {
            println!("  → {}", rec);
        }
    }

    for name in &report.unresolved {
        eprintln!("Warning: unknown medication '{}'", name);
    }
    Ok(())
}

fn cmd_conditions(catalogs: &Catalogs, names: &[String], json: bool) -> Result<()> {
    let resolved = resolve_conditions(names, &catalogs.conditions);
    if json {
        return print_json(&resolved);
    }

    for condition in &resolved {
        match condition.tag {
            Some(tag) => println!("{} -> {} ({})", condition.name, tag, tag.label()),
            None => println!("{} -> unrecognized", condition.name),
        }
    }
    Ok(())
}

fn cmd_meal_plans(catalogs: &Catalogs, conditions: &[String], medications: &[String], json: bool) -> Result<()> {
    let resolved = resolve_conditions(conditions, &catalogs.conditions);
    for condition in resolved.iter().filter(|c| c.tag.is_none()) {
        eprintln!("Warning: unrecognized condition '{}'", condition.name);
    }
    let tags = health_core::conditions::condition_tags(&resolved);

    // Brand names resolve to the canonical medicine as well
    let interactions = check_interactions(medications, &catalogs.medicines);
    let mut names: Vec<&str> = medications.iter().map(String::as_str).collect();
    names.extend(interactions.resolved_medicines());

    let matches = match_meal_plans(&tags, &names, &catalogs.meal_plans);
    if json {
        return print_json(&matches);
    }

    if matches.is_empty() {
        println!("No matching meal plans.");
        return Ok(());
    }
    for m in &matches {
        let matched: Vec<&str> = m.matched_conditions.iter().map(|t| t.label()).collect();
        println!(
            "{} (priority {}, {} days) for {}",
            m.plan.name,
            m.plan.priority,
            m.plan.duration_days,
            matched.join(", ")
        );
        if !m.plan.include_foods.is_empty() {
            println!("  include: {}", m.plan.include_foods.join(", "));
        }
        if !m.plan.avoid_foods.is_empty() {
            println!("  avoid: {}", m.plan.avoid_foods.join(", "));
        }
    }
    Ok(())
}

fn cmd_evaluate(catalogs: &Catalogs, config: &Config, snapshot: &ProfileSnapshot, json: bool) -> Result<()> {
    let analysis = evaluate(snapshot, catalogs, config);
    if json {
        return print_json(&analysis);
    }

    let report = &analysis.report;
    println!("{}", report.summary);

    if !analysis.classified.is_empty() {
        println!();
        println!("Lab results:");
        for value in &analysis.classified {
            println!("  {}", describe(value));
        }
    }

    if !report.concerns.is_empty() {
        println!();
        println!("Concerns:");
        for concern in &report.concerns {
            println!("  - {}", concern);
        }
    }

    if !report.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for rec in &report.recommendations {
            println!("  → {}", rec);
        }
    }

    if !report.possible_conditions.is_empty() {
        let labels: Vec<&str> = report.possible_conditions.iter().map(|t| t.label()).collect();
        println!();
        println!("Conditions considered: {}", labels.join(", "));
    }

    if !analysis.meal_plans.is_empty() {
        println!();
        println!("Meal plans:");
        for m in &analysis.meal_plans {
            println!("  {} (priority {})", m.plan.name, m.plan.priority);
        }
    }

    print_trends(&analysis.trends);

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }
    Ok(())
}

fn cmd_narrative_prompt(
    catalogs: &Catalogs,
    config: &Config,
    snapshot: &ProfileSnapshot,
    json: bool,
) -> Result<()> {
    let analysis = evaluate(snapshot, catalogs, config);
    let request = NarrativeRequest::new(&analysis.report, &config.narrative);
    if json {
        return print_json(&request);
    }

    println!("Backend: {} ({})", request.backend, request.model);
    println!();
    print!("{}", request.prompt);
    Ok(())
}

fn print_trends(report: &TrendReport) {
    let analyzed: Vec<_> = report
        .trends
        .iter()
        .filter_map(|t| match t {
            TrendResult::Analyzed(trend) => Some(trend),
            TrendResult::InsufficientData { .. } => None,
        })
        .collect();
    if analyzed.is_empty() {
        return;
    }

    println!();
    println!("Trends:");
    for trend in analyzed {
        let change = match trend.percent_change {
            Some(pct) => format!("{:+.1}%", pct * 100.0),
            None => "from zero".to_string(),
        };
        println!(
            "  {}: {} -> {} ({}, {:?}, {})",
            trend.parameter,
            trend.earliest.value,
            trend.latest.value,
            change,
            trend.significance,
            trend.direction.as_str()
        );
    }
    if let Some(overall) = report.overall_progression {
        println!("  Overall: {}", overall.as_str());
    }
}

fn cmd_trends(catalogs: &Catalogs, config: &Config, snapshot: &ProfileSnapshot, json: bool) -> Result<()> {
    let report = analyze_trend_set(&snapshot.panels, &catalogs.rules, &config.trends);
    if json {
        return print_json(&report);
    }

    if report.overall_progression.is_none() {
        println!("Not enough history to analyze trends.");
    }
    print_trends(&report);

    for trend in &report.trends {
        if let TrendResult::InsufficientData { parameter, available } = trend {
            println!("  {}: insufficient data ({} point(s))", parameter, available);
        }
    }
    Ok(())
}

fn cmd_validate_catalog(catalogs: &Catalogs, path: Option<&Path>, json: bool) -> Result<()> {
    let issues = catalogs.validate();
    let source = path
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "built-in catalog".to_string());

    if json {
        print_json(&serde_json::json!({
            "source": source,
            "valid": issues.is_empty(),
            "issues": issues,
        }))?;
    } else if issues.is_empty() {
        println!(
            "✓ {} is valid ({} rules, {} medicines, {} meal plans, {} condition aliases)",
            source,
            catalogs.rules.rules.len(),
            catalogs.medicines.medicines.len(),
            catalogs.meal_plans.plans.len(),
            catalogs.conditions.entries.len()
        );
    } else {
        eprintln!("Catalog validation errors:");
        for issue in &issues {
            eprintln!("  - {}", issue);
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::CatalogValidation(format!("{} problem(s) in {}", issues.len(), source)))
    }
}
