#![forbid(unsafe_code)]

//! Core domain model and rule engine for lab-driven health advice.
//!
//! This crate provides:
//! - Domain types (lab rules, medicines, conditions, meal plans, panels)
//! - Catalog loading, validation and the built-in seed catalog
//! - Lab value classification and condition mapping
//! - Drug and food interaction checking
//! - Report aggregation, meal plan matching and trend analysis
//! - The health profile aggregate and its snapshots

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod classifier;
pub mod conditions;
pub mod interactions;
pub mod aggregator;
pub mod meal_plans;
pub mod trends;
pub mod profile;
pub mod panel_csv;
pub mod narrative;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalogs, get_default_catalogs, load_catalogs};
pub use config::Config;
pub use classifier::{classify, classify_for, classify_panel, classify_panel_for, ClassifiedValue};
pub use conditions::map_condition;
pub use interactions::{check_interactions, InteractionReport};
pub use aggregator::{aggregate_recommendations, Report};
pub use meal_plans::{match_meal_plans, match_meal_plans_with_labs, MealPlanMatch};
pub use trends::{analyze_trend_set, analyze_trends, ParameterHistory, TrendReport, TrendResult};
pub use profile::{HealthProfile, ProfileSnapshot};
pub use narrative::{narrate, NarrativeBackend, NarrativeGenerator, NarrativeRequest};
pub use engine::{evaluate, HealthAnalysis};
