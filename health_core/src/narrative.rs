//! Optional prose on top of a structured report.
//!
//! Text generation itself lives outside this crate. A caller picks a
//! [`NarrativeBackend`] from configuration, constructs its own
//! [`NarrativeGenerator`] for it, and hands that generator to [`narrate`].
//! Callers that drive the service out of process take a
//! [`NarrativeRequest`] instead.

use crate::aggregator::Report;
use crate::config::NarrativeConfig;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// External text-generation service
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeBackend {
    #[default]
    OpenAi,
    OpenRouter,
}

impl fmt::Display for NarrativeBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NarrativeBackend::OpenAi => write!(f, "open_ai"),
            NarrativeBackend::OpenRouter => write!(f, "open_router"),
        }
    }
}

/// Turns a prompt into prose using one fixed backend
pub trait NarrativeGenerator {
    fn backend(&self) -> NarrativeBackend;

    fn generate(&self, prompt: &str) -> Result<String>;
}

/// Prompt describing the report's structured findings
pub fn build_prompt(report: &Report) -> String {
    let mut prompt = String::new();
    prompt.push_str("Explain these health findings in plain language.\n");
    prompt.push_str(&format!("Summary: {}\n", report.summary));
    prompt.push_str(&format!("Overall severity: {}\n", report.severity));

    if !report.concerns.is_empty() {
        prompt.push_str("Concerns:\n");
        for concern in &report.concerns {
            prompt.push_str(&format!("- {}\n", concern));
        }
    }

    if !report.possible_conditions.is_empty() {
        let labels: Vec<&str> = report.possible_conditions.iter().map(|c| c.label()).collect();
        prompt.push_str(&format!("Possible conditions: {}\n", labels.join(", ")));
    }

    if !report.recommendations.is_empty() {
        prompt.push_str("Recommendations:\n");
        for rec in &report.recommendations {
            prompt.push_str(&format!("- {}\n", rec));
        }
    }

    prompt
}

/// Everything an external generator needs for one report
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NarrativeRequest {
    pub backend: NarrativeBackend,
    pub model: String,
    pub prompt: String,
}

impl NarrativeRequest {
    pub fn new(report: &Report, config: &NarrativeConfig) -> Self {
        Self {
            backend: config.backend,
            model: config.model.clone(),
            prompt: build_prompt(report),
        }
    }
}

/// Attach generated prose to the report
///
/// Generator failures are logged; the structured report is returned either way.
pub fn narrate(mut report: Report, generator: &dyn NarrativeGenerator) -> Report {
    let prompt = build_prompt(&report);
    match generator.generate(&prompt) {
        Ok(text) => {
            tracing::debug!("Narrative generated by {}", generator.backend());
            report.narrative = Some(text);
        }
        Err(e) => {
            tracing::warn!("Narrative generation via {} failed: {}", generator.backend(), e);
            report.narrative = None;
        }
    }
    report
}
