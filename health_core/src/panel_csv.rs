//! CSV import of lab panels.
//!
//! Two layouts are read:
//! - a single panel, header `parameter,value,unit`
//! - a history of panels, header `taken_at,parameter,value,unit`, where rows
//!   sharing a timestamp form one panel
//!
//! Rows that cannot be parsed are logged and skipped.

use crate::types::{LabPanel, PanelEntry};
use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct PanelRow {
    parameter: String,
    value: f64,
    #[serde(default)]
    unit: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    taken_at: String,
    parameter: String,
    value: f64,
    #[serde(default)]
    unit: Option<String>,
}

impl TryFrom<PanelRow> for PanelEntry {
    type Error = Error;

    fn try_from(row: PanelRow) -> Result<Self> {
        let parameter = row.parameter.trim();
        if parameter.is_empty() {
            return Err(Error::Panel("empty parameter name".into()));
        }
        if !row.value.is_finite() {
            return Err(Error::Panel(format!("non-finite value for {}", parameter)));
        }
        Ok(PanelEntry::new(parameter, row.value, row.unit.unwrap_or_default()))
    }
}

/// Accept RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| Error::Panel(format!("Invalid timestamp: {}", raw)))
}

fn source_label(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Load one panel taken at `taken_at`
pub fn load_panel_csv(path: &Path, taken_at: DateTime<Utc>) -> Result<LabPanel> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut entries = Vec::new();
    for (line, result) in reader.deserialize::<PanelRow>().enumerate() {
        match result {
            Ok(row) => match PanelEntry::try_from(row) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!("Skipping row {} of {:?}: {}", line + 2, path, e),
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize row {} of {:?}: {}", line + 2, path, e);
            }
        }
    }

    tracing::info!("Loaded {} lab values from {:?}", entries.len(), path);

    let mut panel = LabPanel::new(taken_at, entries);
    panel.source = source_label(path);
    Ok(panel)
}

/// Load a panel history, one panel per distinct timestamp, oldest first
pub fn load_history_csv(path: &Path) -> Result<Vec<LabPanel>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_path(path)?;

    let mut grouped: BTreeMap<DateTime<Utc>, Vec<PanelEntry>> = BTreeMap::new();
    for (line, result) in reader.deserialize::<HistoryRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Failed to deserialize row {} of {:?}: {}", line + 2, path, e);
                continue;
            }
        };

        let parsed = parse_timestamp(&row.taken_at).and_then(|taken_at| {
            PanelEntry::try_from(PanelRow {
                parameter: row.parameter,
                value: row.value,
                unit: row.unit,
            })
            .map(|entry| (taken_at, entry))
        });

        match parsed {
            Ok((taken_at, entry)) => grouped.entry(taken_at).or_default().push(entry),
            Err(e) => tracing::warn!("Skipping row {} of {:?}: {}", line + 2, path, e),
        }
    }

    let source = source_label(path);
    let panels: Vec<LabPanel> = grouped
        .into_iter()
        .map(|(taken_at, entries)| {
            let mut panel = LabPanel::new(taken_at, entries);
            panel.source = source.clone();
            panel
        })
        .collect();

    tracing::info!("Loaded {} lab panels from {:?}", panels.len(), path);
    Ok(panels)
}
