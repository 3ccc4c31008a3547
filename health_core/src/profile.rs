//! The health profile aggregate.
//!
//! A profile owns the user's medications, diagnosed conditions and lab
//! panels. Every entity carries a generated id and is mutated only through
//! id-based operations on the profile. The engine never sees the profile
//! itself, only an immutable [`ProfileSnapshot`].

use crate::types::{DiagnosedCondition, LabPanel, Medication, Sex};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthProfile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Selects sex-specific interpretation bands when set
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    medications: Vec<Medication>,
    #[serde(default)]
    conditions: Vec<DiagnosedCondition>,
    /// Append-only; removal is a soft delete
    #[serde(default)]
    panels: Vec<LabPanel>,
}

/// Read-only view of a profile at one point in time
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub medications: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<String>,
    /// Active panels, oldest first
    #[serde(default)]
    pub panels: Vec<LabPanel>,
}

impl ProfileSnapshot {
    pub fn latest_panel(&self) -> Option<&LabPanel> {
        self.panels
            .iter()
            .filter(|p| p.is_active())
            .max_by_key(|p| p.taken_at)
    }
}

impl Default for HealthProfile {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthProfile {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            sex: None,
            medications: Vec::new(),
            conditions: Vec::new(),
            panels: Vec::new(),
        }
    }

    pub fn medications(&self) -> &[Medication] {
        &self.medications
    }

    pub fn conditions(&self) -> &[DiagnosedCondition] {
        &self.conditions
    }

    /// All panels including soft-deleted ones, in insertion order
    pub fn panels(&self) -> &[LabPanel] {
        &self.panels
    }

    pub fn add_medication(&mut self, name: impl Into<String>) -> Uuid {
        let medication = Medication {
            id: Uuid::new_v4(),
            name: name.into(),
            dosage: None,
            frequency: None,
            started_on: None,
        };
        let id = medication.id;
        tracing::debug!("Added medication {} ({})", medication.name, id);
        self.medications.push(medication);
        id
    }

    /// Apply `f` to the medication; its id cannot be changed
    pub fn update_medication<F>(&mut self, id: Uuid, f: F) -> Result<()>
    where
        F: FnOnce(&mut Medication),
    {
        let medication = self
            .medications
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(Error::NotFound {
                kind: "medication",
                id,
            })?;
        f(medication);
        medication.id = id;
        Ok(())
    }

    pub fn remove_medication(&mut self, id: Uuid) -> Result<Medication> {
        let index = self
            .medications
            .iter()
            .position(|m| m.id == id)
            .ok_or(Error::NotFound {
                kind: "medication",
                id,
            })?;
        Ok(self.medications.remove(index))
    }

    pub fn add_condition(&mut self, name: impl Into<String>) -> Uuid {
        let condition = DiagnosedCondition {
            id: Uuid::new_v4(),
            name: name.into(),
            diagnosed_on: None,
            notes: None,
        };
        let id = condition.id;
        tracing::debug!("Added condition {} ({})", condition.name, id);
        self.conditions.push(condition);
        id
    }

    /// Apply `f` to the condition; its id cannot be changed
    pub fn update_condition<F>(&mut self, id: Uuid, f: F) -> Result<()>
    where
        F: FnOnce(&mut DiagnosedCondition),
    {
        let condition = self
            .conditions
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(Error::NotFound {
                kind: "condition",
                id,
            })?;
        f(condition);
        condition.id = id;
        Ok(())
    }

    pub fn remove_condition(&mut self, id: Uuid) -> Result<DiagnosedCondition> {
        let index = self
            .conditions
            .iter()
            .position(|c| c.id == id)
            .ok_or(Error::NotFound {
                kind: "condition",
                id,
            })?;
        Ok(self.conditions.remove(index))
    }

    pub fn append_panel(&mut self, panel: LabPanel) -> Uuid {
        let id = panel.id;
        tracing::debug!(
            "Appended lab panel {} with {} entries",
            id,
            panel.entries.len()
        );
        self.panels.push(panel);
        id
    }

    /// Mark a panel deleted; deleting twice keeps the first timestamp
    pub fn soft_delete_panel(&mut self, id: Uuid) -> Result<()> {
        let panel = self
            .panels
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::NotFound {
                kind: "lab panel",
                id,
            })?;
        if panel.deleted_at.is_none() {
            panel.deleted_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Active panels, oldest first
    pub fn active_panels(&self) -> Vec<&LabPanel> {
        let mut active: Vec<&LabPanel> = self.panels.iter().filter(|p| p.is_active()).collect();
        active.sort_by_key(|p| p.taken_at);
        active
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            sex: self.sex,
            medications: self.medications.iter().map(|m| m.name.clone()).collect(),
            conditions: self.conditions.iter().map(|c| c.name.clone()).collect(),
            panels: self.active_panels().into_iter().cloned().collect(),
        }
    }

    /// Load a profile from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let profile: HealthProfile = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded profile {} from {:?} ({} panels)",
            profile.id,
            path,
            profile.panels.len()
        );
        Ok(profile)
    }

    /// Write the profile as JSON, replacing the file atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        let contents = serde_json::to_string_pretty(self)?;
        temp.write_all(contents.as_bytes())?;
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved profile {} to {:?}", self.id, path);
        Ok(())
    }
}
