//! Minimal benchmark controls: groups of checks with their scoring attribute
//!
//! Only identifiers, descriptive text and the scored flag are read. Audit
//! commands and expected results belong to the check runner, not to this crate.

use crate::filter::RunFilter;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A single benchmark check
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Check {
    /// Check identifier (e.g., "1.1.1")
    pub id: String,

    /// Human-readable description
    #[serde(default)]
    pub text: String,

    /// Whether the check contributes to the compliance score
    #[serde(default = "default_scored")]
    pub scored: bool,
}

fn default_scored() -> bool {
    true
}

/// A group of related checks (e.g., "1.1 Master Node Configuration Files")
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub checks: Vec<Check>,
}

/// Check selected for execution, tagged with the group it belongs to
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SelectedCheck {
    pub group: String,
    pub id: String,
    pub text: String,
    pub scored: bool,
}

/// Controls document loaded from TOML
///
/// # Example TOML
/// ```toml
/// [[groups]]
/// id = "1.1"
/// text = "Master Node Configuration Files"
///
/// [[groups.checks]]
/// id = "1.1.1"
/// text = "Ensure that the API server pod specification file permissions are set to 644"
/// scored = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Controls {
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Controls {
    /// Load controls from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read, is not valid TOML, or
    /// repeats a check identifier.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read controls file: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid controls file: {}", path.display()))
    }

    /// Parse controls from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let controls: Controls = toml::from_str(content).context("Failed to parse controls TOML")?;

        let mut seen = HashSet::new();
        for group in &controls.groups {
            for check in &group.checks {
                if !seen.insert(check.id.as_str()) {
                    bail!("Duplicate check '{}' in group '{}'", check.id, group.id);
                }
            }
        }

        Ok(controls)
    }

    /// Total number of checks across all groups
    pub fn check_count(&self) -> usize {
        self.groups.iter().map(|g| g.checks.len()).sum()
    }

    /// Apply a compiled filter to every (group, check) pair, keeping file order
    pub fn select(&self, filter: &RunFilter) -> Vec<SelectedCheck> {
        self.groups
            .iter()
            .flat_map(|group| {
                group
                    .checks
                    .iter()
                    .filter(move |check| filter.matches(group, check))
                    .map(move |check| SelectedCheck {
                        group: group.id.clone(),
                        id: check.id.clone(),
                        text: check.text.clone(),
                        scored: check.scored,
                    })
            })
            .collect()
    }
}
