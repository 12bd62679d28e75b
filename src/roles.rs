//! Node role detection (master, node, ...)
//!
//! A node holds a role when the running-binaries provider reports as many
//! components as the role requires. Inspection failures never raise: they
//! count as "role not held".

use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration key holding the role definitions
pub const ROLES_KEY: &str = "roles";

/// Snapshot of running components: component name → observed binary
pub type RunningBinaries = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleConfigError {
    #[error("'roles' in configuration must be a table")]
    NotATable,

    #[error("malformed role '{role}': {reason}")]
    Malformed { role: String, reason: String },
}

/// A role and the components that must be running to hold it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    pub name: String,

    /// Required components, in configuration order
    pub components: Vec<String>,

    /// Candidate executable names per component
    pub binaries: BTreeMap<String, Vec<String>>,
}

impl RoleSpec {
    pub fn new(name: &str, components: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            components: components.iter().map(|c| c.to_string()).collect(),
            binaries: BTreeMap::new(),
        }
    }

    /// Executable names that identify `component`; the component name itself
    /// when none are configured
    pub fn candidates(&self, component: &str) -> Vec<String> {
        match self.binaries.get(component) {
            Some(names) if !names.is_empty() => names.clone(),
            _ => vec![component.to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoleEntry {
    components: Vec<String>,
    #[serde(default)]
    binaries: BTreeMap<String, Vec<String>>,
}

/// Configured roles keyed by role name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    roles: BTreeMap<String, RoleSpec>,
}

impl RoleTable {
    pub fn get(&self, name: &str) -> Option<&RoleSpec> {
        self.roles.get(name)
    }

    pub fn insert(&mut self, spec: RoleSpec) {
        self.roles.insert(spec.name.clone(), spec);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Load role definitions from a configuration table
///
/// A missing `roles` key yields an empty table: no node can hold any role.
pub fn load_roles(config: &toml::Table) -> Result<RoleTable, RoleConfigError> {
    let Some(value) = config.get(ROLES_KEY) else {
        return Ok(RoleTable::default());
    };
    let entries = value.as_table().ok_or(RoleConfigError::NotATable)?;

    let mut table = RoleTable::default();
    for (name, entry) in entries {
        let entry: RoleEntry =
            entry
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| RoleConfigError::Malformed {
                    role: name.clone(),
                    reason: e.to_string().trim().to_string(),
                })?;
        table.insert(RoleSpec {
            name: name.clone(),
            components: entry.components,
            binaries: entry.binaries,
        });
    }

    Ok(table)
}

/// Decide whether this node holds `role_name`
///
/// The provider is only invoked when the role is configured. Only the number
/// of observed components is compared, not their names.
pub fn has_role<F>(role_name: &str, roles: &RoleTable, provider: F) -> bool
where
    F: FnOnce(&RoleSpec) -> anyhow::Result<RunningBinaries>,
{
    let Some(spec) = roles.get(role_name) else {
        tracing::debug!(role = role_name, "role not configured");
        return false;
    };

    let running = match provider(spec) {
        Ok(running) => running,
        Err(e) => {
            tracing::debug!(role = role_name, error = %e, "failed to inspect running binaries");
            return false;
        }
    };

    let held = running.len() == spec.components.len();
    tracing::debug!(
        role = role_name,
        required = spec.components.len(),
        found = running.len(),
        held,
        "role check"
    );
    held
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::cell::Cell;

    fn running(entries: &[(&str, &str)]) -> RunningBinaries {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn single_master() -> RoleTable {
        let mut roles = RoleTable::default();
        roles.insert(RoleSpec::new("master", &["apiserver"]));
        roles
    }

    #[test]
    fn test_all_components_running() {
        let held = has_role("master", &single_master(), |_| {
            Ok(running(&[("apiserver", "kube-apiserver")]))
        });
        assert!(held);
    }

    #[test]
    fn test_not_all_components_running() {
        let held = has_role("master", &single_master(), |_| Ok(RunningBinaries::new()));
        assert!(!held);
    }

    #[test]
    fn test_provider_error_is_negative() {
        let held = has_role("master", &single_master(), |_| {
            Err(anyhow::anyhow!("failed to find binaries"))
        });
        assert!(!held);
    }

    #[test]
    fn test_absent_role_skips_provider() {
        let called = Cell::new(false);
        let held = has_role("master", &RoleTable::default(), |_| {
            called.set(true);
            Ok(running(&[("apiserver", "kube-apiserver")]))
        });
        assert!(!held);
        assert!(!called.get());
    }

    #[test]
    fn test_provider_receives_role_spec() {
        let config = Config::default_config().unwrap();
        let roles = config.roles().unwrap();
        let held = has_role("node", &roles, |spec| {
            assert_eq!(spec.name, "node");
            Ok(spec
                .components
                .iter()
                .map(|c| (c.clone(), format!("/usr/bin/{c}")))
                .collect())
        });
        assert!(held);
    }

    #[test]
    fn test_count_only_comparison() {
        // Same cardinality, unrelated names: still counted as held.
        let held = has_role("master", &single_master(), |_| {
            Ok(running(&[("something-else", "/bin/true")]))
        });
        assert!(held);
    }

    #[test]
    fn test_load_roles_missing_key() {
        let roles = load_roles(&toml::Table::new()).unwrap();
        assert!(roles.is_empty());
        assert!(!has_role("master", &roles, |_| Ok(RunningBinaries::new())));
    }

    #[test]
    fn test_load_roles_with_binaries() {
        let table: toml::Table = r#"
[roles.master]
components = ["apiserver", "etcd"]

[roles.master.binaries]
apiserver = ["kube-apiserver", "hyperkube"]
"#
        .parse()
        .unwrap();

        let roles = load_roles(&table).unwrap();
        let master = roles.get("master").unwrap();
        assert_eq!(master.components, vec!["apiserver", "etcd"]);
        assert_eq!(master.candidates("apiserver"), vec!["kube-apiserver", "hyperkube"]);
        assert_eq!(master.candidates("etcd"), vec!["etcd"]);
    }

    #[test]
    fn test_load_roles_malformed() {
        let table: toml::Table = "roles = 3".parse().unwrap();
        assert_eq!(load_roles(&table).unwrap_err(), RoleConfigError::NotATable);

        let table: toml::Table = r#"
[roles.master]
components = "apiserver"
"#
        .parse()
        .unwrap();
        assert!(matches!(
            load_roles(&table).unwrap_err(),
            RoleConfigError::Malformed { ref role, .. } if role == "master"
        ));
    }
}
