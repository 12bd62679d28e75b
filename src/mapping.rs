//! Kubernetes version → CIS benchmark mapping, first matching rule wins

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration key holding the ordered version mapping rules
pub const VERSION_MAPPING_KEY: &str = "version_mapping";

/// Errors raised while loading or applying the version mapping
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    #[error("missing or empty 'version_mapping' in configuration")]
    Empty,

    #[error("malformed 'version_mapping' in configuration: {reason}")]
    Malformed { reason: String },

    #[error("unable to find a matching benchmark version for kubernetes version {version:?}")]
    UnmappedVersion { version: String },
}

/// One kubernetes version → benchmark rule
///
/// # Example TOML
/// ```toml
/// [[version_mapping]]
/// kubernetes = "1.13"
/// benchmark = "cis-1.4"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VersionMapRule {
    /// Kubernetes version this rule matches (compared for equality)
    pub kubernetes: String,

    /// Benchmark specification identifier selected by this rule
    pub benchmark: String,
}

impl VersionMapRule {
    pub fn matches(&self, version: &str) -> bool {
        self.kubernetes == version
    }
}

/// Ordered rule table; the first matching rule wins
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionMapping {
    rules: Vec<VersionMapRule>,
}

impl VersionMapping {
    pub fn new(rules: Vec<VersionMapRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[VersionMapRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Select the benchmark specification for a canonical kubernetes version
    ///
    /// # Errors
    /// Returns [`MappingError::UnmappedVersion`] when no rule matches. There is
    /// no fallback benchmark.
    pub fn map_to_specification(&self, version: &str) -> Result<String, MappingError> {
        self.rules
            .iter()
            .find(|rule| rule.matches(version))
            .map(|rule| rule.benchmark.clone())
            .ok_or_else(|| MappingError::UnmappedVersion {
                version: version.to_string(),
            })
    }
}

/// Load the ordered version mapping from a configuration table
///
/// # Errors
/// - [`MappingError::Empty`] if the key is absent or holds an empty list
/// - [`MappingError::Malformed`] if the key is not a list of rules
pub fn load_version_mapping(config: &toml::Table) -> Result<VersionMapping, MappingError> {
    let value = config.get(VERSION_MAPPING_KEY).ok_or(MappingError::Empty)?;

    let rules: Vec<VersionMapRule> =
        value
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| MappingError::Malformed {
                reason: e.to_string().trim().to_string(),
            })?;

    if rules.is_empty() {
        return Err(MappingError::Empty);
    }

    tracing::debug!(rules = rules.len(), "loaded version mapping");
    Ok(VersionMapping::new(rules))
}

/// Select the benchmark specification for `version` from `rules`
pub fn map_to_specification(rules: &VersionMapping, version: &str) -> Result<String, MappingError> {
    rules.map_to_specification(version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn table(doc: &str) -> toml::Table {
        doc.parse().unwrap()
    }

    #[test]
    fn test_map_default_config_versions() {
        let rules = Config::default_config().unwrap().version_mapping().unwrap();

        let cases = [
            ("1.11", "cis-1.3"),
            ("1.12", "cis-1.3"),
            ("1.13", "cis-1.4"),
            ("1.16", "cis-1.4"),
        ];
        for (kube, expected) in cases {
            assert_eq!(map_to_specification(&rules, kube).unwrap(), expected, "{kube}");
        }
    }

    #[test]
    fn test_unknown_version_is_unmapped() {
        let rules = Config::default_config().unwrap().version_mapping().unwrap();
        let err = map_to_specification(&rules, "unknown").unwrap_err();
        assert_eq!(
            err,
            MappingError::UnmappedVersion {
                version: "unknown".to_string()
            }
        );
        assert!(err.to_string().contains("\"unknown\""));
    }

    #[test]
    fn test_first_match_wins() {
        let rules = VersionMapping::new(vec![
            VersionMapRule {
                kubernetes: "1.15".to_string(),
                benchmark: "cis-1.4".to_string(),
            },
            VersionMapRule {
                kubernetes: "1.15".to_string(),
                benchmark: "cis-1.5".to_string(),
            },
        ]);
        assert_eq!(rules.map_to_specification("1.15").unwrap(), "cis-1.4");
    }

    #[test]
    fn test_exact_match_only() {
        let rules = VersionMapping::new(vec![VersionMapRule {
            kubernetes: "1.1".to_string(),
            benchmark: "cis-1.0".to_string(),
        }]);
        assert!(rules.map_to_specification("1.11").is_err());
        assert!(rules.map_to_specification("1.1+").is_err());
    }

    #[test]
    fn test_load_empty_config() {
        let err = load_version_mapping(&toml::Table::new()).unwrap_err();
        assert_eq!(err, MappingError::Empty);
    }

    #[test]
    fn test_load_non_list_value() {
        let err = load_version_mapping(&table(r#"version_mapping = "novals""#)).unwrap_err();
        assert!(matches!(err, MappingError::Malformed { .. }));
    }

    #[test]
    fn test_load_list_of_wrong_shape() {
        let err = load_version_mapping(&table(r#"version_mapping = ["1.11", "cis-1.3"]"#))
            .unwrap_err();
        assert!(matches!(err, MappingError::Malformed { .. }));

        let err = load_version_mapping(&table(
            r#"
[[version_mapping]]
kubernetes = "1.11"
"#,
        ))
        .unwrap_err();
        assert!(matches!(err, MappingError::Malformed { .. }));
    }

    #[test]
    fn test_load_empty_list() {
        let err = load_version_mapping(&table("version_mapping = []")).unwrap_err();
        assert_eq!(err, MappingError::Empty);
    }

    #[test]
    fn test_load_good_mapping_preserves_order() {
        let rules = load_version_mapping(&table(
            r#"
[[version_mapping]]
kubernetes = "1.16"
benchmark = "cis-1.5"

[[version_mapping]]
kubernetes = "1.11"
benchmark = "cis-1.3"
"#,
        ))
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.rules()[0].kubernetes, "1.16");
        assert_eq!(rules.rules()[1].benchmark, "cis-1.3");
    }
}
