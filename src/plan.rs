//! Run planning: version → benchmark → roles → check selection
//!
//! Any failure while resolving the version, mapping it, or compiling the
//! filter aborts planning. Role detection never fails.

use crate::config::Config;
use crate::controls::{Controls, SelectedCheck};
use crate::filter::{FilterOpts, RunFilter};
use crate::roles::{self, RoleSpec, RunningBinaries};
use crate::version::VersionError;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Where the kubernetes version came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    /// Supplied with --kube-version
    Flag,
    /// Resolved through the cluster API
    Api,
    /// Not needed because --benchmark was given
    Skipped,
}

/// User choices that drive planning
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub kube_version: Option<String>,
    pub benchmark: Option<String>,
    pub filter: FilterOpts,
}

/// Outcome of planning a benchmark run
#[derive(Debug, Clone, Serialize)]
pub struct RunPlan {
    pub kubernetes_version: Option<String>,
    pub version_source: VersionSource,
    pub benchmark: String,
    pub roles: BTreeMap<String, bool>,
    pub total_checks: usize,
    pub selected: Vec<SelectedCheck>,
}

/// Build a run plan
///
/// `resolve_version` is only called when neither a version nor a benchmark
/// was requested. `provider` is called once per configured role.
pub fn build<V, P>(
    request: &PlanRequest,
    config: &Config,
    controls: Option<&Controls>,
    resolve_version: V,
    provider: P,
) -> Result<RunPlan>
where
    V: FnOnce() -> Result<String, VersionError>,
    P: Fn(&RoleSpec) -> Result<RunningBinaries>,
{
    let mapping = config
        .version_mapping()
        .context("Failed to load version mapping")?;
    let role_table = config.roles().context("Failed to load roles")?;

    let (kubernetes_version, version_source, benchmark) =
        match (&request.kube_version, &request.benchmark) {
            (Some(version), Some(benchmark)) => {
                (Some(version.clone()), VersionSource::Flag, benchmark.clone())
            }
            (Some(version), None) => {
                let benchmark = mapping.map_to_specification(version)?;
                (Some(version.clone()), VersionSource::Flag, benchmark)
            }
            (None, Some(benchmark)) => (None, VersionSource::Skipped, benchmark.clone()),
            (None, None) => {
                let version = resolve_version().context("Failed to resolve kubernetes version")?;
                let benchmark = mapping.map_to_specification(&version)?;
                (Some(version), VersionSource::Api, benchmark)
            }
        };
    tracing::info!(benchmark = %benchmark, "selected benchmark");

    let roles = role_table
        .names()
        .map(|name| (name.to_string(), roles::has_role(name, &role_table, &provider)))
        .collect();

    let filter = RunFilter::compile(&request.filter)?;
    let (total_checks, selected) = match controls {
        Some(controls) => (controls.check_count(), controls.select(&filter)),
        None => (0, Vec::new()),
    };

    Ok(RunPlan {
        kubernetes_version,
        version_source,
        benchmark,
        roles,
        total_checks,
        selected,
    })
}

impl RunPlan {
    /// Human-readable summary
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let version = self.kubernetes_version.as_deref().unwrap_or("-");
        let source = match self.version_source {
            VersionSource::Flag => "flag",
            VersionSource::Api => "api",
            VersionSource::Skipped => "skipped",
        };
        let _ = writeln!(out, "Kubernetes version: {version} ({source})");
        let _ = writeln!(out, "Benchmark: {}", self.benchmark);

        for (role, held) in &self.roles {
            let _ = writeln!(out, "Role {role}: {}", if *held { "yes" } else { "no" });
        }

        let _ = writeln!(
            out,
            "Selected {} of {} checks",
            self.selected.len(),
            self.total_checks
        );
        for check in &self.selected {
            let scoring = if check.scored { "Scored" } else { "Not Scored" };
            let _ = writeln!(out, "  [{}] {} {} ({scoring})", check.group, check.id, check.text);
        }
        out
    }
}
