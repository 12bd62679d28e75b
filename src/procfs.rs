//! Running-binaries provider backed by /proc
//!
//! Collects the executable name (basename of argv[0]) of every visible
//! process and reports, per required component, the first configured
//! candidate that is running.

use crate::roles::{RoleSpec, RunningBinaries};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Default procfs mount point
pub const PROC_ROOT: &str = "/proc";

/// Executable names of all processes visible under `proc_root`
///
/// Processes that exit mid-scan or hide their cmdline are skipped.
pub fn running_executables<P: AsRef<Path>>(proc_root: P) -> Result<HashSet<String>> {
    let proc_root = proc_root.as_ref();
    let entries = fs::read_dir(proc_root)
        .with_context(|| format!("Failed to list process table: {}", proc_root.display()))?;

    let mut executables = HashSet::new();
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_str() else { continue };
        if pid.is_empty() || !pid.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }

        let cmdline = match fs::read(entry.path().join("cmdline")) {
            Ok(cmdline) => cmdline,
            Err(e) => {
                tracing::trace!(pid, error = %e, "skipping process");
                continue;
            }
        };

        if let Some(exe) = executable_name(&cmdline) {
            executables.insert(exe);
        }
    }

    Ok(executables)
}

/// Basename of argv[0] from a NUL-separated cmdline
fn executable_name(cmdline: &[u8]) -> Option<String> {
    let argv0 = cmdline.split(|b| *b == 0).next()?;
    if argv0.is_empty() {
        return None;
    }
    let argv0 = String::from_utf8_lossy(argv0);
    let base = argv0.rsplit('/').next().unwrap_or(&argv0);
    Some(base.to_string())
}

/// Match a role's components against a set of running executables
pub fn find_components(spec: &RoleSpec, running: &HashSet<String>) -> RunningBinaries {
    let mut found = RunningBinaries::new();
    for component in &spec.components {
        if let Some(binary) = spec
            .candidates(component)
            .into_iter()
            .find(|candidate| running.contains(candidate))
        {
            found.insert(component.clone(), binary);
        } else {
            tracing::debug!(role = %spec.name, component, "component not running");
        }
    }
    found
}

/// Provider for [`crate::roles::has_role`] that inspects `/proc`
pub fn running_binaries(spec: &RoleSpec) -> Result<RunningBinaries> {
    let running = running_executables(PROC_ROOT)?;
    Ok(find_components(spec, &running))
}
