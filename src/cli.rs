//! CLI argument parsing for kubecis

use crate::filter::FilterOpts;
use crate::plan::PlanRequest;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the run plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "kubecis")]
#[command(version)]
#[command(about = "Select CIS Kubernetes benchmark checks for this node", long_about = None)]
pub struct Cli {
    /// Configuration file with version mapping and roles (default: cfg/config.toml, else built-in)
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Kubernetes version to use instead of querying the cluster API (e.g., 1.13)
    #[arg(long = "kube-version", value_name = "VERSION")]
    pub kube_version: Option<String>,

    /// Benchmark to run instead of mapping from the Kubernetes version (e.g., cis-1.4)
    #[arg(long = "benchmark", value_name = "ID")]
    pub benchmark: Option<String>,

    /// Run only the listed groups (comma-separated, e.g., 1.1,1.2)
    #[arg(short = 'g', long = "group", value_name = "IDS", default_value = "")]
    pub group: String,

    /// Run only the listed checks (comma-separated, e.g., 1.1.1,1.2.3)
    #[arg(short = 'c', long = "check", value_name = "IDS", default_value = "")]
    pub check: String,

    /// Run the scored checks
    #[arg(long = "scored", action = ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    pub scored: bool,

    /// Run the unscored checks
    #[arg(long = "unscored", action = ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    pub unscored: bool,

    /// Controls file with the groups and checks of the benchmark
    #[arg(long = "controls", value_name = "FILE")]
    pub controls: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable trace-level diagnostics on stderr (prints the service account token)
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    pub fn filter_opts(&self) -> FilterOpts {
        FilterOpts {
            scored: self.scored,
            unscored: self.unscored,
            group_list: FilterOpts::parse_list(&self.group),
            check_list: FilterOpts::parse_list(&self.check),
        }
    }

    pub fn plan_request(&self) -> PlanRequest {
        PlanRequest {
            kube_version: self.kube_version.clone(),
            benchmark: self.benchmark.clone(),
            filter: self.filter_opts(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["kubecis"]);
        assert!(cli.scored);
        assert!(cli.unscored);
        assert!(cli.config.is_none());
        assert!(cli.kube_version.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
        assert!(!cli.debug);

        let opts = cli.filter_opts();
        assert!(opts.group_list.is_empty());
        assert!(opts.check_list.is_empty());
    }

    #[test]
    fn test_cli_group_list() {
        let cli = Cli::parse_from(["kubecis", "--group", "1.1,1.2"]);
        let opts = cli.filter_opts();
        assert_eq!(opts.group_list.len(), 2);
        assert!(opts.group_list.contains("1.2"));
    }

    #[test]
    fn test_cli_short_check_flag() {
        let cli = Cli::parse_from(["kubecis", "-c", "1.1.1"]);
        assert!(cli.filter_opts().check_list.contains("1.1.1"));
    }

    #[test]
    fn test_cli_unscored_false() {
        let cli = Cli::parse_from(["kubecis", "--unscored", "false"]);
        assert!(cli.scored);
        assert!(!cli.unscored);
    }

    #[test]
    fn test_cli_plan_request() {
        let cli = Cli::parse_from([
            "kubecis",
            "--kube-version",
            "1.15",
            "--benchmark",
            "cis-1.4",
            "--format",
            "json",
        ]);
        let request = cli.plan_request();
        assert_eq!(request.kube_version.as_deref(), Some("1.15"));
        assert_eq!(request.benchmark.as_deref(), Some("cis-1.4"));
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
