use anyhow::{Context, Result};
use clap::Parser;
use kubecis::cli::{Cli, OutputFormat};
use kubecis::config::{Config, DEFAULT_CONFIG_PATH};
use kubecis::controls::Controls;
use kubecis::{plan, procfs, version};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; --debug turns on trace output
fn init_tracing(debug: bool) {
    let mut filter = EnvFilter::from_default_env();
    if debug {
        filter = filter.add_directive(tracing::Level::TRACE.into());
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit --config, then cfg/config.toml, then the built-in configuration
fn load_config(path: Option<&Path>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(Config::from_file(path)?);
    }
    if Path::new(DEFAULT_CONFIG_PATH).exists() {
        return Ok(Config::from_file(DEFAULT_CONFIG_PATH)?);
    }
    tracing::debug!("using built-in configuration");
    Ok(Config::default_config()?)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    let config = load_config(args.config.as_deref())?;

    let controls = match &args.controls {
        Some(path) => Some(Controls::from_file(path)?),
        None => None,
    };

    let plan = plan::build(
        &args.plan_request(),
        &config,
        controls.as_ref(),
        version::resolve_cluster_version,
        procfs::running_binaries,
    )?;

    match args.format {
        OutputFormat::Text => print!("{}", plan.render_text()),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&plan).context("Failed to serialize run plan")?
        ),
    }

    Ok(())
}
