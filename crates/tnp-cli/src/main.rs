//! Tag-and-probe CLI

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use tnp_core::Analysis;

#[derive(Parser)]
#[command(name = "tnp")]
#[command(about = "Muon tag-and-probe efficiency analysis")]
#[command(version)]
struct Cli {
    /// Path to the analysis configuration file.
    config: PathBuf,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    tracing::info!(path = %cli.config.display(), "loading configuration");
    let analysis = Analysis::from_config_file(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;

    let summary = analysis.execute().with_context(|| {
        format!("analysis failed for input {}", analysis.sample().file_name.display())
    })?;

    eprintln!(
        "Processed {} events ({} selected), {} tag-probe pairs → {}",
        summary.events_read,
        summary.events_selected,
        summary.pairs,
        analysis.sample().output_file_name.display(),
    );

    Ok(())
}
