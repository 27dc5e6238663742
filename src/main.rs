use anyhow::{Context, Result};
use appointment_triage::app::{App, Cli};
use appointment_triage::config::TriageConfig;
use clap::Parser;
use tracing_subscriber::filter::LevelFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TriageConfig::load(path)?,
        None => TriageConfig::default_config()?,
    };

    let level: LevelFilter = config
        .log_level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
    tracing::debug!(
        "triage {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("TRIAGE_GIT_SHA")
    );

    let app = App::open(&config, cli.data_dir.as_deref())?;
    let output = app.run(cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&output.body)?);
    if !output.ok {
        std::process::exit(1);
    }
    Ok(())
}
