// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (c) 2025 The Lineage Authors

//! Lineage: contact-center storage replication and trace-record redaction.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use lineage_core::config::{Config, LogFormat};
use lineage_redactor::{
    newline_delimit, redact_batch, FirehoseEvent, LocationRewrite, S3Event, S3ObjectStore,
    TraceRecordRedactor,
};
use lineage_replication::{compile, parse_existing, PlanFile};
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::{Cli, Commands, PlanArgs, PlanFormat, ReplicationSubcommand};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("lineage {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = load_config(&cli.config)?;
    init_logging(&config)?;

    match cli.command {
        Commands::Replication(cmd) => match cmd.command {
            ReplicationSubcommand::Plan(args) => run_plan(args).await,
        },
        Commands::Redact(args) => run_redact(config, args).await,
        Commands::RedactBatch(args) => run_redact_batch(config, args).await,
        Commands::FirehoseTransform(args) => run_firehose_transform(args).await,
        Commands::Version => Ok(()),
    }
}

async fn run_plan(args: PlanArgs) -> Result<()> {
    let plan = PlanFile::from_file(&args.plan)
        .with_context(|| format!("Failed to load plan {}", args.plan.display()))?;
    let existing = match &args.existing {
        Some(path) => parse_existing(&read_to_string(path).await?)
            .with_context(|| format!("Failed to parse existing configurations {}", path.display()))?,
        None => BTreeMap::new(),
    };

    let plan = compile(plan, &existing).context("Invalid replication plan")?;

    let mut stdout = std::io::stdout().lock();
    match args.format {
        PlanFormat::Json => writeln!(stdout, "{}", plan.to_json()?)?,
        PlanFormat::Xml => {
            for (bucket, xml) in plan.to_xml_documents()? {
                writeln!(stdout, "<!-- {bucket} -->\n{xml}")?;
            }
        }
    }
    Ok(())
}

async fn run_redact(mut config: Config, args: cli::RedactArgs) -> Result<()> {
    if let Some(prefix) = args.prefix {
        config.redactor.prefix = prefix;
    }
    config.validate().context("Invalid redactor configuration")?;

    let event = S3Event::from_json(&read_to_string(&args.event).await?)
        .with_context(|| format!("Failed to parse event {}", args.event.display()))?;

    let store = S3ObjectStore::from_config(&config.aws).await;
    let redactor = TraceRecordRedactor::new(store, &config.redactor);
    info!(
        source = redactor.rewrite().source(),
        redacted = redactor.rewrite().redacted(),
        "Starting redaction"
    );

    let report = redactor.handle_event(&event).await;
    for object in &report.processed {
        println!("s3://{}/{} -> s3://{}/{}", object.bucket, object.key, object.bucket, object.output_key);
    }
    if !report.is_success() {
        bail!("{} of {} objects failed", report.failed.len(), event.records.len());
    }
    Ok(())
}

async fn run_redact_batch(mut config: Config, args: cli::RedactBatchArgs) -> Result<()> {
    if let Some(prefix) = args.prefix {
        config.redactor.prefix = prefix;
    }
    config.validate().context("Invalid redactor configuration")?;

    let contents = read_to_string(&args.input).await?;
    let batch = redact_batch(&contents, &LocationRewrite::from_config(&config.redactor));
    if batch.stats.skipped > 0 {
        warn!(skipped = batch.stats.skipped, "Some trace records were skipped");
    }

    match &args.output {
        Some(path) => tokio::fs::write(path, batch.body.as_bytes())
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => std::io::stdout().lock().write_all(batch.body.as_bytes())?,
    }
    info!(
        lines = batch.stats.lines,
        rewritten = batch.stats.rewritten,
        skipped = batch.stats.skipped,
        "Redacted batch"
    );
    Ok(())
}

async fn run_firehose_transform(args: cli::FirehoseTransformArgs) -> Result<()> {
    let event: FirehoseEvent = serde_json::from_str(&read_to_string(&args.event).await?)
        .with_context(|| format!("Failed to parse Firehose event {}", args.event.display()))?;
    let response = newline_delimit(event);
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn read_to_string(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.with_context(|| format!("Failed to read {}", path.display()))
}

fn load_config(path: &Option<PathBuf>) -> Result<Config> {
    Config::load(path.as_deref()).context("Failed to load configuration")
}

fn init_logging(config: &Config) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    // Command output goes to stdout.
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt_layer.json()).init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }

    info!(service = %config.logging.service_name, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[logging]\nformat = \"json\"\n\n[redactor]\noriginal_segment = \"raw\"\n"
        )
        .unwrap();

        let config = load_config(&Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.redactor.original_segment, "raw");
    }

    #[test]
    fn test_load_missing_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&Some(dir.path().join("missing.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
