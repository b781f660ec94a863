//! Command line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Lineage: contact-center storage replication and trace-record redaction.
#[derive(Parser)]
#[command(name = "lineage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Bucket replication commands.
    Replication(ReplicationCommand),
    /// Redact trace-record batches named by an S3 event.
    Redact(RedactArgs),
    /// Redact a local newline-delimited trace-record file.
    RedactBatch(RedactBatchArgs),
    /// Append newline delimiters to a Firehose transformation event.
    FirehoseTransform(FirehoseTransformArgs),
    /// Print version information.
    Version,
}

/// Bucket replication commands.
#[derive(Args)]
pub struct ReplicationCommand {
    /// Replication subcommand.
    #[command(subcommand)]
    pub command: ReplicationSubcommand,
}

/// Replication subcommands.
#[derive(Subcommand)]
pub enum ReplicationSubcommand {
    /// Compile a replication plan into the desired bucket state.
    Plan(PlanArgs),
}

/// Arguments for the replication plan command.
#[derive(Args)]
pub struct PlanArgs {
    /// TOML plan declaring buckets and rules.
    #[arg(short, long)]
    pub plan: PathBuf,

    /// JSON object of current replication configurations keyed by bucket name.
    #[arg(short, long)]
    pub existing: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "json")]
    pub format: PlanFormat,
}

/// Output format for replication plans.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PlanFormat {
    /// Full desired state as JSON.
    #[default]
    Json,
    /// S3 REST XML replication configuration per bucket.
    Xml,
}

/// Arguments for the redact command.
#[derive(Args)]
pub struct RedactArgs {
    /// S3 event notification JSON file.
    #[arg(short, long)]
    pub event: PathBuf,

    /// Deployment prefix (overrides config and PREFIX).
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Arguments for the redact-batch command.
#[derive(Args)]
pub struct RedactBatchArgs {
    /// Newline-delimited trace-record file.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Deployment prefix (overrides config and PREFIX).
    #[arg(long)]
    pub prefix: Option<String>,
}

/// Arguments for the firehose-transform command.
#[derive(Args)]
pub struct FirehoseTransformArgs {
    /// Firehose transformation event JSON file.
    #[arg(short, long)]
    pub event: PathBuf,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_plan() {
        let cli = Cli::parse_from([
            "lineage", "replication", "plan", "--plan", "plan.toml", "--format", "xml",
        ]);
        let Commands::Replication(ReplicationCommand { command: ReplicationSubcommand::Plan(args) }) =
            cli.command
        else {
            panic!("expected replication plan");
        };
        assert_eq!(args.plan, PathBuf::from("plan.toml"));
        assert!(args.existing.is_none());
        assert_eq!(args.format, PlanFormat::Xml);
    }

    #[test]
    fn test_parse_redact_batch_with_global_config() {
        let cli = Cli::parse_from([
            "lineage", "redact-batch", "--input", "ctr.json", "--prefix", "acme-dev", "-c", "l.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("l.toml")));
        let Commands::RedactBatch(args) = cli.command else {
            panic!("expected redact-batch");
        };
        assert_eq!(args.prefix.as_deref(), Some("acme-dev"));
        assert!(args.output.is_none());
    }
}
