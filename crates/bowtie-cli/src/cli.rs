//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Bowtie CLI - Extract validated Bowtie risk records from incident narratives.
#[derive(Debug, Parser)]
#[command(name = "bowtie")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.bowtie/config.toml)
    #[arg(short, long, global = true, env = "BOWTIE_CONFIG")]
    pub config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract structured records from narrative text files
    Extract(ExtractArgs),

    /// Compute quality metrics over extracted records
    Quality(QualityArgs),

    /// Show manifest progress
    Status(StatusArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Default, Parser)]
pub struct ExtractArgs {
    /// Provider name (stub, openai, anthropic, gemini, ollama)
    #[arg(short, long, env = "BOWTIE_PROVIDER")]
    pub provider: Option<String>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// Process at most this many inputs
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Skip inputs already extracted successfully
    #[arg(short, long)]
    pub resume: bool,

    /// Directory of narrative text files
    #[arg(long)]
    pub text_dir: Option<PathBuf>,

    /// Output root; records go to <out-dir>/<provider>/
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Manifest CSV path
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Concurrent workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Provider calls per input, first call included
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

/// Arguments for the quality command.
#[derive(Debug, Default, Parser)]
pub struct QualityArgs {
    /// Directory of records (default: <out-dir>/<provider>)
    #[arg(short, long)]
    pub incident_dir: Option<PathBuf>,

    /// Provider whose records to read when --incident-dir is not given
    #[arg(short, long, env = "BOWTIE_PROVIDER")]
    pub provider: Option<String>,

    /// Fail (exit 2) below this valid ratio
    #[arg(long)]
    pub min_valid_ratio: Option<f64>,

    /// Fail (exit 2) below this overall coverage
    #[arg(long)]
    pub min_coverage: Option<f64>,
}

/// Arguments for the status command.
#[derive(Debug, Default, Parser)]
pub struct StatusArgs {
    /// Manifest CSV path
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_extract_command() {
        let cli = Cli::parse_from([
            "bowtie",
            "extract",
            "--provider",
            "stub",
            "--limit",
            "5",
            "--resume",
            "--workers",
            "4",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.provider.as_deref(), Some("stub"));
                assert_eq!(args.limit, Some(5));
                assert!(args.resume);
                assert_eq!(args.workers, Some(4));
                assert!(args.text_dir.is_none());
            }
            _ => panic!("Expected Extract command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["bowtie", "status", "--format", "json", "-vv", "--no-color"]);
        assert!(matches!(cli.command, Command::Status(_)));
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        assert_eq!(cli.verbose, 2);
        assert!(cli.no_color);
    }

    #[test]
    fn test_quality_thresholds() {
        let cli = Cli::parse_from(["bowtie", "quality", "--min-valid-ratio", "0.95", "-i", "out/stub"]);
        match cli.command {
            Command::Quality(args) => {
                assert_eq!(args.min_valid_ratio, Some(0.95));
                assert_eq!(args.incident_dir, Some(PathBuf::from("out/stub")));
            }
            _ => panic!("Expected Quality command"),
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["bowtie"]).is_err());
    }

    #[test]
    fn test_format_conversion() {
        let format: OutputFormat = CliFormat::Json.into();
        assert_eq!(format, OutputFormat::Json);
    }
}
