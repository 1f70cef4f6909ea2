mod config;
mod report;

use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::config::{CliConfig, LogFormat, LoggingConfig, ReportConfig};
use crate::report::{Mode, OutputFormat, ReportOptions, SortKey};

#[derive(Debug, Parser)]
#[command(
    name = "tflog",
    version,
    about = "Normalize Terraform JSON logs and group them into plan/apply sections"
)]
struct Cli {
    /// JSON-lines log file, or "-" for stdin
    path: PathBuf,

    /// Extra TOML config file (layered over ./tflog.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Standalone engine TOML; replaces the `engine` table
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// What to print
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Record ordering (logs and sections-full modes)
    #[arg(short, long, value_enum)]
    sort: Option<SortKey>,

    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Maximum rows to print, 0 for all
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Only records with this level (case-insensitive)
    #[arg(long)]
    filter_level: Option<String>,

    /// Case-insensitive regex over the message
    #[arg(short, long)]
    grep: Option<String>,

    /// Only records at or after this time
    #[arg(long)]
    since: Option<String>,

    /// Only records at or before this time
    #[arg(long)]
    until: Option<String>,

    /// Print run counters as JSON to stderr
    #[arg(long)]
    stats: bool,
}

impl Cli {
    /// Config-file report defaults with flags applied on top.
    fn report_options(&self, defaults: &ReportConfig) -> ReportOptions {
        ReportOptions {
            mode: self.mode.unwrap_or(defaults.mode),
            sort: self.sort.unwrap_or(defaults.sort),
            output: self.output.unwrap_or(defaults.output),
            limit: self.limit.unwrap_or(defaults.limit),
            filter_level: self.filter_level.clone().or_else(|| defaults.filter_level.clone()),
            grep: self.grep.clone().or_else(|| defaults.grep.clone()),
            since: self.since.clone().or_else(|| defaults.since.clone()),
            until: self.until.clone().or_else(|| defaults.until.clone()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Basic tracing so config loading can log; replaced once config is known
    let basic_tracing = init_tracing_basic();

    let mut config = CliConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(path) = cli.engine_config.as_deref() {
        config.engine = tflog::EngineConfig::load(Some(path))
            .context("Failed to load engine configuration")?;
    }
    config.validate()
        .context("Configuration validation failed")?;

    drop(basic_tracing);
    init_tracing_from_config(&config.logging);

    let options = cli.report_options(&config.report);
    info!(path = %cli.path.display(), mode = ?options.mode, "Reading log");

    let segmentation = read_segmentation(&cli.path, &config.engine)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match report::write_report(&segmentation, &options, &mut out) {
        Err(e) if is_broken_pipe(&e) => return Ok(()),
        other => other?,
    }

    if cli.stats {
        let stats = serde_json::to_string_pretty(&segmentation.stats)
            .context("Failed to serialize run stats")?;
        eprintln!("{}", stats);
    }

    Ok(())
}

fn read_segmentation(path: &Path, engine: &tflog::EngineConfig) -> Result<tflog::Segmentation> {
    if path == Path::new("-") {
        let stdin = io::stdin();
        return tflog::segment_reader(stdin.lock(), engine).context("Failed to read stdin");
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    tflog::segment_reader(BufReader::new(file), engine)
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::BrokenPipe)
}

fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

/// Install the global subscriber. Logs go to stderr; stdout carries the
/// report.
fn init_tracing_from_config(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Prefer RUST_LOG env var, fall back to config level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_target(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tflog",
            "run.log",
            "--sort",
            "level_timestamp",
            "--limit",
            "5",
            "--grep",
            "vpc",
        ])
        .unwrap();
        let defaults = ReportConfig {
            mode: Mode::Sections,
            sort: SortKey::Timestamp,
            limit: 100,
            grep: Some("ignored".to_string()),
            since: Some("2024-01-01".to_string()),
            ..Default::default()
        };

        let options = cli.report_options(&defaults);
        assert_eq!(options.mode, Mode::Sections);
        assert_eq!(options.sort, SortKey::LevelTimestamp);
        assert_eq!(options.limit, 5);
        assert_eq!(options.grep.as_deref(), Some("vpc"));
        assert_eq!(options.since.as_deref(), Some("2024-01-01"));
        assert_eq!(options.output, OutputFormat::Pretty);
    }

    #[test]
    fn test_mode_values() {
        let cli = Cli::try_parse_from(["tflog", "-", "--mode", "sections-full", "-o", "jsonl"]).unwrap();
        assert_eq!(cli.mode, Some(Mode::SectionsFull));
        assert_eq!(cli.output, Some(OutputFormat::Jsonl));
        assert!(Cli::try_parse_from(["tflog", "-", "--mode", "gantt"]).is_err());
    }

    #[test]
    fn test_engine_config_flag() {
        let cli = Cli::try_parse_from(["tflog", "-", "--engine-config", "engine.toml"]).unwrap();
        assert_eq!(cli.engine_config.as_deref(), Some(Path::new("engine.toml")));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_broken_pipe_detection() {
        let err = anyhow::Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(is_broken_pipe(&err));
        assert!(!is_broken_pipe(&anyhow::anyhow!("other")));
    }
}
