use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "newscrawl")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Harvest full-text news articles referenced by GDELT translated GKG batches")]
#[command(
    long_about = "NewsCrawl walks a schedule of 15-minute GDELT intervals, downloads each \
                  translated GKG batch, keeps the records matching the configured sources and \
                  languages, fetches every referenced article and writes one CSV per interval. \
                  Intervals that already have an output file are skipped, so a crawl can be \
                  re-run to resume."
)]
#[command(after_help = "EXAMPLES:\n  \
    newscrawl --config newscrawl.toml\n  \
    newscrawl --languages fra,spa --sources lemonde.fr,elpais.com --out-dir data\n  \
    newscrawl --dry-run\n  \
    newscrawl --generate-config --config my-crawl.toml")]
pub struct Cli {
    /// Configuration file (TOML, or the flat config.json layout)
    #[arg(short, long, env = "NEWSCRAWL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory receiving one CSV per interval
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// Scratch directory for downloaded batches
    #[arg(long)]
    pub tmp_dir: Option<PathBuf>,

    /// Allowed source domains (comma-separated, empty allows all)
    #[arg(short, long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Allowed original languages (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// File listing the batch column names, one per line
    #[arg(long)]
    pub headers: Option<PathBuf>,

    /// Log file (appended to)
    #[arg(long, env = "NEWSCRAWL_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// List the planned intervals and whether each is done, without fetching anything
    #[arg(long)]
    pub dry_run: bool,

    /// Write a sample configuration file (to --config, or newscrawl.toml)
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<&OutputFormat> for OutputMode {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_out_dir(self.out_dir.clone())
            .with_tmp_dir(self.tmp_dir.clone())
            .with_sources(self.sources.clone())
            .with_languages(self.languages.clone())
            .with_headers_file(self.headers.clone())
            .with_log_file(self.log_file.clone())
    }

    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from(&self.output_format)
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("newscrawl").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_comma_separated_lists() {
        let cli = parse(&["--sources", "a.com,b.com", "--languages", "fra,spa"]);

        assert_eq!(cli.sources, Some(vec!["a.com".to_string(), "b.com".to_string()]));
        assert_eq!(cli.languages, Some(vec!["fra".to_string(), "spa".to_string()]));
    }

    #[test]
    fn test_overrides_reach_config() {
        let cli = parse(&[
            "--out-dir",
            "articles",
            "--tmp-dir",
            "scratch",
            "--sources",
            "a.com",
            "--log-file",
            "crawl.log",
        ]);

        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides());

        assert_eq!(config.output.out_dir, PathBuf::from("articles"));
        assert_eq!(config.output.tmp_dir, PathBuf::from("scratch"));
        assert_eq!(config.filters.sources, vec!["a.com"]);
        assert_eq!(config.filters.languages, vec!["eng"]);
        assert_eq!(config.logging.file, PathBuf::from("crawl.log"));
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["newscrawl", "-v", "--quiet"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_output_mode_mapping() {
        let cli = parse(&["--output-format", "json", "-vv"]);
        assert_eq!(cli.output_mode(), OutputMode::Json);
        assert_eq!(cli.verbosity_level(), 2);
    }
}
