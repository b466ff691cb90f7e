pub mod article;
pub mod cli;
pub mod config;
pub mod crawler;
pub mod error;
pub mod feed;
pub mod logging;
pub mod output;
pub mod schedule;
pub mod ui;

#[cfg(test)]
mod testing;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, FeedConfig, FilterConfig, OutputConfig, ScheduleConfig};
pub use error::{NewsCrawlError, Result, UserFriendlyError};

// Core functionality re-exports
pub use article::{Document, DocumentExtractor, DocumentRetriever, HtmlDocumentExtractor, OutputRecord};
pub use crawler::{CrawlProgress, IntervalOrchestrator};
pub use feed::{BatchSource, FeedRecord, HeaderSchema, RecordExtractor, RecordFilter};
pub use output::{BatchWriter, CrawlReport, IntervalOutcome};
pub use schedule::{Interval, IntervalPlanner};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use tokio::task;

/// Main library interface for NewsCrawl
pub struct NewsCrawl {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl NewsCrawl {
    /// Create a new instance and install the Ctrl+C handler
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Create an instance without registering a signal handler
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    /// Create an instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            cli_args.output_mode(),
            cli_args.verbose,
            cli_args.quiet,
        )
    }

    /// Crawl every planned interval and return the per-interval outcomes.
    ///
    /// The pipeline runs on a blocking worker; a Ctrl+C is honoured between
    /// intervals and surfaces as `report.cancelled`.
    pub async fn crawl(&self) -> Result<CrawlReport> {
        self.shutdown.check_shutdown()?;
        self.config.prepare_directories()?;

        let planner = IntervalPlanner::new(&self.config.schedule)?;
        let schema = HeaderSchema::load(self.config.feed.headers_file.as_deref())?;
        let total_intervals = planner.len();

        self.output_formatter.start_operation(&format!(
            "Crawling {} intervals into {}",
            total_intervals,
            self.config.output.out_dir.display()
        ));

        let interval_bar = self.progress_manager.create_interval_progress(total_intervals as u64);
        let record_bar = self.progress_manager.create_record_progress();

        let config = self.config.clone();
        let shutdown = self.shutdown.clone();
        let (intervals_pb, records_pb) = (interval_bar.clone(), record_bar.clone());

        let report = task::spawn_blocking(move || -> Result<CrawlReport> {
            let orchestrator = IntervalOrchestrator::from_config(&config, schema)?;
            let progress_callback = |progress: &CrawlProgress| {
                ui::progress::update_crawl_progress(&intervals_pb, &records_pb, progress);
            };

            Ok(orchestrator.run(
                planner.intervals(),
                total_intervals,
                Some(&shutdown),
                Some(&progress_callback),
            ))
        })
        .await
        .map_err(|e| NewsCrawlError::Config {
            message: format!("Crawl task failed: {}", e),
        })??;

        record_bar.finish_and_clear();
        ui::progress::finish_progress_with_summary(
            &interval_bar,
            &format!("Wrote {} rows", report.summary.rows_written),
            report.duration,
        );
        self.progress_manager.clear();

        if report.cancelled {
            self.output_formatter
                .warning("Crawl interrupted; completed intervals are kept and will be skipped next time");
        }

        Ok(report)
    }

    /// Intervals that already have output, and intervals a crawl would fetch
    pub fn plan(&self) -> Result<(Vec<Interval>, Vec<Interval>)> {
        let planner = IntervalPlanner::new(&self.config.schedule)?;
        Ok(planner.partition_completed(&self.config.output.out_dir))
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &NewsCrawlError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NewsCrawl {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
