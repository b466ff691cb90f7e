use crate::error::{NewsCrawlError, UserFriendlyError};
use crate::output::{CrawlReport, IntervalOutcome};
use crate::schedule::Interval;
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

impl OutputMode {
    pub fn from_string(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputMode::Json,
            "plain" => OutputMode::Plain,
            _ => OutputMode::Human,
        }
    }
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &NewsCrawlError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!("{}{}", INFO, style(format!("Suggestion: {}", suggestion)).cyan());
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => eprintln!("SUGGESTION: {}", suggestion),
            }
        }
    }

    /// Dry-run listing: which intervals already have output and which would be fetched.
    pub fn print_plan(&self, completed: &[Interval], pending: &[Interval]) {
        match self.mode {
            OutputMode::Json => {
                let timestamps = |intervals: &[Interval]| -> Vec<String> {
                    intervals.iter().map(Interval::timestamp).collect()
                };
                self.print_json_object(&serde_json::json!({
                    "type": "plan",
                    "done": timestamps(completed),
                    "pending": timestamps(pending),
                }));
            }
            OutputMode::Plain => {
                for interval in completed {
                    println!("done {}", interval.timestamp());
                }
                for interval in pending {
                    println!("pending {}", interval.timestamp());
                }
            }
            OutputMode::Human => {
                self.print_header("Crawl plan");
                for interval in completed {
                    let status = if self.use_colors {
                        style("done").green().to_string()
                    } else {
                        "done".to_string()
                    };
                    println!("  {}  {}", interval.timestamp(), status);
                }
                for interval in pending {
                    let status = if self.use_colors {
                        style("pending").yellow().to_string()
                    } else {
                        "pending".to_string()
                    };
                    println!("  {}  {}", interval.timestamp(), status);
                }
                println!();
                println!(
                    "{} intervals: {} done, {} pending",
                    completed.len() + pending.len(),
                    completed.len(),
                    pending.len()
                );
            }
        }
    }

    pub fn print_crawl_report(&self, report: &CrawlReport) {
        match self.mode {
            OutputMode::Human => {
                if !self.quiet {
                    self.print_human_report(report);
                }
            }
            OutputMode::Json => {
                let json_output =
                    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json_output);
            }
            OutputMode::Plain => self.print_plain_report(report),
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => println!("=== {} ===", title),
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => println!("{}", "-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let (emoji, styled) = match msg_type {
                MessageType::Success => (CHECKMARK, style(message).green().bold()),
                MessageType::Error => (CROSS, style(message).red().bold()),
                MessageType::Warning => (WARNING, style(message).yellow().bold()),
                MessageType::Info => (INFO, style(message).cyan()),
            };

            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, styled),
                _ => println!("{}{}", emoji, styled),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn highlight(&self, value: impl ToString) -> String {
        if self.use_colors {
            style(value.to_string()).cyan().bold().to_string()
        } else {
            value.to_string()
        }
    }

    fn print_human_report(&self, report: &CrawlReport) {
        let summary = &report.summary;

        println!();
        self.print_separator();

        let headline = if report.cancelled {
            "Crawl stopped early"
        } else {
            "Crawl completed"
        };
        if self.use_colors {
            println!("{} {}", style(headline).green().bold(), CHECKMARK);
        } else {
            println!("✓ {}", headline);
        }

        println!();
        println!("  Started:           {}", report.started_at.format("%Y-%m-%d %H:%M UTC"));
        println!("  Intervals:         {}", self.highlight(summary.intervals_total));
        println!("    written:         {}", summary.intervals_written);
        println!("    already done:    {}", summary.intervals_skipped);
        println!("    batch missing:   {}", summary.intervals_missing);
        println!("    no rows:         {}", summary.intervals_empty);
        if summary.intervals_failed > 0 {
            println!("    failed:          {}", summary.intervals_failed);
        }
        println!("  Rows written:      {}", self.highlight(summary.rows_written));
        println!("  Retrieval errors:  {}", summary.retrieval_failures);
        println!("  Malformed lines:   {}", summary.malformed_lines);
        println!("  Time taken:        {}", self.highlight(format_duration(report.duration)));

        if self.verbose_level > 1 {
            println!();
            for interval in &report.intervals {
                println!("  {}  {}", interval.timestamp, describe(&interval.outcome));
            }
        }

        if !report.errors.is_empty() {
            println!();
            println!("Issues encountered:");
            for error in &report.errors {
                println!("  - {}", error);
            }
        }

        self.print_separator();
    }

    fn print_plain_report(&self, report: &CrawlReport) {
        let summary = &report.summary;

        println!(
            "REPORT: {}",
            if report.cancelled { "Crawl cancelled" } else { "Crawl completed" }
        );
        for interval in &report.intervals {
            println!("{} {}", interval.outcome.label(), interval.timestamp);
        }
        println!("Intervals: {}", summary.intervals_total);
        println!("Rows: {}", summary.rows_written);
        println!("Retrieval failures: {}", summary.retrieval_failures);
        println!("Malformed lines: {}", summary.malformed_lines);
        println!("Duration: {:?}", report.duration);

        if !report.errors.is_empty() {
            println!("Errors: {}", report.errors.len());
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn describe(outcome: &IntervalOutcome) -> String {
    match outcome {
        IntervalOutcome::AlreadyCompleted => "already completed".to_string(),
        IntervalOutcome::BatchMissing => "no batch published".to_string(),
        IntervalOutcome::Written { rows, failures } => {
            format!("{} rows ({} retrieval failures)", rows, failures)
        }
        IntervalOutcome::Empty { records, failures } => {
            format!("no rows from {} records ({} retrieval failures)", records, failures)
        }
        IntervalOutcome::Failed { message } => format!("failed: {}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!(OutputMode::from_string("human"), OutputMode::Human);
        assert_eq!(OutputMode::from_string("JSON"), OutputMode::Json);
        assert_eq!(OutputMode::from_string("plain"), OutputMode::Plain);
        assert_eq!(OutputMode::from_string("invalid"), OutputMode::Human);
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(formatter.quiet);
        assert!(!formatter.use_colors);
    }

    #[test]
    fn test_should_show_message() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 2, false);
        assert!(formatter.should_show_message(0));
        assert!(formatter.should_show_message(2));
        assert!(!formatter.should_show_message(3));

        let quiet_formatter = OutputFormatter::new(OutputMode::Plain, 2, true);
        assert!(!quiet_formatter.should_show_message(0));
    }

    #[test]
    fn test_outcome_descriptions() {
        assert_eq!(
            describe(&IntervalOutcome::Written { rows: 3, failures: 1 }),
            "3 rows (1 retrieval failures)"
        );
        assert_eq!(describe(&IntervalOutcome::BatchMissing), "no batch published");
        assert_eq!(
            describe(&IntervalOutcome::Failed {
                message: "timed out".to_string()
            }),
            "failed: timed out"
        );
    }
}
