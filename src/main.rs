use clap::Parser;
use newscrawl::{
    logging, Cli, CrawlReport, NewsCrawl, NewsCrawlError, OutputFormatter, OutputMode,
    UserFriendlyError,
};
use std::path::PathBuf;
use std::process;

const DEFAULT_CONFIG_FILE: &str = "newscrawl.toml";

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let newscrawl = match NewsCrawl::from_cli(&cli) {
        Ok(newscrawl) => newscrawl,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for_error(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&newscrawl);
    }

    if let Err(e) = logging::init(&newscrawl.config().logging) {
        newscrawl.handle_error(&e);
        return exit_code_for_error(&e);
    }

    newscrawl
        .output_formatter()
        .debug(&newscrawl::build_info().to_string());

    match newscrawl.crawl().await {
        Ok(report) => {
            newscrawl.output_formatter().print_crawl_report(&report);
            exit_code_for_report(&report)
        }
        Err(e) => {
            tracing::error!("crawl aborted: {}", e);
            newscrawl.handle_error(&e);
            exit_code_for_error(&e)
        }
    }
}

fn exit_code_for_report(report: &CrawlReport) -> i32 {
    if report.cancelled {
        130
    } else if report.has_failures() {
        2 // Finished, but some intervals could not be fetched
    } else {
        0
    }
}

fn exit_code_for_error(error: &NewsCrawlError) -> i32 {
    match error {
        NewsCrawlError::Cancelled => 130, // Interrupted (SIGINT)
        e if e.is_configuration() => 3,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    match NewsCrawl::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  newscrawl --config {}", config_path.display());
            println!("\nEdit the schedule and filters to choose what to crawl.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(newscrawl: &NewsCrawl) -> i32 {
    let formatter = newscrawl.output_formatter();
    let config = newscrawl.config();

    formatter.info("DRY RUN MODE - nothing will be downloaded");
    formatter.info(&format!("Output directory: {}", config.output.out_dir.display()));
    formatter.info(&format!("Batch source: {}", config.feed.url_template));
    formatter.info(&format!(
        "Sources: {}",
        if config.filters.sources.is_empty() {
            "all".to_string()
        } else {
            config.filters.sources.join(", ")
        }
    ));
    formatter.info(&format!("Languages: {}", config.filters.languages.join(", ")));

    match newscrawl.plan() {
        Ok((done, pending)) => {
            formatter.print_plan(&done, &pending);
            0
        }
        Err(e) => {
            newscrawl.handle_error(&e);
            exit_code_for_error(&e)
        }
    }
}

fn print_startup_error(cli: &Cli, error: &NewsCrawlError) {
    let mode = match cli.output_mode() {
        OutputMode::Json => OutputMode::Json,
        _ => OutputMode::Plain,
    };
    let formatter = OutputFormatter::new(mode, 0, false);
    formatter.print_user_friendly_error(error);
}
