//! Regex-Crawler main entry point
//!
//! Command-line consumer for the search engine: starts one search, drains
//! the result stream while the worker is alive, and prints each event.

use anyhow::Context;
use clap::Parser;
use regex_crawler::config::{load_or_default, Config};
use regex_crawler::crawler::{build_target_list, CrawlRequest, HttpFetcher, SearchEngine};
use regex_crawler::results::SearchEvent;
use regex_crawler::session::Searcher;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Regex-Crawler: find regex matches across a page and its same-origin links
#[derive(Parser, Debug)]
#[command(name = "regex-crawler")]
#[command(version)]
#[command(about = "Search web pages for regular-expression matches", long_about = None)]
struct Cli {
    /// Seed URL, including the scheme (e.g. https://example.com)
    #[arg(value_name = "URL", required_unless_present = "list_patterns")]
    url: Option<String>,

    /// Regular expression to search for
    #[arg(short = 'e', long = "regex", value_name = "REGEX")]
    regex: Option<String>,

    /// Built-in pattern to apply (repeatable)
    #[arg(short, long = "pattern", value_name = "NAME")]
    patterns: Vec<String>,

    /// Also search every same-origin page linked from the seed page
    #[arg(short, long)]
    recursive: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Print the available built-in pattern names and exit
    #[arg(long)]
    list_patterns: bool,

    /// Print the pages a search would visit and exit (fetches the seed page with -r)
    #[arg(long, conflicts_with = "list_patterns")]
    list_targets: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit tracing filter, overriding -v/-q (e.g. "regex_crawler=trace")
    #[arg(long, value_name = "FILTER")]
    log_filter: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_filter.as_deref());

    let config = load_or_default(cli.config.as_deref()).context("failed to load configuration")?;
    let engine = SearchEngine::from_config(&config).context("failed to set up search engine")?;

    if cli.list_patterns {
        for (name, pattern) in engine.registry().iter() {
            println!("{}\t{}", name, pattern.source());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let request = CrawlRequest {
        base_url: cli.url.unwrap_or_default().trim().to_string(),
        explicit_pattern: cli.regex,
        recursive: cli.recursive,
        built_in_patterns: cli.patterns.into_iter().collect(),
    };

    if cli.list_targets {
        return handle_list_targets(&config, &request).await;
    }

    run_search(engine, request).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, explicit: Option<&str>) {
    let filter = EnvFilter::new(filter_directives(verbose, quiet, explicit));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Picks the tracing filter: an explicit filter wins, then -q, then -v count
fn filter_directives(verbose: u8, quiet: bool, explicit: Option<&str>) -> String {
    match explicit {
        Some(directives) => directives.to_string(),
        None if quiet => "error".to_string(),
        None => match verbose {
            0 => "regex_crawler=info,warn",
            1 => "regex_crawler=debug,info",
            2 => "regex_crawler=trace,debug",
            _ => "trace",
        }
        .to_string(),
    }
}

/// Handles --list-targets: prints the target list without searching it
async fn handle_list_targets(config: &Config, request: &CrawlRequest) -> anyhow::Result<ExitCode> {
    let fetcher = HttpFetcher::new(&config.fetch).context("failed to build HTTP client")?;

    match build_target_list(request, &fetcher).await {
        Ok(targets) => {
            for target in &targets {
                println!("{}", target);
            }
            tracing::info!("{} pages would be searched", targets.len());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Drives one search, polling the result stream until the worker exits
///
/// Ctrl-C requests cancellation; results already found are still printed.
async fn run_search(engine: SearchEngine, request: CrawlRequest) -> anyhow::Result<ExitCode> {
    let mut searcher = Searcher::new(engine);
    searcher.start(request).await;

    let mut rejected = false;
    let mut interrupted = false;

    loop {
        for event in searcher.drain() {
            rejected |= matches!(event, SearchEvent::InvalidRequest(_));
            print_event(&event);
        }

        if !searcher.is_active() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                signal.context("failed to listen for Ctrl-C")?;
                tracing::warn!("Interrupted while {}, stopping search", searcher.state());
                interrupted = true;
                searcher.stop();
            }
        }
    }

    // Tail of the stream after the worker exited
    for event in searcher.drain() {
        rejected |= matches!(event, SearchEvent::InvalidRequest(_));
        print_event(&event);
    }

    if let Some(finished) = searcher.wait().await {
        let outcome = finished.context("search did not finish cleanly")?;
        tracing::info!(
            "Search {}: {} pages searched, {} failed, {} matches",
            outcome.state,
            outcome.pages_searched,
            outcome.pages_failed,
            outcome.matches
        );
    }

    Ok(if rejected {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_event(event: &SearchEvent) {
    match event {
        SearchEvent::Match(record) => {
            println!(
                "{}\t{}\t{}",
                record.source_url, record.pattern, record.matched_text
            );
        }
        SearchEvent::FetchFailed(_) | SearchEvent::InvalidRequest(_) => {
            if let Some(message) = event.error_message() {
                eprintln!("error: {}", message);
            }
        }
    }
}
