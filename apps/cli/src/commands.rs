//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use remotejobs_core::{
    JobBoard, ProgressReporter, RefreshOptions, RefreshPhase, RefreshReport, SalaryOrder,
    SourceOutcome, recent_jobs, refresh,
};
use remotejobs_scrapers::{Fetcher, SourceRegistry};
use remotejobs_shared::{
    AppConfig, FailurePolicy, FetchConfig, Job, config_file_path, init_config_at, load_config,
    load_config_from,
};
use remotejobs_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// remotejobs: scrape remote job boards into one salary-sorted list.
#[derive(Parser)]
#[command(
    name = "remotejobs",
    version,
    about = "Aggregate remote job postings from several boards into a local catalog.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to use instead of ~/.remotejobs/remotejobs.toml.
    #[arg(long, global = true, env = "REMOTEJOBS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Scrape every enabled job board and store new postings.
    Refresh {
        /// Fetch and aggregate, but write nothing.
        #[arg(long)]
        dry_run: bool,

        /// Abort on the first failing source instead of skipping it.
        #[arg(long)]
        fail_fast: bool,

        /// Print the fetched jobs as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show recent postings that carry a salary.
    List {
        /// Salary order: all, highest, or lowest.
        #[arg(long, default_value = "all")]
        order: SalaryOrder,

        /// Only show titles containing this text (case-insensitive).
        #[arg(short, long, default_value = "")]
        keyword: String,

        /// Trailing window in hours (defaults to refresh.recent_window_hours).
        #[arg(long)]
        hours: Option<u32>,

        /// Print the jobs as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List configured job boards.
    Sources,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "remotejobs=info",
        1 => "remotejobs=debug",
        _ => "remotejobs=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Refresh {
            dry_run,
            fail_fast,
            json,
        } => cmd_refresh(config_path, dry_run, fail_fast, json).await,
        Command::List {
            order,
            keyword,
            hours,
            json,
        } => cmd_list(config_path, order, &keyword, hours, json).await,
        Command::Sources => cmd_sources(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Resolve the config from `--config` or the default location.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_refresh(
    config_path: Option<&Path>,
    dry_run: bool,
    fail_fast: bool,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;

    let registry = SourceRegistry::from_config(&config.sources)?;
    if registry.is_empty() {
        return Err(eyre!("no job sources are enabled; check the [sources] config"));
    }
    let fetcher = Fetcher::new(FetchConfig::from(&config))?;

    let store = if dry_run {
        None
    } else {
        Some(Storage::open(&config.storage.resolved_db_path()?).await?)
    };

    let options = RefreshOptions {
        policy: if fail_fast {
            FailurePolicy::FailFast
        } else {
            config.refresh.failure_policy
        },
        dry_run,
    };

    info!(sources = ?registry.names(), policy = %options.policy, dry_run, "refreshing");

    let reporter = CliProgress::new();
    let result = refresh(&registry, &fetcher, store.as_ref(), options, &reporter).await;
    reporter.finish();
    let report = result?;

    if json {
        let body = serde_json::json!({ "jobs": report.jobs });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_refresh_summary(&report);
    }

    if report.all_failed() {
        return Err(eyre!("every job source failed; nothing was fetched"));
    }
    Ok(())
}

fn print_refresh_summary(report: &RefreshReport) {
    println!();
    if report.dry_run {
        println!("  Dry run: nothing was written.");
    } else {
        println!("  Refresh complete!");
    }
    println!("  Fetched:  {}", report.jobs.len());
    println!("  Inserted: {}", report.inserted);
    println!("  Skipped:  {}", report.skipped);
    for failure in &report.failed {
        println!("  Failed:   {} ({})", failure.source, failure.message);
    }
    println!("  Time:     {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

async fn cmd_list(
    config_path: Option<&Path>,
    order: SalaryOrder,
    keyword: &str,
    hours: Option<u32>,
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let store = Storage::open_readonly(&config.storage.resolved_db_path()?).await?;

    let hours = hours.unwrap_or(config.refresh.recent_window_hours);
    let window = chrono::Duration::hours(i64::from(hours));
    let jobs = recent_jobs(&store, window, chrono::Utc::now()).await?;

    let mut board = JobBoard::new(jobs);
    board.set_order(order);
    board.set_keyword(keyword);

    info!(%order, keyword, hours, shown = board.visible().len(), "listing jobs");

    if json {
        let body = serde_json::json!({ "jobs": board.visible() });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    if board.visible().is_empty() {
        println!("No salaried jobs in the last {hours}h.");
        return Ok(());
    }
    for job in board.visible() {
        print_job(job);
    }
    Ok(())
}

fn print_job(job: &Job) {
    println!(
        "  {:<22} {} @ {}",
        job.salary_text().unwrap_or("-"),
        job.title,
        job.company
    );
    println!("  {:<22} {}", job.date.format("%Y-%m-%d %H:%M"), job.url);
}

fn cmd_sources(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let entries = [
        ("weworkremotely", &config.sources.weworkremotely),
        ("remoteok", &config.sources.remoteok),
        ("remoteco", &config.sources.remoteco),
    ];
    for (name, entry) in entries {
        let state = if entry.enabled { "enabled" } else { "disabled" };
        println!("  {name:<16} {state:<9} {}", entry.listing_url);
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, phase: RefreshPhase) {
        self.spinner.set_message(phase.to_string());
    }

    fn source_finished(&self, outcome: &SourceOutcome) {
        let line = match &outcome.result {
            Ok(jobs) => format!("  ✓ {} ({} postings)", outcome.source, jobs.len()),
            Err(e) => format!("  ✗ {} ({e})", outcome.source),
        };
        self.spinner.println(line);
    }

    fn done(&self, _report: &RefreshReport) {
        self.spinner.finish_and_clear();
    }
}
