use std::process::ExitCode;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use vod_batch::app::App;
use vod_batch::config::{Config, ConfigLoader, DEFAULT_RETRIES, OrchestratorConfig, clamp_workers};
use vod_batch::domain::{Quality, TaskBuilder};
use vod_batch::downloader::YtDlpClient;
use vod_batch::error::BatchError;
use vod_batch::executor::CancelToken;
use vod_batch::input;
use vod_batch::notify::{self, NoopNotifier, Notification, Notifier, SystemNotifier};
use vod_batch::output::{self, JsonOutput, OutputMode};
use vod_batch::store::{self, AppPaths};

const NOTIFY_WAIT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "vod-batch")]
#[command(about = "Download a batch of videos with yt-dlp, several at a time")]
#[command(version, author)]
struct Cli {
    /// Video or stream URLs. Read from stdin when none are given.
    locators: Vec<String>,

    /// File with one URL per line.
    #[arg(long, short = 'i')]
    input: Option<Utf8PathBuf>,

    /// Download directory. Defaults to the remembered one.
    #[arg(long, short = 'd')]
    dir: Option<String>,

    /// Number of concurrent downloads.
    #[arg(long, short = 'w', allow_negative_numbers = true)]
    workers: Option<i64>,

    #[arg(long, short = 'q', value_enum, default_value_t = Quality::Source)]
    quality: Quality,

    /// Attempts per URL before it is skipped.
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// Save the download directory and worker count for next time.
    #[arg(long)]
    remember: bool,

    /// Print the batch report as JSON.
    #[arg(long)]
    json: bool,

    #[arg(long)]
    no_notify: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<BatchError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BatchError) -> u8 {
    match error {
        BatchError::MissingDestination => 2,
        BatchError::MissingTool(_) => 3,
        BatchError::Interrupted => 130,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let paths = AppPaths::new()?;
    let config_path = paths.config_path();
    let mut config = ConfigLoader::load_or_default(&config_path);

    let destination = resolve_destination(cli.dir.as_deref(), &config)?;
    store::ensure_dir(&destination)?;
    let workers = resolve_workers(cli.workers, &config);

    let mut raw = cli.locators;
    if let Some(path) = &cli.input {
        raw.extend(input::read_list_file(path)?);
    }
    if raw.is_empty() {
        raw = input::read_stdin()?;
    }

    let tasks = TaskBuilder::new(cli.quality, destination.clone()).build_all(raw);
    if tasks.is_empty() {
        tracing::warn!("no valid links given, nothing to do");
        return Ok(());
    }

    if cli.remember {
        config.download_dir = Some(destination.clone());
        config.max_workers = i64::try_from(workers).ok();
        if let Err(err) = ConfigLoader::save(&config_path, &config) {
            tracing::warn!(error = %err, "could not save config");
        }
    }

    let archive = paths.archive();
    archive.ensure_parent()?;
    let orchestrator = OrchestratorConfig::new(archive, workers).with_retries(cli.retries);
    let client = YtDlpClient::new(orchestrator.clone())?;
    let tool = client.tool_info();
    tracing::debug!(path = %tool.path, version = ?tool.version, "using downloader");

    tracing::info!(
        dir = %destination,
        workers = orchestrator.max_workers,
        quality = %cli.quality,
        tasks = tasks.len(),
        archive = %orchestrator.archive.path(),
        "batch settings"
    );

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::warn!("interrupt received, aborting batch");
        handler_token.cancel();
    })
    .into_diagnostic()?;

    let app = App::new(client, orchestrator);
    let report = app.run_batch(tasks, &destination, &cancel)?;

    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_report(&report).into_diagnostic()?,
        OutputMode::Interactive => output::print_summary(&report).into_diagnostic()?,
    }

    let notification = report.summary.notification();
    if cli.no_notify {
        send_notification(NoopNotifier, notification);
    } else {
        send_notification(SystemNotifier, notification);
    }

    Ok(())
}

fn send_notification<N: Notifier + 'static>(notifier: N, notification: Notification) {
    if !notify::dispatch(notifier, notification).wait(NOTIFY_WAIT) {
        tracing::debug!("notification still pending at exit");
    }
}

/// A non-positive `--workers` is ignored in favour of the config value.
fn resolve_workers(flag: Option<i64>, config: &Config) -> usize {
    match flag {
        Some(value) if value > 0 => clamp_workers(Some(value)),
        _ => config.workers(),
    }
}

fn resolve_destination(flag: Option<&str>, config: &Config) -> Result<Utf8PathBuf, BatchError> {
    match flag {
        Some(value) if value.trim().is_empty() => Err(BatchError::MissingDestination),
        Some(value) => Ok(Utf8PathBuf::from(value.trim())),
        None => config
            .download_dir
            .clone()
            .filter(|dir| !dir.as_str().trim().is_empty())
            .ok_or(BatchError::MissingDestination),
    }
}
