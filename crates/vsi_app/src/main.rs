//! `vsi-upload`: command-line client for the VSI upload service.

mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use vsi_core::JobStatus;

use platform::app::{self, HistoryOptions, UploadOptions};
use platform::logging::{self, LogDestination};
use platform::settings::{self, Overrides};

#[derive(Parser)]
#[command(name = "vsi-upload", version, about = "Upload VSI archives and follow their processing")]
struct Cli {
    /// RON settings file. Defaults to ./vsi-upload.ron when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// API base url including the prefix, e.g. http://localhost:8000/api.
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Per-request timeout in milliseconds.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    /// Also write logs to ./vsi-upload.log.
    #[arg(long, global = true)]
    log_file: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a ZIP file and follow it until processing finishes.
    Upload(UploadArgs),
    /// Print the current status of one job.
    Status(StatusArgs),
    /// List past uploads.
    History(HistoryArgs),
}

#[derive(Args)]
struct UploadArgs {
    file: PathBuf,
    /// Media type to declare; guessed from the extension when omitted.
    #[arg(long)]
    media_type: Option<String>,
    /// Retry a failed upload this many times.
    #[arg(long, default_value_t = 0)]
    retries: u32,
}

#[derive(Args)]
struct StatusArgs {
    job_id: String,
}

#[derive(Args)]
struct HistoryArgs {
    /// Only show jobs in this status (Uploaded, Processing, Completed, Failed).
    #[arg(long)]
    status: Option<JobStatus>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
    /// Keep refreshing while jobs on the page are still in flight.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, vsi_logging::level_for_verbosity(cli.verbose));

    let overrides = Overrides {
        base_url: cli.base_url,
        timeout_ms: cli.timeout_ms,
    };
    let config = settings::load(cli.config.as_deref(), &overrides).context("loading settings")?;

    match cli.command {
        Command::Upload(args) => {
            app::run_upload(
                &config,
                UploadOptions {
                    file: &args.file,
                    media_type: args.media_type,
                    retries: args.retries,
                },
            )
            .await
        }
        Command::Status(args) => app::run_status(&config, &args.job_id).await,
        Command::History(args) => {
            app::run_history(
                &config,
                HistoryOptions {
                    status: args.status,
                    page: args.page,
                    limit: args.limit,
                    watch: args.watch,
                },
            )
            .await
        }
    }
}
