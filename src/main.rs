mod cli;
mod client;
mod downloader;
mod error;
mod filename;
mod logger;
mod parser;
#[cfg(test)]
mod test_support;
mod types;

use cli::Cli;
use clap::Parser;
use colored::*;
use error::DownloaderError;
use log::{debug, info};
use logger::RunLog;
use std::path::PathBuf;
use std::time::Duration;

/// Picks the destination folder: an explicit override wins, otherwise the
/// provider (normally the OS pictures folder) is asked.
fn resolve_target(
    output_dir: Option<PathBuf>,
    pictures_dir: impl FnOnce() -> Option<PathBuf>,
) -> Result<PathBuf, DownloaderError> {
    output_dir
        .or_else(pictures_dir)
        .ok_or(DownloaderError::NoPicturesDir)
}

/// Red stderr line for errors that stop the run before any image is tried.
fn fatal_line(e: &DownloaderError) -> String {
    format!("{} {}", "Fatal error:".red().bold(), e.to_string().red())
}

async fn run(cli: &Cli, log: &RunLog) -> Result<bool, DownloaderError> {
    let target = resolve_target(cli.output_dir.clone(), dirs::picture_dir)?;
    let client = client::HttpClient::new(Duration::from_secs(cli.timeout))?;
    let downloader = downloader::Downloader::new(client).with_market(cli.market.clone());

    downloader.prepare_target(&target, log).await;
    let summary = downloader.download_all(cli.count, &target, log).await;
    for report in summary.reports.iter().filter(|r| r.error.is_some()) {
        debug!(
            "Index {} ({}) failed: {}",
            report.request.day_offset,
            report.filename.as_deref().unwrap_or("no filename"),
            report.error.as_deref().unwrap_or_default()
        );
    }
    info!(
        "Run finished: {} bytes written to {}",
        summary.total_bytes_downloaded(),
        summary.target_folder.display()
    );
    Ok(summary.is_success())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    info!("CLI arguments parsed: {:?}", cli);

    let mut log = RunLog::new(&cli.log_file);
    if cli.quiet {
        log = log.quiet();
    }
    info!(
        "Status log at {} (rotates to {})",
        log.path().display(),
        log.backup_path().display()
    );
    log.info("Bing Image of the Day Downloader Started");

    let result = run(&cli, &log).await;

    match &result {
        Ok(true) => log.info("Process completed successfully"),
        Ok(false) => log.info("Process completed with errors"),
        Err(e) => {
            log.error(format!("Fatal error: {}", e));
            eprintln!("{}", fatal_line(e));
        }
    }

    if cli.exit_delay > 0 {
        tokio::time::sleep(Duration::from_secs(cli.exit_delay)).await;
    }

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => Err(anyhow::Error::new(e).context("Fatal error")),
    }
}
