use crate::client::{resolve_image_location, Fetch, BING_HOST};
use crate::error::DownloaderError;
use crate::filename::derive_filename;
use crate::logger::RunLog;
use crate::parser::parse_metadata;
use crate::types::{DownloadReport, DownloadRequest, DownloadStatus, DownloadSummary};
use log::debug;
use std::path::Path;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const DEFAULT_IMAGE_COUNT: usize = 8;
pub const DEFAULT_MARKET: &str = "en-US";

pub struct Downloader<F> {
    fetcher: F,
    metadata_host: String,
    market: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    FetchingMetadata,
    ParsingUrl,
    DownloadingImage,
    WritingFile,
}

/// How a single index ended when it did not produce a file.
enum Outcome {
    Skipped(String),
    Failed {
        stage: Stage,
        filename: Option<String>,
        error: DownloaderError,
    },
}

impl<F: Fetch> Downloader<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            metadata_host: BING_HOST.to_string(),
            market: DEFAULT_MARKET.to_string(),
        }
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    /// Makes sure the destination exists. A failure is logged and left for the
    /// individual writes to report.
    pub async fn prepare_target(&self, target: &Path, log: &RunLog) {
        if target.exists() {
            return;
        }
        match tokio::fs::create_dir_all(target).await {
            Ok(()) => log.info(format!("Created folder: {}", target.display())),
            Err(e) => log.error(format!("Failed to ensure directory exists: {}", e)),
        }
    }

    pub async fn download_all(&self, count: usize, target: &Path, log: &RunLog) -> DownloadSummary {
        log.info("Starting Bing Image of the Day download...");

        let mut reports = Vec::with_capacity(count);
        for day_offset in 0..count {
            let request = DownloadRequest { day_offset };
            reports.push(self.download_one(request, target, log).await);
        }

        let summary = DownloadSummary::from_reports(reports, target.to_path_buf());
        log.info("=== Download Summary ===");
        log.info(format!("Downloaded: {}", summary.downloaded));
        log.info(format!("Skipped: {}", summary.skipped));
        log.info(format!("Errors: {}", summary.errors));
        log.info(format!("Target folder: {}", summary.target_folder.display()));
        summary
    }

    async fn download_one(&self, request: DownloadRequest, target: &Path, log: &RunLog) -> DownloadReport {
        match self.try_download(request, target, log).await {
            Ok((filename, bytes)) => {
                log.info(format!("DOWNLOADED: {} ({} KB)", filename, bytes / 1024));
                DownloadReport {
                    request,
                    filename: Some(filename),
                    status: DownloadStatus::Downloaded,
                    bytes_downloaded: bytes,
                    error: None,
                }
            }
            Err(Outcome::Skipped(filename)) => {
                log.info(format!("SKIPPED: {} (already exists)", filename));
                DownloadReport {
                    request,
                    filename: Some(filename),
                    status: DownloadStatus::Skipped,
                    bytes_downloaded: 0,
                    error: None,
                }
            }
            Err(Outcome::Failed { stage, filename, error }) => {
                let name = filename.as_deref().unwrap_or_default();
                match stage {
                    Stage::FetchingMetadata => log.error(format!(
                        "Failed to fetch metadata for image {}: {}",
                        request.day_offset + 1,
                        error
                    )),
                    Stage::ParsingUrl => log.warning(error.to_string()),
                    Stage::DownloadingImage => {
                        log.error(format!("Failed to download image: {}: {}", name, error))
                    }
                    Stage::WritingFile => log.error(format!("Failed to save file: {}: {}", name, error)),
                }
                DownloadReport {
                    request,
                    filename,
                    status: DownloadStatus::Failed,
                    bytes_downloaded: 0,
                    error: Some(error.to_string()),
                }
            }
        }
    }

    async fn try_download(
        &self,
        request: DownloadRequest,
        target: &Path,
        log: &RunLog,
    ) -> Result<(String, u64), Outcome> {
        let index = request.day_offset;
        log.info(format!("Fetching metadata for image {}...", index + 1));

        let body = self
            .fetcher
            .fetch(&self.metadata_host, &request.metadata_path(&self.market))
            .await
            .map_err(|error| Outcome::Failed {
                stage: Stage::FetchingMetadata,
                filename: None,
                error,
            })?;

        let metadata = parse_metadata(&body);
        if metadata.url.is_empty() {
            return Err(Outcome::Failed {
                stage: Stage::ParsingUrl,
                filename: None,
                error: DownloaderError::MissingUrl(index),
            });
        }

        let filename = derive_filename(&metadata.url, index);
        let full_path = target.join(&filename);
        if full_path.exists() {
            return Err(Outcome::Skipped(filename));
        }

        match &metadata.title {
            Some(title) => log.info(format!("Downloading: {} ({})", filename, title)),
            None => log.info(format!("Downloading: {}", filename)),
        }

        let fail = |stage| {
            let filename = filename.clone();
            move |error| Outcome::Failed {
                stage,
                filename: Some(filename),
                error,
            }
        };
        let (host, path) = resolve_image_location(&metadata.url, &self.metadata_host)
            .map_err(fail(Stage::DownloadingImage))?;
        let image = self
            .fetcher
            .fetch_image(&host, &path)
            .await
            .map_err(fail(Stage::DownloadingImage))?;
        write_new_file(&full_path, &image)
            .await
            .map_err(fail(Stage::WritingFile))?;

        Ok((filename, image.len() as u64))
    }
}

/// Writes `bytes` to a file that must not exist yet.
async fn write_new_file(path: &Path, bytes: &[u8]) -> Result<(), DownloaderError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    fill_or_remove(file, path, bytes).await
}

/// Writes everything to `file`, deleting `path` if that fails so the next run
/// does not mistake a partial file for a finished download.
async fn fill_or_remove<W>(mut file: W, path: &Path, bytes: &[u8]) -> Result<(), DownloaderError>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if let Err(e) = written {
        drop(file);
        if let Err(remove_err) = tokio::fs::remove_file(path).await {
            debug!("Failed to remove partial file {}: {}", path.display(), remove_err);
        }
        return Err(e.into());
    }
    Ok(())
}
