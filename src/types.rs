use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadRequest {
    pub day_offset: usize,
}

impl DownloadRequest {
    /// Path and query of the archive endpoint for this day offset.
    pub fn metadata_path(&self, market: &str) -> String {
        format!(
            "/HPImageArchive.aspx?format=js&idx={}&n=1&mkt={}",
            self.day_offset, market
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub url: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Downloaded,
    Skipped,
    Failed,
}

#[derive(Debug)]
pub struct DownloadReport {
    pub request: DownloadRequest,
    pub filename: Option<String>,
    pub status: DownloadStatus,
    pub bytes_downloaded: u64,
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub errors: usize,
    pub target_folder: PathBuf,
    pub reports: Vec<DownloadReport>,
}

impl DownloadSummary {
    pub fn from_reports(reports: Vec<DownloadReport>, target_folder: PathBuf) -> Self {
        let count = |status: DownloadStatus| reports.iter().filter(|r| r.status == status).count();
        Self {
            downloaded: count(DownloadStatus::Downloaded),
            skipped: count(DownloadStatus::Skipped),
            errors: count(DownloadStatus::Failed),
            target_folder,
            reports,
        }
    }

    pub fn total_bytes_downloaded(&self) -> u64 {
        self.reports.iter().map(|r| r.bytes_downloaded).sum()
    }

    /// A run succeeds when no index failed, even if nothing was downloaded.
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }
}
