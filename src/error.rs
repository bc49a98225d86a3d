use thiserror::Error;

#[derive(Error, Debug)]
pub enum DownloaderError {
    #[error("No image URL found for index {0}")]
    MissingUrl(usize),

    #[error("HTTP error: {status} for URL: {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Empty response body from {0}")]
    EmptyBody(String),

    #[error("Invalid image URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Could not resolve the pictures directory")]
    NoPicturesDir,
}
