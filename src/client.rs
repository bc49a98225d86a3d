use crate::error::DownloaderError;
use async_trait::async_trait;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::time::Duration;
use url::Url;

pub const BING_HOST: &str = "www.bing.com";
pub const USER_AGENT: &str = "Bing IOD Downloader/1.0";

/// A single GET with no retry. An empty body counts as a failure.
#[async_trait]
pub trait Fetch: Sync {
    async fn fetch(&self, host: &str, path: &str) -> Result<Vec<u8>, DownloaderError>;

    /// Same as `fetch`, for image bodies, which may report progress.
    async fn fetch_image(&self, host: &str, path: &str) -> Result<Vec<u8>, DownloaderError> {
        self.fetch(host, path).await
    }
}

pub struct HttpClient {
    client: reqwest::Client,
    scheme: &'static str,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self, DownloaderError> {
        Self::from_builder(Self::builder(timeout))
    }

    fn builder(timeout: Duration) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
    }

    fn from_builder(builder: reqwest::ClientBuilder) -> Result<Self, DownloaderError> {
        Ok(Self {
            client: builder.build()?,
            scheme: "https",
        })
    }

    #[cfg(test)]
    fn with_scheme(mut self, scheme: &'static str) -> Self {
        self.scheme = scheme;
        self
    }

    async fn get(&self, host: &str, path: &str, show_progress: bool) -> Result<Vec<u8>, DownloaderError> {
        let url = format!("{}://{}{}", self.scheme, host, path);
        debug!("GET {}", url);

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(DownloaderError::HttpStatus {
                status: resp.status(),
                url,
            });
        }

        // Content-Length only sizes the bar; the buffer grows with what arrives.
        let pb = if show_progress {
            Self::create_progress_bar(resp.content_length().unwrap_or(0))
        } else {
            ProgressBar::hidden()
        };
        let mut buffer = Vec::new();
        let mut stream = resp.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e.into());
                }
            };
            buffer.extend_from_slice(&chunk);
            pb.set_position(buffer.len() as u64);
        }
        pb.finish_and_clear();

        if buffer.is_empty() {
            return Err(DownloaderError::EmptyBody(url));
        }
        debug!("Received {} bytes from {}", buffer.len(), url);
        Ok(buffer)
    }

    fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }
}

#[async_trait]
impl Fetch for HttpClient {
    async fn fetch(&self, host: &str, path: &str) -> Result<Vec<u8>, DownloaderError> {
        self.get(host, path, false).await
    }

    async fn fetch_image(&self, host: &str, path: &str) -> Result<Vec<u8>, DownloaderError> {
        self.get(host, path, true).await
    }
}

/// Splits an image URL from the metadata document into host and path.
///
/// The archive usually hands out host-relative URLs (`/th?id=...`), which are
/// served by `default_host`. Absolute URLs keep their own host.
pub fn resolve_image_location(
    image_url: &str,
    default_host: &str,
) -> Result<(String, String), DownloaderError> {
    if image_url.starts_with("http://") || image_url.starts_with("https://") {
        let parsed = Url::parse(image_url)?;
        let host = parsed
            .host_str()
            .ok_or(DownloaderError::InvalidUrl(url::ParseError::EmptyHost))?;
        let host = match parsed.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let path = match parsed.query() {
            Some(query) => format!("{}?{}", parsed.path(), query),
            None => parsed.path().to_string(),
        };
        return Ok((host, path));
    }

    let path = if image_url.starts_with('/') {
        image_url.to_string()
    } else {
        format!("/{}", image_url)
    };
    Ok((default_host.to_string(), path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves one canned HTTP response on a loopback port and returns `host:port`.
    async fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response).await.unwrap();
            let _ = socket.shutdown().await;
        });
        addr.to_string()
    }

    fn plain_http_client() -> HttpClient {
        HttpClient::from_builder(HttpClient::builder(Duration::from_secs(5)).no_proxy())
            .unwrap()
            .with_scheme("http")
    }

    #[tokio::test]
    async fn returns_body_bytes() {
        let host = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\nConnection: close\r\n\r\nfox-bytes").await;
        let body = plain_http_client().fetch(&host, "/th?id=OHR.Fox.jpg").await.unwrap();
        assert_eq!(body, b"fox-bytes");
    }

    #[tokio::test]
    async fn joins_chunked_body() {
        let host = serve_once(
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n4\r\nfox-\r\n5\r\nbytes\r\n0\r\n\r\n",
        )
        .await;
        let body = plain_http_client().fetch_image(&host, "/a.jpg").await.unwrap();
        assert_eq!(body, b"fox-bytes");
    }

    #[tokio::test]
    async fn empty_body_is_an_error() {
        let host = serve_once(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let err = plain_http_client().fetch(&host, "/HPImageArchive.aspx").await.unwrap_err();
        assert!(matches!(err, DownloaderError::EmptyBody(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let host = serve_once(b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found").await;
        let err = plain_http_client().fetch(&host, "/missing.jpg").await.unwrap_err();
        match err {
            DownloaderError::HttpStatus { status, url } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert!(url.ends_with("/missing.jpg"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn oversized_content_length_fails_only_the_request() {
        let host = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000000000000000\r\nConnection: close\r\n\r\nfox",
        )
        .await;
        let err = plain_http_client().fetch_image(&host, "/huge.jpg").await.unwrap_err();
        assert!(matches!(err, DownloaderError::RequestError(_)));
    }

    #[test]
    fn relative_url_uses_default_host() {
        let (host, path) =
            resolve_image_location("/th?id=OHR.Fox_EN-US1.jpg&rf=x", BING_HOST).unwrap();
        assert_eq!(host, "www.bing.com");
        assert_eq!(path, "/th?id=OHR.Fox_EN-US1.jpg&rf=x");
    }

    #[test]
    fn missing_leading_slash_is_added() {
        let (_, path) = resolve_image_location("th?id=OHR.Fox.jpg", BING_HOST).unwrap();
        assert_eq!(path, "/th?id=OHR.Fox.jpg");
    }

    #[test]
    fn absolute_url_keeps_its_host() {
        let (host, path) =
            resolve_image_location("https://img.example.com/az/Fox.jpg?w=1920", BING_HOST).unwrap();
        assert_eq!(host, "img.example.com");
        assert_eq!(path, "/az/Fox.jpg?w=1920");
    }

    #[test]
    fn malformed_absolute_url_is_rejected() {
        let err = resolve_image_location("https://", BING_HOST).unwrap_err();
        assert!(matches!(err, DownloaderError::InvalidUrl(_)));
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(HttpClient::new(Duration::from_secs(5)).is_ok());
    }
}
