use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to download {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Fetches a remote file to a local path.
pub trait AssetFetcher: Send + Sync {
    /// Returns the number of bytes written; an existing destination is overwritten.
    fn fetch(&self, url: &str, destination: &Path) -> DownloadResult<u64>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> DownloadResult<Self> {
        Self::with_user_agent(concat!("waydroid-panel/", env!("CARGO_PKG_VERSION")))
    }

    pub fn with_user_agent(user_agent: &str) -> DownloadResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(DownloadError::Client)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> DownloadResult<u64> {
        let network = |source| DownloadError::Network {
            url: url.to_string(),
            source,
        };
        let io_err = |source| DownloadError::Io {
            path: destination.to_path_buf(),
            source,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(network)?;

        let mut file = File::create(destination).map_err(io_err)?;
        let written = response.copy_to(&mut file).map_err(network)?;
        file.sync_all().map_err(io_err)?;

        tracing::debug!(url, path = %destination.display(), bytes = written, "download finished");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn local_fetcher() -> HttpFetcher {
        let client = reqwest::blocking::Client::builder()
            .no_proxy()
            .build()
            .unwrap();
        HttpFetcher::with_client(client)
    }

    fn serve_once(status_line: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            let header = format!(
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(body);
        });
        format!("http://{address}/F-Droid.apk")
    }

    #[test]
    fn fetch_writes_body_over_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("fdroid.apk");
        std::fs::write(&destination, b"stale contents that are longer").unwrap();

        let url = serve_once("200 OK", b"apk-bytes");
        let written = local_fetcher().fetch(&url, &destination).unwrap();

        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&destination).unwrap(), b"apk-bytes");
    }

    #[test]
    fn http_error_status_is_a_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("fdroid.apk");

        let url = serve_once("404 Not Found", b"missing");
        let err = local_fetcher().fetch(&url, &destination).unwrap_err();

        assert!(matches!(err, DownloadError::Network { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn unusable_user_agent_is_a_client_error() {
        let err = match HttpFetcher::with_user_agent("waydroid\npanel") {
            Ok(_) => panic!("client with a newline in its user agent should not build"),
            Err(err) => err,
        };

        assert!(matches!(err, DownloadError::Client(_)));
        assert!(err.to_string().starts_with("failed to build HTTP client"));
    }
}
