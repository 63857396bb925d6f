//! Resolves a [`City`] to the raw bytes of its trip source.
//!
//! [`CityResolver`] is the seam between the loader and wherever the data
//! lives. [`DirResolver`] reads a local data directory; [`HttpResolver`]
//! downloads from a base URL through an [`HttpClient`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::city::City;
use crate::error::{ExplorerError, Result};
use crate::fetch::{HttpClient, fetch_bytes};

/// Produces the raw (possibly gzip-compressed) source for a city.
#[async_trait]
pub trait CityResolver: Send + Sync {
    async fn fetch(&self, city: City) -> Result<Vec<u8>>;
}

/// Reads `<root>/<file>` or, failing that, `<root>/<file>.gz`.
#[derive(Debug, Clone)]
pub struct DirResolver {
    root: PathBuf,
}

impl DirResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn candidates(&self, city: City) -> [PathBuf; 2] {
        let plain = self.root.join(city.file_name());
        let gz = self.root.join(format!("{}.gz", city.file_name()));
        [plain, gz]
    }
}

#[async_trait]
impl CityResolver for DirResolver {
    async fn fetch(&self, city: City) -> Result<Vec<u8>> {
        let mut tried = Vec::new();

        for path in self.candidates(city) {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    debug!(path = %path.display(), "Reading trip source");
                    return Ok(bytes);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    tried.push(path.display().to_string());
                }
                Err(e) => {
                    return Err(ExplorerError::unavailable(
                        city,
                        format!("{}: {e}", path.display()),
                    ));
                }
            }
        }

        Err(ExplorerError::unavailable(
            city,
            format!("no file at {}", tried.join(" or ")),
        ))
    }
}

/// Downloads `<base_url>/<file>`.
pub struct HttpResolver<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> HttpResolver<C> {
    pub fn new(client: C, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, city: City) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), city.file_name())
    }
}

#[async_trait]
impl<C: HttpClient> CityResolver for HttpResolver<C> {
    async fn fetch(&self, city: City) -> Result<Vec<u8>> {
        let url = self.url_for(city);
        fetch_bytes(&self.client, &url)
            .await
            .map_err(|e| ExplorerError::unavailable(city, format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use std::env;
    use std::fs;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_dir_resolver_reads_city_file() {
        let dir = temp_dir("bikeshare_explorer_resolver_plain");
        fs::write(dir.join("chicago.csv"), "Start Time\n").unwrap();

        let resolver = DirResolver::new(&dir);
        let bytes = resolver.fetch(City::Chicago).await.unwrap();
        assert_eq!(bytes, b"Start Time\n");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_dir_resolver_falls_back_to_gz() {
        let dir = temp_dir("bikeshare_explorer_resolver_gz");
        fs::write(dir.join("washington.csv.gz"), [0x1f, 0x8b]).unwrap();

        let resolver = DirResolver::new(&dir);
        let bytes = resolver.fetch(City::Washington).await.unwrap();
        assert_eq!(bytes, vec![0x1f, 0x8b]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn test_dir_resolver_missing_file() {
        let dir = temp_dir("bikeshare_explorer_resolver_missing");

        let resolver = DirResolver::new(&dir);
        let err = resolver.fetch(City::NewYork).await.unwrap_err();
        match err {
            ExplorerError::SourceUnavailable { city, reason } => {
                assert_eq!(city, City::NewYork);
                assert!(reason.contains("new_york_city.csv"));
            }
            other => panic!("expected SourceUnavailable, got {other:?}"),
        }

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_http_resolver_url() {
        let client = BasicClient::new().unwrap();
        let resolver = HttpResolver::new(client, "https://example.com/bikeshare/");
        assert_eq!(
            resolver.url_for(City::NewYork),
            "https://example.com/bikeshare/new_york_city.csv"
        );
    }
}
