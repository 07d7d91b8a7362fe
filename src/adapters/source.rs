use crate::utils::error::Result;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Where a data source lives: an http(s) URL or a path handed to `Storage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Remote(Url),
    Local(String),
}

impl SourceLocation {
    pub fn parse(location: &str) -> Self {
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            _ => Self::Local(location.to_string()),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => write!(f, "{}", url),
            Self::Local(path) => write!(f, "{}", path),
        }
    }
}

/// 下載遠端資料；非 2xx 狀態視為錯誤
pub async fn fetch_remote(client: &Client, url: &Url, timeout: Duration) -> Result<Vec<u8>> {
    tracing::debug!("Making HTTP request to: {}", url);
    let response = client
        .get(url.clone())
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?;

    tracing::debug!("HTTP response status: {}", response.status());
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
}
