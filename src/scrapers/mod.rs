//! Page fetching and site scrapers.
//!
//! This module owns the HTTP side of the pipeline:
//!
//! 1. [`build_client`]: the single shared `reqwest::Client` used for a whole run
//! 2. [`fetch_page`]: one GET, with every failure logged and turned into `None`
//!
//! Site-specific extraction and crawling live in submodules.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Consultor Jurídico | [`conjur`] | HTML scraping | Tag listing pages, paginated |

pub mod conjur;

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

/// User agent sent with every request.
pub const USER_AGENT: &str = "ConjurRSSBot/1.0 (+https://github.com/conjur-rss-feed)";

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 10;

/// Why a page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with a non-2xx status.
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Connection, DNS, TLS, timeout or body read failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Build the HTTP client shared by every fetch in a run.
///
/// Sends [`USER_AGENT`], times out after [`REQUEST_TIMEOUT`], follows
/// redirects and ignores proxy settings from the environment.
pub fn build_client() -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .no_proxy()
        .build()
}

/// Fetch a page body, or explain why it couldn't be fetched.
pub async fn try_fetch(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }
    Ok(response.text().await?)
}

/// Fetch a page body, returning `None` on any failure.
///
/// Failures are logged here and never reach the caller, so an unreachable
/// page and an error page look the same upstream.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_page(client: &Client, url: &str) -> Option<String> {
    debug!("Fetching page");
    match try_fetch(client, url).await {
        Ok(body) => {
            debug!(bytes = body.len(), "Fetched page");
            Some(body)
        }
        Err(FetchError::HttpStatus(status)) => {
            error!(%url, status, "HTTP error fetching page");
            None
        }
        Err(e) => {
            error!(%url, error = %e, "Request error fetching page");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_page_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tag/itcmd/"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>content</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let body = fetch_page(&client, &format!("{}/tag/itcmd/", mock_server.uri())).await;
        assert_eq!(body.as_deref(), Some("<html>content</html>"));
    }

    #[tokio::test]
    async fn test_fetch_page_follows_redirects() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old/"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let body = fetch_page(&client, &format!("{}/old/", mock_server.uri())).await;
        assert_eq!(body.as_deref(), Some("moved"));
    }

    #[tokio::test]
    async fn test_fetch_page_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client().unwrap();
        let url = format!("{}/missing/", mock_server.uri());
        assert!(fetch_page(&client, &url).await.is_none());
        assert!(matches!(
            try_fetch(&client, &url).await,
            Err(FetchError::HttpStatus(404))
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_connection_refused() {
        // Grab a free port, then close it so nothing is listening.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let client = build_client().unwrap();
        let url = format!("http://127.0.0.1:{}/tag/itcmd/", port);
        assert!(fetch_page(&client, &url).await.is_none());
        assert!(matches!(
            try_fetch(&client, &url).await,
            Err(FetchError::Transport(_))
        ));
    }
}
