use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::{SearchOutcome, SearchResponse};
use crate::query::build_search_url;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Error en la solicitud a {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Respuesta JSON inválida de {url}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("No se pudo codificar la consulta {query}")]
    Encode {
        query: String,
        #[source]
        source: serde_urlencoded::ser::Error,
    },
}

/// Without a timeout a request waits for as long as the server takes.
pub fn build_http_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(concat!("urlscan-search/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .brotli(true)
        .pool_idle_timeout(Duration::from_secs(30))
        .pool_max_idle_per_host(2);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("build reqwest client")
}

/// Run one query against the search endpoint.
///
/// Only a 200 counts as success; any other status is handed back as
/// [`SearchOutcome::Rejected`] so the caller can carry on with the next
/// criterion. Transport and decoding problems surface as [`SearchError`].
pub async fn search_urlscan(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    query: &str,
    max_results: u32,
) -> Result<SearchOutcome, SearchError> {
    let url =
        build_search_url(endpoint, query, max_results).map_err(|source| SearchError::Encode {
            query: query.to_string(),
            source,
        })?;

    tracing::debug!(%url, "sending search request");
    let resp = client
        .get(&url)
        .header("API-Key", api_key)
        .header(CONTENT_TYPE, "application/json")
        .send()
        .await
        .map_err(|source| SearchError::Request {
            url: url.clone(),
            source,
        })?;

    let status = resp.status();
    let body = resp.text().await.map_err(|source| SearchError::Request {
        url: url.clone(),
        source,
    })?;

    if status != StatusCode::OK {
        eprintln!("Error en la solicitud: {}, {}", status.as_u16(), body);
        tracing::debug!(status = status.as_u16(), %query, "search rejected");
        return Ok(SearchOutcome::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    let parsed: SearchResponse =
        serde_json::from_str(&body).map_err(|source| SearchError::Decode { url, source })?;
    tracing::debug!(%query, results = parsed.results.len(), "search completed");
    Ok(SearchOutcome::Found(parsed.results))
}
