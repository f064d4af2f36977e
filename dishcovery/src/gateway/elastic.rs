use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde_json::Value;
use tokio::sync::{Semaphore, SemaphorePermit};

use esdsl::{
    bulk::{encode_index_actions, BulkOutcome, BulkResponse},
    response::{ClusterHealth, ErrorResponse, SearchResponse},
    CompiledQuery,
};

use super::{Gateway, RawDoc};
use crate::error::{Error, Result};

/// Talks to an Elasticsearch-compatible backend over its REST api
///
/// At most `max_concurrency` requests are in flight at any time;
/// callers beyond that wait for a slot.
pub struct ElasticGateway {
    client: Client,
    base_url: String,
    permits: Semaphore,
    timeout: Duration,
}

async fn error_reason(response: Response) -> String {
    let status = response.status();
    match response.json::<ErrorResponse>().await {
        Ok(body) => body.reason(),
        Err(_) => format!("status {}", status),
    }
}

/// 4xx means the backend didn't like what we sent, anything else
/// means it's not in a state to answer
async fn failure(response: Response) -> Error {
    if response.status().is_client_error() {
        Error::BackendQuery(error_reason(response).await)
    } else {
        Error::BackendUnavailable(error_reason(response).await)
    }
}

impl ElasticGateway {
    pub fn new(base_url: &str, timeout: Duration, max_concurrency: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::BackendUnavailable(format!("http client setup: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            permits: Semaphore::new(max_concurrency.max(1)),
            timeout,
        })
    }

    /// A request that never completed: too slow, or no backend at all
    fn unavailable(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::BackendTimeout(self.timeout.as_millis() as u64)
        } else if err.is_connect() {
            Error::BackendUnavailable("connection failed".to_owned())
        } else {
            Error::BackendUnavailable(err.to_string())
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn slot(&self) -> Result<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| Error::BackendUnavailable("gateway is shutting down".to_owned()))
    }
}

#[async_trait]
impl Gateway for ElasticGateway {
    async fn exists(&self, index: &str) -> Result<bool> {
        let _slot = self.slot().await?;

        let response = self
            .client
            .head(self.url(index))
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(failure(response).await),
        }
    }

    async fn create_index(&self, index: &str, mapping: &Value) -> Result<()> {
        let _slot = self.slot().await?;

        let response = self
            .client
            .put(self.url(index))
            .json(mapping)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if response.status().is_success() {
            log::info!("Created index {}", index);
            Ok(())
        } else {
            Err(failure(response).await)
        }
    }

    async fn search(&self, index: &str, query: &CompiledQuery) -> Result<SearchResponse<RawDoc>> {
        let _slot = self.slot().await?;

        let response = self
            .client
            .post(self.url(&format!("{}/_search", index)))
            .json(&query.to_wire())
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Decode(format!("search response: {}", e)))
        } else {
            let err = failure(response).await;
            log::warn!("Search on {} failed: {}", index, err);
            Err(err)
        }
    }

    async fn bulk_index(&self, index: &str, records: &[RawDoc]) -> Result<BulkOutcome> {
        if records.is_empty() {
            return Ok(BulkOutcome::default());
        }

        let body = encode_index_actions(index, records)?;
        let _slot = self.slot().await?;

        let response = self
            .client
            .post(self.url("_bulk"))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let bulk: BulkResponse = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("bulk response: {}", e)))?;

        Ok(BulkOutcome::from(bulk))
    }

    async fn health(&self) -> ClusterHealth {
        let slot = match self.slot().await {
            Ok(slot) => slot,
            Err(err) => return ClusterHealth::unreachable(err.to_string()),
        };

        let result = match self.client.get(self.url("_cluster/health")).send().await {
            Ok(response) if response.status().is_success() => response
                .json::<ClusterHealth>()
                .await
                .unwrap_or_else(|e| ClusterHealth::unreachable(format!("bad health payload: {}", e))),
            Ok(response) => ClusterHealth::unreachable(error_reason(response).await),
            Err(err) => ClusterHealth::unreachable(self.unavailable(err).to_string()),
        };

        drop(slot);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_ignore_trailing_slash() {
        let gateway =
            ElasticGateway::new("http://localhost:9200/", Duration::from_secs(1), 4).unwrap();

        assert_eq!("http://localhost:9200/recipes", gateway.url("recipes"));
        assert_eq!(
            "http://localhost:9200/_cluster/health",
            gateway.url("_cluster/health")
        );
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let gateway = ElasticGateway::new("http://localhost:9200", Duration::from_secs(1), 0).unwrap();

        assert_eq!(1, gateway.permits.available_permits());
    }

    #[actix_rt::test]
    async fn slow_backends_are_timeouts() {
        // Accepts connections but never answers
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", silent.local_addr().unwrap());

        let gateway = ElasticGateway::new(&url, Duration::from_millis(100), 1).unwrap();

        assert!(matches!(
            gateway.exists("recipes").await,
            Err(Error::BackendTimeout(100))
        ));
        assert!(matches!(
            gateway
                .search("recipes", &CompiledQuery::facets_only(Vec::new(), Vec::new()))
                .await,
            Err(Error::BackendTimeout(100))
        ));
    }
}
