use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::time::timeout;

use esdsl::{
    response::{ClusterHealth, SearchResponse},
    CompiledQuery,
};

use crate::{
    assemble::assemble,
    compiler::{compile, compile_overview},
    config::SearchConfig,
    error::{Error, Result},
    facets::decode,
    gateway::{Gateway, RawDoc},
    model::{FacetSummary, RawSearchRequest, SearchResult},
    normalize::normalize,
    pagination::paginate,
};

/// Facets over the whole index, for a first page load
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct IndexOverview {
    pub total_recipes: u64,
    pub aggregations: FacetSummary,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: &'static str,
    pub backend: ClusterHealth,
    pub index_exists: bool,
}

/// The search pipeline: normalize, compile, query, decode, assemble
///
/// Holds no per-request state, so a single instance serves every
/// request concurrently.
pub struct SearchService {
    gateway: Arc<dyn Gateway>,
    config: Arc<SearchConfig>,
    index: String,
    timeout: Duration,
}

impl SearchService {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        config: Arc<SearchConfig>,
        index: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            config,
            index: index.into(),
            timeout,
        }
    }

    async fn execute(&self, query: &CompiledQuery) -> Result<SearchResponse<RawDoc>> {
        match timeout(self.timeout, self.gateway.search(&self.index, query)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                log::warn!(
                    "Search on {} abandoned after {}ms",
                    self.index,
                    self.timeout.as_millis()
                );
                Err(Error::BackendTimeout(self.timeout.as_millis() as u64))
            }
        }
    }

    pub async fn search(&self, raw: RawSearchRequest) -> Result<SearchResult> {
        let criteria = normalize(raw, &self.config)?;
        let page = paginate(&criteria);
        let query = compile(&criteria, &self.config);

        log::debug!(
            "Searching {} from={} size={} filters={} facets={}",
            self.index,
            page.window.offset,
            page.window.size,
            query.post_filters.len(),
            query.facets.is_some()
        );

        let response = self.execute(&query).await?;

        let facets = query
            .facets
            .as_deref()
            .map(|catalog| decode(response.aggregations.as_ref(), catalog))
            .transpose()?;

        assemble(&response, page, facets)
    }

    pub async fn overview(&self) -> Result<IndexOverview> {
        let query = compile_overview(&self.config);
        let response = self.execute(&query).await?;

        Ok(IndexOverview {
            total_recipes: response.hits.total.value(),
            aggregations: decode(response.aggregations.as_ref(), &self.config.facets)?,
        })
    }

    pub async fn health(&self) -> HealthReport {
        let backend = self.gateway.health().await;
        let index_exists = match self.gateway.exists(&self.index).await {
            Ok(exists) => exists,
            Err(err) => {
                log::warn!("Could not check index {}: {}", self.index, err);
                false
            }
        };

        HealthReport {
            status: "healthy",
            service: "dishcovery",
            backend,
            index_exists,
        }
    }
}
