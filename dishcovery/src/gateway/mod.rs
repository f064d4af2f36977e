use async_trait::async_trait;
use serde_json::Value;

use esdsl::{
    bulk::BulkOutcome,
    response::{ClusterHealth, SearchResponse},
    CompiledQuery,
};

use crate::error::Result;

mod elastic;

pub use elastic::ElasticGateway;

/// A document as stored in the index
pub type RawDoc = Value;

/// Everything the service needs from the search backend
///
/// This is the only place the pipeline waits on anything: every call
/// is a network round trip, everything around it is synchronous.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn exists(&self, index: &str) -> Result<bool>;

    async fn create_index(&self, index: &str, mapping: &Value) -> Result<()>;

    async fn search(&self, index: &str, query: &CompiledQuery) -> Result<SearchResponse<RawDoc>>;

    /// Partial failures are part of the outcome, not an error
    async fn bulk_index(&self, index: &str, records: &[RawDoc]) -> Result<BulkOutcome>;

    /// Never fails: an unreachable backend is reported as such
    async fn health(&self) -> ClusterHealth;
}
