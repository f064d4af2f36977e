mod aggregation;
mod query;
mod request;
mod runtime;

pub mod bulk;
pub mod response;

pub use aggregation::{bucket_for, FacetRequest, KeyOrder, NamedFacet, RangeBoundary};
pub use query::{BoostedField, Bounds, Filter, Fuzziness, ScoringClause, TermValue};
pub use request::CompiledQuery;
pub use runtime::DerivedField;
