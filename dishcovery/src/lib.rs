pub mod api;
pub mod assemble;
pub mod compiler;
pub mod config;
pub mod error;
pub mod facets;
pub mod gateway;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod pagination;
pub mod service;

pub use error::{Error, Result};
