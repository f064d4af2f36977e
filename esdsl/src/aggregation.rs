use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Ordering of the buckets in a terms facet, by bucket key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    Asc,
    Desc,
}

impl KeyOrder {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// A labelled numeric bucket: `from` is inclusive, `to` is exclusive
///
/// A missing `from` means "from the beginning" and a missing `to`
/// means "up to infinity", so `{0-15, 15-30, 30+}` is expressed as
/// `(None, 15), (15, 30), (30, None)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBoundary {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl RangeBoundary {
    pub fn new(label: impl Into<String>, from: Option<u64>, to: Option<u64>) -> Self {
        Self {
            label: label.into(),
            from,
            to,
        }
    }

    pub fn contains(&self, value: u64) -> bool {
        self.from.map_or(true, |from| value >= from) && self.to.map_or(true, |to| value < to)
    }

    fn to_wire(&self) -> Value {
        let mut range = Map::new();
        range.insert("key".to_owned(), Value::from(self.label.as_str()));
        if let Some(from) = self.from {
            range.insert("from".to_owned(), Value::from(from));
        }
        if let Some(to) = self.to {
            range.insert("to".to_owned(), Value::from(to));
        }
        Value::Object(range)
    }
}

/// Finds the first boundary a value falls into
pub fn bucket_for(boundaries: &[RangeBoundary], value: u64) -> Option<&RangeBoundary> {
    boundaries.iter().find(|b| b.contains(value))
}

/// What to summarize about the matching documents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FacetRequest {
    /// Document counts per distinct value of a keyword field
    Terms {
        field: String,
        max_buckets: u32,
        order: KeyOrder,
    },
    /// min/max/avg/sum over a numeric field
    Stats { field: String },
    /// Document counts per labelled numeric range
    Range {
        field: String,
        boundaries: Vec<RangeBoundary>,
    },
}

impl FacetRequest {
    pub fn is_bucketed(&self) -> bool {
        !matches!(self, Self::Stats { .. })
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Self::Terms {
                field,
                max_buckets,
                order,
            } => json!({
                "terms": {
                    "field": field,
                    "size": max_buckets,
                    "order": { "_key": order.as_str() },
                }
            }),
            Self::Stats { field } => json!({ "stats": { "field": field } }),
            Self::Range { field, boundaries } => json!({
                "range": {
                    "field": field,
                    "ranges": boundaries.iter().map(RangeBoundary::to_wire).collect::<Vec<_>>(),
                }
            }),
        }
    }
}

/// A facet request under the name its summary is reported with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedFacet {
    pub name: String,
    #[serde(flatten)]
    pub request: FacetRequest,
}

impl NamedFacet {
    pub fn new(name: impl Into<String>, request: FacetRequest) -> Self {
        Self {
            name: name.into(),
            request,
        }
    }
}
