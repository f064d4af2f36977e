use serde_json::{json, Map, Value};

use crate::{DerivedField, Filter, NamedFacet, ScoringClause};

/// A search request, ready to be sent to the backend
///
/// The important bit is the split between `scoring` and `post_filters`:
/// facets are computed over every document matching `scoring` and only
/// afterwards `post_filters` narrow down the returned hits. So changing
/// the post filters changes which hits come back but never the facet
/// counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub scoring: ScoringClause,
    pub derived_fields: Vec<DerivedField>,
    pub post_filters: Vec<Filter>,
    /// `None` when no facet was asked for
    pub facets: Option<Vec<NamedFacet>>,
    pub size: u32,
    pub offset: u32,
}

impl CompiledQuery {
    /// A request that matches everything and returns nothing but the
    /// given facets
    pub fn facets_only(facets: Vec<NamedFacet>, derived_fields: Vec<DerivedField>) -> Self {
        Self {
            scoring: ScoringClause::MatchAll,
            derived_fields,
            post_filters: Vec::new(),
            facets: Some(facets),
            size: 0,
            offset: 0,
        }
    }

    /// Renders the query in the backend's `_search` body format
    pub fn to_wire(&self) -> Value {
        let mut body = Map::new();

        body.insert("size".to_owned(), Value::from(self.size));
        body.insert("from".to_owned(), Value::from(self.offset));
        body.insert("track_total_hits".to_owned(), Value::from(true));
        body.insert(
            "query".to_owned(),
            json!({ "bool": { "must": [self.scoring.to_wire()] } }),
        );

        if !self.post_filters.is_empty() {
            let filters = self
                .post_filters
                .iter()
                .map(Filter::to_wire)
                .collect::<Vec<_>>();
            body.insert(
                "post_filter".to_owned(),
                json!({ "bool": { "filter": filters } }),
            );
        }

        if !self.derived_fields.is_empty() {
            let mappings = self
                .derived_fields
                .iter()
                .map(|field| (field.name.clone(), field.to_wire()))
                .collect::<Map<_, _>>();
            body.insert("runtime_mappings".to_owned(), Value::Object(mappings));
        }

        if let Some(facets) = &self.facets {
            let aggs = facets
                .iter()
                .map(|facet| (facet.name.clone(), facet.request.to_wire()))
                .collect::<Map<_, _>>();
            body.insert("aggs".to_owned(), Value::Object(aggs));
        }

        Value::Object(body)
    }
}
