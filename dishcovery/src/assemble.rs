use esdsl::response::SearchResponse;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    gateway::RawDoc,
    model::{FacetSummary, Recipe, SearchResult},
    pagination::{Page, ResponseShape},
};

/// Projects a stored document into the response representation
pub fn project(doc: &RawDoc) -> Result<Recipe> {
    Recipe::deserialize(doc).map_err(|e| Error::Decode(format!("malformed recipe: {}", e)))
}

/// Puts together the response for one page of results
///
/// `total` is always the backend's full match count. Facets only make
/// it into full responses; an append page never carries them.
pub fn assemble(
    response: &SearchResponse<RawDoc>,
    page: Page,
    facets: Option<FacetSummary>,
) -> Result<SearchResult> {
    let hits = response
        .hits
        .hits
        .iter()
        .map(|hit| project(&hit.source))
        .collect::<Result<Vec<_>>>()?;

    let total = response.hits.total.value();

    Ok(SearchResult {
        total,
        hits,
        elapsed_ms: response.took,
        facets: match page.shape {
            ResponseShape::Full => facets,
            ResponseShape::Append => None,
        },
        window: page.window,
        next: page.window.next_offset(total),
    })
}
