use esdsl::{Bounds, CompiledQuery, Filter, ScoringClause, TermValue};

use crate::{
    config::{
        SearchConfig, FIELD_COOK_TIME, FIELD_CUISINES, FIELD_DIFFICULTY, FIELD_HEALTHINESS,
        FIELD_PREP_TIME,
    },
    model::SearchCriteria,
};

fn scoring_clause(criteria: &SearchCriteria, config: &SearchConfig) -> ScoringClause {
    match &criteria.text_query {
        Some(text) if !text.is_empty() => ScoringClause::MultiMatch {
            text: text.clone(),
            fields: config.text_fields.clone(),
            fuzziness: criteria.fuzziness,
        },
        _ => ScoringClause::MatchAll,
    }
}

/// Everything that narrows the returned hits without touching facets
fn post_filters(criteria: &SearchCriteria) -> Vec<Filter> {
    let mut filters = Vec::new();

    if let Some(cuisines) = &criteria.cuisines {
        filters.push(Filter::Terms {
            field: FIELD_CUISINES.to_owned(),
            values: cuisines.iter().cloned().collect(),
        });
    }

    if let Some(difficulty) = criteria.difficulty {
        filters.push(Filter::Term {
            field: FIELD_DIFFICULTY.to_owned(),
            value: TermValue::Text(difficulty.as_str().to_owned()),
        });
    }

    if let Some(max_prep) = criteria.max_prep_time_min {
        filters.push(Filter::Range {
            field: FIELD_PREP_TIME.to_owned(),
            bounds: Bounds::at_most(u64::from(max_prep)),
        });
    }

    if let Some(max_cook) = criteria.max_cook_time_min {
        filters.push(Filter::Range {
            field: FIELD_COOK_TIME.to_owned(),
            bounds: Bounds::at_most(u64::from(max_cook)),
        });
    }

    for (field, wanted) in criteria.dietary.by_field().iter() {
        if let Some(flag) = wanted {
            filters.push(Filter::Term {
                field: (*field).to_owned(),
                value: TermValue::Bool(*flag),
            });
        }
    }

    let healthiness = Bounds {
        gte: criteria.min_healthiness.map(u64::from),
        lte: criteria.max_healthiness.map(u64::from),
    };
    if !healthiness.is_unbounded() {
        filters.push(Filter::Range {
            field: FIELD_HEALTHINESS.to_owned(),
            bounds: healthiness,
        });
    }

    filters
}

/// Translates search criteria into a backend query
///
/// Pure and deterministic: the same criteria always compile to the
/// same query. Facets are computed over whatever the scoring clause
/// matches; every other criterion becomes a post filter, so picking a
/// cuisine narrows the hits but leaves the cuisine counts alone.
pub fn compile(criteria: &SearchCriteria, config: &SearchConfig) -> CompiledQuery {
    let with_facets = criteria.includes_facets();

    CompiledQuery {
        scoring: scoring_clause(criteria, config),
        derived_fields: if with_facets {
            config.derived_fields.clone()
        } else {
            Vec::new()
        },
        post_filters: post_filters(criteria),
        facets: if with_facets {
            Some(config.facets.clone())
        } else {
            None
        },
        size: criteria.size,
        offset: criteria.offset,
    }
}

/// A match-everything query that only asks for the facet catalog
pub fn compile_overview(config: &SearchConfig) -> CompiledQuery {
    CompiledQuery::facets_only(config.facets.clone(), config.derived_fields.clone())
}
