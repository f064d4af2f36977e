use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use esdsl::{BoostedField, DerivedField, FacetRequest, KeyOrder, NamedFacet, RangeBoundary};

use crate::error::{Error, Result};

pub const FIELD_TITLE: &str = "recipe_title";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_INGREDIENT_TEXT: &str = "ingredient_text";
pub const FIELD_DIRECTIONS_TEXT: &str = "directions_text";
pub const FIELD_CUISINES: &str = "cuisine_list.keyword";
pub const FIELD_DIFFICULTY: &str = "difficulty.keyword";
pub const FIELD_DIETARY_PROFILE: &str = "dietary_profile.keyword";
pub const FIELD_PREP_TIME: &str = "est_prep_time_min";
pub const FIELD_COOK_TIME: &str = "est_cook_time_min";
pub const FIELD_TOTAL_TIME: &str = "total_time_min";
pub const FIELD_HEALTHINESS: &str = "healthiness_score";

/// Everything the compiler and decoder need to know about the index
///
/// Built once at startup and shared read-only between requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Fields a text query is matched against, with their weight
    pub text_fields: Vec<BoostedField>,
    /// Facets computed for every full response, in reporting order
    pub facets: Vec<NamedFacet>,
    /// Query-time fields registered whenever facets are requested
    pub derived_fields: Vec<DerivedField>,
    pub default_size: u32,
    pub max_size: u32,
    /// A minimum healthiness is only admitted when strictly above this
    pub min_healthiness_floor: u32,
    /// A maximum healthiness is only admitted when strictly below this
    pub max_healthiness_ceiling: u32,
    /// How deep the backend lets a query page (`from + size`)
    pub max_result_window: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            text_fields: vec![
                BoostedField::new(FIELD_TITLE, 4),
                BoostedField::new(FIELD_DESCRIPTION, 2),
                BoostedField::new(FIELD_INGREDIENT_TEXT, 1),
                BoostedField::new(FIELD_DIRECTIONS_TEXT, 1),
            ],
            facets: recipe_facets(),
            derived_fields: vec![DerivedField::sum_of(
                FIELD_TOTAL_TIME,
                [FIELD_PREP_TIME, FIELD_COOK_TIME],
            )],
            default_size: 10,
            max_size: 50,
            min_healthiness_floor: 16,
            max_healthiness_ceiling: 100,
            max_result_window: 10_000,
        }
    }
}

impl SearchConfig {
    /// Reads a json config, falling back to defaults for missing keys
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: SearchConfig = serde_json::from_slice(&fs::read(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.facets.len());
        for facet in &self.facets {
            if !seen.insert(facet.name.as_str()) {
                return Err(Error::validation(
                    "facets",
                    format!("facet {:?} declared twice", facet.name),
                ));
            }
        }

        if self.text_fields.is_empty() {
            return Err(Error::validation("text_fields", "at least one is required"));
        }

        if self.default_size > self.max_size {
            return Err(Error::validation(
                "default_size",
                format!("must not exceed max_size ({})", self.max_size),
            ));
        }

        if self.max_size > self.max_result_window {
            return Err(Error::validation(
                "max_size",
                format!("must not exceed max_result_window ({})", self.max_result_window),
            ));
        }

        Ok(())
    }

    pub fn facet_names(&self) -> impl Iterator<Item = &str> {
        self.facets.iter().map(|facet| facet.name.as_str())
    }
}

fn terms(field: &str, max_buckets: u32) -> FacetRequest {
    FacetRequest::Terms {
        field: field.to_owned(),
        max_buckets,
        order: KeyOrder::Asc,
    }
}

fn minute_ranges(field: &str, edges: &[u64]) -> FacetRequest {
    let mut boundaries = Vec::with_capacity(edges.len() + 1);

    let mut from = None;
    for &edge in edges {
        let label = format!("{}-{} min", from.unwrap_or(0), edge);
        boundaries.push(RangeBoundary::new(label, from, Some(edge)));
        from = Some(edge);
    }

    let last = from.unwrap_or(0);
    boundaries.push(RangeBoundary::new(format!("{}+ min", last), from, None));

    FacetRequest::Range {
        field: field.to_owned(),
        boundaries,
    }
}

fn recipe_facets() -> Vec<NamedFacet> {
    vec![
        NamedFacet::new("cuisines", terms(FIELD_CUISINES, 1000)),
        NamedFacet::new("difficulty_levels", terms(FIELD_DIFFICULTY, 50)),
        NamedFacet::new("dietary_profiles", terms(FIELD_DIETARY_PROFILE, 50)),
        NamedFacet::new(
            "healthiness_stats",
            FacetRequest::Stats {
                field: FIELD_HEALTHINESS.to_owned(),
            },
        ),
        NamedFacet::new("prep_time_ranges", minute_ranges(FIELD_PREP_TIME, &[15, 30, 60])),
        NamedFacet::new(
            "cook_time_ranges",
            minute_ranges(FIELD_COOK_TIME, &[15, 30, 45, 60, 90, 120]),
        ),
        NamedFacet::new(
            "total_time_ranges",
            minute_ranges(FIELD_TOTAL_TIME, &[30, 60, 90, 120]),
        ),
    ]
}
