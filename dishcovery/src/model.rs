use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use esdsl::Fuzziness;

use crate::{
    error::{Error, Result},
    pagination::Window,
};

/// A scalar as clients actually send it: forms only know strings,
/// json clients send whatever they feel like
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Loose {
    Flag(bool),
    Number(i64),
    Text(String),
    /// Fractions, arrays, objects: never a usable value
    Other(Value),
}

impl From<&str> for Loose {
    fn from(src: &str) -> Self {
        Loose::Text(src.to_owned())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// The search request, before any validation
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct RawSearchRequest {
    pub query: Option<String>,
    pub fuzziness: Option<Loose>,
    pub cuisines: Option<OneOrMany>,
    pub difficulty: Option<String>,
    pub max_prep_time: Option<Loose>,
    pub max_cook_time: Option<Loose>,
    pub is_vegan: Option<Loose>,
    pub is_vegetarian: Option<Loose>,
    pub is_gluten_free: Option<Loose>,
    pub is_dairy_free: Option<Loose>,
    pub is_nut_free: Option<Loose>,
    pub min_healthiness: Option<Loose>,
    pub max_healthiness: Option<Loose>,
    pub size: Option<Loose>,
    pub from: Option<Loose>,
    pub include_aggregations: Option<Loose>,
    pub append: Option<Loose>,
}

impl RawSearchRequest {
    pub fn from_json(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::validation("body", e.to_string()))
    }

    /// Reads an urlencoded form; repeated `cuisines` keys add up
    pub fn from_form(body: &[u8]) -> Result<Self> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
            .map_err(|e| Error::validation("body", e.to_string()))?;

        let mut request = RawSearchRequest::default();
        let mut cuisines = Vec::new();

        for (key, value) in pairs {
            let loose = Some(Loose::Text(value.clone()));
            match key.as_str() {
                "query" => request.query = Some(value),
                "fuzziness" => request.fuzziness = loose,
                "cuisines" | "cuisines[]" => cuisines.push(value),
                "difficulty" => request.difficulty = Some(value),
                "max_prep_time" => request.max_prep_time = loose,
                "max_cook_time" => request.max_cook_time = loose,
                "is_vegan" => request.is_vegan = loose,
                "is_vegetarian" => request.is_vegetarian = loose,
                "is_gluten_free" => request.is_gluten_free = loose,
                "is_dairy_free" => request.is_dairy_free = loose,
                "is_nut_free" => request.is_nut_free = loose,
                "min_healthiness" => request.min_healthiness = loose,
                "max_healthiness" => request.max_healthiness = loose,
                "size" => request.size = loose,
                "from" => request.from = loose,
                "include_aggregations" => request.include_aggregations = loose,
                "append" => request.append = loose,
                other => log::debug!("Ignoring unknown form field {:?}", other),
            }
        }

        if !cuisines.is_empty() {
            request.cuisines = Some(OneOrMany::Many(cuisines));
        }

        Ok(request)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const VALUES: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(src: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = src.trim();
        Self::VALUES
            .iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("expected easy, medium or hard, got {:?}", wanted))
    }
}

/// Tri-state dietary requirements: `None` means "don't care"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DietaryFlags {
    pub vegan: Option<bool>,
    pub vegetarian: Option<bool>,
    pub gluten_free: Option<bool>,
    pub dairy_free: Option<bool>,
    pub nut_free: Option<bool>,
}

impl DietaryFlags {
    /// Each flag under its index field name
    pub fn by_field(&self) -> [(&'static str, Option<bool>); 5] {
        [
            ("is_vegan", self.vegan),
            ("is_vegetarian", self.vegetarian),
            ("is_gluten_free", self.gluten_free),
            ("is_dairy_free", self.dairy_free),
            ("is_nut_free", self.nut_free),
        ]
    }
}

/// A validated search request
///
/// Facets are a property of the filter set, not of the scroll
/// position, so an appending search never includes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub text_query: Option<String>,
    pub fuzziness: Fuzziness,
    pub cuisines: Option<BTreeSet<String>>,
    pub difficulty: Option<Difficulty>,
    pub max_prep_time_min: Option<u32>,
    pub max_cook_time_min: Option<u32>,
    pub dietary: DietaryFlags,
    pub min_healthiness: Option<u32>,
    pub max_healthiness: Option<u32>,
    pub size: u32,
    pub offset: u32,
    pub(crate) include_facets: bool,
    pub(crate) is_append: bool,
}

impl Default for SearchCriteria {
    fn default() -> Self {
        Self {
            text_query: None,
            fuzziness: Fuzziness::Auto,
            cuisines: None,
            difficulty: None,
            max_prep_time_min: None,
            max_cook_time_min: None,
            dietary: DietaryFlags::default(),
            min_healthiness: None,
            max_healthiness: None,
            size: 10,
            offset: 0,
            include_facets: true,
            is_append: false,
        }
    }
}

impl SearchCriteria {
    pub fn includes_facets(&self) -> bool {
        self.include_facets && !self.is_append
    }

    pub fn is_append(&self) -> bool {
        self.is_append
    }

    pub fn with_facets(mut self, include: bool) -> Self {
        self.include_facets = include && !self.is_append;
        self
    }

    /// Switching to append mode drops facets for good
    pub fn appending(mut self, append: bool) -> Self {
        self.is_append = append;
        if append {
            self.include_facets = false;
        }
        self
    }
}

fn whole_number(number: &serde_json::Number) -> Option<u64> {
    number.as_u64().or_else(|| {
        number
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

/// Whole numbers however they were stored: `15`, `15.0` or `"15"`.
/// Anything else reads as missing.
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => whole_number(&number),
        Some(Value::String(text)) => text
            .trim()
            .parse::<serde_json::Number>()
            .ok()
            .and_then(|n| whole_number(&n)),
        _ => None,
    };

    Ok(number.and_then(|n| u32::try_from(n).ok()))
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(flag)) => Some(flag),
        Some(Value::String(text)) => match text.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    })
}

/// What a recipe looks like in a search response
///
/// Stored documents are only as tidy as whatever loaded them, so
/// numbers and flags are read leniently.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    pub recipe_title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine_list: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub est_prep_time_min: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub est_cook_time_min: Option<u32>,

    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_vegan: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_vegetarian: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_gluten_free: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_dairy_free: Option<bool>,
    #[serde(
        default,
        deserialize_with = "lenient_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub is_nut_free: Option<bool>,

    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub healthiness_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_raw: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directions_raw: Option<Vec<String>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub key: String,
    pub count: u64,
}

#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Stats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Rounded to one decimal; `None` only when there was nothing to average
    pub avg: Option<f64>,
    pub sum: Option<f64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Facet {
    Buckets(Vec<Bucket>),
    Stats(Stats),
}

/// Decoded facets, in catalog order
///
/// A facet the backend didn't report is kept as `None` (serialized as
/// `null`), which is not the same thing as an empty bucket list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetSummary {
    entries: Vec<(String, Option<Facet>)>,
}

impl FacetSummary {
    pub fn push(&mut self, name: impl Into<String>, facet: Option<Facet>) {
        self.entries.push((name.into(), facet));
    }

    pub fn get(&self, name: &str) -> Option<&Facet> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .and_then(|(_, facet)| facet.as_ref())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FacetSummary {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, facet) in &self.entries {
            map.serialize_entry(name, facet)?;
        }
        map.end()
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Everything the query matched, not just this page
    pub total: u64,
    #[serde(rename = "recipes")]
    pub hits: Vec<Recipe>,
    #[serde(rename = "took_ms")]
    pub elapsed_ms: u64,
    #[serde(rename = "aggregations", skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetSummary>,
    #[serde(flatten)]
    pub window: Window,
    /// Where the following page starts, if there is one
    #[serde(rename = "next_from", skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
}
