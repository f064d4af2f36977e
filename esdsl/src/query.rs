use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// How many edits a fuzzy text match tolerates per term
///
/// `Auto` lets the backend pick the distance based on the term length,
/// which is what you want most of the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Fuzziness {
    Zero,
    One,
    Two,
    #[default]
    Auto,
}

impl Fuzziness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::Two => "2",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for Fuzziness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Fuzziness {
    type Err = String;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        match src.trim() {
            "0" => Ok(Self::Zero),
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            auto if auto.eq_ignore_ascii_case("auto") => Ok(Self::Auto),
            other => Err(format!("expected one of 0, 1, 2 or AUTO, got {:?}", other)),
        }
    }
}

/// A text field taking part in a multi-field match, with its weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostedField {
    pub name: String,
    #[serde(default = "default_boost")]
    pub boost: u32,
}

fn default_boost() -> u32 {
    1
}

impl BoostedField {
    pub fn new(name: impl Into<String>, boost: u32) -> Self {
        Self {
            name: name.into(),
            boost,
        }
    }
}

impl fmt::Display for BoostedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.boost == 1 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}^{}", self.name, self.boost)
        }
    }
}

/// The part of a query that decides which documents match and how
/// they rank
///
/// Whatever matches the scoring clause is the population every facet
/// is computed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoringClause {
    MatchAll,
    MultiMatch {
        text: String,
        fields: Vec<BoostedField>,
        fuzziness: Fuzziness,
    },
}

impl ScoringClause {
    pub fn to_wire(&self) -> Value {
        match self {
            Self::MatchAll => json!({ "match_all": {} }),
            Self::MultiMatch {
                text,
                fields,
                fuzziness,
            } => json!({
                "multi_match": {
                    "query": text,
                    "fields": fields.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "type": "best_fields",
                    "fuzziness": fuzziness.as_str(),
                }
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermValue {
    Text(String),
    Bool(bool),
}

impl TermValue {
    fn to_wire(&self) -> Value {
        match self {
            Self::Text(text) => Value::from(text.as_str()),
            Self::Bool(flag) => Value::from(*flag),
        }
    }
}

/// Inclusive bounds for a numeric range filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Bounds {
    pub gte: Option<u64>,
    pub lte: Option<u64>,
}

impl Bounds {
    pub fn at_most(lte: u64) -> Self {
        Self {
            gte: None,
            lte: Some(lte),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.gte.is_none() && self.lte.is_none()
    }

    pub fn contains(&self, value: u64) -> bool {
        self.gte.map_or(true, |gte| value >= gte) && self.lte.map_or(true, |lte| value <= lte)
    }
}

/// A non-scoring restriction over a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Matches when the field holds any of the values
    Terms { field: String, values: Vec<String> },
    /// Matches when the field holds exactly the value
    Term { field: String, value: TermValue },
    Range { field: String, bounds: Bounds },
}

impl Filter {
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Terms { field, values } => json!({ "terms": { field.as_str(): values } }),
            Self::Term { field, value } => json!({ "term": { field.as_str(): value.to_wire() } }),
            Self::Range { field, bounds } => {
                let mut range = serde_json::Map::new();
                if let Some(gte) = bounds.gte {
                    range.insert("gte".to_owned(), Value::from(gte));
                }
                if let Some(lte) = bounds.lte {
                    range.insert("lte".to_owned(), Value::from(lte));
                }
                json!({ "range": { field.as_str(): range } })
            }
        }
    }
}
