use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::response::ErrorCause;

/// Renders documents as a newline-delimited `_bulk` index body
pub fn encode_index_actions<D: Serialize>(index: &str, docs: &[D]) -> serde_json::Result<String> {
    let action = serde_json::to_string(&json!({ "index": { "_index": index } }))?;

    let mut body = String::with_capacity(docs.len() * 256);
    for doc in docs {
        body.push_str(&action);
        body.push('\n');
        body.push_str(&serde_json::to_string(doc)?);
        body.push('\n');
    }

    Ok(body)
}

#[derive(Deserialize, Debug, Clone)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BulkItem {
    pub status: u16,
    #[serde(default)]
    pub error: Option<ErrorCause>,
}

/// A document the backend refused to index
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FailedItem {
    /// Position of the document within the submitted batch
    pub position: usize,
    pub status: u16,
    pub reason: String,
}

/// How a bulk request went: partial failures are reported, not raised
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkOutcome {
    pub succeeded: usize,
    pub failed: Vec<FailedItem>,
}

impl BulkOutcome {
    /// Folds a later batch into this outcome
    ///
    /// `position_of` maps a position within `other` to the position
    /// reported in the merged outcome.
    pub fn merge<F>(&mut self, other: BulkOutcome, position_of: F)
    where
        F: Fn(usize) -> usize,
    {
        self.succeeded += other.succeeded;
        self.failed
            .extend(other.failed.into_iter().map(|item| FailedItem {
                position: position_of(item.position),
                ..item
            }));
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl From<BulkResponse> for BulkOutcome {
    fn from(response: BulkResponse) -> Self {
        let mut outcome = BulkOutcome::default();

        for (position, item) in response.items.into_iter().enumerate() {
            // Every item is keyed by its action name, a single entry
            for result in item.into_values() {
                match result.error {
                    None if result.status < 300 => outcome.succeeded += 1,
                    error => {
                        let reason = error
                            .and_then(|cause| cause.reason.or(cause.kind))
                            .unwrap_or_else(|| format!("status {}", result.status));
                        outcome.failed.push(FailedItem {
                            position,
                            status: result.status,
                            reason,
                        });
                    }
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_actions_are_newline_delimited() {
        let body = encode_index_actions("recipes", &[json!({ "a": 1 }), json!({ "a": 2 })]).unwrap();

        assert_eq!(
            "{\"index\":{\"_index\":\"recipes\"}}\n{\"a\":1}\n\
             {\"index\":{\"_index\":\"recipes\"}}\n{\"a\":2}\n",
            body
        );
    }

    #[test]
    fn partial_failures_are_collected() {
        let response: BulkResponse = serde_json::from_value(json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_index": "recipes", "status": 201 } },
                { "index": { "_index": "recipes", "status": 400, "error": {
                    "type": "mapper_parsing_exception",
                    "reason": "failed to parse field [healthiness_score]",
                } } },
                { "index": { "_index": "recipes", "status": 201 } },
            ],
        }))
        .unwrap();

        let outcome = BulkOutcome::from(response);

        assert_eq!(2, outcome.succeeded);
        assert_eq!(
            vec![FailedItem {
                position: 1,
                status: 400,
                reason: "failed to parse field [healthiness_score]".to_owned(),
            }],
            outcome.failed
        );
        assert!(!outcome.is_complete());
    }

    #[test]
    fn merging_shifts_positions() {
        let mut total = BulkOutcome {
            succeeded: 10,
            failed: Vec::new(),
        };

        total.merge(
            BulkOutcome {
                succeeded: 1,
                failed: vec![FailedItem {
                    position: 2,
                    status: 429,
                    reason: "busy".to_owned(),
                }],
            },
            |position| position + 500,
        );

        assert_eq!(11, total.succeeded);
        assert_eq!(502, total.failed[0].position);
    }
}
