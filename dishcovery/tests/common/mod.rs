#![allow(dead_code)]

use std::{sync::Mutex, time::Duration};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

use dishcovery::{
    gateway::{Gateway, RawDoc},
    Error, Result,
};
use esdsl::{
    bulk::BulkOutcome,
    response::{ClusterHealth, SearchResponse},
    CompiledQuery,
};

pub const TOTAL: u64 = 120;

/// What the backend answers to a first-page search
pub static FULL_RESPONSE: Lazy<Value> = Lazy::new(|| {
    json!({
        "took": 12,
        "hits": {
            "total": { "value": TOTAL, "relation": "eq" },
            "hits": [
                {
                    "_id": "1",
                    "_source": {
                        "recipe_title": "Green Curry",
                        "cuisine_list": ["thai"],
                        "difficulty": "easy",
                        "est_prep_time_min": 15,
                        "est_cook_time_min": 20,
                        "is_vegan": true,
                        "healthiness_score": 72,
                        "ingredient_text": "not part of the projection"
                    }
                },
                {
                    "_id": "2",
                    "_source": {
                        "recipe_title": "Pad Thai",
                        "cuisine_list": ["thai"],
                        "difficulty": "medium"
                    }
                }
            ]
        },
        "aggregations": {
            "cuisines": {
                "buckets": [
                    { "key": "italian", "doc_count": 40 },
                    { "key": "thai", "doc_count": 120 }
                ]
            },
            "difficulty_levels": {
                "buckets": [
                    { "key": "easy", "doc_count": 70 },
                    { "key": "medium", "doc_count": 50 }
                ]
            },
            "dietary_profiles": { "buckets": [] },
            "healthiness_stats": {
                "count": 120, "min": 20.0, "max": 95.0, "avg": 61.26, "sum": 7351.2
            },
            "prep_time_ranges": {
                "buckets": [
                    { "key": "0-15 min", "to": 15.0, "doc_count": 30 },
                    { "key": "15-30 min", "from": 15.0, "to": 30.0, "doc_count": 90 }
                ]
            },
            "cook_time_ranges": { "buckets": [] }
        }
    })
});

pub fn page_response(titles: &[&str]) -> Value {
    json!({
        "took": 3,
        "hits": {
            "total": { "value": TOTAL, "relation": "eq" },
            "hits": titles
                .iter()
                .map(|title| json!({ "_id": title, "_source": { "recipe_title": title } }))
                .collect::<Vec<_>>(),
        }
    })
}

/// A backend that answers every search with a canned payload and
/// remembers the wire bodies it was sent
pub struct RecordingGateway {
    answer: Value,
    delay: Option<Duration>,
    failure: Option<fn() -> Error>,
    pub sent: Mutex<Vec<Value>>,
}

impl RecordingGateway {
    pub fn answering(answer: Value) -> Self {
        Self {
            answer,
            delay: None,
            failure: None,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(answer: Value, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::answering(answer)
        }
    }

    pub fn failing(failure: fn() -> Error) -> Self {
        Self {
            failure: Some(failure),
            ..Self::answering(Value::Null)
        }
    }

    pub fn last_sent(&self) -> Value {
        self.sent
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("at least one search was sent")
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn exists(&self, index: &str) -> Result<bool> {
        Ok(index == "recipes")
    }

    async fn create_index(&self, _index: &str, _mapping: &Value) -> Result<()> {
        Ok(())
    }

    async fn search(&self, _index: &str, query: &CompiledQuery) -> Result<SearchResponse<RawDoc>> {
        self.sent.lock().unwrap().push(query.to_wire());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = self.failure {
            return Err(failure());
        }

        Ok(serde_json::from_value(self.answer.clone())?)
    }

    async fn bulk_index(&self, _index: &str, records: &[RawDoc]) -> Result<BulkOutcome> {
        Ok(BulkOutcome {
            succeeded: records.len(),
            failed: Vec::new(),
        })
    }

    async fn health(&self) -> ClusterHealth {
        serde_json::from_value(json!({
            "status": "green",
            "cluster_name": "test",
            "number_of_nodes": 1
        }))
        .unwrap()
    }
}
