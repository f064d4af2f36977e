use std::mem;

use serde_json::Value;

use esdsl::bulk::BulkOutcome;

use crate::{
    error::{Error, Result},
    gateway::{Gateway, RawDoc},
};

/// Mapping used when creating the recipe index from scratch
pub const DEFAULT_MAPPING: &str = include_str!("../resources/index-mapping.json");

pub fn default_mapping() -> Result<Value> {
    Ok(serde_json::from_str(DEFAULT_MAPPING)?)
}

/// Creates `index` with `mapping` unless it already exists
///
/// Returns whether the index was created.
pub async fn ensure_index(gateway: &dyn Gateway, index: &str, mapping: &Value) -> Result<bool> {
    if gateway.exists(index).await? {
        log::info!("Index {} already exists, keeping its mapping", index);
        Ok(false)
    } else {
        gateway.create_index(index, mapping).await?;
        Ok(true)
    }
}

/// Parses one input line into a document. Blank lines yield `None`.
pub fn decode_line(line: &str) -> Result<Option<RawDoc>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match serde_json::from_str::<Value>(line)? {
        doc @ Value::Object(_) => Ok(Some(doc)),
        _ => Err(Error::Decode("recipe must be a json object".to_owned())),
    }
}

/// Accumulates documents and ships them to the backend in batches
///
/// Every document carries a tag (typically its input line number) and
/// failures in the final outcome are reported by tag instead of by
/// position within a batch.
pub struct BatchLoader<'a> {
    gateway: &'a dyn Gateway,
    index: &'a str,
    batch_size: usize,
    docs: Vec<RawDoc>,
    tags: Vec<usize>,
    outcome: BulkOutcome,
    batches: usize,
}

impl<'a> BatchLoader<'a> {
    pub fn new(gateway: &'a dyn Gateway, index: &'a str, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            gateway,
            index,
            batch_size,
            docs: Vec::with_capacity(batch_size),
            tags: Vec::with_capacity(batch_size),
            outcome: BulkOutcome::default(),
            batches: 0,
        }
    }

    pub async fn push(&mut self, tag: usize, doc: RawDoc) -> Result<()> {
        self.docs.push(doc);
        self.tags.push(tag);

        if self.docs.len() >= self.batch_size {
            self.flush().await?;
        }

        Ok(())
    }

    pub async fn flush(&mut self) -> Result<()> {
        if self.docs.is_empty() {
            return Ok(());
        }

        let docs = mem::replace(&mut self.docs, Vec::with_capacity(self.batch_size));
        let tags = mem::replace(&mut self.tags, Vec::with_capacity(self.batch_size));

        let batch = self.gateway.bulk_index(self.index, &docs).await?;
        self.batches += 1;

        for failed in &batch.failed {
            log::warn!(
                "Recipe #{} rejected with status {}: {}",
                tags.get(failed.position).copied().unwrap_or(failed.position),
                failed.status,
                failed.reason
            );
        }

        self.outcome.merge(batch, |position| {
            tags.get(position).copied().unwrap_or(position)
        });

        log::info!(
            "Loader: {} batches, {} indexed, {} rejected so far",
            self.batches,
            self.outcome.succeeded,
            self.outcome.failed.len()
        );

        Ok(())
    }

    pub async fn finish(mut self) -> Result<BulkOutcome> {
        self.flush().await?;
        Ok(self.outcome)
    }
}
