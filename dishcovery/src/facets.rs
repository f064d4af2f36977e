use std::collections::HashMap;

use esdsl::{
    response::{RawAggregation, RawStats},
    NamedFacet,
};

use crate::{
    error::{Error, Result},
    model::{Bucket, Facet, FacetSummary, Stats},
};

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn decode_stats(raw: &RawStats) -> Stats {
    Stats {
        min: raw.min,
        max: raw.max,
        // A zero average is a real average, only a missing one isn't
        avg: raw.avg.map(round_to_tenth),
        sum: raw.sum,
    }
}

/// Decodes the backend's aggregation payload into typed facets
///
/// Walks the requested `catalog` in order: facets missing from the
/// payload are reported as `None`, bucketed ones keep the order the
/// backend returned them in.
pub fn decode(
    payload: Option<&HashMap<String, RawAggregation>>,
    catalog: &[NamedFacet],
) -> Result<FacetSummary> {
    let mut summary = FacetSummary::default();

    for facet in catalog {
        let decoded = match payload.and_then(|aggs| aggs.get(&facet.name)) {
            None => None,
            Some(RawAggregation::Buckets { buckets }) if facet.request.is_bucketed() => {
                Some(Facet::Buckets(
                    buckets
                        .iter()
                        .map(|bucket| Bucket {
                            key: bucket.label(),
                            count: bucket.doc_count,
                        })
                        .collect(),
                ))
            }
            Some(RawAggregation::Stats(stats)) if !facet.request.is_bucketed() => {
                Some(Facet::Stats(decode_stats(stats)))
            }
            Some(other) => {
                return Err(Error::Decode(format!(
                    "facet {:?} came back as {}",
                    facet.name,
                    match other {
                        RawAggregation::Buckets { .. } => "buckets, expected stats",
                        RawAggregation::Stats(_) => "stats, expected buckets",
                    }
                )))
            }
        };

        summary.push(facet.name.as_str(), decoded);
    }

    Ok(summary)
}
