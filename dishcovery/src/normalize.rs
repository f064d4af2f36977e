use std::collections::BTreeSet;

use esdsl::Fuzziness;

use crate::{
    config::SearchConfig,
    error::{Error, Result},
    model::{DietaryFlags, Difficulty, Loose, OneOrMany, RawSearchRequest, SearchCriteria},
};

/// `"true"`/`"false"` and actual booleans; anything else means absent
fn flag(value: &Option<Loose>) -> Option<bool> {
    match value.as_ref()? {
        Loose::Flag(flag) => Some(*flag),
        Loose::Text(text) => match text.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Loose::Number(_) | Loose::Other(_) => None,
    }
}

/// Integers and integer-looking strings; anything else means absent
fn int(value: &Option<Loose>) -> Option<i64> {
    match value.as_ref()? {
        Loose::Number(number) => Some(*number),
        Loose::Text(text) => text.trim().parse().ok(),
        Loose::Flag(_) | Loose::Other(_) => None,
    }
}

fn minutes(field: &'static str, value: &Option<Loose>) -> Result<Option<u32>> {
    match int(value) {
        None => Ok(None),
        Some(n) if n < 0 => Err(Error::validation(field, "must not be negative")),
        Some(n) => Ok(Some(u32::try_from(n).unwrap_or(u32::MAX))),
    }
}

fn healthiness(field: &'static str, value: &Option<Loose>) -> Result<Option<u32>> {
    match int(value) {
        None => Ok(None),
        Some(n @ 0..=100) => Ok(Some(n as u32)),
        Some(n) => Err(Error::validation(
            field,
            format!("must be within 0 and 100, got {}", n),
        )),
    }
}

fn fuzziness(value: &Option<Loose>) -> Result<Fuzziness> {
    let text = match value {
        None => return Ok(Fuzziness::Auto),
        Some(Loose::Text(text)) if text.trim().is_empty() => return Ok(Fuzziness::Auto),
        Some(Loose::Text(text)) => text.clone(),
        Some(Loose::Number(n)) => n.to_string(),
        Some(Loose::Flag(flag)) => flag.to_string(),
        Some(Loose::Other(value)) => value.to_string(),
    };

    text.parse()
        .map_err(|reason| Error::validation("fuzziness", reason))
}

fn cuisines(value: Option<OneOrMany>) -> Option<BTreeSet<String>> {
    let names = match value? {
        OneOrMany::One(name) => vec![name],
        OneOrMany::Many(names) => names,
    };

    let set = names
        .into_iter()
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>();

    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

fn clamp(value: i64, max: u32) -> u32 {
    value.clamp(0, i64::from(max)) as u32
}

/// Turns a loosely typed request into validated search criteria
///
/// Malformed booleans and integers are treated as absent, sizes and
/// offsets are clamped into range. Only values that can't mean
/// anything sensible (an unknown difficulty, a healthiness of 300, a
/// page past the backend's result window) are rejected.
pub fn normalize(raw: RawSearchRequest, config: &SearchConfig) -> Result<SearchCriteria> {
    let text_query = raw
        .query
        .map(|q| q.trim().to_owned())
        .filter(|q| !q.is_empty());

    let difficulty = match raw.difficulty.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(
            name.parse::<Difficulty>()
                .map_err(|reason| Error::validation("difficulty", reason))?,
        ),
    };

    let mut min_healthiness = healthiness("min_healthiness", &raw.min_healthiness)?;
    if let Some(min) = min_healthiness {
        if min <= config.min_healthiness_floor {
            log::debug!(
                "Dropping min_healthiness={} (must be above {})",
                min,
                config.min_healthiness_floor
            );
            min_healthiness = None;
        }
    }

    let mut max_healthiness = healthiness("max_healthiness", &raw.max_healthiness)?;
    if let Some(max) = max_healthiness {
        if max >= config.max_healthiness_ceiling {
            log::debug!(
                "Dropping max_healthiness={} (must be below {})",
                max,
                config.max_healthiness_ceiling
            );
            max_healthiness = None;
        }
    }

    if let (Some(min), Some(max)) = (min_healthiness, max_healthiness) {
        if min > max {
            return Err(Error::validation(
                "min_healthiness",
                format!("{} is greater than max_healthiness {}", min, max),
            ));
        }
    }

    let is_append = flag(&raw.append).unwrap_or(false);
    let include_facets = flag(&raw.include_aggregations).unwrap_or(!is_append);

    let criteria = SearchCriteria {
        text_query,
        fuzziness: fuzziness(&raw.fuzziness)?,
        cuisines: cuisines(raw.cuisines),
        difficulty,
        max_prep_time_min: minutes("max_prep_time", &raw.max_prep_time)?,
        max_cook_time_min: minutes("max_cook_time", &raw.max_cook_time)?,
        dietary: DietaryFlags {
            vegan: flag(&raw.is_vegan),
            vegetarian: flag(&raw.is_vegetarian),
            gluten_free: flag(&raw.is_gluten_free),
            dairy_free: flag(&raw.is_dairy_free),
            nut_free: flag(&raw.is_nut_free),
        },
        min_healthiness,
        max_healthiness,
        size: int(&raw.size).map_or(config.default_size, |size| clamp(size, config.max_size)),
        offset: int(&raw.from).map_or(0, |from| clamp(from, u32::MAX)),
        ..SearchCriteria::default()
    };

    let window_end = u64::from(criteria.offset) + u64::from(criteria.size);
    if window_end > u64::from(config.max_result_window) {
        return Err(Error::validation(
            "from",
            format!(
                "from + size must not exceed {}, got {} + {}",
                config.max_result_window, criteria.offset, criteria.size
            ),
        ));
    }

    Ok(criteria.appending(is_append).with_facets(include_facets))
}

#[cfg(test)]
mod tests {
    use super::*;

    use quickcheck::quickcheck;

    fn run(raw: RawSearchRequest) -> Result<SearchCriteria> {
        normalize(raw, &SearchConfig::default())
    }

    fn text(value: &str) -> Option<Loose> {
        Some(Loose::from(value))
    }

    #[test]
    fn defaults() {
        let criteria = run(RawSearchRequest::default()).unwrap();

        assert_eq!(None, criteria.text_query);
        assert_eq!(Fuzziness::Auto, criteria.fuzziness);
        assert_eq!(10, criteria.size);
        assert_eq!(0, criteria.offset);
        assert!(criteria.includes_facets());
        assert!(!criteria.is_append());
    }

    #[test]
    fn size_and_offset_are_clamped() {
        let criteria = run(RawSearchRequest {
            size: Some(Loose::Number(500)),
            from: Some(Loose::Number(-5)),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(50, criteria.size);
        assert_eq!(0, criteria.offset);

        let criteria = run(RawSearchRequest {
            size: Some(Loose::Number(-1)),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(0, criteria.size);
    }

    #[test]
    fn deep_pages_are_rejected() {
        let criteria = run(RawSearchRequest {
            from: Some(Loose::Number(9_990)),
            size: Some(Loose::Number(10)),
            ..RawSearchRequest::default()
        })
        .unwrap();
        assert_eq!(9_990, criteria.offset);

        match run(RawSearchRequest {
            from: Some(Loose::Number(20_000)),
            ..RawSearchRequest::default()
        }) {
            Err(Error::Validation { field, .. }) => assert_eq!("from", field),
            other => panic!("expected from to be rejected, got {:?}", other),
        }

        let narrow = SearchConfig {
            max_result_window: 100,
            ..SearchConfig::default()
        };
        assert!(normalize(
            RawSearchRequest {
                from: Some(Loose::from("95")),
                ..RawSearchRequest::default()
            },
            &narrow
        )
        .is_err());
    }

    #[test]
    fn fractional_and_odd_scalars_are_absent() {
        let raw = RawSearchRequest::from_json(
            br#"{"size": 10.0, "from": 1e3, "is_vegan": 1.5, "max_prep_time": [30], "append": {}}"#,
        )
        .unwrap();
        let criteria = run(raw).unwrap();

        assert_eq!(10, criteria.size);
        assert_eq!(0, criteria.offset);
        assert_eq!(None, criteria.dietary.vegan);
        assert_eq!(None, criteria.max_prep_time_min);
        assert!(!criteria.is_append());
    }

    #[test]
    fn fractional_fuzziness_names_the_field() {
        let raw = RawSearchRequest::from_json(br#"{"fuzziness": 1.5}"#).unwrap();

        match run(raw) {
            Err(Error::Validation { field, .. }) => assert_eq!("fuzziness", field),
            other => panic!("expected fuzziness to be rejected, got {:?}", other),
        }
    }

    quickcheck! {
        fn size_always_within_bounds(size: i64, from: i64) -> bool {
            match run(RawSearchRequest {
                size: Some(Loose::Number(size)),
                from: Some(Loose::Number(from)),
                ..RawSearchRequest::default()
            }) {
                Ok(criteria) => criteria.size <= 50 && (from > 0 || criteria.offset == 0),
                Err(_) => from > 9_950,
            }
        }

        fn pages_stay_inside_the_result_window(size: i64, from: i64) -> bool {
            let result = run(RawSearchRequest {
                size: Some(Loose::Number(size)),
                from: Some(Loose::Number(from)),
                ..RawSearchRequest::default()
            });

            let end = from.max(0) + size.clamp(0, 50);
            match result {
                Ok(criteria) => end <= 10_000 && criteria.offset as i64 + criteria.size as i64 == end,
                Err(Error::Validation { field, .. }) => end > 10_000 && field == "from",
                Err(_) => false,
            }
        }

        fn malformed_flags_are_absent(junk: String) -> bool {
            let criteria = run(RawSearchRequest {
                is_vegan: Some(Loose::Text(junk.clone())),
                ..RawSearchRequest::default()
            })
            .unwrap();

            let expected = match junk.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            };

            criteria.dietary.vegan == expected
        }
    }

    #[test]
    fn tri_state_parsing() {
        let criteria = run(RawSearchRequest {
            is_vegan: text("true"),
            is_vegetarian: text("false"),
            is_gluten_free: text("yes"),
            is_dairy_free: Some(Loose::Flag(true)),
            max_prep_time: text(" 30 "),
            max_cook_time: text("soon"),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(Some(true), criteria.dietary.vegan);
        assert_eq!(Some(false), criteria.dietary.vegetarian);
        assert_eq!(None, criteria.dietary.gluten_free);
        assert_eq!(Some(true), criteria.dietary.dairy_free);
        assert_eq!(None, criteria.dietary.nut_free);
        assert_eq!(Some(30), criteria.max_prep_time_min);
        assert_eq!(None, criteria.max_cook_time_min);
    }

    #[test]
    fn blank_query_matches_everything() {
        let criteria = run(RawSearchRequest {
            query: Some("   ".to_owned()),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(None, criteria.text_query);

        let criteria = run(RawSearchRequest {
            query: Some(" pasta ".to_owned()),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(Some("pasta".to_owned()), criteria.text_query);
    }

    #[test]
    fn healthiness_admission() {
        let bounds = |min: i64, max: i64| {
            let criteria = run(RawSearchRequest {
                min_healthiness: Some(Loose::Number(min)),
                max_healthiness: Some(Loose::Number(max)),
                ..RawSearchRequest::default()
            })
            .unwrap();
            (criteria.min_healthiness, criteria.max_healthiness)
        };

        assert_eq!((None, None), bounds(16, 100));
        assert_eq!((Some(17), Some(99)), bounds(17, 99));
        assert_eq!((None, Some(50)), bounds(0, 50));
    }

    #[test]
    fn healthiness_thresholds_are_configurable() {
        let config = SearchConfig {
            min_healthiness_floor: 0,
            max_healthiness_ceiling: 101,
            ..SearchConfig::default()
        };

        let criteria = normalize(
            RawSearchRequest {
                min_healthiness: text("5"),
                max_healthiness: text("100"),
                ..RawSearchRequest::default()
            },
            &config,
        )
        .unwrap();

        assert_eq!(Some(5), criteria.min_healthiness);
        assert_eq!(Some(100), criteria.max_healthiness);
    }

    #[test]
    fn invalid_values_name_the_field() {
        let field_of = |raw| match run(raw) {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        };

        assert_eq!(
            "difficulty",
            field_of(RawSearchRequest {
                difficulty: Some("extreme".to_owned()),
                ..RawSearchRequest::default()
            })
        );
        assert_eq!(
            "fuzziness",
            field_of(RawSearchRequest {
                fuzziness: text("7"),
                ..RawSearchRequest::default()
            })
        );
        assert_eq!(
            "max_healthiness",
            field_of(RawSearchRequest {
                max_healthiness: Some(Loose::Number(300)),
                ..RawSearchRequest::default()
            })
        );
        assert_eq!(
            "min_healthiness",
            field_of(RawSearchRequest {
                min_healthiness: text("80"),
                max_healthiness: text("40"),
                ..RawSearchRequest::default()
            })
        );
        assert_eq!(
            "max_prep_time",
            field_of(RawSearchRequest {
                max_prep_time: Some(Loose::Number(-10)),
                ..RawSearchRequest::default()
            })
        );
    }

    #[test]
    fn append_forces_facets_off() {
        let criteria = run(RawSearchRequest {
            append: text("true"),
            include_aggregations: Some(Loose::Flag(true)),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert!(criteria.is_append());
        assert!(!criteria.includes_facets());

        let criteria = run(RawSearchRequest {
            include_aggregations: text("false"),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert!(!criteria.includes_facets());
    }

    #[test]
    fn cuisines_are_deduplicated() {
        let criteria = run(RawSearchRequest {
            cuisines: Some(OneOrMany::Many(vec![
                "thai".to_owned(),
                " italian ".to_owned(),
                "thai".to_owned(),
                "".to_owned(),
            ])),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(
            Some(vec!["italian".to_owned(), "thai".to_owned()]),
            criteria.cuisines.map(|set| set.into_iter().collect::<Vec<_>>())
        );

        let criteria = run(RawSearchRequest {
            cuisines: Some(OneOrMany::Many(Vec::new())),
            ..RawSearchRequest::default()
        })
        .unwrap();

        assert_eq!(None, criteria.cuisines);
    }
}
