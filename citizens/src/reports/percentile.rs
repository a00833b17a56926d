//! Age percentiles per town.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Citizen;

/// Age distribution of one town.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TownAgeStats {
    pub town: String,
    pub p50: f64,
    pub p75: f64,
    pub p99: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The `k`-th percentile of `values` with linear interpolation between the
/// closest ranks, rounded to two decimals. `None` for empty input.
pub fn percentile(values: &[i32], k: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let index = (sorted.len() - 1) as f64 * k / 100.0;
    let low = index.floor() as usize;
    let fraction = round2(index - index.floor());
    if fraction == 0.0 || low + 1 >= sorted.len() {
        return Some(f64::from(sorted[low]));
    }

    let lower = f64::from(sorted[low]);
    let upper = f64::from(sorted[low + 1]);
    Some(round2(lower + fraction * (upper - lower)))
}

/// p50, p75 and p99 of citizen ages on `today`, grouped by town and ordered by
/// town name.
pub fn town_age_percentiles(citizens: &[Citizen], today: NaiveDate) -> Vec<TownAgeStats> {
    let mut towns: BTreeMap<&str, Vec<i32>> = BTreeMap::new();
    for citizen in citizens {
        towns
            .entry(citizen.town.as_str())
            .or_default()
            .push(citizen.age_on(today));
    }

    towns
        .into_iter()
        .filter_map(|(town, ages)| {
            Some(TownAgeStats {
                town: town.to_string(),
                p50: percentile(&ages, 50.0)?,
                p75: percentile(&ages, 75.0)?,
                p99: percentile(&ages, 99.0)?,
            })
        })
        .collect()
}
