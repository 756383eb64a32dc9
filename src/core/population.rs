//! Approximate population counts for individual rows.

use crate::core::row::NormalizedRow;
use std::collections::HashMap;

/// Coordinate part of a grouping key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CoordKey {
    /// Both coordinates parsed; values scaled by 10^decimals and rounded
    Rounded(i64, i64),
    /// At least one coordinate did not parse; the raw strings are compared
    Raw(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    species: String,
    locality: String,
    date: String,
    coords: CoordKey,
}

/// Largest rounding precision honored; coordinates scaled beyond it would
/// overflow the integer key.
pub const MAX_ROUND_DECIMALS: u32 = 15;

fn coord_key(latitude: &str, longitude: &str, decimals: u32) -> CoordKey {
    let scale = 10f64.powi(decimals.min(MAX_ROUND_DECIMALS) as i32);
    let parse = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    // halves go to the even neighbour: 44.625 keys as 44.62
    let key = |v: f64| (v * scale).round_ties_even() as i64;

    match (parse(latitude), parse(longitude)) {
        (Some(lat), Some(lon)) => CoordKey::Rounded(key(lat), key(lon)),
        _ => CoordKey::Raw(latitude.to_string(), longitude.to_string()),
    }
}

fn group_key(row: &NormalizedRow, decimals: u32) -> GroupKey {
    GroupKey {
        species: row.species_id.clone(),
        locality: row.locality.clone(),
        date: row.collection_date.clone(),
        coords: coord_key(&row.latitude, &row.longitude, decimals),
    }
}

/// Set `population_representation` on every row to its group size when the
/// group has more than one member, otherwise clear it.
///
/// Rows are annotated in place: order and count never change.
pub fn annotate_population(rows: &mut [NormalizedRow], decimals: u32) {
    if rows.is_empty() {
        return;
    }

    let keys: Vec<GroupKey> = rows.iter().map(|r| group_key(r, decimals)).collect();
    let mut counts: HashMap<&GroupKey, usize> = HashMap::new();
    for key in &keys {
        *counts.entry(key).or_insert(0) += 1;
    }

    for (row, key) in rows.iter_mut().zip(&keys) {
        let n = counts[key];
        row.population_representation = if n > 1 { n.to_string() } else { String::new() };
    }

    let groups = counts.values().filter(|&&n| n > 1).count();
    tracing::debug!(
        "population grouping: {} rows, {} multi-record groups",
        rows.len(),
        groups
    );
}
