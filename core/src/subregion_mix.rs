//! Sub-region composition inside each region, and the global aggregate
//! that feeds the growth ramp.

use crate::{
    calendar::YearMonth,
    error::GeoResult,
    geography::{Geography, Region},
    normalize::normalize,
    rng::KeyedRng,
    types::WeightMap,
};
use chrono::NaiveDate;

/// Jittered base composition, then monthly drift. Sums to 1.
pub fn subregion_mix(
    region: &Region,
    date: NaiveDate,
    rng: &KeyedRng,
    jitter_amp: f64,
    monthly_drift: f64,
) -> GeoResult<WeightMap> {
    let jittered: WeightMap = region
        .composition
        .iter()
        .map(|(sub, w)| {
            let factor = rng.jitter(&format!("subregion-jitter:{sub}"), jitter_amp);
            (sub.clone(), w * factor)
        })
        .collect();
    let jittered = normalize(&jittered, "subregion-jitter")?;

    let period = YearMonth::from_date(date).key();
    let half = monthly_drift / 2.0;
    let drifted: WeightMap = jittered
        .iter()
        .map(|(sub, w)| {
            let factor = rng.jitter(&format!("drift-subregion:{sub}:{period}"), half);
            (sub.clone(), w * factor)
        })
        .collect();
    normalize(&drifted, "subregion-drift")
}

/// `subregion_mix[s] * region_mix[region]` over every region, normalized.
/// Regions absent from `region_weights` contribute zero.
pub fn aggregate(
    geography: &Geography,
    region_weights: &WeightMap,
    date: NaiveDate,
    rng: &KeyedRng,
    jitter_amp: f64,
    monthly_drift: f64,
) -> GeoResult<WeightMap> {
    let mut raw = WeightMap::new();
    for region in geography.regions() {
        let region_share = region_weights.get(&region.name).copied().unwrap_or(0.0);
        let intra = subregion_mix(region, date, rng, jitter_amp, monthly_drift)?;
        raw.extend(intra.into_iter().map(|(sub, w)| (sub, w * region_share)));
    }
    normalize(&raw, "subregion-aggregate")
}
