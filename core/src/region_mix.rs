//! Region-level mix: linear blend between the two anchors by the date's
//! position in the project range, plus a small monthly drift per region.

use crate::{
    calendar::{ProjectRange, YearMonth},
    error::GeoResult,
    normalize::normalize,
    rng::KeyedRng,
    types::WeightMap,
};
use chrono::NaiveDate;

/// Blend `earliest` and `latest` at fraction `t` over the union of keys.
/// A region missing from one anchor counts as 0 there.
pub fn interpolate(earliest: &WeightMap, latest: &WeightMap, t: f64) -> WeightMap {
    earliest
        .keys()
        .chain(latest.keys())
        .map(|region| {
            let a = earliest.get(region).copied().unwrap_or(0.0);
            let b = latest.get(region).copied().unwrap_or(0.0);
            (region.clone(), (1.0 - t) * a + t * b)
        })
        .collect()
}

/// Normalized region shares for `date`.
pub fn region_mix(
    earliest: &WeightMap,
    latest: &WeightMap,
    range: &ProjectRange,
    date: NaiveDate,
    rng: &KeyedRng,
    monthly_drift: f64,
) -> GeoResult<WeightMap> {
    let t = range.time_fraction(date);
    let mix = normalize(&interpolate(earliest, latest, t), "region-interpolation")?;

    let period = YearMonth::from_date(date).key();
    let half = monthly_drift / 2.0;
    let drifted: WeightMap = mix
        .iter()
        .map(|(region, w)| {
            let factor = rng.jitter(&format!("drift-region:{region}:{period}"), half);
            (region.clone(), w * factor)
        })
        .collect();

    log::trace!("region mix {period}: t={t:.4}");
    normalize(&drifted, "region-drift")
}
