//! Pre-opening growth: sub-regions with an anticipation plan ramp up
//! linearly from January (×1) to December (×target) of each planned year.

use crate::{
    calendar::YearMonth,
    error::GeoResult,
    normalize::normalize,
    rng::KeyedRng,
    types::WeightMap,
};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Ramp factor for `month` towards a year-end `target`.
pub fn month_factor(target: f64, month: u32) -> f64 {
    1.0 + (target - 1.0) * f64::from(month.saturating_sub(1)) / 11.0
}

/// Scale factors for every plan active in the date's year.
pub fn active_scalers(
    plans: &BTreeMap<String, BTreeMap<i32, f64>>,
    date: NaiveDate,
    rng: &KeyedRng,
    jitter_amp: f64,
) -> BTreeMap<String, f64> {
    let period = YearMonth::from_date(date).key();
    plans
        .iter()
        .filter_map(|(sub, plan)| {
            let target = plan.get(&date.year())?;
            let factor = month_factor(*target, date.month());
            let jitter = rng.jitter(&format!("preopen:{sub}:{period}"), jitter_amp);
            Some((sub.clone(), (factor * jitter).max(0.0)))
        })
        .collect()
}

/// Apply the ramp. With no active plan the input is returned unchanged;
/// otherwise the whole map is renormalized.
pub fn apply_growth(
    weights: WeightMap,
    plans: &BTreeMap<String, BTreeMap<i32, f64>>,
    date: NaiveDate,
    rng: &KeyedRng,
    jitter_amp: f64,
) -> GeoResult<WeightMap> {
    let scalers = active_scalers(plans, date, rng, jitter_amp);
    if scalers.is_empty() {
        return Ok(weights);
    }

    let mut out = weights;
    for (sub, scale) in &scalers {
        match out.get_mut(sub) {
            Some(w) => *w *= scale,
            None => log::warn!("growth plan for '{sub}' has no weight to scale"),
        }
    }
    log::debug!("growth ramp {date}: {} plans active", scalers.len());
    normalize(&out, "growth-ramp")
}
