//! Physical store effects on online weight.
//!
//! Once a store opens, its sub-region permanently loses a fixed share of
//! online weight. The removed mass is split between the rest of its own
//! region (by base composition) and the rest of the country (by current
//! weight). Afterwards every sub-region is held inside a band around its
//! pre-reduction weight.
//!
//! ORDER: openings are folded in name order; each one sees the weights
//! left by the ones before it.

use crate::{
    config::{StoreOpening, TuningConfig},
    error::GeoResult,
    geography::Geography,
    normalize::normalize,
    rng::KeyedRng,
    types::WeightMap,
};
use chrono::NaiveDate;
use serde::Serialize;

/// What one opening removed and where it went.
#[derive(Debug, Clone, Serialize)]
pub struct Redistribution {
    pub subregion: String,
    pub region: String,
    pub removed: f64,
    /// Fraction of `removed` offered to the own region.
    pub split: f64,
    pub region_amount: f64,
    pub country_amount: f64,
    pub region_credits: WeightMap,
    pub country_credits: WeightMap,
}

impl Redistribution {
    /// Total actually credited to recipients. Equals `removed` unless the
    /// region has no other sub-region to receive its share.
    pub fn credited(&self) -> f64 {
        self.region_credits.values().sum::<f64>() + self.country_credits.values().sum::<f64>()
    }
}

/// Openings on or before `date`, sorted by sub-region name.
pub fn active_openings(stores: &[StoreOpening], date: NaiveDate) -> Vec<&StoreOpening> {
    let mut active: Vec<&StoreOpening> = stores.iter().filter(|s| s.opening <= date).collect();
    active.sort_by(|a, b| a.subregion.cmp(&b.subregion));
    active
}

/// Region share of a redistribution, drawn inside the configured band.
pub fn region_split(rng: &KeyedRng, subregion: &str, period: &str, tuning: &TuningConfig) -> f64 {
    let (lo, hi) = tuning.split_band();
    rng.uniform_range(&format!("split:{subregion}:{period}"), lo, hi)
        .clamp(lo, hi)
}

/// Perturb recipient weights by ±`amp` and renormalize. Empty in, empty out.
fn perturb_recipients(
    base: &WeightMap,
    label: &str,
    rng: &KeyedRng,
    amp: f64,
) -> GeoResult<WeightMap> {
    if base.is_empty() {
        return Ok(WeightMap::new());
    }
    let perturbed: WeightMap = base
        .iter()
        .map(|(k, w)| (k.clone(), (w * rng.jitter(&format!("{label}:{k}"), amp)).max(0.0)))
        .collect();
    normalize(&perturbed, "redistribution-ring")
}

/// Apply every active opening without the final renormalization.
pub fn redistribute(
    weights: WeightMap,
    geography: &Geography,
    stores: &[StoreOpening],
    date: NaiveDate,
    rng: &KeyedRng,
    tuning: &TuningConfig,
) -> GeoResult<(WeightMap, Vec<Redistribution>)> {
    let period = crate::calendar::YearMonth::from_date(date).key();
    let mut current = weights;
    let mut records = Vec::new();

    for store in active_openings(stores, date) {
        let sub = store.subregion.as_str();
        let Some(old) = current.get(sub).copied() else {
            log::warn!("store in '{sub}' has no weight to reduce");
            continue;
        };
        let reduced = old * (1.0 - store.reduction_ratio);
        let removed = old - reduced;
        if removed <= 0.0 {
            continue;
        }
        current.insert(sub.to_string(), reduced);

        let region = geography.region_of(sub)?;
        let split = region_split(rng, sub, &period, tuning);
        let region_amount = removed * split;
        let country_amount = removed - region_amount;

        let region_base: WeightMap = region
            .composition
            .iter()
            .filter(|(q, _)| q.as_str() != sub)
            .map(|(q, w)| (q.clone(), *w))
            .collect();
        let region_ring = perturb_recipients(
            &region_base,
            &format!("ring:{sub}:region:{}", region.name),
            rng,
            tuning.ring_perturbation,
        )?;

        let excluded = geography.country_exclusions(region);
        let country_base: WeightMap = current
            .iter()
            .filter(|(q, _)| {
                geography
                    .region_of(q)
                    .map(|r| !excluded.contains(&r.name.as_str()))
                    .unwrap_or(false)
            })
            .map(|(q, w)| (q.clone(), *w))
            .collect();
        let country_ring = perturb_recipients(
            &country_base,
            &format!("ring:{sub}:country"),
            rng,
            tuning.ring_perturbation,
        )?;

        let region_credits: WeightMap = region_ring
            .into_iter()
            .map(|(q, w)| (q, region_amount * w))
            .collect();
        let country_credits: WeightMap = country_ring
            .into_iter()
            .map(|(q, w)| (q, country_amount * w))
            .collect();
        for (dest, amount) in region_credits.iter().chain(country_credits.iter()) {
            *current.entry(dest.clone()).or_insert(0.0) += amount;
        }

        if region_credits.is_empty() {
            log::debug!(
                "opening {sub}: region '{}' has no other sub-region, {region_amount:.6} left to renormalization",
                region.name
            );
        }
        log::debug!(
            "opening {sub} {period}: removed={removed:.6} split={split:.3} region={region_amount:.6} country={country_amount:.6}"
        );

        records.push(Redistribution {
            subregion: sub.to_string(),
            region: region.name.clone(),
            removed,
            split,
            region_amount,
            country_amount,
            region_credits,
            country_credits,
        });
    }

    Ok((current, records))
}

/// Store reductions with redistribution, renormalized once at the end.
pub fn apply_reductions(
    weights: WeightMap,
    geography: &Geography,
    stores: &[StoreOpening],
    date: NaiveDate,
    rng: &KeyedRng,
    tuning: &TuningConfig,
) -> GeoResult<WeightMap> {
    let (current, _) = redistribute(weights, geography, stores, date, rng, tuning)?;
    normalize(&current, "store-reduction")
}

/// Clamp each weight into `[floor * baseline, ceil * baseline]`, no
/// renormalization. Units missing from `baseline` are left as they are.
pub fn clamp_to_band(current: &WeightMap, baseline: &WeightMap, floor: f64, ceil: f64) -> WeightMap {
    current
        .iter()
        .map(|(k, w)| {
            let base = baseline.get(k).copied().unwrap_or(*w);
            (k.clone(), w.clamp(floor * base, ceil * base))
        })
        .collect()
}

/// Floor/ceiling relative to the pre-reduction baseline, renormalized.
pub fn apply_bounds(
    current: &WeightMap,
    baseline: &WeightMap,
    tuning: &TuningConfig,
) -> GeoResult<WeightMap> {
    let clamped = clamp_to_band(current, baseline, tuning.floor_ratio, tuning.ceil_ratio);
    normalize(&clamped, "floor-ceiling")
}
