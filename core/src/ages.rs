//! Age-bucket sampling per (month, sub-region).
//!
//! Independent of the weight pipeline; shares only the seeding convention.

use crate::{
    error::{GeoError, GeoResult},
    rng::StreamRng,
};
use rand::distributions::{Distribution, WeightedIndex};
use rand_distr::Dirichlet;

/// Inclusive age ranges.
pub const AGE_BUCKETS: [(u32, u32); 5] = [(16, 17), (18, 22), (23, 28), (29, 34), (35, 45)];

/// Target share per bucket. Sums to 1.
pub const TARGET_SHARES: [f64; 5] = [0.07, 0.40, 0.35, 0.15, 0.03];

pub const DEFAULT_ALPHA_TOTAL: f64 = 1000.0;
pub const DRIFT_BASE_YEAR: i32 = 2017;

/// Share moved per year from 29–34 to 18–22.
const DRIFT_PER_YEAR: f64 = 0.003;
const MIN_SHARE: f64 = 1e-6;
const UNIVERSITY_BOOST: f64 = 1.15;
const UNIVERSITY_CITIES: [&str; 5] = ["Granada", "Salamanca", "Zaragoza", "Valencia", "Santiago de Compostela"];

const YOUNG_ADULT: usize = 1;
const THIRTIES: usize = 3;

pub type AgeWeights = [f64; 5];

#[derive(Debug, Clone, Copy)]
pub struct AgeParams<'a> {
    /// Dirichlet concentration. Higher means less month-to-month variation.
    pub alpha_total: f64,
    pub drift_from_year: i32,
    pub subregion: Option<&'a str>,
}

impl Default for AgeParams<'_> {
    fn default() -> Self {
        Self {
            alpha_total: DEFAULT_ALPHA_TOTAL,
            drift_from_year: DRIFT_BASE_YEAR,
            subregion: None,
        }
    }
}

fn clip_and_normalize(mut weights: AgeWeights) -> AgeWeights {
    for w in weights.iter_mut() {
        *w = w.max(MIN_SHARE);
    }
    let total: f64 = weights.iter().sum();
    weights.map(|w| w / total)
}

/// Shift share from 29–34 to 18–22, `DRIFT_PER_YEAR` per elapsed year.
pub fn apply_drift(weights: AgeWeights, base_year: i32, current_year: i32) -> AgeWeights {
    let years = (current_year - base_year).max(0);
    let drift = DRIFT_PER_YEAR * f64::from(years);
    let mut w = weights;
    w[YOUNG_ADULT] += drift;
    w[THIRTIES] = (w[THIRTIES] - drift).max(0.0);
    clip_and_normalize(w)
}

/// University cities push the 18–22 bucket up.
pub fn apply_university_bias(weights: AgeWeights, subregion: Option<&str>) -> AgeWeights {
    let Some(sub) = subregion else {
        return weights;
    };
    let mut w = weights;
    if UNIVERSITY_CITIES.contains(&sub) {
        w[YOUNG_ADULT] *= UNIVERSITY_BOOST;
    }
    clip_and_normalize(w)
}

/// Bucket probabilities for one month (`month_key` like "2019-11").
pub fn weights_for_month(month_key: &str, year: i32, params: &AgeParams<'_>) -> GeoResult<AgeWeights> {
    let mut rng = StreamRng::from_parts(&[month_key, params.subregion.unwrap_or("")])
        .with_name("age-weights");
    let alpha: Vec<f64> = TARGET_SHARES.iter().map(|s| s * params.alpha_total).collect();
    let dirichlet = Dirichlet::new(&alpha)
        .map_err(|e| GeoError::Other(anyhow::anyhow!("age dirichlet for {month_key}: {e}")))?;
    let draw = dirichlet.sample(&mut rng);

    let mut weights = [0.0; 5];
    weights.copy_from_slice(&draw);
    let weights = apply_drift(weights, params.drift_from_year, year);
    Ok(apply_university_bias(weights, params.subregion))
}

/// Pick a bucket, then a whole age uniformly inside it.
pub fn sample_age(rng: &mut StreamRng, weights: &AgeWeights) -> GeoResult<u32> {
    let index = WeightedIndex::new(weights.iter())
        .map_err(|e| GeoError::Other(anyhow::anyhow!("age buckets: {e}")))?;
    let (lo, hi) = AGE_BUCKETS[index.sample(rng)];
    Ok(rng.int_inclusive(lo, hi))
}

/// Stream + bucket weights for one (month, sub-region).
pub fn month_sampler(
    month_key: &str,
    year: i32,
    subregion: Option<&str>,
) -> GeoResult<(StreamRng, AgeWeights)> {
    let rng = StreamRng::from_parts(&["RNG", month_key, subregion.unwrap_or("")])
        .with_name("age-sampler");
    let params = AgeParams { subregion, ..AgeParams::default() };
    Ok((rng, weights_for_month(month_key, year, &params)?))
}
