use crate::{
    error::{GeoError, GeoResult},
    types::WeightMap,
};

/// Clamp negatives to zero and rescale so the shares sum to 1.
/// `stage` names the pipeline step reported in the error.
pub fn normalize(weights: &WeightMap, stage: &'static str) -> GeoResult<WeightMap> {
    let total: f64 = weights.values().map(|w| w.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(GeoError::InvalidDistribution { stage, total });
    }
    Ok(weights
        .iter()
        .map(|(k, w)| (k.clone(), w.max(0.0) / total))
        .collect())
}

/// Sum of all shares.
pub fn total(weights: &WeightMap) -> f64 {
    weights.values().sum()
}
