//! Anchor snapshots: jittered, normalized region weights for the two
//! reference periods, memoized per label for the lifetime of the engine.

use crate::{
    config::AnchorConfig,
    error::GeoResult,
    normalize::normalize,
    rng::KeyedRng,
    types::WeightMap,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Which end of the interpolation an anchor sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorSlot {
    Earliest,
    Latest,
}

/// Compute one anchor snapshot from its configured base weights.
pub fn compute_anchor(anchor: &AnchorConfig, rng: &KeyedRng, amp: f64) -> GeoResult<WeightMap> {
    let base = normalize(&anchor.weights, "anchor-base")?;
    let jittered: WeightMap = base
        .iter()
        .map(|(region, w)| {
            let factor = rng.jitter(&format!("anchor:{}:{region}", anchor.label), amp);
            (region.clone(), w * factor)
        })
        .collect();
    normalize(&jittered, "anchor-jitter")
}

/// Label → snapshot table. Insert-if-absent under a lock, so an engine can
/// be shared across threads computing different dates.
#[derive(Debug, Default)]
pub struct AnchorCache {
    table: Mutex<BTreeMap<String, WeightMap>>,
}

impl AnchorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &self,
        anchor: &AnchorConfig,
        rng: &KeyedRng,
        amp: f64,
    ) -> GeoResult<WeightMap> {
        // A poisoned table still holds only fully inserted snapshots.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = table.get(&anchor.label) {
            return Ok(hit.clone());
        }
        let snapshot = compute_anchor(anchor, rng, amp)?;
        log::debug!(
            "anchor '{}' computed over {} regions",
            anchor.label,
            snapshot.len()
        );
        table.insert(anchor.label.clone(), snapshot.clone());
        Ok(snapshot)
    }

    pub fn cached_labels(&self) -> Vec<String> {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}
