//! Single categorical draw over a final weight map.

use crate::{
    calendar::YearMonth,
    error::{GeoError, GeoResult},
    geography::Geography,
    rng::KeyedRng,
    types::WeightMap,
};
use serde::{Deserialize, Serialize};

/// Outcome of one draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub subregion: String,
    pub region: String,
}

/// Sub-region for uniform draw `u`: first cumulative sum ≥ `u` in name
/// order, falling back to the last entry when rounding leaves the scan
/// short of `u`.
pub fn select(weights: &WeightMap, u: f64) -> Option<&str> {
    let mut cumulative = 0.0;
    for (sub, w) in weights {
        cumulative += w;
        if u <= cumulative {
            return Some(sub.as_str());
        }
    }
    weights.keys().next_back().map(String::as_str)
}

/// Draw one sub-region for `key` in `period` and look up its region.
pub fn pick(
    weights: &WeightMap,
    key: &str,
    period: YearMonth,
    rng: &KeyedRng,
    geography: &Geography,
) -> GeoResult<Assignment> {
    let u = rng.uniform(&format!("pick:{key}:{}", period.key()));
    let subregion = select(weights, u).ok_or(GeoError::InvalidDistribution {
        stage: "pick",
        total: 0.0,
    })?;
    let region = geography.region_of(subregion)?;
    Ok(Assignment {
        subregion: subregion.to_string(),
        region: region.name.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights(entries: &[(&str, f64)]) -> WeightMap {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn select_scans_in_name_order() {
        let w = weights(&[("b", 0.5), ("a", 0.25), ("c", 0.25)]);
        assert_eq!(select(&w, 0.0), Some("a"));
        assert_eq!(select(&w, 0.25), Some("a"));
        assert_eq!(select(&w, 0.26), Some("b"));
        assert_eq!(select(&w, 0.76), Some("c"));
    }

    #[test]
    fn select_falls_back_to_last_entry_when_rounding_falls_short() {
        let w = weights(&[("a", 0.3), ("b", 0.3), ("c", 0.3)]);
        assert_eq!(select(&w, 0.95), Some("c"));
        assert_eq!(select(&WeightMap::new(), 0.5), None);
    }
}
