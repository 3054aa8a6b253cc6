//! Shared primitive types used across the weight pipeline.

use std::collections::BTreeMap;

/// Unit name → non-negative share. Ordered by name, so iteration is
/// always the sorted order the sampler and redistribution rely on.
pub type WeightMap = BTreeMap<String, f64>;

/// Name of a top-level region (autonomous community).
pub type RegionName = String;

/// Name of a leaf sub-region (province).
pub type SubregionName = String;
