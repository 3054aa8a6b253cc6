//! Project configuration: seed, range, tuning amplitudes, regions,
//! anchors, store openings and pre-opening growth plans.
//!
//! Loaded from JSON with `GeoConfig::load`, or built in with
//! `GeoConfig::default_project()`. `validate` runs before any engine is built.

use crate::{
    calendar::ProjectRange,
    error::{GeoError, GeoResult},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Tolerance for "composition sums to 1" checks on configured data.
const COMPOSITION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(default)]
    pub island: bool,
    /// Sub-region → base share inside the region. Sums to 1.
    pub subregions: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Label used in the jitter keys and the cache ("2017", "2025").
    pub label: String,
    /// Region → unnormalized share.
    pub weights: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorPair {
    pub earliest: AnchorConfig,
    pub latest: AnchorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreOpening {
    pub subregion: String,
    pub opening: NaiveDate,
    /// Fraction of online weight permanently removed once the store is open.
    pub reduction_ratio: f64,
}

/// Amplitudes and bands for every perturbation in the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// ±amplitude on intra-region base shares.
    pub subregion_jitter: f64,
    /// ±amplitude on anchor region shares.
    pub anchor_jitter: f64,
    /// Full monthly drift band; half of it is applied each side.
    pub monthly_drift: f64,
    pub split_region_mean: f64,
    pub split_region_width: f64,
    /// ±amplitude on redistribution recipients.
    pub ring_perturbation: f64,
    /// ±amplitude on the pre-opening ramp factor.
    pub preopen_jitter: f64,
    pub floor_ratio: f64,
    pub ceil_ratio: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            subregion_jitter:   0.02,
            anchor_jitter:      0.03,
            monthly_drift:      0.008,
            split_region_mean:  0.65,
            split_region_width: 0.10,
            ring_perturbation:  0.05,
            preopen_jitter:     0.01,
            floor_ratio:        0.35,
            ceil_ratio:         1.80,
        }
    }
}

impl TuningConfig {
    /// Inclusive band for the region share of a redistribution.
    pub fn split_band(&self) -> (f64, f64) {
        let half = self.split_region_width / 2.0;
        (self.split_region_mean - half, self.split_region_mean + half)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Project-wide seed. Changing it yields a different, still
    /// reproducible, universe of outcomes.
    pub seed: String,
    pub range: ProjectRange,
    #[serde(default)]
    pub tuning: TuningConfig,
    pub regions: Vec<RegionConfig>,
    pub anchors: AnchorPair,
    #[serde(default)]
    pub stores: Vec<StoreOpening>,
    /// Sub-region → (year → year-end multiplier).
    #[serde(default)]
    pub growth_plans: BTreeMap<String, BTreeMap<i32, f64>>,
}

impl GeoConfig {
    /// Load from a JSON file.
    /// In tests, use GeoConfig::default_project().
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: GeoConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    /// Structural checks. Any failure here is a configuration bug.
    pub fn validate(&self) -> GeoResult<()> {
        let invalid = |reason: String| Err(GeoError::InvalidConfig { reason });

        if self.seed.is_empty() {
            return invalid("seed must not be empty".into());
        }
        if self.range.start > self.range.end {
            return invalid(format!(
                "range start {} is after end {}",
                self.range.start, self.range.end
            ));
        }
        if self.regions.is_empty() {
            return invalid("at least one region is required".into());
        }

        let mut region_names = BTreeSet::new();
        let mut subregion_names = BTreeSet::new();
        for region in &self.regions {
            if !region_names.insert(region.name.as_str()) {
                return invalid(format!("duplicate region '{}'", region.name));
            }
            if region.subregions.is_empty() {
                return invalid(format!("region '{}' has no sub-regions", region.name));
            }
            if region.subregions.values().any(|w| *w < 0.0) {
                return invalid(format!("region '{}' has a negative share", region.name));
            }
            let total: f64 = region.subregions.values().sum();
            if (total - 1.0).abs() > COMPOSITION_TOLERANCE {
                return invalid(format!(
                    "region '{}' composition sums to {total}, expected 1",
                    region.name
                ));
            }
            for sub in region.subregions.keys() {
                if !subregion_names.insert(sub.as_str()) {
                    return invalid(format!("sub-region '{sub}' belongs to more than one region"));
                }
            }
        }

        for anchor in [&self.anchors.earliest, &self.anchors.latest] {
            if let Some(unknown) = anchor.weights.keys().find(|r| !region_names.contains(r.as_str())) {
                return invalid(format!("anchor '{}' names unknown region '{unknown}'", anchor.label));
            }
        }
        if self.anchors.earliest.label == self.anchors.latest.label {
            return invalid("anchor labels must differ".into());
        }

        let mut opened = BTreeSet::new();
        for store in &self.stores {
            if !subregion_names.contains(store.subregion.as_str()) {
                return Err(GeoError::UnknownSubregion { name: store.subregion.clone() });
            }
            if !opened.insert(store.subregion.as_str()) {
                return invalid(format!("sub-region '{}' has two store openings", store.subregion));
            }
            if !(0.0..1.0).contains(&store.reduction_ratio) {
                return invalid(format!(
                    "reduction ratio {} for '{}' outside [0, 1)",
                    store.reduction_ratio, store.subregion
                ));
            }
        }

        for (sub, plan) in &self.growth_plans {
            if !subregion_names.contains(sub.as_str()) {
                return Err(GeoError::UnknownSubregion { name: sub.clone() });
            }
            if plan.values().any(|m| *m < 0.0) {
                return invalid(format!("growth plan for '{sub}' has a negative multiplier"));
            }
        }

        let t = &self.tuning;
        if t.floor_ratio < 0.0 || t.floor_ratio > t.ceil_ratio {
            return invalid(format!(
                "floor ratio {} must be within [0, ceil ratio {}]",
                t.floor_ratio, t.ceil_ratio
            ));
        }
        let (lo, hi) = t.split_band();
        if lo < 0.0 || hi > 1.0 {
            return invalid(format!("split band [{lo}, {hi}] escapes [0, 1]"));
        }

        Ok(())
    }

    /// The built-in project: Spanish provinces, 2017-08 .. 2025-09,
    /// four store openings and three pre-opening growth plans.
    pub fn default_project() -> Self {
        fn shares(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
            entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
        }
        fn region(name: &str, island: bool, entries: &[(&str, f64)]) -> RegionConfig {
            RegionConfig { name: name.into(), island, subregions: shares(entries) }
        }
        fn day(y: i32, m: u32, d: u32) -> NaiveDate {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap_or_else(|| panic!("built-in date {y:04}-{m:02}-{d:02} is invalid"))
        }
        fn store(subregion: &str, opening: NaiveDate, reduction_ratio: f64) -> StoreOpening {
            StoreOpening { subregion: subregion.into(), opening, reduction_ratio }
        }

        let regions = vec![
            region("Andalucía", false, &[
                ("Almería", 0.07), ("Cádiz", 0.11), ("Córdoba", 0.09), ("Granada", 0.11),
                ("Huelva", 0.06), ("Jaén", 0.07), ("Málaga", 0.24), ("Sevilla", 0.25),
            ]),
            region("Aragón", false, &[("Huesca", 0.12), ("Teruel", 0.08), ("Zaragoza", 0.80)]),
            region("Asturias", false, &[("Asturias", 1.0)]),
            region("Baleares", true, &[("Islas Baleares", 1.0)]),
            region("Canarias", true, &[("Las Palmas", 0.55), ("Santa Cruz de Tenerife", 0.45)]),
            region("Cantabria", false, &[("Cantabria", 1.0)]),
            region("Castilla y León", false, &[
                ("Ávila", 0.06), ("Burgos", 0.12), ("León", 0.16), ("Palencia", 0.06),
                ("Salamanca", 0.11), ("Segovia", 0.06), ("Soria", 0.04), ("Valladolid", 0.28),
                ("Zamora", 0.11),
            ]),
            region("Castilla-La Mancha", false, &[
                ("Albacete", 0.18), ("Ciudad Real", 0.20), ("Cuenca", 0.10),
                ("Guadalajara", 0.12), ("Toledo", 0.40),
            ]),
            region("Cataluña", false, &[
                ("Barcelona", 0.73), ("Girona", 0.10), ("Lleida", 0.06), ("Tarragona", 0.11),
            ]),
            region("Comunidad Valenciana", false, &[
                ("Alicante", 0.28), ("Castellón", 0.10), ("Valencia", 0.62),
            ]),
            region("Extremadura", false, &[("Badajoz", 0.60), ("Cáceres", 0.40)]),
            region("Galicia", false, &[
                ("A Coruña", 0.40), ("Lugo", 0.13), ("Ourense", 0.14), ("Pontevedra", 0.33),
            ]),
            region("Madrid", false, &[("Madrid", 1.0)]),
            region("Murcia", false, &[("Murcia", 1.0)]),
            region("Navarra", false, &[("Navarra", 1.0)]),
            region("País Vasco", false, &[("Álava", 0.19), ("Bizkaia", 0.52), ("Gipuzkoa", 0.29)]),
            region("La Rioja", false, &[("La Rioja", 1.0)]),
            region("Ceuta", false, &[("Ceuta", 1.0)]),
            region("Melilla", false, &[("Melilla", 1.0)]),
        ];

        let anchors = AnchorPair {
            earliest: AnchorConfig {
                label: "2017".into(),
                weights: shares(&[
                    ("Madrid", 0.70), ("Cataluña", 0.08), ("Comunidad Valenciana", 0.05),
                    ("Andalucía", 0.05), ("País Vasco", 0.03), ("Galicia", 0.02),
                    ("Aragón", 0.01), ("Castilla y León", 0.01), ("Castilla-La Mancha", 0.01),
                    ("Baleares", 0.01), ("Canarias", 0.01), ("Murcia", 0.01),
                    ("Asturias", 0.0038), ("Navarra", 0.0024), ("Cantabria", 0.0024),
                    ("La Rioja", 0.0004), ("Ceuta", 0.0005), ("Melilla", 0.0005),
                    ("Extremadura", 0.005),
                ]),
            },
            latest: AnchorConfig {
                label: "2025".into(),
                weights: shares(&[
                    ("Madrid", 0.20), ("Cataluña", 0.17), ("Andalucía", 0.16),
                    ("Comunidad Valenciana", 0.12), ("País Vasco", 0.06), ("Galicia", 0.05),
                    ("Aragón", 0.03), ("Castilla y León", 0.04), ("Castilla-La Mancha", 0.03),
                    ("Murcia", 0.03), ("Canarias", 0.03), ("Baleares", 0.03),
                    ("Asturias", 0.02), ("Navarra", 0.0115), ("Cantabria", 0.01),
                    ("La Rioja", 0.0045), ("Ceuta", 0.002), ("Melilla", 0.002),
                    ("Extremadura", 0.01),
                ]),
            },
        };

        let stores = vec![
            store("Madrid",    day(2022, 5, 15), 0.28),
            store("Barcelona", day(2023, 4, 1),  0.30),
            store("Valencia",  day(2024, 3, 15), 0.26),
            store("Sevilla",   day(2025, 3, 10), 0.24),
        ];

        let growth_plans = [
            ("Bizkaia",    [(2024, 1.06), (2025, 1.10)]),
            ("Alicante",   [(2024, 1.05), (2025, 1.08)]),
            ("Valladolid", [(2024, 1.04), (2025, 1.06)]),
        ]
        .into_iter()
        .map(|(sub, plan)| (sub.to_string(), plan.into_iter().collect()))
        .collect();

        Self {
            seed: "ropa:v4.4".into(),
            range: ProjectRange::new(day(2017, 8, 1), day(2025, 9, 30)),
            tuning: TuningConfig::default(),
            regions,
            anchors,
            stores,
            growth_plans,
        }
    }
}
