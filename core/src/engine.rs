//! The weight engine: turns a date into a distribution over sub-regions.
//!
//! PIPELINE ORDER (fixed, documented, never reordered):
//!   1. Region mix        (anchors blended by time, monthly drift)
//!   2. Sub-region mix    (jittered composition × region share)
//!   3. Growth ramp       (pre-opening anticipation) → `pre_reduce`
//!   4. Store reductions  (removal + region/country redistribution)
//!   5. Floor/ceiling     (band relative to `pre_reduce`)
//!
//! RULES:
//!   - Every stage is a pure function of the date and the static config.
//!   - All randomness flows through the engine's KeyedRng.
//!   - The anchor cache is the only mutable state, and it is idempotent.

use crate::{
    anchor::{AnchorCache, AnchorSlot},
    calendar::YearMonth,
    config::GeoConfig,
    error::{GeoError, GeoResult},
    geography::Geography,
    growth_ramp,
    normalize::{normalize, total},
    region_mix,
    request::AssignRequest,
    rng::KeyedRng,
    sampler::{self, Assignment},
    store_effects::{self, Redistribution},
    subregion_mix,
    summary::MonthSummary,
    types::WeightMap,
};
use chrono::NaiveDate;

/// Every intermediate map of one pipeline run.
#[derive(Debug, Clone)]
pub struct WeightBreakdown {
    pub date: NaiveDate,
    pub region_mix: WeightMap,
    pub pre_growth: WeightMap,
    pub pre_reduce: WeightMap,
    /// After reductions, before the final renormalization.
    pub redistributed: WeightMap,
    pub redistributions: Vec<Redistribution>,
    pub post_reduce: WeightMap,
    /// After the floor/ceiling clamp, before renormalization.
    pub bounded: WeightMap,
    pub final_weights: WeightMap,
}

pub struct GeoEngine {
    config: GeoConfig,
    geography: Geography,
    rng: KeyedRng,
    anchors: AnchorCache,
}

impl GeoEngine {
    /// Validate the config and build the static indexes.
    pub fn new(config: GeoConfig) -> GeoResult<Self> {
        config.validate()?;
        let geography = Geography::from_config(&config);
        let rng = KeyedRng::new(config.seed.clone());
        log::debug!(
            "engine ready: seed='{}' regions={} sub-regions={} stores={}",
            config.seed,
            config.regions.len(),
            geography.subregion_count(),
            config.stores.len()
        );
        Ok(Self {
            config,
            geography,
            rng,
            anchors: AnchorCache::new(),
        })
    }

    /// Engine over the built-in project data.
    pub fn default_project() -> GeoResult<Self> {
        Self::new(GeoConfig::default_project())
    }

    pub fn config(&self) -> &GeoConfig {
        &self.config
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn rng(&self) -> &KeyedRng {
        &self.rng
    }

    /// Labels whose anchor snapshot is already cached.
    pub fn cached_anchor_labels(&self) -> Vec<String> {
        self.anchors.cached_labels()
    }

    pub fn anchor(&self, slot: AnchorSlot) -> GeoResult<WeightMap> {
        let anchor = match slot {
            AnchorSlot::Earliest => &self.config.anchors.earliest,
            AnchorSlot::Latest => &self.config.anchors.latest,
        };
        self.anchors
            .get_or_compute(anchor, &self.rng, self.config.tuning.anchor_jitter)
    }

    pub fn region_mix(&self, date: NaiveDate) -> GeoResult<WeightMap> {
        region_mix::region_mix(
            &self.anchor(AnchorSlot::Earliest)?,
            &self.anchor(AnchorSlot::Latest)?,
            &self.config.range,
            date,
            &self.rng,
            self.config.tuning.monthly_drift,
        )
    }

    pub fn subregion_mix(&self, region: &str, date: NaiveDate) -> GeoResult<WeightMap> {
        let region = self
            .geography
            .region(region)
            .ok_or_else(|| GeoError::UnknownRegion { name: region.to_string() })?;
        let tuning = &self.config.tuning;
        subregion_mix::subregion_mix(
            region,
            date,
            &self.rng,
            tuning.subregion_jitter,
            tuning.monthly_drift,
        )
    }

    /// Normalized aggregate of sub-region mixes weighted by region mix.
    pub fn pre_growth(&self, date: NaiveDate) -> GeoResult<WeightMap> {
        let regions = self.region_mix(date)?;
        self.aggregate(&regions, date)
    }

    fn aggregate(&self, regions: &WeightMap, date: NaiveDate) -> GeoResult<WeightMap> {
        let tuning = &self.config.tuning;
        subregion_mix::aggregate(
            &self.geography,
            regions,
            date,
            &self.rng,
            tuning.subregion_jitter,
            tuning.monthly_drift,
        )
    }

    pub fn apply_growth(&self, weights: WeightMap, date: NaiveDate) -> GeoResult<WeightMap> {
        growth_ramp::apply_growth(
            weights,
            &self.config.growth_plans,
            date,
            &self.rng,
            self.config.tuning.preopen_jitter,
        )
    }

    pub fn apply_reductions(&self, weights: WeightMap, date: NaiveDate) -> GeoResult<WeightMap> {
        store_effects::apply_reductions(
            weights,
            &self.geography,
            &self.config.stores,
            date,
            &self.rng,
            &self.config.tuning,
        )
    }

    pub fn apply_bounds(&self, weights: &WeightMap, baseline: &WeightMap) -> GeoResult<WeightMap> {
        store_effects::apply_bounds(weights, baseline, &self.config.tuning)
    }

    /// Sub-regions whose store has opened on or before `date`, by name.
    pub fn active_openings(&self, date: NaiveDate) -> Vec<String> {
        store_effects::active_openings(&self.config.stores, date)
            .into_iter()
            .map(|s| s.subregion.clone())
            .collect()
    }

    /// Run the whole pipeline and keep every stage.
    pub fn breakdown_for_date(&self, date: NaiveDate) -> GeoResult<WeightBreakdown> {
        let region_mix = self.region_mix(date)?;
        let pre_growth = self.aggregate(&region_mix, date)?;
        let pre_reduce = self.apply_growth(pre_growth.clone(), date)?;

        let (redistributed, redistributions) = store_effects::redistribute(
            pre_reduce.clone(),
            &self.geography,
            &self.config.stores,
            date,
            &self.rng,
            &self.config.tuning,
        )?;
        let post_reduce = normalize(&redistributed, "store-reduction")?;

        let tuning = &self.config.tuning;
        let bounded = store_effects::clamp_to_band(
            &post_reduce,
            &pre_reduce,
            tuning.floor_ratio,
            tuning.ceil_ratio,
        );
        let final_weights = normalize(&bounded, "floor-ceiling")?;

        log::debug!(
            "weights {date}: {} units, {} openings applied",
            final_weights.len(),
            redistributions.len()
        );

        Ok(WeightBreakdown {
            date,
            region_mix,
            pre_growth,
            pre_reduce,
            redistributed,
            redistributions,
            post_reduce,
            bounded,
            final_weights,
        })
    }

    /// Final normalized distribution over sub-regions for `date`.
    pub fn weights_for_date(&self, date: NaiveDate) -> GeoResult<WeightMap> {
        let pre_reduce = self.apply_growth(self.pre_growth(date)?, date)?;
        let post_reduce = self.apply_reductions(pre_reduce.clone(), date)?;
        self.apply_bounds(&post_reduce, &pre_reduce)
    }

    /// One draw from an already computed distribution.
    pub fn pick(&self, weights: &WeightMap, key: &str, period: YearMonth) -> GeoResult<Assignment> {
        sampler::pick(weights, key, period, &self.rng, &self.geography)
    }

    /// Resolve the request, compute the month's weights and draw once.
    pub fn assign_subregion(&self, request: &AssignRequest) -> GeoResult<Assignment> {
        let canonical = request.canonicalize()?;
        let weights = self.weights_for_date(canonical.date)?;
        let assignment = self.pick(&weights, &canonical.draw_key, canonical.period)?;
        log::trace!(
            "assign key='{}' {} → {} ({})",
            canonical.draw_key,
            canonical.period,
            assignment.subregion,
            assignment.region
        );
        Ok(assignment)
    }

    /// Diagnostic view of one date.
    pub fn summary_for_date(&self, date: NaiveDate) -> GeoResult<MonthSummary> {
        let weights = self.weights_for_date(date)?;
        Ok(MonthSummary::from_weights(
            date,
            total(&weights),
            &weights,
            self.active_openings(date),
        ))
    }
}
