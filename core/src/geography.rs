//! Static geography index: regions, their base compositions and the
//! sub-region → region inverse lookup. Built once from `GeoConfig`.

use crate::{
    config::GeoConfig,
    error::{GeoError, GeoResult},
    types::{RegionName, SubregionName, WeightMap},
};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Region {
    pub name: RegionName,
    pub island: bool,
    /// Base (unjittered) intra-region composition.
    pub composition: WeightMap,
}

#[derive(Debug, Clone)]
pub struct Geography {
    regions: BTreeMap<RegionName, Region>,
    owner: BTreeMap<SubregionName, RegionName>,
}

impl Geography {
    pub fn from_config(config: &GeoConfig) -> Self {
        let mut regions = BTreeMap::new();
        let mut owner = BTreeMap::new();
        for rc in &config.regions {
            for sub in rc.subregions.keys() {
                owner.insert(sub.clone(), rc.name.clone());
            }
            regions.insert(
                rc.name.clone(),
                Region {
                    name: rc.name.clone(),
                    island: rc.island,
                    composition: rc.subregions.clone(),
                },
            );
        }
        Self { regions, owner }
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn subregion_count(&self) -> usize {
        self.owner.len()
    }

    /// Owning region of a sub-region.
    pub fn region_of(&self, subregion: &str) -> GeoResult<&Region> {
        self.owner
            .get(subregion)
            .and_then(|r| self.regions.get(r))
            .ok_or_else(|| GeoError::UnknownSubregion { name: subregion.to_string() })
    }

    /// Regions whose sub-regions may not receive country-wide
    /// redistribution from `region`: the region itself and, for an island
    /// region, every other island region.
    pub fn country_exclusions<'a>(&'a self, region: &'a Region) -> Vec<&'a str> {
        let mut excluded = vec![region.name.as_str()];
        if region.island {
            excluded.extend(
                self.regions
                    .values()
                    .filter(|r| r.island && r.name != region.name)
                    .map(|r| r.name.as_str()),
            );
        }
        excluded
    }
}
