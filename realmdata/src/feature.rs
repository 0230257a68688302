//! Feature classification for cells.
//!
//! The taxonomy comes straight from the geometry feed's `type` property.
//! Downstream consumers mostly care about one derived fact, the land/water
//! boundary, which [`FeatureType::is_dry_land`] exposes uniformly.

use serde::{Deserialize, Serialize};

/// Geographical feature type of a cell.
///
/// Primary types (ocean, island, lake) and their subtypes (continent, isle,
/// lake_island, freshwater, salt, dry, sinkhole, lava) share one flat enum,
/// matching the source data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureType {
    Ocean,
    Island,
    Lake,
    Continent,
    Isle,
    LakeIsland,
    Freshwater,
    Salt,
    Dry,
    Sinkhole,
    Lava,
}

impl FeatureType {
    /// True only for features a holding can sit on.
    pub fn is_dry_land(self) -> bool {
        matches!(
            self,
            FeatureType::Continent
                | FeatureType::Island
                | FeatureType::Isle
                | FeatureType::LakeIsland
        )
    }

    /// True for open-water features (sea and lake alike).
    pub fn is_water(self) -> bool {
        !self.is_dry_land()
    }
}
