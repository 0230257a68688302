//! The root aggregate and the one-shot build pipeline.
//!
//! A single pass over a fixed input snapshot: ingestion, graph build,
//! holding build, hierarchy build. No stage is re-entered and no state is
//! shared between stages, so the whole transform is synchronous. Rendering
//! is the external collaborator's job; this module only hands it a complete
//! polygon/color payload through the accessor methods.

use crate::error::ConvertError;
use crate::graph::CellGraph;
use crate::holdings::{self, Holding};
use crate::ingest::{self, AttributeFeed, GeometryFeed};
use crate::project::{Bounds, PixelFrame};
use crate::titles::{self, Character, Hierarchy, HierarchyKeys};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Fill color used for wasteland cells in every export pass.
pub const WASTELAND_COLOR: [u8; 3] = [40, 40, 40];

/// A set of polygons (geographic coordinates) sharing one fill color.
#[derive(Debug, Clone)]
pub struct FillGroup {
    pub color: [u8; 3],
    pub polygons: Vec<Vec<[f32; 2]>>,
}

/// The fully built map: cells, holdings, wasteland set, title hierarchy and
/// the projection parameters every rendering call reuses.
#[derive(Debug, Clone)]
pub struct RealmMap {
    pub bounds: Bounds,
    pub pixel_frame: PixelFrame,
    pub cells: CellGraph,
    /// Sorted by id; ids are province ids.
    pub holdings: Vec<Holding>,
    /// Province ids with no settlement, plus the open-sea sentinel 0.
    pub wastelands: BTreeSet<u32>,
    pub hierarchy: Hierarchy,
    /// Culture id -> display name, for resolving per-cell culture ids.
    pub cultures: BTreeMap<u32, String>,
    /// Religion id -> display name, for resolving per-cell religion ids.
    pub religions: BTreeMap<u32, String>,
    /// Characters available for holder assignment. Populated externally.
    pub characters: Vec<Character>,
}

impl RealmMap {
    /// Build from already-parsed feeds with an explicit grouping keying.
    pub fn build_with_keys(
        attributes: &AttributeFeed,
        geometry: &GeometryFeed,
        keys: &HierarchyKeys,
    ) -> Result<Self, ConvertError> {
        let (cells, holdings, wastelands) = Self::prepare(attributes, geometry)?;
        Self::finish(attributes, cells, holdings, wastelands, keys)
    }

    /// Build from already-parsed feeds, deriving the grouping keys from the
    /// attribute feed's state table.
    pub fn build(
        attributes: &AttributeFeed,
        geometry: &GeometryFeed,
    ) -> Result<Self, ConvertError> {
        let (cells, holdings, wastelands) = Self::prepare(attributes, geometry)?;
        let keys = HierarchyKeys::from_states(&attributes.pack.states, &holdings);
        Self::finish(attributes, cells, holdings, wastelands, &keys)
    }

    /// Stages 1-4: decode, correlate, graph build, holding build.
    fn prepare(
        attributes: &AttributeFeed,
        geometry: &GeometryFeed,
    ) -> Result<(CellGraph, Vec<Holding>, BTreeSet<u32>), ConvertError> {
        let records = ingest::correlate(attributes, geometry)?;
        let cells = CellGraph::build(records)?;
        let settlements: Vec<_> = attributes.pack.settlements().collect();
        let (holdings, wastelands) =
            holdings::build_holdings(&cells, &attributes.pack.provinces, &settlements)?;
        Ok((cells, holdings, wastelands))
    }

    /// Stage 5: hierarchy assembly, then the aggregate itself.
    fn finish(
        attributes: &AttributeFeed,
        cells: CellGraph,
        mut holdings: Vec<Holding>,
        wastelands: BTreeSet<u32>,
        keys: &HierarchyKeys,
    ) -> Result<Self, ConvertError> {
        let hierarchy = titles::assemble(&mut holdings, keys)?;
        let coords = &attributes.map_coordinates;
        Ok(Self {
            bounds: Bounds {
                lon_west: coords.lon_west,
                lat_south: coords.lat_south,
                lon_span: coords.lon_span,
                lat_span: coords.lat_span,
            },
            pixel_frame: attributes.info,
            cells,
            holdings,
            wastelands,
            hierarchy,
            cultures: attributes
                .pack
                .cultures
                .iter()
                .map(|c| (c.i, c.name.clone()))
                .collect(),
            religions: attributes
                .pack
                .religions
                .iter()
                .map(|r| (r.i, r.name.clone()))
                .collect(),
            characters: Vec::new(),
        })
    }

    /// Load both feeds from disk and build with derived keys.
    pub fn load(attribute_path: &Path, geometry_path: &Path) -> Result<Self, ConvertError> {
        log::info!("Loading attribute feed from {:?}", attribute_path);
        let attributes = ingest::load_attribute_feed(attribute_path)?;
        log::info!("Loading geometry feed from {:?}", geometry_path);
        let geometry = ingest::load_geometry_feed(geometry_path)?;
        Self::build(&attributes, &geometry)
    }

    /// Every cell's polygon, for the outline-only overlay export.
    pub fn cell_outlines(&self) -> Vec<Vec<[f32; 2]>> {
        let mut ids: Vec<u32> = self.cells.cells().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|id| self.cells.get(*id))
            .map(|c| c.polygon.clone())
            .collect()
    }

    /// One fill group per settled holding, in holding-id order.
    pub fn holding_fill_groups(&self) -> Vec<FillGroup> {
        self.holdings
            .iter()
            .filter(|h| !h.is_wasteland())
            .map(|h| FillGroup {
                color: h.color,
                polygons: self.polygons_of(&h.cells),
            })
            .collect()
    }

    /// All wasteland cells as a single dark group.
    pub fn wasteland_fill_group(&self) -> FillGroup {
        let cells: Vec<u32> = self
            .holdings
            .iter()
            .filter(|h| h.is_wasteland())
            .flat_map(|h| h.cells.iter().copied())
            .collect();
        FillGroup {
            color: WASTELAND_COLOR,
            polygons: self.polygons_of(&cells),
        }
    }

    fn polygons_of(&self, cell_ids: &[u32]) -> Vec<Vec<[f32; 2]>> {
        cell_ids
            .iter()
            .filter_map(|id| self.cells.get(*id))
            .map(|c| c.polygon.clone())
            .collect()
    }
}
