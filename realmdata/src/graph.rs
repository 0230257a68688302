//! Cell storage and adjacency.
//!
//! Owns every decoded cell, keyed by id, plus the reverse index from
//! province id to member cells that the holding builder consumes. Adjacency
//! in the source is supposed to be mutual; it is not always, so construction
//! validates symmetry and backfills the missing reciprocal edge rather than
//! failing (geospatial source data is not always exact).

use crate::error::ConvertError;
use crate::feature::FeatureType;
use crate::ingest::CellRecord;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One terrain cell. Immutable once the graph is built.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: u32,
    /// Outer polygon boundary, ordered (lon, lat) vertices.
    pub polygon: Vec<[f32; 2]>,
    pub neighbors: BTreeSet<u32>,
    pub height: i32,
    pub area: u32,
    pub biome: u32,
    pub culture: u32,
    pub religion: u32,
    /// Political-unit (province) id; 0 means open sea / untracked.
    pub province: u32,
    pub state: u32,
    pub feature_type: FeatureType,
}

impl Cell {
    /// Squared distance between the first polygon vertices of two cells.
    ///
    /// Intentionally the squared form: only relative ordering is ever
    /// needed, so the square root would be wasted work.
    pub fn distance_squared(&self, other: &Cell) -> f32 {
        let a = self.polygon.first().copied().unwrap_or([0.0, 0.0]);
        let b = other.polygon.first().copied().unwrap_or([0.0, 0.0]);
        (a[0] - b[0]) * (a[0] - b[0]) + (a[1] - b[1]) * (a[1] - b[1])
    }

    pub fn is_dry_land(&self) -> bool {
        self.feature_type.is_dry_land()
    }
}

/// All cells plus their adjacency relationships.
#[derive(Debug, Clone)]
pub struct CellGraph {
    cells: HashMap<u32, Cell>,
    /// Province id -> member cell ids, sorted. BTreeMap keeps downstream
    /// iteration order deterministic.
    by_province: BTreeMap<u32, Vec<u32>>,
}

impl CellGraph {
    /// Build the graph from decoded records, validating adjacency symmetry.
    ///
    /// A neighbor reference to a cell with no geometry at all is fatal; a
    /// one-sided edge between two known cells is repaired by adding the
    /// reciprocal; a self-edge is dropped. Both repairs are logged.
    pub fn build(records: Vec<CellRecord>) -> Result<Self, ConvertError> {
        let mut cells: HashMap<u32, Cell> = HashMap::with_capacity(records.len());

        for record in records {
            let cell = Cell {
                id: record.id,
                polygon: record.polygon,
                neighbors: record.neighbors.into_iter().collect(),
                height: record.height,
                area: record.area,
                biome: record.biome,
                culture: record.culture,
                religion: record.religion,
                province: record.province,
                state: record.state,
                feature_type: record.feature_type,
            };
            if cells.insert(cell.id, cell).is_some() {
                return Err(ConvertError::DataIntegrity(format!(
                    "duplicate cell id {} in geometry feed",
                    record.id
                )));
            }
        }

        // Self-edges first, so the symmetry pass below never sees them.
        for cell in cells.values_mut() {
            if cell.neighbors.remove(&cell.id) {
                log::warn!("Cell {} listed itself as a neighbor, dropped", cell.id);
            }
        }

        // Symmetry pass: collect missing reciprocals, then apply.
        let mut missing: Vec<(u32, u32)> = Vec::new();
        for cell in cells.values() {
            for &neighbor_id in &cell.neighbors {
                match cells.get(&neighbor_id) {
                    None => {
                        return Err(ConvertError::DataIntegrity(format!(
                            "cell {} lists neighbor {} which has no geometry",
                            cell.id, neighbor_id
                        )));
                    }
                    Some(neighbor) if !neighbor.neighbors.contains(&cell.id) => {
                        missing.push((neighbor_id, cell.id));
                    }
                    Some(_) => {}
                }
            }
        }
        for (cell_id, back_ref) in missing {
            log::warn!(
                "One-sided adjacency: {} -> {}, adding reciprocal edge",
                back_ref,
                cell_id
            );
            if let Some(cell) = cells.get_mut(&cell_id) {
                cell.neighbors.insert(back_ref);
            }
        }

        let mut by_province: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
        for cell in cells.values() {
            by_province.entry(cell.province).or_default().push(cell.id);
        }
        for members in by_province.values_mut() {
            members.sort_unstable();
        }

        log::info!(
            "Built cell graph: {} cells across {} provinces",
            cells.len(),
            by_province.len()
        );

        Ok(Self { cells, by_province })
    }

    /// Look up a cell by id.
    pub fn get(&self, id: u32) -> Option<&Cell> {
        self.cells.get(&id)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    /// Iterate a cell's neighbors. Unknown ids yield nothing; after a
    /// successful build every neighbor id resolves.
    pub fn neighbors(&self, id: u32) -> impl Iterator<Item = &Cell> {
        self.cells
            .get(&id)
            .into_iter()
            .flat_map(|cell| cell.neighbors.iter())
            .filter_map(|n| self.cells.get(n))
    }

    /// Reverse index: province id -> sorted member cell ids.
    pub fn province_members(&self) -> &BTreeMap<u32, Vec<u32>> {
        &self.by_province
    }
}
