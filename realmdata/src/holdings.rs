//! Grouping cells into holdings, the base political unit.
//!
//! One holding per non-sentinel province id with at least one member cell.
//! A holding anchored to a settlement inherits its name; a holding with no
//! settlement is wasteland and gets a placeholder name. The wasteland id set
//! is seeded with 0, the sentinel for open sea / untracked area.

use crate::error::ConvertError;
use crate::graph::CellGraph;
use crate::ingest::{BurgRecord, ProvinceRecord};
use crate::palette;
use crate::titles::TitleId;
use std::collections::{BTreeMap, BTreeSet};

/// Base political unit ("barony"), one per settled or wasteland province.
#[derive(Debug, Clone)]
pub struct Holding {
    /// Equal to the province id the member cells share.
    pub id: u32,
    pub name: String,
    pub color: [u8; 3],
    /// Sorted member cell ids; never empty.
    pub cells: Vec<u32>,
    /// Linked settlement id, if any. `None` means wasteland.
    pub settlement: Option<u32>,
    pub state: u32,
    /// Immediate parent county; set by the hierarchy assembler.
    pub liege: Option<TitleId>,
}

impl Holding {
    pub fn is_wasteland(&self) -> bool {
        self.settlement.is_none()
    }

    pub fn tag(&self) -> String {
        format!("b_{}", self.id)
    }
}

/// Build holdings from the cell graph plus the attribute feed's province and
/// settlement tables. Returns the holdings (sorted by id) and the wasteland
/// province-id set.
pub fn build_holdings(
    graph: &CellGraph,
    provinces: &[ProvinceRecord],
    settlements: &[&BurgRecord],
) -> Result<(Vec<Holding>, BTreeSet<u32>), ConvertError> {
    // Settlement lookup by owning cell, rejecting duplicate claims up front.
    let mut settlement_by_cell: BTreeMap<u32, &BurgRecord> = BTreeMap::new();
    for &burg in settlements {
        if settlement_by_cell.insert(burg.cell, burg).is_some() {
            return Err(ConvertError::DataIntegrity(format!(
                "two settlements claim cell {}",
                burg.cell
            )));
        }
    }

    // A province row with no matching geometry is unreconstructible.
    for province in provinces {
        if province.i != 0 && !graph.province_members().contains_key(&province.i) {
            return Err(ConvertError::DataIntegrity(format!(
                "province {} has zero matching geometry",
                province.i
            )));
        }
    }

    let mut holdings = Vec::new();
    let mut wastelands: BTreeSet<u32> = BTreeSet::new();
    wastelands.insert(0);
    let mut claimed: BTreeMap<u32, u32> = BTreeMap::new(); // settlement id -> holding id

    for (&province_id, members) in graph.province_members() {
        if province_id == 0 {
            continue;
        }

        // At most one settlement may anchor a holding; cells each carry at
        // most one, so scan members in id order for determinism.
        let mut anchor: Option<&BurgRecord> = None;
        for cell_id in members {
            if let Some(&burg) = settlement_by_cell.get(cell_id) {
                if let Some(existing) = anchor {
                    return Err(ConvertError::DataIntegrity(format!(
                        "settlements {} and {} both claim province {}",
                        existing.i, burg.i, province_id
                    )));
                }
                anchor = Some(burg);
            }
        }

        let (name, settlement) = match anchor {
            Some(burg) => {
                claimed.insert(burg.i, province_id);
                (burg.name.clone(), Some(burg.i))
            }
            None => {
                wastelands.insert(province_id);
                (format!("wasteland_{}", province_id), None)
            }
        };

        holdings.push(Holding {
            id: province_id,
            // Provisional; the hierarchy assembler recolors holdings so
            // siblings under one county never clash.
            color: palette::hash_color(&name),
            name,
            cells: members.clone(),
            settlement,
            state: graph
                .get(members[0])
                .map(|c| c.state)
                .unwrap_or_default(),
            liege: None,
        });
    }

    // Orphan settlements: every settlement must have resolved to a holding.
    for burg in settlements {
        if !claimed.contains_key(&burg.i) {
            return Err(ConvertError::DataIntegrity(format!(
                "orphan settlement {} ({}): owning cell {} matches no holding",
                burg.i, burg.name, burg.cell
            )));
        }
    }

    log::info!(
        "Built {} holdings ({} wasteland, sentinel included)",
        holdings.len(),
        wastelands.len()
    );

    Ok((holdings, wastelands))
}
