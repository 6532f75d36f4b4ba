use std::collections::BTreeMap;

use anyhow::Result;
use rand::Rng;

use crate::probability::{ConditionalTable, ScannedRow, TieBreak};
use crate::table::Table;

/// Which end of a trip a zone-to-cell distribution describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TripEnd {
    Productions,
    Attractions,
}

impl TripEnd {
    /// The zone-to-cell column holding this end's probabilities for a market segment.
    pub fn probability_column(self, market_segment: &str) -> String {
        let suffix = match self {
            TripEnd::Productions => "Prods",
            TripEnd::Attractions => "Attrs",
        };
        format!("{}{}", market_segment, suffix)
    }
}

/// Samples a finer spatial unit inside a coarser one: a cell inside a zone, or a network node
/// inside a cell. The whole table is scanned for every sample.
pub struct SpatialDisaggregator {
    table: ConditionalTable,
    label: &'static str,
}

impl SpatialDisaggregator {
    pub fn new(
        outer: Vec<i32>,
        inner: Vec<i32>,
        probability: Vec<f64>,
        label: &'static str,
    ) -> SpatialDisaggregator {
        SpatialDisaggregator {
            table: ConditionalTable::new(outer, inner, probability),
            label,
        }
    }

    /// Cells within zones, from the `taz`, `mgra`, and `<segment>Prods` or `<segment>Attrs`
    /// columns.
    pub fn cells_from_zones(
        data: &Table,
        market_segment: &str,
        end: TripEnd,
    ) -> Result<SpatialDisaggregator> {
        let prob_col = end.probability_column(market_segment);
        Ok(SpatialDisaggregator::new(
            data.i32_column("taz")?,
            data.i32_column("mgra")?,
            data.f64_column(&prob_col)?,
            "TAZ    MGRA",
        ))
    }

    /// Network nodes within cells, from the `MGRA`, `NodeId`, and `Probability` columns.
    pub fn nodes_from_cells(data: &Table) -> Result<SpatialDisaggregator> {
        Ok(SpatialDisaggregator::new(
            data.i32_column("MGRA")?,
            data.i32_column("NodeId")?,
            data.f64_column("Probability")?,
            "MGRA    Node",
        ))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Draws one uniform value and returns the selected inner key, or None if the outer key has
    /// no rows or its probabilities never exceed the draw.
    pub fn select<R: Rng>(&self, rng: &mut R, outer: i32, debug: bool) -> Option<i32> {
        let draw: f64 = rng.gen();
        self.select_with_draw(outer, draw, debug)
    }

    pub fn select_with_draw(&self, outer: i32, draw: f64, debug: bool) -> Option<i32> {
        let row = if debug {
            info!("{}     Prob     cumProb     randomNumber", self.label);
            let mut cb = |r: ScannedRow| {
                info!(
                    "{}     {}     {}     {}     {}",
                    r.outer,
                    r.inner,
                    r.probability,
                    r.cumulative,
                    r.draw
                )
            };
            self.table
                .sample(outer, 0, draw, TieBreak::Exceeds, Some(&mut cb))
        } else {
            self.table.sample(outer, 0, draw, TieBreak::Exceeds, None)
        };
        row.map(|r| self.table.inner_key(r))
    }
}

/// The zone each cell belongs to, taken from the `taz` and `mgra` columns of a zone-to-cell
/// table.
pub struct CellZones {
    zone_of: BTreeMap<i32, i32>,
}

impl CellZones {
    pub fn new(zone_of: BTreeMap<i32, i32>) -> CellZones {
        CellZones { zone_of }
    }

    pub fn from_table(data: &Table) -> Result<CellZones> {
        let zones = data.i32_column("taz")?;
        let cells = data.i32_column("mgra")?;
        let mut zone_of = BTreeMap::new();
        for (cell, zone) in cells.into_iter().zip(zones) {
            if let Some(prev) = zone_of.insert(cell, zone) {
                if prev != zone {
                    bail!(
                        "{} puts cell {} in both zone {} and zone {}",
                        data.name(),
                        cell,
                        prev,
                        zone
                    );
                }
            }
        }
        Ok(CellZones { zone_of })
    }

    pub fn zone(&self, cell: i32) -> Option<i32> {
        self.zone_of.get(&cell).cloned()
    }
}
