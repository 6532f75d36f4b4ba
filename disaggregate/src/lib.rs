//! Turns travel demand from an activity-based or aggregate model into the discrete, finely
//! timed, node-to-node trips a dynamic traffic assignment needs.
//!
//! Aggregate zone-to-zone matrices go through `BroadPipeline`, individual trip lists go through
//! `DetailedPipeline`. Both cascade the same two samplers: `TemporalDisaggregator` picks a fine
//! period inside a coarse one, and `SpatialDisaggregator` picks a cell inside a zone or a node
//! inside a cell. All randomness for one pipeline comes from a single seeded stream, so a run is
//! reproducible as long as the inputs are read in the same order.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

pub use self::broad::{BroadPipeline, BroadTables, MatrixDescriptor};
pub use self::detailed::{
    occupancy_divisor, DetailedPipeline, DetailedTables, Direction, Field, TripListSchema, TripRow,
};
pub use self::matrix::ODMatrix;
pub use self::probability::{stochastic_round, ConditionalTable, TieBreak};
pub use self::record::{TripRecord, VehicleClass, HEADER, NOT_FOUND};
pub use self::sink::TripWriter;
pub use self::skims::{SkimBand, SkimSet};
pub use self::spatial::{CellZones, SpatialDisaggregator, TripEnd};
pub use self::stats::{Sentinel, SentinelCounts};
pub use self::table::Table;
pub use self::temporal::TemporalDisaggregator;
pub use self::trace::TraceFilter;

mod broad;
mod detailed;
mod matrix;
pub mod probability;
mod record;
mod sink;
pub mod skims;
mod spatial;
mod stats;
mod table;
mod temporal;
mod trace;

use rand::SeedableRng;
use rand_xorshift::XorShiftRng;

/// A cell that couldn't be sampled inside a zone is replaced by this plus the zone, so node
/// lookups still have something to key on.
pub const SENTINEL_CELL_BASE: i32 = 50000;

/// The random stream a pipeline instance owns.
pub fn seeded_rng(seed: u64) -> XorShiftRng {
    XorShiftRng::seed_from_u64(seed)
}
