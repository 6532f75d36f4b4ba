use std::io::Write;

use anyhow::{Context, Result};
use rand::Rng;

use crate::probability::stochastic_round;
use crate::record::{TripRecord, VehicleClass, NOT_FOUND};
use crate::sink::TripWriter;
use crate::skims::{periods_for_minutes, SkimBand, SkimSet};
use crate::spatial::{CellZones, SpatialDisaggregator};
use crate::stats::{Sentinel, SentinelCounts};
use crate::table::Table;
use crate::temporal::TemporalDisaggregator;
use crate::trace::TraceFilter;
use crate::SENTINEL_CELL_BASE;

pub use self::schema::{Direction, Field, TripListSchema, TripRow};

mod schema;

/// Rows with this trip mode aren't trips at all.
const SKIPPED_MODE: i32 = -99;
/// An arrival mode meaning the traveler walked from wherever they were dropped off.
const WALK_EGRESS: i32 = 5;
/// Extra fine periods between a paired trip and the supplemental drive.
const TURNAROUND_PERIODS: i32 = 2;

/// The probability tables and lookups a detailed pipeline uses. The zone-to-cell tables are
/// only needed when the trip list has rows without a cell.
pub struct DetailedTables<'a> {
    pub temporal: &'a TemporalDisaggregator,
    pub production_cells: Option<&'a SpatialDisaggregator>,
    pub attraction_cells: Option<&'a SpatialDisaggregator>,
    pub nodes: &'a SpatialDisaggregator,
    pub cell_zones: &'a CellZones,
    pub skims: &'a SkimSet,
}

/// Shared-ride trips in a trip list are one row per traveler, but only one vehicle moves. The
/// expansion of each row is divided by the mode's typical occupancy. Joint trips are already
/// one row per vehicle, so only a mode label's occupancy applies to them.
pub fn occupancy_divisor(mode: i32, declared: Option<f64>, market_segment: &str) -> f64 {
    let by_mode = if market_segment.eq_ignore_ascii_case("JointTrips") {
        None
    } else {
        match mode {
            3 | 4 | 5 | 27 => Some(2.0),
            6 | 7 | 8 => {
                if market_segment.eq_ignore_ascii_case("IndividualTrips") {
                    Some(3.34)
                } else {
                    Some(3.50)
                }
            }
            _ => None,
        }
    };
    by_mode.or(declared).unwrap_or(1.0)
}

fn is_drive_transit(mode: i32) -> bool {
    (16..=25).contains(&mode)
}

/// The replicate count is shared by consecutive rows of the same tour.
#[derive(Clone, Copy)]
struct TourMemo {
    tour_id: i64,
    person_id: i64,
    hh_id: i64,
    mode: i32,
    replicates: usize,
}

/// Expands individual trips from an activity-based model into vehicle trips, each with a
/// sampled DTA period and nodes. Drop-offs also get the driver's return leg, and drive-transit
/// trips get the drive to or from the station.
pub struct DetailedPipeline<'a, R: Rng> {
    tables: DetailedTables<'a>,
    market_segment: String,
    sample_rate: f64,
    trace: &'a TraceFilter,
    rng: R,
    sentinels: SentinelCounts,
    memo: Option<TourMemo>,
}

impl<'a, R: Rng> DetailedPipeline<'a, R> {
    pub fn new(
        tables: DetailedTables<'a>,
        market_segment: &str,
        sample_rate: f64,
        trace: &'a TraceFilter,
        rng: R,
    ) -> DetailedPipeline<'a, R> {
        DetailedPipeline {
            tables,
            market_segment: market_segment.to_string(),
            sample_rate,
            trace,
            rng,
            sentinels: SentinelCounts::new(),
            memo: None,
        }
    }

    pub fn sentinels(&self) -> &SentinelCounts {
        &self.sentinels
    }

    pub fn into_sentinels(self) -> SentinelCounts {
        self.sentinels
    }

    /// Writes every trip from one trip list, returning how many were written (supplemental
    /// trips included).
    pub fn run<W: Write>(&mut self, trips: &Table, out: &mut TripWriter<W>) -> Result<usize> {
        let schema = TripListSchema::resolve(trips);
        for field in Field::all() {
            match schema.column_name(field) {
                Some(col) => debug!("{:?} comes from {}", field, col),
                None => debug!("{:?} isn't in {}, using a default", field, trips.name()),
            }
        }

        let mut total_trips = 0;
        for row in 0..trips.num_rows() {
            if row < 10 || row % 10_000 == 0 {
                info!("Processing record {}", dtautil::prettyprint_usize(row + 1));
            }
            let trip_row = schema
                .read_row(trips, row)
                .with_context(|| format!("{} row {}", trips.name(), row + 1))?;
            total_trips += self
                .disaggregate_row(trip_row, out)
                .with_context(|| format!("disaggregating {} row {}", trips.name(), row + 1))?;
        }

        info!(
            "Created {} trip records from {} trip list rows in {}",
            dtautil::prettyprint_usize(total_trips),
            dtautil::prettyprint_usize(trips.num_rows()),
            trips.name()
        );
        Ok(total_trips)
    }

    fn disaggregate_row<W: Write>(
        &mut self,
        mut row: TripRow,
        out: &mut TripWriter<W>,
    ) -> Result<usize> {
        if row.mode == SKIPPED_MODE {
            return Ok(0);
        }

        let origin_zone = match row.origin_zone {
            Some(zone) => zone,
            None => self.zone_of(row.origin_cell),
        };
        let destination_zone = match row.destination_zone {
            Some(zone) => zone,
            None => self.zone_of(row.destination_cell),
        };
        let debug =
            self.trace.is_traced_household(row.hh_id) || self.trace.is_traced_origin(origin_zone);

        if row.origin_cell == 0 {
            row.origin_cell = self.cell_in_zone(self.tables.production_cells, origin_zone, debug);
        }
        if row.destination_cell == 0 {
            row.destination_cell =
                self.cell_in_zone(self.tables.attraction_cells, destination_zone, debug);
        }
        if row.period == 0 {
            row.period = 1;
        }

        let divisor = occupancy_divisor(row.mode, row.declared_occupancy, &self.market_segment);
        let factor = row.weight.unwrap_or(1.0 / self.sample_rate) / divisor;
        let replicates = self.replicate_count(&row, factor);
        let drive_transit = is_drive_transit(row.mode);
        let drop_off = row.arrival_mode == WALK_EGRESS && divisor > 1.0;

        let mut written = 0;
        for _ in 0..replicates {
            let mut trip = TripRecord::zeroed();
            trip.hh_id = row.hh_id;
            trip.person_id = row.person_id;
            trip.tour_id = row.tour_id;
            trip.trip_id = row.trip_id;
            trip.market_segment = self.market_segment.clone();
            trip.origin_cell = row.origin_cell;
            trip.destination_cell = row.destination_cell;
            trip.origin_zone = origin_zone;
            trip.destination_zone = destination_zone;
            trip.apply_trip_mode(row.mode);
            if let Some(ref label) = row.vehicle_label {
                trip.vehicle_class = VehicleClass::parse(label);
            }
            trip.detailed_period = row.period;
            trip.driver = row.driver;
            trip.expansion_factor = 1.0;

            if debug {
                info!("*******************************");
                info!("Disaggregating trace trip from a trip list");
                info!("Market Segment = {}", trip.market_segment);
                info!("Household = {}", trip.hh_id);
                info!("Person = {}", trip.person_id);
                info!("Tour = {}", trip.tour_id);
                info!("Trip period = {}", trip.detailed_period);
            }

            // Nodes are drawn before the period
            trip.origin_node = self.node_in_cell(trip.origin_cell, debug);
            trip.destination_node = self.node_in_cell(trip.destination_cell, debug);
            let period = self
                .tables
                .temporal
                .sample(&mut self.rng, row.period, debug);
            trip.dta_period = self
                .sentinels
                .check(Sentinel::Period, period)
                .unwrap_or(NOT_FOUND);
            out.write(&trip)?;
            written += 1;

            let supplemental = if drive_transit {
                // The access drive ends at the boarding stop and precedes an outbound transit
                // trip. The egress drive starts at the alighting stop and follows an inbound one.
                let (trip_dest_cell, trip_orig_cell) = match row.direction {
                    Direction::Outbound => (row.boarding_cell, row.origin_cell),
                    Direction::Inbound => (row.destination_cell, row.alighting_cell),
                };
                Some(self.add_sov_trip(
                    row.direction.opposite(),
                    row.period,
                    trip.dta_period,
                    trip_dest_cell,
                    trip_orig_cell,
                    false,
                    debug,
                ))
            } else if drop_off {
                // The driver heads back from the drop-off
                Some(self.add_sov_trip(
                    row.direction,
                    row.period,
                    trip.dta_period,
                    row.origin_cell,
                    row.destination_cell,
                    true,
                    debug,
                ))
            } else {
                None
            };
            if let Some(supplemental) = supplemental {
                out.write(&supplemental)?;
                written += 1;
            }
        }
        Ok(written)
    }

    /// How many copies of a row to write. Consecutive rows from the same tour keep the first
    /// row's count, unless the trip mode changes.
    fn replicate_count(&mut self, row: &TripRow, factor: f64) -> usize {
        let recompute = match self.memo {
            None => true,
            Some(last) => {
                last.tour_id != row.tour_id
                    || last.person_id != row.person_id
                    || last.hh_id != row.hh_id
                    || (row.tour_id == 0 && row.hh_id == 0)
                    || last.mode != row.mode
            }
        };
        // When nothing changed, the old count is reused as-is. An older version of this rule
        // had a branch here that drew a number and then added 0 to the count; it's not carried
        // over, and shouldn't be "fixed" into a recomputation.
        let replicates = match self.memo {
            Some(last) if !recompute => last.replicates,
            _ => {
                let draw: f64 = self.rng.gen();
                stochastic_round(factor, draw)
            }
        };
        self.memo = Some(TourMemo {
            tour_id: row.tour_id,
            person_id: row.person_id,
            hh_id: row.hh_id,
            mode: row.mode,
            replicates,
        });
        replicates
    }

    /// Synthesizes the single-occupant drive that pairs with a drop-off or a drive to transit:
    /// from `trip_orig_cell` to `trip_dest_cell`, departing after the paired trip when outbound
    /// and before it when inbound.
    #[allow(clippy::too_many_arguments)]
    pub fn add_sov_trip(
        &mut self,
        direction: Direction,
        coarse_period: i32,
        paired_period: i32,
        trip_dest_cell: i32,
        trip_orig_cell: i32,
        toll_eligible: bool,
        debug: bool,
    ) -> TripRecord {
        let origin_zone = self.zone_of(trip_orig_cell);
        let destination_zone = self.zone_of(trip_dest_cell);

        let band = SkimBand::for_fine_period(paired_period);
        let minutes = match self
            .tables
            .skims
            .drive_time(band, origin_zone, destination_zone)
        {
            Some(x) => x,
            None => {
                self.sentinels.inc(Sentinel::Skim);
                0.0
            }
        };
        let offset = periods_for_minutes(minutes).saturating_add(TURNAROUND_PERIODS);
        let mut period = match direction {
            Direction::Outbound => paired_period.saturating_add(offset),
            Direction::Inbound => paired_period.saturating_sub(offset),
        };
        if period < 1 {
            period = 1;
        }
        let num_periods = self.tables.temporal.num_periods() as i32;
        if period > num_periods {
            period = num_periods;
        }
        if debug {
            info!(
                "Supplemental drive from cell {} to {}: {} skim, {} minutes, DTA period {} \
                 (paired with {})",
                trip_orig_cell,
                trip_dest_cell,
                band.label(),
                minutes,
                period,
                paired_period
            );
        }

        let mut trip = TripRecord::zeroed();
        trip.market_segment = self.market_segment.clone();
        trip.origin_cell = trip_orig_cell;
        trip.destination_cell = trip_dest_cell;
        trip.origin_zone = origin_zone;
        trip.destination_zone = destination_zone;
        trip.origin_node = self.node_in_cell(trip_orig_cell, debug);
        trip.destination_node = self.node_in_cell(trip_dest_cell, debug);
        trip.detailed_period = coarse_period;
        trip.dta_period = period;
        trip.vehicle_class = VehicleClass::PassengerCar;
        trip.occupancy = 1;
        trip.toll_eligible = toll_eligible;
        trip.expansion_factor = 1.0;
        trip
    }

    fn zone_of(&mut self, cell: i32) -> i32 {
        let zone = self.tables.cell_zones.zone(cell);
        self.sentinels
            .check(Sentinel::Zone, zone)
            .unwrap_or(NOT_FOUND)
    }

    /// Samples a cell for a trip end that doesn't have one. Without a table, or when nothing is
    /// sampled, the zone's sentinel cell stands in.
    fn cell_in_zone(
        &mut self,
        cells: Option<&SpatialDisaggregator>,
        zone: i32,
        debug: bool,
    ) -> i32 {
        let cell = cells.and_then(|cells| cells.select(&mut self.rng, zone, debug));
        self.sentinels
            .check(Sentinel::Cell, cell)
            .unwrap_or(SENTINEL_CELL_BASE + zone)
    }

    fn node_in_cell(&mut self, cell: i32, debug: bool) -> i32 {
        let node = self.tables.nodes.select(&mut self.rng, cell, debug);
        self.sentinels
            .check(Sentinel::Node, node)
            .unwrap_or(NOT_FOUND)
    }
}
