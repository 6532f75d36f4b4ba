use std::io::Write;

use anyhow::{Context, Result};
use rand::Rng;

use crate::matrix::ODMatrix;
use crate::probability::stochastic_round;
use crate::record::{TripRecord, VehicleClass, NOT_FOUND};
use crate::sink::TripWriter;
use crate::spatial::SpatialDisaggregator;
use crate::stats::{Sentinel, SentinelCounts};
use crate::table::Table;
use crate::temporal::TemporalDisaggregator;
use crate::trace::TraceFilter;
use crate::SENTINEL_CELL_BASE;

/// Names one aggregate trip matrix and the attributes shared by every trip in it.
#[derive(Clone, Debug, PartialEq)]
pub struct MatrixDescriptor {
    pub file_name: String,
    pub market_segment: String,
    pub matrix_name: String,
    pub broad_period: i32,
    pub vehicle_class: VehicleClass,
    pub occupancy: i32,
    pub toll_eligible: bool,
}

impl MatrixDescriptor {
    /// One descriptor per row, from the `fileName`, `marketSegment`, `matrixName`, `TOD`,
    /// `vehicleType`, `vehOcc`, and `Toll` columns.
    pub fn read_all(data: &Table) -> Result<Vec<MatrixDescriptor>> {
        let file_name = data.require_column("fileName")?;
        let market_segment = data.require_column("marketSegment")?;
        let matrix_name = data.require_column("matrixName")?;
        let tod = data.require_column("TOD")?;
        let vehicle_type = data.require_column("vehicleType")?;
        let occupancy = data.require_column("vehOcc")?;
        let toll = data.require_column("Toll")?;

        let mut list = Vec::new();
        for row in 0..data.num_rows() {
            let vehicle_label = data.str_at(row, vehicle_type)?;
            if vehicle_label.contains(',') {
                bail!(
                    "{} row {}: vehicle type {} has a comma",
                    data.name(),
                    row + 1,
                    vehicle_label
                );
            }
            list.push(MatrixDescriptor {
                file_name: data.str_at(row, file_name)?.to_string(),
                market_segment: data.str_at(row, market_segment)?.to_string(),
                matrix_name: data.str_at(row, matrix_name)?.to_string(),
                broad_period: data.i32_at(row, tod)?,
                vehicle_class: VehicleClass::parse(vehicle_label),
                occupancy: data.i32_at(row, occupancy)?,
                toll_eligible: data.i32_at(row, toll)? != 0,
            });
        }
        Ok(list)
    }
}

/// The probability tables a broad pipeline samples from. The temporal and zone-to-cell tables
/// depend on the market segment being processed.
pub struct BroadTables<'a> {
    pub temporal: &'a TemporalDisaggregator,
    pub production_cells: &'a SpatialDisaggregator,
    pub attraction_cells: &'a SpatialDisaggregator,
    pub nodes: &'a SpatialDisaggregator,
}

/// Expands aggregate zone-to-zone matrices into individual trips, each with a sampled DTA period,
/// cells, and nodes.
pub struct BroadPipeline<'a, R: Rng> {
    tables: BroadTables<'a>,
    trace: &'a TraceFilter,
    rng: R,
    sentinels: SentinelCounts,
}

impl<'a, R: Rng> BroadPipeline<'a, R> {
    pub fn new(tables: BroadTables<'a>, trace: &'a TraceFilter, rng: R) -> BroadPipeline<'a, R> {
        BroadPipeline {
            tables,
            trace,
            rng,
            sentinels: SentinelCounts::new(),
        }
    }

    pub fn sentinels(&self) -> &SentinelCounts {
        &self.sentinels
    }

    pub fn into_sentinels(self) -> SentinelCounts {
        self.sentinels
    }

    /// Writes every trip from one matrix, returning how many were written. Cells are visited in
    /// row-major order; each one with a positive value consumes one draw to round its count,
    /// then five draws per trip.
    pub fn run<W: Write>(
        &mut self,
        desc: &MatrixDescriptor,
        matrix: &ODMatrix,
        out: &mut TripWriter<W>,
    ) -> Result<usize> {
        info!("*************************************");
        info!("Summary info for matrix {}", desc.matrix_name);
        info!("Market Segment = {}", desc.market_segment);
        info!("Vehicle Type = {}", desc.vehicle_class);
        info!("Vehicle Occupancy = {}", desc.occupancy);
        info!("Toll Eligibility = {}", desc.toll_eligible);
        info!("Number of Trips = {}", matrix.sum());
        info!("*************************************");

        let mut total_trips = 0;
        for (origin, destination, value) in matrix.nonzero_cells() {
            if value < 0.0 {
                continue;
            }
            let draw: f64 = self.rng.gen();
            let num_trips = stochastic_round(value, draw);
            for _ in 0..num_trips {
                let trip = self.disaggregate_trip(desc, origin, destination);
                out.write(&trip).with_context(|| {
                    format!("writing trips from {}, {}", desc.file_name, desc.matrix_name)
                })?;
            }
            total_trips += num_trips;
        }
        info!(
            "Created {} trip records from matrix: {}, {}",
            dtautil::prettyprint_usize(total_trips),
            desc.file_name,
            desc.matrix_name
        );
        Ok(total_trips)
    }

    fn disaggregate_trip(
        &mut self,
        desc: &MatrixDescriptor,
        origin: i32,
        destination: i32,
    ) -> TripRecord {
        let mut trip = TripRecord::zeroed();
        trip.expansion_factor = 1.0;
        trip.market_segment = desc.market_segment.clone();
        trip.broad_period = desc.broad_period;
        trip.origin_zone = origin;
        trip.destination_zone = destination;
        trip.vehicle_class = desc.vehicle_class.clone();
        trip.occupancy = desc.occupancy;
        trip.toll_eligible = desc.toll_eligible;

        let debug = self.trace.is_traced_origin(origin);
        if debug {
            info!("*******************************");
            info!("Disaggregating trace trip from a broad matrix");
            info!("Market Segment = {}", trip.market_segment);
            info!("Origin Zone = {}", origin);
            info!("Destination Zone = {}", destination);
            info!("Trip period = {}", trip.broad_period);
        }

        let period = self
            .tables
            .temporal
            .sample(&mut self.rng, desc.broad_period, debug);
        trip.dta_period = self
            .sentinels
            .check(Sentinel::Period, period)
            .unwrap_or(NOT_FOUND);

        // Both cells are sampled within the origin zone. Calibrated outputs depend on this, so
        // don't switch the destination cell to the destination zone.
        let origin_cell = self
            .tables
            .production_cells
            .select(&mut self.rng, origin, debug);
        let destination_cell = self
            .tables
            .attraction_cells
            .select(&mut self.rng, origin, debug);
        let origin_cell = self.sentinels.check(Sentinel::Cell, origin_cell);
        let destination_cell = self.sentinels.check(Sentinel::Cell, destination_cell);
        trip.origin_cell = origin_cell.unwrap_or(NOT_FOUND);
        trip.destination_cell = destination_cell.unwrap_or(NOT_FOUND);

        let origin_node = self.tables.nodes.select(
            &mut self.rng,
            origin_cell.unwrap_or(SENTINEL_CELL_BASE + origin),
            debug,
        );
        let destination_node = self.tables.nodes.select(
            &mut self.rng,
            destination_cell.unwrap_or(SENTINEL_CELL_BASE + destination),
            debug,
        );
        trip.origin_node = self
            .sentinels
            .check(Sentinel::Node, origin_node)
            .unwrap_or(NOT_FOUND);
        trip.destination_node = self
            .sentinels
            .check(Sentinel::Node, destination_node)
            .unwrap_or(NOT_FOUND);
        trip
    }
}
