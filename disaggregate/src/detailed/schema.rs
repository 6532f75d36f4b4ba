use std::collections::BTreeMap;

use anyhow::Result;

use crate::record::NOT_FOUND;
use crate::table::Table;

/// A logical field of an upstream trip list. Different upstream models have named these
/// columns differently over time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    TripMode,
    ModeLabel,
    HouseholdId,
    PersonId,
    TourId,
    TripId,
    OriginCell,
    DestinationCell,
    ParkingCell,
    OriginZone,
    DestinationZone,
    BoardingCell,
    AlightingCell,
    ArrivalMode,
    TourDriver,
    Period,
    Direction,
    ExpansionWeight,
}

impl Field {
    pub fn all() -> Vec<Field> {
        vec![
            Field::TripMode,
            Field::ModeLabel,
            Field::HouseholdId,
            Field::PersonId,
            Field::TourId,
            Field::TripId,
            Field::OriginCell,
            Field::DestinationCell,
            Field::ParkingCell,
            Field::OriginZone,
            Field::DestinationZone,
            Field::BoardingCell,
            Field::AlightingCell,
            Field::ArrivalMode,
            Field::TourDriver,
            Field::Period,
            Field::Direction,
            Field::ExpansionWeight,
        ]
    }

    /// Column names that can hold this field, most preferred first.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Field::TripMode => &["tripMode", "trip_mode"],
            Field::ModeLabel => &["MODE"],
            Field::HouseholdId => &["hh_id"],
            Field::PersonId => &["person_id"],
            Field::TourId => &["tourID", "tour_id"],
            Field::TripId => &["tripID", "id", "stop_id"],
            Field::OriginCell => &["originMGRA", "orig_mgra"],
            Field::DestinationCell => &["destinationMGRA", "dest_mgra"],
            Field::ParkingCell => &["parking_mgra"],
            Field::OriginZone => &["originTAZ", "OTAZ"],
            Field::DestinationZone => &["destinationTAZ", "DTAZ"],
            Field::BoardingCell => &["boardingTAP", "trip_board_tap"],
            Field::AlightingCell => &["alightingTAP", "trip_alight_tap"],
            Field::ArrivalMode => &["arrivalMode"],
            Field::TourDriver => &["driver"],
            Field::Period => &[
                "departTimeAbmHalfHour",
                "departTime",
                "period",
                "stop_period",
            ],
            Field::Direction => &["direction", "inbound"],
            Field::ExpansionWeight => &["TRIPS", "weightTrip"],
        }
    }

    /// Trip modes are codes, but commercial vehicle and truck lists reuse the column names for
    /// labels; those columns are ignored. Mode labels are only read from text columns.
    fn accepts(self, data: &Table, col: usize) -> bool {
        match self {
            Field::TripMode => data.is_numeric_column(col),
            Field::ModeLabel => !data.is_numeric_column(col),
            _ => true,
        }
    }
}

/// Which leg of a tour a trip is on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Outbound,
    Inbound,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Outbound => Direction::Inbound,
            Direction::Inbound => Direction::Outbound,
        }
    }
}

/// The fields of one trip-list row, with defaults filled in for absent columns. Zones are None
/// when the list doesn't carry them and they must come from the cells. Transit access cells are
/// -1 when absent.
#[derive(Clone, Debug, PartialEq)]
pub struct TripRow {
    pub mode: i32,
    /// Implied by a shared-ride mode label. The occupancy of the mode code itself wins.
    pub declared_occupancy: Option<f64>,
    /// Any other mode label names the vehicle, like a truck class.
    pub vehicle_label: Option<String>,
    pub hh_id: i64,
    pub person_id: i64,
    pub tour_id: i64,
    pub trip_id: i64,
    pub origin_cell: i32,
    pub destination_cell: i32,
    pub origin_zone: Option<i32>,
    pub destination_zone: Option<i32>,
    pub boarding_cell: i32,
    pub alighting_cell: i32,
    pub arrival_mode: i32,
    pub driver: i32,
    pub period: i32,
    pub direction: Direction,
    pub weight: Option<f64>,
}

/// The column chosen for every logical field of one trip list. Resolved once, up front.
pub struct TripListSchema {
    columns: BTreeMap<Field, (usize, &'static str)>,
}

impl TripListSchema {
    pub fn resolve(data: &Table) -> TripListSchema {
        let mut columns = BTreeMap::new();
        for field in Field::all() {
            let found = field.candidates().iter().find_map(|name| {
                data.column(name)
                    .filter(|idx| field.accepts(data, *idx))
                    .map(|idx| (idx, *name))
            });
            if let Some(col) = found {
                columns.insert(field, col);
            }
        }
        TripListSchema { columns }
    }

    /// The name of the column a field comes from, if any.
    pub fn column_name(&self, field: Field) -> Option<&'static str> {
        self.columns.get(&field).map(|(_, name)| *name)
    }

    fn f64_field(&self, data: &Table, row: usize, field: Field) -> Result<Option<f64>> {
        match self.columns.get(&field) {
            Some((idx, _)) => Ok(Some(data.f64_at(row, *idx)?)),
            None => Ok(None),
        }
    }

    fn i64_field(&self, data: &Table, row: usize, field: Field) -> Result<Option<i64>> {
        Ok(self.f64_field(data, row, field)?.map(|x| x as i64))
    }

    fn i32_field(&self, data: &Table, row: usize, field: Field) -> Result<Option<i32>> {
        Ok(self.f64_field(data, row, field)?.map(|x| x as i32))
    }

    /// Some lists spell direction as "true" or "false" for inbound.
    fn direction(&self, data: &Table, row: usize) -> Result<Direction> {
        let (idx, _) = match self.columns.get(&Field::Direction) {
            Some(x) => x,
            None => return Ok(Direction::Outbound),
        };
        let inbound = match data.str_at(row, *idx)? {
            x if x.eq_ignore_ascii_case("true") => true,
            x if x.eq_ignore_ascii_case("false") => false,
            _ => data.i32_at(row, *idx)? != 0,
        };
        Ok(if inbound {
            Direction::Inbound
        } else {
            Direction::Outbound
        })
    }

    /// "S2" and "S3" labels stand for shared-ride modes 2 and 3.
    fn mode_label(
        &self,
        data: &Table,
        row: usize,
    ) -> Result<(Option<i32>, Option<f64>, Option<String>)> {
        let (idx, _) = match self.columns.get(&Field::ModeLabel) {
            Some(x) => x,
            None => return Ok((None, None, None)),
        };
        let label = data.str_at(row, *idx)?;
        Ok(if label.contains("S2") {
            (Some(2), Some(2.0), None)
        } else if label.contains("S3") {
            (Some(3), Some(3.5), None)
        } else if label.is_empty() {
            (None, None, None)
        } else {
            (None, None, Some(label.to_string()))
        })
    }

    pub fn read_row(&self, data: &Table, row: usize) -> Result<TripRow> {
        let (labeled_mode, declared_occupancy, vehicle_label) = self.mode_label(data, row)?;
        let mode = match labeled_mode {
            Some(mode) => mode,
            None => self.i32_field(data, row, Field::TripMode)?.unwrap_or(1),
        };
        let mut destination_cell = self.i32_field(data, row, Field::DestinationCell)?.unwrap_or(0);
        if let Some(parking) = self.i32_field(data, row, Field::ParkingCell)? {
            if parking > 0 {
                destination_cell = parking;
            }
        }
        Ok(TripRow {
            mode,
            declared_occupancy,
            vehicle_label,
            hh_id: self.i64_field(data, row, Field::HouseholdId)?.unwrap_or(0),
            person_id: self.i64_field(data, row, Field::PersonId)?.unwrap_or(0),
            tour_id: self.i64_field(data, row, Field::TourId)?.unwrap_or(0),
            trip_id: self.i64_field(data, row, Field::TripId)?.unwrap_or(0),
            origin_cell: self.i32_field(data, row, Field::OriginCell)?.unwrap_or(0),
            destination_cell,
            origin_zone: self.i32_field(data, row, Field::OriginZone)?,
            destination_zone: self.i32_field(data, row, Field::DestinationZone)?,
            boarding_cell: self.i32_field(data, row, Field::BoardingCell)?.unwrap_or(NOT_FOUND),
            alighting_cell: self.i32_field(data, row, Field::AlightingCell)?.unwrap_or(NOT_FOUND),
            arrival_mode: self.i32_field(data, row, Field::ArrivalMode)?.unwrap_or(0),
            driver: self.i32_field(data, row, Field::TourDriver)?.unwrap_or(-1),
            period: self.i32_field(data, row, Field::Period)?.unwrap_or(0),
            direction: self.direction(data, row)?,
            weight: self.f64_field(data, row, Field::ExpansionWeight)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_wins() {
        let data = Table::from_reader(
            "trips",
            "hh_id,tour_id,tourID,stop_id,id,orig_mgra,dest_mgra,parking_mgra,trip_mode,\
             stop_period,inbound\n\
             7,1,11,3,4,100,200,0,5,9,true\n\
             7,1,11,3,5,100,200,250,5,0,0\n"
                .as_bytes(),
        )
        .unwrap();
        let schema = TripListSchema::resolve(&data);
        assert_eq!(Some("tourID"), schema.column_name(Field::TourId));
        assert_eq!(Some("id"), schema.column_name(Field::TripId));
        assert_eq!(None, schema.column_name(Field::OriginZone));

        let first = schema.read_row(&data, 0).unwrap();
        assert_eq!(
            TripRow {
                mode: 5,
                declared_occupancy: None,
                vehicle_label: None,
                hh_id: 7,
                person_id: 0,
                tour_id: 11,
                trip_id: 4,
                origin_cell: 100,
                destination_cell: 200,
                origin_zone: None,
                destination_zone: None,
                boarding_cell: -1,
                alighting_cell: -1,
                arrival_mode: 0,
                driver: -1,
                period: 9,
                direction: Direction::Inbound,
                weight: None,
            },
            first
        );

        let second = schema.read_row(&data, 1).unwrap();
        assert_eq!(250, second.destination_cell);
        assert_eq!(Direction::Outbound, second.direction);
        assert_eq!(0, second.period);
    }

    #[test]
    fn defaults_for_a_sparse_list() {
        let data = Table::from_reader(
            "trips",
            "originTAZ,DTAZ,TRIPS\n12,4001,0.4\n".as_bytes(),
        )
        .unwrap();
        let schema = TripListSchema::resolve(&data);
        let row = schema.read_row(&data, 0).unwrap();
        assert_eq!(1, row.mode);
        assert_eq!(Some(12), row.origin_zone);
        assert_eq!(Some(4001), row.destination_zone);
        assert_eq!(0, row.origin_cell);
        assert_eq!(Some(0.4), row.weight);
        assert_eq!(-1, row.driver);
    }

    #[test]
    fn malformed_values_abort() {
        let data = Table::from_reader("trips", "hh_id,trip_mode\nabc,1\n".as_bytes()).unwrap();
        let schema = TripListSchema::resolve(&data);
        assert!(schema.read_row(&data, 0).is_err());
    }

    #[test]
    fn text_trip_modes_are_skipped() {
        // A label in tripMode falls through to trip_mode, and then to the default
        let data =
            Table::from_reader("trips", "tripMode,trip_mode\nlightTruck,4\n".as_bytes()).unwrap();
        let schema = TripListSchema::resolve(&data);
        assert_eq!(Some("trip_mode"), schema.column_name(Field::TripMode));
        assert_eq!(4, schema.read_row(&data, 0).unwrap().mode);

        let data = Table::from_reader("trips", "tripMode\nlightTruck\n".as_bytes()).unwrap();
        let schema = TripListSchema::resolve(&data);
        assert_eq!(None, schema.column_name(Field::TripMode));
        assert_eq!(1, schema.read_row(&data, 0).unwrap().mode);
    }

    #[test]
    fn mode_labels() {
        let data = Table::from_reader(
            "trips",
            "tripMode,MODE,TRIPS\n1,S2,1\n1,S3,1\n1,mediumTruck,1\n1,,1\n".as_bytes(),
        )
        .unwrap();
        let schema = TripListSchema::resolve(&data);
        assert_eq!(Some("MODE"), schema.column_name(Field::ModeLabel));

        let s2 = schema.read_row(&data, 0).unwrap();
        assert_eq!((2, Some(2.0), None), (s2.mode, s2.declared_occupancy, s2.vehicle_label));
        let s3 = schema.read_row(&data, 1).unwrap();
        assert_eq!((3, Some(3.5), None), (s3.mode, s3.declared_occupancy, s3.vehicle_label));
        let truck = schema.read_row(&data, 2).unwrap();
        assert_eq!(1, truck.mode);
        assert_eq!(None, truck.declared_occupancy);
        assert_eq!(Some("mediumTruck".to_string()), truck.vehicle_label);
        let blank = schema.read_row(&data, 3).unwrap();
        assert_eq!((1, None), (blank.mode, blank.vehicle_label));

        // A numeric MODE column isn't a label
        let data = Table::from_reader("trips", "MODE\n2\n".as_bytes()).unwrap();
        let schema = TripListSchema::resolve(&data);
        assert_eq!(None, schema.column_name(Field::ModeLabel));
    }

    #[test]
    fn transit_access_cells() {
        let data = Table::from_reader(
            "trips",
            "trip_mode,trip_board_tap,boardingTAP,trip_alight_tap\n16,3,4,5\n".as_bytes(),
        )
        .unwrap();
        let schema = TripListSchema::resolve(&data);
        let row = schema.read_row(&data, 0).unwrap();
        assert_eq!(4, row.boarding_cell);
        assert_eq!(5, row.alighting_cell);
    }
}
