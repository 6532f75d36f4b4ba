use std::fmt;

/// Written in place of any id that couldn't be resolved.
pub const NOT_FOUND: i32 = -1;

/// The field order of a serialized TripRecord.
pub const HEADER: &str = "hh_id,person_id,tour_id,trip_id,originTaz,destinationTaz,originMGRA,\
                          destinationMGRA,originNode,destinationNode,vehicleType,\
                          vehicleOccupancy,tollEligibility,marketSegment,detailedPeriod,\
                          broadPeriod,dtaPeriod,driver,expansionFactor";

/// What kind of vehicle (if any) makes a trip on the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VehicleClass {
    Unassigned,
    PassengerCar,
    NonMotorized,
    WalkTransit,
    DriveTransit,
    SchoolBus,
    /// A class named by an upstream matrix, like a truck type, passed through verbatim.
    Named(String),
}

impl VehicleClass {
    pub fn label(&self) -> &str {
        match self {
            VehicleClass::Unassigned => "na",
            VehicleClass::PassengerCar => "passengerCar",
            VehicleClass::NonMotorized => "nonMotorized",
            VehicleClass::WalkTransit => "WalkTransit",
            VehicleClass::DriveTransit => "DriveTransit",
            VehicleClass::SchoolBus => "SchoolBus",
            VehicleClass::Named(x) => x,
        }
    }

    /// Recognizes the built-in labels; anything else becomes `Named`.
    pub fn parse(label: &str) -> VehicleClass {
        match label {
            "na" => VehicleClass::Unassigned,
            "passengerCar" => VehicleClass::PassengerCar,
            "nonMotorized" => VehicleClass::NonMotorized,
            "WalkTransit" => VehicleClass::WalkTransit,
            "DriveTransit" => VehicleClass::DriveTransit,
            "SchoolBus" => VehicleClass::SchoolBus,
            x => VehicleClass::Named(x.to_string()),
        }
    }
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One discrete vehicle movement handed to the traffic assignment. A pipeline fills one of these
/// in, writes it, and throws it away.
#[derive(Clone, Debug, PartialEq)]
pub struct TripRecord {
    pub hh_id: i64,
    pub person_id: i64,
    pub tour_id: i64,
    pub trip_id: i64,
    pub origin_zone: i32,
    pub destination_zone: i32,
    pub origin_cell: i32,
    pub destination_cell: i32,
    pub origin_node: i32,
    pub destination_node: i32,
    pub vehicle_class: VehicleClass,
    pub occupancy: i32,
    pub toll_eligible: bool,
    pub market_segment: String,
    /// Only meaningful for trips from an individual trip list
    pub detailed_period: i32,
    /// Only meaningful for trips from an aggregate matrix
    pub broad_period: i32,
    pub dta_period: i32,
    pub driver: i32,
    pub expansion_factor: f64,
}

impl TripRecord {
    pub fn zeroed() -> TripRecord {
        TripRecord {
            hh_id: 0,
            person_id: 0,
            tour_id: 0,
            trip_id: 0,
            origin_zone: 0,
            destination_zone: 0,
            origin_cell: 0,
            destination_cell: 0,
            origin_node: 0,
            destination_node: 0,
            vehicle_class: VehicleClass::Unassigned,
            occupancy: 0,
            toll_eligible: false,
            market_segment: "na".to_string(),
            detailed_period: 0,
            broad_period: 0,
            dta_period: 0,
            driver: -1,
            expansion_factor: 1.0,
        }
    }

    /// Sets the vehicle class, occupancy, and toll eligibility implied by an upstream trip mode
    /// code.
    pub fn apply_trip_mode(&mut self, mode: i32) {
        match mode {
            x if x <= 8 || x >= 27 => {
                self.vehicle_class = VehicleClass::PassengerCar;
                self.occupancy = match x {
                    3 | 4 | 5 | 27 => 2,
                    6 | 7 | 8 => 3,
                    _ => 1,
                };
                self.toll_eligible = matches!(x, 2 | 5 | 8);
            }
            9 | 10 => {
                self.vehicle_class = VehicleClass::NonMotorized;
                self.occupancy = 0;
                self.toll_eligible = false;
            }
            11..=15 => {
                self.vehicle_class = VehicleClass::WalkTransit;
                self.occupancy = 0;
                self.toll_eligible = false;
            }
            16..=25 => {
                self.vehicle_class = VehicleClass::DriveTransit;
                self.occupancy = 1;
                self.toll_eligible = false;
            }
            // Only 26 is left
            _ => {
                self.vehicle_class = VehicleClass::SchoolBus;
            }
        }
    }

    /// The comma-separated fields, in `HEADER` order. No escaping happens; every text field is
    /// from a controlled vocabulary.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{:?}",
            self.hh_id,
            self.person_id,
            self.tour_id,
            self.trip_id,
            self.origin_zone,
            self.destination_zone,
            self.origin_cell,
            self.destination_cell,
            self.origin_node,
            self.destination_node,
            self.vehicle_class,
            self.occupancy,
            if self.toll_eligible { 1 } else { 0 },
            self.market_segment,
            self.detailed_period,
            self.broad_period,
            self.dta_period,
            self.driver,
            self.expansion_factor
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_mode(mode: i32) -> TripRecord {
        let mut trip = TripRecord::zeroed();
        trip.apply_trip_mode(mode);
        trip
    }

    #[test]
    fn trip_modes() {
        let shared_toll = with_mode(5);
        assert_eq!(VehicleClass::PassengerCar, shared_toll.vehicle_class);
        assert_eq!(2, shared_toll.occupancy);
        assert!(shared_toll.toll_eligible);

        let walk = with_mode(9);
        assert_eq!(VehicleClass::NonMotorized, walk.vehicle_class);
        assert_eq!(0, walk.occupancy);
        assert!(!walk.toll_eligible);

        assert_eq!((1, true), (with_mode(2).occupancy, with_mode(2).toll_eligible));
        assert_eq!((1, false), (with_mode(1).occupancy, with_mode(1).toll_eligible));
        assert_eq!((3, true), (with_mode(8).occupancy, with_mode(8).toll_eligible));
        assert_eq!((3, false), (with_mode(6).occupancy, with_mode(6).toll_eligible));
        assert_eq!((2, false), (with_mode(27).occupancy, with_mode(27).toll_eligible));
        assert_eq!((1, false), (with_mode(28).occupancy, with_mode(28).toll_eligible));
        assert_eq!(VehicleClass::WalkTransit, with_mode(11).vehicle_class);
        assert_eq!(VehicleClass::WalkTransit, with_mode(15).vehicle_class);
        assert_eq!(VehicleClass::DriveTransit, with_mode(16).vehicle_class);
        assert_eq!(1, with_mode(25).occupancy);
    }

    #[test]
    fn school_bus_keeps_occupancy() {
        let mut trip = TripRecord::zeroed();
        trip.occupancy = 7;
        trip.apply_trip_mode(26);
        assert_eq!(VehicleClass::SchoolBus, trip.vehicle_class);
        assert_eq!(7, trip.occupancy);
    }

    #[test]
    fn zeroed_line() {
        assert_eq!(
            "0,0,0,0,0,0,0,0,0,0,na,0,0,na,0,0,0,-1,1.0",
            TripRecord::zeroed().to_csv_line()
        );
    }

    #[test]
    fn serialized_fields_match() {
        let trip = TripRecord {
            hh_id: 4021,
            person_id: 2,
            tour_id: 1,
            trip_id: 3,
            origin_zone: 12,
            destination_zone: 4001,
            origin_cell: 1200,
            destination_cell: 23011,
            origin_node: 880,
            destination_node: NOT_FOUND,
            vehicle_class: VehicleClass::Named("lightTruck".to_string()),
            occupancy: 1,
            toll_eligible: true,
            market_segment: "IndividualTrips".to_string(),
            detailed_period: 14,
            broad_period: 0,
            dta_period: 77,
            driver: 1,
            expansion_factor: 0.5,
        };
        let line = trip.to_csv_line();
        let fields: Vec<&str> = line.split(',').collect();
        assert_eq!(19, fields.len());
        assert_eq!(19, HEADER.split(',').count());
        assert_eq!(
            vec![
                "4021",
                "2",
                "1",
                "3",
                "12",
                "4001",
                "1200",
                "23011",
                "880",
                "-1",
                "lightTruck",
                "1",
                "1",
                "IndividualTrips",
                "14",
                "0",
                "77",
                "1",
                "0.5"
            ],
            fields
        );
        assert_eq!(trip.vehicle_class, VehicleClass::parse(fields[10]));
    }
}
