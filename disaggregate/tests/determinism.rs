use disaggregate::{
    seeded_rng, BroadPipeline, BroadTables, CellZones, DetailedPipeline, DetailedTables,
    MatrixDescriptor, ODMatrix, SkimSet, SpatialDisaggregator, Table, TemporalDisaggregator,
    TraceFilter, TripEnd, TripWriter,
};

struct Inputs {
    temporal: TemporalDisaggregator,
    prods: SpatialDisaggregator,
    attrs: SpatialDisaggregator,
    nodes: SpatialDisaggregator,
    cell_zones: CellZones,
    skims: SkimSet,
    matrix: ODMatrix,
    trips: Table,
}

fn table(name: &str, csv: &str) -> Table {
    Table::from_reader(name, csv.as_bytes()).unwrap()
}

fn inputs() -> Inputs {
    let zones = table(
        "zones",
        "taz,mgra,AllProds,AllAttrs\n\
         1,101,0.3,0.6\n\
         1,102,0.7,0.4\n\
         2,201,0.5,0.5\n\
         2,202,0.5,0.5\n",
    );
    let nodes = table(
        "nodes",
        "NodeId,MGRA,Probability\n\
         11,101,0.5\n\
         12,101,0.5\n\
         13,102,1.0\n\
         21,201,0.25\n\
         22,201,0.75\n\
         23,202,1.0\n",
    );
    // Coarse period 1 spans the first 24 rows, 2 the next 6
    let mut tod = "TOD,All\n".to_string();
    for _ in 0..24 {
        tod.push_str("1,0.0417\n");
    }
    for _ in 0..6 {
        tod.push_str("2,0.1667\n");
    }
    let temporal = TemporalDisaggregator::from_table(&table("tod", &tod), Some("All")).unwrap();

    let mut matrix = ODMatrix::new(2);
    matrix.set(1, 1, 3.3);
    matrix.set(1, 2, 12.7);
    matrix.set(2, 1, 8.5);
    matrix.set(2, 2, 0.4);

    let skims = SkimSet::load(|_| {
        let mut m = ODMatrix::new(2);
        m.set(1, 2, 14.0);
        m.set(2, 1, 16.0);
        Ok(m)
    })
    .unwrap();

    let mut trips = "hh_id,person_id,tour_id,id,orig_mgra,dest_mgra,trip_mode,arrivalMode,\
                     stop_period,inbound\n"
        .to_string();
    for hh in 1..=40 {
        let mode = [1, 3, 7, 16, 9][hh % 5];
        let (orig, dest) = if hh % 2 == 0 { (101, 202) } else { (201, 0) };
        trips.push_str(&format!(
            "{},1,1,1,{},{},{},5,{},{}\n",
            hh,
            orig,
            dest,
            mode,
            1 + hh % 2,
            hh % 2
        ));
    }

    Inputs {
        temporal,
        prods: SpatialDisaggregator::cells_from_zones(&zones, "All", TripEnd::Productions)
            .unwrap(),
        attrs: SpatialDisaggregator::cells_from_zones(&zones, "All", TripEnd::Attractions)
            .unwrap(),
        nodes: SpatialDisaggregator::nodes_from_cells(&nodes).unwrap(),
        cell_zones: CellZones::from_table(&zones).unwrap(),
        skims,
        matrix,
        trips: table("trips", &trips),
    }
}

fn broad(inputs: &Inputs, seed: u64) -> String {
    let trace = TraceFilter::none();
    let desc = MatrixDescriptor {
        file_name: "all.csv".to_string(),
        market_segment: "All".to_string(),
        matrix_name: "SOV".to_string(),
        broad_period: 1,
        vehicle_class: disaggregate::VehicleClass::PassengerCar,
        occupancy: 1,
        toll_eligible: false,
    };
    let mut pipeline = BroadPipeline::new(
        BroadTables {
            temporal: &inputs.temporal,
            production_cells: &inputs.prods,
            attraction_cells: &inputs.attrs,
            nodes: &inputs.nodes,
        },
        &trace,
        seeded_rng(seed),
    );
    let mut out = TripWriter::new(Vec::new()).unwrap();
    pipeline.run(&desc, &inputs.matrix, &mut out).unwrap();
    String::from_utf8(out.finish().unwrap()).unwrap()
}

fn detailed(inputs: &Inputs, seed: u64) -> String {
    let trace = TraceFilter::none();
    let mut pipeline = DetailedPipeline::new(
        DetailedTables {
            temporal: &inputs.temporal,
            production_cells: Some(&inputs.prods),
            attraction_cells: Some(&inputs.attrs),
            nodes: &inputs.nodes,
            cell_zones: &inputs.cell_zones,
            skims: &inputs.skims,
        },
        "IndividualTrips",
        0.3,
        &trace,
        seeded_rng(seed),
    );
    let mut out = TripWriter::new(Vec::new()).unwrap();
    pipeline.run(&inputs.trips, &mut out).unwrap();
    String::from_utf8(out.finish().unwrap()).unwrap()
}

#[test]
fn broad_runs_repeat() {
    let inputs = inputs();
    let run1 = broad(&inputs, 42);
    let run2 = broad(&inputs, 42);
    assert_eq!(run1, run2);
    assert!(run1.starts_with(disaggregate::HEADER));
    // 3 + 12 + 8 trips at least, given the whole parts of the matrix
    assert!(run1.matches("\r\n").count() >= 23);

    assert_ne!(run1, broad(&inputs, 43));
}

#[test]
fn detailed_runs_repeat() {
    let inputs = inputs();
    let run1 = detailed(&inputs, 42);
    let run2 = detailed(&inputs, 42);
    assert_eq!(run1, run2);
    assert!(run1.starts_with(disaggregate::HEADER));

    assert_ne!(run1, detailed(&inputs, 43));
}

#[test]
fn every_record_has_every_field() {
    let inputs = inputs();
    for output in [broad(&inputs, 7), detailed(&inputs, 7)] {
        for line in output.split("\r\n").skip(1) {
            assert_eq!(19, line.split(',').count(), "{}", line);
        }
    }
}
