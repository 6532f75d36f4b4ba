use anyhow::{Context, Result};

use disaggregate::{
    seeded_rng, CellZones, DetailedPipeline, DetailedTables, ODMatrix, SkimSet,
    SpatialDisaggregator, Table, TemporalDisaggregator, TripEnd,
};
use dtautil::Timer;

use crate::config::Config;
use crate::output;

/// Disaggregates one trip list with a single pipeline.
pub fn run(config: &Config, input: &str, sample_rate: f64, market_segment: &str) -> Result<()> {
    let mut timer = Timer::new(format!("detailed TOD disaggregation of {}", market_segment));

    timer.start("load tables");
    let temporal = TemporalDisaggregator::from_table(
        &Table::load(&config.tables(&config.detailed_tod_file))?,
        None,
    )?;
    let zones = Table::load(&config.tables(&config.zone_cell_file))?;
    let cell_zones = CellZones::from_table(&zones)?;
    let production_cells =
        cells_for_segment(&mut timer, &zones, market_segment, TripEnd::Productions)?;
    let attraction_cells =
        cells_for_segment(&mut timer, &zones, market_segment, TripEnd::Attractions)?;
    let node_table = Table::load(&config.tables(&config.cell_node_file))?;
    let nodes = SpatialDisaggregator::nodes_from_cells(&node_table)?;
    timer.stop("load tables");

    timer.start("load skims");
    let skims = SkimSet::load(|band| {
        let path = config.skims.path(band);
        let table = Table::load(&path)?;
        ODMatrix::from_table(&table, &config.skims.matrix_name(band))
            .with_context(|| format!("reading the {} skim", band.label()))
    })?;
    timer.stop("load skims");

    timer.start("load trip list");
    let trips = Table::load(&config.outputs(input))?;
    timer.count("Trip list rows", trips.num_rows());
    timer.stop("load trip list");

    let mut out = output::open(&config.output_path())?;
    timer.start("disaggregate trips");
    let mut pipeline = DetailedPipeline::new(
        DetailedTables {
            temporal: &temporal,
            production_cells: production_cells.as_ref(),
            attraction_cells: attraction_cells.as_ref(),
            nodes: &nodes,
            cell_zones: &cell_zones,
            skims: &skims,
        },
        market_segment,
        sample_rate,
        &config.trace,
        seeded_rng(config.random_seed),
    );
    pipeline.run(&trips, &mut out)?;
    timer.stop("disaggregate trips");

    output::finish(&mut timer, out, &pipeline.into_sentinels())
}

/// Trip lists with a cell for every trip end don't need zone-to-cell probabilities, so a market
/// segment without them isn't an error until a row is missing a cell.
fn cells_for_segment(
    timer: &mut Timer,
    zones: &Table,
    market_segment: &str,
    end: TripEnd,
) -> Result<Option<SpatialDisaggregator>> {
    let col = end.probability_column(market_segment);
    if !zones.has_column(&col) {
        timer.warn(format!(
            "{} has no {} column; trips without a cell will use their zone's sentinel cell",
            zones.name(),
            col
        ));
        return Ok(None);
    }
    Ok(Some(SpatialDisaggregator::cells_from_zones(
        zones,
        market_segment,
        end,
    )?))
}
