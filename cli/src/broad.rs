use std::collections::BTreeSet;

use anyhow::{Context, Result};

use disaggregate::{
    seeded_rng, BroadPipeline, BroadTables, MatrixDescriptor, ODMatrix, SentinelCounts,
    SpatialDisaggregator, Table, TemporalDisaggregator, TripEnd,
};
use dtautil::Timer;

use crate::config::Config;
use crate::output;

/// Disaggregates every matrix named in a descriptor file. Each matrix gets its own pipeline,
/// seeded the same way, with probabilities for its market segment.
pub fn run(config: &Config, input: &str) -> Result<()> {
    let mut timer = Timer::new("broad TOD disaggregation");

    timer.start("load tables");
    let descriptors = MatrixDescriptor::read_all(&Table::load(&config.tables(input))?)?;
    let tod = Table::load(&config.tables(&config.broad_tod_file))?;
    let zones = Table::load(&config.tables(&config.zone_cell_file))?;
    let node_table = Table::load(&config.tables(&config.cell_node_file))?;
    let nodes = SpatialDisaggregator::nodes_from_cells(&node_table)?;
    timer.stop("load tables");

    let segments: BTreeSet<String> = descriptors
        .iter()
        .map(|d| d.market_segment.clone())
        .collect();
    timer.note(format!(
        "{} matrices to disaggregate, for {}",
        descriptors.len(),
        dtautil::plain_list_names(segments)
    ));

    let mut out = output::open(&config.output_path())?;
    let mut sentinels = SentinelCounts::new();
    for desc in &descriptors {
        let phase = format!("disaggregate {} from {}", desc.matrix_name, desc.file_name);
        timer.start(phase.clone());

        let segment = &desc.market_segment;
        let temporal = TemporalDisaggregator::from_table(&tod, Some(segment))?;
        let production_cells =
            SpatialDisaggregator::cells_from_zones(&zones, segment, TripEnd::Productions)
                .with_context(|| format!("productions for market segment {}", segment))?;
        let attraction_cells =
            SpatialDisaggregator::cells_from_zones(&zones, segment, TripEnd::Attractions)
                .with_context(|| format!("attractions for market segment {}", segment))?;
        let matrix = ODMatrix::from_table(
            &Table::load(&config.outputs(&desc.file_name))?,
            &desc.matrix_name,
        )?;

        let mut pipeline = BroadPipeline::new(
            BroadTables {
                temporal: &temporal,
                production_cells: &production_cells,
                attraction_cells: &attraction_cells,
                nodes: &nodes,
            },
            &config.trace,
            seeded_rng(config.random_seed),
        );
        pipeline.run(desc, &matrix, &mut out)?;
        sentinels.absorb(pipeline.into_sentinels());

        timer.stop(phase);
    }

    output::finish(&mut timer, out, &sentinels)
}
