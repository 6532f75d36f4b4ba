use serde::{Deserialize, Serialize};

use disaggregate::{SkimBand, TraceFilter};

/// Where a run finds its inputs and writes its trips, plus the settings shared by every pipeline
/// instance. Read from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Holds trip lists, aggregate matrices, and the output trip file
    pub outputs_dir: String,
    /// Holds the probability tables and matrix descriptor files
    pub tables_dir: String,
    pub output_file: String,
    /// Fine periods per coarse period, by market segment
    pub broad_tod_file: String,
    /// Fine periods per detailed trip-list period
    pub detailed_tod_file: String,
    /// Cells per zone, with production and attraction columns per market segment
    pub zone_cell_file: String,
    /// Nodes per cell
    pub cell_node_file: String,
    pub random_seed: u64,
    pub skims: SkimFiles,
    #[serde(default)]
    pub trace: TraceFilter,
}

/// How drive-alone skims are named: `<dir>/<prefix><band>.csv`, with the times in the
/// `<band>_<suffix>` column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkimFiles {
    pub dir: String,
    pub prefix: String,
    pub suffix: String,
}

impl SkimFiles {
    pub fn path(&self, band: SkimBand) -> String {
        join(&self.dir, &format!("{}{}.csv", self.prefix, band.label()))
    }

    pub fn matrix_name(&self, band: SkimBand) -> String {
        format!("{}_{}", band.label(), self.suffix)
    }
}

impl Config {
    pub fn output_path(&self) -> String {
        join(&self.outputs_dir, &self.output_file)
    }

    pub fn outputs(&self, file: &str) -> String {
        join(&self.outputs_dir, file)
    }

    pub fn tables(&self, file: &str) -> String {
        join(&self.tables_dir, file)
    }
}

fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        return file.to_string();
    }
    format!("{}/{}", dir.trim_end_matches('/'), file)
}
