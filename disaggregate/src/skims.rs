use anyhow::Result;

use crate::matrix::ODMatrix;

/// Drive times are converted to whole fine periods of this many minutes.
pub const MINUTES_PER_PERIOD: f64 = 5.0;

/// The broad time-of-day bands that skims are produced for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum SkimBand {
    EarlyAM,
    AM,
    Midday,
    PM,
    Evening,
}

impl SkimBand {
    pub fn all() -> Vec<SkimBand> {
        vec![
            SkimBand::EarlyAM,
            SkimBand::AM,
            SkimBand::Midday,
            SkimBand::PM,
            SkimBand::Evening,
        ]
    }

    /// The label used to name skim files and matrices.
    pub fn label(self) -> &'static str {
        match self {
            SkimBand::EarlyAM => "EA",
            SkimBand::AM => "AM",
            SkimBand::Midday => "MD",
            SkimBand::PM => "PM",
            SkimBand::Evening => "EV",
        }
    }

    /// The band a fine DTA period falls in. Anything outside the first four ranges, including
    /// periods below 1, is evening.
    pub fn for_fine_period(period: i32) -> SkimBand {
        match period {
            1..=36 => SkimBand::EarlyAM,
            37..=72 => SkimBand::AM,
            73..=150 => SkimBand::Midday,
            151..=192 => SkimBand::PM,
            _ => SkimBand::Evening,
        }
    }

    fn idx(self) -> usize {
        self as usize
    }
}

/// Free-flow drive-alone times between zones, one matrix per band.
pub struct SkimSet {
    matrices: Vec<ODMatrix>,
}

impl SkimSet {
    /// `load` is called once per band, in `SkimBand::all()` order.
    pub fn load<F: FnMut(SkimBand) -> Result<ODMatrix>>(mut load: F) -> Result<SkimSet> {
        let mut matrices = Vec::new();
        for band in SkimBand::all() {
            matrices.push(load(band)?);
        }
        Ok(SkimSet { matrices })
    }

    /// Minutes from one zone to another, or None if either zone isn't in the skim.
    pub fn drive_time(&self, band: SkimBand, origin: i32, destination: i32) -> Option<f64> {
        self.matrices[band.idx()].get(origin, destination)
    }
}

/// How many whole fine periods a drive of this many minutes takes, rounding up.
pub fn periods_for_minutes(minutes: f64) -> i32 {
    (minutes / MINUTES_PER_PERIOD).ceil() as i32
}
