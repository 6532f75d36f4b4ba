use anyhow::Result;
use rand::Rng;

use crate::probability::{ConditionalTable, ScannedRow, TieBreak};
use crate::table::Table;

/// Rows for coarse periods after the first begin here, in blocks of `PERIOD_BLOCK` rows. The
/// first coarse period covers a variable-length early block starting at row 0.
const FIXED_BLOCKS_START: i64 = 18;
const PERIOD_BLOCK: i64 = 6;

/// Samples a fine (DTA) period given a coarse period, from an empirical distribution where each
/// table row is one fine period. The chosen fine period is the 1-based row number.
pub struct TemporalDisaggregator {
    table: ConditionalTable,
}

impl TemporalDisaggregator {
    /// `coarse[i]` is the coarse period that fine period `i + 1` belongs to.
    pub fn new(coarse: Vec<i32>, probability: Vec<f64>) -> TemporalDisaggregator {
        let fine = (1..=coarse.len() as i32).collect();
        TemporalDisaggregator {
            table: ConditionalTable::new(coarse, fine, probability),
        }
    }

    /// Reads the `TOD` column and the probability column for a market segment, falling back to
    /// `Factors` when there's no segment or the table doesn't split by segment.
    pub fn from_table(data: &Table, market_segment: Option<&str>) -> Result<TemporalDisaggregator> {
        let prob_col = match market_segment {
            Some(segment) if data.has_column(segment) => segment,
            _ => "Factors",
        };
        if !data.has_column(prob_col) {
            bail!(
                "{} has neither a {} nor a Factors column",
                data.name(),
                market_segment.unwrap_or("market segment")
            );
        }
        Ok(TemporalDisaggregator::new(
            data.i32_column("TOD")?,
            data.f64_column(prob_col)?,
        ))
    }

    /// How many fine periods the table describes.
    pub fn num_periods(&self) -> usize {
        self.table.len()
    }

    /// The first row that could belong to a coarse period.
    pub fn start_row(coarse_period: i32) -> usize {
        if coarse_period == 1 {
            return 0;
        }
        let start = (i64::from(coarse_period) - 1) * PERIOD_BLOCK + FIXED_BLOCKS_START;
        start.max(0) as usize
    }

    /// Draws one uniform value and returns the sampled fine period, or None if the coarse
    /// period's rows never accumulate enough probability.
    pub fn sample<R: Rng>(&self, rng: &mut R, coarse_period: i32, debug: bool) -> Option<i32> {
        let draw: f64 = rng.gen();
        self.sample_with_draw(coarse_period, draw, debug)
    }

    pub fn sample_with_draw(&self, coarse_period: i32, draw: f64, debug: bool) -> Option<i32> {
        let start = TemporalDisaggregator::start_row(coarse_period);
        let row = if debug {
            info!("Period     dtaPeriod     Prob     cumProb     randomNumber");
            let mut cb = |r: ScannedRow| {
                info!(
                    "{}     {}     {}     {}     {}",
                    r.outer,
                    r.inner,
                    r.probability,
                    r.cumulative,
                    r.draw
                )
            };
            self.table
                .sample(coarse_period, start, draw, TieBreak::AtLeast, Some(&mut cb))
        } else {
            self.table
                .sample(coarse_period, start, draw, TieBreak::AtLeast, None)
        };
        row.map(|r| self.table.inner_key(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mimics the real layout: coarse period 1 owns an early block of 18 rows, then every later
    // coarse period owns 6 rows.
    fn layout() -> TemporalDisaggregator {
        let mut coarse = vec![1; 18];
        let mut prob = vec![1.0 / 18.0; 18];
        for period in 2..=4 {
            coarse.extend(vec![period; 6]);
            prob.extend(vec![1.0 / 6.0; 6]);
        }
        TemporalDisaggregator::new(coarse, prob)
    }

    #[test]
    fn start_rows() {
        assert_eq!(0, TemporalDisaggregator::start_row(1));
        assert_eq!(24, TemporalDisaggregator::start_row(2));
        assert_eq!(30, TemporalDisaggregator::start_row(3));
        assert_eq!(12, TemporalDisaggregator::start_row(0));
        assert_eq!(0, TemporalDisaggregator::start_row(-5));
    }

    #[test]
    fn extreme_draws() {
        let t = layout();
        assert_eq!(Some(1), t.sample_with_draw(1, 0.0, false));
        assert_eq!(Some(18), t.sample_with_draw(1, 1.0 - 1e-9, false));
    }

    #[test]
    fn offset_skips_rows_of_the_block() {
        // Coarse period 2's rows sit at 18..24, but scanning starts at row 24, so only rows
        // belonging to period 2 at or after 24 count. There are none.
        let t = layout();
        assert_eq!(None, t.sample_with_draw(2, 0.0, false));
        // Period 3's rows are 24..30, and scanning starts at 30. Also empty.
        assert_eq!(None, t.sample_with_draw(3, 0.5, false));
    }

    #[test]
    fn fixed_block_after_row_18() {
        // 18 early rows for period 1, 6 padding rows, then 6 rows for period 2 starting at 24
        let mut coarse = vec![1; 18];
        coarse.extend(vec![0; 6]);
        coarse.extend(vec![2; 6]);
        let mut prob = vec![1.0 / 18.0; 18];
        prob.extend(vec![0.0; 6]);
        prob.extend(vec![0.25, 0.25, 0.25, 0.25, 0.0, 0.0]);
        let t = TemporalDisaggregator::new(coarse, prob);
        assert_eq!(30, t.num_periods());
        assert_eq!(Some(25), t.sample_with_draw(2, 0.0, false));
        // Cumulative hits exactly 0.5 on the second row, and the >= rule takes it
        assert_eq!(Some(26), t.sample_with_draw(2, 0.5, false));
        assert_eq!(Some(28), t.sample_with_draw(2, 0.99, true));
    }

    #[test]
    fn segment_columns() {
        let data = Table::from_reader(
            "tod",
            "TOD,Factors,Commercial\n1,0.5,1.0\n1,0.5,0.0\n".as_bytes(),
        )
        .unwrap();
        let by_segment = TemporalDisaggregator::from_table(&data, Some("Commercial")).unwrap();
        assert_eq!(Some(1), by_segment.sample_with_draw(1, 0.9, false));
        let fallback = TemporalDisaggregator::from_table(&data, Some("Truck")).unwrap();
        assert_eq!(Some(2), fallback.sample_with_draw(1, 0.9, false));

        let no_factors = Table::from_reader("tod", "TOD,Truck\n1,1.0\n".as_bytes()).unwrap();
        assert!(TemporalDisaggregator::from_table(&no_factors, None).is_err());
    }
}
