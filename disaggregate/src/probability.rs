//! Empirical conditional distributions, sampled by inverse CDF over an ordered list of rows.

/// Decides whether a row's cumulative probability is enough to select it for a given draw.
/// Temporal and spatial tables were calibrated against different rules, so both exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TieBreak {
    /// Select the first row where `cumulative >= draw`.
    AtLeast,
    /// Select the first row where `cumulative > draw`.
    Exceeds,
}

impl TieBreak {
    pub fn accepts(self, cumulative: f64, draw: f64) -> bool {
        match self {
            TieBreak::AtLeast => cumulative >= draw,
            TieBreak::Exceeds => draw < cumulative,
        }
    }
}

/// An ordered sequence of (outer key, inner key, probability) rows. For each outer key, the
/// probabilities of the matching rows should sum to 1; nothing checks this. When they don't, or
/// the outer key is absent, sampling returns None.
#[derive(Clone, Debug, Default)]
pub struct ConditionalTable {
    outer: Vec<i32>,
    inner: Vec<i32>,
    probability: Vec<f64>,
}

/// One row visited while sampling, reported to a trace callback.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScannedRow {
    pub row: usize,
    pub outer: i32,
    pub inner: i32,
    pub probability: f64,
    pub cumulative: f64,
    pub draw: f64,
}

impl ConditionalTable {
    pub fn new(outer: Vec<i32>, inner: Vec<i32>, probability: Vec<f64>) -> ConditionalTable {
        assert_eq!(outer.len(), inner.len());
        assert_eq!(outer.len(), probability.len());
        ConditionalTable {
            outer,
            inner,
            probability,
        }
    }

    pub fn len(&self) -> usize {
        self.outer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outer.is_empty()
    }

    pub fn inner_key(&self, row: usize) -> i32 {
        self.inner[row]
    }

    /// Walks the rows from `start` onwards, accumulating probability over rows whose outer key
    /// matches, and returns the index of the first row the tie-break policy accepts for `draw`.
    /// `trace`, if present, sees every matching row that gets scanned.
    pub fn sample(
        &self,
        outer: i32,
        start: usize,
        draw: f64,
        tie: TieBreak,
        mut trace: Option<&mut dyn FnMut(ScannedRow)>,
    ) -> Option<usize> {
        let mut cumulative = 0.0;
        for row in start..self.len() {
            if self.outer[row] != outer {
                continue;
            }
            cumulative += self.probability[row];
            if let Some(ref mut cb) = trace {
                cb(ScannedRow {
                    row,
                    outer,
                    inner: self.inner[row],
                    probability: self.probability[row],
                    cumulative,
                    draw,
                });
            }
            if tie.accepts(cumulative, draw) {
                return Some(row);
            }
        }
        None
    }
}

/// Rounds a fractional count to a whole one, up with probability equal to the fractional part,
/// so the expected value is preserved. `draw` is a uniform value in [0, 1).
pub fn stochastic_round(value: f64, draw: f64) -> usize {
    let whole = value.floor();
    let mut count = whole.max(0.0) as usize;
    if draw < value - whole {
        count += 1;
    }
    count
}
