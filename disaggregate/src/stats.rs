use std::fmt;

use dtautil::Counter;

/// A lookup that failed and left a sentinel in the output. These never change what gets
/// written; they're only counted, so a run can be checked for bad probability tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Sentinel {
    /// No fine period was selected for a coarse period
    Period,
    /// No cell was selected inside a zone
    Cell,
    /// No node was selected inside a cell
    Node,
    /// A cell isn't listed in any zone
    Zone,
    /// A skim has no value for a zone pair
    Skim,
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Sentinel::Period => write!(f, "unresolved DTA periods"),
            Sentinel::Cell => write!(f, "unresolved cells"),
            Sentinel::Node => write!(f, "unresolved nodes"),
            Sentinel::Zone => write!(f, "cells without a zone"),
            Sentinel::Skim => write!(f, "zone pairs missing from skims"),
        }
    }
}

/// Counts sentinels produced by one pipeline instance.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SentinelCounts {
    counts: Counter<Sentinel>,
}

impl SentinelCounts {
    pub fn new() -> SentinelCounts {
        SentinelCounts::default()
    }

    /// Passes the result through, counting it if missing.
    pub fn check(&mut self, kind: Sentinel, value: Option<i32>) -> Option<i32> {
        if value.is_none() {
            self.counts.inc(kind);
        }
        value
    }

    pub fn inc(&mut self, kind: Sentinel) {
        self.counts.inc(kind);
    }

    pub fn get(&self, kind: Sentinel) -> usize {
        self.counts.get(kind)
    }

    pub fn total(&self) -> usize {
        self.counts.sum()
    }

    pub fn absorb(&mut self, other: SentinelCounts) {
        self.counts.extend(other.counts);
    }

    /// One line per kind of sentinel seen.
    pub fn describe(&self) -> Vec<String> {
        self.counts
            .borrow()
            .iter()
            .map(|(kind, cnt)| format!("{}: {}", kind, dtautil::prettyprint_usize(*cnt)))
            .collect()
    }
}
