use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Households and origin zones whose trips get every sampling step logged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceFilter {
    #[serde(default)]
    pub households: BTreeSet<i64>,
    #[serde(default)]
    pub origin_zones: BTreeSet<i32>,
}

impl TraceFilter {
    pub fn none() -> TraceFilter {
        TraceFilter::default()
    }

    pub fn is_traced_household(&self, hh_id: i64) -> bool {
        self.households.contains(&hh_id)
    }

    pub fn is_traced_origin(&self, zone: i32) -> bool {
        self.origin_zones.contains(&zone)
    }
}
