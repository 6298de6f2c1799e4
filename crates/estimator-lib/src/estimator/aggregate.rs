//! Summing cost ranges per kind and across kinds

use crate::models::{CostRange, MONTHLY_TOTAL_KIND};
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

impl AddAssign<&CostRange> for CostRange {
    /// Field-wise sum; the left-hand kind label is kept
    fn add_assign(&mut self, other: &CostRange) {
        self.min_requested += other.min_requested;
        self.max_requested += other.max_requested;
        self.hpa_buffer += other.hpa_buffer;
        self.min_limited += other.min_limited;
        self.max_limited += other.max_limited;
    }
}

impl Add<&CostRange> for CostRange {
    type Output = CostRange;

    fn add(mut self, other: &CostRange) -> CostRange {
        self += other;
        self
    }
}

/// Sum ranges under a single kind label
pub fn sum_ranges<'a, I>(kind: &str, ranges: I) -> CostRange
where
    I: IntoIterator<Item = &'a CostRange>,
{
    ranges
        .into_iter()
        .fold(CostRange::zero(kind), |total, range| total + range)
}

/// Monthly cost of a manifest set, one range per kind present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cost {
    pub monthly_ranges: Vec<CostRange>,
}

impl Cost {
    pub fn new(monthly_ranges: Vec<CostRange>) -> Self {
        Self { monthly_ranges }
    }

    /// Grand total across kinds, labeled `MonthlyTotal`
    pub fn monthly_total(&self) -> CostRange {
        sum_ranges(MONTHLY_TOTAL_KIND, &self.monthly_ranges)
    }

    pub fn range(&self, kind: &str) -> Option<&CostRange> {
        self.monthly_ranges.iter().find(|range| range.kind == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.monthly_ranges.is_empty()
    }
}
