//! Difference between two cost snapshots
//!
//! Percentages are relative to the previous snapshot. When a previous value
//! is zero the percentage is `0` if nothing changed and undefined (`None`)
//! otherwise.

use super::aggregate::Cost;
use crate::models::CostRange;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The five fields of a cost range, in reporting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostField {
    MinRequested,
    HpaBuffer,
    MaxRequested,
    MinLimited,
    MaxLimited,
}

impl CostField {
    pub const ALL: [CostField; 5] = [
        CostField::MinRequested,
        CostField::HpaBuffer,
        CostField::MaxRequested,
        CostField::MinLimited,
        CostField::MaxLimited,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CostField::MinRequested => "MIN REQUESTED",
            CostField::HpaBuffer => "MIN REQ + HPA CPU BUFFER",
            CostField::MaxRequested => "MAX REQUESTED",
            CostField::MinLimited => "MIN LIMITED",
            CostField::MaxLimited => "MAX LIMITED",
        }
    }

    pub fn value(&self, range: &CostRange) -> f64 {
        match self {
            CostField::MinRequested => range.min_requested,
            CostField::HpaBuffer => range.hpa_buffer,
            CostField::MaxRequested => range.max_requested,
            CostField::MinLimited => range.min_limited,
            CostField::MaxLimited => range.max_limited,
        }
    }
}

impl fmt::Display for CostField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Percentage deltas; `None` is undefined (previous value zero)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentageRange {
    pub kind: String,
    pub min_requested: Option<f64>,
    pub max_requested: Option<f64>,
    pub hpa_buffer: Option<f64>,
    pub min_limited: Option<f64>,
    pub max_limited: Option<f64>,
}

impl PercentageRange {
    pub fn get(&self, field: CostField) -> Option<f64> {
        match field {
            CostField::MinRequested => self.min_requested,
            CostField::HpaBuffer => self.hpa_buffer,
            CostField::MaxRequested => self.max_requested,
            CostField::MinLimited => self.min_limited,
            CostField::MaxLimited => self.max_limited,
        }
    }
}

/// Direction of a diff across all fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostChange {
    Increased,
    Decreased,
    /// Some fields went up while others went down
    Mixed,
    Unchanged,
}

impl CostChange {
    pub fn has_increase(&self) -> bool {
        matches!(self, CostChange::Increased | CostChange::Mixed)
    }

    pub fn has_decrease(&self) -> bool {
        matches!(self, CostChange::Decreased | CostChange::Mixed)
    }
}

/// Field-wise delta between two ranges of the same kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeDiff {
    pub kind: String,
    pub current: CostRange,
    pub previous: CostRange,
    pub absolute: CostRange,
    pub percentage: PercentageRange,
}

impl RangeDiff {
    pub fn between(current: &CostRange, previous: &CostRange) -> Self {
        let delta = |field: CostField| field.value(current) - field.value(previous);
        let percent = |field: CostField| percentage(delta(field), field.value(previous));

        RangeDiff {
            kind: current.kind.clone(),
            current: current.clone(),
            previous: previous.clone(),
            absolute: CostRange {
                kind: current.kind.clone(),
                min_requested: delta(CostField::MinRequested),
                max_requested: delta(CostField::MaxRequested),
                hpa_buffer: delta(CostField::HpaBuffer),
                min_limited: delta(CostField::MinLimited),
                max_limited: delta(CostField::MaxLimited),
            },
            percentage: PercentageRange {
                kind: current.kind.clone(),
                min_requested: percent(CostField::MinRequested),
                max_requested: percent(CostField::MaxRequested),
                hpa_buffer: percent(CostField::HpaBuffer),
                min_limited: percent(CostField::MinLimited),
                max_limited: percent(CostField::MaxLimited),
            },
        }
    }

    /// Sign of a field's change; the percentage decides when it is defined
    pub fn direction(&self, field: CostField) -> f64 {
        match self.percentage.get(field) {
            Some(percent) => percent,
            None => field.value(&self.absolute),
        }
    }

    pub fn increased_fields(&self) -> Vec<CostField> {
        CostField::ALL
            .into_iter()
            .filter(|field| self.direction(*field) > 0.0)
            .collect()
    }

    pub fn decreased_fields(&self) -> Vec<CostField> {
        CostField::ALL
            .into_iter()
            .filter(|field| self.direction(*field) < 0.0)
            .collect()
    }

    pub fn change(&self) -> CostChange {
        let increased = !self.increased_fields().is_empty();
        let decreased = !self.decreased_fields().is_empty();
        match (increased, decreased) {
            (true, true) => CostChange::Mixed,
            (true, false) => CostChange::Increased,
            (false, true) => CostChange::Decreased,
            (false, false) => CostChange::Unchanged,
        }
    }

    /// Human readable summary of the changed fields
    pub fn summary(&self) -> String {
        let increased = self.increased_fields();
        let decreased = self.decreased_fields();
        let mut summary = String::new();

        if !increased.is_empty() {
            summary.push_str(&format!(
                "There are increase in costs on: '{}'",
                join_labels(&increased)
            ));
        }
        if !decreased.is_empty() {
            let start = if summary.is_empty() { "There" } else { ". And there" };
            summary.push_str(&format!(
                "{} are decrease in costs on: '{}'",
                start,
                join_labels(&decreased)
            ));
        }
        if summary.is_empty() {
            summary.push_str("No cost change found!");
        }
        summary
    }

    pub fn to_price_diff(&self) -> PriceDiff {
        let max_usd = CostField::ALL
            .into_iter()
            .map(|field| field.value(&self.absolute))
            .fold(f64::NEG_INFINITY, f64::max);
        let max_perc = CostField::ALL
            .into_iter()
            .filter_map(|field| self.percentage.get(field))
            .fold(None, |max: Option<f64>, value| {
                Some(max.map_or(value, |m| m.max(value)))
            })
            .unwrap_or(0.0);

        PriceDiff {
            summary: PriceSummary {
                possibly_cost_increase: self.change().has_increase(),
                max_diff: PriceMaxDiff {
                    usd: floor_cents(max_usd),
                    perc: floor_cents(max_perc),
                },
            },
            details: PriceDetails {
                usd: self.absolute.clone(),
                perc: self.percentage.clone(),
            },
        }
    }
}

fn percentage(delta: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        if delta == 0.0 {
            Some(0.0)
        } else {
            None
        }
    } else {
        Some(delta / previous * 100.0)
    }
}

fn floor_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

fn join_labels(fields: &[CostField]) -> String {
    fields
        .iter()
        .map(CostField::label)
        .collect::<Vec<_>>()
        .join("', '")
}

/// Difference between a current and a previous `Cost`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostDiff {
    pub summary: String,
    pub change: CostChange,
    pub current: Cost,
    pub previous: Cost,
    /// Diff of the grand totals
    pub monthly: RangeDiff,
}

impl CostDiff {
    pub fn possibly_cost_increase(&self) -> bool {
        self.change.has_increase()
    }

    pub fn to_price_diff(&self) -> PriceDiff {
        self.monthly.to_price_diff()
    }
}

/// Diff two snapshots on their grand totals
pub fn diff(current: &Cost, previous: &Cost) -> CostDiff {
    let monthly = RangeDiff::between(&current.monthly_total(), &previous.monthly_total());
    CostDiff {
        summary: monthly.summary(),
        change: monthly.change(),
        current: current.clone(),
        previous: previous.clone(),
        monthly,
    }
}

impl Cost {
    pub fn subtract(&self, previous: &Cost) -> CostDiff {
        diff(self, previous)
    }
}

/// Machine readable diff, as consumed by CI pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDiff {
    pub summary: PriceSummary,
    pub details: PriceDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummary {
    pub possibly_cost_increase: bool,
    pub max_diff: PriceMaxDiff,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceMaxDiff {
    pub usd: f64,
    pub perc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceDetails {
    pub usd: CostRange,
    pub perc: PercentageRange,
}
