//! Container resource normalization
//!
//! Quantity parsing, per-container defaulting and per-workload totals.

mod defaulting;
mod quantity;
mod totals;

pub use defaulting::{resolve_container, DeclaredAmount, DeclaredResources};
pub use quantity::{parse_bytes, parse_cpu_millicores, parse_quantity, Quantity};
pub use totals::{total_containers, WorkloadTotals};
