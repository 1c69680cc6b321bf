//! Village-level credit risk scoring and benchmark reasonableness checks.
//!
//! - [`metrics`] scores villages: saturation, economic and environmental
//!   risk, a composite score, its category and a strategy quadrant.
//! - [`benchmark`] checks self-reported revenue, COGS and profit against
//!   three levels of regional sector benchmarks.
//! - [`normalize`] aligns sector labels between the two datasets.
//!
//! Loading, reporting and output live around that core and only read the
//! computed values.
pub mod benchmark;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod normalize;
pub mod output;
pub mod reports;
pub mod sentiment;
pub mod snapshot;
pub mod suggest;
pub mod types;
pub mod util;

pub use benchmark::{
    BenchmarkLevel, BenchmarkTables, BenchmarkValidator, Financials, LevelVerdict, Location,
    SectorSelection, Status, ValidationReport,
};
pub use error::{GeoCreditError, Result};
pub use metrics::{enrich, DatasetMeans};
pub use snapshot::Snapshot;
pub use types::{EnrichedVillage, RiskCategory, RiskFlags, StrategyQuadrant, VillageRecord};
