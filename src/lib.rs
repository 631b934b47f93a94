//! Foodflow - read-path analytics for a surplus food donation network
//!
//! Deterministic rankings, distributions and system KPIs over providers,
//! receivers, food listings and claims, served from a read-only store.

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalizer;
pub mod result;
pub mod sqlite_pragma;
pub mod store;
pub mod synthesizer;

#[cfg(test)]
mod test_fixtures;

pub use config::{ActiveProviderRule, ActiveReceiverRule, AnalyticsConfig, ConfigError};
pub use engine::AggregationEngine;
pub use error::{AnalyticsError, SynthesisError};
pub use model::{ClaimStatus, ListingStatus, ReportKind};
pub use result::{InconsistentAggregate, NormalizedResult, ReportRow};
pub use store::{DataAccessError, DataStore, ReadConsistency, SqliteStore};
pub use synthesizer::{KpiSynthesizer, SystemMetric, SystemMetrics};
