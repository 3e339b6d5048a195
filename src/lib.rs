//! Employee absence analytics: filter a record snapshot, derive headline
//! KPIs and build per-dimension series for charting.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod filter;
pub mod loader;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod session;
pub mod store;

pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, Result};
pub use models::{AggregateRow, DashboardResult, FilterSpec, Metrics, Series, SeriesName};
pub use pipeline::Pipeline;
pub use store::RecordStore;
