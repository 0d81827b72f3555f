//! Operational-efficiency reporting: filter milestone records, aggregate KPI
//! times by country, station and year, pivot the results and export them as
//! xlsx workbooks.
pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod output;
pub mod pivot;
pub mod reports;
pub mod types;
pub mod util;

pub use error::ReportError;
pub use filter::{filter_records, FilterOptions, FilterSpec};
pub use reports::{render, Dashboard, Page};
