//! Congress Control - party division of both chambers of Congress
//!
//! Fetches the House and Senate party-division pages, recovers seat counts
//! with configurable extraction rule-sets, and persists a small JSON snapshot
//! for downstream consumers such as badges and dashboards.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scraping;
pub mod snapshot;
