//! Company Trust Gateway Library
//!
//! Client, proxy and presentation pieces around an external company
//! credibility-analysis engine. The engine itself (registry lookups, scraping,
//! sentiment scoring) lives elsewhere; this crate honours its HTTP contract.
//!
//! # Modules
//!
//! - `analysis_client`: Transport client for the analyze endpoint.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: Gateway routes (analyze proxy, registration pre-check, health).
//! - `models`: Request and report data models.
//! - `registry`: Local CIN format pre-check.
//! - `report`: Text rendering of reports.
//! - `session`: Submission state with stale-result suppression.
//! - `tier_policy`: Score to trust tier thresholds.

pub mod analysis_client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod report;
pub mod session;
pub mod tier_policy;
