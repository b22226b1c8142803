//! Timeline bookmark exporter library.
//!
//! Drives a live, auto-scrolling timeline page in a headless browser,
//! parses the rendered post fragments into flat records, deduplicates
//! them by permalink identifier, and exports the collected set as CSV.

pub mod collector;
pub mod config;
pub mod constants;
pub mod export;
pub mod extract;
pub mod page;
pub mod record;
