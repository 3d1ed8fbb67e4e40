//! # DRIC Tracker
//!
//! Finds the publications of a period's research-grant awardees on the
//! university research portal, then checks each one for an acknowledgment of
//! funding from the Directorate of Research, Innovation and Consultancy (DRIC).
//!
//! ## Usage
//!
//! ```sh
//! fetch_publications --period 2016-2017   # Data/2016-2017/raw_publications.csv
//! check_dric --period 2016-2017           # Data/2016-2017/preprocessed_files/...
//! ```
//!
//! ## Architecture
//!
//! Discovery ([`collector`]):
//! 1. **Names**: expand each awardee into search variants ([`names`])
//! 2. **Search**: page through the portal's virtualized table ([`scrapers::portal`])
//! 3. **Filter**: keep in-period rows, drop exact duplicates
//!
//! Classification ([`pipeline`]):
//! 1. **Resolve**: citation page to article URL ([`scrapers::citation`])
//! 2. **Fetch**: article text via the extraction service ([`fetch`])
//! 3. **Classify**: YES / NO from the language model ([`classify`])
//!
//! External services sit behind the traits in [`api`] and the browser behind
//! the traits in [`browser`]; both are replaced by fakes in tests.

pub mod api;
pub mod browser;
pub mod classify;
pub mod cli;
pub mod collector;
pub mod config;
pub mod error;
pub mod fetch;
pub mod inputs;
pub mod models;
pub mod names;
pub mod outputs;
pub mod pipeline;
pub mod providers;
pub mod scrapers;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use error::Error;
