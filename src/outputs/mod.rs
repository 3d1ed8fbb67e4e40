//! Output files.
//!
//! # Output Structure
//!
//! ```text
//! Data/
//! └── 2016-2017/
//!     ├── raw_publications.csv              # fetch_publications
//!     └── preprocessed_files/
//!         └── rsg_2016-2017_preprocessed.csv  # check_dric
//! ```

pub mod tables;

pub use tables::{write_publications, write_records};
