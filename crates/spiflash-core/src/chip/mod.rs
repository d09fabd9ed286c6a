//! Flash device identification
//!
//! This module maps the 16-bit manufacturer/device ID returned by the chip
//! to a capacity. A small table of known parts is compiled in; with `std`
//! it can be extended from RON files at runtime.

mod types;

#[cfg(feature = "std")]
mod database;

pub use types::*;

#[cfg(feature = "std")]
pub use database::*;
