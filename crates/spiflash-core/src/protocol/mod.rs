//! Chip command protocol
//!
//! This module contains the W25Q command sequences as free functions over
//! any [`SpiMaster`](crate::programmer::SpiMaster), and the [`SpiFlash`]
//! driver value that owns a master and applies the configured timings.

mod driver;
mod w25q;

pub use driver::SpiFlash;
pub use w25q::*;
