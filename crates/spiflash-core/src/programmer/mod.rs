//! Bus masters and the byte-bus abstraction
//!
//! This module defines the traits every bus backend implements and the
//! framer that turns [`SpiCommand`](crate::spi::SpiCommand)s into byte
//! traffic on a plain [`SpiBus`].

pub mod bitbang;
mod bus;
mod traits;

pub use bitbang::BitbangSpiMaster;
pub use bus::BusMaster;
pub use traits::*;
