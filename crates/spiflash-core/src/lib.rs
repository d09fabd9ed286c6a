//! spiflash-core - Block storage on top of a serial NOR flash chip
//!
//! This crate drives a W25Q-family SPI NOR flash over a plain byte bus and
//! exposes it as a fixed-size logical block device. It is designed to be
//! `no_std` compatible so the same code runs on the microcontroller that
//! owns the chip and in host-side tooling.
//!
//! The crate is layered bottom-up:
//!
//! - [`programmer`] - the byte bus ([`programmer::SpiBus`]) and the framer
//!   that turns [`spi::SpiCommand`]s into bus traffic
//! - [`protocol`] - the chip command protocol (page read/program, sector and
//!   chip erase, identification, busy polling)
//! - [`chip`] - the device-ID to capacity table
//! - [`disk`] - the block translation layer with its one-sector write-back
//!   cache
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`, serde
//!   derives and the RON chip database)
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use spiflash_core::disk::{BlockDevice, SpiFlashDisk};
//! use spiflash_core::programmer::BusMaster;
//!
//! fn bring_up<B: spiflash_core::programmer::SpiBus>(bus: B) -> spiflash_core::Result<()> {
//!     let mut disk = SpiFlashDisk::new(BusMaster::new(bus), Default::default());
//!     disk.initialize()?;
//!     let mut block = [0u8; spiflash_core::disk::BLOCK_SIZE];
//!     disk.read_block(0, &mut block)?;
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod config;
pub mod disk;
pub mod error;
pub mod programmer;
pub mod protocol;
pub mod spi;

pub use config::{PollTiming, SpiFlashConfig};
pub use error::{Error, Result};
