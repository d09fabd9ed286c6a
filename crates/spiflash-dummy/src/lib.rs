//! spiflash-dummy - Byte-level flash emulator for testing
//!
//! This crate provides a W25Q flash chip emulated in memory behind the
//! [`SpiBus`](spiflash_core::programmer::SpiBus) trait. It's useful for
//! testing and development without real hardware: every command goes
//! through the same framing code a real bus would see.
//!
//! # Example
//!
//! ```
//! use spiflash_core::disk::{SpiFlashDisk, BLOCK_SIZE};
//! use spiflash_core::programmer::BusMaster;
//! use spiflash_dummy::{DummyConfig, DummyFlash};
//!
//! let flash = DummyFlash::new(DummyConfig::default());
//! let mut disk = SpiFlashDisk::new(BusMaster::new(flash), Default::default());
//! disk.initialize()?;
//!
//! disk.write_block(0, &[0xA5; BLOCK_SIZE])?;
//! disk.sync()?;
//! # Ok::<(), spiflash_core::Error>(())
//! ```

mod error;
mod flash;
mod image;
mod options;

pub use error::{DummyError, Result};
pub use flash::{DummyConfig, DummyFlash, FlashOp, OpCounters, DEFAULT_SIZE};
pub use image::{decode_header, encode_header, HEADER_LEN, MAGIC};
pub use options::{parse_options, DummyOptions};
