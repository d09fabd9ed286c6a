//! spiflash-linux-gpio - Linux GPIO bitbang SPI bus
//!
//! This crate provides an [`SpiBus`](spiflash_core::programmer::SpiBus) that
//! talks to an SPI flash chip by bitbanging GPIO lines through the Linux
//! character device GPIO interface (gpiocdev).
//!
//! # Example
//!
//! ```no_run
//! use spiflash_core::disk::SpiFlashDisk;
//! use spiflash_core::programmer::BusMaster;
//! use spiflash_linux_gpio::{LinuxGpioSpi, LinuxGpioSpiConfig};
//!
//! // Configure GPIO pins for SPI
//! let config = LinuxGpioSpiConfig::new("/dev/gpiochip0", 25, 11, 10, 9);
//! //                                    device          CS  SCK MOSI MISO
//!
//! let bus = LinuxGpioSpi::open(&config)?;
//! let mut disk = SpiFlashDisk::new(BusMaster::new(bus), Default::default());
//! disk.initialize()?;
//! println!("{} blocks", disk.block_count());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # GPIO Pin Wiring
//!
//! | Flash Pin | GPIO Function | Description |
//! |-----------|---------------|-------------|
//! | CS#       | CS (output)   | Chip Select |
//! | CLK       | SCK (output)  | Serial Clock |
//! | DI        | MOSI (output) | Data in |
//! | DO        | MISO (input)  | Data out |
//! | HOLD#     | hold (output) or 3.3V | Held high |
//! | WP#       | wp (output) or 3.3V   | Held high |
//!
//! # System Requirements
//!
//! - Linux kernel 4.8+ with GPIO character device support (kernel 5.5+ for v2 API)
//! - Access to `/dev/gpiochipN` devices (may require root or udev rules)

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxGpioSpi, LinuxGpioSpiConfig};
pub use error::{LinuxGpioError, Result};

/// Parse `options` and open the bus
///
/// Convenience for CLI backend dispatch; see [`parse_options`] for the
/// accepted keys.
pub fn open_linux_gpio(options: &[(&str, &str)]) -> Result<LinuxGpioSpi> {
    let config = parse_options(options)?;
    LinuxGpioSpi::open(&config)
}
