//! Error types for spiflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// SPI transfer failed
    SpiTransferFailed,
    /// Opcode is not supported by the bus master
    OpcodeNotSupported,

    // Chip errors
    /// No recognized flash chip answered the manufacturer/device ID command
    ChipNotFound,
    /// The chip kept reporting busy past the polling budget
    Timeout,

    // Address/size errors
    /// Address or block number is beyond the device
    AddressOutOfBounds,
    /// Address or length does not respect page or erase alignment
    InvalidAlignment,
    /// Provided buffer does not have the expected size
    BufferTooSmall,

    // Block device errors
    /// Block device used before a successful `initialize()`
    NotInitialized,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpiTransferFailed => write!(f, "SPI transfer failed"),
            Self::OpcodeNotSupported => write!(f, "SPI opcode not supported by bus master"),
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::Timeout => write!(f, "flash chip did not leave busy state"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::BufferTooSmall => write!(f, "buffer size does not match block size"),
            Self::NotInitialized => write!(f, "block device not initialized"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
