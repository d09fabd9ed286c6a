//! SPI types and command structures
//!
//! This module provides types for representing SPI transactions, the
//! W25Q opcodes, and the byte order helpers used on and off the wire.

mod address;
mod byte_order;
mod command;
pub mod opcodes;

pub use address::AddressWidth;
pub use byte_order::ByteOrder;
pub use command::{SpiCommand, MAX_HEADER_LEN};
pub use opcodes::*;
