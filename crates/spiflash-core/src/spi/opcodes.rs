//! W25Q serial flash command opcodes
//!
//! Only the single-I/O command set the block layer needs is listed here.
//! Values follow the Winbond W25Q80BV / W25Q64JV datasheets.

// ============================================================================
// Write control
// ============================================================================

/// Write Enable - required before any program/erase operation
pub const WREN: u8 = 0x06;

// ============================================================================
// Status register
// ============================================================================

/// Read Status Register 1
pub const RDSR: u8 = 0x05;

// ============================================================================
// Identification
// ============================================================================

/// Read Manufacturer / Device ID (24-bit dummy address, 2 ID bytes)
pub const REMS: u8 = 0x90;
/// Read Unique ID (24-bit dummy address, 1 dummy byte, 8 ID bytes)
pub const RDUID: u8 = 0x4B;

// ============================================================================
// Read / program
// ============================================================================

/// Read Data with 3-byte address
pub const READ: u8 = 0x03;
/// Page Program with 3-byte address
pub const PP: u8 = 0x02;

// ============================================================================
// Erase
// ============================================================================

/// Sector Erase 4KB
pub const SE_20: u8 = 0x20;
/// Block Erase 32KB
pub const BE_52: u8 = 0x52;
/// Block Erase 64KB
pub const BE_D8: u8 = 0xD8;
/// Chip Erase (0x60 is an accepted alias on W25Q parts)
pub const CE_C7: u8 = 0xC7;

// ============================================================================
// Status register bit definitions
// ============================================================================

/// Status Register 1: Busy / Write In Progress
pub const SR1_BUSY: u8 = 0x01;
/// Status Register 1: Write Enable Latch
pub const SR1_WEL: u8 = 0x02;
