//! Flash and block geometry constants

use crate::protocol::EraseGranularity;

/// Bytes per program/read unit
pub const PAGE_SIZE: usize = 256;

/// Smallest erasable unit
pub const SECTOR_SIZE: usize = 4 * 1024;

/// Logical block size served by the block layer
pub const BLOCK_SIZE: usize = 512;

/// Erase command matching [`SECTOR_SIZE`]
pub const SECTOR_ERASE: EraseGranularity = EraseGranularity::Sector4K;

/// Flash pages per sector
pub const PAGES_PER_SECTOR: usize = SECTOR_SIZE / PAGE_SIZE;

/// Logical blocks per sector
pub const BLOCKS_PER_SECTOR: usize = SECTOR_SIZE / BLOCK_SIZE;

/// Flash pages folded into one block reported to the disk adapter
///
/// The adapter sees blocks of two pages, and half as many blocks as there
/// are pages. Fixed, not derived from [`BLOCK_SIZE`].
pub const PAGES_PER_REPORTED_BLOCK: usize = 2;

/// Block size reported to the disk adapter
pub const REPORTED_BLOCK_SIZE: usize = PAGE_SIZE * PAGES_PER_REPORTED_BLOCK;

const _: () = assert!(BLOCK_SIZE <= SECTOR_SIZE);
const _: () = assert!(SECTOR_SIZE % PAGE_SIZE == 0);
const _: () = assert!(SECTOR_SIZE % BLOCK_SIZE == 0);
const _: () = assert!(SECTOR_ERASE.size() as usize == SECTOR_SIZE);
const _: () = assert!(REPORTED_BLOCK_SIZE == BLOCK_SIZE);

/// Where a logical block lives on flash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLocation {
    /// Sector holding the block
    pub sector: u32,
    /// Byte offset of the block inside the sector
    pub offset: usize,
}

impl BlockLocation {
    /// Locate `block`
    pub const fn of(block: u32) -> Self {
        Self {
            sector: block / BLOCKS_PER_SECTOR as u32,
            offset: (block as usize % BLOCKS_PER_SECTOR) * BLOCK_SIZE,
        }
    }
}

/// Flash address of the first byte of `sector`
pub const fn sector_address(sector: u32) -> u32 {
    sector * SECTOR_SIZE as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_location() {
        assert_eq!(BlockLocation::of(0), BlockLocation { sector: 0, offset: 0 });
        assert_eq!(
            BlockLocation::of(7),
            BlockLocation {
                sector: 0,
                offset: 7 * BLOCK_SIZE
            }
        );
        assert_eq!(BlockLocation::of(8), BlockLocation { sector: 1, offset: 0 });
        assert_eq!(
            BlockLocation::of(19),
            BlockLocation {
                sector: 2,
                offset: 3 * BLOCK_SIZE
            }
        );
    }

    #[test]
    fn test_sector_address() {
        assert_eq!(sector_address(0), 0);
        assert_eq!(sector_address(3), 0x3000);
    }
}
