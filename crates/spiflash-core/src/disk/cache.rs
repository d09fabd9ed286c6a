//! Single-sector write-back cache

use super::geometry::{BLOCK_SIZE, SECTOR_SIZE};
use crate::error::Result;

/// Observable state of the cache slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// No sector loaded
    Empty,
    /// Sector loaded, identical to flash
    Clean {
        /// Cached sector number
        sector: u32,
    },
    /// Sector loaded and modified
    Dirty {
        /// Cached sector number
        sector: u32,
    },
}

/// Holds at most one sector of flash
///
/// Invariant: `dirty` implies `loaded`. Contents only change through
/// [`load_with`](Self::load_with), block writes and
/// [`invalidate`](Self::invalidate); write-back goes through
/// [`store_with`](Self::store_with).
pub struct SectorCache {
    loaded: bool,
    dirty: bool,
    sector: u32,
    buffer: [u8; SECTOR_SIZE],
}

impl Default for SectorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for SectorCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SectorCache")
            .field("state", &self.state())
            .finish()
    }
}

impl SectorCache {
    /// Create an empty cache
    pub const fn new() -> Self {
        Self {
            loaded: false,
            dirty: false,
            sector: 0,
            buffer: [0xFF; SECTOR_SIZE],
        }
    }

    /// Current state
    pub fn state(&self) -> CacheState {
        match (self.loaded, self.dirty) {
            (false, _) => CacheState::Empty,
            (true, false) => CacheState::Clean {
                sector: self.sector,
            },
            (true, true) => CacheState::Dirty {
                sector: self.sector,
            },
        }
    }

    /// Whether `sector` is resident
    pub fn holds(&self, sector: u32) -> bool {
        self.loaded && self.sector == sector
    }

    /// Whether the resident sector differs from flash
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the contents with `sector`, filled by `fill`
    ///
    /// Must not be called while dirty. If `fill` fails the cache is left
    /// empty.
    pub fn load_with<F>(&mut self, sector: u32, fill: F) -> Result<()>
    where
        F: FnOnce(&mut [u8]) -> Result<()>,
    {
        debug_assert!(!self.dirty, "loading over a dirty sector");
        self.loaded = false;
        fill(&mut self.buffer[..])?;
        self.sector = sector;
        self.loaded = true;
        Ok(())
    }

    /// Write the resident sector back through `store` if it is dirty
    ///
    /// Returns whether anything was written. If `store` fails the cache
    /// stays dirty so a later call retries the whole sector.
    pub fn store_with<F>(&mut self, store: F) -> Result<bool>
    where
        F: FnOnce(u32, &[u8]) -> Result<()>,
    {
        if !self.dirty {
            return Ok(false);
        }
        store(self.sector, &self.buffer[..])?;
        self.dirty = false;
        Ok(true)
    }

    /// Copy the block at `offset` out of the resident sector
    pub fn read_block(&self, offset: usize, buf: &mut [u8]) {
        debug_assert!(self.loaded);
        buf.copy_from_slice(&self.buffer[offset..offset + BLOCK_SIZE]);
    }

    /// Overwrite the block at `offset` and mark the sector dirty
    pub fn write_block(&mut self, offset: usize, data: &[u8]) {
        debug_assert!(self.loaded);
        self.buffer[offset..offset + BLOCK_SIZE].copy_from_slice(data);
        self.dirty = true;
    }

    /// Drop the resident sector without writing it back
    pub fn invalidate(&mut self) {
        self.loaded = false;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_state_transitions() {
        let mut cache = SectorCache::new();
        assert_eq!(cache.state(), CacheState::Empty);

        cache.load_with(3, |buf| {
            buf.fill(0xAB);
            Ok(())
        })
        .unwrap();
        assert_eq!(cache.state(), CacheState::Clean { sector: 3 });
        assert!(cache.holds(3));
        assert!(!cache.holds(4));

        cache.write_block(BLOCK_SIZE, &[0x11; BLOCK_SIZE]);
        assert_eq!(cache.state(), CacheState::Dirty { sector: 3 });

        let mut out = [0u8; BLOCK_SIZE];
        cache.read_block(BLOCK_SIZE, &mut out);
        assert_eq!(out, [0x11; BLOCK_SIZE]);
        cache.read_block(0, &mut out);
        assert_eq!(out, [0xAB; BLOCK_SIZE]);

        cache.invalidate();
        assert_eq!(cache.state(), CacheState::Empty);
    }

    #[test]
    fn test_store_only_when_dirty() {
        let mut cache = SectorCache::new();
        cache.load_with(1, |_| Ok(())).unwrap();

        let mut calls = 0;
        assert!(!cache
            .store_with(|_, _| {
                calls += 1;
                Ok(())
            })
            .unwrap());
        assert_eq!(calls, 0);

        cache.write_block(0, &[0; BLOCK_SIZE]);
        assert!(cache
            .store_with(|sector, data| {
                calls += 1;
                assert_eq!(sector, 1);
                assert_eq!(data.len(), SECTOR_SIZE);
                Ok(())
            })
            .unwrap());
        assert_eq!(calls, 1);
        assert_eq!(cache.state(), CacheState::Clean { sector: 1 });
    }

    #[test]
    fn test_failed_store_stays_dirty() {
        let mut cache = SectorCache::new();
        cache.load_with(2, |_| Ok(())).unwrap();
        cache.write_block(0, &[0; BLOCK_SIZE]);

        let result = cache.store_with(|_, _| Err(Error::Timeout));
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(cache.state(), CacheState::Dirty { sector: 2 });
    }

    #[test]
    fn test_failed_load_leaves_empty() {
        let mut cache = SectorCache::new();
        cache.load_with(2, |_| Ok(())).unwrap();

        let result = cache.load_with(5, |_| Err(Error::SpiTransferFailed));
        assert_eq!(result, Err(Error::SpiTransferFailed));
        assert_eq!(cache.state(), CacheState::Empty);
    }
}
