//! Block device backed by an SPI flash chip

use super::cache::{CacheState, SectorCache};
use super::device::{BlockDevice, DiskStatus, Transfer};
use super::geometry::{
    sector_address, BlockLocation, BLOCK_SIZE, PAGES_PER_REPORTED_BLOCK, PAGE_SIZE,
    REPORTED_BLOCK_SIZE, SECTOR_ERASE,
};
use crate::chip::{ChipTable, DeviceId, KnownChips};
use crate::config::SpiFlashConfig;
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::protocol::SpiFlash;

/// Logical block device on a W25Q flash chip
///
/// Blocks are [`BLOCK_SIZE`] bytes; eight of them share one erasable
/// sector. Reads and writes are served from a one-sector cache. A dirty
/// sector reaches flash when a block from another sector is accessed, or
/// on [`flush`](Self::flush), [`sync`](Self::sync) and
/// [`periodic`](Self::periodic). Until then a power loss drops the
/// modification.
///
/// While a read or write is running the device reports busy, and any
/// transfer attempted in that window returns [`Transfer::Skipped`]
/// without touching the bus or the cache.
#[derive(Debug)]
pub struct SpiFlashDisk<M: SpiMaster, T: ChipTable = KnownChips> {
    flash: SpiFlash<M>,
    chips: T,
    cache: SectorCache,
    busy: bool,
    id: Option<DeviceId>,
    /// Page count of the detected chip, `None` until initialized
    pages: Option<u32>,
}

impl<M: SpiMaster> SpiFlashDisk<M> {
    /// Create a disk that recognizes the compiled-in chips
    pub fn new(master: M, config: SpiFlashConfig) -> Self {
        Self::with_chips(master, config, KnownChips)
    }
}

impl<M: SpiMaster, T: ChipTable> SpiFlashDisk<M, T> {
    /// Create a disk that recognizes the chips in `chips`
    pub fn with_chips(master: M, config: SpiFlashConfig, chips: T) -> Self {
        Self {
            flash: SpiFlash::new(master, config),
            chips,
            cache: SectorCache::new(),
            busy: false,
            id: None,
            pages: None,
        }
    }

    /// Configure the bus and detect the chip
    ///
    /// Fails with [`Error::ChipNotFound`] unless the chip answers with an
    /// ID from the chip table.
    pub fn initialize(&mut self) -> Result<()> {
        self.flash.configure_bus();
        self.pages = None;

        let id = self.flash.detect()?;
        self.id = Some(id);

        let Some(spec) = self.chips.lookup(id) else {
            log::warn!("disk: no supported flash chip (id {})", id);
            return Err(Error::ChipNotFound);
        };

        let pages = spec.total_size / PAGE_SIZE as u32;
        self.pages = Some(pages);
        log::info!(
            "disk: {} ({}), {} bytes, {} blocks",
            self.chips.name(id).unwrap_or("flash"),
            id,
            spec.total_size,
            pages / PAGES_PER_REPORTED_BLOCK as u32
        );
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) found a supported chip
    pub fn is_initialized(&self) -> bool {
        self.pages.is_some()
    }

    /// ID read by the last [`initialize`](Self::initialize)
    pub fn device_id(&self) -> Option<DeviceId> {
        self.id
    }

    /// Part name of the detected chip
    pub fn chip_name(&self) -> Option<&str> {
        self.id.and_then(|id| self.chips.name(id))
    }

    /// State of the sector cache
    pub fn cache_state(&self) -> CacheState {
        self.cache.state()
    }

    /// Read one block into `buf`
    pub fn read_block(&mut self, block: u32, buf: &mut [u8]) -> Result<Transfer> {
        if self.busy {
            log::debug!("disk: read of block {} skipped, busy", block);
            return Ok(Transfer::Skipped);
        }
        self.check_request(block, buf.len())?;

        self.busy = true;
        let result = self.read_cached(block, buf);
        self.busy = false;

        result.map(|()| Transfer::Done)
    }

    /// Write one block from `data`
    ///
    /// The block lands in the cache only; see the type documentation for
    /// when it reaches flash.
    pub fn write_block(&mut self, block: u32, data: &[u8]) -> Result<Transfer> {
        if self.busy {
            log::debug!("disk: write of block {} skipped, busy", block);
            return Ok(Transfer::Skipped);
        }
        self.check_request(block, data.len())?;

        self.busy = true;
        let result = self.write_cached(block, data);
        self.busy = false;

        result.map(|()| Transfer::Done)
    }

    /// Write the cached sector back if it is dirty
    ///
    /// Erases the sector and programs it page by page. On failure the
    /// cache stays dirty and the next flush rewrites the whole sector.
    pub fn flush(&mut self) -> Result<()> {
        let flash = &mut self.flash;
        let written = self
            .cache
            .store_with(|sector, data| write_back(flash, sector, data))?;
        if written {
            log::debug!("disk: flushed sector");
        }
        Ok(())
    }

    /// Make every buffered write durable
    pub fn sync(&mut self) -> Result<()> {
        self.flush()
    }

    /// Opportunistic flush for a timer or idle hook
    ///
    /// Skipped while a transfer is in progress.
    pub fn periodic(&mut self) -> Result<Transfer> {
        if self.busy {
            return Ok(Transfer::Skipped);
        }
        self.flush().map(|()| Transfer::Done)
    }

    /// Erase the whole chip
    ///
    /// Pending cached writes are discarded, not flushed.
    pub fn reformat(&mut self) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }

        self.busy = true;
        let result = self.flash.erase_chip();
        self.cache.invalidate();
        self.busy = false;

        result
    }

    /// Number of blocks reported to the adapter (0 before initialization)
    pub fn block_count(&self) -> u32 {
        self.pages
            .map_or(0, |pages| pages / PAGES_PER_REPORTED_BLOCK as u32)
    }

    /// Device capacity in bytes (0 before initialization)
    pub fn total_size(&self) -> u64 {
        self.pages
            .map_or(0, |pages| u64::from(pages) * PAGE_SIZE as u64)
    }

    /// Size of a reported block in bytes
    pub fn block_size(&self) -> u32 {
        REPORTED_BLOCK_SIZE as u32
    }

    /// Whether a transfer is in progress
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Get the flash driver
    pub fn flash(&mut self) -> &mut SpiFlash<M> {
        &mut self.flash
    }

    /// Consume the disk and return the master
    ///
    /// A dirty cached sector is lost; [`sync`](Self::sync) first.
    pub fn into_master(self) -> M {
        if self.cache.is_dirty() {
            log::warn!("disk: dropping unflushed sector");
        }
        self.flash.into_master()
    }

    fn check_request(&self, block: u32, len: usize) -> Result<()> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        if len != BLOCK_SIZE {
            return Err(Error::BufferTooSmall);
        }
        if block >= self.block_count() {
            return Err(Error::AddressOutOfBounds);
        }
        Ok(())
    }

    fn read_cached(&mut self, block: u32, buf: &mut [u8]) -> Result<()> {
        let loc = BlockLocation::of(block);
        self.load_sector(loc.sector)?;
        self.cache.read_block(loc.offset, buf);
        Ok(())
    }

    fn write_cached(&mut self, block: u32, data: &[u8]) -> Result<()> {
        let loc = BlockLocation::of(block);
        self.load_sector(loc.sector)?;
        self.cache.write_block(loc.offset, data);
        Ok(())
    }

    /// Make `sector` resident, writing back whatever it replaces
    fn load_sector(&mut self, sector: u32) -> Result<()> {
        if self.cache.holds(sector) {
            return Ok(());
        }
        if let CacheState::Dirty { sector: old } = self.cache.state() {
            log::debug!("disk: evicting sector {} for {}", old, sector);
        }
        self.flush()?;

        let flash = &mut self.flash;
        self.cache
            .load_with(sector, |buf| flash.read_bytes(sector_address(sector), buf))
    }
}

fn write_back<M: SpiMaster>(flash: &mut SpiFlash<M>, sector: u32, data: &[u8]) -> Result<()> {
    let base = sector_address(sector);
    flash.erase_sector(base, SECTOR_ERASE)?;
    for (i, page) in data.chunks_exact(PAGE_SIZE).enumerate() {
        flash.program_page(base + (i * PAGE_SIZE) as u32, page)?;
    }
    Ok(())
}

impl<M: SpiMaster, T: ChipTable> BlockDevice for SpiFlashDisk<M, T> {
    fn initialize(&mut self) -> Result<()> {
        SpiFlashDisk::initialize(self)
    }

    fn status(&self) -> DiskStatus {
        if self.is_initialized() {
            DiskStatus::Ok
        } else {
            DiskStatus::Failed
        }
    }

    fn read_block(&mut self, block: u32, buf: &mut [u8]) -> Result<Transfer> {
        SpiFlashDisk::read_block(self, block, buf)
    }

    fn write_block(&mut self, block: u32, data: &[u8]) -> Result<Transfer> {
        SpiFlashDisk::write_block(self, block, data)
    }

    fn sync(&mut self) -> Result<()> {
        SpiFlashDisk::sync(self)
    }

    fn block_count(&self) -> u32 {
        SpiFlashDisk::block_count(self)
    }

    fn block_size(&self) -> u32 {
        SpiFlashDisk::block_size(self)
    }

    fn total_size(&self) -> u64 {
        SpiFlashDisk::total_size(self)
    }

    fn is_busy(&self) -> bool {
        SpiFlashDisk::is_busy(self)
    }
}
