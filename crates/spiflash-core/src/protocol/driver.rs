//! Flash driver value
//!
//! `SpiFlash` owns the bus master and the driver configuration so callers do
//! not have to thread poll timings through every call.

use super::w25q::{self, EraseGranularity};
use crate::chip::{ChipTable, DeviceId, UNKNOWN_CAPACITY};
use crate::config::SpiFlashConfig;
use crate::disk::PAGE_SIZE;
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;

/// W25Q flash driver
#[derive(Debug)]
pub struct SpiFlash<M: SpiMaster> {
    master: M,
    config: SpiFlashConfig,
}

impl<M: SpiMaster> SpiFlash<M> {
    /// Create a driver for the chip behind `master`
    pub fn new(master: M, config: SpiFlashConfig) -> Self {
        Self { master, config }
    }

    /// Get the driver configuration
    pub fn config(&self) -> &SpiFlashConfig {
        &self.config
    }

    /// Get a mutable reference to the underlying master
    pub fn master(&mut self) -> &mut M {
        &mut self.master
    }

    /// Consume the driver and return the master
    pub fn into_master(self) -> M {
        self.master
    }

    /// Apply the configured serial clock rate
    pub fn configure_bus(&mut self) {
        log::debug!("flash: bus clock {} Hz", self.config.bus_hz);
        self.master.set_frequency(self.config.bus_hz);
    }

    /// Read the manufacturer/device ID
    pub fn detect(&mut self) -> Result<DeviceId> {
        let id = w25q::read_device_id(&mut self.master)?;
        log::debug!("flash: device id {}", id);
        Ok(id)
    }

    /// Check whether a chip from `chips` answers on the bus
    pub fn is_present<T: ChipTable + ?Sized>(&mut self, chips: &T) -> Result<bool> {
        let id = self.detect()?;
        Ok(chips.lookup(id).is_some())
    }

    /// Capacity in bytes, or [`UNKNOWN_CAPACITY`] for an unrecognized chip
    pub fn capacity<T: ChipTable + ?Sized>(&mut self, chips: &T) -> Result<u32> {
        let id = self.detect()?;
        let capacity = chips.capacity(id);
        if capacity == UNKNOWN_CAPACITY {
            log::warn!("flash: unrecognized device id {}", id);
        }
        Ok(capacity)
    }

    /// Read the 64-bit unique ID
    pub fn unique_id(&mut self) -> Result<u64> {
        w25q::read_unique_id(&mut self.master)
    }

    /// Stream `buf.len()` bytes starting at `addr`
    pub fn read_bytes(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        log::trace!("flash: read {} bytes at 0x{:06X}", buf.len(), addr);
        w25q::read(&mut self.master, addr, buf)
    }

    /// Program one page at `addr` (page must be erased)
    ///
    /// Masters that cannot send a whole page in one transaction get it in
    /// several program commands of at most `max_write_len()` bytes.
    pub fn program_page(&mut self, addr: u32, page: &[u8]) -> Result<()> {
        if page.is_empty() || addr as usize % PAGE_SIZE + page.len() > PAGE_SIZE {
            return Err(Error::InvalidAlignment);
        }
        log::trace!("flash: program {} bytes at 0x{:06X}", page.len(), addr);

        let max_write = self.master.max_write_len().max(1);
        let mut chunk_addr = addr;
        for chunk in page.chunks(max_write) {
            w25q::program_page(&mut self.master, chunk_addr, chunk, self.config.page_program)?;
            chunk_addr += chunk.len() as u32;
        }
        Ok(())
    }

    /// Erase the sector or block at `addr`
    pub fn erase_sector(&mut self, addr: u32, granularity: EraseGranularity) -> Result<()> {
        log::debug!("flash: erase {:?} at 0x{:06X}", granularity, addr);
        let timing = match granularity {
            EraseGranularity::Sector4K => self.config.erase_4k,
            EraseGranularity::Block32K | EraseGranularity::Block64K => self.config.erase_block,
        };
        w25q::erase_block(&mut self.master, granularity, addr, timing)
    }

    /// Erase the whole chip
    pub fn erase_chip(&mut self) -> Result<()> {
        log::info!("flash: chip erase");
        w25q::chip_erase(&mut self.master, self.config.erase_chip)
    }
}
