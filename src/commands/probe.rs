//! Probe and info commands

use spiflash_core::chip::ChipTable;
use spiflash_core::disk::{BlockDevice, SpiFlashDisk};
use spiflash_core::programmer::SpiMaster;
use spiflash_core::Error;

use super::CmdResult;

/// Detect the chip and report it
pub fn run_probe<M: SpiMaster, T: ChipTable>(disk: &mut SpiFlashDisk<M, T>) -> CmdResult {
    match disk.initialize() {
        Ok(()) => {
            println!(
                "Found {} (ID {}), {} bytes",
                disk.chip_name().unwrap_or("flash chip"),
                disk.device_id().map(|id| id.to_string()).unwrap_or_default(),
                disk.total_size()
            );
            Ok(())
        }
        Err(Error::ChipNotFound) => {
            let id = disk.device_id().map(|id| id.to_string()).unwrap_or_default();
            Err(format!("No supported flash chip found (ID {})", id).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Print chip and block device details
pub fn run_info<M: SpiMaster, T: ChipTable>(disk: &mut SpiFlashDisk<M, T>) -> CmdResult {
    let unique_id = disk.flash().unique_id()?;
    let bus_hz = disk.flash().config().bus_hz;

    println!("Chip:        {}", disk.chip_name().unwrap_or("unknown"));
    if let Some(id) = disk.device_id() {
        println!("Device ID:   {}", id);
    }
    println!("Unique ID:   {:016X}", unique_id);
    println!(
        "Capacity:    {} bytes ({} KiB)",
        disk.total_size(),
        disk.total_size() / 1024
    );
    println!("Block size:  {} bytes", disk.block_size());
    println!("Blocks:      {}", disk.block_count());
    println!("Bus clock:   {} Hz", bus_hz);
    println!("DMA:         {}", if disk.supports_dma() { "yes" } else { "no" });
    Ok(())
}
