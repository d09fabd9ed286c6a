//! Chip erase

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use spiflash_core::chip::ChipTable;
use spiflash_core::disk::SpiFlashDisk;
use spiflash_core::programmer::SpiMaster;

use super::{create_spinner_style, CmdResult};

/// Erase the whole chip, discarding cached writes
pub fn run_format<M: SpiMaster, T: ChipTable>(disk: &mut SpiFlashDisk<M, T>) -> CmdResult {
    let pb = ProgressBar::new_spinner();
    pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
    pb.set_message(format!("Erasing {} bytes...", disk.total_size()));
    pb.enable_steady_tick(Duration::from_millis(100));

    let result = disk.reformat();
    match &result {
        Ok(()) => pb.finish_with_message("Erase complete"),
        Err(_) => pb.abandon_with_message("Erase failed"),
    }
    result?;
    Ok(())
}
