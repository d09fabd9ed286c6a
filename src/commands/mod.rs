//! CLI command implementations
//!
//! Every command works on a [`SpiFlashDisk`] over any bus, so the same code
//! serves the emulator and real hardware. Commands that write end with a
//! `sync()` so nothing is left in the sector cache.

mod block;
mod format;
mod image;
mod list;
mod probe;

pub use list::list_backends;

use indicatif::{ProgressBar, ProgressStyle};
use spiflash_core::chip::ChipTable;
use spiflash_core::disk::{SpiFlashDisk, Transfer};
use spiflash_core::programmer::SpiMaster;

use crate::cli::Commands;

/// Result type shared by the command implementations
pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Run a device command against `disk`
pub fn run<M: SpiMaster, T: ChipTable>(
    disk: &mut SpiFlashDisk<M, T>,
    command: &Commands,
) -> CmdResult {
    if let Commands::Probe { .. } = command {
        return probe::run_probe(disk);
    }

    disk.initialize()?;
    match command {
        Commands::Info { .. } => probe::run_info(disk),
        Commands::ReadBlock { block, output, .. } => block::run_read_block(disk, *block, output),
        Commands::WriteBlock { block, input, .. } => block::run_write_block(disk, *block, input),
        Commands::Dump { output, .. } => image::run_dump(disk, output),
        Commands::Restore { input, .. } => image::run_restore(disk, input),
        Commands::Format { .. } => format::run_format(disk),
        Commands::Probe { .. } | Commands::ListBackends => Ok(()),
    }
}

/// Turn a skipped transfer into an error
fn expect_done(transfer: Transfer, block: u32) -> CmdResult {
    if transfer.is_done() {
        Ok(())
    } else {
        Err(format!("block {}: device busy, transfer skipped", block).into())
    }
}

/// Create a progress bar with custom phase message
fn create_progress_bar(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Create a standard spinner style
fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?)
}

#[cfg(all(test, feature = "dummy"))]
pub(crate) mod test_support {
    use spiflash_core::chip::{DeviceId, KnownChips};
    use spiflash_core::disk::SpiFlashDisk;
    use spiflash_core::programmer::BusMaster;
    use spiflash_dummy::{DummyConfig, DummyFlash};
    use std::path::PathBuf;

    pub type TestDisk = SpiFlashDisk<BusMaster<DummyFlash>, KnownChips>;

    pub fn dummy_disk(id: u16) -> TestDisk {
        let flash = DummyFlash::new(DummyConfig::for_id(DeviceId(id)));
        SpiFlashDisk::new(BusMaster::new(flash), Default::default())
    }

    pub fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spiflash-disk-{}-{}.bin", std::process::id(), name))
    }
}
