//! Single-block read and write

use std::fs;
use std::path::Path;

use spiflash_core::chip::ChipTable;
use spiflash_core::disk::{SpiFlashDisk, BLOCK_SIZE};
use spiflash_core::programmer::SpiMaster;

use super::{expect_done, CmdResult};

/// Read one block into a file
pub fn run_read_block<M: SpiMaster, T: ChipTable>(
    disk: &mut SpiFlashDisk<M, T>,
    block: u32,
    output: &Path,
) -> CmdResult {
    let mut buf = [0u8; BLOCK_SIZE];
    expect_done(disk.read_block(block, &mut buf)?, block)?;
    fs::write(output, buf)?;
    println!("Read block {} to {:?}", block, output);
    Ok(())
}

/// Write one block from a file and sync
///
/// Files shorter than a block are padded with 0xFF.
pub fn run_write_block<M: SpiMaster, T: ChipTable>(
    disk: &mut SpiFlashDisk<M, T>,
    block: u32,
    input: &Path,
) -> CmdResult {
    let data = fs::read(input)?;
    if data.len() > BLOCK_SIZE {
        return Err(format!(
            "{:?} is {} bytes, larger than one block ({} bytes)",
            input,
            data.len(),
            BLOCK_SIZE
        )
        .into());
    }

    let mut buf = [0xFFu8; BLOCK_SIZE];
    buf[..data.len()].copy_from_slice(&data);
    expect_done(disk.write_block(block, &buf)?, block)?;
    disk.sync()?;
    println!("Wrote block {} from {:?}", block, input);
    Ok(())
}
