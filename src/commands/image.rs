//! Whole-device dump and restore

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use spiflash_core::chip::ChipTable;
use spiflash_core::disk::{SpiFlashDisk, BLOCK_SIZE};
use spiflash_core::programmer::SpiMaster;

use super::{create_progress_bar, expect_done, CmdResult};

/// Read every block into a file
pub fn run_dump<M: SpiMaster, T: ChipTable>(
    disk: &mut SpiFlashDisk<M, T>,
    output: &Path,
) -> CmdResult {
    let count = disk.block_count();
    let pb = create_progress_bar(u64::from(count) * BLOCK_SIZE as u64, "Reading")?;

    let mut file = BufWriter::new(File::create(output)?);
    let mut buf = [0u8; BLOCK_SIZE];
    for block in 0..count {
        expect_done(disk.read_block(block, &mut buf)?, block)?;
        file.write_all(&buf)?;
        pb.inc(BLOCK_SIZE as u64);
    }
    file.flush()?;
    pb.finish_with_message("done");

    println!("Dumped {} blocks to {:?}", count, output);
    Ok(())
}

/// Write a file to the device from block 0 and sync
///
/// A trailing partial block keeps the device contents past the end of the
/// file.
pub fn run_restore<M: SpiMaster, T: ChipTable>(
    disk: &mut SpiFlashDisk<M, T>,
    input: &Path,
) -> CmdResult {
    let data = fs::read(input)?;
    let capacity = u64::from(disk.block_count()) * BLOCK_SIZE as u64;
    if data.len() as u64 > capacity {
        return Err(format!(
            "{:?} is {} bytes, device holds {} bytes",
            input,
            data.len(),
            capacity
        )
        .into());
    }

    let pb = create_progress_bar(data.len() as u64, "Writing")?;
    let mut buf = [0u8; BLOCK_SIZE];
    for (block, chunk) in (0u32..).zip(data.chunks(BLOCK_SIZE)) {
        if chunk.len() < BLOCK_SIZE {
            expect_done(disk.read_block(block, &mut buf)?, block)?;
        }
        buf[..chunk.len()].copy_from_slice(chunk);
        expect_done(disk.write_block(block, &buf)?, block)?;
        pb.inc(chunk.len() as u64);
    }
    disk.sync()?;
    pb.finish_with_message("done");

    println!("Restored {} bytes from {:?}", data.len(), input);
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use crate::commands::test_support::{dummy_disk, temp_path};

    #[test]
    fn test_restore_then_dump() {
        let input = temp_path("restore-in");
        let output = temp_path("dump-out");
        let image: Vec<u8> = (0..3 * BLOCK_SIZE + 100).map(|i| (i % 251) as u8).collect();
        fs::write(&input, &image).unwrap();

        let mut disk = dummy_disk(0xEF13);
        disk.initialize().unwrap();
        disk.write_block(3, &[0x00; BLOCK_SIZE]).unwrap();
        run_restore(&mut disk, &input).unwrap();

        run_dump(&mut disk, &output).unwrap();
        let dumped = fs::read(&output).unwrap();
        fs::remove_file(&input).unwrap();
        fs::remove_file(&output).unwrap();

        assert_eq!(dumped.len(), 1024 * 1024);
        assert_eq!(&dumped[..image.len()], &image[..]);
        // Tail of the partial block keeps what was there
        assert!(dumped[image.len()..4 * BLOCK_SIZE].iter().all(|&b| b == 0x00));
        assert!(dumped[4 * BLOCK_SIZE..].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_restore_rejects_oversized_image() {
        let input = temp_path("restore-big");
        fs::write(&input, vec![0u8; 1024 * 1024 + 1]).unwrap();

        let mut disk = dummy_disk(0xEF13);
        disk.initialize().unwrap();
        let result = run_restore(&mut disk, &input);
        fs::remove_file(&input).unwrap();
        assert!(result.is_err());
    }
}
