//! Block device abstraction
//!
//! The interface a filesystem adapter drives. Block numbers are logical;
//! buffers are exactly one block long.

use crate::error::Result;

/// Outcome of a block transfer that returned without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Data was transferred
    Done,
    /// Device was busy with another transfer; nothing happened
    Skipped,
}

impl Transfer {
    /// Check whether data was actually transferred
    pub fn is_done(&self) -> bool {
        matches!(self, Transfer::Done)
    }
}

/// Status code handed to a filesystem adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum DiskStatus {
    /// Operation succeeded or device usable
    Ok = 0,
    /// Operation failed or device unusable
    Failed = 1,
}

impl DiskStatus {
    /// Numeric code: 0 on success, 1 on failure
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl<T> From<&Result<T>> for DiskStatus {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => DiskStatus::Ok,
            Err(_) => DiskStatus::Failed,
        }
    }
}

/// Fixed-size block storage
pub trait BlockDevice {
    /// Bring the device up; must succeed before any transfer
    fn initialize(&mut self) -> Result<()>;

    /// Whether the device is ready for transfers
    fn status(&self) -> DiskStatus;

    /// Read one block into `buf`
    fn read_block(&mut self, block: u32, buf: &mut [u8]) -> Result<Transfer>;

    /// Write one block from `data`
    ///
    /// The write may be buffered; call [`sync`](Self::sync) to make it
    /// durable.
    fn write_block(&mut self, block: u32, data: &[u8]) -> Result<Transfer>;

    /// Make every buffered write durable
    fn sync(&mut self) -> Result<()>;

    /// Number of blocks reported to the adapter
    fn block_count(&self) -> u32;

    /// Size of a reported block in bytes
    fn block_size(&self) -> u32;

    /// Device capacity in bytes
    fn total_size(&self) -> u64;

    /// Whether buffers may be handed to a DMA engine
    fn supports_dma(&self) -> bool {
        false
    }

    /// Whether a transfer is in progress
    fn is_busy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_status_codes() {
        assert_eq!(DiskStatus::Ok.code(), 0);
        assert_eq!(DiskStatus::Failed.code(), 1);
        assert_eq!(DiskStatus::from(&Ok::<_, Error>(())), DiskStatus::Ok);
        assert_eq!(DiskStatus::from(&Err::<(), _>(Error::Timeout)), DiskStatus::Failed);
    }
}
