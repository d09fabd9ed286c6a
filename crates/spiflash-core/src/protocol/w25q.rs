//! W25Q protocol implementation
//!
//! This module implements the W25Q-family command sequences: identification,
//! streaming reads, page program, sector/block/chip erase and busy polling.
//! Every mutating operation is preceded by Write Enable and followed by a
//! bounded wait for the busy bit to clear.

use bitflags::bitflags;

use crate::chip::DeviceId;
use crate::config::PollTiming;
use crate::disk::PAGE_SIZE;
use crate::error::{Error, Result};
use crate::programmer::SpiMaster;
use crate::spi::{opcodes, ByteOrder, SpiCommand};

bitflags! {
    /// Status register 1 bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Erase or program in progress
        const BUSY = opcodes::SR1_BUSY;
        /// Write enable latch
        const WEL = opcodes::SR1_WEL;
        /// Block protect bit 0
        const BP0 = 0x04;
        /// Block protect bit 1
        const BP1 = 0x08;
        /// Block protect bit 2
        const BP2 = 0x10;
        /// Top/bottom protect
        const TB = 0x20;
        /// Sector/block protect
        const SEC = 0x40;
        /// Status register protect 0
        const SRP0 = 0x80;
    }
}

/// Erase sizes the chip supports, smallest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EraseGranularity {
    /// 4 KiB sector erase (0x20)
    Sector4K,
    /// 32 KiB block erase (0x52)
    Block32K,
    /// 64 KiB block erase (0xD8)
    Block64K,
}

impl EraseGranularity {
    /// Opcode that performs this erase
    pub const fn opcode(&self) -> u8 {
        match self {
            Self::Sector4K => opcodes::SE_20,
            Self::Block32K => opcodes::BE_52,
            Self::Block64K => opcodes::BE_D8,
        }
    }

    /// Number of bytes erased
    pub const fn size(&self) -> u32 {
        match self {
            Self::Sector4K => 4 * 1024,
            Self::Block32K => 32 * 1024,
            Self::Block64K => 64 * 1024,
        }
    }

    /// Check whether `addr` sits on an erase boundary
    pub const fn is_aligned(&self, addr: u32) -> bool {
        addr % self.size() == 0
    }
}

/// Read the 16-bit manufacturer/device ID
///
/// An absent chip leaves MISO floating or pulled up, which reads back as
/// 0xFFFF (or 0x0000); those simply fail to match any known part.
pub fn read_device_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<DeviceId> {
    let mut buf = [0u8; 2];
    let mut cmd = SpiCommand::read_3b(opcodes::REMS, 0, &mut buf);
    master.execute(&mut cmd)?;
    Ok(DeviceId(ByteOrder::Big.decode_u16(&buf)))
}

/// Read the factory-programmed 64-bit unique ID
pub fn read_unique_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u64> {
    let mut buf = [0u8; 8];
    let mut cmd = SpiCommand::read_3b(opcodes::RDUID, 0, &mut buf).with_dummy_cycles(8);
    master.execute(&mut cmd)?;
    Ok(ByteOrder::Big.decode_u64(&buf))
}

/// Read the status register 1
pub fn read_status1<M: SpiMaster + ?Sized>(master: &mut M) -> Result<Status> {
    let mut buf = [0u8; 1];
    let mut cmd = SpiCommand::read_reg(opcodes::RDSR, &mut buf);
    master.execute(&mut cmd)?;
    Ok(Status::from_bits_retain(buf[0]))
}

/// Check if a write or erase operation is in progress
pub fn is_busy<M: SpiMaster + ?Sized>(master: &mut M) -> Result<bool> {
    Ok(read_status1(master)?.contains(Status::BUSY))
}

/// Send the Write Enable command
pub fn write_enable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    let mut cmd = SpiCommand::simple(opcodes::WREN);
    master.execute(&mut cmd)
}

/// Wait for the busy bit to clear
///
/// Polls status register 1 up to [`PollTiming::max_polls`] times, pausing
/// `poll_delay_us` between polls. Returns [`Error::Timeout`] if the chip is
/// still busy after the last poll.
pub fn wait_ready<M: SpiMaster + ?Sized>(master: &mut M, timing: PollTiming) -> Result<()> {
    let max_polls = timing.max_polls();

    for _ in 0..max_polls {
        if !is_busy(master)? {
            return Ok(());
        }
        if timing.poll_delay_us > 0 {
            master.delay_us(timing.poll_delay_us);
        }
    }

    log::warn!(
        "flash still busy after {} polls ({} us budget)",
        max_polls,
        timing.timeout_us
    );
    Err(Error::Timeout)
}

/// Read data using 3-byte addressing
///
/// Reads stream across page and sector boundaries; the transfer is only
/// split where the master limits transaction size.
pub fn read<M: SpiMaster + ?Sized>(master: &mut M, addr: u32, buf: &mut [u8]) -> Result<()> {
    let max_len = master.max_read_len();
    let mut offset = 0;

    while offset < buf.len() {
        let chunk_len = core::cmp::min(max_len, buf.len() - offset);
        let chunk = &mut buf[offset..offset + chunk_len];
        let mut cmd = SpiCommand::read_3b(opcodes::READ, addr + offset as u32, chunk);
        master.execute(&mut cmd)?;
        offset += chunk_len;
    }

    Ok(())
}

/// Program a single page
///
/// The data must not cross a page boundary; the target must already be
/// erased. Programming over unerased bytes is not detected here: the chip
/// can only clear bits, so the result is the AND of old and new data.
pub fn program_page<M: SpiMaster + ?Sized>(
    master: &mut M,
    addr: u32,
    data: &[u8],
    timing: PollTiming,
) -> Result<()> {
    let page_offset = addr as usize % PAGE_SIZE;
    if data.is_empty() || page_offset + data.len() > PAGE_SIZE {
        return Err(Error::InvalidAlignment);
    }

    write_enable(master)?;

    let mut cmd = SpiCommand::write_3b(opcodes::PP, addr, data);
    master.execute(&mut cmd)?;

    wait_ready(master, timing)
}

/// Erase a sector/block at the given address
///
/// `addr` must be aligned to the erase size; nothing is sent otherwise.
pub fn erase_block<M: SpiMaster + ?Sized>(
    master: &mut M,
    granularity: EraseGranularity,
    addr: u32,
    timing: PollTiming,
) -> Result<()> {
    if !granularity.is_aligned(addr) {
        return Err(Error::InvalidAlignment);
    }

    write_enable(master)?;

    let mut cmd = SpiCommand::erase_3b(granularity.opcode(), addr);
    master.execute(&mut cmd)?;

    wait_ready(master, timing)
}

/// Erase the entire chip
pub fn chip_erase<M: SpiMaster + ?Sized>(master: &mut M, timing: PollTiming) -> Result<()> {
    write_enable(master)?;

    let mut cmd = SpiCommand::simple(opcodes::CE_C7);
    master.execute(&mut cmd)?;

    wait_ready(master, timing)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed status byte and records opcodes
    struct ScriptedMaster {
        opcodes: heapless::Vec<u8, 32>,
        status: u8,
        busy_polls: u32,
        reply: [u8; 8],
        delays: u32,
    }

    impl ScriptedMaster {
        fn new() -> Self {
            Self {
                opcodes: heapless::Vec::new(),
                status: 0,
                busy_polls: 0,
                reply: [0; 8],
                delays: 0,
            }
        }
    }

    impl SpiMaster for ScriptedMaster {
        fn max_read_len(&self) -> usize {
            usize::MAX
        }

        fn max_write_len(&self) -> usize {
            usize::MAX
        }

        fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
            let _ = self.opcodes.push(cmd.opcode);
            match cmd.opcode {
                opcodes::RDSR => {
                    cmd.read_buf[0] = if self.busy_polls > 0 {
                        self.busy_polls -= 1;
                        self.status | opcodes::SR1_BUSY
                    } else {
                        self.status
                    };
                }
                _ => {
                    let len = cmd.read_buf.len().min(self.reply.len());
                    cmd.read_buf[..len].copy_from_slice(&self.reply[..len]);
                }
            }
            Ok(())
        }

        fn delay_us(&mut self, _us: u32) {
            self.delays += 1;
        }
    }

    #[test]
    fn test_device_id_big_endian() {
        let mut master = ScriptedMaster::new();
        master.reply[..2].copy_from_slice(&[0xEF, 0x16]);
        assert_eq!(read_device_id(&mut master).unwrap(), DeviceId(0xEF16));
        assert_eq!(master.opcodes.as_slice(), &[opcodes::REMS]);
    }

    #[test]
    fn test_unique_id() {
        let mut master = ScriptedMaster::new();
        master.reply = [1, 2, 3, 4, 5, 6, 7, 8];
        assert_eq!(read_unique_id(&mut master).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_wait_ready_polls_until_clear() {
        let mut master = ScriptedMaster::new();
        master.busy_polls = 3;
        wait_ready(&mut master, PollTiming::new(10, 1000)).unwrap();
        assert_eq!(master.opcodes.len(), 4);
        assert_eq!(master.delays, 3);
    }

    #[test]
    fn test_wait_ready_times_out() {
        let mut master = ScriptedMaster::new();
        master.busy_polls = u32::MAX;
        let result = wait_ready(&mut master, PollTiming::new(10, 50));
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(master.opcodes.len(), 5);
    }

    #[test]
    fn test_program_sequence() {
        let mut master = ScriptedMaster::new();
        let data = [0u8; PAGE_SIZE];
        program_page(&mut master, 0x100, &data, PollTiming::new(0, 1)).unwrap();
        assert_eq!(
            master.opcodes.as_slice(),
            &[opcodes::WREN, opcodes::PP, opcodes::RDSR]
        );
    }

    #[test]
    fn test_program_rejects_page_crossing() {
        let mut master = ScriptedMaster::new();
        let data = [0u8; 16];
        let result = program_page(&mut master, 0xF8, &data, PollTiming::new(0, 1));
        assert_eq!(result, Err(Error::InvalidAlignment));
        assert!(master.opcodes.is_empty());
    }

    #[test]
    fn test_erase_opcodes_and_alignment() {
        let timing = PollTiming::new(0, 1);
        for (granularity, opcode) in [
            (EraseGranularity::Sector4K, opcodes::SE_20),
            (EraseGranularity::Block32K, opcodes::BE_52),
            (EraseGranularity::Block64K, opcodes::BE_D8),
        ] {
            let mut master = ScriptedMaster::new();
            erase_block(&mut master, granularity, granularity.size() * 2, timing).unwrap();
            assert_eq!(
                master.opcodes.as_slice(),
                &[opcodes::WREN, opcode, opcodes::RDSR]
            );

            let mut master = ScriptedMaster::new();
            let result = erase_block(&mut master, granularity, 0x800, timing);
            assert_eq!(result, Err(Error::InvalidAlignment));
            assert!(master.opcodes.is_empty());
        }
    }

    #[test]
    fn test_chip_erase_sequence() {
        let mut master = ScriptedMaster::new();
        chip_erase(&mut master, PollTiming::new(0, 1)).unwrap();
        assert_eq!(
            master.opcodes.as_slice(),
            &[opcodes::WREN, opcodes::CE_C7, opcodes::RDSR]
        );
    }

    #[test]
    fn test_status_flags() {
        let mut master = ScriptedMaster::new();
        master.status = 0x1E;
        let status = read_status1(&mut master).unwrap();
        assert!(status.contains(Status::WEL | Status::BP0 | Status::BP1 | Status::BP2));
        assert!(!status.contains(Status::BUSY));
    }
}
