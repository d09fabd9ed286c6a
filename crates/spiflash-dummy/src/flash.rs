//! Byte-level W25Q emulator
//!
//! `DummyFlash` sits on the [`SpiBus`] side of the driver: it sees chip
//! select edges and individual bytes, exactly like a real part would. A
//! command is decoded as it is clocked in and takes effect when CS# goes
//! high. Program and erase leave the chip busy for a configurable number
//! of status polls; a stuck chip never becomes ready.

use spiflash_core::chip::{ChipTable, DeviceId, KnownChips};
use spiflash_core::disk::PAGE_SIZE;
use spiflash_core::programmer::SpiBus;
use spiflash_core::protocol::Status;
use spiflash_core::spi::{opcodes, ByteOrder};

/// Size emulated for IDs missing from the chip table
pub const DEFAULT_SIZE: usize = 1024 * 1024;

/// Address bytes following an addressed opcode
const ADDR_LEN: usize = 3;

/// What MISO reads while the chip drives nothing
const IDLE_MISO: u8 = 0xFF;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// ID answered to REMS (0x90)
    pub id: DeviceId,
    /// Flash size in bytes
    pub size: usize,
    /// ID answered to RDUID (0x4B)
    pub unique_id: u64,
    /// Status polls that report busy after each program or erase
    pub busy_polls: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self::for_id(DeviceId(0xEF13))
    }
}

impl DummyConfig {
    /// Emulate the chip answering `id`, sized from the built-in chip table
    pub fn for_id(id: DeviceId) -> Self {
        let size = KnownChips
            .lookup(id)
            .map_or(DEFAULT_SIZE, |spec| spec.total_size as usize);
        Self {
            id,
            size,
            unique_id: 0xD0D0_5EED_0000_0001,
            busy_polls: 1,
        }
    }

    /// Set how many status polls report busy after program/erase
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_polls = polls;
        self
    }
}

/// Operation the emulated chip carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashOp {
    /// Manufacturer/device ID read
    ReadId,
    /// Unique ID read
    UniqueId,
    /// Data read
    Read { addr: u32, len: usize },
    /// Page program
    Program { addr: u32, len: usize },
    /// Sector or block erase
    Erase { addr: u32, len: usize },
    /// Whole-chip erase
    ChipErase,
}

/// Per-kind operation counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounters {
    /// Completed data reads
    pub reads: u32,
    /// Completed page programs
    pub programs: u32,
    /// Sector/block erases
    pub erases: u32,
    /// Chip erases
    pub chip_erases: u32,
    /// Status register reads
    pub status_polls: u32,
    /// Commands dropped (busy, missing write enable, malformed)
    pub ignored: u32,
}

/// Command being clocked in while CS# is low
#[derive(Debug, Default)]
struct Frame {
    opcode: u8,
    /// Bytes clocked so far, opcode included
    pos: usize,
    addr: u32,
    payload: Vec<u8>,
}

impl Frame {
    /// Index of the first byte after opcode and address
    const DATA_START: usize = 1 + ADDR_LEN;

    fn data_len(&self) -> usize {
        self.pos.saturating_sub(Self::DATA_START)
    }
}

fn takes_address(opcode: u8) -> bool {
    matches!(
        opcode,
        opcodes::REMS
            | opcodes::READ
            | opcodes::RDUID
            | opcodes::PP
            | opcodes::SE_20
            | opcodes::BE_52
            | opcodes::BE_D8
    )
}

/// Dummy flash chip
///
/// Emulates a W25Q part byte by byte for testing purposes.
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    selected: bool,
    frame: Frame,
    write_enabled: bool,
    busy_remaining: u32,
    stuck: bool,
    bus_hz: u32,
    counters: OpCounters,
    ops: Vec<FlashOp>,
}

impl DummyFlash {
    /// Create an erased dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            selected: false,
            frame: Frame::default(),
            write_enabled: false,
            busy_remaining: 0,
            stuck: false,
            bus_hz: 0,
            counters: OpCounters::default(),
            ops: Vec::new(),
        }
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = core::cmp::min(initial_data.len(), flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash data
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get a mutable reference to the flash data
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Operation counts since creation or the last [`clear_ops`](Self::clear_ops)
    pub fn counters(&self) -> OpCounters {
        self.counters
    }

    /// Data operations in the order the chip carried them out
    pub fn ops(&self) -> &[FlashOp] {
        &self.ops
    }

    /// Reset the operation log and counters
    pub fn clear_ops(&mut self) {
        self.ops.clear();
        self.counters = OpCounters::default();
    }

    /// Set how many status polls report busy after program/erase
    pub fn set_busy_polls(&mut self, polls: u32) {
        self.config.busy_polls = polls;
    }

    /// Make the chip report busy forever (or recover)
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Last clock rate the bus was set to, 0 if never set
    pub fn bus_hz(&self) -> u32 {
        self.bus_hz
    }

    /// Whether a program or erase is still running
    pub fn is_busy(&self) -> bool {
        self.stuck || self.busy_remaining > 0
    }

    fn status(&self) -> Status {
        let mut status = Status::empty();
        status.set(Status::BUSY, self.is_busy());
        status.set(Status::WEL, self.write_enabled);
        status
    }

    /// Byte shifted out on MISO at data position `index`
    fn output(&self, index: usize) -> u8 {
        let frame = &self.frame;
        match frame.opcode {
            opcodes::RDSR => self.status().bits(),
            _ if self.is_busy() => IDLE_MISO,
            opcodes::REMS => {
                let mut id = [0u8; 2];
                ByteOrder::Big.encode_u16(self.config.id.0, &mut id);
                id[(index + (frame.addr & 1) as usize) % 2]
            }
            opcodes::READ => self.data[(frame.addr as usize + index) % self.data.len()],
            opcodes::RDUID => match index {
                0 => IDLE_MISO,
                _ => {
                    let mut uid = [0u8; 8];
                    ByteOrder::Big.encode_u64(self.config.unique_id, &mut uid);
                    uid[(index - 1) % uid.len()]
                }
            },
            _ => IDLE_MISO,
        }
    }

    /// Execute the command framed by the CS# low period that just ended
    fn finish_frame(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        if frame.pos == 0 {
            return;
        }

        if frame.opcode == opcodes::RDSR {
            self.counters.status_polls += 1;
            if !self.stuck {
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
            }
            return;
        }

        if self.is_busy() {
            log::debug!("dummy: opcode 0x{:02X} ignored, busy", frame.opcode);
            self.counters.ignored += 1;
            return;
        }

        let complete = !takes_address(frame.opcode) || frame.pos > ADDR_LEN;
        if !complete {
            log::debug!("dummy: opcode 0x{:02X} truncated", frame.opcode);
            self.counters.ignored += 1;
            return;
        }

        match frame.opcode {
            opcodes::WREN => self.write_enabled = true,
            opcodes::REMS => self.ops.push(FlashOp::ReadId),
            opcodes::RDUID => self.ops.push(FlashOp::UniqueId),
            opcodes::READ => {
                if frame.data_len() > 0 {
                    self.counters.reads += 1;
                    self.ops.push(FlashOp::Read {
                        addr: frame.addr,
                        len: frame.data_len(),
                    });
                }
            }
            opcodes::PP => self.program(frame.addr, &frame.payload),
            opcodes::SE_20 => self.erase(frame.addr, 4 * 1024),
            opcodes::BE_52 => self.erase(frame.addr, 32 * 1024),
            opcodes::BE_D8 => self.erase(frame.addr, 64 * 1024),
            opcodes::CE_C7 => self.chip_erase(),
            other => {
                log::debug!("dummy: unsupported opcode 0x{:02X}", other);
                self.counters.ignored += 1;
            }
        }
    }

    /// Take the write enable latch, counting the command as ignored if unset
    fn take_write_enable(&mut self, what: &str) -> bool {
        if !self.write_enabled {
            log::debug!("dummy: {} without write enable", what);
            self.counters.ignored += 1;
            return false;
        }
        self.write_enabled = false;
        true
    }

    fn program(&mut self, addr: u32, payload: &[u8]) {
        if !self.take_write_enable("program") || payload.is_empty() {
            return;
        }

        // Data past the end of the page wraps to its start
        let page_base = addr as usize & !(PAGE_SIZE - 1);
        for (i, &byte) in payload.iter().enumerate() {
            let offset = (addr as usize + i) % PAGE_SIZE;
            let index = (page_base + offset) % self.data.len();
            // Flash programming: can only change 1 -> 0
            self.data[index] &= byte;
        }

        self.counters.programs += 1;
        self.ops.push(FlashOp::Program {
            addr,
            len: payload.len(),
        });
        self.busy_remaining = self.config.busy_polls;
    }

    fn erase(&mut self, addr: u32, erase_size: usize) {
        if !self.take_write_enable("erase") {
            return;
        }

        // The chip ignores the address bits below the erase size
        let base = (addr as usize & !(erase_size - 1)) % self.data.len();
        let end = core::cmp::min(base + erase_size, self.data.len());
        self.data[base..end].fill(0xFF);

        self.counters.erases += 1;
        self.ops.push(FlashOp::Erase {
            addr: base as u32,
            len: erase_size,
        });
        self.busy_remaining = self.config.busy_polls;
    }

    fn chip_erase(&mut self) {
        if !self.take_write_enable("chip erase") {
            return;
        }

        self.data.fill(0xFF);
        self.counters.chip_erases += 1;
        self.ops.push(FlashOp::ChipErase);
        self.busy_remaining = self.config.busy_polls;
    }
}

impl SpiBus for DummyFlash {
    fn set_cs(&mut self, active: bool) {
        match (self.selected, active) {
            (false, true) => {
                self.selected = true;
                self.frame = Frame::default();
            }
            (true, false) => {
                self.selected = false;
                self.finish_frame();
            }
            _ => {}
        }
    }

    fn transfer_byte(&mut self, out: u8) -> u8 {
        if !self.selected {
            return IDLE_MISO;
        }

        let pos = self.frame.pos;
        self.frame.pos += 1;

        if pos == 0 {
            self.frame.opcode = out;
            return IDLE_MISO;
        }
        if takes_address(self.frame.opcode) && pos <= ADDR_LEN {
            self.frame.addr = (self.frame.addr << 8) | u32::from(out);
            return IDLE_MISO;
        }

        if self.frame.opcode == opcodes::PP {
            self.frame.payload.push(out);
            return IDLE_MISO;
        }

        let index = if takes_address(self.frame.opcode) {
            pos - Frame::DATA_START
        } else {
            pos - 1
        };
        self.output(index)
    }

    fn set_frequency(&mut self, hz: u32) {
        log::debug!("dummy: bus clock {} Hz", hz);
        self.bus_hz = hz;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spiflash_core::programmer::{BusMaster, SpiMaster};
    use spiflash_core::protocol::{self, EraseGranularity};
    use spiflash_core::spi::SpiCommand;
    use spiflash_core::{Error, PollTiming};

    const FAST: PollTiming = PollTiming::new(0, 16);

    fn master(config: DummyConfig) -> BusMaster<DummyFlash> {
        BusMaster::new(DummyFlash::new(config))
    }

    #[test]
    fn test_read_device_id() {
        let mut master = master(DummyConfig::for_id(DeviceId(0xEF16)));
        assert_eq!(protocol::read_device_id(&mut master).unwrap(), DeviceId(0xEF16));
        assert_eq!(master.bus().config().size, 8 * 1024 * 1024);
        assert_eq!(master.bus().ops(), &[FlashOp::ReadId]);
    }

    #[test]
    fn test_device_id_odd_address_swaps_order() {
        let mut master = master(DummyConfig::default());
        let mut buf = [0u8; 4];
        let mut cmd = SpiCommand::read_3b(opcodes::REMS, 1, &mut buf);
        master.execute(&mut cmd).unwrap();
        assert_eq!(buf, [0x13, 0xEF, 0x13, 0xEF]);
    }

    #[test]
    fn test_unique_id() {
        let mut master = master(DummyConfig::default());
        assert_eq!(
            protocol::read_unique_id(&mut master).unwrap(),
            0xD0D0_5EED_0000_0001
        );
    }

    #[test]
    fn test_program_requires_write_enable() {
        let mut master = master(DummyConfig::default());
        let data = [0x12, 0x34, 0x56, 0x78];

        let mut cmd = SpiCommand::write_3b(opcodes::PP, 0x1000, &data);
        master.execute(&mut cmd).unwrap();
        assert_eq!(&master.bus().data()[0x1000..0x1004], &[0xFF; 4]);
        assert_eq!(master.bus().counters().ignored, 1);

        protocol::program_page(&mut master, 0x1000, &data, FAST).unwrap();
        let mut buf = [0u8; 4];
        protocol::read(&mut master, 0x1000, &mut buf).unwrap();
        assert_eq!(buf, data);
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut master = master(DummyConfig::default());
        protocol::program_page(&mut master, 0, &[0xF0], FAST).unwrap();
        protocol::program_page(&mut master, 0, &[0x3C], FAST).unwrap();
        assert_eq!(master.bus().data()[0], 0x30);
    }

    #[test]
    fn test_program_wraps_within_page() {
        let mut master = master(DummyConfig::default());
        protocol::write_enable(&mut master).unwrap();
        let mut cmd = SpiCommand::write_3b(opcodes::PP, 0x1FE, &[1, 2, 3, 4]);
        master.execute(&mut cmd).unwrap();
        let data = master.bus().data();
        assert_eq!(&data[0x1FE..0x200], &[1, 2]);
        assert_eq!(&data[0x100..0x102], &[3, 4]);
        assert_eq!(data[0x200], 0xFF);
    }

    #[test]
    fn test_erase_sets_ff() {
        let mut master = master(DummyConfig::default());
        protocol::program_page(&mut master, 0x2100, &[0u8; 256], FAST).unwrap();

        protocol::erase_block(&mut master, EraseGranularity::Sector4K, 0x2000, FAST).unwrap();
        assert!(master.bus().data()[0x2000..0x3000].iter().all(|&b| b == 0xFF));
        assert_eq!(
            master.bus().ops().last(),
            Some(&FlashOp::Erase {
                addr: 0x2000,
                len: 4096
            })
        );
    }

    #[test]
    fn test_block_and_chip_erase() {
        let mut master = master(DummyConfig::default());
        master.bus_mut().data_mut().fill(0);

        protocol::erase_block(&mut master, EraseGranularity::Block64K, 0x10000, FAST).unwrap();
        let data = master.bus().data();
        assert_eq!(data[0xFFFF], 0x00);
        assert!(data[0x10000..0x20000].iter().all(|&b| b == 0xFF));
        assert_eq!(data[0x20000], 0x00);

        protocol::chip_erase(&mut master, FAST).unwrap();
        assert!(master.bus().data().iter().all(|&b| b == 0xFF));
        assert_eq!(master.bus().counters().chip_erases, 1);
    }

    #[test]
    fn test_busy_countdown() {
        let mut master = master(DummyConfig::default().with_busy_polls(3));
        protocol::program_page(&mut master, 0, &[0x00], PollTiming::new(1, 100)).unwrap();
        // Three busy answers, then ready
        assert_eq!(master.bus().counters().status_polls, 4);
        assert!(!master.bus().is_busy());
    }

    #[test]
    fn test_commands_ignored_while_busy() {
        let mut master = master(DummyConfig::default().with_busy_polls(5));
        protocol::write_enable(&mut master).unwrap();
        let mut cmd = SpiCommand::write_3b(opcodes::PP, 0, &[0x00]);
        master.execute(&mut cmd).unwrap();
        assert!(master.bus().is_busy());

        protocol::write_enable(&mut master).unwrap();
        let mut cmd = SpiCommand::erase_3b(opcodes::SE_20, 0);
        master.execute(&mut cmd).unwrap();
        assert_eq!(master.bus().counters().erases, 0);
        assert_eq!(master.bus().counters().ignored, 2);
        assert_eq!(master.bus().data()[0], 0x00);
    }

    #[test]
    fn test_stuck_chip_times_out() {
        let mut master = master(DummyConfig::default());
        master.bus_mut().set_stuck(true);

        let result = protocol::wait_ready(&mut master, PollTiming::new(10, 100));
        assert_eq!(result, Err(Error::Timeout));
        assert_eq!(master.bus().counters().status_polls, 10);

        master.bus_mut().set_stuck(false);
        protocol::wait_ready(&mut master, PollTiming::new(10, 100)).unwrap();
    }

    #[test]
    fn test_idle_bytes_after_deselect_are_ignored() {
        let mut flash = DummyFlash::new(DummyConfig::default());
        assert_eq!(flash.transfer_byte(opcodes::WREN), 0xFF);
        flash.set_cs(true);
        flash.transfer_byte(opcodes::WREN);
        flash.set_cs(false);
        flash.transfer_byte(0xFF);
        flash.transfer_byte(0xFF);
        assert!(flash.status().contains(Status::WEL));
        assert!(flash.ops().is_empty());
    }
}
