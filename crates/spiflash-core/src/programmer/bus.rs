//! Command framing on a byte bus

use super::{SpiBus, SpiMaster};
use crate::error::{Error, Result};
use crate::spi::{SpiCommand, MAX_HEADER_LEN};

/// Byte clocked out during the read phase
const READ_FILLER: u8 = 0x00;

/// Byte clocked out after deselect
const IDLE_FILLER: u8 = 0xFF;

/// [`SpiMaster`] on top of any [`SpiBus`]
///
/// Every command goes out as: CS# low, opcode, big-endian address, dummy
/// bytes, write payload, read payload, CS# high, then two idle 0xFF bytes.
/// The idle bytes guarantee the chip sees at least one clock edge with CS#
/// deasserted, which some parts need to latch the end of a command.
#[derive(Debug)]
pub struct BusMaster<B: SpiBus> {
    bus: B,
}

impl<B: SpiBus> BusMaster<B> {
    /// Wrap a byte bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Get a reference to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Consume the master and return the bus
    pub fn into_bus(self) -> B {
        self.bus
    }

    fn end(&mut self) {
        self.bus.set_cs(false);
        self.bus.transfer_byte(IDLE_FILLER);
        self.bus.transfer_byte(IDLE_FILLER);
    }
}

impl<B: SpiBus> SpiMaster for BusMaster<B> {
    fn max_read_len(&self) -> usize {
        // The chip streams across page boundaries
        usize::MAX
    }

    fn max_write_len(&self) -> usize {
        usize::MAX
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        let header_len = cmd.header_len();
        let mut header = heapless::Vec::<u8, MAX_HEADER_LEN>::new();
        header
            .resize(header_len, 0)
            .map_err(|_| Error::BufferTooSmall)?;
        cmd.encode_header(&mut header);

        log::trace!(
            "bus: opcode 0x{:02X}, {} header, {} out, {} in, {} bytes",
            cmd.opcode,
            header_len,
            cmd.write_data.len(),
            cmd.read_buf.len(),
            cmd.total_bytes()
        );

        self.bus.set_cs(true);
        for &byte in header.iter().chain(cmd.write_data.iter()) {
            self.bus.transfer_byte(byte);
        }
        for byte in cmd.read_buf.iter_mut() {
            *byte = self.bus.transfer_byte(READ_FILLER);
        }
        self.end();

        Ok(())
    }

    fn set_frequency(&mut self, hz: u32) {
        self.bus.set_frequency(hz);
    }

    fn delay_us(&mut self, us: u32) {
        self.bus.delay_us(us);
    }
}
