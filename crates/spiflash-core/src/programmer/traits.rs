//! Bus and master trait definitions

use crate::error::Result;
use crate::spi::SpiCommand;

/// Byte-level serial bus with a discrete chip-select line
///
/// This is the whole hardware capability set the flash driver needs:
/// clock one byte out while clocking one byte in, and drive CS#. Bus
/// implementations are infallible; a bus that can fail should log and
/// return 0xFF on reads, which the driver then sees as an absent chip.
pub trait SpiBus {
    /// Drive chip select (CS# is active low, so `active=true` means CS#=0)
    fn set_cs(&mut self, active: bool);

    /// Clock `out` onto MOSI and return the byte sampled on MISO
    fn transfer_byte(&mut self, out: u8) -> u8;

    /// Set the serial clock rate in Hz
    ///
    /// Buses with a fixed clock may ignore this.
    fn set_frequency(&mut self, _hz: u32) {}

    /// Delay for the specified number of microseconds
    ///
    /// Used between status polls. The default returns immediately.
    fn delay_us(&mut self, _us: u32) {}
}

/// SPI Master trait
///
/// This trait represents anything that can execute a complete SPI flash
/// command: opcode, optional address, dummy bytes, write payload and read
/// payload, bracketed by chip select.
pub trait SpiMaster {
    /// Get the maximum number of bytes that can be read in a single transaction
    fn max_read_len(&self) -> usize;

    /// Get the maximum number of bytes that can be written in a single transaction
    fn max_write_len(&self) -> usize;

    /// Execute a single SPI command
    ///
    /// The command contains all the information needed for the transaction:
    /// - `opcode`: The SPI command opcode
    /// - `address`: Optional address (with width)
    /// - `dummy_cycles`: Number of dummy clock cycles after address
    /// - `write_data`: Data to write after the header
    /// - `read_buf`: Buffer to read data into
    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Set the serial clock rate in Hz
    fn set_frequency(&mut self, _hz: u32) {}

    /// Delay for the specified number of microseconds
    fn delay_us(&mut self, us: u32);
}

impl<M: SpiMaster + ?Sized> SpiMaster for &mut M {
    fn max_read_len(&self) -> usize {
        (**self).max_read_len()
    }

    fn max_write_len(&self) -> usize {
        (**self).max_write_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn set_frequency(&mut self, hz: u32) {
        (**self).set_frequency(hz)
    }

    fn delay_us(&mut self, us: u32) {
        (**self).delay_us(us)
    }
}
