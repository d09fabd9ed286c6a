//! SPI command structure

use super::AddressWidth;

/// Longest header a command can carry: opcode, 3 address bytes and up to
/// 4 dummy bytes
pub const MAX_HEADER_LEN: usize = 8;

/// A single SPI transaction
///
/// Designed to avoid allocation - uses slices for data.
/// The lifetime parameter `'a` ties the command to the buffers it references.
pub struct SpiCommand<'a> {
    /// The opcode byte
    pub opcode: u8,

    /// Address (if any)
    pub address: Option<u32>,

    /// Address width
    pub address_width: AddressWidth,

    /// Number of dummy cycles after address (clocked as whole bytes)
    pub dummy_cycles: u8,

    /// Data to write after opcode/address/dummy
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a simple command with no address or data (e.g., WREN, CE)
    pub fn simple(opcode: u8) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a read register command with no address (e.g., RDSR)
    pub fn read_reg(opcode: u8, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: None,
            address_width: AddressWidth::None,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a read command with 3-byte address (e.g., READ, REMS)
    pub fn read_3b(opcode: u8, addr: u32, buf: &'a mut [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a write command with 3-byte address (e.g., PP)
    pub fn write_3b(opcode: u8, addr: u32, data: &'a [u8]) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            dummy_cycles: 0,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Create an erase command with 3-byte address
    pub fn erase_3b(opcode: u8, addr: u32) -> Self {
        Self {
            opcode,
            address: Some(addr),
            address_width: AddressWidth::ThreeByte,
            dummy_cycles: 0,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Set the number of dummy cycles
    pub fn with_dummy_cycles(mut self, cycles: u8) -> Self {
        self.dummy_cycles = cycles;
        self
    }

    /// Length of the opcode + address + dummy header in bytes
    pub fn header_len(&self) -> usize {
        1 + self.address_width.bytes() as usize + (self.dummy_cycles as usize) / 8
    }

    /// Encode the opcode, address and dummy bytes into `buf`
    ///
    /// `buf` must be at least [`header_len`](Self::header_len) bytes long.
    /// Dummy bytes are encoded as 0x00.
    pub fn encode_header(&self, buf: &mut [u8]) {
        let header_len = self.header_len();
        buf[0] = self.opcode;
        let addr_len = self.address_width.bytes() as usize;
        if let Some(addr) = self.address {
            self.address_width.encode(addr, &mut buf[1..1 + addr_len]);
        }
        for byte in &mut buf[1 + addr_len..header_len] {
            *byte = 0;
        }
    }

    /// Calculate the total number of bytes to transfer
    pub fn total_bytes(&self) -> usize {
        self.header_len() + self.write_data.len() + self.read_buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::opcodes;

    #[test]
    fn test_header_with_address() {
        let mut buf = [0u8; 4];
        let cmd = SpiCommand::read_3b(opcodes::READ, 0x0A1B2C, &mut buf);
        assert_eq!(cmd.header_len(), 4);

        let mut header = [0xAAu8; MAX_HEADER_LEN];
        cmd.encode_header(&mut header);
        assert_eq!(&header[..4], &[opcodes::READ, 0x0A, 0x1B, 0x2C]);
        assert_eq!(cmd.total_bytes(), 8);
    }

    #[test]
    fn test_header_with_dummy_byte() {
        let mut buf = [0u8; 8];
        let cmd = SpiCommand::read_3b(opcodes::RDUID, 0, &mut buf).with_dummy_cycles(8);
        assert_eq!(cmd.header_len(), 5);

        let mut header = [0xAAu8; MAX_HEADER_LEN];
        cmd.encode_header(&mut header);
        assert_eq!(&header[..5], &[opcodes::RDUID, 0, 0, 0, 0]);
    }

    #[test]
    fn test_simple_command_header() {
        let cmd = SpiCommand::simple(opcodes::WREN);
        assert_eq!(cmd.address, None);
        assert_eq!(cmd.header_len(), 1);
        assert_eq!(cmd.total_bytes(), 1);
    }
}
