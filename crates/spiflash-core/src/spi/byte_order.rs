//! Byte order helpers
//!
//! The flash chip speaks big-endian on the wire: IDs and addresses go out
//! and come back most significant byte first. Host-side buffers (image
//! headers and the like) are little-endian. Both directions are kept as
//! separate, explicit code paths.

/// Byte order of a multi-byte value in a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Most significant byte first (chip wire format)
    Big,
    /// Least significant byte first (host buffer format)
    Little,
}

impl ByteOrder {
    /// Encode a `u16` into the first 2 bytes of `buf`
    pub fn encode_u16(self, value: u16, buf: &mut [u8]) {
        let bytes = match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        };
        buf[..2].copy_from_slice(&bytes);
    }

    /// Encode a `u32` into the first 4 bytes of `buf`
    pub fn encode_u32(self, value: u32, buf: &mut [u8]) {
        let bytes = match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        };
        buf[..4].copy_from_slice(&bytes);
    }

    /// Encode a `u64` into the first 8 bytes of `buf`
    pub fn encode_u64(self, value: u64, buf: &mut [u8]) {
        let bytes = match self {
            Self::Big => value.to_be_bytes(),
            Self::Little => value.to_le_bytes(),
        };
        buf[..8].copy_from_slice(&bytes);
    }

    /// Decode a `u16` from the first 2 bytes of `buf`
    pub fn decode_u16(self, buf: &[u8]) -> u16 {
        let bytes = [buf[0], buf[1]];
        match self {
            Self::Big => u16::from_be_bytes(bytes),
            Self::Little => u16::from_le_bytes(bytes),
        }
    }

    /// Decode a `u32` from the first 4 bytes of `buf`
    pub fn decode_u32(self, buf: &[u8]) -> u32 {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&buf[..4]);
        match self {
            Self::Big => u32::from_be_bytes(bytes),
            Self::Little => u32::from_le_bytes(bytes),
        }
    }

    /// Decode a `u64` from the first 8 bytes of `buf`
    pub fn decode_u64(self, buf: &[u8]) -> u64 {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&buf[..8]);
        match self {
            Self::Big => u64::from_be_bytes(bytes),
            Self::Little => u64::from_le_bytes(bytes),
        }
    }
}
