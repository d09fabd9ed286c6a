//! Flash chip type definitions

use crate::disk::SECTOR_SIZE;
use crate::spi::AddressWidth;

/// Capacity reported for an unrecognized device ID
pub const UNKNOWN_CAPACITY: u32 = u32::MAX;

/// 16-bit manufacturer/device ID as read with the REMS (0x90) command
///
/// The high byte is the JEDEC manufacturer (0xEF for Winbond), the low
/// byte the device code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u16);

impl DeviceId {
    /// Build an ID from its manufacturer and device bytes
    pub const fn from_parts(manufacturer: u8, device: u8) -> Self {
        Self(((manufacturer as u16) << 8) | device as u16)
    }

    /// Manufacturer byte
    pub const fn manufacturer(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// Device byte
    pub const fn device(&self) -> u8 {
        self.0 as u8
    }
}

impl core::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:02X}:{:02X}", self.manufacturer(), self.device())
    }
}

/// Geometry-relevant facts about a recognized chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipSpec {
    /// ID the chip answers with
    pub id: DeviceId,
    /// Total size in bytes
    pub total_size: u32,
}

/// A compiled-in chip definition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashChip {
    /// Vendor name
    pub vendor: &'static str,
    /// Part name
    pub name: &'static str,
    /// ID the chip answers with
    pub id: DeviceId,
    /// Total size in bytes
    pub total_size: u32,
}

impl FlashChip {
    /// Geometry view of this chip
    pub const fn spec(&self) -> ChipSpec {
        ChipSpec {
            id: self.id,
            total_size: self.total_size,
        }
    }
}

/// Parts the driver knows out of the box
pub static KNOWN_CHIPS: &[FlashChip] = &[
    FlashChip {
        vendor: "Winbond",
        name: "W25Q80BV",
        id: DeviceId(0xEF13),
        total_size: 1024 * 1024,
    },
    FlashChip {
        vendor: "Winbond",
        name: "W25Q64JV",
        id: DeviceId(0xEF16),
        total_size: 8 * 1024 * 1024,
    },
];

/// Anything that can resolve a device ID to a chip
pub trait ChipTable {
    /// Look up a chip by ID; `None` means "not present"
    fn lookup(&self, id: DeviceId) -> Option<ChipSpec>;

    /// Human readable name for logging, if known
    fn name(&self, _id: DeviceId) -> Option<&str> {
        None
    }

    /// Capacity in bytes, or [`UNKNOWN_CAPACITY`] for unrecognized IDs
    fn capacity(&self, id: DeviceId) -> u32 {
        self.lookup(id)
            .map(|spec| spec.total_size)
            .unwrap_or(UNKNOWN_CAPACITY)
    }
}

/// The compiled-in [`KNOWN_CHIPS`] table
#[derive(Debug, Clone, Copy, Default)]
pub struct KnownChips;

impl KnownChips {
    fn find(id: DeviceId) -> Option<&'static FlashChip> {
        KNOWN_CHIPS.iter().find(|chip| chip.id == id)
    }
}

impl ChipTable for KnownChips {
    fn lookup(&self, id: DeviceId) -> Option<ChipSpec> {
        Self::find(id).map(FlashChip::spec)
    }

    fn name(&self, id: DeviceId) -> Option<&str> {
        Self::find(id).map(|chip| chip.name)
    }
}

impl<T: ChipTable + ?Sized> ChipTable for &T {
    fn lookup(&self, id: DeviceId) -> Option<ChipSpec> {
        (**self).lookup(id)
    }

    fn name(&self, id: DeviceId) -> Option<&str> {
        (**self).name(id)
    }
}

/// Check that a capacity can back the block layer: non-zero, a whole
/// number of sectors and reachable with 24-bit addresses
pub const fn is_valid_capacity(total_size: u32) -> bool {
    total_size != 0
        && total_size <= AddressWidth::ThreeByte.max_size()
        && total_size % SECTOR_SIZE as u32 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_capacities() {
        assert_eq!(KnownChips.capacity(DeviceId(0xEF13)), 1024 * 1024);
        assert_eq!(KnownChips.capacity(DeviceId(0xEF16)), 8 * 1024 * 1024);
        assert_eq!(KnownChips.name(DeviceId(0xEF16)), Some("W25Q64JV"));
    }

    #[test]
    fn test_unknown_id() {
        assert_eq!(KnownChips.lookup(DeviceId(0xFFFF)), None);
        assert_eq!(KnownChips.capacity(DeviceId(0x0000)), UNKNOWN_CAPACITY);
        assert_eq!(KnownChips.name(DeviceId(0xEF40)), None);
    }

    #[test]
    fn test_device_id_parts() {
        let id = DeviceId::from_parts(0xEF, 0x13);
        assert_eq!(id, DeviceId(0xEF13));
        assert_eq!(id.manufacturer(), 0xEF);
        assert_eq!(id.device(), 0x13);
    }

    #[test]
    fn test_known_chips_fit_block_layer() {
        for chip in KNOWN_CHIPS {
            assert!(is_valid_capacity(chip.total_size), "{}", chip.name);
        }
        assert!(!is_valid_capacity(UNKNOWN_CAPACITY));
        assert!(!is_valid_capacity(1000));
        assert!(is_valid_capacity(16 * 1024 * 1024));
        assert!(!is_valid_capacity(32 * 1024 * 1024));
    }
}
