//! Chip database for runtime loading and lookup
//!
//! This module provides the `ChipDatabase` type for extending the built-in
//! table with chip definitions loaded from RON files.

use alloc::{string::String, vec::Vec};
use std::fs;
use std::path::Path;

use super::types::{is_valid_capacity, ChipSpec, ChipTable, DeviceId, KNOWN_CHIPS};

/// Error type for chip database operations
#[derive(Debug, thiserror::Error)]
pub enum ChipDatabaseError {
    /// I/O error reading files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// RON parsing error
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// A chip cannot back the block layer
    #[error("chip {name}: capacity {total_size:?} is not a whole number of addressable sectors")]
    InvalidCapacity {
        /// Offending chip name
        name: String,
        /// Offending capacity, as written
        total_size: Size,
    },
}

// ============================================================================
// RON deserialization types (intermediate format)
// ============================================================================

/// Size specification with human-readable units (for RON parsing)
#[derive(Debug, Clone, Copy, serde::Deserialize)]
pub enum Size {
    /// Size in bytes
    B(u32),
    /// Size in kibibytes (1024 bytes)
    KiB(u32),
    /// Size in mebibytes (1024 * 1024 bytes)
    MiB(u32),
}

impl Size {
    /// Convert to bytes, `None` if the result does not fit in 32 bits
    pub fn to_bytes(self) -> Option<u32> {
        match self {
            Size::B(n) => Some(n),
            Size::KiB(n) => n.checked_mul(1024),
            Size::MiB(n) => n.checked_mul(1024 * 1024),
        }
    }
}

/// Single chip definition in RON format
#[derive(Debug, Clone, serde::Deserialize)]
struct ChipDef {
    name: String,
    device_id: u8,
    total_size: Size,
}

/// Vendor definition containing multiple chips
#[derive(Debug, Clone, serde::Deserialize)]
struct VendorDef {
    vendor: String,
    manufacturer_id: u8,
    chips: Vec<ChipDef>,
}

// ============================================================================
// Chip database
// ============================================================================

/// A chip definition owned by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipEntry {
    /// Vendor name
    pub vendor: String,
    /// Part name
    pub name: String,
    /// ID the chip answers with
    pub id: DeviceId,
    /// Total size in bytes
    pub total_size: u32,
}

/// Runtime chip database
///
/// Starts out with the compiled-in parts; later loads take precedence over
/// earlier entries with the same ID.
#[derive(Debug, Clone)]
pub struct ChipDatabase {
    chips: Vec<ChipEntry>,
}

impl Default for ChipDatabase {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl ChipDatabase {
    /// Create an empty chip database
    pub fn new() -> Self {
        Self { chips: Vec::new() }
    }

    /// Create a database pre-filled with the compiled-in chips
    pub fn with_builtin() -> Self {
        let chips = KNOWN_CHIPS
            .iter()
            .map(|chip| ChipEntry {
                vendor: chip.vendor.into(),
                name: chip.name.into(),
                id: chip.id,
                total_size: chip.total_size,
            })
            .collect();
        Self { chips }
    }

    /// Load chip definitions from a single RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize, ChipDatabaseError> {
        let content = fs::read_to_string(path)?;
        self.load_ron(&content)
    }

    /// Load chip definitions from a RON string
    pub fn load_ron(&mut self, content: &str) -> Result<usize, ChipDatabaseError> {
        let vendor_def: VendorDef = ron::from_str(content)?;
        let count = vendor_def.chips.len();

        let mut loaded = Vec::with_capacity(count);
        for chip_def in vendor_def.chips {
            let Some(total_size) = chip_def
                .total_size
                .to_bytes()
                .filter(|&bytes| is_valid_capacity(bytes))
            else {
                return Err(ChipDatabaseError::InvalidCapacity {
                    name: chip_def.name,
                    total_size: chip_def.total_size,
                });
            };
            loaded.push(ChipEntry {
                vendor: vendor_def.vendor.clone(),
                name: chip_def.name,
                id: DeviceId::from_parts(vendor_def.manufacturer_id, chip_def.device_id),
                total_size,
            });
        }

        for entry in loaded {
            self.chips.retain(|c| c.id != entry.id);
            log::debug!("chip db: {} {} ({})", entry.vendor, entry.name, entry.id);
            self.chips.push(entry);
        }

        Ok(count)
    }

    /// Get all chips in the database
    pub fn chips(&self) -> &[ChipEntry] {
        &self.chips
    }

    /// Get the number of chips in the database
    pub fn len(&self) -> usize {
        self.chips.len()
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.chips.is_empty()
    }

    /// Find a chip by its ID
    pub fn find(&self, id: DeviceId) -> Option<&ChipEntry> {
        self.chips.iter().find(|c| c.id == id)
    }
}

impl ChipTable for ChipDatabase {
    fn lookup(&self, id: DeviceId) -> Option<ChipSpec> {
        self.find(id).map(|c| ChipSpec {
            id: c.id,
            total_size: c.total_size,
        })
    }

    fn name(&self, id: DeviceId) -> Option<&str> {
        self.find(id).map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::UNKNOWN_CAPACITY;
    use alloc::string::ToString;

    #[test]
    fn test_load_ron() {
        let ron = r#"
        (
            vendor: "Winbond",
            manufacturer_id: 0xEF,
            chips: [
                (
                    name: "W25Q16JV",
                    device_id: 0x14,
                    total_size: MiB(2),
                ),
            ],
        )
        "#;

        let mut db = ChipDatabase::with_builtin();
        let count = db.load_ron(ron).unwrap();

        assert_eq!(count, 1);
        assert_eq!(db.len(), 3);

        let chip = db.find(DeviceId(0xEF14)).unwrap();
        assert_eq!(chip.name, "W25Q16JV");
        assert_eq!(chip.vendor, "Winbond");
        assert_eq!(db.capacity(DeviceId(0xEF14)), 2 * 1024 * 1024);
        assert_eq!(db.capacity(DeviceId(0xEF16)), 8 * 1024 * 1024);
    }

    #[test]
    fn test_later_entries_override() {
        let ron = r#"(vendor: "Clone", manufacturer_id: 0xEF, chips: [(name: "FAKE80", device_id: 0x13, total_size: KiB(512))])"#;

        let mut db = ChipDatabase::default();
        db.load_ron(ron).unwrap();

        assert_eq!(db.len(), 2);
        assert_eq!(db.name(DeviceId(0xEF13)), Some("FAKE80"));
        assert_eq!(db.capacity(DeviceId(0xEF13)), 512 * 1024);
    }

    #[test]
    fn test_rejects_partial_sector_capacity() {
        let ron = r#"(vendor: "Odd", manufacturer_id: 0x01, chips: [(name: "ODD", device_id: 0x01, total_size: B(1000))])"#;

        let mut db = ChipDatabase::new();
        let err = db.load_ron(ron).unwrap_err();
        assert!(matches!(
            err,
            ChipDatabaseError::InvalidCapacity {
                total_size: Size::B(1000),
                ..
            }
        ));
        assert!(db.is_empty());
    }

    #[test]
    fn test_rejects_overflowing_capacity() {
        let ron = r#"(vendor: "Huge", manufacturer_id: 0xEF, chips: [(name: "HUGE", device_id: 0x30, total_size: MiB(4097))])"#;

        let mut db = ChipDatabase::new();
        let err = db.load_ron(ron).unwrap_err();
        assert!(matches!(
            err,
            ChipDatabaseError::InvalidCapacity {
                total_size: Size::MiB(4097),
                ..
            }
        ));
        assert!(err.to_string().contains("MiB(4097)"), "{}", err);
        assert_eq!(db.capacity(DeviceId(0xEF30)), UNKNOWN_CAPACITY);
    }

    #[test]
    fn test_rejects_capacity_past_24_bit_addressing() {
        let ron = r#"(vendor: "Big", manufacturer_id: 0xEF, chips: [(name: "Q256", device_id: 0x18, total_size: MiB(32))])"#;

        let mut db = ChipDatabase::new();
        assert!(db.load_ron(ron).is_err());
        assert!(db.is_empty());
    }

    #[test]
    fn test_size_conversion() {
        assert_eq!(Size::B(256).to_bytes(), Some(256));
        assert_eq!(Size::KiB(4).to_bytes(), Some(4096));
        assert_eq!(Size::MiB(1).to_bytes(), Some(1048576));
        assert_eq!(Size::KiB(4 * 1024 * 1024).to_bytes(), None);
        assert_eq!(Size::MiB(4097).to_bytes(), None);
    }
}
