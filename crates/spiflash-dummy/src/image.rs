//! Raw flash image persistence
//!
//! An image file is a 12-byte header followed by the flash contents:
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | magic `SFIM` |
//! | 4 | 2 | device ID |
//! | 6 | 2 | reserved, zero |
//! | 8 | 4 | content length in bytes |
//!
//! Header integers are little-endian.

use std::fs;
use std::path::Path;

use spiflash_core::chip::DeviceId;
use spiflash_core::spi::ByteOrder;

use crate::error::{DummyError, Result};
use crate::flash::{DummyConfig, DummyFlash};

/// Image file magic
pub const MAGIC: [u8; 4] = *b"SFIM";

/// Header length in bytes
pub const HEADER_LEN: usize = 12;

/// Build the header for an image of `len` bytes
pub fn encode_header(id: DeviceId, len: u32) -> [u8; HEADER_LEN] {
    let mut header = [0u8; HEADER_LEN];
    header[..4].copy_from_slice(&MAGIC);
    ByteOrder::Little.encode_u16(id.0, &mut header[4..]);
    ByteOrder::Little.encode_u32(len, &mut header[8..]);
    header
}

/// Parse an image header, returning the device ID and content length
pub fn decode_header(bytes: &[u8]) -> Option<(DeviceId, u32)> {
    if bytes.len() < HEADER_LEN || bytes[..4] != MAGIC {
        return None;
    }
    let id = DeviceId(ByteOrder::Little.decode_u16(&bytes[4..]));
    let len = ByteOrder::Little.decode_u32(&bytes[8..]);
    Some((id, len))
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DummyError + '_ {
    move |source| DummyError::Io {
        path: path.display().to_string(),
        source,
    }
}

impl DummyFlash {
    /// Write the flash contents to an image file
    pub fn save_image(&self, path: &Path) -> Result<()> {
        let data = self.data();
        let mut image = Vec::with_capacity(HEADER_LEN + data.len());
        image.extend_from_slice(&encode_header(self.config().id, data.len() as u32));
        image.extend_from_slice(data);

        fs::write(path, image).map_err(io_error(path))?;
        log::debug!("dummy: saved {} bytes to {}", data.len(), path.display());
        Ok(())
    }

    /// Recreate a dummy flash from an image file
    ///
    /// The chip answers with the ID stored in the header; its size is the
    /// stored content length.
    pub fn load_image(path: &Path) -> Result<Self> {
        let image = fs::read(path).map_err(io_error(path))?;
        let (id, len) =
            decode_header(&image).ok_or_else(|| DummyError::BadMagic(path.display().to_string()))?;

        let contents = &image[HEADER_LEN..];
        if len == 0 {
            return Err(DummyError::Empty(path.display().to_string()));
        }
        if contents.len() != len as usize {
            return Err(DummyError::SizeMismatch {
                declared: len,
                actual: contents.len(),
            });
        }

        log::debug!("dummy: loaded {} bytes (id {}) from {}", len, id, path.display());
        let config = DummyConfig {
            size: contents.len(),
            ..DummyConfig::for_id(id)
        };
        Ok(Self::with_data(config, contents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("spiflash-dummy-{}-{}.bin", std::process::id(), name))
    }

    #[test]
    fn test_header_is_little_endian() {
        let header = encode_header(DeviceId(0xEF16), 0x0080_0000);
        assert_eq!(
            header,
            [b'S', b'F', b'I', b'M', 0x16, 0xEF, 0, 0, 0x00, 0x00, 0x80, 0x00]
        );
        assert_eq!(decode_header(&header), Some((DeviceId(0xEF16), 0x0080_0000)));
        assert_eq!(decode_header(&header[..8]), None);
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let mut flash = DummyFlash::new(DummyConfig::for_id(DeviceId(0xEF13)));
        flash.data_mut()[0x1234] = 0x42;
        flash.save_image(&path).unwrap();

        let loaded = DummyFlash::load_image(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config().id, DeviceId(0xEF13));
        assert_eq!(loaded.data().len(), 1024 * 1024);
        assert_eq!(loaded.data()[0x1234], 0x42);
        assert_eq!(loaded.data()[0x1235], 0xFF);
    }

    #[test]
    fn test_rejects_foreign_files() {
        let path = temp_path("foreign");
        std::fs::write(&path, b"not an image at all").unwrap();
        let result = DummyFlash::load_image(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(DummyError::BadMagic(_))));
    }

    #[test]
    fn test_rejects_truncated_image() {
        let path = temp_path("truncated");
        let mut image = encode_header(DeviceId(0xEF13), 4096).to_vec();
        image.extend_from_slice(&[0xFF; 100]);
        std::fs::write(&path, image).unwrap();
        let result = DummyFlash::load_image(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            result,
            Err(DummyError::SizeMismatch {
                declared: 4096,
                actual: 100
            })
        ));
    }

    #[test]
    fn test_missing_file() {
        let result = DummyFlash::load_image(&temp_path("missing"));
        assert!(matches!(result, Err(DummyError::Io { .. })));
    }
}
