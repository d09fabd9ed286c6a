//! Backend option parsing

use std::path::PathBuf;

use spiflash_core::chip::DeviceId;

use crate::error::{DummyError, Result};
use crate::flash::{DummyConfig, DummyFlash};

/// Parsed `dummy:` backend options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DummyOptions {
    /// Image file loaded at open and written back by the caller
    pub image: Option<PathBuf>,
    /// ID to answer with when no image exists yet
    pub id: Option<DeviceId>,
    /// Size override in bytes
    pub size: Option<usize>,
    /// Busy polls after program/erase
    pub busy_polls: Option<u32>,
    /// Start with a chip that never becomes ready
    pub stuck: bool,
}

impl DummyOptions {
    /// Build the emulated chip
    ///
    /// An existing image wins over `id` and `size`.
    pub fn open(&self) -> Result<DummyFlash> {
        let mut flash = match &self.image {
            Some(path) if path.exists() => {
                let flash = DummyFlash::load_image(path)?;
                if let Some(id) = self.id.filter(|&id| id != flash.config().id) {
                    log::warn!(
                        "dummy: image {} holds chip {}, ignoring id={}",
                        path.display(),
                        flash.config().id,
                        id
                    );
                }
                flash
            }
            _ => {
                let mut config = DummyConfig::for_id(self.id.unwrap_or(DummyConfig::default().id));
                if let Some(size) = self.size {
                    config.size = size;
                }
                DummyFlash::new(config)
            }
        };

        if let Some(polls) = self.busy_polls {
            flash.set_busy_polls(polls);
        }
        flash.set_stuck(self.stuck);

        log::info!(
            "dummy: emulating {} ({} bytes)",
            flash.config().id,
            flash.data().len()
        );
        Ok(flash)
    }
}

fn parse_number<T>(key: &str, value: &str) -> Result<T>
where
    T: TryFrom<u64>,
{
    let parsed = if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16)
    } else {
        value.parse::<u64>()
    };
    parsed
        .ok()
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| DummyError::InvalidParameter(format!("{}={}", key, value)))
}

/// Parse programmer options from a list of key-value pairs
///
/// # Supported Options
///
/// - `image=PATH` - image file backing the chip (loaded if present)
/// - `id=0xEF16` - 16-bit manufacturer/device ID (default 0xEF13)
/// - `size=N` - flash size in KiB (default from the chip table)
/// - `busy=N` - status polls reporting busy after program/erase
/// - `stuck=1` - chip never leaves busy
pub fn parse_options(options: &[(&str, &str)]) -> Result<DummyOptions> {
    let mut parsed = DummyOptions::default();

    for (key, value) in options {
        match *key {
            "image" => parsed.image = Some(PathBuf::from(value)),
            "id" => parsed.id = Some(DeviceId(parse_number(key, value)?)),
            "size" => {
                let kib: usize = parse_number(key, value)?;
                let bytes = kib
                    .checked_mul(1024)
                    .filter(|&bytes| bytes > 0)
                    .ok_or_else(|| DummyError::InvalidParameter(format!("size={}", value)))?;
                parsed.size = Some(bytes);
            }
            "busy" => parsed.busy_polls = Some(parse_number(key, value)?),
            "stuck" => {
                parsed.stuck = match *value {
                    "1" | "true" | "yes" => true,
                    "0" | "false" | "no" => false,
                    _ => {
                        return Err(DummyError::InvalidParameter(format!("stuck={}", value)));
                    }
                }
            }
            _ => {
                log::warn!("dummy: Unknown option: {}={}", key, value);
            }
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options() {
        let opts = parse_options(&[("image", "flash.bin"), ("id", "0xEF16"), ("busy", "4")]).unwrap();
        assert_eq!(opts.image, Some(PathBuf::from("flash.bin")));
        assert_eq!(opts.id, Some(DeviceId(0xEF16)));
        assert_eq!(opts.busy_polls, Some(4));
        assert!(!opts.stuck);
    }

    #[test]
    fn test_parse_size_and_stuck() {
        let opts = parse_options(&[("size", "512"), ("stuck", "true")]).unwrap();
        assert_eq!(opts.size, Some(512 * 1024));
        assert!(opts.stuck);
    }

    #[test]
    fn test_parse_rejects_bad_values() {
        assert!(parse_options(&[("id", "0x1FFFF")]).is_err());
        assert!(parse_options(&[("id", "beef")]).is_err());
        assert!(parse_options(&[("size", "0")]).is_err());
        assert!(parse_options(&[("stuck", "maybe")]).is_err());
    }

    #[test]
    fn test_parse_rejects_overflowing_size() {
        let huge = (usize::MAX / 1024 + 1).to_string();
        assert!(matches!(
            parse_options(&[("size", huge.as_str())]),
            Err(DummyError::InvalidParameter(msg)) if msg == format!("size={}", huge)
        ));
    }

    #[test]
    fn test_open_without_image() {
        let opts = DummyOptions {
            id: Some(DeviceId(0xEF16)),
            stuck: true,
            ..Default::default()
        };
        let flash = opts.open().unwrap();
        assert_eq!(flash.config().id, DeviceId(0xEF16));
        assert_eq!(flash.data().len(), 8 * 1024 * 1024);
        assert!(flash.is_busy());
    }
}
