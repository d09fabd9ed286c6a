//! spiflash-disk - Block device access to SPI NOR flash
//!
//! Opens a backend (an emulated chip or a GPIO-bitbanged bus), brings the
//! flash up as a block device and runs block-level commands against it.
//!
//! # Architecture
//!
//! Every backend provides a byte bus. The bus is wrapped in a command
//! framer and the flash driver, and the block layer on top serves 512-byte
//! blocks through a one-sector write-back cache. Commands only ever see the
//! block layer, so they behave identically on every backend.

mod backends;
mod cli;
mod commands;

use std::path::Path;

use clap::Parser;
use cli::{Cli, Commands};
use spiflash_core::chip::ChipDatabase;
use spiflash_core::disk::SpiFlashDisk;
use spiflash_core::programmer::{BusMaster, SpiBus};
use spiflash_core::SpiFlashConfig;

use backends::Backend;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let Some(spec) = cli.command.backend() else {
        commands::list_backends();
        return Ok(());
    };

    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };
    log::debug!("Loaded {} chip definitions", db.len());

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(hz) = cli.bus_hz {
        config.bus_hz = hz;
    }

    let result = match backends::open_backend(spec)? {
        #[cfg(feature = "dummy")]
        Backend::Dummy { flash, image } => {
            let (result, flash) = run_on_bus(flash, config, &db, &cli.command);
            if let Some(path) = image {
                flash.save_image(&path)?;
                log::info!("Saved image to {}", path.display());
            }
            result
        }
        #[cfg(feature = "linux-gpio")]
        Backend::LinuxGpio(bus) => run_on_bus(bus, config, &db, &cli.command).0,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Run `command` on a block device over `bus`, handing the bus back
#[allow(dead_code)]
fn run_on_bus<B: SpiBus>(
    bus: B,
    config: SpiFlashConfig,
    db: &ChipDatabase,
    command: &Commands,
) -> (commands::CmdResult, B) {
    let mut disk = SpiFlashDisk::with_chips(BusMaster::new(bus), config, db);
    let result = commands::run(&mut disk, command);
    (result, disk.into_master().into_bus())
}

/// Built-in chips plus the definitions in `path`
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::with_builtin();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(format!("Chip database not found: {}", path.display()).into());
        }
        let count = db.load_file(path)?;
        log::info!("Loaded {} chips from {}", count, path.display());
    }

    Ok(db)
}

/// Driver configuration from a RON file, or the defaults
fn load_config(path: Option<&Path>) -> Result<SpiFlashConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(SpiFlashConfig::default());
    };

    let content = std::fs::read_to_string(path)?;
    let config: SpiFlashConfig = ron::from_str(&content)?;
    log::debug!("Loaded driver configuration from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_ron() {
        let config: SpiFlashConfig = ron::from_str(
            "(bus_hz: 1000000, erase_4k: (poll_delay_us: 1000, timeout_us: 500000))",
        )
        .unwrap();
        assert_eq!(config.bus_hz, 1_000_000);
        assert_eq!(config.erase_4k.timeout_us, 500_000);
        assert_eq!(config.page_program, SpiFlashConfig::default().page_program);
    }

    #[test]
    fn test_default_config_without_file() {
        assert_eq!(load_config(None).unwrap(), SpiFlashConfig::default());
    }

    #[test]
    fn test_chip_database_missing_file() {
        assert!(load_chip_database(Some(Path::new("/nonexistent/chips.ron"))).is_err());
        assert_eq!(load_chip_database(None).unwrap().len(), 2);
    }
}
