//! CLI argument parsing

use crate::backends;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the backend argument
fn backend_help() -> String {
    format!(
        "Backend to use, as name:key=value,... [available: {}]",
        backends::backend_names_short()
    )
}

#[derive(Parser)]
#[command(name = "spiflash-disk")]
#[command(author, version, about = "Block device access to SPI NOR flash", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra chip definitions (RON file), merged over the built-in table
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// Driver configuration (RON file with bus clock and poll timings)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the serial clock rate in Hz
    #[arg(long, global = true, value_parser = parse_hex_u32)]
    pub bus_hz: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Detect the flash chip
    Probe {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,
    },

    /// Show chip and block device details
    Info {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,
    },

    /// Read one block to a file
    ReadBlock {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,

        /// Block number (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_hex_u32)]
        block: u32,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write one block from a file
    WriteBlock {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,

        /// Block number (decimal or 0x-prefixed hex)
        #[arg(short, long, value_parser = parse_hex_u32)]
        block: u32,

        /// Input file path (at most one block; short files are padded with 0xFF)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Read the whole device to a file
    Dump {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write a file to the device, starting at block 0
    Restore {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Erase the whole chip
    Format {
        #[arg(short = 'p', long, help = backend_help())]
        backend: String,
    },

    /// List available backends
    ListBackends,
}

impl Commands {
    /// Backend string of commands that need a device
    pub fn backend(&self) -> Option<&str> {
        match self {
            Commands::Probe { backend }
            | Commands::Info { backend }
            | Commands::ReadBlock { backend, .. }
            | Commands::WriteBlock { backend, .. }
            | Commands::Dump { backend, .. }
            | Commands::Restore { backend, .. }
            | Commands::Format { backend } => Some(backend),
            Commands::ListBackends => None,
        }
    }
}
