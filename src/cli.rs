//! CLI argument parsing

use clap::{Parser, Subcommand};
use ftflash_core::parse::{parse_address, parse_chunk_size, parse_size};
use ftflash_core::Size;
use std::path::PathBuf;

/// Default device URL: first FT232H, channel A
pub const DEFAULT_URL: &str = "ftdi://ftdi:232h/1";

/// Parse an address such as `0x1000` or `64k`
fn address_arg(s: &str) -> Result<u32, String> {
    parse_address(s).map_err(|e| e.to_string())
}

/// Parse a size such as `4k`, `1m` or `all`
fn size_arg(s: &str) -> Result<Size, String> {
    parse_size(s).map_err(|e| e.to_string())
}

fn chunk_size_arg(s: &str) -> Result<usize, String> {
    parse_chunk_size(s).map_err(|e| e.to_string())
}

#[derive(Parser)]
#[command(name = "ftflash")]
#[command(author, version, about = "SPI NOR flash programmer for FTDI MPSSE bridges", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Device selection shared by all flash commands
#[derive(clap::Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Device URL (ftdi://[vendor[:product[:serial|index]]]/interface or dummy://[size])
    #[arg(short, long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Chip select index (0 = ADBUS3 ... 4 = ADBUS7)
    #[arg(short, long, default_value_t = 0)]
    pub cs: u8,

    /// Show device information and exit
    #[arg(short, long)]
    pub info: bool,

    /// Don't ask for confirmation
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Erase a range of the flash, or the whole chip
    Erase {
        #[command(flatten)]
        device: DeviceArgs,

        /// Start address (decimal, 0x-hex, k/m/g suffixes)
        #[arg(value_parser = address_arg)]
        address: u32,

        /// Number of bytes to erase (-1, all, chip or full for the whole chip)
        #[arg(value_parser = size_arg, allow_hyphen_values = true)]
        size: Size,

        /// Skip the blank check after erasing
        #[arg(long)]
        no_verify: bool,
    },

    /// Read flash contents to a file
    Read {
        #[command(flatten)]
        device: DeviceArgs,

        /// Output file path
        output: PathBuf,

        /// Number of bytes to read (-1, all, chip or full for the whole chip)
        #[arg(value_parser = size_arg, allow_hyphen_values = true)]
        size: Size,

        /// Start address
        #[arg(short, long, value_parser = address_arg, default_value = "0")]
        address: u32,

        /// Bytes per transfer
        #[arg(long, value_parser = chunk_size_arg, default_value = "4096")]
        chunk_size: usize,
    },

    /// Write a file to the flash
    Write {
        #[command(flatten)]
        device: DeviceArgs,

        /// Input file path
        file: Option<PathBuf>,

        /// Start address
        #[arg(short, long, value_parser = address_arg, default_value = "0")]
        address: u32,

        /// Skip read-back verification
        #[arg(long)]
        no_verify: bool,

        /// Don't erase the target range before writing
        #[arg(long)]
        no_erase: bool,

        /// Bytes per transfer
        #[arg(long, value_parser = chunk_size_arg, default_value = "4096")]
        chunk_size: usize,
    },

    /// Connect, identify the flash and dump its first bytes
    Probe {
        /// Device URL; without one, common FTDI bridges are tried in turn
        #[arg(short, long)]
        url: Option<String>,

        /// Chip select index (0 = ADBUS3 ... 4 = ADBUS7)
        #[arg(short, long, default_value_t = 0)]
        cs: u8,
    },

    /// List attached FTDI bridges and supported device URLs
    ListDevices,
}
