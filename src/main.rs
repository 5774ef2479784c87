//! ftflash - SPI NOR flash programmer for FTDI MPSSE bridges
//!
//! Erases, reads and writes SPI NOR flash chips wired to an FT232H,
//! FT2232H, FT4232H or FT4233H.
//!
//! # Architecture
//!
//! - `ftflash-core` holds the chunked operation loop, verification and
//!   address/size parsing, written against the `FlashDevice` trait
//! - `ftflash-ftdi` implements `FlashDevice` for a chip behind an MPSSE bridge
//! - `ftflash-dummy` implements it in memory for dry runs (`dummy://`)
//!
//! The commands in this crate only see a `Box<dyn FlashDevice>`.

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands, DeviceArgs};
use commands::progress::reporter;
use commands::prompt::StdinConfirm;
use ftflash_core::FlashDevice;
use std::process::ExitCode;

/// Connect to the device and print its description
fn open(args: &DeviceArgs) -> Result<Box<dyn FlashDevice>, Box<dyn std::error::Error>> {
    println!("Connecting to {} (CS {})", args.url, args.cs);
    let device = programmers::connect(&args.url, args.cs)?;
    commands::print_device_info(&*device);
    Ok(device)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut confirm = StdinConfirm;

    match cli.command {
        Commands::Erase {
            device,
            address,
            size,
            no_verify,
        } => {
            let mut flash = open(&device)?;
            if device.info {
                return Ok(());
            }
            let opts = commands::EraseOptions {
                address,
                size,
                verify: !no_verify,
                force: device.force,
            };
            commands::run_erase(&mut *flash, &opts, &mut confirm, &mut *reporter())
        }
        Commands::Read {
            device,
            output,
            size,
            address,
            chunk_size,
        } => {
            let mut flash = open(&device)?;
            if device.info {
                return Ok(());
            }
            let opts = commands::ReadOptions {
                output,
                address,
                size,
                chunk_size,
                force: device.force,
            };
            commands::run_read(&mut *flash, &opts, &mut confirm, &mut *reporter())
        }
        Commands::Write {
            device,
            file,
            address,
            no_verify,
            no_erase,
            chunk_size,
        } => {
            let mut flash = open(&device)?;
            if device.info {
                return Ok(());
            }
            let file = file.ok_or("No input file given (see --help)")?;
            let opts = commands::WriteOptions {
                file,
                address,
                erase: !no_erase,
                verify: !no_verify,
                chunk_size,
                force: device.force,
            };
            commands::run_write(&mut *flash, &opts, &mut confirm, &mut *reporter())
        }
        Commands::Probe { url, cs } => {
            let urls = match &url {
                Some(url) => vec![url.as_str()],
                None => commands::FALLBACK_URLS.to_vec(),
            };
            let (url, mut flash) = commands::connect_any(&urls, cs, programmers::connect)?;
            println!("Connected via {}", url);
            commands::run_probe(&mut *flash)
        }
        Commands::ListDevices => commands::list_devices(),
    }
}

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // SIGINT keeps its default action, so Ctrl-C never gets here
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
