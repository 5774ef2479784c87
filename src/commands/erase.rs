//! Erase command implementation

use super::prompt::Confirm;
use super::{address_range, print_step, print_summary, unlock, LARGE_ERASE};
use ftflash_core::progress::Progress;
use ftflash_core::{ops, verify, FlashDevice, Size};
use std::time::Instant;

/// Options for `ftflash erase`
#[derive(Debug, Clone)]
pub struct EraseOptions {
    /// Start address
    pub address: u32,
    /// Bytes to erase; the whole-chip sentinel means the full capacity
    pub size: Size,
    /// Blank-check the range afterwards
    pub verify: bool,
    /// Skip the confirmation prompt
    pub force: bool,
}

/// Erase a range (or the whole chip) and optionally blank-check it
pub fn run_erase<D: FlashDevice + ?Sized>(
    device: &mut D,
    opts: &EraseOptions,
    confirm: &mut dyn Confirm,
    progress: &mut dyn Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    let capacity = device.capacity();
    let block = device.erase_block_size();
    let address = opts.address;
    let len = opts.size.resolve(capacity);

    println!();
    println!("Erase");
    println!("  Range:       {}", address_range(address, len));
    println!("  Size:        {} bytes", len);
    println!("  Erase block: {} bytes", block);

    ops::check_range(capacity, address, len)?;
    if len == 0 {
        println!("Nothing to erase");
        return Ok(());
    }

    unlock(device);

    let whole_chip = address == 0 && len == capacity as usize;
    let chip_wide = opts.size.is_whole_chip() || whole_chip;
    if (chip_wide || len >= LARGE_ERASE) && !opts.force {
        let question = format!("Erase {} bytes at {}?", len, address_range(address, len));
        if !confirm.confirm(&question, true)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let start = Instant::now();
    if whole_chip {
        log::info!("Using chip erase");
        ops::erase_chip(device, progress)?;
    } else {
        ops::erase_range(device, address, len, progress)?;
    }
    print_step("Erase", len, start.elapsed());

    if opts.verify {
        let verify_start = Instant::now();
        verify::verify_erased(device, address, len, ops::DEFAULT_CHUNK_SIZE, progress)?;
        print_step("Blank check", len, verify_start.elapsed());
    }

    print_summary("Erase", address, len, start.elapsed());
    Ok(())
}
