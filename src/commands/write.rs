//! Write command implementation

use super::prompt::Confirm;
use super::{address_range, print_step, print_summary, unlock};
use ftflash_core::progress::Progress;
use ftflash_core::units::format_size;
use ftflash_core::{ops, verify, FlashDevice};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Options for `ftflash write`
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// File to program
    pub file: PathBuf,
    /// Target address
    pub address: u32,
    /// Erase the target range first
    pub erase: bool,
    /// Read back and compare afterwards
    pub verify: bool,
    /// Bytes per transfer
    pub chunk_size: usize,
    /// Skip the confirmation prompt
    pub force: bool,
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "yes"
    } else {
        "no"
    }
}

/// Program a file into the flash: erase, write, verify
pub fn run_write<D: FlashDevice + ?Sized>(
    device: &mut D,
    opts: &WriteOptions,
    confirm: &mut dyn Confirm,
    progress: &mut dyn Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    if !opts.file.is_file() {
        return Err(format!("File not found: {}", opts.file.display()).into());
    }
    let data = fs::read(&opts.file)?;
    let len = data.len();
    let address = opts.address;
    let capacity = device.capacity();

    println!();
    println!("Write");
    println!("  File:    {}", opts.file.display());
    println!("  Size:    {} ({} bytes)", format_size(len as u64), len);
    println!("  Target:  {}", address_range(address, len));
    println!("  Erase:   {}", yes_no(opts.erase));
    println!("  Verify:  {}", yes_no(opts.verify));

    ops::check_range(capacity, address, len)?;
    if len == 0 {
        println!("Nothing to write");
        return Ok(());
    }

    if !opts.force && !confirm.confirm("Start writing?", false)? {
        println!("Cancelled.");
        return Ok(());
    }

    let start = Instant::now();
    unlock(device);

    if opts.erase {
        let block = device.erase_block_size() as usize;
        // Rounding up to whole blocks must not run past the end of the chip
        let erase_len = ops::erase_span(len, block).min(capacity as usize - address as usize);
        println!("  Erasing {}", address_range(address, erase_len));
        let erase_start = Instant::now();
        ops::erase_range(device, address, erase_len, progress)?;
        print_step("Erase", erase_len, erase_start.elapsed());
    } else {
        log::warn!("Skipping erase; bits already programmed to 0 cannot be set back to 1");
    }

    let write_start = Instant::now();
    ops::write_range(device, address, &data, opts.chunk_size, progress)?;
    print_step("Write", len, write_start.elapsed());

    if opts.verify {
        let verify_start = Instant::now();
        verify::verify_data(device, address, &data, opts.chunk_size, progress)?;
        print_step("Verify", len, verify_start.elapsed());
    } else {
        println!("  Verify skipped");
    }

    print_summary("Write", address, len, start.elapsed());
    Ok(())
}
