//! Read command implementation

use super::prompt::Confirm;
use super::{address_range, print_step, print_summary};
use ftflash_core::progress::Progress;
use ftflash_core::units::format_size;
use ftflash_core::{ops, FlashDevice, Size};
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Options for `ftflash read`
#[derive(Debug, Clone)]
pub struct ReadOptions {
    /// File to write the flash contents to
    pub output: PathBuf,
    /// Start address
    pub address: u32,
    /// Bytes to read; the whole-chip sentinel means the full capacity
    pub size: Size,
    /// Bytes per transfer
    pub chunk_size: usize,
    /// Overwrite without asking
    pub force: bool,
}

/// Read a range of the flash into a file
pub fn run_read<D: FlashDevice + ?Sized>(
    device: &mut D,
    opts: &ReadOptions,
    confirm: &mut dyn Confirm,
    progress: &mut dyn Progress,
) -> Result<(), Box<dyn std::error::Error>> {
    let capacity = device.capacity();
    let address = opts.address;
    let len = opts.size.resolve(capacity);
    ops::check_range(capacity, address, len)?;

    if opts.output.exists() && !opts.force {
        let question = format!("{} already exists. Overwrite?", opts.output.display());
        if !confirm.confirm(&question, false)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    println!();
    println!("Read");
    println!("  Range:  {}", address_range(address, len));
    println!("  Size:   {} ({} bytes)", format_size(len as u64), len);
    println!("  Output: {}", opts.output.display());

    if !opts.force && !confirm.confirm("Start reading?", true)? {
        println!("Cancelled.");
        return Ok(());
    }

    let start = Instant::now();
    let data = ops::read_range(device, address, len, opts.chunk_size, progress)?;
    print_step("Read", len, start.elapsed());

    if let Some(parent) = opts.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&opts.output, &data)?;
    println!(
        "  Saved {} bytes to {}",
        data.len(),
        fs::canonicalize(&opts.output)
            .unwrap_or_else(|_| opts.output.clone())
            .display()
    );

    print_summary("Read", address, len, start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::prompt::ScriptedConfirm;
    use ftflash_core::progress::NoProgress;
    use ftflash_core::Error;
    use ftflash_dummy::{DummyConfig, DummyFlash};

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn flash() -> DummyFlash {
        DummyFlash::with_data(DummyConfig::with_capacity(64 * 1024), &pattern(64 * 1024))
    }

    fn opts(output: PathBuf, address: u32, size: Size) -> ReadOptions {
        ReadOptions {
            output,
            address,
            size,
            chunk_size: 1000,
            force: true,
        }
    }

    #[test]
    fn test_read_to_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested/dir/dump.bin");
        let mut flash = flash();
        let mut confirm = ScriptedConfirm::new(&[]);

        run_read(&mut flash, &opts(output.clone(), 0x100, Size::Bytes(5000)), &mut confirm, &mut NoProgress)
            .unwrap();

        let data = fs::read(&output).unwrap();
        assert_eq!(data, &pattern(64 * 1024)[0x100..0x100 + 5000]);
        // 5000 bytes in 1000 byte chunks
        assert_eq!(flash.counts().reads, 5);
    }

    #[test]
    fn test_read_whole_chip() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("full.bin");
        let mut flash = flash();
        let mut confirm = ScriptedConfirm::new(&[]);

        run_read(&mut flash, &opts(output.clone(), 0, Size::WholeChip), &mut confirm, &mut NoProgress)
            .unwrap();
        assert_eq!(fs::read(&output).unwrap(), pattern(64 * 1024));

        // The sentinel is the full capacity, so it only fits from address 0
        let err = run_read(&mut flash, &opts(output, 0xF000, Size::WholeChip), &mut confirm, &mut NoProgress)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_declined_overwrite_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dump.bin");
        fs::write(&output, b"keep me").unwrap();
        let mut flash = flash();
        let mut confirm = ScriptedConfirm::new(&[false]);
        let mut o = opts(output.clone(), 0, Size::Bytes(16));
        o.force = false;

        run_read(&mut flash, &o, &mut confirm, &mut NoProgress).unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"keep me");
        assert_eq!(confirm.asked.len(), 1);
        assert_eq!(flash.counts().io(), 0);
    }

    #[test]
    fn test_confirmed_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dump.bin");
        fs::write(&output, b"old").unwrap();
        let mut flash = flash();
        let mut confirm = ScriptedConfirm::new(&[true, true]);
        let mut o = opts(output.clone(), 0, Size::Bytes(16));
        o.force = false;

        run_read(&mut flash, &o, &mut confirm, &mut NoProgress).unwrap();

        assert_eq!(fs::read(&output).unwrap(), pattern(16));
        assert_eq!(confirm.asked.len(), 2);
    }

    #[test]
    fn test_out_of_range_rejected_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dump.bin");
        let mut flash = flash();
        let mut confirm = ScriptedConfirm::new(&[]);

        let err = run_read(&mut flash, &opts(output.clone(), 0x8000, Size::Bytes(0x9000)), &mut confirm, &mut NoProgress)
            .unwrap_err();

        match err.downcast_ref::<Error>() {
            Some(Error::OutOfRange { available, .. }) => assert_eq!(*available, 0x8000),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(flash.counts().io(), 0);
        assert!(!output.exists());
    }
}
