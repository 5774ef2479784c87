//! CLI command implementations
//!
//! Every command works on a `FlashDevice` trait object, so the same code
//! drives an FTDI bridge or the in-memory dummy. Confirmation prompts and
//! progress reporting are passed in by `main`.

pub mod erase;
mod list;
mod probe;
pub mod progress;
pub mod prompt;
pub mod read;
pub mod write;

pub use erase::{run_erase, EraseOptions};
pub use list::list_devices;
pub use probe::{connect_any, run_probe, FALLBACK_URLS};
pub use read::{run_read, ReadOptions};
pub use write::{run_write, WriteOptions};

use ftflash_core::units::{format_duration, format_rate, format_size};
use ftflash_core::FlashDevice;
use std::time::Duration;

/// Bytes at or above which an erase asks for confirmation
pub const LARGE_ERASE: usize = 1024 * 1024;

/// Print what we know about the connected device
pub fn print_device_info<D: FlashDevice + ?Sized>(device: &D) {
    let info = device.info();
    println!("Connected: {}", info);
    println!(
        "  Capacity:    {} ({} bytes)",
        format_size(info.capacity as u64),
        info.capacity
    );
    if let Some(hz) = info.spi_frequency_hz {
        println!("  SPI clock:   {:.2} MHz", hz as f64 / 1e6);
    }
    println!("  Erase block: {} bytes", info.erase_block_size);
    println!("  Page size:   {} bytes", info.page_size);
}

/// Clear block protection; failure is reported and otherwise ignored
pub fn unlock<D: FlashDevice + ?Sized>(device: &mut D) {
    match device.unlock() {
        Ok(()) => log::info!("Device unlocked"),
        Err(e) => log::warn!("Unlock failed, continuing anyway: {}", e),
    }
}

/// `0xSTART - 0xEND` for a non-empty range
pub fn address_range(address: u32, len: usize) -> String {
    if len == 0 {
        return format!("0x{:08X} (empty)", address);
    }
    match (address as u64).checked_add(len as u64 - 1) {
        Some(end) => format!("0x{:08X} - 0x{:08X}", address, end),
        None => format!("0x{:08X} + {} bytes", address, len),
    }
}

/// One timed step of a command, e.g. "Erase" or "Verify"
fn print_step(step: &str, bytes: usize, elapsed: Duration) {
    println!(
        "  {} done in {} ({})",
        step,
        format_duration(elapsed),
        format_rate(bytes as u64, elapsed)
    );
}

/// Closing summary shared by all commands
fn print_summary(action: &str, address: u32, len: usize, elapsed: Duration) {
    println!();
    println!("{} complete", action);
    println!("  Range: {}", address_range(address, len));
    println!("  Size:  {} ({} bytes)", format_size(len as u64), len);
    println!("  Time:  {}", format_duration(elapsed));
    println!("  Speed: {}", format_rate(len as u64, elapsed));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftflash_dummy::{DummyConfig, DummyFlash};

    #[test]
    fn test_address_range() {
        assert_eq!(address_range(0, 4096), "0x00000000 - 0x00000FFF");
        assert_eq!(address_range(0x1000, 1), "0x00001000 - 0x00001000");
        assert_eq!(address_range(0x20, 0), "0x00000020 (empty)");
        // The last byte of a 4 GiB device doesn't overflow
        assert_eq!(
            address_range(0xFFFF_F000, 0x1000),
            "0xFFFFF000 - 0xFFFFFFFF"
        );
        assert_eq!(
            address_range(2, usize::MAX),
            format!("0x00000002 + {} bytes", usize::MAX)
        );
    }

    #[test]
    fn test_unlock_failure_is_ignored() {
        let mut flash = DummyFlash::new(DummyConfig {
            protected: true,
            ..DummyConfig::with_capacity(64 * 1024)
        });
        flash.fail_unlock();
        unlock(&mut flash);
        assert_eq!(flash.counts().unlocks, 1);
        assert!(flash.is_protected());
    }
}
