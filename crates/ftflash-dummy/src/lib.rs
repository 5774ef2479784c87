//! ftflash-dummy - In-memory flash emulator
//!
//! Emulates a SPI NOR flash in memory: bytes start erased (0xFF),
//! programming can only clear bits, and erases work on whole blocks. It is
//! selected with a `dummy://` URL for dry runs, and the command tests run
//! against it.

use ftflash_core::{DeviceInfo, EraseLength, FlashDevice, ERASED_BYTE};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors raised by the emulator
#[derive(Debug, Error)]
pub enum DummyError {
    /// Request extends past the end of the emulated flash
    #[error("address 0x{address:08X}+{len} out of bounds (capacity {capacity})")]
    OutOfBounds {
        /// Start address
        address: u32,
        /// Request length
        len: usize,
        /// Emulated capacity
        capacity: u32,
    },
    /// Write or erase while block protection is active
    #[error("flash is write protected")]
    WriteProtected,
    /// Failure injected by a test
    #[error("injected failure")]
    Injected,
}

impl From<DummyError> for ftflash_core::Error {
    fn from(e: DummyError) -> Self {
        ftflash_core::Error::device(e)
    }
}

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID
    pub manufacturer_id: u8,
    /// JEDEC device ID
    pub device_id: u16,
    /// Flash size in bytes
    pub capacity: u32,
    /// Page size for programming
    pub page_size: u32,
    /// Smallest erase unit
    pub erase_block_size: u32,
    /// Start with block protection set; writes fail until `unlock`
    pub protected: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4018,     // W25Q128
            capacity: 16 * 1024 * 1024,
            page_size: 256,
            erase_block_size: 4096,
            protected: false,
        }
    }
}

impl DummyConfig {
    /// Default geometry with a different capacity
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }
}

/// Per-operation call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// `read` calls
    pub reads: usize,
    /// `write` calls
    pub writes: usize,
    /// `erase` calls
    pub erases: usize,
    /// `unlock` calls
    pub unlocks: usize,
}

impl OpCounts {
    /// Calls that touched the flash array
    pub fn io(&self) -> usize {
        self.reads + self.writes + self.erases
    }
}

/// Emulated flash device
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u8>,
    protected: bool,
    counts: OpCounts,
    fail_after: Option<usize>,
    fail_unlock: bool,
    corrupt: BTreeMap<usize, u8>,
}

impl DummyFlash {
    /// Create a blank (fully erased) flash
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![ERASED_BYTE; config.capacity as usize];
        let protected = config.protected;
        log::debug!(
            "dummy flash: {} bytes, {} byte erase blocks",
            config.capacity,
            config.erase_block_size
        );
        Self {
            config,
            data,
            protected,
            counts: OpCounts::default(),
            fail_after: None,
            fail_unlock: false,
            corrupt: BTreeMap::new(),
        }
    }

    /// Create a dummy flash with pre-filled data
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        let len = initial_data.len().min(flash.data.len());
        flash.data[..len].copy_from_slice(&initial_data[..len]);
        flash
    }

    /// Get a reference to the flash contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Call counters since creation
    pub fn counts(&self) -> OpCounts {
        self.counts
    }

    /// Whether block protection is active
    pub fn is_protected(&self) -> bool {
        self.protected
    }

    /// Let `ops` more array operations succeed, then fail every one after
    pub fn fail_after(&mut self, ops: usize) {
        self.fail_after = Some(ops);
    }

    /// Make `unlock` fail
    pub fn fail_unlock(&mut self) {
        self.fail_unlock = true;
    }

    /// XOR the byte at `offset` with `xor` whenever it is read back
    ///
    /// The stored contents stay untouched.
    pub fn corrupt_readback(&mut self, offset: usize, xor: u8) {
        self.corrupt.insert(offset, xor);
    }

    fn check_bounds(&self, address: u32, len: usize) -> Result<(), DummyError> {
        let fits = (address as u64)
            .checked_add(len as u64)
            .is_some_and(|end| end <= self.data.len() as u64);
        if !fits {
            return Err(DummyError::OutOfBounds {
                address,
                len,
                capacity: self.config.capacity,
            });
        }
        Ok(())
    }

    fn tick(&mut self) -> Result<(), DummyError> {
        match self.fail_after {
            Some(0) => Err(DummyError::Injected),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn check_writable(&self) -> Result<(), DummyError> {
        if self.protected {
            return Err(DummyError::WriteProtected);
        }
        Ok(())
    }
}

impl FlashDevice for DummyFlash {
    fn capacity(&self) -> u32 {
        self.config.capacity
    }

    fn erase_block_size(&self) -> u32 {
        self.config.erase_block_size
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            description: format!(
                "Dummy flash (JEDEC {:02X} {:04X})",
                self.config.manufacturer_id, self.config.device_id
            ),
            capacity: self.config.capacity,
            erase_block_size: self.config.erase_block_size,
            page_size: self.config.page_size,
            spi_frequency_hz: None,
        }
    }

    fn read(&mut self, address: u32, len: usize) -> ftflash_core::Result<Vec<u8>> {
        self.counts.reads += 1;
        self.tick()?;
        self.check_bounds(address, len)?;

        let start = address as usize;
        let mut buf = self.data[start..start + len].to_vec();
        for (&offset, &xor) in self.corrupt.range(start..start + len) {
            buf[offset - start] ^= xor;
        }
        Ok(buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> ftflash_core::Result<()> {
        self.counts.writes += 1;
        self.tick()?;
        self.check_bounds(address, data.len())?;
        self.check_writable()?;

        // Programming can only change 1 -> 0
        let start = address as usize;
        for (dst, &src) in self.data[start..start + data.len()].iter_mut().zip(data) {
            *dst &= src;
        }
        Ok(())
    }

    fn erase(&mut self, address: u32, len: EraseLength) -> ftflash_core::Result<()> {
        self.counts.erases += 1;
        self.tick()?;
        self.check_writable()?;

        let (start, end) = match len {
            EraseLength::WholeChip => (0, self.data.len()),
            EraseLength::Bytes(n) => {
                self.check_bounds(address, n as usize)?;
                // Every block the range touches is erased
                let block = self.config.erase_block_size.max(1) as usize;
                let start = address as usize / block * block;
                let end = (address as usize + n as usize).div_ceil(block) * block;
                (start, end.min(self.data.len()))
            }
        };
        log::trace!("dummy erase 0x{:08X}..0x{:08X}", start, end);
        self.data[start..end].fill(ERASED_BYTE);
        Ok(())
    }

    fn unlock(&mut self) -> ftflash_core::Result<()> {
        self.counts.unlocks += 1;
        if self.fail_unlock {
            return Err(DummyError::Injected.into());
        }
        self.protected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> DummyFlash {
        DummyFlash::new(DummyConfig::with_capacity(64 * 1024))
    }

    #[test]
    fn test_starts_erased() {
        let flash = small();
        assert_eq!(flash.data().len(), 64 * 1024);
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_read_write() {
        let mut flash = small();
        flash.write(0x1000, &[0x12, 0x34, 0x56, 0x78]).unwrap();
        assert_eq!(flash.read(0x1000, 4).unwrap(), vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn test_program_only_clears_bits() {
        let mut flash = small();
        flash.write(0, &[0xF0]).unwrap();
        flash.write(0, &[0x0F]).unwrap();
        assert_eq!(flash.read(0, 1).unwrap(), vec![0x00]);
    }

    #[test]
    fn test_erase_rounds_to_blocks() {
        let mut flash = DummyFlash::with_data(DummyConfig::with_capacity(64 * 1024), &[0u8; 64 * 1024]);

        // 0x1800..0x2800 touches blocks 1 and 2
        flash.erase(0x1800, EraseLength::Bytes(0x1000)).unwrap();
        assert!(flash.data()[..0x1000].iter().all(|&b| b == 0));
        assert!(flash.data()[0x1000..0x3000].iter().all(|&b| b == 0xFF));
        assert!(flash.data()[0x3000..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_chip_erase() {
        let mut flash = DummyFlash::with_data(DummyConfig::with_capacity(8192), &[0x5A; 8192]);
        flash.erase(0, EraseLength::WholeChip).unwrap();
        assert!(flash.data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_out_of_bounds() {
        let mut flash = small();
        assert!(flash.read(0xFFFF, 2).is_err());
        assert!(flash.write(0x1_0000, &[0]).is_err());
        assert!(flash.erase(0xF000, EraseLength::Bytes(0x2000)).is_err());
        assert!(flash.read(1, usize::MAX).is_err());
    }

    #[test]
    fn test_protection_until_unlock() {
        let mut flash = DummyFlash::new(DummyConfig {
            protected: true,
            ..DummyConfig::with_capacity(8192)
        });
        assert!(flash.write(0, &[0]).is_err());
        assert!(flash.erase(0, EraseLength::WholeChip).is_err());

        flash.unlock().unwrap();
        assert!(!flash.is_protected());
        flash.write(0, &[0]).unwrap();
        assert_eq!(flash.counts().unlocks, 1);
    }

    #[test]
    fn test_fault_injection() {
        let mut flash = small();
        flash.fail_after(2);
        assert!(flash.read(0, 1).is_ok());
        assert!(flash.read(0, 1).is_ok());
        assert!(flash.read(0, 1).is_err());
        assert_eq!(flash.counts().reads, 3);

        let mut flash = small();
        flash.fail_unlock();
        assert!(flash.unlock().is_err());
    }

    #[test]
    fn test_corrupt_readback() {
        let mut flash = small();
        flash.corrupt_readback(10, 0x01);
        let buf = flash.read(8, 4).unwrap();
        assert_eq!(buf, vec![0xFF, 0xFF, 0xFE, 0xFF]);
        // Stored contents are untouched
        assert_eq!(flash.data()[10], 0xFF);
    }

    #[test]
    fn test_info() {
        let flash = small();
        let info = flash.info();
        assert_eq!(info.capacity, 64 * 1024);
        assert_eq!(info.erase_block_size, 4096);
        assert!(info.description.contains("EF 4018"));
    }
}
