//! Flash device trait
//!
//! `FlashDevice` is the only thing the chunk loop and the verifier know about
//! the hardware. Backends (FTDI bridge, in-memory emulator) implement it and
//! are handed to the commands as a `Box<dyn FlashDevice>`.

use crate::error::Result;
use std::fmt;

/// Value of every byte in an erased block
pub const ERASED_BYTE: u8 = 0xFF;

/// Length argument of [`FlashDevice::erase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseLength {
    /// Erase this many bytes starting at the given address
    Bytes(u32),
    /// Erase the entire device with a single chip-erase command
    WholeChip,
}

/// Descriptive information about a connected device
#[derive(Debug, Clone, Default)]
pub struct DeviceInfo {
    /// Human-readable description (chip ID, manufacturer, ...)
    pub description: String,
    /// Total capacity in bytes
    pub capacity: u32,
    /// Smallest erase unit in bytes
    pub erase_block_size: u32,
    /// Program page size in bytes
    pub page_size: u32,
    /// SPI clock in Hz, if the bus has one
    pub spi_frequency_hz: Option<u32>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

/// An exclusively owned SPI NOR flash device
///
/// All addresses are byte offsets from the start of the flash. Range checks
/// against [`capacity`](FlashDevice::capacity) are the caller's job (see
/// [`ops::check_range`](crate::ops::check_range)); implementations may still
/// reject out-of-range requests with a device error.
pub trait FlashDevice {
    /// Total flash size in bytes
    fn capacity(&self) -> u32;

    /// Smallest erasable unit in bytes
    fn erase_block_size(&self) -> u32;

    /// Describe the device
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            description: String::from("SPI flash"),
            capacity: self.capacity(),
            erase_block_size: self.erase_block_size(),
            page_size: 256,
            spi_frequency_hz: None,
        }
    }

    /// Read `len` bytes starting at `address`
    fn read(&mut self, address: u32, len: usize) -> Result<Vec<u8>>;

    /// Program `data` starting at `address`
    ///
    /// The target region should already be erased.
    fn write(&mut self, address: u32, data: &[u8]) -> Result<()>;

    /// Erase the erase blocks covering `address..address+len`, or the whole chip
    fn erase(&mut self, address: u32, len: EraseLength) -> Result<()>;

    /// Clear block protection so the device can be written
    fn unlock(&mut self) -> Result<()>;
}

impl<D: FlashDevice + ?Sized> FlashDevice for Box<D> {
    fn capacity(&self) -> u32 {
        (**self).capacity()
    }

    fn erase_block_size(&self) -> u32 {
        (**self).erase_block_size()
    }

    fn info(&self) -> DeviceInfo {
        (**self).info()
    }

    fn read(&mut self, address: u32, len: usize) -> Result<Vec<u8>> {
        (**self).read(address, len)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn erase(&mut self, address: u32, len: EraseLength) -> Result<()> {
        (**self).erase(address, len)
    }

    fn unlock(&mut self) -> Result<()> {
        (**self).unlock()
    }
}
