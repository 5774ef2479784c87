//! ftflash-core - Chunked flash operations over an injected device
//!
//! This crate contains everything between the command line and the flash
//! driver: parsing of human-written addresses and sizes, the chunked
//! read/write/erase loop, read-back verification and progress reporting.
//!
//! The device itself is abstracted by the [`FlashDevice`] trait. Real
//! hardware lives in `ftflash-ftdi`; `ftflash-dummy` provides an in-memory
//! emulator for dry runs without hardware.
//!
//! # Example
//!
//! ```ignore
//! use ftflash_core::{ops, parse, progress::NoProgress, FlashDevice};
//!
//! fn dump<D: FlashDevice + ?Sized>(device: &mut D) -> ftflash_core::Result<Vec<u8>> {
//!     let address = parse::parse_address("0x1000")?;
//!     let len = parse::parse_size("4k")?.resolve(device.capacity());
//!     ops::check_range(device.capacity(), address, len)?;
//!     ops::read_range(device, address, len, ops::DEFAULT_CHUNK_SIZE, &mut NoProgress)
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod device;
pub mod error;
pub mod ops;
pub mod parse;
pub mod progress;
pub mod units;
pub mod verify;

#[cfg(test)]
mod testutil;

pub use device::{DeviceInfo, EraseLength, FlashDevice, ERASED_BYTE};
pub use error::{Error, ParseError, Result};
pub use parse::Size;
