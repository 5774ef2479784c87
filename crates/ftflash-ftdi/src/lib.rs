//! ftflash-ftdi - SPI NOR flash over an FTDI MPSSE bridge
//!
//! Supports the FT232H, FT2232H, FT4232H and FT4233H. The MPSSE engine is
//! driven through libftdi1; chip identification, SFDP parsing, page
//! programming and block protection are handled by the `spi-flash` crate.
//!
//! # Example
//!
//! ```no_run
//! use ftflash_core::FlashDevice;
//!
//! let mut flash = ftflash_ftdi::connect("ftdi://ftdi:232h/1", 0)?;
//! println!("{} bytes", flash.capacity());
//! let first_page = flash.read(0, 256)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Wiring
//!
//! | ADBUS | Signal            |
//! |-------|-------------------|
//! | 0     | SCK               |
//! | 1     | MOSI              |
//! | 2     | MISO              |
//! | 3..7  | CS0..CS4          |

mod device;
mod error;
mod flash;
mod protocol;
mod url;

pub use device::{list_devices, FtdiConfig, FtdiDeviceInfo, FtdiSpi};
pub use error::{FtdiError, Result};
pub use flash::SpiFlash;
pub use protocol::{FtdiDeviceType, FtdiInterface};
pub use url::{DeviceSelector, FtdiUrl, SCHEME};

/// Open the bridge named by `url`, select chip `cs` and identify the flash
pub fn connect(url: &str, cs: u8) -> Result<SpiFlash> {
    let url: FtdiUrl = url.parse()?;
    let config = FtdiConfig::from_url(&url, cs)?;
    let spi = FtdiSpi::open(&config)?;
    SpiFlash::probe(spi)
}
