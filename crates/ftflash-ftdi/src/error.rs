//! Error types for the FTDI backend

use thiserror::Error;

/// Result type for FTDI operations
pub type Result<T> = std::result::Result<T, FtdiError>;

/// Errors that can occur while talking to an FTDI bridge or the flash behind it
#[derive(Debug, Error)]
pub enum FtdiError {
    /// No FTDI device found
    #[error("No FTDI device found")]
    DeviceNotFound,

    /// Failed to open device
    #[error("Failed to open device: {0}")]
    OpenFailed(String),

    /// USB transfer failed
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),

    /// Failed to configure device
    #[error("Failed to configure device: {0}")]
    ConfigFailed(String),

    /// Malformed device URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The URL as given
        url: String,
        /// What is wrong with it
        reason: String,
    },

    /// Chip select outside the usable ADBUS pins
    #[error("Invalid chip select {0}: must be 0-4")]
    InvalidChipSelect(u8),

    /// Channel not present on the selected bridge
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// Flash size could not be determined
    #[error("Could not determine flash capacity (no SFDP table and unknown JEDEC ID)")]
    UnknownCapacity,

    /// Error from the flash command layer
    #[error("Flash error: {0}")]
    Flash(#[from] spi_flash::Error),

    /// libftdi error
    #[error("libftdi error: {0}")]
    LibFtdi(String),

    /// USB enumeration error
    #[error("USB error: {0}")]
    UsbError(String),
}

impl From<nusb::Error> for FtdiError {
    fn from(e: nusb::Error) -> Self {
        FtdiError::UsbError(e.to_string())
    }
}

impl From<ftdi::Error> for FtdiError {
    fn from(e: ftdi::Error) -> Self {
        FtdiError::LibFtdi(e.to_string())
    }
}

impl From<FtdiError> for ftflash_core::Error {
    fn from(e: FtdiError) -> Self {
        ftflash_core::Error::device(e)
    }
}
