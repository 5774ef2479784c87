//! Error types for ftflash-core

use thiserror::Error;

/// A string that could not be understood as an address or size
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The string was empty (after trimming)
    #[error("empty value")]
    Empty,

    /// The string is not a decimal or `0x` hexadecimal number
    #[error("invalid number '{0}' (expected decimal, 0x-hex, or a k/m/g suffix)")]
    InvalidNumber(String),

    /// The value does not fit the target integer type
    #[error("value '{0}' is too large")]
    Overflow(String),

    /// The whole-chip sentinel is not allowed here
    #[error("'{0}' is not allowed here")]
    SentinelNotAllowed(String),

    /// A zero value is not allowed here
    #[error("value must be greater than zero")]
    Zero,
}

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed address or size string
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The requested range does not fit the device
    #[error(
        "range 0x{address:08X}+{len} exceeds device capacity of {capacity} bytes \
         (only {available} bytes available from 0x{address:08X})"
    )]
    OutOfRange {
        /// Start address of the request
        address: u32,
        /// Requested length in bytes
        len: usize,
        /// Device capacity in bytes
        capacity: u32,
        /// Bytes between `address` and the end of the device
        available: u64,
    },

    /// Chunk size of zero
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,

    /// Failure reported by the flash driver
    #[error("device error: {0}")]
    Device(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The driver returned fewer bytes than requested
    #[error("short read at 0x{address:08X}: expected {expected} bytes, got {got}")]
    ShortRead {
        /// Address of the failed chunk
        address: u32,
        /// Bytes requested
        expected: usize,
        /// Bytes returned
        got: usize,
    },

    /// Read-back did not match the expected contents
    #[error(
        "verification failed: {count} byte(s) differ, first mismatch at offset 0x{first_offset:X} \
         (address 0x{address:08X})"
    )]
    Verify {
        /// Offset of the first mismatch, relative to the verified range
        first_offset: usize,
        /// Absolute flash address of the first mismatch
        address: u32,
        /// Total number of mismatching bytes
        count: usize,
    },
}

impl Error {
    /// Wrap a driver error
    pub fn device<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Device(Box::new(err))
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
