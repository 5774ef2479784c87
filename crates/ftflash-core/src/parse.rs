//! Address and size string parsing
//!
//! Grammar shared by addresses and sizes:
//!
//! ```text
//! value  := number [suffix]
//! number := decimal | "0x" hex
//! suffix := k | m | g        (case-insensitive, powers of 1024)
//! ```
//!
//! Sizes additionally accept the whole-chip sentinels `-1`, `all`, `chip`
//! and `full`.

use crate::error::ParseError;
use std::fmt;
use std::num::IntErrorKind;

/// Tokens meaning "the entire device"
pub const WHOLE_CHIP_TOKENS: &[&str] = &["-1", "all", "chip", "full"];

/// A byte count, or the whole device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Size {
    /// An explicit number of bytes
    Bytes(usize),
    /// The entire device capacity
    WholeChip,
}

impl Size {
    /// Turn the sentinel into a concrete byte count
    pub fn resolve(self, capacity: u32) -> usize {
        match self {
            Size::Bytes(n) => n,
            Size::WholeChip => capacity as usize,
        }
    }

    /// Whether this is the whole-chip sentinel
    pub fn is_whole_chip(self) -> bool {
        matches!(self, Size::WholeChip)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Bytes(n) => write!(f, "{}", n),
            Size::WholeChip => write!(f, "all"),
        }
    }
}

/// Split a trailing k/m/g suffix off `s`, returning the remainder and multiplier
fn split_suffix(s: &str) -> (&str, u64) {
    let multiplier = match s.as_bytes().last() {
        Some(b'k' | b'K') => 1024,
        Some(b'm' | b'M') => 1024 * 1024,
        Some(b'g' | b'G') => 1024 * 1024 * 1024,
        _ => return (s, 1),
    };
    (&s[..s.len() - 1], multiplier)
}

/// Parse a decimal or 0x-prefixed hexadecimal literal
fn parse_literal(digits: &str, input: &str) -> Result<u64, ParseError> {
    let (digits, radix) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };

    // from_str_radix accepts a leading '+', we don't
    if digits.is_empty() || digits.starts_with('+') {
        return Err(ParseError::InvalidNumber(input.to_string()));
    }

    u64::from_str_radix(digits, radix).map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow => ParseError::Overflow(input.to_string()),
        _ => ParseError::InvalidNumber(input.to_string()),
    })
}

/// Parse a number with an optional k/m/g suffix
fn parse_scaled(s: &str) -> Result<u64, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    let (digits, multiplier) = split_suffix(trimmed);
    let value = parse_literal(digits, trimmed)?;
    value
        .checked_mul(multiplier)
        .ok_or_else(|| ParseError::Overflow(trimmed.to_string()))
}

/// Parse a flash address
///
/// # Example
/// ```
/// use ftflash_core::parse::parse_address;
/// assert_eq!(parse_address("0x10000").unwrap(), 0x10000);
/// assert_eq!(parse_address("64k").unwrap(), 0x10000);
/// ```
pub fn parse_address(s: &str) -> Result<u32, ParseError> {
    let value = parse_scaled(s)?;
    u32::try_from(value).map_err(|_| ParseError::Overflow(s.trim().to_string()))
}

/// Parse a byte count or whole-chip sentinel
///
/// # Example
/// ```
/// use ftflash_core::parse::{parse_size, Size};
/// assert_eq!(parse_size("4k").unwrap(), Size::Bytes(4096));
/// assert_eq!(parse_size("-1").unwrap(), Size::WholeChip);
/// ```
pub fn parse_size(s: &str) -> Result<Size, ParseError> {
    let trimmed = s.trim();
    if WHOLE_CHIP_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return Ok(Size::WholeChip);
    }

    let value = parse_scaled(trimmed)?;
    usize::try_from(value)
        .map(Size::Bytes)
        .map_err(|_| ParseError::Overflow(trimmed.to_string()))
}

/// Parse a transfer chunk size: an explicit, non-zero byte count
pub fn parse_chunk_size(s: &str) -> Result<usize, ParseError> {
    match parse_size(s)? {
        Size::WholeChip => Err(ParseError::SentinelNotAllowed(s.trim().to_string())),
        Size::Bytes(0) => Err(ParseError::Zero),
        Size::Bytes(n) => Ok(n),
    }
}
