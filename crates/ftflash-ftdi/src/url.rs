//! Device URL parsing
//!
//! Bridges are addressed with URLs of the form
//!
//! ```text
//! ftdi://[vendor[:product[:serial|index]]]/interface
//! ```
//!
//! `vendor` is `ftdi` or a hex vendor ID, `product` a bridge name
//! (`232h`, `2232h`, `4232h`, `4233h`) or a hex product ID, and `interface`
//! the 1-based channel number. Empty vendor and product fields match the
//! first attached FTDI bridge, so `ftdi:///1` means "channel A of whatever
//! is plugged in".

use std::fmt;
use std::str::FromStr;

use crate::error::FtdiError;
use crate::protocol::{FtdiDeviceType, FtdiInterface, FTDI_VID};

/// URL scheme for FTDI bridges
pub const SCHEME: &str = "ftdi://";

/// Picks one of several identical bridges
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// USB serial number
    Serial(String),
    /// Position among the matching bridges, starting at 0
    Index(usize),
}

/// A parsed `ftdi://` URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtdiUrl {
    /// Vendor ID, `None` for "any FTDI bridge"
    pub vendor_id: Option<u16>,
    /// Product ID, `None` for "any supported product"
    pub product_id: Option<u16>,
    /// Serial number or index
    pub selector: Option<DeviceSelector>,
    /// Channel
    pub interface: FtdiInterface,
}

impl FtdiUrl {
    /// The bridge type named by the product field, if it is a known one
    pub fn device_type(&self) -> Option<FtdiDeviceType> {
        self.product_id.and_then(FtdiDeviceType::from_product_id)
    }
}

fn invalid(url: &str, reason: impl Into<String>) -> FtdiError {
    FtdiError::InvalidUrl {
        url: url.to_string(),
        reason: reason.into(),
    }
}

fn parse_hex_id(s: &str) -> Option<u16> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).ok()
}

impl FromStr for FtdiUrl {
    type Err = FtdiError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        let rest = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| invalid(url, format!("expected scheme '{}'", SCHEME)))?;

        let (authority, path) = rest
            .split_once('/')
            .ok_or_else(|| invalid(url, "missing /interface"))?;

        let interface = path
            .parse::<u8>()
            .ok()
            .and_then(FtdiInterface::from_number)
            .ok_or_else(|| invalid(url, format!("interface '{}' must be 1-4", path)))?;

        let mut fields = authority.split(':');
        let vendor = fields.next().unwrap_or("");
        let product = fields.next().unwrap_or("");
        let selector = fields.next();
        if fields.next().is_some() {
            return Err(invalid(url, "too many ':' separated fields"));
        }

        let vendor_id = match vendor {
            "" => None,
            v if v.eq_ignore_ascii_case("ftdi") => Some(FTDI_VID),
            v => Some(parse_hex_id(v).ok_or_else(|| invalid(url, format!("unknown vendor '{}'", v)))?),
        };

        let product_id = match product {
            "" => None,
            p => Some(
                FtdiDeviceType::parse(p)
                    .map(|t| t.product_id())
                    .or_else(|| parse_hex_id(p))
                    .ok_or_else(|| invalid(url, format!("unknown product '{}'", p)))?,
            ),
        };

        let selector = match selector {
            None | Some("") => None,
            Some(s) if s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse()
                .ok()
                .map(DeviceSelector::Index),
            Some(s) => Some(DeviceSelector::Serial(s.to_string())),
        };

        Ok(FtdiUrl {
            vendor_id,
            product_id,
            selector,
            interface,
        })
    }
}

impl fmt::Display for FtdiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(SCHEME)?;
        match self.vendor_id {
            Some(FTDI_VID) => f.write_str("ftdi")?,
            Some(vid) => write!(f, "0x{:04x}", vid)?,
            None => {}
        }
        if self.product_id.is_some() || self.selector.is_some() {
            f.write_str(":")?;
            match (self.device_type(), self.product_id) {
                (Some(t), _) => f.write_str(t.url_name())?,
                (None, Some(pid)) => write!(f, "0x{:04x}", pid)?,
                (None, None) => {}
            }
        }
        match &self.selector {
            Some(DeviceSelector::Serial(s)) => write!(f, ":{}", s)?,
            Some(DeviceSelector::Index(i)) => write!(f, ":{}", i)?,
            None => {}
        }
        write!(f, "/{}", self.interface.index() + 1)
    }
}
