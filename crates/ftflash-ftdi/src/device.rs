//! FTDI MPSSE SPI transport
//!
//! `FtdiSpi` drives one MPSSE channel as a SPI master (mode 0, MSB first)
//! and exposes it to the `spi-flash` command layer as a `FlashAccess`.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use ftdi::{find_by_vid_pid, BitMode, Device};
use spi_flash::FlashAccess;

use crate::error::{FtdiError, Result};
use crate::protocol::*;
use crate::url::{DeviceSelector, FtdiUrl};

/// How long to wait for a transfer's response before giving up
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for opening an FTDI device
#[derive(Debug, Clone)]
pub struct FtdiConfig {
    /// Vendor ID
    pub vendor_id: u16,
    /// Bridge type (determines product ID and channel count)
    pub device_type: FtdiDeviceType,
    /// Interface/channel to use (A, B, C, D)
    pub interface: FtdiInterface,
    /// Chip select index (0 = ADBUS3 ... 4 = ADBUS7)
    pub cs: u8,
    /// Clock divisor (2-65536, must be even)
    /// SPI clock = 60 MHz / divisor
    pub divisor: u32,
}

impl Default for FtdiConfig {
    fn default() -> Self {
        FtdiConfig {
            vendor_id: FTDI_VID,
            device_type: FtdiDeviceType::default(),
            interface: FtdiInterface::default(),
            cs: 0,
            divisor: DEFAULT_DIVISOR as u32,
        }
    }
}

impl FtdiConfig {
    /// Build a configuration from a device URL and chip select
    ///
    /// Empty vendor/product fields are resolved against the attached
    /// bridges.
    pub fn from_url(url: &FtdiUrl, cs: u8) -> Result<Self> {
        if cs_pin(cs).is_none() {
            return Err(FtdiError::InvalidChipSelect(cs));
        }

        let (vendor_id, product_id) = match (url.vendor_id, url.product_id) {
            (Some(vid), Some(pid)) => (vid, pid),
            (vid, pid) => {
                let found = find_first(vid, pid)?;
                log::info!(
                    "Using {} at {:04X}:{:04X}",
                    found.device_type.name(),
                    found.vendor_id,
                    found.product_id
                );
                (found.vendor_id, found.product_id)
            }
        };

        let device_type = FtdiDeviceType::from_product_id(product_id).ok_or_else(|| {
            FtdiError::OpenFailed(format!(
                "product 0x{:04X} is not an MPSSE-capable FTDI bridge",
                product_id
            ))
        })?;

        if url.interface.index() >= device_type.channel_count() {
            return Err(FtdiError::InvalidChannel(format!(
                "Channel {} has no MPSSE on {} (max: {})",
                url.interface.letter(),
                device_type.name(),
                (b'A' + device_type.channel_count() - 1) as char
            )));
        }

        match &url.selector {
            Some(DeviceSelector::Serial(s)) => {
                log::warn!("Serial selector '{}' ignored; opening the first matching bridge", s)
            }
            Some(DeviceSelector::Index(i)) if *i > 0 => {
                log::warn!("Index selector {} ignored; opening the first matching bridge", i)
            }
            _ => {}
        }

        Ok(FtdiConfig {
            vendor_id,
            device_type,
            interface: url.interface,
            cs,
            divisor: DEFAULT_DIVISOR as u32,
        })
    }

    /// Calculate the SPI clock frequency in Hz
    pub fn spi_clock_hz(&self) -> u32 {
        BASE_CLOCK_HZ / self.divisor
    }

    fn cs_bits(&self) -> u8 {
        cs_pin(self.cs).unwrap_or(1 << PIN_CS0)
    }

    fn pindir(&self) -> u8 {
        BASE_PINDIR | self.cs_bits()
    }
}

/// FTDI MPSSE SPI master
pub struct FtdiSpi {
    /// libftdi device context
    device: Device,
    /// Idle state of the low byte (CS high)
    cs_bits: u8,
    /// Pin direction
    pindir: u8,
    /// SPI clock in Hz
    clock_hz: u32,
}

impl FtdiSpi {
    /// Open an FTDI device with the given configuration
    pub fn open(config: &FtdiConfig) -> Result<Self> {
        log::info!(
            "Opening FTDI {} channel {}",
            config.device_type.name(),
            config.interface.letter()
        );

        let vid = config.vendor_id;
        let pid = config.device_type.product_id();
        log::debug!("Looking for FTDI device VID={:04X} PID={:04X}", vid, pid);

        let mut device = find_by_vid_pid(vid, pid)
            .interface(config.interface.to_libftdi())
            .open()
            .map_err(|e| FtdiError::OpenFailed(e.to_string()))?;

        device
            .usb_reset()
            .map_err(|e| FtdiError::ConfigFailed(format!("USB reset failed: {}", e)))?;

        // 2 ms latency keeps small status-register polls fast
        device
            .set_latency_timer(2)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set latency timer failed: {}", e)))?;

        device
            .set_bitmode(0x00, BitMode::Mpsse)
            .map_err(|e| FtdiError::ConfigFailed(format!("Set MPSSE mode failed: {}", e)))?;

        let mut spi = FtdiSpi {
            device,
            cs_bits: config.cs_bits(),
            pindir: config.pindir(),
            clock_hz: config.spi_clock_hz(),
        };
        spi.init_mpsse(config)?;

        log::info!(
            "FTDI configured for SPI at {:.2} MHz, CS on ADBUS{}",
            spi.clock_hz as f64 / 1e6,
            PIN_CS0 + config.cs
        );
        Ok(spi)
    }

    /// SPI clock in Hz
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    fn init_mpsse(&mut self, config: &FtdiConfig) -> Result<()> {
        let divisor_val = config.divisor / 2 - 1;
        let buf = [
            DIS_DIV_5,
            CLK_NO_ADAPTIVE,
            DIS_3_PHASE,
            TCK_DIVISOR,
            (divisor_val & 0xFF) as u8,
            ((divisor_val >> 8) & 0xFF) as u8,
            LOOPBACK_END,
            SET_BITS_LOW,
            self.cs_bits,
            self.pindir,
        ];
        log::debug!(
            "MPSSE init: divisor {} cs_bits=0x{:02X} pindir=0x{:02X}",
            config.divisor,
            self.cs_bits,
            self.pindir
        );
        self.send(&buf)
    }

    fn send(&mut self, data: &[u8]) -> Result<()> {
        self.device
            .write_all(data)
            .map_err(|e| FtdiError::TransferFailed(format!("Write failed: {}", e)))?;
        log::trace!("Sent {} bytes", data.len());
        Ok(())
    }

    fn recv(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        let mut total = 0;
        let start = Instant::now();

        while total < len {
            match self.device.read(&mut buf[total..]) {
                Ok(0) => {
                    if start.elapsed() > READ_TIMEOUT {
                        return Err(FtdiError::TransferFailed(format!(
                            "Read timed out after {} of {} bytes",
                            total, len
                        )));
                    }
                    std::thread::sleep(Duration::from_micros(100));
                }
                Ok(n) => total += n,
                Err(e) => {
                    return Err(FtdiError::TransferFailed(format!("Read failed: {}", e)));
                }
            }
        }

        log::trace!("Received {} bytes", total);
        Ok(buf)
    }

    /// Full-duplex transfer of `data` under one CS assertion
    pub fn transfer(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        if data.is_empty() {
            return Ok(Vec::new());
        }
        let mut buf = Vec::with_capacity(data.len() + 16);
        encode_exchange(&mut buf, data, self.cs_bits, self.pindir);
        self.send(&buf)?;
        self.recv(data.len())
    }

    fn release_pins(&mut self) -> Result<()> {
        self.send(&[SET_BITS_LOW, 0x00, 0x00])
    }
}

impl Drop for FtdiSpi {
    fn drop(&mut self) {
        if let Err(e) = self.release_pins() {
            log::warn!("Failed to release pins on close: {}", e);
        }
    }
}

impl FlashAccess for FtdiSpi {
    fn exchange(&mut self, data: &[u8]) -> anyhow::Result<Vec<u8>> {
        Ok(self.transfer(data)?)
    }
}

/// An attached FTDI bridge
#[derive(Debug, Clone)]
pub struct FtdiDeviceInfo {
    /// USB bus number
    pub bus: u8,
    /// USB device address
    pub address: u8,
    /// Vendor ID
    pub vendor_id: u16,
    /// Product ID
    pub product_id: u16,
    /// Bridge type
    pub device_type: FtdiDeviceType,
    /// Serial number (if available)
    pub serial: Option<String>,
    /// Product string (if available)
    pub description: Option<String>,
}

impl FtdiDeviceInfo {
    /// URLs addressing each MPSSE channel of this bridge
    pub fn urls(&self, index: usize) -> Vec<FtdiUrl> {
        let selector = match &self.serial {
            Some(s) => DeviceSelector::Serial(s.clone()),
            None => DeviceSelector::Index(index),
        };
        (1..=self.device_type.channel_count())
            .filter_map(FtdiInterface::from_number)
            .map(|interface| FtdiUrl {
                vendor_id: Some(self.vendor_id),
                product_id: Some(self.product_id),
                selector: Some(selector.clone()),
                interface,
            })
            .collect()
    }
}

impl std::fmt::Display for FtdiDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at bus {} address {} ({:04X}:{:04X})",
            self.description.as_deref().unwrap_or(self.device_type.name()),
            self.bus,
            self.address,
            self.vendor_id,
            self.product_id
        )?;
        if let Some(serial) = &self.serial {
            write!(f, " serial {}", serial)?;
        }
        Ok(())
    }
}

/// List attached MPSSE-capable FTDI bridges
pub fn list_devices() -> Result<Vec<FtdiDeviceInfo>> {
    let mut devices = Vec::new();

    for dev in nusb::list_devices()? {
        if dev.vendor_id() != FTDI_VID {
            continue;
        }
        if let Some(device_type) = FtdiDeviceType::from_product_id(dev.product_id()) {
            devices.push(FtdiDeviceInfo {
                bus: dev.bus_number(),
                address: dev.device_address(),
                vendor_id: dev.vendor_id(),
                product_id: dev.product_id(),
                device_type,
                serial: dev.serial_number().map(String::from),
                description: dev.product_string().map(String::from),
            });
        }
    }

    log::debug!("Found {} FTDI bridge(s)", devices.len());
    Ok(devices)
}

/// First attached bridge matching the given (partial) IDs
fn find_first(vendor_id: Option<u16>, product_id: Option<u16>) -> Result<FtdiDeviceInfo> {
    list_devices()?
        .into_iter()
        .find(|d| {
            vendor_id.is_none_or(|v| v == d.vendor_id) && product_id.is_none_or(|p| p == d.product_id)
        })
        .ok_or(FtdiError::DeviceNotFound)
}
