//! FTDI MPSSE protocol constants and supported bridges

// ============================================================================
// USB VID/PID constants
// ============================================================================

/// FTDI vendor ID
pub const FTDI_VID: u16 = 0x0403;

/// FT2232H product ID (dual channel)
pub const FTDI_FT2232H_PID: u16 = 0x6010;

/// FT4232H product ID (quad channel)
pub const FTDI_FT4232H_PID: u16 = 0x6011;

/// FT232H product ID (single channel)
pub const FTDI_FT232H_PID: u16 = 0x6014;

/// FT4233H product ID (quad channel)
pub const FTDI_FT4233H_PID: u16 = 0x6041;

// ============================================================================
// MPSSE Commands
// ============================================================================

/// Write bytes, MSB first
pub const MPSSE_DO_WRITE: u8 = 0x10;

/// Read bytes, MSB first
pub const MPSSE_DO_READ: u8 = 0x20;

/// Write on negative clock edge (SPI mode 0)
pub const MPSSE_WRITE_NEG: u8 = 0x01;

/// Set data bits low byte
pub const SET_BITS_LOW: u8 = 0x80;

/// Disable loopback mode
pub const LOOPBACK_END: u8 = 0x85;

/// Set clock divisor
pub const TCK_DIVISOR: u8 = 0x86;

/// Send immediate (flush buffers)
pub const SEND_IMMEDIATE: u8 = 0x87;

/// Disable divide-by-5 prescaler (60 MHz clock)
pub const DIS_DIV_5: u8 = 0x8A;

/// Disable adaptive clocking
pub const CLK_NO_ADAPTIVE: u8 = 0x97;

/// Disable 3-phase clocking
pub const DIS_3_PHASE: u8 = 0x8D;

/// Largest byte count of a single MPSSE data command
pub const MPSSE_MAX_TRANSFER: usize = 65536;

/// Base clock of the 'H' series after DIS_DIV_5
pub const BASE_CLOCK_HZ: u32 = 60_000_000;

/// Default clock divisor (10 MHz at 60 MHz base clock)
pub const DEFAULT_DIVISOR: u16 = 6;

// ============================================================================
// Pin assignments (low byte)
//
// TCK/SK is bit 0.  (clock)
// TDI/DO is bit 1.  (data out)
// TDO/DI is bit 2.  (data in)
// TMS/CS is bit 3.  (chip select 0)
// GPIOL0..3 are bits 4-7 (chip select 1-4)
// ============================================================================

/// Bit position for SK (clock)
pub const PIN_SK: u8 = 0;

/// Bit position for DO (data out / MOSI)
pub const PIN_DO: u8 = 1;

/// Bit position for the first chip select
pub const PIN_CS0: u8 = 3;

/// Highest chip select index (GPIOL3)
pub const MAX_CS: u8 = 4;

/// SK and DO are always outputs
pub const BASE_PINDIR: u8 = (1 << PIN_SK) | (1 << PIN_DO);

/// Pin mask for chip select `cs` (ADBUS3 + cs)
pub fn cs_pin(cs: u8) -> Option<u8> {
    (cs <= MAX_CS).then(|| 1 << (PIN_CS0 + cs))
}

// ============================================================================
// Supported device types
// ============================================================================

/// Supported FTDI bridge types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtdiDeviceType {
    /// FT232H (single channel, 60 MHz)
    #[default]
    Ft232H,
    /// FT2232H (dual channel, 60 MHz)
    Ft2232H,
    /// FT4232H (quad channel, 60 MHz)
    Ft4232H,
    /// FT4233H (quad channel, 60 MHz)
    Ft4233H,
}

impl FtdiDeviceType {
    /// All supported bridges
    pub const ALL: [FtdiDeviceType; 4] = [
        FtdiDeviceType::Ft232H,
        FtdiDeviceType::Ft2232H,
        FtdiDeviceType::Ft4232H,
        FtdiDeviceType::Ft4233H,
    ];

    /// Get the product ID for this device type
    pub fn product_id(&self) -> u16 {
        match self {
            FtdiDeviceType::Ft232H => FTDI_FT232H_PID,
            FtdiDeviceType::Ft2232H => FTDI_FT2232H_PID,
            FtdiDeviceType::Ft4232H => FTDI_FT4232H_PID,
            FtdiDeviceType::Ft4233H => FTDI_FT4233H_PID,
        }
    }

    /// Look up a device type by product ID
    pub fn from_product_id(pid: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.product_id() == pid)
    }

    /// Get the number of MPSSE-capable channels
    pub fn channel_count(&self) -> u8 {
        match self {
            FtdiDeviceType::Ft232H => 1,
            FtdiDeviceType::Ft2232H => 2,
            // Only channels A and B of the quad parts have an MPSSE
            FtdiDeviceType::Ft4232H | FtdiDeviceType::Ft4233H => 2,
        }
    }

    /// Parse a product name as used in device URLs
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "232h" | "ft232h" => Some(FtdiDeviceType::Ft232H),
            "2232h" | "ft2232h" => Some(FtdiDeviceType::Ft2232H),
            "4232h" | "ft4232h" => Some(FtdiDeviceType::Ft4232H),
            "4233h" | "ft4233h" => Some(FtdiDeviceType::Ft4233H),
            _ => None,
        }
    }

    /// Get the name of this device type
    pub fn name(&self) -> &'static str {
        match self {
            FtdiDeviceType::Ft232H => "FT232H",
            FtdiDeviceType::Ft2232H => "FT2232H",
            FtdiDeviceType::Ft4232H => "FT4232H",
            FtdiDeviceType::Ft4233H => "FT4233H",
        }
    }

    /// Product token used in device URLs
    pub fn url_name(&self) -> &'static str {
        match self {
            FtdiDeviceType::Ft232H => "232h",
            FtdiDeviceType::Ft2232H => "2232h",
            FtdiDeviceType::Ft4232H => "4232h",
            FtdiDeviceType::Ft4233H => "4233h",
        }
    }
}

/// FTDI interface/channel selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FtdiInterface {
    /// Channel A (default)
    #[default]
    A,
    /// Channel B
    B,
    /// Channel C
    C,
    /// Channel D
    D,
}

impl FtdiInterface {
    /// Map a 1-based URL interface number to a channel
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(FtdiInterface::A),
            2 => Some(FtdiInterface::B),
            3 => Some(FtdiInterface::C),
            4 => Some(FtdiInterface::D),
            _ => None,
        }
    }

    /// Get the interface index (0-3)
    pub fn index(&self) -> u8 {
        match self {
            FtdiInterface::A => 0,
            FtdiInterface::B => 1,
            FtdiInterface::C => 2,
            FtdiInterface::D => 3,
        }
    }

    /// Get the channel letter
    pub fn letter(&self) -> char {
        (b'A' + self.index()) as char
    }

    pub(crate) fn to_libftdi(self) -> ftdi::Interface {
        match self {
            FtdiInterface::A => ftdi::Interface::A,
            FtdiInterface::B => ftdi::Interface::B,
            FtdiInterface::C => ftdi::Interface::C,
            FtdiInterface::D => ftdi::Interface::D,
        }
    }
}

/// Append one full-duplex transfer to `buf`: CS low, clock out `data` while
/// capturing MISO, CS high, flush.
///
/// Transfers longer than one MPSSE command are split into several commands
/// inside the same CS assertion.
pub fn encode_exchange(buf: &mut Vec<u8>, data: &[u8], cs_bits: u8, pindir: u8) {
    // Assert CS
    buf.extend_from_slice(&[SET_BITS_LOW, 0x00, pindir]);

    for segment in data.chunks(MPSSE_MAX_TRANSFER) {
        let n = segment.len() - 1;
        buf.push(MPSSE_DO_WRITE | MPSSE_DO_READ | MPSSE_WRITE_NEG);
        buf.push((n & 0xFF) as u8);
        buf.push(((n >> 8) & 0xFF) as u8);
        buf.extend_from_slice(segment);
    }

    // Deassert CS
    buf.extend_from_slice(&[SET_BITS_LOW, cs_bits, pindir]);
    buf.push(SEND_IMMEDIATE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cs_pin_mapping() {
        assert_eq!(cs_pin(0), Some(0x08));
        assert_eq!(cs_pin(1), Some(0x10));
        assert_eq!(cs_pin(4), Some(0x80));
        assert_eq!(cs_pin(5), None);
    }

    #[test]
    fn test_device_type_lookup() {
        assert_eq!(FtdiDeviceType::parse("232H"), Some(FtdiDeviceType::Ft232H));
        assert_eq!(FtdiDeviceType::parse("ft4232h"), Some(FtdiDeviceType::Ft4232H));
        assert_eq!(FtdiDeviceType::parse("232"), None);
        assert_eq!(
            FtdiDeviceType::from_product_id(0x6010),
            Some(FtdiDeviceType::Ft2232H)
        );
        for t in FtdiDeviceType::ALL {
            assert_eq!(FtdiDeviceType::parse(t.url_name()), Some(t));
        }
    }

    #[test]
    fn test_interface_numbers() {
        assert_eq!(FtdiInterface::from_number(1), Some(FtdiInterface::A));
        assert_eq!(FtdiInterface::from_number(4), Some(FtdiInterface::D));
        assert_eq!(FtdiInterface::from_number(0), None);
        assert_eq!(FtdiInterface::C.letter(), 'C');
    }

    #[test]
    fn test_encode_exchange() {
        let mut buf = Vec::new();
        encode_exchange(&mut buf, &[0x9F, 0, 0, 0], 0x08, 0x0B);
        assert_eq!(
            buf,
            vec![
                0x80, 0x00, 0x0B, // CS low
                0x31, 0x03, 0x00, 0x9F, 0, 0, 0, // 4 bytes full duplex
                0x80, 0x08, 0x0B, // CS high
                0x87,
            ]
        );
    }

    #[test]
    fn test_encode_exchange_splits_long_transfers() {
        let data = vec![0u8; MPSSE_MAX_TRANSFER + 10];
        let mut buf = Vec::new();
        encode_exchange(&mut buf, &data, 0x08, 0x0B);

        // Two data commands inside one CS assertion
        assert_eq!(&buf[3..6], &[0x31, 0xFF, 0xFF]);
        let second = 6 + MPSSE_MAX_TRANSFER;
        assert_eq!(&buf[second..second + 3], &[0x31, 0x09, 0x00]);
        assert_eq!(buf.len(), 3 + 3 + MPSSE_MAX_TRANSFER + 3 + 10 + 3 + 1);
    }
}
