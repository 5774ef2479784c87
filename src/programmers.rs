//! Backend registration and dispatch
//!
//! Backends are selected by the scheme of the device URL and can be
//! compiled out with cargo features.

use ftflash_core::FlashDevice;

/// Information about a backend
pub struct ProgrammerInfo {
    /// URL scheme (used for matching)
    pub scheme: &'static str,
    /// Example URL
    pub example: &'static str,
    /// Short description
    pub description: &'static str,
}

/// Get information about all backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "ftdi")]
    programmers.push(ProgrammerInfo {
        scheme: "ftdi://",
        example: "ftdi://ftdi:232h/1",
        description: "FTDI MPSSE bridge (FT232H/FT2232H/FT4232H/FT4233H)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        scheme: "dummy://",
        example: "dummy://16m",
        description: "In-memory flash emulator for dry runs",
    });

    programmers
}

/// Generate a short list of URL schemes for messages
pub fn scheme_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.scheme).collect();
    names.join(", ")
}

/// Parse the optional size of a `dummy://[size]` URL
#[cfg(feature = "dummy")]
fn dummy_capacity(size: &str) -> Result<u32, Box<dyn std::error::Error>> {
    use ftflash_core::parse::parse_size;
    use ftflash_core::Size;

    if size.is_empty() {
        return Ok(ftflash_dummy::DummyConfig::default().capacity);
    }
    match parse_size(size)? {
        Size::Bytes(n) if n > 0 => {
            u32::try_from(n).map_err(|_| format!("dummy size '{}' is too large", size).into())
        }
        _ => Err(format!("dummy size '{}' must be a positive byte count", size).into()),
    }
}

/// Connect to the device named by `url`
///
/// `cs` is the chip select index; backends without chip selects ignore it.
#[allow(unused_variables)]
pub fn connect(url: &str, cs: u8) -> Result<Box<dyn FlashDevice>, Box<dyn std::error::Error>> {
    #[cfg(feature = "ftdi")]
    if url.starts_with(ftflash_ftdi::SCHEME) {
        let flash = ftflash_ftdi::connect(url, cs)?;
        return Ok(Box::new(flash));
    }

    #[cfg(feature = "dummy")]
    if let Some(size) = url.strip_prefix("dummy://") {
        use ftflash_dummy::{DummyConfig, DummyFlash};

        let capacity = dummy_capacity(size)?;
        log::info!("Using in-memory dummy flash of {} bytes", capacity);
        return Ok(Box::new(DummyFlash::new(DummyConfig::with_capacity(capacity))));
    }

    Err(format!(
        "Unsupported device URL '{}' [available: {}]",
        url,
        scheme_names_short()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_dummy() {
        let flash = connect("dummy://", 0).unwrap();
        assert_eq!(flash.capacity(), 16 * 1024 * 1024);

        let flash = connect("dummy://64k", 0).unwrap();
        assert_eq!(flash.capacity(), 64 * 1024);
        assert_eq!(flash.erase_block_size(), 4096);
    }

    #[test]
    fn test_connect_rejects_bad_urls() {
        assert!(connect("dummy://0", 0).is_err());
        assert!(connect("dummy://all", 0).is_err());
        assert!(connect("dummy://8g", 0).is_err());
        assert!(connect("spidev:///dev/spidev0.0", 0).is_err());
    }

    #[test]
    fn test_available_programmers() {
        let schemes = scheme_names_short();
        assert!(schemes.contains("dummy://"));
        assert!(schemes.contains("ftdi://"));
    }
}
