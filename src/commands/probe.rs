//! Probe command implementation

use super::print_device_info;
use ftflash_core::FlashDevice;

/// Bytes read as a connection test
const PROBE_READ: usize = 256;

/// Bytes shown in the dump
const DUMP_LEN: usize = 64;

/// URLs tried in order when probing without `-u`
pub const FALLBACK_URLS: &[&str] = &[
    "ftdi://ftdi:232h/1",
    "ftdi://ftdi:2232h/1",
    "ftdi://ftdi:4232h/1",
    "ftdi:///1",
];

/// Connect through the first of `urls` that answers
pub fn connect_any<F>(
    urls: &[&str],
    cs: u8,
    mut connect: F,
) -> Result<(String, Box<dyn FlashDevice>), Box<dyn std::error::Error>>
where
    F: FnMut(&str, u8) -> Result<Box<dyn FlashDevice>, Box<dyn std::error::Error>>,
{
    let mut last_error = None;
    for url in urls {
        println!("Connecting to {} (CS {})", url, cs);
        match connect(url, cs) {
            Ok(device) => return Ok((url.to_string(), device)),
            Err(e) => {
                log::warn!("{}: {}", url, e);
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if urls.len() == 1 => Err(e),
        Some(e) => Err(format!("no flash found on {} ({})", urls.join(", "), e).into()),
        None => Err("no device URL to try".into()),
    }
}

/// Format `data` as 16-byte hex/ASCII rows, offsets starting at `base`
fn hex_dump(data: &[u8], base: usize) -> Vec<String> {
    data.chunks(16)
        .enumerate()
        .map(|(row, bytes)| {
            let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            let ascii: String = bytes
                .iter()
                .map(|&b| {
                    if (0x20..0x7F).contains(&b) {
                        b as char
                    } else {
                        '.'
                    }
                })
                .collect();
            format!("  {:04X}: {:<48} {}", base + row * 16, hex.join(" "), ascii)
        })
        .collect()
}

/// Identify the device and show the start of its contents
pub fn run_probe<D: FlashDevice + ?Sized>(device: &mut D) -> Result<(), Box<dyn std::error::Error>> {
    print_device_info(device);

    let len = PROBE_READ.min(device.capacity() as usize);
    let data = device.read(0, len)?;
    println!();
    println!("Read {} bytes from 0x00000000:", data.len());
    for line in hex_dump(&data[..data.len().min(DUMP_LEN)], 0) {
        println!("{}", line);
    }
    Ok(())
}
