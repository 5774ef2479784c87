//! List command implementation

use crate::programmers;

/// List attached FTDI bridges and the URLs that address them
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "ftdi")]
    {
        let devices = ftflash_ftdi::list_devices()?;
        if devices.is_empty() {
            println!("No FTDI bridges found");
        } else {
            println!("FTDI bridges:");
            for (index, dev) in devices.iter().enumerate() {
                println!("  {}", dev);
                for url in dev.urls(index) {
                    println!("    {}", url);
                }
            }
        }
        println!();
    }

    println!("Supported device URLs:");
    for p in programmers::available_programmers() {
        println!("  {:10} {:22} {}", p.scheme, p.example, p.description);
    }
    Ok(())
}
