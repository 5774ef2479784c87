//! SPI NOR flash behind an FTDI bridge

use spi_flash::{Flash, FlashID, FlashParams};

use ftflash_core::ops::align_down;
use ftflash_core::{DeviceInfo, EraseLength, FlashDevice};

use crate::device::FtdiSpi;
use crate::error::{FtdiError, Result};

/// Fallback geometry for chips without an SFDP table
const DEFAULT_PAGE_SIZE: usize = 256;
const DEFAULT_ERASE_SIZE: usize = 4096;
const DEFAULT_ERASE_OPCODE: u8 = 0x20;

/// Enter 4-byte address mode
const EN4B: u8 = 0xB7;

/// Largest capacity reachable with 3-byte addresses
const THREE_BYTE_LIMIT: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy)]
struct Geometry {
    capacity: usize,
    page_size: usize,
    erase_size: usize,
    erase_opcode: u8,
    address_bytes: u8,
}

/// Capacity from the JEDEC density byte (2^n bytes), for chips without SFDP
fn capacity_from_id(id: &FlashID) -> Option<usize> {
    let density = (id.device_id_long & 0xFF) as u32;
    (0x10..=0x1F).contains(&density).then(|| 1usize << density)
}

/// A flash chip identified over an [`FtdiSpi`] bus
pub struct SpiFlash {
    spi: FtdiSpi,
    id: FlashID,
    geometry: Geometry,
}

impl SpiFlash {
    /// Identify the chip and read its parameters
    pub fn probe(mut spi: FtdiSpi) -> Result<Self> {
        let (id, geometry) = Self::identify(&mut spi)?;
        Ok(SpiFlash { spi, id, geometry })
    }

    fn identify(spi: &mut FtdiSpi) -> Result<(FlashID, Geometry)> {
        let mut flash = Flash::new(spi);

        let id = flash.read_id()?;
        log::info!("Found flash: {}", id);

        let params: Option<FlashParams> = match flash.read_params() {
            Ok(params) => params,
            Err(spi_flash::Error::Access(e)) => return Err(spi_flash::Error::Access(e).into()),
            Err(e) => {
                log::warn!("Ignoring unusable SFDP table: {}", e);
                None
            }
        };

        if params.is_none() {
            let capacity = capacity_from_id(&id).ok_or(FtdiError::UnknownCapacity)?;
            log::warn!(
                "No SFDP parameters, assuming {} bytes from the JEDEC ID with {} byte sectors",
                capacity,
                DEFAULT_ERASE_SIZE
            );
            flash.set_capacity(capacity);
            flash.set_page_size(DEFAULT_PAGE_SIZE);
            flash.set_erase_size(DEFAULT_ERASE_SIZE);
            flash.set_erase_opcode(DEFAULT_ERASE_OPCODE);
        }

        let capacity = flash.capacity().ok_or(FtdiError::UnknownCapacity)?;
        if capacity > u32::MAX as usize {
            return Err(FtdiError::UnknownCapacity);
        }
        if capacity > THREE_BYTE_LIMIT && flash.address_bytes() < 4 {
            log::debug!("Switching to 4-byte addressing");
            flash.command(EN4B)?;
            flash.set_address_bytes(4);
        }

        let geometry = Geometry {
            capacity,
            page_size: flash.page_size().unwrap_or(DEFAULT_PAGE_SIZE),
            erase_size: flash.erase_size().unwrap_or(DEFAULT_ERASE_SIZE),
            erase_opcode: flash.erase_opcode(),
            address_bytes: flash.address_bytes(),
        };
        log::debug!("Flash geometry: {:?}", geometry);
        Ok((id, geometry))
    }

    /// JEDEC identification read at probe time
    pub fn id(&self) -> &FlashID {
        &self.id
    }

    /// A command-layer handle configured with the probed geometry
    fn flash(&mut self) -> Flash<'_, FtdiSpi> {
        let g = self.geometry;
        let mut flash = Flash::new(&mut self.spi);
        flash.set_capacity(g.capacity);
        flash.set_page_size(g.page_size);
        flash.set_erase_size(g.erase_size);
        flash.set_erase_opcode(g.erase_opcode);
        flash.set_address_bytes(g.address_bytes);
        flash
    }

    fn erase_sectors(&mut self, address: u32, len: u32) -> Result<()> {
        let g = self.geometry;
        let sector = g.erase_size as u64;
        let start = align_down(address, g.erase_size as u32) as u64;
        let end = address as u64 + len as u64;

        let mut flash = self.flash();
        let mut addr = start;
        while addr < end {
            log::trace!("Erasing sector at 0x{:08X}", addr);
            let bytes = (addr as u32).to_be_bytes();
            flash.write_enable()?;
            flash.write(g.erase_opcode, &bytes[4 - g.address_bytes as usize..])?;
            flash.wait_while_busy()?;
            addr += sector;
        }
        Ok(())
    }

    fn program(&mut self, address: u32, data: &[u8]) -> Result<()> {
        let page_size = self.geometry.page_size;
        let mut flash = self.flash();

        // Page program wraps within a page, so never cross a boundary
        let mut offset = 0;
        while offset < data.len() {
            let addr = address + offset as u32;
            let room = page_size - (addr as usize % page_size);
            let n = room.min(data.len() - offset);
            flash.page_program(addr, &data[offset..offset + n])?;
            offset += n;
        }
        Ok(())
    }
}

impl FlashDevice for SpiFlash {
    fn capacity(&self) -> u32 {
        self.geometry.capacity as u32
    }

    fn erase_block_size(&self) -> u32 {
        self.geometry.erase_size as u32
    }

    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            description: self.id.to_string(),
            capacity: self.capacity(),
            erase_block_size: self.erase_block_size(),
            page_size: self.geometry.page_size as u32,
            spi_frequency_hz: Some(self.spi.clock_hz()),
        }
    }

    fn read(&mut self, address: u32, len: usize) -> ftflash_core::Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        let data = self.flash().read(address, len).map_err(FtdiError::from)?;
        Ok(data)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> ftflash_core::Result<()> {
        Ok(self.program(address, data)?)
    }

    fn erase(&mut self, address: u32, len: EraseLength) -> ftflash_core::Result<()> {
        match len {
            EraseLength::WholeChip => {
                log::debug!("Chip erase");
                self.flash().erase().map_err(FtdiError::from)?;
            }
            EraseLength::Bytes(0) => {}
            EraseLength::Bytes(n) => self.erase_sectors(address, n)?,
        }
        Ok(())
    }

    fn unlock(&mut self) -> ftflash_core::Result<()> {
        self.flash().unprotect().map_err(FtdiError::from)?;
        Ok(())
    }
}
