//! In-memory fake used by the unit tests of this crate

use crate::device::{EraseLength, FlashDevice, ERASED_BYTE};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::io;

pub(crate) struct MemFlash {
    pub data: Vec<u8>,
    pub block: u32,
    pub reads: usize,
    pub writes: usize,
    pub erases: usize,
    /// Number of operations allowed to succeed before every call fails
    fail_after: Option<usize>,
    /// Readback corruption, applied on read only
    corrupt: BTreeMap<usize, u8>,
    /// Cap on the bytes returned by a single read
    read_limit: Option<usize>,
}

impl MemFlash {
    pub fn new(capacity: usize, block: u32) -> Self {
        Self::filled(capacity, block, ERASED_BYTE)
    }

    pub fn filled(capacity: usize, block: u32, byte: u8) -> Self {
        Self {
            data: vec![byte; capacity],
            block,
            reads: 0,
            writes: 0,
            erases: 0,
            fail_after: None,
            corrupt: BTreeMap::new(),
            read_limit: None,
        }
    }

    pub fn total_calls(&self) -> usize {
        self.reads + self.writes + self.erases
    }

    pub fn fail_after(&mut self, ops: usize) {
        self.fail_after = Some(ops);
    }

    pub fn corrupt_readback(&mut self, offset: usize, xor: u8) {
        self.corrupt.insert(offset, xor);
    }

    pub fn truncate_reads(&mut self, limit: usize) {
        self.read_limit = Some(limit);
    }

    fn tick(&mut self) -> Result<()> {
        match self.fail_after {
            Some(0) => Err(Error::device(io::Error::other("injected failure"))),
            Some(ref mut n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl FlashDevice for MemFlash {
    fn capacity(&self) -> u32 {
        self.data.len() as u32
    }

    fn erase_block_size(&self) -> u32 {
        self.block
    }

    fn read(&mut self, address: u32, len: usize) -> Result<Vec<u8>> {
        self.reads += 1;
        self.tick()?;
        let start = address as usize;
        let mut buf = self.data[start..start + len].to_vec();
        for (&offset, &xor) in self.corrupt.range(start..start + len) {
            buf[offset - start] ^= xor;
        }
        if let Some(limit) = self.read_limit {
            buf.truncate(limit);
        }
        Ok(buf)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<()> {
        self.writes += 1;
        self.tick()?;
        let start = address as usize;
        for (dst, src) in self.data[start..start + data.len()].iter_mut().zip(data) {
            *dst &= *src;
        }
        Ok(())
    }

    fn erase(&mut self, address: u32, len: EraseLength) -> Result<()> {
        self.erases += 1;
        self.tick()?;
        let block = self.block as usize;
        let (start, end) = match len {
            EraseLength::WholeChip => (0, self.data.len()),
            EraseLength::Bytes(n) => {
                let start = address as usize / block * block;
                let end = (address as usize + n as usize).div_ceil(block) * block;
                (start, end.min(self.data.len()))
            }
        };
        self.data[start..end].fill(ERASED_BYTE);
        Ok(())
    }

    fn unlock(&mut self) -> Result<()> {
        Ok(())
    }
}
