//! Chunked read/write/erase over a [`FlashDevice`]
//!
//! Every operation validates the requested range against the device
//! capacity before touching the device, then walks the range in fixed-size
//! chunks, reporting progress after each one. The first device error aborts
//! the operation; nothing is retried.

use crate::device::{EraseLength, FlashDevice};
use crate::error::{Error, Result};
use crate::progress::{Phase, Progress};

/// Default transfer chunk size (4 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// One chunk of a larger range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Absolute flash address of the chunk
    pub address: u32,
    /// Offset of the chunk from the start of the range
    pub offset: usize,
    /// Length of the chunk in bytes
    pub len: usize,
}

/// Iterator splitting `address..address+len` into chunks of at most `chunk_size`
///
/// The final chunk is clipped to the remaining byte count, so the chunk
/// lengths always sum to `len`.
#[derive(Debug, Clone)]
pub struct Chunks {
    start: u64,
    len: usize,
    offset: usize,
    chunk_size: usize,
}

impl Chunks {
    /// Create a chunk iterator; `chunk_size` must be non-zero
    pub fn new(address: u32, len: usize, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidChunkSize);
        }
        Ok(Self {
            start: address as u64,
            len,
            offset: 0,
            chunk_size,
        })
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.offset >= self.len {
            return None;
        }
        let len = self.chunk_size.min(self.len - self.offset);
        let chunk = Chunk {
            address: (self.start + self.offset as u64) as u32,
            offset: self.offset,
            len,
        };
        self.offset += len;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.offset).div_ceil(self.chunk_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Chunks {}

/// Reject `address..address+len` if it does not fit in `capacity` bytes
pub fn check_range(capacity: u32, address: u32, len: usize) -> Result<()> {
    let fits = (address as u64)
        .checked_add(len as u64)
        .is_some_and(|end| end <= capacity as u64);
    if !fits {
        return Err(Error::OutOfRange {
            address,
            len,
            capacity,
            available: (capacity as u64).saturating_sub(address as u64),
        });
    }
    Ok(())
}

/// Whether `address` is a multiple of `block`
pub fn is_aligned(address: u32, block: u32) -> bool {
    block == 0 || address % block == 0
}

/// Round `address` down to a multiple of `block`
pub fn align_down(address: u32, block: u32) -> u32 {
    if block == 0 {
        address
    } else {
        address - address % block
    }
}

/// Round `len` up to whole erase blocks
///
/// ```
/// use ftflash_core::ops::erase_span;
/// assert_eq!(erase_span(5000, 4096), 8192);
/// assert_eq!(erase_span(4096, 4096), 4096);
/// ```
pub fn erase_span(len: usize, block: usize) -> usize {
    if block == 0 {
        len
    } else {
        len.div_ceil(block) * block
    }
}

/// Run `op` between `progress.start` and `progress.finish`
fn with_progress<P, T, F>(progress: &mut P, phase: Phase, total: Option<usize>, op: F) -> Result<T>
where
    P: Progress + ?Sized,
    F: FnOnce(&mut P) -> Result<T>,
{
    progress.start(phase, total);
    let result = op(progress);
    progress.finish(result.is_ok());
    result
}

/// Read `len` bytes starting at `address`, `chunk_size` bytes at a time
pub fn read_range<D, P>(
    device: &mut D,
    address: u32,
    len: usize,
    chunk_size: usize,
    progress: &mut P,
) -> Result<Vec<u8>>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    check_range(device.capacity(), address, len)?;
    let chunks = Chunks::new(address, len, chunk_size)?;

    with_progress(progress, Phase::Reading, Some(len), |progress| {
        let mut data = Vec::with_capacity(len);
        for chunk in chunks {
            let buf = device.read(chunk.address, chunk.len)?;
            if buf.len() != chunk.len {
                return Err(Error::ShortRead {
                    address: chunk.address,
                    expected: chunk.len,
                    got: buf.len(),
                });
            }
            data.extend_from_slice(&buf);
            progress.advance(chunk.offset + chunk.len);
        }
        Ok(data)
    })
}

/// Program `data` starting at `address`, `chunk_size` bytes at a time
///
/// The target range must already be erased.
pub fn write_range<D, P>(
    device: &mut D,
    address: u32,
    data: &[u8],
    chunk_size: usize,
    progress: &mut P,
) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    check_range(device.capacity(), address, data.len())?;
    let chunks = Chunks::new(address, data.len(), chunk_size)?;

    with_progress(progress, Phase::Writing, Some(data.len()), |progress| {
        for chunk in chunks {
            device.write(chunk.address, &data[chunk.offset..chunk.offset + chunk.len])?;
            progress.advance(chunk.offset + chunk.len);
        }
        Ok(())
    })
}

/// Erase `len` bytes starting at `address`, one erase block at a time
///
/// An unaligned `address` only produces a warning: the device erases every
/// block the range touches.
pub fn erase_range<D, P>(device: &mut D, address: u32, len: usize, progress: &mut P) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    check_range(device.capacity(), address, len)?;
    let block = device.erase_block_size();
    if !is_aligned(address, block) {
        log::warn!(
            "Address 0x{:X} is not aligned to the {} byte erase block (aligned: 0x{:X})",
            address,
            block,
            align_down(address, block)
        );
    }
    let chunks = Chunks::new(address, len, block as usize)?;

    with_progress(progress, Phase::Erasing, Some(len), |progress| {
        for chunk in chunks {
            device.erase(chunk.address, EraseLength::Bytes(chunk.len as u32))?;
            progress.advance(chunk.offset + chunk.len);
        }
        Ok(())
    })
}

/// Erase the entire device with a single chip-erase command
pub fn erase_chip<D, P>(device: &mut D, progress: &mut P) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    with_progress(progress, Phase::Erasing, None, |_| {
        device.erase(0, EraseLength::WholeChip)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use crate::testutil::MemFlash;

    /// Records every progress callback
    #[derive(Default)]
    struct RecordingProgress {
        phases: Vec<(Phase, Option<usize>)>,
        positions: Vec<usize>,
        finished: Vec<bool>,
    }

    impl Progress for RecordingProgress {
        fn start(&mut self, phase: Phase, total: Option<usize>) {
            self.phases.push((phase, total));
        }
        fn advance(&mut self, done: usize) {
            self.positions.push(done);
        }
        fn finish(&mut self, ok: bool) {
            self.finished.push(ok);
        }
    }

    fn small_flash() -> MemFlash {
        MemFlash::new(64 * 1024, 4096)
    }

    #[test]
    fn test_chunks_sum_to_total() {
        for &(total, chunk_size) in &[
            (0usize, 1usize),
            (1, 1),
            (1, 4096),
            (4095, 4096),
            (4096, 4096),
            (4097, 4096),
            (10_000, 3),
            (65_536, 256),
            (123_457, 1000),
        ] {
            let chunks: Vec<_> = Chunks::new(0x100, total, chunk_size).unwrap().collect();
            let sum: usize = chunks.iter().map(|c| c.len).sum();
            assert_eq!(sum, total, "total={} chunk={}", total, chunk_size);
            assert!(chunks.iter().all(|c| c.len > 0 && c.len <= chunk_size));
            assert_eq!(chunks.len(), total.div_ceil(chunk_size));

            // Chunks are contiguous
            let mut expected_offset = 0;
            for c in &chunks {
                assert_eq!(c.offset, expected_offset);
                assert_eq!(c.address, 0x100 + c.offset as u32);
                expected_offset += c.len;
            }
        }
    }

    #[test]
    fn test_chunks_clip_final_chunk() {
        let chunks: Vec<_> = Chunks::new(0, 10_000, 4096).unwrap().collect();
        let lens: Vec<_> = chunks.iter().map(|c| c.len).collect();
        assert_eq!(lens, vec![4096, 4096, 1808]);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(matches!(Chunks::new(0, 10, 0), Err(Error::InvalidChunkSize)));
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(0x1_0000, 0, 0x1_0000).is_ok());
        assert!(check_range(0x1_0000, 0xF000, 0x1000).is_ok());
        assert!(check_range(0x1_0000, 0x1_0000, 0).is_ok());
        match check_range(0x1_0000, 0xF000, 0x1001) {
            Err(Error::OutOfRange { available, .. }) => assert_eq!(available, 0x1000),
            other => panic!("unexpected {:?}", other),
        }
        match check_range(0x1_0000, 0x2_0000, 1) {
            Err(Error::OutOfRange { available, .. }) => assert_eq!(available, 0),
            other => panic!("unexpected {:?}", other),
        }
        // No overflow near the top of the address space
        assert!(check_range(u32::MAX, u32::MAX, usize::MAX).is_err());
        match check_range(0x1_0000, 1, usize::MAX) {
            Err(Error::OutOfRange { available, .. }) => assert_eq!(available, 0xFFFF),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_alignment_helpers() {
        assert!(is_aligned(0x2000, 4096));
        assert!(!is_aligned(0x2001, 4096));
        assert_eq!(align_down(0x2FFF, 4096), 0x2000);
        assert_eq!(erase_span(1, 4096), 4096);
        assert_eq!(erase_span(0, 4096), 0);
        assert_eq!(erase_span(8193, 4096), 12288);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let mut flash = small_flash();
        let data: Vec<u8> = (0..10_000u32).map(|i| (i * 7) as u8).collect();

        write_range(&mut flash, 0x1000, &data, 4096, &mut NoProgress).unwrap();
        let back = read_range(&mut flash, 0x1000, data.len(), 1000, &mut NoProgress).unwrap();
        assert_eq!(back, data);
        assert_eq!(flash.writes, 3);
    }

    #[test]
    fn test_progress_reported_after_every_chunk() {
        let mut flash = small_flash();
        let mut progress = RecordingProgress::default();

        read_range(&mut flash, 0, 10_000, 4096, &mut progress).unwrap();
        assert_eq!(progress.phases, vec![(Phase::Reading, Some(10_000))]);
        assert_eq!(progress.positions, vec![4096, 8192, 10_000]);
        assert_eq!(progress.finished, vec![true]);
    }

    #[test]
    fn test_out_of_range_rejected_before_io() {
        let mut flash = small_flash();
        let mut progress = RecordingProgress::default();

        let err = read_range(&mut flash, 0xF000, 0x2000, 4096, &mut progress).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
        let err = write_range(&mut flash, 0xFFFF, &[0u8; 2], 4096, &mut progress).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));
        let err = erase_range(&mut flash, 0x1_0000, 1, &mut progress).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { .. }));

        assert_eq!(flash.total_calls(), 0);
        assert!(progress.phases.is_empty());
    }

    #[test]
    fn test_erase_range_uses_erase_blocks() {
        let mut flash = MemFlash::filled(64 * 1024, 4096, 0x00);
        let mut progress = RecordingProgress::default();

        erase_range(&mut flash, 0x2000, 0x3000, &mut progress).unwrap();
        assert_eq!(flash.erases, 3);
        assert_eq!(progress.positions, vec![0x1000, 0x2000, 0x3000]);
        assert!(flash.data[0x2000..0x5000].iter().all(|&b| b == 0xFF));
        assert!(flash.data[..0x2000].iter().all(|&b| b == 0));
        assert!(flash.data[0x5000..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_erase_chip() {
        let mut flash = MemFlash::filled(64 * 1024, 4096, 0x55);
        let mut progress = RecordingProgress::default();

        erase_chip(&mut flash, &mut progress).unwrap();
        assert_eq!(progress.phases, vec![(Phase::Erasing, None)]);
        assert!(flash.data.iter().all(|&b| b == 0xFF));
        assert_eq!(flash.erases, 1);
    }

    #[test]
    fn test_device_error_aborts_without_retry() {
        let mut flash = small_flash();
        flash.fail_after(1);
        let mut progress = RecordingProgress::default();

        let err = read_range(&mut flash, 0, 4 * 4096, 4096, &mut progress).unwrap_err();
        assert!(matches!(err, Error::Device(_)));
        // One successful chunk, one failed chunk, nothing after that
        assert_eq!(flash.reads, 2);
        assert_eq!(progress.positions, vec![4096]);
        assert_eq!(progress.finished, vec![false]);
    }
}
