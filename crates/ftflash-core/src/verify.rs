//! Read-back verification

use crate::device::{FlashDevice, ERASED_BYTE};
use crate::error::{Error, Result};
use crate::ops::{check_range, Chunk, Chunks};
use crate::progress::{Phase, Progress};

/// Result of a failed comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Offset of the first differing byte
    pub first_offset: usize,
    /// Number of differing bytes
    pub count: usize,
}

impl Mismatch {
    /// Fold the mismatches of a later chunk (at `offset`) into this one
    fn merge(acc: Option<Mismatch>, chunk: Option<Mismatch>, offset: usize) -> Option<Mismatch> {
        match (acc, chunk) {
            (acc, None) => acc,
            (None, Some(m)) => Some(Mismatch {
                first_offset: offset + m.first_offset,
                count: m.count,
            }),
            (Some(a), Some(m)) => Some(Mismatch {
                first_offset: a.first_offset,
                count: a.count + m.count,
            }),
        }
    }
}

/// Compare a read-back buffer with the expected bytes
///
/// Returns `None` when they are identical. Extra bytes in the longer buffer
/// count as mismatches.
pub fn compare(actual: &[u8], expected: &[u8]) -> Option<Mismatch> {
    let common = actual.len().min(expected.len());
    let mut first = None;
    let mut count = actual.len().max(expected.len()) - common;

    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        if a != e {
            first.get_or_insert(i);
            count += 1;
        }
    }

    if count == 0 {
        return None;
    }
    Some(Mismatch {
        first_offset: first.unwrap_or(common),
        count,
    })
}

/// Find bytes that are not [`ERASED_BYTE`]
pub fn count_non_erased(actual: &[u8]) -> Option<Mismatch> {
    let mut iter = actual
        .iter()
        .enumerate()
        .filter(|&(_, &b)| b != ERASED_BYTE);
    let (first_offset, _) = iter.next()?;
    Some(Mismatch {
        first_offset,
        count: 1 + iter.count(),
    })
}

fn verify_with<D, P, F>(
    device: &mut D,
    address: u32,
    len: usize,
    chunk_size: usize,
    progress: &mut P,
    mut check: F,
) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
    F: FnMut(&[u8], Chunk) -> Option<Mismatch>,
{
    check_range(device.capacity(), address, len)?;
    let chunks = Chunks::new(address, len, chunk_size)?;

    progress.start(Phase::Verifying, Some(len));
    let mut mismatch = None;
    for chunk in chunks {
        let actual = match device.read(chunk.address, chunk.len) {
            Ok(buf) => buf,
            Err(e) => {
                progress.finish(false);
                return Err(e);
            }
        };
        if actual.len() != chunk.len {
            progress.finish(false);
            return Err(Error::ShortRead {
                address: chunk.address,
                expected: chunk.len,
                got: actual.len(),
            });
        }
        mismatch = Mismatch::merge(mismatch, check(&actual, chunk), chunk.offset);
        progress.advance(chunk.offset + chunk.len);
    }
    progress.finish(mismatch.is_none());

    match mismatch {
        None => Ok(()),
        Some(m) => {
            log::debug!("{} mismatching bytes starting at offset {:#x}", m.count, m.first_offset);
            Err(Error::Verify {
                first_offset: m.first_offset,
                address: address + m.first_offset as u32,
                count: m.count,
            })
        }
    }
}

/// Read back `address..address+expected.len()` and compare with `expected`
pub fn verify_data<D, P>(
    device: &mut D,
    address: u32,
    expected: &[u8],
    chunk_size: usize,
    progress: &mut P,
) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    verify_with(
        device,
        address,
        expected.len(),
        chunk_size,
        progress,
        |actual, chunk| compare(actual, &expected[chunk.offset..chunk.offset + chunk.len]),
    )
}

/// Check that every byte of `address..address+len` reads back erased
pub fn verify_erased<D, P>(
    device: &mut D,
    address: u32,
    len: usize,
    chunk_size: usize,
    progress: &mut P,
) -> Result<()>
where
    D: FlashDevice + ?Sized,
    P: Progress + ?Sized,
{
    verify_with(device, address, len, chunk_size, progress, |actual, _| {
        count_non_erased(actual)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::write_range;
    use crate::progress::NoProgress;
    use crate::testutil::MemFlash;

    fn flash() -> MemFlash {
        MemFlash::new(64 * 1024, 4096)
    }

    #[test]
    fn test_compare() {
        assert_eq!(compare(b"abcd", b"abcd"), None);
        assert_eq!(
            compare(b"abXdYf", b"abcdef"),
            Some(Mismatch {
                first_offset: 2,
                count: 2
            })
        );
        // Length difference counts
        assert_eq!(
            compare(b"ab", b"abcd"),
            Some(Mismatch {
                first_offset: 2,
                count: 2
            })
        );
    }

    #[test]
    fn test_count_non_erased() {
        assert_eq!(count_non_erased(&[0xFF; 16]), None);
        assert_eq!(count_non_erased(&[]), None);
        assert_eq!(
            count_non_erased(&[0xFF, 0xFF, 0x7F, 0xFF, 0x00]),
            Some(Mismatch {
                first_offset: 2,
                count: 2
            })
        );
    }

    #[test]
    fn test_verify_data_passes_after_write() {
        let mut flash = flash();
        let data: Vec<u8> = (0..9000u32).map(|i| (i % 251) as u8).collect();
        write_range(&mut flash, 0x800, &data, 4096, &mut NoProgress).unwrap();
        verify_data(&mut flash, 0x800, &data, 4096, &mut NoProgress).unwrap();
    }

    #[test]
    fn test_verify_data_reports_flipped_byte() {
        let mut flash = flash();
        let data = vec![0x00u8; 10_000];
        write_range(&mut flash, 0x1000, &data, 4096, &mut NoProgress).unwrap();

        // One bit flipped in the second chunk
        flash.corrupt_readback(0x1000 + 5000, 0x01);

        match verify_data(&mut flash, 0x1000, &data, 4096, &mut NoProgress) {
            Err(Error::Verify {
                first_offset,
                address,
                count,
            }) => {
                assert_eq!(first_offset, 5000);
                assert_eq!(address, 0x1000 + 5000);
                assert_eq!(count, 1);
            }
            other => panic!("expected verify error, got {:?}", other),
        }
    }

    #[test]
    fn test_earliest_mismatch_wins() {
        let mut flash = flash();
        flash.corrupt_readback(9000, 0xFF);
        flash.corrupt_readback(100, 0x10);

        match verify_erased(&mut flash, 0, 16_384, 4096, &mut NoProgress) {
            Err(Error::Verify {
                first_offset,
                count,
                ..
            }) => {
                assert_eq!(first_offset, 100);
                assert_eq!(count, 2);
            }
            other => panic!("expected verify error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_erased_on_blank_device() {
        let mut flash = flash();
        verify_erased(&mut flash, 0, 64 * 1024, 4096, &mut NoProgress).unwrap();
    }

    #[test]
    fn test_short_read_fails_blank_check() {
        let mut flash = flash();
        flash.truncate_reads(2048);

        match verify_erased(&mut flash, 0x1000, 8192, 4096, &mut NoProgress) {
            Err(Error::ShortRead {
                address,
                expected,
                got,
            }) => {
                assert_eq!(address, 0x1000);
                assert_eq!(expected, 4096);
                assert_eq!(got, 2048);
            }
            other => panic!("expected short read, got {:?}", other),
        }
        assert_eq!(flash.reads, 1);
    }
}
