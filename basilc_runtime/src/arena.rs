//! Size-class table for the `_alloc`/`_free` arena the emitted prelude
//! calls into, per the runtime ABI contract: arenas sized 128..65536 bytes,
//! doubling, plus a large bucket for anything bigger than 8 KiB.

use crate::error::RuntimeError;

/// Size classes the arena serves directly, doubling from 128B to 64KiB.
pub const SIZE_CLASSES: &[usize] = &[128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768, 65536];

/// Requests past the largest size class fall through to a large-object
/// bucket (a thin `mmap`/`sbrk` wrapper on the runtime side; this crate
/// only documents the boundary, it doesn't allocate).
pub const LARGE_OBJECT_THRESHOLD: usize = SIZE_CLASSES[SIZE_CLASSES.len() - 1];

/// Picks the smallest size class that fits `requested` bytes, or `None`
/// when the request belongs in the large-object bucket.
pub fn class_for(requested: usize) -> Option<usize> {
    SIZE_CLASSES.iter().copied().find(|&class| class >= requested)
}

/// Checks that `LARGE_OBJECT_THRESHOLD` still names the table's own max,
/// so the two can't silently drift apart if `SIZE_CLASSES` is edited.
pub fn validate() -> Result<(), RuntimeError> {
    match SIZE_CLASSES.last() {
        Some(&max) if max == LARGE_OBJECT_THRESHOLD => Ok(()),
        _ => Err(RuntimeError::InconsistentSizeClasses),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_smallest_fitting_class() {
        assert_eq!(class_for(1), Some(128));
        assert_eq!(class_for(128), Some(128));
        assert_eq!(class_for(129), Some(256));
        assert_eq!(class_for(8191), Some(8192));
        assert_eq!(class_for(65536), Some(65536));
    }

    #[test]
    fn large_requests_skip_the_arena() {
        assert_eq!(class_for(65537), None);
        assert_eq!(class_for(1_000_000), None);
    }

    #[test]
    fn threshold_matches_the_table() {
        assert!(validate().is_ok());
    }
}
