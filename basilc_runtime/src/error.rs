//! Errors the ABI-contract checks in this crate can raise.
//!
//! These never occur in emitted code paths (the arena and layout modules
//! only describe the contract); they exist so this crate's own
//! consistency checks have somewhere to report a violation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    /// A requested allocation size exceeds every declared size class and
    /// the large-object threshold disagrees with `arena::SIZE_CLASSES`.
    #[error("size class table is inconsistent with the large-object threshold")]
    InconsistentSizeClasses,

    /// A refcount header's flag bits don't fit in `layout::FLAG_MASK`.
    #[error("refcount header flags {0:#x} exceed the reserved flag bits")]
    FlagOverflow(u64),
}
