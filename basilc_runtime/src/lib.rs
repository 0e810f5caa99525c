//! ABI-contract reference for the compiled runtime support library.
//!
//! The emitted assembly calls into hand-written runtime helpers
//! (`_alloc`, `_rcinc`, `_rcdec`, `_strcat`, ...) that this crate does not
//! implement or link against. What it does provide is a `#[repr(C)]`
//! description of the memory layouts those helpers assume, so the x86-64
//! backend's hardcoded field offsets and this crate's tests are checked
//! against the same source of truth.

pub mod arena;
pub mod error;
pub mod layout;

pub mod prelude {
    pub use super::arena::{class_for, LARGE_OBJECT_THRESHOLD, SIZE_CLASSES};
    pub use super::error::RuntimeError;
    pub use super::layout::{ListCell, RefCountHeader, StringHeader, FLAG_IMMUTABLE, FLAG_NON_RC};
}

pub use prelude::*;
