/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use crate::core::sync::PrimitiveKind;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for synchronization primitive operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised by the synchronization primitives
///
/// Every variant is a programming error detected synchronously by the call
/// that triggered it. Nothing here is retried internally, and timeouts are
/// never reported through this type.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum SyncError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(sync::invalid_argument),
        help("Check the value passed to the constructor or method.")
    )]
    InvalidArgument(String),

    #[error("Out of range: offset {offset} + {required} bytes exceeds region of {length} bytes")]
    #[diagnostic(
        code(sync::out_of_range),
        help("The region is too small for this primitive at the given offset.")
    )]
    OutOfRange {
        offset: usize,
        required: usize,
        length: usize,
    },

    #[error("Not aligned: byte offset {offset} is not a multiple of 4")]
    #[diagnostic(
        code(sync::not_aligned),
        help("Control words must start on a 4-byte boundary.")
    )]
    NotAligned { offset: usize },

    #[error("Invalid handle: expected {expected}, found word {word:#010x}")]
    #[diagnostic(
        code(sync::invalid_handle),
        help("The region does not hold this kind of primitive at the given offset.")
    )]
    InvalidHandle { expected: PrimitiveKind, word: u32 },

    #[error("Capacity exceeded: {0}")]
    #[diagnostic(
        code(sync::capacity_exceeded),
        help("A count was pushed past its bound. Pair every release or signal with its acquire.")
    )]
    CapacityExceeded(String),

    #[error("Invalid state: {0}")]
    #[diagnostic(
        code(sync::invalid_state),
        help("The operation is not allowed in the primitive's current state.")
    )]
    InvalidState(String),
}

impl SyncError {
    /// Check if this error came from validating a region or handle
    pub fn is_handle_error(&self) -> bool {
        matches!(
            self,
            SyncError::OutOfRange { .. } | SyncError::NotAligned { .. } | SyncError::InvalidHandle { .. }
        )
    }
}
