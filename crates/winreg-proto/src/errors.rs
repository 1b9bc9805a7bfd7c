//! Error types for MS-RRP wire decoding and encoding.

use thiserror::Error;

use crate::types::ValueType;

/// Result type for wire-level operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding NDR data.
///
/// Decoding is all-or-nothing: any of these aborts the whole message, there is
/// no best-effort partial result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Fewer bytes remain than the next field requires.
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        /// Absolute offset of the field.
        offset: usize,
        /// Bytes the field requires.
        needed: usize,
        /// Bytes actually left.
        available: usize,
    },

    /// A non-null referent id with nothing left to resolve it against.
    #[error("pointer at offset {offset} has referent {referent:#010x} but no payload")]
    MalformedPointer {
        /// Absolute offset of the referent id.
        offset: usize,
        /// The referent id read from the wire.
        referent: u32,
    },

    /// Array framing is inconsistent with itself or with the input.
    #[error("malformed array at offset {offset}: {reason}")]
    MalformedArray {
        /// Absolute offset of the array header.
        offset: usize,
        /// What was wrong.
        reason: &'static str,
    },

    /// RRP_UNICODE_STRING framing or contents are invalid.
    #[error("malformed string at offset {offset}: {reason}")]
    MalformedString {
        /// Absolute offset of the string header.
        offset: usize,
        /// What was wrong.
        reason: &'static str,
    },

    /// Create-key disposition other than 1 or 2.
    #[error("invalid create-key disposition {0}")]
    InvalidDisposition(u32),

    /// Operation number outside the MS-RRP table.
    #[error("unknown operation number {0}")]
    UnknownOpnum(u16),

    /// String does not fit the 16-bit length fields of RRP_UNICODE_STRING.
    #[error("string of {chars} UTF-16 units exceeds the wire length limit")]
    StringTooLong {
        /// UTF-16 code units including the terminator.
        chars: usize,
    },

    /// Array does not fit a 32-bit element count.
    #[error("array of {len} elements exceeds the wire count limit")]
    ArrayTooLong {
        /// Element count.
        len: usize,
    },

    /// A typed value payload does not match its declared value type.
    #[error("value payload does not match {value_type}: {reason}")]
    ValueMismatch {
        /// Declared type.
        value_type: ValueType,
        /// What was wrong.
        reason: &'static str,
    },
}
