use crate::HEADER_SIZE;

/// Errors from reading a finished buffer.
///
/// Every variant describes a malformed buffer. Absent fields are never
/// errors; they resolve to their documented default instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("buffer too short: {len} bytes (minimum {HEADER_SIZE})")]
    TooShort { len: usize },

    #[error("offset {position} + {size} bytes is outside a {len}-byte buffer")]
    OutOfBounds { position: usize, size: usize, len: usize },

    #[error("invalid vtable at {position}: {reason}")]
    BadVtable { position: usize, reason: &'static str },

    #[error("string at {position} is not valid utf-8")]
    InvalidUtf8 { position: usize },
}

impl WireError {
    pub(crate) fn out_of_bounds(position: usize, size: usize, len: usize) -> Self {
        Self::OutOfBounds { position, size, len }
    }
}
