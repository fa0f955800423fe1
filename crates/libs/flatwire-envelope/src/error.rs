use flatwire_table::WireError;

/// Errors from envelope construction and typed content access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("unknown content type: 0x{0:02x}")]
    UnknownContentType(u8),

    #[error("unknown destination kind: 0x{0:02x}")]
    UnknownDestinationKind(u8),

    #[error("content type 0x{tag:02x} is set but the content is absent")]
    MissingContent { tag: u8 },

    #[error("content is present but its type tag is 0")]
    UntaggedContent,

    #[error("content type 0 cannot tag a content reference")]
    ReservedContentTag,
}

impl EnvelopeError {
    /// Returns `true` when the underlying bytes are malformed, as opposed to
    /// a well-formed buffer carrying an inconsistent tag/content pair.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Wire(_))
    }
}
