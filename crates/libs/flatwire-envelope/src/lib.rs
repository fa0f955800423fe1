//! # flatwire-envelope
//!
//! Zero-copy message envelope built on [`flatwire_table`].
//!
//! An envelope is a four-slot table: a reference to a [`Destination`]
//! record, a one-byte content tag, a reference to the content table the tag
//! describes, and a 32-bit correlation id. Every slot is optional and reads
//! back as its default when absent.
//!
//! ## Example
//!
//! ```rust
//! use flatwire_envelope::{
//!     Content, ContentRef, Destination, DestinationArgs, DestinationKind, Envelope, EnvelopeArgs,
//! };
//! use flatwire_table::Builder;
//!
//! let mut builder = Builder::new();
//! let destination = Destination::create(
//!     &mut builder,
//!     &DestinationArgs { kind: DestinationKind::Topic, target: Some("/ris/messages") },
//! );
//! let content = ContentRef::success(&mut builder);
//! let root = Envelope::create(
//!     &mut builder,
//!     &EnvelopeArgs { destination: Some(destination), content: Some(content), id: 42 },
//! );
//! builder.finish(root);
//!
//! let envelope = Envelope::wrap(builder.finished_data()).unwrap();
//! assert_eq!(envelope.id(), 42);
//! assert_eq!(envelope.destination().unwrap().target(), Some("/ris/messages"));
//! assert_eq!(envelope.content().unwrap(), Content::Success);
//! ```

mod content;
mod destination;
mod envelope;
mod error;

pub use content::{create_empty, Content, ContentRef, ContentType, ErrorArgs, ErrorContent};
pub use destination::{Destination, DestinationArgs, DestinationKind};
pub use envelope::{
    finish_envelope_buffer, root_as_envelope, Envelope, EnvelopeArgs, EnvelopeBuilder,
};
pub use error::EnvelopeError;
