//! Envelope encode/decode.
//!
//! Slot layout of the envelope table:
//!
//! | slot | voffset | field          | type        | default |
//! |------|---------|----------------|-------------|---------|
//! | 0    | 4       | `destination`  | offset      | absent  |
//! | 1    | 6       | `content_type` | `u8`        | 0       |
//! | 2    | 8       | `content`      | offset      | absent  |
//! | 3    | 10      | `id`           | `i32`       | 0       |

use flatwire_table::{root_table, Builder, Offset, Record, Table, WireError};

use crate::content::{Content, ContentRef, ContentType, ErrorContent};
use crate::destination::Destination;
use crate::EnvelopeError;

pub(crate) const SLOT_DESTINATION: u16 = 0;
pub(crate) const SLOT_CONTENT_TYPE: u16 = 1;
pub(crate) const SLOT_CONTENT: u16 = 2;
pub(crate) const SLOT_ID: u16 = 3;

/// Inputs for [`Envelope::create`].
///
/// `content` pairs the tag with its table, so a tag without content (or the
/// reverse) cannot be expressed here. [`EnvelopeBuilder`] remains available
/// for slot-by-slot construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvelopeArgs {
    pub destination: Option<Offset>,
    pub content: Option<ContentRef>,
    pub id: i32,
}

/// Zero-copy view of an envelope at the root of a finished buffer.
///
/// The view borrows the buffer and reads every field on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    table: Table<'a>,
}

impl<'a> Envelope<'a> {
    pub const FIELD_COUNT: u16 = 4;

    /// Locate the root envelope and check that all four slots, and the
    /// destination record when present, lie inside `buf`.
    pub fn wrap(buf: &'a [u8]) -> Result<Self, WireError> {
        root_table(buf).and_then(Self::from_table).map_err(|err| {
            log::debug!("flatwire: rejecting envelope buffer of {} bytes: {err}", buf.len());
            err
        })
    }

    /// Write an envelope table and return its offset.
    ///
    /// Fields are added largest first so the object packs without padding.
    pub fn create(builder: &mut Builder, args: &EnvelopeArgs) -> Offset {
        let mut envelope = EnvelopeBuilder::new(builder);
        envelope.add_id(args.id);
        if let Some(content) = args.content {
            envelope.add_content(content.offset());
        }
        if let Some(destination) = args.destination {
            envelope.add_destination(destination);
        }
        if let Some(content) = args.content {
            envelope.add_content_type(content.tag());
        }
        envelope.finish()
    }

    /// The routing target, or `None` when absent.
    pub fn destination(&self) -> Option<Destination<'a>> {
        // verified in from_table
        self.table.get_record(SLOT_DESTINATION).ok().flatten()
    }

    /// Raw content tag, 0 when absent.
    pub fn content_type(&self) -> u8 {
        self.table.get::<u8>(SLOT_CONTENT_TYPE, 0).unwrap_or(0)
    }

    /// View the content as `R`, chosen by the caller from [`content_type`].
    ///
    /// The tag is not consulted; picking a record type that matches it is
    /// the caller's job.
    ///
    /// [`content_type`]: Self::content_type
    pub fn content_as<R: Record<'a>>(&self) -> Result<Option<R>, WireError> {
        self.table.get_record(SLOT_CONTENT)
    }

    /// Interpret the tag and content together.
    pub fn content(&self) -> Result<Content<'a>, EnvelopeError> {
        let tag = self.content_type();
        let table = self.content_as::<Table<'a>>()?;
        let Some(table) = table else {
            return match tag {
                0 => Ok(Content::None),
                _ => Err(EnvelopeError::MissingContent { tag }),
            };
        };
        match ContentType::from_byte(tag) {
            Ok(ContentType::None) => Err(EnvelopeError::UntaggedContent),
            Ok(ContentType::NoMessage) => Ok(Content::NoMessage),
            Ok(ContentType::Success) => Ok(Content::Success),
            Ok(ContentType::Error) => Ok(Content::Error(ErrorContent::from_table(table)?)),
            Err(_) => Ok(Content::Other { tag, table }),
        }
    }

    /// Correlation id, 0 when absent.
    pub fn id(&self) -> i32 {
        self.table.get::<i32>(SLOT_ID, 0).unwrap_or(0)
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }
}

impl<'a> Record<'a> for Envelope<'a> {
    fn from_table(table: Table<'a>) -> Result<Self, WireError> {
        table.get_record::<Destination<'a>>(SLOT_DESTINATION)?;
        table.get::<u8>(SLOT_CONTENT_TYPE, 0)?;
        table.get_table(SLOT_CONTENT)?;
        table.get::<i32>(SLOT_ID, 0)?;
        Ok(Self { table })
    }
}

/// Slot-by-slot envelope construction.
///
/// Each setter writes one slot and nothing ties `content_type` to
/// `content`; prefer [`Envelope::create`] unless the exact slot order
/// matters.
pub struct EnvelopeBuilder<'b> {
    builder: &'b mut Builder,
}

impl<'b> EnvelopeBuilder<'b> {
    pub fn new(builder: &'b mut Builder) -> Self {
        builder.start_object(Envelope::FIELD_COUNT);
        Self { builder }
    }

    pub fn add_destination(&mut self, destination: Offset) {
        self.builder.push_slot_offset(SLOT_DESTINATION, destination);
    }

    pub fn add_content_type(&mut self, content_type: u8) {
        self.builder.push_slot::<u8>(SLOT_CONTENT_TYPE, content_type, 0);
    }

    pub fn add_content(&mut self, content: Offset) {
        self.builder.push_slot_offset(SLOT_CONTENT, content);
    }

    pub fn add_id(&mut self, id: i32) {
        self.builder.push_slot::<i32>(SLOT_ID, id, 0);
    }

    pub fn finish(self) -> Offset {
        self.builder.end_object()
    }
}

/// Seal `builder` with `root` as the root envelope.
pub fn finish_envelope_buffer(builder: &mut Builder, root: Offset) {
    builder.finish(root);
}

/// Same as [`Envelope::wrap`].
pub fn root_as_envelope(buf: &[u8]) -> Result<Envelope<'_>, WireError> {
    Envelope::wrap(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ErrorArgs;
    use crate::destination::{DestinationArgs, DestinationKind};

    fn encode(build: impl FnOnce(&mut Builder) -> EnvelopeArgs) -> Vec<u8> {
        let mut builder = Builder::new();
        let args = build(&mut builder);
        let root = Envelope::create(&mut builder, &args);
        finish_envelope_buffer(&mut builder, root);
        builder.into_finished_data()
    }

    #[test]
    fn tag_and_id_only_writes_two_slots() {
        let mut builder = Builder::new();
        let mut envelope = EnvelopeBuilder::new(&mut builder);
        envelope.add_content_type(2);
        envelope.add_id(42);
        let root = envelope.finish();
        builder.finish(root);

        let envelope = Envelope::wrap(builder.finished_data()).expect("wrap");
        let slots: Vec<u16> =
            envelope.table().vtable().expect("vtable").present_slots().map(|(s, _)| s).collect();
        assert_eq!(slots, vec![SLOT_CONTENT_TYPE, SLOT_ID]);
        assert!(envelope.destination().is_none());
        assert_eq!(envelope.content_type(), 2);
        assert_eq!(envelope.content_as::<Table<'_>>(), Ok(None));
        assert_eq!(envelope.id(), 42);
    }

    #[test]
    fn id_only_reads_content_none() {
        let bytes = encode(|_| EnvelopeArgs { id: 42, ..Default::default() });
        let envelope = Envelope::wrap(&bytes).expect("wrap");
        assert_eq!(envelope.content_type(), 0);
        assert_eq!(envelope.content(), Ok(Content::None));
        assert_eq!(envelope.id(), 42);
    }

    #[test]
    fn full_envelope_roundtrip() {
        let bytes = encode(|builder| {
            let destination = Destination::create(
                builder,
                &DestinationArgs { kind: DestinationKind::Module, target: Some("/routing") },
            );
            let content = ContentRef::error(
                builder,
                &ErrorArgs { code: 7, category: Some("access"), reason: None },
            );
            EnvelopeArgs { destination: Some(destination), content: Some(content), id: -9 }
        });
        let envelope = Envelope::wrap(&bytes).expect("wrap");
        let destination = envelope.destination().expect("destination");
        assert_eq!(destination.target(), Some("/routing"));
        assert_eq!(envelope.content_type(), ContentType::Error as u8);
        assert_eq!(envelope.id(), -9);
        match envelope.content().expect("content") {
            Content::Error(error) => {
                assert_eq!(error.code(), 7);
                assert_eq!(error.category(), Some("access"));
                assert_eq!(error.reason(), None);
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn content_without_tag_is_reported() {
        let mut builder = Builder::new();
        let success = crate::content::create_empty(&mut builder);
        let mut envelope = EnvelopeBuilder::new(&mut builder);
        envelope.add_content(success);
        let root = envelope.finish();
        builder.finish(root);
        let envelope = Envelope::wrap(builder.finished_data()).expect("wrap");
        assert_eq!(envelope.content(), Err(EnvelopeError::UntaggedContent));
        assert!(envelope.content_as::<Table<'_>>().expect("content").is_some());
    }

    #[test]
    fn tag_without_content_is_reported() {
        let mut builder = Builder::new();
        let mut envelope = EnvelopeBuilder::new(&mut builder);
        envelope.add_content_type(ContentType::Success as u8);
        let root = envelope.finish();
        builder.finish(root);
        let envelope = Envelope::wrap(builder.finished_data()).expect("wrap");
        assert_eq!(envelope.content(), Err(EnvelopeError::MissingContent { tag: 3 }));
    }

    #[test]
    fn unknown_tag_surfaces_as_other() {
        let bytes = encode(|builder| {
            let offset = crate::content::create_empty(builder);
            let content = ContentRef::raw(0x50, offset).expect("non-zero tag");
            EnvelopeArgs { content: Some(content), ..Default::default() }
        });
        let envelope = Envelope::wrap(&bytes).expect("wrap");
        match envelope.content().expect("content") {
            Content::Other { tag, table } => {
                assert_eq!(tag, 0x50);
                assert!(table.vtable().expect("vtable").is_empty());
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn wrap_rejects_short_buffer() {
        assert_eq!(Envelope::wrap(&[0, 0]), Err(WireError::TooShort { len: 2 }));
        assert_eq!(root_as_envelope(&[]), Err(WireError::TooShort { len: 0 }));
    }
}
