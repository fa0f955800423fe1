//! Content union carried by an envelope.
//!
//! On the wire the union is two independent slots: a one-byte tag and an
//! offset to a table. [`ContentRef`] keeps the pair together while building;
//! [`Content`] is the typed view once the tag has been interpreted.

use flatwire_table::{Builder, Offset, Record, Table, WireError};
use serde::{Deserialize, Serialize};

use crate::EnvelopeError;

/// Known content kinds.
///
/// Any other non-zero tag is legal on the wire and is surfaced as
/// [`Content::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ContentType {
    None = 0x00,
    NoMessage = 0x01,
    Error = 0x02,
    Success = 0x03,
}

impl ContentType {
    /// Convert from raw byte value.
    pub fn from_byte(b: u8) -> Result<Self, EnvelopeError> {
        match b {
            0x00 => Ok(Self::None),
            0x01 => Ok(Self::NoMessage),
            0x02 => Ok(Self::Error),
            0x03 => Ok(Self::Success),
            _ => Err(EnvelopeError::UnknownContentType(b)),
        }
    }
}

/// A content table paired with the non-zero tag that describes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRef {
    tag: u8,
    offset: Offset,
}

impl ContentRef {
    pub fn new(content_type: ContentType, offset: Offset) -> Result<Self, EnvelopeError> {
        Self::raw(content_type as u8, offset)
    }

    /// Pair an offset with a tag outside [`ContentType`].
    pub fn raw(tag: u8, offset: Offset) -> Result<Self, EnvelopeError> {
        if tag == ContentType::None as u8 {
            return Err(EnvelopeError::ReservedContentTag);
        }
        Ok(Self { tag, offset })
    }

    pub fn no_message(builder: &mut Builder) -> Self {
        Self { tag: ContentType::NoMessage as u8, offset: create_empty(builder) }
    }

    pub fn success(builder: &mut Builder) -> Self {
        Self { tag: ContentType::Success as u8, offset: create_empty(builder) }
    }

    pub fn error(builder: &mut Builder, args: &ErrorArgs<'_>) -> Self {
        Self { tag: ContentType::Error as u8, offset: ErrorContent::create(builder, args) }
    }

    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }
}

/// Write a table with no fields.
pub fn create_empty(builder: &mut Builder) -> Offset {
    builder.start_object(0);
    builder.end_object()
}

/// Typed view of an envelope's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    None,
    NoMessage,
    Error(ErrorContent<'a>),
    Success,
    Other { tag: u8, table: Table<'a> },
}

impl Content<'_> {
    /// The tag this content is stored under.
    pub fn tag(&self) -> u8 {
        match self {
            Self::None => ContentType::None as u8,
            Self::NoMessage => ContentType::NoMessage as u8,
            Self::Error(_) => ContentType::Error as u8,
            Self::Success => ContentType::Success as u8,
            Self::Other { tag, .. } => *tag,
        }
    }
}

const SLOT_CODE: u16 = 0;
const SLOT_CATEGORY: u16 = 1;
const SLOT_REASON: u16 = 2;

/// Inputs for [`ErrorContent::create`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorArgs<'s> {
    pub code: u16,
    pub category: Option<&'s str>,
    pub reason: Option<&'s str>,
}

/// Error report carried as envelope content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorContent<'a> {
    table: Table<'a>,
}

impl<'a> ErrorContent<'a> {
    pub const FIELD_COUNT: u16 = 3;

    pub fn create(builder: &mut Builder, args: &ErrorArgs<'_>) -> Offset {
        let category = args.category.map(|category| builder.create_string(category));
        let reason = args.reason.map(|reason| builder.create_string(reason));
        builder.start_object(Self::FIELD_COUNT);
        if let Some(reason) = reason {
            builder.push_slot_offset(SLOT_REASON, reason);
        }
        if let Some(category) = category {
            builder.push_slot_offset(SLOT_CATEGORY, category);
        }
        builder.push_slot::<u16>(SLOT_CODE, args.code, 0);
        builder.end_object()
    }

    pub fn code(&self) -> u16 {
        self.table.get::<u16>(SLOT_CODE, 0).unwrap_or(0)
    }

    pub fn category(&self) -> Option<&'a str> {
        self.table.get_str(SLOT_CATEGORY).ok().flatten()
    }

    pub fn reason(&self) -> Option<&'a str> {
        self.table.get_str(SLOT_REASON).ok().flatten()
    }
}

impl<'a> Record<'a> for ErrorContent<'a> {
    fn from_table(table: Table<'a>) -> Result<Self, WireError> {
        table.get::<u16>(SLOT_CODE, 0)?;
        table.get_str(SLOT_CATEGORY)?;
        table.get_str(SLOT_REASON)?;
        Ok(Self { table })
    }
}
