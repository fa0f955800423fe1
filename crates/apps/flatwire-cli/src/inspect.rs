use flatwire_envelope::{Content, DestinationKind, Envelope, EnvelopeError};
use flatwire_table::slot_voffset;
use serde::Serialize;

const SLOT_NAMES: [&str; 4] = ["destination", "content_type", "content", "id"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeReport {
    pub buffer_len: usize,
    pub root_position: usize,
    pub vtable: VTableReport,
    pub destination: Option<DestinationReport>,
    pub content_type: u8,
    pub content: ContentReport,
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VTableReport {
    pub position: usize,
    pub len: usize,
    pub object_len: usize,
    pub slots: Vec<SlotReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotReport {
    pub slot: u16,
    pub name: &'static str,
    pub voffset: u16,
    pub field_offset: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationReport {
    pub kind: Option<DestinationKind>,
    pub kind_raw: u8,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentReport {
    None,
    NoMessage,
    Success,
    Error { code: u16, category: Option<String>, reason: Option<String> },
    Other { tag: u8, position: usize },
    Invalid { error: String },
}

impl From<Content<'_>> for ContentReport {
    fn from(content: Content<'_>) -> Self {
        match content {
            Content::None => Self::None,
            Content::NoMessage => Self::NoMessage,
            Content::Success => Self::Success,
            Content::Error(error) => Self::Error {
                code: error.code(),
                category: error.category().map(str::to_owned),
                reason: error.reason().map(str::to_owned),
            },
            Content::Other { tag, table } => Self::Other { tag, position: table.position() },
        }
    }
}

/// Describe the envelope at the root of `bytes`.
///
/// Only a malformed buffer is an error; an inconsistent tag/content pair is
/// reported as [`ContentReport::Invalid`].
pub fn inspect(bytes: &[u8]) -> Result<EnvelopeReport, EnvelopeError> {
    let envelope = Envelope::wrap(bytes)?;
    let table = envelope.table();
    let vtable = table.vtable()?;
    let slots = vtable
        .present_slots()
        .map(|(slot, field_offset)| SlotReport {
            slot,
            name: SLOT_NAMES.get(usize::from(slot)).copied().unwrap_or("unknown"),
            voffset: slot_voffset(slot),
            field_offset,
        })
        .collect();

    let destination = envelope.destination().map(|destination| DestinationReport {
        kind: destination.kind(),
        kind_raw: destination.kind_raw(),
        target: destination.target().map(str::to_owned),
    });
    let content = match envelope.content() {
        Ok(content) => content.into(),
        Err(err) if err.is_malformed() => return Err(err),
        Err(err) => ContentReport::Invalid { error: err.to_string() },
    };

    Ok(EnvelopeReport {
        buffer_len: bytes.len(),
        root_position: table.position(),
        vtable: VTableReport {
            position: vtable.position(),
            len: vtable.len(),
            object_len: vtable.object_inline_len(),
            slots,
        },
        destination,
        content_type: envelope.content_type(),
        content,
        id: envelope.id(),
    })
}

impl EnvelopeReport {
    /// Human-readable rendering, one line per fact.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("buffer: {} bytes, root at {}", self.buffer_len, self.root_position),
            format!(
                "vtable @ {}: {} bytes, object {} bytes",
                self.vtable.position, self.vtable.len, self.vtable.object_len
            ),
        ];
        for slot in &self.vtable.slots {
            lines.push(format!(
                "  slot {} {:<12} voffset {:>2} -> +{}",
                slot.slot, slot.name, slot.voffset, slot.field_offset
            ));
        }
        lines.push(match &self.destination {
            None => "destination: none".to_string(),
            Some(destination) => {
                let kind = match destination.kind {
                    Some(DestinationKind::Module) => "module".to_string(),
                    Some(DestinationKind::Topic) => "topic".to_string(),
                    None => format!("0x{:02x}", destination.kind_raw),
                };
                format!("destination: {kind} {:?}", destination.target.as_deref().unwrap_or(""))
            }
        });
        lines.push(format!("content_type: {}", self.content_type));
        lines.push(match &self.content {
            ContentReport::None => "content: none".to_string(),
            ContentReport::NoMessage => "content: no_message".to_string(),
            ContentReport::Success => "content: success".to_string(),
            ContentReport::Error { code, category, reason } => format!(
                "content: error code={code} category={:?} reason={:?}",
                category.as_deref().unwrap_or(""),
                reason.as_deref().unwrap_or("")
            ),
            ContentReport::Other { tag, position } => {
                format!("content: tag 0x{tag:02x} table at {position}")
            }
            ContentReport::Invalid { error } => format!("content: invalid ({error})"),
        });
        lines.push(format!("id: {}", self.id));
        lines
    }
}
