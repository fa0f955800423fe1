//! Routing target of an envelope.

use flatwire_table::{Builder, Offset, Record, Table, WireError};
use serde::{Deserialize, Serialize};

use crate::EnvelopeError;

const SLOT_KIND: u16 = 0;
const SLOT_TARGET: u16 = 1;

/// Whether a destination names a single module or a broadcast topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum DestinationKind {
    #[default]
    Module = 0x00,
    Topic = 0x01,
}

impl DestinationKind {
    /// Convert from raw byte value.
    pub fn from_byte(b: u8) -> Result<Self, EnvelopeError> {
        match b {
            0x00 => Ok(Self::Module),
            0x01 => Ok(Self::Topic),
            _ => Err(EnvelopeError::UnknownDestinationKind(b)),
        }
    }
}

/// Inputs for [`Destination::create`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DestinationArgs<'s> {
    pub kind: DestinationKind,
    pub target: Option<&'s str>,
}

/// View of a destination record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination<'a> {
    table: Table<'a>,
}

impl<'a> Destination<'a> {
    pub const FIELD_COUNT: u16 = 2;

    /// Write a destination record and return its offset.
    pub fn create(builder: &mut Builder, args: &DestinationArgs<'_>) -> Offset {
        let target = args.target.map(|target| builder.create_string(target));
        builder.start_object(Self::FIELD_COUNT);
        if let Some(target) = target {
            builder.push_slot_offset(SLOT_TARGET, target);
        }
        builder.push_slot::<u8>(SLOT_KIND, args.kind as u8, DestinationKind::Module as u8);
        builder.end_object()
    }

    pub fn kind_raw(&self) -> u8 {
        // verified in from_table
        self.table.get::<u8>(SLOT_KIND, 0).unwrap_or(0)
    }

    /// The destination kind, or `None` for a byte this crate does not know.
    pub fn kind(&self) -> Option<DestinationKind> {
        DestinationKind::from_byte(self.kind_raw()).ok()
    }

    pub fn target(&self) -> Option<&'a str> {
        self.table.get_str(SLOT_TARGET).ok().flatten()
    }

    pub fn table(&self) -> Table<'a> {
        self.table
    }
}

impl<'a> Record<'a> for Destination<'a> {
    fn from_table(table: Table<'a>) -> Result<Self, WireError> {
        table.get::<u8>(SLOT_KIND, 0)?;
        table.get_str(SLOT_TARGET)?;
        Ok(Self { table })
    }
}
