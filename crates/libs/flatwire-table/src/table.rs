//! Zero-copy views over a finished buffer.
//!
//! A [`Table`] is a buffer plus the position of one object. Nothing is
//! decoded up front: every accessor locates the object's vtable, looks up the
//! slot, and reads the bytes in place. All accesses are bounds-checked and
//! report a [`WireError`] instead of reading past the end.

use crate::error::WireError;
use crate::scalar::Scalar;
use crate::{HEADER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET, VTABLE_HEADER_SIZE};

/// A record type that can be viewed from a [`Table`].
///
/// `from_table` is the place to verify the record's own fields so that its
/// accessors can stay infallible afterwards.
pub trait Record<'a>: Sized {
    fn from_table(table: Table<'a>) -> Result<Self, WireError>;
}

impl<'a> Record<'a> for Table<'a> {
    fn from_table(table: Table<'a>) -> Result<Self, WireError> {
        Ok(table)
    }
}

/// Locate the root object through the buffer's leading offset.
pub fn root_table(buf: &[u8]) -> Result<Table<'_>, WireError> {
    if buf.len() < HEADER_SIZE {
        return Err(WireError::TooShort { len: buf.len() });
    }
    // Buffers never exceed i32::MAX bytes, so a header with the sign bit set
    // is out of bounds whether it is read signed or unsigned.
    let root = read_scalar::<u32>(buf, 0)? as usize;
    Table::at(buf, root)
}

/// Read a little-endian scalar at an absolute position.
pub fn read_scalar<T: Scalar>(buf: &[u8], position: usize) -> Result<T, WireError> {
    slice_at(buf, position, T::SIZE).map(T::read_le)
}

fn slice_at(buf: &[u8], position: usize, size: usize) -> Result<&[u8], WireError> {
    position
        .checked_add(size)
        .and_then(|end| buf.get(position..end))
        .ok_or_else(|| WireError::out_of_bounds(position, size, buf.len()))
}

fn read_vector(buf: &[u8], position: usize) -> Result<&[u8], WireError> {
    let len = read_scalar::<u32>(buf, position)? as usize;
    slice_at(buf, position + SIZE_UOFFSET, len)
}

fn read_str(buf: &[u8], position: usize) -> Result<&str, WireError> {
    core::str::from_utf8(read_vector(buf, position)?)
        .map_err(|_| WireError::InvalidUtf8 { position })
}

/// View of one object inside a finished buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> Table<'a> {
    /// View the object at `position`, checking that it and its vtable lie
    /// inside `buf`.
    pub fn at(buf: &'a [u8], position: usize) -> Result<Self, WireError> {
        let table = Self { buf, position };
        table.vtable()?;
        Ok(table)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn vtable(&self) -> Result<VTable<'a>, WireError> {
        let len = self.buf.len();
        let soffset = read_scalar::<i32>(self.buf, self.position)?;
        let vtable_pos = i64::try_from(self.position)
            .ok()
            .and_then(|position| position.checked_sub(i64::from(soffset)))
            .and_then(|position| usize::try_from(position).ok())
            .ok_or_else(|| WireError::out_of_bounds(self.position, SIZE_SOFFSET, len))?;

        let vtable_len = usize::from(read_scalar::<u16>(self.buf, vtable_pos)?);
        if vtable_len < VTABLE_HEADER_SIZE || vtable_len % SIZE_VOFFSET != 0 {
            return Err(WireError::BadVtable {
                position: vtable_pos,
                reason: "length must be even and cover the 4-byte header",
            });
        }
        let bytes = slice_at(self.buf, vtable_pos, vtable_len)?;

        let inline_len = usize::from(read_scalar::<u16>(self.buf, vtable_pos + SIZE_VOFFSET)?);
        if inline_len < SIZE_SOFFSET {
            return Err(WireError::BadVtable {
                position: vtable_pos,
                reason: "object is smaller than its own vtable offset",
            });
        }
        slice_at(self.buf, self.position, inline_len)?;

        Ok(VTable { bytes, position: vtable_pos })
    }

    /// Read a scalar slot, returning `default` when the slot is absent.
    pub fn get<T: Scalar>(&self, slot: u16, default: T) -> Result<T, WireError> {
        match self.field_position(slot, T::SIZE)? {
            Some(at) => read_scalar(self.buf, at),
            None => Ok(default),
        }
    }

    /// Follow an offset slot to a nested object.
    pub fn get_table(&self, slot: u16) -> Result<Option<Table<'a>>, WireError> {
        self.follow(slot)?.map(|target| Table::at(self.buf, target)).transpose()
    }

    /// Follow an offset slot and view the object as `R`.
    ///
    /// No check ties `R` to the slot; the caller picks the record type.
    pub fn get_record<R: Record<'a>>(&self, slot: u16) -> Result<Option<R>, WireError> {
        self.get_table(slot)?.map(R::from_table).transpose()
    }

    pub fn get_str(&self, slot: u16) -> Result<Option<&'a str>, WireError> {
        self.follow(slot)?.map(|target| read_str(self.buf, target)).transpose()
    }

    pub fn get_bytes(&self, slot: u16) -> Result<Option<&'a [u8]>, WireError> {
        self.follow(slot)?.map(|target| read_vector(self.buf, target)).transpose()
    }

    /// Absolute position of a slot's value, or `None` when the slot is absent.
    pub fn field_position(&self, slot: u16, size: usize) -> Result<Option<usize>, WireError> {
        let vtable = self.vtable()?;
        let field = usize::from(vtable.field_offset(slot));
        if field == 0 {
            return Ok(None);
        }
        if field < SIZE_SOFFSET || field + size > vtable.object_inline_len() {
            return Err(WireError::BadVtable {
                position: vtable.position(),
                reason: "field lies outside its object",
            });
        }
        Ok(Some(self.position + field))
    }

    fn follow(&self, slot: u16) -> Result<Option<usize>, WireError> {
        let Some(at) = self.field_position(slot, SIZE_UOFFSET)? else {
            return Ok(None);
        };
        let relative = read_scalar::<u32>(self.buf, at)? as usize;
        at.checked_add(relative)
            .filter(|target| *target < self.buf.len())
            .map(Some)
            .ok_or_else(|| WireError::out_of_bounds(at, relative, self.buf.len()))
    }
}

/// The field-presence table of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VTable<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> VTable<'a> {
    pub fn position(&self) -> usize {
        self.position
    }

    /// Length of the vtable in bytes, header included.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    pub fn object_inline_len(&self) -> usize {
        usize::from(u16::read_le(&self.bytes[SIZE_VOFFSET..VTABLE_HEADER_SIZE]))
    }

    /// Number of slots the vtable covers; slots past the end read as absent.
    pub fn slot_count(&self) -> usize {
        (self.bytes.len() - VTABLE_HEADER_SIZE) / SIZE_VOFFSET
    }

    /// Byte offset of `slot` from the object start, 0 when absent.
    pub fn field_offset(&self, slot: u16) -> u16 {
        let at = VTABLE_HEADER_SIZE + SIZE_VOFFSET * usize::from(slot);
        self.bytes.get(at..at + SIZE_VOFFSET).map(u16::read_le).unwrap_or(0)
    }

    /// Present slots with their offsets, in slot order.
    pub fn present_slots(&self) -> impl Iterator<Item = (u16, u16)> + 'a {
        let bytes = self.bytes;
        bytes[VTABLE_HEADER_SIZE..]
            .chunks_exact(SIZE_VOFFSET)
            .enumerate()
            .map(|(slot, raw)| (slot as u16, u16::read_le(raw)))
            .filter(|(_, offset)| *offset != 0)
    }
}
