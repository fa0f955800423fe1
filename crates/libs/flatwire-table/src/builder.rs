//! Backward-growing table builder.
//!
//! Data is bump-allocated from the end of the internal buffer towards the
//! front, so a child object is always complete before the parent that
//! references it is started. Offsets handed out by the builder count bytes
//! from the end of the buffer and therefore stay valid when the buffer
//! grows.

use crate::scalar::Scalar;
use crate::{
    MAX_BUFFER_SIZE, SIZE_SOFFSET, SIZE_UOFFSET, SIZE_VOFFSET, VTABLE_HEADER_SIZE,
};

const DEFAULT_CAPACITY: usize = 1024;

/// Largest allocation made up front; beyond this the buffer grows on demand.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 20;

/// Widest scalar alignment; every object starts on this boundary.
const MAX_SCALAR_ALIGN: usize = 8;

/// Largest slot count whose vtable length still fits in a `u16`.
const MAX_FIELDS: u16 = (u16::MAX - VTABLE_HEADER_SIZE as u16) / SIZE_VOFFSET as u16;

/// Reference to data already written into a [`Builder`].
///
/// The value counts bytes from the end of the buffer. It is only meaningful
/// for the builder that produced it and is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset(u32);

impl Offset {
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Construction settings for a [`Builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize), serde(default, deny_unknown_fields))]
pub struct BuilderOptions {
    /// Bytes allocated up front, capped at [`MAX_INITIAL_CAPACITY`]; the
    /// buffer doubles when it runs out.
    pub initial_capacity: usize,
    /// Write scalar fields even when they equal their default.
    pub force_defaults: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self { initial_capacity: DEFAULT_CAPACITY, force_defaults: false }
    }
}

#[derive(Debug, Clone, Copy)]
struct FieldLoc {
    offset: u32,
    slot: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Object { start: u32, field_count: u16 },
    Finished,
}

/// Serializes tables, strings and byte vectors into one little-endian buffer.
///
/// Misuse (adding a field with no open object, nesting `start_object`,
/// writing after [`finish`](Self::finish)) panics: a malformed construction
/// sequence is a bug in the caller, not a condition to recover from.
#[derive(Debug)]
pub struct Builder {
    buf: Vec<u8>,
    head: usize,
    min_align: usize,
    force_defaults: bool,
    state: State,
    field_locs: Vec<FieldLoc>,
    written_vtables: Vec<u32>,
    vtables_reused: usize,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::with_options(BuilderOptions::default())
    }

    pub fn with_capacity(initial_capacity: usize) -> Self {
        Self::with_options(BuilderOptions { initial_capacity, ..BuilderOptions::default() })
    }

    pub fn with_options(options: BuilderOptions) -> Self {
        let capacity = options.initial_capacity.clamp(1, MAX_INITIAL_CAPACITY);
        Self {
            buf: vec![0u8; capacity],
            head: capacity,
            min_align: 1,
            force_defaults: options.force_defaults,
            state: State::Idle,
            field_locs: Vec::new(),
            written_vtables: Vec::new(),
            vtables_reused: 0,
        }
    }

    /// Return to the unwritten state, keeping the allocation.
    ///
    /// The vtable cache belongs to one buffer and is cleared as well.
    pub fn reset(&mut self) {
        self.head = self.buf.len();
        self.min_align = 1;
        self.state = State::Idle;
        self.field_locs.clear();
        self.written_vtables.clear();
        self.vtables_reused = 0;
    }

    /// Bytes written so far.
    pub fn used_space(&self) -> usize {
        self.buf.len() - self.head
    }

    /// Distinct vtables written into the current buffer.
    pub fn vtable_count(&self) -> usize {
        self.written_vtables.len()
    }

    /// Objects that reused an earlier vtable instead of writing their own.
    pub fn vtables_reused(&self) -> usize {
        self.vtables_reused
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Begin a table with `field_count` slots.
    pub fn start_object(&mut self, field_count: u16) {
        match self.state {
            State::Idle => {}
            State::Object { .. } => panic!("start_object called while another object is open"),
            State::Finished => panic!("start_object called on a finished buffer"),
        }
        assert!(field_count <= MAX_FIELDS, "start_object: {field_count} fields exceeds {MAX_FIELDS}");
        self.field_locs.clear();
        // Inline size must depend only on field order, not on where the object lands.
        self.align(0, MAX_SCALAR_ALIGN);
        self.state = State::Object { start: self.used_offset(), field_count };
    }

    /// Write a scalar field, omitting it when `value == default`.
    pub fn push_slot<T: Scalar>(&mut self, slot: u16, value: T, default: T) {
        self.check_slot(slot, "push_slot");
        if value == default && !self.force_defaults {
            return;
        }
        let offset = self.push(value);
        self.field_locs.push(FieldLoc { offset, slot });
    }

    /// Write a reference to an earlier string, vector or table.
    pub fn push_slot_offset(&mut self, slot: u16, target: Offset) {
        self.check_slot(slot, "push_slot_offset");
        let offset = self.push_uoffset(target);
        self.field_locs.push(FieldLoc { offset, slot });
    }

    /// Close the open table and return its offset.
    ///
    /// The vtable is compared byte-for-byte against every vtable already
    /// written by this builder; on a match the object points at the existing
    /// one and no new vtable is emitted.
    pub fn end_object(&mut self) -> Offset {
        let start = match self.state {
            State::Object { start, .. } => start,
            State::Idle => panic!("end_object called without an open object"),
            State::Finished => panic!("end_object called on a finished buffer"),
        };

        // Placeholder for the signed vtable offset, patched below.
        let object = self.push(0_i32);
        let inline_len = object - start;
        assert!(
            inline_len <= u32::from(u16::MAX),
            "object inline size {inline_len} exceeds {} bytes",
            u16::MAX
        );

        let slot_count = self.field_locs.iter().map(|loc| usize::from(loc.slot) + 1).max();
        let vtable_len = VTABLE_HEADER_SIZE + SIZE_VOFFSET * slot_count.unwrap_or(0);
        let mut vtable = vec![0u8; vtable_len];
        (vtable_len as u16).write_le(&mut vtable[0..2]);
        (inline_len as u16).write_le(&mut vtable[2..4]);
        for loc in &self.field_locs {
            let at = VTABLE_HEADER_SIZE + SIZE_VOFFSET * usize::from(loc.slot);
            ((object - loc.offset) as u16).write_le(&mut vtable[at..at + SIZE_VOFFSET]);
        }

        let vtable_offset = match self.find_vtable(&vtable) {
            Some(existing) => {
                self.vtables_reused += 1;
                existing
            }
            None => {
                let at = self.make_space(vtable_len);
                self.buf[at..at + vtable_len].copy_from_slice(&vtable);
                let written = self.used_offset();
                self.written_vtables.push(written);
                written
            }
        };

        // vtable_pos = object_pos - soffset, with positions measured from the front.
        let soffset = (i64::from(vtable_offset) - i64::from(object)) as i32;
        let object_pos = self.buf.len() - object as usize;
        soffset.write_le(&mut self.buf[object_pos..object_pos + SIZE_SOFFSET]);

        self.field_locs.clear();
        self.state = State::Idle;
        Offset(object)
    }

    /// Write a NUL-terminated UTF-8 string.
    pub fn create_string(&mut self, value: &str) -> Offset {
        self.check_idle("create_string");
        self.push_vector(value.as_bytes(), true)
    }

    /// Write a length-prefixed byte vector.
    pub fn create_byte_vector(&mut self, bytes: &[u8]) -> Offset {
        self.check_idle("create_byte_vector");
        self.push_vector(bytes, false)
    }

    /// Write the root header and seal the buffer.
    pub fn finish(&mut self, root: Offset) {
        self.check_idle("finish");
        self.align(SIZE_UOFFSET, self.min_align);
        self.push_uoffset(root);
        self.state = State::Finished;
        log::trace!(
            "flatwire: finished buffer len={} vtables_written={} vtables_reused={}",
            self.used_space(),
            self.written_vtables.len(),
            self.vtables_reused
        );
    }

    /// Borrow the finished buffer.
    pub fn finished_data(&self) -> &[u8] {
        assert!(self.is_finished(), "finished_data called before finish");
        &self.buf[self.head..]
    }

    /// Take ownership of the finished buffer.
    pub fn into_finished_data(mut self) -> Vec<u8> {
        assert!(self.is_finished(), "into_finished_data called before finish");
        self.buf.drain(..self.head);
        self.buf
    }

    fn check_idle(&self, op: &str) {
        match self.state {
            State::Idle => {}
            State::Object { .. } => panic!("{op} called while an object is open"),
            State::Finished => panic!("{op} called on a finished buffer"),
        }
    }

    fn check_slot(&self, slot: u16, op: &str) {
        match self.state {
            State::Object { field_count, .. } => {
                assert!(
                    slot < field_count,
                    "{op}: slot {slot} out of range for an object with {field_count} fields"
                );
                assert!(
                    self.field_locs.iter().all(|loc| loc.slot != slot),
                    "{op}: slot {slot} written twice"
                );
            }
            State::Idle => panic!("{op} called without an open object"),
            State::Finished => panic!("{op} called on a finished buffer"),
        }
    }

    fn find_vtable(&self, vtable: &[u8]) -> Option<u32> {
        self.written_vtables.iter().copied().find(|&written| {
            let at = self.buf.len() - written as usize;
            self.buf.get(at..at + vtable.len()) == Some(vtable)
        })
    }

    fn push_vector(&mut self, bytes: &[u8], nul_terminated: bool) -> Offset {
        let len = u32::try_from(bytes.len())
            .ok()
            .filter(|len| (*len as usize) < MAX_BUFFER_SIZE)
            .unwrap_or_else(|| panic!("vector of {} bytes exceeds the buffer limit", bytes.len()));
        let terminator = usize::from(nul_terminated);
        self.align(bytes.len() + terminator, SIZE_UOFFSET);
        if nul_terminated {
            self.pad(1);
        }
        let at = self.make_space(bytes.len());
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        Offset(self.push(len))
    }

    fn push<T: Scalar>(&mut self, value: T) -> u32 {
        self.align(T::SIZE, T::SIZE);
        let at = self.make_space(T::SIZE);
        value.write_le(&mut self.buf[at..at + T::SIZE]);
        self.used_offset()
    }

    fn push_uoffset(&mut self, target: Offset) -> u32 {
        self.align(SIZE_UOFFSET, SIZE_UOFFSET);
        assert!(
            target.0 > 0 && target.0 as usize <= self.used_space(),
            "offset {} does not refer to data in this buffer",
            target.0
        );
        let at = self.make_space(SIZE_UOFFSET);
        let relative = self.used_offset() - target.0;
        relative.write_le(&mut self.buf[at..at + SIZE_UOFFSET]);
        self.used_offset()
    }

    /// Pad so that `len` more bytes end on an `alignment` boundary.
    fn align(&mut self, len: usize, alignment: usize) {
        self.min_align = self.min_align.max(alignment);
        let padding = (!(self.used_space() + len)).wrapping_add(1) & (alignment - 1);
        self.pad(padding);
    }

    fn pad(&mut self, len: usize) {
        let at = self.make_space(len);
        self.buf[at..at + len].fill(0);
    }

    fn make_space(&mut self, len: usize) -> usize {
        if len > self.head {
            self.grow(len);
        }
        self.head -= len;
        self.head
    }

    fn grow(&mut self, additional: usize) {
        let used = self.used_space();
        let needed = used + additional;
        assert!(needed <= MAX_BUFFER_SIZE, "buffer would exceed {MAX_BUFFER_SIZE} bytes");
        let mut capacity = self.buf.len().max(1);
        while capacity < needed {
            capacity = capacity.saturating_mul(2);
        }
        let capacity = capacity.min(MAX_BUFFER_SIZE);
        let mut grown = vec![0u8; capacity];
        grown[capacity - used..].copy_from_slice(&self.buf[self.head..]);
        self.head = capacity - used;
        self.buf = grown;
    }

    fn used_offset(&self) -> u32 {
        self.used_space() as u32
    }
}
