//! # flatwire-table
//!
//! Builder and zero-copy reader for vtable-addressed binary tables.
//!
//! A buffer is written back to front by [`Builder`]: children first, then
//! the objects that point at them, then a 4-byte root header. Readers wrap
//! the finished bytes in a [`Table`] and resolve fields through each
//! object's vtable without copying.
//!
//! ## Layout
//!
//! ```text
//! [root:u32] ... [vtable] [object] ... [string] ...
//!
//! object: [soffset:i32][fields...]      vtable_pos = object_pos - soffset
//! vtable: [vtable_len:u16][object_len:u16][slot0:u16][slot1:u16]...
//! string: [len:u32][utf8 bytes][0x00]
//! ```
//!
//! All integers are little-endian. Offset fields are relative to their own
//! position: `target = field_pos + value`.
//!
//! ## Example
//!
//! ```rust
//! use flatwire_table::{root_table, Builder};
//!
//! let mut builder = Builder::new();
//! builder.start_object(2);
//! builder.push_slot::<i32>(1, 42, 0);
//! let root = builder.end_object();
//! builder.finish(root);
//!
//! let table = root_table(builder.finished_data()).unwrap();
//! assert_eq!(table.get::<i32>(1, 0).unwrap(), 42);
//! assert_eq!(table.get::<i32>(0, -1).unwrap(), -1);
//! ```

mod builder;
mod error;
mod scalar;
mod table;

pub use builder::{Builder, BuilderOptions, Offset, MAX_INITIAL_CAPACITY};
pub use error::WireError;
pub use scalar::Scalar;
pub use table::{read_scalar, root_table, Record, Table, VTable};

/// Size of an unsigned offset, also the size of the root header.
pub const SIZE_UOFFSET: usize = 4;

/// Size of the signed vtable offset at the start of every object.
pub const SIZE_SOFFSET: usize = 4;

/// Size of one vtable entry.
pub const SIZE_VOFFSET: usize = 2;

/// `[vtable_len:u16][object_len:u16]`
pub const VTABLE_HEADER_SIZE: usize = 4;

/// Minimum length of a readable buffer.
pub const HEADER_SIZE: usize = SIZE_UOFFSET;

/// Offsets are 32-bit and signed offsets must stay positive.
pub const MAX_BUFFER_SIZE: usize = i32::MAX as usize;

/// Byte offset of `slot`'s entry inside a vtable.
pub const fn slot_voffset(slot: u16) -> u16 {
    VTABLE_HEADER_SIZE as u16 + SIZE_VOFFSET as u16 * slot
}
