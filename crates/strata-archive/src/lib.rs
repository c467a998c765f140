//! Sequential little-endian archive used by every persisted strata format.
//!
//! Writers append to an in-memory buffer; readers walk a borrowed byte slice
//! and carry a sticky error flag so a failed field poisons the rest of a load.
//! File I/O happens elsewhere, the archive only ever touches memory.

mod error;
mod reader;
mod version;
mod writer;

pub use error::ArchiveError;
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;

/// Width of the element count written in front of a POD array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountPrefix {
    /// Signed 32-bit count.
    I32,
    /// Signed 64-bit count, for arrays that may exceed `i32::MAX` elements.
    I64,
}
