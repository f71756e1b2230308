//! The binary `COPY` format.
//!
//! A stream is an optional header ([`SIGNATURE`], `u32` flags, `u32` extension length and
//! the extension bytes) followed by tuples. Each tuple is an `i16` field count and, for
//! each field, an `i32` length (`-1` for null) and that many bytes. A tuple with a field
//! count of `-1` ends the data.

mod reader;
mod writer;

pub use reader::NzCopyStreamReader;
pub use writer::NzCopyStreamWriter;

/// The signature that begins every binary COPY stream.
pub const SIGNATURE: &[u8; 11] = b"PGCOPY\n\xff\r\n\0";

/// The field count of the tuple that terminates the data.
pub const END_OF_DATA: i16 = -1;

/// The outcome of decoding one tuple.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadStatus {
    /// A record was appended to the pending batch.
    Record,

    /// The end-of-data marker was read; no more records follow.
    EndOfData,
}

/// The outcome of encoding one row.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    /// A record was appended to the write buffer.
    Record,

    /// Every row of the bound batch has been written.
    EndOfData,
}
