//! Binary `COPY` codec for Netezza, reading result streams into Apache Arrow record
//! batches and writing Arrow record batches out for bulk loads.
//!
//! Decoding starts from the row type of a result set, resolved against the server's type
//! catalog with an [`NzTypeResolver`]:
//!
//! ```rust
//! # fn main() -> netezza_copy::Result<()> {
//! use netezza_copy::{NzCopyOptions, NzCopyStreamReader, NzType, NzTypeResolver, ReadStatus};
//!
//! let resolver = NzTypeResolver::with_builtin_types();
//!
//! let mut row = NzType::record(0, "result");
//! row.append_child("id", &resolver.find(23)?);
//!
//! let mut reader = NzCopyStreamReader::new(row, NzCopyOptions::new().expect_header(false))?;
//! reader.infer_output_schema()?;
//! reader.init_field_readers()?;
//!
//! let mut input: &[u8] = &[0, 1, 0, 0, 0, 4, 0, 0, 0, 42, 0xff, 0xff];
//! while reader.read_record(&mut input)? == ReadStatus::Record {}
//!
//! let batch = reader.get_array()?;
//! assert_eq!(batch.num_rows(), 1);
//! # Ok(())
//! # }
//! ```

#[macro_use]
mod error;

mod io;
mod options;
mod resolver;
mod type_id;
mod type_info;

pub mod catalog;
pub mod copy;
pub mod types;

#[doc(inline)]
pub use self::{
    copy::{NzCopyStreamReader, NzCopyStreamWriter, ReadStatus, WriteStatus},
    error::{Error, Result},
    options::NzCopyOptions,
    resolver::{NzTypeItem, NzTypeResolver},
    type_id::NzTypeId,
    type_info::{NzType, TYPNAME_METADATA_KEY},
    types::{NzInterval, NzNumeric},
};
