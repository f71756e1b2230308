use std::sync::Arc;

use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};

use crate::copy::reader::{make_field_reader, CopyFieldReader};
use crate::copy::{ReadStatus, END_OF_DATA, SIGNATURE};
use crate::error::{Error, Result};
use crate::io::NzBufExt;
use crate::options::NzCopyOptions;
use crate::type_id::NzTypeId;
use crate::type_info::NzType;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    SchemaPending,
    ReadersPending,
    HeaderPending,
    RecordReady,
    Exhausted,
}

/// Decodes a binary COPY stream into Arrow record batches.
///
/// The reader is driven by the caller, which feeds it whatever bytes have arrived so far:
///
/// ```rust,no_run
/// # use netezza_copy::{NzCopyOptions, NzCopyStreamReader, NzType, ReadStatus};
/// # fn example(root: NzType, mut input: &[u8]) -> netezza_copy::Result<()> {
/// let mut reader = NzCopyStreamReader::new(root, NzCopyOptions::new())?;
/// reader.infer_output_schema()?;
/// reader.init_field_readers()?;
/// reader.read_header(&mut input)?;
///
/// while reader.read_record(&mut input)? == ReadStatus::Record {
///     if reader.batch_size_reached() {
///         let batch = reader.get_array()?;
///         # drop(batch);
///     }
/// }
///
/// let last = reader.get_array()?;
/// # drop(last);
/// # Ok(())
/// # }
/// ```
///
/// A read that runs out of input fails with [`Error::UnexpectedEof`] and leaves both the
/// cursor and the pending batch as they were before the record, so it can be retried once
/// more bytes are available.
pub struct NzCopyStreamReader {
    ty: NzType,
    options: NzCopyOptions,
    schema: Option<SchemaRef>,
    readers: Vec<Box<dyn CopyFieldReader>>,
    state: State,
    rows: usize,
    array_size_approx_bytes: usize,
}

impl NzCopyStreamReader {
    /// Creates a reader for rows of the record type `ty`.
    pub fn new(ty: NzType, options: NzCopyOptions) -> Result<Self> {
        if ty.type_id() != NzTypeId::Record {
            return Err(Error::unsupported(
                format!("Netezza type '{}'", ty.display_name()),
                "a COPY row (expected a record type)",
            ));
        }

        Ok(NzCopyStreamReader {
            ty,
            options,
            schema: None,
            readers: Vec::new(),
            state: State::SchemaPending,
            rows: 0,
            array_size_approx_bytes: 0,
        })
    }

    /// Decodes into `schema` instead of the schema derived from the row type.
    pub fn set_output_schema(&mut self, schema: SchemaRef) -> Result<()> {
        self.expect_schema_unset()?;

        if schema.fields().len() != self.ty.n_children() {
            return Err(Error::unsupported(
                format!(
                    "Netezza row type with {} columns",
                    self.ty.n_children()
                ),
                format!("Arrow schema with {} fields", schema.fields().len()),
            ));
        }

        self.schema = Some(schema);
        self.state = State::ReadersPending;

        Ok(())
    }

    /// Derives the output schema from the row type.
    pub fn infer_output_schema(&mut self) -> Result<SchemaRef> {
        self.expect_schema_unset()?;

        let fields = self
            .ty
            .children()
            .iter()
            .map(NzType::to_field)
            .collect::<Vec<_>>();

        let schema = Arc::new(Schema::new(fields));

        self.schema = Some(schema.clone());
        self.state = State::ReadersPending;

        Ok(schema)
    }

    /// Builds the decoder of every column of the output schema.
    pub fn init_field_readers(&mut self) -> Result<()> {
        if self.state != State::ReadersPending {
            return Err(Error::InvalidState(
                "field readers need an output schema and can only be built once",
            ));
        }

        let schema = self.get_schema()?;

        self.readers = self
            .ty
            .children()
            .iter()
            .zip(schema.fields().iter())
            .map(|(ty, field)| make_field_reader(ty, field, &self.options))
            .collect::<Result<Vec<_>>>()?;

        self.state = if self.options.expect_header {
            State::HeaderPending
        } else {
            State::RecordReady
        };

        Ok(())
    }

    /// Consumes and validates the stream header.
    pub fn read_header(&mut self, buf: &mut &[u8]) -> Result<()> {
        if self.state != State::HeaderPending {
            return Err(Error::InvalidState(
                "the header is read once, after the field readers are built",
            ));
        }

        let mut cursor = *buf;

        let signature = cursor.split_bytes(SIGNATURE.len())?;
        if signature != SIGNATURE {
            return Err(err_malformed!(
                "unexpected COPY signature: {:?}",
                signature
            ));
        }

        let flags = cursor.get_checked::<u32>()?;
        let extension_len = cursor.get_checked::<u32>()?;

        let extension_len = usize::try_from(extension_len)
            .map_err(|_| err_malformed!("header extension too large: {}", extension_len))?;

        cursor.split_bytes(extension_len)?;

        tracing::debug!(flags, extension_len, "read COPY header");

        *buf = cursor;
        self.state = State::RecordReady;

        Ok(())
    }

    /// Consumes one tuple, appending its values to the pending batch.
    ///
    /// Returns [`ReadStatus::EndOfData`] once the end-of-data marker has been read; every
    /// later call does the same without consuming input.
    pub fn read_record(&mut self, buf: &mut &[u8]) -> Result<ReadStatus> {
        match self.state {
            State::RecordReady => {}
            State::Exhausted => return Ok(ReadStatus::EndOfData),
            State::HeaderPending => {
                return Err(Error::InvalidState("the header must be read before records"))
            }
            State::SchemaPending | State::ReadersPending => {
                return Err(Error::InvalidState(
                    "field readers must be built before records are read",
                ))
            }
        }

        let mut cursor = *buf;

        let n_fields = cursor.get_checked::<i16>()?;
        if n_fields == END_OF_DATA {
            *buf = cursor;
            self.state = State::Exhausted;

            return Ok(ReadStatus::EndOfData);
        }

        if usize::try_from(n_fields).ok() != Some(self.readers.len()) {
            return Err(err_malformed!(
                "expected {} fields but found a tuple with {}",
                self.readers.len(),
                n_fields
            ));
        }

        if let Err(source) = self.read_fields(&mut cursor) {
            for reader in &mut self.readers {
                reader.truncate(self.rows);
            }

            return Err(source);
        }

        self.array_size_approx_bytes += buf.len() - cursor.len();
        self.rows += 1;
        *buf = cursor;

        Ok(ReadStatus::Record)
    }

    fn read_fields(&mut self, cursor: &mut &[u8]) -> Result<()> {
        for (index, reader) in self.readers.iter_mut().enumerate() {
            let result = cursor
                .get_checked::<i32>()
                .and_then(|field_size| reader.read(cursor, field_size));

            if let Err(source) = result {
                return Err(Error::ColumnDecode {
                    index,
                    name: self
                        .ty
                        .child(index)
                        .map(|child| child.field_name().to_owned())
                        .unwrap_or_default(),
                    source: Box::new(source),
                });
            }
        }

        Ok(())
    }

    /// A running estimate of the bytes decoded into the pending batch.
    pub fn array_size_approx_bytes(&self) -> usize {
        self.array_size_approx_bytes
    }

    /// Returns `true` once the pending batch has grown past the configured size hint.
    pub fn batch_size_reached(&self) -> bool {
        self.options.batch_size_reached(self.array_size_approx_bytes)
    }

    pub fn get_schema(&self) -> Result<SchemaRef> {
        self.schema
            .clone()
            .ok_or(Error::InvalidState("the output schema has not been set"))
    }

    /// Hands out the rows read since the last call as a record batch.
    pub fn get_array(&mut self) -> Result<RecordBatch> {
        if matches!(self.state, State::SchemaPending | State::ReadersPending) {
            return Err(Error::InvalidState(
                "field readers must be built before a batch is taken",
            ));
        }

        let schema = self.get_schema()?;

        let columns = self
            .readers
            .iter_mut()
            .map(|reader| reader.finish())
            .collect::<Result<Vec<_>>>()?;

        let options = RecordBatchOptions::new().with_row_count(Some(self.rows));
        let batch = RecordBatch::try_new_with_options(schema, columns, &options)?;

        tracing::debug!(
            rows = self.rows,
            approx_bytes = self.array_size_approx_bytes,
            "finished COPY batch"
        );

        self.rows = 0;
        self.array_size_approx_bytes = 0;

        Ok(batch)
    }

    /// The row type being decoded.
    pub fn ty(&self) -> &NzType {
        &self.ty
    }

    /// Rows in the pending batch.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns `true` once the end-of-data marker has been read.
    pub fn is_exhausted(&self) -> bool {
        self.state == State::Exhausted
    }

    fn expect_schema_unset(&self) -> Result<()> {
        if self.state != State::SchemaPending {
            return Err(Error::InvalidState("the output schema is already set"));
        }

        Ok(())
    }
}
