use arrow::array::Array;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::{BufMut, Bytes};

use crate::copy::writer::{make_field_writer, CopyFieldWriter};
use crate::copy::{WriteStatus, END_OF_DATA, SIGNATURE};
use crate::error::{Error, Result};
use crate::io::NzBufMutExt;
use crate::resolver::NzTypeResolver;
use crate::type_id::NzTypeId;
use crate::type_info::NzType;

// What `rewind` restores.
#[derive(Debug, Copy, Clone, Default)]
struct Mark {
    buffer_len: usize,
    records_written: usize,
    header_written: bool,
    row: usize,
}

/// Encodes Arrow record batches as a binary COPY stream.
///
/// Rows accumulate in an internal buffer until [`flush`][Self::flush] hands them out.
/// If sending a flushed chunk fails, the caller can [`rewind`][Self::rewind] to the
/// previous flush and write the same rows again.
///
/// ```rust,no_run
/// # use netezza_copy::{NzCopyStreamWriter, NzTypeResolver, WriteStatus};
/// # fn example(batch: arrow::record_batch::RecordBatch) -> netezza_copy::Result<()> {
/// let resolver = NzTypeResolver::with_builtin_types();
/// let mut writer = NzCopyStreamWriter::new(batch.schema(), &resolver)?;
///
/// writer.write_header()?;
/// writer.set_array(batch)?;
/// while writer.write_record()? == WriteStatus::Record {}
/// writer.write_trailer();
///
/// let chunk = writer.flush();
/// # drop(chunk);
/// # Ok(())
/// # }
/// ```
pub struct NzCopyStreamWriter {
    schema: SchemaRef,
    target: NzType,
    writers: Vec<Box<dyn CopyFieldWriter>>,
    batch: Option<RecordBatch>,
    buffer: Vec<u8>,
    row: usize,
    records_written: usize,
    header_written: bool,
    mark: Mark,
}

impl NzCopyStreamWriter {
    /// Creates a writer whose target types are derived from `schema`.
    pub fn new(schema: SchemaRef, resolver: &NzTypeResolver) -> Result<Self> {
        let mut target = NzType::record(0, "record");

        for field in schema.fields() {
            let ty = NzType::from_data_type(resolver, field.data_type())?;
            target.append_child(field.name().as_str(), &ty);
        }

        NzCopyStreamWriter::with_target(schema, target)
    }

    /// Creates a writer that encodes `schema`'s columns as the members of `target`, such
    /// as the columns of the table being loaded.
    pub fn with_target(schema: SchemaRef, target: NzType) -> Result<Self> {
        if target.type_id() != NzTypeId::Record || target.n_children() != schema.fields().len()
        {
            return Err(Error::unsupported(
                format!("Arrow schema with {} fields", schema.fields().len()),
                format!(
                    "Netezza type '{}' with {} columns",
                    target.display_name(),
                    target.n_children()
                ),
            ));
        }

        let writers = schema
            .fields()
            .iter()
            .zip(target.children())
            .map(|(field, ty)| make_field_writer(field.data_type(), ty))
            .collect::<Result<Vec<_>>>()?;

        Ok(NzCopyStreamWriter {
            schema,
            target,
            writers,
            batch: None,
            buffer: Vec::new(),
            row: 0,
            records_written: 0,
            header_written: false,
            mark: Mark::default(),
        })
    }

    /// Binds the batch whose rows the following calls to `write_record` encode.
    pub fn set_array(&mut self, batch: RecordBatch) -> Result<()> {
        let expected = self.schema.fields().iter().map(|field| field.data_type());
        let actual = batch.schema_ref().fields().iter().map(|field| field.data_type());

        if batch.num_columns() != self.schema.fields().len() || !expected.eq(actual) {
            return Err(Error::unsupported(
                "a record batch with a different schema",
                "the schema of this writer",
            ));
        }

        self.batch = Some(batch);
        self.row = 0;
        self.mark = self.position();

        Ok(())
    }

    /// Writes the stream header; only the first call per stream is allowed.
    pub fn write_header(&mut self) -> Result<()> {
        if self.header_written {
            return Err(Error::InvalidState("the header has already been written"));
        }

        self.buffer.extend_from_slice(SIGNATURE);
        // flags
        self.buffer.put_u32(0);
        // header extension length
        self.buffer.put_u32(0);

        self.header_written = true;

        Ok(())
    }

    /// Encodes the next row of the bound batch.
    ///
    /// On failure nothing of the row is left in the buffer and the row is not consumed.
    pub fn write_record(&mut self) -> Result<WriteStatus> {
        let Some(batch) = &self.batch else {
            return Err(Error::InvalidState("no record batch has been bound"));
        };

        if self.row >= batch.num_rows() {
            return Ok(WriteStatus::EndOfData);
        }

        let n_fields = i16::try_from(self.writers.len()).map_err(|_| {
            Error::Encode(format!("too many columns for COPY: {}", self.writers.len()))
        })?;

        let start = self.buffer.len();
        self.buffer.put_i16(n_fields);

        for (index, (column, writer)) in batch.columns().iter().zip(&self.writers).enumerate() {
            if column.is_null(self.row) {
                self.buffer.put_null_field();
                continue;
            }

            if let Err(source) = writer.write(column.as_ref(), self.row, &mut self.buffer) {
                self.buffer.truncate(start);

                return Err(Error::ColumnEncode {
                    index,
                    name: self.schema.field(index).name().clone(),
                    row: self.row,
                    source: Box::new(source),
                });
            }
        }

        self.row += 1;
        self.records_written += 1;

        Ok(WriteStatus::Record)
    }

    /// Writes the end-of-data marker.
    pub fn write_trailer(&mut self) {
        self.buffer.put_i16(END_OF_DATA);
    }

    /// The bytes written since the last flush.
    pub fn write_buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Takes the bytes written since the last flush.
    pub fn flush(&mut self) -> Bytes {
        let chunk = Bytes::from(std::mem::take(&mut self.buffer));
        self.mark = self.position();

        tracing::debug!(
            bytes = chunk.len(),
            records_written = self.records_written,
            "flushed COPY buffer"
        );

        chunk
    }

    /// Discards everything written since the last flush (or since the current batch was
    /// bound, if that came later) and moves back to the first row not yet flushed.
    pub fn rewind(&mut self) {
        let discarded = self.buffer.len() - self.mark.buffer_len.min(self.buffer.len());

        self.buffer.truncate(self.mark.buffer_len);
        self.records_written = self.mark.records_written;
        self.header_written = self.mark.header_written;
        self.row = self.mark.row;

        tracing::debug!(
            discarded,
            row = self.row,
            "rewound COPY writer"
        );
    }

    /// Records written over the life of the writer, not counting rewound ones.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The record type the columns are written as.
    pub fn target(&self) -> &NzType {
        &self.target
    }

    fn position(&self) -> Mark {
        Mark {
            buffer_len: self.buffer.len(),
            records_written: self.records_written,
            header_written: self.header_written,
            row: self.row,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{ArrayRef, Int32Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;

    use super::NzCopyStreamWriter;
    use crate::{Error, NzTypeResolver, WriteStatus};

    fn batch() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "a",
                Arc::new(Int32Array::from(vec![Some(1), None])) as ArrayRef,
            ),
            (
                "b",
                Arc::new(StringArray::from(vec!["x", "1.5"])) as ArrayRef,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn it_writes_header_rows_and_trailer() -> crate::Result<()> {
        let batch = batch();
        let resolver = NzTypeResolver::with_builtin_types();
        let mut writer = NzCopyStreamWriter::new(batch.schema(), &resolver)?;

        assert!(matches!(writer.write_record(), Err(Error::InvalidState(_))));

        writer.write_header()?;
        assert!(matches!(writer.write_header(), Err(Error::InvalidState(_))));

        writer.set_array(batch)?;
        assert_eq!(writer.write_record()?, WriteStatus::Record);
        assert_eq!(writer.write_record()?, WriteStatus::Record);
        assert_eq!(writer.write_record()?, WriteStatus::EndOfData);
        writer.write_trailer();

        let mut expected = b"PGCOPY\n\xff\r\n\0".to_vec();
        expected.extend_from_slice(&[0; 8]);
        expected.extend_from_slice(&[0, 2, 0, 0, 0, 4, 0, 0, 0, 1, 0, 0, 0, 1, b'x']);
        expected.extend_from_slice(&[0, 2, 0xff, 0xff, 0xff, 0xff, 0, 0, 0, 3, b'1', b'.', b'5']);
        expected.extend_from_slice(&[0xff, 0xff]);

        assert_eq!(writer.write_buffer(), &expected[..]);
        assert_eq!(writer.flush(), expected);
        assert!(writer.write_buffer().is_empty());
        assert_eq!(writer.records_written(), 2);

        Ok(())
    }

    #[test]
    fn failed_rows_leave_no_bytes() -> crate::Result<()> {
        let batch = batch();
        let schema = batch.schema();

        let mut target = crate::NzType::record(0, "t");
        target.append_child(
            "a",
            &crate::NzType::new(crate::NzTypeId::Int4).with_type_info(23, "int4"),
        );
        target.append_child(
            "b",
            &crate::NzType::new(crate::NzTypeId::Numeric).with_type_info(1700, "numeric"),
        );

        let mut writer = NzCopyStreamWriter::with_target(schema, target)?;
        writer.set_array(batch)?;

        let err = writer.write_record().unwrap_err();
        assert!(matches!(
            err,
            Error::ColumnEncode {
                index: 1,
                row: 0,
                ..
            }
        ));
        assert!(writer.write_buffer().is_empty());
        assert_eq!(writer.records_written(), 0);

        Ok(())
    }

    #[test]
    fn batches_must_match_the_schema() -> crate::Result<()> {
        let resolver = NzTypeResolver::with_builtin_types();
        let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, true)]));
        let mut writer = NzCopyStreamWriter::new(schema, &resolver)?;

        assert!(writer.set_array(batch()).is_err());

        Ok(())
    }
}
