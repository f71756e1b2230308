use arrow::array::{ArrayRef, BooleanBufferBuilder};
use arrow::buffer::NullBuffer;
use arrow::datatypes::{
    DataType, Date32Type, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    IntervalUnit, Time64MicrosecondType, TimeUnit, TimestampMicrosecondType,
};

use crate::error::{Error, Result};
use crate::options::NzCopyOptions;
use crate::type_id::NzTypeId;
use crate::type_info::NzType;
use crate::types::time::{DATE_EPOCH_DAYS, TIMESTAMP_EPOCH_MICROS};

mod nested;
mod scalar;
mod stream;

pub use stream::NzCopyStreamReader;

use nested::{ArrayFieldReader, RecordFieldReader};
use scalar::{
    BooleanFieldReader, ByteFieldReader, IntervalFieldReader, NetworkEndianFieldReader,
    NumericFieldReader,
};

/// Decodes the values of one column into Arrow buffers.
///
/// Readers own their buffers so a partially read row can be undone with
/// [`CopyFieldReader::truncate`]; nested readers own their children.
pub(crate) trait CopyFieldReader: Send {
    /// Consumes one field of `field_size` bytes (`-1` for null) and appends its value.
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()>;

    /// Number of values appended so far.
    fn len(&self) -> usize;

    /// Drops every value past the first `len`.
    fn truncate(&mut self, len: usize);

    /// Assembles the appended values into an array and resets the reader.
    fn finish(&mut self) -> Result<ArrayRef>;
}

/// Validity bitmap shared by all readers.
#[derive(Debug)]
pub(crate) struct Validity {
    bits: BooleanBufferBuilder,
    nulls: usize,
}

impl Validity {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Validity {
            bits: BooleanBufferBuilder::new(capacity),
            nulls: 0,
        }
    }

    #[inline]
    pub(crate) fn append(&mut self, valid: bool) {
        self.bits.append(valid);
        self.nulls += usize::from(!valid);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.bits.len()
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        if len >= self.bits.len() {
            return;
        }

        let dropped_nulls = (len..self.bits.len())
            .filter(|i| !self.bits.get_bit(*i))
            .count();

        self.bits.truncate(len);
        self.nulls -= dropped_nulls;
    }

    pub(crate) fn finish(&mut self) -> Option<NullBuffer> {
        let nulls = std::mem::take(&mut self.nulls);
        let bits = self.bits.finish();

        (nulls > 0).then(|| NullBuffer::new(bits))
    }
}

/// Interprets a field length: `None` for null, the byte count otherwise.
#[inline]
pub(crate) fn field_len(field_size: i32) -> Result<Option<usize>> {
    match field_size {
        -1 => Ok(None),
        size => usize::try_from(size)
            .map(Some)
            .map_err(|_| err_malformed!("invalid field length: {}", size)),
    }
}

/// Fails unless a fixed-width field has the expected size.
#[inline]
pub(crate) fn expect_size(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(err_malformed!(
            "expected field with {} bytes but found field with {} bytes",
            expected,
            actual
        ));
    }

    Ok(())
}

fn cant_convert(ty: &NzType, data_type: &DataType) -> Error {
    Error::unsupported(
        format!("Netezza type '{}'", ty.display_name()),
        format!("Arrow type '{data_type}'"),
    )
}

/// Builds the reader that decodes values of `ty` into `field`'s Arrow type.
pub(crate) fn make_field_reader(
    ty: &NzType,
    field: &Field,
    options: &NzCopyOptions,
) -> Result<Box<dyn CopyFieldReader>> {
    use NzTypeId::*;

    let capacity = options.row_capacity;
    let data_type = field.data_type();

    let reader: Box<dyn CopyFieldReader> = match (data_type, ty.type_id()) {
        (DataType::Boolean, Bool) => Box::new(BooleanFieldReader::with_capacity(capacity)),

        (DataType::Int16, Int2) => {
            Box::new(NetworkEndianFieldReader::<Int16Type>::new(data_type, capacity))
        }
        (DataType::Int32, Int4 | Oid | Regproc) => {
            Box::new(NetworkEndianFieldReader::<Int32Type>::new(data_type, capacity))
        }
        (DataType::Int64, Int8) => {
            Box::new(NetworkEndianFieldReader::<Int64Type>::new(data_type, capacity))
        }
        (DataType::Float32, Float4) => {
            Box::new(NetworkEndianFieldReader::<Float32Type>::new(data_type, capacity))
        }
        (DataType::Float64, Float8) => {
            Box::new(NetworkEndianFieldReader::<Float64Type>::new(data_type, capacity))
        }

        (
            DataType::Utf8,
            Char | Varchar | Text | Bpchar | Name | Nchar | Nvarchar | Json | Jsonb | Jsonpath,
        ) => Box::new(ByteFieldReader::utf8(capacity)),

        (DataType::Utf8, Numeric) => Box::new(NumericFieldReader::with_capacity(capacity)),

        // the COPY bytes of any type can be surfaced as binary
        (DataType::Binary, _) => Box::new(ByteFieldReader::binary(capacity)),

        (DataType::List(child_field), Array) => {
            let child_ty = match ty.children() {
                [child] => child,
                children => {
                    return Err(Error::unsupported(
                        format!(
                            "Netezza array type '{}' with {} children",
                            ty.display_name(),
                            children.len()
                        ),
                        format!("Arrow type '{data_type}'"),
                    ))
                }
            };

            let child = make_field_reader(child_ty, child_field, options)?;
            Box::new(ArrayFieldReader::new(child_field.clone(), child, capacity))
        }

        (DataType::Struct(fields), Record) => {
            if fields.len() != ty.n_children() {
                return Err(Error::unsupported(
                    format!(
                        "Netezza record type '{}' with {} children",
                        ty.display_name(),
                        ty.n_children()
                    ),
                    format!("Arrow struct type with {} children", fields.len()),
                ));
            }

            let children = ty
                .children()
                .iter()
                .zip(fields.iter())
                .map(|(child_ty, child_field)| make_field_reader(child_ty, child_field, options))
                .collect::<Result<Vec<_>>>()?;

            let expected_oids = ty.children().iter().map(NzType::oid).collect();

            Box::new(RecordFieldReader::new(
                fields.clone(),
                children,
                expected_oids,
                options.validate_record_oids,
                capacity,
            ))
        }

        (DataType::Date32, Date) => Box::new(
            NetworkEndianFieldReader::<Date32Type>::new(data_type, capacity)
                .with_offset(DATE_EPOCH_DAYS),
        ),

        (DataType::Time64(TimeUnit::Microsecond), Time) => Box::new(
            NetworkEndianFieldReader::<Time64MicrosecondType>::new(data_type, capacity),
        ),

        (DataType::Timestamp(TimeUnit::Microsecond, _), Timestamp) => {
            Box::new(
                NetworkEndianFieldReader::<TimestampMicrosecondType>::new(data_type, capacity)
                    .with_offset(TIMESTAMP_EPOCH_MICROS),
            )
        }

        (DataType::Interval(IntervalUnit::MonthDayNano), Interval) => {
            Box::new(IntervalFieldReader::with_capacity(capacity))
        }

        _ => return Err(cant_convert(ty, data_type)),
    };

    Ok(reader)
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field};

    use super::{field_len, make_field_reader, Validity};
    use crate::{Error, NzCopyOptions, NzType, NzTypeId};

    #[test]
    fn validity_truncate_forgets_dropped_nulls() {
        let mut validity = Validity::with_capacity(4);
        validity.append(true);
        validity.append(false);
        validity.append(false);

        validity.truncate(2);
        assert_eq!(validity.len(), 2);

        let nulls = validity.finish().expect("one null remains");
        assert_eq!(nulls.null_count(), 1);
        assert!(nulls.is_null(1));

        validity.append(true);
        assert!(validity.finish().is_none());
    }

    #[test]
    fn field_lengths() {
        assert_eq!(field_len(-1).ok(), Some(None));
        assert_eq!(field_len(0).ok(), Some(Some(0)));
        assert!(field_len(-2).unwrap_err().is_malformed());
    }

    #[test]
    fn unsupported_conversions_name_both_types() {
        let ty = NzType::new(NzTypeId::Int4).with_type_info(23, "INT4");
        let field = Field::new("a", DataType::Utf8, true);

        let err = make_field_reader(&ty, &field, &NzCopyOptions::new())
            .err()
            .expect("int4 can't be read as utf8");

        assert!(matches!(err, Error::UnsupportedConversion { .. }));
        assert_eq!(
            err.to_string(),
            "can't convert Netezza type 'INT4' to Arrow type 'Utf8'"
        );
    }
}
