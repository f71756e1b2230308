use arrow::array::Array;
use arrow::datatypes::{
    BinaryType, DataType, Date32Type, DurationMicrosecondType, DurationMillisecondType,
    DurationNanosecondType, DurationSecondType, Float32Type, Float64Type, Int16Type, Int32Type,
    Int64Type, Int8Type, IntervalUnit, LargeBinaryType, LargeUtf8Type, Time64MicrosecondType,
    TimeUnit, TimestampMicrosecondType, TimestampMillisecondType, TimestampNanosecondType,
    TimestampSecondType, UInt16Type, UInt32Type, UInt64Type, UInt8Type, Utf8Type,
};

use crate::error::{Error, Result};
use crate::type_id::NzTypeId;
use crate::type_info::NzType;
use crate::types::time::DATE_EPOCH_DAYS;

mod nested;
mod scalar;
mod stream;

pub use stream::NzCopyStreamWriter;

use nested::{ListFieldWriter, StructFieldWriter};
use scalar::{
    BooleanFieldWriter, ByteFieldWriter, Decimal128FieldWriter, DictionaryFieldWriter,
    DurationFieldWriter, FixedSizeBinaryFieldWriter, IntegerNumericFieldWriter,
    IntervalFieldWriter, NetworkEndianFieldWriter, NullFieldWriter, NumericStringFieldWriter,
    TimestampFieldWriter,
};

/// Encodes the values of one column in the wire format of its target type.
pub(crate) trait CopyFieldWriter: Send + Sync {
    /// Appends the length-prefixed value at `index`, which the caller has checked is not
    /// null.
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()>;
}

/// Fails when an array does not have the type its writer was built for.
pub(crate) fn unexpected_array(array: &dyn Array) -> Error {
    Error::unsupported(
        format!("Arrow array of type '{}'", array.data_type()),
        "the writer built for its column",
    )
}

fn cant_convert(data_type: &DataType, target: &NzType) -> Error {
    Error::unsupported(
        format!("Arrow type '{data_type}'"),
        format!("Netezza type '{}'", target.display_name()),
    )
}

// Picks the wire width from the target and the value type from the Arrow type.
macro_rules! integer_writer {
    ($arrow:ty, $target:expr, $data_type:expr) => {{
        let writer: Box<dyn CopyFieldWriter> = match $target.type_id() {
            NzTypeId::Int2 => Box::new(NetworkEndianFieldWriter::<$arrow, i16>::new()),
            NzTypeId::Int4 => Box::new(NetworkEndianFieldWriter::<$arrow, i32>::new()),
            NzTypeId::Int8 => Box::new(NetworkEndianFieldWriter::<$arrow, i64>::new()),
            NzTypeId::Numeric => Box::new(IntegerNumericFieldWriter::<$arrow>::new()),
            _ => return Err(cant_convert($data_type, $target)),
        };

        writer
    }};
}

macro_rules! dictionary_writer {
    ($key_type:expr, $values:expr, { $($variant:ident => $arrow:ty),* }) => {
        match $key_type {
            $(
                DataType::$variant => {
                    Box::new(DictionaryFieldWriter::<$arrow>::new($values)) as Box<dyn CopyFieldWriter>
                }
            )*
            other => {
                return Err(Error::unsupported(
                    format!("Arrow dictionary with '{other}' keys"),
                    "a Netezza type",
                ))
            }
        }
    };
}

/// Builds the writer that encodes values of `data_type` as the database type `target`.
pub(crate) fn make_field_writer(
    data_type: &DataType,
    target: &NzType,
) -> Result<Box<dyn CopyFieldWriter>> {
    use NzTypeId::*;

    let writer: Box<dyn CopyFieldWriter> = match (data_type, target.type_id()) {
        (DataType::Null, _) => Box::new(NullFieldWriter),

        (DataType::Boolean, Bool) => Box::new(BooleanFieldWriter),

        (DataType::Int8, _) => integer_writer!(Int8Type, target, data_type),
        (DataType::Int16, _) => integer_writer!(Int16Type, target, data_type),
        (DataType::Int32, _) => integer_writer!(Int32Type, target, data_type),
        (DataType::Int64, _) => integer_writer!(Int64Type, target, data_type),
        (DataType::UInt8, _) => integer_writer!(UInt8Type, target, data_type),
        (DataType::UInt16, _) => integer_writer!(UInt16Type, target, data_type),
        (DataType::UInt32, _) => integer_writer!(UInt32Type, target, data_type),
        (DataType::UInt64, _) => integer_writer!(UInt64Type, target, data_type),

        (DataType::Float32, Float4) => Box::new(NetworkEndianFieldWriter::<Float32Type, f32>::new()),
        (DataType::Float32, Float8) => Box::new(NetworkEndianFieldWriter::<Float32Type, f64>::new()),
        (DataType::Float64, Float8) => Box::new(NetworkEndianFieldWriter::<Float64Type, f64>::new()),

        (DataType::Date32, Date) => Box::new(
            NetworkEndianFieldWriter::<Date32Type, i32>::new().with_offset(DATE_EPOCH_DAYS),
        ),

        (DataType::Time64(TimeUnit::Microsecond), Time) => {
            Box::new(NetworkEndianFieldWriter::<Time64MicrosecondType, i64>::new())
        }

        (DataType::Timestamp(unit, _), Timestamp) => match unit {
            TimeUnit::Second => Box::new(TimestampFieldWriter::<TimestampSecondType>::new()),
            TimeUnit::Millisecond => {
                Box::new(TimestampFieldWriter::<TimestampMillisecondType>::new())
            }
            TimeUnit::Microsecond => {
                Box::new(TimestampFieldWriter::<TimestampMicrosecondType>::new())
            }
            TimeUnit::Nanosecond => {
                Box::new(TimestampFieldWriter::<TimestampNanosecondType>::new())
            }
        },

        (DataType::Duration(unit), Interval) => match unit {
            TimeUnit::Second => Box::new(DurationFieldWriter::<DurationSecondType>::new(*unit)),
            TimeUnit::Millisecond => {
                Box::new(DurationFieldWriter::<DurationMillisecondType>::new(*unit))
            }
            TimeUnit::Microsecond => {
                Box::new(DurationFieldWriter::<DurationMicrosecondType>::new(*unit))
            }
            TimeUnit::Nanosecond => {
                Box::new(DurationFieldWriter::<DurationNanosecondType>::new(*unit))
            }
        },

        (DataType::Interval(IntervalUnit::MonthDayNano), Interval) => {
            Box::new(IntervalFieldWriter)
        }

        (DataType::Utf8, Numeric) => Box::new(NumericStringFieldWriter::<i32>::new()),
        (DataType::LargeUtf8, Numeric) => Box::new(NumericStringFieldWriter::<i64>::new()),

        (DataType::Decimal128(_, scale), Numeric) => {
            Box::new(Decimal128FieldWriter::new(*scale))
        }

        (DataType::Utf8, ty) if writes_bytes(ty) => {
            Box::new(ByteFieldWriter::<Utf8Type>::new())
        }
        (DataType::LargeUtf8, ty) if writes_bytes(ty) => {
            Box::new(ByteFieldWriter::<LargeUtf8Type>::new())
        }
        (DataType::Binary, ty) if writes_bytes(ty) => {
            Box::new(ByteFieldWriter::<BinaryType>::new())
        }
        (DataType::LargeBinary, ty) if writes_bytes(ty) => {
            Box::new(ByteFieldWriter::<LargeBinaryType>::new())
        }
        (DataType::FixedSizeBinary(_), ty) if writes_bytes(ty) => {
            Box::new(FixedSizeBinaryFieldWriter)
        }

        (DataType::Dictionary(key_type, value_type), _) => {
            let values = make_field_writer(value_type, target)?;

            dictionary_writer!(key_type.as_ref(), values, {
                Int8 => Int8Type,
                Int16 => Int16Type,
                Int32 => Int32Type,
                Int64 => Int64Type,
                UInt8 => UInt8Type,
                UInt16 => UInt16Type,
                UInt32 => UInt32Type,
                UInt64 => UInt64Type
            })
        }

        (DataType::List(field) | DataType::LargeList(field), NzTypeId::Array) => {
            let element = target
                .child(0)
                .ok_or_else(|| cant_convert(data_type, target))?;

            let child = make_field_writer(field.data_type(), element)?;

            if matches!(data_type, DataType::List(_)) {
                Box::new(ListFieldWriter::<i32>::new(element.oid(), child))
            } else {
                Box::new(ListFieldWriter::<i64>::new(element.oid(), child))
            }
        }

        (DataType::Struct(fields), NzTypeId::Record) => {
            if fields.len() != target.n_children() {
                return Err(cant_convert(data_type, target));
            }

            let children = fields
                .iter()
                .zip(target.children())
                .map(|(field, member)| make_field_writer(field.data_type(), member))
                .collect::<Result<Vec<_>>>()?;

            let oids = target.children().iter().map(NzType::oid).collect();

            Box::new(StructFieldWriter::new(oids, children))
        }

        _ => return Err(cant_convert(data_type, target)),
    };

    Ok(writer)
}

// Targets whose wire value is the raw bytes of a string or binary column.
fn writes_bytes(type_id: NzTypeId) -> bool {
    use NzTypeId::*;

    matches!(
        type_id,
        Char | Varchar
            | Text
            | Bpchar
            | Name
            | Nchar
            | Nvarchar
            | Json
            | Jsonb
            | Jsonpath
            | Bytea
            | Varbinary
            | Unkbinary
            | Stgeometry
            | Unknown
    )
}
