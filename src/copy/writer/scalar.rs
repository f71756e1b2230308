use std::marker::PhantomData;

use arrow::array::{Array, AsArray, OffsetSizeTrait};
use arrow::datatypes::{
    ArrowDictionaryKeyType, ArrowNativeType, ArrowNativeTypeOp, ArrowPrimitiveType,
    ArrowTimestampType, ByteArrayType, Decimal128Type, IntervalMonthDayNanoType, TimeUnit,
};

use crate::copy::writer::{unexpected_array, CopyFieldWriter};
use crate::error::{Error, Result};
use crate::io::{NzBufMutExt, WireNative};
use crate::types::time::{to_micros, unix_to_wire_timestamp};
use crate::types::{NzInterval, NzNumeric};

/// Columns with no values; every row is written as null.
pub(crate) struct NullFieldWriter;

impl CopyFieldWriter for NullFieldWriter {
    fn write(&self, _array: &dyn Array, _index: usize, buf: &mut Vec<u8>) -> Result<()> {
        buf.put_null_field();
        Ok(())
    }
}

pub(crate) struct BooleanFieldWriter;

impl CopyFieldWriter for BooleanFieldWriter {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_boolean_opt()
            .ok_or_else(|| unexpected_array(array))?;

        buf.put_fixed_field(i8::from(array.value(index)));

        Ok(())
    }
}

/// Writes a primitive value as the fixed-width wire type `W`, failing on values that
/// don't fit. An offset is subtracted first when set (the epoch of `DATE` values).
pub(crate) struct NetworkEndianFieldWriter<T, W> {
    offset: Option<W>,
    _type: PhantomData<fn() -> T>,
}

impl<T, W> NetworkEndianFieldWriter<T, W> {
    pub(crate) fn new() -> Self {
        NetworkEndianFieldWriter {
            offset: None,
            _type: PhantomData,
        }
    }

    pub(crate) fn with_offset(mut self, offset: W) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl<T, W> CopyFieldWriter for NetworkEndianFieldWriter<T, W>
where
    T: ArrowPrimitiveType,
    W: WireNative + ArrowNativeTypeOp + TryFrom<T::Native>,
{
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<T>()
            .ok_or_else(|| unexpected_array(array))?;

        let native = array.value(index);
        let mut value = W::try_from(native).map_err(|_| {
            Error::Encode(format!(
                "value {native:?} does not fit in a {}-byte field",
                W::SIZE
            ))
        })?;

        if let Some(offset) = self.offset {
            value = value.sub_checked(offset).map_err(|_| {
                err_overflow!("value {:?} overflows when shifted to the wire epoch", native)
            })?;
        }

        buf.put_fixed_field(value);

        Ok(())
    }
}

/// `TIMESTAMP` from any Arrow timestamp unit.
pub(crate) struct TimestampFieldWriter<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> TimestampFieldWriter<T> {
    pub(crate) fn new() -> Self {
        TimestampFieldWriter { _type: PhantomData }
    }
}

impl<T: ArrowTimestampType> CopyFieldWriter for TimestampFieldWriter<T> {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<T>()
            .ok_or_else(|| unexpected_array(array))?;

        let micros = unix_to_wire_timestamp(array.value(index), T::UNIT)?;
        buf.put_fixed_field(micros);

        Ok(())
    }
}

/// `INTERVAL` from an Arrow duration, which carries no day or month component.
pub(crate) struct DurationFieldWriter<T> {
    unit: TimeUnit,
    _type: PhantomData<fn() -> T>,
}

impl<T> DurationFieldWriter<T> {
    pub(crate) fn new(unit: TimeUnit) -> Self {
        DurationFieldWriter {
            unit,
            _type: PhantomData,
        }
    }
}

impl<T> CopyFieldWriter for DurationFieldWriter<T>
where
    T: ArrowPrimitiveType<Native = i64>,
{
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<T>()
            .ok_or_else(|| unexpected_array(array))?;

        let interval = NzInterval {
            months: 0,
            days: 0,
            microseconds: to_micros(array.value(index), self.unit)?,
        };

        buf.put_field_prefixed(|buf| {
            interval.encode(buf);
            Ok(())
        })
    }
}

pub(crate) struct IntervalFieldWriter;

impl CopyFieldWriter for IntervalFieldWriter {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<IntervalMonthDayNanoType>()
            .ok_or_else(|| unexpected_array(array))?;

        let interval = NzInterval::from_month_day_nano(array.value(index));

        buf.put_field_prefixed(|buf| {
            interval.encode(buf);
            Ok(())
        })
    }
}

/// String and binary columns, written as their bytes.
pub(crate) struct ByteFieldWriter<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> ByteFieldWriter<T> {
    pub(crate) fn new() -> Self {
        ByteFieldWriter { _type: PhantomData }
    }
}

impl<T> CopyFieldWriter for ByteFieldWriter<T>
where
    T: ByteArrayType,
    T::Native: AsRef<[u8]>,
{
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_bytes_opt::<T>()
            .ok_or_else(|| unexpected_array(array))?;

        buf.put_bytes_field(array.value(index).as_ref())
    }
}

pub(crate) struct FixedSizeBinaryFieldWriter;

impl CopyFieldWriter for FixedSizeBinaryFieldWriter {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_fixed_size_binary_opt()
            .ok_or_else(|| unexpected_array(array))?;

        buf.put_bytes_field(array.value(index))
    }
}

fn put_numeric(buf: &mut Vec<u8>, numeric: &NzNumeric) -> Result<()> {
    buf.put_field_prefixed(|buf| numeric.encode(buf))
}

/// `NUMERIC` from decimal strings such as `"-12.340"`, `"nan"` or `"inf"`.
pub(crate) struct NumericStringFieldWriter<O> {
    _offset: PhantomData<fn() -> O>,
}

impl<O> NumericStringFieldWriter<O> {
    pub(crate) fn new() -> Self {
        NumericStringFieldWriter {
            _offset: PhantomData,
        }
    }
}

impl<O: OffsetSizeTrait> CopyFieldWriter for NumericStringFieldWriter<O> {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_string_opt::<O>()
            .ok_or_else(|| unexpected_array(array))?;

        put_numeric(buf, &array.value(index).parse::<NzNumeric>()?)
    }
}

/// `NUMERIC` from integer columns.
pub(crate) struct IntegerNumericFieldWriter<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T> IntegerNumericFieldWriter<T> {
    pub(crate) fn new() -> Self {
        IntegerNumericFieldWriter { _type: PhantomData }
    }
}

impl<T> CopyFieldWriter for IntegerNumericFieldWriter<T>
where
    T: ArrowPrimitiveType,
    T::Native: ToString,
{
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<T>()
            .ok_or_else(|| unexpected_array(array))?;

        put_numeric(buf, &array.value(index).to_string().parse::<NzNumeric>()?)
    }
}

pub(crate) struct Decimal128FieldWriter {
    scale: i8,
}

impl Decimal128FieldWriter {
    pub(crate) fn new(scale: i8) -> Self {
        Decimal128FieldWriter { scale }
    }
}

impl CopyFieldWriter for Decimal128FieldWriter {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_primitive_opt::<Decimal128Type>()
            .ok_or_else(|| unexpected_array(array))?;

        put_numeric(
            buf,
            &NzNumeric::from_decimal128(array.value(index), self.scale)?,
        )
    }
}

/// Dictionary-encoded columns, written as the value each key refers to.
pub(crate) struct DictionaryFieldWriter<K> {
    values: Box<dyn CopyFieldWriter>,
    _key: PhantomData<fn() -> K>,
}

impl<K> DictionaryFieldWriter<K> {
    pub(crate) fn new(values: Box<dyn CopyFieldWriter>) -> Self {
        DictionaryFieldWriter {
            values,
            _key: PhantomData,
        }
    }
}

impl<K: ArrowDictionaryKeyType> CopyFieldWriter for DictionaryFieldWriter<K> {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_dictionary_opt::<K>()
            .ok_or_else(|| unexpected_array(array))?;

        let key = array.keys().value(index);
        let key = key
            .to_usize()
            .ok_or_else(|| Error::Encode(format!("invalid dictionary key: {key:?}")))?;

        let values = array.values();

        if values.is_null(key) {
            buf.put_null_field();
            return Ok(());
        }

        self.values.write(values.as_ref(), key, buf)
    }
}
