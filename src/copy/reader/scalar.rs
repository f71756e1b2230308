use std::sync::Arc;

use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, BooleanBufferBuilder, BufferBuilder, PrimitiveArray,
    StringArray,
};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{ArrowNativeTypeOp, ArrowPrimitiveType, DataType, IntervalMonthDayNanoType};

use crate::copy::reader::{expect_size, field_len, CopyFieldReader, Validity};
use crate::error::Result;
use crate::io::{NzBufExt, WireNative};
use crate::types::{MonthDayNano, NzInterval, NzNumeric};

/// `BOOL`: one byte per value.
pub(crate) struct BooleanFieldReader {
    validity: Validity,
    values: BooleanBufferBuilder,
}

impl BooleanFieldReader {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        BooleanFieldReader {
            validity: Validity::with_capacity(capacity),
            values: BooleanBufferBuilder::new(capacity),
        }
    }
}

impl CopyFieldReader for BooleanFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            self.values.append(false);
            self.validity.append(false);
            return Ok(());
        };

        expect_size(1, size)?;
        let value = buf.get_checked::<i8>()? != 0;

        self.values.append(value);
        self.validity.append(true);

        Ok(())
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        self.validity.truncate(len);
        self.values.truncate(len.min(self.values.len()));
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let nulls = self.validity.finish();

        Ok(Arc::new(BooleanArray::new(self.values.finish(), nulls)))
    }
}

/// Types whose Arrow representation is the wire value in host byte order, optionally
/// shifted by a constant (the epoch of `DATE` and `TIMESTAMP` values).
pub(crate) struct NetworkEndianFieldReader<T: ArrowPrimitiveType> {
    data_type: DataType,
    validity: Validity,
    values: BufferBuilder<T::Native>,
    offset: Option<T::Native>,
}

impl<T> NetworkEndianFieldReader<T>
where
    T: ArrowPrimitiveType,
    T::Native: WireNative + ArrowNativeTypeOp,
{
    pub(crate) fn new(data_type: &DataType, capacity: usize) -> Self {
        NetworkEndianFieldReader {
            data_type: data_type.clone(),
            validity: Validity::with_capacity(capacity),
            values: BufferBuilder::new(capacity),
            offset: None,
        }
    }

    pub(crate) fn with_offset(mut self, offset: T::Native) -> Self {
        self.offset = Some(offset);
        self
    }
}

impl<T> CopyFieldReader for NetworkEndianFieldReader<T>
where
    T: ArrowPrimitiveType,
    T::Native: WireNative + ArrowNativeTypeOp,
{
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            self.values.append(T::Native::default());
            self.validity.append(false);
            return Ok(());
        };

        expect_size(<T::Native as WireNative>::SIZE, size)?;
        let mut value = buf.get_checked::<T::Native>()?;

        if let Some(offset) = self.offset {
            value = value.add_checked(offset).map_err(|_| {
                err_overflow!("{:?} overflows when shifted by {:?}", value, offset)
            })?;
        }

        self.values.append(value);
        self.validity.append(true);

        Ok(())
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        self.validity.truncate(len);
        self.values.truncate(len.min(self.values.len()));
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let len = self.values.len();
        let nulls = self.validity.finish();
        let values = ScalarBuffer::new(self.values.finish(), 0, len);

        let array =
            PrimitiveArray::<T>::try_new(values, nulls)?.with_data_type(self.data_type.clone());

        Ok(Arc::new(array))
    }
}

/// `INTERVAL`: microseconds, days and months.
pub(crate) struct IntervalFieldReader {
    validity: Validity,
    values: BufferBuilder<MonthDayNano>,
}

impl IntervalFieldReader {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        IntervalFieldReader {
            validity: Validity::with_capacity(capacity),
            values: BufferBuilder::new(capacity),
        }
    }
}

impl CopyFieldReader for IntervalFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            self.values.append(MonthDayNano::default());
            self.validity.append(false);
            return Ok(());
        };

        expect_size(NzInterval::SIZE, size)?;
        let value = NzInterval::decode(buf.split_bytes(size)?)?.to_month_day_nano()?;

        self.values.append(value);
        self.validity.append(true);

        Ok(())
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        self.validity.truncate(len);
        self.values.truncate(len.min(self.values.len()));
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let len = self.values.len();
        let nulls = self.validity.finish();
        let values = ScalarBuffer::new(self.values.finish(), 0, len);

        Ok(Arc::new(PrimitiveArray::<IntervalMonthDayNanoType>::try_new(
            values, nulls,
        )?))
    }
}

/// Values whose Arrow representation is exactly their bytes: text and anything read
/// as binary.
pub(crate) struct ByteFieldReader {
    validity: Validity,
    offsets: BufferBuilder<i32>,
    values: BufferBuilder<u8>,
    utf8: bool,
}

impl ByteFieldReader {
    fn new(utf8: bool, capacity: usize) -> Self {
        let mut offsets = BufferBuilder::new(capacity + 1);
        offsets.append(0);

        ByteFieldReader {
            validity: Validity::with_capacity(capacity),
            offsets,
            values: BufferBuilder::new(capacity * 8),
            utf8,
        }
    }

    pub(crate) fn utf8(capacity: usize) -> Self {
        ByteFieldReader::new(true, capacity)
    }

    pub(crate) fn binary(capacity: usize) -> Self {
        ByteFieldReader::new(false, capacity)
    }

    fn last_offset(&self) -> i32 {
        self.offsets.as_slice().last().copied().unwrap_or(0)
    }

    pub(crate) fn append_value(&mut self, value: &[u8]) -> Result<()> {
        if self.utf8 {
            std::str::from_utf8(value)
                .map_err(|e| err_malformed!("invalid UTF-8 in text field: {}", e))?;
        }

        let end = self.values.len() + value.len();
        let end = i32::try_from(end).map_err(|_| {
            err_overflow!("{} bytes of column data exceed the 32-bit offset range", end)
        })?;

        self.values.append_slice(value);
        self.offsets.append(end);
        self.validity.append(true);

        Ok(())
    }

    pub(crate) fn append_null(&mut self) {
        let last = self.last_offset();

        self.offsets.append(last);
        self.validity.append(false);
    }
}

impl CopyFieldReader for ByteFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        match field_len(field_size)? {
            // 0 is an empty value
            None => {
                self.append_null();
                Ok(())
            }

            Some(size) => self.append_value(buf.split_bytes(size)?),
        }
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        let len = len.min(self.len());
        let end = self.offsets.as_slice()[len];

        self.validity.truncate(len);
        self.offsets.truncate(len + 1);
        self.values.truncate(usize::try_from(end).unwrap_or_default());
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let len = self.len();
        let nulls = self.validity.finish();

        let offsets = OffsetBuffer::new(ScalarBuffer::new(self.offsets.finish(), 0, len + 1));
        let values = self.values.finish();

        self.offsets.append(0);

        let array: ArrayRef = if self.utf8 {
            Arc::new(StringArray::try_new(offsets, values, nulls)?)
        } else {
            Arc::new(BinaryArray::try_new(offsets, values, nulls)?)
        };

        Ok(array)
    }
}

/// `NUMERIC` rendered as a decimal string.
pub(crate) struct NumericFieldReader {
    inner: ByteFieldReader,
}

impl NumericFieldReader {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        NumericFieldReader {
            inner: ByteFieldReader::utf8(capacity),
        }
    }
}

impl CopyFieldReader for NumericFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            self.inner.append_null();
            return Ok(());
        };

        let numeric = NzNumeric::decode(buf.split_bytes(size)?)?;

        self.inner.append_value(numeric.to_string().as_bytes())
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        self.inner.finish()
    }
}
