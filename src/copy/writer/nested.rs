use std::marker::PhantomData;

use arrow::array::{Array, AsArray, OffsetSizeTrait};
use bytes::BufMut;

use crate::copy::writer::{unexpected_array, CopyFieldWriter};
use crate::error::{Error, Result};
use crate::io::NzBufMutExt;

fn wire_count(n: usize, what: &str) -> Result<i32> {
    i32::try_from(n).map_err(|_| Error::Encode(format!("too many {what} for COPY: {n}")))
}

/// List columns, written as one-dimensional arrays with a lower bound of 1.
pub(crate) struct ListFieldWriter<O> {
    element_oid: u32,
    child: Box<dyn CopyFieldWriter>,
    _offset: PhantomData<fn() -> O>,
}

impl<O> ListFieldWriter<O> {
    pub(crate) fn new(element_oid: u32, child: Box<dyn CopyFieldWriter>) -> Self {
        ListFieldWriter {
            element_oid,
            child,
            _offset: PhantomData,
        }
    }
}

impl<O: OffsetSizeTrait> CopyFieldWriter for ListFieldWriter<O> {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_list_opt::<O>()
            .ok_or_else(|| unexpected_array(array))?;

        let values = array.value(index);
        let n_items = wire_count(values.len(), "array elements")?;

        buf.put_field_prefixed(|buf| {
            buf.put_i32(1);
            buf.put_i32(i32::from(values.null_count() > 0));
            buf.put_u32(self.element_oid);

            buf.put_i32(n_items);
            buf.put_i32(1);

            for i in 0..values.len() {
                if values.is_null(i) {
                    buf.put_null_field();
                } else {
                    self.child.write(values.as_ref(), i, buf)?;
                }
            }

            Ok(())
        })
    }
}

/// Struct columns, written as records whose members are tagged with their type OIDs.
pub(crate) struct StructFieldWriter {
    oids: Vec<u32>,
    children: Vec<Box<dyn CopyFieldWriter>>,
}

impl StructFieldWriter {
    pub(crate) fn new(oids: Vec<u32>, children: Vec<Box<dyn CopyFieldWriter>>) -> Self {
        StructFieldWriter { oids, children }
    }
}

impl CopyFieldWriter for StructFieldWriter {
    fn write(&self, array: &dyn Array, index: usize, buf: &mut Vec<u8>) -> Result<()> {
        let array = array
            .as_struct_opt()
            .ok_or_else(|| unexpected_array(array))?;

        let n_fields = wire_count(self.children.len(), "record members")?;

        buf.put_field_prefixed(|buf| {
            buf.put_i32(n_fields);

            for ((column, oid), child) in array.columns().iter().zip(&self.oids).zip(&self.children)
            {
                buf.put_u32(*oid);

                if column.is_null(index) {
                    buf.put_null_field();
                } else {
                    child.write(column.as_ref(), index, buf)?;
                }
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Array, ArrayRef, Int32Array, ListArray, StringArray, StructArray};
    use arrow::datatypes::{DataType, Field, Int32Type};

    use crate::copy::writer::make_field_writer;
    use crate::{NzType, NzTypeId};

    fn row_type() -> NzType {
        let mut row = NzType::record(16_400, "customrecord");
        row.append_child(
            "int4_col",
            &NzType::new(NzTypeId::Int4).with_type_info(23, "int4"),
        );
        row.append_child(
            "text_col",
            &NzType::new(NzTypeId::Text).with_type_info(25, "text"),
        );
        row
    }

    #[test]
    fn structs_write_tagged_members() -> crate::Result<()> {
        let array = StructArray::from(vec![
            (
                Arc::new(Field::new("int4_col", DataType::Int32, true)),
                Arc::new(Int32Array::from(vec![Some(123)])) as ArrayRef,
            ),
            (
                Arc::new(Field::new("text_col", DataType::Utf8, true)),
                Arc::new(StringArray::from(vec![None::<&str>])) as ArrayRef,
            ),
        ]);

        let writer = make_field_writer(array.data_type(), &row_type())?;

        let mut buf = Vec::new();
        writer.write(&array, 0, &mut buf)?;

        assert_eq!(
            buf,
            [
                0, 0, 0, 24, // field length
                0, 0, 0, 2, // members
                0, 0, 0, 23, 0, 0, 0, 4, 0, 0, 0, 123, //
                0, 0, 0, 25, 0xff, 0xff, 0xff, 0xff,
            ]
        );

        Ok(())
    }

    #[test]
    fn empty_lists_have_one_empty_dimension() -> crate::Result<()> {
        let array = ListArray::from_iter_primitive::<Int32Type, _, _>(vec![Some(vec![
            None::<i32>;
            0
        ])]);

        let target = NzType::new(NzTypeId::Int4)
            .with_type_info(23, "int4")
            .array(1007, "_int4");

        let mut buf = Vec::new();
        make_field_writer(array.data_type(), &target)?.write(&array, 0, &mut buf)?;

        assert_eq!(
            buf,
            [0, 0, 0, 20, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 23, 0, 0, 0, 0, 0, 0, 0, 1]
        );

        Ok(())
    }

    #[test]
    fn struct_member_counts_must_match() {
        let array = StructArray::from(vec![(
            Arc::new(Field::new("int4_col", DataType::Int32, true)),
            Arc::new(Int32Array::from(vec![1])) as ArrayRef,
        )]);

        assert!(make_field_writer(array.data_type(), &row_type()).is_err());
    }
}
