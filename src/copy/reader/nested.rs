use std::sync::Arc;

use arrow::array::{ArrayRef, BufferBuilder, ListArray, StructArray};
use arrow::buffer::{OffsetBuffer, ScalarBuffer};
use arrow::datatypes::{FieldRef, Fields};

use crate::copy::reader::{field_len, CopyFieldReader, Validity};
use crate::error::{Error, Result};
use crate::io::NzBufExt;

// Running out of bytes inside a field whose full length is available means the
// field is inconsistent, not that more input is needed.
fn within_field(err: Error) -> Error {
    match err {
        Error::UnexpectedEof {
            expected,
            remaining,
        } => err_malformed!(
            "nested value ended early: expected {} more bytes but found {}",
            expected,
            remaining
        ),
        other => other,
    }
}

fn expect_consumed(kind: &str, field_size: usize, rest: &[u8]) -> Result<()> {
    if !rest.is_empty() {
        return Err(err_malformed!(
            "expected to read {} bytes from {} field but read {} bytes",
            field_size,
            kind,
            field_size - rest.len()
        ));
    }

    Ok(())
}

/// One-dimensional arrays, read into a list column.
pub(crate) struct ArrayFieldReader {
    field: FieldRef,
    validity: Validity,
    offsets: BufferBuilder<i32>,
    child: Box<dyn CopyFieldReader>,
}

impl ArrayFieldReader {
    pub(crate) fn new(field: FieldRef, child: Box<dyn CopyFieldReader>, capacity: usize) -> Self {
        let mut offsets = BufferBuilder::new(capacity + 1);
        offsets.append(0);

        ArrayFieldReader {
            field,
            validity: Validity::with_capacity(capacity),
            offsets,
            child,
        }
    }

    fn finish_element(&mut self, valid: bool) -> Result<()> {
        let end = i32::try_from(self.child.len()).map_err(|_| {
            err_overflow!("{} array elements exceed the 32-bit offset range", self.child.len())
        })?;

        self.offsets.append(end);
        self.validity.append(valid);

        Ok(())
    }

    fn read_items(&mut self, mut field: &[u8]) -> Result<()> {
        let size = field.len();

        let n_dim = field.get_checked::<i32>()?;
        let _flags = field.get_checked::<i32>()?;

        // the element OID is specific to each database so it is not checked
        let _element_oid = field.get_checked::<u32>()?;

        if n_dim < 0 {
            return Err(err_malformed!("expected array n_dim >= 0 but got {}", n_dim));
        }

        let mut n_items: usize = if n_dim == 0 { 0 } else { 1 };
        for _ in 0..n_dim {
            let dim_size = field.get_checked::<i32>()?;
            let lower_bound = field.get_checked::<i32>()?;

            let dim_size = usize::try_from(dim_size)
                .map_err(|_| err_malformed!("negative array dimension: {}", dim_size))?;

            if lower_bound != 1 {
                return Err(err_malformed!(
                    "array value with lower bound {} is not supported",
                    lower_bound
                ));
            }

            n_items = n_items
                .checked_mul(dim_size)
                .ok_or_else(|| err_malformed!("array dimensions overflow"))?;
        }

        for _ in 0..n_items {
            let item_size = field.get_checked::<i32>()?;
            self.child.read(&mut field, item_size)?;
        }

        expect_consumed("array", size, field)
    }
}

impl CopyFieldReader for ArrayFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            return self.finish_element(false);
        };

        let field = buf.split_bytes(size)?;
        self.read_items(field).map_err(within_field)?;

        self.finish_element(true)
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        let len = len.min(self.len());
        let child_len = self.offsets.as_slice()[len];

        self.validity.truncate(len);
        self.offsets.truncate(len + 1);
        self.child
            .truncate(usize::try_from(child_len).unwrap_or_default());
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let len = self.len();
        let nulls = self.validity.finish();

        let offsets = OffsetBuffer::new(ScalarBuffer::new(self.offsets.finish(), 0, len + 1));
        self.offsets.append(0);

        let values = self.child.finish()?;

        Ok(Arc::new(ListArray::try_new(
            self.field.clone(),
            offsets,
            values,
            nulls,
        )?))
    }
}

/// Composite values: an `i32` member count, then each member tagged with its type OID.
pub(crate) struct RecordFieldReader {
    fields: Fields,
    validity: Validity,
    children: Vec<Box<dyn CopyFieldReader>>,
    expected_oids: Vec<u32>,
    validate_oids: bool,
}

impl RecordFieldReader {
    pub(crate) fn new(
        fields: Fields,
        children: Vec<Box<dyn CopyFieldReader>>,
        expected_oids: Vec<u32>,
        validate_oids: bool,
        capacity: usize,
    ) -> Self {
        RecordFieldReader {
            fields,
            validity: Validity::with_capacity(capacity),
            children,
            expected_oids,
            validate_oids,
        }
    }

    fn read_members(&mut self, mut field: &[u8]) -> Result<()> {
        let size = field.len();

        let n_fields = field.get_checked::<i32>()?;
        if usize::try_from(n_fields).ok() != Some(self.children.len()) {
            return Err(err_malformed!(
                "expected nested record type to have {} fields but got {}",
                self.children.len(),
                n_fields
            ));
        }

        for (i, child) in self.children.iter_mut().enumerate() {
            let oid = field.get_checked::<u32>()?;
            let expected = self.expected_oids.get(i).copied().unwrap_or(0);

            if self.validate_oids && expected != 0 && oid != expected {
                return Err(err_malformed!(
                    "expected record field {} to have type oid {} but got {}",
                    i,
                    expected,
                    oid
                ));
            }

            let member_size = field.get_checked::<i32>()?;
            child.read(&mut field, member_size)?;
        }

        expect_consumed("record", size, field)
    }
}

impl CopyFieldReader for RecordFieldReader {
    fn read(&mut self, buf: &mut &[u8], field_size: i32) -> Result<()> {
        let Some(size) = field_len(field_size)? else {
            // members of a null record still need a slot
            for child in &mut self.children {
                child.read(&mut &[][..], -1)?;
            }

            self.validity.append(false);
            return Ok(());
        };

        let field = buf.split_bytes(size)?;
        self.read_members(field).map_err(within_field)?;

        self.validity.append(true);

        Ok(())
    }

    fn len(&self) -> usize {
        self.validity.len()
    }

    fn truncate(&mut self, len: usize) {
        let len = len.min(self.len());

        self.validity.truncate(len);
        for child in &mut self.children {
            child.truncate(len);
        }
    }

    fn finish(&mut self) -> Result<ArrayRef> {
        let len = self.len();
        let nulls = self.validity.finish();

        if self.children.is_empty() {
            return Ok(Arc::new(StructArray::new_empty_fields(len, nulls)));
        }

        let arrays = self
            .children
            .iter_mut()
            .map(|child| child.finish())
            .collect::<Result<Vec<_>>>()?;

        Ok(Arc::new(StructArray::try_new(
            self.fields.clone(),
            arrays,
            nulls,
        )?))
    }
}
