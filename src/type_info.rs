use std::collections::HashMap;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, IntervalUnit, TimeUnit};

use crate::error::{Error, Result};
use crate::resolver::NzTypeResolver;
use crate::type_id::NzTypeId;

/// Field metadata key carrying the database type name of columns surfaced as raw bytes.
pub const TYPNAME_METADATA_KEY: &str = "ADBC:netezza:typname";

/// A (potentially nested) Netezza data type.
///
/// Values are immutable once built: every derivation (`with_type_info`, `with_field_name`,
/// `domain`, `array`, ...) returns a new `NzType` and leaves `self` as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NzType {
    oid: u32,
    type_id: NzTypeId,
    typname: String,
    field_name: String,
    children: Vec<NzType>,
}

impl Default for NzType {
    fn default() -> Self {
        NzType::new(NzTypeId::Unknown)
    }
}

impl NzType {
    /// A bare type of the given kind that has not been cataloged yet (oid 0).
    pub fn new(type_id: NzTypeId) -> Self {
        NzType {
            oid: 0,
            type_id,
            typname: String::new(),
            field_name: String::new(),
            children: Vec::new(),
        }
    }

    /// An empty record type; columns are attached with [`NzType::append_child`].
    pub fn record(oid: u32, typname: impl Into<String>) -> Self {
        NzType::new(NzTypeId::Record).with_type_info(oid, typname)
    }

    #[must_use]
    pub fn with_type_info(&self, oid: u32, typname: impl Into<String>) -> Self {
        NzType {
            oid,
            typname: typname.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_field_name(&self, field_name: impl Into<String>) -> Self {
        NzType {
            field_name: field_name.into(),
            ..self.clone()
        }
    }

    /// A domain over this type: a new catalog identity with the same wire representation.
    #[must_use]
    pub fn domain(&self, oid: u32, typname: impl Into<String>) -> Self {
        self.with_type_info(oid, typname)
    }

    /// An array whose elements are of this type.
    #[must_use]
    pub fn array(&self, oid: u32, typname: impl Into<String>) -> Self {
        self.wrap(NzTypeId::Array, oid, typname)
    }

    /// A range over this type.
    #[must_use]
    pub fn range(&self, oid: u32, typname: impl Into<String>) -> Self {
        self.wrap(NzTypeId::Range, oid, typname)
    }

    fn wrap(&self, type_id: NzTypeId, oid: u32, typname: impl Into<String>) -> Self {
        NzType {
            oid,
            type_id,
            typname: typname.into(),
            field_name: String::new(),
            children: vec![self.with_field_name("item")],
        }
    }

    pub fn append_child(&mut self, field_name: impl Into<String>, ty: &NzType) {
        self.children.push(ty.with_field_name(field_name));
    }

    pub fn oid(&self) -> u32 {
        self.oid
    }

    pub fn type_id(&self) -> NzTypeId {
        self.type_id
    }

    pub fn typname(&self) -> &str {
        &self.typname
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn n_children(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, i: usize) -> Option<&NzType> {
        self.children.get(i)
    }

    pub fn children(&self) -> &[NzType] {
        &self.children
    }

    /// The name used in messages: the catalog name, or the kind's usual name before the
    /// type has been cataloged.
    pub fn display_name(&self) -> &str {
        if self.typname.is_empty() {
            self.type_id.typname()
        } else {
            &self.typname
        }
    }

    /// The Arrow type values of this type decode to by default.
    ///
    /// Types without a dedicated representation decode to `Binary` holding the COPY
    /// bytes of each value.
    pub fn data_type(&self) -> DataType {
        use NzTypeId::*;

        match self.type_id {
            Bool => DataType::Boolean,
            Int2 => DataType::Int16,
            Int4 | Oid | Regproc => DataType::Int32,
            Int8 => DataType::Int64,
            Float4 => DataType::Float32,
            Float8 => DataType::Float64,

            // arbitrary precision has no fixed-width Arrow equivalent
            Numeric => DataType::Utf8,

            Char | Bpchar | Varchar | Nchar | Nvarchar | Text | Name | Json | Jsonb
            | Jsonpath => DataType::Utf8,

            Bytea | Int1 => DataType::Binary,

            Date => DataType::Date32,
            Time => DataType::Time64(TimeUnit::Microsecond),
            Timestamp => DataType::Timestamp(TimeUnit::Microsecond, None),
            Interval => DataType::Interval(IntervalUnit::MonthDayNano),

            Array => match self.children.first() {
                Some(child) => DataType::List(Arc::new(child.to_field())),
                None => DataType::Binary,
            },

            Record => DataType::Struct(self.children.iter().map(NzType::to_field).collect()),

            // no reader decodes their wire form, so the raw bytes are surfaced and
            // tagged with the type name
            Timetz | Abstime => DataType::Binary,

            _ => DataType::Binary,
        }
    }

    /// The nullable Arrow field for this type, named after its field name.
    pub fn to_field(&self) -> Field {
        let field = Field::new(self.field_name.clone(), self.data_type(), true);

        if self.is_opaque() {
            let metadata = HashMap::from([(
                TYPNAME_METADATA_KEY.to_owned(),
                self.display_name().to_owned(),
            )]);

            field.with_metadata(metadata)
        } else {
            field
        }
    }

    // Binary columns that do not come from a binary type
    fn is_opaque(&self) -> bool {
        !matches!(self.type_id, NzTypeId::Bytea | NzTypeId::Int1)
            && self.data_type() == DataType::Binary
    }

    /// Resolves the database type an Arrow type is written as.
    pub fn from_data_type(resolver: &NzTypeResolver, data_type: &DataType) -> Result<NzType> {
        let by_kind = |type_id: NzTypeId| resolver.find(resolver.get_oid(type_id));

        match data_type {
            // every row is written as null, so any type will do
            DataType::Null => by_kind(NzTypeId::Text),

            DataType::Boolean => by_kind(NzTypeId::Bool),

            DataType::Int8 | DataType::UInt8 | DataType::Int16 => by_kind(NzTypeId::Int2),
            DataType::UInt16 | DataType::Int32 => by_kind(NzTypeId::Int4),
            DataType::UInt32 | DataType::Int64 => by_kind(NzTypeId::Int8),

            // too wide for INT8
            DataType::UInt64 => by_kind(NzTypeId::Numeric),

            DataType::Float32 => by_kind(NzTypeId::Float4),
            DataType::Float64 => by_kind(NzTypeId::Float8),

            DataType::Utf8 | DataType::LargeUtf8 => by_kind(NzTypeId::Text),
            DataType::Binary | DataType::LargeBinary | DataType::FixedSizeBinary(_) => {
                by_kind(NzTypeId::Bytea)
            }

            DataType::Decimal128(..) => by_kind(NzTypeId::Numeric),

            DataType::Date32 => by_kind(NzTypeId::Date),
            DataType::Time64(TimeUnit::Microsecond) => by_kind(NzTypeId::Time),
            DataType::Timestamp(..) => by_kind(NzTypeId::Timestamp),
            DataType::Duration(_) | DataType::Interval(IntervalUnit::MonthDayNano) => {
                by_kind(NzTypeId::Interval)
            }

            DataType::List(field) | DataType::LargeList(field) => {
                let child = NzType::from_data_type(resolver, field.data_type())?;
                resolver.find_array(child.oid())
            }

            DataType::Struct(fields) => {
                let mut record = NzType::record(0, "record");

                for field in fields {
                    let member = NzType::from_data_type(resolver, field.data_type())?;
                    record.append_child(field.name().as_str(), &member);
                }

                Ok(record)
            }

            // dictionaries are always written as their values
            DataType::Dictionary(_, value_type) => NzType::from_data_type(resolver, value_type),

            other => Err(Error::unsupported(
                format!("Arrow type '{other}'"),
                "a Netezza type",
            )),
        }
    }
}
