use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::type_id::NzTypeId;
use crate::type_info::NzType;

/// One row of the type catalog, as handed to [`NzTypeResolver::insert`].
///
/// `typreceive` picks what the other references mean: `child_oid` is read for arrays,
/// `base_oid` for ranges and domains and `class_oid` for records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NzTypeItem {
    pub oid: u32,
    pub typname: String,
    pub typreceive: String,
    pub child_oid: Option<u32>,
    pub base_oid: Option<u32>,
    pub class_oid: Option<u32>,
}

impl NzTypeItem {
    pub fn new(oid: u32, typname: impl Into<String>, typreceive: impl Into<String>) -> Self {
        NzTypeItem {
            oid,
            typname: typname.into(),
            typreceive: typreceive.into(),
            ..NzTypeItem::default()
        }
    }

    #[must_use]
    pub fn child_oid(mut self, oid: u32) -> Self {
        self.child_oid = Some(oid);
        self
    }

    #[must_use]
    pub fn base_oid(mut self, oid: u32) -> Self {
        self.base_oid = Some(oid);
        self
    }

    #[must_use]
    pub fn class_oid(mut self, oid: u32) -> Self {
        self.class_oid = Some(oid);
        self
    }
}

/// A cache of the type catalog with the lookup tables needed to resolve the
/// [`NzType`] of a column from its OID.
///
/// The resolver is filled once per connection and only read afterwards. Types must be
/// inserted in dependency order: element, base and member types before the types that
/// reference them, and class layouts (via [`NzTypeResolver::insert_class`]) before the
/// record types built from them.
#[derive(Debug, Clone, Default)]
pub struct NzTypeResolver {
    mapping: HashMap<u32, NzType>,
    reverse_mapping: HashMap<NzTypeId, u32>,
    array_mapping: HashMap<u32, u32>,
    classes: HashMap<u32, Vec<(String, u32)>>,
}

impl NzTypeResolver {
    pub fn new() -> Self {
        NzTypeResolver::default()
    }

    /// A resolver holding every base kind under the OID Netezza ships it with.
    ///
    /// Handy for encoding without a live catalog; a catalog snapshot should be
    /// preferred whenever one is available.
    pub fn with_builtin_types() -> Self {
        let mut resolver = NzTypeResolver::new();

        for type_id in NzTypeId::all(false) {
            if let Some(oid) = type_id.builtin_oid() {
                let item = NzTypeItem::new(oid, type_id.typname(), type_id.typreceive());

                // base kinds never reference another type
                if let Err(error) = resolver.insert(&item) {
                    tracing::warn!(%error, oid, "skipping builtin type");
                }
            }
        }

        resolver
    }

    /// Returns a copy of the type registered under `oid`.
    pub fn find(&self, oid: u32) -> Result<NzType> {
        self.mapping
            .get(&oid)
            .cloned()
            .ok_or(Error::UnknownCatalogReference { what: "type", oid })
    }

    /// Returns the array type whose elements have the type `child_oid`.
    pub fn find_array(&self, child_oid: u32) -> Result<NzType> {
        let array_oid = self
            .array_mapping
            .get(&child_oid)
            .ok_or(Error::UnknownCatalogReference {
                what: "array type for element type",
                oid: child_oid,
            })?;

        self.find(*array_oid)
    }

    /// The OID of the first type registered with this kind, or 0 if there is none.
    pub fn get_oid(&self, type_id: NzTypeId) -> u32 {
        self.reverse_mapping.get(&type_id).copied().unwrap_or(0)
    }

    /// Registers a type. Re-inserting an OID replaces the previous definition.
    ///
    /// Fails with [`Error::UnknownCatalogReference`] when the type refers to an element,
    /// base type, class or class member that is not registered yet; in that case nothing
    /// is changed.
    pub fn insert(&mut self, item: &NzTypeItem) -> Result<()> {
        // Receive functions we don't know (e.g. user-defined types) can only be
        // surfaced as their raw bytes.
        let type_id = NzTypeId::from_typreceive(&item.typreceive).unwrap_or(NzTypeId::Unknown);

        let ty = match type_id {
            NzTypeId::Array => {
                let child_oid = required(item.child_oid, "array element type")?;
                let child = self.find(child_oid)?;

                self.array_mapping.insert(child_oid, item.oid);
                child.array(item.oid, item.typname.clone())
            }

            NzTypeId::Range => {
                let base = self.find(required(item.base_oid, "range base type")?)?;
                base.range(item.oid, item.typname.clone())
            }

            NzTypeId::Domain => {
                let base = self.find(required(item.base_oid, "domain base type")?)?;
                base.domain(item.oid, item.typname.clone())
            }

            NzTypeId::Record => {
                let class_oid = required(item.class_oid, "class")?;
                let class = self
                    .classes
                    .get(&class_oid)
                    .ok_or(Error::UnknownCatalogReference {
                        what: "class",
                        oid: class_oid,
                    })?;

                let mut record = NzType::record(item.oid, item.typname.clone());
                for (field_name, member_oid) in class {
                    record.append_child(field_name.clone(), &self.find(*member_oid)?);
                }

                record
            }

            _ => NzType::new(type_id).with_type_info(item.oid, item.typname.clone()),
        };

        self.mapping.insert(item.oid, ty);

        // ranges, domains and records are distinct per type; a lookup by kind is meaningless
        if !matches!(
            type_id,
            NzTypeId::Range | NzTypeId::Domain | NzTypeId::Record
        ) {
            self.reverse_mapping.entry(type_id).or_insert(item.oid);
        }

        Ok(())
    }

    /// Registers the ordered `(field name, member oid)` layout of a class.
    ///
    /// Member types are resolved when a record type referencing the class is inserted,
    /// so they need not be registered yet.
    pub fn insert_class(&mut self, class_oid: u32, fields: Vec<(String, u32)>) {
        self.classes.insert(class_oid, fields);
    }

    /// The layout registered for `class_oid`.
    pub fn class(&self, class_oid: u32) -> Option<&[(String, u32)]> {
        self.classes.get(&class_oid).map(Vec::as_slice)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    pub fn contains(&self, oid: u32) -> bool {
        self.mapping.contains_key(&oid)
    }
}

fn required(oid: Option<u32>, what: &'static str) -> Result<u32> {
    oid.ok_or(Error::UnknownCatalogReference { what, oid: 0 })
}
