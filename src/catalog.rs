//! Building an [`NzTypeResolver`] from the system catalog.
//!
//! The connection layer runs [`ATTRIBUTE_QUERY`] and [`TYPE_QUERY`] and hands the rows
//! to [`load`]. Rows may arrive in any order: types that reference something not yet
//! registered are retried for up to [`MAX_PASSES`] passes.

use crate::error::Error;
use crate::resolver::{NzTypeItem, NzTypeResolver};

/// Column layouts of every class, in attribute order.
pub const ATTRIBUTE_QUERY: &str = r#"
SELECT
    ATTRELID,
    ATTNAME,
    ATTTYPID
FROM
    ADMIN._T_ATTRIBUTE
ORDER BY
    ATTRELID, ATTNUM
"#;

/// Every decodable type.
pub const TYPE_QUERY: &str = r#"
SELECT
    OID,
    TYPNAME,
    TYPRECEIVE,
    TYPRELID
FROM
    ADMIN._T_TYPE
WHERE
    (TYPRECEIVE != 0 OR TYPNAME = 'aclitem') AND TYPTYPE != 'r'
ORDER BY
    oid
"#;

pub const MAX_PASSES: usize = 3;

/// A row of [`ATTRIBUTE_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeRow {
    pub attrelid: u32,
    pub attname: String,
    pub atttypid: u32,
}

/// A row of [`TYPE_QUERY`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeRow {
    pub oid: u32,
    pub typname: String,
    pub typreceive: String,
    pub typrelid: u32,
    /// OID of the array type over this type, for catalogs that expose one.
    pub typarray: Option<u32>,
}

impl TypeRow {
    fn to_item(&self) -> NzTypeItem {
        // aclitem shows up in a bunch of internal tables but has no receive function
        let typreceive = if self.typname == "aclitem" {
            "aclitem_recv"
        } else {
            &self.typreceive
        };

        let item = NzTypeItem::new(self.oid, self.typname.clone(), typreceive);

        if self.typrelid != 0 {
            item.class_oid(self.typrelid)
        } else {
            item
        }
    }

    fn to_array_item(&self) -> Option<NzTypeItem> {
        let array_oid = self.typarray.filter(|oid| *oid != 0)?;

        Some(
            NzTypeItem::new(array_oid, format!("_{}", self.typname), "array_recv")
                .child_oid(self.oid),
        )
    }
}

/// The outcome of [`load`].
#[derive(Debug, Default)]
pub struct CatalogLoad {
    pub classes: usize,
    pub types: usize,
    pub passes: usize,
    /// Rows that still failed after the last pass, with the last error seen for each.
    pub unresolved: Vec<(u32, Error)>,
}

impl CatalogLoad {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Groups attribute rows by class and registers each layout. Returns the number of
/// classes registered.
///
/// Rows must be ordered by class, as [`ATTRIBUTE_QUERY`] returns them.
pub fn insert_attribute_rows<I>(resolver: &mut NzTypeResolver, rows: I) -> usize
where
    I: IntoIterator<Item = AttributeRow>,
{
    let mut n_added = 0;
    let mut current: Option<(u32, Vec<(String, u32)>)> = None;

    for row in rows {
        match &mut current {
            Some((class_oid, columns)) if *class_oid == row.attrelid => {
                columns.push((row.attname, row.atttypid));
            }

            _ => {
                if let Some((class_oid, columns)) = current.take() {
                    resolver.insert_class(class_oid, columns);
                    n_added += 1;
                }

                current = Some((row.attrelid, vec![(row.attname, row.atttypid)]));
            }
        }
    }

    if let Some((class_oid, columns)) = current {
        resolver.insert_class(class_oid, columns);
        n_added += 1;
    }

    n_added
}

/// Registers type rows, retrying rows whose references are not registered yet.
pub fn insert_type_rows(resolver: &mut NzTypeResolver, rows: &[TypeRow]) -> CatalogLoad {
    let mut load = CatalogLoad::default();
    let mut pending: Vec<&TypeRow> = rows.iter().collect();

    while !pending.is_empty() && load.passes < MAX_PASSES {
        load.passes += 1;

        let mut failed = Vec::new();
        load.unresolved.clear();

        for row in pending {
            match resolver.insert(&row.to_item()) {
                Ok(()) => {
                    load.types += 1;

                    if let Some(array_item) = row.to_array_item() {
                        match resolver.insert(&array_item) {
                            Ok(()) => load.types += 1,
                            Err(error) => {
                                tracing::trace!(oid = array_item.oid, %error, "skipping array type");
                            }
                        }
                    }
                }

                Err(error) => {
                    tracing::trace!(oid = row.oid, typname = %row.typname, %error, "deferring type");
                    load.unresolved.push((row.oid, error));
                    failed.push(row);
                }
            }
        }

        pending = failed;
    }

    load
}

/// Builds a resolver from the results of [`ATTRIBUTE_QUERY`] and [`TYPE_QUERY`].
pub fn load<I>(
    attributes: I,
    types: &[TypeRow],
) -> (NzTypeResolver, CatalogLoad)
where
    I: IntoIterator<Item = AttributeRow>,
{
    let mut resolver = NzTypeResolver::new();

    let classes = insert_attribute_rows(&mut resolver, attributes);
    let mut load = insert_type_rows(&mut resolver, types);
    load.classes = classes;

    if load.is_complete() {
        tracing::debug!(
            classes = load.classes,
            types = load.types,
            passes = load.passes,
            "loaded type catalog"
        );
    } else {
        tracing::warn!(
            classes = load.classes,
            types = load.types,
            unresolved = load.unresolved.len(),
            "type catalog loaded with unresolved types"
        );
    }

    (resolver, load)
}

#[cfg(test)]
mod tests {
    use super::{insert_attribute_rows, load, AttributeRow, TypeRow};
    use crate::{NzTypeId, NzTypeResolver};

    fn attr(attrelid: u32, attname: &str, atttypid: u32) -> AttributeRow {
        AttributeRow {
            attrelid,
            attname: attname.into(),
            atttypid,
        }
    }

    fn ty(oid: u32, typname: &str, typreceive: &str) -> TypeRow {
        TypeRow {
            oid,
            typname: typname.into(),
            typreceive: typreceive.into(),
            ..TypeRow::default()
        }
    }

    #[test]
    fn attribute_rows_group_by_class() {
        let mut resolver = NzTypeResolver::new();

        let n = insert_attribute_rows(
            &mut resolver,
            vec![
                attr(100, "a", 23),
                attr(100, "b", 25),
                attr(200, "c", 16),
            ],
        );

        assert_eq!(n, 2);
        assert_eq!(
            resolver.class(100),
            Some(&[("a".to_owned(), 23), ("b".to_owned(), 25)][..])
        );
        assert_eq!(resolver.class(200).map(<[_]>::len), Some(1));
    }

    #[test]
    fn out_of_order_rows_resolve_over_several_passes() -> crate::Result<()> {
        let mut record = ty(5000, "my_table", "record_recv");
        record.typrelid = 100;

        let mut int4 = ty(23, "INT4", "INT4IN");
        int4.typarray = Some(1007);

        let (resolver, load) = load(
            vec![attr(100, "id", 23), attr(100, "tags", 1007)],
            &[record, int4, ty(25, "TEXT", "TEXTIN"), ty(1033, "aclitem", "0")],
        );

        assert!(load.is_complete(), "{:?}", load.unresolved);
        assert_eq!(load.passes, 2);
        assert_eq!(load.classes, 1);

        let record = resolver.find(5000)?;
        assert_eq!(record.n_children(), 2);
        assert_eq!(record.children()[1].type_id(), NzTypeId::Array);
        assert_eq!(resolver.find_array(23)?.typname(), "_INT4");
        assert_eq!(resolver.find(1033)?.type_id(), NzTypeId::Unknown);

        Ok(())
    }

    #[test]
    fn dangling_references_are_reported() {
        let mut record = ty(5000, "orphan", "record_recv");
        record.typrelid = 999;

        let (_, load) = load(Vec::new(), &[record]);

        assert!(!load.is_complete());
        assert_eq!(load.passes, 3);
        assert_eq!(load.unresolved[0].0, 5000);
    }
}
