use arrow::datatypes::DataType;
use netezza_copy::catalog::{self, AttributeRow, TypeRow};
use netezza_copy::{Error, NzType, NzTypeId, NzTypeItem, NzTypeResolver};

fn setup() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Every base kind at oids 1..=N, in catalog order.
fn base_items() -> Vec<NzTypeItem> {
    NzTypeId::all(false)
        .into_iter()
        .zip(1..)
        .map(|(type_id, oid)| NzTypeItem::new(oid, type_id.typname(), type_id.typreceive()))
        .collect()
}

fn oid_of(type_id: NzTypeId) -> u32 {
    let index = NzTypeId::all(false)
        .iter()
        .position(|id| *id == type_id)
        .expect("base kind");

    u32::try_from(index).unwrap() + 1
}

fn mock_resolver() -> anyhow::Result<NzTypeResolver> {
    let mut resolver = NzTypeResolver::new();

    for item in base_items() {
        resolver.insert(&item)?;
    }

    let bool_oid = oid_of(NzTypeId::Bool);

    resolver.insert(&NzTypeItem::new(1000, "_bool", "array_recv").child_oid(bool_oid))?;
    resolver.insert(&NzTypeItem::new(1001, "boolrange", "range_recv").base_oid(bool_oid))?;
    resolver.insert(&NzTypeItem::new(1002, "custombool", "domain_recv").base_oid(bool_oid))?;

    resolver.insert_class(
        1003,
        vec![
            ("int4_col".into(), oid_of(NzTypeId::Int4)),
            ("text_col".into(), oid_of(NzTypeId::Text)),
        ],
    );
    resolver.insert(&NzTypeItem::new(1004, "customrecord", "record_recv").class_oid(1003))?;

    Ok(resolver)
}

#[test]
fn it_resolves_base_types() -> anyhow::Result<()> {
    setup();

    let resolver = mock_resolver()?;

    for item in base_items() {
        let ty = resolver.find(item.oid)?;

        assert_eq!(ty.oid(), item.oid);
        assert_eq!(ty.typname(), item.typname);
        assert_eq!(
            Some(ty.type_id()),
            NzTypeId::from_typreceive(&item.typreceive)
        );
    }

    assert_eq!(resolver.get_oid(NzTypeId::Bool), oid_of(NzTypeId::Bool));
    assert_eq!(resolver.get_oid(NzTypeId::Array), 1000);

    // UNKNOWN shares its receive function with TEXT, which is registered first
    assert_eq!(
        resolver.find(oid_of(NzTypeId::Unknown))?.type_id(),
        NzTypeId::Text
    );
    assert_eq!(resolver.get_oid(NzTypeId::Text), oid_of(NzTypeId::Text));
    assert_eq!(NzTypeResolver::new().get_oid(NzTypeId::Text), 0);

    assert_eq!(resolver.len(), base_items().len() + 4);

    Ok(())
}

#[test]
fn it_resolves_nested_types() -> anyhow::Result<()> {
    setup();

    let resolver = mock_resolver()?;

    let array = resolver.find(1000)?;
    assert_eq!(array.type_id(), NzTypeId::Array);
    assert_eq!(array.typname(), "_bool");
    assert_eq!(array.child(0).map(NzType::type_id), Some(NzTypeId::Bool));

    let range = resolver.find(1001)?;
    assert_eq!(range.type_id(), NzTypeId::Range);
    assert_eq!(range.n_children(), 1);

    // a domain decodes like its base type
    let domain = resolver.find(1002)?;
    assert_eq!(domain.type_id(), NzTypeId::Bool);
    assert_eq!(domain.typname(), "custombool");
    assert_eq!(domain.data_type(), DataType::Boolean);

    Ok(())
}

#[test]
fn it_resolves_records_in_class_order() -> anyhow::Result<()> {
    setup();

    let resolver = mock_resolver()?;
    let record = resolver.find(1004)?;

    assert_eq!(record.type_id(), NzTypeId::Record);

    let names: Vec<_> = record.children().iter().map(NzType::field_name).collect();
    assert_eq!(names, ["int4_col", "text_col"]);

    let kinds: Vec<_> = record.children().iter().map(NzType::type_id).collect();
    assert_eq!(kinds, [NzTypeId::Int4, NzTypeId::Text]);

    let DataType::Struct(fields) = record.data_type() else {
        panic!("records decode to structs");
    };
    assert_eq!(fields[0].name(), "int4_col");
    assert_eq!(fields[0].data_type(), &DataType::Int32);
    assert_eq!(fields[1].name(), "text_col");
    assert_eq!(fields[1].data_type(), &DataType::Utf8);

    Ok(())
}

#[test]
fn it_finds_arrays_by_element_type() -> anyhow::Result<()> {
    setup();

    let mut resolver = NzTypeResolver::new();
    resolver.insert(&NzTypeItem::new(10, "int4", "int4in"))?;
    resolver.insert(&NzTypeItem::new(11, "_int4", "array_recv").child_oid(10))?;

    assert_eq!(resolver.find_array(10)?.oid(), 11);
    assert!(matches!(
        resolver.find_array(11),
        Err(Error::UnknownCatalogReference { oid: 11, .. })
    ));

    Ok(())
}

#[test]
fn it_rejects_references_to_unregistered_types() -> anyhow::Result<()> {
    setup();

    let mut resolver = NzTypeResolver::new();

    let array = NzTypeItem::new(11, "_int4", "array_recv").child_oid(10);
    let range = NzTypeItem::new(12, "int4range", "range_recv").base_oid(10);
    let domain = NzTypeItem::new(13, "posint", "domain_recv").base_oid(10);
    let record = NzTypeItem::new(14, "pair", "record_recv").class_oid(100);

    for item in [&array, &range, &domain, &record] {
        let err = resolver.insert(item).unwrap_err();
        assert!(matches!(err, Error::UnknownCatalogReference { .. }), "{err}");
    }

    assert!(resolver.is_empty());

    // the class exists now but its member type does not
    resolver.insert_class(100, vec![("a".into(), 10), ("b".into(), 10)]);
    assert!(matches!(
        resolver.insert(&record),
        Err(Error::UnknownCatalogReference { what: "type", oid: 10 })
    ));

    resolver.insert(&NzTypeItem::new(10, "int4", "int4in"))?;

    for item in [&array, &range, &domain, &record] {
        resolver.insert(item)?;
        assert!(resolver.contains(item.oid));
    }

    assert_eq!(resolver.find(14)?.n_children(), 2);

    Ok(())
}

#[test]
fn it_treats_unknown_receive_functions_as_opaque() -> anyhow::Result<()> {
    setup();

    let mut resolver = NzTypeResolver::new();
    resolver.insert(&NzTypeItem::new(9000, "hll", "hll_recv"))?;

    let ty = resolver.find(9000)?;
    assert_eq!(ty.type_id(), NzTypeId::Unknown);

    let field = ty.to_field();
    assert_eq!(field.data_type(), &DataType::Binary);
    assert_eq!(
        field
            .metadata()
            .get(netezza_copy::TYPNAME_METADATA_KEY)
            .map(String::as_str),
        Some("hll")
    );

    Ok(())
}

#[test]
fn it_loads_a_catalog_in_any_order() -> anyhow::Result<()> {
    setup();

    let attributes = vec![
        AttributeRow {
            attrelid: 500,
            attname: "id".into(),
            atttypid: 23,
        },
        AttributeRow {
            attrelid: 500,
            attname: "name".into(),
            atttypid: 25,
        },
    ];

    let row = |oid: u32, typname: &str, typreceive: &str, typrelid: u32| TypeRow {
        oid,
        typname: typname.into(),
        typreceive: typreceive.into(),
        typrelid,
        typarray: None,
    };

    // the record comes before the types of its members
    let types = vec![
        row(501, "users", "record_recv", 500),
        TypeRow {
            typarray: Some(1007),
            ..row(23, "int4", "int4in", 0)
        },
        row(25, "text", "textin", 0),
        row(1033, "aclitem", "", 0),
    ];

    let (resolver, load) = catalog::load(attributes, &types);

    assert!(load.is_complete());
    assert_eq!(load.classes, 1);
    assert_eq!(load.passes, 2);
    assert_eq!(load.types, 5);

    assert_eq!(resolver.find_array(23)?.oid(), 1007);
    assert_eq!(resolver.find(1033)?.type_id(), NzTypeId::Unknown);

    let users = resolver.find(501)?;
    let names: Vec<_> = users.children().iter().map(NzType::field_name).collect();
    assert_eq!(names, ["id", "name"]);

    Ok(())
}

#[test]
fn it_reports_unresolvable_catalog_rows() {
    setup();

    let types = vec![TypeRow {
        oid: 600,
        typname: "orphan".into(),
        typreceive: "record_recv".into(),
        typrelid: 599,
        typarray: None,
    }];

    let (resolver, load) = catalog::load(Vec::new(), &types);

    assert!(!load.is_complete());
    assert_eq!(load.passes, catalog::MAX_PASSES);
    assert!(matches!(
        load.unresolved.as_slice(),
        [(600, Error::UnknownCatalogReference { what: "class", oid: 599 })]
    ));
    assert!(!resolver.contains(600));
}
