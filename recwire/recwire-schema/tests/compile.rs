use std::sync::Arc;

use recwire_schema::{
    DataType, Field, FieldSet, IndexPolicy, Record, SchemaError, SchemaRegistry,
};

#[derive(Debug, Default)]
struct Unordered {
    a: u8,
    b: u16,
    c: u32,
}

impl Record for Unordered {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::dword(3, "c"), |r| Some(r.c), |r, v| r.c = v)
            .scalar(Field::byte(1, "a"), |r| Some(r.a), |r, v| r.a = v)
            .scalar(Field::word(2, "b"), |r| Some(r.b), |r, v| r.b = v);
    }
}

#[test]
fn fields_are_sorted_by_index() {
    let registry = SchemaRegistry::new();
    let schema = registry.lookup::<Unordered>(0).expect("compile");

    let indices: Vec<u32> = schema.fields().iter().map(|f| f.index()).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert_eq!(schema.fields()[0].label(), "a");
    assert_eq!(schema.fields()[2].length(), Some(4));
    assert_eq!(schema.field(2).map(|f| f.label()), Some("b"));
    assert!(schema.field(4).is_none());
}

#[test]
fn encoding_follows_index_order() {
    let schema = SchemaRegistry::new().lookup::<Unordered>(0).expect("compile");
    let record = Unordered {
        a: 0x01,
        b: 0x0203,
        c: 0x0405_0607,
    };

    let encoded = schema.encode(&record).expect("encode");
    assert_eq!(encoded.as_ref(), &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);

    let decoded = schema.decode_slice(&encoded).expect("decode");
    assert_eq!((decoded.a, decoded.b, decoded.c), (0x01, 0x0203, 0x0405_0607));
}

#[derive(Debug, Default)]
struct Wrapper<T> {
    inner: T,
}

impl<T: Record> Record for Wrapper<T> {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.object(Field::obj(1, "inner"), |r| Some(&r.inner), |r, v| r.inner = v);
    }
}

#[test]
fn generic_record_names_keep_their_arguments() {
    assert_eq!(Unordered::type_name(), "Unordered");

    let name = Wrapper::<Unordered>::type_name();
    assert!(name.starts_with("Wrapper<"), "{name}");
    assert!(name.ends_with("::Unordered>"), "{name}");

    let schema = SchemaRegistry::new()
        .lookup::<Wrapper<Unordered>>(0)
        .expect("compile");
    assert_eq!(schema.type_name(), name);
    let nested = schema.fields()[0].info().nested.expect("composite");
    assert_eq!(nested.type_name, "Unordered");
}

#[derive(Debug, Default)]
struct Revisions {
    id: u32,
    plate: String,
    extra: u8,
}

impl Record for Revisions {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(
                Field::dword(0, "id").versions([-1, 0, 1]),
                |r| Some(r.id),
                |r, v| r.id = v,
            )
            .scalar(
                Field::string(1, "plate").length(8).versions([0, 1]),
                |r| Some(r.plate.clone()),
                |r, v| r.plate = v,
            )
            .scalar(
                Field::byte(2, "extra").version(1),
                |r| Some(r.extra),
                |r, v| r.extra = v,
            );
    }
}

#[test]
fn versions_partition_fields() {
    let registry = SchemaRegistry::new();
    let set = registry.compile::<Revisions>().expect("compile");

    assert_eq!(set.versions().collect::<Vec<_>>(), vec![-1, 0, 1]);
    assert_eq!(set.get(-1).map(|s| s.len()), Some(1));
    assert_eq!(set.get(0).map(|s| s.len()), Some(2));
    assert_eq!(set.get(1).map(|s| s.len()), Some(3));
    assert!(set.get(2).is_none());

    let widths: Vec<(i32, usize)> = set.iter().map(|(v, s)| (v, s.len())).collect();
    assert_eq!(widths, vec![(-1, 1), (0, 2), (1, 3)]);
}

#[test]
fn scalar_descriptors_are_shared_across_versions() {
    let registry = SchemaRegistry::new();
    let v0 = registry.lookup::<Revisions>(0).expect("v0");
    let v1 = registry.lookup::<Revisions>(1).expect("v1");

    assert!(Arc::ptr_eq(&v0.fields()[0], &v1.fields()[0]));
    assert!(Arc::ptr_eq(&v0.fields()[1], &v1.fields()[1]));
}

#[test]
fn unknown_version_is_not_found() {
    let registry = SchemaRegistry::new();
    let err = registry.lookup::<Revisions>(7).expect_err("no such version");
    assert_eq!(
        err,
        SchemaError::NotFound {
            type_name: "Revisions",
            version: 7,
        }
    );
}

#[derive(Debug, Default)]
struct Empty;

impl Record for Empty {
    fn declare(_fields: &mut FieldSet<Self>) {}
}

#[test]
fn record_without_fields_compiles_to_empty_set() {
    let registry = SchemaRegistry::new();
    let set = registry.compile::<Empty>().expect("compile");
    assert!(set.is_empty());
    assert!(matches!(
        registry.lookup::<Empty>(0),
        Err(SchemaError::NotFound { .. })
    ));
}

#[derive(Debug, Default)]
struct Duplicated {
    first: u8,
    second: u8,
}

impl Record for Duplicated {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::byte(1, "first"), |r| Some(r.first), |r, v| r.first = v)
            .scalar(Field::byte(1, "second"), |r| Some(r.second), |r, v| r.second = v);
    }
}

#[test]
fn duplicate_index_is_rejected_by_default() {
    let registry = SchemaRegistry::new();
    let err = registry.compile::<Duplicated>().expect_err("duplicate");
    assert_eq!(
        err,
        SchemaError::DuplicateIndex {
            type_name: "Duplicated",
            version: 0,
            index: 1,
        }
    );
    assert!(!registry.is_compiled::<Duplicated>());
}

#[test]
fn stable_index_policy_keeps_declaration_order() {
    let registry = SchemaRegistry::builder()
        .with_index_policy(IndexPolicy::Stable)
        .build()
        .expect("build");
    let schema = registry.lookup::<Duplicated>(0).expect("compile");

    let labels: Vec<&str> = schema.fields().iter().map(|f| f.label()).collect();
    assert_eq!(labels, vec!["first", "second"]);

    let record = schema.decode_slice(&[7, 9]).expect("decode");
    assert_eq!(record.first, 7);
    assert_eq!(record.second, 9);
}

#[derive(Debug, Default)]
struct WrongAccessor {
    value: u8,
}

impl Record for WrongAccessor {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(Field::dword(1, "value"), |r| Some(r.value), |r, v| r.value = v);
    }
}

#[test]
fn accessor_type_must_match_kind() {
    let err = SchemaRegistry::new()
        .compile::<WrongAccessor>()
        .expect_err("u8 cannot carry a DWORD");
    assert_eq!(
        err,
        SchemaError::IncompatibleAccessor {
            type_name: "WrongAccessor",
            index: 1,
            label: "value".to_string(),
            data_type: DataType::Dword,
            value_type: "u8",
        }
    );
}

#[derive(Debug, Default)]
struct BadLength {
    value: u16,
}

impl Record for BadLength {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(
            Field::word(4, "value").length(3),
            |r| Some(r.value),
            |r, v| r.value = v,
        );
    }
}

#[test]
fn integer_length_must_be_canonical() {
    let err = SchemaRegistry::new()
        .compile::<BadLength>()
        .expect_err("WORD is two bytes");
    assert!(matches!(
        err,
        SchemaError::LengthMismatch {
            declared: 3,
            expected: 2,
            ..
        }
    ));
}

#[derive(Debug, Default)]
struct NoVersions {
    value: u8,
}

impl Record for NoVersions {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(
            Field::byte(1, "value").versions(Vec::new()),
            |r| Some(r.value),
            |r, v| r.value = v,
        );
    }
}

#[test]
fn field_needs_at_least_one_version() {
    let err = SchemaRegistry::new()
        .compile::<NoVersions>()
        .expect_err("no versions");
    assert!(matches!(err, SchemaError::MissingVersions { index: 1, .. }));
}

#[derive(Debug, Default)]
struct Point {
    x: u16,
}

impl Record for Point {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(Field::word(1, "x"), |r| Some(r.x), |r, v| r.x = v);
    }
}

#[derive(Debug, Default)]
struct ListDeclaredAsObj {
    points: Vec<Point>,
}

impl Record for ListDeclaredAsObj {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.list(
            Field::obj(1, "points"),
            |r| Some(r.points.as_slice()),
            |r, v| r.points = v,
        );
    }
}

#[test]
fn composite_kind_must_match_binding() {
    let err = SchemaRegistry::new()
        .compile::<ListDeclaredAsObj>()
        .expect_err("list bound to an OBJ field");
    assert!(matches!(err, SchemaError::MalformedComposite { index: 1, .. }));
}

#[derive(Debug, Default)]
struct NeedsNewerPoint {
    point: Point,
}

impl Record for NeedsNewerPoint {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.object(
            Field::obj(1, "point").versions([0, 1]),
            |r| Some(&r.point),
            |r, v| r.point = v,
        );
    }
}

#[test]
fn nested_record_must_define_every_referenced_version() {
    let registry = SchemaRegistry::new();
    let err = registry
        .compile::<NeedsNewerPoint>()
        .expect_err("Point has no version 1");
    assert_eq!(
        err,
        SchemaError::MissingNestedVersion {
            type_name: "NeedsNewerPoint",
            index: 1,
            label: "point".to_string(),
            nested: "Point",
            version: 1,
        }
    );
    // Nothing from a failed compilation is cached.
    assert!(!registry.is_compiled::<Point>());
}

#[test]
fn schema_display_lists_nested_fields() {
    #[derive(Debug, Default)]
    struct Track {
        points: Vec<Point>,
    }

    impl Record for Track {
        fn declare(fields: &mut FieldSet<Self>) {
            fields.list(
                Field::list(1, "points"),
                |r| Some(r.points.as_slice()),
                |r, v| r.points = v,
            );
        }
    }

    let schema = SchemaRegistry::new().lookup::<Track>(0).expect("compile");
    let text = schema.to_string();
    assert!(text.starts_with("Track (version 0)\n"));
    assert!(text.contains("list"));
    assert!(text.contains("Point:"));
    assert!(text.contains("word"));
    assert!(text.contains("x"));
}
