use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
};

use recwire_schema::{CyclePolicy, Field, FieldSet, Record, SchemaError, SchemaRegistry};

static SHARED_DECLARED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct Shared {
    value: u8,
}

impl Record for Shared {
    fn declare(fields: &mut FieldSet<Self>) {
        SHARED_DECLARED.fetch_add(1, Ordering::SeqCst);
        fields.scalar(Field::byte(1, "value"), |r| Some(r.value), |r, v| r.value = v);
    }
}

#[derive(Debug, Default)]
struct Outer {
    first: Shared,
    rest: Vec<Shared>,
}

impl Record for Outer {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .object(Field::obj(1, "first"), |r| Some(&r.first), |r, v| r.first = v)
            .list(
                Field::list(2, "rest"),
                |r| Some(r.rest.as_slice()),
                |r, v| r.rest = v,
            );
    }
}

#[derive(Debug, Default)]
struct OtherOuter {
    inner: Shared,
}

impl Record for OtherOuter {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.object(Field::obj(1, "inner"), |r| Some(&r.inner), |r, v| r.inner = v);
    }
}

#[test]
fn nested_type_is_compiled_once() {
    let registry = SchemaRegistry::new();
    registry.compile::<Outer>().expect("outer");
    registry.compile::<OtherOuter>().expect("other outer");
    registry.compile::<Shared>().expect("shared");

    assert_eq!(SHARED_DECLARED.load(Ordering::SeqCst), 1);

    let direct = registry.lookup::<Shared>(0).expect("shared v0");
    let outer = registry.lookup::<Outer>(0).expect("outer v0");
    assert_eq!(outer.fields()[0].nested_type(), Some("Shared"));
    assert_eq!(direct.len(), 1);
}

#[derive(Debug, Default)]
struct Plain {
    value: u16,
}

impl Record for Plain {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(Field::word(1, "value"), |r| Some(r.value), |r, v| r.value = v);
    }
}

#[test]
fn repeated_compile_returns_the_cached_set() {
    let registry = SchemaRegistry::new();
    let first = registry.compile::<Plain>().expect("first");
    let second = registry.compile::<Plain>().expect("second");
    assert!(Arc::ptr_eq(&first, &second));
    assert!(registry.is_compiled::<Plain>());
}

static CONCURRENT_DECLARED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
struct Contended {
    value: u32,
}

impl Record for Contended {
    fn declare(fields: &mut FieldSet<Self>) {
        CONCURRENT_DECLARED.fetch_add(1, Ordering::SeqCst);
        fields.scalar(Field::dword(1, "value"), |r| Some(r.value), |r, v| r.value = v);
    }
}

#[test]
fn concurrent_compiles_share_one_result() {
    let registry = SchemaRegistry::new();

    let sets: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| registry.compile::<Contended>().expect("compile")))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("thread panicked"))
            .collect()
    });

    assert_eq!(CONCURRENT_DECLARED.load(Ordering::SeqCst), 1);
    assert!(sets.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[derive(Debug, Default)]
struct Node {
    value: u8,
    child: Option<Box<Node>>,
}

impl Record for Node {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::byte(1, "value"), |r| Some(r.value), |r, v| r.value = v)
            .object(
                Field::obj(2, "child"),
                |r| r.child.as_deref(),
                |r, v| r.child = Some(Box::new(v)),
            );
    }
}

#[test]
fn self_reference_is_rejected_by_default() {
    let registry = SchemaRegistry::new();
    let err = registry.compile::<Node>().expect_err("cyclic");
    assert_eq!(
        err,
        SchemaError::CyclicSchema {
            path: "Node -> Node".to_string(),
        }
    );

    // A failed compilation leaves nothing behind; retrying fails the same way.
    assert!(!registry.is_compiled::<Node>());
    assert_eq!(registry.compile::<Node>().expect_err("still cyclic"), err);
}

#[test]
fn truncated_self_reference_terminates() {
    let registry = SchemaRegistry::builder()
        .with_cycle_policy(CyclePolicy::Truncate)
        .build()
        .expect("build");
    let schema = registry.lookup::<Node>(0).expect("compile");

    let child = schema.fields()[1]
        .info()
        .nested
        .expect("child is composite");
    assert_eq!(child.type_name, "Node");
    assert!(child.fields.is_empty());

    let record = Node {
        value: 1,
        child: Some(Box::new(Node {
            value: 2,
            child: None,
        })),
    };
    let encoded = schema.encode(&record).expect("encode");
    assert_eq!(encoded.as_ref(), &[1]);

    let decoded = schema.decode_slice(&[1, 2, 3]).expect("decode");
    assert_eq!(decoded.value, 1);
    assert!(decoded.child.is_none());
}

#[derive(Debug, Default)]
struct Parent {
    child: Option<Box<Child>>,
}

#[derive(Debug, Default)]
struct Child {
    parent: Option<Box<Parent>>,
    tag: u8,
}

impl Record for Parent {
    fn declare(fields: &mut FieldSet<Self>) {
        fields.object(
            Field::obj(1, "child"),
            |r| r.child.as_deref(),
            |r, v| r.child = Some(Box::new(v)),
        );
    }
}

impl Record for Child {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::byte(1, "tag"), |r| Some(r.tag), |r, v| r.tag = v)
            .object(
                Field::obj(2, "parent"),
                |r| r.parent.as_deref(),
                |r, v| r.parent = Some(Box::new(v)),
            );
    }
}

#[test]
fn indirect_cycle_reports_the_path() {
    let registry = SchemaRegistry::new();
    let err = registry.compile::<Parent>().expect_err("cyclic");
    assert_eq!(
        err,
        SchemaError::CyclicSchema {
            path: "Parent -> Child -> Parent".to_string(),
        }
    );
    assert!(!registry.is_compiled::<Child>());
}

#[test]
fn failed_compile_does_not_block_valid_types() {
    let registry = SchemaRegistry::new();
    registry.compile::<Node>().expect_err("cyclic");
    registry.compile::<Plain>().expect("unrelated type still compiles");
}
