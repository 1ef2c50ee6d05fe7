use bytes::Bytes;
use recwire_schema::{
    CyclePolicy, Field, FieldSet, IndexPolicy, MessageId, Record, SchemaError, SchemaRegistry,
};

#[derive(Debug, Default, PartialEq)]
struct Heartbeat {
    sequence: u16,
}

impl Record for Heartbeat {
    const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0002)];

    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(
            Field::word(1, "sequence"),
            |r| Some(r.sequence),
            |r, v| r.sequence = v,
        );
    }
}

#[derive(Debug, Default, PartialEq)]
struct Ack {
    reply_to: u16,
    result: u8,
}

impl Record for Ack {
    const MESSAGE_IDS: &'static [MessageId] =
        &[MessageId::code(0x8001), MessageId::name("ack")];

    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::word(1, "reply_to"), |r| Some(r.reply_to), |r, v| r.reply_to = v)
            .scalar(Field::byte(2, "result").versions([0, 1]), |r| Some(r.result), |r, v| {
                r.result = v
            });
    }
}

#[derive(Debug, Default)]
struct Broken {
    value: u8,
}

impl Record for Broken {
    const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0F00)];

    fn declare(fields: &mut FieldSet<Self>) {
        fields.scalar(Field::word(1, "value"), |r| Some(r.value), |r, v| r.value = v);
    }
}

#[test]
fn lookup_by_message_id_decodes_the_registered_type() {
    let registry = SchemaRegistry::builder()
        .register::<Heartbeat>()
        .register::<Ack>()
        .build()
        .expect("build");

    let schema = registry
        .lookup_by_id(&MessageId::code(0x8001), 0)
        .expect("ack v0");
    assert_eq!(schema.type_name(), "Ack");

    let record = schema
        .decode_any(&mut Bytes::from_static(&[0x00, 0x02, 0x01]))
        .expect("decode");
    assert_eq!(
        record.downcast_ref::<Ack>(),
        Some(&Ack {
            reply_to: 2,
            result: 1,
        })
    );

    let by_name = registry
        .lookup_by_id(&"ack".parse().expect("infallible"), 1)
        .expect("ack v1");
    assert_eq!(by_name.version(), 1);
    assert_eq!(by_name.describe().len(), 1);
}

#[test]
fn versions_by_id_lists_compiled_versions() {
    let registry = SchemaRegistry::builder()
        .register::<Ack>()
        .build()
        .expect("build");
    assert_eq!(
        registry.versions_by_id(&MessageId::name("ack")),
        Ok(vec![0, 1])
    );
    assert!(registry.is_compiled::<Ack>());
}

#[test]
fn unknown_message_id_is_reported() {
    let registry = SchemaRegistry::new();
    let err = registry
        .lookup_by_id(&MessageId::code(0x0200), 0)
        .err()
        .expect("nothing registered");
    assert_eq!(
        err,
        SchemaError::UnknownMessageId {
            id: MessageId::code(0x0200),
        }
    );
}

#[test]
fn registered_version_must_exist() {
    let registry = SchemaRegistry::new();
    registry.register::<Heartbeat>().expect("register");
    let err = registry
        .lookup_by_id(&MessageId::code(0x0002), 3)
        .err()
        .expect("heartbeat has only version 0");
    assert!(matches!(err, SchemaError::NotFound { version: 3, .. }));
}

#[test]
fn conflicting_registration_changes_nothing() {
    let registry = SchemaRegistry::new();
    registry.register::<Heartbeat>().expect("register");
    // Same type again is fine.
    registry.register::<Heartbeat>().expect("re-register");

    let err = registry
        .register_as::<Ack>([MessageId::code(0x9999), MessageId::code(0x0002)])
        .expect_err("0x0002 belongs to Heartbeat");
    assert_eq!(
        err,
        SchemaError::ConflictingMessageId {
            id: MessageId::code(0x0002),
            registered: "Heartbeat",
            requested: "Ack",
        }
    );
    assert_eq!(
        registry.message_ids(),
        vec![(MessageId::code(0x0002), "Heartbeat")]
    );
}

#[test]
fn message_ids_are_sorted() {
    let registry = SchemaRegistry::builder()
        .register::<Ack>()
        .register::<Heartbeat>()
        .build()
        .expect("build");
    let ids: Vec<String> = registry
        .message_ids()
        .into_iter()
        .map(|(id, name)| format!("{id}={name}"))
        .collect();
    assert_eq!(ids, vec!["0x0002=Heartbeat", "0x8001=Ack", "ack=Ack"]);
}

#[test]
fn warm_up_compiles_registered_types() {
    let registry = SchemaRegistry::builder()
        .register::<Heartbeat>()
        .with_warm_up(true)
        .build()
        .expect("build");
    assert!(registry.is_compiled::<Heartbeat>());
    assert!(!registry.is_compiled::<Ack>());
}

#[test]
fn warm_up_surfaces_configuration_errors() {
    let err = SchemaRegistry::builder()
        .register::<Heartbeat>()
        .register::<Broken>()
        .with_warm_up(true)
        .build()
        .err()
        .expect("Broken binds u8 to a WORD field");
    assert!(matches!(err, SchemaError::IncompatibleAccessor { .. }));
}

#[test]
fn builder_options_are_kept() {
    let registry = SchemaRegistry::builder()
        .with_cycle_policy(CyclePolicy::Truncate)
        .build()
        .expect("build");
    assert_eq!(registry.options().cycle_policy, CyclePolicy::Truncate);
    assert_eq!(registry.options().index_policy, IndexPolicy::Strict);
    assert_eq!(SchemaRegistry::new().options().cycle_policy, CyclePolicy::Reject);
}
