//! Built-in vehicle telemetry messages.
//!
//! Versions follow the terminal protocol revisions: `-1` for 2011, `0` for
//! 2013 and `1` for 2019.

use recwire::{Field, FieldSet, MessageId, Record, SchemaError, SchemaRegistry, Version};

const V2011: Version = -1;
const V2013: Version = 0;
const V2019: Version = 1;
const ALL: [Version; 3] = [V2011, V2013, V2019];

/// Terminal registration (0x0100).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TerminalRegister {
    pub province: u16,
    pub city: u16,
    pub manufacturer: String,
    pub model: String,
    pub terminal_id: String,
    pub plate_color: u8,
    pub plate: String,
}

impl Record for TerminalRegister {
    const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0100)];

    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(
                Field::word(1, "province").versions(ALL),
                |r| Some(r.province),
                |r, v| r.province = v,
            )
            .scalar(
                Field::word(2, "city").versions(ALL),
                |r| Some(r.city),
                |r, v| r.city = v,
            )
            .scalar(
                Field::string(3, "manufacturer").length(5).versions([V2011, V2013]),
                |r| Some(r.manufacturer.clone()),
                |r, v| r.manufacturer = v,
            )
            .scalar(
                Field::string(3, "manufacturer").length(11).version(V2019),
                |r| Some(r.manufacturer.clone()),
                |r, v| r.manufacturer = v,
            )
            .scalar(
                Field::string(4, "model").length(8).version(V2011),
                |r| Some(r.model.clone()),
                |r, v| r.model = v,
            )
            .scalar(
                Field::string(4, "model").length(20).version(V2013),
                |r| Some(r.model.clone()),
                |r, v| r.model = v,
            )
            .scalar(
                Field::string(4, "model").length(30).version(V2019),
                |r| Some(r.model.clone()),
                |r, v| r.model = v,
            )
            .scalar(
                Field::string(5, "terminal id").length(7).versions([V2011, V2013]),
                |r| Some(r.terminal_id.clone()),
                |r, v| r.terminal_id = v,
            )
            .scalar(
                Field::string(5, "terminal id").length(30).version(V2019),
                |r| Some(r.terminal_id.clone()),
                |r, v| r.terminal_id = v,
            )
            .scalar(
                Field::byte(6, "plate color").versions(ALL),
                |r| Some(r.plate_color),
                |r, v| r.plate_color = v,
            )
            .scalar(
                Field::string(7, "plate").versions(ALL),
                |r| Some(r.plate.clone()),
                |r, v| r.plate = v,
            );
    }
}

/// Location report (0x0200). The fixed part is identical in every revision.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocationReport {
    pub alarm: u32,
    pub status: u32,
    /// Degrees times 10^6.
    pub latitude: u32,
    pub longitude: u32,
    /// Metres.
    pub altitude: u16,
    /// 1/10 km/h.
    pub speed: u16,
    pub direction: u16,
    /// `YYMMDDhhmmss`, GMT+8.
    pub time: String,
}

/// Encoded size of a [`LocationReport`].
pub const LOCATION_REPORT_LEN: usize = 28;

impl Record for LocationReport {
    const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0200)];

    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::dword(1, "alarm").versions(ALL), |r| Some(r.alarm), |r, v| r.alarm = v)
            .scalar(Field::dword(2, "status").versions(ALL), |r| Some(r.status), |r, v| r.status = v)
            .scalar(
                Field::dword(3, "latitude").versions(ALL),
                |r| Some(r.latitude),
                |r, v| r.latitude = v,
            )
            .scalar(
                Field::dword(4, "longitude").versions(ALL),
                |r| Some(r.longitude),
                |r, v| r.longitude = v,
            )
            .scalar(
                Field::word(5, "altitude").versions(ALL),
                |r| Some(r.altitude),
                |r, v| r.altitude = v,
            )
            .scalar(Field::word(6, "speed").versions(ALL), |r| Some(r.speed), |r, v| r.speed = v)
            .scalar(
                Field::word(7, "direction").versions(ALL),
                |r| Some(r.direction),
                |r, v| r.direction = v,
            )
            .scalar(
                Field::bcd(8, "time").length(6).versions(ALL),
                |r| Some(r.time.clone()),
                |r, v| r.time = v,
            );
    }
}

/// One entry of a batch upload: a length prefix followed by a location report.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocationItem {
    pub length: u16,
    pub location: LocationReport,
}

impl Record for LocationItem {
    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::word(1, "length").versions(ALL), |r| Some(r.length), |r, v| r.length = v)
            .object(
                Field::obj(2, "location").length(LOCATION_REPORT_LEN).versions(ALL),
                |r| Some(&r.location),
                |r, v| r.location = v,
            );
    }
}

/// Batch location upload (0x0704).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LocationBatch {
    pub count: u16,
    /// 0 for regular reports, 1 for backfilled ones.
    pub kind: u8,
    pub items: Vec<LocationItem>,
}

impl Record for LocationBatch {
    const MESSAGE_IDS: &'static [MessageId] = &[MessageId::code(0x0704)];

    fn declare(fields: &mut FieldSet<Self>) {
        fields
            .scalar(Field::word(1, "count").versions(ALL), |r| Some(r.count), |r, v| r.count = v)
            .scalar(Field::byte(2, "kind").versions(ALL), |r| Some(r.kind), |r, v| r.kind = v)
            .list(
                Field::list(3, "items").versions(ALL),
                |r| Some(r.items.as_slice()),
                |r, v| r.items = v,
            );
    }
}

/// Registry with every built-in message registered and compiled.
pub fn registry() -> Result<SchemaRegistry, SchemaError> {
    SchemaRegistry::builder()
        .register::<TerminalRegister>()
        .register::<LocationReport>()
        .register::<LocationBatch>()
        .with_warm_up(true)
        .build()
}
