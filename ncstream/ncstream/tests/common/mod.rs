#![allow(dead_code)]

use std::{collections::HashMap, sync::Arc};

use bytes::Bytes;
use ncstream::{
    CannedResponse, MemoryTransport, Request, StatusClass,
    core::{
        Array, Attribute, DatasetSchema, Dimension, ElementType, Section, Value, VariableSchema,
    },
    wire::{
        DataHeader, MemberValue, StructureRecord, encode_array_response, encode_records_response,
        encode_schema_response,
    },
};

pub const URI: &str = "ncremote://test.invalid/data/obs.nc";
pub const BASE: &str = "http://test.invalid/data/obs.nc";

pub fn url(query: &str) -> String {
    format!("{BASE}?{query}")
}

/// Data served by the fake server.
pub struct Fixture {
    pub schema: DatasetSchema,
    pub arrays: HashMap<String, Array>,
    pub records: HashMap<String, Vec<StructureRecord>>,
    pub declare_lengths: bool,
}

fn point_members() -> Vec<VariableSchema> {
    vec![
        VariableSchema::new("id", ElementType::Int, vec![]),
        VariableSchema::new("xy", ElementType::Float, vec![Dimension::anonymous(2)]),
    ]
}

fn obs_members() -> Vec<VariableSchema> {
    vec![
        VariableSchema::new("id", ElementType::Int, vec![]),
        VariableSchema::new("t", ElementType::Long, vec![]),
    ]
}

fn scalar(element_type: ElementType, value: Value) -> MemberValue {
    MemberValue::Array(Array::from_values(element_type, false, vec![], &[value]).expect("scalar"))
}

pub fn point(id: i32) -> StructureRecord {
    let xy = Array::from_values(
        ElementType::Float,
        false,
        vec![2],
        &[Value::F32(id as f32), Value::F32(-(id as f32))],
    )
    .expect("xy");
    StructureRecord::new()
        .with("id", scalar(ElementType::Int, Value::I32(id)))
        .with("xy", MemberValue::Array(xy))
}

pub fn observation(id: i32) -> StructureRecord {
    StructureRecord::new()
        .with("id", scalar(ElementType::Int, Value::I32(id)))
        .with(
            "t",
            scalar(ElementType::Long, Value::I64(1_700_000_000 + id as i64)),
        )
}

/// `temp[i]` is `i / 2` in row-major order.
pub fn temp_value(row: u64, col: u64) -> f32 {
    (row * 20 + col) as f32 * 0.5
}

pub fn fixture() -> Fixture {
    let schema = DatasetSchema::new(
        vec![Attribute::text("title", "fake server")],
        vec![
            VariableSchema::new(
                "temp",
                ElementType::Float,
                vec![Dimension::new("time", 10), Dimension::new("lat", 20)],
            )
            .with_attributes(vec![Attribute::text("units", "K")]),
            VariableSchema::new("flags", ElementType::Short, vec![Dimension::anonymous(4)])
                .with_unsigned(true),
            VariableSchema::new("station", ElementType::Char, vec![Dimension::anonymous(8)]),
            VariableSchema::new("wind speed", ElementType::Double, vec![Dimension::anonymous(3)]),
            VariableSchema::new("points", ElementType::Structure, vec![Dimension::anonymous(3)])
                .with_members(point_members()),
            VariableSchema::new("obs", ElementType::Sequence, vec![Dimension::unknown()])
                .with_members(obs_members()),
        ],
    )
    .expect("fixture schema");

    let temp: Vec<Value> = (0..10)
        .flat_map(|row| (0..20).map(move |col| Value::F32(temp_value(row, col))))
        .collect();
    let flags = [1u16, 255, 32768, 65535].map(Value::U16);
    let station: Vec<Value> = b"KDEN\0\0\0\0".iter().map(|&c| Value::Char(c)).collect();
    let wind = [0.0f64, 12.5, -1.0].map(Value::F64);

    let arrays = HashMap::from([
        (
            "temp".to_string(),
            Array::from_values(ElementType::Float, false, vec![10, 20], &temp).expect("temp"),
        ),
        (
            "flags".to_string(),
            Array::from_values(ElementType::Short, true, vec![4], &flags).expect("flags"),
        ),
        (
            "station".to_string(),
            Array::from_values(ElementType::Char, false, vec![8], &station).expect("station"),
        ),
        (
            "wind speed".to_string(),
            Array::from_values(ElementType::Double, false, vec![3], &wind).expect("wind"),
        ),
    ]);
    let records = HashMap::from([
        ("points".to_string(), (0..3).map(point).collect()),
        ("obs".to_string(), (0..4).map(observation).collect()),
    ]);

    Fixture {
        schema,
        arrays,
        records,
        declare_lengths: true,
    }
}

/// In-process server for [`fixture`] data. Canned responses inserted with
/// [`MemoryTransport::insert`] take precedence.
pub fn server(fixture: Fixture) -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::with_handler(move |url| {
        let query = url.strip_prefix(BASE)?;
        let Ok(request) = Request::parse(query) else {
            return Some(bad_request());
        };
        match request {
            Request::Header => Some(CannedResponse::ok(encode_schema_response(&fixture.schema))),
            Request::Variable { name, section } => serve_variable(&fixture, name, section),
        }
    }))
}

fn serve_variable(fixture: &Fixture, name: String, section: Section) -> Option<CannedResponse> {
    let variable = fixture.schema.variable(&name)?;

    if let Some(array) = fixture.arrays.get(&name) {
        let data = if section.is_whole() {
            array.clone()
        } else {
            match array.slice(&section) {
                Ok(data) => data,
                Err(_) => return Some(bad_request()),
            }
        };
        let length = data.as_bytes().len() as u64;
        let body = encode_array_response(&DataHeader::new(name, section), &data);
        let response = CannedResponse::ok(body);
        return Some(if fixture.declare_lengths {
            response.with_declared_length(length)
        } else {
            response
        });
    }

    let records = fixture.records.get(&name)?;
    let selected: Vec<StructureRecord> = match section.ranges() {
        [] => records.clone(),
        [range] => (0..range.len())
            .filter_map(|i| records.get(range.index(i) as usize).cloned())
            .collect(),
        _ => return Some(bad_request()),
    };
    let body = encode_records_response(&DataHeader::new(name, section), variable, &selected).ok()?;
    Some(CannedResponse::ok(body))
}

fn bad_request() -> CannedResponse {
    CannedResponse::status(StatusClass::OtherError, "400 Bad Request")
}

pub fn static_body(data: &'static [u8]) -> Bytes {
    Bytes::from_static(data)
}
