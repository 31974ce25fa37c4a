mod common;

use std::{
    fs,
    io::{self, Read, Write},
    sync::Arc,
};

use common::{URI, fixture, server, url};
use ncstream::{
    CannedResponse, DatasetError, DatasetSource, LocalDataset, MemoryTransport, RemoteDataset,
    StatusClass, Transport, TransportError, TransportResponse, VariableData,
    core::{Array, DatasetSchema, Dimension, ElementType, Range, Section, Value, VariableSchema},
    wire::{START_MAGIC, StructureRecord},
};

// ── helpers ──────────────────────────────────────────────────────────────────

enum Materialized {
    Array(ncstream::core::Array),
    Records(Vec<StructureRecord>),
}

fn collect(data: VariableData) -> Materialized {
    match data {
        VariableData::Array(array) => Materialized::Array(array),
        VariableData::Records(records) => Materialized::Records(
            records
                .collect::<Result<_, _>>()
                .expect("records decode"),
        ),
    }
}

fn assert_same(source: &dyn DatasetSource, reference: &dyn DatasetSource, name: &str, section: Option<&Section>) {
    let ours = collect(source.read_variable(name, section).expect("local read"));
    let theirs = collect(reference.read_variable(name, section).expect("remote read"));
    match (ours, theirs) {
        (Materialized::Array(a), Materialized::Array(b)) => assert_eq!(a, b, "{name}"),
        (Materialized::Records(a), Materialized::Records(b)) => assert_eq!(a, b, "{name}"),
        _ => panic!("{name}: data kinds differ"),
    }
}

/// Fails every read with `ConnectionReset`.
struct ResetReader;

impl Read for ResetReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
    }
}

/// Serves the fixture, but the `flags` body breaks off after six bytes.
struct ResetDuringFlags(Arc<MemoryTransport>);

impl Transport for ResetDuringFlags {
    fn send(&self, request: &str) -> Result<TransportResponse, TransportError> {
        if request != url("var=flags") {
            return self.0.send(request);
        }
        let mut full = Vec::new();
        self.0.send(request)?.body.read_to_end(&mut full)?;
        let head = io::Cursor::new(full[..6].to_vec());
        Ok(TransportResponse::success(head.chain(ResetReader)).with_declared_length(Some(8)))
    }
}

struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk gone"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── materialize ──────────────────────────────────────────────────────────────

#[test]
fn local_copy_reads_like_the_remote() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    let mut copy = Vec::new();
    let written = remote.materialize(&mut copy).expect("materialize");
    assert_eq!(written, copy.len() as u64);
    assert_eq!(&copy[..4], &START_MAGIC);

    let local = LocalDataset::from_bytes(copy).expect("parse copy");
    assert_eq!(local.schema(), remote.schema());
    assert_eq!(local.location(), "memory");
    for variable in remote.schema().variables() {
        assert_same(&local, &remote, &variable.name, None);
    }
}

#[test]
fn local_copy_slices_fixed_variables() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("obs.ncs");
    let written = remote.materialize_to_path(&path).expect("materialize");
    assert_eq!(fs::metadata(&path).expect("metadata").len(), written);

    let local = LocalDataset::open(&path).expect("open copy");
    let sections = [
        ("temp", Section::new(vec![Range::span(2, 4).expect("range"), Range::span(0, 20).expect("range")])),
        ("temp", Section::new(vec![Range::new(1, 10, 3).expect("range"), Range::new(0, 20, 7).expect("range")])),
        ("temp", Section::new(vec![Range::span(5, 5).expect("range"), Range::span(0, 20).expect("range")])),
        ("wind speed", Section::new(vec![Range::span(1, 2).expect("range")])),
    ];
    for (name, section) in &sections {
        assert_same(&local, &remote, name, Some(section));
    }
}

#[test]
fn requests_follow_schema_order() {
    let transport = server(fixture());
    let remote = RemoteDataset::open(URI, transport.clone()).expect("open");
    transport.clear_requests();
    remote.materialize(&mut Vec::new()).expect("materialize");

    let expected: Vec<_> = std::iter::once(url("req=header"))
        .chain(
            ["temp", "flags", "station", "wind+speed", "points", "obs"]
                .iter()
                .map(|name| url(&format!("var={name}"))),
        )
        .collect();
    assert_eq!(transport.requests(), expected);
}

#[test]
fn progress_is_reported_per_variable() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    let mut seen = Vec::new();
    let written = remote
        .materialize_with_progress(&mut Vec::new(), |progress| {
            seen.push((
                progress.variable.to_string(),
                progress.index,
                progress.total,
                progress.bytes_written,
            ))
        })
        .expect("materialize");

    let names: Vec<_> = seen.iter().map(|(name, ..)| name.as_str()).collect();
    assert_eq!(
        names,
        ["temp", "flags", "station", "wind speed", "points", "obs"]
    );
    assert!(seen.iter().enumerate().all(|(i, (_, index, total, _))| *index == i && *total == 6));
    assert!(seen.windows(2).all(|w| w[0].3 < w[1].3));
    assert_eq!(seen.last().map(|s| s.3), Some(written));
}

#[test]
fn failed_variable_aborts_materialize() {
    let transport = server(fixture());
    transport.insert(
        url("var=station"),
        CannedResponse::status(StatusClass::NotFound, "404 Not Found"),
    );
    let remote = RemoteDataset::open(URI, transport.clone()).expect("open");
    transport.clear_requests();

    let mut partial = Vec::new();
    assert!(matches!(
        remote.materialize(&mut partial),
        Err(DatasetError::NotFound { .. })
    ));
    assert!(partial.starts_with(&START_MAGIC));
    assert_eq!(transport.request_count(), 4);
}

#[test]
fn materialize_checks_declared_length() {
    let transport = server(fixture());
    transport.insert(
        url("var=flags"),
        CannedResponse::ok(bytes::Bytes::new()).with_declared_length(9),
    );
    let remote = RemoteDataset::open(URI, transport).expect("open");
    assert!(matches!(
        remote.materialize(&mut Vec::new()),
        Err(DatasetError::SizeMismatch {
            declared: 9,
            expected: 8,
            ..
        })
    ));
}

#[test]
fn connection_reset_mid_body_is_a_transport_error() {
    let remote = RemoteDataset::open(URI, ResetDuringFlags(server(fixture()))).expect("open");
    match remote.materialize(&mut Vec::new()).unwrap_err() {
        DatasetError::Transport {
            url: failed,
            source: TransportError::Io(e),
        } => {
            assert_eq!(failed, url("var=flags"));
            assert_eq!(e.kind(), io::ErrorKind::ConnectionReset);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn sink_failure_is_a_local_io_error() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    match remote.materialize(&mut BrokenSink).unwrap_err() {
        DatasetError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── local reads ──────────────────────────────────────────────────────────────

#[test]
fn local_copy_rejects_sequence_sections_and_unknown_names() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    let mut copy = Vec::new();
    remote.materialize(&mut copy).expect("materialize");
    let local = LocalDataset::from_bytes(copy).expect("parse copy");

    let subset = Section::new(vec![Range::span(0, 1).expect("range")]);
    assert!(matches!(
        local.read_variable("obs", Some(&subset)),
        Err(DatasetError::SectionOutOfRange { .. })
    ));
    assert!(matches!(
        local.read_variable("nope", None),
        Err(DatasetError::UnknownVariable { .. })
    ));
    let outside = Section::new(vec![Range::span(0, 4).expect("range")]);
    assert!(matches!(
        local.read_variable("wind speed", Some(&outside)),
        Err(DatasetError::SectionOutOfRange { .. })
    ));
}

#[test]
fn local_copy_slices_structure_records() {
    let remote = RemoteDataset::open(URI, server(fixture())).expect("open");
    let mut copy = Vec::new();
    remote.materialize(&mut copy).expect("materialize");
    let local = LocalDataset::from_bytes(copy).expect("parse copy");

    for section in [
        Section::new(vec![Range::span(1, 3).expect("range")]),
        Section::new(vec![Range::new(0, 3, 2).expect("range")]),
        Section::new(vec![Range::span(2, 2).expect("range")]),
    ] {
        assert_same(&local, &remote, "points", Some(&section));
    }
    let Materialized::Records(tail) = collect(
        local
            .read_variable("points", Some(&Section::new(vec![Range::span(1, 3).expect("range")])))
            .expect("local read"),
    ) else {
        panic!("points should be records");
    };
    assert_eq!(tail, vec![common::point(1), common::point(2)]);
}

#[test]
fn names_with_parentheses_survive_remote_reads_and_copies() {
    let mut data = fixture();
    let names = ["a(1)", "f(0:2)"];
    let variables = names
        .iter()
        .map(|name| VariableSchema::new(*name, ElementType::Byte, vec![Dimension::anonymous(3)]))
        .collect();
    data.schema = DatasetSchema::new(vec![], variables).expect("schema");
    data.arrays = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values = [i as i8, 10, 20].map(Value::I8);
            let array = Array::from_values(ElementType::Byte, false, vec![3], &values).expect("array");
            (name.to_string(), array)
        })
        .collect();
    data.records.clear();

    let transport = server(data);
    let remote = RemoteDataset::open(URI, transport.clone()).expect("open");
    let tail = Section::new(vec![Range::span(1, 3).expect("range")]);
    let array = remote
        .read_variable("f(0:2)", Some(&tail))
        .expect("read")
        .into_array()
        .expect("array");
    assert_eq!(array.values().collect::<Vec<_>>(), [Value::I8(10), Value::I8(20)]);
    assert_eq!(transport.requests().last(), Some(&url("var=f%280%3A2%29(1:3)")));

    let mut copy = Vec::new();
    remote.materialize(&mut copy).expect("materialize");
    let local = LocalDataset::from_bytes(copy).expect("parse copy");
    for name in names {
        assert_same(&local, &remote, name, None);
        assert_same(&local, &remote, name, Some(&tail));
    }
}

#[test]
fn local_copy_without_magic_is_rejected() {
    assert!(matches!(
        LocalDataset::from_bytes(vec![0u8, 0, 0, 0, 0]),
        Err(DatasetError::BadMagic { .. })
    ));
}

#[test]
fn local_copy_missing_a_variable_reports_not_found() {
    let data = fixture();
    let mut copy = START_MAGIC.to_vec();
    let metadata = ncstream::wire::encode_schema(&data.schema);
    ncstream::wire::frame::write_varint(&mut copy, metadata.len() as u64).expect("write");
    copy.extend_from_slice(&metadata);

    let local = LocalDataset::from_bytes(copy).expect("parse copy");
    assert!(matches!(
        local.read_variable("temp", None),
        Err(DatasetError::NotFound { .. })
    ));
}
