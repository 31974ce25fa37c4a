//! Structure and sequence record streams.
//!
//! A record lays out its members in declaration order:
//!
//! - fixed member: `size × Π shape` big-endian bytes;
//! - structure member: `Π shape` length-prefixed nested records;
//! - sequence member: length-prefixed nested records, then a zero-length frame.
//!
//! A record stream is a run of length-prefixed records ended by a zero-length
//! frame.

use std::{
    io::Read,
    iter::FusedIterator,
    sync::Arc,
};

use bytes::{Bytes, BytesMut};
use ncstream_core::{Array, ElementType, VariableSchema};

use crate::{
    array::payload_len,
    error::DecodeError,
    frame::{put_length_prefixed, put_varint, read_frame_or_end, split_length_prefixed},
};

/// Value of one member inside a [`StructureRecord`].
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    Array(Array),
    /// Nested structure elements or sequence records.
    Records(Vec<StructureRecord>),
}

/// One decoded record: member name → value, in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StructureRecord {
    members: Vec<(String, MemberValue)>,
}

impl StructureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: MemberValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: MemberValue) {
        self.members.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&MemberValue> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn array(&self, name: &str) -> Option<&Array> {
        match self.get(name)? {
            MemberValue::Array(array) => Some(array),
            MemberValue::Records(_) => None,
        }
    }

    pub fn records(&self, name: &str) -> Option<&[StructureRecord]> {
        match self.get(name)? {
            MemberValue::Records(records) => Some(records),
            MemberValue::Array(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MemberValue)> {
        self.members.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// How a [`RecordIterator`] treats the end of its stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordOptions {
    /// Accept end of data at a record boundary in place of the zero-length
    /// terminator. Off by default: a missing terminator is an error.
    pub lenient_end: bool,
    /// Exact number of records the stream must hold, when known up front.
    pub expected_count: Option<u64>,
}

impl RecordOptions {
    pub fn lenient_end(mut self, lenient: bool) -> Self {
        self.lenient_end = lenient;
        self
    }

    pub fn expected_count(mut self, count: Option<u64>) -> Self {
        self.expected_count = count;
        self
    }
}

/// Lazy, single-pass iterator over a record stream.
///
/// The iterator owns its byte source and drops it as soon as the terminator
/// is read or an error is yielded. After that it only returns `None`.
pub struct RecordIterator<R = Box<dyn Read + Send>> {
    source: Option<R>,
    members: Arc<[VariableSchema]>,
    record_size: Option<u64>,
    options: RecordOptions,
    count: u64,
}

/// Start decoding the record stream in `source`, positioned just after the
/// data header.
pub fn decode_sequence_stream<R: Read>(
    source: R,
    members: &[VariableSchema],
    options: RecordOptions,
) -> RecordIterator<R> {
    let record_size = members
        .iter()
        .try_fold(0u64, |acc, m| acc.checked_add(m.byte_size()?));
    RecordIterator {
        source: Some(source),
        members: members.into(),
        record_size,
        options,
        count: 0,
    }
}

impl<R: Read> RecordIterator<R> {
    /// Records yielded so far.
    pub fn records_read(&self) -> u64 {
        self.count
    }

    /// `true` once the stream has ended or failed and the source is released.
    pub fn is_finished(&self) -> bool {
        self.source.is_none()
    }

    /// Size every record frame must have, when all members are fixed.
    pub fn record_size(&self) -> Option<u64> {
        self.record_size
    }

    fn read_next(&mut self) -> Result<Option<StructureRecord>, DecodeError> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };

        let frame = match read_frame_or_end(source)? {
            Some(frame) => frame,
            None if self.options.lenient_end => {
                self.check_count()?;
                return Ok(None);
            }
            None => {
                return Err(DecodeError::MissingTerminator {
                    records: self.count,
                });
            }
        };
        if frame.is_empty() {
            self.check_count()?;
            return Ok(None);
        }

        if let Some(expected) = self.options.expected_count
            && self.count >= expected
        {
            return Err(DecodeError::MalformedRecord {
                index: self.count,
                detail: format!("stream holds more than {expected} records"),
            });
        }
        if let Some(size) = self.record_size
            && frame.len() as u64 != size
        {
            return Err(DecodeError::MalformedRecord {
                index: self.count,
                detail: format!("record is {} bytes, expected {size}", frame.len()),
            });
        }

        decode_record(frame, &self.members, self.count).map(Some)
    }

    fn check_count(&self) -> Result<(), DecodeError> {
        match self.options.expected_count {
            Some(expected) if expected != self.count => Err(DecodeError::MalformedRecord {
                index: self.count,
                detail: format!("stream ended after {} of {expected} records", self.count),
            }),
            _ => Ok(()),
        }
    }

    fn finish(&mut self) {
        if self.source.take().is_some() {
            log::debug!("record stream released after {} records", self.count);
        }
    }
}

impl<R: Read> Iterator for RecordIterator<R> {
    type Item = Result<StructureRecord, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_next() {
            Ok(Some(record)) => {
                self.count += 1;
                Some(Ok(record))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for RecordIterator<R> {}

impl<R> std::fmt::Debug for RecordIterator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordIterator")
            .field("open", &self.source.is_some())
            .field("members", &self.members.len())
            .field("record_size", &self.record_size)
            .field("count", &self.count)
            .finish()
    }
}

/// Decode one record frame against its member layout.
pub fn decode_record(
    mut frame: Bytes,
    members: &[VariableSchema],
    index: u64,
) -> Result<StructureRecord, DecodeError> {
    let malformed = |detail: String| DecodeError::MalformedRecord { index, detail };

    let mut record = StructureRecord::new();
    for member in members {
        let value = match member.element_type {
            ElementType::Structure => {
                let count = member.element_count().ok_or_else(|| {
                    malformed(format!("structure member '{}' has no fixed shape", member.name))
                })?;
                let mut nested = Vec::new();
                for i in 0..count {
                    let sub = split_length_prefixed(&mut frame).map_err(|e| {
                        malformed(format!("member '{}' element {i}: {e}", member.name))
                    })?;
                    nested.push(decode_record(sub, &member.members, i)?);
                }
                MemberValue::Records(nested)
            }
            ElementType::Sequence => {
                let mut nested = Vec::new();
                loop {
                    let sub = split_length_prefixed(&mut frame).map_err(|e| {
                        malformed(format!("member '{}' record {}: {e}", member.name, nested.len()))
                    })?;
                    if sub.is_empty() {
                        break;
                    }
                    nested.push(decode_record(sub, &member.members, nested.len() as u64)?);
                }
                MemberValue::Records(nested)
            }
            element_type => {
                let shape = member.shape().ok_or_else(|| {
                    malformed(format!("member '{}' has no fixed shape", member.name))
                })?;
                let len = payload_len(element_type, &shape)
                    .ok_or_else(|| malformed(format!("member '{}' size overflows", member.name)))?;
                if (frame.len() as u64) < len {
                    return Err(malformed(format!(
                        "member '{}' needs {len} bytes, {} left",
                        member.name,
                        frame.len()
                    )));
                }
                let bytes = frame.split_to(len as usize);
                MemberValue::Array(Array::new(element_type, member.unsigned, shape, bytes)?)
            }
        };
        record.push(member.name.clone(), value);
    }

    if !frame.is_empty() {
        return Err(malformed(format!("{} trailing bytes", frame.len())));
    }
    Ok(record)
}

/// Encode `record` as a record frame payload (without its length prefix).
pub fn encode_record(
    members: &[VariableSchema],
    record: &StructureRecord,
) -> Result<Bytes, DecodeError> {
    let mut buf = BytesMut::new();
    put_record(&mut buf, members, record, 0)?;
    Ok(buf.freeze())
}

/// Encode a whole record stream: each record length-prefixed, then the
/// zero-length terminator.
pub fn encode_record_stream(
    members: &[VariableSchema],
    records: &[StructureRecord],
) -> Result<Bytes, DecodeError> {
    let mut buf = BytesMut::new();
    for (index, record) in records.iter().enumerate() {
        let mut frame = BytesMut::new();
        put_record(&mut frame, members, record, index as u64)?;
        if frame.is_empty() {
            return Err(DecodeError::MalformedRecord {
                index: index as u64,
                detail: "record encodes to zero bytes".to_string(),
            });
        }
        put_length_prefixed(&mut buf, &frame);
    }
    put_varint(&mut buf, 0);
    Ok(buf.freeze())
}

fn put_record(
    buf: &mut BytesMut,
    members: &[VariableSchema],
    record: &StructureRecord,
    index: u64,
) -> Result<(), DecodeError> {
    let malformed = |detail: String| DecodeError::MalformedRecord { index, detail };

    for member in members {
        let value = record
            .get(&member.name)
            .ok_or_else(|| malformed(format!("missing member '{}'", member.name)))?;
        match (member.element_type, value) {
            (ElementType::Structure, MemberValue::Records(nested)) => {
                if Some(nested.len() as u64) != member.element_count() {
                    return Err(malformed(format!(
                        "member '{}' holds {} elements, shape needs {:?}",
                        member.name,
                        nested.len(),
                        member.element_count()
                    )));
                }
                for (i, n) in nested.iter().enumerate() {
                    let mut sub = BytesMut::new();
                    put_record(&mut sub, &member.members, n, i as u64)?;
                    put_length_prefixed(buf, &sub);
                }
            }
            (ElementType::Sequence, MemberValue::Records(nested)) => {
                for (i, n) in nested.iter().enumerate() {
                    let mut sub = BytesMut::new();
                    put_record(&mut sub, &member.members, n, i as u64)?;
                    put_length_prefixed(buf, &sub);
                }
                put_varint(buf, 0);
            }
            (element_type, MemberValue::Array(array))
                if !element_type.is_record()
                    && array.element_type() == element_type
                    && member.shape().as_deref() == Some(array.shape()) =>
            {
                buf.extend_from_slice(array.as_bytes());
            }
            _ => {
                return Err(malformed(format!(
                    "member '{}' does not match its declared {} layout",
                    member.name, member.element_type
                )));
            }
        }
    }
    Ok(())
}
