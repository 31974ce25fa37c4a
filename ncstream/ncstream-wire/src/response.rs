//! Whole responses: data headers and the encoders a server (or a test) uses
//! to produce schema, array and record responses.

use std::fmt;

use bytes::{Bytes, BytesMut};
use ncstream_core::{Array, DatasetSchema, Section, VariableSchema};
use url::form_urlencoded;

use crate::{
    error::DecodeError,
    frame::{START_MAGIC, put_length_prefixed},
    record::{StructureRecord, encode_record_stream},
    schema::encode_schema,
};

/// Header frame of a data response: `name` or `name(section)`.
///
/// The name is form-urlencoded the same way as in request URLs, so names
/// containing parentheses stay unambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataHeader {
    pub name: String,
    pub section: Section,
}

impl DataHeader {
    pub fn new(name: impl Into<String>, section: Section) -> Self {
        Self {
            name: name.into(),
            section,
        }
    }

    pub fn parse(frame: &[u8]) -> Result<Self, DecodeError> {
        let malformed = |detail: String| DecodeError::MalformedHeader { detail };
        let text = std::str::from_utf8(frame).map_err(|e| malformed(e.to_string()))?;

        // The encoded name never contains a raw '('.
        let (raw_name, section) = match text.split_once('(') {
            Some((raw_name, rest)) => {
                let ranges = rest
                    .strip_suffix(')')
                    .ok_or_else(|| malformed(format!("unterminated section in '{text}'")))?;
                let section = ranges
                    .parse::<Section>()
                    .map_err(|e| malformed(e.to_string()))?;
                (raw_name, section)
            }
            None => (text, Section::whole()),
        };
        let name = form_urlencoded::parse(raw_name.as_bytes())
            .next()
            .map(|(name, _)| name.into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, section))
    }
}

impl fmt::Display for DataHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded: String = form_urlencoded::byte_serialize(self.name.as_bytes()).collect();
        if self.section.is_whole() {
            f.write_str(&encoded)
        } else {
            write!(f, "{encoded}({})", self.section)
        }
    }
}

/// `START_MAGIC metadata_frame`
pub fn encode_schema_response(schema: &DatasetSchema) -> Bytes {
    let metadata = encode_schema(schema);
    let mut buf = BytesMut::with_capacity(START_MAGIC.len() + metadata.len() + 10);
    buf.extend_from_slice(&START_MAGIC);
    put_length_prefixed(&mut buf, &metadata);
    buf.freeze()
}

/// `START_MAGIC header_frame data_frame`
pub fn encode_array_response(header: &DataHeader, array: &Array) -> Bytes {
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&START_MAGIC);
    put_length_prefixed(&mut buf, header.to_string().as_bytes());
    put_length_prefixed(&mut buf, array.as_bytes());
    buf.freeze()
}

/// `START_MAGIC header_frame record_frame* 0x00`
pub fn encode_records_response(
    header: &DataHeader,
    variable: &VariableSchema,
    records: &[StructureRecord],
) -> Result<Bytes, DecodeError> {
    let stream = encode_record_stream(&variable.members, records)?;
    let mut buf = BytesMut::new();
    buf.extend_from_slice(&START_MAGIC);
    put_length_prefixed(&mut buf, header.to_string().as_bytes());
    buf.extend_from_slice(&stream);
    Ok(buf.freeze())
}
