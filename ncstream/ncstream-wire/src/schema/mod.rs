//! Metadata frame ⇄ [`DatasetSchema`].
//!
//! # Pipeline
//!
//! ```text
//! metadata bytes (UTF-8 schema text)
//!   └─ parse_schema   – nom grammar → AST
//!       └─ resolve    – type tags, dimensions, attribute values → DatasetSchema
//! ```

mod ast;
mod parser;
mod resolver;

use bytes::Bytes;
use ncstream_core::DatasetSchema;

use crate::error::SchemaDecodeError;

/// Decode the payload of a metadata frame.
pub fn decode_schema(metadata: &[u8]) -> Result<DatasetSchema, SchemaDecodeError> {
    let text = std::str::from_utf8(metadata)?;
    let items = parser::parse_schema(text)?;
    let schema = resolver::resolve(items)?;
    log::debug!(
        "decoded schema: {} attributes, {} variables",
        schema.attributes().len(),
        schema.variables().len()
    );
    Ok(schema)
}

/// Canonical metadata frame payload for `schema`.
pub fn encode_schema(schema: &DatasetSchema) -> Bytes {
    Bytes::from(schema.to_string())
}
