//! Wire format for `ncstream` responses.
//!
//! ```text
//! schema response   := START_MAGIC metadata_frame
//! data response     := START_MAGIC header_frame data_frame
//!                    | START_MAGIC header_frame record_frame* 0x00
//! materialized file := START_MAGIC metadata_frame (varint_len data_response_after_magic)*
//! ```
//!
//! [`frame`] handles magic and varint length prefixes, [`decode_schema`]
//! turns the metadata frame into a [`DatasetSchema`](ncstream_core::DatasetSchema),
//! and [`decode_fixed_array`] / [`decode_sequence_stream`] turn data frames
//! into arrays and records.

mod array;
mod error;
pub mod frame;
mod record;
mod response;
mod schema;

pub use array::{decode_fixed_array, payload_len};
pub use error::{DecodeError, FrameError, SchemaDecodeError};
pub use frame::{MAX_FRAME_LEN, START_MAGIC};
pub use record::{
    MemberValue, RecordIterator, RecordOptions, StructureRecord, decode_record,
    decode_sequence_stream, encode_record, encode_record_stream,
};
pub use response::{
    DataHeader, encode_array_response, encode_records_response, encode_schema_response,
};
pub use schema::{decode_schema, encode_schema};
