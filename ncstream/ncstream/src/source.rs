use ncstream_core::{Array, DatasetSchema, Section};
use ncstream_wire::RecordIterator;

use crate::error::DatasetError;

/// Result of reading one variable.
#[derive(Debug)]
pub enum VariableData {
    /// Fixed-type data, fully decoded.
    Array(Array),
    /// Structure or sequence data, decoded lazily.
    Records(RecordIterator),
}

impl VariableData {
    pub fn into_array(self) -> Option<Array> {
        match self {
            Self::Array(array) => Some(array),
            Self::Records(_) => None,
        }
    }

    pub fn into_records(self) -> Option<RecordIterator> {
        match self {
            Self::Records(records) => Some(records),
            Self::Array(_) => None,
        }
    }
}

/// A readable dataset, remote or local.
pub trait DatasetSource {
    fn schema(&self) -> &DatasetSchema;

    /// Canonical location of the dataset.
    fn location(&self) -> &str;

    /// Read a variable, or the part of it selected by `section`. `None` reads
    /// the whole variable.
    fn read_variable(
        &self,
        name: &str,
        section: Option<&Section>,
    ) -> Result<VariableData, DatasetError>;
}
