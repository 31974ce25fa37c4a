//! Reading materialized copies.

use std::{collections::HashMap, fs, io::Read, path::Path};

use bytes::{Buf, Bytes};
use memmap2::Mmap;
use ncstream_core::{DatasetSchema, ElementType, Section};
use ncstream_wire::{
    DataHeader, DecodeError, FrameError, RecordOptions, StructureRecord, decode_fixed_array,
    decode_schema, decode_sequence_stream, encode_record_stream,
    frame::{split_length_prefixed, split_start},
};

use crate::{
    error::DatasetError,
    remote::{resolve_section, result_shape},
    source::{DatasetSource, VariableData},
};

/// A dataset decoded from the output of
/// [`RemoteDataset::materialize`](crate::RemoteDataset::materialize).
///
/// Variables are decoded whole and sliced in memory, so any section the
/// remote dataset accepts is accepted here too. Sequences can only be read
/// whole.
#[derive(Debug)]
pub struct LocalDataset {
    location: String,
    schema: DatasetSchema,
    entries: HashMap<String, Bytes>,
}

impl LocalDataset {
    /// Memory-map and index the file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = fs::File::open(path)?;
        let mmap = unsafe { Mmap::map(&file) }?;
        Self::parse(path.display().to_string(), Bytes::from_owner(mmap))
    }

    pub fn from_bytes(bytes: impl Into<Bytes>) -> Result<Self, DatasetError> {
        Self::parse("memory".to_string(), bytes.into())
    }

    fn parse(location: String, mut bytes: Bytes) -> Result<Self, DatasetError> {
        split_start(&mut bytes).map_err(|e| match e {
            FrameError::BadMagic { found } => DatasetError::BadMagic {
                url: location.clone(),
                found,
            },
            other => DatasetError::MalformedSchema {
                url: location.clone(),
                source: Box::new(other),
            },
        })?;
        let metadata =
            split_length_prefixed(&mut bytes).map_err(|e| DatasetError::MalformedSchema {
                url: location.clone(),
                source: Box::new(e),
            })?;
        let schema = decode_schema(&metadata).map_err(|e| DatasetError::MalformedSchema {
            url: location.clone(),
            source: Box::new(e),
        })?;

        let mut entries = HashMap::new();
        let mut index = 0usize;
        while bytes.has_remaining() {
            let entry_error = |source: DecodeError| DatasetError::MalformedRecord {
                variable: format!("<entry {index}>"),
                source,
            };
            let mut entry = split_length_prefixed(&mut bytes)
                .map_err(|e| entry_error(DecodeError::Frame(e)))?;
            let header = split_length_prefixed(&mut entry)
                .map_err(|e| entry_error(DecodeError::Frame(e)))?;
            let header = DataHeader::parse(&header).map_err(entry_error)?;
            if entries.insert(header.name.clone(), entry).is_some() {
                log::warn!("{location}: duplicate entry for '{}'", header.name);
            }
            index += 1;
        }
        log::debug!(
            "{location}: {} variables, {} entries",
            schema.variables().len(),
            entries.len()
        );

        Ok(Self {
            location,
            schema,
            entries,
        })
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    /// Path of the file, or `memory` for [`from_bytes`](Self::from_bytes).
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn read_variable(
        &self,
        name: &str,
        section: Option<&Section>,
    ) -> Result<VariableData, DatasetError> {
        let variable = self
            .schema
            .variable(name)
            .ok_or_else(|| DatasetError::UnknownVariable {
                name: name.to_string(),
            })?;
        let section = resolve_section(variable, section)?;
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| DatasetError::NotFound {
                url: self.location.clone(),
                detail: format!("no data for variable '{name}'"),
            })?;
        let malformed = |source: DecodeError| DatasetError::MalformedRecord {
            variable: name.to_string(),
            source,
        };

        if variable.element_type.is_record() {
            let expected_count = match variable.element_type {
                ElementType::Structure => variable.element_count(),
                _ => None,
            };
            let source: Box<dyn Read + Send> = Box::new(entry.clone().reader());
            let records = decode_sequence_stream(
                source,
                &variable.members,
                RecordOptions::default().expected_count(expected_count),
            );
            if section.is_whole() {
                return Ok(VariableData::Records(records));
            }

            // Structures only; sequences were limited to the whole section.
            let records = records.collect::<Result<Vec<_>, _>>().map_err(malformed)?;
            let shape = result_shape(variable, &Section::whole());
            let selected: Vec<StructureRecord> = flat_indices(&section, &shape)
                .filter_map(|i| records.get(i as usize).cloned())
                .collect();
            let stream = encode_record_stream(&variable.members, &selected).map_err(malformed)?;
            let source: Box<dyn Read + Send> = Box::new(stream.reader());
            return Ok(VariableData::Records(decode_sequence_stream(
                source,
                &variable.members,
                RecordOptions::default().expected_count(Some(selected.len() as u64)),
            )));
        }

        let mut entry = entry.clone();
        let payload =
            split_length_prefixed(&mut entry).map_err(|e| malformed(DecodeError::Frame(e)))?;
        let whole = result_shape(variable, &Section::whole());
        let array = decode_fixed_array(payload, variable.element_type, variable.unsigned, whole)
            .map_err(malformed)?;
        if section.is_whole() {
            return Ok(VariableData::Array(array));
        }
        let sliced = array
            .slice(&section)
            .map_err(|e| malformed(DecodeError::Array(e)))?;
        Ok(VariableData::Array(sliced))
    }
}

/// Row-major element indices `section` selects from an array of `shape`.
fn flat_indices(section: &Section, shape: &[u64]) -> impl Iterator<Item = u64> {
    let ranges = section.ranges().to_vec();
    let mut strides = vec![1u64; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * shape[d + 1];
    }
    let total = section.compute_size();
    (0..total).map(move |mut n| {
        let mut flat = 0;
        for (range, stride) in ranges.iter().zip(&strides).rev() {
            flat += range.index(n % range.len()) * stride;
            n /= range.len();
        }
        flat
    })
}

impl DatasetSource for LocalDataset {
    fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    fn location(&self) -> &str {
        &self.location
    }

    fn read_variable(
        &self,
        name: &str,
        section: Option<&Section>,
    ) -> Result<VariableData, DatasetError> {
        LocalDataset::read_variable(self, name, section)
    }
}
