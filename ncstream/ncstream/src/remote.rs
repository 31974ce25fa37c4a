//! Remote dataset session.

use std::{
    fs,
    io::{BufWriter, Read, Write},
    path::Path,
    sync::Arc,
    time::Instant,
};

use ncstream_core::{DatasetSchema, ElementType, Section, VariableSchema};
use ncstream_wire::{
    DataHeader, DecodeError, FrameError, RecordOptions, START_MAGIC, decode_fixed_array,
    decode_schema, decode_sequence_stream,
    frame::{read_length_prefixed, read_start, write_varint},
    payload_len,
};
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::{
    error::{DatasetError, TransportError},
    request::{Request, canonical_location, request_base},
    source::{DatasetSource, VariableData},
    transport::{StatusClass, Transport, TransportResponse},
};

/// Lifecycle of a [`RemoteDataset`].
///
/// `Unopened` and `SchemaFetched` only exist while [`RemoteDatasetBuilder::open`]
/// runs; an opened dataset is `Ready` until [`RemoteDataset::close`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unopened,
    SchemaFetched,
    Ready,
    Closed,
}

/// What to do when a fixed-type data response carries no declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LengthPolicy {
    /// Skip the length check; the payload frame is still checked on decode.
    #[default]
    SkipWhenAbsent,
    /// Fail with [`DatasetError::MissingDeclaredLength`].
    Require,
}

/// Progress of [`RemoteDataset::materialize_with_progress`], reported after
/// each variable is written.
#[derive(Debug, Clone, Copy)]
pub struct MaterializeProgress<'a> {
    pub variable: &'a str,
    /// Zero-based position of `variable` in schema order.
    pub index: usize,
    pub total: usize,
    /// Bytes written to the sink so far, magic and metadata included.
    pub bytes_written: u64,
}

/// Builder for configuring [`RemoteDataset`].
pub struct RemoteDatasetBuilder {
    uri: String,
    transport: Option<Arc<dyn Transport>>,
    length_policy: LengthPolicy,
    lenient_record_end: bool,
}

impl RemoteDatasetBuilder {
    /// Transport used for every request. Defaults to
    /// [`HttpTransport`](crate::HttpTransport) when the `http` feature is
    /// enabled.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn with_length_policy(mut self, policy: LengthPolicy) -> Self {
        self.length_policy = policy;
        self
    }

    /// Accept record streams that end without the zero-length terminator.
    pub fn with_lenient_record_end(mut self, lenient: bool) -> Self {
        self.lenient_record_end = lenient;
        self
    }

    /// Fetch and decode the schema.
    pub fn open(self) -> Result<RemoteDataset, DatasetError> {
        let started = Instant::now();
        let base = request_base(&self.uri);
        let transport = match self.transport {
            Some(transport) => transport,
            None => default_transport(&base)?,
        };

        let mut state = SessionState::Unopened;
        let url = Request::Header.url(&base);
        log::trace!("{url}: {state:?}");
        let mut response = send_checked(transport.as_ref(), &url)?;
        read_start(&mut response.body).map_err(|e| schema_frame_error(&url, e))?;
        let metadata =
            read_length_prefixed(&mut response.body).map_err(|e| schema_frame_error(&url, e))?;
        drop(response);
        state = SessionState::SchemaFetched;
        log::trace!("{url}: {state:?}, {} metadata bytes", metadata.len());

        let schema = decode_schema(&metadata).map_err(|e| DatasetError::MalformedSchema {
            url: url.clone(),
            source: Box::new(e),
        })?;

        let location = canonical_location(&base);
        log::info!(
            "opened {location}: {} variables in {:.1?}",
            schema.variables().len(),
            started.elapsed()
        );
        Ok(RemoteDataset {
            location,
            base,
            schema,
            transport: RwLock::new(Some(transport)),
            length_policy: self.length_policy,
            lenient_record_end: self.lenient_record_end,
        })
    }
}

#[cfg(feature = "http")]
fn default_transport(base: &str) -> Result<Arc<dyn Transport>, DatasetError> {
    let transport = crate::http::HttpTransport::new().map_err(|source| DatasetError::Transport {
        url: base.to_string(),
        source,
    })?;
    Ok(Arc::new(transport))
}

#[cfg(not(feature = "http"))]
fn default_transport(_base: &str) -> Result<Arc<dyn Transport>, DatasetError> {
    Err(DatasetError::Unsupported {
        detail: "no transport configured and the `http` feature is disabled".to_string(),
    })
}

/// A dataset served over the ncstream protocol.
///
/// The schema is fetched once by [`open`](Self::open) and is immutable
/// afterwards. Every read issues exactly one request; nothing is cached.
pub struct RemoteDataset {
    location: String,
    base: String,
    schema: DatasetSchema,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    length_policy: LengthPolicy,
    lenient_record_end: bool,
}

impl RemoteDataset {
    /// Open `uri` with default settings over `transport`.
    pub fn open(uri: &str, transport: impl Transport + 'static) -> Result<Self, DatasetError> {
        Self::builder(uri).with_transport(transport).open()
    }

    pub fn builder(uri: impl Into<String>) -> RemoteDatasetBuilder {
        RemoteDatasetBuilder {
            uri: uri.into(),
            transport: None,
            length_policy: LengthPolicy::default(),
            lenient_record_end: false,
        }
    }

    /// Canonical location, `ncremote:` followed by the request base.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// HTTP base URL every request is built on.
    pub fn request_base(&self) -> &str {
        &self.base
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn length_policy(&self) -> LengthPolicy {
        self.length_policy
    }

    pub fn state(&self) -> SessionState {
        if self.transport.read().is_some() {
            SessionState::Ready
        } else {
            SessionState::Closed
        }
    }

    /// Release the transport. Later reads fail with [`DatasetError::Closed`].
    /// Closing twice is a no-op.
    pub fn close(&self) {
        if self.transport.write().take().is_some() {
            log::debug!("closed {}", self.location);
        }
    }

    fn transport(&self) -> Result<Arc<dyn Transport>, DatasetError> {
        self.transport.read().clone().ok_or(DatasetError::Closed)
    }

    /// Read a variable, or the part of it selected by `section`.
    ///
    /// Unknown names and sections that do not fit the variable fail before
    /// any request is sent. For fixed types the declared length is checked
    /// against `element size × selected elements` before the body is read.
    pub fn read_variable(
        &self,
        name: &str,
        section: Option<&Section>,
    ) -> Result<VariableData, DatasetError> {
        let transport = self.transport()?;
        let variable = self
            .schema
            .variable(name)
            .ok_or_else(|| DatasetError::UnknownVariable {
                name: name.to_string(),
            })?;
        let section = resolve_section(variable, section)?;

        let url = Request::variable(name, section.clone()).url(&self.base);
        let mut response = send_checked(transport.as_ref(), &url)?;
        let shape = self.check_declared_length(variable, &section, response.declared_length)?;

        read_start(&mut response.body).map_err(|e| data_frame_error(&url, name, e))?;
        let header = read_length_prefixed(&mut response.body)
            .map_err(|e| data_frame_error(&url, name, e))?;
        let header = DataHeader::parse(&header).map_err(|source| DatasetError::MalformedRecord {
            variable: name.to_string(),
            source,
        })?;
        if header.name != name {
            log::warn!(
                "{url}: response header names '{}', expected '{name}'",
                header.name
            );
        }

        if variable.element_type.is_record() {
            let expected_count = match variable.element_type {
                ElementType::Structure => Some(selected_elements(variable, &section)),
                _ => None,
            };
            let options = RecordOptions::default()
                .lenient_end(self.lenient_record_end)
                .expected_count(expected_count);
            return Ok(VariableData::Records(decode_sequence_stream(
                response.body,
                &variable.members,
                options,
            )));
        }

        let payload = read_length_prefixed(&mut response.body)
            .map_err(|e| data_frame_error(&url, name, e))?;
        let array = decode_fixed_array(payload, variable.element_type, variable.unsigned, shape)
            .map_err(|source| DatasetError::MalformedRecord {
                variable: name.to_string(),
                source,
            })?;
        Ok(VariableData::Array(array))
    }

    /// Issue independent reads in parallel. Results come back in request
    /// order.
    pub fn read_many(
        &self,
        requests: &[(&str, Option<Section>)],
    ) -> Vec<Result<VariableData, DatasetError>> {
        requests
            .par_iter()
            .map(|(name, section)| self.read_variable(name, section.as_ref()))
            .collect()
    }

    /// Write a local copy of the whole dataset to `sink` and return the
    /// number of bytes written.
    ///
    /// On error the sink holds a partial copy that must be discarded.
    pub fn materialize<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64, DatasetError> {
        self.materialize_with_progress(sink, |_| {})
    }

    /// [`materialize`](Self::materialize), calling `on_progress` after each
    /// variable.
    pub fn materialize_with_progress<W: Write + ?Sized>(
        &self,
        sink: &mut W,
        mut on_progress: impl FnMut(&MaterializeProgress<'_>),
    ) -> Result<u64, DatasetError> {
        let transport = self.transport()?;

        sink.write_all(&START_MAGIC)?;
        let mut written = START_MAGIC.len() as u64;

        let url = Request::Header.url(&self.base);
        let mut response = send_checked(transport.as_ref(), &url)?;
        read_start(&mut response.body).map_err(|e| schema_frame_error(&url, e))?;
        let metadata = read_body(&url, response)?;
        sink.write_all(&metadata)?;
        written += metadata.len() as u64;

        let variables = self.schema.variables();
        for (index, variable) in variables.iter().enumerate() {
            let whole = Section::whole();
            let url = Request::variable(&variable.name, whole.clone()).url(&self.base);
            let mut response = send_checked(transport.as_ref(), &url)?;
            self.check_declared_length(variable, &whole, response.declared_length)?;
            read_start(&mut response.body)
                .map_err(|e| data_frame_error(&url, &variable.name, e))?;

            let body = read_body(&url, response)?;
            written += write_varint(&mut *sink, body.len() as u64)? as u64;
            sink.write_all(&body)?;
            written += body.len() as u64;
            log::debug!("materialized {} ({} bytes)", variable.name, body.len());

            on_progress(&MaterializeProgress {
                variable: &variable.name,
                index,
                total: variables.len(),
                bytes_written: written,
            });
        }
        sink.flush()?;
        Ok(written)
    }

    /// [`materialize`](Self::materialize) into a newly created file at
    /// `path`. A failed copy leaves a partial file behind.
    pub fn materialize_to_path(&self, path: impl AsRef<Path>) -> Result<u64, DatasetError> {
        let mut file = BufWriter::new(fs::File::create(path.as_ref())?);
        self.materialize(&mut file)
    }

    /// For fixed types, compare the declared length with the size implied by
    /// type and section, and return the shape of the result.
    fn check_declared_length(
        &self,
        variable: &VariableSchema,
        section: &Section,
        declared: Option<u64>,
    ) -> Result<Vec<u64>, DatasetError> {
        let shape = result_shape(variable, section);
        if variable.element_type.is_record() {
            return Ok(shape);
        }
        let expected = payload_len(variable.element_type, &shape).ok_or_else(|| {
            DatasetError::SectionOutOfRange {
                variable: variable.name.clone(),
                detail: "selection size overflows".to_string(),
            }
        })?;
        log::debug!(
            "{}: declared length {declared:?}, expected {expected}",
            variable.name
        );
        match (declared, self.length_policy) {
            (Some(declared), _) if declared != expected => Err(DatasetError::SizeMismatch {
                variable: variable.name.clone(),
                declared,
                expected,
            }),
            (None, LengthPolicy::Require) => Err(DatasetError::MissingDeclaredLength {
                variable: variable.name.clone(),
            }),
            _ => Ok(shape),
        }
    }
}

impl DatasetSource for RemoteDataset {
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
        RemoteDataset::read_variable(self, name, section)
    }
}

impl std::fmt::Debug for RemoteDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDataset")
            .field("location", &self.location)
            .field("variables", &self.schema.variables().len())
            .field("state", &self.state())
            .field("length_policy", &self.length_policy)
            .finish()
    }
}

/// Check `section` against `variable`. `None` and the whole section both mean
/// the whole variable; sequences accept nothing else.
pub(crate) fn resolve_section(
    variable: &VariableSchema,
    section: Option<&Section>,
) -> Result<Section, DatasetError> {
    let Some(section) = section.filter(|s| !s.is_whole()) else {
        return Ok(Section::whole());
    };
    if variable.element_type == ElementType::Sequence {
        return Err(DatasetError::SectionOutOfRange {
            variable: variable.name.clone(),
            detail: "sequences can only be read whole".to_string(),
        });
    }
    section
        .check_bounds(&variable.dim_lengths())
        .map_err(|e| DatasetError::section(&variable.name, e))?;
    Ok(section.clone())
}

/// Shape of the data a resolved section selects. Unknown dimensions read as
/// zero-length.
pub(crate) fn result_shape(variable: &VariableSchema, section: &Section) -> Vec<u64> {
    if section.is_whole() {
        variable
            .dim_lengths()
            .iter()
            .map(|d| d.fixed().unwrap_or(0))
            .collect()
    } else {
        section.shape()
    }
}

fn selected_elements(variable: &VariableSchema, section: &Section) -> u64 {
    result_shape(variable, section).iter().product()
}

fn send_checked(transport: &dyn Transport, url: &str) -> Result<TransportResponse, DatasetError> {
    log::debug!("request {url}");
    let response = transport
        .send(url)
        .map_err(|source| DatasetError::Transport {
            url: url.to_string(),
            source,
        })?;
    match response.status {
        StatusClass::Success => Ok(response),
        StatusClass::NotFound => Err(DatasetError::NotFound {
            url: url.to_string(),
            detail: response.detail,
        }),
        StatusClass::OtherError => Err(DatasetError::Transport {
            url: url.to_string(),
            source: TransportError::Status {
                detail: response.detail,
            },
        }),
    }
}

/// Rest of a response body. Read failures are the connection's, not the
/// sink's.
fn read_body(url: &str, mut response: TransportResponse) -> Result<Vec<u8>, DatasetError> {
    let mut body = Vec::new();
    response
        .body
        .read_to_end(&mut body)
        .map_err(|source| DatasetError::Transport {
            url: url.to_string(),
            source: TransportError::Io(source),
        })?;
    Ok(body)
}

fn schema_frame_error(url: &str, error: FrameError) -> DatasetError {
    match error {
        FrameError::BadMagic { found } => DatasetError::BadMagic {
            url: url.to_string(),
            found,
        },
        FrameError::Io(source) => DatasetError::Transport {
            url: url.to_string(),
            source: TransportError::Io(source),
        },
        other => DatasetError::MalformedSchema {
            url: url.to_string(),
            source: Box::new(other),
        },
    }
}

fn data_frame_error(url: &str, variable: &str, error: FrameError) -> DatasetError {
    match error {
        FrameError::BadMagic { found } => DatasetError::BadMagic {
            url: url.to_string(),
            found,
        },
        FrameError::Io(source) => DatasetError::Transport {
            url: url.to_string(),
            source: TransportError::Io(source),
        },
        other => DatasetError::MalformedRecord {
            variable: variable.to_string(),
            source: DecodeError::Frame(other),
        },
    }
}
