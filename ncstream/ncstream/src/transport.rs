//! Request/response transport abstraction and an in-memory implementation.

use std::{collections::HashMap, io::Read, sync::Arc};

use bytes::{Buf, Bytes};
use parking_lot::{Mutex, RwLock};

use crate::error::TransportError;

/// Coarse classification of a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    NotFound,
    OtherError,
}

/// One response from a [`Transport`]. The body is read lazily.
pub struct TransportResponse {
    pub status: StatusClass,
    /// Human readable status text, e.g. `404 Not Found`.
    pub detail: String,
    pub body: Box<dyn Read + Send>,
    /// Payload byte count announced by the server, if any.
    pub declared_length: Option<u64>,
}

impl TransportResponse {
    pub fn success(body: impl Read + Send + 'static) -> Self {
        Self {
            status: StatusClass::Success,
            detail: "200 OK".to_string(),
            body: Box::new(body),
            declared_length: None,
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self {
            status: StatusClass::NotFound,
            detail: detail.into(),
            body: Box::new(std::io::empty()),
            declared_length: None,
        }
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self {
            status: StatusClass::OtherError,
            detail: detail.into(),
            body: Box::new(std::io::empty()),
            declared_length: None,
        }
    }

    pub fn with_declared_length(mut self, length: Option<u64>) -> Self {
        self.declared_length = length;
        self
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("detail", &self.detail)
            .field("declared_length", &self.declared_length)
            .finish_non_exhaustive()
    }
}

/// Issues one synchronous request per call.
///
/// Implementations must be shareable across threads; a
/// [`RemoteDataset`](crate::RemoteDataset) may call [`send`](Transport::send)
/// concurrently from [`read_many`](crate::RemoteDataset::read_many).
pub trait Transport: Send + Sync {
    fn send(&self, url: &str) -> Result<TransportResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, url: &str) -> Result<TransportResponse, TransportError> {
        (**self).send(url)
    }
}

/// A stored response for [`MemoryTransport`].
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: StatusClass,
    pub detail: String,
    pub body: Bytes,
    pub declared_length: Option<u64>,
}

impl CannedResponse {
    /// Successful response whose declared length is `None`.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: StatusClass::Success,
            detail: "200 OK".to_string(),
            body: body.into(),
            declared_length: None,
        }
    }

    pub fn status(status: StatusClass, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
            body: Bytes::new(),
            declared_length: None,
        }
    }

    pub fn with_declared_length(mut self, length: u64) -> Self {
        self.declared_length = Some(length);
        self
    }

    fn to_response(&self) -> TransportResponse {
        TransportResponse {
            status: self.status,
            detail: self.detail.clone(),
            body: Box::new(self.body.clone().reader()),
            declared_length: self.declared_length,
        }
    }
}

type Handler = dyn Fn(&str) -> Option<CannedResponse> + Send + Sync;

/// Transport that serves canned responses keyed by exact URL and records
/// every request it sees.
///
/// URLs without a canned response go to the fallback handler if one is set,
/// otherwise they are answered with `404 Not Found`.
#[derive(Default)]
pub struct MemoryTransport {
    responses: RwLock<HashMap<String, CannedResponse>>,
    handler: Option<Box<Handler>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport that computes responses on demand.
    pub fn with_handler(
        handler: impl Fn(&str) -> Option<CannedResponse> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Some(Box::new(handler)),
            ..Self::default()
        }
    }

    pub fn insert(&self, url: impl Into<String>, response: CannedResponse) {
        self.responses.write().insert(url.into(), response);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

impl Transport for MemoryTransport {
    fn send(&self, url: &str) -> Result<TransportResponse, TransportError> {
        self.requests.lock().push(url.to_string());

        if let Some(canned) = self.responses.read().get(url) {
            return Ok(canned.to_response());
        }
        let computed = self.handler.as_ref().and_then(|handler| handler(url));
        Ok(match computed {
            Some(canned) => canned.to_response(),
            None => TransportResponse::not_found("404 Not Found"),
        })
    }
}

impl std::fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("responses", &self.responses.read().len())
            .field("handler", &self.handler.is_some())
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}
