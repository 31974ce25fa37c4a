//! Blocking HTTP transport.

use std::time::Duration;

use reqwest::{
    StatusCode,
    blocking::{Client, Response},
};

use crate::{
    error::TransportError,
    transport::{StatusClass, Transport, TransportResponse},
};

/// Header carrying the payload byte count of a data response.
pub const DEFAULT_LENGTH_HEADER: &str = "Ncstream-Data-Length";

/// [`Transport`] backed by a pooled `reqwest` blocking client. Redirects are
/// followed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    length_header: String,
}

/// Builder for configuring [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportBuilder {
    timeout: Option<Duration>,
    user_agent: String,
    length_header: String,
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: concat!("ncstream/", env!("CARGO_PKG_VERSION")).to_string(),
            length_header: DEFAULT_LENGTH_HEADER.to_string(),
        }
    }
}

impl HttpTransportBuilder {
    /// Request timeout. The default is no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Response header holding the declared payload length.
    pub fn with_length_header(mut self, header: impl Into<String>) -> Self {
        self.length_header = header.into();
        self
    }

    pub fn build(self) -> Result<HttpTransport, TransportError> {
        if reqwest::header::HeaderName::from_bytes(self.length_header.as_bytes()).is_err() {
            return Err(TransportError::Config {
                detail: format!("invalid header name '{}'", self.length_header),
            });
        }
        let mut builder = Client::builder().user_agent(self.user_agent);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(HttpTransport {
            client: builder.build()?,
            length_header: self.length_header,
        })
    }
}

impl HttpTransport {
    /// Transport with default settings.
    pub fn new() -> Result<Self, TransportError> {
        Self::builder().build()
    }

    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::default()
    }

    fn declared_length(&self, response: &Response) -> Option<u64> {
        let value = response.headers().get(self.length_header.as_str())?;
        match value.to_str().ok().and_then(|v| v.trim().parse().ok()) {
            Some(length) => Some(length),
            None => {
                log::warn!(
                    "ignoring unparsable {} header {:?}",
                    self.length_header,
                    value
                );
                None
            }
        }
    }
}

fn classify(status: StatusCode) -> StatusClass {
    if status.is_success() {
        StatusClass::Success
    } else if status == StatusCode::NOT_FOUND {
        StatusClass::NotFound
    } else {
        StatusClass::OtherError
    }
}

impl Transport for HttpTransport {
    fn send(&self, url: &str) -> Result<TransportResponse, TransportError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        let declared_length = self.declared_length(&response);
        Ok(TransportResponse {
            status: classify(status),
            detail: status.to_string(),
            declared_length,
            body: Box::new(response),
        })
    }
}
