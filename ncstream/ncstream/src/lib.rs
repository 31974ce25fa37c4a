//! Client for the ncstream remote data-access protocol.
//!
//! [`RemoteDataset::open`] fetches a dataset's schema over a [`Transport`];
//! [`RemoteDataset::read_variable`] then reads whole variables or sections of
//! them, and [`RemoteDataset::materialize`] writes a local copy that
//! [`LocalDataset`] can read back.
//!
//! ```no_run
//! use ncstream::{HttpTransport, RemoteDataset, core::Range};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = RemoteDataset::open("ncremote://example.org/data/obs.nc", HttpTransport::new()?)?;
//! let temp = dataset.schema().variable("temp").ok_or("no temp")?;
//! let section = temp.section(vec![Range::span(2, 4)?, Range::span(0, 20)?])?;
//! let array = dataset
//!     .read_variable("temp", Some(&section))?
//!     .into_array()
//!     .ok_or("not a fixed-type variable")?;
//! println!("{:?}", array.shape());
//! # Ok(())
//! # }
//! ```

mod error;
#[cfg(feature = "http")]
mod http;
mod local;
mod remote;
pub mod request;
mod source;
pub mod transport;

pub use error::{DatasetError, RequestError, TransportError};
#[cfg(feature = "http")]
pub use http::{DEFAULT_LENGTH_HEADER, HttpTransport, HttpTransportBuilder};
pub use local::LocalDataset;
pub use ncstream_core as core;
pub use ncstream_wire as wire;
pub use remote::{
    LengthPolicy, MaterializeProgress, RemoteDataset, RemoteDatasetBuilder, SessionState,
};
pub use request::Request;
pub use source::{DatasetSource, VariableData};
pub use transport::{CannedResponse, MemoryTransport, StatusClass, Transport, TransportResponse};
