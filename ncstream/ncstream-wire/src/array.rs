//! Fixed-type data payloads.

use bytes::Bytes;
use ncstream_core::{Array, ElementType};

use crate::error::DecodeError;

/// `element size × Π shape`, or `None` for record types and overflowing
/// shapes.
pub fn payload_len(element_type: ElementType, shape: &[u64]) -> Option<u64> {
    let size = element_type.size()? as u64;
    shape.iter().try_fold(size, |acc, &n| acc.checked_mul(n))
}

/// Wrap a data payload as an [`Array`] without copying.
///
/// Fails with [`DecodeError::SizeMismatch`] unless the payload holds exactly
/// `element size × Π shape` bytes.
pub fn decode_fixed_array(
    payload: Bytes,
    element_type: ElementType,
    unsigned: bool,
    shape: Vec<u64>,
) -> Result<Array, DecodeError> {
    if let Some(expected) = payload_len(element_type, &shape)
        && payload.len() as u64 != expected
    {
        return Err(DecodeError::SizeMismatch {
            expected,
            actual: payload.len() as u64,
        });
    }
    Ok(Array::new(element_type, unsigned, shape, payload)?)
}
