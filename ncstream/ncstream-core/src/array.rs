//! Typed, shaped, immutable array values.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    element_type::ElementType,
    error::ArrayError,
    schema::DimLength,
    section::Section,
    value::Value,
};

/// A decoded block of fixed-size elements.
///
/// The buffer holds exactly `element size × Π shape` bytes, big-endian and
/// row-major. Signedness is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    element_type: ElementType,
    unsigned: bool,
    shape: Vec<u64>,
    data: Bytes,
}

impl Array {
    /// Wrap `data` without copying it.
    pub fn new(
        element_type: ElementType,
        unsigned: bool,
        shape: Vec<u64>,
        data: Bytes,
    ) -> Result<Self, ArrayError> {
        let expected = expected_len(element_type, unsigned, &shape)?;
        if data.len() as u64 != expected {
            return Err(ArrayError::SizeMismatch {
                element_type,
                shape,
                expected,
                actual: data.len() as u64,
            });
        }
        Ok(Self {
            element_type,
            unsigned,
            shape,
            data,
        })
    }

    /// Encode `values` into a new array. Each value must match the variant
    /// implied by `element_type` and `unsigned`.
    pub fn from_values(
        element_type: ElementType,
        unsigned: bool,
        shape: Vec<u64>,
        values: &[Value],
    ) -> Result<Self, ArrayError> {
        let expected = expected_len(element_type, unsigned, &shape)?;
        let size = element_type.size().unwrap_or(1) as u64;
        let actual = (values.len() as u64).saturating_mul(size);
        if actual != expected {
            return Err(ArrayError::SizeMismatch {
                element_type,
                shape,
                expected,
                actual,
            });
        }
        let mut buf = BytesMut::with_capacity(values.len() * size as usize);
        for value in values {
            match (element_type, unsigned) {
                (ElementType::Byte, false) => buf.put_i8(value.try_i8()?),
                (ElementType::Byte, true) => buf.put_u8(value.try_u8()?),
                (ElementType::Short, false) => buf.put_i16(value.try_i16()?),
                (ElementType::Short, true) => buf.put_u16(value.try_u16()?),
                (ElementType::Int, false) => buf.put_i32(value.try_i32()?),
                (ElementType::Int, true) => buf.put_u32(value.try_u32()?),
                (ElementType::Long, false) => buf.put_i64(value.try_i64()?),
                (ElementType::Long, true) => buf.put_u64(value.try_u64()?),
                (ElementType::Float, _) => buf.put_f32(value.try_f32()?),
                (ElementType::Double, _) => buf.put_f64(value.try_f64()?),
                (ElementType::Char, _) => buf.put_u8(value.try_char()?),
                (ElementType::Opaque, _) => match value {
                    Value::Opaque(b) => buf.put_u8(*b),
                    other => return Err(other.type_mismatch("Opaque").into()),
                },
                (ElementType::Structure | ElementType::Sequence, _) => {
                    unreachable!("rejected by expected_len")
                }
            }
        }
        Self::new(element_type, unsigned, shape, buf.freeze())
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len() / self.element_size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn element_size(&self) -> usize {
        self.element_type.size().unwrap_or(1)
    }

    /// Raw big-endian bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Element at row-major position `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        let size = self.element_size();
        let start = index.checked_mul(size)?;
        let chunk = self.data.get(start..start + size)?;
        Some(decode_element(self.element_type, self.unsigned, chunk))
    }

    /// All elements in row-major order.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.data
            .chunks_exact(self.element_size())
            .map(|chunk| decode_element(self.element_type, self.unsigned, chunk))
    }

    /// Contents of a `char` array up to the first NUL; `None` for other types.
    pub fn to_text(&self) -> Option<String> {
        if self.element_type != ElementType::Char {
            return None;
        }
        let end = self
            .data
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.data.len());
        Some(String::from_utf8_lossy(&self.data[..end]).into_owned())
    }

    /// Copy out the strided sub-array selected by `section`.
    pub fn slice(&self, section: &Section) -> Result<Array, ArrayError> {
        if section.is_whole() {
            return Ok(self.clone());
        }
        let dims: Vec<DimLength> = self.shape.iter().map(|&n| DimLength::Fixed(n)).collect();
        section.check_bounds(&dims)?;

        let out_shape = section.shape();
        let count = section.compute_size() as usize;
        let size = self.element_size();
        let mut out = Vec::with_capacity(count * size);

        if count > 0 {
            let rank = self.shape.len();
            let mut strides = vec![1u64; rank];
            for d in (0..rank.saturating_sub(1)).rev() {
                strides[d] = strides[d + 1] * self.shape[d + 1];
            }

            let mut idx = vec![0u64; rank];
            'elements: loop {
                let linear: u64 = idx
                    .iter()
                    .zip(section.ranges())
                    .zip(&strides)
                    .map(|((&i, range), &stride)| range.index(i) * stride)
                    .sum();
                let offset = linear as usize * size;
                out.extend_from_slice(&self.data[offset..offset + size]);

                let mut d = rank;
                loop {
                    if d == 0 {
                        break 'elements;
                    }
                    d -= 1;
                    idx[d] += 1;
                    if idx[d] < out_shape[d] {
                        break;
                    }
                    idx[d] = 0;
                }
            }
        }

        Array::new(self.element_type, self.unsigned, out_shape, Bytes::from(out))
    }
}

fn expected_len(element_type: ElementType, unsigned: bool, shape: &[u64]) -> Result<u64, ArrayError> {
    let size = element_type
        .size()
        .ok_or(ArrayError::NotFixedSize(element_type))?;
    if unsigned && !element_type.is_integer() {
        return Err(ArrayError::UnsignedNonInteger(element_type));
    }
    shape
        .iter()
        .try_fold(size as u64, |acc, &n| acc.checked_mul(n))
        .ok_or_else(|| ArrayError::ShapeOverflow(shape.to_vec()))
}

fn be<const N: usize>(chunk: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(chunk);
    out
}

fn decode_element(element_type: ElementType, unsigned: bool, chunk: &[u8]) -> Value {
    match (element_type, unsigned) {
        (ElementType::Byte, false) => Value::I8(chunk[0] as i8),
        (ElementType::Byte, true) => Value::U8(chunk[0]),
        (ElementType::Short, false) => Value::I16(i16::from_be_bytes(be(chunk))),
        (ElementType::Short, true) => Value::U16(u16::from_be_bytes(be(chunk))),
        (ElementType::Int, false) => Value::I32(i32::from_be_bytes(be(chunk))),
        (ElementType::Int, true) => Value::U32(u32::from_be_bytes(be(chunk))),
        (ElementType::Long, false) => Value::I64(i64::from_be_bytes(be(chunk))),
        (ElementType::Long, true) => Value::U64(u64::from_be_bytes(be(chunk))),
        (ElementType::Float, _) => Value::F32(f32::from_be_bytes(be(chunk))),
        (ElementType::Double, _) => Value::F64(f64::from_be_bytes(be(chunk))),
        (ElementType::Char, _) => Value::Char(chunk[0]),
        (ElementType::Opaque, _) => Value::Opaque(chunk[0]),
        (ElementType::Structure | ElementType::Sequence, _) => {
            unreachable!("arrays only hold fixed-size element types")
        }
    }
}
