//! Error types for the shape and type model.

use crate::element_type::ElementType;

/// A [`DatasetSchema`](crate::DatasetSchema) or
/// [`VariableSchema`](crate::VariableSchema) violates a structural invariant.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Two variables (or two members of one structure) share a name.
    #[error("duplicate variable name '{name}'")]
    DuplicateVariable { name: String },

    /// An unknown (`*`) dimension outside the outermost position of a sequence.
    #[error("variable '{variable}': unknown length only allowed as the outer dimension of a sequence")]
    MisplacedUnknownDimension { variable: String },

    /// `unsigned` applied to a non-integer element type.
    #[error("variable '{variable}': element type {element_type} cannot be unsigned")]
    UnsignedNonInteger {
        variable: String,
        element_type: ElementType,
    },

    /// A structure or sequence declared without members.
    #[error("variable '{variable}': {element_type} must declare at least one member")]
    MissingMembers {
        variable: String,
        element_type: ElementType,
    },

    /// Members declared on a variable that is not a structure or sequence.
    #[error("variable '{variable}': members are only allowed on structure or sequence variables")]
    UnexpectedMembers { variable: String },

    /// An attribute whose value has no text form: an empty number list or
    /// blank opaque text.
    #[error("attribute '{name}' has an empty value")]
    EmptyAttribute { name: String },

    /// Every member of a structure or sequence has zero size, so its records
    /// would be indistinguishable from the end of a record stream.
    #[error("variable '{variable}': records have no bytes")]
    EmptyRecordLayout { variable: String },

    /// `element size × element count` does not fit in a `u64`.
    #[error("variable '{variable}': total size overflows")]
    SizeOverflow { variable: String },
}

/// A [`Section`](crate::Section) or [`Range`](crate::Range) could not be built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    /// `start > stop` or `stride == 0`.
    #[error("invalid range {start}:{stop}:{stride}")]
    InvalidRange { start: u64, stop: u64, stride: u64 },

    /// Section rank does not match the variable rank.
    #[error("section has rank {got}, expected {expected}")]
    RankMismatch { got: usize, expected: usize },

    /// A range reaches past a known dimension length.
    #[error("range {start}:{stop} out of bounds for dimension {dimension} of length {length}")]
    OutOfBounds {
        dimension: usize,
        start: u64,
        stop: u64,
        length: u64,
    },

    /// Text form of a section could not be parsed.
    #[error("cannot parse section '{text}': {detail}")]
    Parse { text: String, detail: String },
}

/// An [`Array`](crate::Array) could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// Buffer length differs from `element size × element count`.
    #[error("array of {element_type} with shape {shape:?} needs {expected} bytes, got {actual}")]
    SizeMismatch {
        element_type: ElementType,
        shape: Vec<u64>,
        expected: u64,
        actual: u64,
    },

    /// Arrays hold fixed-size element types only.
    #[error("element type {0} has no fixed size")]
    NotFixedSize(ElementType),

    /// The element type cannot be unsigned.
    #[error("element type {0} cannot be unsigned")]
    UnsignedNonInteger(ElementType),

    /// Shape product overflows.
    #[error("shape {0:?} overflows")]
    ShapeOverflow(Vec<u64>),

    /// The section passed to [`Array::slice`](crate::Array::slice) does not fit.
    #[error(transparent)]
    Section(#[from] SectionError),

    /// A value passed to [`Array::from_values`](crate::Array::from_values)
    /// does not match the element type.
    #[error(transparent)]
    ValueType(#[from] ValueTypeError),
}

/// Error returned when a [`Value`](crate::Value) accessor is used on a value of
/// a different variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value type mismatch: expected {expected}, got {actual}")]
pub struct ValueTypeError {
    pub expected: String,
    pub actual: &'static str,
}

impl ValueTypeError {
    pub fn new(expected: impl Into<String>, actual: &'static str) -> Self {
        Self {
            expected: expected.into(),
            actual,
        }
    }
}
