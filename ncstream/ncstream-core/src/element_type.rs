use std::fmt;

/// Element types a variable may declare.
///
/// Integer signedness is not part of the type; it is carried by the
/// `unsigned` flag of [`VariableSchema`](crate::VariableSchema) and
/// [`Array`](crate::Array), fixed when either is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    /// 1-byte integer (`byte`)
    Byte,
    /// 2-byte integer (`short`)
    Short,
    /// 4-byte integer (`int`)
    Int,
    /// 8-byte integer (`long`)
    Long,
    /// 32-bit IEEE float (`float`)
    Float,
    /// 64-bit IEEE float (`double`)
    Double,
    /// Fixed-width 1-byte character (`char`)
    Char,
    /// Uninterpreted byte (`opaque`)
    Opaque,
    /// Nested record with a fixed number of elements (`structure`)
    Structure,
    /// Variable-length stream of records (`sequence`)
    Sequence,
}

impl ElementType {
    /// Size in bytes of one element, or `None` for structure and sequence.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Byte | Self::Char | Self::Opaque => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            Self::Structure | Self::Sequence => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Byte | Self::Short | Self::Int | Self::Long)
    }

    /// Structure and sequence variables are read as record streams.
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Structure | Self::Sequence)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Opaque => "opaque",
            Self::Structure => "structure",
            Self::Sequence => "sequence",
        }
    }

    /// Look up a type by its schema keyword. Returns `None` for unknown tags.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "byte" => Self::Byte,
            "short" => Self::Short,
            "int" => Self::Int,
            "long" => Self::Long,
            "float" => Self::Float,
            "double" => Self::Double,
            "char" => Self::Char,
            "opaque" => Self::Opaque,
            "structure" => Self::Structure,
            "sequence" => Self::Sequence,
            _ => return None,
        })
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
