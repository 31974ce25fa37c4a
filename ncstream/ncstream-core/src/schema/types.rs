use std::{
    collections::HashSet,
    fmt::{Display, Formatter, Result as FmtResult},
};

use crate::{
    element_type::ElementType,
    error::{SchemaError, SectionError},
    section::{Range, Section},
};

/// Value of a dataset or variable attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    /// Value syntax the decoder does not understand, kept verbatim.
    Opaque(String),
}

/// Name/value pair attached to a dataset or a variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeValue::Text(value.into()))
    }

    /// Number lists need at least one value and opaque text must not be
    /// blank; neither would read back from schema text.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let empty = match &self.value {
            AttributeValue::Text(_) => false,
            AttributeValue::Ints(values) => values.is_empty(),
            AttributeValue::Floats(values) => values.is_empty(),
            AttributeValue::Opaque(raw) => raw.trim().is_empty(),
        };
        if empty {
            return Err(SchemaError::EmptyAttribute {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

/// Declared length of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimLength {
    Fixed(u64),
    /// Outer extent of a sequence, only known once decoded.
    Unknown,
}

impl DimLength {
    pub fn fixed(&self) -> Option<u64> {
        match self {
            Self::Fixed(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dimension {
    pub name: Option<String>,
    pub length: DimLength,
}

impl Dimension {
    pub fn new(name: impl Into<String>, length: u64) -> Self {
        Self {
            name: Some(name.into()),
            length: DimLength::Fixed(length),
        }
    }

    pub fn anonymous(length: u64) -> Self {
        Self {
            name: None,
            length: DimLength::Fixed(length),
        }
    }

    pub fn unknown() -> Self {
        Self {
            name: None,
            length: DimLength::Unknown,
        }
    }
}

/// Schema of one variable.
///
/// Invariants are checked by [`VariableSchema::validate`], which
/// [`DatasetSchema::new`] runs for every variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSchema {
    pub name: String,
    pub element_type: ElementType,
    pub unsigned: bool,
    pub dimensions: Vec<Dimension>,
    pub attributes: Vec<Attribute>,
    /// Member variables; non-empty exactly for structure and sequence types.
    pub members: Vec<VariableSchema>,
}

impl VariableSchema {
    pub fn new(
        name: impl Into<String>,
        element_type: ElementType,
        dimensions: Vec<Dimension>,
    ) -> Self {
        Self {
            name: name.into(),
            element_type,
            unsigned: false,
            dimensions,
            attributes: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    pub fn with_members(mut self, members: Vec<VariableSchema>) -> Self {
        self.members = members;
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }

    pub fn dim_lengths(&self) -> Vec<DimLength> {
        self.dimensions.iter().map(|d| d.length).collect()
    }

    /// Dimension lengths, or `None` when any of them is unknown.
    pub fn shape(&self) -> Option<Vec<u64>> {
        self.dimensions.iter().map(|d| d.length.fixed()).collect()
    }

    /// Number of elements, or `None` for unknown or overflowing shapes.
    pub fn element_count(&self) -> Option<u64> {
        self.shape()?
            .iter()
            .try_fold(1u64, |acc, &n| acc.checked_mul(n))
    }

    /// Total payload size of a fixed-type variable.
    pub fn byte_size(&self) -> Option<u64> {
        let size = self.element_type.size()? as u64;
        self.element_count()?.checked_mul(size)
    }

    /// Size in bytes of one record when every member is a fixed primitive
    /// with a known shape; `None` otherwise.
    pub fn record_size(&self) -> Option<u64> {
        if !self.element_type.is_record() {
            return None;
        }
        self.members
            .iter()
            .try_fold(0u64, |acc, m| acc.checked_add(m.byte_size()?))
    }

    pub fn member(&self, name: &str) -> Option<&VariableSchema> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Section covering every element, or `None` when a dimension is unknown.
    pub fn full_section(&self) -> Option<Section> {
        let shape = self.shape()?;
        Some(Section::from_shape(&shape))
    }

    /// Build a section over this variable, checking rank and bounds.
    pub fn section(&self, ranges: Vec<Range>) -> Result<Section, SectionError> {
        let section = Section::new(ranges);
        section.check_bounds(&self.dim_lengths())?;
        Ok(section)
    }

    /// Recursively check the variable invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for attribute in &self.attributes {
            attribute.validate()?;
        }
        if self.unsigned && !self.element_type.is_integer() {
            return Err(SchemaError::UnsignedNonInteger {
                variable: self.name.clone(),
                element_type: self.element_type,
            });
        }

        for (i, dim) in self.dimensions.iter().enumerate() {
            if dim.length == DimLength::Unknown
                && (i != 0 || self.element_type != ElementType::Sequence)
            {
                return Err(SchemaError::MisplacedUnknownDimension {
                    variable: self.name.clone(),
                });
            }
        }

        let fixed_count = self
            .dimensions
            .iter()
            .filter_map(|d| d.length.fixed())
            .try_fold(1u64, |acc, n| acc.checked_mul(n));
        let overflow = match (fixed_count, self.element_type.size()) {
            (None, _) => true,
            (Some(count), Some(size)) => count.checked_mul(size as u64).is_none(),
            (Some(_), None) => false,
        };
        if overflow {
            return Err(SchemaError::SizeOverflow {
                variable: self.name.clone(),
            });
        }

        if self.element_type.is_record() {
            if self.members.is_empty() {
                return Err(SchemaError::MissingMembers {
                    variable: self.name.clone(),
                    element_type: self.element_type,
                });
            }
            check_unique(&self.members)?;
            for member in &self.members {
                member.validate()?;
            }
            // An empty record frame is the stream terminator.
            if self.members.iter().all(encodes_empty) {
                return Err(SchemaError::EmptyRecordLayout {
                    variable: self.name.clone(),
                });
            }
        } else if !self.members.is_empty() {
            return Err(SchemaError::UnexpectedMembers {
                variable: self.name.clone(),
            });
        }

        Ok(())
    }
}

/// `true` when every value of `member` encodes to zero bytes inside a record.
fn encodes_empty(member: &VariableSchema) -> bool {
    match member.element_type {
        ElementType::Sequence => false,
        ElementType::Structure => member.element_count() == Some(0),
        _ => member.byte_size() == Some(0),
    }
}

/// Schema of a whole dataset: attributes and an ordered, name-unique
/// variable list. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatasetSchema {
    attributes: Vec<Attribute>,
    variables: Vec<VariableSchema>,
}

impl DatasetSchema {
    /// Build a schema, validating every variable.
    pub fn new(
        attributes: Vec<Attribute>,
        variables: Vec<VariableSchema>,
    ) -> Result<Self, SchemaError> {
        for attribute in &attributes {
            attribute.validate()?;
        }
        check_unique(&variables)?;
        for variable in &variables {
            variable.validate()?;
        }
        Ok(Self {
            attributes,
            variables,
        })
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> &[VariableSchema] {
        &self.variables
    }

    /// Exact, case-sensitive lookup.
    pub fn variable(&self, name: &str) -> Option<&VariableSchema> {
        self.variables.iter().find(|v| v.name == name)
    }
}

impl Display for DatasetSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = super::format_schema(self)?;
        f.write_str(&text)
    }
}

fn check_unique(variables: &[VariableSchema]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(variables.len());
    for v in variables {
        if !seen.insert(v.name.as_str()) {
            return Err(SchemaError::DuplicateVariable {
                name: v.name.clone(),
            });
        }
    }
    Ok(())
}
