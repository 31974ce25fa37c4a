//! Dataset and variable schema model.

mod format;
mod types;

pub use format::format_schema;
pub use types::{
    Attribute, AttributeValue, DatasetSchema, DimLength, Dimension, VariableSchema,
};
