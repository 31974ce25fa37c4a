//! Transport-agnostic shape and type model for `ncstream`.
//!
//! This crate provides the schema model ([`DatasetSchema`] /
//! [`VariableSchema`]), index-space selections ([`Section`] / [`Range`]) and
//! the decoded [`Array`] value type. It performs no I/O.

mod array;
mod element_type;
mod error;
mod schema;
mod section;
mod value;

pub use array::Array;
pub use element_type::ElementType;
pub use error::{ArrayError, SchemaError, SectionError, ValueTypeError};
pub use schema::{
    Attribute, AttributeValue, DatasetSchema, DimLength, Dimension, VariableSchema, format_schema,
};
pub use section::{Range, Section};
pub use value::Value;
