//! Syntax tree produced by the schema parser, before type tags are resolved.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Item {
    Attribute(AttributeAst),
    Variable(VariableAst),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttributeAst {
    pub name: String,
    pub value: AttributeValueAst,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttributeValueAst {
    Text(String),
    /// Comma-separated number tokens, not yet classified as int or float.
    Numbers { tokens: Vec<String>, raw: String },
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VariableAst {
    pub unsigned: bool,
    pub type_tag: String,
    pub name: String,
    pub dims: Vec<DimAst>,
    /// Attributes and members declared inside `{ ... }`.
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DimAst {
    pub name: Option<String>,
    /// `None` for `*`.
    pub length: Option<u64>,
}
