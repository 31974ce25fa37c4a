//! Maps parsed items onto the core schema model.

use ncstream_core::{
    Attribute, AttributeValue, DatasetSchema, DimLength, Dimension, ElementType, VariableSchema,
};

use super::ast::{AttributeAst, AttributeValueAst, DimAst, Item, VariableAst};
use crate::error::SchemaDecodeError;

/// Resolve type tags and build a validated [`DatasetSchema`].
pub(crate) fn resolve(items: Vec<Item>) -> Result<DatasetSchema, SchemaDecodeError> {
    let (attributes, variables) = resolve_items(items)?;
    Ok(DatasetSchema::new(attributes, variables)?)
}

fn resolve_items(
    items: Vec<Item>,
) -> Result<(Vec<Attribute>, Vec<VariableSchema>), SchemaDecodeError> {
    let mut attributes = Vec::new();
    let mut variables = Vec::new();
    for item in items {
        match item {
            Item::Attribute(ast) => attributes.push(resolve_attribute(ast)),
            Item::Variable(ast) => variables.push(resolve_variable(ast)?),
        }
    }
    Ok((attributes, variables))
}

fn resolve_variable(ast: VariableAst) -> Result<VariableSchema, SchemaDecodeError> {
    let element_type =
        ElementType::from_name(&ast.type_tag).ok_or_else(|| SchemaDecodeError::UnknownType {
            variable: ast.name.clone(),
            tag: ast.type_tag.clone(),
        })?;
    let (attributes, members) = resolve_items(ast.items)?;

    Ok(VariableSchema {
        name: ast.name,
        element_type,
        unsigned: ast.unsigned,
        dimensions: ast.dims.into_iter().map(resolve_dim).collect(),
        attributes,
        members,
    })
}

fn resolve_dim(ast: DimAst) -> Dimension {
    Dimension {
        name: ast.name,
        length: ast.length.map_or(DimLength::Unknown, DimLength::Fixed),
    }
}

fn resolve_attribute(ast: AttributeAst) -> Attribute {
    let value = match ast.value {
        AttributeValueAst::Text(text) => AttributeValue::Text(text),
        AttributeValueAst::Opaque(raw) => AttributeValue::Opaque(raw),
        AttributeValueAst::Numbers { tokens, raw } => classify_numbers(&tokens).unwrap_or_else(|| {
            log::debug!("attribute '{}' kept as opaque: {raw}", ast.name);
            AttributeValue::Opaque(raw)
        }),
    };
    Attribute::new(ast.name, value)
}

/// All-integer lists become `Ints`, otherwise `Floats` when every token
/// parses as a float.
fn classify_numbers(tokens: &[String]) -> Option<AttributeValue> {
    if let Ok(ints) = tokens.iter().map(|t| t.parse::<i64>()).collect::<Result<Vec<_>, _>>() {
        return Some(AttributeValue::Ints(ints));
    }
    tokens
        .iter()
        .map(|t| t.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()
        .map(AttributeValue::Floats)
}
