use std::fmt::{Error, Result, Write as _};

use super::{Attribute, AttributeValue, DatasetSchema, DimLength, VariableSchema};

/// Render a schema in the metadata text form understood by the schema decoder.
///
/// Attributes come first, then variables in declaration order. Variables with
/// attributes or members open a `{ ... }` block indented by four spaces.
pub fn format_schema(schema: &DatasetSchema) -> std::result::Result<String, Error> {
    let mut out = String::new();

    for attribute in schema.attributes() {
        format_attribute(attribute, 0, &mut out)?;
    }
    for variable in schema.variables() {
        format_variable(variable, 0, &mut out)?;
    }

    Ok(out)
}

fn format_variable(variable: &VariableSchema, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    write!(out, "{pad}")?;
    if variable.unsigned {
        out.push_str("unsigned ");
    }
    write!(
        out,
        "{} {}",
        variable.element_type,
        format_name(&variable.name)
    )?;

    if !variable.dimensions.is_empty() {
        out.push('(');
        for (i, dim) in variable.dimensions.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if let Some(name) = &dim.name {
                write!(out, "{}=", format_name(name))?;
            }
            match dim.length {
                DimLength::Fixed(n) => write!(out, "{n}")?,
                DimLength::Unknown => out.push('*'),
            }
        }
        out.push(')');
    }

    if variable.attributes.is_empty() && variable.members.is_empty() {
        writeln!(out, ";")?;
        return Ok(());
    }

    writeln!(out, " {{")?;
    for attribute in &variable.attributes {
        format_attribute(attribute, indent + 4, out)?;
    }
    for member in &variable.members {
        format_variable(member, indent + 4, out)?;
    }
    writeln!(out, "{pad}}};")
}

fn format_attribute(attribute: &Attribute, indent: usize, out: &mut String) -> Result {
    let pad = " ".repeat(indent);
    write!(out, "{pad}:{} = ", format_name(&attribute.name))?;
    match &attribute.value {
        AttributeValue::Text(text) => out.push_str(&quote(text)),
        AttributeValue::Ints(values) => {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write!(out, "{v}")?;
            }
        }
        AttributeValue::Floats(values) => {
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                // Debug keeps the decimal point so the value reads back as a float.
                write!(out, "{v:?}")?;
            }
        }
        AttributeValue::Opaque(raw) => out.push_str(raw),
    }
    writeln!(out, ";")
}

fn format_name(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
