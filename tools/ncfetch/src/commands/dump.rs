use std::{
    fmt::Write as _,
    io::{self, Write},
};

use anyhow::{Context, Result, bail};
use clap::Args;
use ncstream::{
    VariableData,
    core::{Array, ElementType, Section},
    wire::{MemberValue, StructureRecord},
};

use super::open_source;

#[derive(Args)]
pub struct DumpArgs {
    /// Dataset URI or path to a materialized copy
    source: String,

    /// Variable to print
    #[arg(long = "var")]
    variable: String,

    /// Section to read, e.g. `0:2,0:20:5` (whole variable if omitted)
    #[arg(long)]
    section: Option<Section>,

    /// Stop after this many values or records
    #[arg(long)]
    limit: Option<usize>,
}

impl DumpArgs {
    pub fn run(self) -> Result<()> {
        let dataset = open_source(&self.source)?;
        if dataset.schema().variable(&self.variable).is_none() {
            bail!("{} has no variable '{}'", dataset.location(), self.variable);
        }

        let data = dataset
            .read_variable(&self.variable, self.section.as_ref())
            .with_context(|| format!("reading {}", self.variable))?;
        let limit = self.limit.unwrap_or(usize::MAX);
        let mut out = io::stdout().lock();

        match data {
            VariableData::Array(array) => {
                writeln!(out, "{} {:?}", self.variable, array.shape())?;
                writeln!(out, "{}", format_array(&array, limit))?;
            }
            VariableData::Records(records) => {
                for (i, record) in records.take(limit).enumerate() {
                    let record = record.with_context(|| format!("record {i}"))?;
                    writeln!(out, "{i}: {}", format_record(&record))?;
                }
            }
        }
        Ok(())
    }
}

fn format_array(array: &Array, limit: usize) -> String {
    if array.element_type() == ElementType::Char
        && let Some(text) = array.to_text()
    {
        return format!("{text:?}");
    }
    let mut out = String::from("[");
    for (i, value) in array.values().take(limit).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{value}");
    }
    if array.len() > limit {
        out.push_str(", ...");
    }
    out.push(']');
    out
}

fn format_record(record: &StructureRecord) -> String {
    let fields: Vec<String> = record
        .iter()
        .map(|(name, value)| match value {
            MemberValue::Array(array) if array.rank() == 0 => match array.get(0) {
                Some(v) => format!("{name}={v}"),
                None => format!("{name}=[]"),
            },
            MemberValue::Array(array) => format!("{name}={}", format_array(array, usize::MAX)),
            MemberValue::Records(nested) => {
                let inner: Vec<String> = nested.iter().map(format_record).collect();
                format!("{name}=[{}]", inner.join(", "))
            }
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}
