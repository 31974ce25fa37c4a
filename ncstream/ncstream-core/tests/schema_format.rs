use ncstream_core::{
    Attribute, AttributeValue, DatasetSchema, Dimension, ElementType, SchemaError, VariableSchema,
    format_schema,
};

#[test]
fn nested_records_are_indented_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let schema = DatasetSchema::new(
        vec![
            Attribute::text("title", "surface obs"),
            Attribute::new("version", AttributeValue::Ints(vec![1, 2])),
        ],
        vec![
            VariableSchema::new(
                "temp",
                ElementType::Float,
                vec![Dimension::new("time", 10), Dimension::new("lat", 20)],
            )
            .with_attributes(vec![
                Attribute::text("units", "K"),
                Attribute::new("scale", AttributeValue::Floats(vec![1.0, 0.5])),
            ]),
            VariableSchema::new("obs", ElementType::Sequence, vec![Dimension::unknown()])
                .with_members(vec![
                    VariableSchema::new("flag", ElementType::Byte, vec![]).with_unsigned(true),
                    VariableSchema::new("pos", ElementType::Structure, vec![]).with_members(
                        vec![VariableSchema::new(
                            "xy",
                            ElementType::Double,
                            vec![Dimension::anonymous(2)],
                        )],
                    ),
                ]),
        ],
    )?;

    let text = format_schema(&schema)?;
    let expected = "\
:title = \"surface obs\";
:version = 1, 2;
float temp(time=10, lat=20) {
    :units = \"K\";
    :scale = 1.0, 0.5;
};
sequence obs(*) {
    unsigned byte flag;
    structure pos {
        double xy(2);
    };
};
";
    assert_eq!(text, expected);
    assert_eq!(schema.to_string(), expected);
    Ok(())
}

#[test]
fn non_identifier_names_and_text_are_quoted() -> Result<(), Box<dyn std::error::Error>> {
    let schema = DatasetSchema::new(
        vec![Attribute::text("history", "line one\n\"quoted\"")],
        vec![VariableSchema::new("air temp", ElementType::Int, vec![])],
    )?;
    let text = format_schema(&schema)?;
    assert_eq!(
        text,
        ":history = \"line one\\n\\\"quoted\\\"\";\nint \"air temp\";\n"
    );
    Ok(())
}

#[test]
fn opaque_attribute_values_are_written_verbatim() -> Result<(), SchemaError> {
    let schema = DatasetSchema::new(
        vec![Attribute::new(
            "raw",
            AttributeValue::Opaque("<0x01 0x02>".to_string()),
        )],
        vec![],
    )?;
    assert_eq!(schema.to_string(), ":raw = <0x01 0x02>;\n");
    Ok(())
}
