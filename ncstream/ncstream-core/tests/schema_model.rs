use ncstream_core::{
    Attribute, DatasetSchema, DimLength, Dimension, ElementType, Range, SchemaError, Section,
    SectionError, VariableSchema,
};

fn temp() -> VariableSchema {
    VariableSchema::new(
        "temp",
        ElementType::Float,
        vec![Dimension::new("time", 10), Dimension::new("lat", 20)],
    )
}

fn obs() -> VariableSchema {
    VariableSchema::new("obs", ElementType::Sequence, vec![Dimension::unknown()]).with_members(
        vec![
            VariableSchema::new("station", ElementType::Int, vec![]),
            VariableSchema::new("values", ElementType::Double, vec![Dimension::anonymous(3)]),
        ],
    )
}

#[test]
fn element_type_sizes() {
    assert_eq!(ElementType::Byte.size(), Some(1));
    assert_eq!(ElementType::Short.size(), Some(2));
    assert_eq!(ElementType::Int.size(), Some(4));
    assert_eq!(ElementType::Long.size(), Some(8));
    assert_eq!(ElementType::Float.size(), Some(4));
    assert_eq!(ElementType::Double.size(), Some(8));
    assert_eq!(ElementType::Char.size(), Some(1));
    assert_eq!(ElementType::Opaque.size(), Some(1));
    assert_eq!(ElementType::Structure.size(), None);
    assert_eq!(ElementType::Sequence.size(), None);
}

#[test]
fn element_type_names_round_trip() {
    for ty in [
        ElementType::Byte,
        ElementType::Short,
        ElementType::Int,
        ElementType::Long,
        ElementType::Float,
        ElementType::Double,
        ElementType::Char,
        ElementType::Opaque,
        ElementType::Structure,
        ElementType::Sequence,
    ] {
        assert_eq!(ElementType::from_name(ty.as_str()), Some(ty));
    }
    assert_eq!(ElementType::from_name("boolean"), None);
}

#[test]
fn fixed_variable_derived_sizes() {
    let v = temp();
    assert_eq!(v.rank(), 2);
    assert_eq!(v.shape(), Some(vec![10, 20]));
    assert_eq!(v.element_count(), Some(200));
    assert_eq!(v.byte_size(), Some(800));
    assert_eq!(v.record_size(), None);
}

#[test]
fn scalar_variable_has_one_element() {
    let v = VariableSchema::new("count", ElementType::Long, vec![]);
    assert_eq!(v.shape(), Some(vec![]));
    assert_eq!(v.element_count(), Some(1));
    assert_eq!(v.byte_size(), Some(8));
    assert_eq!(v.full_section(), Some(Section::new(vec![])));
}

#[test]
fn sequence_record_size_sums_member_sizes() {
    let v = obs();
    assert_eq!(v.shape(), None);
    assert_eq!(v.dim_lengths(), vec![DimLength::Unknown]);
    assert_eq!(v.record_size(), Some(4 + 24));
    assert_eq!(v.full_section(), None);
    assert_eq!(v.member("values").map(|m| m.element_type), Some(ElementType::Double));
}

#[test]
fn record_size_undefined_with_nested_record_member() {
    let v = VariableSchema::new("outer", ElementType::Structure, vec![]).with_members(vec![obs()]);
    assert_eq!(v.record_size(), None);
}

#[test]
fn section_checks_bounds_against_dimensions() -> Result<(), SectionError> {
    let v = temp();
    let section = v.section(vec![Range::span(2, 4)?, Range::span(0, 20)?])?;
    assert_eq!(section.compute_size(), 40);
    assert!(matches!(
        v.section(vec![Range::span(0, 11)?, Range::span(0, 20)?]),
        Err(SectionError::OutOfBounds { dimension: 0, .. })
    ));
    Ok(())
}

#[test]
fn dataset_schema_preserves_order_and_looks_up_exactly() -> Result<(), SchemaError> {
    let schema = DatasetSchema::new(
        vec![Attribute::text("title", "test data")],
        vec![temp(), obs()],
    )?;
    let names: Vec<_> = schema.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, ["temp", "obs"]);
    assert!(schema.variable("temp").is_some());
    assert!(schema.variable("Temp").is_none());
    assert!(schema.attribute("title").is_some());
    Ok(())
}

#[test]
fn duplicate_variable_names_are_rejected() {
    assert_eq!(
        DatasetSchema::new(vec![], vec![temp(), temp()]),
        Err(SchemaError::DuplicateVariable {
            name: "temp".to_string()
        })
    );
}

#[test]
fn duplicate_member_names_are_rejected() {
    let v = VariableSchema::new("rec", ElementType::Structure, vec![]).with_members(vec![
        VariableSchema::new("a", ElementType::Int, vec![]),
        VariableSchema::new("a", ElementType::Int, vec![]),
    ]);
    assert!(matches!(
        v.validate(),
        Err(SchemaError::DuplicateVariable { .. })
    ));
}

#[test]
fn unknown_dimension_only_allowed_outermost_on_sequences() {
    let fixed = VariableSchema::new("x", ElementType::Int, vec![Dimension::unknown()]);
    assert!(matches!(
        fixed.validate(),
        Err(SchemaError::MisplacedUnknownDimension { .. })
    ));

    let inner = VariableSchema::new(
        "s",
        ElementType::Sequence,
        vec![Dimension::anonymous(2), Dimension::unknown()],
    )
    .with_members(vec![VariableSchema::new("a", ElementType::Int, vec![])]);
    assert!(matches!(
        inner.validate(),
        Err(SchemaError::MisplacedUnknownDimension { .. })
    ));

    assert_eq!(obs().validate(), Ok(()));
}

#[test]
fn unsigned_requires_integer_type() {
    let v = VariableSchema::new("f", ElementType::Float, vec![]).with_unsigned(true);
    assert_eq!(
        v.validate(),
        Err(SchemaError::UnsignedNonInteger {
            variable: "f".to_string(),
            element_type: ElementType::Float
        })
    );
    let ok = VariableSchema::new("u", ElementType::Short, vec![]).with_unsigned(true);
    assert_eq!(ok.validate(), Ok(()));
}

#[test]
fn members_only_on_record_types() {
    let missing = VariableSchema::new("s", ElementType::Structure, vec![]);
    assert!(matches!(
        missing.validate(),
        Err(SchemaError::MissingMembers { .. })
    ));

    let unexpected = VariableSchema::new("i", ElementType::Int, vec![])
        .with_members(vec![VariableSchema::new("a", ElementType::Int, vec![])]);
    assert!(matches!(
        unexpected.validate(),
        Err(SchemaError::UnexpectedMembers { .. })
    ));
}

#[test]
fn overflowing_size_is_rejected() {
    let v = VariableSchema::new(
        "huge",
        ElementType::Double,
        vec![Dimension::anonymous(u64::MAX / 4), Dimension::anonymous(2)],
    );
    assert_eq!(
        v.validate(),
        Err(SchemaError::SizeOverflow {
            variable: "huge".to_string()
        })
    );
}

#[test]
fn records_must_occupy_at_least_one_byte() {
    let empty_float = || VariableSchema::new("x", ElementType::Float, vec![Dimension::anonymous(0)]);

    let structure = VariableSchema::new("s", ElementType::Structure, vec![Dimension::anonymous(3)])
        .with_members(vec![empty_float()]);
    assert_eq!(
        structure.validate(),
        Err(SchemaError::EmptyRecordLayout {
            variable: "s".to_string()
        })
    );

    let nested = VariableSchema::new("outer", ElementType::Sequence, vec![Dimension::unknown()])
        .with_members(vec![
            VariableSchema::new("inner", ElementType::Structure, vec![Dimension::anonymous(0)])
                .with_members(vec![VariableSchema::new("a", ElementType::Int, vec![])]),
            empty_float(),
        ]);
    assert!(matches!(
        nested.validate(),
        Err(SchemaError::EmptyRecordLayout { variable }) if variable == "outer"
    ));

    // A nested sequence always writes its terminator.
    let with_sequence = VariableSchema::new("s", ElementType::Structure, vec![])
        .with_members(vec![empty_float(), obs()]);
    assert_eq!(with_sequence.validate(), Ok(()));
}
