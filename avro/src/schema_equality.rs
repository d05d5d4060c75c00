// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Pluggable equality of schemata, used by `PartialEq for Schema`.
use crate::{
    Schema,
    schema::{ArraySchema, EnumSchema, FixedSchema, MapSchema, RecordField, RecordSchema, UnionSchema},
};
use log::debug;
use std::{fmt::Debug, sync::OnceLock};

/// A trait that compares two schemata for equality.
/// To register a custom one use [set_schemata_equality_comparator].
pub trait SchemataEq: Debug + Send + Sync {
    /// Compares two schemata for equality.
    fn compare(&self, schema_one: &Schema, schema_two: &Schema) -> bool;
}

/// Compares two schemas by their canonical forms.
/// See <https://avro.apache.org/docs/1.11.1/specification/#parsing-canonical-form-for-schemas>
#[derive(Debug)]
pub struct SpecificationEq;

impl SchemataEq for SpecificationEq {
    fn compare(&self, schema_one: &Schema, schema_two: &Schema) -> bool {
        schema_one.canonical_form() == schema_two.canonical_form()
    }
}

/// Compares two schemas field by field, using only what their canonical forms are built from.
///
/// A [`Schema::Ref`] equals any named schema with the same full name, so a type written out
/// in full and a reference to it compare equal.
#[derive(Debug)]
pub struct StructFieldEq {
    /// Whether to include custom attributes in the comparison.
    /// The custom attributes are not used to construct the canonical form of the schema!
    pub include_attributes: bool,
}

impl SchemataEq for StructFieldEq {
    fn compare(&self, schema_one: &Schema, schema_two: &Schema) -> bool {
        if schema_one.name() != schema_two.name() {
            return false;
        }

        if self.include_attributes
            && schema_one.custom_attributes() != schema_two.custom_attributes()
        {
            return false;
        }

        match (schema_one, schema_two) {
            (Schema::Null, Schema::Null)
            | (Schema::Boolean, Schema::Boolean)
            | (Schema::Int, Schema::Int)
            | (Schema::Long, Schema::Long)
            | (Schema::Float, Schema::Float)
            | (Schema::Double, Schema::Double)
            | (Schema::Bytes, Schema::Bytes)
            | (Schema::String, Schema::String) => true,
            // names are already known to be equal
            (Schema::Ref { .. }, named) | (named, Schema::Ref { .. }) => named.is_named(),
            (
                Schema::Record(RecordSchema { fields: fields_one, .. }),
                Schema::Record(RecordSchema { fields: fields_two, .. }),
            ) => self.compare_fields(fields_one, fields_two),
            (
                Schema::Enum(EnumSchema { symbols: symbols_one, .. }),
                Schema::Enum(EnumSchema { symbols: symbols_two, .. }),
            ) => symbols_one == symbols_two,
            (
                Schema::Fixed(FixedSchema { size: size_one, .. }),
                Schema::Fixed(FixedSchema { size: size_two, .. }),
            ) => size_one == size_two,
            (
                Schema::Union(UnionSchema { schemas: schemas_one, .. }),
                Schema::Union(UnionSchema { schemas: schemas_two, .. }),
            ) => {
                schemas_one.len() == schemas_two.len()
                    && schemas_one
                        .iter()
                        .zip(schemas_two.iter())
                        .all(|(s1, s2)| self.compare(s1, s2))
            }
            (
                Schema::Array(ArraySchema { items: items_one, .. }),
                Schema::Array(ArraySchema { items: items_two, .. }),
            ) => self.compare(items_one, items_two),
            (
                Schema::Map(MapSchema { types: types_one, .. }),
                Schema::Map(MapSchema { types: types_two, .. }),
            ) => self.compare(types_one, types_two),
            _ => false,
        }
    }
}

impl StructFieldEq {
    fn compare_fields(&self, fields_one: &[RecordField], fields_two: &[RecordField]) -> bool {
        fields_one.len() == fields_two.len()
            && fields_one
                .iter()
                .zip(fields_two.iter())
                .all(|(f1, f2)| f1.name == f2.name && self.compare(&f1.schema, &f2.schema))
    }
}

static SCHEMATA_COMPARATOR_ONCE: OnceLock<Box<dyn SchemataEq>> = OnceLock::new();

/// Sets a custom schemata equality comparator.
///
/// Returns a unit if the registration was successful or the already
/// registered comparator if the registration failed.
///
/// **Note**: This function must be called before parsing any schema because this will
/// register the default comparator and the registration is one time only!
pub fn set_schemata_equality_comparator(
    comparator: Box<dyn SchemataEq>,
) -> Result<(), Box<dyn SchemataEq>> {
    debug!("Setting a custom schemata equality comparator: {comparator:?}.");
    SCHEMATA_COMPARATOR_ONCE.set(comparator)
}

pub(crate) fn compare_schemata(schema_one: &Schema, schema_two: &Schema) -> bool {
    SCHEMATA_COMPARATOR_ONCE
        .get_or_init(|| {
            debug!("Going to use the default schemata equality comparator: StructFieldEq.");
            Box::new(StructFieldEq {
                include_attributes: false,
            })
        })
        .compare(schema_one, schema_two)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AvroResult, schema::Name};
    use apache_avro_test_helper::TestResult;
    use rstest::rstest;
    use serde_json::json;
    use std::collections::BTreeMap;

    const SPECIFICATION_EQ: SpecificationEq = SpecificationEq;
    const STRUCT_FIELD_EQ: StructFieldEq = StructFieldEq {
        include_attributes: false,
    };
    const STRUCT_FIELD_EQ_WITH_ATTRS: StructFieldEq = StructFieldEq {
        include_attributes: true,
    };

    #[rstest]
    #[case(Schema::Null)]
    #[case(Schema::Boolean)]
    #[case(Schema::Int)]
    #[case(Schema::Long)]
    #[case(Schema::Float)]
    #[case(Schema::Double)]
    #[case(Schema::Bytes)]
    #[case(Schema::String)]
    fn primitives_agree(#[case] primitive: Schema) {
        assert!(SPECIFICATION_EQ.compare(&primitive, &primitive));
        assert!(STRUCT_FIELD_EQ.compare(&primitive, &primitive));
        assert!(!STRUCT_FIELD_EQ.compare(&primitive, &Schema::array(primitive.clone())));
    }

    #[test]
    fn fixed_with_different_names_or_sizes() -> TestResult {
        let fixed = |name: &str, size: usize| -> AvroResult<Schema> {
            Ok(Schema::Fixed(
                FixedSchema::builder().name(Name::new(name)?).size(size).build(),
            ))
        };
        let md5 = fixed("MD5", 16)?;
        for comparator in [&SPECIFICATION_EQ as &dyn SchemataEq, &STRUCT_FIELD_EQ] {
            assert!(comparator.compare(&md5, &fixed("MD5", 16)?));
            assert!(!comparator.compare(&md5, &fixed("SHA", 16)?));
            assert!(!comparator.compare(&md5, &fixed("MD5", 8)?));
        }
        Ok(())
    }

    #[test]
    fn attributes_only_matter_when_asked() -> TestResult {
        let plain = Schema::Fixed(FixedSchema::builder().name(Name::new("F")?).size(1).build());
        let annotated = Schema::Fixed(
            FixedSchema::builder()
                .name(Name::new("F")?)
                .size(1)
                .attributes(BTreeMap::from([("owner".to_string(), json!("me"))]))
                .build(),
        );
        assert!(SPECIFICATION_EQ.compare(&plain, &annotated));
        assert!(STRUCT_FIELD_EQ.compare(&plain, &annotated));
        assert!(!STRUCT_FIELD_EQ_WITH_ATTRS.compare(&plain, &annotated));
        Ok(())
    }

    #[test]
    fn records_compare_fields_in_order() -> TestResult {
        let one = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"}, {"name": "b", "type": "string", "doc": "ignored"}
            ]}"#,
        )?;
        let two = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"}, {"name": "b", "type": "string"}
            ]}"#,
        )?;
        let swapped = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "b", "type": "string"}, {"name": "a", "type": "int"}
            ]}"#,
        )?;
        assert!(STRUCT_FIELD_EQ.compare(&one, &two));
        assert!(SPECIFICATION_EQ.compare(&one, &two));
        assert!(!STRUCT_FIELD_EQ.compare(&one, &swapped));
        assert!(!SPECIFICATION_EQ.compare(&one, &swapped));
        Ok(())
    }

    #[test]
    fn reference_equals_its_definition() -> TestResult {
        let definition = Schema::parse_str(r#"{"type": "fixed", "name": "a.F", "size": 4}"#)?;
        let reference = Schema::Ref {
            name: Name::new("a.F")?,
        };
        let other = Schema::Ref {
            name: Name::new("b.F")?,
        };
        assert!(STRUCT_FIELD_EQ.compare(&reference, &definition));
        assert!(STRUCT_FIELD_EQ.compare(&definition, &reference));
        assert!(!STRUCT_FIELD_EQ.compare(&other, &definition));
        Ok(())
    }

    #[test]
    fn unions_compare_branch_by_branch() -> TestResult {
        let one = Schema::union(vec![Schema::Null, Schema::Int])?;
        let two = Schema::union(vec![Schema::Null, Schema::Int])?;
        let reordered = Schema::union(vec![Schema::Int, Schema::Null])?;
        assert!(STRUCT_FIELD_EQ.compare(&one, &two));
        assert!(!STRUCT_FIELD_EQ.compare(&one, &reordered));
        assert_eq!(one, two);
        Ok(())
    }
}
