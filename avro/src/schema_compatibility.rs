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

//! Check if the reader's schema is compatible with the writer's schema.
//!
//! Data written with one schema can be read with another as long as the two can be resolved, see
//! [`decode_with_resolution`](crate::decode_with_resolution). [`SchemaCompatibility`] answers
//! ahead of time whether that can work.
//!
//! There are three levels of compatibility.
//!
//! 1. Fully compatible schemas (`Ok(Compatibility::Full)`)
//!
//! For example, an integer can always be resolved to a long:
//!
//! ```
//! # use avro_codec::{Schema, schema_compatibility::{Compatibility, SchemaCompatibility}};
//! let writers_schema = Schema::array(Schema::Int);
//! let readers_schema = Schema::array(Schema::Long);
//! assert_eq!(SchemaCompatibility::can_read(&writers_schema, &readers_schema), Ok(Compatibility::Full));
//! ```
//!
//! 2. Incompatible schemas (`Err`)
//!
//! For example, a long can never be resolved to an int:
//!
//! ```
//! # use avro_codec::{Schema, schema_compatibility::SchemaCompatibility};
//! let writers_schema = Schema::array(Schema::Long);
//! let readers_schema = Schema::array(Schema::Int);
//! assert!(SchemaCompatibility::can_read(&writers_schema, &readers_schema).is_err());
//! ```
//!
//! 3. Partially compatible schemas (`Ok(Compatibility::Partial)`)
//!
//! For example, a union of a string and integer is only compatible with an integer if an integer was written:
//!
//! ```
//! # use avro_codec::{Error, Schema, schema_compatibility::{Compatibility, SchemaCompatibility}};
//! let writers_schema = Schema::union(vec![Schema::Int, Schema::String])?;
//! let readers_schema = Schema::Int;
//! assert_eq!(SchemaCompatibility::can_read(&writers_schema, &readers_schema), Ok(Compatibility::Partial));
//! # Ok::<(), Error>(())
//! ```
//!
use crate::{
    Error,
    error::{CompatibilityError, Details},
    resolution::{find_writer_field, names_agree},
    schema::{
        ArraySchema, EnumSchema, MapSchema, NamesRef, NamespaceRef, RecordSchema, ResolvedSchema,
        Schema, SchemaKind, lookup_ref,
    },
};
use std::{
    collections::{HashMap, HashSet, hash_map::DefaultHasher},
    hash::Hasher,
    ops::BitAndAssign,
    ptr,
};

/// Check if two schemas can be resolved.
///
/// See [the module documentation] for more details.
///
/// [the module documentation]: crate::schema_compatibility
pub struct SchemaCompatibility;

impl SchemaCompatibility {
    /// Recursively check if the reader's schema can be resolved to the writer's schema
    pub fn can_read(
        writers_schema: &Schema,
        readers_schema: &Schema,
    ) -> Result<Compatibility, CompatibilityError> {
        let writer_rs = ResolvedSchema::try_from(writers_schema).map_err(unresolved)?;
        let reader_rs = ResolvedSchema::try_from(readers_schema).map_err(unresolved)?;
        let mut c = Checker::new(writer_rs.get_names(), reader_rs.get_names());
        c.full_match_schemas(writers_schema, None, readers_schema, None)
    }

    /// Recursively check if both schemas can be resolved to each other
    pub fn mutual_read(
        schema_a: &Schema,
        schema_b: &Schema,
    ) -> Result<Compatibility, CompatibilityError> {
        let mut c = SchemaCompatibility::can_read(schema_a, schema_b)?;
        c &= SchemaCompatibility::can_read(schema_b, schema_a)?;
        Ok(c)
    }
}

/// How compatible two schemas are.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Compatibility {
    /// Full compatibility, resolving will always work.
    Full,
    /// Partial compatibility, resolving may error.
    ///
    /// This can happen if an enum doesn't have all fields, or unions don't entirely overlap.
    Partial,
}

impl BitAndAssign for Compatibility {
    /// Combine two compatibilities.
    ///
    /// # Truth table
    /// |         | Full    | Partial |
    /// | ------- | ------- | ------- |
    /// | Full    | Full    | Partial |
    /// | Partial | Partial | Partial |
    fn bitand_assign(&mut self, rhs: Self) {
        match (*self, rhs) {
            (Self::Full, Self::Full) => *self = Self::Full,
            _ => *self = Self::Partial,
        }
    }
}

fn unresolved(err: Error) -> CompatibilityError {
    match err.details() {
        Details::SchemaResolutionError(name) => CompatibilityError::UnresolvedReference(name.fullname()),
        _ => CompatibilityError::UnresolvedReference(err.to_string()),
    }
}

struct Checker<'a> {
    writer_names: &'a NamesRef<'a>,
    reader_names: &'a NamesRef<'a>,
    recursion: HashMap<(u64, u64), Compatibility>,
}

impl<'a> Checker<'a> {
    fn new(writer_names: &'a NamesRef<'a>, reader_names: &'a NamesRef<'a>) -> Self {
        Self {
            writer_names,
            reader_names,
            recursion: HashMap::new(),
        }
    }

    /// Check if the reader schema can be resolved from the writer schema.
    fn full_match_schemas(
        &mut self,
        writers_schema: &Schema,
        writer_namespace: NamespaceRef,
        readers_schema: &Schema,
        reader_namespace: NamespaceRef,
    ) -> Result<Compatibility, CompatibilityError> {
        let writers_schema = match writers_schema {
            Schema::Ref { name } => lookup_ref(self.writer_names, name, writer_namespace)
                .map_err(|_| CompatibilityError::UnresolvedReference(name.fullname()))?,
            _ => writers_schema,
        };
        let readers_schema = match readers_schema {
            Schema::Ref { name } => lookup_ref(self.reader_names, name, reader_namespace)
                .map_err(|_| CompatibilityError::UnresolvedReference(name.fullname()))?,
            _ => readers_schema,
        };

        // Named definitions live in the names tables, so a recursive type always comes back to
        // the same pair of pointers.
        let key = (
            Self::pointer_hash(writers_schema),
            Self::pointer_hash(readers_schema),
        );

        if let Some(c) = self.recursion.get(&key).copied() {
            return Ok(c);
        }
        // Assume the pair matches while it is being checked; a mismatch deeper down
        // surfaces at the field that caused it.
        self.recursion.insert(key, Compatibility::Full);
        match self.inner_full_match_schemas(
            writers_schema,
            writer_namespace,
            readers_schema,
            reader_namespace,
        ) {
            Ok(c) => {
                self.recursion.insert(key, c);
                Ok(c)
            }
            Err(err) => {
                self.recursion.remove(&key);
                Err(err)
            }
        }
    }

    /// Hash a schema based only on its pointer value.
    fn pointer_hash(schema: &Schema) -> u64 {
        let mut hasher = DefaultHasher::new();
        ptr::hash(schema, &mut hasher);
        hasher.finish()
    }

    /// The actual implementation of [`Self::full_match_schemas`] but without the recursion
    /// protection. Both schemas are already dereferenced.
    fn inner_full_match_schemas(
        &mut self,
        writers_schema: &Schema,
        writer_namespace: NamespaceRef,
        readers_schema: &Schema,
        reader_namespace: NamespaceRef,
    ) -> Result<Compatibility, CompatibilityError> {
        // Compare unqualified names if the schemas have them
        if let Some(w_name) = writers_schema.name()
            && readers_schema.is_named()
            && !names_agree(w_name, readers_schema)
        {
            return Err(CompatibilityError::NameMismatch {
                writer_name: w_name.name().to_string(),
                reader_name: readers_schema
                    .name()
                    .map(|name| name.name().to_string())
                    .unwrap_or_default(),
            });
        }

        match (writers_schema, readers_schema) {
            (Schema::Union(writer), Schema::Union(reader)) => {
                let mut any = false;
                let mut all = true;
                for writer in writer.variants() {
                    // Try to find a reader variant that is fully compatible with this writer variant.
                    // In case that does not exist, we keep track of any partial compatibility we find.
                    let mut local_any = false;
                    all &= reader.variants().iter().any(|reader| {
                        match self.full_match_schemas(
                            writer,
                            writer_namespace,
                            reader,
                            reader_namespace,
                        ) {
                            Ok(Compatibility::Full) => {
                                local_any = true;
                                true
                            }
                            Ok(Compatibility::Partial) => {
                                local_any = true;
                                false
                            }
                            Err(_) => false,
                        }
                    });
                    any |= local_any;
                }
                if all {
                    Ok(Compatibility::Full)
                } else if any {
                    Ok(Compatibility::Partial)
                } else {
                    Err(CompatibilityError::MissingUnionElements)
                }
            }
            (Schema::Union(writer), _) => {
                // Every written branch is resolved against the reader schema on its own.
                let mut any = false;
                let mut all = true;
                for writer in writer.variants() {
                    match self.full_match_schemas(
                        writer,
                        writer_namespace,
                        readers_schema,
                        reader_namespace,
                    ) {
                        Ok(Compatibility::Full) => any = true,
                        Ok(Compatibility::Partial) => {
                            any = true;
                            all = false;
                        }
                        Err(_) => {
                            all = false;
                        }
                    }
                }
                if all {
                    Ok(Compatibility::Full)
                } else if any {
                    Ok(Compatibility::Partial)
                } else {
                    Err(CompatibilityError::SchemaMismatchAllUnionElements)
                }
            }
            (_, Schema::Union(reader)) => {
                let mut partial = false;
                if reader.variants().iter().any(|reader| {
                    match self.full_match_schemas(
                        writers_schema,
                        writer_namespace,
                        reader,
                        reader_namespace,
                    ) {
                        Ok(Compatibility::Full) => true,
                        Ok(Compatibility::Partial) => {
                            partial = true;
                            false
                        }
                        Err(_) => false,
                    }
                }) {
                    Ok(Compatibility::Full)
                } else if partial {
                    Ok(Compatibility::Partial)
                } else {
                    Err(CompatibilityError::SchemaMismatchAllUnionElements)
                }
            }
            (Schema::Null, Schema::Null)
            | (Schema::Boolean, Schema::Boolean)
            // int promotes to long, float and double
            | (Schema::Int, Schema::Int | Schema::Long | Schema::Float | Schema::Double)
            // long promotes to float and double
            | (Schema::Long, Schema::Long | Schema::Float | Schema::Double)
            // float promotes to double
            | (Schema::Float, Schema::Float | Schema::Double)
            | (Schema::Double, Schema::Double)
            // bytes and strings are interchangeable
            | (Schema::Bytes | Schema::String, Schema::Bytes | Schema::String) => {
                Ok(Compatibility::Full)
            }
            (Schema::Fixed(w_fixed), Schema::Fixed(r_fixed)) => {
                if r_fixed.size == w_fixed.size {
                    Ok(Compatibility::Full)
                } else {
                    Err(CompatibilityError::FixedMismatch)
                }
            }
            (
                Schema::Array(ArraySchema { items: w_items, .. }),
                Schema::Array(ArraySchema { items: r_items, .. }),
            ) => self.full_match_schemas(w_items, writer_namespace, r_items, reader_namespace),
            (
                Schema::Map(MapSchema { types: w_types, .. }),
                Schema::Map(MapSchema { types: r_types, .. }),
            ) => self.full_match_schemas(w_types, writer_namespace, r_types, reader_namespace),
            (
                Schema::Enum(EnumSchema { symbols: w_symbols, .. }),
                Schema::Enum(EnumSchema {
                    symbols: r_symbols,
                    default: r_default,
                    ..
                }),
            ) => {
                // Reader must have a default or all symbols in the writer must also be in the reader
                if r_default.is_some() {
                    return Ok(Compatibility::Full);
                }
                let mut any = false;
                let mut all = true;
                for symbol in w_symbols {
                    let found = r_symbols.contains(symbol);
                    any |= found;
                    all &= found;
                }
                if all {
                    Ok(Compatibility::Full)
                } else if any {
                    Ok(Compatibility::Partial)
                } else {
                    Err(CompatibilityError::MissingSymbols)
                }
            }
            (Schema::Record(w_record), Schema::Record(r_record)) => self.match_records(
                w_record,
                writer_namespace,
                r_record,
                reader_namespace,
            ),
            (_, _) => Err(CompatibilityError::WrongType {
                writer_schema_type: format!("{:?}", SchemaKind::from(writers_schema)),
                reader_schema_type: format!("{:?}", SchemaKind::from(readers_schema)),
            }),
        }
    }

    fn match_records(
        &mut self,
        w_record: &RecordSchema,
        writer_namespace: NamespaceRef,
        r_record: &RecordSchema,
        reader_namespace: NamespaceRef,
    ) -> Result<Compatibility, CompatibilityError> {
        let writer_namespace = w_record.name.namespace().or(writer_namespace);
        let reader_namespace = r_record.name.namespace().or(reader_namespace);

        let mut compatibility = Compatibility::Full;
        // writer fields already read into an earlier reader field
        let mut claimed = HashSet::new();
        for r_field in &r_record.fields {
            // Search using field name and *after* that the reader's aliases. Writer aliases do
            // not take part.
            if let Some(w_field) = find_writer_field(r_field, &w_record.fields)
                .filter(|&position| claimed.insert(position))
                .map(|position| &w_record.fields[position])
            {
                match self.full_match_schemas(
                    &w_field.schema,
                    writer_namespace,
                    &r_field.schema,
                    reader_namespace,
                ) {
                    Ok(c) => compatibility &= c,
                    Err(err) => {
                        return Err(CompatibilityError::FieldTypeMismatch(
                            r_field.name.clone(),
                            Box::new(err),
                        ));
                    }
                }
            } else if r_field.default.is_none() {
                return Err(CompatibilityError::MissingDefaultValue(
                    r_field.name.clone(),
                ));
            }
        }
        Ok(compatibility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn int_array_schema() -> Schema {
        Schema::parse_str(r#"{"type":"array", "items":"int"}"#).unwrap()
    }

    fn long_array_schema() -> Schema {
        Schema::parse_str(r#"{"type":"array", "items":"long"}"#).unwrap()
    }

    fn string_array_schema() -> Schema {
        Schema::parse_str(r#"{"type":"array", "items":"string"}"#).unwrap()
    }

    fn int_map_schema() -> Schema {
        Schema::parse_str(r#"{"type":"map", "values":"int"}"#).unwrap()
    }

    fn long_map_schema() -> Schema {
        Schema::parse_str(r#"{"type":"map", "values":"long"}"#).unwrap()
    }

    fn string_map_schema() -> Schema {
        Schema::parse_str(r#"{"type":"map", "values":"string"}"#).unwrap()
    }

    fn enum1_ab_schema() -> Schema {
        Schema::parse_str(r#"{"type":"enum", "name":"Enum1", "symbols":["A","B"]}"#).unwrap()
    }

    fn enum1_abc_schema() -> Schema {
        Schema::parse_str(r#"{"type":"enum", "name":"Enum1", "symbols":["A","B","C"]}"#).unwrap()
    }

    fn enum1_bc_schema() -> Schema {
        Schema::parse_str(r#"{"type":"enum", "name":"Enum1", "symbols":["B","C"]}"#).unwrap()
    }

    fn enum2_ab_schema() -> Schema {
        Schema::parse_str(r#"{"type":"enum", "name":"Enum2", "symbols":["A","B"]}"#).unwrap()
    }

    fn empty_record1_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record1", "fields":[]}"#).unwrap()
    }

    fn empty_record2_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record2", "fields": []}"#).unwrap()
    }

    fn a_int_record1_schema() -> Schema {
        Schema::parse_str(
            r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"int"}]}"#,
        )
        .unwrap()
    }

    fn a_long_record1_schema() -> Schema {
        Schema::parse_str(
            r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"long"}]}"#,
        )
        .unwrap()
    }

    fn a_int_b_int_record1_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"int"}, {"name":"b", "type":"int"}]}"#).unwrap()
    }

    fn a_dint_record1_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"int", "default":0}]}"#).unwrap()
    }

    fn a_int_b_dint_record1_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"int"}, {"name":"b", "type":"int", "default":0}]}"#).unwrap()
    }

    fn a_dint_b_dint_record1_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"Record1", "fields":[{"name":"a", "type":"int", "default":0}, {"name":"b", "type":"int", "default":0}]}"#).unwrap()
    }

    fn nested_record() -> Schema {
        Schema::parse_str(r#"{"type":"record","name":"parent","fields":[{"name":"attribute","type":{"type":"record","name":"child","fields":[{"name":"id","type":"string"}]}}]}"#).unwrap()
    }

    fn nested_optional_record() -> Schema {
        Schema::parse_str(r#"{"type":"record","name":"parent","fields":[{"name":"attribute","type":["null",{"type":"record","name":"child","fields":[{"name":"id","type":"string"}]}],"default":null}]}"#).unwrap()
    }

    fn int_list_record_schema() -> Schema {
        Schema::parse_str(r#"{"type":"record", "name":"List", "fields": [{"name": "head", "type": "int"},{"name": "tail", "type": {"type": "array", "items": "int"}}]}"#).unwrap()
    }

    fn long_list_record_schema() -> Schema {
        Schema::parse_str(
            r#"
      {
        "type":"record", "name":"List", "fields": [
          {"name": "head", "type": "long"},
          {"name": "tail", "type": {"type": "array", "items": "long"}}
      ]}
"#,
        )
        .unwrap()
    }

    fn union_schema(schemas: Vec<Schema>) -> Schema {
        Schema::union(schemas).unwrap()
    }

    fn int_union_schema() -> Schema {
        union_schema(vec![Schema::Int])
    }

    fn long_union_schema() -> Schema {
        union_schema(vec![Schema::Long])
    }

    fn string_union_schema() -> Schema {
        union_schema(vec![Schema::String])
    }

    fn int_string_union_schema() -> Schema {
        union_schema(vec![Schema::Int, Schema::String])
    }

    fn string_int_union_schema() -> Schema {
        union_schema(vec![Schema::String, Schema::Int])
    }

    #[test]
    fn union_writer_is_partially_readable() {
        assert_eq!(
            Compatibility::Partial,
            SchemaCompatibility::can_read(&int_string_union_schema(), &int_union_schema()).unwrap(),
            "Only compatible if writer writes an int"
        )
    }

    #[rstest]
    // null
    #[case(Schema::Null, Schema::Int)]
    #[case(Schema::Null, Schema::Long)]
    // boolean
    #[case(Schema::Boolean, Schema::Int)]
    // int
    #[case(Schema::Int, Schema::Null)]
    #[case(Schema::Int, Schema::Boolean)]
    #[case(Schema::Int, Schema::Long)]
    #[case(Schema::Int, Schema::Float)]
    #[case(Schema::Int, Schema::Double)]
    // long
    #[case(Schema::Long, Schema::Float)]
    #[case(Schema::Long, Schema::Double)]
    // float
    #[case(Schema::Float, Schema::Double)]
    // string
    #[case(Schema::String, Schema::Boolean)]
    #[case(Schema::String, Schema::Int)]
    // bytes
    #[case(Schema::Bytes, Schema::Null)]
    #[case(Schema::Bytes, Schema::Int)]
    // array and maps
    #[case(int_array_schema(), long_array_schema())]
    #[case(int_map_schema(), int_array_schema())]
    #[case(int_array_schema(), int_map_schema())]
    #[case(int_map_schema(), long_map_schema())]
    // enum
    #[case(enum1_ab_schema(), enum2_ab_schema())]
    #[case(Schema::Int, enum2_ab_schema())]
    #[case(enum2_ab_schema(), Schema::Int)]
    // union
    #[case(int_union_schema(), string_union_schema())]
    // record
    #[case(empty_record2_schema(), empty_record1_schema())]
    #[case(a_int_record1_schema(), empty_record1_schema())]
    #[case(a_int_b_dint_record1_schema(), empty_record1_schema())]
    #[case(int_list_record_schema(), long_list_record_schema())]
    fn incompatible_reader_writer_pairs(#[case] reader: Schema, #[case] writer: Schema) {
        assert!(SchemaCompatibility::can_read(&writer, &reader).is_err());
    }

    #[rstest]
    #[case(enum1_ab_schema(), enum1_abc_schema())]
    #[case(enum1_bc_schema(), enum1_abc_schema())]
    #[case(int_union_schema(), int_string_union_schema())]
    #[case(string_union_schema(), int_string_union_schema())]
    #[case(nested_record(), nested_optional_record())]
    fn partially_compatible_reader_writer_pairs(#[case] reader: Schema, #[case] writer: Schema) {
        assert_eq!(
            SchemaCompatibility::can_read(&writer, &reader),
            Ok(Compatibility::Partial)
        );
    }

    #[rstest]
    #[case(Schema::Null, Schema::Null)]
    #[case(Schema::Long, Schema::Int)]
    #[case(Schema::Float, Schema::Int)]
    #[case(Schema::Float, Schema::Long)]
    #[case(Schema::Double, Schema::Long)]
    #[case(Schema::Double, Schema::Int)]
    #[case(Schema::Double, Schema::Float)]
    #[case(Schema::String, Schema::Bytes)]
    #[case(Schema::Bytes, Schema::String)]
    #[case(int_array_schema(), int_array_schema())]
    #[case(long_array_schema(), int_array_schema())]
    #[case(int_map_schema(), int_map_schema())]
    #[case(long_map_schema(), int_map_schema())]
    #[case(enum1_ab_schema(), enum1_ab_schema())]
    #[case(enum1_abc_schema(), enum1_ab_schema())]
    #[case(int_union_schema(), int_union_schema())]
    #[case(int_string_union_schema(), string_int_union_schema())]
    #[case(long_union_schema(), int_union_schema())]
    #[case(int_union_schema(), Schema::Int)]
    #[case(Schema::Int, int_union_schema())]
    #[case(empty_record1_schema(), empty_record1_schema())]
    #[case(empty_record1_schema(), a_int_record1_schema())]
    #[case(a_int_record1_schema(), a_int_record1_schema())]
    #[case(a_dint_record1_schema(), a_int_record1_schema())]
    #[case(a_dint_record1_schema(), a_dint_record1_schema())]
    #[case(a_int_record1_schema(), a_dint_record1_schema())]
    #[case(a_long_record1_schema(), a_int_record1_schema())]
    #[case(a_int_record1_schema(), a_int_b_int_record1_schema())]
    #[case(a_dint_record1_schema(), a_int_b_int_record1_schema())]
    #[case(a_int_b_dint_record1_schema(), a_int_record1_schema())]
    #[case(a_dint_b_dint_record1_schema(), empty_record1_schema())]
    #[case(a_dint_b_dint_record1_schema(), a_int_record1_schema())]
    #[case(a_int_b_int_record1_schema(), a_dint_b_dint_record1_schema())]
    #[case(int_list_record_schema(), int_list_record_schema())]
    #[case(long_list_record_schema(), long_list_record_schema())]
    #[case(long_list_record_schema(), int_list_record_schema())]
    #[case(nested_optional_record(), nested_record())]
    fn compatible_reader_writer_pairs(#[case] reader: Schema, #[case] writer: Schema) {
        assert_eq!(
            SchemaCompatibility::can_read(&writer, &reader),
            Ok(Compatibility::Full)
        );
    }

    #[rstest]
    #[case(
        r#"{"type": "record", "name": "record_a", "fields": [{"type": "long", "name": "date"}]}"#,
        r#"{"type": "record", "name": "record_a", "fields": [{"type": "long", "name": "date", "default": 18181}]}"#
    )]
    #[case(
        r#"{"type": "fixed", "name": "EmployeeId", "size": 16}"#,
        r#"{"type": "fixed", "name": "EmployeeId", "aliases": ["Id"], "size": 16}"#
    )]
    #[case(
        r#"{"type": "enum", "name":"Enum1", "symbols": ["A","B"]}"#,
        r#"{"type": "enum", "name":"Enum1", "symbols": ["A","B", "C"], "default": "C"}"#
    )]
    #[case(
        r#"{"type": "map", "values": "int"}"#,
        r#"{"type": "map", "values": "long"}"#
    )]
    #[case(
        r#"{"type": "array", "items": "int"}"#,
        r#"{"type": "array", "items": "long"}"#
    )]
    fn match_schemas_ok(
        #[case] writer_schema_str: &str,
        #[case] reader_schema_str: &str,
    ) -> TestResult {
        let writer_schema = Schema::parse_str(writer_schema_str)?;
        let reader_schema = Schema::parse_str(reader_schema_str)?;

        assert_eq!(
            SchemaCompatibility::can_read(&writer_schema, &reader_schema),
            Ok(Compatibility::Full)
        );
        Ok(())
    }

    #[rstest]
    #[case(
        r#"{"type": "record", "name": "record_a", "fields": [{"type": "long", "name": "date"}]}"#,
        r#"{"type": "record", "name": "record_b", "fields": [{"type": "long", "name": "date"}]}"#,
        CompatibilityError::NameMismatch{writer_name: String::from("record_a"), reader_name: String::from("record_b")}
    )]
    #[case(
        r#"{"type": "fixed", "name": "EmployeeId", "size": 16}"#,
        r#"{"type": "fixed", "name": "EmployeeId", "size": 20}"#,
        CompatibilityError::FixedMismatch
    )]
    #[case(
        r#"{"type": "enum", "name":"Enum1", "symbols": ["A","B"]}"#,
        r#"{"type": "enum", "name":"Enum1", "symbols": ["C","D"]}"#,
        CompatibilityError::MissingSymbols
    )]
    fn match_schemas_error(
        #[case] writer_schema_str: &str,
        #[case] reader_schema_str: &str,
        #[case] expected_error: CompatibilityError,
    ) -> TestResult {
        let writer_schema = Schema::parse_str(writer_schema_str)?;
        let reader_schema = Schema::parse_str(reader_schema_str)?;

        assert_eq!(
            SchemaCompatibility::can_read(&writer_schema, &reader_schema),
            Err(expected_error)
        );
        Ok(())
    }

    fn writer_schema() -> Schema {
        Schema::parse_str(
            r#"
      {"type":"record", "name":"Record", "fields":[
        {"name":"oldfield1", "type":"int"},
        {"name":"oldfield2", "type":"string"}
      ]}
"#,
        )
        .unwrap()
    }

    #[test]
    fn missing_field() -> TestResult {
        let reader_schema = Schema::parse_str(
            r#"
      {"type":"record", "name":"Record", "fields":[
        {"name":"oldfield1", "type":"int"}
      ]}
"#,
        )?;
        assert!(SchemaCompatibility::can_read(&writer_schema(), &reader_schema).is_ok());
        assert_eq!(
            CompatibilityError::MissingDefaultValue(String::from("oldfield2")),
            SchemaCompatibility::can_read(&reader_schema, &writer_schema()).unwrap_err()
        );

        Ok(())
    }

    #[test]
    fn new_field_with_default() -> TestResult {
        let reader_schema = Schema::parse_str(
            r#"
        {"type":"record", "name":"Record", "fields":[
          {"name":"oldfield1", "type":"int"},
          {"name":"newfield1", "type":"int", "default":42}
        ]}
"#,
        )?;
        assert!(SchemaCompatibility::can_read(&writer_schema(), &reader_schema).is_ok());
        assert_eq!(
            CompatibilityError::MissingDefaultValue(String::from("oldfield2")),
            SchemaCompatibility::can_read(&reader_schema, &writer_schema()).unwrap_err()
        );

        Ok(())
    }

    #[test]
    fn renamed_field_through_alias() -> TestResult {
        let reader_schema = Schema::parse_str(
            r#"
        {"type":"record", "name":"Record", "fields":[
          {"name":"count", "type":"long", "aliases": ["oldfield1"]}
        ]}
"#,
        )?;
        assert_eq!(
            SchemaCompatibility::can_read(&writer_schema(), &reader_schema),
            Ok(Compatibility::Full)
        );
        assert_eq!(
            CompatibilityError::MissingDefaultValue(String::from("oldfield1")),
            SchemaCompatibility::can_read(&reader_schema, &writer_schema()).unwrap_err()
        );
        Ok(())
    }

    #[test]
    fn writer_field_claimed_by_one_reader_field() -> TestResult {
        let writer = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )?;
        let with_default = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "long", "aliases": ["a"], "default": -1}
            ]}"#,
        )?;
        let without_default = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "long", "aliases": ["a"]}
            ]}"#,
        )?;

        assert_eq!(
            SchemaCompatibility::can_read(&writer, &with_default),
            Ok(Compatibility::Full)
        );
        assert_eq!(
            SchemaCompatibility::can_read(&writer, &without_default),
            Err(CompatibilityError::MissingDefaultValue(String::from("b")))
        );
        Ok(())
    }

    #[test]
    fn array_writer_schema() {
        let valid_reader = string_array_schema();
        let invalid_reader = string_map_schema();

        assert_eq!(
            Compatibility::Full,
            SchemaCompatibility::can_read(&string_array_schema(), &valid_reader).unwrap()
        );
        assert!(matches!(
            SchemaCompatibility::can_read(&string_array_schema(), &invalid_reader),
            Err(CompatibilityError::WrongType { .. }),
        ));
    }

    #[test]
    fn primitive_writer_schema() {
        assert!(SchemaCompatibility::can_read(&Schema::String, &Schema::String).is_ok());
        assert_eq!(
            CompatibilityError::WrongType {
                writer_schema_type: "Int".to_string(),
                reader_schema_type: "String".to_string()
            },
            SchemaCompatibility::can_read(&Schema::Int, &Schema::String).unwrap_err()
        );
    }

    #[test]
    fn union_reader_writer_subset_incompatibility() {
        // reader union schema must contain all writer union branches
        let union_writer = union_schema(vec![Schema::Int, Schema::String]);
        let union_reader = union_schema(vec![Schema::String]);

        assert_eq!(
            Compatibility::Partial,
            SchemaCompatibility::can_read(&union_writer, &union_reader).unwrap()
        );
        assert_eq!(
            Compatibility::Full,
            SchemaCompatibility::can_read(&union_reader, &union_writer).unwrap()
        );
    }

    #[test]
    fn incompatible_record_field() -> TestResult {
        let string_schema = Schema::parse_str(
            r#"
        {"type":"record", "name":"MyRecord", "namespace":"ns", "fields": [
            {"name":"field1", "type":"string"}
        ]}
        "#,
        )?;

        let int_schema = Schema::parse_str(
            r#"
              {"type":"record", "name":"MyRecord", "namespace":"ns", "fields": [
                {"name":"field1", "type":"int"}
              ]}
        "#,
        )?;

        assert_eq!(
            CompatibilityError::FieldTypeMismatch(
                "field1".to_owned(),
                Box::new(CompatibilityError::WrongType {
                    writer_schema_type: "String".to_string(),
                    reader_schema_type: "Int".to_string()
                })
            ),
            SchemaCompatibility::can_read(&string_schema, &int_schema).unwrap_err()
        );
        Ok(())
    }

    #[test]
    fn recursive_schemas_terminate() -> TestResult {
        let writer = Schema::parse_str(
            r#"{"type": "record", "name": "a.Node", "fields": [
                {"name": "value", "type": "int"},
                {"name": "next", "type": ["null", "Node"]}
            ]}"#,
        )?;
        let reader = Schema::parse_str(
            r#"{"type": "record", "name": "b.Node", "fields": [
                {"name": "value", "type": "long"},
                {"name": "next", "type": ["null", "b.Node"]},
                {"name": "tag", "type": "string", "default": ""}
            ]}"#,
        )?;
        let bad_reader = Schema::parse_str(
            r#"{"type": "record", "name": "Node", "fields": [
                {"name": "value", "type": "string"},
                {"name": "next", "type": ["null", "Node"]}
            ]}"#,
        )?;

        assert_eq!(
            SchemaCompatibility::can_read(&writer, &reader),
            Ok(Compatibility::Full)
        );
        assert!(SchemaCompatibility::can_read(&writer, &bad_reader).is_err());
        assert!(SchemaCompatibility::mutual_read(&writer, &reader).is_err());
        Ok(())
    }

    #[test]
    fn compatible_schemas_resolve() -> TestResult {
        let writer = long_list_record_schema();
        let reader = Schema::parse_str(
            r#"{"type":"record", "name":"List", "fields": [
                {"name": "tail", "type": {"type": "array", "items": "double"}},
                {"name": "size", "type": ["null", "int"], "default": null}
            ]}"#,
        )?;
        assert_eq!(
            SchemaCompatibility::can_read(&writer, &reader),
            Ok(Compatibility::Full)
        );

        let value = crate::types::Value::Record(vec![
            ("head".to_string(), crate::types::Value::Long(1)),
            (
                "tail".to_string(),
                crate::types::Value::Array(vec![crate::types::Value::Long(2)]),
            ),
        ]);
        let bytes = crate::to_avro_datum(&writer, value)?;
        assert!(crate::decode_with_resolution(&writer, &reader, &mut &bytes[..]).is_ok());
        Ok(())
    }
}
