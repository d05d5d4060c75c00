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

use crate::{
    AvroResult, Error,
    error::Details,
    schema::{
        Alias, Aliases, ArraySchema, EnumSchema, FixedSchema, MapSchema, Name, Names, Namespace,
        NamespaceRef, RecordField, RecordSchema, Schema, UnionSchema, record::lookup_table,
    },
    util::MapHelper,
    validator::validate_enum_symbol_name,
};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Default)]
pub(crate) struct Parser {
    /// Named schemas given to `parse_list` that have not been parsed yet
    input_schemas: HashMap<Name, Value>,
    input_order: Vec<Name>,
    /// Named types whose definition is being parsed, so they can refer to themselves
    resolving_schemas: HashSet<Name>,
    /// Every named type defined so far
    parsed_schemas: Names,
    /// Namespaces of the enclosing named types, innermost last
    namespace_chain: Vec<Namespace>,
}

impl Parser {
    /// Every named type defined so far, keyed by full name.
    pub(crate) fn names(&self) -> &Names {
        &self.parsed_schemas
    }

    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub(super) fn parse_str(&mut self, input: &str) -> AvroResult<Schema> {
        let value = serde_json::from_str(input).map_err(Details::ParseSchemaJson)?;
        self.parse(&value, None)
    }

    /// Queue a named schema for [`Self::parse_list`].
    pub(super) fn add_input_schema(&mut self, value: Value) -> AvroResult<()> {
        let Value::Object(complex) = &value else {
            return Err(Details::GetNameField.into());
        };
        let name = Name::parse(complex, None)?;
        if self.input_schemas.contains_key(&name) {
            return Err(Details::NameCollision(name.fullname()).into());
        }
        self.input_order.push(name.clone());
        self.input_schemas.insert(name, value);
        Ok(())
    }

    /// Parse every queued input schema and return them in input order.
    ///
    /// Inputs may refer to each other regardless of their order.
    pub(super) fn parse_list(&mut self) -> AvroResult<Vec<Schema>> {
        let order = std::mem::take(&mut self.input_order);
        for name in &order {
            if let Some(value) = self.input_schemas.remove(name) {
                self.parse_input_schema(&value)?;
            }
        }
        order
            .into_iter()
            .map(|name| {
                self.parsed_schemas
                    .get(&name)
                    .cloned()
                    .ok_or_else(|| Error::from(Details::SchemaResolutionError(name)))
            })
            .collect()
    }

    /// An input schema does not inherit anything from the schema that referred to it.
    fn parse_input_schema(&mut self, value: &Value) -> AvroResult<Schema> {
        let chain = std::mem::take(&mut self.namespace_chain);
        let parsed = self.parse(value, None);
        self.namespace_chain = chain;
        parsed
    }

    /// Create a `Schema` from a `serde_json::Value` representing a JSON Avro schema.
    pub(super) fn parse(
        &mut self,
        value: &Value,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match value {
            Value::String(t) => self.parse_known_schema(t.as_str(), enclosing_namespace),
            Value::Object(data) => self.parse_complex(data, enclosing_namespace),
            Value::Array(data) => self.parse_union(data, enclosing_namespace),
            _ => Err(Details::ParseSchemaFromValidJson.into()),
        }
    }

    /// Parse the `type` of a record field.
    pub(crate) fn parse_field_type(
        &mut self,
        field: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let typ = field.get("type").ok_or(Details::GetComplexTypeField)?;
        self.parse(typ, enclosing_namespace)
    }

    /// Parse a string as a primitive type or a reference to a named type.
    fn parse_known_schema(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match name {
            "null" => Ok(Schema::Null),
            "boolean" => Ok(Schema::Boolean),
            "int" => Ok(Schema::Int),
            "long" => Ok(Schema::Long),
            "double" => Ok(Schema::Double),
            "float" => Ok(Schema::Float),
            "bytes" => Ok(Schema::Bytes),
            "string" => Ok(Schema::String),
            _ => self.fetch_schema_ref(name, enclosing_namespace),
        }
    }

    /// The full names a reference may stand for, in lookup order.
    ///
    /// A dotted name is already complete. A bare name is tried in the innermost enclosing
    /// namespace, then in each outer one and finally in the null namespace.
    fn candidate_names(
        &self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Vec<Name>> {
        if name.contains('.') {
            return Ok(vec![Name::new(name)?]);
        }
        let mut candidates: Vec<Name> = Vec::with_capacity(self.namespace_chain.len() + 2);
        let outer = self.namespace_chain.iter().rev().map(|ns| ns.as_deref());
        for namespace in std::iter::once(enclosing_namespace)
            .chain(outer)
            .chain(std::iter::once(None))
        {
            let candidate = Name::new_with_enclosing_namespace(name, namespace)?;
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }

    /// Resolve a reference to a named type.
    ///
    /// A type that is defined, or whose definition is being parsed, becomes a
    /// `Schema::Ref`. A type only known as a queued input schema gets parsed first.
    fn fetch_schema_ref(
        &mut self,
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        if matches!(name, "record" | "enum" | "fixed" | "array" | "map") {
            return Err(Details::InvalidSchemaRecord(name.to_string()).into());
        }

        let candidates = self.candidate_names(name, enclosing_namespace)?;
        if let Some(found) = candidates.iter().find(|candidate| {
            self.parsed_schemas.contains_key(*candidate)
                || self.resolving_schemas.contains(*candidate)
        }) {
            return Ok(Schema::Ref {
                name: found.clone(),
            });
        }

        for candidate in candidates {
            if let Some(value) = self.input_schemas.remove(&candidate) {
                debug!("Parsing input schema {candidate} on first reference");
                self.parse_input_schema(&value)?;
                return Ok(Schema::Ref { name: candidate });
            }
        }

        Err(if name == "bool" {
            Details::ParsePrimitiveSimilar(name.to_string(), "boolean")
        } else {
            Details::ParsePrimitive(name.to_string())
        }
        .into())
    }

    /// Parse a `serde_json::Value` representing a complex Avro type into a `Schema`.
    ///
    /// Avro supports "recursive" definition of types.
    /// e.g: `{"type": {"type": "string"}}`
    fn parse_complex(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        match complex.get("type") {
            Some(Value::String(t)) => match t.as_str() {
                "record" => self.parse_record(complex, enclosing_namespace),
                "enum" => self.parse_enum(complex, enclosing_namespace),
                "array" => self.parse_array(complex, enclosing_namespace),
                "map" => self.parse_map(complex, enclosing_namespace),
                "fixed" => self.parse_fixed(complex, enclosing_namespace),
                other => self.parse_known_schema(other, enclosing_namespace),
            },
            Some(Value::Object(data)) => self.parse_complex(data, enclosing_namespace),
            Some(Value::Array(variants)) => self.parse_union(variants, enclosing_namespace),
            Some(unknown) => Err(Details::GetComplexType(unknown.clone()).into()),
            None => Err(Details::GetComplexTypeField.into()),
        }
    }

    /// Record a named type once its definition is complete.
    ///
    /// A second definition of the same full name is only allowed when it is identical to the
    /// first one, and then it is just a reference.
    fn register_parsed_schema(&mut self, name: Name, schema: Schema) -> AvroResult<Schema> {
        match self.parsed_schemas.get(&name) {
            Some(existing) if *existing == schema => {
                debug!("Identical redefinition of {name}, using a reference");
                Ok(Schema::Ref { name })
            }
            Some(_) => Err(Details::AmbiguousSchemaDefinition(name).into()),
            None => {
                self.parsed_schemas.insert(name, schema.clone());
                Ok(schema)
            }
        }
    }

    /// Fail when a named type is redefined inside its own definition.
    fn check_not_resolving(&self, name: &Name) -> AvroResult<()> {
        if self.resolving_schemas.contains(name) {
            Err(Details::AmbiguousSchemaDefinition(name.clone()).into())
        } else {
            Ok(())
        }
    }

    /// Parse a `serde_json::Value` representing an Avro record type into a `Schema`.
    fn parse_record(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_not_resolving(&fully_qualified_name)?;
        let aliases = fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace())?;

        debug!("Going to parse record schema: {fully_qualified_name}");

        let fields_json = complex
            .get("fields")
            .and_then(|fields| fields.as_array())
            .ok_or(Details::GetRecordFieldsJson)?;

        self.resolving_schemas.insert(fully_qualified_name.clone());
        self.namespace_chain
            .push(fully_qualified_name.namespace().map(str::to_string));
        let fields = fields_json
            .iter()
            .enumerate()
            .map(|(position, field)| {
                let field = field.as_object().ok_or(Details::GetRecordFieldsJson)?;
                RecordField::parse(field, position, self, &fully_qualified_name)
            })
            .collect::<AvroResult<Vec<_>>>();
        self.namespace_chain.pop();
        self.resolving_schemas.remove(&fully_qualified_name);
        let fields = fields?;

        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(Details::FieldNameDuplicate(field.name.clone()).into());
            }
        }

        let schema = Schema::Record(RecordSchema {
            name: fully_qualified_name.clone(),
            aliases,
            doc: complex.doc(),
            lookup: lookup_table(&fields),
            fields,
            attributes: custom_attributes(complex, &["fields"]),
        });
        self.register_parsed_schema(fully_qualified_name, schema)
    }

    /// Parse a `serde_json::Value` representing a Avro enum type into a `Schema`.
    fn parse_enum(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_not_resolving(&fully_qualified_name)?;
        let aliases = fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace())?;

        let symbols: Vec<String> = complex
            .get("symbols")
            .ok_or_else(|| Error::from(Details::GetEnumSymbolsField))?
            .as_array()
            .and_then(|symbols| {
                symbols
                    .iter()
                    .map(|symbol| symbol.as_str().map(|s| s.to_string()))
                    .collect::<Option<_>>()
            })
            .ok_or(Details::GetEnumSymbols)?;

        let mut existing_symbols: HashSet<&str> = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            validate_enum_symbol_name(symbol)?;
            if !existing_symbols.insert(symbol.as_str()) {
                return Err(Details::EnumSymbolDuplicate(symbol.to_string()).into());
            }
        }

        let default = match complex.get("default") {
            None => None,
            Some(Value::String(s)) if existing_symbols.contains(s.as_str()) => Some(s.clone()),
            Some(Value::String(s)) => {
                return Err(Details::GetEnumDefault {
                    symbol: s.clone(),
                    symbols,
                }
                .into());
            }
            Some(other) => return Err(Details::EnumDefaultWrongType(other.clone()).into()),
        };

        let schema = Schema::Enum(EnumSchema {
            name: fully_qualified_name.clone(),
            aliases,
            doc: complex.doc(),
            symbols,
            default,
            attributes: custom_attributes(complex, &["symbols", "default"]),
        });
        self.register_parsed_schema(fully_qualified_name, schema)
    }

    /// Parse a `serde_json::Value` representing a Avro array type into a `Schema`.
    fn parse_array(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let items = complex
            .get("items")
            .ok_or_else(|| Details::GetArrayItemsField.into())
            .and_then(|items| self.parse(items, enclosing_namespace))?;
        Ok(Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: custom_attributes(complex, &["items"]),
        }))
    }

    /// Parse a `serde_json::Value` representing a Avro map type into a `Schema`.
    fn parse_map(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        if complex.contains_key("keys") {
            warn!("Ignoring the `keys` attribute of a map schema, map keys are always strings");
        }
        let types = complex
            .get("values")
            .ok_or_else(|| Details::GetMapValuesField.into())
            .and_then(|types| self.parse(types, enclosing_namespace))?;
        Ok(Schema::Map(MapSchema {
            types: Box::new(types),
            attributes: custom_attributes(complex, &["values", "keys"]),
        }))
    }

    /// Parse a `serde_json::Value` representing a Avro union type into a `Schema`.
    fn parse_union(
        &mut self,
        items: &[Value],
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let schemas = items
            .iter()
            .map(|v| self.parse(v, enclosing_namespace))
            .collect::<AvroResult<Vec<_>>>()?;
        if schemas.len() == 1 {
            warn!(
                "Union schema with just one member! Consider dropping the union! \
                Please enable debug logging to find out which Record schema \
                declares the union with 'RUST_LOG=avro_codec::schema=debug'."
            );
        }
        Ok(Schema::Union(UnionSchema::new(schemas)?))
    }

    /// Parse a `serde_json::Value` representing a Avro fixed type into a `Schema`.
    fn parse_fixed(
        &mut self,
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Schema> {
        let fully_qualified_name = Name::parse(complex, enclosing_namespace)?;
        self.check_not_resolving(&fully_qualified_name)?;
        let aliases = fix_aliases_namespace(complex.aliases(), fully_qualified_name.namespace())?;

        let size = match complex.get("size") {
            Some(size) => size
                .as_u64()
                .and_then(|size| usize::try_from(size).ok())
                .ok_or_else(|| Details::GetFixedSizeFieldPositive(size.clone())),
            None => Err(Details::GetFixedSizeField),
        }?;

        let schema = Schema::Fixed(FixedSchema {
            name: fully_qualified_name.clone(),
            aliases,
            doc: complex.doc(),
            size,
            attributes: custom_attributes(complex, &["size"]),
        });
        self.register_parsed_schema(fully_qualified_name, schema)
    }
}

fn custom_attributes(
    complex: &Map<String, Value>,
    excluded: &[&'static str],
) -> BTreeMap<String, Value> {
    complex
        .iter()
        .filter(|(key, _)| {
            !matches!(
                key.as_str(),
                "type" | "name" | "namespace" | "doc" | "aliases"
            ) && !excluded.contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// An alias without a dot is relative to the namespace of the type it names.
fn fix_aliases_namespace(
    aliases: Option<Vec<String>>,
    namespace: NamespaceRef,
) -> AvroResult<Aliases> {
    aliases
        .map(|aliases| {
            aliases
                .iter()
                .map(|alias| match namespace {
                    Some(ns) if !alias.contains('.') => Alias::new(&format!("{ns}.{alias}")),
                    _ => Alias::new(alias),
                })
                .collect::<AvroResult<Vec<_>>>()
        })
        .transpose()
}
