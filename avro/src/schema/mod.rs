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

//! Logic for parsing and interacting with schemas in Avro format.

mod name;
mod parser;
mod record;
mod resolve;
mod union;

pub use crate::schema::{
    name::{Alias, Aliases, Name, Names, NamesRef, Namespace, NamespaceRef},
    record::{
        RecordField, RecordFieldBuilder, RecordFieldOrder, RecordSchema, RecordSchemaBuilder,
    },
    resolve::ResolvedSchema,
    union::UnionSchema,
};
pub(crate) use resolve::lookup_ref;
use crate::{
    AvroResult,
    error::{Details, Error},
    schema::parser::Parser,
    schema_equality,
    types::Value,
};
use serde::{
    Serialize, Serializer,
    ser::{SerializeMap, SerializeSeq},
};
use serde_json::Value as JsonValue;
use std::{
    collections::{BTreeMap, HashSet},
    fmt::Write as _,
    io::Read,
};
use strum_macros::{Display, EnumDiscriminants};

/// Represents documentation for complex Avro schemas.
pub type Documentation = Option<String>;

/// Represents any valid Avro schema.
///
/// Named types (`Record`, `Enum` and `Fixed`) are defined once. Any later use of the same
/// type, including a recursive one, is a [`Schema::Ref`] to be looked up by full name in a
/// [`ResolvedSchema`].
#[derive(Clone, Debug, EnumDiscriminants)]
#[strum_discriminants(name(SchemaKind), derive(Hash, Ord, PartialOrd, Display))]
pub enum Schema {
    /// A `null` Avro schema.
    Null,
    /// A `boolean` Avro schema.
    Boolean,
    /// An `int` Avro schema.
    Int,
    /// A `long` Avro schema.
    Long,
    /// A `float` Avro schema.
    Float,
    /// A `double` Avro schema.
    Double,
    /// A `bytes` Avro schema.
    ///
    /// `Bytes` represents a sequence of 8-bit unsigned bytes.
    Bytes,
    /// A `string` Avro schema.
    ///
    /// `String` represents a unicode character sequence.
    String,
    /// An `array` Avro schema.
    ///
    /// All items will have the same schema.
    Array(ArraySchema),
    /// A `map` Avro schema.
    ///
    /// Keys are always a `Schema::String` and all values will have the same schema.
    Map(MapSchema),
    /// A `union` Avro schema.
    Union(UnionSchema),
    /// A `record` Avro schema.
    Record(RecordSchema),
    /// An `enum` Avro schema.
    Enum(EnumSchema),
    /// A `fixed` Avro schema.
    Fixed(FixedSchema),
    /// A reference to a named schema defined elsewhere.
    Ref { name: Name },
}

#[derive(Clone, Debug, PartialEq)]
pub struct MapSchema {
    pub types: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArraySchema {
    pub items: Box<Schema>,
    pub attributes: BTreeMap<String, JsonValue>,
}

impl PartialEq for Schema {
    /// Structural equality, see [`schema_equality`](crate::schema_equality).
    fn eq(&self, other: &Self) -> bool {
        schema_equality::compare_schemata(self, other)
    }
}

impl SchemaKind {
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            SchemaKind::Null
                | SchemaKind::Boolean
                | SchemaKind::Int
                | SchemaKind::Long
                | SchemaKind::Double
                | SchemaKind::Float
                | SchemaKind::Bytes
                | SchemaKind::String,
        )
    }
}

impl From<&Value> for SchemaKind {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Boolean(_) => Self::Boolean,
            Value::Int(_) => Self::Int,
            Value::Long(_) => Self::Long,
            Value::Float(_) => Self::Float,
            Value::Double(_) => Self::Double,
            Value::Bytes(_) => Self::Bytes,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Map(_) => Self::Map,
            Value::Union(_, _) => Self::Union,
            Value::Record(_) => Self::Record,
            Value::Enum(_, _) => Self::Enum,
            Value::Fixed(_, _) => Self::Fixed,
        }
    }
}

/// A description of an Enum schema.
#[derive(bon::Builder, Debug, Clone)]
pub struct EnumSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    #[builder(default)]
    pub doc: Documentation,
    /// The set of symbols of the schema
    pub symbols: Vec<String>,
    /// The symbol a reader falls back to when the writer's symbol is unknown to it
    pub default: Option<String>,
    /// The custom attributes of the schema
    #[builder(default)]
    pub attributes: BTreeMap<String, JsonValue>,
}

/// A description of a Fixed schema.
#[derive(bon::Builder, Debug, Clone)]
pub struct FixedSchema {
    /// The name of the schema
    pub name: Name,
    /// The aliases of the schema
    #[builder(default)]
    pub aliases: Aliases,
    /// The documentation of the schema
    #[builder(default)]
    pub doc: Documentation,
    /// The size of the fixed schema
    pub size: usize,
    /// The custom attributes of the schema
    #[builder(default)]
    pub attributes: BTreeMap<String, JsonValue>,
}

impl Schema {
    /// Create a `Schema` from a string representing a JSON Avro schema.
    pub fn parse_str(input: &str) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        parser.parse_str(input)
    }

    /// Create a `Schema` from a reader which implements [`Read`].
    pub fn parse_reader(reader: &mut (impl Read + ?Sized)) -> AvroResult<Schema> {
        let mut buf = String::new();
        reader
            .read_to_string(&mut buf)
            .map_err(Details::ReadSchemaFromReader)?;
        Self::parse_str(&buf)
    }

    /// Parses an Avro schema from JSON.
    pub fn parse(value: &JsonValue) -> AvroResult<Schema> {
        let mut parser = Parser::default();
        parser.parse(value, None)
    }

    /// Create a list of schemas from named JSON Avro schemas (records, enums and fixed).
    ///
    /// The schemas may reference each other in any order. References to another schema of the
    /// list stay [`Schema::Ref`]s, so encoding and decoding need the whole list, see
    /// [`to_avro_datum_schemata`](crate::to_avro_datum_schemata).
    ///
    /// Two inputs with the same full name are an error.
    pub fn parse_list(input: impl IntoIterator<Item = impl AsRef<str>>) -> AvroResult<Vec<Schema>> {
        let mut parser = Parser::default();
        for json in input {
            let value: JsonValue =
                serde_json::from_str(json.as_ref()).map_err(Details::ParseSchemaJson)?;
            parser.add_input_schema(value)?;
        }
        parser.parse_list()
    }

    /// Build an array schema.
    pub fn array(items: Schema) -> Self {
        Schema::Array(ArraySchema {
            items: Box::new(items),
            attributes: BTreeMap::new(),
        })
    }

    /// Build a map schema with string keys.
    pub fn map(types: Schema) -> Self {
        Schema::Map(MapSchema {
            types: Box::new(types),
            attributes: BTreeMap::new(),
        })
    }

    /// Build a union schema, see [`UnionSchema::new`] for the rules.
    pub fn union(schemas: Vec<Schema>) -> AvroResult<Self> {
        UnionSchema::new(schemas).map(Schema::Union)
    }

    /// Converts `self` into its [Parsing Canonical Form].
    ///
    /// Only the attributes that matter for the binary encoding are kept, names are full
    /// names and every repeated use of a named type is written as its full name.
    ///
    /// [Parsing Canonical Form]:
    /// https://avro.apache.org/docs/++version++/specification/#parsing-canonical-form-for-schemas
    pub fn canonical_form(&self) -> String {
        let mut out = String::new();
        write_canonical_form(self, &mut HashSet::new(), &mut out);
        out
    }

    /// Returns the custom attributes (metadata) if the schema supports them.
    pub fn custom_attributes(&self) -> Option<&BTreeMap<String, JsonValue>> {
        match self {
            Schema::Record(RecordSchema { attributes, .. })
            | Schema::Enum(EnumSchema { attributes, .. })
            | Schema::Fixed(FixedSchema { attributes, .. })
            | Schema::Array(ArraySchema { attributes, .. })
            | Schema::Map(MapSchema { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    /// Returns whether the schema is a named type or a reference to one.
    pub fn is_named(&self) -> bool {
        matches!(
            self,
            Schema::Ref { .. } | Schema::Record(_) | Schema::Enum(_) | Schema::Fixed(_)
        )
    }

    /// Returns the name of the schema if it has one.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Schema::Ref { name, .. }
            | Schema::Record(RecordSchema { name, .. })
            | Schema::Enum(EnumSchema { name, .. })
            | Schema::Fixed(FixedSchema { name, .. }) => Some(name),
            _ => None,
        }
    }

    /// Returns the namespace of the schema if it has one.
    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.name().and_then(|n| n.namespace())
    }

    /// Returns the aliases of the schema if it has ones.
    pub fn aliases(&self) -> Option<&Vec<Alias>> {
        match self {
            Schema::Record(RecordSchema { aliases, .. })
            | Schema::Enum(EnumSchema { aliases, .. })
            | Schema::Fixed(FixedSchema { aliases, .. }) => aliases.as_ref(),
            _ => None,
        }
    }

    /// Returns the doc of the schema if it has one.
    pub fn doc(&self) -> Option<&String> {
        match self {
            Schema::Record(RecordSchema { doc, .. })
            | Schema::Enum(EnumSchema { doc, .. })
            | Schema::Fixed(FixedSchema { doc, .. }) => doc.as_ref(),
            _ => None,
        }
    }
}

fn write_canonical_form(schema: &Schema, defined: &mut HashSet<Name>, out: &mut String) {
    fn quoted(s: &str) -> String {
        JsonValue::String(s.to_string()).to_string()
    }

    // a named type is spelled out once, every other occurrence is just its full name
    if let Some(name) = schema.name()
        && !defined.insert(name.clone())
    {
        out.push_str(&quoted(&name.fullname()));
        return;
    }

    match schema {
        Schema::Null => out.push_str(r#""null""#),
        Schema::Boolean => out.push_str(r#""boolean""#),
        Schema::Int => out.push_str(r#""int""#),
        Schema::Long => out.push_str(r#""long""#),
        Schema::Float => out.push_str(r#""float""#),
        Schema::Double => out.push_str(r#""double""#),
        Schema::Bytes => out.push_str(r#""bytes""#),
        Schema::String => out.push_str(r#""string""#),
        Schema::Ref { name } => out.push_str(&quoted(&name.fullname())),
        Schema::Array(ArraySchema { items, .. }) => {
            out.push_str(r#"{"type":"array","items":"#);
            write_canonical_form(items, defined, out);
            out.push('}');
        }
        Schema::Map(MapSchema { types, .. }) => {
            out.push_str(r#"{"type":"map","values":"#);
            write_canonical_form(types, defined, out);
            out.push('}');
        }
        Schema::Union(union) => {
            out.push('[');
            for (i, variant) in union.variants().iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical_form(variant, defined, out);
            }
            out.push(']');
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let _ = write!(
                out,
                r#"{{"name":{},"type":"record","fields":["#,
                quoted(&name.fullname())
            );
            for (i, field) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, r#"{{"name":{},"type":"#, quoted(&field.name));
                write_canonical_form(&field.schema, defined, out);
                out.push('}');
            }
            out.push_str("]}");
        }
        Schema::Enum(EnumSchema { name, symbols, .. }) => {
            let symbols = symbols
                .iter()
                .map(|s| quoted(s))
                .collect::<Vec<_>>()
                .join(",");
            let _ = write!(
                out,
                r#"{{"name":{},"type":"enum","symbols":[{symbols}]}}"#,
                quoted(&name.fullname())
            );
        }
        Schema::Fixed(FixedSchema { name, size, .. }) => {
            let _ = write!(
                out,
                r#"{{"name":{},"type":"fixed","size":{size}}}"#,
                quoted(&name.fullname())
            );
        }
    }
}

fn serialize_name<M: SerializeMap>(map: &mut M, name: &Name) -> Result<(), M::Error> {
    if let Some(namespace) = name.namespace() {
        map.serialize_entry("namespace", namespace)?;
    }
    map.serialize_entry("name", name.name())
}

impl Serialize for Schema {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Schema::Ref { name } => serializer.serialize_str(&name.fullname()),
            Schema::Null => serializer.serialize_str("null"),
            Schema::Boolean => serializer.serialize_str("boolean"),
            Schema::Int => serializer.serialize_str("int"),
            Schema::Long => serializer.serialize_str("long"),
            Schema::Float => serializer.serialize_str("float"),
            Schema::Double => serializer.serialize_str("double"),
            Schema::Bytes => serializer.serialize_str("bytes"),
            Schema::String => serializer.serialize_str("string"),
            Schema::Array(ArraySchema { items, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Map(MapSchema { types, attributes }) => {
                let mut map = serializer.serialize_map(Some(2 + attributes.len()))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", types)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Union(inner) => {
                let variants = inner.variants();
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            Schema::Record(RecordSchema {
                name,
                aliases,
                doc,
                fields,
                attributes,
                lookup: _,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "record")?;
                serialize_name(&mut map, name)?;
                if let Some(doc) = doc {
                    map.serialize_entry("doc", doc)?;
                }
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                map.serialize_entry("fields", fields)?;
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Enum(EnumSchema {
                name,
                symbols,
                aliases,
                attributes,
                default,
                doc,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "enum")?;
                serialize_name(&mut map, name)?;
                map.serialize_entry("symbols", symbols)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                if let Some(default) = default {
                    map.serialize_entry("default", default)?;
                }
                if let Some(doc) = doc {
                    map.serialize_entry("doc", doc)?;
                }
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            Schema::Fixed(FixedSchema {
                name,
                aliases,
                doc,
                size,
                attributes,
            }) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", "fixed")?;
                serialize_name(&mut map, name)?;
                if let Some(doc) = doc {
                    map.serialize_entry("doc", doc)?;
                }
                map.serialize_entry("size", size)?;
                if let Some(aliases) = aliases {
                    map.serialize_entry("aliases", aliases)?;
                }
                for (key, value) in attributes {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl TryFrom<&str> for Schema {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Schema::parse_str(value)
    }
}
