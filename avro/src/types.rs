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

//! Logic handling the intermediate representation of Avro values.
use crate::{
    AvroResult,
    error::Details,
    schema::{
        EnumSchema, FixedSchema, Name, NamespaceRef, RecordSchema, ResolvedSchema, Schema,
        SchemaKind, UnionSchema, lookup_ref,
    },
};
use log::debug;
use serde_json::Value as JsonValue;
use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};
use strum_macros::EnumDiscriminants;

/// Represents any valid Avro value
/// More information about Avro values can be found in the
/// [Avro Specification](https://avro.apache.org/docs/current/specification/#schema-declaration)
#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(ValueKind), derive(Hash, Ord, PartialOrd))]
pub enum Value {
    /// A `null` Avro value.
    Null,
    /// A `boolean` Avro value.
    Boolean(bool),
    /// A `int` Avro value.
    Int(i32),
    /// A `long` Avro value.
    Long(i64),
    /// A `float` Avro value.
    Float(f32),
    /// A `double` Avro value.
    Double(f64),
    /// A `bytes` Avro value.
    Bytes(Vec<u8>),
    /// A `string` Avro value.
    String(String),
    /// A `fixed` Avro value.
    /// The size of the fixed value is represented as a `usize`.
    Fixed(usize, Vec<u8>),
    /// An `enum` Avro value.
    ///
    /// An Enum is represented by a symbol and its position in the symbols list
    /// of its corresponding schema.
    /// This allows schema-less encoding, as well as schema resolution while
    /// reading values.
    Enum(u32, String),
    /// An `union` Avro value.
    ///
    /// A Union is represented by the value it holds and its position in the type list
    /// of its corresponding schema
    /// This allows schema-less encoding, as well as schema resolution while
    /// reading values.
    Union(u32, Box<Value>),
    /// An `array` Avro value.
    Array(Vec<Value>),
    /// A `map` Avro value.
    Map(HashMap<String, Value>),
    /// A `record` Avro value.
    ///
    /// A Record is represented by a vector of (`<record name>`, `value`).
    /// This allows schema-less encoding.
    ///
    /// See [`Record`] for a more user-friendly support.
    Record(Vec<(String, Value)>),
}

macro_rules! to_value(
    ($type:ty, $variant_constructor:expr) => (
        impl From<$type> for Value {
            fn from(value: $type) -> Self {
                $variant_constructor(value)
            }
        }
    );
);

to_value!(bool, Value::Boolean);
to_value!(i32, Value::Int);
to_value!(i64, Value::Long);
to_value!(f32, Value::Float);
to_value!(f64, Value::Double);
to_value!(String, Value::String);
to_value!(Vec<u8>, Value::Bytes);

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Self::Null
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_owned())
    }
}

/// `None` is branch 0 and `Some` branch 1, the layout of a `["null", T]` union.
impl<T> From<Option<T>> for Value
where
    T: Into<Self>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            None => Self::Union(0, Box::new(Self::Null)),
            Some(v) => Self::Union(1, Box::new(v.into())),
        }
    }
}

impl<K, V, S> From<HashMap<K, V, S>> for Value
where
    K: Into<String>,
    V: Into<Self>,
    S: BuildHasher,
{
    fn from(value: HashMap<K, V, S>) -> Self {
        Self::Map(
            value
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<K, V> From<BTreeMap<K, V>> for Value
where
    K: Into<String>,
    V: Into<Self>,
{
    fn from(value: BTreeMap<K, V>) -> Self {
        Self::Map(
            value
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Utility interface to build `Value::Record` objects.
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// List of fields contained in the record.
    /// Ordered according to the fields in the schema given to create this
    /// `Record` object. Any unset field defaults to `Value::Null`.
    pub fields: Vec<(String, Value)>,
    schema_lookup: &'a BTreeMap<String, usize>,
}

impl Record<'_> {
    /// Create a `Record` given a `Schema`.
    ///
    /// If the `Schema` is not a `Schema::Record` variant, `None` will be returned.
    pub fn new(schema: &Schema) -> Option<Record<'_>> {
        match *schema {
            Schema::Record(RecordSchema {
                fields: ref schema_fields,
                lookup: ref schema_lookup,
                ..
            }) => {
                let fields = schema_fields
                    .iter()
                    .map(|field| (field.name.clone(), Value::Null))
                    .collect();
                Some(Record {
                    fields,
                    schema_lookup,
                })
            }
            _ => None,
        }
    }

    /// Put a compatible value (implementing the `Into<Value>` trait) in the
    /// `Record` for a given `field` name, or one of its aliases.
    ///
    /// **NOTE** Only ensure that the field name is present in the `Schema` given when creating
    /// this `Record`. Does not perform any schema validation.
    pub fn put<V>(&mut self, field: &str, value: V)
    where
        V: Into<Value>,
    {
        if let Some(&position) = self.schema_lookup.get(field) {
            self.fields[position].1 = value.into()
        }
    }

    /// Get the value for a given field name, or one of its aliases.
    /// Returns `None` if the field is not present in the schema
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema_lookup
            .get(field)
            .map(|&position| &self.fields[position].1)
    }
}

impl<'a> From<Record<'a>> for Value {
    fn from(value: Record<'a>) -> Self {
        Self::Record(value.fields)
    }
}

impl Value {
    /// Validate the value against the given [Schema](../schema/enum.Schema.html).
    ///
    /// See the [Avro specification](https://avro.apache.org/docs/current/specification)
    /// for the full set of rules of schema validation.
    pub fn validate(&self, schema: &Schema) -> bool {
        self.validate_schemata(vec![schema])
    }

    /// Validate the value against the first of `schemata`, resolving references against all
    /// of them.
    pub fn validate_schemata(&self, schemata: Vec<&Schema>) -> bool {
        let Some(&schema) = schemata.first() else {
            return false;
        };
        let rs = match ResolvedSchema::try_from(schemata) {
            Ok(rs) => rs,
            Err(e) => {
                debug!("Cannot validate against an unresolvable schema: {e}");
                return false;
            }
        };
        match self.validate_internal(schema, rs.get_names(), schema.namespace()) {
            Some(reason) => {
                debug!("Invalid value: {self:?} for schema: {schema:?}. Reason: {reason}");
                false
            }
            None => true,
        }
    }

    /// Returns the reason the value does not conform to `schema`, or `None` if it does.
    pub(crate) fn validate_internal<S: Borrow<Schema>>(
        &self,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: NamespaceRef,
    ) -> Option<String> {
        match (self, schema) {
            (_, Schema::Ref { name }) => match lookup_ref(names, name, enclosing_namespace) {
                Ok(resolved) => self.validate_internal(resolved, names, enclosing_namespace),
                Err(_) => Some(format!("Unresolved schema reference: '{name}'")),
            },
            (&Value::Null, &Schema::Null)
            | (&Value::Boolean(_), &Schema::Boolean)
            | (&Value::Int(_), &Schema::Int)
            | (&Value::Long(_), &Schema::Long)
            | (&Value::Float(_), &Schema::Float)
            | (&Value::Double(_), &Schema::Double)
            | (&Value::Bytes(_), &Schema::Bytes)
            | (&Value::String(_), &Schema::String) => None,
            (&Value::Fixed(n, ref bytes), &Schema::Fixed(FixedSchema { size, .. })) => {
                if n != size || bytes.len() != size {
                    Some(format!(
                        "The value's size ({n}, {} bytes) is different than the schema's size ({size})",
                        bytes.len()
                    ))
                } else {
                    None
                }
            }
            (Value::Bytes(bytes), &Schema::Fixed(FixedSchema { size, .. })) => {
                if bytes.len() != size {
                    Some(format!(
                        "The bytes' length ({}) is different than the schema's size ({size})",
                        bytes.len()
                    ))
                } else {
                    None
                }
            }
            (Value::String(s), Schema::Enum(EnumSchema { symbols, .. })) => {
                if !symbols.contains(s) {
                    Some(format!("'{s}' is not a member of the possible symbols"))
                } else {
                    None
                }
            }
            (&Value::Enum(i, ref s), Schema::Enum(EnumSchema { symbols, .. })) => {
                match symbols.get(i as usize) {
                    Some(symbol) if symbol == s => None,
                    Some(symbol) => Some(format!(
                        "Symbol '{s}' is not at position '{i}', '{symbol}' is"
                    )),
                    None => Some(format!("No symbol at position '{i}'")),
                }
            }
            (&Value::Union(i, ref value), Schema::Union(inner)) => {
                match inner.variants().get(i as usize) {
                    Some(branch) => value.validate_internal(branch, names, enclosing_namespace),
                    None => Some(format!("No schema in the union at position '{i}'")),
                }
            }
            (v, Schema::Union(inner)) => {
                match inner.find_schema_with_known_schemata(v, names, enclosing_namespace) {
                    Some(_) => None,
                    None => Some("Could not find matching type in union".to_string()),
                }
            }
            (Value::Array(items), Schema::Array(inner)) => items.iter().find_map(|item| {
                item.validate_internal(&inner.items, names, enclosing_namespace)
            }),
            (Value::Map(items), Schema::Map(inner)) => items.iter().find_map(|(_, value)| {
                value.validate_internal(&inner.types, names, enclosing_namespace)
            }),
            (
                Value::Record(record_fields),
                Schema::Record(RecordSchema {
                    name,
                    fields,
                    lookup,
                    ..
                }),
            ) => {
                let record_namespace = name.namespace().or(enclosing_namespace);
                if let Some((unknown, _)) = record_fields
                    .iter()
                    .find(|(field_name, _)| !lookup.contains_key(field_name))
                {
                    return Some(format!(
                        "There is no schema field for field '{unknown}'"
                    ));
                }
                fields.iter().find_map(|field| {
                    match record_fields
                        .iter()
                        .find(|(field_name, _)| field.is_known_as(field_name))
                    {
                        Some((_, value)) => {
                            value.validate_internal(&field.schema, names, record_namespace)
                        }
                        None => Some(format!("Field '{}' is missing", field.name)),
                    }
                })
            }
            (v, s) => Some(format!(
                "Unsupported value-schema combination! Value: {v:?}, schema: {s:?}"
            )),
        }
    }

    /// Build the value a JSON default stands for under `schema`.
    ///
    /// A union default belongs to its first branch. `bytes` and `fixed` defaults are strings
    /// whose code points 0-255 are the bytes. Missing fields of a record default are taken
    /// from the fields' own defaults.
    pub(crate) fn from_default<S: Borrow<Schema>>(
        default: &JsonValue,
        schema: &Schema,
        names: &HashMap<Name, S>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Value> {
        let mismatch = || Details::DefaultValueMismatch {
            default: default.clone(),
            kind: SchemaKind::from(schema),
        };
        let value = match (default, schema) {
            (_, Schema::Ref { name }) => {
                let resolved = lookup_ref(names, name, enclosing_namespace)?;
                return Self::from_default(default, resolved, names, enclosing_namespace);
            }
            (JsonValue::Null, Schema::Null) => Value::Null,
            (JsonValue::Bool(b), Schema::Boolean) => Value::Boolean(*b),
            (JsonValue::Number(n), Schema::Int) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Int)
                .ok_or_else(mismatch)?,
            (JsonValue::Number(n), Schema::Long) => {
                n.as_i64().map(Value::Long).ok_or_else(mismatch)?
            }
            (JsonValue::Number(n), Schema::Float) => n
                .as_f64()
                .map(|n| Value::Float(n as f32))
                .ok_or_else(mismatch)?,
            (JsonValue::Number(n), Schema::Double) => {
                n.as_f64().map(Value::Double).ok_or_else(mismatch)?
            }
            (JsonValue::String(s), Schema::Bytes) => {
                Value::Bytes(latin1_bytes(s).ok_or_else(mismatch)?)
            }
            (JsonValue::String(s), Schema::String) => Value::String(s.clone()),
            (JsonValue::String(s), Schema::Fixed(FixedSchema { size, .. })) => {
                let bytes = latin1_bytes(s)
                    .filter(|bytes| bytes.len() == *size)
                    .ok_or_else(mismatch)?;
                Value::Fixed(*size, bytes)
            }
            (JsonValue::String(s), Schema::Enum(EnumSchema { symbols, .. })) => {
                let index = symbols
                    .iter()
                    .position(|symbol| symbol == s)
                    .ok_or_else(mismatch)?;
                Value::Enum(index as u32, s.clone())
            }
            (JsonValue::Array(items), Schema::Array(inner)) => Value::Array(
                items
                    .iter()
                    .map(|item| Self::from_default(item, &inner.items, names, enclosing_namespace))
                    .collect::<AvroResult<_>>()?,
            ),
            (JsonValue::Object(items), Schema::Map(inner)) => Value::Map(
                items
                    .iter()
                    .map(|(key, value)| {
                        Self::from_default(value, &inner.types, names, enclosing_namespace)
                            .map(|value| (key.clone(), value))
                    })
                    .collect::<AvroResult<_>>()?,
            ),
            (_, Schema::Union(UnionSchema { schemas, .. })) => {
                let first = schemas.first().ok_or_else(mismatch)?;
                let value = Self::from_default(default, first, names, enclosing_namespace)?;
                Value::Union(0, Box::new(value))
            }
            (JsonValue::Object(items), Schema::Record(RecordSchema { name, fields, .. })) => {
                let record_namespace = name.namespace().or(enclosing_namespace);
                Value::Record(
                    fields
                        .iter()
                        .map(|field| {
                            let field_default = items
                                .get(&field.name)
                                .or(field.default.as_ref())
                                .ok_or_else(mismatch)?;
                            Self::from_default(field_default, &field.schema, names, record_namespace)
                                .map(|value| (field.name.clone(), value))
                        })
                        .collect::<AvroResult<_>>()?,
                )
            }
            _ => return Err(mismatch().into()),
        };
        Ok(value)
    }
}

/// Every char of `s` as one byte, or `None` if one is above U+00FF.
fn latin1_bytes(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(c).ok()).collect()
}
