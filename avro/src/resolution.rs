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

//! Reading data written with one schema as values of another.
//!
//! The writer's and the reader's schema are walked side by side while the bytes are consumed, so
//! nothing is decoded twice and writer-only fields are skipped without building values.
use crate::{
    AvroResult,
    decode::{
        MAX_PREALLOCATED_ITEMS, decode_bytes, decode_float, decode_internal, decode_seq_len,
        decode_string, read_exact_vec, skip_internal,
    },
    error::Details,
    schema::{
        EnumSchema, FixedSchema, Name, NamesRef, NamespaceRef, RecordField, RecordSchema,
        ResolvedSchema, Schema, SchemaKind, UnionSchema, lookup_ref,
    },
    types::Value,
    util::{zag_i32, zag_i64},
};
use log::debug;
use std::{collections::HashMap, io::Read, iter::once};

/// Decode a datum written with `writer_schema` into a value shaped by `reader_schema`.
///
/// Numeric values are promoted (`int` to `long`, `float` or `double`, `long` to `float` or
/// `double`, `float` to `double`) and `string` and `bytes` are interchangeable. Fields the
/// reader does not know are skipped; fields the writer did not write take the reader's default.
pub fn decode_with_resolution<R: Read>(
    writer_schema: &Schema,
    reader_schema: &Schema,
    reader: &mut R,
) -> AvroResult<Value> {
    let writer_rs = ResolvedSchema::try_from(writer_schema)?;
    let reader_rs = ResolvedSchema::try_from(reader_schema)?;
    Resolver::new(writer_rs.get_names(), reader_rs.get_names()).resolve(
        writer_schema,
        None,
        reader_schema,
        None,
        reader,
    )
}

/// Both sides of a resolution: each schema is looked up in its own names table.
pub(crate) struct Resolver<'a> {
    writer_names: &'a NamesRef<'a>,
    reader_names: &'a NamesRef<'a>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(writer_names: &'a NamesRef<'a>, reader_names: &'a NamesRef<'a>) -> Self {
        Self {
            writer_names,
            reader_names,
        }
    }

    pub(crate) fn resolve<R: Read>(
        &self,
        writer: &Schema,
        writer_namespace: NamespaceRef,
        reader_schema: &Schema,
        reader_namespace: NamespaceRef,
        input: &mut R,
    ) -> AvroResult<Value> {
        if let Schema::Ref { name } = writer {
            let writer = lookup_ref(self.writer_names, name, writer_namespace)?;
            return self.resolve(writer, writer_namespace, reader_schema, reader_namespace, input);
        }
        if let Schema::Ref { name } = reader_schema {
            let reader_schema = lookup_ref(self.reader_names, name, reader_namespace)?;
            return self.resolve(writer, writer_namespace, reader_schema, reader_namespace, input);
        }

        match (writer, reader_schema) {
            (Schema::Union(writer_union), _) => {
                let index = zag_i64(input)?;
                let variants = writer_union.variants();
                let variant = usize::try_from(index)
                    .ok()
                    .and_then(|i| variants.get(i))
                    .ok_or(Details::GetUnionVariant {
                        index,
                        num_variants: variants.len(),
                    })?;
                self.resolve(variant, writer_namespace, reader_schema, reader_namespace, input)
            }
            (_, Schema::Union(reader_union)) => {
                let (index, branch) =
                    self.select_branch(writer, writer_namespace, reader_union, reader_namespace)?;
                let value = self.resolve(writer, writer_namespace, branch, reader_namespace, input)?;
                Ok(Value::Union(index as u32, Box::new(value)))
            }

            (Schema::Null, Schema::Null)
            | (Schema::Boolean, Schema::Boolean)
            | (Schema::Int, Schema::Int)
            | (Schema::Long, Schema::Long)
            | (Schema::Float, Schema::Float)
            | (Schema::Double, Schema::Double)
            | (Schema::Bytes, Schema::Bytes)
            | (Schema::String, Schema::String) => {
                decode_internal(writer, self.writer_names, writer_namespace, input)
            }
            (Schema::Int, Schema::Long) => Ok(Value::Long(zag_i32(input)?.into())),
            (Schema::Int, Schema::Float) => Ok(Value::Float(zag_i32(input)? as f32)),
            (Schema::Int, Schema::Double) => Ok(Value::Double(zag_i32(input)?.into())),
            (Schema::Long, Schema::Float) => Ok(Value::Float(zag_i64(input)? as f32)),
            (Schema::Long, Schema::Double) => Ok(Value::Double(zag_i64(input)? as f64)),
            (Schema::Float, Schema::Double) => Ok(Value::Double(decode_float(input)?.into())),
            (Schema::String, Schema::Bytes) => decode_bytes(input).map(Value::Bytes),
            (Schema::Bytes, Schema::String) => decode_string(input).map(Value::String),

            (Schema::Fixed(writer_fixed), Schema::Fixed(reader_fixed)) => {
                self.resolve_fixed(writer_fixed, reader_fixed, reader_schema, input)
            }
            (Schema::Enum(writer_enum), Schema::Enum(reader_enum)) => {
                check_names(&writer_enum.name, reader_schema)?;
                resolve_enum(writer_enum, reader_enum, input)
            }
            (Schema::Array(writer_array), Schema::Array(reader_array)) => {
                let mut items = Vec::new();
                loop {
                    let len = decode_seq_len(input)?;
                    if len == 0 {
                        break;
                    }
                    items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                    for _ in 0..len {
                        items.push(self.resolve(
                            &writer_array.items,
                            writer_namespace,
                            &reader_array.items,
                            reader_namespace,
                            input,
                        )?);
                    }
                }
                Ok(Value::Array(items))
            }
            (Schema::Map(writer_map), Schema::Map(reader_map)) => {
                let mut items = HashMap::new();
                loop {
                    let len = decode_seq_len(input)?;
                    if len == 0 {
                        break;
                    }
                    items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                    for _ in 0..len {
                        let key = decode_string(input)?;
                        let value = self.resolve(
                            &writer_map.types,
                            writer_namespace,
                            &reader_map.types,
                            reader_namespace,
                            input,
                        )?;
                        items.insert(key, value);
                    }
                }
                Ok(Value::Map(items))
            }
            (Schema::Record(writer_record), Schema::Record(reader_record)) => {
                check_names(&writer_record.name, reader_schema)?;
                self.resolve_record(
                    writer_record,
                    writer_namespace,
                    reader_record,
                    reader_namespace,
                    input,
                )
            }
            _ => Err(Details::ResolveTypeMismatch {
                writer: SchemaKind::from(writer),
                reader: SchemaKind::from(reader_schema),
            }
            .into()),
        }
    }

    fn resolve_fixed<R: Read>(
        &self,
        writer_fixed: &FixedSchema,
        reader_fixed: &FixedSchema,
        reader_schema: &Schema,
        input: &mut R,
    ) -> AvroResult<Value> {
        check_names(&writer_fixed.name, reader_schema)?;
        if writer_fixed.size != reader_fixed.size {
            return Err(Details::ResolveFixedSize {
                writer: writer_fixed.size,
                reader: reader_fixed.size,
            }
            .into());
        }
        let size = writer_fixed.size;
        let bytes = read_exact_vec(input, size).map_err(|e| Details::ReadFixed(e, size))?;
        Ok(Value::Fixed(size, bytes))
    }

    fn resolve_record<R: Read>(
        &self,
        writer_record: &RecordSchema,
        writer_namespace: NamespaceRef,
        reader_record: &RecordSchema,
        reader_namespace: NamespaceRef,
        input: &mut R,
    ) -> AvroResult<Value> {
        let writer_namespace = writer_record.name.namespace().or(writer_namespace);
        let reader_namespace = reader_record.name.namespace().or(reader_namespace);

        // For every writer field, the position of the reader field it is read into. The first
        // reader field matching a writer field keeps it.
        let mut targets: Vec<Option<usize>> = vec![None; writer_record.fields.len()];
        for (reader_position, reader_field) in reader_record.fields.iter().enumerate() {
            if let Some(writer_position) = find_writer_field(reader_field, &writer_record.fields) {
                let target = &mut targets[writer_position];
                if target.is_none() {
                    *target = Some(reader_position);
                } else {
                    debug!(
                        "Field '{}' of '{}' is already read into another field, '{}' takes its default",
                        writer_record.fields[writer_position].name,
                        writer_record.name,
                        reader_field.name
                    );
                }
            }
        }

        let mut values: Vec<Option<Value>> = vec![None; reader_record.fields.len()];
        for (writer_field, target) in writer_record.fields.iter().zip(targets) {
            match target {
                Some(reader_position) => {
                    let reader_field = &reader_record.fields[reader_position];
                    values[reader_position] = Some(self.resolve(
                        &writer_field.schema,
                        writer_namespace,
                        &reader_field.schema,
                        reader_namespace,
                        input,
                    )?);
                }
                None => {
                    debug!(
                        "Skipping field '{}' of '{}', it is unknown to the reader",
                        writer_field.name, writer_record.name
                    );
                    skip_internal(&writer_field.schema, self.writer_names, writer_namespace, input)?;
                }
            }
        }

        let mut fields = Vec::with_capacity(reader_record.fields.len());
        for (reader_field, value) in reader_record.fields.iter().zip(values) {
            let value = match value {
                Some(value) => value,
                None => {
                    let default = reader_field.default.as_ref().ok_or_else(|| {
                        Details::MissingDefault {
                            field: reader_field.name.clone(),
                            record: reader_record.name.clone(),
                        }
                    })?;
                    Value::from_default(
                        default,
                        &reader_field.schema,
                        self.reader_names,
                        reader_namespace,
                    )?
                }
            };
            fields.push((reader_field.name.clone(), value));
        }
        Ok(Value::Record(fields))
    }

    /// Pick the reader branch a writer value is read into: the first exact match, else the first
    /// branch the writer's type can be promoted to.
    fn select_branch<'u>(
        &self,
        writer: &Schema,
        writer_namespace: NamespaceRef,
        reader_union: &'u UnionSchema,
        reader_namespace: NamespaceRef,
    ) -> AvroResult<(usize, &'u Schema)> {
        let writer = match writer {
            Schema::Ref { name } => lookup_ref(self.writer_names, name, writer_namespace)?,
            _ => writer,
        };
        for exact in [true, false] {
            for (index, branch) in reader_union.variants().iter().enumerate() {
                let candidate = match branch {
                    Schema::Ref { name } => lookup_ref(self.reader_names, name, reader_namespace)?,
                    _ => branch,
                };
                if branch_matches(writer, candidate, exact) {
                    return Ok((index, branch));
                }
            }
        }
        Err(Details::NoMatchingBranch {
            writer: SchemaKind::from(writer),
            reader: reader_union.clone(),
        }
        .into())
    }
}

fn resolve_enum<R: Read>(
    writer_enum: &EnumSchema,
    reader_enum: &EnumSchema,
    input: &mut R,
) -> AvroResult<Value> {
    let index = zag_i64(input)?;
    let symbol = usize::try_from(index)
        .ok()
        .and_then(|i| writer_enum.symbols.get(i))
        .ok_or(Details::GetEnumValue {
            index,
            num_symbols: writer_enum.symbols.len(),
        })?;

    let symbol = if reader_enum.symbols.contains(symbol) {
        symbol
    } else if let Some(default) = &reader_enum.default {
        debug!("Symbol '{symbol}' is unknown to '{}', using '{default}'", reader_enum.name);
        default
    } else {
        return Err(Details::UnknownSymbol {
            symbol: symbol.clone(),
            symbols: reader_enum.symbols.clone(),
        }
        .into());
    };

    // The reader's default is guaranteed to be one of its symbols at parse time.
    let position = reader_enum
        .symbols
        .iter()
        .position(|s| s == symbol)
        .ok_or_else(|| Details::GetEnumSymbol(symbol.clone()))?;
    Ok(Value::Enum(position as u32, symbol.clone()))
}

/// The writer field a reader field is read from: matched by name first, then by the reader's
/// aliases. Writer aliases play no part.
pub(crate) fn find_writer_field(reader_field: &RecordField, writer_fields: &[RecordField]) -> Option<usize> {
    once(&reader_field.name)
        .chain(reader_field.aliases.iter().flatten())
        .find_map(|name| writer_fields.iter().position(|wf| &wf.name == name))
}

/// Named types agree when their unqualified names match, or when the writer's name is one of the
/// reader's aliases.
pub(crate) fn names_agree(writer_name: &Name, reader_schema: &Schema) -> bool {
    reader_schema
        .name()
        .is_some_and(|reader_name| reader_name.name() == writer_name.name())
        || reader_schema.aliases().is_some_and(|aliases| {
            aliases
                .iter()
                .any(|alias| alias.name() == writer_name.name())
        })
}

fn check_names(writer_name: &Name, reader_schema: &Schema) -> AvroResult<()> {
    if names_agree(writer_name, reader_schema) {
        Ok(())
    } else {
        Err(Details::ResolveNameMismatch {
            writer: writer_name.clone(),
            reader: reader_schema
                .name()
                .cloned()
                .unwrap_or_else(|| writer_name.clone()),
        }
        .into())
    }
}

fn branch_matches(writer: &Schema, reader_branch: &Schema, exact: bool) -> bool {
    match (writer, reader_branch) {
        (Schema::Null, Schema::Null)
        | (Schema::Boolean, Schema::Boolean)
        | (Schema::Int, Schema::Int)
        | (Schema::Long, Schema::Long)
        | (Schema::Float, Schema::Float)
        | (Schema::Double, Schema::Double)
        | (Schema::Bytes, Schema::Bytes)
        | (Schema::String, Schema::String)
        | (Schema::Array(_), Schema::Array(_))
        | (Schema::Map(_), Schema::Map(_)) => true,
        (Schema::Record(RecordSchema { name, .. }), Schema::Record(_))
        | (Schema::Enum(EnumSchema { name, .. }), Schema::Enum(_))
        | (Schema::Fixed(FixedSchema { name, .. }), Schema::Fixed(_)) => {
            names_agree(name, reader_branch)
        }
        (Schema::Int, Schema::Long | Schema::Float | Schema::Double)
        | (Schema::Long, Schema::Float | Schema::Double)
        | (Schema::Float, Schema::Double)
        | (Schema::String, Schema::Bytes)
        | (Schema::Bytes, Schema::String) => !exact,
        _ => false,
    }
}
