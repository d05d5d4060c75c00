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

//! Decoding of binary Avro data into [`Value`]s.

mod skip;

pub(crate) use skip::skip_internal;

use crate::{
    AvroResult,
    error::Details,
    schema::{
        EnumSchema, FixedSchema, Name, NamespaceRef, RecordSchema, ResolvedSchema, Schema,
        lookup_ref,
    },
    types::Value,
    util::{safe_len, zag_i32, zag_i64},
};
use std::{
    borrow::Borrow,
    collections::HashMap,
    io::{self, ErrorKind, Read},
};

// upper bound for preallocating the items of a block, the count comes from untrusted input
pub(crate) const MAX_PREALLOCATED_ITEMS: usize = 1024;

#[inline]
pub(crate) fn decode_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let len = zag_i64(reader)?;
    safe_len(usize::try_from(len).map_err(|e| Details::ConvertI64ToUsize(e, len))?)
}

/// Decode the item count of the next block of an array or map.
///
/// A count of 0 ends the sequence. A negative count is followed by the size of the block in
/// bytes, which is not needed to read the items.
pub(crate) fn decode_seq_len<R: Read>(reader: &mut R) -> AvroResult<usize> {
    let raw_len = zag_i64(reader)?;
    safe_len(
        usize::try_from(match raw_len.cmp(&0) {
            std::cmp::Ordering::Equal => return Ok(0),
            std::cmp::Ordering::Less => {
                let _size = zag_i64(reader)?;
                raw_len.checked_neg().ok_or(Details::IntegerOverflow)?
            }
            std::cmp::Ordering::Greater => raw_len,
        })
        .map_err(|e| Details::ConvertI64ToUsize(e, raw_len))?,
    )
}

/// Read exactly `len` bytes, growing the buffer only as data arrives.
pub(crate) fn read_exact_vec<R: Read>(reader: &mut R, len: usize) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(len.min(8 * 1024));
    reader.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() < len {
        return Err(ErrorKind::UnexpectedEof.into());
    }
    Ok(buf)
}

pub(crate) fn decode_bytes<R: Read>(reader: &mut R) -> AvroResult<Vec<u8>> {
    let len = decode_len(reader)?;
    read_exact_vec(reader, len).map_err(|e| Details::ReadBytes(e).into())
}

pub(crate) fn decode_string<R: Read>(reader: &mut R) -> AvroResult<String> {
    let len = decode_len(reader)?;
    let buf = read_exact_vec(reader, len).map_err(Details::ReadString)?;
    String::from_utf8(buf).map_err(|e| Details::ConvertToUtf8(e).into())
}

pub(crate) fn decode_float<R: Read>(reader: &mut R) -> AvroResult<f32> {
    let mut buf = [0u8; std::mem::size_of::<f32>()];
    reader
        .read_exact(&mut buf[..])
        .map_err(Details::ReadFloat)?;
    Ok(f32::from_le_bytes(buf))
}

pub(crate) fn decode_double<R: Read>(reader: &mut R) -> AvroResult<f64> {
    let mut buf = [0u8; std::mem::size_of::<f64>()];
    reader
        .read_exact(&mut buf[..])
        .map_err(Details::ReadDouble)?;
    Ok(f64::from_le_bytes(buf))
}

/// Decode a `Value` from avro format given its `Schema`.
pub fn decode<R: Read>(schema: &Schema, reader: &mut R) -> AvroResult<Value> {
    let rs = ResolvedSchema::try_from(schema)?;
    decode_internal(schema, rs.get_names(), None, reader)
}

pub(crate) fn decode_internal<R: Read, S: Borrow<Schema>>(
    schema: &Schema,
    names: &HashMap<Name, S>,
    enclosing_namespace: NamespaceRef,
    reader: &mut R,
) -> AvroResult<Value> {
    match schema {
        Schema::Null => Ok(Value::Null),
        Schema::Boolean => {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadBoolean)?;
            match buf[0] {
                0u8 => Ok(Value::Boolean(false)),
                1u8 => Ok(Value::Boolean(true)),
                _ => Err(Details::BoolValue(buf[0]).into()),
            }
        }
        Schema::Int => zag_i32(reader).map(Value::Int),
        Schema::Long => zag_i64(reader).map(Value::Long),
        Schema::Float => decode_float(reader).map(Value::Float),
        Schema::Double => decode_double(reader).map(Value::Double),
        Schema::Bytes => decode_bytes(reader).map(Value::Bytes),
        Schema::String => decode_string(reader).map(Value::String),
        Schema::Fixed(FixedSchema { size, .. }) => {
            let buf = read_exact_vec(reader, *size).map_err(|e| Details::ReadFixed(e, *size))?;
            Ok(Value::Fixed(*size, buf))
        }
        Schema::Array(inner) => {
            let mut items = Vec::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                for _ in 0..len {
                    items.push(decode_internal(
                        &inner.items,
                        names,
                        enclosing_namespace,
                        reader,
                    )?);
                }
            }

            Ok(Value::Array(items))
        }
        Schema::Map(inner) => {
            let mut items = HashMap::new();

            loop {
                let len = decode_seq_len(reader)?;
                if len == 0 {
                    break;
                }

                items.reserve(len.min(MAX_PREALLOCATED_ITEMS));
                for _ in 0..len {
                    let key = decode_string(reader)?;
                    let value = decode_internal(&inner.types, names, enclosing_namespace, reader)?;
                    items.insert(key, value);
                }
            }

            Ok(Value::Map(items))
        }
        Schema::Union(inner) => {
            let index = zag_i64(reader)?;
            let variants = inner.variants();
            let variant = usize::try_from(index)
                .ok()
                .and_then(|i| variants.get(i))
                .ok_or(Details::GetUnionVariant {
                    index,
                    num_variants: variants.len(),
                })?;
            let value = decode_internal(variant, names, enclosing_namespace, reader)?;
            Ok(Value::Union(index as u32, Box::new(value)))
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let record_namespace = name.namespace().or(enclosing_namespace);
            let mut items = Vec::with_capacity(fields.len());
            for field in fields {
                items.push((
                    field.name.clone(),
                    decode_internal(&field.schema, names, record_namespace, reader)?,
                ));
            }
            Ok(Value::Record(items))
        }
        Schema::Enum(EnumSchema { symbols, .. }) => {
            let index = zag_i64(reader)?;
            let symbol = usize::try_from(index)
                .ok()
                .and_then(|i| symbols.get(i))
                .ok_or(Details::GetEnumValue {
                    index,
                    num_symbols: symbols.len(),
                })?;
            Ok(Value::Enum(index as u32, symbol.clone()))
        }
        Schema::Ref { name } => {
            let resolved = lookup_ref(names, name, enclosing_namespace)?;
            decode_internal(resolved, names, enclosing_namespace, reader)
        }
    }
}
