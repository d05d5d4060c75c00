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
    AvroResult,
    decode::decode_len,
    error::Details,
    schema::{EnumSchema, FixedSchema, Name, NamespaceRef, RecordSchema, Schema, lookup_ref},
    util::{safe_len, zag_i32, zag_i64},
};
use std::{
    borrow::Borrow,
    collections::HashMap,
    io::{self, ErrorKind, Read},
};

fn skip_bytes<R: Read>(reader: &mut R, len: usize) -> io::Result<()> {
    let skipped = io::copy(&mut reader.take(len as u64), &mut io::sink())?;
    if skipped < len as u64 {
        return Err(ErrorKind::UnexpectedEof.into());
    }
    Ok(())
}

/// Move the reader past a datum of `schema` without building a value.
///
/// Blocks that carry their size in bytes are jumped over in one go.
pub(crate) fn skip_internal<R: Read, S: Borrow<Schema>>(
    schema: &Schema,
    names: &HashMap<Name, S>,
    enclosing_namespace: NamespaceRef,
    reader: &mut R,
) -> AvroResult<()> {
    match schema {
        Schema::Null => Ok(()),
        Schema::Boolean => {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf[..])
                .map_err(Details::ReadBoolean)?;
            match buf[0] {
                0u8 | 1u8 => Ok(()),
                other => Err(Details::BoolValue(other).into()),
            }
        }
        Schema::Int => zag_i32(reader).map(|_| ()),
        Schema::Long => zag_i64(reader).map(|_| ()),
        Schema::Enum(EnumSchema { symbols, .. }) => {
            let index = zag_i64(reader)?;
            if usize::try_from(index).is_ok_and(|i| i < symbols.len()) {
                Ok(())
            } else {
                Err(Details::GetEnumValue {
                    index,
                    num_symbols: symbols.len(),
                }
                .into())
            }
        }
        Schema::Float => skip_bytes(reader, 4).map_err(|e| Details::ReadFloat(e).into()),
        Schema::Double => skip_bytes(reader, 8).map_err(|e| Details::ReadDouble(e).into()),
        Schema::Bytes => {
            let len = decode_len(reader)?;
            skip_bytes(reader, len).map_err(|e| Details::ReadBytes(e).into())
        }
        Schema::String => {
            let len = decode_len(reader)?;
            skip_bytes(reader, len).map_err(|e| Details::ReadString(e).into())
        }
        Schema::Fixed(FixedSchema { size, .. }) => {
            skip_bytes(reader, *size).map_err(|e| Details::ReadFixed(e, *size).into())
        }
        Schema::Array(inner) => skip_blocks(reader, |reader| {
            skip_internal(&inner.items, names, enclosing_namespace, reader)
        }),
        Schema::Map(inner) => skip_blocks(reader, |reader| {
            let len = decode_len(reader)?;
            skip_bytes(reader, len).map_err(Details::ReadString)?;
            skip_internal(&inner.types, names, enclosing_namespace, reader)
        }),
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
            skip_internal(variant, names, enclosing_namespace, reader)
        }
        Schema::Record(RecordSchema { name, fields, .. }) => {
            let record_namespace = name.namespace().or(enclosing_namespace);
            for field in fields {
                skip_internal(&field.schema, names, record_namespace, reader)?;
            }
            Ok(())
        }
        Schema::Ref { name } => {
            let resolved = lookup_ref(names, name, enclosing_namespace)?;
            skip_internal(resolved, names, enclosing_namespace, reader)
        }
    }
}

fn skip_blocks<R, F>(reader: &mut R, mut skip_item: F) -> AvroResult<()>
where
    R: Read,
    F: FnMut(&mut R) -> AvroResult<()>,
{
    loop {
        let count = zag_i64(reader)?;
        if count == 0 {
            return Ok(());
        }
        if count < 0 {
            let size = decode_len(reader)?;
            skip_bytes(reader, size).map_err(Details::ReadBytes)?;
            continue;
        }
        let count =
            safe_len(usize::try_from(count).map_err(|e| Details::ConvertI64ToUsize(e, count))?)?;
        for _ in 0..count {
            skip_item(reader)?;
        }
    }
}
