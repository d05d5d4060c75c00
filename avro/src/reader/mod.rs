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

//! Logic handling reading from Avro format at user level.
use crate::{
    AvroResult,
    decode::decode_internal,
    error::Details,
    resolution::Resolver,
    schema::{ResolvedSchema, Schema},
    types::Value,
};
use bon::bon;
use std::io::Read;

/// What to do with bytes left in the buffer after a datum has been read.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TrailingBytesMode {
    /// Leftover bytes are an error.
    #[default]
    Strict,
    /// Leftover bytes are ignored; the caller gets the position the datum ended at.
    Permissive,
}

/// Reads single datums written with a known writer schema, optionally resolving them to a
/// reader schema.
///
/// Names are resolved once when the reader is built, so a `DatumReader` can be reused for many
/// buffers and shared between threads.
///
/// ```
/// # use avro_codec::{DatumReader, Schema, TrailingBytesMode, types::Value};
/// let writer = Schema::parse_str(r#""int""#)?;
/// let reader = Schema::parse_str(r#""long""#)?;
/// let datum_reader = DatumReader::builder(&writer)
///     .reader_schema(&reader)
///     .trailing_bytes(TrailingBytesMode::Permissive)
///     .build()?;
/// assert_eq!(datum_reader.read(&[0x54, 0xFF])?, (Value::Long(42), 1));
/// # Ok::<(), avro_codec::Error>(())
/// ```
#[derive(Debug)]
pub struct DatumReader<'a> {
    writer_schema: &'a Schema,
    writer_resolved: ResolvedSchema<'a>,
    reader: Option<(&'a Schema, ResolvedSchema<'a>)>,
    trailing_bytes: TrailingBytesMode,
}

#[bon]
impl<'a> DatumReader<'a> {
    /// Creates a `DatumReader` for data written with `writer_schema`.
    ///
    /// `writer_schemata` and `reader_schemata` supply the definitions of names the schemas refer
    /// to but do not define; when given they must contain the schema itself.
    #[builder(finish_fn = build)]
    pub fn builder(
        #[builder(start_fn)] writer_schema: &'a Schema,
        writer_schemata: Option<Vec<&'a Schema>>,
        reader_schema: Option<&'a Schema>,
        reader_schemata: Option<Vec<&'a Schema>>,
        #[builder(default)] trailing_bytes: TrailingBytesMode,
    ) -> AvroResult<DatumReader<'a>> {
        let writer_resolved = match writer_schemata {
            Some(schemata) => ResolvedSchema::try_from(schemata)?,
            None => ResolvedSchema::try_from(writer_schema)?,
        };
        let reader = match (reader_schema, reader_schemata) {
            (Some(schema), Some(schemata)) => Some((schema, ResolvedSchema::try_from(schemata)?)),
            (Some(schema), None) => Some((schema, ResolvedSchema::try_from(schema)?)),
            (None, _) => None,
        };
        Ok(DatumReader {
            writer_schema,
            writer_resolved,
            reader,
            trailing_bytes,
        })
    }
}

impl<'a> DatumReader<'a> {
    /// The schema the data was written with.
    pub fn writer_schema(&self) -> &'a Schema {
        self.writer_schema
    }

    /// The schema values are resolved to, if any.
    pub fn reader_schema(&self) -> Option<&'a Schema> {
        self.reader.as_ref().map(|(schema, _)| *schema)
    }

    /// Decode one datum from the start of `bytes`.
    ///
    /// Returns the value and the position right after the datum. In
    /// [`TrailingBytesMode::Strict`] the datum must span the whole buffer.
    pub fn read(&self, bytes: &[u8]) -> AvroResult<(Value, usize)> {
        let mut input = bytes;
        let value = self.read_from(&mut input)?;
        let position = bytes.len() - input.len();
        if self.trailing_bytes == TrailingBytesMode::Strict && !input.is_empty() {
            return Err(Details::TrailingBytes {
                position,
                remaining: input.len(),
            }
            .into());
        }
        Ok((value, position))
    }

    /// Decode one datum from `reader`, leaving whatever follows it unread.
    pub fn read_from<R: Read>(&self, reader: &mut R) -> AvroResult<Value> {
        let writer_names = self.writer_resolved.get_names();
        match &self.reader {
            Some((reader_schema, reader_resolved)) => {
                Resolver::new(writer_names, reader_resolved.get_names()).resolve(
                    self.writer_schema,
                    None,
                    reader_schema,
                    None,
                    reader,
                )
            }
            None => decode_internal(self.writer_schema, writer_names, None, reader),
        }
    }
}

/// Decode a `Value` encoded in Avro format given its `Schema` and anything implementing `io::Read`
/// to read from.
///
/// In case a reader `Schema` is provided, schema resolution will also be performed.
///
/// Only the bytes of one datum are consumed; anything after it stays in `reader`.
pub fn from_avro_datum<R: Read>(
    writer_schema: &Schema,
    reader: &mut R,
    reader_schema: Option<&Schema>,
) -> AvroResult<Value> {
    DatumReader::builder(writer_schema)
        .maybe_reader_schema(reader_schema)
        .build()?
        .read_from(reader)
}

/// Decode a `Value` from raw Avro data.
///
/// If the writer schema is incomplete, i.e. contains `Schema::Ref`s then it will use the provided
/// schemata to resolve any dependencies.
///
/// When a reader `Schema` is provided, schema resolution will also be performed.
pub fn from_avro_datum_schemata<R: Read>(
    writer_schema: &Schema,
    writer_schemata: Vec<&Schema>,
    reader: &mut R,
    reader_schema: Option<&Schema>,
) -> AvroResult<Value> {
    from_avro_datum_reader_schemata(
        writer_schema,
        writer_schemata,
        reader,
        reader_schema,
        Vec::with_capacity(0),
    )
}

/// Decode a `Value` from raw Avro data.
///
/// If the writer schema is incomplete, i.e. contains `Schema::Ref`s then it will use the provided
/// schemata to resolve any dependencies. The same goes for the reader schema and
/// `reader_schemata`.
///
/// When a reader `Schema` is provided, schema resolution will also be performed.
pub fn from_avro_datum_reader_schemata<R: Read>(
    writer_schema: &Schema,
    writer_schemata: Vec<&Schema>,
    reader: &mut R,
    reader_schema: Option<&Schema>,
    reader_schemata: Vec<&Schema>,
) -> AvroResult<Value> {
    DatumReader::builder(writer_schema)
        .maybe_writer_schemata(non_empty(writer_schemata))
        .maybe_reader_schema(reader_schema)
        .maybe_reader_schemata(non_empty(reader_schemata))
        .build()?
        .read_from(reader)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}
