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

//! Schema-driven encoding and decoding of single datums in the
//! **[Apache Avro](https://avro.apache.org/)** binary format.
//!
//! A [`Schema`] is parsed from its JSON description. Data is handled through the generic
//! [`Value`](types::Value) type: [`to_avro_datum`] validates a value against a schema and encodes
//! it, [`from_avro_datum`] decodes it back. A datum carries no framing, no header and no schema;
//! the reader has to know the schema it was written with.
//!
//! ```
//! # use avro_codec::{Schema, from_avro_datum, to_avro_datum, types::{Record, Value}};
//! let schema = Schema::parse_str(r#"
//!     {"type": "record", "name": "User", "fields": [
//!         {"name": "name", "type": "string"},
//!         {"name": "age", "type": ["null", "int"]}
//!     ]}
//! "#)?;
//!
//! let mut user = Record::new(&schema).unwrap();
//! user.put("name", "Ann");
//! user.put("age", Some(41));
//!
//! let bytes = to_avro_datum(&schema, user)?;
//! assert_eq!(bytes, [6, b'A', b'n', b'n', 2, 82]);
//! let value = from_avro_datum(&schema, &mut &bytes[..], None)?;
//! assert!(matches!(value, Value::Record(_)));
//! # Ok::<(), avro_codec::Error>(())
//! ```
//!
//! # Schema resolution
//!
//! Data written with one schema can be read as values of another, as long as the two can be
//! resolved: numbers are promoted, fields are matched by name or alias, missing fields take their
//! defaults. Pass the reader's schema to [`from_avro_datum`] or use [`decode_with_resolution`].
//! [`schema_compatibility`] tells ahead of time whether two schemas can be resolved.
//!
//! # MSRV
//!
//! The current MSRV is 1.88.0.
//!
//! The MSRV may be bumped in minor releases.

mod decode;
mod encode;
mod reader;
mod resolution;
mod writer;

pub mod error;
pub mod schema;
pub mod schema_compatibility;
pub mod schema_equality;
pub mod types;
pub mod util;
pub mod validator;

pub use decode::decode;
pub use encode::{encode, encode_to_vec};
pub use error::{Details, Error, ErrorKind};
pub use reader::{
    DatumReader, TrailingBytesMode, from_avro_datum, from_avro_datum_reader_schemata,
    from_avro_datum_schemata,
};
pub use resolution::decode_with_resolution;
pub use schema::Schema;
pub use writer::{to_avro_datum, to_avro_datum_schemata, write_avro_datum};

/// A convenience type alias for `Result`s with `Error`s.
pub type AvroResult<T> = Result<T, Error>;
