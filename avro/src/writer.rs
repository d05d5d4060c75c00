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

//! Logic handling writing in Avro format at user level.
use crate::{
    AvroResult,
    encode::encode_internal,
    error::Details,
    schema::{ResolvedSchema, Schema},
    types::Value,
};
use std::io::Write;

/// Encode a value into raw Avro data, also performs schema validation.
///
/// The output is a single datum: no header, no schema and no framing.
pub fn to_avro_datum<T: Into<Value>>(schema: &Schema, value: T) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_avro_datum(schema, value, &mut buffer)?;
    Ok(buffer)
}

/// Encode a value into raw Avro data, also performs schema validation.
///
/// `schemata` must contain `schema` and every schema it references, typically the result of
/// [`Schema::parse_list`].
pub fn to_avro_datum_schemata<T: Into<Value>>(
    schema: &Schema,
    schemata: Vec<&Schema>,
    value: T,
) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_avro_datum_schemata(schema, schemata, value, &mut buffer)?;
    Ok(buffer)
}

/// Write a value in raw Avro format to `writer`, also performs schema validation.
///
/// Returns the number of bytes written.
pub fn write_avro_datum<T: Into<Value>, W: Write>(
    schema: &Schema,
    value: T,
    writer: &mut W,
) -> AvroResult<usize> {
    write_avro_datum_schemata(schema, vec![schema], value, writer)
}

fn write_avro_datum_schemata<T: Into<Value>, W: Write>(
    schema: &Schema,
    schemata: Vec<&Schema>,
    value: T,
    writer: &mut W,
) -> AvroResult<usize> {
    let avro = value.into();
    let rs = ResolvedSchema::try_from(schemata)?;
    let names = rs.get_names();
    let enclosing_namespace = schema.namespace();
    if let Some(reason) = avro.validate_internal(schema, names, enclosing_namespace) {
        return Err(Details::ValidationWithReason {
            value: avro,
            schema: schema.clone(),
            reason,
        }
        .into());
    }
    encode_internal(&avro, schema, names, enclosing_namespace, writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, types::Record};
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"
    {
      "type": "record",
      "name": "test",
      "fields": [
        {
          "name": "a",
          "type": "long",
          "default": 42
        },
        {
          "name": "b",
          "type": "string"
        }
      ]
    }
    "#;

    #[test]
    fn to_avro_datum_record() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let mut record = Record::new(&schema).ok_or("not a record")?;
        record.put("a", 27i64);
        record.put("b", "foo");

        let mut expected = Vec::new();
        crate::util::zig_i64(27, &mut expected)?;
        crate::util::zig_i64(3, &mut expected)?;
        expected.extend([b'f', b'o', b'o']);

        assert_eq!(to_avro_datum(&schema, record)?, expected);
        Ok(())
    }

    #[test]
    fn to_avro_datum_validates() -> TestResult {
        let schema = Schema::parse_str(SCHEMA)?;
        let mut record = Record::new(&schema).ok_or("not a record")?;
        record.put("a", 27i32);
        record.put("b", "foo");

        let err = to_avro_datum(&schema, record).unwrap_err();
        assert!(matches!(err.details(), Details::ValidationWithReason { .. }));
        assert_eq!(err.kind(), ErrorKind::Encode);
        Ok(())
    }

    #[test]
    fn to_avro_datum_with_optional() -> TestResult {
        let schema = Schema::parse_str(r#"["null", "string"]"#)?;
        assert_eq!(to_avro_datum(&schema, Some("ab"))?, [2u8, 4, b'a', b'b']);
        assert_eq!(to_avro_datum(&schema, None::<String>)?, [0u8]);
        Ok(())
    }

    #[test]
    fn to_avro_datum_schemata_resolves_references() -> TestResult {
        let schemata = Schema::parse_list([
            r#"{"type": "record", "name": "A", "fields": [{"name": "b", "type": "B"}]}"#,
            r#"{"type": "enum", "name": "B", "symbols": ["X", "Y"]}"#,
        ])?;
        let value = Value::Record(vec![("b".to_string(), Value::Enum(1, "Y".to_string()))]);

        assert!(to_avro_datum(&schemata[0], value.clone()).is_err());
        assert_eq!(
            to_avro_datum_schemata(&schemata[0], schemata.iter().collect(), value)?,
            [2u8]
        );
        Ok(())
    }

    #[test]
    fn write_avro_datum_counts_bytes() -> TestResult {
        let schema = Schema::array(Schema::Int);
        let mut buffer = Vec::new();
        let written = write_avro_datum(
            &schema,
            Value::Array(vec![Value::Int(1), Value::Int(-1)]),
            &mut buffer,
        )?;
        assert_eq!(written, 4);
        assert_eq!(buffer, [4u8, 2, 1, 0]);
        Ok(())
    }
}
