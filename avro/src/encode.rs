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
    error::Details,
    schema::{
        EnumSchema, FixedSchema, Name, NamespaceRef, RecordSchema, ResolvedSchema, Schema,
        SchemaKind, lookup_ref,
    },
    types::{Value, ValueKind},
    util::{zig_i32, zig_i64},
};
use std::{borrow::Borrow, collections::HashMap, io::Write};

/// Encode a `Value` into avro format.
///
/// The schema drives the encoding: every node of `value` must have the shape the schema
/// asks for, otherwise an error is returned. Besides the exact shapes, a `Value::String`
/// is accepted for an enum, a `Value::Bytes` for a fixed and a non-`Union` value for a union,
/// in which case the first branch it is valid for is written.
///
/// Returns the number of bytes written.
pub fn encode<W: Write>(value: &Value, schema: &Schema, writer: &mut W) -> AvroResult<usize> {
    let rs = ResolvedSchema::try_from(schema)?;
    encode_internal(value, schema, rs.get_names(), None, writer)
}

/// Encode a `Value` into a new buffer, see [`encode`].
pub fn encode_to_vec(value: &Value, schema: &Schema) -> AvroResult<Vec<u8>> {
    let mut buffer = Vec::new();
    encode(value, schema, &mut buffer)?;
    Ok(buffer)
}

pub(crate) fn encode_bytes<B: AsRef<[u8]> + ?Sized, W: Write>(
    s: &B,
    mut writer: W,
) -> AvroResult<usize> {
    let bytes = s.as_ref();
    let written = encode_long(bytes.len() as i64, &mut writer)?;
    write_raw(bytes, writer).map(|n| written + n)
}

pub(crate) fn encode_long<W: Write>(i: i64, writer: W) -> AvroResult<usize> {
    zig_i64(i, writer)
}

pub(crate) fn encode_int<W: Write>(i: i32, writer: W) -> AvroResult<usize> {
    zig_i32(i, writer)
}

fn write_raw<W: Write>(bytes: &[u8], mut writer: W) -> AvroResult<usize> {
    writer.write_all(bytes).map_err(Details::WriteBytes)?;
    Ok(bytes.len())
}

pub(crate) fn encode_internal<W: Write, S: Borrow<Schema>>(
    value: &Value,
    schema: &Schema,
    names: &HashMap<Name, S>,
    enclosing_namespace: NamespaceRef,
    writer: &mut W,
) -> AvroResult<usize> {
    match (schema, value) {
        (Schema::Ref { name }, _) => {
            let resolved = lookup_ref(names, name, enclosing_namespace)?;
            encode_internal(value, resolved, names, enclosing_namespace, writer)
        }
        (Schema::Null, Value::Null) => Ok(0),
        (Schema::Boolean, Value::Boolean(b)) => write_raw(&[u8::from(*b)], writer),
        (Schema::Int, Value::Int(i)) => encode_int(*i, writer),
        (Schema::Long, Value::Long(i)) => encode_long(*i, writer),
        (Schema::Float, Value::Float(x)) => write_raw(&x.to_le_bytes(), writer),
        (Schema::Double, Value::Double(x)) => write_raw(&x.to_le_bytes(), writer),
        (Schema::Bytes, Value::Bytes(bytes)) => encode_bytes(bytes, writer),
        (Schema::String, Value::String(s)) => encode_bytes(s, writer),
        (Schema::Fixed(FixedSchema { size, .. }), Value::Fixed(n, _)) if n != size => {
            Err(Details::CompareFixedSizes { size: *size, n: *n }.into())
        }
        (Schema::Fixed(FixedSchema { size, .. }), Value::Fixed(_, bytes) | Value::Bytes(bytes)) => {
            if bytes.len() != *size {
                return Err(Details::CompareFixedSizes {
                    size: *size,
                    n: bytes.len(),
                }
                .into());
            }
            write_raw(bytes, writer)
        }
        (Schema::Enum(EnumSchema { symbols, .. }), Value::Enum(index, symbol)) => {
            match symbols.get(*index as usize) {
                Some(expected) if expected == symbol => encode_long(*index as i64, writer),
                Some(expected) => Err(Details::EnumSymbolMismatch {
                    index: *index,
                    symbol: symbol.clone(),
                    expected: expected.clone(),
                }
                .into()),
                None => Err(Details::EncodeEnumIndex {
                    index: *index,
                    num_symbols: symbols.len(),
                }
                .into()),
            }
        }
        (Schema::Enum(EnumSchema { symbols, .. }), Value::String(symbol)) => {
            match symbols.iter().position(|item| item == symbol) {
                Some(index) => encode_long(index as i64, writer),
                None => Err(Details::GetEnumSymbol(symbol.clone()).into()),
            }
        }
        (Schema::Union(union), Value::Union(index, item)) => {
            let branch = union.variants().get(*index as usize).ok_or(
                Details::EncodeUnionIndex {
                    index: *index,
                    num_variants: union.variants().len(),
                },
            )?;
            let written = encode_long(*index as i64, &mut *writer)?;
            Ok(written + encode_internal(item, branch, names, enclosing_namespace, writer)?)
        }
        (Schema::Union(union), _) => {
            let (index, branch) = union
                .find_schema_with_known_schemata(value, names, enclosing_namespace)
                .ok_or_else(|| Details::FindUnionVariant {
                    schema: union.clone(),
                    value: value.clone(),
                })?;
            let written = encode_long(index as i64, &mut *writer)?;
            Ok(written + encode_internal(value, branch, names, enclosing_namespace, writer)?)
        }
        (Schema::Array(inner), Value::Array(items)) => {
            let mut written = 0;
            if !items.is_empty() {
                written += encode_long(items.len() as i64, &mut *writer)?;
                for item in items {
                    written +=
                        encode_internal(item, &inner.items, names, enclosing_namespace, writer)?;
                }
            }
            Ok(written + write_raw(&[0u8], writer)?)
        }
        (Schema::Map(inner), Value::Map(items)) => {
            let mut written = 0;
            if !items.is_empty() {
                written += encode_long(items.len() as i64, &mut *writer)?;
                // Sorted by key so equal maps give equal bytes.
                let mut entries = items.iter().collect::<Vec<_>>();
                entries.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
                for (key, value) in entries {
                    written += encode_bytes(key, &mut *writer)?;
                    written +=
                        encode_internal(value, &inner.types, names, enclosing_namespace, writer)?;
                }
            }
            Ok(written + write_raw(&[0u8], writer)?)
        }
        (
            Schema::Record(RecordSchema {
                name,
                fields: schema_fields,
                lookup,
                ..
            }),
            Value::Record(value_fields),
        ) => {
            if let Some((unknown, _)) = value_fields
                .iter()
                .find(|(field_name, _)| !lookup.contains_key(field_name))
            {
                let known = lookup.keys().map(String::as_str).collect::<Vec<_>>();
                return Err(
                    Details::NoEntryInLookupTable(unknown.clone(), format!("{known:?}")).into(),
                );
            }
            let record_namespace = name.namespace().or(enclosing_namespace);
            let mut written = 0;
            for schema_field in schema_fields {
                let Some((_, value)) = value_fields
                    .iter()
                    .find(|(name, _)| schema_field.is_known_as(name))
                else {
                    let present = value_fields
                        .iter()
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<_>>();
                    return Err(Details::NoEntryInLookupTable(
                        schema_field.name.clone(),
                        format!("{present:?}"),
                    )
                    .into());
                };
                written +=
                    encode_internal(value, &schema_field.schema, names, record_namespace, writer)?;
            }
            Ok(written)
        }
        _ => Err(Details::EncodeValueAsSchemaError {
            value_kind: ValueKind::from(value),
            supported_schema: vec![SchemaKind::from(schema)],
        }
        .into()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{ErrorKind, schema::UnionSchema};
    use apache_avro_test_helper::TestResult;
    use hex_literal::hex;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, &hex!("00"))]
    #[case(-1, &hex!("01"))]
    #[case(1, &hex!("02"))]
    #[case(-64, &hex!("7F"))]
    #[case(64, &hex!("8001"))]
    #[case(i32::MAX, &hex!("FEFFFFFF0F"))]
    #[case(i32::MIN, &hex!("FFFFFFFF0F"))]
    fn int_is_zigzag_varint(#[case] n: i32, #[case] expected: &[u8]) -> TestResult {
        assert_eq!(encode_to_vec(&Value::Int(n), &Schema::Int)?, expected);
        Ok(())
    }

    #[rstest]
    #[case(i64::MAX, &hex!("FEFFFFFFFFFFFFFFFF01"))]
    #[case(i64::MIN, &hex!("FFFFFFFFFFFFFFFFFF01"))]
    #[case(3, &hex!("06"))]
    fn long_is_zigzag_varint(#[case] n: i64, #[case] expected: &[u8]) -> TestResult {
        assert_eq!(encode_to_vec(&Value::Long(n), &Schema::Long)?, expected);
        Ok(())
    }

    #[test]
    fn scalars() -> TestResult {
        assert_eq!(encode_to_vec(&Value::Null, &Schema::Null)?, Vec::<u8>::new());
        assert_eq!(encode_to_vec(&Value::Boolean(true), &Schema::Boolean)?, [1u8]);
        assert_eq!(
            encode_to_vec(&Value::Float(1.0), &Schema::Float)?,
            hex!("0000803F")
        );
        assert_eq!(
            encode_to_vec(&Value::Double(-2.0), &Schema::Double)?,
            hex!("00000000000000C0")
        );
        assert_eq!(
            encode_to_vec(&Value::String("foo".to_string()), &Schema::String)?,
            hex!("06666F6F")
        );
        assert_eq!(
            encode_to_vec(&Value::Bytes(vec![0xAB]), &Schema::Bytes)?,
            hex!("02AB")
        );
        Ok(())
    }

    #[test]
    fn empty_array_and_map() -> TestResult {
        assert_eq!(
            encode_to_vec(&Value::Array(vec![]), &Schema::array(Schema::Int))?,
            [0u8]
        );
        assert_eq!(
            encode_to_vec(&Value::Map(HashMap::new()), &Schema::map(Schema::Int))?,
            [0u8]
        );
        Ok(())
    }

    #[test]
    fn array_is_one_block() -> TestResult {
        let value = Value::Array(vec![Value::Long(1), Value::Long(2), Value::Long(3)]);
        let mut buf = Vec::new();
        let written = encode(&value, &Schema::array(Schema::Long), &mut buf)?;
        assert_eq!(buf, hex!("0602040600"));
        assert_eq!(written, buf.len());
        Ok(())
    }

    #[test]
    fn map_entry() -> TestResult {
        let value = Value::Map(HashMap::from([("a".to_string(), Value::Int(1))]));
        assert_eq!(
            encode_to_vec(&value, &Schema::map(Schema::Int))?,
            hex!("0202610200")
        );
        Ok(())
    }

    #[test]
    fn equal_maps_give_equal_bytes() -> TestResult {
        let keys = ["k", "c", "x", "a", "q", "m", "z", "e"];
        let forward = Value::Map(
            keys.iter()
                .enumerate()
                .map(|(i, k)| (k.to_string(), Value::Int(i as i32)))
                .collect(),
        );
        let backward = Value::Map(
            keys.iter()
                .enumerate()
                .rev()
                .map(|(i, k)| (k.to_string(), Value::Int(i as i32)))
                .collect(),
        );
        assert_eq!(forward, backward);

        let schema = Schema::map(Schema::Int);
        let bytes = encode_to_vec(&forward, &schema)?;
        assert_eq!(bytes, encode_to_vec(&backward, &schema)?);
        // "a" (written with value 3) comes first
        assert_eq!(&bytes[..4], hex!("10 02 61 06"));
        Ok(())
    }

    #[test]
    fn union_with_explicit_and_inferred_branch() -> TestResult {
        let schema = Schema::union(vec![
            Schema::Boolean,
            Schema::Double,
            Schema::array(Schema::Bytes),
        ])?;
        let explicit = Value::Union(
            2,
            Box::new(Value::Array(vec![Value::Bytes(vec![0x01, 0x02])])),
        );
        let inferred = Value::Array(vec![Value::Bytes(vec![0x01, 0x02])]);
        let expected = hex!("040204010200");
        assert_eq!(encode_to_vec(&explicit, &schema)?, expected);
        assert_eq!(encode_to_vec(&inferred, &schema)?, expected);

        let err = encode_to_vec(&Value::Union(3, Box::new(Value::Null)), &schema).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::EncodeUnionIndex {
                index: 3,
                num_variants: 3
            }
        ));

        let err = encode_to_vec(&Value::Int(1), &schema).unwrap_err();
        assert!(matches!(err.details(), Details::FindUnionVariant { .. }));
        Ok(())
    }

    #[test]
    fn nullable_union_picks_null_branch() -> TestResult {
        let schema = Schema::Union(UnionSchema::new(vec![Schema::Null, Schema::String])?);
        assert_eq!(encode_to_vec(&Value::Null, &schema)?, [0u8]);
        assert_eq!(
            encode_to_vec(&Value::String("a".to_string()), &schema)?,
            hex!("020261")
        );
        Ok(())
    }

    #[test]
    fn enum_by_index_and_symbol() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "enum", "name": "Kind", "symbols": ["A", "B", "C"]}"#,
        )?;
        assert_eq!(encode_to_vec(&Value::Enum(2, "C".to_string()), &schema)?, [4u8]);
        assert_eq!(encode_to_vec(&Value::String("B".to_string()), &schema)?, [2u8]);

        let err = encode_to_vec(&Value::Enum(3, "D".to_string()), &schema).unwrap_err();
        assert!(matches!(err.details(), Details::EncodeEnumIndex { index: 3, .. }));

        let err = encode_to_vec(&Value::Enum(0, "B".to_string()), &schema).unwrap_err();
        assert!(matches!(err.details(), Details::EnumSymbolMismatch { .. }));

        let err = encode_to_vec(&Value::String("D".to_string()), &schema).unwrap_err();
        assert!(matches!(err.details(), Details::GetEnumSymbol(s) if s == "D"));
        assert_eq!(err.kind(), ErrorKind::Encode);
        Ok(())
    }

    #[test]
    fn fixed_size_is_checked() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": 2}"#)?;
        assert_eq!(encode_to_vec(&Value::Fixed(2, vec![7, 8]), &schema)?, [7u8, 8]);
        assert_eq!(encode_to_vec(&Value::Bytes(vec![7, 8]), &schema)?, [7u8, 8]);
        let err = encode_to_vec(&Value::Fixed(3, vec![1, 2, 3]), &schema).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::CompareFixedSizes { size: 2, n: 3 }
        ));
        Ok(())
    }

    #[test]
    fn fixed_declared_size_is_checked() -> TestResult {
        let schema = Schema::parse_str(r#"{"type": "fixed", "name": "F", "size": 2}"#)?;
        let err = encode_to_vec(&Value::Fixed(3, vec![1, 2]), &schema).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::CompareFixedSizes { size: 2, n: 3 }
        ));
        Ok(())
    }

    #[test]
    fn record_field_unknown_to_schema() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [{"name": "a", "type": "int"}]}"#,
        )?;
        let value = Value::Record(vec![
            ("a".to_string(), Value::Int(1)),
            ("zzz".to_string(), Value::String("x".to_string())),
        ]);
        let err = encode_to_vec(&value, &schema).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::NoEntryInLookupTable(field, _) if field == "zzz"
        ));
        assert_eq!(err.kind(), ErrorKind::Encode);
        Ok(())
    }

    #[test]
    fn shape_mismatch() {
        let err = encode_to_vec(&Value::Long(1), &Schema::Int).unwrap_err();
        assert!(matches!(
            err.details(),
            Details::EncodeValueAsSchemaError {
                value_kind: ValueKind::Long,
                supported_schema,
            } if supported_schema == &[SchemaKind::Int]
        ));
        assert_eq!(err.kind(), ErrorKind::Encode);
    }

    #[test]
    fn recursive_definition_encode_record() -> TestResult {
        let schema = Schema::parse_str(
            r#"
            {
                "type":"record",
                "name":"TestStruct",
                "fields": [
                    {
                        "name":"a",
                        "type":{
                            "type":"record",
                            "name": "Inner",
                            "fields": [ {
                                "name":"z",
                                "type":"int"
                            }]
                        }
                    },
                    {
                        "name":"b",
                        "type":"Inner"
                    }
                ]
            }"#,
        )?;
        let inner_value1 = Value::Record(vec![("z".into(), Value::Int(3))]);
        let inner_value2 = Value::Record(vec![("z".into(), Value::Int(6))]);
        let outer_value =
            Value::Record(vec![("a".into(), inner_value1), ("b".into(), inner_value2)]);
        assert_eq!(encode_to_vec(&outer_value, &schema)?, [6u8, 12]);
        Ok(())
    }

    #[test]
    fn record_fields_follow_schema_order() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "b", "type": "string", "aliases": ["bee"]}
            ]}"#,
        )?;
        let shuffled = Value::Record(vec![
            ("bee".to_string(), Value::String("x".to_string())),
            ("a".to_string(), Value::Int(1)),
        ]);
        assert_eq!(encode_to_vec(&shuffled, &schema)?, hex!("020278"));

        let missing = Value::Record(vec![("a".to_string(), Value::Int(1))]);
        let err = encode_to_vec(&missing, &schema).unwrap_err();
        assert!(matches!(err.details(), Details::NoEntryInLookupTable(field, _) if field == "b"));
        Ok(())
    }

    #[test]
    fn reference_in_namespace() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "Outer", "namespace": "space", "fields": [
                {"name": "a", "type": {"type": "fixed", "name": "Hash", "size": 1}},
                {"name": "b", "type": "Hash"},
                {"name": "c", "type": "space.Hash"}
            ]}"#,
        )?;
        let value = Value::Record(vec![
            ("a".to_string(), Value::Fixed(1, vec![1])),
            ("b".to_string(), Value::Fixed(1, vec![2])),
            ("c".to_string(), Value::Bytes(vec![3])),
        ]);
        assert_eq!(encode_to_vec(&value, &schema)?, [1u8, 2, 3]);
        Ok(())
    }
}
