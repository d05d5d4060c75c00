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

//! Schemas and readers are immutable once built and can be used from several threads.

use apache_avro_test_helper::TestResult;
use avro_codec::{DatumReader, Schema, to_avro_datum, types::Value};
use pretty_assertions::assert_eq;
use std::thread;

const SCHEMA: &str = r#"
{
  "type": "record",
  "name": "LongList",
  "fields": [
    {"name": "value", "type": "long"},
    {"name": "next", "type": ["null", "LongList"]}
  ]
}
"#;

fn list(values: &[i64]) -> Value {
    let next = match values {
        [_] => Value::Union(0, Box::new(Value::Null)),
        [_, rest @ ..] => Value::Union(1, Box::new(list(rest))),
        [] => unreachable!(),
    };
    Value::Record(vec![
        ("value".to_string(), Value::Long(values[0])),
        ("next".to_string(), next),
    ])
}

#[test]
fn schema_and_reader_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Schema>();
    assert_send_sync::<DatumReader<'static>>();
}

#[test]
fn share_reader_between_threads() -> TestResult {
    let schema = Schema::parse_str(SCHEMA)?;
    let datum_reader = DatumReader::builder(&schema).build()?;

    let inputs = (1..=8i64)
        .map(|n| {
            let values: Vec<i64> = (0..n).collect();
            let value = list(&values);
            to_avro_datum(&schema, value.clone()).map(|bytes| (bytes, value))
        })
        .collect::<Result<Vec<_>, _>>()?;

    thread::scope(|s| {
        for (bytes, expected) in &inputs {
            let datum_reader = &datum_reader;
            s.spawn(move || {
                let (value, position) = datum_reader.read(bytes).unwrap();
                assert_eq!(&value, expected);
                assert_eq!(position, bytes.len());
            });
        }
    });
    Ok(())
}

#[test]
fn share_schema_between_threads() -> TestResult {
    let schema = Schema::parse_str(SCHEMA)?;

    thread::scope(|s| {
        for n in 1..=4i64 {
            let schema = &schema;
            s.spawn(move || {
                let values: Vec<i64> = (0..n).collect();
                let value = list(&values);
                let bytes = to_avro_datum(schema, value.clone()).unwrap();
                let datum_reader = DatumReader::builder(schema).build().unwrap();
                assert_eq!(datum_reader.read(&bytes).unwrap().0, value);
            });
        }
    });
    Ok(())
}
