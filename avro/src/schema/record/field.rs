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
    schema::{Documentation, Name, Names, Schema, parser::Parser},
    types,
    util::MapHelper,
    validator::validate_record_field_name,
};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use std::{collections::BTreeMap, str::FromStr};
use strum_macros::{EnumString, IntoStaticStr};

/// Represents a `field` in a `record` Avro schema.
#[derive(bon::Builder, Clone, Debug, PartialEq)]
pub struct RecordField {
    /// Name of the field.
    #[builder(into)]
    pub name: String,
    /// Documentation of the field.
    #[builder(default)]
    pub doc: Documentation,
    /// Aliases of the field's name. They have no namespace.
    pub aliases: Option<Vec<String>>,
    /// Default value of the field, used when a reader finds no such field in the writer's
    /// schema.
    pub default: Option<Value>,
    /// Schema of the field.
    pub schema: Schema,
    /// Sort order of the field. Kept for the JSON representation only.
    #[builder(default = RecordFieldOrder::Ascending)]
    pub order: RecordFieldOrder,
    /// Position of the field in the list of `field` of its parent `Schema`
    #[builder(default)]
    pub position: usize,
    /// A collection of all unknown fields in the record field.
    #[builder(default)]
    pub custom_attributes: BTreeMap<String, Value>,
}

/// Represents any valid order for a `field` in a `record` Avro schema.
#[derive(Clone, Copy, Debug, Eq, PartialEq, EnumString, IntoStaticStr)]
#[strum(serialize_all = "kebab_case")]
pub enum RecordFieldOrder {
    Ascending,
    Descending,
    Ignore,
}

impl RecordField {
    /// Parse a `serde_json::Value` into a `RecordField`.
    pub(crate) fn parse(
        field: &Map<String, Value>,
        position: usize,
        parser: &mut Parser,
        enclosing_record: &Name,
    ) -> AvroResult<Self> {
        let name = field.name().ok_or(Details::GetNameFieldFromRecord)?;

        validate_record_field_name(&name)?;

        let schema = parser.parse_field_type(field, enclosing_record.namespace())?;

        let default = field.get("default").cloned();
        if let Some(default) = &default {
            Self::check_default_value(default, &schema, &name, enclosing_record, parser.names())?;
        }

        let aliases = field.get("aliases").and_then(|aliases| {
            aliases.as_array().map(|aliases| {
                aliases
                    .iter()
                    .flat_map(|alias| alias.as_str())
                    .map(|alias| alias.to_string())
                    .collect::<Vec<String>>()
            })
        });

        let order = field
            .get("order")
            .and_then(|order| order.as_str())
            .and_then(|order| RecordFieldOrder::from_str(order).ok())
            .unwrap_or(RecordFieldOrder::Ascending);

        Ok(RecordField {
            name,
            doc: field.doc(),
            default,
            aliases,
            order,
            position,
            custom_attributes: Self::custom_attributes(field),
            schema,
        })
    }

    fn check_default_value(
        default: &Value,
        field_schema: &Schema,
        field_name: &str,
        record_name: &Name,
        names: &Names,
    ) -> AvroResult<()> {
        types::Value::from_default(default, field_schema, names, record_name.namespace())
            .map(|_| ())
            .map_err(|_| {
                Details::GetDefaultRecordField(
                    field_name.to_string(),
                    record_name.fullname(),
                    field_schema.canonical_form(),
                )
                .into()
            })
    }

    fn custom_attributes(field: &Map<String, Value>) -> BTreeMap<String, Value> {
        field
            .iter()
            .filter(|(key, _)| {
                !matches!(
                    key.as_str(),
                    "type" | "name" | "doc" | "default" | "order" | "aliases"
                )
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Returns true if the field's schema is a union with a `null` branch.
    pub fn is_nullable(&self) -> bool {
        match self.schema {
            Schema::Union(ref inner) => inner.is_nullable(),
            _ => false,
        }
    }

    /// Whether `name` is this field's name or one of its aliases.
    pub(crate) fn is_known_as(&self, name: &str) -> bool {
        self.name == name
            || self
                .aliases
                .as_ref()
                .is_some_and(|aliases| aliases.iter().any(|alias| alias == name))
    }
}

impl Serialize for RecordField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.schema)?;

        if let Some(ref doc) = self.doc {
            map.serialize_entry("doc", doc)?;
        }

        if let Some(ref default) = self.default {
            map.serialize_entry("default", default)?;
        }

        if let Some(ref aliases) = self.aliases {
            map.serialize_entry("aliases", aliases)?;
        }

        if self.order != RecordFieldOrder::Ascending {
            let order: &'static str = self.order.into();
            map.serialize_entry("order", order)?;
        }

        for attr in &self.custom_attributes {
            map.serialize_entry(attr.0, attr.1)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UnionSchema;
    use apache_avro_test_helper::TestResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nullable_record_field() -> TestResult {
        let nullable = RecordField::builder()
            .name("next")
            .schema(Schema::Union(UnionSchema::new(vec![
                Schema::Null,
                Schema::Ref {
                    name: Name::new("LongList")?,
                },
            ])?))
            .position(1)
            .build();
        assert!(nullable.is_nullable());

        let not_nullable = RecordField::builder()
            .name("next")
            .default(json!(2))
            .schema(Schema::Long)
            .build();
        assert!(!not_nullable.is_nullable());
        assert_eq!(not_nullable.order, RecordFieldOrder::Ascending);
        Ok(())
    }

    #[test]
    fn field_aliases_are_matched() {
        let field = RecordField::builder()
            .name("label")
            .aliases(vec!["name".to_string(), "title".to_string()])
            .schema(Schema::String)
            .build();
        assert!(field.is_known_as("label"));
        assert!(field.is_known_as("title"));
        assert!(!field.is_known_as("caption"));
    }

    #[test]
    fn order_is_parsed_and_written_back() -> TestResult {
        let schema = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int", "order": "descending"},
                {"name": "b", "type": "int", "order": "ignore", "extra": true}
            ]}"#,
        )?;
        let Schema::Record(record) = &schema else {
            panic!("Expected a record");
        };
        assert_eq!(record.fields[0].order, RecordFieldOrder::Descending);
        assert_eq!(record.fields[1].order, RecordFieldOrder::Ignore);
        assert_eq!(
            record.fields[1].custom_attributes.get("extra"),
            Some(&json!(true))
        );
        assert_eq!(record.fields[1].position, 1);

        let json = serde_json::to_value(&schema)?;
        assert_eq!(json["fields"][0]["order"], json!("descending"));
        Ok(())
    }

    #[test]
    fn invalid_default_is_rejected() {
        let err = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int", "default": "zero"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err.details(),
            Details::GetDefaultRecordField(field, record, _) if field == "a" && record == "R"
        ));
    }

    #[test]
    fn union_default_belongs_to_the_first_branch() -> TestResult {
        Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": ["null", "int"], "default": null}
            ]}"#,
        )?;
        assert!(
            Schema::parse_str(
                r#"{"type": "record", "name": "R", "fields": [
                    {"name": "a", "type": ["null", "int"], "default": 1}
                ]}"#,
            )
            .is_err()
        );
        Ok(())
    }

    #[test]
    fn duplicate_field_names_are_rejected() {
        let err = Schema::parse_str(
            r#"{"type": "record", "name": "R", "fields": [
                {"name": "a", "type": "int"},
                {"name": "a", "type": "long"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err.details(), Details::FieldNameDuplicate(name) if name == "a"));
    }
}
