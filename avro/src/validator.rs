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

//! # Name validation
//!
//! Names, namespaces, enum symbols and field names are checked while a schema is parsed.
//! By default a name is a letter or underscore followed by letters, digits or underscores,
//! and a namespace is a dot separated sequence of such names.
//!
//! Applications that exchange schemas with more permissive producers can register their own
//! validators. Every validator can be registered only once per process, and only before the
//! first schema is parsed; afterwards the default one is locked in.
//!
//! ```
//! # use avro_codec::{AvroResult, validator::{SchemaNameValidator, set_schema_name_validator}};
//! struct AllowDashes;
//!
//! impl SchemaNameValidator for AllowDashes {
//!     fn validate(&self, schema_name: &str) -> AvroResult<usize> {
//!         // the name starts after the last dot
//!         Ok(schema_name.rfind('.').map_or(0, |i| i + 1))
//!     }
//! }
//!
//! if set_schema_name_validator(Box::new(AllowDashes)).is_err() {
//!     panic!("a schema name validator was already registered")
//! }
//! ```

use crate::{AvroResult, error::Details};
use log::debug;
use regex_lite::Regex;
use std::sync::OnceLock;

const SIMPLE_NAME: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";
const NAMESPACE: &str = r"^([A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)?$";
const FULL_NAME: &str = r"^((?P<namespace>[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*)\.)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)$";

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(regex) => regex,
        Err(e) => unreachable!("built-in pattern {pattern} does not compile: {e}"),
    })
}

fn simple_name_regex() -> &'static Regex {
    static SIMPLE_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
    compiled(&SIMPLE_NAME_ONCE, SIMPLE_NAME)
}

/// Validates the (possibly dotted) name of a named schema.
///
/// To register a custom one use [`set_schema_name_validator`].
pub trait SchemaNameValidator: Send + Sync {
    /// Validates the schema name and returns the byte offset where the unqualified name starts.
    ///
    /// Should return [`Details::InvalidSchemaName`] if it is invalid.
    fn validate(&self, schema_name: &str) -> AvroResult<usize>;
}

/// Validates a namespace.
///
/// To register a custom one use [`set_schema_namespace_validator`].
pub trait SchemaNamespaceValidator: Send + Sync {
    /// Should return [`Details::InvalidNamespace`] if it is invalid.
    fn validate(&self, namespace: &str) -> AvroResult<()>;
}

/// Validates the symbols of an enum.
///
/// To register a custom one use [`set_enum_symbol_name_validator`].
pub trait EnumSymbolNameValidator: Send + Sync {
    /// Should return [`Details::EnumSymbolName`] if it is invalid.
    fn validate(&self, symbol: &str) -> AvroResult<()>;
}

/// Validates the names of record fields.
///
/// To register a custom one use [`set_record_field_name_validator`].
pub trait RecordFieldNameValidator: Send + Sync {
    /// Should return [`Details::FieldName`] if it is invalid.
    fn validate(&self, field_name: &str) -> AvroResult<()>;
}

/// The validator used when none has been registered.
struct DefaultValidator;

impl SchemaNameValidator for DefaultValidator {
    fn validate(&self, schema_name: &str) -> AvroResult<usize> {
        static FULL_NAME_ONCE: OnceLock<Regex> = OnceLock::new();
        let regex = compiled(&FULL_NAME_ONCE, FULL_NAME);
        regex
            .captures(schema_name)
            .and_then(|caps| caps.name("name"))
            .map(|name| name.start())
            .ok_or_else(|| Details::InvalidSchemaName(schema_name.to_string(), FULL_NAME).into())
    }
}

impl SchemaNamespaceValidator for DefaultValidator {
    fn validate(&self, namespace: &str) -> AvroResult<()> {
        static NAMESPACE_ONCE: OnceLock<Regex> = OnceLock::new();
        if compiled(&NAMESPACE_ONCE, NAMESPACE).is_match(namespace) {
            Ok(())
        } else {
            Err(Details::InvalidNamespace(namespace.to_string(), NAMESPACE).into())
        }
    }
}

impl EnumSymbolNameValidator for DefaultValidator {
    fn validate(&self, symbol: &str) -> AvroResult<()> {
        if simple_name_regex().is_match(symbol) {
            Ok(())
        } else {
            Err(Details::EnumSymbolName(symbol.to_string()).into())
        }
    }
}

impl RecordFieldNameValidator for DefaultValidator {
    fn validate(&self, field_name: &str) -> AvroResult<()> {
        if simple_name_regex().is_match(field_name) {
            Ok(())
        } else {
            Err(Details::FieldName(field_name.to_string()).into())
        }
    }
}

static NAME_VALIDATOR: OnceLock<Box<dyn SchemaNameValidator>> = OnceLock::new();
static NAMESPACE_VALIDATOR: OnceLock<Box<dyn SchemaNamespaceValidator>> = OnceLock::new();
static ENUM_SYMBOL_VALIDATOR: OnceLock<Box<dyn EnumSymbolNameValidator>> = OnceLock::new();
static FIELD_NAME_VALIDATOR: OnceLock<Box<dyn RecordFieldNameValidator>> = OnceLock::new();

/// Registers a custom schema name validator.
///
/// Returns `Err(validator)` if a validator is already in place, either because one was
/// registered before or because a schema has already been parsed.
pub fn set_schema_name_validator(
    validator: Box<dyn SchemaNameValidator>,
) -> Result<(), Box<dyn SchemaNameValidator>> {
    debug!("Setting a custom schema name validator.");
    NAME_VALIDATOR.set(validator)
}

/// Registers a custom namespace validator. See [`set_schema_name_validator`].
pub fn set_schema_namespace_validator(
    validator: Box<dyn SchemaNamespaceValidator>,
) -> Result<(), Box<dyn SchemaNamespaceValidator>> {
    debug!("Setting a custom namespace validator.");
    NAMESPACE_VALIDATOR.set(validator)
}

/// Registers a custom enum symbol validator. See [`set_schema_name_validator`].
pub fn set_enum_symbol_name_validator(
    validator: Box<dyn EnumSymbolNameValidator>,
) -> Result<(), Box<dyn EnumSymbolNameValidator>> {
    debug!("Setting a custom enum symbol validator.");
    ENUM_SYMBOL_VALIDATOR.set(validator)
}

/// Registers a custom record field name validator. See [`set_schema_name_validator`].
pub fn set_record_field_name_validator(
    validator: Box<dyn RecordFieldNameValidator>,
) -> Result<(), Box<dyn RecordFieldNameValidator>> {
    debug!("Setting a custom record field name validator.");
    FIELD_NAME_VALIDATOR.set(validator)
}

pub(crate) fn validate_schema_name(schema_name: &str) -> AvroResult<usize> {
    NAME_VALIDATOR
        .get_or_init(|| {
            debug!("Going to use the default name validator.");
            Box::new(DefaultValidator)
        })
        .validate(schema_name)
}

pub(crate) fn validate_namespace(namespace: &str) -> AvroResult<()> {
    NAMESPACE_VALIDATOR
        .get_or_init(|| {
            debug!("Going to use the default namespace validator.");
            Box::new(DefaultValidator)
        })
        .validate(namespace)
}

pub(crate) fn validate_enum_symbol_name(symbol: &str) -> AvroResult<()> {
    ENUM_SYMBOL_VALIDATOR
        .get_or_init(|| {
            debug!("Going to use the default enum symbol validator.");
            Box::new(DefaultValidator)
        })
        .validate(symbol)
}

pub(crate) fn validate_record_field_name(field_name: &str) -> AvroResult<()> {
    FIELD_NAME_VALIDATOR
        .get_or_init(|| {
            debug!("Going to use the default record field name validator.");
            Box::new(DefaultValidator)
        })
        .validate(field_name)
}
