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
    schema::{Name, Schema, SchemaKind, UnionSchema},
    types::{Value, ValueKind},
};
use std::{error::Error as _, fmt, io::ErrorKind as IoErrorKind};

/// Errors encountered while parsing schemas or encoding, decoding and resolving data.
///
/// To inspect the details of the error use [`details`](Self::details) or [`into_details`](Self::into_details)
/// to get a [`Details`] which contains more precise error information. [`kind`](Self::kind)
/// tells which stage of the codec produced it.
#[derive(thiserror::Error, Debug)]
#[repr(transparent)]
#[error(transparent)]
pub struct Error {
    details: Box<Details>,
}

impl Error {
    pub fn new(details: Details) -> Self {
        Self {
            details: Box::new(details),
        }
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    pub fn into_details(self) -> Details {
        *self.details
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.details.kind()
    }

    /// Returns `true` if decoding failed only because the input ended too early.
    ///
    /// A caller that receives data incrementally can retry the same datum once more bytes
    /// are available.
    pub fn is_truncated(&self) -> bool {
        match self.details() {
            Details::ReadBoolean(e)
            | Details::ReadBytes(e)
            | Details::ReadString(e)
            | Details::ReadFloat(e)
            | Details::ReadDouble(e)
            | Details::ReadVariableIntegerBytes(e)
            | Details::ReadFixed(e, _) => e.kind() == IoErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

impl From<Details> for Error {
    fn from(details: Details) -> Self {
        Self::new(details)
    }
}

/// The stage of the codec an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ErrorKind {
    /// The schema is malformed or cannot be resolved. Detected at parse time.
    Schema,
    /// The value does not have the shape the schema requires.
    Encode,
    /// The bytes are not a valid encoding for the schema.
    Decode,
    /// A field only known to the reader has no default value.
    MissingDefault,
    /// The writer used an enum symbol unknown to the reader.
    UnknownSymbol,
    /// No branch of the reader's union accepts the writer's value.
    NoMatchingBranch,
    /// Any other incompatibility between the writer's and the reader's schema.
    Resolution,
}

#[derive(thiserror::Error)]
pub enum Details {
    #[error("Failed to parse schema from JSON")]
    ParseSchemaJson(#[source] serde_json::Error),

    #[error("Failed to read schema")]
    ReadSchemaFromReader(#[source] std::io::Error),

    #[error("Must be a JSON string, object or array")]
    ParseSchemaFromValidJson,

    #[error("Unknown primitive type: {0}")]
    ParsePrimitive(String),

    #[error("Unknown primitive type: {0}. Did you mean {1}?")]
    ParsePrimitiveSimilar(String, &'static str),

    #[error("Invalid schema: There is no type called '{0}', if you meant to define a non-primitive schema, it should be defined inside `type` attribute.")]
    InvalidSchemaRecord(String),

    #[error("No `name` field")]
    GetNameField,

    #[error("No `name` in record field")]
    GetNameFieldFromRecord,

    #[error("Invalid schema name {0}. It must match the regex '{1}'")]
    InvalidSchemaName(String, &'static str),

    #[error("Invalid namespace {0}. It must match the regex '{1}'")]
    InvalidNamespace(String, &'static str),

    #[error("Invalid enum symbol name {0}")]
    EnumSymbolName(String),

    #[error("Invalid field name {0}")]
    FieldName(String),

    #[error("Unknown complex type: {0}")]
    GetComplexType(serde_json::Value),

    #[error("No `type` in complex type")]
    GetComplexTypeField,

    #[error("No `fields` in record")]
    GetRecordFieldsJson,

    #[error("Duplicate field name {0}")]
    FieldNameDuplicate(String),

    #[error("No `symbols` field in enum")]
    GetEnumSymbolsField,

    #[error("Unable to parse `symbols` in enum")]
    GetEnumSymbols,

    #[error("Duplicate enum symbol {0}")]
    EnumSymbolDuplicate(String),

    #[error("Default value for enum must be a string! Got: {0}")]
    EnumDefaultWrongType(serde_json::Value),

    #[error("Enum default {symbol:?} is not among allowed symbols {symbols:?}")]
    GetEnumDefault {
        symbol: String,
        symbols: Vec<String>,
    },

    #[error("No `items` in array")]
    GetArrayItemsField,

    #[error("No `values` in map")]
    GetMapValuesField,

    #[error("No `size` in fixed")]
    GetFixedSizeField,

    #[error("Fixed schema's `size` must be a non-negative integer: {0}")]
    GetFixedSizeFieldPositive(serde_json::Value),

    #[error("Unions may not directly contain a union")]
    GetNestedUnion,

    #[error("Unions cannot contain duplicate types, found at least two {0:?}")]
    GetUnionDuplicate(SchemaKind),

    #[error("Unions cannot contain two named types with the same name: {0}")]
    GetUnionDuplicateName(Name),

    #[error("Union must have at least one schema")]
    EmptyUnion,

    #[error("Invalid default value for field '{0}' of record '{1}': expected a value of schema {2}")]
    GetDefaultRecordField(String, String, String),

    #[error("Two named schema defined for same fullname: {0}.")]
    AmbiguousSchemaDefinition(Name),

    #[error("Two schemas with the same fullname were given: {0:?}")]
    NameCollision(String),

    /// Error while resolving `Schema::Ref`
    #[error("Unresolved schema reference: {0}")]
    SchemaResolutionError(Name),

    #[error("Can only encode value type {value_kind:?} as one of {supported_schema:?}")]
    EncodeValueAsSchemaError {
        value_kind: ValueKind,
        supported_schema: Vec<SchemaKind>,
    },

    #[error("Union index {index} out of bounds: {num_variants}")]
    EncodeUnionIndex { index: u32, num_variants: usize },

    #[error("Could not find matching type in {schema:?} for {value:?}")]
    FindUnionVariant { schema: UnionSchema, value: Value },

    #[error("Enum symbol index {index} out of bounds: {num_symbols}")]
    EncodeEnumIndex { index: u32, num_symbols: usize },

    #[error("Enum value {index} refers to symbol {expected:?}, not {symbol:?}")]
    EnumSymbolMismatch {
        index: u32,
        symbol: String,
        expected: String,
    },

    #[error("Enum symbol not found {0}")]
    GetEnumSymbol(String),

    #[error("Fixed size mismatch, expected: {size}, got: {n}")]
    CompareFixedSizes { size: usize, n: usize },

    #[error("There is no entry for '{0}' in the lookup table: {1}.")]
    NoEntryInLookupTable(String, String),

    /// Describes errors happened while validating Avro data.
    #[error("Value does not match schema")]
    Validation,

    /// Describes errors happened while validating Avro data.
    #[error("Value {value:?} does not match schema {schema:?}: Reason: {reason}")]
    ValidationWithReason {
        value: Value,
        schema: Schema,
        reason: String,
    },

    #[error("Failed to write buffer bytes during flush: {0}")]
    WriteBytes(#[source] std::io::Error),

    #[error("Invalid u8 for bool: {0}")]
    BoolValue(u8),

    #[error("Failed to read boolean bytes: {0}")]
    ReadBoolean(#[source] std::io::Error),

    #[error("Failed to read bytes: {0}")]
    ReadBytes(#[source] std::io::Error),

    #[error("Failed to read string: {0}")]
    ReadString(#[source] std::io::Error),

    #[error("Failed to read double: {0}")]
    ReadDouble(#[source] std::io::Error),

    #[error("Failed to read float: {0}")]
    ReadFloat(#[source] std::io::Error),

    #[error("Failed to read fixed number of bytes '{1}': : {0}")]
    ReadFixed(#[source] std::io::Error, usize),

    #[error("Failed to read bytes for decoding variable length integer: {0}")]
    ReadVariableIntegerBytes(#[source] std::io::Error),

    #[error("Decoded integer out of range for i32: {1}: {0}")]
    ZagI32(#[source] std::num::TryFromIntError, i64),

    #[error("Overflow when decoding integer value")]
    IntegerOverflow,

    #[error("Cannot convert length to usize: {1}")]
    ConvertI64ToUsize(#[source] std::num::TryFromIntError, i64),

    #[error("Invalid utf-8 string")]
    ConvertToUtf8(#[source] std::string::FromUtf8Error),

    #[error("Unable to allocate {desired} bytes (maximum allowed: {maximum})")]
    MemoryAllocation { desired: usize, maximum: usize },

    #[error("Union index {index} out of bounds: {num_variants}")]
    GetUnionVariant { index: i64, num_variants: usize },

    #[error("Enum symbol index {index} out of bounds: {num_symbols}")]
    GetEnumValue { index: i64, num_symbols: usize },

    #[error("{remaining} unread bytes after the datum ending at position {position}")]
    TrailingBytes { position: usize, remaining: usize },

    #[error("Field '{field}' of record '{record}' is not in the writer's schema and has no default value")]
    MissingDefault { field: String, record: Name },

    #[error("Writer's enum symbol {symbol:?} is not among the reader's symbols {symbols:?}")]
    UnknownSymbol {
        symbol: String,
        symbols: Vec<String>,
    },

    #[error("No branch of the reader's union {reader:?} accepts a writer's {writer}")]
    NoMatchingBranch {
        writer: SchemaKind,
        reader: UnionSchema,
    },

    #[error("Cannot resolve writer's {writer} to reader's {reader}")]
    ResolveTypeMismatch {
        writer: SchemaKind,
        reader: SchemaKind,
    },

    #[error("Writer's named type {writer} does not match the reader's {reader}")]
    ResolveNameMismatch { writer: Name, reader: Name },

    #[error("Writer's fixed size {writer} does not match the reader's {reader}")]
    ResolveFixedSize { writer: usize, reader: usize },

    #[error("Default value {default} is not valid for a {kind}")]
    DefaultValueMismatch {
        default: serde_json::Value,
        kind: SchemaKind,
    },
}

impl Details {
    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Details::ParseSchemaJson(_)
            | Details::ReadSchemaFromReader(_)
            | Details::ParseSchemaFromValidJson
            | Details::ParsePrimitive(_)
            | Details::ParsePrimitiveSimilar(..)
            | Details::InvalidSchemaRecord(_)
            | Details::GetNameField
            | Details::GetNameFieldFromRecord
            | Details::InvalidSchemaName(..)
            | Details::InvalidNamespace(..)
            | Details::EnumSymbolName(_)
            | Details::FieldName(_)
            | Details::GetComplexType(_)
            | Details::GetComplexTypeField
            | Details::GetRecordFieldsJson
            | Details::FieldNameDuplicate(_)
            | Details::GetEnumSymbolsField
            | Details::GetEnumSymbols
            | Details::EnumSymbolDuplicate(_)
            | Details::EnumDefaultWrongType(_)
            | Details::GetEnumDefault { .. }
            | Details::GetArrayItemsField
            | Details::GetMapValuesField
            | Details::GetFixedSizeField
            | Details::GetFixedSizeFieldPositive(_)
            | Details::GetNestedUnion
            | Details::GetUnionDuplicate(_)
            | Details::GetUnionDuplicateName(_)
            | Details::EmptyUnion
            | Details::GetDefaultRecordField(..)
            | Details::AmbiguousSchemaDefinition(_)
            | Details::NameCollision(_)
            | Details::SchemaResolutionError(_) => ErrorKind::Schema,
            Details::EncodeValueAsSchemaError { .. }
            | Details::EncodeUnionIndex { .. }
            | Details::FindUnionVariant { .. }
            | Details::EncodeEnumIndex { .. }
            | Details::EnumSymbolMismatch { .. }
            | Details::GetEnumSymbol(_)
            | Details::CompareFixedSizes { .. }
            | Details::NoEntryInLookupTable(..)
            | Details::Validation
            | Details::ValidationWithReason { .. }
            | Details::WriteBytes(_) => ErrorKind::Encode,
            Details::BoolValue(_)
            | Details::ReadBoolean(_)
            | Details::ReadBytes(_)
            | Details::ReadString(_)
            | Details::ReadDouble(_)
            | Details::ReadFloat(_)
            | Details::ReadFixed(..)
            | Details::ReadVariableIntegerBytes(_)
            | Details::ZagI32(..)
            | Details::IntegerOverflow
            | Details::ConvertI64ToUsize(..)
            | Details::ConvertToUtf8(_)
            | Details::MemoryAllocation { .. }
            | Details::GetUnionVariant { .. }
            | Details::GetEnumValue { .. }
            | Details::TrailingBytes { .. } => ErrorKind::Decode,
            Details::MissingDefault { .. } => ErrorKind::MissingDefault,
            Details::UnknownSymbol { .. } => ErrorKind::UnknownSymbol,
            Details::NoMatchingBranch { .. } => ErrorKind::NoMatchingBranch,
            Details::ResolveTypeMismatch { .. }
            | Details::ResolveNameMismatch { .. }
            | Details::ResolveFixedSize { .. }
            | Details::DefaultValueMismatch { .. } => ErrorKind::Resolution,
        }
    }
}

#[derive(thiserror::Error, PartialEq)]
pub enum CompatibilityError {
    #[error(
        "Incompatible schema types! Writer schema is '{writer_schema_type}', but reader schema is '{reader_schema_type}'"
    )]
    WrongType {
        writer_schema_type: String,
        reader_schema_type: String,
    },

    #[error(
        "Incompatible schemata! Field '{0}' in reader schema does not match the type in the writer schema"
    )]
    FieldTypeMismatch(String, #[source] Box<CompatibilityError>),

    #[error("Incompatible schemata! Field '{0}' in reader schema must have a default value")]
    MissingDefaultValue(String),

    #[error("Incompatible schemata! Reader's symbols must contain all writer's symbols")]
    MissingSymbols,

    #[error("Incompatible schemata! All elements in union must match for both schemas")]
    MissingUnionElements,

    #[error("Incompatible schemata! None of the writer's union elements match the reader schema")]
    SchemaMismatchAllUnionElements,

    #[error("Incompatible schemata! Size doesn't match for fixed")]
    FixedMismatch,

    #[error(
        "Incompatible schemata! The name must be the same for both schemas. Writer's name {writer_name} and reader's name {reader_name}"
    )]
    NameMismatch {
        writer_name: String,
        reader_name: String,
    },

    #[error("Incompatible schemata! Unresolved reference to {0}")]
    UnresolvedReference(String),
}

impl fmt::Debug for Details {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}

impl fmt::Debug for CompatibilityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut msg = self.to_string();
        if let Some(e) = self.source() {
            msg.extend([": ", &e.to_string()]);
        }
        write!(f, "{msg}")
    }
}
