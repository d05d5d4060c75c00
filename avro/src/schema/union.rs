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
    schema::{Name, NamespaceRef, Schema, SchemaKind},
    types::Value,
};
use std::{
    borrow::Borrow,
    collections::{BTreeMap, HashMap, HashSet},
};

/// A description of a Union schema
#[derive(Debug, Clone)]
pub struct UnionSchema {
    /// The schemas that make up this union
    pub(crate) schemas: Vec<Schema>,
    // position of every unnamed branch, keyed by its kind
    variant_index: BTreeMap<SchemaKind, usize>,
}

impl UnionSchema {
    /// Creates a new UnionSchema from a vector of schemas.
    ///
    /// # Errors
    /// Will return an error if `schemas` is empty, directly contains a union, has two
    /// unnamed branches of the same kind or two named branches with the same full name.
    pub fn new(schemas: Vec<Schema>) -> AvroResult<Self> {
        if schemas.is_empty() {
            return Err(Details::EmptyUnion.into());
        }
        let mut variant_index = BTreeMap::new();
        let mut names = HashSet::new();
        for (i, schema) in schemas.iter().enumerate() {
            match schema {
                Schema::Union(_) => return Err(Details::GetNestedUnion.into()),
                named if named.is_named() => {
                    if let Some(name) = named.name()
                        && !names.insert(name.clone())
                    {
                        return Err(Details::GetUnionDuplicateName(name.clone()).into());
                    }
                }
                unnamed => {
                    let kind = SchemaKind::from(unnamed);
                    if variant_index.insert(kind, i).is_some() {
                        return Err(Details::GetUnionDuplicate(kind).into());
                    }
                }
            }
        }
        Ok(UnionSchema {
            schemas,
            variant_index,
        })
    }

    /// Returns a slice to all variants of this schema.
    pub fn variants(&self) -> &[Schema] {
        &self.schemas
    }

    /// Returns true if any of the variants of this `UnionSchema` is `Null`.
    pub fn is_nullable(&self) -> bool {
        self.variant_index.contains_key(&SchemaKind::Null)
    }

    /// Finds the first branch, in declaration order, that `value` is valid for, together
    /// with its position.
    ///
    /// `names` is used to look up references.
    pub fn find_schema_with_known_schemata<S: Borrow<Schema>>(
        &self,
        value: &Value,
        names: &HashMap<Name, S>,
        enclosing_namespace: NamespaceRef,
    ) -> Option<(usize, &Schema)> {
        self.schemas.iter().enumerate().find(|(_, schema)| {
            value
                .validate_internal(schema, names, enclosing_namespace)
                .is_none()
        })
    }
}

// variant_index is derived from schemas
impl PartialEq for UnionSchema {
    fn eq(&self, other: &UnionSchema) -> bool {
        self.schemas.eq(&other.schemas)
    }
}
