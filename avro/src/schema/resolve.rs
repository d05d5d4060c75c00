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
    AvroResult, Error,
    error::Details,
    schema::{Name, NamesRef, NamespaceRef, RecordSchema, Schema, UnionSchema},
};
use std::{borrow::Borrow, collections::HashMap};

/// One or more schemas together with the table of every named type they define.
///
/// The table is what turns a [`Schema::Ref`] back into its definition, so a recursive schema
/// can be walked without ever owning a cycle. Building it checks that every reference can be
/// resolved and that no full name is defined twice.
#[derive(Debug)]
pub struct ResolvedSchema<'s> {
    names_ref: NamesRef<'s>,
    schemata: Vec<&'s Schema>,
}

impl<'s> TryFrom<&'s Schema> for ResolvedSchema<'s> {
    type Error = Error;

    fn try_from(schema: &'s Schema) -> AvroResult<Self> {
        Self::try_from(vec![schema])
    }
}

impl<'s> TryFrom<Vec<&'s Schema>> for ResolvedSchema<'s> {
    type Error = Error;

    fn try_from(schemata: Vec<&'s Schema>) -> AvroResult<Self> {
        let mut names_ref = HashMap::new();
        let mut references = Vec::new();
        for schema in &schemata {
            collect_names(schema, None, &mut names_ref, &mut references)?;
        }
        for reference in references {
            if !names_ref.contains_key(&reference) {
                return Err(Details::SchemaResolutionError(reference).into());
            }
        }
        Ok(ResolvedSchema {
            names_ref,
            schemata,
        })
    }
}

impl<'s> ResolvedSchema<'s> {
    /// The schemas this table was built from. The first one is the root.
    pub fn get_schemata(&self) -> &[&'s Schema] {
        &self.schemata
    }

    pub fn get_names(&self) -> &NamesRef<'s> {
        &self.names_ref
    }
}

/// Walks `schema`, recording every named definition and every reference, both fully qualified.
fn collect_names<'s>(
    schema: &'s Schema,
    enclosing_namespace: NamespaceRef,
    names: &mut NamesRef<'s>,
    references: &mut Vec<Name>,
) -> AvroResult<()> {
    match schema {
        Schema::Array(array) => collect_names(&array.items, enclosing_namespace, names, references),
        Schema::Map(map) => collect_names(&map.types, enclosing_namespace, names, references),
        Schema::Union(UnionSchema { schemas, .. }) => {
            for schema in schemas {
                collect_names(schema, enclosing_namespace, names, references)?;
            }
            Ok(())
        }
        Schema::Enum(_) | Schema::Fixed(_) | Schema::Record(_) => {
            let name = schema
                .name()
                .map(|name| name.fully_qualified_name(enclosing_namespace).into_owned())
                .ok_or(Details::GetNameField)?;
            if names.insert(name.clone(), schema).is_some() {
                return Err(Details::AmbiguousSchemaDefinition(name).into());
            }
            if let Schema::Record(RecordSchema { fields, .. }) = schema {
                for field in fields {
                    collect_names(&field.schema, name.namespace(), names, references)?;
                }
            }
            Ok(())
        }
        Schema::Ref { name } => {
            references.push(name.fully_qualified_name(enclosing_namespace).into_owned());
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Look up the definition a reference stands for.
pub(crate) fn lookup_ref<'a, S: Borrow<Schema>>(
    names: &'a HashMap<Name, S>,
    name: &Name,
    enclosing_namespace: NamespaceRef,
) -> AvroResult<&'a Schema> {
    let fully_qualified_name = name.fully_qualified_name(enclosing_namespace);
    names
        .get(fully_qualified_name.as_ref())
        .or_else(|| names.get(name))
        .map(Borrow::borrow)
        .ok_or_else(|| Details::SchemaResolutionError(fully_qualified_name.into_owned()).into())
}
