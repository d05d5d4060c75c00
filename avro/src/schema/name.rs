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

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use crate::{
    AvroResult, Error, Schema,
    error::Details,
    util::MapHelper,
    validator::{validate_namespace, validate_schema_name},
};

/// The full name of a `record`, `enum` or `fixed` schema.
///
/// A full name is an unqualified name plus an optional namespace. An empty namespace is the
/// same as no namespace at all.
#[derive(Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name {
    name: String,
    namespace: Namespace,
}

/// Represents the aliases for Named Schema
pub type Aliases = Option<Vec<Alias>>;
/// Every named schema known to a parser or resolved schema, keyed by full name.
pub type Names = HashMap<Name, Schema>;
/// Borrowed counterpart of [`Names`].
pub type NamesRef<'a> = HashMap<Name, &'a Schema>;
/// Represents the namespace for Named Schema
pub type Namespace = Option<String>;
/// Represents the namespace for Named Schema
pub type NamespaceRef<'a> = Option<&'a str>;

impl Name {
    /// Create a new `Name`.
    ///
    /// A dotted `name` carries its own namespace.
    pub fn new(name: &str) -> AvroResult<Self> {
        Self::new_with_enclosing_namespace(name, None)
    }

    /// Create a new `Name`, falling back to `enclosing_namespace` when `name` is not dotted.
    ///
    /// A leading dot forces the null namespace.
    pub fn new_with_enclosing_namespace(
        name: &str,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        if let Some(unqualified) = name.strip_prefix('.') {
            let start = validate_schema_name(unqualified)?;
            if start != 0 {
                return Err(Details::InvalidSchemaName(name.to_string(), "").into());
            }
            return Ok(Self {
                name: unqualified.to_string(),
                namespace: None,
            });
        }

        let start = validate_schema_name(name)?;
        if start > 0 {
            return Ok(Self {
                name: name[start..].to_string(),
                namespace: Some(name[..start - 1].to_string()),
            });
        }

        let namespace = match enclosing_namespace {
            Some(namespace) if !namespace.is_empty() => {
                validate_namespace(namespace)?;
                Some(namespace.to_string())
            }
            _ => None,
        };
        Ok(Self {
            name: name.to_string(),
            namespace,
        })
    }

    /// Parse the `name` and `namespace` attributes of a named schema.
    pub(crate) fn parse(
        complex: &Map<String, Value>,
        enclosing_namespace: NamespaceRef,
    ) -> AvroResult<Self> {
        let name_field = complex.name().ok_or(Details::GetNameField)?;
        let namespace = complex.string("namespace");
        Self::new_with_enclosing_namespace(
            &name_field,
            namespace.as_deref().or(enclosing_namespace),
        )
    }

    /// The unqualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.namespace.as_deref()
    }

    /// The dotted full name.
    pub fn fullname(&self) -> String {
        self.to_string()
    }

    /// Qualify this name with `enclosing_namespace` unless it already has a namespace.
    ///
    /// ```
    /// # use avro_codec::{Error, schema::Name};
    /// assert_eq!(
    ///     Name::new("Node")?.fully_qualified_name(Some("org.example")).into_owned(),
    ///     Name::new("org.example.Node")?
    /// );
    /// assert_eq!(
    ///     Name::new("a.Node")?.fully_qualified_name(Some("b")).into_owned(),
    ///     Name::new("a.Node")?
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn fully_qualified_name(&self, enclosing_namespace: NamespaceRef) -> Cow<'_, Name> {
        match enclosing_namespace {
            Some(namespace) if self.namespace.is_none() && !namespace.is_empty() => {
                Cow::Owned(Self {
                    name: self.name.clone(),
                    namespace: Some(namespace.to_string()),
                })
            }
            _ => Cow::Borrowed(self),
        }
    }
}

impl TryFrom<&str> for Name {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("Name");
        debug.field("name", &self.name);
        match &self.namespace {
            Some(namespace) => debug.field("namespace", namespace).finish(),
            None => debug.finish_non_exhaustive(),
        }
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{namespace}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// An alternative name of a named schema or record field, used when resolving data written
/// with an older schema.
///
/// Serialized as a plain string.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Alias(Name);

impl Alias {
    pub fn new(name: &str) -> AvroResult<Self> {
        Name::new(name).map(Self)
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn namespace(&self) -> NamespaceRef<'_> {
        self.0.namespace()
    }

    pub fn fully_qualified_name(&self, enclosing_namespace: NamespaceRef) -> Cow<'_, Name> {
        self.0.fully_qualified_name(enclosing_namespace)
    }
}

impl TryFrom<&str> for Alias {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Serialize for Alias {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.fullname())
    }
}
