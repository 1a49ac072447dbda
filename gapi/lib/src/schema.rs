//! In-memory model of a gapi schema file.
//!
//! These types mirror the on-disk JSON/YAML shape one to one and carry no
//! validation of their own; see [`crate::validation`] for the consistency
//! checks that must pass before any code is generated.
//!
//! ## Type references
//!
//! Attribute, parameter and return types are plain strings interpreted by
//! [`TypeRef::parse`]:
//!
//! - a primitive keyword (`string`, `int64`, `bool`, ...)
//! - a key of [`Schema::definitions`] (`User`)
//! - an import alias plus a name (`uuid.UUID`)
//! - any of the above followed by `[]` for a list (`User[]`)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Version strings accepted in a schema file's `version` header.
pub const SUPPORTED_VERSIONS: &[&str] = &["gapi", "gapi.v1"];

/// One parsed, still-unvalidated API definition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub version: String,
    pub api_path: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub outputs: Vec<OutputTarget>,
    /// Named data shapes. A `BTreeMap` keeps generation order independent of
    /// file order and hash seeds.
    #[serde(default)]
    pub definitions: BTreeMap<String, Definition>,
    #[serde(default)]
    pub actions: BTreeMap<String, Action>,
}

/// A named data shape: either local attributes or a re-exported import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<Import>,
}

/// A field of a local definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

/// A type defined outside the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Import {
    /// Originating module (Go import path, npm specifier, ...).
    pub from: String,
    /// Name of the type inside that module.
    pub name: String,
}

impl Import {
    /// Returns the identifier the module is bound to in generated code.
    ///
    /// The last path segment of the module, without a leading `@`, with
    /// every non-alphanumeric character replaced by `_`.
    ///
    /// ## Examples
    ///
    /// ```
    /// use gapi_lib::schema::Import;
    ///
    /// let import = Import { from: "github.com/google/uuid".into(), name: "UUID".into() };
    /// assert_eq!(import.alias(), "uuid");
    ///
    /// let import = Import { from: "gopkg.in/yaml.v3".into(), name: "Node".into() };
    /// assert_eq!(import.alias(), "yaml_v3");
    /// ```
    pub fn alias(&self) -> String {
        module_alias(&self.from)
    }
}

/// Computes the alias for a module path. See [`Import::alias`].
pub fn module_alias(module: &str) -> String {
    let segment = module
        .rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(module)
        .trim_start_matches('@');

    let mut alias: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}

/// A named remote operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default)]
    pub description: String,
    /// Raw method string; parsed with [`Action::http_method`].
    pub method: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub returns: Vec<ReturnSpec>,
}

impl Action {
    /// Parses the method, or `None` when it is not a supported verb.
    pub fn http_method(&self) -> Option<HttpMethod> {
        self.method.parse().ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSpec {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
}

/// One file the generator must produce from a schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTarget {
    /// Raw kind string; parsed with [`OutputTarget::output_kind`].
    pub kind: String,
    pub language: String,
    #[serde(default, rename = "package", skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Destination path, optionally prefixed by a project-root placeholder.
    pub file_path: String,
    /// Module path of an action-dispatch runtime for server stubs to link
    /// against. When unset, the builder writes its own runtime next to the
    /// output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
}

impl OutputTarget {
    /// Parses the kind, or `None` when it is neither `server` nor `client`.
    pub fn output_kind(&self) -> Option<OutputKind> {
        self.kind.parse().ok()
    }
}

/// HTTP verbs an action may bind to.
///
/// Parsing is case-insensitive; display is uppercase.
///
/// ```
/// use gapi_lib::schema::HttpMethod;
///
/// assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
/// assert_eq!(HttpMethod::Patch.to_string(), "PATCH");
/// assert!("HEAD".parse::<HttpMethod>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Whether clients send the payload in the `d` query parameter rather
    /// than the request body.
    pub fn payload_in_query(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// Which side of the wire an output is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum OutputKind {
    Server,
    Client,
}

/// Primitive type keywords understood by every builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum Primitive {
    #[strum(to_string = "string")]
    String,
    #[strum(to_string = "bool", serialize = "boolean")]
    Bool,
    #[strum(to_string = "int")]
    Int,
    #[strum(to_string = "int32")]
    Int32,
    #[strum(to_string = "int64")]
    Int64,
    #[strum(to_string = "uint")]
    Uint,
    #[strum(to_string = "uint32")]
    Uint32,
    #[strum(to_string = "uint64")]
    Uint64,
    #[strum(to_string = "float32")]
    Float32,
    #[strum(to_string = "float64", serialize = "float", serialize = "number")]
    Float64,
    #[strum(to_string = "bytes")]
    Bytes,
    #[strum(to_string = "any")]
    Any,
}

/// Syntactic form of a type string, before resolution against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef<'a> {
    Primitive(Primitive),
    /// A bare name, expected to be a definition key.
    Named(&'a str),
    /// `alias.Name`, expected to go through an import alias.
    Qualified { alias: &'a str, name: &'a str },
    List(Box<TypeRef<'a>>),
}

impl<'a> TypeRef<'a> {
    /// Classifies a raw type string.
    ///
    /// ```
    /// use gapi_lib::schema::{Primitive, TypeRef};
    ///
    /// assert_eq!(TypeRef::parse("int64"), TypeRef::Primitive(Primitive::Int64));
    /// assert_eq!(TypeRef::parse("User"), TypeRef::Named("User"));
    /// assert_eq!(
    ///     TypeRef::parse("uuid.UUID[]"),
    ///     TypeRef::List(Box::new(TypeRef::Qualified { alias: "uuid", name: "UUID" }))
    /// );
    /// ```
    pub fn parse(raw: &'a str) -> Self {
        let raw = raw.trim();
        if let Some(element) = raw.strip_suffix("[]") {
            return TypeRef::List(Box::new(TypeRef::parse(element)));
        }
        if let Ok(primitive) = raw.parse::<Primitive>() {
            return TypeRef::Primitive(primitive);
        }
        match raw.split_once('.') {
            Some((alias, name)) => TypeRef::Qualified { alias, name },
            None => TypeRef::Named(raw),
        }
    }
}

/// A type reference resolved against a schema's definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedType<'a> {
    Primitive(Primitive),
    /// A local definition, by key.
    Local(&'a str),
    /// A type living in an external module.
    Imported {
        module: &'a str,
        alias: String,
        name: &'a str,
    },
    List(Box<ResolvedType<'a>>),
}

impl<'a> ResolvedType<'a> {
    /// The module this type pulls in, if any.
    pub fn module(&self) -> Option<&'a str> {
        match self {
            ResolvedType::Imported { module, .. } => Some(*module),
            ResolvedType::List(inner) => inner.module(),
            _ => None,
        }
    }
}

/// Lookup table of a schema's definitions, plus the import aliases.
///
/// Built once per schema and used both by the validator and by builders so
/// they agree on what every type string means.
#[derive(Debug)]
pub struct TypeTable<'a> {
    definitions: BTreeMap<&'a str, &'a Definition>,
    /// alias → module
    aliases: BTreeMap<String, &'a str>,
}

impl<'a> TypeTable<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let mut definitions = BTreeMap::new();
        let mut aliases = BTreeMap::new();

        for (name, definition) in &schema.definitions {
            definitions.insert(name.as_str(), definition);
            if let Some(import) = &definition.import {
                aliases.entry(import.alias()).or_insert(import.from.as_str());
            }
        }

        Self {
            definitions,
            aliases,
        }
    }

    /// Resolves a raw type string, or `None` when it references nothing.
    pub fn resolve(&self, raw: &'a str) -> Option<ResolvedType<'a>> {
        self.resolve_ref(TypeRef::parse(raw))
    }

    fn resolve_ref(&self, type_ref: TypeRef<'a>) -> Option<ResolvedType<'a>> {
        match type_ref {
            TypeRef::Primitive(primitive) => Some(ResolvedType::Primitive(primitive)),
            TypeRef::Named(name) => {
                let (&key, &definition) = self.definitions.get_key_value(name)?;
                Some(match &definition.import {
                    Some(import) => ResolvedType::Imported {
                        module: import.from.as_str(),
                        alias: import.alias(),
                        name: import.name.as_str(),
                    },
                    None => ResolvedType::Local(key),
                })
            }
            TypeRef::Qualified { alias, name } => {
                if name.is_empty() {
                    return None;
                }
                let &module = self.aliases.get(alias)?;
                Some(ResolvedType::Imported {
                    module,
                    alias: alias.to_string(),
                    name,
                })
            }
            TypeRef::List(inner) => self
                .resolve_ref(*inner)
                .map(|resolved| ResolvedType::List(Box::new(resolved))),
        }
    }
}

/// Every type string in a schema, paired with its location.
///
/// Locations read like `definitions.User.attributes[0]` and are stable for a
/// given schema, so error output is deterministic.
pub fn type_references(schema: &Schema) -> Vec<(String, &str)> {
    let mut references = Vec::new();

    for (name, definition) in &schema.definitions {
        for (index, attribute) in definition.attributes.iter().enumerate() {
            references.push((
                format!("definitions.{name}.attributes[{index}]"),
                attribute.type_name.as_str(),
            ));
        }
    }

    for (name, action) in &schema.actions {
        for (index, parameter) in action.parameters.iter().enumerate() {
            references.push((
                format!("actions.{name}.parameters[{index}]"),
                parameter.type_name.as_str(),
            ));
        }
        for (index, ret) in action.returns.iter().enumerate() {
            references.push((
                format!("actions.{name}.returns[{index}]"),
                ret.type_name.as_str(),
            ));
        }
    }

    references
}
