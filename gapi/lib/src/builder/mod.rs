//! Per-language source builders.
//!
//! A [`Builder`] turns one validated [`Schema`] and one [`OutputTarget`] into
//! source [`Fragments`]. Builders are pure: they never touch the filesystem,
//! and a fresh builder is created for every output so no state carries over
//! between generations.
//!
//! ## Submodules
//!
//! - [`go`] - Go structs, `net/http` client, dispatch registrations and runtime
//! - [`typescript`] - TypeScript interfaces, `fetch` client, registrations and runtime
//! - [`naming`] - Identifier conventions shared by every language
//!
//! ## Adding a language
//!
//! Add a [`Language`] variant with its names and factory. The default
//! registry picks it up through [`Language::iter`]; nothing else dispatches
//! on the language name.

pub mod go;
pub mod naming;
pub mod typescript;

use std::collections::{BTreeMap, BTreeSet};

use strum::{Display, EnumIter, IntoEnumIterator};

use crate::error::BuildError;
use crate::schema::{
    Action, HttpMethod, OutputKind, OutputTarget, ResolvedType, Schema, TypeTable, type_references,
};

/// Source text produced by a builder for one output, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    /// Package clause or file-level preamble.
    pub header: String,
    pub imports: String,
    pub types: String,
    pub actions: String,
}

/// An extra file written next to an output, such as the dispatch runtime a
/// server output links against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Companion {
    /// File name, placed in the output's directory.
    pub file_name: String,
    pub fragments: Fragments,
}

/// Everything a builder needs for one `(Schema, OutputTarget)` pair.
pub struct BuildContext<'a> {
    pub schema: &'a Schema,
    pub target: &'a OutputTarget,
    pub kind: OutputKind,
    pub types: TypeTable<'a>,
}

impl<'a> BuildContext<'a> {
    /// ## Errors
    ///
    /// Returns `BuildError::UnsupportedKind` if the target's kind is neither
    /// `server` nor `client`.
    pub fn new(schema: &'a Schema, target: &'a OutputTarget) -> Result<Self, BuildError> {
        let kind = target
            .output_kind()
            .ok_or_else(|| BuildError::UnsupportedKind(target.kind.clone()))?;

        Ok(Self {
            schema,
            target,
            kind,
            types: TypeTable::new(schema),
        })
    }

    /// Resolves a type string, failing when it names nothing.
    pub fn resolve(&self, raw: &'a str, language: &'static str) -> Result<ResolvedType<'a>, BuildError> {
        self.types.resolve(raw).ok_or_else(|| BuildError::UnmappedType {
            type_name: raw.to_string(),
            language,
        })
    }

    /// External modules referenced by any type in the schema, sorted.
    pub fn used_modules(&self) -> BTreeSet<&'a str> {
        type_references(self.schema)
            .into_iter()
            .filter_map(|(_, raw)| self.types.resolve(raw))
            .filter_map(|resolved| resolved.module())
            .collect()
    }

    /// Parses an action's method.
    pub fn method_of(&self, name: &str, action: &Action) -> Result<HttpMethod, BuildError> {
        action
            .http_method()
            .ok_or_else(|| BuildError::UnsupportedMethod {
                action: name.to_string(),
                method: action.method.clone(),
            })
    }
}

/// The four-operation contract every target language implements.
pub trait Builder {
    /// Human-readable language name, used in error messages.
    fn language(&self) -> &'static str;

    /// The output kind this builder was created for.
    fn kind(&self) -> OutputKind;

    /// File preamble (package clause and the like). Empty by default.
    fn build_header(&self) -> Result<String, BuildError> {
        Ok(String::new())
    }

    /// Import statements for every external module the output references,
    /// one per module, sorted by module path.
    fn build_imports(&self) -> Result<String, BuildError>;

    /// One type per local definition, fields in attribute order.
    fn build_type_definitions(&self) -> Result<String, BuildError>;

    /// One handler registration per action.
    fn build_server_actions(&self) -> Result<String, BuildError>;

    /// One caller per action.
    fn build_client_actions(&self) -> Result<String, BuildError>;

    /// Files that must sit next to the output for it to compile. None by
    /// default.
    fn build_companions(&self) -> Result<Vec<Companion>, BuildError> {
        Ok(Vec::new())
    }

    /// Runs every operation needed for this builder's output kind.
    fn build(&self) -> Result<Fragments, BuildError> {
        let header = self.build_header()?;
        let imports = self.build_imports()?;
        let types = self.build_type_definitions()?;
        let actions = match self.kind() {
            OutputKind::Server => self.build_server_actions()?,
            OutputKind::Client => self.build_client_actions()?,
        };

        Ok(Fragments {
            header,
            imports,
            types,
            actions,
        })
    }
}

/// Creates a builder for one output.
pub type BuilderFactory = for<'a> fn(BuildContext<'a>) -> Box<dyn Builder + 'a>;

/// Languages with a built-in builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Language {
    #[strum(to_string = "Go")]
    Go,
    #[strum(to_string = "TypeScript")]
    TypeScript,
}

impl Language {
    /// Names accepted in an output's `language` field.
    pub fn names(self) -> &'static [&'static str] {
        match self {
            Language::Go => &["go", "golang"],
            Language::TypeScript => &["typescript", "ts"],
        }
    }

    pub fn factory(self) -> BuilderFactory {
        match self {
            Language::Go => go::boxed,
            Language::TypeScript => typescript::boxed,
        }
    }
}

/// Maps output language names to builder factories.
///
/// Populate it fully before a run starts and share it read-only afterwards.
/// Lookups are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct BuilderRegistry {
    factories: BTreeMap<String, BuilderFactory>,
}

impl BuilderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in [`Language`] under all its names.
    ///
    /// ```
    /// use gapi_lib::builder::BuilderRegistry;
    ///
    /// let registry = BuilderRegistry::with_defaults();
    /// assert!(registry.contains("golang"));
    /// assert!(registry.contains("TypeScript"));
    /// assert!(!registry.contains("cobol"));
    /// ```
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for language in Language::iter() {
            for name in language.names() {
                registry.register(name, language.factory());
            }
        }
        registry
    }

    /// Registers (or replaces) the factory for `language`.
    pub fn register(&mut self, language: &str, factory: BuilderFactory) -> &mut Self {
        self.factories.insert(language.to_ascii_lowercase(), factory);
        self
    }

    pub fn contains(&self, language: &str) -> bool {
        self.resolve(language).is_some()
    }

    pub fn resolve(&self, language: &str) -> Option<BuilderFactory> {
        self.factories.get(&language.to_ascii_lowercase()).copied()
    }

    /// Registered language names, sorted.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Creates a fresh builder for one output.
    ///
    /// ## Errors
    ///
    /// `BuildError::UnknownLanguage` when no factory is registered, or
    /// `BuildError::UnsupportedKind` for a bad output kind.
    pub fn create<'a>(
        &self,
        schema: &'a Schema,
        target: &'a OutputTarget,
    ) -> Result<Box<dyn Builder + 'a>, BuildError> {
        let factory = self
            .resolve(&target.language)
            .ok_or_else(|| BuildError::UnknownLanguage(target.language.clone()))?;
        Ok(factory(BuildContext::new(schema, target)?))
    }
}

/// Joins non-empty blocks with one blank line between them.
pub(crate) fn join_blocks(blocks: impl IntoIterator<Item = String>) -> String {
    blocks
        .into_iter()
        .filter(|block| !block.trim().is_empty())
        .map(|block| block.trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders `value` as a double-quoted string literal valid in Go and
/// TypeScript.
pub(crate) fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            c if c.is_control() => literal.push_str(&format!("\\u{:04x}", c as u32)),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}

/// Prefixes each line of `text` with `prefix`, for doc comments.
pub(crate) fn comment_lines(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                prefix.trim_end().to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .map(|line| line + "\n")
        .collect()
}
