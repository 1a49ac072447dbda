//! TypeScript builder.
//!
//! Definitions become exported interfaces and imported types are pulled in
//! with `import type * as alias`, so generated files add nothing at runtime
//! beyond the client helpers.
//!
//! Server registrations import `ActionContext` and `ActionRegistry` from the
//! runtime module written next to them ([`RUNTIME_FILE`]), or from the
//! output's `runtime` module when one is set.

use std::collections::BTreeMap;

use crate::builder::naming::{self, SymbolTable, camel_case, ensure_identifier, is_identifier, pascal_case};
use crate::builder::{
    BuildContext, Builder, Companion, Fragments, comment_lines, join_blocks, string_literal,
};
use crate::error::BuildError;
use crate::schema::{OutputKind, Primitive, ResolvedType, Schema};

const LANGUAGE: &str = "TypeScript";

/// Name of the runtime module written next to server output.
pub const RUNTIME_FILE: &str = "gapi-runtime.ts";

/// Specifier server output imports the emitted runtime through.
const RUNTIME_SPECIFIER: &str = "./gapi-runtime";

const RUNTIME_SOURCE: &str = include_str!("../../runtime/runtime.ts");

/// Words that cannot name a function declaration.
const RESERVED: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete", "do",
    "else", "enum", "export", "extends", "false", "finally", "for", "function", "if", "import",
    "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield", "let", "static", "implements", "interface",
    "package", "private", "protected", "public", "await",
];

pub struct TypeScriptBuilder<'a> {
    ctx: BuildContext<'a>,
}

struct Property {
    key: String,
    ts_type: String,
    optional: bool,
    doc: String,
}

/// Factory registered for this language.
pub fn boxed(ctx: BuildContext<'_>) -> Box<dyn Builder + '_> {
    Box::new(TypeScriptBuilder::new(ctx))
}

impl<'a> TypeScriptBuilder<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    fn schema(&self) -> &'a Schema {
        self.ctx.schema
    }

    fn has_actions(&self) -> bool {
        !self.schema().actions.is_empty()
    }

    /// Module of an external runtime, when the output names one.
    fn external_runtime(&self) -> Option<&'a str> {
        self.ctx
            .target
            .runtime
            .as_deref()
            .filter(|runtime| !runtime.is_empty())
    }

    fn ts_type(&self, raw: &'a str) -> Result<String, BuildError> {
        Ok(render(&self.ctx.resolve(raw, LANGUAGE)?))
    }

    fn action_ident(&self, action: &str) -> Result<String, BuildError> {
        ensure_identifier(pascal_case(action), action, LANGUAGE)
    }

    /// Function name of the client caller for `action`.
    fn function_name(&self, action: &str) -> Result<String, BuildError> {
        let name = ensure_identifier(camel_case(action), action, LANGUAGE)?;
        if RESERVED.contains(&name.as_str()) {
            Ok(format!("{name}Action"))
        } else {
            Ok(name)
        }
    }

    fn check_symbols(&self) -> Result<(), BuildError> {
        let mut symbols = SymbolTable::new();

        for (name, definition) in &self.schema().definitions {
            if definition.import.is_none() {
                let symbol = ensure_identifier(naming::type_name(name), name, LANGUAGE)?;
                symbols.claim(&symbol, format!("definition '{name}'"))?;
            }
        }

        for name in self.schema().actions.keys() {
            let ident = self.action_ident(name)?;
            let origin = format!("action '{name}'");
            symbols.claim(&format!("{ident}Params"), origin.clone())?;
            match self.ctx.kind {
                OutputKind::Server => {
                    symbols.claim(&format!("{ident}Handler"), origin.clone())?;
                    symbols.claim(&format!("register{ident}"), origin)?;
                }
                OutputKind::Client => {
                    symbols.claim(&self.function_name(name)?, origin)?;
                }
            }
        }

        match self.ctx.kind {
            OutputKind::Server if self.has_actions() => {
                symbols.claim("Handlers", "the handler set")?;
                symbols.claim("registerAll", "the handler set")?;
                symbols.claim("ActionContext", "the runtime import")?;
                symbols.claim("ActionRegistry", "the runtime import")?;
            }
            OutputKind::Server => {}
            OutputKind::Client => {
                for symbol in ["API_PATH", "GapiError", "Transport", "invoke"] {
                    symbols.claim(symbol, "the client runtime")?;
                }
            }
        }

        Ok(())
    }

    fn properties<I>(&self, owner: &str, entries: I) -> Result<Vec<Property>, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, bool, &'a str)>,
    {
        let mut keys = SymbolTable::new();
        let mut properties = Vec::new();

        for (name, type_name, required, description) in entries {
            keys.claim(name, format!("{owner} property '{name}'"))?;
            let key = if is_identifier(name) {
                name.to_string()
            } else {
                string_literal(name)
            };
            properties.push(Property {
                key,
                ts_type: self.ts_type(type_name)?,
                optional: !required,
                doc: description.to_string(),
            });
        }

        Ok(properties)
    }

    fn params_interface(&self, name: &'a str, ident: &str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let properties = self.properties(
            &format!("action '{name}'"),
            action.parameters.iter().map(|p| {
                (
                    p.name.as_str(),
                    p.type_name.as_str(),
                    p.required,
                    p.description.as_str(),
                )
            }),
        )?;
        let doc = format!("Parameters of the {name} action.");
        Ok(interface_decl(&format!("{ident}Params"), &doc, &properties))
    }

    /// `void`, the single return type, or a tuple of all of them.
    fn result_type(&self, name: &'a str) -> Result<String, BuildError> {
        let returns = self.schema().actions[name]
            .returns
            .iter()
            .map(|ret| self.ts_type(&ret.type_name))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(match returns.len() {
            0 => "void".to_string(),
            1 => returns[0].clone(),
            _ => format!("[{}]", returns.join(", ")),
        })
    }

    fn server_action(&self, name: &'a str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let ident = self.action_ident(name)?;
        let method = self.ctx.method_of(name, action)?;
        let result = self.result_type(name)?;

        let mut out = self.params_interface(name, &ident)?;
        out.push('\n');

        let mut doc = format!("Implements the {name} action.");
        if !action.description.is_empty() {
            doc.push_str("\n\n");
            doc.push_str(&action.description);
        }
        out.push_str(&jsdoc(&doc, ""));
        out.push_str(&format!(
            "export type {ident}Handler = (ctx: ActionContext, params: {ident}Params) => Promise<{result}>;\n\n"
        ));

        out.push_str(&format!(
            "/** Binds `handler` to the {name} action ({method}). */\n"
        ));
        out.push_str(&format!(
            "export function register{ident}(registry: ActionRegistry, handler: {ident}Handler): void {{\n"
        ));
        out.push_str(&format!(
            "  registry.register({}, {}, (ctx, params) => handler(ctx, params as {ident}Params));\n",
            string_literal(name),
            string_literal(&method.to_string()),
        ));
        out.push_str("}\n");

        Ok(out)
    }

    fn handler_set(&self) -> Result<String, BuildError> {
        let mut out = String::from("/** One implementation per action. */\n");
        out.push_str("export interface Handlers {\n");
        let mut register = String::new();
        for name in self.schema().actions.keys() {
            let ident = self.action_ident(name)?;
            out.push_str(&format!("  {ident}: {ident}Handler;\n"));
            register.push_str(&format!("  if (handlers.{ident}) {{\n"));
            register.push_str(&format!("    register{ident}(registry, handlers.{ident});\n"));
            register.push_str("  }\n");
        }
        out.push_str("}\n\n");

        out.push_str("/** Binds every provided handler to `registry`. */\n");
        out.push_str(
            "export function registerAll(registry: ActionRegistry, handlers: Partial<Handlers>): void {\n",
        );
        out.push_str(&register);
        out.push_str("}\n");

        Ok(out)
    }

    fn client_runtime(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "export const API_PATH = {};\n\n",
            string_literal(&self.schema().api_path)
        ));

        out.push_str("/** Raised when the server answers with a non-success code. */\n");
        out.push_str("export class GapiError extends Error {\n");
        out.push_str("  constructor(\n");
        out.push_str("    readonly code: number,\n");
        out.push_str("    message: string,\n");
        out.push_str("  ) {\n");
        out.push_str("    super(message);\n");
        out.push_str("    this.name = \"GapiError\";\n");
        out.push_str("  }\n");
        out.push_str("}\n\n");

        out.push_str("/** Where and how requests are sent. */\n");
        out.push_str("export interface Transport {\n");
        out.push_str("  baseUrl: string;\n");
        out.push_str("  fetch?: typeof fetch;\n");
        out.push_str("  headers?: Record<string, string>;\n");
        out.push_str("}\n\n");

        out.push_str("async function invoke<T>(\n");
        out.push_str("  transport: Transport,\n");
        out.push_str("  action: string,\n");
        out.push_str("  method: string,\n");
        out.push_str("  inQuery: boolean,\n");
        out.push_str("  params: unknown,\n");
        out.push_str("): Promise<T> {\n");
        out.push_str("  const query = new URLSearchParams({ a: action });\n");
        out.push_str("  const payload = JSON.stringify(params ?? {});\n");
        out.push_str("  const init: RequestInit = { method, headers: { ...transport.headers } };\n");
        out.push_str("  if (inQuery) {\n");
        out.push_str("    query.set(\"d\", payload);\n");
        out.push_str("  } else {\n");
        out.push_str("    init.body = payload;\n");
        out.push_str(
            "    init.headers = { ...transport.headers, \"Content-Type\": \"application/json\" };\n",
        );
        out.push_str("  }\n");
        out.push_str("  const url = `${transport.baseUrl.replace(/\\/$/, \"\")}${API_PATH}?${query}`;\n");
        out.push_str("  const response = await (transport.fetch ?? fetch)(url, init);\n");
        out.push_str(
            "  const envelope = (await response.json()) as { code: number; message: string; data?: T };\n",
        );
        out.push_str("  if (envelope.code !== 200) {\n");
        out.push_str("    throw new GapiError(envelope.code, envelope.message);\n");
        out.push_str("  }\n");
        out.push_str("  return envelope.data as T;\n");
        out.push_str("}\n");

        out
    }

    fn client_action(&self, name: &'a str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let ident = self.action_ident(name)?;
        let function = self.function_name(name)?;
        let method = self.ctx.method_of(name, action)?;
        let result = self.result_type(name)?;

        let mut out = self.params_interface(name, &ident)?;
        out.push('\n');

        let mut doc = format!("Invokes the {name} action ({method}).");
        if !action.description.is_empty() {
            doc.push_str("\n\n");
            doc.push_str(&action.description);
        }
        out.push_str(&jsdoc(&doc, ""));
        out.push_str(&format!(
            "export async function {function}(transport: Transport, params: {ident}Params): Promise<{result}> {{\n"
        ));
        out.push_str(&format!(
            "  return invoke<{result}>(transport, {}, {}, {}, params);\n",
            string_literal(name),
            string_literal(&method.to_string()),
            method.payload_in_query(),
        ));
        out.push_str("}\n");

        Ok(out)
    }
}

impl Builder for TypeScriptBuilder<'_> {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn kind(&self) -> OutputKind {
        self.ctx.kind
    }

    fn build_header(&self) -> Result<String, BuildError> {
        if self.schema().description.is_empty() {
            return Ok(String::new());
        }
        Ok(jsdoc(&self.schema().description, ""))
    }

    fn build_imports(&self) -> Result<String, BuildError> {
        let mut aliases = SymbolTable::new();
        // module -> statement
        let mut imports = BTreeMap::new();

        if self.ctx.kind == OutputKind::Server && self.has_actions() {
            let runtime = self.external_runtime().unwrap_or(RUNTIME_SPECIFIER);
            imports.insert(
                runtime.to_string(),
                format!(
                    "import type {{ ActionContext, ActionRegistry }} from {};",
                    string_literal(runtime)
                ),
            );
        }

        for module in self.ctx.used_modules() {
            let alias = crate::schema::module_alias(module);
            aliases.claim(&alias, format!("import \"{module}\""))?;
            imports.entry(module.to_string()).or_insert_with(|| {
                format!("import type * as {alias} from {};", string_literal(module))
            });
        }

        Ok(imports
            .into_values()
            .map(|statement| statement + "\n")
            .collect())
    }

    fn build_type_definitions(&self) -> Result<String, BuildError> {
        self.check_symbols()?;

        let mut blocks = Vec::new();
        for (name, definition) in &self.schema().definitions {
            if definition.import.is_some() {
                continue;
            }

            let type_name = naming::type_name(name);
            let properties = self.properties(
                &format!("definition '{name}'"),
                definition.attributes.iter().map(|a| {
                    (
                        a.name.as_str(),
                        a.type_name.as_str(),
                        a.required,
                        a.description.as_str(),
                    )
                }),
            )?;
            let doc = if definition.description.is_empty() {
                format!("Generated from the {name} definition.")
            } else {
                definition.description.clone()
            };
            blocks.push(interface_decl(&type_name, &doc, &properties));
        }

        Ok(join_blocks(blocks))
    }

    fn build_server_actions(&self) -> Result<String, BuildError> {
        if !self.has_actions() {
            return Ok(String::new());
        }

        let mut blocks = self
            .schema()
            .actions
            .keys()
            .map(|name| self.server_action(name))
            .collect::<Result<Vec<_>, _>>()?;
        blocks.push(self.handler_set()?);

        Ok(join_blocks(blocks))
    }

    fn build_client_actions(&self) -> Result<String, BuildError> {
        let mut blocks = vec![self.client_runtime()];
        for name in self.schema().actions.keys() {
            blocks.push(self.client_action(name)?);
        }
        Ok(join_blocks(blocks))
    }

    fn build_companions(&self) -> Result<Vec<Companion>, BuildError> {
        if self.ctx.kind != OutputKind::Server || !self.has_actions() || self.external_runtime().is_some() {
            return Ok(Vec::new());
        }

        Ok(vec![Companion {
            file_name: RUNTIME_FILE.to_string(),
            fragments: Fragments {
                types: RUNTIME_SOURCE.to_string(),
                ..Fragments::default()
            },
        }])
    }
}

fn primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String | Primitive::Bytes => "string",
        Primitive::Bool => "boolean",
        Primitive::Int
        | Primitive::Int32
        | Primitive::Int64
        | Primitive::Uint
        | Primitive::Uint32
        | Primitive::Uint64
        | Primitive::Float32
        | Primitive::Float64 => "number",
        Primitive::Any => "unknown",
    }
}

fn render(resolved: &ResolvedType<'_>) -> String {
    match resolved {
        ResolvedType::Primitive(p) => primitive(*p).to_string(),
        ResolvedType::Local(name) => naming::type_name(name),
        ResolvedType::Imported { alias, name, .. } => format!("{alias}.{name}"),
        ResolvedType::List(inner) => format!("{}[]", render(inner)),
    }
}

/// Renders `text` as a JSDoc block, single-line when it fits on one line.
///
/// A `*/` inside the text is written as `*\/` so it cannot end the comment.
fn jsdoc(text: &str, indent: &str) -> String {
    let text = text.replace("*/", "*\\/");
    let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
    if let [line] = lines.as_slice() {
        return format!("{indent}/** {line} */\n");
    }

    let mut out = format!("{indent}/**\n");
    out.push_str(&comment_lines(&text, &format!("{indent} * ")));
    out.push_str(&format!("{indent} */\n"));
    out
}

fn interface_decl(name: &str, doc: &str, properties: &[Property]) -> String {
    let mut out = jsdoc(doc, "");
    if properties.is_empty() {
        out.push_str(&format!("export interface {name} {{}}\n"));
        return out;
    }

    out.push_str(&format!("export interface {name} {{\n"));
    for property in properties {
        if !property.doc.is_empty() {
            out.push_str(&jsdoc(&property.doc, "  "));
        }
        let marker = if property.optional { "?" } else { "" };
        out.push_str(&format!(
            "  {}{marker}: {};\n",
            property.key, property.ts_type
        ));
    }
    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Action, Attribute, Definition, Import, OutputTarget, Parameter, ReturnSpec,
    };

    fn attribute(name: &str, type_name: &str, required: bool) -> Attribute {
        Attribute {
            name: name.to_string(),
            type_name: type_name.to_string(),
            required,
            description: String::new(),
        }
    }

    fn schema() -> Schema {
        let mut schema = Schema {
            version: "gapi".to_string(),
            api_path: "/gapi".to_string(),
            description: String::new(),
            outputs: vec![],
            definitions: Default::default(),
            actions: Default::default(),
        };
        schema.definitions.insert(
            "User".to_string(),
            Definition {
                description: "A registered account.".to_string(),
                attributes: vec![
                    attribute("id", "string", true),
                    attribute("age", "int32", false),
                    attribute("content-type", "string", false),
                    attribute("friends", "User[]", true),
                    attribute("avatar", "shared.Image", false),
                ],
                ..Definition::default()
            },
        );
        schema.definitions.insert(
            "Image".to_string(),
            Definition {
                import: Some(Import {
                    from: "@acme/shared".to_string(),
                    name: "Image".to_string(),
                }),
                ..Definition::default()
            },
        );
        schema.actions.insert(
            "GetUser".to_string(),
            Action {
                method: "GET".to_string(),
                parameters: vec![Parameter {
                    name: "id".to_string(),
                    type_name: "string".to_string(),
                    required: true,
                    description: String::new(),
                }],
                returns: vec![ReturnSpec {
                    type_name: "User".to_string(),
                    description: String::new(),
                }],
                ..Action::default()
            },
        );
        schema
    }

    fn target(kind: &str) -> OutputTarget {
        OutputTarget {
            kind: kind.to_string(),
            language: "typescript".to_string(),
            package_name: None,
            file_path: "api.ts".to_string(),
            runtime: None,
        }
    }

    fn build(schema: &Schema, target: &OutputTarget) -> Result<crate::builder::Fragments, BuildError> {
        TypeScriptBuilder::new(BuildContext::new(schema, target).unwrap()).build()
    }

    #[test]
    fn interfaces_mark_optional_fields_and_quote_keys() {
        let schema = schema();
        let fragments = build(&schema, &target("client")).unwrap();

        let expected = "\
/** A registered account. */
export interface User {
  id: string;
  age?: number;
  \"content-type\"?: string;
  friends: User[];
  avatar?: shared.Image;
}";
        assert_eq!(fragments.types, expected);
    }

    #[test]
    fn imports_are_type_only_and_sorted() {
        let schema = schema();

        let client = build(&schema, &target("client")).unwrap();
        assert_eq!(client.imports, "import type * as shared from \"@acme/shared\";\n");

        let server = build(&schema, &target("server")).unwrap();
        assert_eq!(
            server.imports,
            "import type * as shared from \"@acme/shared\";\n\
             import type { ActionContext, ActionRegistry } from \"./gapi-runtime\";\n"
        );
    }

    #[test]
    fn server_registers_typed_handlers() {
        let schema = schema();
        let fragments = build(&schema, &target("server")).unwrap();

        assert!(fragments.actions.contains(
            "export type GetUserHandler = (ctx: ActionContext, params: GetUserParams) => Promise<User>;"
        ));
        assert!(fragments.actions.contains(
            "registry.register(\"GetUser\", \"GET\", (ctx, params) => handler(ctx, params as GetUserParams));"
        ));
        assert!(fragments.actions.contains("  GetUser: GetUserHandler;\n"));
        assert!(fragments.actions.contains("registerGetUser(registry, handlers.GetUser);"));
    }

    #[test]
    fn client_functions_are_camel_case() {
        let schema = schema();
        let fragments = build(&schema, &target("client")).unwrap();

        assert!(fragments.actions.contains(
            "export async function getUser(transport: Transport, params: GetUserParams): Promise<User> {"
        ));
        assert!(
            fragments
                .actions
                .contains("return invoke<User>(transport, \"GetUser\", \"GET\", true, params);")
        );
        assert!(fragments.actions.contains("export const API_PATH = \"/gapi\";"));
    }

    #[test]
    fn return_arity_shapes_the_promise() {
        let mut schema = schema();
        schema.actions.insert(
            "Ping".to_string(),
            Action {
                method: "post".to_string(),
                ..Action::default()
            },
        );
        schema.actions.insert(
            "Stats".to_string(),
            Action {
                method: "PUT".to_string(),
                returns: vec![
                    ReturnSpec {
                        type_name: "int64".to_string(),
                        description: String::new(),
                    },
                    ReturnSpec {
                        type_name: "bool".to_string(),
                        description: String::new(),
                    },
                ],
                ..Action::default()
            },
        );

        let fragments = build(&schema, &target("client")).unwrap();
        assert!(fragments.actions.contains("Promise<void>"));
        assert!(fragments.actions.contains("Promise<[number, boolean]>"));
        assert!(fragments.actions.contains("\"Ping\", \"POST\", false, params"));
    }

    #[test]
    fn reserved_function_names_get_a_suffix() {
        let mut schema = schema();
        schema.actions.insert(
            "Delete".to_string(),
            Action {
                method: "DELETE".to_string(),
                ..Action::default()
            },
        );

        let fragments = build(&schema, &target("client")).unwrap();
        assert!(fragments.actions.contains("export async function deleteAction("));
    }

    #[test]
    fn duplicate_property_names_fail() {
        let mut schema = schema();
        schema
            .definitions
            .get_mut("User")
            .unwrap()
            .attributes
            .push(attribute("id", "int", false));

        assert!(matches!(
            build(&schema, &target("client")),
            Err(BuildError::NameCollision { .. })
        ));
    }

    #[test]
    fn case_colliding_actions_fail() {
        let mut schema = schema();
        schema.actions.insert(
            "getUser".to_string(),
            Action {
                method: "GET".to_string(),
                ..Action::default()
            },
        );

        match build(&schema, &target("server")).unwrap_err() {
            BuildError::NameCollision { symbol, .. } => assert_eq!(symbol, "GetUserParams"),
            other => panic!("expected NameCollision, got {other:?}"),
        }
    }

    #[test]
    fn multiline_descriptions_use_block_comments() {
        assert_eq!(jsdoc("one\ntwo", ""), "/**\n * one\n * two\n */\n");
        assert_eq!(jsdoc("one", "  "), "  /** one */\n");
    }

    #[test]
    fn comment_terminators_in_descriptions_are_escaped() {
        assert_eq!(jsdoc("ends */ here", ""), "/** ends *\\/ here */\n");

        let mut schema = schema();
        schema.definitions.get_mut("User").unwrap().description = "ends */ here".to_string();
        let fragments = build(&schema, &target("client")).unwrap();
        assert!(fragments.types.starts_with("/** ends *\\/ here */\n"));
    }

    #[test]
    fn server_output_ships_the_runtime_it_imports() {
        let schema = schema();
        let target = target("server");
        let builder = TypeScriptBuilder::new(BuildContext::new(&schema, &target).unwrap());
        let server = builder.build().unwrap();
        let companions = builder.build_companions().unwrap();

        assert_eq!(companions.len(), 1);
        assert_eq!(companions[0].file_name, RUNTIME_FILE);
        assert_eq!(
            RUNTIME_FILE.strip_suffix(".ts"),
            RUNTIME_SPECIFIER.strip_prefix("./")
        );
        assert!(server.imports.contains("from \"./gapi-runtime\";"));

        let runtime = &companions[0].fragments.types;
        assert!(runtime.contains("export interface ActionContext {"));
        assert!(runtime.contains("export class ActionRegistry {"));
        assert!(runtime.contains("register(action: string, method: string, handler: ActionHandler): void {"));
        assert!(server.actions.contains("registry.register("));
    }

    #[test]
    fn external_runtime_replaces_the_emitted_one() {
        let schema = schema();
        let mut target = target("server");
        target.runtime = Some("@acme/gapi".to_string());
        let builder = TypeScriptBuilder::new(BuildContext::new(&schema, &target).unwrap());

        assert!(builder.build().unwrap().imports.contains("from \"@acme/gapi\";"));
        assert!(builder.build_companions().unwrap().is_empty());

        let client = self::target("client");
        let builder = TypeScriptBuilder::new(BuildContext::new(&schema, &client).unwrap());
        assert!(builder.build_companions().unwrap().is_empty());
    }
}
