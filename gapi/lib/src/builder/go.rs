//! Go builder.
//!
//! Definitions become structs with `json` tags. Optional fields are pointers
//! with `omitempty`, except for types that are already nilable (slices,
//! `[]byte`, `any`).
//!
//! Server output registers one handler per action into a `*Registry`. By
//! default the registry comes from a runtime file emitted into the same
//! package ([`RUNTIME_FILE`]); an output with `runtime` set imports that
//! package as `gapi` instead. Client output is a self-contained `net/http`
//! client.
//!
//! Every schema import is written with an explicit alias, since a Go package
//! name need not match the last segment of its path (`.../pgx/v5`).

use std::collections::BTreeMap;

use crate::builder::naming::{self, SymbolTable, ensure_identifier, pascal_case};
use crate::builder::{
    BuildContext, Builder, Companion, Fragments, comment_lines, join_blocks, string_literal,
};
use crate::error::BuildError;
use crate::schema::{OutputKind, Primitive, ResolvedType, Schema};

const LANGUAGE: &str = "Go";

/// Name of the runtime file written next to server output.
pub const RUNTIME_FILE: &str = "gapi_runtime.go";

/// Runtime source without its package clause.
const RUNTIME_SOURCE: &str = include_str!("../../runtime/runtime.go");

/// Package-level names the emitted runtime declares.
const RUNTIME_SYMBOLS: &[&str] = &[
    "Context",
    "ErrActionNotFound",
    "ErrHandlerFailed",
    "ErrInvalidPayload",
    "ErrMethodNotAllowed",
    "ErrReadData",
    "NewRegistry",
    "Registry",
    "Return",
    "binding",
];

/// Package name an external runtime is imported under.
const RUNTIME_ALIAS: &str = "gapi";

const SERVER_STDLIB: &[&str] = &["encoding/json"];

const CLIENT_STDLIB: &[&str] = &[
    "bytes",
    "context",
    "encoding/json",
    "fmt",
    "io",
    "net/http",
    "net/url",
    "strings",
];

pub struct GoBuilder<'a> {
    ctx: BuildContext<'a>,
}

struct Field {
    name: String,
    go_type: String,
    tag: String,
    doc: String,
}

/// Factory registered for this language.
pub fn boxed(ctx: BuildContext<'_>) -> Box<dyn Builder + '_> {
    Box::new(GoBuilder::new(ctx))
}

impl<'a> GoBuilder<'a> {
    pub fn new(ctx: BuildContext<'a>) -> Self {
        Self { ctx }
    }

    fn schema(&self) -> &'a Schema {
        self.ctx.schema
    }

    fn has_actions(&self) -> bool {
        !self.schema().actions.is_empty()
    }

    /// Import path of an external runtime, when the output names one.
    fn external_runtime(&self) -> Option<&'a str> {
        self.ctx
            .target
            .runtime
            .as_deref()
            .filter(|runtime| !runtime.is_empty())
    }

    /// Whether the runtime file is emitted next to this output.
    fn emits_runtime(&self) -> bool {
        self.ctx.kind == OutputKind::Server && self.has_actions() && self.external_runtime().is_none()
    }

    /// A runtime symbol as server code refers to it.
    fn rt(&self, symbol: &str) -> String {
        match self.external_runtime() {
            Some(_) => format!("{RUNTIME_ALIAS}.{symbol}"),
            None => symbol.to_string(),
        }
    }

    fn package(&self) -> Result<String, BuildError> {
        let package = self
            .ctx
            .target
            .package_name
            .as_deref()
            .filter(|package| !package.is_empty())
            .ok_or(BuildError::MissingPackage { language: LANGUAGE })?;
        ensure_identifier(package.to_string(), package, LANGUAGE)
    }

    fn stdlib_imports(&self) -> &'static [&'static str] {
        match self.ctx.kind {
            OutputKind::Server if self.has_actions() => SERVER_STDLIB,
            OutputKind::Server => &[],
            OutputKind::Client => CLIENT_STDLIB,
        }
    }

    fn go_type(&self, raw: &'a str, required: bool) -> Result<String, BuildError> {
        let resolved = self.ctx.resolve(raw, LANGUAGE)?;
        let rendered = render(&resolved);
        if required || is_nilable(&resolved) {
            Ok(rendered)
        } else {
            Ok(format!("*{rendered}"))
        }
    }

    fn action_ident(&self, action: &str) -> Result<String, BuildError> {
        ensure_identifier(pascal_case(action), action, LANGUAGE)
    }

    /// Claims every top-level symbol this output will declare.
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
            if self.ctx.kind == OutputKind::Server {
                symbols.claim(&format!("{ident}Handler"), origin.clone())?;
                symbols.claim(&format!("Register{ident}"), origin)?;
            }
        }

        match self.ctx.kind {
            OutputKind::Server if self.has_actions() => {
                symbols.claim("Handlers", "the handler set")?;
                if self.emits_runtime() {
                    for symbol in RUNTIME_SYMBOLS {
                        symbols.claim(symbol, "the dispatch runtime")?;
                    }
                }

                // Handlers has one field per action next to its Register method.
                let mut members = SymbolTable::new();
                members.claim("Register", "the Handlers.Register method")?;
                for name in self.schema().actions.keys() {
                    members.claim(&self.action_ident(name)?, format!("action '{name}'"))?;
                }
            }
            OutputKind::Server => {}
            OutputKind::Client => {
                for symbol in ["Error", "Client", "NewClient"] {
                    symbols.claim(symbol, "the client runtime")?;
                }
            }
        }

        Ok(())
    }

    fn fields<I>(&self, owner: &str, entries: I) -> Result<Vec<Field>, BuildError>
    where
        I: IntoIterator<Item = (&'a str, &'a str, bool, &'a str)>,
    {
        let mut names = SymbolTable::new();
        let mut fields = Vec::new();

        for (name, type_name, required, description) in entries {
            let field_name = ensure_identifier(pascal_case(name), name, LANGUAGE)?;
            names.claim(&field_name, format!("{owner} field '{name}'"))?;
            fields.push(Field {
                name: field_name,
                go_type: self.go_type(type_name, required)?,
                tag: json_tag(name, required),
                doc: description.to_string(),
            });
        }

        Ok(fields)
    }

    fn params_struct(&self, name: &'a str, ident: &str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let fields = self.fields(
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
        let doc = format!("{ident}Params carries the parameters of the {name} action.");
        Ok(struct_decl(&format!("{ident}Params"), &doc, &fields))
    }

    fn return_types(&self, name: &'a str) -> Result<Vec<String>, BuildError> {
        self.schema().actions[name]
            .returns
            .iter()
            .map(|ret| self.go_type(&ret.type_name, true))
            .collect()
    }

    fn server_action(&self, name: &'a str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let ident = self.action_ident(name)?;
        let method = self.ctx.method_of(name, action)?;
        let returns = self.return_types(name)?;

        let mut out = self.params_struct(name, &ident)?;
        out.push('\n');

        let mut handler_doc = format!("{ident}Handler implements the {name} action.");
        if !action.description.is_empty() {
            handler_doc.push_str("\n\n");
            handler_doc.push_str(&action.description);
        }
        out.push_str(&comment_lines(&handler_doc, "// "));
        let context = self.rt("Context");
        let registry = self.rt("Registry");
        let ret = self.rt("Return");
        let mut results = returns.clone();
        results.push("error".to_string());
        let results = if results.len() == 1 {
            results.remove(0)
        } else {
            format!("({})", results.join(", "))
        };
        out.push_str(&format!(
            "type {ident}Handler func(ctx *{context}, params *{ident}Params) {results}\n\n"
        ));

        out.push_str(&format!(
            "// Register{ident} binds handler to the {name} action ({method}).\n"
        ));
        out.push_str(&format!(
            "func Register{ident}(registry *{registry}, handler {ident}Handler) {{\n"
        ));
        out.push_str(&format!(
            "\tregistry.Register({}, {}, func(ctx *{context}) {ret} {{\n",
            string_literal(name),
            string_literal(&method.to_string()),
        ));
        out.push_str(&format!("\t\tvar params {ident}Params\n"));
        out.push_str("\t\tif data := ctx.Data(); len(data) > 0 {\n");
        out.push_str("\t\t\tif err := json.Unmarshal(data, &params); err != nil {\n");
        out.push_str(&format!(
            "\t\t\t\treturn {ret}{{Code: {}, Message: err.Error()}}\n",
            self.rt("ErrInvalidPayload")
        ));
        out.push_str("\t\t\t}\n");
        out.push_str("\t\t}\n");

        let values: Vec<String> = (0..returns.len()).map(|i| format!("r{i}")).collect();
        let failure = format!(
            "\t\t\treturn {ret}{{Code: {}, Message: err.Error()}}\n",
            self.rt("ErrHandlerFailed")
        );
        if values.is_empty() {
            out.push_str("\t\tif err := handler(ctx, &params); err != nil {\n");
            out.push_str(&failure);
            out.push_str("\t\t}\n");
            out.push_str(&format!("\t\treturn {ret}{{}}\n"));
        } else {
            out.push_str(&format!(
                "\t\t{}, err := handler(ctx, &params)\n",
                values.join(", ")
            ));
            out.push_str("\t\tif err != nil {\n");
            out.push_str(&failure);
            out.push_str("\t\t}\n");
            let data = if values.len() == 1 {
                values[0].clone()
            } else {
                format!("[]any{{{}}}", values.join(", "))
            };
            out.push_str(&format!("\t\treturn {ret}{{Data: {data}}}\n"));
        }
        out.push_str("\t})\n");
        out.push_str("}\n");

        Ok(out)
    }

    fn handler_set(&self) -> Result<String, BuildError> {
        let idents = self
            .ctx
            .schema
            .actions
            .keys()
            .map(|name| self.action_ident(name))
            .collect::<Result<Vec<_>, _>>()?;
        let width = idents.iter().map(String::len).max().unwrap_or(0);

        let mut out = String::from("// Handlers holds one implementation per action.\n");
        out.push_str("type Handlers struct {\n");
        for ident in &idents {
            out.push_str(&format!("\t{ident:<width$} {ident}Handler\n"));
        }
        out.push_str("}\n\n");

        out.push_str("// Register binds every non-nil handler in h to registry.\n");
        out.push_str(&format!(
            "func (h Handlers) Register(registry *{}) {{\n",
            self.rt("Registry")
        ));
        for ident in &idents {
            out.push_str(&format!("\tif h.{ident} != nil {{\n"));
            out.push_str(&format!("\t\tRegister{ident}(registry, h.{ident})\n"));
            out.push_str("\t}\n");
        }
        out.push_str("}\n");

        Ok(out)
    }

    fn client_runtime(&self) -> String {
        let api_path = string_literal(&self.schema().api_path);
        let mut out = String::new();

        out.push_str("// Error is returned when the server answers with a non-success code.\n");
        out.push_str("type Error struct {\n");
        out.push_str("\tCode    int\n");
        out.push_str("\tMessage string\n");
        out.push_str("}\n\n");
        out.push_str("func (e *Error) Error() string {\n");
        out.push_str("\treturn fmt.Sprintf(\"gapi: code %d: %s\", e.Code, e.Message)\n");
        out.push_str("}\n\n");

        out.push_str("// Client invokes actions on a gapi dispatch endpoint.\n");
        out.push_str("type Client struct {\n");
        out.push_str("\t// Endpoint is the full URL of the dispatch endpoint.\n");
        out.push_str("\tEndpoint string\n");
        out.push_str("\tHTTP     *http.Client\n");
        out.push_str("}\n\n");

        out.push_str(&format!(
            "// NewClient returns a client for the endpoint at baseURL + {api_path}.\n"
        ));
        out.push_str("func NewClient(baseURL string) *Client {\n");
        out.push_str("\treturn &Client{\n");
        out.push_str(&format!(
            "\t\tEndpoint: strings.TrimSuffix(baseURL, \"/\") + {api_path},\n"
        ));
        out.push_str("\t\tHTTP:     http.DefaultClient,\n");
        out.push_str("\t}\n");
        out.push_str("}\n\n");

        out.push_str(
            "func (c *Client) call(ctx context.Context, action, method string, inQuery bool, params, out any) error {\n",
        );
        out.push_str("\tpayload, err := json.Marshal(params)\n");
        out.push_str("\tif err != nil {\n\t\treturn err\n\t}\n");
        out.push_str("\tquery := url.Values{\"a\": {action}}\n");
        out.push_str("\tvar body io.Reader\n");
        out.push_str("\tif inQuery {\n");
        out.push_str("\t\tquery.Set(\"d\", string(payload))\n");
        out.push_str("\t} else {\n");
        out.push_str("\t\tbody = bytes.NewReader(payload)\n");
        out.push_str("\t}\n");
        out.push_str(
            "\treq, err := http.NewRequestWithContext(ctx, method, c.Endpoint+\"?\"+query.Encode(), body)\n",
        );
        out.push_str("\tif err != nil {\n\t\treturn err\n\t}\n");
        out.push_str("\tif !inQuery {\n");
        out.push_str("\t\treq.Header.Set(\"Content-Type\", \"application/json\")\n");
        out.push_str("\t}\n");
        out.push_str("\tresp, err := c.HTTP.Do(req)\n");
        out.push_str("\tif err != nil {\n\t\treturn err\n\t}\n");
        out.push_str("\tdefer resp.Body.Close()\n\n");
        out.push_str("\tvar envelope struct {\n");
        out.push_str("\t\tCode    int             `json:\"code\"`\n");
        out.push_str("\t\tMessage string          `json:\"message\"`\n");
        out.push_str("\t\tData    json.RawMessage `json:\"data\"`\n");
        out.push_str("\t}\n");
        out.push_str("\tif err := json.NewDecoder(resp.Body).Decode(&envelope); err != nil {\n");
        out.push_str("\t\treturn err\n\t}\n");
        out.push_str("\tif envelope.Code != http.StatusOK {\n");
        out.push_str("\t\treturn &Error{Code: envelope.Code, Message: envelope.Message}\n");
        out.push_str("\t}\n");
        out.push_str("\tif out == nil || len(envelope.Data) == 0 {\n\t\treturn nil\n\t}\n");
        out.push_str("\treturn json.Unmarshal(envelope.Data, out)\n");
        out.push_str("}\n");

        out
    }

    fn client_action(&self, name: &'a str) -> Result<String, BuildError> {
        let action = &self.schema().actions[name];
        let ident = self.action_ident(name)?;
        let method = self.ctx.method_of(name, action)?;
        let returns = self.return_types(name)?;

        let mut out = self.params_struct(name, &ident)?;
        out.push('\n');

        let mut doc = format!("{ident} invokes the {name} action ({method}).");
        if !action.description.is_empty() {
            doc.push_str("\n\n");
            doc.push_str(&action.description);
        }
        out.push_str(&comment_lines(&doc, "// "));

        let call = |target: &str| {
            format!(
                "c.call(ctx, {}, {}, {}, params, {target})",
                string_literal(name),
                string_literal(&method.to_string()),
                method.payload_in_query(),
            )
        };
        let signature = format!("func (c *Client) {ident}(ctx context.Context, params *{ident}Params)");

        match returns.len() {
            0 => {
                out.push_str(&format!("{signature} error {{\n"));
                out.push_str(&format!("\treturn {}\n", call("nil")));
            }
            1 => {
                out.push_str(&format!("{signature} (r0 {}, err error) {{\n", returns[0]));
                out.push_str(&format!("\terr = {}\n", call("&r0")));
                out.push_str("\treturn\n");
            }
            n => {
                let named: Vec<String> = returns
                    .iter()
                    .enumerate()
                    .map(|(i, ty)| format!("r{i} {ty}"))
                    .collect();
                out.push_str(&format!("{signature} ({}, err error) {{\n", named.join(", ")));
                out.push_str("\tvar raw []json.RawMessage\n");
                out.push_str(&format!("\tif err = {}; err != nil {{\n", call("&raw")));
                out.push_str("\t\treturn\n\t}\n");
                out.push_str(&format!("\tif len(raw) != {n} {{\n"));
                out.push_str(&format!(
                    "\t\terr = fmt.Errorf(\"gapi: {name} returned %d values, want {n}\", len(raw))\n"
                ));
                out.push_str("\t\treturn\n\t}\n");
                for i in 0..n - 1 {
                    out.push_str(&format!(
                        "\tif err = json.Unmarshal(raw[{i}], &r{i}); err != nil {{\n\t\treturn\n\t}}\n"
                    ));
                }
                let last = n - 1;
                out.push_str(&format!("\terr = json.Unmarshal(raw[{last}], &r{last})\n"));
                out.push_str("\treturn\n");
            }
        }
        out.push_str("}\n");

        Ok(out)
    }
}

impl Builder for GoBuilder<'_> {
    fn language(&self) -> &'static str {
        LANGUAGE
    }

    fn kind(&self) -> OutputKind {
        self.ctx.kind
    }

    fn build_header(&self) -> Result<String, BuildError> {
        let package = self.package()?;

        let mut out = String::new();
        if !self.schema().description.is_empty() {
            out.push_str(&comment_lines(
                &format!("Package {package}: {}", self.schema().description),
                "// ",
            ));
        }
        out.push_str(&format!("package {package}\n"));
        Ok(out)
    }

    fn build_imports(&self) -> Result<String, BuildError> {
        let mut aliases = SymbolTable::new();
        // path -> explicit alias
        let mut imports: BTreeMap<&str, Option<String>> = BTreeMap::new();

        for path in self.stdlib_imports() {
            aliases.claim(last_segment(path), format!("import \"{path}\""))?;
            imports.insert(*path, None);
        }

        if self.ctx.kind == OutputKind::Server && self.has_actions() {
            if let Some(runtime) = self.external_runtime() {
                aliases.claim(RUNTIME_ALIAS, format!("runtime import \"{runtime}\""))?;
                imports.insert(runtime, Some(RUNTIME_ALIAS.to_string()));
            }
        }

        for module in self.ctx.used_modules() {
            if imports.contains_key(module) {
                continue;
            }
            let alias = crate::schema::module_alias(module);
            aliases.claim(&alias, format!("import \"{module}\""))?;
            imports.insert(module, Some(alias));
        }

        if imports.is_empty() {
            return Ok(String::new());
        }

        let mut out = String::from("import (\n");
        for (path, alias) in &imports {
            match alias {
                Some(alias) => out.push_str(&format!("\t{alias} {}\n", string_literal(path))),
                None => out.push_str(&format!("\t{}\n", string_literal(path))),
            }
        }
        out.push_str(")\n");
        Ok(out)
    }

    fn build_type_definitions(&self) -> Result<String, BuildError> {
        self.check_symbols()?;

        let mut blocks = Vec::new();
        for (name, definition) in &self.schema().definitions {
            if definition.import.is_some() {
                continue;
            }

            let type_name = naming::type_name(name);
            let fields = self.fields(
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
                format!("{type_name} is generated from the {name} definition.")
            } else {
                format!("{type_name} {}", definition.description)
            };
            blocks.push(struct_decl(&type_name, &doc, &fields));
        }

        Ok(join_blocks(blocks))
    }

    fn build_server_actions(&self) -> Result<String, BuildError> {
        if !self.has_actions() {
            return Ok(String::new());
        }

        let mut blocks = self
            .ctx
            .schema
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
        if !self.emits_runtime() {
            return Ok(Vec::new());
        }

        Ok(vec![Companion {
            file_name: RUNTIME_FILE.to_string(),
            fragments: Fragments {
                header: format!("package {}\n", self.package()?),
                types: RUNTIME_SOURCE.to_string(),
                ..Fragments::default()
            },
        }])
    }
}

fn primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "string",
        Primitive::Bool => "bool",
        Primitive::Int => "int",
        Primitive::Int32 => "int32",
        Primitive::Int64 => "int64",
        Primitive::Uint => "uint",
        Primitive::Uint32 => "uint32",
        Primitive::Uint64 => "uint64",
        Primitive::Float32 => "float32",
        Primitive::Float64 => "float64",
        Primitive::Bytes => "[]byte",
        Primitive::Any => "any",
    }
}

fn render(resolved: &ResolvedType<'_>) -> String {
    match resolved {
        ResolvedType::Primitive(p) => primitive(*p).to_string(),
        ResolvedType::Local(name) => naming::type_name(name),
        ResolvedType::Imported { alias, name, .. } => format!("{alias}.{name}"),
        ResolvedType::List(inner) => format!("[]{}", render(inner)),
    }
}

fn is_nilable(resolved: &ResolvedType<'_>) -> bool {
    matches!(
        resolved,
        ResolvedType::List(_)
            | ResolvedType::Primitive(Primitive::Bytes)
            | ResolvedType::Primitive(Primitive::Any)
    )
}

fn json_tag(name: &str, required: bool) -> String {
    if required {
        format!("`json:\"{name}\"`")
    } else {
        format!("`json:\"{name},omitempty\"`")
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn struct_decl(name: &str, doc: &str, fields: &[Field]) -> String {
    let mut out = comment_lines(doc, "// ");
    if fields.is_empty() {
        out.push_str(&format!("type {name} struct{{}}\n"));
        return out;
    }

    let name_width = fields.iter().map(|f| f.name.len()).max().unwrap_or(0);
    let type_width = fields.iter().map(|f| f.go_type.len()).max().unwrap_or(0);

    out.push_str(&format!("type {name} struct {{\n"));
    for field in fields {
        if !field.doc.is_empty() {
            out.push_str(&comment_lines(&field.doc, "\t// "));
        }
        out.push_str(&format!(
            "\t{:<name_width$} {:<type_width$} {}\n",
            field.name, field.go_type, field.tag
        ));
    }
    out.push_str("}\n");
    out
}
