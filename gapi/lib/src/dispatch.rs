//! Action-dispatch runtime.
//!
//! Generated server code registers one handler per schema action into a
//! registry like this one, and a single HTTP endpoint feeds every request
//! through [`ActionRegistry::dispatch`]. The wire contract:
//!
//! - query parameter `a` names the action
//! - query parameter `d` carries the JSON payload; when absent or empty the
//!   request body is read instead
//! - the response is always an [`Envelope`] `{code, message, data}` served
//!   with HTTP status 200; a handler answering code `0` is reported as `200`
//!
//! Reserved codes are the `CODE_*` constants of this module.
//!
//! ```
//! use gapi_lib::dispatch::{ActionRegistry, CODE_OK};
//! use gapi_lib::schema::HttpMethod;
//! use serde_json::json;
//!
//! let registry = ActionRegistry::builder()
//!     .register_json("Echo", HttpMethod::Post, |params: serde_json::Value| {
//!         Ok::<_, String>(params)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let reply = registry.dispatch("a=Echo", "POST", &br#"{"x":1}"#[..]);
//! assert_eq!(reply.code, CODE_OK);
//! assert_eq!(reply.data, json!({"x": 1}));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::DispatchError;
use crate::schema::HttpMethod;

/// Success.
pub const CODE_OK: i32 = 200;
/// No action is registered under the requested name.
pub const CODE_ACTION_NOT_FOUND: i32 = 1001;
/// The request body could not be read.
pub const CODE_READ_DATA: i32 = 1002;
/// The action is bound to a different HTTP method.
pub const CODE_METHOD_NOT_ALLOWED: i32 = 1003;
/// The payload is not valid JSON for the action's parameters.
pub const CODE_INVALID_PAYLOAD: i32 = 1004;
/// The handler reported an error.
pub const CODE_HANDLER_FAILED: i32 = 1005;

/// Body written when an envelope cannot be serialized.
const FALLBACK_BODY: &[u8] = br#"{"code":500,"message":"Internal Server Error"}"#;

/// The JSON response of every dispatched request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            code: CODE_OK,
            message: String::new(),
            data,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: Value::Null,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == CODE_OK
    }

    /// Serialized response body.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|_| FALLBACK_BODY.to_vec())
    }
}

/// What a handler sees of the request.
#[derive(Debug)]
pub struct ActionContext<'a> {
    action: &'a str,
    method: HttpMethod,
    data: &'a [u8],
}

impl<'a> ActionContext<'a> {
    pub fn action(&self) -> &'a str {
        self.action
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Raw payload bytes, from `d` or the body.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Decodes the payload; an empty payload decodes as `{}`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.data.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(self.data)
        }
    }
}

type Handler = Box<dyn Fn(&ActionContext<'_>) -> Envelope + Send + Sync>;

struct Binding {
    method: HttpMethod,
    handler: Handler,
}

/// Collects handlers before freezing them into an [`ActionRegistry`].
#[derive(Default)]
pub struct ActionRegistryBuilder {
    bindings: Vec<(String, Binding)>,
}

impl ActionRegistryBuilder {
    /// Binds a raw handler to `action`.
    pub fn register<F>(mut self, action: impl Into<String>, method: HttpMethod, handler: F) -> Self
    where
        F: Fn(&ActionContext<'_>) -> Envelope + Send + Sync + 'static,
    {
        self.bindings.push((
            action.into(),
            Binding {
                method,
                handler: Box::new(handler),
            },
        ));
        self
    }

    /// Binds a typed handler: the payload is decoded into `P` and the
    /// returned `R` becomes the envelope's `data`.
    pub fn register_json<P, R, E, F>(self, action: impl Into<String>, method: HttpMethod, handler: F) -> Self
    where
        P: DeserializeOwned + 'static,
        R: Serialize + 'static,
        E: fmt::Display + 'static,
        F: Fn(P) -> Result<R, E> + Send + Sync + 'static,
    {
        self.register(action, method, move |ctx| {
            let params = match ctx.decode::<P>() {
                Ok(params) => params,
                Err(err) => return Envelope::error(CODE_INVALID_PAYLOAD, err.to_string()),
            };
            match handler(params) {
                Ok(result) => match serde_json::to_value(result) {
                    Ok(data) => Envelope::ok(data),
                    Err(err) => Envelope::error(CODE_HANDLER_FAILED, err.to_string()),
                },
                Err(err) => Envelope::error(CODE_HANDLER_FAILED, err.to_string()),
            }
        })
    }

    /// Freezes the registry.
    ///
    /// ## Errors
    ///
    /// `DispatchError::DuplicateAction` when a name was registered twice.
    pub fn build(self) -> Result<ActionRegistry, DispatchError> {
        let mut actions = BTreeMap::new();
        for (name, binding) in self.bindings {
            if actions.contains_key(&name) {
                return Err(DispatchError::DuplicateAction(name));
            }
            actions.insert(name, binding);
        }
        Ok(ActionRegistry { actions })
    }
}

/// Immutable action name → handler table.
pub struct ActionRegistry {
    actions: BTreeMap<String, Binding>,
}

impl fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.actions.iter().map(|(name, b)| (name, b.method)))
            .finish()
    }
}

impl ActionRegistry {
    pub fn builder() -> ActionRegistryBuilder {
        ActionRegistryBuilder::default()
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.actions.keys().map(String::as_str)
    }

    pub fn method_of(&self, action: &str) -> Option<HttpMethod> {
        self.actions.get(action).map(|b| b.method)
    }

    /// Handles one request.
    ///
    /// `query` is the raw query string (a leading `?` is ignored), `method`
    /// the request's HTTP method and `body` the unread request body.
    pub fn dispatch(&self, query: &str, method: &str, mut body: impl Read) -> Envelope {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut action = String::new();
        let mut data = String::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "a" if action.is_empty() => action = value.into_owned(),
                "d" if data.is_empty() => data = value.into_owned(),
                _ => {}
            }
        }

        let Some(binding) = self.actions.get(&action) else {
            debug!(action = %action, "action not found");
            return Envelope::error(CODE_ACTION_NOT_FOUND, format!("action {action} not found"));
        };

        let method = match method.parse::<HttpMethod>() {
            Ok(method) if method == binding.method => method,
            _ => {
                return Envelope::error(
                    CODE_METHOD_NOT_ALLOWED,
                    format!("action {action} requires {}, got {method}", binding.method),
                );
            }
        };

        let payload = if data.is_empty() {
            let mut buffer = Vec::new();
            if let Err(err) = body.read_to_end(&mut buffer) {
                return Envelope::error(CODE_READ_DATA, format!("read data error: {err}"));
            }
            buffer
        } else {
            data.into_bytes()
        };

        let ctx = ActionContext {
            action: &action,
            method,
            data: &payload,
        };
        let mut reply = (binding.handler)(&ctx);
        if reply.code == 0 {
            reply.code = CODE_OK;
        }
        debug!(action = %action, code = reply.code, "dispatched action");
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io;

    #[derive(Deserialize)]
    struct GetUserParams {
        id: String,
    }

    #[derive(Serialize)]
    struct User {
        id: String,
    }

    fn registry() -> ActionRegistry {
        ActionRegistry::builder()
            .register_json("GetUser", HttpMethod::Get, |params: GetUserParams| {
                if params.id.is_empty() {
                    Err("id is required")
                } else {
                    Ok(User { id: params.id })
                }
            })
            .register("Raw", HttpMethod::Post, |ctx| Envelope {
                code: 0,
                message: String::new(),
                data: json!({ "len": ctx.data().len(), "action": ctx.action() }),
            })
            .build()
            .unwrap()
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"))
        }
    }

    #[test]
    fn payload_from_query() {
        let reply = registry().dispatch("?a=GetUser&d=%7B%22id%22%3A%2242%22%7D", "GET", io::empty());
        assert_eq!(reply, Envelope::ok(json!({"id": "42"})));
    }

    #[test]
    fn payload_from_body_when_query_has_none() {
        let reply = registry().dispatch("a=Raw", "POST", &b"hello"[..]);
        assert_eq!(reply.code, CODE_OK);
        assert_eq!(reply.data, json!({"len": 5, "action": "Raw"}));
    }

    #[test]
    fn empty_d_falls_back_to_body() {
        let reply = registry().dispatch("a=Raw&d=", "POST", &b"abc"[..]);
        assert_eq!(reply.data["len"], 3);
    }

    #[test]
    fn unknown_action_is_1001() {
        let reply = registry().dispatch("a=Nope", "GET", io::empty());
        assert_eq!(reply.code, CODE_ACTION_NOT_FOUND);
        assert_eq!(reply.message, "action Nope not found");
    }

    #[test]
    fn missing_action_is_1001() {
        assert_eq!(registry().dispatch("", "GET", io::empty()).code, CODE_ACTION_NOT_FOUND);
    }

    #[test]
    fn unreadable_body_is_1002() {
        let reply = registry().dispatch("a=Raw", "POST", FailingReader);
        assert_eq!(reply.code, CODE_READ_DATA);
        assert!(reply.message.contains("connection reset"));
    }

    #[test]
    fn wrong_method_is_1003() {
        let reply = registry().dispatch("a=GetUser", "POST", io::empty());
        assert_eq!(reply.code, CODE_METHOD_NOT_ALLOWED);
    }

    #[test]
    fn method_matching_ignores_case() {
        let reply = registry().dispatch("a=Raw", "post", io::empty());
        assert_eq!(reply.code, CODE_OK);
    }

    #[test]
    fn undecodable_payload_is_1004() {
        let reply = registry().dispatch("a=GetUser&d=not-json", "GET", io::empty());
        assert_eq!(reply.code, CODE_INVALID_PAYLOAD);
    }

    #[test]
    fn handler_error_is_1005() {
        let reply = registry().dispatch("a=GetUser&d=%7B%22id%22%3A%22%22%7D", "GET", io::empty());
        assert_eq!(reply.code, CODE_HANDLER_FAILED);
        assert_eq!(reply.message, "id is required");
    }

    #[test]
    fn duplicate_registration_fails() {
        let err = ActionRegistry::builder()
            .register("A", HttpMethod::Get, |_| Envelope::default())
            .register("A", HttpMethod::Post, |_| Envelope::default())
            .build()
            .unwrap_err();
        assert_eq!(err, DispatchError::DuplicateAction("A".to_string()));
    }

    #[test]
    fn envelope_serializes_wire_fields() {
        let bytes = Envelope::error(CODE_ACTION_NOT_FOUND, "x").to_bytes();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"code": 1001, "message": "x", "data": null}));
    }

    #[test]
    fn registry_lists_actions_with_methods() {
        let registry = registry();
        assert_eq!(registry.actions().collect::<Vec<_>>(), vec!["GetUser", "Raw"]);
        assert_eq!(registry.method_of("GetUser"), Some(HttpMethod::Get));
    }
}
