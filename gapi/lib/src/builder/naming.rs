//! Identifier conventions shared by all builders.
//!
//! Every builder names generated types with [`type_name`], so a definition
//! key maps to the same symbol in server and client output regardless of
//! target language.

use std::collections::BTreeMap;

use crate::error::BuildError;

/// Converts a schema name to PascalCase.
///
/// Splits on any non-alphanumeric character and uppercases the first letter
/// of each segment; existing interior capitals are kept.
///
/// ```
/// use gapi_lib::builder::naming::pascal_case;
///
/// assert_eq!(pascal_case("user"), "User");
/// assert_eq!(pascal_case("get_user"), "GetUser");
/// assert_eq!(pascal_case("getUser"), "GetUser");
/// assert_eq!(pascal_case("HTTPServer"), "HTTPServer");
/// ```
pub fn pascal_case(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// Converts a schema name to camelCase.
///
/// A leading run of capitals is lowered as one word, so acronyms read
/// naturally.
///
/// ```
/// use gapi_lib::builder::naming::camel_case;
///
/// assert_eq!(camel_case("GetUser"), "getUser");
/// assert_eq!(camel_case("ID"), "id");
/// assert_eq!(camel_case("HTTPServer"), "httpServer");
/// assert_eq!(camel_case("list_users"), "listUsers");
/// ```
pub fn camel_case(name: &str) -> String {
    let pascal: Vec<char> = pascal_case(name).chars().collect();
    let leading_upper = pascal.iter().take_while(|c| c.is_uppercase()).count();

    let lower_until = match leading_upper {
        0 => 0,
        n if n == pascal.len() => n,
        1 => 1,
        // keep the last capital: it starts the next word
        n => n - 1,
    };

    pascal
        .iter()
        .enumerate()
        .flat_map(|(index, c)| {
            if index < lower_until {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                vec![*c]
            }
        })
        .collect()
}

/// The generated type name for a definition key.
pub fn type_name(definition: &str) -> String {
    pascal_case(definition)
}

/// Whether `name` is a plain ASCII identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Checks that a derived identifier is usable in `language`.
pub fn ensure_identifier(
    derived: String,
    source: &str,
    language: &'static str,
) -> Result<String, BuildError> {
    if is_identifier(&derived) {
        Ok(derived)
    } else {
        Err(BuildError::InvalidIdentifier {
            name: source.to_string(),
            language,
        })
    }
}

/// Tracks generated top-level symbols to catch collisions.
///
/// Two schema entities can map to one symbol (`user` and `User`, or a
/// definition `GetUserParams` next to an action `GetUser`); the first
/// claim wins and the second fails.
#[derive(Debug, Default)]
pub struct SymbolTable {
    claimed: BTreeMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `symbol` on behalf of `origin` (e.g. `definition 'User'`).
    pub fn claim(&mut self, symbol: &str, origin: impl Into<String>) -> Result<(), BuildError> {
        let origin = origin.into();
        match self.claimed.get(symbol) {
            Some(first) => Err(BuildError::NameCollision {
                symbol: symbol.to_string(),
                first: first.clone(),
                second: origin,
            }),
            None => {
                self.claimed.insert(symbol.to_string(), origin);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_handles_separators() {
        assert_eq!(pascal_case("user-profile"), "UserProfile");
        assert_eq!(pascal_case("user profile"), "UserProfile");
        assert_eq!(pascal_case("__id"), "Id");
        assert_eq!(pascal_case(""), "");
    }

    #[test]
    fn camel_case_of_single_capital() {
        assert_eq!(camel_case("A"), "a");
        assert_eq!(camel_case("x"), "x");
    }

    #[test]
    fn identifier_rules() {
        assert!(is_identifier("User"));
        assert!(is_identifier("_private"));
        assert!(!is_identifier("1User"));
        assert!(!is_identifier("content-type"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn ensure_identifier_reports_source_name() {
        let err = ensure_identifier(pascal_case("9lives"), "9lives", "Go").unwrap_err();
        assert_eq!(
            err,
            BuildError::InvalidIdentifier {
                name: "9lives".to_string(),
                language: "Go",
            }
        );
    }

    #[test]
    fn symbol_table_reports_both_origins() {
        let mut table = SymbolTable::new();
        table.claim("User", "definition 'user'").unwrap();

        let err = table.claim("User", "definition 'User'").unwrap_err();
        assert_eq!(
            err.to_string(),
            "generated symbol 'User' is produced by both definition 'user' and definition 'User'"
        );
    }
}
