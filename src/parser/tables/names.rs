// src/parser/tables/names.rs
// Identifier-safe names for symbols, used as enum constants in the emitted
// artifacts (`NT_<name>`, `T_<name>`).

use hashbrown::HashMap;

use crate::{
    error::{Error, Result},
    grammar::EOF,
};

const PUNCTUATION: &[(&str, &str)] = &[
    ("(", "LPAREN"),
    (")", "RPAREN"),
    ("[", "LBRACKET"),
    ("]", "RBRACKET"),
    ("{", "LBRACE"),
    ("}", "RBRACE"),
    ("+", "PLUS"),
    ("-", "MINUS"),
    ("*", "ASTERISK"),
    ("/", "SLASH"),
    ("%", "PERCENT"),
    ("^", "CARET"),
    ("//", "DOUBLE_SLASH"),
    ("=", "EQUALS"),
    ("~=", "TILDE_EQUALS"),
    ("..", "DOUBLE_DOT"),
    ("...", "ELLIPSIS"),
    (".", "DOT"),
    ("#", "HASH"),
    (":", "COLON"),
    (";", "SEMICOLON"),
    ("<", "LT"),
    (">", "GT"),
    ("<=", "LTE"),
    (">=", "GTE"),
    ("==", "DOUBLE_EQUALS"),
    (",", "COMMA"),
];

/// `$` -> `EOF`, `<func-decl>` -> `FUNC_DECL`, `~=` -> `TILDE_EQUALS`,
/// anything else is uppercased.
pub fn token_name(display: &str) -> String {
    if display == EOF {
        return "EOF".to_string();
    }
    if display.len() > 2 && display.starts_with('<') && display.ends_with('>') {
        return display[1..display.len() - 1]
            .replace('-', "_")
            .to_uppercase();
    }
    PUNCTUATION
        .iter()
        .find(|(lit, _)| *lit == display)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| display.to_uppercase())
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Names for one symbol kind, in the given order. Fails on a name that is not
/// an identifier or on two symbols sharing a name.
pub fn token_names(displays: &[String]) -> Result<Vec<String>> {
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(displays.len());
    let mut out = Vec::with_capacity(displays.len());
    for display in displays {
        let name = token_name(display);
        if !is_identifier(&name) {
            return Err(Error::InvalidSymbolName {
                display: display.clone(),
                name,
            });
        }
        if let Some(first) = owners.insert(name.clone(), display) {
            return Err(Error::DuplicateSymbolName {
                name,
                first: first.to_string(),
                second: display.clone(),
            });
        }
        out.push(name);
    }
    Ok(out)
}
