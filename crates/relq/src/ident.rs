//! Identifier checks for names spliced into generated SQL.
//!
//! Column names coming from a parameter map end up both in the SQL text (`name = :name`)
//! and as placeholder names, so they must be plain identifiers:
//! `[A-Za-z_][A-Za-z0-9_]*`.

use crate::error::{OrmError, OrmResult};

/// Validate a plain (unquoted, undotted) identifier.
pub fn check_ident(name: &str) -> OrmResult<&str> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(OrmError::validation("Identifier cannot be empty"));
    };
    if !(first == '_' || first.is_ascii_alphabetic()) {
        return Err(OrmError::validation(format!(
            "Invalid identifier start character: '{first}' in '{name}'"
        )));
    }
    if let Some(c) = chars.find(|&c| !(c == '_' || c.is_ascii_alphanumeric())) {
        return Err(OrmError::validation(format!(
            "Invalid character in identifier: '{c}' in '{name}'"
        )));
    }
    Ok(name)
}

/// Validate every key of a parameter map.
pub(crate) fn check_keys<'a, I>(keys: I) -> OrmResult<()>
where
    I: IntoIterator<Item = &'a String>,
{
    for key in keys {
        check_ident(key)?;
    }
    Ok(())
}
