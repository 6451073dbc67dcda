//! Case-aware CQL identifiers (keyspace, table and column names).

use std::fmt;

use crate::{MapperError, Result};

/// Reserved CQL keywords; identifiers matching one must be quoted.
const RESERVED_KEYWORDS: &[&str] = &[
    "add", "allow", "alter", "and", "apply", "asc", "authorize", "batch", "begin", "by",
    "columnfamily", "create", "delete", "desc", "describe", "drop", "entries", "execute", "from",
    "full", "grant", "if", "in", "index", "infinity", "insert", "into", "is", "keyspace", "limit",
    "materialized", "mbean", "mbeans", "modify", "nan", "norecursive", "not", "null", "of", "on",
    "or", "order", "primary", "rename", "replace", "revoke", "schema", "select", "set", "table",
    "to", "token", "truncate", "unlogged", "unset", "update", "use", "using", "view", "where",
    "with",
];

/// A CQL identifier stored in its internal (exact, case-sensitive) form.
///
/// `from_cql` follows CQL rules: unquoted text is case-insensitive and folds
/// to lower case, double-quoted text is taken verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CqlIdentifier {
    internal: String,
}

impl CqlIdentifier {
    /// Parses an identifier as it would appear in a CQL query.
    ///
    /// # Errors
    /// Returns `MapperError::InvalidIdentifier` for empty input or an
    /// unterminated quoted identifier.
    pub fn from_cql(cql: &str) -> Result<Self> {
        let cql = cql.trim();
        if cql.is_empty() {
            return Err(MapperError::InvalidIdentifier(cql.to_owned()));
        }
        if let Some(rest) = cql.strip_prefix('"') {
            let Some(quoted) = rest.strip_suffix('"') else {
                return Err(MapperError::InvalidIdentifier(cql.to_owned()));
            };
            if quoted.is_empty() {
                return Err(MapperError::InvalidIdentifier(cql.to_owned()));
            }
            return Ok(Self {
                internal: quoted.replace("\"\"", "\""),
            });
        }
        Ok(Self {
            internal: cql.to_lowercase(),
        })
    }

    /// Wraps an identifier already in internal form (no case folding).
    #[must_use]
    pub fn from_internal(internal: impl Into<String>) -> Self {
        Self {
            internal: internal.into(),
        }
    }

    #[must_use]
    pub fn as_internal(&self) -> &str {
        &self.internal
    }

    /// Renders the identifier for inclusion in a query.
    ///
    /// With `pretty` the identifier is quoted only when required; otherwise
    /// it is always quoted.
    #[must_use]
    pub fn as_cql(&self, pretty: bool) -> String {
        if pretty && !self.needs_quotes() {
            self.internal.clone()
        } else {
            format!("\"{}\"", self.internal.replace('"', "\"\""))
        }
    }

    fn needs_quotes(&self) -> bool {
        let mut chars = self.internal.chars();
        let simple = chars.next().is_some_and(|c| c.is_ascii_lowercase())
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        !simple || RESERVED_KEYWORDS.contains(&self.internal.as_str())
    }
}

impl fmt::Display for CqlIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_cql(true))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_unquoted_folds_to_lowercase() {
        let id = CqlIdentifier::from_cql("Lombok").unwrap();
        assert_eq!(id.as_internal(), "lombok");
        assert_eq!(id.as_cql(true), "lombok");
        assert_eq!(id.as_cql(false), "\"lombok\"");
    }

    #[test]
    fn test_quoted_is_case_sensitive() {
        let id = CqlIdentifier::from_cql("\"MyKeyspace\"").unwrap();
        assert_eq!(id.as_internal(), "MyKeyspace");
        assert_eq!(id.as_cql(true), "\"MyKeyspace\"");
        assert_eq!(id.to_string(), "\"MyKeyspace\"");
    }

    #[test]
    fn test_embedded_quotes_are_escaped() {
        let id = CqlIdentifier::from_cql("\"a\"\"b\"").unwrap();
        assert_eq!(id.as_internal(), "a\"b");
        assert_eq!(id.as_cql(true), "\"a\"\"b\"");
    }

    #[test]
    fn test_reserved_keyword_is_quoted() {
        let id = CqlIdentifier::from_internal("table");
        assert_eq!(id.as_cql(true), "\"table\"");
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(CqlIdentifier::from_cql("").is_err());
        assert!(CqlIdentifier::from_cql("\"open").is_err());
        assert!(CqlIdentifier::from_cql("\"\"").is_err());
    }
}
