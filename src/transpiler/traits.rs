//! Transpiler traits and utilities.

use crate::ast::CastType;

/// Quote a possibly dotted identifier (`u.col` → `"u"."col"`), doubling embedded quotes.
pub fn escape_identifier(name: &str) -> String {
    name.split('.')
        .map(escape_single_identifier)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a single identifier part, dots included.
pub fn escape_single_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Trait for dialect-specific SQL generation.
///
/// Only per-dialect spelling lives here. Anything that changes which values get bound
/// (date arithmetic, the sqlite `STRFTIME` prefix) is matched on [`Dialect`](super::Dialect)
/// by the wrapper compilers.
pub trait SqlGenerator: Sync {
    /// Inline form of an identifier path (table, `alias.column`).
    fn quote_identifier(&self, name: &str) -> String;
    /// Inline form of a single name that may itself contain dots (column aliases).
    fn quote_name(&self, name: &str) -> String {
        escape_single_identifier(name)
    }
    /// Generate the parameter placeholder (e.g., $1, ?) for a given 1-based index.
    fn placeholder(&self, index: usize) -> String;
    /// `Some` when identifiers are bound as values under their own placeholder.
    fn identifier_placeholder(&self) -> Option<&'static str> {
        None
    }
    /// Whether column aliases are bound instead of inlined.
    fn binds_aliases(&self) -> bool {
        self.identifier_placeholder().is_some()
    }
    /// Generate string concatenation expression (e.g. 'a' || 'b' vs CONCAT('a', 'b')).
    fn string_concat(&self, parts: &[&str]) -> String {
        parts.join(" || ")
    }
    /// A bound value used in text position.
    fn text_param(&self, placeholder: &str) -> String {
        placeholder.to_string()
    }
    fn if_null_function(&self) -> &'static str {
        "COALESCE"
    }
    fn substr_function(&self) -> &'static str {
        "SUBSTR"
    }
    /// Target type for `CAST(x AS ...)`, `None` when the dialect has no equivalent.
    fn cast_type(&self, cast: CastType) -> Option<&'static str>;
    /// LIMIT value standing in for "no limit" when only OFFSET is given.
    fn unbounded_limit(&self) -> Option<&'static str> {
        None
    }

    fn json_object_function(&self) -> &'static str {
        "JSON_OBJECT"
    }
    fn json_array_function(&self) -> &'static str {
        "JSON_ARRAY"
    }
    fn json_agg_function(&self) -> &'static str;
    /// Object key argument of the json builder.
    fn json_key(&self, placeholder: &str) -> String {
        self.text_param(placeholder)
    }
    /// Bound form of a dotted extraction path.
    fn json_path(&self, path: &str) -> String {
        format!("$.{}", path)
    }
    fn json_extract(&self, expr: &str, path_placeholder: &str) -> String {
        format!("JSON_EXTRACT({}, {})", expr, path_placeholder)
    }
    /// `None` when the dialect has no containment test.
    fn json_contains(&self, _expr: &str, _value_placeholder: &str) -> Option<String> {
        None
    }
}
