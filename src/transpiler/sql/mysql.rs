use crate::ast::CastType;
use crate::transpiler::traits::SqlGenerator;

/// MySQL Generator.
///
/// Identifiers never appear inline: they are bound under `??` and quoted by the driver.
pub struct MysqlGenerator;

impl SqlGenerator for MysqlGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        name.split('.')
            .map(|part| format!("`{}`", part.replace('`', "``")))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_name(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn identifier_placeholder(&self) -> Option<&'static str> {
        Some("??")
    }

    fn string_concat(&self, parts: &[&str]) -> String {
        format!("CONCAT({})", parts.join(", "))
    }

    fn if_null_function(&self) -> &'static str {
        "IFNULL"
    }

    fn substr_function(&self) -> &'static str {
        "SUBSTRING"
    }

    fn cast_type(&self, cast: CastType) -> Option<&'static str> {
        Some(match cast {
            CastType::Char | CastType::Text => "CHAR",
            CastType::Nchar => "NCHAR",
            CastType::Date => "DATE",
            CastType::DateTime | CastType::Timestamp => "DATETIME",
            CastType::Time => "TIME",
            CastType::Signed | CastType::Integer => "SIGNED",
            CastType::Unsigned => "UNSIGNED",
            CastType::Decimal => "DECIMAL",
            CastType::Real => "DOUBLE",
            CastType::Float => "FLOAT",
            CastType::Binary => "BINARY",
            CastType::Json => "JSON",
            CastType::Boolean => return None,
        })
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("18446744073709551615")
    }

    fn json_agg_function(&self) -> &'static str {
        "JSON_ARRAYAGG"
    }

    fn json_contains(&self, expr: &str, value_placeholder: &str) -> Option<String> {
        Some(format!("JSON_CONTAINS({}, {})", expr, value_placeholder))
    }
}
