use super::super::traits::{SqlGenerator, escape_identifier};
use crate::ast::CastType;

pub struct SqliteGenerator;

impl SqlGenerator for SqliteGenerator {
    fn quote_identifier(&self, id: &str) -> String {
        escape_identifier(id)
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn cast_type(&self, cast: CastType) -> Option<&'static str> {
        match cast {
            CastType::Char | CastType::Nchar | CastType::Text => Some("TEXT"),
            CastType::Signed | CastType::Integer => Some("INTEGER"),
            CastType::Decimal => Some("NUMERIC"),
            CastType::Real | CastType::Float => Some("REAL"),
            CastType::Binary => Some("BLOB"),
            // dates are plain text here; use the date wrapper instead
            CastType::Date
            | CastType::DateTime
            | CastType::Time
            | CastType::Timestamp
            | CastType::Unsigned
            | CastType::Json
            | CastType::Boolean => None,
        }
    }

    fn unbounded_limit(&self) -> Option<&'static str> {
        Some("-1")
    }

    fn json_agg_function(&self) -> &'static str {
        "JSON_GROUP_ARRAY"
    }
}
