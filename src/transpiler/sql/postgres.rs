use crate::ast::CastType;
use crate::transpiler::escape_identifier;
use crate::transpiler::traits::SqlGenerator;

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn quote_identifier(&self, name: &str) -> String {
        escape_identifier(name)
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    // untyped parameters next to `||` or inside json_build_object fail to infer
    fn text_param(&self, placeholder: &str) -> String {
        format!("CAST({} AS TEXT)", placeholder)
    }

    fn cast_type(&self, cast: CastType) -> Option<&'static str> {
        Some(match cast {
            CastType::Char => "CHAR",
            CastType::Nchar => "NCHAR",
            CastType::Text => "TEXT",
            CastType::Date => "DATE",
            CastType::DateTime | CastType::Timestamp => "TIMESTAMP",
            CastType::Time => "TIME",
            CastType::Signed => "BIGINT",
            CastType::Integer => "INTEGER",
            CastType::Decimal => "NUMERIC",
            CastType::Real => "REAL",
            CastType::Float => "DOUBLE PRECISION",
            CastType::Binary => "BYTEA",
            CastType::Json => "JSONB",
            CastType::Boolean => "BOOLEAN",
            CastType::Unsigned => return None,
        })
    }

    fn json_object_function(&self) -> &'static str {
        "json_build_object"
    }

    fn json_array_function(&self) -> &'static str {
        "json_build_array"
    }

    fn json_agg_function(&self) -> &'static str {
        "json_agg"
    }

    fn json_path(&self, path: &str) -> String {
        format!("{{{}}}", path.replace('.', ","))
    }

    fn json_extract(&self, expr: &str, path_placeholder: &str) -> String {
        format!(
            "(CAST({} AS JSONB) #> CAST({} AS TEXT[]))",
            expr, path_placeholder
        )
    }

    fn json_contains(&self, expr: &str, value_placeholder: &str) -> Option<String> {
        Some(format!(
            "CAST({} AS JSONB) @> CAST({} AS JSONB)",
            expr, value_placeholder
        ))
    }
}
