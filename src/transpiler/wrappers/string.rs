use super::operand;
use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::{Dialect, ParamContext, Scope, resolver};

pub fn compile(op: &StringOp, scope: &Scope<'_>, params: &mut ParamContext) -> CompileResult<String> {
    let expr = operand(&op.operand, scope, params)?;
    apply_chain(expr, &op.chain, scope, params)
}

/// trim → substring → padding → case → reverse → replace → encoding.
pub fn apply_chain(
    mut expr: String,
    chain: &StringChain,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let dialect = scope.dialect;

    if let Some(trim) = chain.trim {
        let function = match trim {
            TrimMode::Both => "TRIM",
            TrimMode::Left => "LTRIM",
            TrimMode::Right => "RTRIM",
        };
        expr = format!("{}({})", function, expr);
    }

    if let Some(substr) = &chain.substr {
        let start = resolver::column(&substr.start, scope, params)?;
        expr = match &substr.length {
            Some(length) => {
                let length = resolver::column(length, scope, params)?;
                format!("{}({}, {}, {})", scope.generator.substr_function(), expr, start, length)
            }
            None => format!("{}({}, {})", scope.generator.substr_function(), expr, start),
        };
    }

    if let Some(padding) = &chain.padding {
        if dialect == Dialect::Sqlite {
            return Err(CompileError::unsupported("padding", dialect));
        }
        for (function, pad) in [("LPAD", &padding.left), ("RPAD", &padding.right)] {
            let Some(pad) = pad else { continue };
            let length = resolver::column(&pad.length, scope, params)?;
            let pattern = match &pad.pattern {
                Some(pattern) => resolver::value(pattern, scope, params)?,
                None => params.add_param(Value::String(" ".to_string()), scope.generator),
            };
            expr = format!("{}({}, {}, {})", function, expr, length, pattern);
        }
    }

    if let Some(case) = chain.text_case {
        let function = match case {
            TextCase::Upper => "UPPER",
            TextCase::Lower => "LOWER",
        };
        expr = format!("{}({})", function, expr);
    }

    if chain.reverse {
        if dialect == Dialect::Sqlite {
            return Err(CompileError::unsupported("reverse", dialect));
        }
        expr = format!("REVERSE({})", expr);
    }

    if let Some(replace) = &chain.replace {
        let target = resolver::value(&replace.target, scope, params)?;
        let with = resolver::value(&replace.replace_with, scope, params)?;
        expr = format!("REPLACE({}, {}, {})", expr, target, with);
    }

    if let Some(charset) = chain.encoding {
        if dialect != Dialect::MySql {
            return Err(CompileError::unsupported("encoding", dialect));
        }
        expr = format!("CONVERT({} USING {})", expr, charset.name());
    }

    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::super::tests::{select_error, select_item};
    use crate::error::ErrorKind;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_chain_order() {
        let (sql, values) = select_item(
            Dialect::Postgres,
            json!({"str": {
                "value": "code",
                "trim": true,
                "substr": {"start": 1, "length": 3},
                "textCase": "lower",
                "replace": {"target": "-", "replaceWith": ""}
            }}),
        );
        assert_eq!(
            sql,
            "REPLACE(LOWER(SUBSTR(TRIM(\"u\".\"code\"), $1, $2)), $3, $4)"
        );
        assert_eq!(values, json!([1, 3, "-", ""]));
    }

    #[test]
    fn test_padding_default_pattern() {
        let (sql, values) = select_item(
            Dialect::MySql,
            json!({"str": {"value": "id", "padding": {"left": {"length": 8, "pattern": "0"}, "right": {"length": 10}}}}),
        );
        assert_eq!(sql, "RPAD(LPAD(??, ?, ?), ?, ?)");
        assert_eq!(values, json!(["u.id", 8, "0", 10, " "]));
    }

    #[test]
    fn test_mysql_substring_and_encoding() {
        let (sql, _) = select_item(
            Dialect::MySql,
            json!({"str": {"value": "bio", "substr": {"start": 2}, "encoding": "utf8mb4"}}),
        );
        assert_eq!(sql, "CONVERT(SUBSTRING(??, ?) USING utf8mb4)");
    }

    #[test]
    fn test_sqlite_rejections() {
        let err = select_error(Dialect::Sqlite, json!({"str": {"value": "a", "reverse": true}}));
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
        let err = select_error(
            Dialect::Sqlite,
            json!({"str": {"value": "a", "padding": {"left": {"length": 3}}}}),
        );
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
    }
}
