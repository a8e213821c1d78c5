use super::cast_to;
use crate::ast::*;
use crate::error::CompileResult;
use crate::transpiler::{ParamContext, Scope, resolver};

/// `FN([DISTINCT ]x)`, then IFNULL/COALESCE, then cast.
pub fn compile(
    kind: AggregateKind,
    op: &AggregateOp,
    scope: &Scope<'_>,
    params: &mut ParamContext,
) -> CompileResult<String> {
    let scope = scope.with_call(op.encryption.as_ref());
    let generator = scope.generator;

    let value = resolver::column(&op.value, &scope, params)?;
    let mut expr = if op.distinct {
        format!("{}(DISTINCT {})", kind.function(), value)
    } else {
        format!("{}({})", kind.function(), value)
    };

    if let Some(fallback) = &op.if_null {
        let fallback = resolver::value(fallback, &scope, params)?;
        expr = format!("{}({}, {})", generator.if_null_function(), expr, fallback);
    }

    match op.cast {
        Some(cast) => cast_to(&expr, cast, &scope),
        None => Ok(expr),
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::select_item;
    use crate::transpiler::Dialect;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_count_star() {
        let (sql, values) = select_item(Dialect::MySql, json!({"count": {"value": "*", "as": "total"}}));
        assert_eq!(sql, "COUNT(*) AS ?");
        assert_eq!(values, json!(["total"]));
    }

    #[test]
    fn test_if_null_per_dialect() {
        let input = json!({"sum": {"value": "amount", "distinct": true, "ifNull": 0}});
        let (mysql, values) = select_item(Dialect::MySql, input.clone());
        assert_eq!(mysql, "IFNULL(SUM(DISTINCT ??), ?)");
        assert_eq!(values, json!(["u.amount", 0]));
        let (pg, _) = select_item(Dialect::Postgres, input);
        assert_eq!(pg, "COALESCE(SUM(DISTINCT \"u\".\"amount\"), $1)");
    }

    #[test]
    fn test_having_style_compare() {
        let (sql, values) = select_item(
            Dialect::Sqlite,
            json!({"avg": {"value": "score", "compare": {"gtEq": 3.5}}}),
        );
        assert_eq!(sql, "AVG(\"u\".\"score\") >= ?");
        assert_eq!(values, json!([3.5]));
    }

    #[test]
    fn test_condition_value_counts_matches() {
        let (sql, values) = select_item(
            Dialect::Postgres,
            json!({"sum": {"value": {"paid": true, "total": {"gt": 0}}, "cast": "integer"}}),
        );
        assert_eq!(
            sql,
            "CAST(SUM((\"u\".\"paid\" = $1 AND \"u\".\"total\" > $2)) AS INTEGER)"
        );
        assert_eq!(values, json!([true, 0]));
    }
}
