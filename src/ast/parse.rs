//! JSON input to typed tree.
//!
//! This is the only place object keys are inspected. Required fields are checked here,
//! so malformed input fails before any SQL is emitted.

use nom::{
    IResult,
    character::complete::{digit1, multispace0, one_of},
    combinator::{all_consuming, map_res, opt, recognize},
    multi::many1,
    sequence::{pair, preceded, terminated},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value as Json};

use super::*;
use crate::error::{CompileError, CompileResult};
use crate::transpiler::encryption::EncryptionConfig;

const OPERAND_KEYS: &[&str] = &["value", "decrypt", "encryption", "cast", "compare", "as"];
const STRING_CHAIN_KEYS: &[&str] = &[
    "trim",
    "substr",
    "padding",
    "textCase",
    "reverse",
    "replace",
    "encoding",
];
const QUERY_KEYS: &[&str] = &[
    "table", "alias", "select", "join", "where", "junction", "groupBy", "having", "orderBy",
    "limit", "offset",
];

/// Collects permissive-shape warnings while building the tree.
#[derive(Debug, Default)]
pub struct Parser {
    warnings: Vec<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn omit(&mut self, owner: &str, key: &str, expected: &str) {
        let message = format!("{}.{}: expected {}, fragment omitted", owner, key, expected);
        tracing::warn!(%message, "ignoring malformed optional clause");
        self.warnings.push(message);
    }

    // ===== Statements =====

    pub fn select(&mut self, json: &Json) -> CompileResult<SelectQuery> {
        let mut keys = QUERY_KEYS.to_vec();
        keys.push("encryption");
        let fields = Fields::new("select", json, &keys)?;
        self.select_query(&fields)
    }

    pub fn write(&mut self, json: &Json) -> CompileResult<WriteQuery> {
        let fields = Fields::new(
            "save",
            json,
            &[
                "table", "alias", "data", "where", "junction", "upsert", "indexes", "encrypt",
                "encryption",
            ],
        )?;
        let rows = match fields.require("data")? {
            Json::Array(items) if !items.is_empty() => items
                .iter()
                .map(|row| self.row("save.data", row))
                .collect::<CompileResult<Vec<_>>>()?,
            Json::Array(_) => return Err(CompileError::invalid("save.data", "empty list")),
            row @ Json::Object(_) => vec![self.row("save.data", row)?],
            _ => {
                return Err(CompileError::invalid(
                    "save.data",
                    "expected an object or a list of objects",
                ));
            }
        };

        let upsert = match fields.get("upsert") {
            Some(json) => self.row("save.upsert", json)?,
            None => Vec::new(),
        };

        let encrypt = match fields.get("encrypt") {
            Some(Json::Object(map)) => map
                .iter()
                .map(|(column, cfg)| Ok((column.clone(), decode(&format!("save.encrypt.{}", column), cfg)?)))
                .collect::<CompileResult<Vec<_>>>()?,
            Some(_) => return Err(CompileError::invalid("save.encrypt", "expected an object")),
            None => Vec::new(),
        };

        Ok(WriteQuery {
            table: fields.required_string("table")?,
            alias: fields.string("alias")?,
            rows,
            filter: self.optional_condition(&fields, "where")?,
            junction: fields.enumerated("junction")?.unwrap_or_default(),
            upsert,
            indexes: fields.string_list("indexes")?,
            encrypt,
            encryption: fields.enumerated("encryption")?,
        })
    }

    pub fn delete(&mut self, json: &Json) -> CompileResult<DeleteQuery> {
        let fields = Fields::new(
            "delete",
            json,
            &["table", "alias", "where", "junction", "encryption"],
        )?;
        Ok(DeleteQuery {
            table: fields.required_string("table")?,
            alias: fields.string("alias")?,
            filter: self.optional_condition(&fields, "where")?,
            junction: fields.enumerated("junction")?.unwrap_or_default(),
            encryption: fields.enumerated("encryption")?,
        })
    }

    fn row(&mut self, owner: &str, json: &Json) -> CompileResult<Vec<(String, Expr)>> {
        let Json::Object(map) = json else {
            return Err(CompileError::invalid(owner, "expected an object"));
        };
        map.iter()
            .map(|(column, value)| {
                check_column(column, owner)?;
                Ok((column.clone(), self.expr(value)?))
            })
            .collect()
    }

    fn select_query(&mut self, fields: &Fields<'_>) -> CompileResult<SelectQuery> {
        let owner = fields.owner.clone();
        let table = fields.required_string("table")?;

        let select = match fields.get("select") {
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| self.select_item(item))
                .collect::<CompileResult<Vec<_>>>()?,
            Some(_) => {
                self.omit(&owner, "select", "a list");
                Vec::new()
            }
            None => Vec::new(),
        };

        let joins = match fields.get("join") {
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| self.join(item))
                .collect::<CompileResult<Vec<_>>>()?,
            Some(_) => {
                return Err(CompileError::invalid(
                    format!("{}.join", owner),
                    "expected a list of join objects",
                ));
            }
            None => Vec::new(),
        };

        let group_by = match fields.get("groupBy") {
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| self.expr(item))
                .collect::<CompileResult<Vec<_>>>()?,
            Some(Json::String(column)) => vec![Expr::Text(column.clone())],
            Some(_) => {
                self.omit(&owner, "groupBy", "a list of columns");
                Vec::new()
            }
            None => Vec::new(),
        };

        let order_by = match fields.get("orderBy") {
            Some(Json::Object(map)) => map
                .iter()
                .map(|(column, order)| {
                    let order = decode(&format!("{}.orderBy.{}", owner, column), order)?;
                    Ok(OrderItem {
                        column: Expr::Text(column.clone()),
                        order,
                    })
                })
                .collect::<CompileResult<Vec<_>>>()?,
            Some(_) => {
                self.omit(&owner, "orderBy", "an object of column: asc|desc");
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(SelectQuery {
            table,
            alias: fields.string("alias")?,
            select,
            joins,
            filter: self.optional_condition(fields, "where")?,
            junction: fields.enumerated("junction")?.unwrap_or_default(),
            group_by,
            having: self.optional_condition(fields, "having")?,
            order_by,
            limit: fields.count("limit")?,
            offset: fields.count("offset")?,
            encryption: fields.enumerated("encryption")?,
        })
    }

    fn join(&mut self, json: &Json) -> CompileResult<JoinSpec> {
        let mut keys = QUERY_KEYS.to_vec();
        keys.extend(["type", "using"]);
        let fields = Fields::new("join", json, &keys)?;
        let query = self.select_query(&fields)?;
        let join_type: JoinType = fields.enumerated("type")?.unwrap_or_default();

        let using = match fields.get("using") {
            Some(Json::Array(columns)) => Some(Using::Columns(
                columns
                    .iter()
                    .map(|column| match column {
                        Json::String(name) => {
                            check_column(name, "join.using")?;
                            Ok(name.clone())
                        }
                        _ => Err(CompileError::invalid("join.using", "expected column names")),
                    })
                    .collect::<CompileResult<Vec<_>>>()?,
            )),
            Some(Json::Object(pairs)) => Some(Using::Pairs(
                pairs
                    .iter()
                    .map(|(parent, child)| {
                        check_column(parent, "join.using")?;
                        Ok((parent.clone(), self.expr(child)?))
                    })
                    .collect::<CompileResult<Vec<_>>>()?,
            )),
            Some(_) => {
                self.omit("join", "using", "a list or an object");
                None
            }
            None => None,
        };

        if using.is_none() && join_type != JoinType::Cross {
            return Err(CompileError::missing("using", format!("join '{}'", query.table)));
        }
        if query.is_derived() && query.alias.is_none() {
            return Err(CompileError::missing(
                "alias",
                format!("derived join '{}'", query.table),
            ));
        }

        Ok(JoinSpec {
            join_type,
            using,
            query,
        })
    }

    // ===== Expressions =====

    /// Any expression position: scalars, lists, wrappers or condition maps.
    pub fn expr(&mut self, json: &Json) -> CompileResult<Expr> {
        Ok(match json {
            Json::Null => Expr::Null,
            Json::Bool(b) => Expr::Bool(*b),
            Json::Number(n) => Expr::Number(n.clone()),
            Json::String(s) => Expr::Text(s.clone()),
            Json::Array(items) => Expr::List(
                items
                    .iter()
                    .map(|item| self.expr(item))
                    .collect::<CompileResult<Vec<_>>>()?,
            ),
            Json::Object(map) => match single_wrapper(map) {
                Some((kind, key, inner)) if !kind.is_combinator() => {
                    Expr::Wrapper(Box::new(self.wrapper(kind, key, inner)?))
                }
                _ => Expr::Condition(self.condition_map("where", map)?),
            },
        })
    }

    /// Select-list item: a scalar token or a single-key value wrapper.
    fn select_item(&mut self, json: &Json) -> CompileResult<Expr> {
        match json {
            Json::Object(map) => match single_wrapper(map) {
                Some((kind, key, inner)) if !kind.is_combinator() => {
                    Ok(Expr::Wrapper(Box::new(self.wrapper(kind, key, inner)?)))
                }
                _ => {
                    let key = map.keys().next().cloned().unwrap_or_default();
                    Err(CompileError::unknown(key, "select"))
                }
            },
            Json::Array(_) => Err(CompileError::invalid("select", "nested lists are not select items")),
            scalar => self.expr(scalar),
        }
    }

    pub fn condition(&mut self, owner: &str, json: &Json) -> CompileResult<Condition> {
        match json {
            Json::Object(map) => self.condition_map(owner, map),
            _ => Err(CompileError::invalid(owner, "expected a condition object")),
        }
    }

    fn condition_map(&mut self, owner: &str, map: &Map<String, Json>) -> CompileResult<Condition> {
        let mut entries = Vec::with_capacity(map.len());
        for (key, value) in map {
            let entry = if let Some(kind) = WrapperKind::from_key(key) {
                Entry::Wrapper(self.wrapper(kind, key, value)?)
            } else if let Some(comparator @ (Comparator::Exists | Comparator::NotExists)) =
                Comparator::from_key(key)
            {
                // bare subquery object or an explicit `refer`
                let subquery = match value {
                    Json::Object(map) if map.contains_key("refer") => self.expr(value)?,
                    _ => Expr::Wrapper(Box::new(Wrapper::Refer(self.refer_op(value)?))),
                };
                Entry::Compare(comparator, subquery)
            } else if let Some(comparator) = Comparator::from_key(key) {
                Entry::Compare(comparator, self.expr(value)?)
            } else {
                check_column(key, owner)?;
                Entry::Column(key.clone(), self.expr(value)?)
            };
            entries.push(entry);
        }
        Ok(Condition { entries })
    }

    fn optional_condition(&mut self, fields: &Fields<'_>, key: &str) -> CompileResult<Option<Condition>> {
        let owner = format!("{}.{}", fields.owner, key);
        fields
            .get(key)
            .map(|json| self.condition(&owner, json))
            .transpose()
    }

    fn conditions(&mut self, owner: &str, json: &Json) -> CompileResult<Vec<Condition>> {
        match json {
            Json::Array(items) => items.iter().map(|item| self.condition(owner, item)).collect(),
            _ => Err(CompileError::invalid(owner, "expected a list of condition objects")),
        }
    }

    fn wrapper(&mut self, kind: WrapperKind, key: &str, json: &Json) -> CompileResult<Wrapper> {
        tracing::trace!(wrapper = key, "parsing wrapper");
        Ok(match kind {
            WrapperKind::Str => Wrapper::Str(self.string_op(json)?),
            WrapperKind::Num => Wrapper::Num(self.numeric_op(json)?),
            WrapperKind::Date => Wrapper::Date(self.date_op(json)?),
            WrapperKind::Concat => Wrapper::Concat(self.concat_op(json)?),
            WrapperKind::If => Wrapper::If(self.if_op(json)?),
            WrapperKind::Case => Wrapper::Case(self.case_op(json)?),
            WrapperKind::Json => Wrapper::Json(self.json_op("json", json, false)?),
            WrapperKind::Array => Wrapper::Array(self.json_op("array", json, true)?),
            WrapperKind::Refer => Wrapper::Refer(self.refer_op(json)?),
            WrapperKind::Between => {
                let fields = Fields::new("between", json, &["gt", "lt"])?;
                Wrapper::Between(BetweenOp {
                    gt: self.expr(fields.require("gt")?)?,
                    lt: self.expr(fields.require("lt")?)?,
                })
            }
            WrapperKind::And => Wrapper::And(self.conditions("and", json)?),
            WrapperKind::Or => Wrapper::Or(self.conditions("or", json)?),
            WrapperKind::Aggregate(aggregate) => {
                Wrapper::Aggregate(aggregate, self.aggregate_op(aggregate, json)?)
            }
        })
    }

    fn operand(&mut self, fields: &Fields<'_>) -> CompileResult<Operand> {
        let decrypt = match fields.get("decrypt") {
            Some(Json::Bool(true)) => Some(EncryptionConfig::default()),
            Some(Json::Bool(false)) | None => None,
            Some(cfg) => Some(decode(&format!("{}.decrypt", fields.owner), cfg)?),
        };
        Ok(Operand {
            value: self.expr(fields.require_present("value")?)?,
            decrypt,
            encryption: fields.enumerated("encryption")?,
            cast: fields.enumerated("cast")?,
            compare: self.optional_condition(fields, "compare")?,
            alias: fields.string("as")?,
        })
    }

    fn string_chain(&mut self, fields: &Fields<'_>) -> CompileResult<StringChain> {
        let owner = &fields.owner;
        let trim = match fields.get("trim") {
            Some(Json::Bool(true)) => Some(TrimMode::Both),
            Some(Json::String(side)) => Some(match side.as_str() {
                "left" => TrimMode::Left,
                "right" => TrimMode::Right,
                "both" => TrimMode::Both,
                other => {
                    return Err(CompileError::invalid(
                        format!("{}.trim", owner),
                        format!("'{}' is not one of left, right, both", other),
                    ));
                }
            }),
            Some(Json::Bool(false)) | None => None,
            Some(_) => return Err(CompileError::invalid(format!("{}.trim", owner), "expected a boolean or side")),
        };

        let substr = match fields.get("substr") {
            Some(json) => {
                let sub = Fields::new(format!("{}.substr", owner), json, &["start", "length"])?;
                Some(Substring {
                    start: self.expr(sub.require("start")?)?,
                    length: sub.get("length").map(|l| self.expr(l)).transpose()?,
                })
            }
            None => None,
        };

        let padding = match fields.get("padding") {
            Some(json) => {
                let pad = Fields::new(format!("{}.padding", owner), json, &["left", "right"])?;
                Some(Padding {
                    left: self.pad(&pad, "left")?,
                    right: self.pad(&pad, "right")?,
                })
            }
            None => None,
        };

        let replace = match fields.get("replace") {
            Some(json) => {
                let rep = Fields::new(format!("{}.replace", owner), json, &["target", "replaceWith"])?;
                Some(Replace {
                    target: self.expr(rep.require("target")?)?,
                    replace_with: self.expr(rep.require_present("replaceWith")?)?,
                })
            }
            None => None,
        };

        Ok(StringChain {
            trim,
            substr,
            padding,
            text_case: fields.enumerated("textCase")?,
            reverse: fields.flag("reverse")?,
            replace,
            encoding: fields.enumerated("encoding")?,
        })
    }

    fn pad(&mut self, padding: &Fields<'_>, side: &str) -> CompileResult<Option<Pad>> {
        let Some(json) = padding.get(side) else {
            return Ok(None);
        };
        let fields = Fields::new(format!("{}.{}", padding.owner, side), json, &["length", "pattern"])?;
        Ok(Some(Pad {
            length: self.expr(fields.require("length")?)?,
            pattern: fields.get("pattern").map(|p| self.expr(p)).transpose()?,
        }))
    }

    fn string_op(&mut self, json: &Json) -> CompileResult<StringOp> {
        let keys = [OPERAND_KEYS, STRING_CHAIN_KEYS].concat();
        let fields = Fields::new("str", json, &keys)?;
        Ok(StringOp {
            operand: self.operand(&fields)?,
            chain: self.string_chain(&fields)?,
        })
    }

    fn numeric_op(&mut self, json: &Json) -> CompileResult<NumericOp> {
        let keys = [
            OPERAND_KEYS,
            &["power", "divideBy", "mod", "multiplyBy", "add", "sub", "decimal"][..],
        ]
        .concat();
        let fields = Fields::new("num", json, &keys)?;
        let mut step = |key: &str| fields.get(key).map(|v| self.expr(v)).transpose();
        let power = step("power")?;
        let divide_by = step("divideBy")?;
        let modulus = step("mod")?;
        let multiply_by = step("multiplyBy")?;
        let add = step("add")?;
        let subtract = step("sub")?;

        let decimal = match fields.get("decimal") {
            Some(Json::String(mode)) => Some(match mode.as_str() {
                "ceil" => DecimalMode::Ceil,
                "floor" => DecimalMode::Floor,
                "round" => DecimalMode::Round,
                other => match other.parse::<u32>() {
                    Ok(digits) => DecimalMode::Digits(digits),
                    Err(_) => {
                        return Err(CompileError::invalid(
                            "num.decimal",
                            format!("'{}' is not ceil, floor, round or a digit count", other),
                        ));
                    }
                },
            }),
            Some(Json::Number(n)) => match n.as_u64().and_then(|d| u32::try_from(d).ok()) {
                Some(digits) => Some(DecimalMode::Digits(digits)),
                None => return Err(CompileError::invalid("num.decimal", format!("{} is not a digit count", n))),
            },
            Some(_) => return Err(CompileError::invalid("num.decimal", "expected a mode or digit count")),
            None => None,
        };

        Ok(NumericOp {
            operand: self.operand(&fields)?,
            power,
            divide_by,
            modulus,
            multiply_by,
            add,
            subtract,
            decimal,
        })
    }

    fn date_op(&mut self, json: &Json) -> CompileResult<DateOp> {
        let keys = [OPERAND_KEYS, &["fromPattern", "add", "sub", "format"][..]].concat();
        let fields = Fields::new("date", json, &keys)?;
        Ok(DateOp {
            operand: self.operand(&fields)?,
            from_pattern: fields.string("fromPattern")?,
            add: fields.get("add").map(|v| interval("date.add", v)).transpose()?.unwrap_or_default(),
            sub: fields.get("sub").map(|v| interval("date.sub", v)).transpose()?.unwrap_or_default(),
            format: fields.string("format")?,
        })
    }

    fn concat_op(&mut self, json: &Json) -> CompileResult<ConcatOp> {
        let keys = [
            &["value", "pattern", "cast", "encryption", "compare", "as"][..],
            STRING_CHAIN_KEYS,
        ]
        .concat();
        let fields = Fields::new("concat", json, &keys)?;
        let values = match fields.require("value")? {
            Json::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| self.expr(item))
                .collect::<CompileResult<Vec<_>>>()?,
            _ => return Err(CompileError::invalid("concat.value", "expected a non-empty list")),
        };
        Ok(ConcatOp {
            values,
            separator: fields.string("pattern")?,
            cast: fields.enumerated("cast")?,
            encryption: fields.enumerated("encryption")?,
            chain: self.string_chain(&fields)?,
            compare: self.optional_condition(&fields, "compare")?,
            alias: fields.string("as")?,
        })
    }

    fn if_op(&mut self, json: &Json) -> CompileResult<IfOp> {
        let fields = Fields::new(
            "if",
            json,
            &["check", "trueValue", "falseValue", "compare", "as"],
        )?;
        Ok(IfOp {
            check: self.condition("if.check", fields.require("check")?)?,
            true_value: self.expr(fields.require_present("trueValue")?)?,
            false_value: self.expr(fields.require_present("falseValue")?)?,
            compare: self.optional_condition(&fields, "compare")?,
            alias: fields.string("as")?,
        })
    }

    fn case_op(&mut self, json: &Json) -> CompileResult<CaseOp> {
        let fields = Fields::new("case", json, &["check", "else", "compare", "as"])?;
        let branches = match fields.require("check")? {
            Json::Array(items) if !items.is_empty() => items
                .iter()
                .map(|item| {
                    let branch = Fields::new("case.check", item, &["when", "then"])?;
                    Ok(CaseBranch {
                        when: self.condition("case.check.when", branch.require("when")?)?,
                        then: self.expr(branch.require_present("then")?)?,
                    })
                })
                .collect::<CompileResult<Vec<_>>>()?,
            _ => {
                return Err(CompileError::invalid(
                    "case.check",
                    "expected a non-empty list of {when, then}",
                ));
            }
        };
        Ok(CaseOp {
            branches,
            otherwise: fields.get_present("else").map(|e| self.expr(e)).transpose()?,
            compare: self.optional_condition(&fields, "compare")?,
            alias: fields.string("as")?,
        })
    }

    fn json_op(&mut self, owner: &'static str, json: &Json, aggregate_default: bool) -> CompileResult<JsonOp> {
        let mut keys: Vec<&str> = QUERY_KEYS.iter().copied().filter(|key| *key != "select").collect();
        keys.extend(["value", "aggregate", "extract", "contains", "compare", "as"]);
        let fields = Fields::new(owner, json, &keys)?;
        let source = if fields.get("table").is_some() {
            Some(self.select_query(&fields)?)
        } else {
            None
        };
        let value = match fields.require("value")? {
            Json::Object(map) if single_wrapper(map).is_none() => JsonBody::Object(
                map.iter()
                    .map(|(key, value)| Ok((key.clone(), self.expr(value)?)))
                    .collect::<CompileResult<Vec<_>>>()?,
            ),
            Json::Array(items) => JsonBody::Array(
                items
                    .iter()
                    .map(|item| self.expr(item))
                    .collect::<CompileResult<Vec<_>>>()?,
            ),
            single => JsonBody::Single(self.expr(single)?),
        };
        Ok(JsonOp {
            value,
            source,
            aggregate: fields.get("aggregate").is_some_and(|v| v == &Json::Bool(true))
                || (aggregate_default && fields.get("aggregate") != Some(&Json::Bool(false))),
            extract: fields.string("extract")?,
            contains: fields.get_present("contains").cloned(),
            compare: self.optional_condition(&fields, "compare")?,
            alias: fields.string("as")?,
        })
    }

    fn refer_op(&mut self, json: &Json) -> CompileResult<ReferOp> {
        let keys = [QUERY_KEYS, &["encryption", "as"][..]].concat();
        let fields = Fields::new("refer", json, &keys)?;
        Ok(ReferOp {
            query: self.select_query(&fields)?,
            alias: fields.string("as")?,
        })
    }

    fn aggregate_op(&mut self, kind: AggregateKind, json: &Json) -> CompileResult<AggregateOp> {
        let fields = Fields::new(
            kind.key(),
            json,
            &["value", "distinct", "ifNull", "cast", "encryption", "compare", "as"],
        )?;
        Ok(AggregateOp {
            value: self.expr(fields.require("value")?)?,
            distinct: fields.flag("distinct")?,
            if_null: fields.get_present("ifNull").map(|v| self.expr(v)).transpose()?,
            cast: fields.enumerated("cast")?,
            encryption: fields.enumerated("encryption")?,
            compare: self.optional_condition(&fields, "compare")?,
            alias: fields.string("as")?,
        })
    }
}

/// `Some` when the map has exactly one key and that key names a wrapper.
fn single_wrapper(map: &Map<String, Json>) -> Option<(WrapperKind, &str, &Json)> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    WrapperKind::from_key(key).map(|kind| (kind, key.as_str(), inner))
}

/// Column keys are plain or `alias.column` identifiers.
fn check_column(key: &str, position: &str) -> CompileResult<()> {
    let valid = !key.is_empty()
        && key
            .split('.')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '$'));
    if valid {
        Ok(())
    } else {
        Err(CompileError::unknown(key, position))
    }
}

fn decode<T: DeserializeOwned>(field: &str, json: &Json) -> CompileResult<T> {
    serde_json::from_value(json.clone()).map_err(|e| CompileError::invalid(field, e.to_string()))
}

// ===== Interval tokens =====

fn interval_step(input: &str) -> IResult<&str, (i64, char)> {
    let amount = map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>()
    });
    pair(preceded(multispace0, amount), one_of("fsmhdwMqy"))(input)
}

fn interval_steps(input: &str) -> IResult<&str, Vec<(i64, char)>> {
    all_consuming(terminated(many1(interval_step), multispace0))(input)
}

/// A day count or `"<n><unit>"` tokens, composed left to right.
fn interval(field: &str, json: &Json) -> CompileResult<Vec<IntervalStep>> {
    let days = |amount| {
        vec![IntervalStep {
            amount,
            unit: IntervalUnit::Day,
        }]
    };
    match json {
        Json::Number(n) => n
            .as_i64()
            .map(days)
            .ok_or_else(|| CompileError::invalid(field, format!("{} is not a whole day count", n))),
        Json::String(text) => {
            if let Ok(amount) = text.trim().parse::<i64>() {
                return Ok(days(amount));
            }
            let (_, steps) = interval_steps(text).map_err(|_| {
                CompileError::invalid(
                    field,
                    format!("'{}' is not a list of <n><unit> tokens (units f s m h d w M q y)", text),
                )
            })?;
            steps
                .into_iter()
                .map(|(amount, symbol)| {
                    let unit = IntervalUnit::from_symbol(symbol)
                        .ok_or_else(|| CompileError::invalid(field, format!("unknown unit '{}'", symbol)))?;
                    Ok(IntervalStep { amount, unit })
                })
                .collect()
        }
        _ => Err(CompileError::invalid(field, "expected a day count or interval tokens")),
    }
}

// ===== Field access =====

/// Typed access to one option object, with its dotted path for messages.
struct Fields<'j> {
    owner: String,
    map: &'j Map<String, Json>,
}

impl<'j> Fields<'j> {
    fn new(owner: impl Into<String>, json: &'j Json, known: &[&str]) -> CompileResult<Self> {
        let owner = owner.into();
        let Json::Object(map) = json else {
            return Err(CompileError::invalid(owner, "expected an object"));
        };
        if let Some(key) = map.keys().find(|key| !known.contains(&key.as_str())) {
            return Err(CompileError::unknown(key.clone(), owner));
        }
        Ok(Self { owner, map })
    }

    /// Present and not `null`.
    fn get(&self, key: &str) -> Option<&'j Json> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    /// Present, `null` included.
    fn get_present(&self, key: &str) -> Option<&'j Json> {
        self.map.get(key)
    }

    fn require(&self, key: &str) -> CompileResult<&'j Json> {
        self.get(key)
            .ok_or_else(|| CompileError::missing(key, self.owner.clone()))
    }

    /// Like `require` but an explicit `null` counts as given.
    fn require_present(&self, key: &str) -> CompileResult<&'j Json> {
        self.get_present(key)
            .ok_or_else(|| CompileError::missing(key, self.owner.clone()))
    }

    fn path(&self, key: &str) -> String {
        format!("{}.{}", self.owner, key)
    }

    fn string(&self, key: &str) -> CompileResult<Option<String>> {
        match self.get(key) {
            Some(Json::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(CompileError::invalid(self.path(key), "expected a string")),
            None => Ok(None),
        }
    }

    fn required_string(&self, key: &str) -> CompileResult<String> {
        self.string(key)?
            .ok_or_else(|| CompileError::missing(key, self.owner.clone()))
    }

    fn string_list(&self, key: &str) -> CompileResult<Vec<String>> {
        match self.get(key) {
            Some(Json::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Json::String(s) => Ok(s.clone()),
                    _ => Err(CompileError::invalid(self.path(key), "expected strings")),
                })
                .collect(),
            Some(Json::String(s)) => Ok(vec![s.clone()]),
            Some(_) => Err(CompileError::invalid(self.path(key), "expected a list of strings")),
            None => Ok(Vec::new()),
        }
    }

    fn flag(&self, key: &str) -> CompileResult<bool> {
        match self.get(key) {
            Some(Json::Bool(b)) => Ok(*b),
            Some(_) => Err(CompileError::invalid(self.path(key), "expected a boolean")),
            None => Ok(false),
        }
    }

    fn count(&self, key: &str) -> CompileResult<Option<u64>> {
        match self.get(key) {
            Some(Json::Number(n)) => n
                .as_u64()
                .map(Some)
                .ok_or_else(|| CompileError::invalid(self.path(key), format!("{} is not a row count", n))),
            Some(Json::String(s)) => s
                .parse::<u64>()
                .map(Some)
                .map_err(|_| CompileError::invalid(self.path(key), format!("'{}' is not a row count", s))),
            Some(_) => Err(CompileError::invalid(self.path(key), "expected a row count")),
            None => Ok(None),
        }
    }

    fn enumerated<T: DeserializeOwned>(&self, key: &str) -> CompileResult<Option<T>> {
        self.get(key).map(|v| decode(&self.path(key), v)).transpose()
    }
}
