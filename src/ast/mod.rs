//! Typed query trees.
//!
//! Callers hand the compiler nested JSON; [`parse`] dispatches every single-key object once
//! into the tagged unions below, and the transpiler only ever matches on these types.

pub mod options;
pub mod parse;
pub mod query;
pub mod values;

pub use options::*;
pub use parse::Parser;
pub use query::{DeleteQuery, JoinSpec, OrderItem, SelectQuery, Using, WriteQuery};
pub use values::Value;

use crate::transpiler::encryption::EncryptionConfig;

/// A node of the expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    /// Bare token: column, `alias.column`, constant keyword or literal text.
    Text(String),
    /// IN-list or positional arguments.
    List(Vec<Expr>),
    Wrapper(Box<Wrapper>),
    /// Plain condition map used as a boolean expression.
    Condition(Condition),
}

impl Expr {
    pub fn text(token: impl Into<String>) -> Self {
        Expr::Text(token.into())
    }
}

/// Ordered entries of a condition map, joined by the caller's junction.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub entries: Vec<Entry>,
}

impl Condition {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Key names a wrapper, aggregate or combinator.
    Wrapper(Wrapper),
    /// Key names a comparator; the left operand is the enclosing key.
    Compare(Comparator, Expr),
    /// Key is a column token.
    Column(String, Expr),
}

/// One variant per single-key object kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Wrapper {
    Str(StringOp),
    Num(NumericOp),
    Date(DateOp),
    Concat(ConcatOp),
    If(IfOp),
    Case(CaseOp),
    Json(JsonOp),
    Array(JsonOp),
    Refer(ReferOp),
    Between(BetweenOp),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Aggregate(AggregateKind, AggregateOp),
}

impl Wrapper {
    pub fn key(&self) -> &'static str {
        match self {
            Wrapper::Str(_) => "str",
            Wrapper::Num(_) => "num",
            Wrapper::Date(_) => "date",
            Wrapper::Concat(_) => "concat",
            Wrapper::If(_) => "if",
            Wrapper::Case(_) => "case",
            Wrapper::Json(_) => "json",
            Wrapper::Array(_) => "array",
            Wrapper::Refer(_) => "refer",
            Wrapper::Between(_) => "between",
            Wrapper::And(_) => "and",
            Wrapper::Or(_) => "or",
            Wrapper::Aggregate(kind, _) => kind.key(),
        }
    }
}

/// Fields shared by every value wrapper: the operand and its finishing steps.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub value: Expr,
    /// Column-level decryption settings; `Some` turns decryption on.
    pub decrypt: Option<EncryptionConfig>,
    /// Encryption override forwarded to nested decrypts.
    pub encryption: Option<EncryptionConfig>,
    pub cast: Option<CastType>,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}

impl Operand {
    pub fn new(value: Expr) -> Self {
        Self {
            value,
            decrypt: None,
            encryption: None,
            cast: None,
            compare: None,
            alias: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Substring {
    pub start: Expr,
    pub length: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub length: Expr,
    pub pattern: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Padding {
    pub left: Option<Pad>,
    pub right: Option<Pad>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Replace {
    pub target: Expr,
    pub replace_with: Expr,
}

/// String transforms, applied in field order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringChain {
    pub trim: Option<TrimMode>,
    pub substr: Option<Substring>,
    pub padding: Option<Padding>,
    pub text_case: Option<TextCase>,
    pub reverse: bool,
    pub replace: Option<Replace>,
    pub encoding: Option<Charset>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringOp {
    pub operand: Operand,
    pub chain: StringChain,
}

/// Arithmetic steps, applied in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericOp {
    pub operand: Operand,
    pub power: Option<Expr>,
    pub divide_by: Option<Expr>,
    pub modulus: Option<Expr>,
    pub multiply_by: Option<Expr>,
    pub add: Option<Expr>,
    pub subtract: Option<Expr>,
    pub decimal: Option<DecimalMode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateOp {
    pub operand: Operand,
    pub from_pattern: Option<String>,
    pub add: Vec<IntervalStep>,
    pub sub: Vec<IntervalStep>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConcatOp {
    pub values: Vec<Expr>,
    pub separator: Option<String>,
    pub cast: Option<CastType>,
    pub encryption: Option<EncryptionConfig>,
    pub chain: StringChain,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfOp {
    pub check: Condition,
    pub true_value: Expr,
    pub false_value: Expr,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    pub when: Condition,
    pub then: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseOp {
    pub branches: Vec<CaseBranch>,
    pub otherwise: Option<Expr>,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}

/// What a `json`/`array` wrapper builds.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonBody {
    /// Output key paired with its expression.
    Object(Vec<(String, Expr)>),
    Array(Vec<Expr>),
    Single(Expr),
}

/// `json` and `array` construction, optionally scoped to a derived `FROM`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonOp {
    pub value: JsonBody,
    pub source: Option<SelectQuery>,
    pub aggregate: bool,
    pub extract: Option<String>,
    pub contains: Option<serde_json::Value>,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferOp {
    pub query: SelectQuery,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BetweenOp {
    pub gt: Expr,
    pub lt: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOp {
    pub value: Expr,
    pub distinct: bool,
    pub if_null: Option<Expr>,
    pub cast: Option<CastType>,
    pub encryption: Option<EncryptionConfig>,
    pub compare: Option<Condition>,
    pub alias: Option<String>,
}
