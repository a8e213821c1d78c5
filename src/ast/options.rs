use serde::Deserialize;

/// Single-key object names that select a wrapper, aggregate or combinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    Str,
    Num,
    Date,
    Concat,
    If,
    Case,
    Json,
    Array,
    Refer,
    Between,
    And,
    Or,
    Aggregate(AggregateKind),
}

impl WrapperKind {
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "str" => Self::Str,
            "num" => Self::Num,
            "date" => Self::Date,
            "concat" => Self::Concat,
            "if" => Self::If,
            "case" => Self::Case,
            "json" => Self::Json,
            "array" => Self::Array,
            "refer" => Self::Refer,
            "between" => Self::Between,
            "and" => Self::And,
            "or" => Self::Or,
            other => Self::Aggregate(AggregateKind::from_key(other)?),
        })
    }

    /// `and`, `or` and `between` combine or bound conditions instead of producing a value.
    pub fn is_combinator(&self) -> bool {
        matches!(self, Self::Between | Self::And | Self::Or)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregateKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "sum" => Some(Self::Sum),
            "avg" => Some(Self::Avg),
            "count" => Some(Self::Count),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            _ => None,
        }
    }

    pub fn function(&self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// Comparator keys inside a condition map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    NotEq,
    In,
    NotIn,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Like,
    NotLike,
    StartLike,
    EndLike,
    NotStartLike,
    NotEndLike,
    Exists,
    NotExists,
}

impl Comparator {
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "eq" => Self::Eq,
            "notEq" => Self::NotEq,
            "in" => Self::In,
            "notIn" => Self::NotIn,
            "lt" => Self::Lt,
            "gt" => Self::Gt,
            "ltEq" => Self::LtEq,
            "gtEq" => Self::GtEq,
            "like" => Self::Like,
            "notLike" => Self::NotLike,
            "startLike" => Self::StartLike,
            "endLike" => Self::EndLike,
            "notStartLike" => Self::NotStartLike,
            "notEndLike" => Self::NotEndLike,
            "exists" => Self::Exists,
            "notExists" => Self::NotExists,
            _ => return None,
        })
    }

    /// SQL operator for the plain binary comparators.
    pub fn operator(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtEq => "<=",
            Self::GtEq => ">=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Like | Self::StartLike | Self::EndLike => "LIKE",
            Self::NotLike | Self::NotStartLike | Self::NotEndLike => "NOT LIKE",
            Self::Exists => "EXISTS",
            Self::NotExists => "NOT EXISTS",
        }
    }

    /// Wildcards to concatenate around the value, as `(leading, trailing)`.
    pub fn wildcards(&self) -> Option<(bool, bool)> {
        match self {
            Self::Like | Self::NotLike => Some((true, true)),
            Self::StartLike | Self::NotStartLike => Some((false, true)),
            Self::EndLike | Self::NotEndLike => Some((true, false)),
            _ => None,
        }
    }
}

/// Boolean connective joining sibling conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Junction {
    #[default]
    And,
    Or,
}

impl Junction {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    Upper,
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimMode {
    Both,
    Left,
    Right,
}

/// Final rounding step of a numeric wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalMode {
    Ceil,
    Floor,
    Round,
    Digits(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CastType {
    Char,
    Nchar,
    Text,
    Date,
    DateTime,
    Time,
    Timestamp,
    Signed,
    Unsigned,
    Integer,
    Decimal,
    Real,
    Float,
    Binary,
    Json,
    Boolean,
}

/// Character sets accepted by the mysql `encoding` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    Utf8mb4,
    Utf8,
    Latin1,
    Ascii,
    Utf16,
    Utf32,
    Binary,
}

impl Charset {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8mb4 => "utf8mb4",
            Self::Utf8 => "utf8",
            Self::Latin1 => "latin1",
            Self::Ascii => "ascii",
            Self::Utf16 => "utf16",
            Self::Utf32 => "utf32",
            Self::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Cross,
    FullOuter,
}

impl JoinType {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Inner => "JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SortOrder {
    #[serde(alias = "ASC")]
    #[serde(rename = "asc")]
    Asc,
    #[serde(alias = "DESC")]
    #[serde(rename = "desc")]
    Desc,
}

impl SortOrder {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Unit of a date interval token (`"3d"`, `"2M"`...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Microsecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl IntervalUnit {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        Some(match symbol {
            'f' => Self::Microsecond,
            's' => Self::Second,
            'm' => Self::Minute,
            'h' => Self::Hour,
            'd' => Self::Day,
            'w' => Self::Week,
            'M' => Self::Month,
            'q' => Self::Quarter,
            'y' => Self::Year,
            _ => return None,
        })
    }
}

impl std::fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalUnit::Microsecond => write!(f, "MICROSECOND"),
            IntervalUnit::Second => write!(f, "SECOND"),
            IntervalUnit::Minute => write!(f, "MINUTE"),
            IntervalUnit::Hour => write!(f, "HOUR"),
            IntervalUnit::Day => write!(f, "DAY"),
            IntervalUnit::Week => write!(f, "WEEK"),
            IntervalUnit::Month => write!(f, "MONTH"),
            IntervalUnit::Quarter => write!(f, "QUARTER"),
            IntervalUnit::Year => write!(f, "YEAR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalStep {
    pub amount: i64,
    pub unit: IntervalUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapper_keys() {
        assert_eq!(WrapperKind::from_key("str"), Some(WrapperKind::Str));
        assert_eq!(
            WrapperKind::from_key("count"),
            Some(WrapperKind::Aggregate(AggregateKind::Count))
        );
        assert_eq!(WrapperKind::from_key("status"), None);
        assert!(WrapperKind::Between.is_combinator());
        assert!(!WrapperKind::Refer.is_combinator());
    }

    #[test]
    fn test_comparator_keys() {
        assert_eq!(Comparator::from_key("gtEq"), Some(Comparator::GtEq));
        assert_eq!(Comparator::from_key("notEndLike").and_then(|c| c.wildcards()), Some((true, false)));
        assert_eq!(Comparator::from_key("age"), None);
    }

    #[test]
    fn test_cast_type_names() {
        let cast: CastType = serde_json::from_value(serde_json::json!("dateTime")).unwrap();
        assert_eq!(cast, CastType::DateTime);
        assert!(serde_json::from_value::<CastType>(serde_json::json!("varchar")).is_err());
    }
}
