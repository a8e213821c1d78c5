//! Symbolic date patterns (`YYYY-MM-dd HH:mm`) to native format strings.

use crate::error::{CompileError, CompileResult};
use crate::transpiler::Dialect;

/// `(token, mysql, postgresql, sqlite)`; `None` where the dialect has no equivalent.
/// Sorted longest first so overlapping prefixes resolve to the longest match.
const TOKENS: &[(&str, Option<&str>, Option<&str>, Option<&str>)] = &[
    ("YYYY", Some("%Y"), Some("YYYY"), Some("%Y")),
    ("MMMM", Some("%M"), Some("FMMonth"), None),
    ("dddd", Some("%W"), Some("FMDay"), None),
    ("MMM", Some("%b"), Some("Mon"), None),
    ("ddd", Some("%a"), Some("Dy"), None),
    ("DDD", Some("%j"), Some("DDD"), Some("%j")),
    ("SSS", None, Some("MS"), None),
    ("YY", Some("%y"), Some("YY"), None),
    ("MM", Some("%m"), Some("MM"), Some("%m")),
    ("dd", Some("%d"), Some("DD"), Some("%d")),
    ("Do", Some("%D"), Some("FMDDth"), None),
    ("HH", Some("%H"), Some("HH24"), Some("%H")),
    ("hh", Some("%h"), Some("HH12"), None),
    ("mm", Some("%i"), Some("MI"), Some("%M")),
    ("ss", Some("%s"), Some("SS"), Some("%S")),
    ("M", Some("%c"), Some("FMMM"), None),
    ("d", Some("%e"), Some("FMDD"), None),
    ("D", Some("%w"), Some("D"), Some("%w")),
    ("H", Some("%k"), Some("FMHH24"), None),
    ("h", Some("%l"), Some("FMHH12"), None),
    ("f", Some("%f"), Some("US"), None),
    ("A", Some("%p"), Some("AM"), None),
    ("w", Some("%U"), Some("WW"), Some("%W")),
    ("Q", None, Some("Q"), None),
    ("Z", None, Some("OF"), None),
];

fn native(entry: &(&str, Option<&'static str>, Option<&'static str>, Option<&'static str>), dialect: Dialect) -> Option<&'static str> {
    match dialect {
        Dialect::MySql => entry.1,
        Dialect::Postgres => entry.2,
        Dialect::Sqlite => entry.3,
    }
}

fn push_literal(out: &mut String, text: &str, dialect: Dialect) {
    match dialect {
        Dialect::Postgres => {
            if !text.is_empty() {
                out.push('"');
                out.push_str(&text.replace('"', "\\\""));
                out.push('"');
            }
        }
        Dialect::MySql | Dialect::Sqlite => out.push_str(&text.replace('%', "%%")),
    }
}

/// Translate a symbolic pattern for `dialect`. Stateless.
pub fn translate(pattern: &str, dialect: Dialect) -> CompileResult<String> {
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut rest = pattern;

    while let Some(c) = rest.chars().next() {
        if c == '[' {
            let body = &rest[1..];
            let (literal, after) = match body.find(']') {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
            push_literal(&mut out, literal, dialect);
            rest = after;
            continue;
        }

        if let Some(entry) = TOKENS.iter().find(|entry| rest.starts_with(entry.0)) {
            let token = entry.0;
            let replacement = native(entry, dialect).ok_or_else(|| {
                CompileError::unsupported(format!("date token '{}'", token), dialect)
            })?;
            out.push_str(replacement);
            rest = &rest[token.len()..];
            continue;
        }

        match (c, dialect) {
            ('%', Dialect::MySql | Dialect::Sqlite) => out.push_str("%%"),
            _ => out.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_literal_sections() {
        assert_eq!(translate("YYYY-MM-[T]dd", Dialect::MySql).unwrap(), "%Y-%m-T%d");
        assert_eq!(translate("YYYY-MM-[T]dd", Dialect::Postgres).unwrap(), "YYYY-MM-\"T\"DD");
        assert_eq!(translate("YYYY-MM-[T]dd", Dialect::Sqlite).unwrap(), "%Y-%m-T%d");
    }

    #[test]
    fn test_longest_match_first() {
        assert_eq!(translate("dddd d dd", Dialect::MySql).unwrap(), "%W %e %d");
        assert_eq!(translate("DDD Do D", Dialect::Postgres).unwrap(), "DDD FMDDth D");
        assert_eq!(translate("HH:mm:ss", Dialect::Sqlite).unwrap(), "%H:%M:%S");
    }

    #[test]
    fn test_percent_escaped() {
        assert_eq!(translate("[100%] YY", Dialect::MySql).unwrap(), "100%% %y");
    }

    #[test]
    fn test_unsupported_token() {
        let err = translate("Q", Dialect::MySql).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
        let err = translate("MMMM", Dialect::Sqlite).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedByDialect);
    }
}
