//! Classification of raw catalog default expressions.

use sqlparser::ast::{
    DateTimeField, Expr, Function, FunctionArg, FunctionArgExpr, FunctionArguments,
    UnaryOperator, Value,
};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use sqlparser::tokenizer::Token;

use crate::literal::Literal;
use crate::schema::ColumnDefault;

/// Outcome of reading a column default from a catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedDefault {
    /// No default, or an explicit `NULL`.
    Absent,
    Value(ColumnDefault),
    /// A sequence default such as `nextval('t_id_seq'::regclass)`.
    Sequence,
    /// An expression with no portable meaning; carries the raw text.
    Unrecognized(String),
}

/// Classify `raw` as reported by `sqlite_master`, `information_schema` or
/// `pg_get_expr`.
pub fn parse_default(raw: &str) -> ParsedDefault {
    let raw = raw.trim();
    if raw.is_empty() {
        return ParsedDefault::Absent;
    }
    match parse_expression(raw) {
        Some(expr) => {
            classify(&expr).unwrap_or_else(|| ParsedDefault::Unrecognized(raw.to_string()))
        }
        None => ParsedDefault::Unrecognized(raw.to_string()),
    }
}

/// One whole expression, or `None` when `raw` does not parse or has trailing tokens.
fn parse_expression(raw: &str) -> Option<Expr> {
    let dialect = GenericDialect {};
    let mut parser = Parser::new(&dialect).try_with_sql(raw).ok()?;
    let expr = parser.parse_expr().ok()?;
    (parser.peek_token().token == Token::EOF).then_some(expr)
}

fn classify(expr: &Expr) -> Option<ParsedDefault> {
    match expr {
        Expr::Nested(inner) => classify(inner),
        Expr::Cast { expr, .. } => classify(expr),
        Expr::Value(Value::Null) => Some(ParsedDefault::Absent),
        Expr::Value(value) => literal(value).map(value_default),
        Expr::UnaryOp { op, expr } => {
            let Expr::Value(Value::Number(digits, _)) = strip_nesting(expr) else {
                return None;
            };
            let signed = match op {
                UnaryOperator::Minus => format!("-{digits}"),
                UnaryOperator::Plus => digits.clone(),
                _ => return None,
            };
            number(&signed).map(value_default)
        }
        Expr::Function(function) => function_default(function),
        Expr::Extract { field, expr, .. } => {
            (*field == DateTimeField::Epoch && is_now(expr)).then(epoch_default)
        }
        Expr::Identifier(ident) => match ident.value.to_ascii_lowercase().as_str() {
            "unix_timestamp" => Some(epoch_default()),
            "current_timestamp" | "localtimestamp" => Some(timestamp_default()),
            _ => None,
        },
        _ => None,
    }
}

fn strip_nesting(mut expr: &Expr) -> &Expr {
    while let Expr::Nested(inner) = expr {
        expr = inner;
    }
    expr
}

fn value_default(literal: Literal) -> ParsedDefault {
    ParsedDefault::Value(ColumnDefault::Literal(literal))
}

fn timestamp_default() -> ParsedDefault {
    ParsedDefault::Value(ColumnDefault::CurrentTimestamp)
}

fn epoch_default() -> ParsedDefault {
    ParsedDefault::Value(ColumnDefault::UnixEpochNow)
}

/// Literal default: number, string, boolean, hex blob or bit string.
fn literal(value: &Value) -> Option<Literal> {
    match value {
        Value::Number(digits, _) => number(digits),
        Value::SingleQuotedString(text)
        | Value::EscapedStringLiteral(text)
        | Value::NationalStringLiteral(text) => Some(Literal::Text(text.clone())),
        Value::Boolean(flag) => Some(Literal::Bool(*flag)),
        Value::HexStringLiteral(digits) => hex::decode(digits).ok().map(Literal::Blob),
        Value::SingleQuotedByteStringLiteral(bits) => {
            i64::from_str_radix(bits, 2).ok().map(Literal::Int)
        }
        _ => None,
    }
}

fn number(digits: &str) -> Option<Literal> {
    if let Ok(number) = digits.parse::<i64>() {
        return Some(Literal::Int(number));
    }
    digits
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
        .map(Literal::Float)
}

fn function_default(function: &Function) -> Option<ParsedDefault> {
    let name = function.name.to_string().to_ascii_lowercase();
    let args = arguments(function);
    match name.as_str() {
        "nextval" => Some(ParsedDefault::Sequence),
        "current_timestamp" | "localtimestamp" | "now" | "statement_timestamp"
        | "transaction_timestamp" => Some(timestamp_default()),
        "datetime" => {
            let texts = string_arguments(&args)?;
            matches!(texts.as_slice(), [now] if now == "now")
                .then(timestamp_default)
                .or_else(|| {
                    matches!(texts.as_slice(), [now, local] if now == "now" && local == "localtime")
                        .then(timestamp_default)
                })
        }
        "strftime" => {
            let texts = string_arguments(&args)?;
            matches!(texts.as_slice(), [format, now] if format == "%s" && now == "now")
                .then(epoch_default)
        }
        "unix_timestamp" => args.is_empty().then(epoch_default),
        "date_part" => match args.as_slice() {
            [Expr::Value(Value::SingleQuotedString(field)), source]
                if field.eq_ignore_ascii_case("epoch") && is_now(source) =>
            {
                Some(epoch_default())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Positional arguments of a call; empty for a call without parentheses.
fn arguments(function: &Function) -> Vec<&Expr> {
    let FunctionArguments::List(list) = &function.args else {
        return Vec::new();
    };
    list.args
        .iter()
        .filter_map(|arg| match arg {
            FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) => Some(expr),
            _ => None,
        })
        .collect()
}

/// Lowercased string arguments, or `None` if any argument is not a string.
fn string_arguments(args: &[&Expr]) -> Option<Vec<String>> {
    args.iter()
        .map(|arg| match arg {
            Expr::Value(Value::SingleQuotedString(text)) => Some(text.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}

/// `now()`, `CURRENT_TIMESTAMP` and friends.
fn is_now(expr: &Expr) -> bool {
    matches!(
        classify(expr),
        Some(ParsedDefault::Value(ColumnDefault::CurrentTimestamp))
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(raw: &str) -> Literal {
        match parse_default(raw) {
            ParsedDefault::Value(ColumnDefault::Literal(value)) => value,
            other => panic!("expected a literal for {raw}, got {other:?}"),
        }
    }

    #[test]
    fn numbers_and_booleans() {
        assert_eq!(literal("0"), Literal::Int(0));
        assert_eq!(literal("-12"), Literal::Int(-12));
        assert_eq!(literal("(-2.5)"), Literal::Float(-2.5));
        assert_eq!(literal("1.5"), Literal::Float(1.5));
        assert_eq!(literal("(0)::bigint"), Literal::Int(0));
        assert_eq!(literal("false"), Literal::Bool(false));
        assert_eq!(literal("TRUE"), Literal::Bool(true));
        assert_eq!(literal("b'1'"), Literal::Int(1));
    }

    #[test]
    fn quoted_strings_lose_casts_and_doubling() {
        assert_eq!(
            literal("'pending'::character varying"),
            Literal::Text("pending".into())
        );
        assert_eq!(literal("'O''Brien'"), Literal::Text("O'Brien".into()));
        assert_eq!(literal("'a::b'"), Literal::Text("a::b".into()));
        assert_eq!(literal("X'CAFE'"), Literal::Blob(vec![0xca, 0xfe]));
    }

    #[test]
    fn null_and_empty_mean_absent() {
        assert_eq!(parse_default(""), ParsedDefault::Absent);
        assert_eq!(parse_default("NULL"), ParsedDefault::Absent);
        assert_eq!(parse_default("NULL::character varying"), ParsedDefault::Absent);
    }

    #[test]
    fn sequences_are_flagged() {
        assert_eq!(
            parse_default("nextval('m_agents_id_seq'::regclass)"),
            ParsedDefault::Sequence
        );
    }

    #[test]
    fn timestamp_functions() {
        for raw in [
            "CURRENT_TIMESTAMP",
            "current_timestamp()",
            "now()",
            "(datetime('now'))",
            "CURRENT_TIMESTAMP(3)",
        ] {
            assert_eq!(
                parse_default(raw),
                ParsedDefault::Value(ColumnDefault::CurrentTimestamp),
                "{raw}"
            );
        }
    }

    #[test]
    fn epoch_functions() {
        for raw in [
            "(strftime('%s', 'now'))",
            "unix_timestamp()",
            "(EXTRACT(epoch FROM now()))::integer",
        ] {
            assert_eq!(
                parse_default(raw),
                ParsedDefault::Value(ColumnDefault::UnixEpochNow),
                "{raw}"
            );
        }
    }

    #[test]
    fn other_expressions_are_unrecognized() {
        assert_eq!(
            parse_default("gen_random_uuid()"),
            ParsedDefault::Unrecognized("gen_random_uuid()".into())
        );
        assert!(matches!(
            parse_default("'a' || 'b'"),
            ParsedDefault::Unrecognized(_)
        ));
        assert_eq!(
            parse_default("0 0"),
            ParsedDefault::Unrecognized("0 0".into())
        );
        assert_eq!(
            parse_default("strftime('%Y', 'now')"),
            ParsedDefault::Unrecognized("strftime('%Y', 'now')".into())
        );
    }
}
