//! Dialect-correct literal rendering of bound parameters.
//!
//! Produces the declaration lines used by batched HANA blocks and the full
//! replayable command text used for diagnostics. The reconstructed text is
//! never fed back into execution.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::dialect::{Dialect, Family};
use crate::params::{Parameter, ParameterSet};
use crate::rewrite::{rewrite_for_hana, strip_parameter_markers};
use crate::value::{SqlType, SqlValue};

/// HANA declaration keyword per type tag. `Text` is sized at the call site.
fn hana_type_name(ty: SqlType) -> &'static str {
    match ty {
        SqlType::Text => "VARCHAR",
        SqlType::Bool => "BOOLEAN",
        SqlType::TinyInt => "TINYINT",
        SqlType::SmallInt => "SMALLINT",
        SqlType::Int => "INTEGER",
        SqlType::BigInt => "BIGINT",
        SqlType::Float => "REAL",
        SqlType::Double => "DOUBLE",
        SqlType::Decimal => "DECIMAL(19,4)",
        SqlType::DateTime | SqlType::DateTimeOffset => "TIMESTAMP",
        SqlType::Time => "TIME",
        SqlType::Bytes => "VARBINARY",
        SqlType::Enum => "INTEGER",
    }
}

/// T-SQL declaration keyword per type tag.
fn tsql_type_name(ty: SqlType) -> &'static str {
    match ty {
        SqlType::Text => "NVarChar",
        SqlType::Bool => "Bit",
        SqlType::TinyInt => "TinyInt",
        SqlType::SmallInt => "SmallInt",
        SqlType::Int => "Int",
        SqlType::BigInt => "BigInt",
        SqlType::Float => "Real",
        SqlType::Double => "Float",
        SqlType::Decimal => "Decimal(19,4)",
        SqlType::DateTime => "DateTime",
        SqlType::DateTimeOffset => "DateTimeOffset",
        SqlType::Time => "Time",
        SqlType::Bytes => "VarBinary",
        SqlType::Enum => "Int",
    }
}

/// One `DECLARE <name> <type> := <literal>;` line for a HANA block.
///
/// The declared name is the bare parameter name; block bodies reference it
/// without a marker. Strings are sized to their character length.
pub fn hana_declare_line(param: &Parameter) -> String {
    let name = param.bare_name();
    match param.effective_type() {
        SqlType::Text => match param.value() {
            SqlValue::Null => format!("DECLARE {name} VARCHAR(1) := NULL;"),
            value => {
                let text = display_string(value);
                let size = text.chars().count().max(1);
                let escaped = text.replace('\'', "''");
                format!("DECLARE {name} VARCHAR({size}) := '{escaped}';")
            }
        },
        ty if param.value().is_null() => {
            format!("DECLARE {name} {} := NULL;", hana_type_name(ty))
        }
        SqlType::Decimal | SqlType::Double => format!(
            "DECLARE {name} DECIMAL(19,4) := {};",
            numeric_literal(param.value())
        ),
        SqlType::DateTime | SqlType::DateTimeOffset => format!(
            "DECLARE {name} TIMESTAMP := {};",
            hana_timestamp_literal(param.value())
        ),
        SqlType::Enum => format!(
            "DECLARE {name} INTEGER := {};",
            display_string(param.value())
        ),
        ty => format!(
            "DECLARE {name} {} := {};",
            hana_type_name(ty),
            display_string(param.value())
        ),
    }
}

/// One `declare <@name> <Type> = <literal>;` line for the SQL Server family.
pub fn tsql_declare_line(param: &Parameter) -> String {
    let name = param.name();
    match param.effective_type() {
        SqlType::Text => match param.value() {
            SqlValue::Null => format!("declare {name} NVarChar(1) = null;"),
            value => {
                let text = display_string(value);
                let size = text.chars().count().max(1);
                let escaped = text.replace('\'', "''");
                format!("declare {name} NVarChar({size}) = '{escaped}';")
            }
        },
        ty if param.value().is_null() => {
            format!("declare {name} {} = null;", tsql_type_name(ty))
        }
        SqlType::Decimal | SqlType::Double => format!(
            "declare {name} Decimal(19,4) = {};",
            numeric_literal(param.value())
        ),
        SqlType::DateTime | SqlType::DateTimeOffset => format!(
            "declare {name} DateTime = {};",
            tsql_datetime_literal(param.value())
        ),
        SqlType::Bool => format!("declare {name} Bit = '{}';", display_string(param.value())),
        SqlType::Enum => format!("declare {name} Int = {};", display_string(param.value())),
        ty => format!(
            "declare {name} {} = {};",
            tsql_type_name(ty),
            display_string(param.value())
        ),
    }
}

/// Reconstruct a replayable command text with every parameter inlined.
///
/// HANA output is wrapped in `DO BEGIN`/`END;` unless the text already
/// starts with `DO BEGIN`; the SQL Server family gets `declare` lines
/// followed by the text verbatim; other dialects return the text as-is.
pub fn full_command_text(text: &str, params: &ParameterSet, dialect: Dialect) -> String {
    match dialect.family() {
        Family::Hana => {
            let wrap = !starts_with_ignore_case(text, "DO BEGIN");
            let mut out = String::new();
            if wrap {
                out.push_str("DO BEGIN\n");
            }
            for param in params {
                out.push_str(&hana_declare_line(param));
                out.push('\n');
            }
            let mut body = strip_parameter_markers(&rewrite_for_hana(text));
            if !body.ends_with(';') {
                body.push(';');
            }
            out.push_str(&body);
            out.push('\n');
            if wrap {
                out.push_str("END;");
            }
            out
        }
        Family::SqlServer => {
            let mut out = String::new();
            for param in params {
                out.push_str(&tsql_declare_line(param));
                out.push('\n');
            }
            out.push_str(text);
            out
        }
        _ => text.to_string(),
    }
}

/// Decimal-family literal: invariant `.` separator, one fractional digit,
/// ties rounded to even.
fn numeric_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Decimal(d) => decimal_scale1(*d),
        SqlValue::Double(v) => format!("{v:.1}"),
        SqlValue::Float(v) => format!("{v:.1}"),
        SqlValue::TinyInt(n) => format!("{n}.0"),
        SqlValue::SmallInt(n) => format!("{n}.0"),
        SqlValue::Int(n) => format!("{n}.0"),
        SqlValue::BigInt(n) => format!("{n}.0"),
        other => display_string(other),
    }
}

fn decimal_scale1(d: Decimal) -> String {
    let rounded = d.round_dp(1);
    if rounded.fract().is_zero() {
        format!("{}.0", rounded.trunc().normalize())
    } else {
        rounded.normalize().to_string()
    }
}

fn hana_timestamp_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::DateTime(t) => hana_timestamp(*t),
        SqlValue::DateTimeOffset(t) => hana_timestamp(t.naive_local()),
        other => display_string(other),
    }
}

fn hana_timestamp(t: NaiveDateTime) -> String {
    format!(
        "TO_TIMESTAMP('{}', 'DD-MM-YYYY HH24:MI:SS')",
        t.format("%d-%m-%Y %H:%M:%S")
    )
}

fn tsql_datetime_literal(value: &SqlValue) -> String {
    let t = match value {
        SqlValue::DateTime(t) => *t,
        SqlValue::DateTimeOffset(t) => t.naive_local(),
        other => return display_string(other),
    };
    format!("convert(datetime, '{}', 120)", t.format("%Y-%m-%d %H:%M:%S"))
}

/// Plain string form of a value, used inside the literal builders.
/// Booleans keep the `True`/`False` casing the backing providers accept.
fn display_string(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Bool(b) => if *b { "True" } else { "False" }.to_string(),
        SqlValue::TinyInt(n) => n.to_string(),
        SqlValue::SmallInt(n) => n.to_string(),
        SqlValue::Int(n) => n.to_string(),
        SqlValue::BigInt(n) => n.to_string(),
        SqlValue::Float(v) => v.to_string(),
        SqlValue::Double(v) => v.to_string(),
        SqlValue::Decimal(d) => d.to_string(),
        SqlValue::Text(s) => s.clone(),
        SqlValue::DateTime(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        SqlValue::DateTimeOffset(t) => t.to_rfc3339(),
        SqlValue::Time(t) => format!("'{}'", t.format("%H:%M:%S")),
        SqlValue::Bytes(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            format!("X'{hex}'")
        }
        SqlValue::Enum(n) => n.to_string(),
    }
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
