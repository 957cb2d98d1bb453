//! Value and type-tag model for parameters and result cells.

use chrono::{DateTime, FixedOffset, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MuxError, MuxResult};

/// A parameter or result-cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    /// Explicit null marker, distinct from "no parameter bound at all".
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit unsigned integer
    TinyInt(u8),
    /// 16-bit integer
    SmallInt(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    BigInt(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Exact decimal
    Decimal(Decimal),
    /// String
    Text(String),
    /// Date and time without offset
    DateTime(NaiveDateTime),
    /// Date and time with a fixed offset
    DateTimeOffset(DateTime<FixedOffset>),
    /// Time of day
    Time(NaiveTime),
    /// Raw byte array
    Bytes(Vec<u8>),
    /// Enum-backed integer; renders as its underlying value.
    Enum(i64),
}

/// Declaration type tag for a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlType {
    Text,
    Bool,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    DateTime,
    DateTimeOffset,
    Time,
    Bytes,
    Enum,
}

impl SqlValue {
    /// Infer the declaration type tag from the value kind.
    ///
    /// `Null` carries no kind of its own and maps to `Text`, the same
    /// default an untyped driver parameter gets.
    pub fn infer_type(&self) -> SqlType {
        match self {
            SqlValue::Null => SqlType::Text,
            SqlValue::Bool(_) => SqlType::Bool,
            SqlValue::TinyInt(_) => SqlType::TinyInt,
            SqlValue::SmallInt(_) => SqlType::SmallInt,
            SqlValue::Int(_) => SqlType::Int,
            SqlValue::BigInt(_) => SqlType::BigInt,
            SqlValue::Float(_) => SqlType::Float,
            SqlValue::Double(_) => SqlType::Double,
            SqlValue::Decimal(_) => SqlType::Decimal,
            SqlValue::Text(_) => SqlType::Text,
            SqlValue::DateTime(_) => SqlType::DateTime,
            SqlValue::DateTimeOffset(_) => SqlType::DateTimeOffset,
            SqlValue::Time(_) => SqlType::Time,
            SqlValue::Bytes(_) => SqlType::Bytes,
            SqlValue::Enum(_) => SqlType::Enum,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Short kind name used in conversion errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::TinyInt(_) => "tinyint",
            SqlValue::SmallInt(_) => "smallint",
            SqlValue::Int(_) => "int",
            SqlValue::BigInt(_) => "bigint",
            SqlValue::Float(_) => "float",
            SqlValue::Double(_) => "double",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::Text(_) => "text",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::DateTimeOffset(_) => "datetimeoffset",
            SqlValue::Time(_) => "time",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Enum(_) => "enum",
        }
    }
}

impl From<bool> for SqlValue {
    fn from(b: bool) -> Self {
        SqlValue::Bool(b)
    }
}

impl From<u8> for SqlValue {
    fn from(n: u8) -> Self {
        SqlValue::TinyInt(n)
    }
}

impl From<i16> for SqlValue {
    fn from(n: i16) -> Self {
        SqlValue::SmallInt(n)
    }
}

impl From<i32> for SqlValue {
    fn from(n: i32) -> Self {
        SqlValue::Int(n)
    }
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::BigInt(n)
    }
}

impl From<f32> for SqlValue {
    fn from(n: f32) -> Self {
        SqlValue::Float(n)
    }
}

impl From<f64> for SqlValue {
    fn from(n: f64) -> Self {
        SqlValue::Double(n)
    }
}

impl From<Decimal> for SqlValue {
    fn from(d: Decimal) -> Self {
        SqlValue::Decimal(d)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(t: NaiveDateTime) -> Self {
        SqlValue::DateTime(t)
    }
}

impl From<DateTime<FixedOffset>> for SqlValue {
    fn from(t: DateTime<FixedOffset>) -> Self {
        SqlValue::DateTimeOffset(t)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(t: NaiveTime) -> Self {
        SqlValue::Time(t)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(b: Vec<u8>) -> Self {
        SqlValue::Bytes(b)
    }
}

impl From<&[u8]> for SqlValue {
    fn from(b: &[u8]) -> Self {
        SqlValue::Bytes(b.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// Conversion out of a result cell or a scalar result.
pub trait FromSqlValue: Sized {
    fn from_sql(value: &SqlValue) -> MuxResult<Self>;
}

impl FromSqlValue for SqlValue {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        Ok(value.clone())
    }
}

impl FromSqlValue for bool {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Bool(b) => Ok(*b),
            other => Err(MuxError::conversion("bool", other.kind_name())),
        }
    }
}

impl FromSqlValue for u8 {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::TinyInt(n) => Ok(*n),
            other => Err(MuxError::conversion("u8", other.kind_name())),
        }
    }
}

impl FromSqlValue for i16 {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::TinyInt(n) => Ok(i16::from(*n)),
            SqlValue::SmallInt(n) => Ok(*n),
            other => Err(MuxError::conversion("i16", other.kind_name())),
        }
    }
}

impl FromSqlValue for i32 {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::TinyInt(n) => Ok(i32::from(*n)),
            SqlValue::SmallInt(n) => Ok(i32::from(*n)),
            SqlValue::Int(n) => Ok(*n),
            other => Err(MuxError::conversion("i32", other.kind_name())),
        }
    }
}

impl FromSqlValue for i64 {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::TinyInt(n) => Ok(i64::from(*n)),
            SqlValue::SmallInt(n) => Ok(i64::from(*n)),
            SqlValue::Int(n) => Ok(i64::from(*n)),
            SqlValue::BigInt(n) => Ok(*n),
            SqlValue::Enum(n) => Ok(*n),
            other => Err(MuxError::conversion("i64", other.kind_name())),
        }
    }
}

impl FromSqlValue for f64 {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Float(n) => Ok(f64::from(*n)),
            SqlValue::Double(n) => Ok(*n),
            other => Err(MuxError::conversion("f64", other.kind_name())),
        }
    }
}

impl FromSqlValue for Decimal {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Decimal(d) => Ok(*d),
            SqlValue::TinyInt(n) => Ok(Decimal::from(*n)),
            SqlValue::SmallInt(n) => Ok(Decimal::from(*n)),
            SqlValue::Int(n) => Ok(Decimal::from(*n)),
            SqlValue::BigInt(n) => Ok(Decimal::from(*n)),
            other => Err(MuxError::conversion("decimal", other.kind_name())),
        }
    }
}

impl FromSqlValue for String {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Text(s) => Ok(s.clone()),
            other => Err(MuxError::conversion("string", other.kind_name())),
        }
    }
}

impl FromSqlValue for NaiveDateTime {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::DateTime(t) => Ok(*t),
            other => Err(MuxError::conversion("datetime", other.kind_name())),
        }
    }
}

impl FromSqlValue for DateTime<FixedOffset> {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::DateTimeOffset(t) => Ok(*t),
            other => Err(MuxError::conversion("datetimeoffset", other.kind_name())),
        }
    }
}

impl FromSqlValue for NaiveTime {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Time(t) => Ok(*t),
            other => Err(MuxError::conversion("time", other.kind_name())),
        }
    }
}

impl FromSqlValue for Vec<u8> {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Bytes(b) => Ok(b.clone()),
            other => Err(MuxError::conversion("bytes", other.kind_name())),
        }
    }
}

impl<T: FromSqlValue> FromSqlValue for Option<T> {
    fn from_sql(value: &SqlValue) -> MuxResult<Self> {
        match value {
            SqlValue::Null => Ok(None),
            other => T::from_sql(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_type_per_kind() {
        assert_eq!(SqlValue::from("x").infer_type(), SqlType::Text);
        assert_eq!(SqlValue::from(7i16).infer_type(), SqlType::SmallInt);
        assert_eq!(SqlValue::from(7i32).infer_type(), SqlType::Int);
        assert_eq!(SqlValue::from(7i64).infer_type(), SqlType::BigInt);
        assert_eq!(SqlValue::from(7.5f64).infer_type(), SqlType::Double);
        assert_eq!(SqlValue::Enum(3).infer_type(), SqlType::Enum);
    }

    #[test]
    fn test_null_infers_text() {
        assert_eq!(SqlValue::Null.infer_type(), SqlType::Text);
    }

    #[test]
    fn test_option_becomes_null_marker() {
        assert_eq!(SqlValue::from(None::<i32>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(5i32)), SqlValue::Int(5));
    }

    #[test]
    fn test_typed_extraction() {
        assert_eq!(i64::from_sql(&SqlValue::Int(9)).unwrap(), 9);
        assert_eq!(
            Option::<String>::from_sql(&SqlValue::Null).unwrap(),
            None
        );
        let err = bool::from_sql(&SqlValue::Text("t".into())).unwrap_err();
        assert_eq!(err.to_string(), "Cannot convert text value to bool");
    }
}
