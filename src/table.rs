//! Materialized result sets.

use serde::Serialize;

use crate::error::{MuxError, MuxResult};
use crate::value::{FromSqlValue, SqlValue};

/// One materialized result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub name: Option<String>,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// All result sets produced by one execution, in order.
pub type DataSet = Vec<Table>;

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: None,
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_row(mut self, row: Vec<SqlValue>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<&[SqlValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Column position by name, compared case-insensitively.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Typed cell access by row index and column name.
    pub fn value<T: FromSqlValue>(&self, row: usize, column: &str) -> MuxResult<T> {
        let index = self
            .column_index(column)
            .ok_or_else(|| MuxError::UnknownColumn(column.to_string()))?;
        let cell = self
            .rows
            .get(row)
            .and_then(|r| r.get(index))
            .unwrap_or(&SqlValue::Null);
        T::from_sql(cell)
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let rows: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (i, column) in self.columns.iter().enumerate() {
                    let cell = row.get(i).unwrap_or(&SqlValue::Null);
                    object.insert(column.clone(), json_value(cell));
                }
                serde_json::Value::Object(object)
            })
            .collect();
        serde_json::Value::Array(rows)
    }
}

fn json_value(value: &SqlValue) -> serde_json::Value {
    use serde_json::json;
    match value {
        SqlValue::Null => serde_json::Value::Null,
        SqlValue::Bool(b) => json!(b),
        SqlValue::TinyInt(n) => json!(n),
        SqlValue::SmallInt(n) => json!(n),
        SqlValue::Int(n) => json!(n),
        SqlValue::BigInt(n) => json!(n),
        SqlValue::Float(v) => json!(v),
        SqlValue::Double(v) => json!(v),
        SqlValue::Decimal(d) => json!(d.to_string()),
        SqlValue::Text(s) => json!(s),
        SqlValue::DateTime(t) => json!(t.format("%Y-%m-%dT%H:%M:%S").to_string()),
        SqlValue::DateTimeOffset(t) => json!(t.to_rfc3339()),
        SqlValue::Time(t) => json!(t.format("%H:%M:%S").to_string()),
        SqlValue::Bytes(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
            json!(hex)
        }
        SqlValue::Enum(n) => json!(n),
    }
}
