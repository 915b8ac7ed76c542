//! SQL value types carried from the source cursor to the target insert.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Engine-neutral SQL value.
///
/// The source driver decodes each column into one of these variants and the
/// target driver binds it as a statement parameter. Values that SQLite has no
/// native storage class for (decimals, out-of-range unsigned integers, JSON)
/// travel as text.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,

    /// Boolean value (`BIT(1)`, `BOOL`).
    Bool(bool),

    /// Any integer that fits in 64 signed bits.
    I64(i64),

    /// Floating point (`FLOAT`, `DOUBLE`).
    F64(f64),

    /// Character data, decimals rendered as text, JSON documents.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One source row, values in column order.
pub type Row = Vec<SqlValue>;
