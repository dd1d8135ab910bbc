//! Conversions between [`market_core::Value`] and SQLite values.
//!
//! Integers, reals, text and NULL map one to one. BLOB cells have no
//! counterpart in the core model and are read back as lossy UTF-8 text.

use market_core::Value;
use rusqlite::types::Value as SqlValue;

pub fn encode_value(v: &Value) -> SqlValue {
  match v {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Real(r) => SqlValue::Real(*r),
    Value::Text(s) => SqlValue::Text(s.clone()),
  }
}

pub fn decode_value(v: SqlValue) -> Value {
  match v {
    SqlValue::Null => Value::Null,
    SqlValue::Integer(i) => Value::Integer(i),
    SqlValue::Real(r) => Value::Real(r),
    SqlValue::Text(s) => Value::Text(s),
    SqlValue::Blob(b) => Value::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}

pub fn encode_row(row: &[Value]) -> Vec<SqlValue> {
  row.iter().map(encode_value).collect()
}

pub fn decode_row(row: Vec<SqlValue>) -> Vec<Value> {
  row.into_iter().map(decode_value).collect()
}
