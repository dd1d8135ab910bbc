//! SQL text for snapshot tables.
//!
//! Snapshot tables have no fixed schema: columns come from whatever the
//! downloaded file carries, so DDL is generated from the dataset being
//! written. Every identifier goes through [`quote_ident`].

use market_core::Value;

/// Connection pragmas, executed once when a store is opened.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared column type for a set of values.
///
/// `INTEGER` when every non-null value is an integer, `REAL` when integers and
/// reals mix, `TEXT` otherwise (including all-null columns).
pub fn column_type<'a>(
  values: impl IntoIterator<Item = &'a Value>,
) -> &'static str {
  let mut seen_integer = false;
  let mut seen_real = false;
  for value in values {
    match value {
      Value::Null => {}
      Value::Integer(_) => seen_integer = true,
      Value::Real(_) => seen_real = true,
      Value::Text(_) => return "TEXT",
    }
  }
  match (seen_integer, seen_real) {
    (_, true) => "REAL",
    (true, false) => "INTEGER",
    (false, false) => "TEXT",
  }
}

/// `CREATE TABLE` for `columns`.
///
/// The key column is `NOT NULL` as well: on an `INTEGER PRIMARY KEY` SQLite
/// would otherwise replace a null with a fresh rowid.
pub fn create_table_sql(
  table: &str,
  columns: &[(String, &'static str)],
  primary_key: Option<&str>,
) -> String {
  let defs: Vec<String> = columns
    .iter()
    .map(|(name, ty)| {
      if primary_key == Some(name.as_str()) {
        format!("{} {ty} NOT NULL PRIMARY KEY", quote_ident(name))
      } else {
        format!("{} {ty}", quote_ident(name))
      }
    })
    .collect();
  format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

pub fn drop_table_sql(table: &str) -> String {
  format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn add_column_sql(table: &str, column: &str, ty: &str) -> String {
  format!(
    "ALTER TABLE {} ADD COLUMN {} {ty}",
    quote_ident(table),
    quote_ident(column)
  )
}

pub fn delete_all_sql(table: &str) -> String {
  format!("DELETE FROM {}", quote_ident(table))
}

pub fn insert_sql(table: &str, columns: &[String]) -> String {
  let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
  let params: Vec<String> =
    (1..=columns.len()).map(|i| format!("?{i}")).collect();
  format!(
    "INSERT INTO {} ({}) VALUES ({})",
    quote_ident(table),
    names.join(", "),
    params.join(", ")
  )
}
