//! [`SqliteStore`] — the SQLite implementation of [`TableStore`].

use std::path::Path;

use market_core::{Dataset, TableStore, WriteMode, WriteOptions};
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use crate::{
  Error, Result,
  encode::{decode_row, encode_row},
  schema::{
    PRAGMAS, add_column_sql, column_type, create_table_sql, delete_all_sql,
    drop_table_sql, insert_sql, quote_ident,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A snapshot store backed by a single SQLite database.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a database at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory database — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init().await?;
    Ok(store)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// SQLite resolves table names case-insensitively, so the lookup does too.
fn table_exists(
  conn: &rusqlite::Connection,
  table: &str,
) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master \
         WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
        rusqlite::params![table],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

fn table_columns(
  conn: &rusqlite::Connection,
  table: &str,
) -> rusqlite::Result<Vec<String>> {
  let sql = format!("SELECT * FROM {} LIMIT 0", quote_ident(table));
  let stmt = conn.prepare(&sql)?;
  Ok(stmt.column_names().into_iter().map(str::to_owned).collect())
}

// ─── TableStore impl ─────────────────────────────────────────────────────────

impl TableStore for SqliteStore {
  type Error = Error;

  async fn read_table(&self, table: &str) -> Result<Dataset> {
    let table = table.to_owned();

    let raw: Option<(Vec<String>, Vec<Vec<SqlValue>>)> = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, &table)? {
          return Ok(None);
        }

        let sql = format!("SELECT * FROM {}", quote_ident(&table));
        let mut stmt = conn.prepare(&sql)?;
        let columns: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();
        let width = columns.len();

        let rows = stmt
          .query_map([], |row| {
            (0..width)
              .map(|i| row.get::<_, SqlValue>(i))
              .collect::<rusqlite::Result<Vec<_>>>()
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((columns, rows)))
      })
      .await?;

    let Some((columns, rows)) = raw else {
      tracing::debug!("table does not exist yet; reading as empty");
      return Ok(Dataset::default());
    };

    let rows = rows.into_iter().map(decode_row).collect();
    Ok(Dataset::from_rows(columns, rows)?)
  }

  async fn write_table(
    &self,
    table: &str,
    dataset: &Dataset,
    options: &WriteOptions,
  ) -> Result<()> {
    if let Some(pk) = &options.primary_key
      && !dataset.has_column(pk)
    {
      return Err(Error::UnknownColumn {
        table:  table.to_owned(),
        column: pk.clone(),
      });
    }

    let table = table.to_owned();
    let mode = options.mode;
    let primary_key = options.primary_key.clone();
    let columns: Vec<String> = dataset.columns().to_vec();
    let typed: Vec<(String, &'static str)> = columns
      .iter()
      .enumerate()
      .map(|(i, name)| {
        let ty = column_type(dataset.rows().iter().map(|r| &r[i]));
        (name.clone(), ty)
      })
      .collect();
    let rows: Vec<Vec<SqlValue>> =
      dataset.rows().iter().map(|r| encode_row(r)).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let exists = table_exists(&tx, &table)?;

        match (mode, exists) {
          (WriteMode::Replace, _) | (WriteMode::DeleteAppend, false) => {
            tx.execute_batch(&drop_table_sql(&table))?;
            let pk = primary_key.as_deref();
            tx.execute_batch(&create_table_sql(&table, &typed, pk))?;
          }
          (WriteMode::DeleteAppend, true) => {
            let existing = table_columns(&tx, &table)?;
            // Column names match case-insensitively, as in SQLite itself.
            for (name, ty) in &typed {
              if !existing.iter().any(|e| e.eq_ignore_ascii_case(name)) {
                tx.execute_batch(&add_column_sql(&table, name, ty))?;
              }
            }
            tx.execute_batch(&delete_all_sql(&table))?;
          }
        }

        {
          let mut stmt = tx.prepare(&insert_sql(&table, &columns))?;
          for row in &rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
          }
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  async fn count_rows(&self, table: &str) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));

    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await?;

    Ok(count.max(0) as u64)
  }

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
