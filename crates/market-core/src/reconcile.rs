//! Snapshot reconciliation: existing table contents + fresh snapshot → merged
//! dataset.
//!
//! The policy is "upsert by identifier, keep history":
//!
//! - rows whose identifier appears in both snapshots take the new values;
//! - rows whose identifier is new are appended;
//! - rows present only in the old snapshot are kept unchanged.
//!
//! Old-origin rows come first in their old order, followed by strictly new
//! rows in their new order.

use std::collections::{HashMap, hash_map::Entry};

use crate::{Dataset, Error, Result, Value};

/// Counters describing what a reconciliation did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
  /// Rows whose identifier was not in the old snapshot.
  pub inserted:   usize,
  /// Old rows overwritten with new values.
  pub updated:    usize,
  /// Old rows absent from the new snapshot, kept as history.
  pub retained:   usize,
  /// Rows dropped because a later row in the same snapshot had the same
  /// identifier.
  pub duplicates: usize,
}

/// The merged dataset plus its counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
  pub dataset: Dataset,
  pub stats:   ReconcileStats,
}

/// Merge `new` into `old`, keyed on `identifier_column`.
///
/// Fails with [`Error::MissingIdentifierColumn`] when `new` lacks the column,
/// and with [`Error::NullIdentifier`] when a row of `new` has no identifier.
///
/// Within one snapshot the last row for a given identifier wins; it takes the
/// position of the first occurrence. An empty `old`, or one without the
/// column, is treated as "no history" and the result is `new` with those
/// duplicates collapsed.
pub fn reconcile(
  old: Dataset,
  new: Dataset,
  identifier_column: &str,
) -> Result<Reconciled> {
  let Some(new_id) = new.column_index(identifier_column) else {
    return Err(Error::MissingIdentifierColumn {
      column:    identifier_column.to_owned(),
      available: new.columns().to_vec(),
    });
  };

  if let Some(row) = new.rows().iter().position(|r| r[new_id].is_null()) {
    return Err(Error::NullIdentifier {
      column: identifier_column.to_owned(),
      row,
    });
  }

  let (new_columns, new_rows, new_dupes) = collapse_duplicates(new, new_id);

  let old_id = match old.column_index(identifier_column) {
    Some(idx) if !old.is_empty() => idx,
    _ => {
      let stats = ReconcileStats {
        inserted: new_rows.len(),
        duplicates: new_dupes,
        ..Default::default()
      };
      let dataset = Dataset::from_rows(new_columns, new_rows)?;
      return Ok(Reconciled { dataset, stats });
    }
  };

  let (mut columns, old_rows, old_dupes) = collapse_duplicates(old, old_id);

  // Column-wise union: old order first, then columns only the new snapshot
  // carries. `placement[j]` is where new column j lands in the output.
  let mut placement = Vec::with_capacity(new_columns.len());
  for column in new_columns {
    match columns.iter().position(|c| *c == column) {
      Some(idx) => placement.push(idx),
      None => {
        placement.push(columns.len());
        columns.push(column);
      }
    }
  }
  let width = columns.len();

  let mut index: HashMap<Value, usize> = HashMap::with_capacity(old_rows.len());
  let mut rows: Vec<Vec<Value>> =
    Vec::with_capacity(old_rows.len() + new_rows.len());
  for mut row in old_rows {
    index.insert(row[old_id].clone(), rows.len());
    row.resize(width, Value::Null);
    rows.push(row);
  }
  let old_len = rows.len();

  let mut stats = ReconcileStats {
    duplicates: new_dupes + old_dupes,
    ..Default::default()
  };

  for new_row in new_rows {
    match index.get(&new_row[new_id]) {
      Some(&at) => {
        let target = &mut rows[at];
        for (j, value) in new_row.into_iter().enumerate() {
          target[placement[j]] = value;
        }
        stats.updated += 1;
      }
      None => {
        let mut out = vec![Value::Null; width];
        for (j, value) in new_row.into_iter().enumerate() {
          out[placement[j]] = value;
        }
        rows.push(out);
        stats.inserted += 1;
      }
    }
  }
  stats.retained = old_len - stats.updated;

  let dataset = Dataset::from_rows(columns, rows)?;
  Ok(Reconciled { dataset, stats })
}

/// Collapse rows sharing an identifier: last values, first position.
///
/// Returns the columns, the surviving rows and how many rows were dropped.
fn collapse_duplicates(
  dataset: Dataset,
  id: usize,
) -> (Vec<String>, Vec<Vec<Value>>, usize) {
  let (columns, rows) = dataset.into_parts();
  let total = rows.len();

  let mut seen: HashMap<Value, usize> = HashMap::with_capacity(total);
  let mut kept: Vec<Vec<Value>> = Vec::with_capacity(total);
  for row in rows {
    match seen.entry(row[id].clone()) {
      Entry::Occupied(e) => kept[*e.get()] = row,
      Entry::Vacant(e) => {
        e.insert(kept.len());
        kept.push(row);
      }
    }
  }

  let dropped = total - kept.len();
  (columns, kept, dropped)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn int(i: i64) -> Value { Value::Integer(i) }

  fn ds(columns: &[&str], rows: Vec<Vec<Value>>) -> Dataset {
    Dataset::from_rows(columns.iter().copied(), rows).unwrap()
  }

  fn old_snapshot() -> Dataset {
    ds(&["id", "name"], vec![
      vec![int(1), "A".into()],
      vec![int(2), "B".into()],
    ])
  }

  fn new_snapshot() -> Dataset {
    ds(&["id", "name"], vec![
      vec![int(2), "B2".into()],
      vec![int(3), "C".into()],
    ])
  }

  #[test]
  fn upsert_keeps_history_and_appends() {
    let out = reconcile(old_snapshot(), new_snapshot(), "id").unwrap();

    let expected = ds(&["id", "name"], vec![
      vec![int(1), "A".into()],
      vec![int(2), "B2".into()],
      vec![int(3), "C".into()],
    ]);
    assert_eq!(out.dataset, expected);
    assert_eq!(out.stats, ReconcileStats {
      inserted:   1,
      updated:    1,
      retained:   1,
      duplicates: 0,
    });
  }

  #[test]
  fn missing_identifier_in_new_fails() {
    let new = ds(&["ident", "name"], vec![vec![int(1), "A".into()]]);
    let err = reconcile(old_snapshot(), new, "id").unwrap_err();
    match err {
      Error::MissingIdentifierColumn { column, available } => {
        assert_eq!(column, "id");
        assert_eq!(available, ["ident", "name"]);
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }

  #[test]
  fn null_identifier_in_new_fails() {
    let new = ds(&["id", "name"], vec![
      vec![int(1), "Ana".into()],
      vec![Value::Null, "Ghost".into()],
    ]);
    let err = reconcile(Dataset::default(), new, "id").unwrap_err();
    assert!(matches!(err, Error::NullIdentifier { row: 1, .. }));
  }

  #[test]
  fn empty_old_returns_new() {
    let out = reconcile(Dataset::default(), new_snapshot(), "id").unwrap();
    assert_eq!(out.dataset, new_snapshot());
    assert_eq!(out.stats.inserted, 2);
    assert_eq!(out.stats.updated, 0);
  }

  #[test]
  fn empty_old_with_columns_returns_new() {
    let old = Dataset::new(["id", "name", "extra"]).unwrap();
    let out = reconcile(old, new_snapshot(), "id").unwrap();
    assert_eq!(out.dataset, new_snapshot());
  }

  #[test]
  fn old_without_identifier_returns_new() {
    let old = ds(&["other", "name"], vec![vec![int(9), "Z".into()]]);
    let out = reconcile(old, new_snapshot(), "id").unwrap();
    assert_eq!(out.dataset, new_snapshot());
    assert_eq!(out.stats.retained, 0);
  }

  #[test]
  fn duplicates_in_new_last_wins() {
    let new = ds(&["id", "v"], vec![
      vec![int(5), "x".into()],
      vec![int(5), "y".into()],
    ]);
    let out = reconcile(Dataset::default(), new, "id").unwrap();

    assert_eq!(out.dataset, ds(&["id", "v"], vec![vec![int(5), "y".into()]]));
    assert_eq!(out.stats.duplicates, 1);
    assert_eq!(out.stats.inserted, 1);
  }

  #[test]
  fn duplicates_keep_first_position() {
    let new = ds(&["id", "v"], vec![
      vec![int(1), "a".into()],
      vec![int(2), "b".into()],
      vec![int(1), "c".into()],
    ]);
    let out = reconcile(Dataset::default(), new, "id").unwrap();
    assert_eq!(out.dataset, ds(&["id", "v"], vec![
      vec![int(1), "c".into()],
      vec![int(2), "b".into()],
    ]));
  }

  #[test]
  fn duplicates_in_new_against_history() {
    let new = ds(&["id", "name"], vec![
      vec![int(2), "first".into()],
      vec![int(2), "second".into()],
    ]);
    let out = reconcile(old_snapshot(), new, "id").unwrap();
    assert_eq!(out.dataset.get(1, "name"), Some(&Value::text("second")));
    assert_eq!(out.dataset.len(), 2);
    assert_eq!(out.stats.updated, 1);
  }

  #[test]
  fn duplicates_in_old_are_collapsed() {
    let old = ds(&["id", "name"], vec![
      vec![int(1), "A".into()],
      vec![int(1), "A2".into()],
    ]);
    let new = ds(&["id", "name"], vec![vec![int(3), "C".into()]]);
    let out = reconcile(old, new, "id").unwrap();
    assert_eq!(out.dataset, ds(&["id", "name"], vec![
      vec![int(1), "A2".into()],
      vec![int(3), "C".into()],
    ]));
  }

  #[test]
  fn new_only_column_is_added() {
    let new = ds(&["id", "name", "collected"], vec![
      vec![int(2), "B2".into(), "t".into()],
      vec![int(3), "C".into(), "t".into()],
    ]);
    let out = reconcile(old_snapshot(), new, "id").unwrap();

    assert_eq!(out.dataset.columns(), ["id", "name", "collected"]);
    assert_eq!(out.dataset.get(0, "collected"), Some(&Value::Null));
    assert_eq!(out.dataset.get(1, "collected"), Some(&Value::text("t")));
    assert_eq!(out.dataset.get(2, "collected"), Some(&Value::text("t")));
  }

  #[test]
  fn old_only_column_keeps_old_value() {
    let old = ds(&["id", "name", "note"], vec![
      vec![int(1), "A".into(), "kept".into()],
      vec![int(2), "B".into(), "also kept".into()],
    ]);
    let out = reconcile(old, new_snapshot(), "id").unwrap();

    assert_eq!(out.dataset.columns(), ["id", "name", "note"]);
    assert_eq!(out.dataset.get(1, "name"), Some(&Value::text("B2")));
    assert_eq!(out.dataset.get(1, "note"), Some(&Value::text("also kept")));
    assert_eq!(out.dataset.get(2, "note"), Some(&Value::Null));
  }

  #[test]
  fn null_overwrites_old_value() {
    let new = ds(&["id", "name"], vec![vec![int(1), Value::Null]]);
    let out = reconcile(old_snapshot(), new, "id").unwrap();
    assert_eq!(out.dataset.get(0, "name"), Some(&Value::Null));
  }

  #[test]
  fn identifiers_match_exactly() {
    let new = ds(&["id", "name"], vec![vec!["1".into(), "text one".into()]]);
    let out = reconcile(old_snapshot(), new, "id").unwrap();
    assert_eq!(out.dataset.len(), 3);
    assert_eq!(out.stats.inserted, 1);
  }

  #[test]
  fn empty_new_keeps_old() {
    let new = Dataset::new(["id", "name"]).unwrap();
    let out = reconcile(old_snapshot(), new, "id").unwrap();
    assert_eq!(out.dataset, old_snapshot());
    assert_eq!(out.stats.retained, 2);
  }

  #[test]
  fn reapplying_snapshot_is_a_no_op() {
    let new = ds(&["id", "name", "collected"], vec![
      vec![int(2), "B2".into(), "t".into()],
      vec![int(3), "C".into(), "t".into()],
      vec![int(4), Value::Null, "t".into()],
    ]);
    let once = reconcile(old_snapshot(), new.clone(), "id").unwrap();
    let twice = reconcile(once.dataset.clone(), new, "id").unwrap();

    assert_eq!(twice.dataset, once.dataset);
    assert_eq!(twice.stats.inserted, 0);
  }

  #[test]
  fn row_count_law() {
    let old = ds(
      &["id", "name"],
      (0..10).map(|i| vec![int(i), "old".into()]).collect(),
    );
    let new = ds(
      &["id", "name"],
      (5..20).map(|i| vec![int(i), "new".into()]).collect(),
    );
    let out = reconcile(old.clone(), new, "id").unwrap();

    // 10 old rows + ids 10..20 which are new.
    assert_eq!(out.dataset.len(), old.len() + 10);
    assert_eq!(out.stats.updated, 5);
    assert_eq!(out.stats.retained, 5);
    assert_eq!(out.stats.inserted, 10);
  }

  #[test]
  fn output_identifiers_are_unique() {
    let old = ds(&["id", "name"], vec![
      vec![int(1), "a".into()],
      vec![int(1), "b".into()],
      vec![int(2), "c".into()],
    ]);
    let new = ds(&["id", "name"], vec![
      vec![int(2), "d".into()],
      vec![int(3), "e".into()],
      vec![int(3), "f".into()],
    ]);
    let out = reconcile(old, new, "id").unwrap();

    let ids: Vec<&Value> = out.dataset.column_values("id").unwrap().collect();
    let unique: std::collections::HashSet<&Value> =
      ids.iter().copied().collect();
    assert_eq!(ids.len(), unique.len());
  }
}
