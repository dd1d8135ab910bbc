//! Snapshot decoding: gzip-compressed CSV bytes → [`Dataset`].
//!
//! Header names are trimmed, an Excel-style `sep=<c>` first line picks the
//! delimiter, and each column gets one type inferred from all of its cells.

use std::io::Read as _;

use chrono::NaiveDateTime;
use flate2::read::GzDecoder;
use market_core::{Dataset, Value};

use crate::{Error, Result};

/// Format of the collection timestamp stamped on downloaded rows.
pub const COLLECTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decompress and parse a downloaded snapshot.
pub fn decode_snapshot(payload: &[u8]) -> Result<Dataset> {
  let mut raw = Vec::new();
  GzDecoder::new(payload)
    .read_to_end(&mut raw)
    .map_err(Error::Decompress)?;

  let text = String::from_utf8_lossy(&raw);
  let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
  let (delimiter, body) = split_separator_hint(text);
  parse_csv(body, delimiter)
}

/// Set `column` to the formatted collection time on every row.
pub fn stamp_collection_time(
  dataset: &mut Dataset,
  column: &str,
  at: NaiveDateTime,
) {
  let stamp = at.format(COLLECTED_AT_FORMAT).to_string();
  dataset.set_constant_column(column, Value::Text(stamp));
}

/// Strip a leading `sep=<c>` line, returning the delimiter it names.
fn split_separator_hint(text: &str) -> (u8, &str) {
  let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
  if let Some(sep) = first.trim_end_matches('\r').strip_prefix("sep=")
    && let [byte] = sep.as_bytes()
  {
    return (*byte, rest);
  }
  (b',', text)
}

fn parse_csv(body: &str, delimiter: u8) -> Result<Dataset> {
  let mut reader = csv::ReaderBuilder::new()
    .delimiter(delimiter)
    .has_headers(true)
    .from_reader(body.as_bytes());

  let headers: Vec<String> = reader
    .headers()?
    .iter()
    .map(|h| h.trim().to_owned())
    .collect();
  if headers.iter().all(String::is_empty) {
    return Err(Error::Malformed("snapshot has no header row".into()));
  }

  let mut cells: Vec<csv::StringRecord> = Vec::new();
  for record in reader.records() {
    cells.push(record?);
  }

  let kinds: Vec<Kind> = (0..headers.len())
    .map(|i| Kind::infer(cells.iter().map(|r| &r[i])))
    .collect();

  let rows: Vec<Vec<Value>> = cells
    .iter()
    .map(|record| {
      record
        .iter()
        .zip(&kinds)
        .map(|(cell, kind)| kind.convert(cell))
        .collect()
    })
    .collect();

  Dataset::from_rows(headers, rows).map_err(|e| Error::Malformed(e.to_string()))
}

// ─── Type inference ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  Integer,
  Real,
  Text,
}

impl Kind {
  /// Narrowest kind that fits every non-empty cell.
  fn infer<'a>(cells: impl Iterator<Item = &'a str>) -> Self {
    let mut kind = Self::Integer;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
      if kind == Self::Integer && cell.parse::<i64>().is_ok() {
        continue;
      }
      if is_real(cell) {
        kind = Self::Real;
      } else {
        return Self::Text;
      }
    }
    kind
  }

  fn convert(self, cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
      return Value::Null;
    }
    match self {
      Self::Integer => trimmed.parse().map_or(Value::Null, Value::Integer),
      Self::Real => trimmed.parse().map_or(Value::Null, Value::Real),
      Self::Text => Value::text(cell),
    }
  }
}

/// Parses as `f64` and actually contains a digit (rejects `inf`, `NaN`).
fn is_real(cell: &str) -> bool {
  cell.parse::<f64>().is_ok() && cell.bytes().any(|b| b.is_ascii_digit())
}
