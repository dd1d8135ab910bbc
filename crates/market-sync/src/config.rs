//! Job configuration.
//!
//! Built once in `main` and passed by reference into the pipeline. Sources, in
//! increasing precedence: built-in defaults, an optional TOML file,
//! `MARKET_SYNC_*` environment variables, then an explicit database URL
//! (`--database-url` / `DATABASE_URL`).

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use market_core::{WriteMode, WriteOptions};
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_SOURCE_URL: &str =
  "https://www.gpro.net/gb/GetMarketFile.asp?market=drivers&type=csv";

/// Runtime configuration for one sync run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobConfig {
  /// Where the snapshot table lives. Required.
  pub database_url:          Option<String>,
  pub source_url:            String,
  pub table:                 String,
  /// Column that identifies an entity across snapshots.
  pub identifier_column:     String,
  pub write_mode:            WriteMode,
  /// Declare the identifier column `PRIMARY KEY` when the table is created.
  pub primary_key:           bool,
  /// Column stamped with the collection time on every downloaded row.
  /// Empty disables stamping.
  pub collected_at_column:   String,
  pub download_timeout_secs: u64,
}

impl Default for JobConfig {
  fn default() -> Self {
    Self {
      database_url:          None,
      source_url:            DEFAULT_SOURCE_URL.to_owned(),
      table:                 "mercado_pilotos".to_owned(),
      identifier_column:     "ID".to_owned(),
      write_mode:            WriteMode::Replace,
      primary_key:           true,
      collected_at_column:   "data_coleta".to_owned(),
      download_timeout_secs: 60,
    }
  }
}

impl JobConfig {
  /// Load from `path` (optional), the environment and `database_url`, then
  /// validate.
  pub fn load(path: &Path, database_url: Option<String>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MARKET_SYNC"))
      .set_override_option("database_url", database_url)?
      .build()?;

    let cfg: JobConfig = settings.try_deserialize()?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<()> {
    if self.database_url.as_deref().is_none_or(|u| u.trim().is_empty()) {
      return Err(Error::Configuration(
        "no database url; set DATABASE_URL or database_url".into(),
      ));
    }
    if self.table.trim().is_empty() {
      return Err(Error::Configuration("table name is empty".into()));
    }
    if self.identifier_column.is_empty() {
      return Err(Error::Configuration("identifier column is empty".into()));
    }
    if self.download_timeout_secs == 0 {
      return Err(Error::Configuration(
        "download_timeout_secs must be positive".into(),
      ));
    }
    Ok(())
  }

  /// The normalized database location.
  pub fn database_location(&self) -> Result<DatabaseLocation> {
    let url = self.database_url.as_deref().ok_or_else(|| {
      Error::Configuration(
        "no database url; set DATABASE_URL or database_url".into(),
      )
    })?;
    DatabaseLocation::parse(url)
  }

  pub fn download_timeout(&self) -> Duration {
    Duration::from_secs(self.download_timeout_secs)
  }

  pub fn collected_at_column(&self) -> Option<&str> {
    Some(self.collected_at_column.as_str()).filter(|c| !c.is_empty())
  }

  pub fn write_options(&self) -> WriteOptions {
    WriteOptions {
      mode:        self.write_mode,
      primary_key: self.primary_key.then(|| self.identifier_column.clone()),
    }
  }
}

// ─── Database location ───────────────────────────────────────────────────────

/// A SQLite database, as named by a connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
  Memory,
  File(PathBuf),
}

impl DatabaseLocation {
  /// Normalize a connection string.
  ///
  /// Accepts `sqlite://path`, `sqlite:path`, `file:path`, a bare path and
  /// `:memory:`. Driver options after `?` or `#` are dropped and a leading
  /// `~/` is expanded. Any other `scheme://` is rejected.
  pub fn parse(url: &str) -> Result<Self> {
    let trimmed = url.trim();
    let base = trimmed.split(['?', '#']).next().unwrap_or_default();

    let path = if let Some(rest) = base.strip_prefix("sqlite://") {
      rest
    } else if let Some(rest) = base.strip_prefix("sqlite:") {
      rest
    } else if let Some(rest) = base.strip_prefix("file:") {
      rest
    } else if let Some((scheme, _)) = base.split_once("://") {
      return Err(Error::Configuration(format!(
        "unsupported database scheme {scheme:?}; expected a sqlite url or path"
      )));
    } else {
      base
    };

    match path {
      "" => Err(Error::Configuration(format!(
        "database url {trimmed:?} does not name a database"
      ))),
      ":memory:" => Ok(Self::Memory),
      p => Ok(Self::File(expand_tilde(Path::new(p)))),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn parses_sqlite_urls() {
    assert_eq!(
      DatabaseLocation::parse("sqlite:///var/lib/market.db").unwrap(),
      DatabaseLocation::File("/var/lib/market.db".into())
    );
    assert_eq!(
      DatabaseLocation::parse("sqlite:market.db").unwrap(),
      DatabaseLocation::File("market.db".into())
    );
    assert_eq!(
      DatabaseLocation::parse("market.db").unwrap(),
      DatabaseLocation::File("market.db".into())
    );
    assert_eq!(
      DatabaseLocation::parse("sqlite::memory:").unwrap(),
      DatabaseLocation::Memory
    );
    assert_eq!(
      DatabaseLocation::parse(":memory:").unwrap(),
      DatabaseLocation::Memory
    );
  }

  #[test]
  fn strips_driver_options() {
    assert_eq!(
      DatabaseLocation::parse("sqlite:///tmp/m.db?mode=rwc&ssl-mode=REQUIRED")
        .unwrap(),
      DatabaseLocation::File("/tmp/m.db".into())
    );
    assert_eq!(
      DatabaseLocation::parse("file:m.db#frag").unwrap(),
      DatabaseLocation::File("m.db".into())
    );
  }

  #[test]
  fn rejects_other_schemes_and_empty_urls() {
    let err = DatabaseLocation::parse("mysql://u:p@host:3306/db").unwrap_err();
    assert!(matches!(err, Error::Configuration(msg) if msg.contains("mysql")));
    assert!(DatabaseLocation::parse("   ").is_err());
    assert!(DatabaseLocation::parse("sqlite://?mode=rwc").is_err());
  }

  #[test]
  fn missing_database_url_is_a_configuration_error() {
    let err = JobConfig::default().validate().unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }

  #[test]
  fn load_without_file_uses_defaults() {
    let cfg = JobConfig::load(
      Path::new("/nonexistent/market-sync.toml"),
      Some("sqlite::memory:".into()),
    )
    .unwrap();

    assert_eq!(cfg.source_url, DEFAULT_SOURCE_URL);
    assert_eq!(cfg.identifier_column, "ID");
    assert_eq!(cfg.write_mode, WriteMode::Replace);
    assert_eq!(cfg.database_location().unwrap(), DatabaseLocation::Memory);
  }

  #[test]
  fn load_reads_toml_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
      file,
      r#"
database_url = "sqlite:///data/market.db"
table = "drivers"
identifier_column = "id_piloto"
write_mode = "delete_append"
primary_key = false
collected_at_column = ""
download_timeout_secs = 5
"#
    )
    .unwrap();

    let cfg = JobConfig::load(file.path(), None).unwrap();
    assert_eq!(cfg.table, "drivers");
    assert_eq!(cfg.identifier_column, "id_piloto");
    assert_eq!(cfg.write_mode, WriteMode::DeleteAppend);
    assert_eq!(cfg.collected_at_column(), None);
    assert_eq!(cfg.download_timeout(), Duration::from_secs(5));
    assert!(cfg.write_options().primary_key.is_none());
  }

  #[test]
  fn explicit_database_url_overrides_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "database_url = \"sqlite:///from/file.db\"").unwrap();

    let flag = Some("sqlite:///from/flag.db".into());
    let cfg = JobConfig::load(file.path(), flag).unwrap();
    assert_eq!(
      cfg.database_location().unwrap(),
      DatabaseLocation::File("/from/flag.db".into())
    );
  }

  #[test]
  fn write_options_follow_primary_key_flag() {
    let cfg = JobConfig {
      identifier_column: "id_piloto".into(),
      ..Default::default()
    };
    assert_eq!(cfg.write_options().primary_key.as_deref(), Some("id_piloto"));
  }
}
