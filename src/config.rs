//! Named data sources from TOML configuration.
//!
//! Layout: one `[sources.<name>]` table per source. Dialect names are
//! kebab-case (`sql-server`, `hana`, `my-sql`). Credentials may be
//! omitted; SQL Server then falls back to integrated security.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::{MuxError, MuxResult};
use crate::source::DataSource;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    sources: HashMap<String, SourceEntry>,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    dialect: Dialect,
    server: String,
    database: String,
    #[serde(default)]
    user: String,
    #[serde(default)]
    password: String,
    tenant: Option<String>,
}

impl SourceEntry {
    fn into_source(self) -> DataSource {
        let mut source = DataSource::new(self.dialect, self.server, self.database)
            .with_credentials(self.user, self.password);
        if let Some(tenant) = self.tenant {
            source = source.with_tenant(tenant);
        }
        source
    }
}

/// Parse named sources from TOML text.
pub fn parse_sources(text: &str) -> MuxResult<HashMap<String, DataSource>> {
    let file: ConfigFile = toml::from_str(text).map_err(|err| MuxError::Config(err.to_string()))?;
    Ok(file
        .sources
        .into_iter()
        .map(|(name, entry)| (name, entry.into_source()))
        .collect())
}

/// Load named sources from the TOML file at `path`.
pub fn load_sources(path: impl AsRef<Path>) -> MuxResult<HashMap<String, DataSource>> {
    let text = std::fs::read_to_string(path)?;
    parse_sources(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_named_sources() {
        let sources = parse_sources(
            r#"
            [sources.main]
            dialect = "hana"
            server = "hana01:30015"
            database = "PROD@RETAIL"
            user = "SYSTEM"
            password = "secret"

            [sources.audit]
            dialect = "sql-server"
            server = "sql01"
            database = "Audit"
            "#,
        )
        .unwrap();

        let main = &sources["main"];
        assert_eq!(main.dialect, Dialect::Hana);
        assert_eq!(main.server, "hana01:30015");
        assert_eq!(main.tenant.as_deref(), Some("PROD"));
        assert_eq!(main.database, "RETAIL");

        let audit = &sources["audit"];
        assert_eq!(audit.dialect, Dialect::SqlServer);
        assert_eq!(audit.user, "");
        assert_eq!(audit.tenant, None);
    }

    #[test]
    fn test_explicit_tenant_overrides_database_prefix() {
        let sources = parse_sources(
            r#"
            [sources.main]
            dialect = "hana"
            server = "hana01:30015"
            database = "RETAIL"
            user = "SYSTEM"
            password = "secret"
            tenant = "QA"
            "#,
        )
        .unwrap();
        assert_eq!(sources["main"].tenant.as_deref(), Some("QA"));
        assert_eq!(sources["main"].database, "RETAIL");
    }

    #[test]
    fn test_unknown_dialect_is_a_config_error() {
        let err = parse_sources(
            r#"
            [sources.bad]
            dialect = "dbase"
            server = "x"
            database = "y"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, MuxError::Config(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_sources("/nonexistent/sqlmux.toml").unwrap_err();
        assert!(matches!(err, MuxError::Io(_)));
    }
}
