//! Data-source descriptors and per-dialect connection strings.
//!
//! A `DataSource` is immutable after construction and its connection string
//! is a pure function of the other fields. HANA sources may carry a tenant;
//! a `TENANT@NAME` database name is split on construction.

use crate::dialect::{Dialect, Family};
use crate::error::{MuxError, MuxResult};

/// Characters that separate a tenant prefix from the database name.
const TENANT_SEPARATORS: &[char] = &['@', '|', ';', ':'];

/// Everything needed to reach one backend database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub dialect: Dialect,
    pub server: String,
    pub database: String,
    pub user: String,
    pub password: String,
    pub tenant: Option<String>,
}

impl DataSource {
    /// Create a source for `database` on `server`.
    ///
    /// A database name of the form `TENANT@NAME` (any of `@ | ; :` as the
    /// separator) is split into the tenant and the plain name.
    pub fn new(dialect: Dialect, server: impl Into<String>, database: impl Into<String>) -> Self {
        let database = database.into();
        let mut parts = database
            .split(TENANT_SEPARATORS)
            .filter(|p| !p.is_empty());
        let first = parts.next().map(str::to_string);
        let second = parts.next().map(str::to_string);
        let (tenant, database) = match (first, second) {
            (Some(t), Some(n)) => (Some(t), n),
            _ => (None, database),
        };
        Self {
            dialect,
            server: server.into(),
            database,
            user: String::new(),
            password: String::new(),
            tenant,
        }
    }

    pub fn with_credentials(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.user = user.into();
        self.password = password.into();
        self
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    fn has_credentials(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }

    /// Build the connection string for the source's dialect.
    ///
    /// Fails when no server is set, or for HANA without credentials.
    pub fn connection_string(&self) -> MuxResult<String> {
        if self.server.is_empty() {
            return Err(MuxError::Connection(
                "no server specified for data source".into(),
            ));
        }
        match self.dialect.family() {
            Family::SqlServer => Ok(self.sql_server_string()),
            Family::Hana => self.hana_string(),
            Family::MySql => Ok(self.mysql_string()),
            Family::Oracle => Ok(self.oracle_string()),
            Family::PostgreSql => Ok(self.postgres_string()),
        }
    }

    fn sql_server_string(&self) -> String {
        let mut cs = format!("Data Source={};", self.server);
        if !self.database.is_empty() {
            cs.push_str(&format!("Initial Catalog={};", self.database));
        }
        if self.has_credentials() {
            cs.push_str(&format!(
                "User ID={};Password={};Persist Security Info=False;Integrated Security=False;",
                self.user, self.password
            ));
        } else {
            cs.push_str("Persist Security Info=False;Integrated Security=True;");
        }
        cs
    }

    fn hana_string(&self) -> MuxResult<String> {
        if !self.has_credentials() {
            return Err(MuxError::Connection(
                "user and password are required for a Hana source".into(),
            ));
        }
        let mut cs = format!(
            "DRIVER={{{}}};SERVERNODE={};UID={};PWD={};",
            hana_driver(),
            self.server,
            self.user,
            self.password
        );
        if let Some(tenant) = &self.tenant {
            cs.push_str(&format!("DATABASE={tenant};databaseName={tenant};"));
        }
        if !self.database.is_empty() {
            cs.push_str(&format!(
                "CS=\"{0}\";currentSchema=\"{0}\";",
                self.database
            ));
        }
        Ok(cs)
    }

    fn mysql_string(&self) -> String {
        let mut cs = format!("Server={};Database={};", self.server, self.database);
        if self.has_credentials() {
            cs.push_str(&format!("Uid={};Pwd={};", self.user, self.password));
        }
        cs
    }

    fn oracle_string(&self) -> String {
        let mut cs = format!("Data Source={}/{};", self.server, self.database);
        if self.has_credentials() {
            cs.push_str(&format!("User Id={};Password={};", self.user, self.password));
        }
        cs
    }

    fn postgres_string(&self) -> String {
        let mut cs = format!("Host={};Database={};", self.server, self.database);
        if self.has_credentials() {
            cs.push_str(&format!(
                "Username={};Password={};",
                self.user, self.password
            ));
        }
        cs
    }
}

/// ODBC driver name for HANA, by process pointer width.
fn hana_driver() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "HDBODBC"
    } else {
        "HDBODBC32"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_server_with_credentials() {
        let source = DataSource::new(Dialect::SqlServer2014, "db01", "Shop")
            .with_credentials("sa", "secret");
        assert_eq!(
            source.connection_string().unwrap(),
            "Data Source=db01;Initial Catalog=Shop;User ID=sa;Password=secret;\
             Persist Security Info=False;Integrated Security=False;"
        );
    }

    #[test]
    fn test_sql_server_integrated_security() {
        let source = DataSource::new(Dialect::SqlServer, "db01", "Shop");
        assert_eq!(
            source.connection_string().unwrap(),
            "Data Source=db01;Initial Catalog=Shop;\
             Persist Security Info=False;Integrated Security=True;"
        );
    }

    #[test]
    fn test_tenant_split_from_database_name() {
        let source = DataSource::new(Dialect::Hana, "hana01:30015", "NDB@SHOP")
            .with_credentials("SYSTEM", "secret");
        assert_eq!(source.tenant.as_deref(), Some("NDB"));
        assert_eq!(source.database, "SHOP");
        let cs = source.connection_string().unwrap();
        assert!(cs.starts_with("DRIVER={HDBODBC"));
        assert!(cs.contains("SERVERNODE=hana01:30015;UID=SYSTEM;PWD=secret;"));
        assert!(cs.contains("DATABASE=NDB;databaseName=NDB;"));
        assert!(cs.ends_with("CS=\"SHOP\";currentSchema=\"SHOP\";"));
    }

    #[test]
    fn test_hana_requires_credentials() {
        let source = DataSource::new(Dialect::Hana, "hana01", "SHOP");
        let err = source.connection_string().unwrap_err();
        assert!(matches!(err, MuxError::Connection(_)));
    }

    #[test]
    fn test_server_is_required() {
        let source = DataSource::new(Dialect::SqlServer, "", "Shop");
        assert!(source.connection_string().is_err());
    }

    #[test]
    fn test_other_dialect_grammars() {
        let mysql = DataSource::new(Dialect::MySql, "my01", "shop").with_credentials("u", "p");
        assert_eq!(
            mysql.connection_string().unwrap(),
            "Server=my01;Database=shop;Uid=u;Pwd=p;"
        );
        let pg = DataSource::new(Dialect::PostgreSql, "pg01", "shop").with_credentials("u", "p");
        assert_eq!(
            pg.connection_string().unwrap(),
            "Host=pg01;Database=shop;Username=u;Password=p;"
        );
        let ora = DataSource::new(Dialect::Oracle, "ora01", "XE").with_credentials("u", "p");
        assert_eq!(
            ora.connection_string().unwrap(),
            "Data Source=ora01/XE;User Id=u;Password=p;"
        );
    }
}
