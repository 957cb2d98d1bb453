//! Dialect taxonomy and family classification.
//!
//! Dialects carry the numeric identifiers of the backing providers; every
//! SQL Server generation sits below 100 and forms the standard family, while
//! SAP HANA (100) is the only block dialect, requiring anonymous `DO BEGIN`
//! blocks for parameterized scripts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(i16)]
pub enum Dialect {
    SqlServer = 0,
    SqlServer2005 = 10,
    SqlServer2008 = 20,
    SqlServer2012 = 30,
    SqlServer2014 = 40,
    Hana = 100,
    MySql = 200,
    Oracle = 300,
    PostgreSql = 400,
}

/// Dialect families sharing parameter-marker and declaration syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    SqlServer,
    Hana,
    MySql,
    Oracle,
    PostgreSql,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::SqlServer
    }
}

impl Dialect {
    pub fn family(&self) -> Family {
        match self {
            Dialect::SqlServer
            | Dialect::SqlServer2005
            | Dialect::SqlServer2008
            | Dialect::SqlServer2012
            | Dialect::SqlServer2014 => Family::SqlServer,
            Dialect::Hana => Family::Hana,
            Dialect::MySql => Family::MySql,
            Dialect::Oracle => Family::Oracle,
            Dialect::PostgreSql => Family::PostgreSql,
        }
    }

    /// True for every SQL Server generation.
    pub fn is_sql_server_family(&self) -> bool {
        self.family() == Family::SqlServer
    }

    /// True when parameterized scripts must be wrapped in anonymous blocks.
    pub fn is_block_dialect(&self) -> bool {
        self.family() == Family::Hana
    }

    /// The parameter-marker prefix the dialect's named binding uses.
    pub fn parameter_marker(&self) -> Option<char> {
        match self.family() {
            Family::SqlServer => Some('@'),
            Family::Hana | Family::Oracle | Family::PostgreSql => Some(':'),
            Family::MySql => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::SqlServer => "SqlServer",
            Dialect::SqlServer2005 => "SqlServer2005",
            Dialect::SqlServer2008 => "SqlServer2008",
            Dialect::SqlServer2012 => "SqlServer2012",
            Dialect::SqlServer2014 => "SqlServer2014",
            Dialect::Hana => "Hana",
            Dialect::MySql => "MySql",
            Dialect::Oracle => "Oracle",
            Dialect::PostgreSql => "PostgreSql",
        };
        write!(f, "{name}")
    }
}
