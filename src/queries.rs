//! Stock queries shipped with the crate.
//!
//! Each constructor returns a fresh [`Query`] registry so template
//! substitutions stay local to the caller. Templates carry `$[Name]`
//! markers; after HANA normalization the same marker reads `$"Name"`,
//! which is why [`fill`] substitutes both spellings.

use crate::dialect::Dialect;
use crate::query::{Query, QueryCommand};

/// Next value of a numeric column: `max + 1`, starting at 1 on an empty
/// table. Fill `$[Column]` and `$[Table]` before loading.
pub fn next_number() -> Query {
    let query = Query::new(
        Dialect::SqlServer,
        "select isnull(max($[Column]), 0) + 1 from $[Table]",
    );
    query.set_text(
        Dialect::Hana,
        "select ifnull(max($[Column]), 0) + 1 from $[Table]",
    );
    query
}

/// Like [`next_number`], restricted to rows where `$[Filter]` equals the
/// bound `@Value` parameter. The HANA entry is authored with the `:Value`
/// marker directly; translation never touches `@` markers that sit inside
/// a longer word, so relying on it here would leave the parameter unbound.
pub fn next_number_for() -> Query {
    let query = Query::new(
        Dialect::SqlServer,
        "select isnull(max($[Column]), 0) + 1 from $[Table] where $[Filter] = @Value",
    );
    query.set_text(
        Dialect::Hana,
        "select ifnull(max($[Column]), 0) + 1 from $[Table] where $[Filter] = :Value",
    );
    query
}

/// Server-level full-text probe, SQL Server only: yields 1 when the
/// service is installed and the current catalog has it enabled.
pub(crate) fn full_text_installed() -> Query {
    Query::new(
        Dialect::SqlServer,
        "select case when fulltextserviceproperty('IsFullTextInstalled') = 1 \
         and DATABASEPROPERTY(DB_NAME(), 'IsFullTextEnabled') = 1 then 1 else 0 end",
    )
}

/// Catalogs visible to the connected login, aliased `Name`. SQL Server
/// skips the four system databases; HANA lists grantable schemas.
pub fn list_databases() -> Query {
    let query = Query::new(
        Dialect::SqlServer,
        "SELECT NAME AS Name FROM SYS.DATABASES WHERE DATABASE_ID > 4 ORDER BY NAME",
    );
    query.set_text(
        Dialect::Hana,
        "SELECT SCHEMA_NAME AS Name FROM [SYS].[SCHEMAS] \
         WHERE [HAS_PRIVILEGES] = 'TRUE' ORDER BY SCHEMA_NAME",
    );
    query
}

/// Name of the active HANA tenant database. Registered for HANA only;
/// under any other dialect the lookup yields an empty text and execution
/// rejects it as a missing command.
pub fn active_block_database() -> Query {
    Query::from_commands(
        Dialect::SqlServer,
        [QueryCommand::new(
            Dialect::Hana,
            "SELECT TOP 1 [DATABASE_NAME] FROM [SYS].[M_DATABASES] WHERE [ACTIVE_STATUS] = 'YES'",
        )],
    )
}

/// Substitute the template marker `name` across every registered entry,
/// covering both the bracketed and the quoted spelling.
pub fn fill<'a>(query: &'a Query, name: &str, value: &str) -> &'a Query {
    query
        .replace_text_all(&format!("$[{name}]"), value)
        .replace_text_all(&format!("$\"{name}\""), value)
}
