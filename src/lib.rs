//! # sqlmux — One statement, every backend
//!
//! > **Write the command once. Run it on SQL Server, SAP HANA, MySQL,
//! > Oracle, or PostgreSQL.**
//!
//! sqlmux keeps one command text per dialect in a [`query::Query`]
//! registry, adapts T-SQL spellings to HANA automatically, and drives
//! executes, readers, transactions, and statement batches through a
//! single [`session::Session`] choreography.
//!
//! ## Quick Example
//!
//! ```rust,ignore
//! use sqlmux::prelude::*;
//! use sqlmux::queries;
//!
//! let source = DataSource::new(Dialect::Hana, "hana01:30015", "PROD@RETAIL")
//!     .with_credentials("SYSTEM", "secret");
//! let mut session = Session::new(driver, source)?;
//!
//! let next = queries::next_number();
//! queries::fill(&next, "Table", "ONFC");
//! queries::fill(&next, "Column", "DocEntry");
//! session.load_query(&next);
//! let number: i64 = session.execute_scalar()?;
//! ```
//!
//! ## Dialects
//!
//! | Dialect      | Family       | Notes                                |
//! |--------------|--------------|--------------------------------------|
//! | `SqlServer`  | SQL Server   | plus pinned 2005/2008/2012/2014      |
//! | `Hana`       | HANA         | block dialect, text auto-adapted     |
//! | `MySql`      | MySQL        |                                      |
//! | `Oracle`     | Oracle       |                                      |
//! | `PostgreSql` | PostgreSQL   |                                      |

pub mod batch;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod events;
pub mod params;
pub mod queries;
pub mod query;
pub mod render;
pub mod rewrite;
pub mod session;
pub mod source;
pub mod table;
pub mod value;

pub mod prelude {
    pub use crate::dialect::{Dialect, Family};
    pub use crate::driver::{Connection, Driver, Rows};
    pub use crate::error::{MuxError, MuxResult};
    pub use crate::events::DiagnosticHub;
    pub use crate::params::{Parameter, ParameterSet};
    pub use crate::query::{Query, QueryCommand};
    pub use crate::session::{FullTextCache, Session};
    pub use crate::source::DataSource;
    pub use crate::table::{DataSet, Table};
    pub use crate::value::{FromSqlValue, SqlType, SqlValue};
}
