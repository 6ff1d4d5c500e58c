//! Database plumbing shared by folio modules.
//!
//! - One `PgPool` per process, created from [`DatabaseSettings`] and handed to
//!   modules explicitly; there is no global handle.
//! - Table provisioning from module-declared [`TableSchema`]s.
//! - [`Deadline`], threaded through every storage call a request makes.
//!
//! [`DatabaseSettings`]: folio_kernel::settings::DatabaseSettings
//! [`TableSchema`]: folio_kernel::TableSchema

pub mod deadline;
pub mod errors;
pub mod pool;
pub mod provision;

pub use deadline::{Deadline, DeadlineExceeded};
pub use errors::{is_connection_error, is_unique_violation};
pub use pool::{create_pool, ping};
pub use provision::provision;
