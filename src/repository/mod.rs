//! Persistence layer.
//!
//! Diesel over SQLite through diesel-async's `SyncConnectionWrapper`. Every
//! query is scoped by the owning user id; rows owned by someone else read as
//! missing.

mod clients;
mod context;
mod contracts;
mod models;
mod pool;
mod testimonials;
mod util;
mod vault;

pub use clients::ClientRepository;
pub use context::DbContext;
pub use contracts::ContractRepository;
pub use pool::{DbError, SqliteConn, SqlitePool};
pub use testimonials::TestimonialRepository;
pub use util::{parse_datetime, parse_datetime_opt, to_diesel_error};
pub use vault::VaultRepository;
