pub mod postgrest;

pub use postgrest::{DbClient, DbError};
