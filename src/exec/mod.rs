//! Safe query execution.

mod executor;

pub use executor::{ResultSet, SafeExecutor};
