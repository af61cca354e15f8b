#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Postgres storage for the address suggestion engine.
//!
//! Uses `switchy_database` raw parameterized queries against the address
//! tables (`"Street"`, `"House"`, their type tables) and the resource
//! tables (`"House_files"`, `"Node"`, `"Hardware"`). The tables are owned
//! by the inventory CRUD services; this crate only reads them.

pub mod db;
pub mod queries;
pub mod store;

use netinv_address::StoreError;

pub use store::PgAddressStore;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database query error.
    #[error("Database error: {0}")]
    Database(#[from] switchy_database::DatabaseError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Database(e) => Self::Query {
                message: e.to_string(),
            },
            DbError::Conversion { message } => Self::Conversion { message },
        }
    }
}
