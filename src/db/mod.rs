// Restaurants Service
// Copyright 2025 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction in terms of the operations needed by the server.
//!
//! The PostgreSQL backend is for production use and the SQLite backend is primarily intended to
//! support unit tests and small standalone deployments.

use crate::model::{Restaurant, RestaurantId};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod postgres;
pub mod sqlite;

/// Database errors.  Any unexpected errors that come from the database are classified as
/// `BackendError`, but errors we know about have more specific types.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum DbError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("Already exists")]
    AlreadyExists,

    /// Catch-all error type for unexpected database errors.
    #[error("Database error: {0}")]
    BackendError(String),

    /// Indicates a failure processing the data that already exists in the database.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),

    /// Indicates that a requested entry does not exist.
    #[error("Entity not found")]
    NotFound,

    /// Indicates that the database is not available (maybe because of too many active concurrent
    /// connections).
    #[error("Unavailable")]
    Unavailable,
}

/// Result type for this module.
pub type DbResult<T> = Result<T, DbError>;

/// A database executor that can talk to multiple database implementations.
///
/// Note that this can wrap an executor that talks directly to a pool or to an open transaction.
pub enum Executor {
    /// A PostgreSQL executor.
    Postgres(postgres::PostgresExecutor),

    /// A SQLite executor.
    Sqlite(sqlite::SqliteExecutor),
}

/// A wrapper for a database executor backed by an open transaction.
pub struct TxExecutor(Executor);

impl TxExecutor {
    /// Returns the executor wrapped by this transaction.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.0
    }

    /// Commits the transaction.
    pub async fn commit(self) -> DbResult<()> {
        match self.0 {
            Executor::Postgres(ex) => ex.commit().await,
            Executor::Sqlite(ex) => ex.commit().await,
        }
    }
}

/// Abstraction over the database connection.
#[async_trait]
pub trait Db {
    /// Obtains an executor for direct access to the pool.
    ///
    /// This would be better called `executor` but this method is used so frequently that it makes
    /// call sites too verbose.
    async fn ex(&self) -> DbResult<Executor>;

    /// Begins a transaction.
    ///
    /// It is the responsibility of the caller to call `commit` on the returned executor.  Otherwise
    /// the transaction is rolled back on drop.
    async fn begin(&self) -> DbResult<TxExecutor>;

    /// Closes the connection pool, waiting for all active connections to terminate.
    async fn close(&self);
}

/// Opens a connection to the database identified by `conn_str`.
///
/// `postgres://` and `postgresql://` URLs select the PostgreSQL backend; any other value is
/// treated as a SQLite connection string.
pub async fn connect(conn_str: &str) -> DbResult<Arc<dyn Db + Send + Sync>> {
    if conn_str.starts_with("postgres://") || conn_str.starts_with("postgresql://") {
        Ok(Arc::new(postgres::connect(conn_str)?))
    } else {
        Ok(Arc::new(sqlite::connect(conn_str).await?))
    }
}

/// Initializes the schema on whichever database `ex` points to.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::run_schema(ex, include_str!("postgres.sql")).await,
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

/// Encodes a JSON value for storage in a text column.
pub(crate) fn encode_json_column(value: &Value) -> DbResult<String> {
    serde_json::to_string(value)
        .map_err(|e| DbError::DataIntegrityError(format!("Cannot serialize JSON value: {}", e)))
}

/// Decodes the JSON value stored in the text column `column`.
pub(crate) fn parse_json_column(raw: &str, column: &str) -> DbResult<Value> {
    serde_json::from_str(raw)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid JSON in column {}: {}", column, e)))
}

/// Gets up to `limit` restaurants from the collection, ordered by name.
pub(crate) async fn get_restaurants(ex: &mut Executor, limit: i64) -> DbResult<Vec<Restaurant>> {
    match ex {
        Executor::Postgres(ex) => postgres::get_restaurants(ex, limit).await,
        Executor::Sqlite(ex) => sqlite::get_restaurants(ex, limit).await,
    }
}

/// Gets the current contents of the restaurant `id`.
pub(crate) async fn get_restaurant(ex: &mut Executor, id: &RestaurantId) -> DbResult<Restaurant> {
    match ex {
        Executor::Postgres(ex) => postgres::get_restaurant(ex, id).await,
        Executor::Sqlite(ex) => sqlite::get_restaurant(ex, id).await,
    }
}

/// Inserts the new `restaurant` into the collection.
pub(crate) async fn create_restaurant(ex: &mut Executor, restaurant: &Restaurant) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::create_restaurant(ex, restaurant).await,
        Executor::Sqlite(ex) => sqlite::create_restaurant(ex, restaurant).await,
    }
}

/// Overwrites the stored contents of `restaurant`, matched by its identifier.
pub(crate) async fn put_restaurant(ex: &mut Executor, restaurant: &Restaurant) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::put_restaurant(ex, restaurant).await,
        Executor::Sqlite(ex) => sqlite::put_restaurant(ex, restaurant).await,
    }
}

/// Deletes the restaurant `id`.
pub(crate) async fn delete_restaurant(ex: &mut Executor, id: &RestaurantId) -> DbResult<()> {
    match ex {
        Executor::Postgres(ex) => postgres::delete_restaurant(ex, id).await,
        Executor::Sqlite(ex) => sqlite::delete_restaurant(ex, id).await,
    }
}
