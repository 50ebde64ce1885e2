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

//! Implementation of the database abstraction using SQLite.

use crate::db::{encode_json_column, parse_json_column, Db, DbError, DbResult, Executor, TxExecutor};
use crate::model::{Restaurant, RestaurantId};
use async_trait::async_trait;
use futures::TryStreamExt;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Transaction};

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Creates a new connection against the database identified by `conn_str`.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    // A single long-lived connection keeps in-memory databases alive across calls: every pooled
    // connection to `:memory:` would otherwise see its own, empty database.
    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(conn_str)
        .await
        .map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// A generic database executor implementation for SQLite.
#[derive(Debug)]
pub enum SqliteExecutor {
    /// An executor backed by a pool.  Operations issued via this executor aren't guaranteed to
    /// happen on the same connection.
    PoolExec(PoolConnection<Sqlite>),

    /// An executor backed by a transaction.
    TxExec(Transaction<'static, Sqlite>),
}

impl SqliteExecutor {
    /// Commits the transaction if this executor is backed by one.
    ///
    /// Calling this on a non-transaction-based executor results in a panic.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            SqliteExecutor::PoolExec(_) => unreachable!("Do not call commit on direct executors"),
            SqliteExecutor::TxExec(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }

    /// Returns the raw connection backing this executor.
    fn conn(&mut self) -> &mut SqliteConnection {
        match self {
            SqliteExecutor::PoolExec(conn) => &mut **conn,
            SqliteExecutor::TxExec(tx) => &mut **tx,
        }
    }
}

/// A database instance backed by a SQLite database.
pub struct SqliteDb {
    /// Shared SQLite connection pool.  This is a cloneable type that all concurrent
    /// transactions can use concurrently.
    pool: SqlitePool,
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Executor::Sqlite(SqliteExecutor::PoolExec(conn)))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Sqlite(SqliteExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Helper function to initialize the database with a schema.
pub async fn run_schema(ex: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    for query_str in schema.split(';') {
        if query_str.trim().is_empty() {
            continue;
        }
        sqlx::query(query_str).execute(ex.conn()).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Builds a `Restaurant` from a row containing all of its columns.
fn restaurant_from_row(row: &SqliteRow) -> DbResult<Restaurant> {
    let id: String = row.try_get("id").map_err(map_sqlx_error)?;
    let name: String = row.try_get("name").map_err(map_sqlx_error)?;
    let borough: String = row.try_get("borough").map_err(map_sqlx_error)?;
    let cuisine: String = row.try_get("cuisine").map_err(map_sqlx_error)?;
    let address: String = row.try_get("address").map_err(map_sqlx_error)?;
    let grades: String = row.try_get("grades").map_err(map_sqlx_error)?;
    Ok(Restaurant::new(
        RestaurantId::new(id),
        name,
        borough,
        cuisine,
        parse_json_column(&address, "address")?,
        parse_json_column(&grades, "grades")?,
    ))
}

/// Gets up to `limit` restaurants, ordered by name.
pub(super) async fn get_restaurants(
    ex: &mut SqliteExecutor,
    limit: i64,
) -> DbResult<Vec<Restaurant>> {
    let query_str = "
        SELECT id, name, borough, cuisine, address, grades FROM restaurants
        ORDER BY name LIMIT ?
    ";
    let mut rows = sqlx::query(query_str).bind(limit).fetch(ex.conn());

    let mut restaurants = vec![];
    while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
        restaurants.push(restaurant_from_row(&row)?);
    }
    Ok(restaurants)
}

/// Gets the current contents of the restaurant `id`.
pub(super) async fn get_restaurant(
    ex: &mut SqliteExecutor,
    id: &RestaurantId,
) -> DbResult<Restaurant> {
    let query_str = "SELECT id, name, borough, cuisine, address, grades FROM restaurants WHERE id = ?";
    let row = sqlx::query(query_str)
        .bind(id.as_ref())
        .fetch_one(ex.conn())
        .await
        .map_err(map_sqlx_error)?;
    restaurant_from_row(&row)
}

/// Inserts the new `restaurant` into the collection.
pub(super) async fn create_restaurant(
    ex: &mut SqliteExecutor,
    restaurant: &Restaurant,
) -> DbResult<()> {
    let query_str = "
        INSERT INTO restaurants (id, name, borough, cuisine, address, grades)
        VALUES (?, ?, ?, ?, ?, ?)
    ";
    let done = sqlx::query(query_str)
        .bind(restaurant.id().as_ref())
        .bind(restaurant.name())
        .bind(restaurant.borough())
        .bind(restaurant.cuisine())
        .bind(encode_json_column(restaurant.address())?)
        .bind(encode_json_column(restaurant.grades())?)
        .execute(ex.conn())
        .await
        .map_err(map_sqlx_error)?;
    if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Overwrites the stored contents of `restaurant`, matched by its identifier.
pub(super) async fn put_restaurant(
    ex: &mut SqliteExecutor,
    restaurant: &Restaurant,
) -> DbResult<()> {
    let query_str = "
        UPDATE restaurants SET name = ?, borough = ?, cuisine = ?, address = ?, grades = ?
        WHERE id = ?
    ";
    let done = sqlx::query(query_str)
        .bind(restaurant.name())
        .bind(restaurant.borough())
        .bind(restaurant.cuisine())
        .bind(encode_json_column(restaurant.address())?)
        .bind(encode_json_column(restaurant.grades())?)
        .bind(restaurant.id().as_ref())
        .execute(ex.conn())
        .await
        .map_err(map_sqlx_error)?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound);
    } else if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Update affected more than one row".to_owned()));
    }
    Ok(())
}

/// Deletes the restaurant `id`.
pub(super) async fn delete_restaurant(
    ex: &mut SqliteExecutor,
    id: &RestaurantId,
) -> DbResult<()> {
    let query_str = "DELETE FROM restaurants WHERE id = ?";
    let done = sqlx::query(query_str)
        .bind(id.as_ref())
        .execute(ex.conn())
        .await
        .map_err(map_sqlx_error)?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound);
    } else if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Deletion affected more than one row".to_owned()));
    }
    Ok(())
}
