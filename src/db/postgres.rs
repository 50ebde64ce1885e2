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

//! Implementation of the database abstraction using PostgreSQL.

use crate::db::{encode_json_column, parse_json_column, Db, DbError, DbResult, Executor, TxExecutor};
use crate::model::{Restaurant, RestaurantId};
use async_trait::async_trait;
use futures::TryStreamExt;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnection, PgDatabaseError, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::{Row, Transaction};
use std::time::Duration;

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub(crate) fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::Database(e) => match e.downcast_ref::<PgDatabaseError>().code() {
            "23505" /* unique_violation */ => DbError::AlreadyExists,
            "53300" /* too_many_connections */ => DbError::Unavailable,
            number => DbError::BackendError(format!("pgsql error {}: {}", number, e)),
        },
        sqlx::Error::PoolTimedOut => DbError::Unavailable,
        sqlx::Error::RowNotFound => DbError::NotFound,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Creates a new connection pool against the database identified by `url`.
///
/// Note that this does *not* establish any connection: those only happen on first use, which is
/// why callers interested in diagnosing a bad address early should issue a probing query.
pub fn connect(url: &str) -> DbResult<PostgresDb> {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_secs(2))
        .connect_lazy(url)
        .map_err(map_sqlx_error)?;
    Ok(PostgresDb { pool })
}

/// A generic database executor implementation for PostgreSQL.
#[derive(Debug)]
pub enum PostgresExecutor {
    /// An executor backed by a pool.  Operations issued via this executor aren't guaranteed to
    /// happen on the same connection.
    PoolExec(PoolConnection<Postgres>),

    /// An executor backed by a transaction.
    TxExec(Transaction<'static, Postgres>),
}

impl PostgresExecutor {
    /// Commits the transaction if this executor is backed by one.
    ///
    /// Calling this on a non-transaction-based executor results in a panic.
    pub(super) async fn commit(self) -> DbResult<()> {
        match self {
            PostgresExecutor::PoolExec(_) => unreachable!("Do not call commit on direct executors"),
            PostgresExecutor::TxExec(tx) => tx.commit().await.map_err(map_sqlx_error),
        }
    }

    /// Returns the raw connection backing this executor.
    fn conn(&mut self) -> &mut PgConnection {
        match self {
            PostgresExecutor::PoolExec(conn) => &mut **conn,
            PostgresExecutor::TxExec(tx) => &mut **tx,
        }
    }
}

/// A database instance backed by a PostgreSQL database.
pub struct PostgresDb {
    /// Shared PostgreSQL connection pool.  This is a cloneable type that all concurrent
    /// transactions can use concurrently.
    pool: PgPool,
}

impl Drop for PostgresDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[async_trait]
impl Db for PostgresDb {
    async fn ex(&self) -> DbResult<Executor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(Executor::Postgres(PostgresExecutor::PoolExec(conn)))
    }

    async fn begin(&self) -> DbResult<TxExecutor> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(TxExecutor(Executor::Postgres(PostgresExecutor::TxExec(tx))))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Helper function to initialize the database with a schema.
pub async fn run_schema(ex: &mut PostgresExecutor, schema: &str) -> DbResult<()> {
    for query_str in schema.split(';') {
        if query_str.trim().is_empty() {
            continue;
        }
        sqlx::query(query_str).execute(ex.conn()).await.map_err(map_sqlx_error)?;
    }
    Ok(())
}

/// Builds a `Restaurant` from a row containing all of its columns.
fn restaurant_from_row(row: &PgRow) -> DbResult<Restaurant> {
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
    ex: &mut PostgresExecutor,
    limit: i64,
) -> DbResult<Vec<Restaurant>> {
    let query_str = "
        SELECT id, name, borough, cuisine, address, grades FROM restaurants
        ORDER BY name LIMIT $1
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
    ex: &mut PostgresExecutor,
    id: &RestaurantId,
) -> DbResult<Restaurant> {
    let query_str =
        "SELECT id, name, borough, cuisine, address, grades FROM restaurants WHERE id = $1";
    let row = sqlx::query(query_str)
        .bind(id.as_ref())
        .fetch_one(ex.conn())
        .await
        .map_err(map_sqlx_error)?;
    restaurant_from_row(&row)
}

/// Inserts the new `restaurant` into the collection.
pub(super) async fn create_restaurant(
    ex: &mut PostgresExecutor,
    restaurant: &Restaurant,
) -> DbResult<()> {
    let query_str = "
        INSERT INTO restaurants (id, name, borough, cuisine, address, grades)
        VALUES ($1, $2, $3, $4, $5, $6)
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
    ex: &mut PostgresExecutor,
    restaurant: &Restaurant,
) -> DbResult<()> {
    let query_str = "
        UPDATE restaurants SET name = $1, borough = $2, cuisine = $3, address = $4, grades = $5
        WHERE id = $6
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
    ex: &mut PostgresExecutor,
    id: &RestaurantId,
) -> DbResult<()> {
    let query_str = "DELETE FROM restaurants WHERE id = $1";
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

/// Test utilities for the PostgreSQL connection.
#[cfg(test)]
pub(crate) mod testutils {
    use super::*;

    /// Connects to the database given in `TEST_DATABASE_URL` and initializes the schema within
    /// the session-temporary `pg_temp` namespace so that tests leave nothing behind.
    ///
    /// Note that for this to work, the connection pool must maintain a single connection open at
    /// all times, but not more.
    pub(crate) async fn setup() -> PostgresDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();

        let url = std::env::var("TEST_DATABASE_URL").unwrap();
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        let db = PostgresDb { pool };

        match db.ex().await.unwrap() {
            Executor::Postgres(mut ex) => {
                sqlx::query("SET search_path TO pg_temp").execute(ex.conn()).await.unwrap();
            }
            Executor::Sqlite(_) => unreachable!(),
        }

        let mut ex = db.ex().await.unwrap();
        crate::db::init_schema(&mut ex).await.unwrap();
        db
    }
}
