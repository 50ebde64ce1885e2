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

//! REST service that manages a collection of restaurants.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use crate::db::{Db, DbError};
use crate::driver::Driver;
use crate::rest::app;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub mod db;
mod driver;
pub mod env;
pub(crate) mod model;
mod rest;

/// Errors that can arise while starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failure to reach the restaurants store.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Failure to set up or serve on the network socket.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Failure in the server's own task management.
    #[error("{0}")]
    Internal(String),
}

/// Handle to a running server, used to query its address and to shut it down.
///
/// Dropping the handle aborts the serving task without waiting for in-flight requests nor
/// disconnecting the store.  Call `stop` for an orderly shutdown.
pub struct Server {
    /// Address on which the serving socket accepts requests.
    local_addr: SocketAddr,

    /// The store that backs the running server.
    db: Arc<dyn Db + Send + Sync>,

    /// Channel used to ask the serving task to stop accepting requests.
    shutdown_tx: oneshot::Sender<()>,

    /// The task running the accept loop.
    task: JoinHandle<io::Result<()>>,
}

impl Server {
    /// Returns the address on which the server accepts requests.
    ///
    /// Useful when the server was started on port zero to discover the assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the server in an orderly manner.
    ///
    /// The store is disconnected first so that no request can observe a half-closed server,
    /// and then the socket is shut down.
    pub async fn stop(self) -> Result<(), ServerError> {
        let Server { local_addr: _, db, shutdown_tx, task } = self;

        db.close().await;

        // The receiver only goes away if the serving task already exited, which is exactly
        // the state we are driving it to.
        let _ = shutdown_tx.send(());

        join_serve_task(task).await
    }

    /// Waits for the server to exit on its own.
    ///
    /// The shutdown channel must stay alive for as long as we wait or the server would stop
    /// right away.
    pub async fn wait(self) -> Result<(), ServerError> {
        let Server { local_addr: _, db: _db, shutdown_tx: _shutdown_tx, task } = self;

        join_serve_task(task).await
    }
}

/// Waits for the serving task to finish and flattens its result.
async fn join_serve_task(task: JoinHandle<io::Result<()>>) -> Result<(), ServerError> {
    match task.await {
        Ok(result) => result.map_err(ServerError::from),
        Err(e) => Err(ServerError::Internal(format!("Serving task failed: {}", e))),
    }
}

/// Binds the serving socket on `bind_addr`.
async fn bind(bind_addr: SocketAddr) -> io::Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind(bind_addr).await?;
    let local_addr = listener.local_addr()?;
    Ok((listener, local_addr))
}

/// Starts serving the application on `bind_addr` against the store in `db`.
///
/// The returned handle owns all resources of the running server and must be used to stop it.
/// If start up fails, the store is disconnected before returning.
pub async fn start(
    bind_addr: impl Into<SocketAddr>,
    db: Arc<dyn Db + Send + Sync>,
) -> Result<Server, ServerError> {
    // Probe the store before accepting any request so that a misconfigured database shows up
    // at start up time and not on the first query.
    drop(db.ex().await?);

    let (listener, local_addr) = match bind(bind_addr.into()).await {
        Ok((listener, local_addr)) => (listener, local_addr),
        Err(e) => {
            db.close().await;
            return Err(ServerError::Io(e));
        }
    };

    let app = app(Driver::new(db.clone()));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await
    });

    log::info!("Serving requests on {}", local_addr);

    Ok(Server { local_addr, db, shutdown_tx, task })
}
