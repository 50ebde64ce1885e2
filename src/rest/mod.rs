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

//! Entry point to the REST server.
//!
//! Every API is put in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This may
//! seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! More specifically, the `tests` module within an API defines a `route` method that returns
//! the HTTP method and the API path under test.  All integration tests within the module then
//! rely on `route` to obtain this information, ensuring that they all test the desired API.

use crate::driver::{Driver, DriverError};
use crate::model::RestaurantId;
use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::body::HttpBody;
use axum::extract::{FromRequest, Request};
use axum::http;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::{Map, Value};

mod restaurant_delete;
mod restaurant_get;
mod restaurant_put;
mod restaurants_get;
mod restaurants_post;
#[cfg(test)]
pub(crate) mod testutils;

/// Fields that must be present in a creation request, in validation order.
const REQUIRED_CREATE_FIELDS: &[&str] = &["name", "borough", "cuisine"];

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested route does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that a request that should have empty content did not.
    #[error("Content should be empty")]
    PayloadNotEmpty,
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        // Store failures, not-found included, are deliberately indistinguishable to clients.
        match e {
            DriverError::AlreadyExists(_) => RestError::InternalError(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::NotFound(_) => RestError::InternalError(e.to_string()),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        match self {
            RestError::InternalError(msg) => {
                log::error!("Internal error in request handling: {}", msg);
                let response = ErrorResponse { message: "Internal server error".to_owned() };
                (http::StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
            }

            RestError::InvalidRequest(msg) => {
                (http::StatusCode::BAD_REQUEST, msg).into_response()
            }

            RestError::NotFound(msg) => {
                let response = ErrorResponse { message: msg };
                (http::StatusCode::NOT_FOUND, Json(response)).into_response()
            }

            RestError::PayloadNotEmpty => {
                let response = ErrorResponse { message: self.to_string() };
                (http::StatusCode::PAYLOAD_TOO_LARGE, Json(response)).into_response()
            }
        }
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Representation of the details of an error response.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize))]
pub(crate) struct ErrorResponse {
    /// Textual representation of the error message.
    pub(crate) message: String,
}

/// A request body extractor that forbids any content.
///
/// Any API that doesn't expect a body should use this to ensure we don't get garbage data that
/// we don't care about.  This future-proofs the service.
pub(crate) struct EmptyBody {}

#[async_trait]
impl<S> FromRequest<S> for EmptyBody
where
    S: Send + Sync,
{
    type Rejection = RestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if req.into_body().is_end_stream() {
            Ok(EmptyBody {})
        } else {
            Err(RestError::PayloadNotEmpty)
        }
    }
}

/// Ensures that `body` contains all of `fields`, reporting the first one that is missing.
fn check_required_fields(body: &Map<String, Value>, fields: &[&str]) -> RestResult<()> {
    for field in fields {
        if !body.contains_key(*field) {
            return Err(RestError::InvalidRequest(format!("Missing required field: {}", field)));
        }
    }
    Ok(())
}

/// Ensures that the `id` field in `body` is present and matches the `id` in the request path.
fn check_id_match(id: &RestaurantId, body: &Map<String, Value>) -> RestResult<()> {
    match body.get("id") {
        Some(Value::String(body_id)) if body_id == id.as_ref() => Ok(()),
        Some(_) => Err(RestError::InvalidRequest(
            "Identifier in body does not match identifier in path".to_owned(),
        )),
        None => Err(RestError::InvalidRequest("Missing required field: id".to_owned())),
    }
}

/// Removes `field` from `body` and ensures it is a string if present.
fn take_string(body: &mut Map<String, Value>, field: &str) -> RestResult<Option<String>> {
    match body.remove(field) {
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RestError::InvalidRequest(format!("Field {} must be a string", field))),
        None => Ok(None),
    }
}

/// Removes `field` from `body` and ensures it is present and a string.
fn take_required_string(body: &mut Map<String, Value>, field: &str) -> RestResult<String> {
    match take_string(body, field)? {
        Some(s) => Ok(s),
        None => Err(RestError::InvalidRequest(format!("Missing required field: {}", field))),
    }
}

/// Handler for any request that does not match a known route or method.
async fn fallback() -> RestError {
    RestError::NotFound("Not Found".to_owned())
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::get;
    Router::new()
        .route(
            "/restaurants",
            get(restaurants_get::handler).post(restaurants_post::handler).fallback(fallback),
        )
        .route(
            "/restaurants/:id",
            get(restaurant_get::handler)
                .put(restaurant_put::handler)
                .delete(restaurant_delete::handler)
                .fallback(fallback),
        )
        .fallback(fallback)
        .with_state(driver)
}
