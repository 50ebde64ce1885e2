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

//! API to update the details of a restaurant.

use crate::driver::Driver;
use crate::model::{RestaurantId, RestaurantPatch};
use crate::rest::{RestResult, check_id_match, take_string};
use axum::extract::{Path, State};
use axum::{Json, http};
use serde_json::{Map, Value};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<RestaurantId>,
    Json(mut body): Json<Map<String, Value>>,
) -> RestResult<http::StatusCode> {
    check_id_match(&id, &body)?;

    let patch = RestaurantPatch::new(
        take_string(&mut body, "name")?,
        take_string(&mut body, "borough")?,
        take_string(&mut body, "cuisine")?,
        body.remove("address"),
    );
    driver.update_restaurant(&id, patch).await?;
    Ok(http::StatusCode::NO_CONTENT)
}
