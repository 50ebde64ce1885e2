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

//! API to list the restaurants in the collection.

use crate::driver::Driver;
use crate::model::RestaurantView;
use crate::rest::{EmptyBody, RestError};
use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde::Serialize;

/// Response to a listing request.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, serde::Deserialize, PartialEq))]
struct ListResponse {
    /// The restaurants in the collection, capped to the listing limit.
    restaurants: Vec<RestaurantView>,
}

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    _: EmptyBody,
) -> Result<impl IntoResponse, RestError> {
    let restaurants = driver.get_restaurants().await?;
    Ok(Json(ListResponse {
        restaurants: restaurants.into_iter().map(RestaurantView::from).collect(),
    }))
}
