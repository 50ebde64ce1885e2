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

//! API to fetch a single restaurant.

use crate::driver::Driver;
use crate::model::{RestaurantId, RestaurantView};
use crate::rest::{EmptyBody, RestResult};
use axum::Json;
use axum::extract::{Path, State};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<RestaurantId>,
    _: EmptyBody,
) -> RestResult<Json<RestaurantView>> {
    let restaurant = driver.get_restaurant(&id).await?;
    Ok(Json(RestaurantView::from(restaurant)))
}
