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

//! API to add a restaurant to the collection.

use crate::driver::Driver;
use crate::model::RestaurantView;
use crate::rest::{
    REQUIRED_CREATE_FIELDS, RestResult, check_required_fields, take_required_string,
};
use axum::extract::State;
use axum::{Json, http};
use serde_json::{Map, Value};

/// API handler.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Json(mut body): Json<Map<String, Value>>,
) -> RestResult<(http::StatusCode, Json<RestaurantView>)> {
    check_required_fields(&body, REQUIRED_CREATE_FIELDS)?;

    let name = take_required_string(&mut body, "name")?;
    let borough = take_required_string(&mut body, "borough")?;
    let cuisine = take_required_string(&mut body, "cuisine")?;
    let address = body.remove("address").unwrap_or(Value::Null);
    let grades = body.remove("grades").unwrap_or_else(|| Value::Array(vec![]));

    let restaurant = driver.create_restaurant(name, borough, cuisine, address, grades).await?;
    Ok((http::StatusCode::CREATED, Json(RestaurantView::from(restaurant))))
}
