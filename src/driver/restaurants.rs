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

//! Operations on the collection of restaurants.

use crate::db;
use crate::driver::{Driver, DriverResult};
use crate::model::Restaurant;

/// Maximum number of restaurants returned by a single listing operation.
///
/// The stored collection can hold tens of thousands of documents, so unbounded listings are
/// not allowed.
const LIST_LIMIT: i64 = 10;

impl Driver {
    /// Gets up to `LIST_LIMIT` restaurants, ordered by name.
    pub(crate) async fn get_restaurants(self) -> DriverResult<Vec<Restaurant>> {
        let restaurants = db::get_restaurants(&mut self.db.ex().await?, LIST_LIMIT).await?;
        Ok(restaurants)
    }
}
