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

//! Test utilities for the business logic layer.

use crate::db::{self, Db, Executor};
use crate::driver::Driver;
use crate::model::{Restaurant, RestaurantId};
use serde_json::json;
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    db: Arc<dyn Db + Send + Sync>,
    driver: Driver,
}

impl TestContext {
    /// Initializes the test environment against an in-memory database.
    pub(crate) async fn setup() -> TestContext {
        let db: Arc<dyn Db + Send + Sync> =
            Arc::from(crate::db::sqlite::testutils::setup().await);
        let driver = Driver::new(db.clone());
        TestContext { db, driver }
    }

    /// Gets a copy of the driver in the context.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Gets a direct executor against the database in the context.
    pub(crate) async fn ex(&self) -> Executor {
        self.db.ex().await.unwrap()
    }

    /// Inserts a restaurant named `name` directly into the database, bypassing the driver,
    /// and returns it.
    pub(crate) async fn insert_sample(&self, name: &str) -> Restaurant {
        let restaurant = Restaurant::new(
            RestaurantId::random(),
            name.to_owned(),
            "Queens".to_owned(),
            "Diner".to_owned(),
            json!({"building": "469", "street": "Broadway", "zipcode": "11106"}),
            json!([{"grade": "A", "score": 2}]),
        );
        db::create_restaurant(&mut self.ex().await, &restaurant).await.unwrap();
        restaurant
    }
}
