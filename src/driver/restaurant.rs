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

//! Operations on one restaurant.

use crate::db;
use crate::driver::{Driver, DriverResult};
use crate::model::{Restaurant, RestaurantId, RestaurantPatch};
use serde_json::Value;

impl Driver {
    /// Creates a new restaurant with a store-assigned identifier and returns the stored document.
    pub(crate) async fn create_restaurant(
        self,
        name: String,
        borough: String,
        cuisine: String,
        address: Value,
        grades: Value,
    ) -> DriverResult<Restaurant> {
        let restaurant =
            Restaurant::new(RestaurantId::random(), name, borough, cuisine, address, grades);
        db::create_restaurant(&mut self.db.ex().await?, &restaurant).await?;
        Ok(restaurant)
    }

    /// Deletes an existing restaurant.
    pub(crate) async fn delete_restaurant(self, id: &RestaurantId) -> DriverResult<()> {
        db::delete_restaurant(&mut self.db.ex().await?, id).await?;
        Ok(())
    }

    /// Gets the current contents of the restaurant `id`.
    pub(crate) async fn get_restaurant(self, id: &RestaurantId) -> DriverResult<Restaurant> {
        let restaurant = db::get_restaurant(&mut self.db.ex().await?, id).await?;
        Ok(restaurant)
    }

    /// Applies `patch` to the restaurant `id`, leaving the fields the patch does not name
    /// untouched.
    ///
    /// The read-modify-write cycle runs within one transaction so that concurrent updates
    /// cannot interleave between the read and the write.
    pub(crate) async fn update_restaurant(
        self,
        id: &RestaurantId,
        patch: RestaurantPatch,
    ) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let restaurant = db::get_restaurant(tx.ex(), id).await?;
        db::put_restaurant(tx.ex(), &patch.apply(restaurant)).await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::testutils::*;
    use crate::driver::DriverError;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_restaurant_assigns_unique_ids() {
        let context = TestContext::setup().await;

        let first = context
            .driver()
            .create_restaurant(
                "Ok Diner".to_owned(),
                "Queens".to_owned(),
                "Diner".to_owned(),
                json!({"street": "Broadway"}),
                json!([]),
            )
            .await
            .unwrap();
        let second = context
            .driver()
            .create_restaurant(
                "Ok Diner".to_owned(),
                "Queens".to_owned(),
                "Diner".to_owned(),
                json!({"street": "Broadway"}),
                json!([]),
            )
            .await
            .unwrap();

        assert!(!first.id().as_ref().is_empty());
        assert_ne!(first.id(), second.id());

        let stored = db::get_restaurant(&mut context.ex().await, first.id()).await.unwrap();
        assert_eq!(first, stored);
    }

    #[tokio::test]
    async fn test_get_restaurant_ok() {
        let context = TestContext::setup().await;

        let exp_restaurant = context.insert_sample("Ok Diner").await;

        let restaurant = context.driver().get_restaurant(exp_restaurant.id()).await.unwrap();
        assert_eq!(exp_restaurant, restaurant);
    }

    #[tokio::test]
    async fn test_get_restaurant_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().get_restaurant(&RestaurantId::random()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_update_restaurant_merges_partial_fields() {
        let context = TestContext::setup().await;

        let restaurant = context.insert_sample("Ok Diner").await;

        let patch = RestaurantPatch::new(Some("Better Diner".to_owned()), None, None, None);
        context.driver().update_restaurant(restaurant.id(), patch).await.unwrap();

        let updated = db::get_restaurant(&mut context.ex().await, restaurant.id()).await.unwrap();
        assert_eq!("Better Diner", updated.name());
        assert_eq!(restaurant.borough(), updated.borough());
        assert_eq!(restaurant.cuisine(), updated.cuisine());
        assert_eq!(restaurant.address(), updated.address());
        assert_eq!(restaurant.grades(), updated.grades());
    }

    #[tokio::test]
    async fn test_update_restaurant_not_found() {
        let context = TestContext::setup().await;

        let patch = RestaurantPatch::new(Some("Better Diner".to_owned()), None, None, None);
        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().update_restaurant(&RestaurantId::random(), patch).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_restaurant_ok() {
        let context = TestContext::setup().await;

        let restaurant = context.insert_sample("Ok Diner").await;
        let other = context.insert_sample("Other Diner").await;

        context.driver().delete_restaurant(restaurant.id()).await.unwrap();

        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().get_restaurant(restaurant.id()).await.unwrap_err()
        );
        context.driver().get_restaurant(other.id()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_restaurant_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Entity not found".to_owned()),
            context.driver().delete_restaurant(&RestaurantId::random()).await.unwrap_err()
        );
    }
}
