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

//! High-level data types.

use derive_getters::Getters;
use derive_more::{AsRef, Constructor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Newtype pattern for the store-assigned restaurant identifiers.
#[derive(AsRef, Clone, Constructor, Deserialize, Eq, PartialEq, Serialize)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct RestaurantId(String);

impl RestaurantId {
    /// Generates a fresh identifier for a restaurant about to be created.
    pub(crate) fn random() -> RestaurantId {
        RestaurantId(Uuid::new_v4().to_string())
    }
}

/// A restaurant document as persisted by the store.
///
/// The `address` and `grades` fields are carried verbatim as JSON values: this layer never
/// interprets their contents.
#[derive(Clone, Constructor, Getters)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct Restaurant {
    /// Store-assigned identifier; immutable once assigned.
    id: RestaurantId,

    /// Name of the restaurant.
    name: String,

    /// Borough the restaurant is located in.
    borough: String,

    /// Type of cuisine the restaurant serves.
    cuisine: String,

    /// Structured street address, opaque to this service.
    address: Value,

    /// Ordered sequence of inspection grades, opaque to this service.
    grades: Value,
}

/// Partial update to apply to an existing restaurant.
///
/// Fields left as `None` keep the value currently in the store.  The identifier and the grades
/// are not updatable through a patch and always carry over.
#[derive(Constructor)]
#[cfg_attr(test, derive(Debug))]
pub(crate) struct RestaurantPatch {
    /// Replacement name, if requested.
    name: Option<String>,

    /// Replacement borough, if requested.
    borough: Option<String>,

    /// Replacement cuisine, if requested.
    cuisine: Option<String>,

    /// Replacement address, if requested.
    address: Option<Value>,
}

impl RestaurantPatch {
    /// Applies the patch to `restaurant` and returns the document to write back.
    pub(crate) fn apply(self, restaurant: Restaurant) -> Restaurant {
        Restaurant {
            id: restaurant.id,
            name: self.name.unwrap_or(restaurant.name),
            borough: self.borough.unwrap_or(restaurant.borough),
            cuisine: self.cuisine.unwrap_or(restaurant.cuisine),
            address: self.address.unwrap_or(restaurant.address),
            grades: restaurant.grades,
        }
    }
}

/// Externally visible projection of a stored restaurant.
///
/// This is the exact shape serialized in API responses.  It is derived on demand from a stored
/// `Restaurant` right before serialization and is never persisted itself.
#[derive(Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub(crate) struct RestaurantView {
    /// Store-assigned identifier.
    id: RestaurantId,

    /// Name of the restaurant.
    name: String,

    /// Borough the restaurant is located in.
    borough: String,

    /// Type of cuisine the restaurant serves.
    cuisine: String,

    /// Structured street address, exposed verbatim.
    address: Value,

    /// Ordered sequence of inspection grades, exposed verbatim.
    grades: Value,
}

impl From<Restaurant> for RestaurantView {
    fn from(restaurant: Restaurant) -> Self {
        RestaurantView {
            id: restaurant.id,
            name: restaurant.name,
            borough: restaurant.borough,
            cuisine: restaurant.cuisine,
            address: restaurant.address,
            grades: restaurant.grades,
        }
    }
}
