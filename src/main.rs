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

//! Entry point to the restaurants service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use restaurants::db;
use restaurants::env::{get_optional_var, get_required_var};
use restaurants::start;
use std::net::Ipv4Addr;

/// Port to serve on when `PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("PORT").unwrap().unwrap_or(DEFAULT_PORT);
    let conn_str = get_required_var::<String>("DATABASE_URL").unwrap();

    let db = db::connect(&conn_str).await.unwrap();
    db::init_schema(&mut db.ex().await.unwrap()).await.unwrap();

    let server = start((Ipv4Addr::UNSPECIFIED, port), db).await.unwrap();
    server.wait().await.unwrap()
}
