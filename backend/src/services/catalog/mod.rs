//! Catalog lookups.
//!
//! - `GET /api/catalog/rack/{style_number}`: resolved rack space, with the
//!   neighbour search for 5-digit styles. A miss answers 404 with
//!   `{"rack_space":"Not found"}`.
//! - `GET /api/catalog/style/{style_number}`: the raw catalog record.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod lookup;

const API_PATH: &str = "/api/catalog";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/rack/{style_number}", get().to(lookup::rack))
        .route("/style/{style_number}", get().to(lookup::style))
}
