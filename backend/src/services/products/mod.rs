//! The persisted product list.
//!
//! Routes under `/api/products`:
//! - `GET ""` / `DELETE ""`: list or clear.
//! - `POST ""`: manual entry; `POST /scan`: entry from a 5-digit order id.
//! - `PUT /{index}` / `DELETE /{index}`: edit or remove one entry.
//! - `GET /export.csv`: the bulk barcode CSV.
//!
//! Adding an entry also tells the press table that the matching order was
//! labeled. That call is best effort and never fails the request.

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

mod entries;
mod export;

const API_PATH: &str = "/api/products";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(entries::list))
        .route("", post().to(entries::add))
        .route("", delete().to(entries::clear))
        .route("/scan", post().to(entries::scan))
        .route("/export.csv", get().to(export::process))
        .route("/{index}", put().to(entries::edit))
        .route("/{index}", delete().to(entries::remove))
}
