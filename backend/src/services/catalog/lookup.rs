use crate::catalog::resolver::resolve_rack_space;
use crate::catalog::CatalogSnapshot;
use crate::error::ServiceError;
use actix_web::{web, HttpResponse, Responder};
use common::model::product::RACK_NOT_FOUND;

pub(crate) async fn rack(
    style_number: web::Path<u32>,
    catalog: web::Data<CatalogSnapshot>,
) -> impl Responder {
    match resolve_rack_space(style_number.into_inner(), &catalog) {
        Some(found) => HttpResponse::Ok().json(found),
        None => HttpResponse::NotFound().json(serde_json::json!({ "rack_space": RACK_NOT_FOUND })),
    }
}

pub(crate) async fn style(
    style_number: web::Path<u32>,
    catalog: web::Data<CatalogSnapshot>,
) -> Result<HttpResponse, ServiceError> {
    let style_number = style_number.into_inner();
    let record = catalog
        .get(style_number)
        .ok_or_else(|| ServiceError::NotFound(format!("style {} is not in the catalog", style_number)))?;
    Ok(HttpResponse::Ok().json(record))
}
