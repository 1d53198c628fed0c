use crate::catalog::CatalogSnapshot;
use crate::error::ServiceError;
use crate::products::bulk::{group_rows, write_bulk_csv};
use crate::products::ProductList;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};

const BULK_FILE_NAME: &str = "BulkGenerateBarcodeLabels.csv";

/// `GET /api/products/export.csv`
pub(crate) async fn process(
    products: web::Data<ProductList>,
    catalog: web::Data<CatalogSnapshot>,
) -> Result<HttpResponse, ServiceError> {
    let items = products.snapshot().await;
    if items.is_empty() {
        return Err(ServiceError::BadRequest("No products to export!".into()));
    }
    let rows = group_rows(&items, &catalog);
    let body = write_bulk_csv(&rows).map_err(|e| ServiceError::internal("CSV export failed.", e))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(BULK_FILE_NAME.to_string())],
        })
        .body(body))
}
