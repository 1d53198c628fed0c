use crate::error::ServiceError;
use crate::labels::pipeline::render_preview;
use crate::labels::raster::Rasterizer;
use actix_web::{web, HttpResponse};
use common::requests::RenderLabelsRequest;

/// `POST /api/labels/preview`: PNG of the first label at print resolution.
pub(crate) async fn process(
    payload: web::Json<RenderLabelsRequest>,
    rasterizer: web::Data<dyn Rasterizer>,
) -> Result<HttpResponse, ServiceError> {
    let req = payload.into_inner();
    if req.labels.is_empty() {
        return Err(ServiceError::BadRequest("No products to preview!".into()));
    }

    let rasterizer = rasterizer.into_inner();
    let png = web::block(move || {
        render_preview(&req.labels, req.template, rasterizer.as_ref())?.to_png()
    })
    .await
    .map_err(|e| ServiceError::internal("Preview failed.", e))?
    .map_err(|e| ServiceError::internal("Preview failed.", e))?;

    Ok(HttpResponse::Ok().content_type("image/png").body(png))
}
