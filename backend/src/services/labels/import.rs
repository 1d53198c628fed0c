use crate::error::ServiceError;
use crate::labels::import::parse_csv;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use common::model::label::LabelTemplate;
use futures_util::StreamExt;
use log::info;

const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// `POST /api/labels/import/{kind}` with the CSV in the `file` field.
///
/// `kind` is `barcodes` for the rack barcode layout or `labels` for the
/// detailed one.
pub(crate) async fn process(
    kind: web::Path<String>,
    payload: Multipart,
) -> Result<HttpResponse, ServiceError> {
    let template = template_for(&kind)?;
    let bytes = read_file_field(payload).await?;
    let text = String::from_utf8_lossy(&bytes);
    let labels = parse_csv(template, &text)?;
    info!("Parsed {} {} rows from upload", labels.len(), kind.as_str());
    Ok(HttpResponse::Ok().json(labels))
}

fn template_for(kind: &str) -> Result<LabelTemplate, ServiceError> {
    match kind {
        "barcodes" => Ok(LabelTemplate::RackBarcode),
        "labels" => Ok(LabelTemplate::Detailed),
        other => Err(ServiceError::NotFound(format!("unknown import kind '{}'", other))),
    }
}

async fn read_file_field(mut payload: Multipart) -> Result<Vec<u8>, ServiceError> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("file") {
            continue;
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ServiceError::BadRequest(e.to_string()))?;
            if bytes.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(ServiceError::BadRequest("The file is too large.".into()));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(bytes);
    }
    Err(ServiceError::BadRequest("Missing 'file' field.".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_templates() {
        assert_eq!(template_for("barcodes").unwrap(), LabelTemplate::RackBarcode);
        assert_eq!(template_for("labels").unwrap(), LabelTemplate::Detailed);
        assert!(template_for("stickers").is_err());
    }
}
