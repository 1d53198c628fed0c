//! Errors returned by the HTTP handlers.

use crate::labels::import::ImportError;
use crate::orders::OrderError;
use crate::products::ProductError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        ServiceError::Internal(context.to_string())
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::BadRequest(_) | ServiceError::Import(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Order(OrderError::InvalidOrderId(_)) => StatusCode::BAD_REQUEST,
            ServiceError::Order(OrderError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Order(OrderError::UnknownSize { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Order(OrderError::Http(_)) => StatusCode::BAD_GATEWAY,
            ServiceError::Product(ProductError::InvalidQuantity) => StatusCode::BAD_REQUEST,
            ServiceError::Product(ProductError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Product(ProductError::Store(_)) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({ "error": self.to_string() }))
    }
}
