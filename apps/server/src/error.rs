use std::io::Error as IoError;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use sentinel_store::{CatalogError, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

fn store_status(err: &StoreError) -> StatusCode {
    if err.is_connection_loss() { StatusCode::SERVICE_UNAVAILABLE } else { StatusCode::INTERNAL_SERVER_ERROR }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(err) => store_status(err),
            AppError::Catalog(err) => match err {
                CatalogError::Store(err) => store_status(err),
                CatalogError::EmptyName
                | CatalogError::NameTooLong
                | CatalogError::EmptyUrl
                | CatalogError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                CatalogError::StationExists(_) | CatalogError::UrlExists(_) => StatusCode::CONFLICT,
                CatalogError::ProtectedStation => StatusCode::FORBIDDEN,
                CatalogError::UnknownStation(_) => StatusCode::NOT_FOUND,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        HttpResponse::build(status).json(json!({ "error": self.to_string() }))
    }
}
