use actix_web::{HttpResponse, get, web};
use sentinel_store::{StatusStore, catalog};

use crate::error::AppError;

macros_utils::routes! {
    route status_route,
    route summary_route,
}

/// Every station with its URLs and their current status
#[get("/api/status")]
pub async fn status_route(store: web::Data<dyn StatusStore>) -> Result<HttpResponse, AppError> {
    let snapshot = catalog::snapshot(store.get_ref()).await?;
    Ok(HttpResponse::Ok().json(snapshot))
}

/// Up/down/pending counts across all stations
#[get("/api/summary")]
pub async fn summary_route(store: web::Data<dyn StatusStore>) -> Result<HttpResponse, AppError> {
    let summary = catalog::snapshot(store.get_ref()).await?.summary();
    Ok(HttpResponse::Ok().json(summary))
}
