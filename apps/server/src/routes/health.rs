use actix_web::{HttpResponse, Responder, get, web};
use sentinel_store::StatusStore;
use serde_json::json;

macros_utils::routes! {
    route health_route,
}

/// Health check route
/// 200 while the status store answers, 503 otherwise.
#[get("/health")]
pub async fn health_route(store: web::Data<dyn StatusStore>) -> impl Responder {
    if store.is_healthy().await {
        HttpResponse::Ok().json(json!({ "status": "ok" }))
    } else {
        HttpResponse::ServiceUnavailable().json(json!({ "error": "Database connection failed" }))
    }
}
