use actix_web::{HttpResponse, delete, post, web};
use sentinel_store::{StatusStore, catalog};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;

macros_utils::routes! {
    route create_station,
    route remove_station,
    route create_url,
    route remove_url,
}

#[derive(Debug, Deserialize)]
pub struct StationBody {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UrlBody {
    pub url: String,
}

#[post("/api/stations")]
pub async fn create_station(
    store: web::Data<dyn StatusStore>,
    body: web::Json<StationBody>,
) -> Result<HttpResponse, AppError> {
    let station = catalog::add_station(store.get_ref(), &body.name).await?;
    Ok(HttpResponse::Created().json(json!({ "station": station })))
}

/// Deletes the station, its URL set and any status no other station needs
#[delete("/api/stations/{name}")]
pub async fn remove_station(
    store: web::Data<dyn StatusStore>,
    name: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let urls = catalog::delete_station(store.get_ref(), &name).await?;
    Ok(HttpResponse::Ok().json(json!({ "station": name.into_inner(), "urls_removed": urls })))
}

#[post("/api/stations/{name}/urls")]
pub async fn create_url(
    store: web::Data<dyn StatusStore>,
    name: web::Path<String>,
    body: web::Json<UrlBody>,
) -> Result<HttpResponse, AppError> {
    let url = catalog::add_url(store.get_ref(), &name, &body.url).await?;
    Ok(HttpResponse::Created().json(json!({ "station": name.into_inner(), "url": url })))
}

/// Removes a URL from one station; the status key goes once nothing references it
#[delete("/api/stations/{name}/urls")]
pub async fn remove_url(
    store: web::Data<dyn StatusStore>,
    name: web::Path<String>,
    body: web::Json<UrlBody>,
) -> Result<HttpResponse, AppError> {
    let status_removed = catalog::delete_url(store.get_ref(), &name, &body.url).await?;
    Ok(HttpResponse::Ok().json(json!({ "station": name.into_inner(), "status_removed": status_removed })))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use sentinel_store::{MemoryStore, Status, StatusStore};
    use serde_json::{Value, json};

    use crate::routes::test_app;

    async fn with_general() -> MemoryStore {
        let store = MemoryStore::new();
        store.add_station("General").await.unwrap();
        store
    }

    #[actix_web::test]
    async fn test_create_station_trims_name() {
        let store = with_general().await;
        let app = test_app!(store);

        let req = test::TestRequest::post().uri("/api/stations").set_json(json!({ "name": "  Work " })).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["station"], "Work");
        assert!(store.list_stations().await.unwrap().contains("Work"));
    }

    #[actix_web::test]
    async fn test_create_station_rejections() {
        let store = with_general().await;
        let app = test_app!(store);

        let cases = [
            (json!({ "name": "   " }), StatusCode::BAD_REQUEST),
            (json!({ "name": "x".repeat(51) }), StatusCode::BAD_REQUEST),
            (json!({ "name": "General" }), StatusCode::CONFLICT),
        ];
        for (body, expected) in cases {
            let req = test::TestRequest::post().uri("/api/stations").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);

            let body: Value = test::read_body_json(resp).await;
            assert!(body["error"].is_string());
        }
    }

    #[actix_web::test]
    async fn test_default_station_cannot_be_deleted() {
        let store = with_general().await;
        let app = test_app!(store);

        let req = test::TestRequest::delete().uri("/api/stations/General").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
        assert!(store.list_stations().await.unwrap().contains("General"));
    }

    #[actix_web::test]
    async fn test_delete_unknown_station_is_404() {
        let store = with_general().await;
        let app = test_app!(store);

        let req = test::TestRequest::delete().uri("/api/stations/Nowhere").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_add_url_normalizes_and_marks_pending() {
        let store = with_general().await;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/stations/General/urls")
            .set_json(json!({ "url": "example.com/" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["url"], "https://example.com");
        assert_eq!(store.get_status("https://example.com").await.unwrap(), Status::Pending);

        let again = test::TestRequest::post()
            .uri("/api/stations/General/urls")
            .set_json(json!({ "url": "https://example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, again).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_add_url_to_unknown_station_is_404() {
        let store = with_general().await;
        let app = test_app!(store);

        let req = test::TestRequest::post()
            .uri("/api/stations/Nowhere/urls")
            .set_json(json!({ "url": "https://example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        assert!(store.raw_value("status:https://example.com").await.is_none());
    }

    #[actix_web::test]
    async fn test_shared_url_keeps_status_until_last_reference() {
        let store = with_general().await;
        store.add_station("Work").await.unwrap();
        store.add_url("General", "https://example.com").await.unwrap();
        store.add_url("Work", "https://example.com").await.unwrap();
        store.set_status("https://example.com", &Status::up(80)).await.unwrap();
        let app = test_app!(store);

        let req = test::TestRequest::delete()
            .uri("/api/stations/Work/urls")
            .set_json(json!({ "url": "https://example.com" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status_removed"], false);
        assert_eq!(store.raw_value("status:https://example.com").await.as_deref(), Some("UP (80ms)"));

        let req = test::TestRequest::delete()
            .uri("/api/stations/General/urls")
            .set_json(json!({ "url": "https://example.com" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status_removed"], true);
        assert!(store.raw_value("status:https://example.com").await.is_none());
    }

    #[actix_web::test]
    async fn test_delete_station_drops_orphaned_statuses() {
        let store = with_general().await;
        store.add_station("Work").await.unwrap();
        store.add_url("General", "https://shared.test").await.unwrap();
        store.add_url("Work", "https://shared.test").await.unwrap();
        store.add_url("Work", "https://only-work.test").await.unwrap();
        store.set_status("https://shared.test", &Status::Pending).await.unwrap();
        store.set_status("https://only-work.test", &Status::Pending).await.unwrap();
        let app = test_app!(store);

        let req = test::TestRequest::delete().uri("/api/stations/Work").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["urls_removed"], 2);

        assert!(store.raw_value("status:https://shared.test").await.is_some());
        assert!(store.raw_value("status:https://only-work.test").await.is_none());
        assert!(store.raw_members("urls:Work").await.is_empty());
    }
}
