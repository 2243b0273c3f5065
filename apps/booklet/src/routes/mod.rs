pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::booklet::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Booklet API
        .route("/api/v1/booklets", post(handlers::handle_load_booklet))
        .route(
            "/api/v1/booklets/:id",
            get(handlers::handle_get_booklet).delete(handlers::handle_close_booklet),
        )
        .route("/api/v1/booklets/:id/moves", post(handlers::handle_move_block))
        .route(
            "/api/v1/booklets/:id/questions/:qid/option-moves",
            post(handlers::handle_move_option),
        )
        .route(
            "/api/v1/booklets/:id/save-status",
            get(handlers::handle_save_status),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::persistence::InMemoryOrderStore;

    fn make_state(store: Arc<InMemoryOrderStore>) -> AppState {
        let config = Config {
            column_capacity: 300.0,
            ..Config::default()
        };
        AppState::new(&config, store)
    }

    fn load_body() -> Value {
        json!({
            "test_id": 5,
            "header": { "left": "Grade 9", "center": "Final exam", "right": "Variant A" },
            "subjects": [
                { "id": 1, "name": "Mathematics", "header_height": 50.0 },
                { "id": 2, "name": "Literature", "header_height": 50.0 }
            ],
            "questions": [
                { "id": 1, "subject_id": 1, "text": "2 + 2", "height": 150.0,
                  "options": [
                      { "id": 11, "text": "3", "order": 0 },
                      { "id": 12, "text": "4", "order": 1, "is_correct": true },
                      { "id": 13, "text": "5", "order": 2 }
                  ] },
                { "id": 2, "subject_id": 1, "text": "Prove it", "height": 250.0 },
                { "id": 3, "subject_id": 2, "text": "Who wrote it?", "height": 150.0 }
            ],
            "question_order": [1, 2, 3]
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn open_booklet(app: &Router) -> String {
        let response = send(app.clone(), "POST", "/api/v1/booklets", Some(load_body())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let response = send(app, "GET", "/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["service"], "booklet-api");
    }

    #[tokio::test]
    async fn test_load_returns_paginated_booklet() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let response = send(app, "POST", "/api/v1/booklets", Some(load_body())).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        let booklet = &body["booklet"];
        assert_eq!(booklet["sheets"].as_array().unwrap().len(), 2);
        assert_eq!(booklet["sheets"][0]["header"]["center"], "Final exam");
        assert_eq!(booklet["sheets"][1]["footer"], "2");
        assert_eq!(booklet["labels"]["questions"][2]["label"], "3.");
        assert_eq!(booklet["answer_key"][0]["correct"], json!(["B)"]));
    }

    #[tokio::test]
    async fn test_header_move_regroups_and_saves() {
        let store = Arc::new(InMemoryOrderStore::new());
        let app = build_router(make_state(store.clone()));
        let id = open_booklet(&app).await;

        let response = send(
            app.clone(),
            "POST",
            &format!("/api/v1/booklets/{id}/moves"),
            Some(json!({ "block": { "kind": "header", "id": 2 }, "new_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["outcome"], "group_regrouped");
        assert_eq!(body["members"], 1);
        let numbers: Vec<(i64, i64)> = body["booklet"]["labels"]["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| (l["question_id"].as_i64().unwrap(), l["number"].as_i64().unwrap()))
            .collect();
        assert_eq!(numbers, vec![(3, 1), (1, 2), (2, 3)]);

        // The save runs in the background; give it a moment to land.
        for _ in 0..50 {
            if store.question_order(5).await.is_some() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(
            store.question_order(5).await,
            Some(vec![
                crate::models::BlockId(3),
                crate::models::BlockId(1),
                crate::models::BlockId(2)
            ])
        );

        let status = json_body(
            send(app, "GET", &format!("/api/v1/booklets/{id}/save-status"), None).await,
        )
        .await;
        assert_eq!(status["state"], "saved");
    }

    #[tokio::test]
    async fn test_option_move_reletters() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let id = open_booklet(&app).await;

        let response = send(
            app,
            "POST",
            &format!("/api/v1/booklets/{id}/questions/1/option-moves"),
            Some(json!({ "option_id": 13, "new_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["order"], json!([13, 11, 12]));
        assert_eq!(body["booklet"]["answer_key"][0]["correct"], json!(["C)"]));
    }

    #[tokio::test]
    async fn test_failed_save_is_reported_but_order_kept() {
        let store = Arc::new(InMemoryOrderStore::new());
        store.set_outage(Some("backend down")).await;
        let app = build_router(make_state(store));
        let id = open_booklet(&app).await;

        let response = send(
            app.clone(),
            "POST",
            &format!("/api/v1/booklets/{id}/moves"),
            Some(json!({ "block": { "kind": "item", "id": 2 }, "new_index": 1 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let mut state = Value::Null;
        for _ in 0..50 {
            state = json_body(
                send(app.clone(), "GET", &format!("/api/v1/booklets/{id}/save-status"), None)
                    .await,
            )
            .await;
            if state["state"] == "failed" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(state["state"], "failed");
        assert_eq!(state["message"], "backend down");

        let body = json_body(send(app, "GET", &format!("/api/v1/booklets/{id}"), None).await).await;
        assert_eq!(body["booklet"]["labels"]["questions"][0]["question_id"], 2);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let response = send(
            app,
            "GET",
            &format!("/api/v1/booklets/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_closed_booklet_is_gone() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let id = open_booklet(&app).await;

        let response = send(app.clone(), "DELETE", &format!("/api/v1/booklets/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(app.clone(), "GET", &format!("/api/v1/booklets/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            app.clone(),
            "POST",
            &format!("/api/v1/booklets/{id}/moves"),
            Some(json!({ "block": { "kind": "item", "id": 1 }, "new_index": 0 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app, "DELETE", &format!("/api/v1/booklets/{id}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_out_of_range_move_is_bad_request() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let id = open_booklet(&app).await;
        let response = send(
            app,
            "POST",
            &format!("/api/v1/booklets/{id}/moves"),
            Some(json!({ "block": { "kind": "item", "id": 1 }, "new_index": 99 })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_too_many_options_is_unprocessable() {
        let app = build_router(make_state(Arc::new(InMemoryOrderStore::new())));
        let options: Vec<Value> = (0..7)
            .map(|i| json!({ "id": 100 + i, "text": "x", "order": i }))
            .collect();
        let body = json!({
            "test_id": 1,
            "questions": [{ "id": 1, "text": "Pick one", "options": options }]
        });
        let response = send(app, "POST", "/api/v1/booklets", Some(body)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
