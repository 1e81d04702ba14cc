//! Axum router construction.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/fields/:name/encode", post(handlers::encode))
        .route("/fields/:name/decode", post(handlers::decode))
        .route("/fields/:name/reencode", post(handlers::reencode))
        .route("/fields/:name/lookup", post(handlers::lookup))
        .route("/fields/:name/index/plan", post(handlers::plan_index))
        .route("/index/diff", post(handlers::diff_index))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(middleware::MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(AppState::default());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        // 503 because no field definitions are loaded in the test state.
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn field_routes_unavailable_before_load() {
        let app = build(AppState::default());
        let req = Request::builder()
            .method("POST")
            .uri("/fields/person.email/encode")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"value":"a@example.com"}"#))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 503);
    }

    mod end_to_end {
        use super::super::build;
        use crate::registry::definition::DefinitionFile;
        use crate::server::state::AppState;
        use axum_test::TestServer;
        use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
        use common::protocol::{
            DecodeResponse, ErrorResponse, LookupResponse, PlanIndexResponse, StoredResponse,
        };
        use sealfield::{IndexDiff, KeyMaterial, Secret};
        use serde_json::json;

        const FIELDS: &str = r#"
fields:
  - name: person.email
    unique: true
  - name: person.name
  - name: person.dob
    kind: date
    db_index: true
  - name: person.notes
    keys: [new-key, old-key]
"#;

        fn server() -> TestServer {
            let material = KeyMaterial::new(Secret::from("process-secret"), Vec::new(), true);
            let file: DefinitionFile = serde_yaml::from_str(FIELDS).unwrap();
            let state = AppState::default();
            state.registry.replace_all(
                file.fields
                    .iter()
                    .map(|d| (d.name.clone(), d.build(&material).unwrap()))
                    .collect(),
            );
            TestServer::new(build(state)).unwrap()
        }

        async fn encode(server: &TestServer, field: &str, value: serde_json::Value) -> String {
            let resp = server
                .post(&format!("/fields/{field}/encode"))
                .json(&json!({ "value": value }))
                .await;
            resp.assert_status_ok();
            resp.json::<StoredResponse>().stored.unwrap()
        }

        #[tokio::test]
        async fn encode_decode_round_trip() {
            let server = server();
            let stored = encode(&server, "person.dob", json!("2015-02-05")).await;

            let resp = server
                .post("/fields/person.dob/decode")
                .json(&json!({ "stored": stored }))
                .await;
            resp.assert_status_ok();
            assert_eq!(resp.json::<DecodeResponse>().value, json!("2015-02-05"));
        }

        #[tokio::test]
        async fn null_passes_through() {
            let server = server();
            let resp = server
                .post("/fields/person.name/encode")
                .json(&json!({ "value": null }))
                .await;
            assert!(resp.json::<StoredResponse>().stored.is_none());
        }

        #[tokio::test]
        async fn exact_lookup_matches_stored_prefix() {
            let server = server();
            let first = encode(&server, "person.email", json!("a@example.com")).await;
            let second = encode(&server, "person.email", json!("a@example.com")).await;
            assert_ne!(first, second);

            let resp = server
                .post("/fields/person.email/lookup")
                .json(&json!({ "operator": "exact", "value": "a@example.com" }))
                .await;
            resp.assert_status_ok();
            let digests = resp.json::<LookupResponse>().digests;
            assert_eq!(digests.len(), 1);

            let digest = URL_SAFE_NO_PAD.decode(&digests[0]).unwrap();
            for stored in [first, second] {
                let bytes = URL_SAFE_NO_PAD.decode(stored).unwrap();
                assert_eq!(&bytes[..32], digest.as_slice());
            }
        }

        #[tokio::test]
        async fn in_lookup_returns_one_digest_per_value() {
            let server = server();
            let resp = server
                .post("/fields/person.email/lookup")
                .json(&json!({ "operator": "in", "value": ["a@example.com", "b@example.com"] }))
                .await;
            assert_eq!(resp.json::<LookupResponse>().digests.len(), 2);
        }

        #[tokio::test]
        async fn lookup_on_unindexed_field_rejected() {
            let server = server();
            let resp = server
                .post("/fields/person.name/lookup")
                .json(&json!({ "operator": "exact", "value": "Alice" }))
                .await;
            resp.assert_status_bad_request();
            assert_eq!(resp.json::<ErrorResponse>().code, "unsupported_lookup");
        }

        #[tokio::test]
        async fn unsupported_operator_reported_before_value_parsing() {
            let server = server();
            for (field, body) in [
                ("person.email", json!({ "operator": "isnull", "value": true })),
                ("person.name", json!({ "operator": "gte", "value": 12 })),
            ] {
                let resp = server
                    .post(&format!("/fields/{field}/lookup"))
                    .json(&body)
                    .await;
                resp.assert_status_bad_request();
                let err = resp.json::<ErrorResponse>();
                assert_eq!(err.code, "unsupported_lookup", "{field}: {}", err.message);
                assert!(err.message.contains(field), "{}", err.message);
                assert!(err.message.contains(body["operator"].as_str().unwrap()));
            }
        }

        #[tokio::test]
        async fn tampered_value_is_unprocessable() {
            let server = server();
            let stored = encode(&server, "person.name", json!("Alice")).await;
            let mut bytes = URL_SAFE_NO_PAD.decode(stored).unwrap();
            let last = bytes.len() - 1;
            bytes[last] ^= 0x01;

            let resp = server
                .post("/fields/person.name/decode")
                .json(&json!({ "stored": URL_SAFE_NO_PAD.encode(bytes) }))
                .await;
            resp.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(resp.json::<ErrorResponse>().code, "undecryptable");
        }

        #[tokio::test]
        async fn reencode_keeps_value_readable() {
            let server = server();
            let stored = encode(&server, "person.notes", json!("remember")).await;
            let resp = server
                .post("/fields/person.notes/reencode")
                .json(&json!({ "stored": stored }))
                .await;
            resp.assert_status_ok();
            let rotated = resp.json::<StoredResponse>().stored.unwrap();

            let resp = server
                .post("/fields/person.notes/decode")
                .json(&json!({ "stored": rotated }))
                .await;
            assert_eq!(resp.json::<DecodeResponse>().value, json!("remember"));
        }

        #[tokio::test]
        async fn unknown_field_is_404() {
            let server = server();
            let resp = server
                .post("/fields/person.ssn/encode")
                .json(&json!({ "value": "123" }))
                .await;
            resp.assert_status_not_found();
        }

        #[tokio::test]
        async fn plan_and_diff() {
            let server = server();
            let resp = server
                .post("/fields/person.email/index/plan")
                .json(&json!({ "table": "person", "column": "email" }))
                .await;
            let index = resp.json::<PlanIndexResponse>().index.unwrap();
            assert!(index.unique);
            assert_eq!(index.prefix_len, 32);

            let resp = server
                .post("/index/diff")
                .json(&json!({
                    "old": "unique",
                    "new": "none",
                    "table": "person",
                    "column": "email",
                    "existing": [index],
                }))
                .await;
            let diff = resp.json::<IndexDiff>();
            assert!(diff.create.is_none());
            assert!(diff.drop.unwrap().unique);

            // Already dropped: re-applying is a no-op.
            let resp = server
                .post("/index/diff")
                .json(&json!({
                    "old": "unique",
                    "new": "none",
                    "table": "person",
                    "column": "email",
                }))
                .await;
            assert!(resp.json::<IndexDiff>().is_noop());
        }
    }
}
