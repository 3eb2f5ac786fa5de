//! API Endpoint Tests
//!
//! Drives the full router in-memory with `tower::ServiceExt::oneshot` and
//! verifies the response envelope, error object shape, identifier formats
//! and the `inHeaders` negotiation flag across endpoints.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::util::ServiceExt;

use sema_gateway::{routes, AppState, ServerConfig};

/// Build an app with both built-ins activated and `wordcount` as default
async fn test_app() -> Router {
    let state = AppState::new(ServerConfig::default()).await;
    routes::api::create_api_router().with_state(state)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn post_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn home_without_parameters_asks_for_input() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["@type"], "error");
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "Missing or invalid parameters");
    assert_eq!(body["parameter"], "i");
}

#[tokio::test]
async fn analysis_with_default_plugin() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/?i=My%20aloha%20mohame").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("@context").is_some());
    assert!(body.get("entries").is_some());
    assert_eq!(body["analysis"][0], "plugins/wordcount_0.1");
    assert_eq!(body["entries"][0]["tokens"], 3);
}

#[tokio::test]
async fn analysis_with_explicit_algo() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/?i=My%20aloha%20mohame&algo=wordcount").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("@context").is_some());
    assert!(body.get("entries").is_some());
}

#[tokio::test]
async fn analysis_missing_plugin_required_parameter() {
    // `pattern` declares a required parameter with no default; omitting it
    // must be a 400, distinct from the unknown-plugin 404.
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/?i=My%20aloha%20mohame&algo=pattern").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["@type"], "error");
    assert_eq!(body["parameter"], "pattern");
}

#[tokio::test]
async fn analysis_with_plugin_parameter_supplied() {
    let app = test_app().await;
    let (status, body) =
        get_json(&app, "/api/?i=abc%20abc&algo=pattern&pattern=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn analysis_unknown_algo_is_404_error_object() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/?i=My%20aloha%20mohame&algo=DOESNOTEXIST").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["@type"], "error");
    assert_eq!(body["status"], 404);
    assert_eq!(body["plugin"], "DOESNOTEXIST");
}

#[tokio::test]
async fn list_plugins() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/plugins/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("@context").is_some());

    let plugins = body["plugins"].as_array().unwrap();
    assert!(plugins.len() > 1);
    assert!(plugins.iter().any(|p| p["name"] == "wordcount"));
    assert!(plugins.iter().any(|p| p["name"] == "pattern"));
    for plugin in plugins {
        assert_eq!(plugin["status"], "activated");
    }
}

#[tokio::test]
async fn negotiation_flag_across_endpoints() {
    let app = test_app().await;

    for base in ["/api/plugins/?nothing=", "/api/?i=test&"] {
        // Absent or "0": context block present.
        let (_, body) = get_json(&app, base).await;
        assert!(body.get("@context").is_some(), "{base}: missing @context");

        let (_, body) = get_json(&app, &format!("{base}&inHeaders=0")).await;
        assert!(body.get("@context").is_some());

        // "1" or "true": context block structurally absent.
        let (_, body) = get_json(&app, &format!("{base}&inHeaders=1")).await;
        assert!(body.get("@context").is_none(), "{base}: @context not omitted");

        let (_, body) = get_json(&app, &format!("{base}&inHeaders=true")).await;
        assert!(body.get("@context").is_none());

        // Anything else is falsy, not an error.
        let (status, body) = get_json(&app, &format!("{base}&inHeaders=yes")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("@context").is_some());
    }
}

#[tokio::test]
async fn plugin_detail_identifier() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/plugins/wordcount/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["@id"], "plugins/wordcount_0.1");
    assert_eq!(body["is_default"], true);
}

#[tokio::test]
async fn plugin_detail_tracks_usage_counters() {
    let app = test_app().await;

    let (_, body) = get_json(&app, "/api/plugins/wordcount/").await;
    assert_eq!(body["call_count"], 0);
    assert_eq!(body["error_count"], 0);

    get_json(&app, "/api/?i=one%20two").await;

    let (_, body) = get_json(&app, "/api/plugins/wordcount/").await;
    assert_eq!(body["call_count"], 1);
    assert_eq!(body["error_count"], 0);
}

#[tokio::test]
async fn plugin_detail_default_alias_matches_named_lookup() {
    let app = test_app().await;
    let (_, by_name) = get_json(&app, "/api/plugins/wordcount/").await;
    let (status, by_alias) = get_json(&app, "/api/plugins/default/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_alias["@id"], "plugins/wordcount_0.1");
    assert_eq!(by_alias, by_name);
}

#[tokio::test]
async fn plugin_detail_unknown_name_is_404() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/plugins/DOESNOTEXIST/").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["@type"], "error");
}

#[tokio::test]
async fn context_document() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/contexts/context.jsonld").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["@context"]["marl"],
        "http://www.gsi.dit.upm.es/ontologies/marl/ns#"
    );
}

#[tokio::test]
async fn schema_document() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/api/schemas/definitions.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("$schema").is_some());
}

#[tokio::test]
async fn lifecycle_over_http() {
    let app = test_app().await;

    // Deactivate the default plugin synchronously.
    let (status, body) = post_json(&app, "/api/plugins/wordcount/deactivate?sync=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "deactivated");

    // The default now fails closed instead of falling back to `pattern`.
    let (status, body) = get_json(&app, "/api/?i=test").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No default plugin available");

    // Naming the deactivated plugin explicitly is a 404.
    let (status, _) = get_json(&app, "/api/?i=test&algo=wordcount").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Reactivate and the default works again.
    let (status, body) = post_json(&app, "/api/plugins/wordcount/activate?sync=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "activated");

    let (status, _) = get_json(&app, "/api/?i=test").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn activate_unknown_plugin_is_404() {
    let app = test_app().await;
    let (status, body) = post_json(&app, "/api/plugins/DOESNOTEXIST/activate?sync=1").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["@type"], "error");
}

#[tokio::test]
async fn health_check() {
    let app = test_app().await;
    let (status, body) = get_json(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
