use super::{Callable, Endpoint, FunctionRegistry, HttpHandler, Https};
use crate::Payload;
use crate::callable::{CallableHandler, FunctionsErrorCode, HttpsError, InvocationContext};
use async_trait::async_trait;
use bytes::Bytes;
use http::{Method, Request, Response, StatusCode, header};
use serde_json::{Value, json};

/// Returns the caller's bearer token instead of the payload
struct WhoAmI;

#[async_trait]
impl CallableHandler for WhoAmI {
    async fn invoke(&self, _payload: Payload, context: InvocationContext) -> Result<Payload, HttpsError> {
        match context.auth {
            Some(token) => Ok(json!({ "token": token })),
            None => Err(HttpsError::new(FunctionsErrorCode::Unauthenticated, "no token")),
        }
    }
}

/// Answers every request with 201 and a fixed body
struct Created;

#[async_trait]
impl HttpHandler for Created {
    async fn handle(&self, _request: Request<Payload>) -> Response<Payload> {
        let mut response = Response::new(json!({"created": true}));
        *response.status_mut() = StatusCode::CREATED;
        response
    }
}

fn json_body(response: &Response<Bytes>) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

fn post(uri: &str, content_type: &str, body: &str) -> Request<Bytes> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

#[test]
fn test_registry_resolves_by_last_segment() {
    let registry = FunctionRegistry::new().callable("whoAmI", WhoAmI);

    assert!(registry.resolve("/whoAmI").is_some());
    assert!(registry.resolve("/demo-project/us-central1/whoAmI").is_some());
    assert!(registry.resolve("/whoAmI/").is_some());
    assert!(registry.resolve("/whoAmI?x=1").is_some());
    assert!(registry.resolve("/other").is_none());
    assert!(registry.resolve("/").is_none());

    let (name, _) = registry.resolve("/whoAmI").unwrap();
    assert_eq!(name, "whoAmI");
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn test_callable_passes_context_to_handler() {
    let endpoint = Callable::new(WhoAmI);
    let mut request = post("/whoAmI", "application/json", r#"{"data": null}"#);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "Bearer t0k3n".parse().unwrap());

    let response = endpoint.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(&response), json!({"result": {"token": "t0k3n"}}));
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_callable_handler_error_maps_to_status() {
    let endpoint = Callable::new(WhoAmI);
    let request = post("/whoAmI", "application/json", r#"{"data": {}}"#);

    let response = endpoint.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(&response),
        json!({"error": {"status": "UNAUTHENTICATED", "message": "no token"}})
    );
}

#[tokio::test]
async fn test_callable_rejects_get() {
    let endpoint = Callable::new(WhoAmI);
    let request = Request::builder()
        .method(Method::GET)
        .uri("/whoAmI")
        .body(Bytes::new())
        .unwrap();

    let response = endpoint.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&response)["error"]["status"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_callable_answers_preflight() {
    let endpoint = Callable::new(WhoAmI);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/whoAmI")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Bytes::new())
        .unwrap();

    let response = endpoint.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn test_https_keeps_handler_status_and_sets_json_type() {
    let endpoint = Https::new(Created);
    let response = endpoint.serve(post("/created", "application/json", "{}"), None).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json; charset=utf-8"
    );
    assert_eq!(json_body(&response), json!({"created": true}));
}

#[tokio::test]
async fn test_https_rejects_unparseable_json() {
    let endpoint = Https::new(Created);
    let response = endpoint.serve(post("/created", "application/json", "{oops"), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = String::from_utf8(response.body().to_vec()).unwrap();
    assert!(text.contains("invalid JSON body"));
}
