use super::{CallableEcho, HttpEcho, registry};
use crate::callable::InvocationContext;
use crate::function::Endpoint;
use crate::{CALLABLE_ECHO_NAME, HTTP_ECHO_NAME, Payload};
use bytes::Bytes;
use http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};

fn request_with_body(body: Payload) -> Request<Payload> {
    Request::builder()
        .method(Method::POST)
        .uri("/echoBodyHttp")
        .body(body)
        .unwrap()
}

fn context_with_auth() -> InvocationContext {
    InvocationContext {
        auth: Some("token".to_string()),
        remote_addr: Some("10.0.0.1:4000".parse().unwrap()),
        ..Default::default()
    }
}

fn nested(depth: usize) -> Payload {
    (0..depth).fold(json!({"leaf": [1.5, "s", null]}), |inner, level| {
        json!({ "level": level, "zeta": inner.clone(), "alpha": [inner] })
    })
}

#[tokio::test]
async fn test_callable_echo_returns_payload() {
    let payload = json!({"x": 1, "y": [true, null]});
    let result = CallableEcho.invoke(payload.clone(), InvocationContext::default()).await;
    assert_eq!(result, payload);
}

#[tokio::test]
async fn test_callable_echo_ignores_context() {
    let payload = json!(["a", 2, {"b": false}]);
    let plain = CallableEcho.invoke(payload.clone(), InvocationContext::default()).await;
    let with_auth = CallableEcho.invoke(payload.clone(), context_with_auth()).await;
    assert_eq!(plain, payload);
    assert_eq!(with_auth, payload);
}

#[tokio::test]
async fn test_callable_echo_scalars_and_empty_object() {
    for payload in [json!({}), json!(null), json!(42), json!(-1.25), json!("s"), json!([])] {
        let result = CallableEcho.invoke(payload.clone(), InvocationContext::default()).await;
        assert_eq!(result, payload);
    }
}

#[tokio::test]
async fn test_callable_echo_is_idempotent() {
    let payload = nested(4);
    let first = CallableEcho.invoke(payload.clone(), InvocationContext::default()).await;
    let second = CallableEcho.invoke(payload.clone(), InvocationContext::default()).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_http_echo_string_body() {
    let response = HttpEcho.handle(request_with_body(json!("hello"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body(), &json!("hello"));
}

#[tokio::test]
async fn test_http_echo_empty_object() {
    let response = HttpEcho.handle(request_with_body(json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.into_body(), json!({}));
}

#[tokio::test]
async fn test_http_echo_keeps_nested_key_order() {
    let body = nested(6);
    let response = HttpEcho.handle(request_with_body(body.clone())).await;

    let sent = serde_json::to_string(&body).unwrap();
    let echoed = serde_json::to_string(response.body()).unwrap();
    assert_eq!(echoed, sent);
}

#[tokio::test]
async fn test_registry_serves_both_echoes() {
    let registry = registry();

    let (_, callable) = registry.resolve(&format!("/{CALLABLE_ECHO_NAME}")).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echoBody")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from_static(br#"{"data":{"x":1,"y":[true,null]}}"#))
        .unwrap();
    let response = callable.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(body, json!({"result": {"x": 1, "y": [true, null]}}));

    let (_, http) = registry.resolve(&format!("/{HTTP_ECHO_NAME}")).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echoBodyHttp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from_static(br#""hello""#))
        .unwrap();
    let response = http.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.body().as_ref(), br#""hello""#);
}

#[tokio::test]
async fn test_registry_echoes_payloads_deeper_than_serde_default() {
    let registry = registry();
    let deep = (0..300).fold(json!(0), |inner, i| json!({ "depth": i, "inner": [inner] }));
    let body = crate::payload::to_vec(&json!({ "data": deep.clone() })).unwrap();

    let (_, callable) = registry.resolve(CALLABLE_ECHO_NAME).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echoBody")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(body))
        .unwrap();
    let response = callable.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let answer = crate::payload::from_slice(response.body()).unwrap();
    assert_eq!(answer, json!({ "result": deep.clone() }));

    let (_, http) = registry.resolve(HTTP_ECHO_NAME).unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/echoBodyHttp")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Bytes::from(crate::payload::to_vec(&deep).unwrap()))
        .unwrap();
    let response = http.serve(request, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(crate::payload::from_slice(response.body()).unwrap(), deep);
}
