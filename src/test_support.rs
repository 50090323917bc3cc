//! Helpers for driving the router in tests.

use axum::{
    body::Body,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method, Request, StatusCode,
    },
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub async fn raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header(AUTHORIZATION, token);
    }
    let req = match body {
        Some(body) => req
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => req.body(Body::empty()),
    }
    .expect("request builds");
    app.clone().oneshot(req).await.expect("router is infallible")
}

pub async fn body_json(res: Response) -> Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .expect("body readable");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let res = raw(app, method, uri, token, body).await;
    let status = res.status();
    (status, body_json(res).await)
}

pub fn signup_body(name: &str, username: &str, email: &str, password: &str) -> Value {
    json!({ "data": { "attributes": {
        "name": name,
        "username": username,
        "email": email,
        "password": password,
    }}})
}

/// Event envelope; `extra` is merged into the attributes.
pub fn event_body(title: &str, extra: Value) -> Value {
    let mut attributes = json!({
        "title": title,
        "description": "An event",
        "location": "Main hall",
        "date_time": "2030-01-01T18:00:00Z",
    });
    if let (Some(map), Value::Object(extra)) = (attributes.as_object_mut(), extra) {
        map.extend(extra);
    }
    json!({ "data": { "attributes": attributes } })
}

/// Sign up and return the new user's id.
pub async fn signup(app: &Router, name: &str, username: &str, email: &str, password: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/api/signup",
        None,
        Some(signup_body(name, username, email, password)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["user"]["id"].as_i64().expect("user id")
}

/// Log in by username and return the token.
pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/api/login",
        None,
        Some(json!({ "data": { "attributes": {
            "username": username,
            "password": password,
        }}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["token"].as_str().expect("token").to_string()
}
