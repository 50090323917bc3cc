//! Request body binding.
//!
//! Bodies arrive wrapped as `{"data":{"attributes":{...}}}`. [`Payload`]
//! unwraps the envelope, deserializes the attributes and runs
//! [`Validate`] before the handler sees them.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Attributes<T>,
}

#[derive(Debug, Deserialize)]
struct Attributes<T> {
    attributes: T,
}

/// Field-level checks beyond what deserialization enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Validated request attributes.
#[derive(Debug)]
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(envelope) = Json::<Envelope<T>>::from_request(req, state)
            .await
            .map_err(|rejection| {
                warn!(error = %rejection.body_text(), "request body rejected");
                AppError::validation("body", rejection.body_text())
            })?;
        let attributes = envelope.data.attributes;
        attributes.validate()?;
        Ok(Payload(attributes))
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(field, "is required"));
    }
    Ok(())
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header::CONTENT_TYPE};

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), AppError> {
            require("name", &self.name)
        }
    }

    fn request(body: &str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn unwraps_envelope() {
        let Payload(named) =
            Payload::<Named>::from_request(request(r#"{"data":{"attributes":{"name":"x"}}}"#), &())
                .await
                .expect("valid payload");
        assert_eq!(named.name, "x");
    }

    #[tokio::test]
    async fn rejects_missing_envelope_and_fields() {
        for body in [
            r#"{"name":"x"}"#,
            r#"{"data":{"attributes":{}}}"#,
            r#"{"data":{"attributes":{"name":"  "}}}"#,
            "not json",
        ] {
            let err = Payload::<Named>::from_request(request(body), &())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation { .. }), "body {body}");
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("ann@x.com"));
        assert!(!is_valid_email("ann"));
        assert!(!is_valid_email("ann@x"));
        assert!(!is_valid_email("a nn@x.com"));
    }
}
