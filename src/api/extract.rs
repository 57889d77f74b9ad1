//! JSON and path extractors whose rejections are [`Error::Validation`].
//!
//! Malformed bodies and path ids answer with the same JSON error shape as
//! every other failure, attributed to the offending top-level field.

use axum::body::Bytes;
use axum::extract::path::ErrorKind;
use axum::extract::rejection::PathRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Payload field names a body or path error can be attributed to.
const FIELDS: &[&str] = &[
    "name",
    "years_experience",
    "breed",
    "salary",
    "cat",
    "cat_id",
    "catId",
    "completed",
    "targets",
    "notes",
    "id",
    "mission_id",
    "target_id",
];

/// JSON request body and response. The request content type is not
/// checked.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::validation("body", e.body_text()))?;
        parse_body(&bytes).map(Json)
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Path parameters.
#[derive(Debug)]
pub struct Path<T>(pub T);

impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => Err(path_error(rejection)),
        }
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| {
        let path = e.path().to_string();
        let inner = e.into_inner();
        let message = inner.to_string();
        let field = missing_field(&message)
            .and_then(known_field)
            .or_else(|| known_field(head(&path)))
            .unwrap_or("body");
        if path == "." {
            Error::validation(field, message)
        } else {
            Error::validation(field, format!("{path}: {message}"))
        }
    })?;
    de.end()
        .map_err(|e| Error::validation("body", e.to_string()))?;
    Ok(value)
}

fn path_error(rejection: PathRejection) -> Error {
    let field = match &rejection {
        PathRejection::FailedToDeserializePathParams(e) => match e.kind() {
            ErrorKind::ParseErrorAtKey { key, .. } => known_field(key),
            _ => None,
        },
        _ => None,
    };
    Error::validation(field.unwrap_or("id"), rejection.body_text())
}

/// First segment of a path like `targets[0].name`.
fn head(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or_default()
}

/// The name in serde's "missing field `x`" message.
fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.split('`').next()
}

fn known_field(name: &str) -> Option<&'static str> {
    FIELDS.iter().copied().find(|f| *f == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewCat, NewMission, NotesUpdate};

    fn field_of<T: DeserializeOwned + std::fmt::Debug>(body: &str) -> &'static str {
        match parse_body::<T>(body.as_bytes()) {
            Err(Error::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn negative_salary_is_attributed_to_salary() {
        let body = r#"{"name":"Tom","years_experience":1,"breed":"Bengal","salary":"-5"}"#;
        assert_eq!(field_of::<NewCat>(body), "salary");
    }

    #[test]
    fn negative_experience_is_attributed() {
        let body = r#"{"name":"Tom","years_experience":-1,"breed":"Bengal","salary":"5"}"#;
        assert_eq!(field_of::<NewCat>(body), "years_experience");
    }

    #[test]
    fn missing_field_is_attributed() {
        assert_eq!(field_of::<NewMission>(r#"{"cat":null}"#), "targets");
        assert_eq!(field_of::<NotesUpdate>("{}"), "notes");
    }

    #[test]
    fn nested_error_names_top_level_field() {
        let body = r#"{"targets":[{"name":"A","country":7}]}"#;
        match parse_body::<NewMission>(body.as_bytes()) {
            Err(Error::Validation { field, message }) => {
                assert_eq!(field, "targets");
                assert!(message.starts_with("targets[0].country"), "{message}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn broken_json_is_a_body_error() {
        assert_eq!(field_of::<NotesUpdate>("not json"), "body");
        assert_eq!(field_of::<NotesUpdate>(r#"{"notes":"x"} trailing"#), "body");
    }

    #[test]
    fn valid_body_parses() {
        let update: NotesUpdate = parse_body(br#"{"notes":"seen"}"#).unwrap();
        assert_eq!(update.notes, "seen");
    }

    #[test]
    fn head_takes_first_segment() {
        assert_eq!(head("targets[1].name"), "targets");
        assert_eq!(head("salary"), "salary");
        assert_eq!(head("."), "");
    }
}
