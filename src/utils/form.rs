// src/utils/form.rs

use std::borrow::Cow;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, header},
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use serde_path_to_error::Segment;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::AppError;

/// JSON body of a form submission.
///
/// Unlike `axum::Json`, a missing or mistyped field is reported as a
/// field-level `AppError::Validation`, the same shape `validate()` produces.
/// Malformed JSON stays a plain `BadRequest`.
#[derive(Debug, Clone)]
pub struct FormJson<T>(pub T);

impl<T, S> FromRequest<S> for FormJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(AppError::BadRequest(
                "Expected request with `Content-Type: application/json`".to_string(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        parse(&bytes).map(FormJson)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Deserializes a form body, mapping data errors onto the offending field.
pub fn parse<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(field_error)?;
    deserializer.end()?;

    Ok(value)
}

fn field_error(err: serde_path_to_error::Error<serde_json::Error>) -> AppError {
    if err.inner().classify() != Category::Data {
        return AppError::from(err.into_inner());
    }

    let raw = err.inner().to_string();
    let message = raw
        .rsplit_once(" at line ")
        .map_or(raw.as_str(), |(message, _)| message);

    // A missing field is reported against its parent, so its name is only in the message.
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());

    let (field, error) = match missing {
        Some(name) => (
            name.to_string(),
            ValidationError::new("required").with_message("This field is required.".into()),
        ),
        None => {
            let name = err
                .path()
                .iter()
                .find_map(|segment| match segment {
                    Segment::Map { key } => Some(key.clone()),
                    _ => None,
                })
                .unwrap_or_else(|| "__all__".to_string());
            (
                name,
                ValidationError::new("invalid").with_message(Cow::Owned(message.to_string())),
            )
        }
    };

    let mut errors = ValidationErrors::new();
    errors
        .errors_mut()
        .insert(Cow::Owned(field), ValidationErrorsKind::Field(vec![error]));
    AppError::Validation(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[allow(dead_code)]
        title: String,
        #[allow(dead_code)]
        category_id: Option<i64>,
    }

    fn failing_fields(body: &str) -> Vec<String> {
        match parse::<Sample>(body.as_bytes()) {
            Err(AppError::Validation(errors)) => {
                errors.errors().keys().map(|k| k.to_string()).collect()
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn missing_field_is_named() {
        assert_eq!(failing_fields(r#"{"category_id": 1}"#), vec!["title"]);
    }

    #[test]
    fn mistyped_field_is_named() {
        assert_eq!(
            failing_fields(r#"{"title": "x", "category_id": "abc"}"#),
            vec!["category_id"]
        );
    }

    #[test]
    fn syntax_error_is_bad_request() {
        assert!(matches!(
            parse::<Sample>(br#"{"title": "x""#),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse::<Sample>(br#"{"title": "x"} trailing"#),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn content_type_must_be_json() {
        let mut headers = HeaderMap::new();
        assert!(!is_json(&headers));
        headers.insert(header::CONTENT_TYPE, "text/plain".parse().unwrap());
        assert!(!is_json(&headers));
        headers.insert(
            header::CONTENT_TYPE,
            "application/json; charset=utf-8".parse().unwrap(),
        );
        assert!(is_json(&headers));
    }
}
