use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use super::error::{ApiError, FieldError};

/// JSON extractor that runs `validator` checks before the handler sees the
/// payload. Rejections surface as a `Validation` error with field messages.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(e.body_text()))?;

        value.validate().map_err(|errs| {
            let errors = errs
                .field_errors()
                .into_iter()
                .flat_map(|(field, errors)| {
                    errors.iter().map(move |e| FieldError {
                        field: field.to_string(),
                        message: e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("invalid {}", field)),
                    })
                })
                .collect();

            ApiError::Validation {
                message: "Validation failed".to_string(),
                errors,
            }
        })?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Validate)]
    struct SignupForm {
        #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
        name: String,
        #[validate(email(message = "Please enter a valid email"))]
        email: String,
    }

    #[tokio::test]
    async fn collects_field_messages() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                r#"{"name":"x","email":"not-an-email"}"#,
            ))
            .unwrap();

        let rejection = ValidatedJson::<SignupForm>::from_request(req, &())
            .await
            .err()
            .expect("payload should be rejected");

        match rejection {
            ApiError::Validation { message, errors } => {
                assert_eq!(message, "Validation failed");
                assert_eq!(errors.len(), 2);
                assert!(errors.iter().any(|e| e.field == "name"));
                assert!(errors.iter().any(|e| e.field == "email"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn passes_valid_payloads_through() {
        let req = Request::builder()
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                r#"{"name":"Ada","email":"ada@example.com"}"#,
            ))
            .unwrap();

        let ValidatedJson(form) = ValidatedJson::<SignupForm>::from_request(req, &())
            .await
            .expect("payload should pass");
        assert_eq!(form.name, "Ada");
    }
}
