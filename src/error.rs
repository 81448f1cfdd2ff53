//! Error handler for taskhub.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::database::StoreError;
use crate::user::{RegistrationError, ValidationError};

pub type Result<T> = std::result::Result<T, ServerError>;

const INTERNAL_SERVER_ERROR: &str = "Internal server error";

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ResponseError {
    #[serde(skip)]
    status: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `message` field.
    pub fn message(mut self, message: &str) -> Self {
        self.message = message.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            message: INTERNAL_SERVER_ERROR.to_owned(),
            errors: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue.to_string(),
            })
        })
        .collect()
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let bad_request = ResponseError::default().status(StatusCode::BAD_REQUEST);
        let conflict = ResponseError::default().status(StatusCode::CONFLICT);

        let response = match &self {
            ServerError::Validation(errors) => {
                let message = errors
                    .field_errors()
                    .values()
                    .flat_map(|issues| issues.iter())
                    .find_map(|issue| issue.message.as_deref().map(str::to_owned))
                    .unwrap_or_else(|| "Invalid request".to_owned());
                bad_request.message(&message).errors(errors)
            },

            ServerError::Axum(rejection) => {
                tracing::debug!(error = %rejection, "request body rejected");
                match rejection {
                    JsonRejection::JsonSyntaxError(_) => {
                        bad_request.message("Malformed JSON body")
                    },
                    JsonRejection::JsonDataError(_) => {
                        bad_request.message("Invalid JSON body")
                    },
                    _ => bad_request.message(&rejection.body_text()),
                }
            },

            ServerError::Registration(err) => match err {
                RegistrationError::Validation(ValidationError::MissingField) => {
                    bad_request.message("All fields are required")
                },
                RegistrationError::Validation(
                    ValidationError::InvalidEmailFormat,
                ) => bad_request.message("Invalid email format"),
                RegistrationError::EmailTaken => {
                    conflict.message("Email is already in use")
                },
                RegistrationError::NameTaken => {
                    conflict.message("Username is already in use")
                },
                RegistrationError::Store(_) | RegistrationError::Hash(_) => {
                    tracing::error!(error = %err, "server returned 500 status");
                    ResponseError::default()
                },
            },

            ServerError::Store(err) => {
                tracing::error!(error = %err, "server returned 500 status");
                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({ "message": INTERNAL_SERVER_ERROR })
                .to_string()
                .into(),
        )
        .unwrap_or_else(|_| Response::new(INTERNAL_SERVER_ERROR.into()))
}
