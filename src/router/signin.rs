//! Account registration.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::AppState;
use crate::error::{Result, ServerError};
use crate::user::{PublicAccount, RegistrationError, ValidationError};

const CREATED: &str = "Created successfully";

/// Missing fields are kept as `None` so they get reported as such rather
/// than as a malformed body. Field rules live in the registration
/// workflow.
#[derive(Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Body {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Body")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("name", &self.name)
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct Response {
    pub message: String,
    pub user: PublicAccount,
}

/// Handler to create an account.
pub async fn handler(
    State(state): State<AppState>,
    body: std::result::Result<Json<Body>, JsonRejection>,
) -> Result<(StatusCode, Json<Response>)> {
    // A field that is not a string, or a body that is not an object, is
    // treated as a missing field.
    let Json(body) = body.map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(_) => ServerError::from(
            RegistrationError::from(ValidationError::MissingField),
        ),
        rejection => ServerError::from(rejection),
    })?;

    let account = state
        .registrar()
        .register(
            body.email.as_deref(),
            body.password.as_deref(),
            body.name.as_deref(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            message: CREATED.to_owned(),
            user: account.into(),
        }),
    ))
}
