pub mod signin;
pub mod status;
pub mod task;

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::ServerError;

/// JSON body checked with [`Validate`] before reaching the handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct Valid<T>(pub T);

impl<T, S> FromRequest<S> for Valid<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

#[cfg(test)]
pub(crate) fn state(
    accounts: std::sync::Arc<crate::user::memory::MemoryAccountStore>,
    tasks: std::sync::Arc<crate::task::memory::MemoryTaskStore>,
) -> crate::AppState {
    use std::sync::Arc;

    use metrics_exporter_prometheus::PrometheusBuilder;

    crate::AppState {
        config: Arc::new(crate::config::Configuration::default()),
        accounts,
        tasks,
        pwd: Arc::new(crate::crypto::tests::weak_manager()),
        metrics: PrometheusBuilder::new().build_recorder().handle(),
    }
}
