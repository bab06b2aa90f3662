use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::domain::identity::models::NewUser;
use crate::domain::identity::models::Password;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequestBody>,
) -> Result<ApiSuccess<RegisterResponseData>, ApiError> {
    let user_id = state
        .auth_service
        .register(body.into_new_user())
        .await
        .map_err(ApiError::from)?;

    Ok(ApiSuccess::new(
        StatusCode::CREATED,
        RegisterResponseData {
            message: "user registered successfully".to_string(),
            user_id: user_id.0,
        },
    ))
}

/// HTTP request body for registration (raw JSON).
///
/// Absent fields decode as empty strings and are rejected by the service.
#[derive(Clone, Deserialize)]
pub struct RegisterRequestBody {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

impl RegisterRequestBody {
    fn into_new_user(self) -> NewUser {
        NewUser::new(self.username, self.email, Password::new(self.password))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterResponseData {
    pub message: String,
    pub user_id: i64,
}
