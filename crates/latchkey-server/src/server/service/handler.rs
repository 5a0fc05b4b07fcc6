use crate::server::{
    service::{AppState, error::ApiError},
    telemetry::{
        increment_credentials_issued, increment_issuance_errors, increment_validation_errors,
        record_validation,
    },
};
use axum::{
    Json,
    extract::{RawQuery, State},
    http::StatusCode,
};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct IssueResponse {
    pub username: String,
    pub password: String,
    pub endpoint: String,
}

/// `GET /auth`: mints a credential and the endpoint it is meant for.
pub async fn issue(State(state): State<AppState>) -> Result<Json<IssueResponse>, ApiError> {
    let issued = state
        .issuer
        .issue()
        .await
        .inspect_err(|_| increment_issuance_errors())?;
    increment_credentials_issued();

    Ok(Json(IssueResponse {
        username: issued.credential.username,
        password: issued.credential.password,
        endpoint: issued.endpoint,
    }))
}

/// `POST /auth?username=..&password=..`: `200` when the pair is live, `401`
/// otherwise.
pub async fn validate(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<StatusCode, ApiError> {
    let (username, password) = credential_params(query.as_deref().unwrap_or_default())?;

    let accepted = state
        .validator
        .validate(&username, &password)
        .await
        .inspect_err(|_| increment_validation_errors())?;
    record_validation(accepted);

    Ok(if accepted {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    })
}

/// `GET /_status`: liveness only, the store is not consulted.
pub async fn status() -> &'static str {
    "OK"
}

/// Extracts exactly one `username` and one `password` from a query string.
fn credential_params(query: &str) -> Result<(String, String), ApiError> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
        .map_err(|_| ApiError::BadRequest("malformed query string"))?;

    let mut username = None;
    let mut password = None;
    for (key, value) in pairs {
        let slot = match key.as_str() {
            "username" => &mut username,
            "password" => &mut password,
            _ => continue,
        };
        if slot.replace(value).is_some() {
            return Err(ApiError::BadRequest("parameter given more than once"));
        }
    }

    match (username, password) {
        (Some(u), Some(p)) => Ok((u, p)),
        _ => Err(ApiError::BadRequest("username and password are required")),
    }
}
