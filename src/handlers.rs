//! HTTP surface of the lab: router plus all user and credit handlers.
//!
//! Only `GET /api/users` looks at the Authorization header. Every other
//! route is reachable without credentials, which is the point of the
//! exercise.

use crate::auth::{extract_bearer_token, issue_token, validate_and_extract_user_id};
use crate::db::Database;
use crate::error::AppError;
use crate::models::{
    CreditLimitUpdated, CreditResponse, CreditsAdded, LoginRequest, LoginResponse, ProfileUpdate,
    UserResponse,
};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

/// Build the API router
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/users", get(list_users))
        .route("/api/users/{user_id}", get(get_user_by_id))
        .route("/api/users/{user_id}", put(update_user_profile))
        .route("/api/users/{user_id}/credits", get(get_user_credits))
        .route("/api/users/{user_id}/credits", post(modify_user_credits))
        .with_state(Arc::new(state))
}

/// Exchange email and password for a bearer token.
///
/// No rate limiting, no lockout, and suspended accounts log in fine.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .db
        .find_by_email(&req.email)?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let parsed_hash =
        PasswordHash::new(&user.password_hash).map_err(|e| AppError::Internal(e.to_string()))?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::warn!(email = req.email, "Failed login attempt");
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!(user_id = user.id, "Login succeeded");

    let token = issue_token(&user.id)?;
    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
    }))
}

/// Return the caller's own record, wrapped in a one-element array because
/// the frontend reads `data[0]`.
///
/// The header check is real; the token check behind it is not (see
/// `auth::validate_and_extract_user_id`).
async fn list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(extract_bearer_token)
        .ok_or_else(|| {
            AppError::Unauthorized("Missing or invalid Authorization header".to_string())
        })?;

    let user_id = validate_and_extract_user_id(token)
        .ok_or_else(|| AppError::Forbidden("Invalid or expired token".to_string()))?;

    let user = state
        .db
        .find_by_id(&user_id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(vec![UserResponse::from(&user)]))
}

/// VULNERABLE: full record lookup by ID with no authorization.
///
/// Phone, address, role and account status all go out to whoever asks.
async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    tracing::warn!(user_id = user_id, "Unauthenticated by-ID lookup");

    let user = state
        .db
        .find_by_id(&user_id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(&user)))
}

/// VULNERABLE: partial profile update with no field whitelist.
///
/// Whatever the body carries gets written, `role`, `isAdmin` and
/// `accountStatus` included.
async fn update_user_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<UserResponse>, AppError> {
    tracing::warn!(user_id = user_id, "Unauthenticated profile update");

    let mut user = state
        .db
        .find_by_id(&user_id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(name) = update.name {
        user.name = name;
    }
    if let Some(phone) = update.phone {
        user.phone = phone;
    }
    if let Some(email) = update.email {
        user.email = email;
    }
    if let Some(address) = update.address {
        user.address = address;
    }
    if let Some(newsletter) = update.newsletter {
        user.newsletter = newsletter;
    }
    if let Some(promotions) = update.promotions {
        user.promotions = promotions;
    }
    if let Some(role) = update.role {
        tracing::warn!(
            user_id = user.id,
            role = role,
            "Role changed via profile update"
        );
        user.role = role;
    }
    if let Some(is_admin) = update.is_admin {
        tracing::warn!(
            user_id = user.id,
            is_admin = is_admin,
            "Admin flag changed via profile update"
        );
        user.is_admin = is_admin;
    }
    if let Some(account_status) = update.account_status {
        tracing::warn!(
            user_id = user.id,
            account_status = account_status,
            "Account status changed via profile update"
        );
        user.account_status = account_status;
    }

    state.db.update_user(&user)?;

    Ok(Json(UserResponse::from(&user)))
}

/// Credit limit lookup. No authorization; any caller can read any user's
/// limit by ID.
async fn get_user_credits(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<CreditResponse>, AppError> {
    tracing::warn!(user_id = user_id, "Unauthenticated credit lookup");

    let user = state
        .db
        .find_by_id(&user_id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let credit_limit_as_double = user.credit_limit_as_double();
    Ok(Json(CreditResponse {
        user_id: user.id,
        name: user.name,
        credit_limit: user.credit_limit,
        credit_limit_as_double,
    }))
}

/// VULNERABLE: replace or top up any user's credit limit, no authorization.
///
/// The body is read as a raw map so that a present-but-null key still
/// lands in the format-error arm. `creditLimit` wins when both keys are
/// sent.
async fn modify_user_credits(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let mut user = state
        .db
        .find_by_id(&user_id)?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if let Some(raw) = body.get("creditLimit") {
        let new_limit = coerce_decimal(raw, "Invalid credit limit format")?;

        tracing::warn!(
            user_id = user.id,
            new_limit = %new_limit,
            "Credit limit replaced without authorization"
        );

        user.credit_limit = new_limit;
        state.db.update_user(&user)?;

        let new_credit_limit_as_double = user.credit_limit_as_double();
        return Ok(Json(CreditLimitUpdated {
            message: "Credit limit updated successfully".to_string(),
            user_id: user.id,
            new_credit_limit: new_limit,
            new_credit_limit_as_double,
        })
        .into_response());
    }

    if let Some(raw) = body.get("addCredits") {
        let credits_to_add = coerce_decimal(raw, "Invalid credits to add format")?;

        let previous_credits = user.credit_limit;
        let new_limit = previous_credits
            .checked_add(credits_to_add)
            .ok_or_else(|| AppError::Internal("credit limit out of range".to_string()))?;

        tracing::warn!(
            user_id = user.id,
            credits_added = %credits_to_add,
            new_limit = %new_limit,
            "Credits added without authorization"
        );

        user.credit_limit = new_limit;
        state.db.update_user(&user)?;

        let new_credit_limit_as_double = user.credit_limit_as_double();
        return Ok(Json(CreditsAdded {
            message: "Credits added successfully".to_string(),
            user_id: user.id,
            credits_added: credits_to_add,
            previous_credits,
            new_credit_limit: new_limit,
            new_credit_limit_as_double,
        })
        .into_response());
    }

    Err(AppError::BadRequest(
        "No valid operation specified. Use 'creditLimit' to set or 'addCredits' to add".to_string(),
    ))
}

/// Coerce a JSON value into an exact decimal.
///
/// Numbers go through `f64` first and inherit its precision; strings
/// parse exactly, scientific notation included. Any other JSON type is a
/// format error with the arm-specific message.
fn coerce_decimal(raw: &Value, type_error: &str) -> Result<Decimal, AppError> {
    match raw {
        Value::Number(number) => {
            let as_double = number
                .as_f64()
                .ok_or_else(|| AppError::BadRequest("Invalid number format".to_string()))?;
            Decimal::from_f64(as_double)
                .ok_or_else(|| AppError::BadRequest("Invalid number format".to_string()))
        }
        Value::String(text) => Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| AppError::BadRequest("Invalid number format".to_string())),
        _ => Err(AppError::BadRequest(type_error.to_string())),
    }
}
