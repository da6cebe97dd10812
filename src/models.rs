//! Data models for the user and credit endpoints

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Claims carried by the bearer tokens.
///
/// Every field except `sub` is optional on decode so that hand-rolled
/// tokens still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (stamped at mint, never checked afterwards)
    #[serde(default)]
    pub exp: usize,
    /// Issued at
    #[serde(default)]
    pub iat: usize,
}

/// A user record as stored. `password_hash` never leaves the server.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub role: String,
    pub is_admin: bool,
    pub account_status: String,
    pub credit_limit: Decimal,
    pub newsletter: bool,
    pub promotions: bool,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

impl User {
    /// Lossy `f64` view of the credit limit, served alongside the exact value
    pub fn credit_limit_as_double(&self) -> f64 {
        self.credit_limit.to_f64().unwrap_or_default()
    }
}

/// Wire view of a user. Every stored column is exposed, including both
/// credit representations.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub role: String,
    pub is_admin: bool,
    pub account_status: String,
    pub credit_limit: Decimal,
    pub credit_limit_as_double: f64,
    pub newsletter: bool,
    pub promotions: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            email: user.email.clone(),
            address: user.address.clone(),
            role: user.role.clone(),
            is_admin: user.is_admin,
            account_status: user.account_status.clone(),
            credit_limit: user.credit_limit,
            credit_limit_as_double: user.credit_limit_as_double(),
            newsletter: user.newsletter,
            promotions: user.promotions,
        }
    }
}

/// Response for the credit lookup endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditResponse {
    pub user_id: String,
    pub name: String,
    pub credit_limit: Decimal,
    pub credit_limit_as_double: f64,
}

/// Response when the credit limit was replaced
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditLimitUpdated {
    pub message: String,
    pub user_id: String,
    pub new_credit_limit: Decimal,
    pub new_credit_limit_as_double: f64,
}

/// Response when credits were added on top of the current limit
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditsAdded {
    pub message: String,
    pub user_id: String,
    pub credits_added: Decimal,
    pub previous_credits: Decimal,
    pub new_credit_limit: Decimal,
    pub new_credit_limit_as_double: f64,
}

/// Partial profile update. Every field that is present gets applied as
/// sent, privileged ones included.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub newsletter: Option<bool>,
    pub promotions: Option<bool>,
    pub role: Option<String>,
    pub is_admin: Option<bool>,
    pub account_status: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}
