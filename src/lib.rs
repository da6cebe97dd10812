//! Deliberately vulnerable user and credit management API.
//!
//! A lab target for security training exercises: the missing authorization
//! on by-ID lookups, the mass-assignable profile update and the
//! non-validating token scheme are all intentional. Do not deploy this
//! anywhere that matters.

pub mod auth;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

pub use error::AppError;
