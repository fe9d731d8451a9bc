//! `userdesk-core`: wire types and error model shared by every userdesk crate.
//!
//! This crate contains **no I/O**: it describes what travels over the wire to
//! the user-directory API and how failures are classified.

pub mod error;
pub mod id;
pub mod profile;
pub mod user;

pub use error::{ApiError, ApiResult, AuthError};
pub use id::UserId;
pub use profile::{LoginCredentials, LoginResponse, RefreshRequest, RefreshResponse, UserProfile};
pub use user::{ID_FIELD, NewUser, UserFilter, UserPage, UserPatch, UserRecord};
