//! `userdesk-client`
//!
//! **Responsibility:** talk to the remote user-directory API on behalf of a
//! signed-in administrator.
//!
//! This crate provides:
//! - Client-side session persistence (token + profile snapshot)
//! - A JSON request client with bearer-token injection and a uniform error policy
//! - The auth session manager (login, logout, validate, refresh, restore)
//! - A typed client for the `users` collection
//!
//! The remote API is the only authority; nothing but the session is stored locally.

pub mod auth;
pub mod config;
pub mod context;
pub mod http;
pub mod session;
pub mod storage;
pub mod users;

pub use auth::{AuthSession, SessionState};
pub use config::{ClientConfig, SessionStorage};
pub use context::ClientContext;
pub use http::{RequestClient, RequestOptions};
pub use session::SessionStore;
pub use storage::{DetachedStorage, KeyValueStorage, MemoryStorage, SqliteStorage};
pub use users::UsersClient;
