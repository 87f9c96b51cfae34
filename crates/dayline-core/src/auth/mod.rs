//! Authentication module
//!
//! User accounts, password hashing and bearer tokens.

pub mod password;
mod service;
mod store;
mod token;
mod user;

pub use service::AuthService;
pub use store::UserStore;
pub use token::{Claims, TokenIssuer};
pub use user::{Identity, LoginGrant, User, UserProfile};
