//! Session state: the token store and the session context built on top of it.

pub mod context;
pub mod token_store;

pub use context::{SessionContext, SessionSnapshot};
pub use token_store::TokenStore;
