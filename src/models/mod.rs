pub mod token;
pub mod user;

pub use token::{AuthResponse, RefreshResponse, SessionToken};
pub use user::{Permission, Profile, Role, RoleAndPermissions};
