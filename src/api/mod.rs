//! Typed admin endpoints. All of them go through [`crate::client::ApiClient`]
//! and so share its token refresh behavior.

pub mod roles;
pub mod stats;
pub mod users;

pub use roles::{RoleDraft, RoleRecord, RolesApi};
pub use stats::{ExportFormat, RoleCount, Stats, StatsApi};
pub use users::{NewUser, Pagination, UserPage, UserQuery, UserRecord, UserUpdate, UsersApi};
