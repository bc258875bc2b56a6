pub mod permission;
pub mod role;
pub mod role_has_permission;
pub mod user;
