pub mod auth;
pub mod permission;
pub mod role;
pub mod shared;
pub mod user;
