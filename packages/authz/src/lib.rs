//! Authorization core: who may do what.
//!
//! [`Actor`] answers permission questions through a [`PermissionLookup`],
//! [`Gate`] binds one permission key in front of an action, and
//! [`navigation::build`] prunes the menu for the current viewer.

pub mod actor;
pub mod gate;
pub mod lookup;
pub mod navigation;

#[cfg(test)]
mod memory;

pub use actor::{Actor, ActorRole};
pub use gate::{Decision, Gate, GateError};
pub use lookup::PermissionLookup;
pub use navigation::{Access, NavItem, NavSection};
