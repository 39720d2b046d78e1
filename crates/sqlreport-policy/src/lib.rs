//! SqlReport access control.
//!
//! Decisions are pure functions of the principal, the resource (with its ACL
//! entries and its folder's entries already loaded) and the requested action.
//! The resolver performs no I/O and holds no mutable state.

pub mod resolver;

pub use resolver::{AccessControlResolver, AccessDecision, DecisionReason};
