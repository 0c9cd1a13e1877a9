//! Shared types and error definitions used across all skilldock crates.

pub mod error;
pub mod identity;

pub use {
    error::{Context, Error, ErrorKind, Failure, FromMessage, Result},
    identity::UserIdentity,
};
