//! Shared types and error helpers used across the sweeney crates.

pub mod error;
pub mod types;

pub use {
    error::FromMessage,
    types::{Attachment, IncomingMessage},
};
