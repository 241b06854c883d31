//! Discord gateway integration.
//!
//! Receives messages over the serenity gateway, classifies them and adds the
//! resulting reactions back to the same message.

pub mod bot;
pub mod handler;
pub mod outbound;

pub use {
    bot::run,
    handler::{ReactionHandler, activity_data, incoming_message},
    outbound::MessageReactionSink,
};
