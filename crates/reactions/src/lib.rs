//! Message classification: turn one chat message into an ordered,
//! de-duplicated list of emoji reactions, then apply them.
//!
//! Text triggers are checked against the message body first and against OCR
//! output second. An image trigger matching any attachment short-circuits
//! all text evaluation.

pub mod catalog;
pub mod dispatch;
pub mod error;
pub mod pipeline;
pub mod queue;
pub mod reaction;

pub use {
    catalog::{ImageTrigger, PatternCatalog, TextTrigger},
    dispatch::{DEFAULT_REACTION_DELAY, DispatchReport, ReactionDispatcher, ReactionSink},
    error::{Error, Result},
    pipeline::{Classification, ClassificationPipeline},
    queue::ReactionQueue,
    reaction::ReactionSpec,
};
