//! Media handling: attachment download, image decoding, template matching.

pub mod error;
pub mod fetch;
pub mod image_ops;
pub mod template;

pub use {
    error::{Error, Result},
    fetch::{AttachmentFetcher, FileFetcher, HttpFetcher},
    template::{CorrelationMatcher, MatchScore, Template, TemplateMatcher},
};
