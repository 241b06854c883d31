use std::error::Error as StdError;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An image attachment downloaded as zero bytes. Aborts the whole message.
    #[error("attachment {attachment_id} downloaded as 0 bytes")]
    EmptyAttachment { attachment_id: u64 },

    /// Downloading an attachment failed. Aborts the whole message.
    #[error("failed to fetch attachment {attachment_id}: {source}")]
    Fetch {
        attachment_id: u64,
        #[source]
        source: sweeney_media::Error,
    },

    #[error(transparent)]
    Media(#[from] sweeney_media::Error),

    #[error("invalid trigger pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("invalid reaction `{raw}`: {reason}")]
    InvalidReaction { raw: String, reason: String },

    #[error("{message}")]
    InvalidInput { message: String },

    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn invalid_reaction(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReaction {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
