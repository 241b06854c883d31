//! Message classification.
//!
//! One message moves through three stages, each of which may end it:
//!
//! 1. messages from bots (including this one) are ignored;
//! 2. image attachments are scored against the template catalog and the
//!    first attachment/template pair above its threshold decides the result;
//! 3. otherwise every text trigger is tested against the message body, then
//!    against each attachment's OCR text.
//!
//! Nothing is shared between two classifications except the read-only
//! catalog and the adapters.

use std::{fmt, sync::Arc};

use {
    bytes::Bytes,
    futures::future::join_all,
    serde::Serialize,
    sweeney_common::{Attachment, IncomingMessage},
    sweeney_media::{AttachmentFetcher, TemplateMatcher},
    sweeney_ocr::{OcrProvider, OcrRequest},
    tracing::{debug, info, warn},
};

use crate::{Error, PatternCatalog, ReactionQueue, ReactionSpec, Result};

/// How a message was classified.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Classification {
    /// Authored by a bot; nothing was evaluated.
    Ignored,
    /// An attachment matched a template. Text triggers were skipped.
    ImageMatched {
        attachment_id: u64,
        template: String,
        score: f32,
        reaction: ReactionSpec,
    },
    /// Text triggers ran against the message body and OCR output.
    TextEvaluated { reactions: ReactionQueue },
}

impl Classification {
    #[must_use]
    pub fn into_queue(self) -> ReactionQueue {
        match self {
            Self::Ignored => ReactionQueue::new(),
            Self::ImageMatched { reaction, .. } => {
                let mut queue = ReactionQueue::new();
                queue.push(reaction);
                queue
            },
            Self::TextEvaluated { reactions } => reactions,
        }
    }
}

struct FetchedImage<'a> {
    attachment: &'a Attachment,
    data: Bytes,
}

/// Turns an [`IncomingMessage`] into a [`ReactionQueue`].
///
/// OCR and template matching are optional; leaving one out is how the
/// corresponding feature is disabled.
#[derive(Clone)]
pub struct ClassificationPipeline {
    catalog: Arc<PatternCatalog>,
    fetcher: Arc<dyn AttachmentFetcher>,
    ocr: Option<Arc<dyn OcrProvider>>,
    matcher: Option<Arc<dyn TemplateMatcher>>,
}

impl fmt::Debug for ClassificationPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassificationPipeline")
            .field("text_triggers", &self.catalog.text_triggers().len())
            .field("image_triggers", &self.catalog.image_triggers().len())
            .field("ocr", &self.ocr.as_ref().map(|o| o.id()))
            .field("image_matching", &self.matcher.is_some())
            .finish_non_exhaustive()
    }
}

impl ClassificationPipeline {
    pub fn new(catalog: Arc<PatternCatalog>, fetcher: Arc<dyn AttachmentFetcher>) -> Self {
        Self {
            catalog,
            fetcher,
            ocr: None,
            matcher: None,
        }
    }

    #[must_use]
    pub fn with_ocr(mut self, ocr: Arc<dyn OcrProvider>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn TemplateMatcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Reactions for `message`, in the order they should be applied.
    ///
    /// `bot_user_id` is this bot's own account, when known.
    pub async fn classify(
        &self,
        message: &IncomingMessage,
        bot_user_id: Option<u64>,
    ) -> Result<ReactionQueue> {
        Ok(self.evaluate(message, bot_user_id).await?.into_queue())
    }

    /// Like [`classify`](Self::classify) but reports which stage decided.
    ///
    /// Fails, and yields no reactions at all, when an image attachment cannot
    /// be downloaded, downloads as zero bytes, or cannot be decoded for
    /// template matching. OCR failures only blank that attachment's text.
    ///
    /// Without OCR and without image triggers to match, attachments are never
    /// downloaded, so an empty or unreachable attachment does not fail the
    /// message in that configuration.
    pub async fn evaluate(
        &self,
        message: &IncomingMessage,
        bot_user_id: Option<u64>,
    ) -> Result<Classification> {
        if message.author_is_bot || bot_user_id == Some(message.author_id) {
            debug!(author_id = message.author_id, "ignoring message from a bot");
            return Ok(Classification::Ignored);
        }

        let images = self.fetch_images(message).await?;

        if let Some(hit) = self.match_images(&images).await? {
            return Ok(hit);
        }

        let ocr_blocks = self.extract_text(&images).await;
        let reactions = self.evaluate_text(&message.text, &ocr_blocks);
        Ok(Classification::TextEvaluated { reactions })
    }

    fn needs_pixels(&self) -> bool {
        self.ocr.is_some()
            || (self.matcher.is_some() && !self.catalog.image_triggers().is_empty())
    }

    async fn fetch_images<'a>(&self, message: &'a IncomingMessage) -> Result<Vec<FetchedImage<'a>>> {
        if !self.needs_pixels() {
            return Ok(Vec::new());
        }

        let mut images = Vec::new();
        for attachment in message.image_attachments() {
            let data = self
                .fetcher
                .fetch(&attachment.url)
                .await
                .map_err(|source| Error::Fetch {
                    attachment_id: attachment.id,
                    source,
                })?;
            if data.is_empty() {
                return Err(Error::EmptyAttachment {
                    attachment_id: attachment.id,
                });
            }
            debug!(
                attachment_id = attachment.id,
                filename = %attachment.filename,
                bytes = data.len(),
                "fetched attachment"
            );
            images.push(FetchedImage { attachment, data });
        }
        Ok(images)
    }

    async fn match_images(&self, images: &[FetchedImage<'_>]) -> Result<Option<Classification>> {
        let Some(matcher) = &self.matcher else {
            return Ok(None);
        };
        let triggers = self.catalog.image_triggers();
        if triggers.is_empty() {
            return Ok(None);
        }
        let templates = self.catalog.templates();

        for image in images {
            let scores = matcher.score_all(image.data.clone(), &templates).await?;
            for (trigger, found) in triggers.iter().zip(scores) {
                let Some(found) = found else {
                    continue;
                };
                debug!(
                    attachment_id = image.attachment.id,
                    template = trigger.template().id(),
                    score = found.score,
                    threshold = trigger.threshold(),
                    "template scored"
                );
                if trigger.accepts(found.score) {
                    info!(
                        attachment_id = image.attachment.id,
                        template = trigger.template().id(),
                        score = found.score,
                        reaction = %trigger.reaction(),
                        "image matched template"
                    );
                    return Ok(Some(Classification::ImageMatched {
                        attachment_id: image.attachment.id,
                        template: trigger.template().id().to_string(),
                        score: found.score,
                        reaction: trigger.reaction().clone(),
                    }));
                }
            }
        }
        Ok(None)
    }

    /// One text block per image, in attachment order.
    async fn extract_text(&self, images: &[FetchedImage<'_>]) -> Vec<String> {
        let Some(ocr) = &self.ocr else {
            return Vec::new();
        };

        join_all(images.iter().map(|image| async move {
            match ocr.recognize(OcrRequest::new(image.data.clone())).await {
                Ok(text) => {
                    debug!(
                        attachment_id = image.attachment.id,
                        provider = ocr.id(),
                        chars = text.text.len(),
                        "extracted text"
                    );
                    text.text
                },
                Err(e) => {
                    warn!(
                        attachment_id = image.attachment.id,
                        provider = ocr.id(),
                        error = %e,
                        "text extraction failed"
                    );
                    String::new()
                },
            }
        }))
        .await
    }

    fn evaluate_text(&self, text: &str, ocr_blocks: &[String]) -> ReactionQueue {
        let mut queue = ReactionQueue::new();
        for trigger in self.catalog.text_triggers() {
            let source = if trigger.is_match(text) {
                "message"
            } else if ocr_blocks.iter().any(|block| trigger.is_match(block)) {
                "ocr"
            } else {
                continue;
            };

            let reaction = trigger.reaction();
            if queue.push(reaction.clone()) {
                debug!(%reaction, source, pattern = trigger.pattern(), "reaction queued");
            } else {
                debug!(%reaction, source, "already in reaction queue");
            }
        }
        queue
    }
}
