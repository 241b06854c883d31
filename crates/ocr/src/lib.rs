//! Optical character recognition for image attachments.
//!
//! Providers take raw image bytes and return whatever text they can find.
//! The default provider shells out to the `tesseract` CLI.

mod cli_utils;
mod tesseract;

pub use tesseract::TesseractCli;

use {
    anyhow::Result,
    async_trait::async_trait,
    bytes::Bytes,
    serde::{Deserialize, Serialize},
};

/// Request to extract text from one image.
#[derive(Debug, Clone)]
pub struct OcrRequest {
    /// Raw image data in any format the provider can decode.
    pub image: Bytes,
    /// Language override (tesseract language code, e.g. "eng", "deu").
    pub language: Option<String>,
}

impl OcrRequest {
    pub fn new(image: Bytes) -> Self {
        Self {
            image,
            language: None,
        }
    }
}

/// Recognized text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OcrText {
    /// Extracted text, possibly empty.
    pub text: String,
    /// Language the engine ran with.
    pub language: Option<String>,
}

impl OcrText {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// OCR provider trait.
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Provider identifier (e.g., "tesseract").
    fn id(&self) -> &'static str;

    /// Human-readable provider name.
    fn name(&self) -> &'static str;

    /// Check if the provider is configured and ready.
    fn is_configured(&self) -> bool;

    /// Extract text from an image.
    async fn recognize(&self, request: OcrRequest) -> Result<OcrText>;
}
