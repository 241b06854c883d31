use serde::{Deserialize, Serialize};

/// File extensions treated as images when a platform omits the content type.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// A chat message as seen by the classifier.
///
/// Platform adapters build this from their native message type; it is never
/// mutated once constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub author_id: u64,
    /// Whether the author is a bot account (including this bot).
    pub author_is_bot: bool,
    pub text: String,
    /// Attachments in the order the platform delivered them.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl IncomingMessage {
    pub fn new(author_id: u64, text: impl Into<String>) -> Self {
        Self {
            author_id,
            text: text.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Attachments that look like images, in delivery order.
    pub fn image_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_image())
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u64,
    pub filename: String,
    /// MIME type reported by the platform, when present.
    pub content_type: Option<String>,
    pub url: String,
}

impl Attachment {
    /// Whether the attachment should be treated as an image.
    ///
    /// The reported content type wins; the file extension is only consulted
    /// when no content type was supplied.
    pub fn is_image(&self) -> bool {
        match self.content_type.as_deref() {
            Some(ct) => ct.to_ascii_lowercase().contains("image"),
            None => self
                .filename
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_ascii_lowercase())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str())),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    fn attachment(filename: &str, content_type: Option<&str>) -> Attachment {
        Attachment {
            id: 1,
            filename: filename.into(),
            content_type: content_type.map(Into::into),
            url: format!("https://cdn.example.com/{filename}"),
        }
    }

    #[rstest]
    #[case("a.png", Some("image/png"), true)]
    #[case("a.bin", Some("image/jpeg"), true)]
    #[case("a.png", Some("application/pdf"), false)]
    #[case("a.JPG", None, true)]
    #[case("notes.txt", None, false)]
    #[case("noext", None, false)]
    fn detects_images(
        #[case] filename: &str,
        #[case] content_type: Option<&str>,
        #[case] expected: bool,
    ) {
        assert_eq!(attachment(filename, content_type).is_image(), expected);
    }

    #[test]
    fn image_attachments_keeps_order() {
        let msg = IncomingMessage::new(7, "hi")
            .with_attachment(attachment("one.png", Some("image/png")))
            .with_attachment(attachment("doc.pdf", Some("application/pdf")))
            .with_attachment(attachment("two.gif", None));
        let names: Vec<_> = msg.image_attachments().map(|a| a.filename.as_str()).collect();
        assert_eq!(names, vec!["one.png", "two.gif"]);
    }

    #[test]
    fn deserializes_without_attachments() {
        let msg: IncomingMessage =
            serde_json::from_str(r#"{"author_id": 1, "author_is_bot": false, "text": "x"}"#)
                .unwrap();
        assert!(msg.attachments.is_empty());
    }
}
