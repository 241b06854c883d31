/// Config schema types (discord, features, ocr, matching, fetch, triggers).
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeneyConfig {
    pub discord: DiscordConfig,
    pub features: FeaturesConfig,
    pub ocr: OcrConfig,
    pub matching: MatchingConfig,
    pub fetch: FetchConfig,
    pub triggers: TriggersConfig,
}

/// Discord bot account settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Bot token. Usually left unset in favour of `token_file`.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// File holding the bot token. Defaults to `token` in the working directory.
    pub token_file: PathBuf,
    /// Presence shown once the gateway session is ready.
    pub activity: ActivityConfig,
    /// Pause between two reactions on the same message (ms). Defaults to 250.
    pub reaction_delay_ms: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: None,
            token_file: PathBuf::from("token"),
            activity: ActivityConfig::default(),
            reaction_delay_ms: 250,
        }
    }
}

/// Bot presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub kind: ActivityKind,
    pub text: String,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            kind: ActivityKind::Competing,
            text: "Epic v Apple".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Playing,
    Listening,
    Watching,
    #[default]
    Competing,
    Custom,
}

/// Feature toggles. Sentinel files in `sentinel_dir` override these, see
/// [`crate::FeatureFlags`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Run OCR on image attachments. Defaults to true.
    pub ocr: bool,
    /// Match image attachments against templates. Defaults to true.
    pub image_matching: bool,
    /// Let gateway library logs through at the global level. Defaults to false.
    pub gateway_log: bool,
    /// Directory checked for sentinel files. Defaults to the working directory.
    pub sentinel_dir: PathBuf,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            ocr: true,
            image_matching: true,
            gateway_log: false,
            sentinel_dir: PathBuf::from("."),
        }
    }
}

/// Tesseract settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Explicit path to the `tesseract` binary. Falls back to `PATH`.
    pub binary: Option<String>,
    /// Trained data directory. Ignored when it does not exist.
    pub tessdata_dir: Option<String>,
    /// Language identifier passed to the engine. Defaults to "eng".
    pub language: String,
    pub engine_mode: EngineMode,
    /// Page segmentation mode (`--psm`), engine default when unset.
    pub page_seg_mode: Option<u8>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            binary: None,
            tessdata_dir: Some("./tessdata".into()),
            language: "eng".into(),
            engine_mode: EngineMode::default(),
            page_seg_mode: None,
        }
    }
}

/// Tesseract OCR engine mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    TesseractOnly,
    LstmOnly,
    TesseractAndLstm,
    /// Whatever the installed engine considers best.
    #[default]
    Default,
}

impl EngineMode {
    /// Numeric value for tesseract's `--oem` flag.
    #[must_use]
    pub fn oem(self) -> u8 {
        match self {
            Self::TesseractOnly => 0,
            Self::LstmOnly => 1,
            Self::TesseractAndLstm => 2,
            Self::Default => 3,
        }
    }
}

/// Template matching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Base directory for relative template paths. Defaults to "templates".
    pub template_dir: PathBuf,
    /// Longest attachment side scanned before downscaling. Defaults to 512.
    pub max_dimension: u32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            max_dimension: 512,
        }
    }
}

/// Attachment download limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds. Defaults to 30.
    pub timeout_secs: u64,
    /// Largest accepted attachment body. Defaults to 25 MiB.
    pub max_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Trigger catalog.
///
/// Omitting `text` keeps the built-in triggers; an explicit empty list
/// disables text triggers entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggersConfig {
    #[serde(default = "default_text_triggers")]
    pub text: Vec<TextTriggerConfig>,
    pub image: Vec<ImageTriggerConfig>,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            text: default_text_triggers(),
            image: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextTriggerConfig {
    /// Regular expression tested against message text and OCR output.
    pub pattern: String,
    /// Emoji name (custom) or glyph / `:shortcode:` (standard).
    pub reaction: String,
    /// Whether `reaction` names a server emoji.
    #[serde(default)]
    pub custom: bool,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageTriggerConfig {
    /// Template image path, relative to `matching.template_dir` unless absolute.
    pub template: PathBuf,
    pub reaction: String,
    #[serde(default)]
    pub custom: bool,
    /// Minimum similarity score, in (0, 1].
    pub threshold: f32,
}

fn default_text_triggers() -> Vec<TextTriggerConfig> {
    vec![
        TextTriggerConfig {
            pattern: r"\bepic\b|\bunreal\b|\btilted\b|\bfortnite\b|sween|\bswinny\b|\bfort\b|\bnite\b|jenkin|\bjames\b|\beric\b|\bswussy\b|\btim\b|\btimato\b|\bfirtnite\b".into(),
            reaction: "tim".into(),
            custom: true,
            case_insensitive: true,
        },
        TextTriggerConfig {
            pattern: r"\bblazing\b|\bblazing fast\b|\bmemory safe\b|\bblazingly fast\b".into(),
            reaction: ":rocket:".into(),
            custom: false,
            case_insensitive: true,
        },
    ]
}

fn default_true() -> bool {
    true
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let cfg = SweeneyConfig::default();
        assert_eq!(cfg.discord.reaction_delay_ms, 250);
        assert_eq!(cfg.discord.token_file, PathBuf::from("token"));
        assert_eq!(cfg.discord.activity.kind, ActivityKind::Competing);
        assert_eq!(cfg.discord.activity.text, "Epic v Apple");
        assert_eq!(cfg.ocr.language, "eng");
        assert_eq!(cfg.ocr.engine_mode.oem(), 3);
        assert!(cfg.features.ocr && cfg.features.image_matching);
        assert!(!cfg.features.gateway_log);
        assert_eq!(cfg.triggers.text.len(), 2);
        assert!(cfg.triggers.image.is_empty());
    }

    #[test]
    fn image_section_alone_keeps_builtin_text_triggers() {
        let cfg: SweeneyConfig = toml::from_str(
            r#"
            [[triggers.image]]
            template = "tim.jpg"
            reaction = "tim"
            custom = true
            threshold = 0.8
            "#,
        )
        .unwrap();
        assert_eq!(cfg.triggers.text, default_text_triggers());
        assert_eq!(cfg.triggers.image.len(), 1);
        assert_eq!(cfg.triggers.image[0].template, PathBuf::from("tim.jpg"));
    }

    #[test]
    fn explicit_empty_text_list_disables_builtins() {
        let cfg: SweeneyConfig = toml::from_str("[triggers]\ntext = []\n").unwrap();
        assert!(cfg.triggers.text.is_empty());
    }

    #[test]
    fn text_trigger_defaults() {
        let cfg: SweeneyConfig = toml::from_str(
            r#"
            [[triggers.text]]
            pattern = "ferris"
            reaction = "🦀"
            "#,
        )
        .unwrap();
        let trigger = &cfg.triggers.text[0];
        assert!(!trigger.custom);
        assert!(trigger.case_insensitive);
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let cfg = DiscordConfig {
            token: Some(Secret::new("super-secret-token".into())),
            ..Default::default()
        };
        let debug = format!("{cfg:?}");
        assert!(!debug.contains("super-secret-token"));
    }

    #[test]
    fn engine_mode_from_yaml() {
        let cfg: SweeneyConfig = serde_yaml::from_str("ocr:\n  engine_mode: lstm_only\n").unwrap();
        assert_eq!(cfg.ocr.engine_mode, EngineMode::LstmOnly);
        assert_eq!(cfg.ocr.engine_mode.oem(), 1);
    }
}
