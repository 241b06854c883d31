//! Trigger catalog: which text patterns and which template images map to
//! which reaction.

use std::{path::Path, sync::Arc};

use {
    regex::{Regex, RegexBuilder},
    sweeney_config::{ImageTriggerConfig, MatchingConfig, TextTriggerConfig, TriggersConfig},
    sweeney_media::Template,
    tracing::{debug, info},
};

use crate::{Error, ReactionSpec, Result};

/// A regular expression and the reaction it earns.
#[derive(Debug, Clone)]
pub struct TextTrigger {
    pattern: Regex,
    reaction: ReactionSpec,
}

impl TextTrigger {
    pub fn new(pattern: &str, case_insensitive: bool, reaction: ReactionSpec) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source: Box::new(source),
            })?;
        Ok(Self { pattern, reaction })
    }

    pub fn from_config(config: &TextTriggerConfig) -> Result<Self> {
        let reaction = ReactionSpec::parse(&config.reaction, config.custom)?;
        Self::new(&config.pattern, config.case_insensitive, reaction)
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn reaction(&self) -> &ReactionSpec {
        &self.reaction
    }
}

/// A template image, the reaction it earns and the score it must beat.
#[derive(Debug, Clone)]
pub struct ImageTrigger {
    template: Arc<Template>,
    reaction: ReactionSpec,
    threshold: f32,
}

impl ImageTrigger {
    /// `threshold` must lie in `(0, 1]`.
    pub fn new(template: Arc<Template>, reaction: ReactionSpec, threshold: f32) -> Result<Self> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::invalid_input(format!(
                "threshold for template {} must be in (0, 1], got {threshold}",
                template.id()
            )));
        }
        Ok(Self {
            template,
            reaction,
            threshold,
        })
    }

    /// Load the template from disk. Relative paths resolve against `base`.
    pub fn from_config(config: &ImageTriggerConfig, base: &Path) -> Result<Self> {
        let reaction = ReactionSpec::parse(&config.reaction, config.custom)?;
        let path = if config.template.is_absolute() {
            config.template.clone()
        } else {
            base.join(&config.template)
        };
        let template = Template::load(&path)?;
        debug!(
            template = template.id(),
            width = template.image().width(),
            height = template.image().height(),
            "loaded template"
        );
        Self::new(Arc::new(template), reaction, config.threshold)
    }

    /// Whether `score` counts as a match. Strictly greater than the threshold.
    #[must_use]
    pub fn accepts(&self, score: f32) -> bool {
        score > self.threshold
    }

    pub fn template(&self) -> &Arc<Template> {
        &self.template
    }

    pub fn reaction(&self) -> &ReactionSpec {
        &self.reaction
    }

    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

/// Immutable trigger set shared by every classification.
///
/// Order matters: text triggers are evaluated and enqueued in catalog order,
/// and the first image trigger to match wins.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    text: Vec<TextTrigger>,
    image: Vec<ImageTrigger>,
}

impl PatternCatalog {
    #[must_use]
    pub fn new(text: Vec<TextTrigger>, image: Vec<ImageTrigger>) -> Self {
        Self { text, image }
    }

    /// Build the catalog from config.
    ///
    /// Template files are only read when `load_templates` is set; with image
    /// matching off the image section is ignored entirely. Any bad pattern,
    /// reaction or template fails the whole build.
    pub fn from_config(
        triggers: &TriggersConfig,
        matching: &MatchingConfig,
        load_templates: bool,
    ) -> Result<Self> {
        let text = triggers
            .text
            .iter()
            .map(TextTrigger::from_config)
            .collect::<Result<Vec<_>>>()?;

        let image = if load_templates {
            triggers
                .image
                .iter()
                .map(|config| ImageTrigger::from_config(config, &matching.template_dir))
                .collect::<Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        info!(
            text_triggers = text.len(),
            image_triggers = image.len(),
            "trigger catalog ready"
        );
        Ok(Self::new(text, image))
    }

    pub fn text_triggers(&self) -> &[TextTrigger] {
        &self.text
    }

    pub fn image_triggers(&self) -> &[ImageTrigger] {
        &self.image
    }

    /// Templates in image-trigger order.
    #[must_use]
    pub fn templates(&self) -> Vec<Arc<Template>> {
        self.image.iter().map(|t| Arc::clone(&t.template)).collect()
    }
}
