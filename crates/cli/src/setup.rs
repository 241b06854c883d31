//! Building the pipeline and the bot from config.

use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    sweeney_config::{FeatureFlags, FetchConfig, OcrConfig, SweeneyConfig, resolve_token},
    sweeney_discord::ReactionHandler,
    sweeney_media::{AttachmentFetcher, CorrelationMatcher, HttpFetcher},
    sweeney_ocr::{OcrProvider, TesseractCli},
    sweeney_reactions::{ClassificationPipeline, PatternCatalog, ReactionDispatcher},
    tracing::{info, warn},
};

/// Explicit path wins; otherwise discover, falling back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<SweeneyConfig> {
    match path {
        Some(path) => sweeney_config::load_config(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(sweeney_config::discover_and_load()),
    }
}

pub fn tesseract(config: &OcrConfig) -> TesseractCli {
    TesseractCli::with_options(
        config.binary.clone(),
        config.tessdata_dir.clone(),
        config.language.clone(),
        config.engine_mode.oem(),
        config.page_seg_mode,
    )
}

/// The OCR provider, or `None` when OCR is disabled or tesseract is missing.
pub async fn ocr_provider(config: &OcrConfig, enabled: bool) -> Option<Arc<dyn OcrProvider>> {
    if !enabled {
        info!("ocr disabled");
        return None;
    }

    let tesseract = tesseract(config);
    if !tesseract.is_configured() {
        warn!("tesseract not found, ocr disabled");
        return None;
    }
    match tesseract.version().await {
        Ok(version) => info!(%version, language = %config.language, "ocr enabled"),
        Err(e) => warn!(error = %e, "could not read tesseract version"),
    }
    Some(Arc::new(tesseract))
}

pub fn catalog(config: &SweeneyConfig, flags: FeatureFlags) -> Result<PatternCatalog> {
    PatternCatalog::from_config(&config.triggers, &config.matching, flags.image_matching)
        .context("failed to build trigger catalog")
}

pub fn http_fetcher(config: &FetchConfig) -> Result<HttpFetcher> {
    HttpFetcher::new(Duration::from_secs(config.timeout_secs), config.max_bytes)
        .context("failed to build http client")
}

pub async fn pipeline(
    config: &SweeneyConfig,
    flags: FeatureFlags,
    fetcher: Arc<dyn AttachmentFetcher>,
) -> Result<ClassificationPipeline> {
    let catalog = Arc::new(catalog(config, flags)?);
    let mut pipeline = ClassificationPipeline::new(catalog, fetcher);

    if let Some(ocr) = ocr_provider(&config.ocr, flags.ocr).await {
        pipeline = pipeline.with_ocr(ocr);
    }

    if flags.image_matching {
        info!(
            max_dimension = config.matching.max_dimension,
            "image matching enabled"
        );
        pipeline =
            pipeline.with_matcher(Arc::new(CorrelationMatcher::new(config.matching.max_dimension)));
    } else {
        info!("image matching disabled");
    }

    Ok(pipeline)
}

/// Start the Discord bot and block until it stops.
pub async fn run(config: &SweeneyConfig, flags: FeatureFlags) -> Result<()> {
    let token = resolve_token(&config.discord).context("failed to resolve discord token")?;
    let fetcher = Arc::new(http_fetcher(&config.fetch)?);
    let pipeline = pipeline(config, flags, fetcher).await?;
    let dispatcher =
        ReactionDispatcher::new(Duration::from_millis(config.discord.reaction_delay_ms));
    let handler = ReactionHandler::new(pipeline, dispatcher, &config.discord.activity);
    sweeney_discord::run(&token, handler).await
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        sweeney_common::IncomingMessage,
        sweeney_config::ImageTriggerConfig,
        sweeney_media::FileFetcher,
    };

    fn flags(ocr: bool, image_matching: bool) -> FeatureFlags {
        FeatureFlags {
            ocr,
            image_matching,
            gateway_log: false,
        }
    }

    fn with_missing_template() -> SweeneyConfig {
        let mut config = SweeneyConfig::default();
        config.triggers.image.push(ImageTriggerConfig {
            template: "/definitely/not/here.png".into(),
            reaction: "tim".into(),
            custom: true,
            threshold: 0.8,
        });
        config
    }

    #[test]
    fn explicit_config_path_must_exist() {
        let err = load_config(Some(Path::new("/definitely/not/here/sweeney.toml"))).unwrap_err();
        assert!(err.to_string().starts_with("failed to load config"));
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweeney.toml");
        std::fs::write(&path, "[discord]\nreaction_delay_ms = 10\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.discord.reaction_delay_ms, 10);
    }

    #[test]
    fn tesseract_options_follow_config() {
        let provider = tesseract(&OcrConfig::default());
        assert_eq!(provider.id(), "tesseract");
    }

    #[test]
    fn missing_template_only_matters_with_image_matching() {
        let config = with_missing_template();
        assert!(catalog(&config, flags(false, true)).is_err());
        assert!(catalog(&config, flags(false, false)).is_ok());
    }

    #[tokio::test]
    async fn disabled_ocr_has_no_provider() {
        assert!(ocr_provider(&OcrConfig::default(), false).await.is_none());
    }

    #[tokio::test]
    async fn text_only_pipeline_classifies() {
        let pipeline = pipeline(
            &SweeneyConfig::default(),
            flags(false, false),
            Arc::new(FileFetcher::default()),
        )
        .await
        .unwrap();
        let queue = pipeline
            .classify(&IncomingMessage::new(1, "Unreal is blazing"), None)
            .await
            .unwrap();
        assert_eq!(queue.names(), ["tim", "🚀"]);
    }
}
