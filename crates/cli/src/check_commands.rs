//! `sweeney check`: configuration and environment report.
//!
//! Prints one section per concern with `[ok]`, `[warn]`, `[fail]`, `[skip]`
//! or `[info]` per item. Exits non-zero when anything failed.

use std::path::Path;

use {
    anyhow::Result,
    sweeney_config::{FeatureFlags, SweeneyConfig, resolve_token},
    sweeney_ocr::OcrProvider,
    sweeney_reactions::PatternCatalog,
};

use crate::setup;

// ── ANSI helpers ────────────────────────────────────────────────────────────

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Ok,
    Warn,
    Fail,
    Skip,
    Info,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Info => "info",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Ok => GREEN,
            Self::Warn => YELLOW,
            Self::Fail => RED,
            Self::Skip => DIM,
            Self::Info => CYAN,
        }
    }
}

struct CheckItem {
    status: Status,
    message: String,
}

struct Section {
    title: String,
    items: Vec<CheckItem>,
}

impl Section {
    fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }

    fn push(&mut self, status: Status, message: impl Into<String>) {
        self.items.push(CheckItem {
            status,
            message: message.into(),
        });
    }

    fn count(&self, status: Status) -> usize {
        self.items.iter().filter(|i| i.status == status).count()
    }
}

fn print_report(sections: &[Section]) -> (usize, usize) {
    for section in sections {
        eprintln!("{BOLD}{}{RESET}", section.title);
        for item in &section.items {
            let color = item.status.color();
            let label = item.status.label();
            eprintln!("  [{color}{label}{RESET}]  {}", item.message);
        }
        eprintln!();
    }

    let errors = sections.iter().map(|s| s.count(Status::Fail)).sum();
    let warnings = sections.iter().map(|s| s.count(Status::Warn)).sum();
    (errors, warnings)
}

pub async fn handle_check(config: &SweeneyConfig, flags: FeatureFlags) -> Result<()> {
    eprintln!("{BOLD}sweeney check{RESET}");
    eprintln!("{BOLD}============={RESET}\n");

    let sections = vec![
        check_discord(config),
        check_features(config, flags),
        check_ocr(config, flags).await,
        check_catalog(config, flags),
    ];

    let (errors, warnings) = print_report(&sections);
    eprintln!("{BOLD}Summary:{RESET} {errors} error(s), {warnings} warning(s)");

    if errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn check_discord(config: &SweeneyConfig) -> Section {
    let mut section = Section::new("Discord");
    match resolve_token(&config.discord) {
        Ok(_) => section.push(Status::Ok, "bot token found"),
        Err(e) => section.push(Status::Warn, format!("bot token: {e}")),
    }
    section.push(
        Status::Info,
        format!(
            "activity: {:?} \"{}\"",
            config.discord.activity.kind, config.discord.activity.text
        ),
    );
    section.push(
        Status::Info,
        format!("reaction delay: {} ms", config.discord.reaction_delay_ms),
    );
    section
}

fn check_features(config: &SweeneyConfig, flags: FeatureFlags) -> Section {
    let mut section = Section::new(format!(
        "Features (sentinels in {})",
        config.features.sentinel_dir.display()
    ));
    let state = |on: bool| if on { "on" } else { "off" };
    section.push(Status::Info, format!("ocr: {}", state(flags.ocr)));
    section.push(
        Status::Info,
        format!("image matching: {}", state(flags.image_matching)),
    );
    section.push(
        Status::Info,
        format!("gateway log: {}", state(flags.gateway_log)),
    );
    section
}

async fn check_ocr(config: &SweeneyConfig, flags: FeatureFlags) -> Section {
    let mut section = Section::new("OCR");
    if !flags.ocr {
        section.push(Status::Skip, "ocr disabled");
        return section;
    }

    let tesseract = setup::tesseract(&config.ocr);
    if !tesseract.is_configured() {
        section.push(Status::Warn, "tesseract not found, ocr will be disabled");
        return section;
    }
    match tesseract.version().await {
        Ok(version) => section.push(Status::Ok, version),
        Err(e) => section.push(Status::Warn, format!("tesseract version: {e}")),
    }

    section.push(
        Status::Info,
        format!(
            "language {}, engine mode {}",
            config.ocr.language,
            config.ocr.engine_mode.oem()
        ),
    );
    match config.ocr.tessdata_dir.as_deref().map(Path::new) {
        Some(dir) if dir.is_dir() => {
            section.push(Status::Ok, format!("tessdata: {}", dir.display()));
        },
        Some(dir) => section.push(
            Status::Info,
            format!("tessdata {} not found, using engine default", dir.display()),
        ),
        None => section.push(Status::Info, "tessdata: engine default"),
    }
    section
}

fn check_catalog(config: &SweeneyConfig, flags: FeatureFlags) -> Section {
    let mut section = Section::new("Triggers");
    match setup::catalog(config, flags) {
        Ok(catalog) => describe_catalog(&mut section, &catalog, config, flags),
        Err(e) => section.push(Status::Fail, format!("{e:#}")),
    }
    section
}

fn describe_catalog(
    section: &mut Section,
    catalog: &PatternCatalog,
    config: &SweeneyConfig,
    flags: FeatureFlags,
) {
    if catalog.text_triggers().is_empty() {
        section.push(Status::Warn, "no text triggers");
    }
    for trigger in catalog.text_triggers() {
        section.push(
            Status::Ok,
            format!("text /{}/ → {}", trigger.pattern(), trigger.reaction()),
        );
    }

    if !flags.image_matching {
        if !config.triggers.image.is_empty() {
            section.push(
                Status::Skip,
                format!(
                    "{} image trigger(s) ignored, image matching disabled",
                    config.triggers.image.len()
                ),
            );
        }
        return;
    }
    for trigger in catalog.image_triggers() {
        let (width, height) = trigger.template().image().dimensions();
        section.push(
            Status::Ok,
            format!(
                "image {} ({width}x{height}) > {} → {}",
                trigger.template().id(),
                trigger.threshold(),
                trigger.reaction()
            ),
        );
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, sweeney_config::ImageTriggerConfig};

    fn flags(image_matching: bool) -> FeatureFlags {
        FeatureFlags {
            ocr: false,
            image_matching,
            gateway_log: false,
        }
    }

    #[test]
    fn builtin_catalog_is_reported() {
        let section = check_catalog(&SweeneyConfig::default(), flags(true));
        assert_eq!(section.count(Status::Ok), 2);
        assert_eq!(section.count(Status::Fail), 0);
        assert!(section.items[1].message.ends_with("→ 🚀"));
    }

    #[test]
    fn broken_template_fails_the_check() {
        let mut config = SweeneyConfig::default();
        config.triggers.image.push(ImageTriggerConfig {
            template: "/definitely/not/here.png".into(),
            reaction: "tim".into(),
            custom: true,
            threshold: 0.8,
        });

        assert_eq!(check_catalog(&config, flags(true)).count(Status::Fail), 1);

        let skipped = check_catalog(&config, flags(false));
        assert_eq!(skipped.count(Status::Fail), 0);
        assert_eq!(skipped.count(Status::Skip), 1);
    }

    #[tokio::test]
    async fn disabled_ocr_is_skipped() {
        let section = check_ocr(&SweeneyConfig::default(), flags(false)).await;
        assert_eq!(section.count(Status::Skip), 1);
    }

    #[test]
    fn report_counts_failures_and_warnings() {
        let mut section = Section::new("t");
        section.push(Status::Fail, "a");
        section.push(Status::Warn, "b");
        section.push(Status::Warn, "c");
        section.push(Status::Ok, "d");
        assert_eq!(print_report(&[section]), (1, 2));
    }
}
