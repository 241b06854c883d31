//! Tesseract OCR provider.
//!
//! Wraps the `tesseract` command-line tool. The image is written to a
//! temporary file and the recognized text is read from stdout.
//!
//! Installation:
//! - Debian/Ubuntu: `apt install tesseract-ocr tesseract-ocr-eng`
//! - macOS: `brew install tesseract`

use std::{ffi::OsString, path::Path, process::Stdio};

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    tokio::process::Command,
    tracing::debug,
};

use crate::{OcrProvider, OcrRequest, OcrText, cli_utils};

/// Binary name for the tesseract CLI.
const BINARY_NAME: &str = "tesseract";

/// Tesseract CLI provider.
#[derive(Clone, Debug)]
pub struct TesseractCli {
    binary_path: Option<String>,
    tessdata_dir: Option<String>,
    language: String,
    engine_mode: u8,
    page_seg_mode: Option<u8>,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new()
    }
}

impl TesseractCli {
    /// English, default engine mode, binary from PATH.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary_path: None,
            tessdata_dir: None,
            language: "eng".into(),
            engine_mode: 3,
            page_seg_mode: None,
        }
    }

    /// Create with custom options.
    #[must_use]
    pub fn with_options(
        binary_path: Option<String>,
        tessdata_dir: Option<String>,
        language: impl Into<String>,
        engine_mode: u8,
        page_seg_mode: Option<u8>,
    ) -> Self {
        Self {
            binary_path,
            tessdata_dir,
            language: language.into(),
            engine_mode,
            page_seg_mode,
        }
    }

    fn find_binary(&self) -> Option<std::path::PathBuf> {
        cli_utils::find_binary(BINARY_NAME, self.binary_path.as_deref())
    }

    /// The configured tessdata directory, when it exists.
    fn tessdata_dir(&self) -> Option<std::path::PathBuf> {
        self.tessdata_dir
            .as_deref()
            .map(cli_utils::expand_tilde)
            .filter(|p| p.is_dir())
    }

    fn build_args(&self, input: &Path, language: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            input.into(),
            "stdout".into(),
            "-l".into(),
            language.into(),
            "--oem".into(),
            self.engine_mode.to_string().into(),
        ];
        if let Some(psm) = self.page_seg_mode {
            args.push("--psm".into());
            args.push(psm.to_string().into());
        }
        if let Some(dir) = self.tessdata_dir() {
            args.push("--tessdata-dir".into());
            args.push(dir.into());
        }
        args
    }

    /// Version string reported by the installed engine (e.g. "tesseract 5.3.0").
    pub async fn version(&self) -> Result<String> {
        let binary = self
            .find_binary()
            .ok_or_else(|| anyhow!("tesseract binary not found in PATH"))?;
        let output = Command::new(&binary)
            .arg("--version")
            .output()
            .await
            .context("failed to execute tesseract")?;

        // Older releases print the banner on stderr.
        [&output.stdout, &output.stderr]
            .into_iter()
            .filter_map(|stream| {
                String::from_utf8_lossy(stream)
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map(str::to_string)
            })
            .next()
            .ok_or_else(|| anyhow!("tesseract --version printed nothing"))
    }
}

#[async_trait]
impl OcrProvider for TesseractCli {
    fn id(&self) -> &'static str {
        "tesseract"
    }

    fn name(&self) -> &'static str {
        "Tesseract OCR"
    }

    fn is_configured(&self) -> bool {
        self.find_binary().is_some()
    }

    async fn recognize(&self, request: OcrRequest) -> Result<OcrText> {
        let binary = self
            .find_binary()
            .ok_or_else(|| anyhow!("tesseract binary not found in PATH"))?;

        if request.image.is_empty() {
            return Err(anyhow!("cannot run OCR on an empty image"));
        }

        let temp_file = cli_utils::write_temp_image(&request.image)?;
        let language = request.language.as_deref().unwrap_or(&self.language);

        let mut cmd = Command::new(&binary);
        cmd.args(self.build_args(temp_file.path(), language));
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().await.context("failed to execute tesseract")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = text.len(), language, "tesseract finished");

        Ok(OcrText {
            text,
            language: Some(language.to_string()),
        })
    }
}
