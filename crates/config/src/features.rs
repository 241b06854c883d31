//! Feature toggles resolved once at startup.
//!
//! A sentinel file only has to exist; its contents are never read.

use std::path::Path;

use {serde::Serialize, tracing::debug};

use crate::schema::FeaturesConfig;

/// Presence disables OCR.
pub const DISABLE_OCR_SENTINEL: &str = "disableOCR";
/// Presence disables template matching.
pub const DISABLE_IMAGE_MATCHING_SENTINEL: &str = "disableCV";
/// Presence lets gateway library logs through.
pub const GATEWAY_LOG_SENTINEL: &str = "shouldLog";

/// Immutable feature switches handed to the pipeline and telemetry setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureFlags {
    pub ocr: bool,
    pub image_matching: bool,
    pub gateway_log: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            ocr: true,
            image_matching: true,
            gateway_log: false,
        }
    }
}

impl FeatureFlags {
    /// Combine config values with sentinel files in `features.sentinel_dir`.
    pub fn resolve(features: &FeaturesConfig) -> Self {
        Self::resolve_in(features, &features.sentinel_dir)
    }

    /// Same as [`FeatureFlags::resolve`] with an explicit sentinel directory.
    pub fn resolve_in(features: &FeaturesConfig, dir: &Path) -> Self {
        let present = |name: &str| dir.join(name).exists();

        let flags = Self {
            ocr: features.ocr && !present(DISABLE_OCR_SENTINEL),
            image_matching: features.image_matching && !present(DISABLE_IMAGE_MATCHING_SENTINEL),
            gateway_log: features.gateway_log || present(GATEWAY_LOG_SENTINEL),
        };
        debug!(dir = %dir.display(), ?flags, "resolved feature flags");
        flags
    }
}
