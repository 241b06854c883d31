//! Template matching.
//!
//! Scores are zero-mean normalized cross-correlation in `[-1, 1]`, the same
//! measure OpenCV calls `TM_CCOEFF_NORMED`. The correlation term is summed in
//! f64 against the mean-subtracted template; window variances come from
//! integer integral images, so bright low-contrast windows stay exact.

use std::{path::Path, sync::Arc};

use {
    async_trait::async_trait,
    bytes::Bytes,
    image::{GrayImage, ImageBuffer, Luma},
    imageproc::integral_image::{integral_image, integral_squared_image},
    tracing::debug,
};

use crate::{Error, Result, image_ops};

/// Largest attachment side scanned at full resolution.
pub const DEFAULT_MAX_DIMENSION: u32 = 512;

/// A reference image, decoded once and kept in grayscale.
#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    image: GrayImage,
}

impl Template {
    pub fn new(id: impl Into<String>, image: GrayImage) -> Self {
        Self {
            id: id.into(),
            image,
        }
    }

    /// Load a template from disk. The file name becomes the template id.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::external(format!("failed to read template {}", path.display()), e))?;
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(id, &data)
    }

    pub fn from_bytes(id: impl Into<String>, data: &[u8]) -> Result<Self> {
        Ok(Self::new(id, image_ops::decode_grayscale(data)?))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}

/// Best score of a template over an image and where it was found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub score: f32,
    /// Top-left corner of the best window, in scanned-image coordinates.
    pub location: (u32, u32),
}

/// Score `template` at every position of `haystack` and return the best.
///
/// `None` when the template is empty or does not fit inside the haystack.
/// Flat windows (zero variance) score 0.
pub fn best_match(haystack: &GrayImage, template: &GrayImage) -> Option<MatchScore> {
    let (hw, hh) = haystack.dimensions();
    let (tw, th) = template.dimensions();
    if tw == 0 || th == 0 || tw > hw || th > hh {
        return None;
    }

    let n = u128::from(tw) * u128::from(th);
    let t_mean = template.pixels().map(|p| f64::from(p[0])).sum::<f64>() / n as f64;
    let centered: Vec<f64> = template.pixels().map(|p| f64::from(p[0]) - t_mean).collect();
    let t_var: f64 = centered.iter().map(|v| v * v).sum();

    let sums = integral_image::<_, u64>(haystack);
    let sq_sums = integral_squared_image::<_, u64>(haystack);
    let window = |img: &ImageBuffer<Luma<u64>, Vec<u64>>, x: u32, y: u32| -> u128 {
        let at = |x: u32, y: u32| u128::from(img.get_pixel(x, y)[0]);
        (at(x + tw, y + th) + at(x, y)) - (at(x, y + th) + at(x + tw, y))
    };

    let pixels = haystack.as_raw();
    let (stride, tw_len) = (hw as usize, tw as usize);
    let mut best: Option<MatchScore> = None;
    for y in 0..=hh - th {
        for x in 0..=hw - tw {
            // n * sum(I^2) - sum(I)^2, exact in integers.
            let w_sum = window(&sums, x, y);
            let w_var_n = (n * window(&sq_sums, x, y)).saturating_sub(w_sum * w_sum);
            let w_var = w_var_n as f64 / n as f64;
            let denom = (w_var * t_var).sqrt();
            let score = if w_var_n > 0 && denom > f64::EPSILON {
                let origin = y as usize * stride + x as usize;
                let numerator: f64 = centered
                    .chunks_exact(tw_len)
                    .enumerate()
                    .map(|(row, t_row)| {
                        let start = origin + row * stride;
                        pixels[start..start + tw_len]
                            .iter()
                            .zip(t_row)
                            .map(|(&p, t)| f64::from(p) * t)
                            .sum::<f64>()
                    })
                    .sum();
                (numerator / denom).clamp(-1.0, 1.0) as f32
            } else {
                0.0
            };
            if best.is_none_or(|b| score > b.score) {
                best = Some(MatchScore {
                    score,
                    location: (x, y),
                });
            }
        }
    }
    best
}

/// Scores an attachment against a list of templates.
#[async_trait]
pub trait TemplateMatcher: Send + Sync {
    /// One entry per template, in the same order. `None` means the template
    /// could not be placed on the image at all.
    async fn score_all(
        &self,
        image: Bytes,
        templates: &[Arc<Template>],
    ) -> Result<Vec<Option<MatchScore>>>;
}

/// In-memory correlation matcher.
///
/// Large attachments are downscaled so their longest side is at most
/// `max_dimension`; templates are scaled by the same ratio.
#[derive(Debug, Clone)]
pub struct CorrelationMatcher {
    max_dimension: u32,
}

impl Default for CorrelationMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIMENSION)
    }
}

impl CorrelationMatcher {
    #[must_use]
    pub fn new(max_dimension: u32) -> Self {
        Self {
            max_dimension: max_dimension.max(1),
        }
    }

    fn score_all_blocking(
        &self,
        image: &[u8],
        templates: &[Arc<Template>],
    ) -> Result<Vec<Option<MatchScore>>> {
        let haystack = image_ops::decode_grayscale(image)?;
        let (width, height) = haystack.dimensions();
        let ratio = image_ops::fit_ratio(width, height, self.max_dimension);
        let haystack = image_ops::scale_gray(&haystack, ratio);

        Ok(templates
            .iter()
            .map(|template| {
                let scaled = image_ops::scale_gray(template.image(), ratio);
                let found = best_match(&haystack, &scaled);
                debug!(
                    template = template.id(),
                    ratio,
                    score = found.map(|m| m.score),
                    "scored template"
                );
                found
            })
            .collect())
    }
}

#[async_trait]
impl TemplateMatcher for CorrelationMatcher {
    async fn score_all(
        &self,
        image: Bytes,
        templates: &[Arc<Template>],
    ) -> Result<Vec<Option<MatchScore>>> {
        let matcher = self.clone();
        let templates = templates.to_vec();
        tokio::task::spawn_blocking(move || matcher.score_all_blocking(&image, &templates))
            .await
            .map_err(|e| Error::external("template matching task failed", e))?
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, image::imageops};

    /// Deterministic noise so no two windows are alike.
    fn noise(width: u32, height: u32, seed: u32) -> GrayImage {
        let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
        GrayImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            Luma([(state >> 16) as u8])
        })
    }

    fn crop(img: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
        imageops::crop_imm(img, x, y, w, h).to_image()
    }

    #[test]
    fn exact_crop_scores_one_at_its_location() {
        let haystack = noise(40, 30, 7);
        let template = crop(&haystack, 11, 6, 8, 8);
        let found = best_match(&haystack, &template).unwrap();
        assert!(found.score > 0.999, "score was {}", found.score);
        assert_eq!(found.location, (11, 6));
    }

    #[test]
    fn brightness_shift_does_not_change_score() {
        let haystack = noise(24, 24, 3);
        let template = GrayImage::from_fn(6, 6, |x, y| {
            Luma([haystack.get_pixel(x + 4, y + 9)[0] / 2 + 20])
        });
        let found = best_match(&haystack, &template).unwrap();
        assert!(found.score > 0.99, "score was {}", found.score);
        assert_eq!(found.location, (4, 9));
    }

    /// Bright, low-contrast noise: every pixel in `lo..lo + span`.
    fn pale(width: u32, height: u32, seed: u32, lo: u8, span: u8) -> GrayImage {
        let mut img = noise(width, height, seed);
        for p in img.pixels_mut() {
            p[0] = lo + p[0] % span;
        }
        img
    }

    #[test]
    fn pale_large_crop_scores_one() {
        let haystack = pale(512, 260, 13, 235, 20);
        let template = crop(&haystack, 100, 2, 256, 256);
        let found = best_match(&haystack, &template).unwrap();
        assert!(found.score > 0.999, "score was {}", found.score);
        assert_eq!(found.location, (100, 2));
    }

    #[test]
    fn very_pale_crop_scores_one() {
        let haystack = pale(512, 212, 29, 245, 10);
        let template = crop(&haystack, 300, 7, 200, 200);
        let found = best_match(&haystack, &template).unwrap();
        assert!(found.score > 0.999, "score was {}", found.score);
        assert_eq!(found.location, (300, 7));
    }

    #[test]
    fn flat_haystack_scores_zero() {
        let haystack = GrayImage::from_pixel(20, 20, Luma([240]));
        let template = noise(5, 5, 11);
        let found = best_match(&haystack, &template).unwrap();
        assert_eq!(found.score, 0.0);
    }

    #[test]
    fn unrelated_noise_scores_low() {
        let found = best_match(&noise(32, 32, 1), &noise(12, 12, 99)).unwrap();
        assert!(found.score < 0.8, "score was {}", found.score);
    }

    #[test]
    fn oversized_or_empty_template_has_no_score() {
        let haystack = noise(10, 10, 5);
        assert!(best_match(&haystack, &noise(11, 4, 5)).is_none());
        assert!(best_match(&haystack, &GrayImage::new(0, 0)).is_none());
    }

    #[test]
    fn template_load_uses_file_name_as_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tim.png");
        std::fs::write(&path, image_ops::encode_png(&noise(4, 4, 2)).unwrap()).unwrap();
        let template = Template::load(&path).unwrap();
        assert_eq!(template.id(), "tim.png");
        assert_eq!(template.image().dimensions(), (4, 4));
    }

    #[test]
    fn template_load_missing_file_fails() {
        let err = Template::load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(err.to_string().contains("failed to read template"));
    }

    #[tokio::test]
    async fn matcher_scores_every_template_in_order() {
        let haystack = noise(48, 48, 21);
        let png = Bytes::from(image_ops::encode_png(&haystack).unwrap());
        let templates = vec![
            Arc::new(Template::new("other", noise(10, 10, 77))),
            Arc::new(Template::new("crop", crop(&haystack, 20, 5, 12, 12))),
            Arc::new(Template::new("huge", noise(64, 64, 1))),
        ];

        let scores = CorrelationMatcher::default()
            .score_all(png, &templates)
            .await
            .unwrap();
        assert_eq!(scores.len(), 3);
        assert!(scores[0].unwrap().score < 0.8);
        assert!(scores[1].unwrap().score > 0.999);
        assert!(scores[2].is_none());
    }

    #[tokio::test]
    async fn matcher_downscales_large_images() {
        let base = noise(8, 8, 8);
        let haystack = imageops::resize(&base, 64, 64, imageops::FilterType::Nearest);
        let template = crop(&haystack, 16, 32, 24, 24);
        let png = Bytes::from(image_ops::encode_png(&haystack).unwrap());

        let scores = CorrelationMatcher::new(32)
            .score_all(png, &[Arc::new(Template::new("crop", template))])
            .await
            .unwrap();
        let found = scores[0].unwrap();
        assert!(found.score > 0.8, "score was {}", found.score);
        assert_eq!(found.location, (8, 16));
    }

    #[tokio::test]
    async fn matcher_rejects_undecodable_attachment() {
        let err = CorrelationMatcher::default()
            .score_all(Bytes::from_static(b"nope"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));
    }
}
