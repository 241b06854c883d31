//! Image decoding helpers shared by template matching and OCR.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader, imageops::FilterType};

use crate::{Error, Result};

/// Decode image bytes of any supported format.
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(Error::invalid_input("cannot decode an empty image"));
    }
    Ok(ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?)
}

/// Decode image bytes straight to 8-bit grayscale.
pub fn decode_grayscale(data: &[u8]) -> Result<GrayImage> {
    Ok(decode(data)?.into_luma8())
}

/// Scale factor that brings the larger side of `(width, height)` down to
/// `max_dimension`. Never upscales.
#[must_use]
pub fn fit_ratio(width: u32, height: u32, max_dimension: u32) -> f64 {
    let largest = width.max(height);
    if largest <= max_dimension || largest == 0 {
        return 1.0;
    }
    f64::from(max_dimension) / f64::from(largest)
}

/// Resize a grayscale image by `ratio`, keeping at least one pixel per side.
#[must_use]
pub fn scale_gray(img: &GrayImage, ratio: f64) -> GrayImage {
    if (ratio - 1.0).abs() < f64::EPSILON {
        return img.clone();
    }
    let (width, height) = img.dimensions();
    let new_width = ((f64::from(width) * ratio).round() as u32).max(1);
    let new_height = ((f64::from(height) * ratio).round() as u32).max(1);
    image::imageops::resize(img, new_width, new_height, FilterType::Triangle)
}

/// File extension tesseract and friends expect for the detected format.
#[must_use]
pub fn guess_extension(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(ImageFormat::Jpeg) => "jpg",
        Ok(ImageFormat::Png) => "png",
        Ok(ImageFormat::WebP) => "webp",
        Ok(ImageFormat::Gif) => "gif",
        Ok(ImageFormat::Bmp) => "bmp",
        Ok(ImageFormat::Tiff) => "tif",
        _ => "png",
    }
}

/// Encode a grayscale image as PNG.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    DynamicImage::ImageLuma8(img.clone()).write_to(&mut output, ImageFormat::Png)?;
    Ok(output.into_inner())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, image::Luma, rstest::rstest};

    fn checkerboard(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([if (x + y) % 2 == 0 { 255 } else { 0 }])
        })
    }

    #[test]
    fn decode_grayscale_roundtrips_pixels() {
        let img = checkerboard(4, 4);
        let decoded = decode_grayscale(&encode_png(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn decode_rejects_empty_and_garbage() {
        assert!(matches!(decode(&[]), Err(Error::InvalidInput { .. })));
        assert!(decode(b"definitely not an image").is_err());
    }

    #[rstest]
    #[case(100, 50, 200, 1.0)]
    #[case(400, 100, 200, 0.5)]
    #[case(100, 800, 200, 0.25)]
    #[case(0, 0, 200, 1.0)]
    fn fit_ratio_cases(
        #[case] width: u32,
        #[case] height: u32,
        #[case] max: u32,
        #[case] expected: f64,
    ) {
        assert!((fit_ratio(width, height, max) - expected).abs() < 1e-9);
    }

    #[test]
    fn scale_gray_keeps_one_pixel() {
        let scaled = scale_gray(&checkerboard(10, 2), 0.1);
        assert_eq!(scaled.dimensions(), (1, 1));
        assert_eq!(scale_gray(&checkerboard(5, 5), 1.0).dimensions(), (5, 5));
    }

    #[test]
    fn guesses_extension_from_magic_bytes() {
        let png = encode_png(&checkerboard(2, 2)).unwrap();
        assert_eq!(guess_extension(&png), "png");
        assert_eq!(guess_extension(&[0xFF, 0xD8, 0xFF, 0xE0]), "jpg");
        assert_eq!(guess_extension(b"??"), "png");
    }
}
