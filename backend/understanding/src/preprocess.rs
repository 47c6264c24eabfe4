//! Image preprocessing for OCR.
//!
//! Scanned and photographed leases arrive with uneven lighting and
//! salt-and-pepper noise. Every page goes through grayscale → median filter →
//! Gaussian-weighted adaptive threshold before recognition.

use std::panic::{catch_unwind, AssertUnwindSafe};

use anyhow::{bail, Result};
use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use tracing::{debug, warn};

/// Median filter radius (a 3x3 kernel).
pub const MEDIAN_RADIUS: u32 = 1;

/// Neighbourhood size for the adaptive threshold.
pub const THRESHOLD_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the weighted local mean.
pub const THRESHOLD_OFFSET: i16 = 2;

/// Normalize a page image for recognition.
///
/// Returns a binarized image of the same dimensions. On any failure the
/// original image is returned unchanged and the failure is logged.
pub fn preprocess(image: &DynamicImage) -> DynamicImage {
    match catch_unwind(AssertUnwindSafe(|| try_preprocess(image))) {
        Ok(Ok(processed)) => DynamicImage::ImageLuma8(processed),
        Ok(Err(e)) => {
            warn!(error = %e, "Image preprocessing failed; using original image");
            image.clone()
        }
        Err(_) => {
            warn!("Image preprocessing panicked; using original image");
            image.clone()
        }
    }
}

fn try_preprocess(image: &DynamicImage) -> Result<GrayImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        bail!("cannot preprocess empty {}x{} image", width, height);
    }

    let gray = image.to_luma8();
    let denoised = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    let binary = adaptive_gaussian_threshold(&denoised, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET);

    debug!(width, height, "Preprocessed page image");
    Ok(binary)
}

/// Binarize against a Gaussian-weighted local mean.
///
/// A pixel becomes white when it is brighter than `mean - offset` over its
/// `block_size` neighbourhood, black otherwise.
pub fn adaptive_gaussian_threshold(image: &GrayImage, block_size: u32, offset: i16) -> GrayImage {
    let local_mean = gaussian_blur_f32(image, gaussian_sigma(block_size));
    let (width, height) = image.dimensions();
    let mut out = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let threshold = i16::from(local_mean.get_pixel(x, y)[0]) - offset;
        let value = if i16::from(pixel[0]) > threshold { 255 } else { 0 };
        out.put_pixel(x, y, Luma([value]));
    }

    out
}

/// Sigma that a kernel of `block_size` implies when none is given explicitly.
fn gaussian_sigma(block_size: u32) -> f32 {
    let block = block_size.max(3) as f32;
    0.3 * ((block - 1.0) * 0.5 - 1.0) + 0.8
}
