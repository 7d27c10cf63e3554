use anyhow::{Context, Result, ensure};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use va_core::config::Quality;
use va_core::frame::LumaFrame;

/// Algorithme de rééchantillonnage pour un niveau de qualité.
///
/// Low samples the nearest pixel, medium interpolates bilinearly, high
/// averages every source pixel under the cell (box filter).
#[must_use]
pub fn algorithm_for(quality: Quality) -> ResizeAlg {
    match quality {
        Quality::Low => ResizeAlg::Nearest,
        Quality::Medium => ResizeAlg::Convolution(FilterType::Bilinear),
        Quality::High => ResizeAlg::Convolution(FilterType::Box),
    }
}

/// Resizer de luminance réutilisable wrappant fast_image_resize.
///
/// Samples stay `f32` end to end (`PixelType::F32`), so quantization sees
/// the resampled value itself and not an 8-bit approximation.
///
/// # Example
/// ```
/// use va_ascii::resize::LumaResizer;
/// use va_core::config::Quality;
/// use va_core::frame::LumaFrame;
/// let mut r = LumaResizer::new(Quality::Low);
/// let out = r.resize(&LumaFrame::filled(40, 20, 1.0), 8, 4).unwrap();
/// assert_eq!((out.width, out.height), (8, 4));
/// ```
pub struct LumaResizer {
    inner: FirResizer,
    options: ResizeOptions,
}

impl LumaResizer {
    /// New resizer for a quality tier.
    #[must_use]
    pub fn new(quality: Quality) -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(algorithm_for(quality)),
        }
    }

    /// Resample `src` to exactly `width × height`.
    ///
    /// Same-size input is returned untouched.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero or the resize fails.
    pub fn resize(&mut self, src: &LumaFrame, width: u32, height: u32) -> Result<LumaFrame> {
        ensure!(width > 0 && height > 0, "Taille cible nulle : {width}x{height}");
        ensure!(src.width > 0 && src.height > 0, "Frame source vide");
        if src.width == width && src.height == height {
            return Ok(src.clone());
        }

        // Images F32 possédées par fast_image_resize, remplies octet par octet.
        let mut src_image = Image::new(src.width, src.height, PixelType::F32);
        for (bytes, v) in src_image.buffer_mut().chunks_exact_mut(4).zip(&src.data) {
            bytes.copy_from_slice(&v.clamp(0.0, 1.0).to_ne_bytes());
        }
        let mut dst_image = Image::new(width, height, PixelType::F32);

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        let data = dst_image
            .buffer()
            .chunks_exact(4)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]]).clamp(0.0, 1.0))
            .collect();
        Ok(LumaFrame::from_vec(width, height, data))
    }
}
