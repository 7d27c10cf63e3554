use std::path::Path;

use anyhow::Result;
use va_core::error::ConvertError;
use va_core::frame::FrameBuffer;
use va_core::traits::Source;

/// Extensions image reconnues.
pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// True if `path` has a still-image extension.
#[must_use]
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Image statique tenue pendant `frames` frames à `fps`.
///
/// # Example
/// ```no_run
/// use va_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::open(Path::new("still.png"), 10.0, 1).unwrap();
/// ```
pub struct ImageSource {
    frame: FrameBuffer,
    fps: f64,
    remaining: u32,
}

impl ImageSource {
    /// Load an image from disk.
    ///
    /// # Errors
    /// [`ConvertError::MediaOpen`] if the image cannot be loaded.
    pub fn open(path: &Path, fps: f64, frames: u32) -> Result<Self> {
        let img = image::open(path).map_err(|e| ConvertError::media_open(path, e.to_string()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::info!("Image chargée : {width}x{height} — {}", path.display());
        Ok(Self::from_frame(
            FrameBuffer {
                data: rgba.into_raw(),
                width,
                height,
            },
            fps,
            frames,
        ))
    }

    /// Wrap an in-memory frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer, fps: f64, frames: u32) -> Self {
        Self {
            frame,
            fps,
            remaining: frames,
        }
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(self.frame.clone()))
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn nominal_fps(&self) -> f64 {
        self.fps
    }
}
