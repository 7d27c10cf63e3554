//! Output sinks for vidascii.
//!
//! Text files, animated GIF and MP4 (ffmpeg), plus the glyph rasterizer the
//! two image formats share.

pub mod font;
pub mod gif;
pub mod muxer;
pub mod rasterizer;
pub mod text;
pub mod video;

use std::path::Path;

use anyhow::Result;
use va_core::config::{OutputFormat, RenderConfig};
use va_core::traits::Sink;

pub use gif::GifSink;
pub use rasterizer::Rasterizer;
pub use text::{FRAME_MARKER, TextSink};
pub use video::VideoSink;

/// Ouvre le sink correspondant à `format`.
///
/// `font` is only used by the image formats; `None` selects coverage blocks.
///
/// # Errors
/// Propagates the sink's creation error (`Write`, `Encode` or `Config`).
///
/// # Example
/// ```
/// use va_core::config::{OutputFormat, RenderConfig};
/// use va_core::traits::Sink;
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("out.txt");
/// let sink = va_export::create_sink(OutputFormat::Txt, &path, &RenderConfig::default(), None).unwrap();
/// assert_eq!(sink.finish().unwrap(), path);
/// ```
pub fn create_sink(
    format: OutputFormat,
    path: &Path,
    config: &RenderConfig,
    font: Option<&[u8]>,
) -> Result<Box<dyn Sink>> {
    log::info!("Sortie {format} → {}", path.display());
    let sink: Box<dyn Sink> = match format {
        OutputFormat::Txt => Box::new(TextSink::create(path)?),
        OutputFormat::Gif => Box::new(GifSink::create(path, config, font)?),
        OutputFormat::Mp4 => Box::new(VideoSink::create(path, config, font)?),
    };
    Ok(sink)
}
