use std::path::{Path, PathBuf};

use anyhow::Result;
use va_core::config::RenderConfig;
use va_core::error::ConvertError;
use va_core::frame::{FrameBuffer, TextFrame};
use va_core::traits::Sink;

use crate::muxer::Mp4Muxer;
use crate::rasterizer::Rasterizer;

/// Taille de police MP4 (px).
pub const MP4_FONT_PX: f32 = 16.0;
/// Cellule MP4 sans police (px).
pub const MP4_FALLBACK_CELL: (u32, u32) = (8, 16);

/// Vidéo MP4 : frames texte rasterisées puis encodées par ffmpeg.
///
/// The canvas is padded to even dimensions for yuv420p.
pub struct VideoSink {
    path: PathBuf,
    muxer: Mp4Muxer,
    rasterizer: Rasterizer,
    canvas: FrameBuffer,
    grid: (usize, usize),
    frames: u64,
}

impl VideoSink {
    /// Start the encoder for `path`.
    ///
    /// # Errors
    /// [`ConvertError::Config`] for an unusable font,
    /// [`ConvertError::Encode`] if ffmpeg cannot be started.
    pub fn create(path: &Path, config: &RenderConfig, font: Option<&[u8]>) -> Result<Self> {
        let rasterizer = Rasterizer::new(
            &config.character_set(),
            font,
            MP4_FONT_PX,
            MP4_FALLBACK_CELL,
        )?;
        let (w, h) = rasterizer.canvas_size(config.width, config.height, true);
        let muxer = Mp4Muxer::new(path, w, h, config.fps)?;
        log::info!("MP4 {w}x{h} px, {:.2} fps", config.fps);

        Ok(Self {
            path: path.to_path_buf(),
            muxer,
            rasterizer,
            canvas: FrameBuffer::new(w, h),
            grid: (config.width as usize, config.height as usize),
            frames: 0,
        })
    }
}

impl Sink for VideoSink {
    fn write_frame(&mut self, frame: &TextFrame) -> Result<()> {
        if (frame.width(), frame.height()) != self.grid {
            return Err(ConvertError::Encode(format!(
                "frame {}x{} glyphes, vidéo ouverte pour {}x{}",
                frame.width(),
                frame.height(),
                self.grid.0,
                self.grid.1
            ))
            .into());
        }
        self.rasterizer.render(frame, &mut self.canvas)?;
        self.muxer.write_frame(&self.canvas)?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf> {
        let Self {
            path,
            muxer,
            frames,
            ..
        } = *self;
        muxer.finish()?;
        log::info!("{frames} frames encodées dans {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::charset::CharsetName;

    #[test]
    fn encodes_when_ffmpeg_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mp4");
        // 5x3 cellules de 8x16 px → 40x48, déjà pair.
        let config = RenderConfig {
            width: 5,
            height: 3,
            char_set: CharsetName::Simple,
            ..RenderConfig::default()
        };
        let Ok(sink) = VideoSink::create(&path, &config, None) else {
            return;
        };
        let mut sink = Box::new(sink);
        let frame = TextFrame::new(vec!["@ @ @".into(), " @ @ ".into(), "@@@@@".into()]);
        for _ in 0..5 {
            sink.write_frame(&frame).unwrap();
        }
        assert!(sink.write_frame(&TextFrame::new(vec!["@".into()])).is_err());
        assert_eq!(sink.finish().unwrap(), path);
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
