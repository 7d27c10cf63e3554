use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Result;
use gif::{Encoder, EncodingError, Frame, Repeat};
use va_core::config::RenderConfig;
use va_core::error::ConvertError;
use va_core::frame::{FrameBuffer, TextFrame};
use va_core::traits::Sink;

use crate::rasterizer::Rasterizer;

/// Taille de police GIF (px).
pub const GIF_FONT_PX: f32 = 12.0;
/// Cellule GIF sans police (px).
pub const GIF_FALLBACK_CELL: (u32, u32) = (6, 12);
/// Vitesse de quantification NeuQuant (1 = lent/précis, 30 = rapide).
const GIF_SPEED: i32 = 10;

/// Délai GIF en centièmes de seconde pour `fps`, au moins 1.
fn frame_delay(fps: f64) -> u16 {
    (100.0 / fps).round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// I/O → `Write`, le reste → `Encode`.
fn encoding_error(path: &Path, err: EncodingError) -> ConvertError {
    match err {
        EncodingError::Io(e) => ConvertError::write(path, e),
        other => ConvertError::Encode(other.to_string()),
    }
}

/// GIF animé : une frame GIF par frame texte, boucle infinie.
///
/// Pixel dimensions are fixed at creation from the grid size and the cell
/// size; a text frame of another shape is rejected.
pub struct GifSink {
    path: PathBuf,
    encoder: Encoder<BufWriter<File>>,
    rasterizer: Rasterizer,
    canvas: FrameBuffer,
    grid: (usize, usize),
    delay: u16,
    frames: u64,
}

impl GifSink {
    /// Create the GIF file.
    ///
    /// # Errors
    /// [`ConvertError::Write`] if the file cannot be created,
    /// [`ConvertError::Config`] for an unusable font,
    /// [`ConvertError::Encode`] if the canvas exceeds the GIF size limit.
    pub fn create(path: &Path, config: &RenderConfig, font: Option<&[u8]>) -> Result<Self> {
        let rasterizer = Rasterizer::new(
            &config.character_set(),
            font,
            GIF_FONT_PX,
            GIF_FALLBACK_CELL,
        )?;
        let (w, h) = rasterizer.canvas_size(config.width, config.height, false);
        let (Ok(gif_w), Ok(gif_h)) = (u16::try_from(w), u16::try_from(h)) else {
            return Err(ConvertError::Encode(format!(
                "GIF {w}x{h} px dépasse la limite de 65535 px"
            ))
            .into());
        };

        let file = File::create(path).map_err(|e| ConvertError::write(path, e))?;
        let mut encoder = Encoder::new(BufWriter::new(file), gif_w, gif_h, &[])
            .map_err(|e| encoding_error(path, e))?;
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| encoding_error(path, e))?;

        log::info!("GIF {w}x{h} px, {:.2} fps", config.fps);

        Ok(Self {
            path: path.to_path_buf(),
            encoder,
            rasterizer,
            canvas: FrameBuffer::new(w, h),
            grid: (config.width as usize, config.height as usize),
            delay: frame_delay(config.fps),
            frames: 0,
        })
    }
}

impl Sink for GifSink {
    fn write_frame(&mut self, frame: &TextFrame) -> Result<()> {
        if (frame.width(), frame.height()) != self.grid {
            return Err(ConvertError::Encode(format!(
                "frame {}x{} glyphes, GIF ouvert pour {}x{}",
                frame.width(),
                frame.height(),
                self.grid.0,
                self.grid.1
            ))
            .into());
        }
        self.rasterizer.render(frame, &mut self.canvas)?;

        // Le canvas est entièrement redessiné à chaque frame.
        let mut gif_frame = Frame::from_rgba_speed(
            self.canvas.width as u16,
            self.canvas.height as u16,
            &mut self.canvas.data,
            GIF_SPEED,
        );
        gif_frame.delay = self.delay;
        self.encoder
            .write_frame(&gif_frame)
            .map_err(|e| encoding_error(&self.path, e))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<PathBuf> {
        let Self {
            path,
            encoder,
            frames,
            ..
        } = *self;
        // Trailer GIF puis flush : les deux peuvent échouer.
        let writer = encoder
            .into_inner()
            .map_err(|e| ConvertError::write(&path, e))?;
        writer
            .into_inner()
            .map_err(|e| ConvertError::write(&path, e.into_error()))?;
        if frames == 0 {
            log::warn!("GIF vide : aucune frame écrite dans {}", path.display());
        }
        log::info!("{frames} frames GIF écrites dans {}", path.display());
        Ok(path)
    }
}
