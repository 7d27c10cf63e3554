use anyhow::Result;
use va_core::charset::CharacterSet;
use va_core::config::Quality;
use va_core::frame::{LumaFrame, TextFrame};

use crate::resize::LumaResizer;

/// Luminance → glyphes : rééchantillonnage à la grille puis quantification.
///
/// Each grid cell gets `charset.index_for(v)`: `len` equal bins over [0, 1],
/// the higher bin on an exact edge. Inversion is an effect stage, never done
/// here.
///
/// # Example
/// ```
/// use va_ascii::mapper::GlyphMapper;
/// use va_core::charset::{CharacterSet, CharsetName};
/// use va_core::config::Quality;
/// use va_core::frame::LumaFrame;
/// let mut mapper = GlyphMapper::new(CharacterSet::builtin(CharsetName::Simple), 4, 2, Quality::Low);
/// let text = mapper.map(&LumaFrame::filled(16, 8, 1.0)).unwrap();
/// assert_eq!(text.rows(), ["@@@@", "@@@@"]);
/// ```
pub struct GlyphMapper {
    charset: CharacterSet,
    width: u32,
    height: u32,
    resizer: LumaResizer,
}

impl GlyphMapper {
    /// Mapper producing `width × height` glyph grids.
    #[must_use]
    pub fn new(charset: CharacterSet, width: u32, height: u32, quality: Quality) -> Self {
        Self {
            charset,
            width,
            height,
            resizer: LumaResizer::new(quality),
        }
    }

    /// Map one luminance frame to text.
    ///
    /// # Errors
    /// Returns an error if the frame cannot be resampled to the grid.
    pub fn map(&mut self, frame: &LumaFrame) -> Result<TextFrame> {
        let cells = self.resizer.resize(frame, self.width, self.height)?;
        let rows = cells
            .data
            .chunks_exact(self.width as usize)
            .map(|row| row.iter().map(|&v| self.charset.glyph_for(v)).collect())
            .collect();
        Ok(TextFrame::new(rows))
    }
}
