use ab_glyph::{Font, FontRef, PxScale, point};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::HashMap;
use va_core::charset::CharacterSet;
use va_core::error::ConvertError;
use va_core::frame::{FrameBuffer, TextFrame};

/// Glyph color (blanc).
const FG: (u8, u8, u8) = (255, 255, 255);
/// Background color (noir).
const BG: (u8, u8, u8) = (0, 0, 0);

/// Convertit une TextFrame en pixels RGBA.
///
/// Keeps an alpha atlas for every glyph of the character set so the hot loop
/// never touches the font. Glyphs come from a TrueType/OpenType font when one
/// is given; otherwise, and for glyphs the font lacks, a cell is a flat
/// coverage block whose opacity follows the glyph's rank in the set.
///
/// # Example
/// ```
/// use va_export::rasterizer::Rasterizer;
/// use va_core::charset::{CharacterSet, CharsetName};
/// use va_core::frame::{FrameBuffer, TextFrame};
/// let r = Rasterizer::new(&CharacterSet::builtin(CharsetName::Simple), None, 12.0, (6, 12)).unwrap();
/// let (w, h) = r.canvas_size(3, 2, false);
/// assert_eq!((w, h), (18, 24));
/// let mut canvas = FrameBuffer::new(w, h);
/// r.render(&TextFrame::new(vec!["@@@".into(), "   ".into()]), &mut canvas).unwrap();
/// assert_eq!(canvas.pixel(0, 0), (255, 255, 255, 255));
/// assert_eq!(canvas.pixel(0, 12), (0, 0, 0, 255));
/// ```
pub struct Rasterizer {
    char_width: u32,
    char_height: u32,
    /// Maps a char to its 1D alpha buffer (size = char_width * char_height)
    glyph_cache: HashMap<char, Vec<u8>>,
    /// Blank cell for chars outside the set.
    empty_glyph: Vec<u8>,
}

impl Rasterizer {
    /// Build the atlas for `charset`.
    ///
    /// With `font`, the cell size comes from the font metrics at `scale_px`;
    /// without, it is `fallback_cell`.
    ///
    /// # Errors
    /// [`ConvertError::Config`] if `font` is not a parseable font.
    pub fn new(
        charset: &CharacterSet,
        font: Option<&[u8]>,
        scale_px: f32,
        fallback_cell: (u32, u32),
    ) -> Result<Self> {
        let Some(font_data) = font else {
            return Ok(Self::with_coverage_blocks(charset, fallback_cell));
        };
        let font = FontRef::try_from_slice(font_data)
            .map_err(|e| ConvertError::Config(format!("police invalide : {e}")))?;
        let scale = PxScale::from(scale_px);

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;

        let m_glyph = font.glyph_id('M');
        let h_advance = font.h_advance_unscaled(m_glyph);
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;

        let mut rasterizer = Self::blank(width.max(1), height.max(1));
        let len = charset.len();
        let mut missing = 0usize;
        for (rank, &ch) in charset.glyphs().iter().enumerate() {
            let alpha = if ch == ' ' {
                rasterizer.empty_glyph.clone()
            } else if let Some(alpha) = rasterizer.outline(&font, scale, ch) {
                alpha
            } else {
                missing += 1;
                rasterizer.coverage_block(rank, len)
            };
            rasterizer.glyph_cache.insert(ch, alpha);
        }
        if missing > 0 {
            log::warn!(
                "{missing} glyphe(s) du jeu '{}' absents de la police, blocs de couverture",
                charset.name()
            );
        }
        log::debug!(
            "Atlas '{}' : cellule {}x{} px",
            charset.name(),
            rasterizer.char_width,
            rasterizer.char_height
        );
        Ok(rasterizer)
    }

    /// Atlas made only of coverage blocks.
    #[must_use]
    pub fn with_coverage_blocks(charset: &CharacterSet, cell: (u32, u32)) -> Self {
        let mut rasterizer = Self::blank(cell.0.max(1), cell.1.max(1));
        let len = charset.len();
        for (rank, &ch) in charset.glyphs().iter().enumerate() {
            let alpha = rasterizer.coverage_block(rank, len);
            rasterizer.glyph_cache.insert(ch, alpha);
        }
        rasterizer
    }

    fn blank(char_width: u32, char_height: u32) -> Self {
        Self {
            char_width,
            char_height,
            glyph_cache: HashMap::new(),
            empty_glyph: vec![0u8; (char_width * char_height) as usize],
        }
    }

    /// Flat cell, alpha ∝ rank / (len − 1).
    fn coverage_block(&self, rank: usize, len: usize) -> Vec<u8> {
        let alpha = (rank as f32 * 255.0 / (len.max(2) - 1) as f32).round() as u8;
        vec![alpha; (self.char_width * self.char_height) as usize]
    }

    /// Alpha buffer of `ch` drawn from the font; `None` if the font lacks it.
    fn outline(&self, font: &FontRef, scale: PxScale, ch: char) -> Option<Vec<u8>> {
        // glyph_id 0 = .notdef
        let gid = font.glyph_id(ch);
        if gid.0 == 0 {
            return None;
        }

        let mut buffer = vec![0u8; (self.char_width * self.char_height) as usize];
        let ascent_px = font.ascent_unscaled() * scale.y / font.height_unscaled();
        let glyph = gid.with_scale_and_position(scale, point(0.0, ascent_px));

        if let Some(outline) = font.outline_glyph(glyph) {
            let bounds = outline.px_bounds();
            #[allow(clippy::cast_possible_wrap)]
            outline.draw(|x, y, v| {
                let px = x as i32 + bounds.min.x as i32;
                let py = y as i32 + bounds.min.y as i32;
                if px >= 0 && py >= 0 {
                    let (px, py) = (px as u32, py as u32);
                    if px < self.char_width && py < self.char_height {
                        let idx = (py * self.char_width + px) as usize;
                        buffer[idx] = buffer[idx].max((v * 255.0).round() as u8);
                    }
                }
            });
        }
        Some(buffer)
    }

    /// Canvas size for a `grid_w × grid_h` text grid.
    ///
    /// With `even`, each side is rounded up to an even number of pixels (the
    /// extra row/column stays background).
    #[must_use]
    pub fn canvas_size(&self, grid_w: u32, grid_h: u32, even: bool) -> (u32, u32) {
        let w = grid_w * self.char_width;
        let h = grid_h * self.char_height;
        if even { (w + w % 2, h + h % 2) } else { (w, h) }
    }

    /// Rendu de la TextFrame sur le canvas. Parallélisé par rangée de glyphes.
    ///
    /// The canvas must be at least the unpadded grid size; anything beyond it
    /// is painted background.
    ///
    /// # Errors
    /// [`ConvertError::Encode`] if the canvas is too small for the frame.
    pub fn render(&self, frame: &TextFrame, canvas: &mut FrameBuffer) -> Result<()> {
        let grid_w = frame.width() as u32;
        let grid_h = frame.height() as u32;
        let (need_w, need_h) = self.canvas_size(grid_w, grid_h, false);
        if canvas.width < need_w || canvas.height < need_h || canvas.data.len() != canvas.expected_len()
        {
            return Err(ConvertError::Encode(format!(
                "canvas {}x{} trop petit pour {grid_w}x{grid_h} glyphes ({need_w}x{need_h} px)",
                canvas.width, canvas.height
            ))
            .into());
        }

        for px in canvas.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[BG.0, BG.1, BG.2, 255]);
        }
        if grid_w == 0 || grid_h == 0 {
            return Ok(());
        }

        let empty_glyph = &self.empty_glyph;
        let cw = self.char_width as usize;
        let ch = self.char_height as usize;
        let stride = canvas.width as usize * 4;
        let band_size = stride * ch;
        let rows = frame.rows();

        canvas
            .data
            .par_chunks_exact_mut(band_size)
            .take(rows.len())
            .enumerate()
            .for_each(|(gy, band)| {
                for (gx, glyph) in rows[gy].chars().take(grid_w as usize).enumerate() {
                    let alpha = self.glyph_cache.get(&glyph).unwrap_or(empty_glyph);
                    let x0 = gx * cw;
                    for cy in 0..ch {
                        let line = cy * stride;
                        for cx in 0..cw {
                            let a = f32::from(alpha[cy * cw + cx]) / 255.0;
                            let idx = line + (x0 + cx) * 4;
                            band[idx] = blend(FG.0, BG.0, a);
                            band[idx + 1] = blend(FG.1, BG.1, a);
                            band[idx + 2] = blend(FG.2, BG.2, a);
                            band[idx + 3] = 255;
                        }
                    }
                }
            });
        Ok(())
    }
}

#[inline]
fn blend(fg: u8, bg: u8, a: f32) -> u8 {
    (f32::from(fg) * a + f32::from(bg) * (1.0 - a)).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::charset::CharsetName;

    fn blocks(name: CharsetName) -> Rasterizer {
        Rasterizer::with_coverage_blocks(&CharacterSet::builtin(name), (6, 12))
    }

    #[test]
    fn coverage_follows_rank() {
        let set = CharacterSet::builtin(CharsetName::Gradient);
        let r = blocks(CharsetName::Gradient);
        let levels: Vec<u8> = set
            .glyphs()
            .iter()
            .map(|c| r.glyph_cache[c][0])
            .collect();
        assert_eq!(levels, [0, 64, 128, 191, 255]);
    }

    #[test]
    fn even_padding_rounds_up() {
        let r = Rasterizer::with_coverage_blocks(&CharacterSet::default(), (5, 7));
        assert_eq!(r.canvas_size(3, 3, false), (15, 21));
        assert_eq!(r.canvas_size(3, 3, true), (16, 22));
        assert_eq!(r.canvas_size(2, 2, true), (10, 14));
    }

    #[test]
    fn padding_stays_background() {
        let r = Rasterizer::with_coverage_blocks(&CharacterSet::builtin(CharsetName::Simple), (5, 7));
        let (w, h) = r.canvas_size(1, 1, true);
        let mut canvas = FrameBuffer::new(w, h);
        r.render(&TextFrame::new(vec!["@".into()]), &mut canvas).unwrap();
        assert_eq!(canvas.pixel(4, 6), (255, 255, 255, 255));
        assert_eq!(canvas.pixel(5, 0), (0, 0, 0, 255));
        assert_eq!(canvas.pixel(0, 7), (0, 0, 0, 255));
    }

    #[test]
    fn undersized_canvas_is_encode_error() {
        let r = blocks(CharsetName::Simple);
        let mut canvas = FrameBuffer::new(6, 12);
        let err = r
            .render(&TextFrame::new(vec!["@@".into()]), &mut canvas)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Encode(_))
        ));
    }

    #[test]
    fn invalid_font_is_config_error() {
        let err = Rasterizer::new(&CharacterSet::default(), Some(b"nope"), 12.0, (6, 12))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }

    #[test]
    fn system_font_cells_cover_every_glyph() {
        let Ok(Some(font)) = crate::font::load_font(None) else {
            return;
        };
        let set = CharacterSet::builtin(CharsetName::Standard);
        let r = Rasterizer::new(&set, Some(&font), 12.0, (6, 12)).unwrap();
        let (w, h) = (r.char_width, r.char_height);
        assert!(w > 0 && h > 0);
        for g in set.glyphs() {
            assert_eq!(r.glyph_cache[g].len(), (w * h) as usize);
        }
    }
}
