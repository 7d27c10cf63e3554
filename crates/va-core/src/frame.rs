/// Frame RGBA décodée, row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use va_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir transparent aux dimensions données.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Buffer uniformément rempli d'une couleur opaque.
    ///
    /// # Example
    /// ```
    /// use va_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (128, 128, 128));
    /// assert_eq!(fb.pixel(1, 1), (128, 128, 128, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        fb
    }

    /// Accès au pixel (x, y) → (r, g, b, a).
    #[inline]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        debug_assert!(x < self.width && y < self.height, "pixel out of bounds");
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        if idx + 3 >= self.data.len() {
            return (0, 0, 0, 0);
        }
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Expected byte length for the declared dimensions.
    #[must_use]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Plan de luminance normalisée `[0, 1]`, une valeur par pixel.
///
/// Every effect stage reads one `LumaFrame` and produces a new one.
///
/// # Example
/// ```
/// use va_core::frame::{FrameBuffer, LumaFrame};
/// let fb = FrameBuffer::filled(4, 2, (255, 255, 255));
/// let luma = LumaFrame::from_rgba(&fb);
/// assert_eq!((luma.width, luma.height), (4, 2));
/// assert!((luma.get(3, 1) - 1.0).abs() < 1e-6);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LumaFrame {
    /// Samples, row-major.
    pub data: Vec<f32>,
    /// Width in samples.
    pub width: u32,
    /// Height in samples.
    pub height: u32,
}

impl LumaFrame {
    /// Frame uniforme de valeur `value`.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            data: vec![value; width as usize * height as usize],
            width,
            height,
        }
    }

    /// Wrap existing samples.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    #[must_use]
    pub fn from_vec(width: u32, height: u32, data: Vec<f32>) -> Self {
        assert_eq!(data.len(), width as usize * height as usize);
        Self {
            data,
            width,
            height,
        }
    }

    /// Luminance perceptuelle BT.709 d'une frame RGBA.
    #[must_use]
    pub fn from_rgba(frame: &FrameBuffer) -> Self {
        let data = frame
            .data
            .chunks_exact(4)
            .map(|px| {
                let lum = 0.2126 * f32::from(px[0])
                    + 0.7152 * f32::from(px[1])
                    + 0.0722 * f32::from(px[2]);
                (lum / 255.0).clamp(0.0, 1.0)
            })
            .collect();
        Self {
            data,
            width: frame.width,
            height: frame.height,
        }
    }

    /// Sample at (x, y).
    #[inline]
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Sample with coordinates clamped to the frame (replicate border).
    #[inline]
    #[must_use]
    pub fn get_clamped(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, i64::from(self.width) - 1) as u32;
        let y = y.clamp(0, i64::from(self.height) - 1) as u32;
        self.get(x, y)
    }

    /// New frame with `f` applied to every sample.
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Rendu ASCII d'une frame : `height` lignes de `width` glyphes.
///
/// # Example
/// ```
/// use va_core::frame::TextFrame;
/// let tf = TextFrame::new(vec!["ab".into(), "cd".into()]);
/// assert_eq!(tf.width(), 2);
/// assert_eq!(tf.height(), 2);
/// assert_eq!(tf.to_text(), "ab\ncd");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFrame {
    rows: Vec<String>,
}

impl TextFrame {
    /// Wrap rows. Rows are expected to share the same glyph count.
    #[must_use]
    pub fn new(rows: Vec<String>) -> Self {
        debug_assert!(
            rows.windows(2)
                .all(|w| w[0].chars().count() == w[1].chars().count()),
            "ragged TextFrame"
        );
        Self { rows }
    }

    /// Rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Glyphs per row.
    #[must_use]
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.chars().count())
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Rows joined by `\n`, without trailing newline.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.rows.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_of_gray_is_uniform() {
        let fb = FrameBuffer::filled(8, 6, (128, 128, 128));
        let luma = LumaFrame::from_rgba(&fb);
        let expected = 128.0 / 255.0;
        assert!(luma.data.iter().all(|v| (v - expected).abs() < 1e-4));
    }

    #[test]
    fn luma_uses_bt709_weights() {
        let green = LumaFrame::from_rgba(&FrameBuffer::filled(1, 1, (0, 255, 0)));
        let blue = LumaFrame::from_rgba(&FrameBuffer::filled(1, 1, (0, 0, 255)));
        assert!(green.get(0, 0) > blue.get(0, 0));
        assert!((green.get(0, 0) - 0.7152).abs() < 1e-4);
    }

    #[test]
    fn clamped_access_replicates_border() {
        let luma = LumaFrame::from_vec(2, 1, vec![0.25, 0.75]);
        assert!((luma.get_clamped(-5, 0) - 0.25).abs() < f32::EPSILON);
        assert!((luma.get_clamped(9, 3) - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn text_frame_counts_glyphs_not_bytes() {
        let tf = TextFrame::new(vec!["░▒▓".into(), "█ █".into()]);
        assert_eq!(tf.width(), 3);
        assert_eq!(tf.height(), 2);
    }
}
