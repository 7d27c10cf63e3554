use anyhow::Result;
use va_core::config::RenderConfig;
use va_core::frame::{FrameBuffer, LumaFrame, TextFrame};

use crate::effects::EffectChain;
use crate::mapper::GlyphMapper;

/// Frame RGBA → frame texte : luminance, effets, grille de glyphes.
///
/// Built once per run from the resolved config.
///
/// # Example
/// ```
/// use va_ascii::transcoder::FrameTranscoder;
/// use va_core::config::RenderConfig;
/// use va_core::frame::FrameBuffer;
/// let config = RenderConfig { width: 8, height: 4, ..RenderConfig::default() };
/// let mut transcoder = FrameTranscoder::new(&config);
/// let text = transcoder.transcode(&FrameBuffer::filled(64, 48, (0, 0, 0))).unwrap();
/// assert_eq!(text.rows()[0], "        ");
/// ```
pub struct FrameTranscoder {
    chain: EffectChain,
    mapper: GlyphMapper,
}

impl FrameTranscoder {
    /// Build chain and mapper from `config`.
    #[must_use]
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            chain: EffectChain::from_config(&config.effects, config.quality),
            mapper: GlyphMapper::new(
                config.character_set(),
                config.width,
                config.height,
                config.quality,
            ),
        }
    }

    /// Transcode one decoded frame.
    ///
    /// # Errors
    /// Returns an error if the frame cannot be resampled to the grid.
    pub fn transcode(&mut self, frame: &FrameBuffer) -> Result<TextFrame> {
        let luma = self.chain.apply(LumaFrame::from_rgba(frame));
        self.mapper.map(&luma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::charset::CharsetName;
    use va_core::config::EffectConfig;

    fn config(invert: bool) -> RenderConfig {
        RenderConfig {
            width: 8,
            height: 4,
            char_set: CharsetName::Simple,
            effects: EffectConfig {
                invert,
                ..EffectConfig::default()
            },
            ..RenderConfig::default()
        }
    }

    #[test]
    fn flat_gray_maps_to_uniform_glyph() {
        // 140/255 ≈ 0.549 → bin 5 of 10 → '+'.
        let gray = FrameBuffer::filled(320, 240, (140, 140, 140));
        let text = FrameTranscoder::new(&config(false)).transcode(&gray).unwrap();
        assert_eq!(text.rows(), ["++++++++"; 4]);
    }

    #[test]
    fn invert_gives_complementary_glyph() {
        let gray = FrameBuffer::filled(320, 240, (140, 140, 140));
        let text = FrameTranscoder::new(&config(true)).transcode(&gray).unwrap();
        // 9 − 5 = 4 → '='.
        assert_eq!(text.rows(), ["========"; 4]);
    }
}
