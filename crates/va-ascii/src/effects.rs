use va_core::config::{EffectConfig, Quality};
use va_core::frame::LumaFrame;

use crate::blur::gaussian_blur;
use crate::depth::DepthCompositor;
use crate::edge::EdgeDetector;

/// Une étape de la chaîne d'effets.
#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    /// `(v − 0.5)·scale + 0.5`.
    Contrast(f32),
    /// `v + offset`.
    Brightness(f32),
    /// `v^(1/gamma)`.
    Gamma(f32),
    /// Separable Gaussian, kernel size already resolved for the quality tier.
    Blur { ksize: usize },
    EdgeDetect(EdgeDetector),
    Invert,
    Depth(DepthCompositor),
}

impl Stage {
    /// Short name, used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Contrast(_) => "contrast",
            Self::Brightness(_) => "brightness",
            Self::Gamma(_) => "gamma",
            Self::Blur { .. } => "blur",
            Self::EdgeDetect(_) => "edge_detection",
            Self::Invert => "invert",
            Self::Depth(_) => "depth_effect",
        }
    }

    /// Apply the stage. Output is clamped to [0, 1].
    #[must_use]
    pub fn apply(&self, frame: &LumaFrame) -> LumaFrame {
        match self {
            Self::Contrast(scale) => {
                frame.map(|v| ((v - 0.5) * scale + 0.5).clamp(0.0, 1.0))
            }
            Self::Brightness(offset) => frame.map(|v| (v + offset).clamp(0.0, 1.0)),
            Self::Gamma(gamma) => {
                let inv = 1.0 / gamma;
                frame.map(|v| v.clamp(0.0, 1.0).powf(inv).clamp(0.0, 1.0))
            }
            Self::Blur { ksize } => gaussian_blur(frame, *ksize),
            Self::EdgeDetect(detector) => detector.detect(frame),
            Self::Invert => frame.map(|v| (1.0 - v).clamp(0.0, 1.0)),
            Self::Depth(compositor) => compositor.apply(frame),
        }
    }
}

/// Blur kernel size for a blur factor and quality tier: `⌊blur·5·tier⌋`,
/// at least 1, forced odd.
///
/// # Example
/// ```
/// use va_ascii::effects::blur_kernel_size;
/// use va_core::config::Quality;
/// assert_eq!(blur_kernel_size(1.0, Quality::Medium), 5);
/// assert_eq!(blur_kernel_size(1.0, Quality::High), 7);
/// assert_eq!(blur_kernel_size(0.1, Quality::Low), 1);
/// ```
#[must_use]
pub fn blur_kernel_size(blur: f32, quality: Quality) -> usize {
    let k = (blur.clamp(0.0, 1.0) * 5.0 * quality.blur_scale()).floor() as usize;
    k.max(1) | 1
}

/// Chaîne d'effets ordonnée, construite une fois par exécution.
///
/// Order is fixed: contrast → brightness → gamma → blur → edge detection →
/// invert → depth. Neutral settings produce no stage at all, so a default
/// config is an exact identity.
///
/// # Example
/// ```
/// use va_ascii::effects::EffectChain;
/// use va_core::config::{EffectConfig, Quality};
/// use va_core::frame::LumaFrame;
/// let chain = EffectChain::from_config(&EffectConfig::default(), Quality::Medium);
/// assert!(chain.is_empty());
/// let frame = LumaFrame::filled(4, 4, 0.3);
/// assert_eq!(chain.apply(frame.clone()), frame);
/// ```
#[derive(Clone, Debug, Default)]
pub struct EffectChain {
    stages: Vec<Stage>,
}

impl EffectChain {
    /// Build the stage list from the effect settings.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_config(fx: &EffectConfig, quality: Quality) -> Self {
        let mut stages = Vec::new();
        if fx.contrast != 1.0 {
            stages.push(Stage::Contrast(fx.contrast));
        }
        if fx.brightness != 0.0 {
            stages.push(Stage::Brightness(fx.brightness));
        }
        if fx.gamma != 1.0 {
            stages.push(Stage::Gamma(fx.gamma));
        }
        if fx.blur > 0.0 {
            let ksize = blur_kernel_size(fx.blur, quality);
            if ksize > 1 {
                stages.push(Stage::Blur { ksize });
            }
        }
        if fx.edge_detection {
            stages.push(Stage::EdgeDetect(EdgeDetector::default()));
        }
        if fx.invert {
            stages.push(Stage::Invert);
        }
        if fx.depth_effect {
            stages.push(Stage::Depth(DepthCompositor::default()));
        }

        let names: Vec<&str> = stages.iter().map(Stage::name).collect();
        log::debug!("Chaîne d'effets : [{}]", names.join(" → "));
        Self { stages }
    }

    /// Stages in application order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// True when the chain is the identity.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order.
    #[must_use]
    pub fn apply(&self, frame: LumaFrame) -> LumaFrame {
        self.stages
            .iter()
            .fold(frame, |acc, stage| stage.apply(&acc))
    }
}
