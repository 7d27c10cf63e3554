use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::{CharacterSet, CharsetName};
use crate::error::ConvertError;

/// Largest accepted grid dimension, in glyphs.
pub const MAX_GRID_DIM: u32 = 4096;

/// Niveau de qualité : coût d'échantillonnage (decode, blur, resize).
///
/// Never changes what the pipeline computes, only how finely it samples.
///
/// # Example
/// ```
/// use va_core::config::Quality;
/// assert_eq!("high".parse::<Quality>().unwrap(), Quality::High);
/// assert!(Quality::Low.blur_scale() < Quality::High.blur_scale());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Smallest decode size, nearest resize, short blur kernel.
    Low,
    /// Balanced default.
    #[default]
    Medium,
    /// Native decode size, area-average resize, long blur kernel.
    High,
}

impl Quality {
    /// Multiplier applied to the blur kernel size.
    #[must_use]
    pub fn blur_scale(self) -> f32 {
        match self {
            Self::Low => 0.5,
            Self::Medium => 1.0,
            Self::High => 1.5,
        }
    }

    /// Upper bound on the decode working resolution, `None` = native.
    #[must_use]
    pub fn decode_cap(self) -> Option<(u32, u32)> {
        match self {
            Self::Low => Some((640, 360)),
            Self::Medium => Some((1280, 720)),
            Self::High => None,
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

impl FromStr for Quality {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(ConvertError::Config(format!(
                "qualité inconnue '{s}' (low, medium, high)"
            ))),
        }
    }
}

/// Format de sortie : un seul sink actif par exécution.
///
/// # Example
/// ```
/// use va_core::config::OutputFormat;
/// use std::path::Path;
/// assert_eq!(OutputFormat::from_extension(Path::new("out.GIF")), Some(OutputFormat::Gif));
/// assert_eq!(OutputFormat::from_extension(Path::new("out.webm")), None);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Frame-delimited plain text.
    #[default]
    Txt,
    /// Animated GIF.
    Gif,
    /// H.264 MP4 through ffmpeg.
    Mp4,
}

impl OutputFormat {
    /// Guess the format from a file extension.
    #[must_use]
    pub fn from_extension(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }

    /// Canonical file extension.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Gif => "gif",
            Self::Mp4 => "mp4",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "txt" => Ok(Self::Txt),
            "gif" => Ok(Self::Gif),
            "mp4" => Ok(Self::Mp4),
            _ => Err(ConvertError::Config(format!(
                "format inconnu '{s}' (txt, gif, mp4)"
            ))),
        }
    }
}

/// Réglages des effets image, appliqués dans un ordre fixe :
/// contrast → brightness → gamma → blur → edge_detection → invert → depth.
///
/// # Example
/// ```
/// use va_core::config::EffectConfig;
/// let fx = EffectConfig::default();
/// assert!(fx.is_identity());
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EffectConfig {
    /// Scale around mid-grey, ≥ 0. 1.0 = neutre.
    pub contrast: f32,
    /// Additive offset on normalized luminance [-1.0, 1.0]. 0.0 = neutre.
    pub brightness: f32,
    /// Exponent > 0, applied as `v^(1/gamma)`. 1.0 = neutre.
    pub gamma: f32,
    /// Blur radius factor [0.0, 1.0]. 0.0 = désactivé.
    pub blur: f32,
    /// Inverser la luminance.
    pub invert: bool,
    /// Replace the frame with a binary edge map.
    pub edge_detection: bool,
    /// Blend a sharpness-based pseudo-depth into luminance.
    pub depth_effect: bool,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 0.0,
            gamma: 1.0,
            blur: 0.0,
            invert: false,
            edge_detection: false,
            depth_effect: false,
        }
    }
}

impl EffectConfig {
    /// True when every stage is neutral.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_identity(&self) -> bool {
        self.contrast == 1.0
            && self.brightness == 0.0
            && self.gamma == 1.0
            && self.blur == 0.0
            && !self.invert
            && !self.edge_detection
            && !self.depth_effect
    }
}

/// Configuration résolue d'une exécution. Construite une fois, jamais mutée
/// pendant le rendu.
///
/// Sérialisée à plat en JSON (les champs d'effet sont au même niveau).
///
/// # Example
/// ```
/// use va_core::config::RenderConfig;
/// let config = RenderConfig::default();
/// assert_eq!((config.width, config.height), (80, 24));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RenderConfig {
    /// Glyphs per row.
    pub width: u32,
    /// Rows per text frame.
    pub height: u32,
    /// Target frame rate of the output.
    pub fps: f64,
    /// Built-in character set.
    pub char_set: CharsetName,
    /// Sampling quality tier.
    pub quality: Quality,
    /// Image effects.
    #[serde(flatten)]
    pub effects: EffectConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
            fps: 10.0,
            char_set: CharsetName::Standard,
            quality: Quality::Medium,
            effects: EffectConfig::default(),
        }
    }
}

impl RenderConfig {
    /// Reject out-of-range values. Called once, before any frame is decoded.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] naming the first offending option.
    pub fn validate(&self) -> Result<(), ConvertError> {
        let fx = &self.effects;
        if self.width == 0 || self.height == 0 {
            return Err(ConvertError::Config(format!(
                "dimensions invalides : {}×{} (doivent être > 0)",
                self.width, self.height
            )));
        }
        if self.width > MAX_GRID_DIM || self.height > MAX_GRID_DIM {
            return Err(ConvertError::Config(format!(
                "dimensions invalides : {}×{} (max {MAX_GRID_DIM})",
                self.width, self.height
            )));
        }
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(ConvertError::Config(format!(
                "fps doit être > 0 (reçu {})",
                self.fps
            )));
        }
        if !fx.contrast.is_finite() || fx.contrast < 0.0 {
            return Err(ConvertError::Config(format!(
                "contrast doit être ≥ 0 (reçu {})",
                fx.contrast
            )));
        }
        if !fx.brightness.is_finite() || !(-1.0..=1.0).contains(&fx.brightness) {
            return Err(ConvertError::Config(format!(
                "brightness doit être dans [-1, 1] (reçu {})",
                fx.brightness
            )));
        }
        if !fx.gamma.is_finite() || fx.gamma <= 0.0 {
            return Err(ConvertError::Config(format!(
                "gamma doit être > 0 (reçu {})",
                fx.gamma
            )));
        }
        if !(0.0..=1.0).contains(&fx.blur) {
            return Err(ConvertError::Config(format!(
                "blur doit être dans [0, 1] (reçu {})",
                fx.blur
            )));
        }
        Ok(())
    }

    /// The character set this config selects.
    #[must_use]
    pub fn character_set(&self) -> CharacterSet {
        CharacterSet::builtin(self.char_set)
    }
}

/// Surcharge partielle : chaque champ absent garde la valeur courante.
///
/// Deserialized from preset files and built from CLI flags; both are merged
/// onto the defaults with [`ConfigOverrides::apply`].
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ConfigOverrides {
    /// Largeur en glyphes. Signée : une valeur négative est rejetée à l'application.
    pub width: Option<i64>,
    /// Hauteur en lignes.
    pub height: Option<i64>,
    /// FPS de sortie.
    pub fps: Option<f64>,
    /// Jeu de caractères nommé.
    pub char_set: Option<CharsetName>,
    /// Niveau de qualité.
    pub quality: Option<Quality>,
    /// Contraste (1 = neutre).
    pub contrast: Option<f32>,
    /// Décalage de luminosité (0 = neutre).
    pub brightness: Option<f32>,
    /// Gamma (1 = neutre).
    pub gamma: Option<f32>,
    /// Intensité du flou dans [0, 1].
    pub blur: Option<f32>,
    /// Inversion de la luminance.
    pub invert: Option<bool>,
    /// Contours à la place de l'image.
    pub edge_detection: Option<bool>,
    /// Pseudo-profondeur.
    pub depth_effect: Option<bool>,
}

impl ConfigOverrides {
    /// Merge onto `config`.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] for a negative or oversized dimension.
    pub fn apply(&self, config: &mut RenderConfig) -> Result<(), ConvertError> {
        if let Some(v) = self.width {
            config.width = dimension("width", v)?;
        }
        if let Some(v) = self.height {
            config.height = dimension("height", v)?;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.char_set {
            config.char_set = v;
        }
        if let Some(v) = self.quality {
            config.quality = v;
        }
        let fx = &mut config.effects;
        if let Some(v) = self.contrast {
            fx.contrast = v;
        }
        if let Some(v) = self.brightness {
            fx.brightness = v;
        }
        if let Some(v) = self.gamma {
            fx.gamma = v;
        }
        if let Some(v) = self.blur {
            fx.blur = v;
        }
        if let Some(v) = self.invert {
            fx.invert = v;
        }
        if let Some(v) = self.edge_detection {
            fx.edge_detection = v;
        }
        if let Some(v) = self.depth_effect {
            fx.depth_effect = v;
        }
        Ok(())
    }
}

fn dimension(key: &str, value: i64) -> Result<u32, ConvertError> {
    u32::try_from(value)
        .map_err(|_| ConvertError::Config(format!("{key} invalide : {value}")))
}

/// Charge un preset JSON et le fusionne avec les valeurs par défaut.
///
/// Unknown keys are ignored. The result is not validated; callers validate
/// once every layer (defaults, preset, CLI) has been merged.
///
/// # Errors
/// Returns [`ConvertError::Config`] if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use va_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("example_config.json")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<RenderConfig> {
    let overrides = read_overrides(path)?;
    let mut config = RenderConfig::default();
    overrides.apply(&mut config)?;
    log::info!("Configuration chargée depuis {}", path.display());
    Ok(config)
}

/// Parse a preset file into overrides without merging.
///
/// # Errors
/// Returns [`ConvertError::Config`] if the file cannot be read or parsed.
pub fn read_overrides(path: &Path) -> Result<ConfigOverrides> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConvertError::Config(format!("impossible de lire {} : {e}", path.display()))
    })?;
    let overrides: ConfigOverrides = serde_json::from_str(&content).map_err(|e| {
        ConvertError::Config(format!("JSON invalide dans {} : {e}", path.display()))
    })?;
    Ok(overrides)
}

/// Écrit la configuration résolue en JSON (objet plat, indenté).
///
/// # Errors
/// Returns [`ConvertError::Write`] on I/O failure.
pub fn save_config(path: &Path, config: &RenderConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(config).context("sérialisation de la configuration")?;
    std::fs::write(path, json + "\n").map_err(|e| ConvertError::write(path, e))?;
    log::info!("Configuration sauvegardée dans {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_reference_settings() {
        let c = RenderConfig::default();
        assert_eq!(c.char_set, CharsetName::Standard);
        assert_eq!(c.quality, Quality::Medium);
        assert!((c.fps - 10.0).abs() < f64::EPSILON);
        assert!(c.effects.is_identity());
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        for (w, h) in [(0, 24), (80, 0), (0, 0)] {
            let c = RenderConfig {
                width: w,
                height: h,
                ..RenderConfig::default()
            };
            assert!(matches!(c.validate(), Err(ConvertError::Config(_))));
        }
    }

    #[test]
    fn out_of_range_effects_are_rejected() {
        let bad = [
            EffectConfig {
                contrast: -0.1,
                ..EffectConfig::default()
            },
            EffectConfig {
                gamma: 0.0,
                ..EffectConfig::default()
            },
            EffectConfig {
                blur: 1.5,
                ..EffectConfig::default()
            },
            EffectConfig {
                brightness: f32::NAN,
                ..EffectConfig::default()
            },
        ];
        for effects in bad {
            let c = RenderConfig {
                effects,
                ..RenderConfig::default()
            };
            assert!(c.validate().is_err(), "{c:?}");
        }
        let c = RenderConfig {
            fps: 0.0,
            ..RenderConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        let config = RenderConfig {
            width: 120,
            height: 40,
            fps: 12.5,
            char_set: CharsetName::Blocks,
            quality: Quality::High,
            effects: EffectConfig {
                contrast: 1.3,
                brightness: -0.1,
                gamma: 2.2,
                blur: 0.4,
                invert: true,
                edge_detection: false,
                depth_effect: true,
            },
        };
        save_config(&path, &config).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn saved_preset_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");
        save_config(&path, &RenderConfig::default()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        for key in [
            "width",
            "height",
            "fps",
            "char_set",
            "contrast",
            "brightness",
            "gamma",
            "invert",
            "edge_detection",
            "depth_effect",
            "blur",
            "quality",
        ] {
            assert!(value.get(key).is_some(), "clé manquante : {key}");
        }
        assert_eq!(value["char_set"], "standard");
    }

    #[test]
    fn partial_preset_merges_onto_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(
            &path,
            r#"{"width": 40, "char_set": "simple", "color_mode": "grayscale"}"#,
        )
        .unwrap();
        let c = load_config(&path).unwrap();
        assert_eq!(c.width, 40);
        assert_eq!(c.height, 24);
        assert_eq!(c.char_set, CharsetName::Simple);
    }

    #[test]
    fn malformed_preset_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ width: ").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }

    #[test]
    fn negative_width_in_preset_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("neg.json");
        std::fs::write(&path, r#"{"width": -5}"#).unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }

    #[test]
    fn missing_preset_is_a_config_error() {
        let err = load_config(Path::new("/nonexistent/preset.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }
}
