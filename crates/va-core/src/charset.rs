use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

/// 10 caractères — compact, bon contraste.
pub const CHARSET_SIMPLE: &str = " .:-=+*#%@";

/// 70 caractères — Paul Bourke extended, bon équilibre.
pub const CHARSET_STANDARD: &str =
    " .'`^\",:;Il!i><~+_-?][}{1)(|\\/tfjrxnuvczXYUJCLQ0OZmwqpdbkhao*#MW&8%B@$";

/// Same alphabet as [`CHARSET_STANDARD`].
pub const CHARSET_DETAILED: &str = CHARSET_STANDARD;

/// Blocs Unicode à ombrage.
pub const CHARSET_GRADIENT: &str = " ░▒▓█";

/// Blocs Unicode à hauteur croissante.
pub const CHARSET_BLOCKS: &str = " ▁▂▃▄▅▆▇█";

/// Nom d'un jeu de caractères intégré.
///
/// # Example
/// ```
/// use va_core::charset::CharsetName;
/// let name: CharsetName = "blocks".parse().unwrap();
/// assert_eq!(name, CharsetName::Blocks);
/// assert_eq!(name.to_string(), "blocks");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CharsetName {
    /// ` .:-=+*#%@`
    Simple,
    /// Paul Bourke, 70 glyphs.
    #[default]
    Standard,
    /// Same glyphs as `Standard`.
    Detailed,
    /// ` ░▒▓█`
    Gradient,
    /// ` ▁▂▃▄▅▆▇█`
    Blocks,
}

impl CharsetName {
    /// All built-in names, in CLI order.
    pub const ALL: [Self; 5] = [
        Self::Simple,
        Self::Standard,
        Self::Detailed,
        Self::Gradient,
        Self::Blocks,
    ];

    /// Glyph string for this name, darkest first.
    #[must_use]
    pub fn glyphs(self) -> &'static str {
        match self {
            Self::Simple => CHARSET_SIMPLE,
            Self::Standard => CHARSET_STANDARD,
            Self::Detailed => CHARSET_DETAILED,
            Self::Gradient => CHARSET_GRADIENT,
            Self::Blocks => CHARSET_BLOCKS,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Standard => "standard",
            Self::Detailed => "detailed",
            Self::Gradient => "gradient",
            Self::Blocks => "blocks",
        }
    }
}

impl fmt::Display for CharsetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CharsetName {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|n| n.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                ConvertError::Config(format!(
                    "jeu de caractères inconnu '{s}' (simple, standard, detailed, gradient, blocks)"
                ))
            })
    }
}

/// Alphabet de quantification, ordonné du plus sombre au plus dense.
///
/// Immutable once built; handed to the glyph mapper and the rasterizer.
///
/// # Example
/// ```
/// use va_core::charset::{CharacterSet, CharsetName};
/// let set = CharacterSet::builtin(CharsetName::Simple);
/// assert_eq!(set.len(), 10);
/// assert_eq!(set.glyph_for(0.0), ' ');
/// assert_eq!(set.glyph_for(1.0), '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharacterSet {
    name: String,
    glyphs: Vec<char>,
}

impl CharacterSet {
    /// Build one of the built-in sets.
    #[must_use]
    pub fn builtin(name: CharsetName) -> Self {
        Self {
            name: name.to_string(),
            glyphs: name.glyphs().chars().collect(),
        }
    }

    /// Build a custom set from a glyph string ordered darkest→densest.
    ///
    /// # Errors
    /// Returns [`ConvertError::Config`] if the string has fewer than 2 glyphs.
    pub fn custom(name: &str, glyphs: &str) -> Result<Self, ConvertError> {
        let glyphs: Vec<char> = glyphs.chars().collect();
        if glyphs.len() < 2 {
            return Err(ConvertError::Config(format!(
                "le jeu '{name}' doit contenir au moins 2 caractères"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            glyphs,
        })
    }

    /// Name of the set.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Glyphs, darkest first.
    #[must_use]
    pub fn glyphs(&self) -> &[char] {
        &self.glyphs
    }

    /// Number of glyphs (always ≥ 2).
    #[must_use]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Bin index for a normalized luminance.
    ///
    /// `len` equal-width bins over `[0, 1]`. A value sitting on a bin edge
    /// belongs to the higher bin; out-of-range input is clamped.
    ///
    /// # Example
    /// ```
    /// use va_core::charset::{CharacterSet, CharsetName};
    /// let set = CharacterSet::builtin(CharsetName::Gradient); // 5 glyphs
    /// assert_eq!(set.index_for(0.19), 0);
    /// assert_eq!(set.index_for(0.2), 1);
    /// assert_eq!(set.index_for(1.0), 4);
    /// ```
    #[inline]
    #[must_use]
    pub fn index_for(&self, luminance: f32) -> usize {
        let len = self.glyphs.len();
        let v = f64::from(luminance.clamp(0.0, 1.0));
        // f32 inputs near k/len can land a hair under the edge.
        let bin = (v * len as f64 + 1e-6).floor() as usize;
        bin.min(len - 1)
    }

    /// Glyph for a normalized luminance.
    #[inline]
    #[must_use]
    pub fn glyph_for(&self, luminance: f32) -> char {
        self.glyphs[self.index_for(luminance)]
    }

    /// Rank of `ch` in the set, if present.
    #[must_use]
    pub fn rank_of(&self, ch: char) -> Option<usize> {
        self.glyphs.iter().position(|&g| g == ch)
    }
}

impl Default for CharacterSet {
    fn default() -> Self {
        Self::builtin(CharsetName::default())
    }
}
