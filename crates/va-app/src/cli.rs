use std::path::PathBuf;

use clap::Parser;
use va_core::charset::CharsetName;
use va_core::config::{ConfigOverrides, OutputFormat, Quality};

/// vidascii — convertit une vidéo en art ASCII (texte, GIF ou MP4).
#[derive(Parser, Debug)]
#[command(name = "vidascii", version, about, long_about = None)]
pub struct Cli {
    /// Vidéo d'entrée (tout format lisible par ffmpeg) ou image (PNG, JPEG, BMP).
    pub input: PathBuf,

    /// Fichier de sortie. Requis sauf avec --preview.
    #[arg(short, long, required_unless_present = "preview")]
    pub output: Option<PathBuf>,

    /// Format de sortie : txt, gif, mp4. Défaut : extension de --output, sinon txt.
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Largeur en caractères (défaut 80).
    #[arg(short, long, allow_negative_numbers = true)]
    pub width: Option<i64>,

    /// Hauteur en lignes (défaut 24).
    #[arg(long, allow_negative_numbers = true)]
    pub height: Option<i64>,

    /// FPS de sortie (défaut 10). Jamais de suréchantillonnage.
    #[arg(long, allow_negative_numbers = true)]
    pub fps: Option<f64>,

    /// Jeu de caractères : simple, standard, detailed, gradient, blocks.
    #[arg(long)]
    pub char_set: Option<CharsetName>,

    /// Qualité d'échantillonnage : low, medium, high.
    #[arg(long)]
    pub quality: Option<Quality>,

    /// Contraste (≥ 0, 1 = neutre).
    #[arg(long, allow_negative_numbers = true)]
    pub contrast: Option<f32>,

    /// Luminosité, décalage dans [-1, 1] (0 = neutre).
    #[arg(long, allow_negative_numbers = true)]
    pub brightness: Option<f32>,

    /// Gamma (> 0, 1 = neutre).
    #[arg(long, allow_negative_numbers = true)]
    pub gamma: Option<f32>,

    /// Flou gaussien dans [0, 1] (0 = désactivé).
    #[arg(long, allow_negative_numbers = true)]
    pub blur: Option<f32>,

    /// Inverser la luminance.
    #[arg(long)]
    pub invert: bool,

    /// Remplacer l'image par ses contours (Sobel + hystérésis).
    #[arg(long)]
    pub edge_detection: bool,

    /// Pseudo-profondeur par netteté locale (approximation heuristique).
    #[arg(long)]
    pub depth_effect: bool,

    /// Écrire la configuration résolue (JSON) avant le traitement.
    #[arg(long)]
    pub save_config: Option<PathBuf>,

    /// Charger un preset JSON ; les options explicites restent prioritaires.
    #[arg(long)]
    pub load_config: Option<PathBuf>,

    /// Afficher la première frame sur stdout et quitter sans rien écrire.
    #[arg(long)]
    pub preview: bool,

    /// Police TrueType/OpenType monospace pour GIF/MP4.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Niveau de log : off, error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", value_parser = parse_log_level)]
    pub log_level: log::LevelFilter,
}

fn parse_log_level(s: &str) -> Result<log::LevelFilter, String> {
    s.parse()
        .map_err(|_| format!("niveau inconnu « {s} » (off, error, warn, info, debug, trace)"))
}

impl Cli {
    /// Options given explicitly on the command line.
    ///
    /// Absent flags stay `None` so a preset value is not overwritten.
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            width: self.width,
            height: self.height,
            fps: self.fps,
            char_set: self.char_set,
            quality: self.quality,
            contrast: self.contrast,
            brightness: self.brightness,
            gamma: self.gamma,
            blur: self.blur,
            invert: self.invert.then_some(true),
            edge_detection: self.edge_detection.then_some(true),
            depth_effect: self.depth_effect.then_some(true),
        }
    }

    /// `--format`, else the output extension, else text.
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        if let Some(format) = self.format {
            return format;
        }
        let Some(output) = self.output.as_deref() else {
            return OutputFormat::Txt;
        };
        OutputFormat::from_extension(output).unwrap_or_else(|| {
            log::warn!(
                "Extension de {} non reconnue, sortie texte",
                output.display()
            );
            OutputFormat::Txt
        })
    }
}
