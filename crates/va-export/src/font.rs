use std::path::Path;

use ab_glyph::FontRef;
use anyhow::Result;
use va_core::error::ConvertError;

/// Polices monospace cherchées quand `--font` est absent, dans l'ordre.
pub const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu-sans-mono-fonts/DejaVuSansMono.ttf",
    "/usr/local/share/fonts/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/Library/Fonts/DejaVuSansMono.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
];

/// Charge la police des sorties image.
///
/// An explicit path must exist and parse, otherwise it is a configuration
/// error. Without one, the first parseable entry of [`FONT_SEARCH_PATHS`] wins;
/// `Ok(None)` means coverage blocks will be drawn instead of glyphs.
///
/// # Errors
/// [`ConvertError::Config`] if `explicit` cannot be read or is not a font.
pub fn load_font(explicit: Option<&Path>) -> Result<Option<Vec<u8>>> {
    if let Some(path) = explicit {
        let data = std::fs::read(path).map_err(|e| {
            ConvertError::Config(format!("police illisible {} : {e}", path.display()))
        })?;
        if FontRef::try_from_slice(&data).is_err() {
            return Err(ConvertError::Config(format!(
                "{} n'est pas une police TrueType/OpenType",
                path.display()
            ))
            .into());
        }
        log::info!("Police : {}", path.display());
        return Ok(Some(data));
    }

    for candidate in FONT_SEARCH_PATHS {
        let path = Path::new(candidate);
        let Ok(data) = std::fs::read(path) else {
            continue;
        };
        if FontRef::try_from_slice(&data).is_ok() {
            log::info!("Police système : {}", path.display());
            return Ok(Some(data));
        }
        log::warn!("Police ignorée (format invalide) : {}", path.display());
    }

    log::info!("Aucune police monospace trouvée, rendu en blocs de couverture");
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_font_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_font(Some(&dir.path().join("absent.ttf"))).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }

    #[test]
    fn garbage_explicit_font_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();
        let err = load_font(Some(&path)).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Config(_))
        ));
    }

    #[test]
    fn search_never_fails() {
        // Présence de police dépendante de la machine : seul le succès compte.
        assert!(load_font(None).is_ok());
    }
}
