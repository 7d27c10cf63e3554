use std::io::Write;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use va_core::config::{OutputFormat, RenderConfig, load_config, save_config};
use va_core::error::ConvertError;
use va_export::FRAME_MARKER;

pub mod cli;
pub mod pipeline;

fn main() -> ExitCode {
    // 1. Parser CLI (erreurs d'usage = erreurs de configuration)
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(3);
        }
        Err(e) => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    // 2. Initialiser le logging
    env_logger::Builder::new()
        .filter_level(cli.log_level)
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Erreur : {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit code of the first typed error in the chain, `1` otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<ConvertError>())
        .map_or(1, |e| u8::try_from(e.exit_code()).unwrap_or(1))
}

fn run(cli: &cli::Cli) -> Result<()> {
    // 3. Résoudre et valider la config, avant tout décodage
    let config = resolve_config(cli)?;

    if let Some(path) = cli.save_config.as_deref() {
        save_config(path, &config)?;
    }

    // 4. Preview : première frame sur stdout, aucune sortie écrite
    if cli.preview {
        let mut source = pipeline::open_source(&cli.input, &config)?;
        let frame = pipeline::preview(source.as_mut(), &config)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{FRAME_MARKER}")?;
        if let Some(frame) = frame {
            writeln!(stdout, "{}", frame.to_text())?;
        } else {
            log::warn!("Aucune frame décodée dans {}", cli.input.display());
        }
        writeln!(stdout, "{FRAME_MARKER}")?;
        return Ok(());
    }

    let output = cli
        .output
        .as_deref()
        .ok_or_else(|| ConvertError::Config("--output est requis sans --preview".into()))?;
    let format = cli.output_format();

    // 5. Police (formats image uniquement)
    let font = if format == OutputFormat::Txt {
        None
    } else {
        va_export::font::load_font(cli.font.as_deref())?
    };

    // 6. Source et première frame d'abord : une entrée illisible ne laisse
    //    aucun fichier de sortie
    let mut source = pipeline::open_source(&cli.input, &config)?;
    let stats = pipeline::convert(
        source.as_mut(),
        || va_export::create_sink(format, output, &config, font.as_deref()),
        &config,
    )?;

    eprintln!(
        "{} frames écrites ({} décodées) → {}",
        stats.written,
        stats.decoded,
        stats.output.display()
    );
    Ok(())
}

/// Defaults ← `--load-config` ← explicit flags, then validation.
///
/// # Errors
/// [`ConvertError::Config`] for an unreadable preset or an invalid value.
fn resolve_config(cli: &cli::Cli) -> Result<RenderConfig> {
    let mut config = match cli.load_config.as_deref() {
        Some(path) => load_config(path)?,
        None => RenderConfig::default(),
    };
    cli.overrides().apply(&mut config)?;
    config.validate()?;
    log::debug!("Configuration résolue : {config:?}");
    Ok(config)
}
