use std::path::{Path, PathBuf};

use anyhow::Result;
use va_ascii::FrameTranscoder;
use va_core::config::RenderConfig;
use va_core::frame::{FrameBuffer, TextFrame};
use va_core::traits::{Sink, Source};
use va_source::image::is_image_path;
use va_source::{ImageSource, RateResampler, VideoSource};

/// Log de progression toutes les N frames écrites.
const PROGRESS_EVERY: u64 = 10;

/// Bilan d'une conversion.
#[derive(Debug)]
pub struct RunStats {
    /// Frames pulled from the source.
    pub decoded: u64,
    /// Frames handed to the sink.
    pub written: u64,
    /// Path returned by the sink.
    pub output: PathBuf,
}

/// Ouvre la source adaptée : image fixe (une frame) ou vidéo ffmpeg.
///
/// # Errors
/// [`va_core::error::ConvertError::MediaOpen`] if the input cannot be opened.
pub fn open_source(input: &Path, config: &RenderConfig) -> Result<Box<dyn Source>> {
    if is_image_path(input) {
        Ok(Box::new(ImageSource::open(input, config.fps, 1)?))
    } else {
        Ok(Box::new(VideoSource::open(input, config.quality)?))
    }
}

/// Conversion complète : première frame, puis ouverture du sink, puis boucle.
///
/// The first frame is decoded before `open_sink` runs, so a decoder that
/// fails on frame 0 leaves no output file behind.
///
/// # Errors
/// The first decode error (before any output exists), the sink's creation
/// error, then whatever [`run`] returns.
pub fn convert<F>(source: &mut dyn Source, open_sink: F, config: &RenderConfig) -> Result<RunStats>
where
    F: FnOnce() -> Result<Box<dyn Sink>>,
{
    let first = source.next_frame()?;
    let sink = open_sink()?;
    let mut primed = Primed {
        done: first.is_none(),
        first,
        rest: source,
    };
    run(&mut primed, sink, config)
}

/// Source dont la première frame a déjà été lue.
struct Primed<'a> {
    first: Option<FrameBuffer>,
    done: bool,
    rest: &'a mut dyn Source,
}

impl Source for Primed<'_> {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if let Some(frame) = self.first.take() {
            return Ok(Some(frame));
        }
        if self.done {
            return Ok(None);
        }
        self.rest.next_frame()
    }

    fn native_size(&self) -> (u32, u32) {
        self.rest.native_size()
    }

    fn nominal_fps(&self) -> f64 {
        self.rest.nominal_fps()
    }
}

/// Boucle de conversion : source → resampler → transcoder → sink.
///
/// One frame at a time, in order. The sink is finished only if every frame
/// went through.
///
/// # Errors
/// The first decode, transcode or sink error, unchanged.
pub fn run(source: &mut dyn Source, mut sink: Box<dyn Sink>, config: &RenderConfig) -> Result<RunStats> {
    let mut resampler = RateResampler::new(source.nominal_fps(), config.fps);
    let mut transcoder = FrameTranscoder::new(config);
    let (w, h) = source.native_size();
    log::info!(
        "Conversion {w}x{h} @ {:.3} fps → {}x{} glyphes @ {:.3} fps",
        source.nominal_fps(),
        config.width,
        config.height,
        config.fps
    );

    let mut decoded = 0u64;
    let mut written = 0u64;
    while let Some(frame) = source.next_frame()? {
        decoded += 1;
        if !resampler.keep() {
            continue;
        }
        let text = transcoder.transcode(&frame)?;
        sink.write_frame(&text)?;
        written += 1;
        if written % PROGRESS_EVERY == 0 {
            log::info!("Progress: {written} frames écrites ({decoded} décodées)");
        }
    }

    let output = sink.finish()?;
    log::info!("Terminé : {written}/{decoded} frames → {}", output.display());
    Ok(RunStats {
        decoded,
        written,
        output,
    })
}

/// Première frame texte de la source, sans rien écrire.
///
/// Stops pulling after the first frame; `None` for an empty source.
///
/// # Errors
/// Decode or transcode failure.
pub fn preview(source: &mut dyn Source, config: &RenderConfig) -> Result<Option<TextFrame>> {
    let Some(frame) = source.next_frame()? else {
        return Ok(None);
    };
    let mut transcoder = FrameTranscoder::new(config);
    Ok(Some(transcoder.transcode(&frame)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use va_core::charset::CharsetName;
    use va_core::config::EffectConfig;
    use va_core::error::ConvertError;
    use va_export::{FRAME_MARKER, TextSink};

    fn gray_source(frames: u32, fps: f64) -> ImageSource {
        ImageSource::from_frame(FrameBuffer::filled(320, 240, (140, 140, 140)), fps, frames)
    }

    fn config(invert: bool) -> RenderConfig {
        RenderConfig {
            width: 8,
            height: 4,
            fps: 10.0,
            char_set: CharsetName::Simple,
            effects: EffectConfig {
                invert,
                ..EffectConfig::default()
            },
            ..RenderConfig::default()
        }
    }

    fn to_text(source: &mut dyn Source, config: &RenderConfig) -> (RunStats, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let open_sink = || -> Result<Box<dyn Sink>> { Ok(Box::new(TextSink::create(&path)?)) };
        let stats = convert(source, open_sink, config).unwrap();
        let content = std::fs::read_to_string(&stats.output).unwrap();
        (stats, content)
    }

    fn expected(glyph: char, frames: usize) -> String {
        let row: String = std::iter::repeat_n(glyph, 8).collect();
        let frame = format!("{row}\n{row}\n{row}\n{row}\n{FRAME_MARKER}\n");
        frame.repeat(frames)
    }

    #[test]
    fn flat_gray_video_gives_identical_frames() {
        let (stats, content) = to_text(&mut gray_source(10, 10.0), &config(false));
        assert_eq!((stats.decoded, stats.written), (10, 10));
        assert_eq!(content, expected('+', 10));
    }

    #[test]
    fn invert_gives_complementary_glyph() {
        let (_, content) = to_text(&mut gray_source(10, 10.0), &config(true));
        assert_eq!(content, expected('=', 10));
    }

    #[test]
    fn source_is_thinned_to_target_fps() {
        let (stats, content) = to_text(&mut gray_source(30, 30.0), &config(false));
        assert_eq!(stats.decoded, 30);
        assert!((stats.written as i64 - 10).abs() <= 1, "{}", stats.written);
        assert_eq!(content.matches(FRAME_MARKER).count() as u64, stats.written);
    }

    struct Counting {
        inner: ImageSource,
        pulls: u32,
    }

    impl Source for Counting {
        fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
            self.pulls += 1;
            self.inner.next_frame()
        }
        fn native_size(&self) -> (u32, u32) {
            self.inner.native_size()
        }
        fn nominal_fps(&self) -> f64 {
            self.inner.nominal_fps()
        }
    }

    #[test]
    fn preview_pulls_a_single_frame() {
        let mut source = Counting {
            inner: gray_source(50, 25.0),
            pulls: 0,
        };
        let frame = preview(&mut source, &config(false)).unwrap().unwrap();
        assert_eq!(frame.rows(), ["++++++++"; 4]);
        assert_eq!(source.pulls, 1);
    }

    #[test]
    fn empty_source_still_finishes_sink() {
        let (stats, content) = to_text(&mut gray_source(0, 10.0), &config(false));
        assert_eq!(stats.written, 0);
        assert!(content.is_empty());
    }

    struct BrokenDecoder;

    impl Source for BrokenDecoder {
        fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
            Err(ConvertError::media_open("clip.mkv", "codec non supporté").into())
        }
        fn native_size(&self) -> (u32, u32) {
            (320, 240)
        }
        fn nominal_fps(&self) -> f64 {
            25.0
        }
    }

    #[test]
    fn decoder_failing_on_first_frame_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let open_sink = || -> Result<Box<dyn Sink>> { Ok(Box::new(TextSink::create(&path)?)) };
        let err = convert(&mut BrokenDecoder, open_sink, &config(false))
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::MediaOpen { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn primed_source_does_not_pull_past_the_end() {
        let mut source = Counting {
            inner: gray_source(1, 10.0),
            pulls: 0,
        };
        let (stats, _) = to_text(&mut source, &config(false));
        assert_eq!(stats.written, 1);
        // 1 frame + 1 EOF.
        assert_eq!(source.pulls, 2);

        let mut empty = Counting {
            inner: gray_source(0, 10.0),
            pulls: 0,
        };
        to_text(&mut empty, &config(false));
        assert_eq!(empty.pulls, 1);
    }

    #[test]
    fn missing_input_is_media_open() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["absent.mp4", "absent.png"] {
            let err = open_source(&dir.path().join(name), &config(false))
                .err()
                .unwrap();
            assert!(matches!(
                err.downcast_ref::<ConvertError>(),
                Some(ConvertError::MediaOpen { .. })
            ));
        }
    }
}
