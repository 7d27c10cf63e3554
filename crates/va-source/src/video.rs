// Décodage via ffmpeg en subprocess (std::process::Command), sans binding C.
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
//   - `probe_video`       : interroge ffprobe pour width/height/fps/durée
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout
//   - `VideoSource`       : lit une frame par appel, synchrone, libère ffmpeg au drop

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use va_core::config::Quality;
use va_core::error::ConvertError;
use va_core::frame::FrameBuffer;
use va_core::process::StderrTail;
use va_core::traits::Source;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    /// Largeur native (px).
    pub width: u32,
    /// Hauteur native (px).
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0, 60.0).
    pub fps: f64,
    /// Container duration, when ffprobe reports one.
    pub duration_secs: Option<f64>,
}

impl VideoInfo {
    /// Approximate decoded frame count, for progress reporting.
    #[must_use]
    pub fn estimated_frames(&self) -> Option<u64> {
        self.duration_secs
            .filter(|d| d.is_finite() && *d > 0.0)
            .map(|d| (d * self.fps).round() as u64)
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// [`ConvertError::MediaOpen`] si le fichier est absent, si `ffprobe` est
/// introuvable, ou si aucun flux vidéo décodable n'est présent.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    if !path.exists() {
        return Err(ConvertError::media_open(path, "fichier introuvable").into());
    }
    let path_str = path
        .to_str()
        .ok_or_else(|| ConvertError::media_open(path, "chemin non-UTF8"))?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate:format=duration",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| {
            ConvertError::media_open(
                path,
                format!("impossible de lancer ffprobe ({e}). Vérifiez qu'il est dans le PATH."),
            )
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ConvertError::media_open(path, stderr.trim().to_string()).into());
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text)
        .ok_or_else(|| ConvertError::media_open(path, "aucun flux vidéo décodable"))?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps — {}",
        info.width,
        info.height,
        info.fps,
        path.display()
    );
    Ok(info)
}

/// Parse `key=value` lines printed by ffprobe.
///
/// `avg_frame_rate` wins over `r_frame_rate` when both are usable.
/// Returns `None` without a positive size or a usable frame rate.
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<VideoInfo> {
    let mut width: u32 = 0;
    let mut height: u32 = 0;
    let mut r_rate: Option<f64> = None;
    let mut avg_rate: Option<f64> = None;
    let mut duration: Option<f64> = None;

    for line in text.lines() {
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let val = val.trim();
        match key.trim() {
            "width" => width = val.parse().unwrap_or(0),
            "height" => height = val.parse().unwrap_or(0),
            "r_frame_rate" => r_rate = parse_rate(val),
            "avg_frame_rate" => avg_rate = parse_rate(val),
            "duration" => duration = val.parse().ok(),
            _ => {}
        }
    }

    if width == 0 || height == 0 {
        return None;
    }
    let fps = avg_rate.or(r_rate)?;
    Some(VideoInfo {
        width,
        height,
        fps,
        duration_secs: duration,
    })
}

/// Format: "24/1" ou "30000/1001", ou un décimal.
fn parse_rate(val: &str) -> Option<f64> {
    let rate = match val.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => val.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Fit `(width, height)` inside `cap`, aspect preserved, never upscaled.
#[must_use]
pub fn fit_within(width: u32, height: u32, cap: Option<(u32, u32)>) -> (u32, u32) {
    let Some((max_w, max_h)) = cap else {
        return (width, height);
    };
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = (f64::from(max_w) / f64::from(width)).min(f64::from(max_h) / f64::from(height));
    let w = (f64::from(width) * scale).round().max(1.0) as u32;
    let h = (f64::from(height) * scale).round().max(1.0) as u32;
    (w.min(max_w), h.min(max_h))
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// stderr est piped : l'appelant doit le drainer ([`StderrTail`]).
/// `-an` supprime l'audio. Aucun `-r` : le rééchantillonnage temporel est
/// fait par [`crate::resample::RateResampler`].
///
/// # Errors
/// Returns an error if ffmpeg cannot be spawned.
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, native: (u32, u32)) -> Result<Child> {
    let path_str = path.to_str().context("chemin vidéo non-UTF8")?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "error", "-i", path_str, "-an"]);
    if (w, h) != native {
        cmd.args(["-vf", &format!("scale={w}:{h}:flags=area")]);
    }
    let child = cmd
        .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("impossible de lancer ffmpeg. Vérifiez qu'il est dans le PATH.")?;
    log::debug!("ffmpeg spawné: {w}x{h} depuis {}", path.display());
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion.
///
/// # Errors
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Source vidéo décodée par un processus ffmpeg, une frame par appel.
///
/// Forward-only. The ffmpeg child is waited on at end of stream and killed
/// when the source is dropped early.
///
/// # Example
/// ```no_run
/// use va_core::config::Quality;
/// use va_core::traits::Source;
/// use va_source::video::VideoSource;
/// use std::path::Path;
/// let mut source = VideoSource::open(Path::new("clip.mp4"), Quality::Medium).unwrap();
/// while let Some(frame) = source.next_frame().unwrap() {
///     assert_eq!(frame.data.len(), frame.expected_len());
/// }
/// ```
pub struct VideoSource {
    path: PathBuf,
    info: VideoInfo,
    size: (u32, u32),
    child: Option<Child>,
    stdout: Option<ChildStdout>,
    stderr: Option<StderrTail>,
    frames_read: u64,
}

impl VideoSource {
    /// Probe `path` and start decoding at the quality tier's working size.
    ///
    /// # Errors
    /// [`ConvertError::MediaOpen`] if the input cannot be probed or ffmpeg
    /// cannot be started.
    pub fn open(path: &Path, quality: Quality) -> Result<Self> {
        let info = probe_video(path)?;
        let size = fit_within(info.width, info.height, quality.decode_cap());
        let mut child = spawn_ffmpeg_pipe(path, size.0, size.1, (info.width, info.height))
            .map_err(|e| ConvertError::media_open(path, format!("{e:#}")))?;
        let stdout = child.stdout.take();
        let stderr = match child.stderr.take().map(StderrTail::spawn).transpose() {
            Ok(stderr) => stderr,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::media_open(path, format!("{e:#}")).into());
            }
        };
        if let Some(total) = info.estimated_frames() {
            log::info!("~{total} frames à décoder");
        }
        if size != (info.width, info.height) {
            log::info!(
                "Décodage réduit à {}x{} (qualité {quality})",
                size.0,
                size.1
            );
        }
        Ok(Self {
            path: path.to_path_buf(),
            info,
            size,
            child: Some(child),
            stdout,
            stderr,
            frames_read: 0,
        })
    }

    /// Wait for ffmpeg after EOF and turn a failed exit into an error.
    fn finish_child(&mut self) -> Result<()> {
        self.stdout = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child.wait().context("attente du processus ffmpeg")?;
        let stderr = self.stderr.take().map(StderrTail::join).unwrap_or_default();
        if status.success() {
            log::info!(
                "Fin du flux vidéo : {} frames décodées ({})",
                self.frames_read,
                self.path.display()
            );
            return Ok(());
        }
        Err(ConvertError::media_open(
            &self.path,
            format!(
                "ffmpeg a échoué après {} frames : {}",
                self.frames_read,
                stderr.trim()
            ),
        )
        .into())
    }
}

impl Source for VideoSource {
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let Some(stdout) = self.stdout.as_mut() else {
            return Ok(None);
        };
        let mut frame = FrameBuffer::new(self.size.0, self.size.1);
        let complete = read_exact_or_eof(stdout, &mut frame.data)
            .with_context(|| format!("lecture du pipe ffmpeg ({})", self.path.display()))?;
        if complete {
            self.frames_read += 1;
            return Ok(Some(frame));
        }
        self.finish_child()?;
        Ok(None)
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn nominal_fps(&self) -> f64 {
        self.info.fps
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            log::debug!("ffmpeg arrêté après {} frames", self.frames_read);
        }
    }
}
