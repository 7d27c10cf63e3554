use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use anyhow::Result;
use va_core::error::ConvertError;
use va_core::frame::FrameBuffer;
use va_core::process::StderrTail;

/// Encode des frames RGBA brutes en MP4 H.264 via ffmpeg.
///
/// Output is `libx264` / `yuv420p`, which requires even pixel dimensions;
/// callers pad the canvas before handing frames over. Dropped without
/// [`Mp4Muxer::finish`], the encoder is killed and reaped.
pub struct Mp4Muxer {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr: Option<StderrTail>,
    width: u32,
    height: u32,
}

impl Mp4Muxer {
    /// Spawn the ffmpeg encoder.
    ///
    /// # Errors
    /// [`ConvertError::Encode`] if the dimensions are odd or ffmpeg cannot be
    /// started (not in PATH).
    pub fn new(output_path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ConvertError::Encode(format!(
                "yuv420p exige des dimensions paires non nulles (reçu {width}x{height})"
            ))
            .into());
        }

        let mut child = Command::new("ffmpeg")
            .args(["-y", "-f", "rawvideo", "-vcodec", "rawvideo", "-s"])
            .arg(format!("{width}x{height}"))
            .args(["-pix_fmt", "rgba", "-r"])
            .arg(format!("{fps}"))
            .args([
                "-i",
                "-",
                "-an",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-hide_banner",
                "-loglevel",
                "error",
            ])
            .arg(output_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ConvertError::Encode(format!(
                    "Échec du lancement de l'encodeur ffmpeg (est-il dans PATH ?) : {e}"
                ))
            })?;
        log::debug!("ffmpeg (encode) lancé : {width}x{height} @ {fps} fps");

        let stdin = child.stdin.take();
        let stderr = match child.stderr.take().map(StderrTail::spawn).transpose() {
            Ok(stderr) => stderr,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ConvertError::Encode(format!("{e:#}")).into());
            }
        };

        Ok(Self {
            child: Some(child),
            stdin,
            stderr,
            width,
            height,
        })
    }

    /// Pousse une frame dans le pipe.
    ///
    /// # Errors
    /// [`ConvertError::Encode`] on a size mismatch or if ffmpeg closed its input.
    pub fn write_frame(&mut self, fb: &FrameBuffer) -> Result<()> {
        if fb.width != self.width || fb.height != self.height {
            return Err(ConvertError::Encode(format!(
                "frame {}x{} px, encodeur ouvert pour {}x{}",
                fb.width, fb.height, self.width, self.height
            ))
            .into());
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ConvertError::Encode("stdin ffmpeg fermé".into()))?;
        stdin
            .write_all(&fb.data)
            .map_err(|e| ConvertError::Encode(format!("ffmpeg a refusé la frame : {e}")))?;
        Ok(())
    }

    /// Ferme le flux et attend la fin de l'encodage.
    ///
    /// # Errors
    /// [`ConvertError::Encode`] if ffmpeg exits with a failure status.
    pub fn finish(mut self) -> Result<()> {
        // EOF sur stdin : ffmpeg termine l'encodage.
        self.stdin = None;
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        let status = child
            .wait()
            .map_err(|e| ConvertError::Encode(format!("attente de ffmpeg : {e}")))?;
        let stderr = self.stderr.take().map(StderrTail::join).unwrap_or_default();
        if !status.success() {
            return Err(ConvertError::Encode(format!(
                "ffmpeg encoder error ({status}) : {}",
                stderr.trim()
            ))
            .into());
        }
        Ok(())
    }
}

impl Drop for Mp4Muxer {
    fn drop(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            log::debug!("ffmpeg (encode) arrêté sans finaliser la sortie");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_dimensions_are_rejected_before_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let err = Mp4Muxer::new(&dir.path().join("out.mp4"), 63, 64, 10.0)
            .err()
            .unwrap();
        assert!(matches!(
            err.downcast_ref::<ConvertError>(),
            Some(ConvertError::Encode(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn drop_kills_and_waits_the_child() {
        // Un `cat` bloqué sur stdin tient lieu d'encodeur.
        let mut child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap();
        let pid = child.id();
        let muxer = Mp4Muxer {
            stdin: child.stdin.take(),
            stderr: child.stderr.take().map(|e| StderrTail::spawn(e).unwrap()),
            child: Some(child),
            width: 2,
            height: 2,
        };
        drop(muxer);
        // Processus récolté : pas de zombie.
        let status = std::fs::read_to_string(format!("/proc/{pid}/status")).unwrap_or_default();
        assert!(!status.contains("State:\tZ"), "{status}");
    }

    #[test]
    fn muxer_new_does_not_panic() {
        // Selon la présence de ffmpeg, les deux issues sont valides.
        let dir = tempfile::tempdir().unwrap();
        match Mp4Muxer::new(&dir.path().join("out.mp4"), 64, 64, 30.0) {
            Ok(mut muxer) => {
                let black = FrameBuffer::new(64, 64);
                assert!(muxer.write_frame(&FrameBuffer::new(32, 32)).is_err());
                if muxer.write_frame(&black).is_ok() {
                    let _ = muxer.finish();
                }
            }
            Err(err) => assert!(matches!(
                err.downcast_ref::<ConvertError>(),
                Some(ConvertError::Encode(_))
            )),
        }
    }
}
