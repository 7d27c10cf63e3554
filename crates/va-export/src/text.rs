use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use va_core::error::ConvertError;
use va_core::frame::TextFrame;
use va_core::traits::Sink;

/// Ligne séparatrice écrite après chaque frame.
pub const FRAME_MARKER: &str =
    "================================================================================";

/// Frames texte concaténées dans un fichier UTF-8.
///
/// Each frame is its rows, one per line, followed by [`FRAME_MARKER`]. A
/// failed write leaves the partial file in place.
pub struct TextSink {
    path: PathBuf,
    writer: BufWriter<File>,
    frames: u64,
}

impl TextSink {
    /// Create (truncate) the output file.
    ///
    /// # Errors
    /// [`ConvertError::Write`] if the file cannot be created.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| ConvertError::write(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            frames: 0,
        })
    }
}

impl Sink for TextSink {
    fn write_frame(&mut self, frame: &TextFrame) -> Result<()> {
        let mut write = || -> std::io::Result<()> {
            for row in frame.rows() {
                self.writer.write_all(row.as_bytes())?;
                self.writer.write_all(b"\n")?;
            }
            self.writer.write_all(FRAME_MARKER.as_bytes())?;
            self.writer.write_all(b"\n")
        };
        write().map_err(|e| ConvertError::write(&self.path, e))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<PathBuf> {
        self.writer
            .flush()
            .map_err(|e| ConvertError::write(&self.path, e))?;
        log::info!("{} frames texte écrites dans {}", self.frames, self.path.display());
        Ok(self.path)
    }
}
