use std::path::PathBuf;

use anyhow::Result;

use crate::frame::{FrameBuffer, TextFrame};

/// Fournit les frames décodées au pipeline, dans l'ordre, une à la fois.
///
/// Implémenté par : `VideoSource`, `ImageSource`.
///
/// Forward-only: once `next_frame` returns `Ok(None)` the source is
/// exhausted, and a second pass needs a freshly opened source. Dropping a
/// source releases its decoder.
///
/// # Example
/// ```
/// use va_core::traits::Source;
/// use va_core::frame::FrameBuffer;
///
/// struct Empty;
/// impl Source for Empty {
///     fn next_frame(&mut self) -> anyhow::Result<Option<FrameBuffer>> { Ok(None) }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
///     fn nominal_fps(&self) -> f64 { 25.0 }
/// }
/// ```
pub trait Source {
    /// Retourne la prochaine frame, ou `None` en fin de flux.
    ///
    /// # Errors
    /// Decoder failure mid-stream.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>>;

    /// Dimensions des frames produites.
    fn native_size(&self) -> (u32, u32);

    /// Nominal frame rate of the stream.
    fn nominal_fps(&self) -> f64;
}

/// Sérialise le flux de `TextFrame` dans un artefact persistant.
///
/// Frames arrive in output order. `finish` flushes and returns the path that
/// was written.
///
/// # Example
/// ```
/// use va_core::traits::Sink;
/// use va_core::frame::TextFrame;
/// use std::path::PathBuf;
///
/// struct Count(usize);
/// impl Sink for Count {
///     fn write_frame(&mut self, _frame: &TextFrame) -> anyhow::Result<()> { self.0 += 1; Ok(()) }
///     fn finish(self: Box<Self>) -> anyhow::Result<PathBuf> { Ok(PathBuf::new()) }
/// }
/// ```
pub trait Sink {
    /// Append one frame.
    ///
    /// # Errors
    /// `ConvertError::Write` or `ConvertError::Encode` depending on the sink.
    fn write_frame(&mut self, frame: &TextFrame) -> Result<()>;

    /// Finalise l'artefact et retourne son chemin.
    ///
    /// # Errors
    /// Flush or encoder finalisation failure.
    fn finish(self: Box<Self>) -> Result<PathBuf>;
}
