//! Frame sources for vidascii (ffmpeg video, still image) and the
//! frame-rate resampler that thins their output.

pub mod image;
pub mod resample;
pub mod video;

pub use self::image::ImageSource;
pub use resample::RateResampler;
pub use video::VideoSource;
