//! Per-frame transcoding engine for vidascii.
//!
//! Converts decoded frames into text frames: luminance effects, depth
//! compositing, resampling to the glyph grid and quantization.

pub mod blur;
pub mod depth;
pub mod edge;
pub mod effects;
pub mod mapper;
pub mod resize;
pub mod transcoder;

pub use effects::{EffectChain, Stage};
pub use mapper::GlyphMapper;
pub use transcoder::FrameTranscoder;
