//! Configuration, types, and shared structures for vidascii.
//!
//! This crate contains the data model, traits, error kinds and configuration
//! logic shared across the vidascii workspace.

pub mod charset;
pub mod config;
pub mod error;
pub mod frame;
pub mod process;
pub mod traits;

pub use charset::{CharacterSet, CharsetName};
pub use config::{EffectConfig, OutputFormat, Quality, RenderConfig};
pub use error::ConvertError;
pub use frame::{FrameBuffer, LumaFrame, TextFrame};
pub use traits::{Sink, Source};
