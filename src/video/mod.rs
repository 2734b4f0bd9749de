//! Video module - Frame decoding and presentation pipeline

pub mod decoder;
pub mod pipeline;
mod renderer;

pub use decoder::{inflate, RenderFrame};
pub use pipeline::start_frame_pipeline;
pub use renderer::MirrorRenderer;
