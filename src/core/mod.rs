//! Core module - Application foundation

mod app;
mod config;
#[macro_use]
pub mod logger;
mod surface;

pub use app::run;
pub use config::{is_debug, is_verbose, DEBUG, VERBOSE};
pub use surface::{PixelSurface, SharedSurface, LOGICAL_SIDE};
