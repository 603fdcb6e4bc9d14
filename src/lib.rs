#[macro_use]
mod builder;

pub mod encoders;
pub mod error;
pub mod input;
pub mod options;

pub use error::{Error, GeometryError, Result};
pub use rsmpeg::ffi;
