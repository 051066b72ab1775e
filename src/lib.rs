pub mod camera;
pub mod driver;
pub mod error;
pub mod file;
pub mod math;
pub mod options;
pub mod orrery;
pub mod render;

pub use error::OrreryError;
