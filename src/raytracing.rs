pub mod camera;
pub mod core;
pub mod error;
pub mod material;
pub mod math;
pub mod output;
pub mod parser;
pub mod render;

pub use math::*;
