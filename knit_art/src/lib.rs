pub mod geometry {
    pub mod point;

    pub use point::Point;
}

mod algorithm;
pub mod canvas;
pub mod config;
pub mod darkness;
mod float;
pub mod grid;
pub mod image;
pub mod loss;
pub mod pins;
pub mod raster;
pub mod verboser;

pub use algorithm::*;
pub use canvas::{Board, Canvas};
pub use config::{Config, Precision, Settings};
pub use darkness::Opaqueness;
pub use float::Float;
pub use grid::Grid;
pub use image::TargetImage;
pub use pins::PinLayout;
