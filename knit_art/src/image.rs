use std::path::Path;

use image::{DynamicImage, GenericImageView, GrayImage, RgbImage};

use crate::{
    grid::Grid,
    verboser::{Message, Verboser},
};

/// Immutable square greyscale image the canvas is fitted against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetImage {
    pixels: Vec<u8>,
    grid: Grid,
}

impl TargetImage {
    pub fn from_pixels(grid: Grid, pixels: Vec<u8>) -> Result<Self, Error> {
        if !grid.is_square() {
            return Err(Error::NotSquare {
                height: grid.height,
                width: grid.width,
            });
        }
        if grid.is_empty() {
            return Err(Error::Empty);
        }
        if pixels.len() != grid.len() {
            return Err(Error::Length {
                expected: grid.len(),
                found: pixels.len(),
            });
        }
        Ok(Self { pixels, grid })
    }

    /// A `size` x `size` image with every pixel set to `value`.
    pub fn filled(size: usize, value: u8) -> Self {
        let grid = Grid::square(size);
        Self {
            pixels: vec![value; grid.len()],
            grid,
        }
    }

    pub fn open(
        path: impl AsRef<Path>,
        size: u32,
        background: u8,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        let source = image::open(path)?;
        verboser.verbose(Message::Preparing { size });
        Self::prepare(&source, size, background)
    }

    /// Turns `source` into a `size` x `size` target: luminance greyscale, center crop to
    /// a square, nearest neighbour resize and a circular mask. Pixels outside the
    /// inscribed circle are set to `background`. Greyscale sources keep their values.
    pub fn prepare(source: &DynamicImage, size: u32, background: u8) -> Result<Self, Error> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 || size == 0 {
            return Err(Error::Empty);
        }
        let channels = Channels::from(source);
        let side = width.min(height);
        let top = (height - side) / 2;
        let left = (width - side) / 2;

        let source_index =
            |out: u32| ((out as u64 * side as u64) / size as u64).min(side as u64 - 1) as u32;
        let center = (size as f64 - 1.0) / 2.0;
        let radius = size as f64 / 2.0;

        let mut pixels = Vec::with_capacity(size as usize * size as usize);
        for y in 0..size {
            let src_y = top + source_index(y);
            let dy = y as f64 - center;
            for x in 0..size {
                let dx = x as f64 - center;
                if dx * dx + dy * dy <= radius * radius {
                    pixels.push(channels.luma(left + source_index(x), src_y));
                } else {
                    pixels.push(background);
                }
            }
        }
        Self::from_pixels(Grid::square(size as usize), pixels)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn size(&self) -> usize {
        self.grid.width
    }

    pub fn to_luma(&self) -> Option<GrayImage> {
        GrayImage::from_raw(
            self.grid.width as u32,
            self.grid.height as u32,
            self.pixels.clone(),
        )
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.to_luma().ok_or(Error::Empty)?.save(path)?;
        Ok(())
    }
}

impl TryFrom<GrayImage> for TargetImage {
    type Error = Error;

    fn try_from(value: GrayImage) -> Result<Self, Self::Error> {
        let grid = Grid::new(value.height() as usize, value.width() as usize);
        Self::from_pixels(grid, value.into_raw())
    }
}

enum Channels {
    Grey(GrayImage),
    Colour(RgbImage),
}

impl From<&DynamicImage> for Channels {
    fn from(value: &DynamicImage) -> Self {
        if value.color().has_color() {
            Channels::Colour(value.to_rgb8())
        } else {
            Channels::Grey(value.to_luma8())
        }
    }
}

impl Channels {
    fn luma(&self, x: u32, y: u32) -> u8 {
        match self {
            Channels::Grey(image) => image.get_pixel(x, y).0[0],
            Channels::Colour(image) => {
                let [r, g, b] = image.get_pixel(x, y).0;
                let grey = 0.299f32 * r as f32 + 0.587f32 * g as f32 + 0.114f32 * b as f32;
                grey.clamp(0.0, 255.0) as u8
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The image has no pixels")]
    Empty,
    #[error("The target must be square, got {height}x{width}")]
    NotSquare { height: usize, width: usize },
    #[error("Expected {expected} pixels, found {found}")]
    Length { expected: usize, found: usize },
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

#[cfg(test)]
mod tests {
    use image::{Luma, LumaA, Rgb};

    use super::*;

    #[test]
    fn white_source_stays_white_inside_the_circle() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([255, 255, 255])));
        let target = TargetImage::prepare(&source, 8, 0).unwrap();
        assert_eq!(target.size(), 8);
        let pixels = target.pixels();
        // Center is inside the mask, corners are not.
        assert_eq!(pixels[4 * 8 + 4], 255);
        assert_eq!(pixels[0], 0);
        assert_eq!(pixels[63], 0);
    }

    #[test]
    fn uses_luminance_weights() {
        let source = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([200, 100, 50])));
        let target = TargetImage::prepare(&source, 4, 255).unwrap();
        // 0.299 * 200 + 0.587 * 100 + 0.114 * 50 = 124.2
        assert_eq!(target.pixels()[4 + 1], 124);
    }

    #[test]
    fn grey_sources_keep_every_level() {
        for value in 0..=255u8 {
            let source = DynamicImage::ImageLuma8(GrayImage::from_pixel(4, 4, Luma([value])));
            let target = TargetImage::prepare(&source, 4, 0).unwrap();
            assert_eq!(target.pixels()[4 + 1], value);

            let source = DynamicImage::ImageLumaA8(image::ImageBuffer::from_pixel(
                4,
                4,
                LumaA([value, 255]),
            ));
            let target = TargetImage::prepare(&source, 4, 0).unwrap();
            assert_eq!(target.pixels()[4 + 1], value);
        }
    }

    #[test]
    fn crops_the_center_square() {
        // Left third black, middle third white, right third black.
        let source = RgbImage::from_fn(9, 3, |x, _| {
            if (3..6).contains(&x) {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let target = TargetImage::prepare(&DynamicImage::ImageRgb8(source), 3, 7).unwrap();
        // Every pixel inside the circle comes from the white middle square.
        assert_eq!(target.pixels()[4], 255);
        assert_eq!(target.pixels()[1], 255);
    }

    #[test]
    fn rejects_empty_sources() {
        let source = DynamicImage::ImageRgb8(RgbImage::new(0, 5));
        assert!(matches!(
            TargetImage::prepare(&source, 4, 255),
            Err(Error::Empty)
        ));
    }

    #[test]
    fn gray_images_must_be_square() {
        let result = TargetImage::try_from(GrayImage::new(4, 3));
        assert!(matches!(
            result,
            Err(Error::NotSquare {
                height: 3,
                width: 4
            })
        ));
        assert!(TargetImage::try_from(GrayImage::new(4, 4)).is_ok());
    }
}
