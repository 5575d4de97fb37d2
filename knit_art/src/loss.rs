//! Mean squared error between a canvas and its target.

use num_traits::AsPrimitive;

use crate::{canvas::Canvas, image::TargetImage, Float};

#[inline]
fn sq_diff<S: Float>(pixel: u8, target: u8) -> S
where
    u8: AsPrimitive<S>,
{
    let pixel: S = pixel.as_();
    let target: S = target.as_();
    let diff = pixel - target;
    diff * diff
}

/// Loss computed from scratch over every pixel.
pub fn full<S: Float>(canvas: &Canvas, image: &TargetImage) -> S
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
{
    let sum = canvas
        .pixels()
        .iter()
        .zip(image.pixels())
        .fold(S::ZERO, |acc, (&pixel, &target)| acc + sq_diff::<S>(pixel, target));
    let count: S = canvas.pixels().len().as_();
    sum / count
}

/// Loss after replacing the `baseline` pixels of `path` by the `canvas` ones, given the
/// loss of `baseline`. Only the pixels of `path` are visited.
pub fn incremental<S: Float>(
    canvas: &Canvas,
    baseline: &Canvas,
    path: &[usize],
    image: &TargetImage,
    loss: S,
) -> S
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
{
    let (canvas, baseline, target) = (canvas.pixels(), baseline.pixels(), image.pixels());
    let mut old = S::ZERO;
    let mut new = S::ZERO;
    for &index in path {
        old += sq_diff::<S>(baseline[index], target[index]);
        new += sq_diff::<S>(canvas[index], target[index]);
    }
    let count: S = target.len().as_();
    loss - old / count + new / count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{darkness::Opaqueness, geometry::Point, grid::Grid, raster::Path};

    #[test]
    fn full_of_white_against_black() {
        let grid = Grid::square(8);
        let loss: f64 = full(&Canvas::white(grid), &TargetImage::filled(8, 0));
        assert_eq!(loss, 65025.0);
        let loss: f32 = full(&Canvas::white(grid), &TargetImage::filled(8, 255));
        assert_eq!(loss, 0.0);
    }

    #[test]
    fn incremental_matches_full() {
        let grid = Grid::square(12);
        let pixels = (0..144).map(|i| (i * 7 % 256) as u8).collect();
        let image = TargetImage::from_pixels(grid, pixels).unwrap();
        let baseline = Canvas::white(grid);
        let mut canvas = baseline.clone();
        let path = Path::between(&grid, Point::new(0, 2), Point::new(11, 9));
        canvas.apply(&path, Opaqueness::new(90).unwrap());

        let before: f64 = full(&baseline, &image);
        let after = incremental(&canvas, &baseline, &path, &image, before);
        assert!((after - full::<f64>(&canvas, &image)).abs() < 1e-9);
    }

    #[test]
    fn empty_path_keeps_the_loss() {
        let grid = Grid::square(4);
        let canvas = Canvas::white(grid);
        let image = TargetImage::filled(4, 10);
        assert_eq!(incremental(&canvas, &canvas, &[], &image, 3.5f64), 3.5);
    }
}
