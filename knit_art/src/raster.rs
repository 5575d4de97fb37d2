//! Digital lines between pins.
//!
//! A line is walked one pixel per unit step along its dominant axis. The walk covers
//! the half-open range `[min, max)` of that axis, so the pixel at the far end of the
//! dominant axis is never part of the line.

use std::ops::{Deref, Range};

use crate::{geometry::Point, grid::Grid};

#[derive(Clone, Debug)]
pub enum Line {
    /// Both ends share `x`; walks `y`.
    Vertical { x: u32, y: Range<u32> },
    /// `|slope| < 1`; walks `x`.
    Shallow {
        origin: Point<f64>,
        slope: f64,
        x: Range<u32>,
    },
    /// `|slope| >= 1`; walks `y`.
    Steep {
        origin: Point<f64>,
        slope: f64,
        y: Range<u32>,
    },
}

/// Rasterizes the chord from `from` to `to`.
pub fn rasterize(from: Point<u32>, to: Point<u32>) -> Line {
    if from.x == to.x {
        return Line::Vertical {
            x: from.x,
            y: from.y.min(to.y)..from.y.max(to.y),
        };
    }
    let delta = to.as_::<f64>() - from.as_::<f64>();
    let slope = delta.y / delta.x;
    let origin = from.as_::<f64>();
    if slope.abs() < 1.0 {
        Line::Shallow {
            origin,
            slope,
            x: from.x.min(to.x)..from.x.max(to.x),
        }
    } else {
        Line::Steep {
            origin,
            slope,
            y: from.y.min(to.y)..from.y.max(to.y),
        }
    }
}

impl Iterator for Line {
    type Item = Point<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Line::Vertical { x, y } => y.next().map(|y| Point::new(*x, y)),
            Line::Shallow { origin, slope, x } => x.next().map(|x| {
                let y = *slope * (x as f64 - origin.x) + origin.y;
                Point::new(x, y.round_ties_even() as u32)
            }),
            Line::Steep { origin, slope, y } => y.next().map(|y| {
                let x = (y as f64 - origin.y) / *slope + origin.x;
                Point::new(x.round_ties_even() as u32, y)
            }),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Line::Vertical { y, .. } | Line::Steep { y, .. } => y.size_hint(),
            Line::Shallow { x, .. } => x.size_hint(),
        }
    }
}

impl ExactSizeIterator for Line {}

/// Buffer indexes of the pixels crossed by a thread. Reused between candidates to avoid
/// reallocating for every trial.
#[derive(Clone, Debug, Default)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn between(grid: &Grid, from: Point<u32>, to: Point<u32>) -> Self {
        let mut path = Self::new();
        path.trace(grid, from, to);
        path
    }

    pub fn trace(&mut self, grid: &Grid, from: Point<u32>, to: Point<u32>) {
        self.0.clear();
        self.0
            .extend(grid.get_pixel_indexes_in_line(rasterize(from, to)));
    }
}

impl Deref for Path {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
