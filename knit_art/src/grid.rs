use crate::{geometry::Point, raster::Line};

/// Dimensions of a pixel buffer stored row-major.
///
/// Logical coordinates grow upwards: `y == 0` is the bottom row of the buffer, so the
/// buffer row of a point is `height - 1 - y`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub height: usize,
    pub width: usize,
}

impl Grid {
    pub fn new(height: usize, width: usize) -> Self {
        Self { height, width }
    }

    pub fn square(size: usize) -> Self {
        Self::new(size, size)
    }

    pub fn len(&self) -> usize {
        self.height * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_square(&self) -> bool {
        self.height == self.width
    }

    pub fn index_of(&self, point: Point<u32>) -> Option<usize> {
        let (x, y) = (point.x as usize, point.y as usize);
        if x < self.width && y < self.height {
            Some(unsafe { self.index_of_unchecked(point) })
        } else {
            None
        }
    }

    /// # Safety
    ///
    /// `point` must lie inside the grid.
    pub unsafe fn index_of_unchecked(&self, point: Point<u32>) -> usize {
        (self.height - 1 - point.y as usize) * self.width + point.x as usize
    }

    pub fn get_pixel_indexes_in_line(&self, line: Line) -> impl Iterator<Item = usize> + '_ {
        line.filter_map(|point| self.index_of(point))
    }
}
