use crate::{darkness::Opaqueness, geometry::Point, grid::Grid};

/// Square greyscale pixel buffer threads are drawn on. `255` is white.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Canvas {
    pixels: Vec<u8>,
    grid: Grid,
}

impl Canvas {
    pub fn filled(grid: Grid, value: u8) -> Self {
        Self {
            pixels: vec![value; grid.len()],
            grid,
        }
    }

    pub fn white(grid: Grid) -> Self {
        Self::filled(grid, u8::MAX)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn get(&self, point: Point<u32>) -> Option<u8> {
        self.grid.index_of(point).map(|index| self.pixels[index])
    }

    /// Darkens every pixel of `path`.
    pub fn apply(&mut self, path: &[usize], opaqueness: Opaqueness) {
        for &index in path {
            let pixel = &mut self.pixels[index];
            *pixel = opaqueness.compute(*pixel);
        }
    }

    /// Copies the pixels of `path` back from `baseline`.
    pub fn restore_from(&mut self, path: &[usize], baseline: &Canvas) {
        for &index in path {
            self.pixels[index] = baseline.pixels[index];
        }
    }

    /// Sets the given pixels to black.
    pub fn mark(&mut self, points: impl IntoIterator<Item = Point<u32>>) {
        for point in points {
            if let Some(index) = self.grid.index_of(point) {
                self.pixels[index] = 0;
            }
        }
    }
}

/// Buffer a candidate thread is tried on and undone from. The baseline must not change
/// while a trial is applied.
pub trait Workspace {
    fn canvas(&self) -> &Canvas;

    fn baseline(&self) -> &Canvas;

    fn apply(&mut self, path: &[usize], opaqueness: Opaqueness);

    fn restore(&mut self, path: &[usize]);
}

/// Working canvas plus the baseline holding only committed threads.
///
/// Both buffers are identical except while a single trial thread is applied.
#[derive(Clone, Debug)]
pub struct Board {
    canvas: Canvas,
    baseline: Canvas,
}

impl Board {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            baseline: canvas.clone(),
            canvas,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn baseline(&self) -> &Canvas {
        &self.baseline
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Makes a thread permanent on both buffers.
    pub fn commit(&mut self, path: &[usize], opaqueness: Opaqueness) {
        self.canvas.apply(path, opaqueness);
        self.baseline.apply(path, opaqueness);
    }

    pub fn is_settled(&self) -> bool {
        self.canvas == self.baseline
    }
}

impl Workspace for Board {
    fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    fn baseline(&self) -> &Canvas {
        &self.baseline
    }

    /// Applies a trial thread to the working canvas only.
    fn apply(&mut self, path: &[usize], opaqueness: Opaqueness) {
        self.canvas.apply(path, opaqueness);
    }

    /// Undoes a trial thread.
    fn restore(&mut self, path: &[usize]) {
        self.canvas.restore_from(path, &self.baseline);
    }
}

/// Private copy of a shared baseline, used to try threads without touching the
/// shared canvas.
pub struct Scratch<'a> {
    canvas: &'a mut Canvas,
    baseline: &'a Canvas,
}

impl<'a> Scratch<'a> {
    /// `canvas` must hold the same pixels as `baseline`.
    pub fn new(canvas: &'a mut Canvas, baseline: &'a Canvas) -> Self {
        debug_assert_eq!(canvas.grid(), baseline.grid());
        Self { canvas, baseline }
    }
}

impl Workspace for Scratch<'_> {
    fn canvas(&self) -> &Canvas {
        self.canvas
    }

    fn baseline(&self) -> &Canvas {
        self.baseline
    }

    fn apply(&mut self, path: &[usize], opaqueness: Opaqueness) {
        self.canvas.apply(path, opaqueness);
    }

    fn restore(&mut self, path: &[usize]) {
        self.canvas.restore_from(path, self.baseline);
    }
}
