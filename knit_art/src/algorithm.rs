use std::ops::Range;

use image::{GrayImage, ImageResult, Luma};
use num_traits::AsPrimitive;
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::{
    canvas::{Board, Canvas, Scratch, Workspace},
    config::Config,
    darkness::Opaqueness,
    image::TargetImage,
    loss,
    pins::PinLayout,
    raster::Path,
    verboser::{Message, Verboser},
    Float, Grid,
};

/// How the candidates of a single search step are evaluated. Both produce the same
/// threads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Search {
    /// Tries every candidate on the shared canvas and undoes it before the next one.
    Sequential,
    /// Splits the candidates between one worker per CPU, each trying threads on a
    /// private copy of the baseline.
    #[default]
    Parallel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
    /// The last commit changed the loss by less than the tolerance.
    Converged,
    /// No candidate thread lowers the loss.
    NoImprovement,
    /// The iteration cap was reached. Computing with a higher cap resumes the search.
    Capped,
}

impl Stop {
    pub fn is_final(self) -> bool {
        !matches!(self, Stop::Capped)
    }
}

#[derive(Clone, Copy, Debug)]
struct Candidate<S> {
    pin: usize,
    loss: S,
}

/// Everything a search step reads. Shared by every worker.
struct Trial<'a, S> {
    grid: Grid,
    pins: &'a PinLayout,
    image: &'a TargetImage,
    opaqueness: Opaqueness,
    from: usize,
    loss: S,
}

impl<S: Float> Trial<'_, S>
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
{
    /// Best candidate in `candidates` strictly improving the current loss. Ties keep the
    /// lowest pin.
    fn run(
        &self,
        workspace: &mut impl Workspace,
        path: &mut Path,
        candidates: Range<usize>,
    ) -> Option<Candidate<S>> {
        let from = self.pins[self.from];
        let mut best = None;
        let mut best_loss = self.loss;
        for pin in candidates {
            if pin == self.from {
                continue;
            }
            path.trace(&self.grid, from, self.pins[pin]);
            workspace.apply(path, self.opaqueness);
            let loss = loss::incremental(
                workspace.canvas(),
                workspace.baseline(),
                path,
                self.image,
                self.loss,
            );
            if loss < best_loss {
                best_loss = loss;
                best = Some(Candidate { pin, loss });
            }
            workspace.restore(path);
        }
        best
    }
}

struct Worker<S> {
    range: Range<usize>,
    scratch: Canvas,
    path: Path,
    result: Option<Candidate<S>>,
}

impl<S> Worker<S> {
    fn new(scratch: Canvas) -> Self {
        Self {
            range: 0..0,
            scratch,
            path: Path::new(),
            result: None,
        }
    }
}

/// Greedy thread optimizer.
///
/// Starting from a white canvas and pin 0, every iteration tries a thread from the last
/// pin to every other pin and commits the one lowering the loss the most.
pub struct Optimizer<S> {
    image: TargetImage,
    pins: PinLayout,
    board: Board,
    opaqueness: Opaqueness,
    tolerance: S,
    search: Search,
    workers: Vec<Worker<S>>,
    path: Path,
    loss: S,
    last_pin: usize,
    steps: Vec<usize>,
    iterations: usize,
    stop: Option<Stop>,
}

impl<S: Float> Optimizer<S>
where
    u8: AsPrimitive<S>,
    usize: AsPrimitive<S>,
    f64: AsPrimitive<S>,
{
    pub fn new(
        image: TargetImage,
        config: &Config,
        verboser: &mut impl Verboser,
    ) -> Result<Self, Error> {
        let expected = config.resolution() as usize;
        if image.size() != expected {
            return Err(Error::SizeMismatch {
                expected,
                found: image.size(),
            });
        }
        let grid = image.grid();
        let pins = PinLayout::circular(grid, config.pins(), verboser);
        let board = Board::new(Canvas::white(grid));
        let loss = loss::full(board.canvas(), &image);
        Ok(Self {
            image,
            pins,
            board,
            opaqueness: config.opaqueness(),
            tolerance: config.tolerance().as_(),
            search: config.search(),
            workers: Vec::new(),
            path: Path::new(),
            loss,
            last_pin: 0,
            steps: vec![0],
            iterations: 0,
            stop: None,
        })
    }

    /// Runs search steps until convergence or until `max_threads` iterations were done
    /// in total. Once converged, further calls return immediately.
    pub fn compute(&mut self, max_threads: usize, verboser: &mut impl Verboser) -> Stop {
        if let Some(stop) = self.stop.filter(|stop| stop.is_final()) {
            return stop;
        }
        while self.iterations < max_threads {
            verboser.verbose(Message::Computing {
                threads: self.iterations,
                loss: self.loss.into(),
            });
            self.iterations += 1;
            let previous = self.loss;
            match self.search() {
                Some(best) => {
                    self.commit(best);
                    if (previous - self.loss).abs() < self.tolerance {
                        return self.finish(Stop::Converged, verboser);
                    }
                }
                None => return self.finish(Stop::NoImprovement, verboser),
            }
        }
        self.finish(Stop::Capped, verboser)
    }

    fn finish(&mut self, stop: Stop, verboser: &mut impl Verboser) -> Stop {
        let threads = self.iterations;
        let loss = self.loss.into();
        verboser.verbose(match stop {
            Stop::Converged => Message::Converged { threads, loss },
            Stop::NoImprovement => Message::NoImprovement { threads, loss },
            Stop::Capped => Message::Capped { threads, loss },
        });
        self.stop = Some(stop);
        stop
    }

    fn search(&mut self) -> Option<Candidate<S>> {
        match self.search {
            Search::Sequential => self.search_sequential(),
            Search::Parallel => self.search_parallel(),
        }
    }

    fn search_sequential(&mut self) -> Option<Candidate<S>> {
        let trial = Trial {
            grid: self.image.grid(),
            pins: &self.pins,
            image: &self.image,
            opaqueness: self.opaqueness,
            from: self.last_pin,
            loss: self.loss,
        };
        trial.run(&mut self.board, &mut self.path, 0..self.pins.len())
    }

    fn search_parallel(&mut self) -> Option<Candidate<S>> {
        let count = self.pins.len();
        if self.workers.is_empty() {
            self.workers = (0..num_cpus::get().clamp(1, count))
                .map(|_| Worker::new(self.board.baseline().clone()))
                .collect();
        }
        let chunk_size = count.div_ceil(self.workers.len());
        for (index, worker) in self.workers.iter_mut().enumerate() {
            let start = (index * chunk_size).min(count);
            worker.range = start..count.min(start + chunk_size);
        }

        let trial = Trial {
            grid: self.image.grid(),
            pins: &self.pins,
            image: &self.image,
            opaqueness: self.opaqueness,
            from: self.last_pin,
            loss: self.loss,
        };
        let baseline = self.board.baseline();
        self.workers.par_iter_mut().for_each(|worker| {
            let mut scratch = Scratch::new(&mut worker.scratch, baseline);
            worker.result = trial.run(&mut scratch, &mut worker.path, worker.range.clone());
        });

        // Chunks are in pin order, so a strict comparison keeps the lowest pin on ties.
        let mut best: Option<Candidate<S>> = None;
        for worker in self.workers.iter() {
            if let Some(candidate) = worker.result {
                if best.map_or(true, |best| candidate.loss < best.loss) {
                    best = Some(candidate);
                }
            }
        }
        best
    }

    fn commit(&mut self, candidate: Candidate<S>) {
        let grid = self.image.grid();
        self.path.trace(
            &grid,
            self.pins[self.last_pin],
            self.pins[candidate.pin],
        );
        self.board.commit(&self.path, self.opaqueness);
        for worker in self.workers.iter_mut() {
            worker.scratch.apply(&self.path, self.opaqueness);
        }
        self.last_pin = candidate.pin;
        self.loss = candidate.loss;
        self.steps.push(candidate.pin);
    }

    /// Loss recomputed over the whole canvas.
    pub fn full_loss(&self) -> S {
        loss::full(self.board.canvas(), &self.image)
    }
}

impl<S: Float> Optimizer<S> {
    pub fn loss(&self) -> S {
        self.loss
    }

    pub fn last_pin(&self) -> usize {
        self.last_pin
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn stop(&self) -> Option<Stop> {
        self.stop
    }

    pub fn pins(&self) -> &PinLayout {
        &self.pins
    }

    pub fn canvas(&self) -> &Canvas {
        self.board.canvas()
    }

    pub fn image(&self) -> &TargetImage {
        &self.image
    }

    /// Committed pins, starting at pin 0.
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    /// Snapshot of the current state.
    pub fn computation(&self) -> Computation<S> {
        Computation {
            canvas: self.board.canvas().clone(),
            pins: self.pins.clone(),
            steps: self.steps.clone(),
            opaqueness: self.opaqueness,
            loss: self.loss,
            iterations: self.iterations,
            stop: self.stop,
        }
    }

    pub fn into_computation(self) -> Computation<S> {
        Computation {
            canvas: self.board.into_canvas(),
            pins: self.pins,
            steps: self.steps,
            opaqueness: self.opaqueness,
            loss: self.loss,
            iterations: self.iterations,
            stop: self.stop,
        }
    }
}

/// Result of an optimization run.
#[derive(Clone, Debug)]
pub struct Computation<S> {
    canvas: Canvas,
    pins: PinLayout,
    steps: Vec<usize>,
    opaqueness: Opaqueness,
    loss: S,
    iterations: usize,
    stop: Option<Stop>,
}

impl<S: Float> Computation<S> {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn pins(&self) -> &PinLayout {
        &self.pins
    }

    pub fn loss(&self) -> S {
        self.loss
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn stop(&self) -> Option<Stop> {
        self.stop
    }

    /// Committed pins, starting at pin 0.
    pub fn steps(&self) -> &[usize] {
        &self.steps
    }

    pub fn last_pin(&self) -> usize {
        self.steps.last().copied().unwrap_or_default()
    }

    pub fn thread_count(&self) -> usize {
        self.steps.len().saturating_sub(1)
    }

    /// Final canvas as an image. With `pins`, every pin pixel is painted black.
    pub fn build_luma(&self, pins: bool) -> GrayImage {
        let mut canvas = self.canvas.clone();
        if pins {
            canvas.mark(self.pins.iter().copied());
        }
        let grid = canvas.grid();
        let pixels = canvas.pixels();
        GrayImage::from_fn(grid.width as u32, grid.height as u32, |x, y| {
            Luma([pixels[y as usize * grid.width + x as usize]])
        })
    }

    pub fn save_image(&self, path: impl AsRef<std::path::Path>, pins: bool) -> ImageResult<()> {
        self.build_luma(pins).save(path)
    }

    pub fn save_svg(
        &self,
        path: impl AsRef<std::path::Path>,
        line_tickness: f32,
    ) -> std::io::Result<()> {
        svg::save(path, &self.build_svg(line_tickness))
    }

    pub fn build_svg(&self, line_tickness: f32) -> svg::Document {
        let grid = self.canvas.grid();
        let center = |point: crate::geometry::Point<u32>| {
            (
                point.x as f32 + 0.5,
                (grid.height - 1 - point.y as usize) as f32 + 0.5,
            )
        };
        let mut doc =
            svg::Document::new().set("viewBox", (0.0, 0.0, grid.width, grid.height));
        doc = doc.add(
            svg::node::element::Rectangle::new()
                .set("width", grid.width)
                .set("height", grid.height)
                .set("fill", "white"),
        );
        let opacity = self.opaqueness.get() as f32 / 255.0;
        for step in self.steps.windows(2) {
            let (x1, y1) = center(self.pins[step[0]]);
            let (x2, y2) = center(self.pins[step[1]]);
            doc = doc.add(
                svg::node::element::Line::new()
                    .set("x1", format!("{:.4}", x1))
                    .set("y1", format!("{:.4}", y1))
                    .set("x2", format!("{:.4}", x2))
                    .set("y2", format!("{:.4}", y2))
                    .set("stroke", "black")
                    .set("stroke-width", format!("{:.4}", line_tickness))
                    .set("opacity", format!("{:.4}", opacity)),
            );
        }
        for &pin in self.pins.iter() {
            let (cx, cy) = center(pin);
            doc = doc.add(
                svg::node::element::Circle::new()
                    .set("cx", cx)
                    .set("cy", cy)
                    .set("r", line_tickness)
                    .set("fill", "black"),
            );
        }
        doc
    }

    /// Pin sequence to follow when weaving, one pin per line.
    pub fn build_instructions(&self) -> String {
        self.steps.iter().map(|pin| format!("{}\n", pin)).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The target is {found}x{found} pixels but the canvas is {expected}x{expected}")]
    SizeMismatch { expected: usize, found: usize },
}
