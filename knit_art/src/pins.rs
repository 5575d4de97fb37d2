use std::ops::Deref;

use crate::{
    geometry::Point,
    grid::Grid,
    verboser::{Message, Verboser},
};

/// Fixed pin positions, rounded and clamped into the grid once at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinLayout {
    pins: Vec<Point<u32>>,
}

impl PinLayout {
    /// Places `pin_count` pins on the circle inscribed in `grid`, counter-clockwise from
    /// the rightmost point. The radius is half the grid height.
    pub fn circular(grid: Grid, pin_count: usize, verboser: &mut impl Verboser) -> Self {
        let radius = grid.height as f64 / 2.0;
        let step = 2.0 * std::f64::consts::PI / pin_count as f64;
        let max = Point::new(grid.width.saturating_sub(1), grid.height.saturating_sub(1))
            .as_::<f64>();
        let pins = (0..pin_count)
            .map(|i| {
                verboser.verbose(Message::PlacingPin(i));
                let theta = i as f64 * step;
                let x = (radius * (1.0 + theta.cos())).round_ties_even();
                let y = (radius * (1.0 + theta.sin())).round_ties_even();
                Point::new(x.clamp(0.0, max.x) as u32, y.clamp(0.0, max.y) as u32)
            })
            .collect();
        verboser.verbose(Message::PlacingPin(pin_count));
        Self { pins }
    }

    pub fn pins(&self) -> &[Point<u32>] {
        &self.pins
    }
}

impl Deref for PinLayout {
    type Target = [Point<u32>];

    fn deref(&self) -> &Self::Target {
        &self.pins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verboser::Silent;

    #[test]
    fn four_pins_land_on_cardinal_extremes() {
        let layout = PinLayout::circular(Grid::square(8), 4, &mut Silent);
        assert_eq!(
            layout.pins(),
            &[
                Point::new(7, 4),
                Point::new(4, 7),
                Point::new(0, 4),
                Point::new(4, 0)
            ]
        );
    }

    #[test]
    fn pins_stay_inside_the_grid() {
        for size in [1, 2, 5, 16, 101] {
            let grid = Grid::square(size);
            let layout = PinLayout::circular(grid, 37, &mut Silent);
            assert_eq!(layout.len(), 37);
            assert!(layout.iter().all(|pin| grid.index_of(*pin).is_some()));
        }
    }

    #[test]
    fn reports_every_pin() {
        let mut messages: Vec<Message> = Vec::new();
        PinLayout::circular(Grid::square(10), 3, &mut messages);
        assert_eq!(
            messages,
            (0..=3).map(Message::PlacingPin).collect::<Vec<_>>()
        );
    }
}
