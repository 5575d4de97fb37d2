use std::ops::Sub;

use num_traits::AsPrimitive;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T> Sub for Point<T>
where
    T: Sub<Output = T>,
{
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl<S> Point<S> {
    pub fn as_<I: Copy + 'static>(self) -> Point<I>
    where
        S: AsPrimitive<I>,
    {
        Point {
            x: self.x.as_(),
            y: self.y.as_(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Point;

    #[test]
    fn arithmetic_is_componentwise() {
        let a = Point::new(4i64, 7);
        let b = Point::new(1i64, 2);
        assert_eq!(a - b, Point::new(3, 5));
        assert_eq!(a.as_::<f64>(), Point::new(4.0, 7.0));
    }
}
