use crate::config;

/// Amount subtracted from every pixel a thread crosses. Always in `1..=255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opaqueness(u8);

impl Opaqueness {
    pub fn new(value: u32) -> Result<Self, config::Error> {
        match u8::try_from(value) {
            Ok(value) if value > 0 => Ok(Self(value)),
            _ => Err(config::Error::Opaqueness(value.into())),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Darkens `pixel`, saturating at black.
    #[inline]
    pub fn compute(self, pixel: u8) -> u8 {
        pixel.saturating_sub(self.0)
    }
}

impl TryFrom<u32> for Opaqueness {
    type Error = config::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Opaqueness> for u32 {
    fn from(value: Opaqueness) -> Self {
        value.0 as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_values_outside_byte_range() {
        assert!(matches!(Opaqueness::new(0), Err(config::Error::Opaqueness(0))));
        assert!(matches!(
            Opaqueness::new(256),
            Err(config::Error::Opaqueness(256))
        ));
        assert_eq!(Opaqueness::new(255).map(Opaqueness::get).ok(), Some(255));
    }

    #[test]
    fn saturates_at_black() {
        let opaqueness = Opaqueness::new(100).unwrap();
        assert_eq!(opaqueness.compute(255), 155);
        assert_eq!(opaqueness.compute(60), 0);
        assert_eq!(opaqueness.compute(0), 0);
    }
}
