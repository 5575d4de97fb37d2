use serde::{Deserialize, Serialize};

use crate::{algorithm::Search, darkness::Opaqueness};

/// Scalar precision of the loss tracking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Single,
    #[default]
    Double,
}

/// User facing settings. Every field has a default so partial files deserialize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Side in pixels of the square canvas.
    pub resolution: u32,
    /// Number of pins around the circle.
    pub pins: usize,
    /// Darkness removed from every pixel a thread crosses.
    pub opaqueness: u32,
    /// Maximum number of search iterations.
    pub max_threads: usize,
    /// Minimum loss change between commits to keep searching.
    pub tolerance: f64,
    /// Intensity outside the circular mask of the target.
    pub background: u8,
    pub precision: Precision,
    pub search: Search,
    /// Threads between progress reports. 0 disables them.
    pub report_interval: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            resolution: 512,
            pins: 200,
            opaqueness: 20,
            max_threads: 1_000_000,
            tolerance: 1e-10,
            background: 255,
            precision: Precision::default(),
            search: Search::default(),
            report_interval: 1000,
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<Config, Error> {
        if self.pins < 3 {
            return Err(Error::TooFewPins(self.pins as i64));
        }
        let opaqueness = Opaqueness::new(self.opaqueness)?;
        if self.resolution == 0 {
            return Err(Error::Resolution(self.resolution));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(Error::Tolerance(self.tolerance));
        }
        Ok(Config {
            resolution: self.resolution,
            pins: self.pins,
            opaqueness,
            max_threads: self.max_threads,
            tolerance: self.tolerance,
            background: self.background,
            precision: self.precision,
            search: self.search,
            report_interval: self.report_interval,
        })
    }
}

/// Validated [`Settings`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    resolution: u32,
    pins: usize,
    opaqueness: Opaqueness,
    max_threads: usize,
    tolerance: f64,
    background: u8,
    precision: Precision,
    search: Search,
    report_interval: usize,
}

impl Config {
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn pins(&self) -> usize {
        self.pins
    }

    pub fn opaqueness(&self) -> Opaqueness {
        self.opaqueness
    }

    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn background(&self) -> u8 {
        self.background
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn search(&self) -> Search {
        self.search
    }

    pub fn report_interval(&self) -> usize {
        self.report_interval
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The number of pins cannot be smaller than 3, got {0}")]
    TooFewPins(i64),
    #[error("Opaqueness must be an integer between 1 and 255, got {0}")]
    Opaqueness(i64),
    #[error("Resolution must be at least 1 pixel, got {0}")]
    Resolution(u32),
    #[error("Tolerance must be a non negative number, got {0}")]
    Tolerance(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Settings::default().validate().unwrap();
        assert_eq!(config.resolution(), 512);
        assert_eq!(config.max_threads(), 1_000_000);
        assert_eq!(config.tolerance(), 1e-10);
        assert_eq!(config.search(), Search::Parallel);
    }

    #[test]
    fn rejects_too_few_pins() {
        let settings = Settings {
            pins: 2,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::TooFewPins(2))));
    }

    #[test]
    fn rejects_opaqueness_out_of_range() {
        for opaqueness in [0, 256, 1000] {
            let settings = Settings {
                opaqueness,
                ..Default::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(Error::Opaqueness(v)) if v == opaqueness as i64
            ));
        }
    }

    #[test]
    fn rejects_bad_resolution_and_tolerance() {
        let settings = Settings {
            resolution: 0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Resolution(0))));
        let settings = Settings {
            tolerance: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(Error::Tolerance(_))));
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "pins": 64, "search": "Sequential" }"#).unwrap();
        assert_eq!(settings.pins, 64);
        assert_eq!(settings.search, Search::Sequential);
        assert_eq!(settings.opaqueness, Settings::default().opaqueness);
        assert_eq!(settings.precision, Precision::Double);
    }
}
