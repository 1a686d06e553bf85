//! User-configurable settings for the rain

use crate::errors::{DownpourError, InvalidConfigSnafu};

/// All the config for the rain.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Enable/disable the rain
    pub enabled: bool,
    /// The ID of the drawing surface to render to
    pub surface: String,
    /// The number of raindrops
    pub drops: usize,
    /// The maximum angle of the wind from vertical, in radians
    pub max_angle: f32,
    /// How often the wind changes direction, in milliseconds
    pub wind_change_interval: u64,
    /// The range of lengths of a raindrop's streak, in pixels
    pub length: (f32, f32),
    /// The range of distances a raindrop falls every frame, in pixels
    pub speed: (f32, f32),
    /// The colour of the rain
    pub colour: (f32, f32, f32),
    /// The transparency of the rain
    pub opacity: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            surface: crate::layers::RAIN.to_owned(),
            drops: 450,
            max_angle: 0.52,
            wind_change_interval: 18_000,
            length: (10.0, 30.0),
            speed: (2.0, 12.0),
            colour: (0.68, 0.76, 0.88),
            opacity: 0.35,
        }
    }
}

impl Config {
    /// The interval between changes of wind direction.
    #[must_use]
    pub const fn wind_change_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.wind_change_interval)
    }

    /// Make sure the values can produce a sensible simulation.
    pub fn validate(&self) -> Result<(), DownpourError> {
        if !self.max_angle.is_finite() || self.max_angle < 0.0 {
            return InvalidConfigSnafu {
                message: format!("rain max_angle must be 0 or more, got {}", self.max_angle),
            }
            .fail();
        }
        Self::validate_range("length", self.length)?;
        Self::validate_range("speed", self.speed)?;
        if !(0.0..=1.0).contains(&self.opacity) {
            return InvalidConfigSnafu {
                message: format!("rain opacity must be from 0 to 1, got {}", self.opacity),
            }
            .fail();
        }
        Ok(())
    }

    /// A range must be positive and its start can't be after its end.
    fn validate_range(name: &str, range: (f32, f32)) -> Result<(), DownpourError> {
        let is_valid = range.0.is_finite()
            && range.1.is_finite()
            && range.0 >= 0.0
            && range.0 <= range.1;
        if !is_valid {
            return InvalidConfigSnafu {
                message: format!("rain {name} must be a range like [low, high], got {range:?}"),
            }
            .fail();
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn backwards_ranges_are_invalid() {
        let config = Config {
            speed: (12.0, 2.0),
            ..Config::default()
        };
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "Invalid config: rain speed must be a range like [low, high], got (12.0, 2.0)"
        );
    }

    #[test]
    fn negative_angle_is_invalid() {
        let config = Config {
            max_angle: -0.1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
