//! User-configurable settings for the lightning

use crate::errors::{DownpourError, InvalidConfigSnafu};

/// All the config for the lightning.
#[derive(serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Config {
    /// Enable/disable the lightning
    pub enabled: bool,
    /// The ID of the drawing surface to render to
    pub surface: String,
    /// The range of milliseconds to wait before a storm's first flash
    pub storm_delay: (f32, f32),
    /// The range of milliseconds between the 2 flashes of a storm
    pub pair_delay: (f32, f32),
    /// How long a single flash lasts, in milliseconds
    pub flash_duration: u64,
    /// How bright a flash gets at its peak, from 0 to 1
    pub brightness: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            surface: crate::layers::LIGHTNING.to_owned(),
            storm_delay: (500.0, 10_500.0),
            pair_delay: (100.0, 300.0),
            flash_duration: 600,
            brightness: 0.6,
        }
    }
}

impl Config {
    /// How long a single flash lasts.
    #[must_use]
    pub const fn flash_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.flash_duration)
    }

    /// Make sure the values can produce sensible lightning.
    pub fn validate(&self) -> Result<(), DownpourError> {
        for (name, range) in [("storm_delay", self.storm_delay), ("pair_delay", self.pair_delay)] {
            let is_valid = range.0.is_finite()
                && range.1.is_finite()
                && range.0 >= 0.0
                && range.0 <= range.1;
            if !is_valid {
                return InvalidConfigSnafu {
                    message: format!(
                        "lightning {name} must be a range like [low, high], got {range:?}"
                    ),
                }
                .fail();
            }
        }

        if !(0.0..=1.0).contains(&self.brightness) {
            return InvalidConfigSnafu {
                message: format!(
                    "lightning brightness must be from 0 to 1, got {}",
                    self.brightness
                ),
            }
            .fail();
        }

        Ok(())
    }
}
