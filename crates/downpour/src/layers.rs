//! The named drawing surfaces that tattoys can render to.
//!
//! Each surface is a compositing layer. Lower layers are drawn first, so anything on a higher
//! layer appears on top.

use crate::errors::{DownpourError, UnresolvedSurfaceSnafu};

/// The falling rain.
pub const RAIN: &str = "rain";

/// The lightning flash overlay.
pub const LIGHTNING: &str = "lightning";

/// The text statistics panel.
pub const STATS: &str = "stats";

/// Every surface that exists, with its compositing layer.
const SURFACES: [(&str, i16); 3] = [(RAIN, -10), (LIGHTNING, 50), (STATS, 100)];

/// Find the compositing layer for the drawing surface with the given ID.
pub fn resolve(id: &str) -> Result<i16, DownpourError> {
    if let Some((_, layer)) = SURFACES.iter().find(|(name, _)| *name == id) {
        return Ok(*layer);
    }

    let known = SURFACES
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<&str>>()
        .join(", ");
    UnresolvedSurfaceSnafu { id, known }.fail()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rain_is_below_lightning() {
        assert!(resolve(RAIN).unwrap() < resolve(LIGHTNING).unwrap());
        assert!(resolve(LIGHTNING).unwrap() < resolve(STATS).unwrap());
    }

    #[test]
    fn unknown_surface() {
        let error = resolve("rain-canvas").unwrap_err();
        assert_eq!(
            error.to_string(),
            "No drawing surface named `rain-canvas`, known surfaces are: rain, lightning, stats"
        );
    }
}
