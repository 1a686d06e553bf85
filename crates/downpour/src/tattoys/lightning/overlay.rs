//! The full-screen overlay that lights up when there's a flash.

use std::time::Duration;

use tokio::time::Instant;

/// The fraction of a flash spent getting brighter. The rest is spent fading out.
const RISE: f32 = 0.1;

/// A single running flash animation.
#[derive(Debug, Clone, Copy)]
struct FlashAnimation {
    /// When the flash was triggered
    started: Instant,
}

/// The lightning overlay.
///
/// A flash is a transient state: it's added by `trigger_flash()` and removed exactly once, by
/// the first `advance()` after its animation completes.
#[derive(Debug)]
pub struct Overlay {
    /// How long the flash animation lasts
    duration: Duration,
    /// Peak intensity of a flash
    brightness: f32,
    /// The current flash, if any
    flash: Option<FlashAnimation>,
}

impl Overlay {
    /// Instantiate
    #[must_use]
    pub const fn new(duration: Duration, brightness: f32) -> Self {
        Self {
            duration,
            brightness,
            flash: None,
        }
    }

    /// Use new settings. Any running flash carries on.
    pub const fn reconfigure(&mut self, duration: Duration, brightness: f32) {
        self.duration = duration;
        self.brightness = brightness;
    }

    /// Start a flash. Triggering during a flash restarts the animation.
    pub fn trigger_flash(&mut self, now: Instant) {
        tracing::trace!("Lightning flash!");
        self.flash = Some(FlashAnimation { started: now });
    }

    /// Is there a flash being animated?
    #[must_use]
    pub const fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    /// Remove a flash whose animation has completed. Returns `true` only on the call that removed
    /// it.
    pub fn advance(&mut self, now: Instant) -> bool {
        let Some(flash) = self.flash else {
            return false;
        };
        if now.saturating_duration_since(flash.started) < self.duration {
            return false;
        }

        self.flash = None;
        true
    }

    /// How bright the overlay is right now, from 0 to the configured brightness.
    #[must_use]
    pub fn intensity(&self, now: Instant) -> f32 {
        let Some(flash) = self.flash else {
            return 0.0;
        };
        if self.duration.is_zero() {
            return 0.0;
        }

        let elapsed = now.saturating_duration_since(flash.started);
        let progress = elapsed.as_secs_f32() / self.duration.as_secs_f32();
        let rise = crate::utils::smoothstep(0.0, RISE, progress);
        let fall = crate::utils::smoothstep(1.0, RISE, progress);
        self.brightness * rise.min(fall)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn overlay() -> Overlay {
        Overlay::new(Duration::from_millis(1000), 0.5)
    }

    #[test]
    fn flash_rises_then_fades() {
        let mut overlay = overlay();
        let start = Instant::now();
        assert!(overlay.intensity(start).abs() < f32::EPSILON);

        overlay.trigger_flash(start);
        assert!(overlay.is_flashing());
        assert!(overlay.intensity(start).abs() < f32::EPSILON);

        let peak = overlay.intensity(start + Duration::from_millis(100));
        assert!((peak - 0.5).abs() < 0.001);

        let fading = overlay.intensity(start + Duration::from_millis(500));
        assert!(fading > 0.0 && fading < peak);

        let end = overlay.intensity(start + Duration::from_millis(1000));
        assert!(end.abs() < 0.001);
    }

    #[test]
    fn flash_is_removed_exactly_once() {
        let mut overlay = overlay();
        let start = Instant::now();
        assert!(!overlay.advance(start));

        overlay.trigger_flash(start);
        assert!(!overlay.advance(start + Duration::from_millis(999)));
        assert!(overlay.is_flashing());

        assert!(overlay.advance(start + Duration::from_millis(1000)));
        assert!(!overlay.is_flashing());
        assert!(!overlay.advance(start + Duration::from_millis(2000)));
    }

    #[test]
    fn retriggering_restarts_the_animation() {
        let mut overlay = overlay();
        let start = Instant::now();
        overlay.trigger_flash(start);
        overlay.trigger_flash(start + Duration::from_millis(200));

        assert!(!overlay.advance(start + Duration::from_millis(1100)));
        assert!(overlay.advance(start + Duration::from_millis(1200)));
    }
}
