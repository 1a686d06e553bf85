//! The rain simulation: a field of falling streaks pushed around by a single shared wind.
//!
//! The wind is global rather than per-drop so that the whole storm shifts direction together.

use glam::Vec2;
use rand::Rng as _;
use tokio::time::Instant;

use crate::canvas::{Canvas, Colour};
use crate::errors::DownpourError;

use super::config::Config;

/// A single raindrop.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct Particle {
    /// The top of the streak, in pixels
    pub position: Vec2,
    /// The length of the streak, in pixels
    pub length: f32,
    /// The distance fallen every tick, in pixels
    pub speed: f32,
}

/// The wind that blows every raindrop.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub struct Wind {
    /// Radians from vertical. Positive blows to the right.
    pub angle: f32,
    /// When the angle was last changed
    pub last_change: Instant,
}

impl Wind {
    /// A unit vector pointing the way the wind blows.
    #[must_use]
    pub fn direction(&self) -> Vec2 {
        Vec2::new(self.angle.sin(), self.angle.cos())
    }
}

/// A field of raindrops on a drawing surface.
pub struct RainField<R: rand::Rng = rand::rngs::StdRng> {
    /// Never changes after construction
    config: Config,
    /// The compositing layer of the resolved drawing surface
    layer: i16,
    /// Surface width in pixels
    width: f32,
    /// Surface height in pixels
    height: f32,
    /// All the raindrops
    particles: Vec<Particle>,
    /// The shared wind
    wind: Wind,
    /// Whether ticks should happen
    is_running: bool,
    /// Source of all the randomness
    rng: R,
}

impl RainField {
    /// Bind to a drawing surface using a randomly seeded RNG.
    pub fn configure(config: Config) -> Result<Self, DownpourError> {
        Self::configure_with_rng(config, rand::SeedableRng::from_entropy())
    }
}

impl<R: rand::Rng> RainField<R> {
    /// Bind to the drawing surface named in the config. Fails when the surface doesn't exist or
    /// the config is invalid.
    pub fn configure_with_rng(config: Config, rng: R) -> Result<Self, DownpourError> {
        config.validate()?;
        let layer = crate::layers::resolve(&config.surface)?;
        tracing::debug!(
            "Rain configured for surface '{}' (layer {layer})",
            config.surface
        );

        Ok(Self {
            config,
            layer,
            width: 0.0,
            height: 0.0,
            particles: Vec::new(),
            wind: Wind {
                angle: 0.0,
                last_change: Instant::now(),
            },
            is_running: false,
            rng,
        })
    }

    /// Keep the simulation's bounds in step with the size of the drawing surface.
    pub fn resize(&mut self, width: f32, height: f32) {
        tracing::trace!("Resizing rain field to {width}x{height}");
        self.width = width;
        self.height = height;
    }

    /// (Re)initialise the given number of raindrops and start ticking.
    pub fn start(&mut self, count: usize, now: Instant) {
        self.particles = (0..count).map(|_| self.new_particle()).collect();
        self.wind.angle = self.random_wind_angle();
        self.wind.last_change = now;
        self.is_running = true;
        tracing::debug!(
            "Rain started with {count} drops, wind angle: {}",
            self.wind.angle
        );
    }

    /// Stop ticking and wipe the drawing surface.
    pub fn stop(&mut self, canvas: &mut impl Canvas) {
        self.is_running = false;
        canvas.clear();
        tracing::debug!("Rain stopped");
    }

    /// A single frame of the simulation.
    pub fn tick(&mut self, now: Instant, canvas: &mut impl Canvas) {
        if !self.is_running {
            return;
        }

        let since_wind_change = now.saturating_duration_since(self.wind.last_change);
        if since_wind_change > self.config.wind_change_interval() {
            self.wind.angle = self.random_wind_angle();
            self.wind.last_change = now;
            tracing::trace!("Wind changed to: {}", self.wind.angle);
        }

        canvas.clear();

        let colour = self.colour();
        let direction = self.wind.direction();
        for index in 0..self.particles.len() {
            let Some(particle) = self.particles.get_mut(index) else {
                continue;
            };
            let start = particle.position;
            canvas.stroke_line(start, start + direction * particle.length, colour);
            particle.position += direction * particle.speed;

            let position = particle.position;
            let is_outside =
                position.y > self.height || position.x < 0.0 || position.x > self.width;
            if is_outside {
                let x = self.random_x();
                if let Some(recycled) = self.particles.get_mut(index) {
                    recycled.position = Vec2::new(x, -recycled.length);
                }
            }
        }
    }

    /// Is the simulation currently ticking?
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.is_running
    }

    /// All the raindrops.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The current wind.
    #[must_use]
    pub const fn wind(&self) -> Wind {
        self.wind
    }

    /// The surface dimensions in pixels.
    #[must_use]
    pub const fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    /// The config this field was built with.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The compositing layer of the drawing surface.
    #[must_use]
    pub const fn layer(&self) -> i16 {
        self.layer
    }

    /// The colour that streaks are drawn with.
    #[must_use]
    pub const fn colour(&self) -> Colour {
        let (red, green, blue) = self.config.colour;
        (red, green, blue, 1.0)
    }

    /// A new raindrop somewhere on the surface.
    fn new_particle(&mut self) -> Particle {
        let (min_length, max_length) = self.config.length;
        let (min_speed, max_speed) = self.config.speed;
        let length = crate::utils::lerp(min_length, max_length, self.rng.gen());
        let speed = crate::utils::lerp(min_speed, max_speed, self.rng.gen());
        let x = self.random_x();
        let y = self.rng.gen::<f32>() * self.height;
        Particle {
            position: Vec2::new(x, y),
            length,
            speed,
        }
    }

    /// A random horizontal position in `[0, width)`.
    fn random_x(&mut self) -> f32 {
        self.rng.gen::<f32>() * self.width
    }

    /// A random wind angle in `[-max_angle, max_angle]`.
    fn random_wind_angle(&mut self) -> f32 {
        self.rng.gen::<f32>().mul_add(2.0, -1.0) * self.config.max_angle
    }
}

#[cfg(test)]
#[expect(
    clippy::float_cmp,
    clippy::indexing_slicing,
    reason = "Tests aren't so strict"
)]
mod test {
    use std::time::Duration;

    use rand::SeedableRng as _;

    use super::*;

    /// Records what would have been drawn.
    #[derive(Default)]
    struct RecordingCanvas {
        clears: usize,
        lines: Vec<(Vec2, Vec2)>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self) {
            self.clears += 1;
            self.lines.clear();
        }

        fn stroke_line(&mut self, from: Vec2, to: Vec2, _colour: Colour) {
            self.lines.push((from, to));
        }
    }

    /// An RNG whose every `f32` is exactly 0.5
    fn halfway_rng() -> rand::rngs::mock::StepRng {
        rand::rngs::mock::StepRng::new(1 << 31, 0)
    }

    fn field_with_rng<R: rand::Rng>(rng: R) -> RainField<R> {
        let mut field = RainField::configure_with_rng(Config::default(), rng).unwrap();
        field.resize(100.0, 80.0);
        field
    }

    fn seeded_field() -> RainField<rand::rngs::StdRng> {
        field_with_rng(rand::rngs::StdRng::seed_from_u64(42))
    }

    #[test]
    fn unknown_surface_is_fatal() {
        let config = Config {
            surface: "rain-canvas".to_owned(),
            ..Config::default()
        };
        let result = RainField::configure(config);
        assert!(matches!(
            result,
            Err(DownpourError::UnresolvedSurface { .. })
        ));
    }

    #[test]
    fn fixed_randomness_gives_identical_drops() {
        let mut field = field_with_rng(halfway_rng());
        field.start(3, Instant::now());

        let particles = field.particles().to_vec();
        assert_eq!(particles.len(), 3);
        for particle in &particles {
            assert_eq!(particle.position, Vec2::new(50.0, 40.0));
            assert_eq!(particle.length, 20.0);
            assert_eq!(particle.speed, 7.0);
        }
        assert_eq!(field.wind().angle, 0.0);

        let mut canvas = RecordingCanvas::default();
        field.tick(Instant::now(), &mut canvas);
        for (before, after) in particles.iter().zip(field.particles()) {
            assert_eq!(after.position.x, before.position.x);
            assert_eq!(after.position.y, before.position.y + before.speed);
        }

        assert_eq!(canvas.clears, 1);
        assert_eq!(canvas.lines.len(), 3);
        assert_eq!(
            canvas.lines[0],
            (Vec2::new(50.0, 40.0), Vec2::new(50.0, 60.0))
        );
    }

    #[test]
    fn drop_below_the_surface_is_recycled() {
        let mut field = field_with_rng(halfway_rng());
        field.start(1, Instant::now());
        field.particles[0].position.y = 81.0;

        field.tick(Instant::now(), &mut RecordingCanvas::default());
        let particle = field.particles()[0];
        assert_eq!(particle.position.y, -particle.length);
        assert_eq!(particle.position.x, 50.0);
    }

    #[test]
    fn drops_blown_off_the_sides_are_recycled() {
        let mut field = seeded_field();
        field.start(2, Instant::now());
        field.wind.angle = 0.5;
        field.particles[0].position = Vec2::new(99.9, 10.0);
        field.particles[1].position = Vec2::new(-20.0, 10.0);

        field.tick(Instant::now(), &mut RecordingCanvas::default());
        for particle in field.particles() {
            assert_eq!(particle.position.y, -particle.length);
            assert!((0.0..100.0).contains(&particle.position.x));
        }
    }

    #[test]
    fn drops_stay_in_bounds() {
        let mut field = seeded_field();
        let start = Instant::now();
        field.start(200, start);

        let mut canvas = RecordingCanvas::default();
        for frame in 0..2_000u64 {
            field.tick(start + Duration::from_millis(frame * 33), &mut canvas);
            for particle in field.particles() {
                assert!(particle.position.x >= 0.0);
                assert!(particle.position.x <= 100.0);
                assert!(particle.position.y <= 80.0);
            }
            assert!(field.wind().angle.abs() <= field.config().max_angle);
        }
    }

    #[test]
    fn wind_changes_at_most_once_per_interval() {
        let mut field = seeded_field();
        let start = Instant::now();
        field.start(1, start);
        let interval = field.config().wind_change_interval();

        let mut canvas = RecordingCanvas::default();
        let mut angle = field.wind().angle;
        let mut last_change = start;
        let mut changes = 0;
        for frame in 1..5_000u64 {
            let now = start + Duration::from_millis(frame * 16);
            field.tick(now, &mut canvas);
            let wind = field.wind();
            if wind.last_change == last_change {
                assert_eq!(wind.angle, angle);
                continue;
            }
            assert!(now.duration_since(last_change) > interval);
            assert_eq!(wind.last_change, now);
            angle = wind.angle;
            last_change = now;
            changes += 1;
        }

        // 80 seconds of frames
        assert_eq!(changes, 4);
    }

    #[test]
    fn restarting_gives_fresh_drops() {
        let mut field = seeded_field();
        let mut canvas = RecordingCanvas::default();
        field.start(50, Instant::now());
        for _ in 0..10 {
            field.tick(Instant::now(), &mut canvas);
        }
        let previous = field.particles().to_vec();

        field.stop(&mut canvas);
        assert!(!field.is_running());
        assert!(canvas.lines.is_empty());

        field.tick(Instant::now(), &mut canvas);
        assert!(canvas.lines.is_empty());

        field.start(7, Instant::now());
        assert!(field.is_running());
        assert_eq!(field.particles().len(), 7);
        for particle in field.particles() {
            assert!(!previous.contains(particle));
            assert!((0.0..100.0).contains(&particle.position.x));
            assert!((0.0..80.0).contains(&particle.position.y));
            assert!((10.0..30.0).contains(&particle.length));
            assert!((2.0..12.0).contains(&particle.speed));
        }
    }
}
