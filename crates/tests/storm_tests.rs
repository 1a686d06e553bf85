//! Integration tests of the storm's public simulation API
#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::panic,
    reason = "Tests aren't so strict"
)]
mod storm {
    use std::time::Duration;

    use downpour::canvas::{Canvas, Colour};
    use downpour::tattoys::lightning::overlay::Overlay;
    use downpour::tattoys::lightning::scheduler::{FlashScheduler, Phase};
    use downpour::tattoys::rain::field::RainField;
    use rand::SeedableRng as _;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingCanvas {
        clears: usize,
        lines: Vec<(glam::Vec2, glam::Vec2)>,
    }

    impl Canvas for RecordingCanvas {
        fn clear(&mut self) {
            self.clears += 1;
            self.lines.clear();
        }

        fn stroke_line(&mut self, from: glam::Vec2, to: glam::Vec2, _colour: Colour) {
            self.lines.push((from, to));
        }
    }

    fn seeded_field(seed: u64) -> RainField<rand::rngs::StdRng> {
        let config = downpour::tattoys::rain::config::Config::default();
        RainField::configure_with_rng(config, rand::rngs::StdRng::seed_from_u64(seed)).unwrap()
    }

    fn assert_in_bounds(field: &RainField<rand::rngs::StdRng>) {
        let (width, height) = field.dimensions();
        for particle in field.particles() {
            assert!(particle.position.x >= 0.0, "{particle:?}");
            assert!(particle.position.x <= width, "{particle:?}");
            assert!(particle.position.y <= height, "{particle:?}");
        }
    }

    #[test]
    fn storm_survives_resizes() {
        let mut field = seeded_field(7);
        let mut canvas = RecordingCanvas::default();
        let mut now = Instant::now();
        field.resize(80.0, 48.0);
        field.start(300, now);

        for frame in 0..3000_u32 {
            if frame % 500 == 0 {
                let shrink = f32::from(u16::try_from(frame / 500).unwrap());
                field.resize(80.0 - shrink * 10.0, 48.0 - shrink * 5.0);
            }
            now += Duration::from_millis(33);
            field.tick(now, &mut canvas);
            assert_in_bounds(&field);
            assert!(field.wind().angle.abs() <= field.config().max_angle);
        }

        assert_eq!(field.particles().len(), 300);
        assert_eq!(canvas.lines.len(), 300);
        assert_eq!(canvas.clears, 3000);
    }

    #[test]
    fn toggling_the_rain() {
        let mut field = seeded_field(3);
        let mut canvas = RecordingCanvas::default();
        let now = Instant::now();
        field.resize(40.0, 20.0);
        field.start(10, now);
        field.tick(now, &mut canvas);

        field.stop(&mut canvas);
        assert!(!field.is_running());
        assert!(canvas.lines.is_empty());

        field.tick(now, &mut canvas);
        assert!(canvas.lines.is_empty());

        field.start(25, now);
        assert!(field.is_running());
        assert_eq!(field.particles().len(), 25);
        field.tick(now, &mut canvas);
        assert_eq!(canvas.lines.len(), 25);
    }

    #[test]
    fn rain_draws_on_a_terminal_surface() {
        let mut field = seeded_field(11);
        let mut surface = downpour::surface::Surface::new("rain".into(), 20, 10, -10, 1.0);
        let (width, height) = surface.pixel_dimensions();
        field.resize(
            f32::from(u16::try_from(width).unwrap()),
            f32::from(u16::try_from(height).unwrap()),
        );
        field.start(20, Instant::now());
        field.tick(Instant::now(), &mut surface);

        let glyphs = surface
            .surface
            .screen_cells()
            .iter()
            .flat_map(|row| row.iter().map(|cell| cell.str().to_owned()))
            .filter(|glyph| glyph != " ")
            .collect::<Vec<_>>();
        assert!(!glyphs.is_empty());
        assert!(glyphs.iter().all(|glyph| glyph == "▀" || glyph == "▄"));
    }

    #[test]
    fn lightning_comes_in_pairs() {
        let config = downpour::tattoys::lightning::config::Config::default();
        let start = Instant::now();
        let mut scheduler =
            FlashScheduler::with_rng(&config, rand::rngs::StdRng::seed_from_u64(5), start);
        let mut overlay = Overlay::new(config.flash_duration(), config.brightness);

        let mut flashes = Vec::new();
        for _ in 0..10 {
            let deadline = scheduler.deadline();
            let phase = scheduler.phase();
            assert!(scheduler.fire(deadline));
            overlay.trigger_flash(deadline);
            flashes.push((phase, deadline));
        }

        for pair in flashes.chunks(2) {
            let [(first_phase, first), (second_phase, second)] = pair else {
                panic!("Odd number of flashes");
            };
            assert_eq!(*first_phase, Phase::Storm);
            assert_eq!(*second_phase, Phase::PairedFlash);
            let gap = second.duration_since(*first);
            assert!(gap >= Duration::from_millis(100), "{gap:?}");
            assert!(gap < Duration::from_millis(300), "{gap:?}");
        }

        for pairs in flashes.windows(3).step_by(2) {
            let gap = pairs[2].1.duration_since(pairs[1].1);
            assert!(gap >= Duration::from_millis(500), "{gap:?}");
            assert!(gap < Duration::from_millis(10_500), "{gap:?}");
        }
    }

    #[test]
    fn flash_is_removed_exactly_once() {
        let mut overlay = Overlay::new(Duration::from_millis(600), 0.6);
        let start = Instant::now();
        overlay.trigger_flash(start);

        let mut removals = 0;
        for frame in 0..60_u64 {
            let now = start + Duration::from_millis(frame * 33);
            let intensity = overlay.intensity(now);
            assert!((0.0..=0.6).contains(&intensity));
            if overlay.advance(now) {
                removals += 1;
            }
        }

        assert_eq!(removals, 1);
        assert!(!overlay.is_flashing());
    }
}
