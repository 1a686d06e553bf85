//! A terminal surface of half-block pixels

use color_eyre::eyre::bail;
use color_eyre::eyre::ContextCompat as _;
use color_eyre::eyre::Result;
use termwiz::cell::AttributeChange;
use termwiz::color::ColorAttribute;
use termwiz::surface::Change as TermwizChange;
use termwiz::surface::Position as TermwizPosition;

use crate::canvas::{Canvas, Colour, WHITE};

/// The glyph for a cell whose upper pixel is its foreground.
const UPPER_HALF: &str = "▀";

/// The glyph for a cell whose lower pixel is its foreground.
const LOWER_HALF: &str = "▄";

/// A layer of terminal cells that a tattoy draws into.
///
/// Every cell holds 2 vertically stacked pixels, so a surface of `width` x `height` cells is
/// `width` x `height * 2` pixels.
#[derive(Clone)]
pub struct Surface {
    /// The ID of the drawing surface, see `crate::layers`.
    pub id: String,
    /// Width in terminal columns
    pub width: usize,
    /// Height in terminal rows
    pub height: usize,
    /// The order in which the surface is composited. Higher layers appear on top.
    pub layer: i16,
    /// The transparency of the whole surface when it is composited.
    pub opacity: f32,
    /// The actual terminal cells
    pub surface: termwiz::surface::Surface,
}

impl Surface {
    /// Instantiate
    #[must_use]
    pub fn new(id: String, width: usize, height: usize, layer: i16, opacity: f32) -> Self {
        Self {
            id,
            width,
            height,
            layer,
            opacity,
            surface: termwiz::surface::Surface::new(width, height),
        }
    }

    /// The size of the surface in pixels.
    #[must_use]
    pub const fn pixel_dimensions(&self) -> (usize, usize) {
        (self.width, self.height * 2)
    }

    /// Set a single pixel.
    ///
    /// A cell's 2 pixels are rendered with either "▀" or "▄". An upper pixel is always the
    /// foreground of a "▀". A lone lower pixel has to be the foreground of a "▄", because
    /// otherwise we'd lose the terminal's default background colour in the upper half.
    pub fn add_pixel(&mut self, x: usize, y: usize, colour: Colour) -> Result<()> {
        let (col, row) = self.pixel_to_cell(x, y)?;
        let (mut upper, mut lower) = self.halves_at(col, row)?;
        let attribute = Self::make_colour_attribute(colour);
        if y.rem_euclid(2) == 0 {
            upper = attribute;
        } else {
            lower = attribute;
        }

        let (glyph, foreground, background) = if upper == ColorAttribute::Default {
            (LOWER_HALF, lower, ColorAttribute::Default)
        } else {
            (UPPER_HALF, upper, lower)
        };

        self.surface.add_changes(vec![
            TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(col),
                y: TermwizPosition::Absolute(row),
            },
            TermwizChange::Attribute(AttributeChange::Foreground(foreground)),
            TermwizChange::Attribute(AttributeChange::Background(background)),
        ]);
        self.surface.add_change(glyph);

        Ok(())
    }

    /// Overlay text at a given coord with the given colours.
    pub fn add_text(
        &mut self,
        x: usize,
        y: usize,
        text: String,
        maybe_background_colour: Option<Colour>,
        maybe_foreground_colour: Option<Colour>,
    ) {
        let background = maybe_background_colour
            .map_or(ColorAttribute::Default, Self::make_colour_attribute);
        let foreground = Self::make_colour_attribute(maybe_foreground_colour.unwrap_or(WHITE));

        self.surface.add_changes(vec![
            TermwizChange::CursorPosition {
                x: TermwizPosition::Absolute(x),
                y: TermwizPosition::Absolute(y),
            },
            TermwizChange::Attribute(AttributeChange::Background(background)),
            TermwizChange::Attribute(AttributeChange::Foreground(foreground)),
        ]);
        self.surface.add_change(text);
    }

    /// Cover every cell with a solid background colour.
    pub fn fill(&mut self, colour: Colour) {
        self.surface.add_change(TermwizChange::ClearScreen(
            Self::make_colour_attribute(colour),
        ));
    }

    /// Make a Termwiz colour attribute
    #[must_use]
    pub const fn make_colour_attribute(colour: Colour) -> ColorAttribute {
        ColorAttribute::TrueColorWithDefaultFallback(termwiz::color::SrgbaTuple(
            colour.0, colour.1, colour.2, colour.3,
        ))
    }

    /// Safely convert pixel coordinates to a TTY column and row
    fn pixel_to_cell(&self, x: usize, y: usize) -> Result<(usize, usize)> {
        let col = x;
        let row = y.div_euclid(2);
        if col >= self.width {
            bail!("Tried to add pixel to column: {col}")
        }
        if row >= self.height {
            bail!("Tried to add pixel to row: {row}")
        }
        Ok((col, row))
    }

    /// The current colours of the upper and lower pixels of a cell.
    fn halves_at(&mut self, col: usize, row: usize) -> Result<(ColorAttribute, ColorAttribute)> {
        let cells = self.surface.screen_cells();
        let cell = cells
            .get(row)
            .context("No cell row")?
            .get(col)
            .context("No cell column")?;
        let attributes = cell.attrs();
        let halves = match cell.str() {
            UPPER_HALF => (attributes.foreground(), attributes.background()),
            LOWER_HALF => (attributes.background(), attributes.foreground()),
            _ => (ColorAttribute::Default, ColorAttribute::Default),
        };
        Ok(halves)
    }
}

impl Canvas for Surface {
    /// A fresh termwiz surface, rather than a `ClearScreen` change, so that the log of changes
    /// doesn't grow with every frame.
    fn clear(&mut self) {
        self.surface = termwiz::surface::Surface::new(self.width, self.height);
    }

    fn stroke_line(&mut self, from: glam::Vec2, to: glam::Vec2, colour: Colour) {
        let (width, height) = self.pixel_dimensions();
        #[expect(
            clippy::as_conversions,
            clippy::cast_precision_loss,
            reason = "Terminals are nowhere near big enough to lose precision"
        )]
        let bounds = glam::Vec2::new(width as f32, height as f32);
        let Some((from, to)) = clip_line(from, to, bounds) else {
            return;
        };
        let delta = to - from;
        let steps = delta.abs().max_element().ceil().max(1.0);

        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss,
            reason = "We're just rasterising onto a terminal grid"
        )]
        for step in 0..=(steps as usize) {
            let point = from + delta * (step as f32 / steps);
            if point.x < 0.0 || point.y < 0.0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x >= width || y >= height {
                continue;
            }
            if let Err(error) = self.add_pixel(x, y, colour) {
                tracing::error!("Stroking line on '{}' surface: {error:?}", self.id);
            }
        }
    }
}

/// The part of a line that is inside `(0, 0)` to `max`, if any. Liang-Barsky clipping.
fn clip_line(
    from: glam::Vec2,
    to: glam::Vec2,
    max: glam::Vec2,
) -> Option<(glam::Vec2, glam::Vec2)> {
    let delta = to - from;
    let mut start = 0.0_f32;
    let mut end = 1.0_f32;
    let edges = [
        (-delta.x, from.x),
        (delta.x, max.x - from.x),
        (-delta.y, from.y),
        (delta.y, max.y - from.y),
    ];
    for (direction, distance) in edges {
        if direction.abs() < f32::EPSILON {
            if distance < 0.0 {
                return None;
            }
            continue;
        }
        let crossing = distance / direction;
        if direction < 0.0 {
            start = start.max(crossing);
        } else {
            end = end.min(crossing);
        }
        if start > end {
            return None;
        }
    }

    Some((from + delta * start, from + delta * end))
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::shadow_unrelated,
    reason = "Tests aren't so strict"
)]
mod test {
    use super::*;
    use crate::canvas::BLACK;

    const GREY: Colour = (0.5, 0.5, 0.5, 1.0);

    fn glyph_at(surface: &mut Surface, col: usize, row: usize) -> String {
        surface.surface.screen_cells()[row][col].str().to_owned()
    }

    #[test]
    fn add_upper_pixel() {
        let mut surface = Surface::new("test".into(), 2, 2, -1, 1.0);
        assert_eq!(glyph_at(&mut surface, 0, 0), " ");

        surface.add_pixel(0, 0, WHITE).unwrap();
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), UPPER_HALF);
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(WHITE)
        );
        assert_eq!(cell.attrs().background(), ColorAttribute::Default);

        let result = surface.add_pixel(1, 4, WHITE).unwrap_err();
        assert_eq!(
            format!("{}", result.root_cause()),
            "Tried to add pixel to row: 2"
        );
    }

    #[test]
    fn lone_lower_pixel_uses_lower_half_glyph() {
        let mut surface = Surface::new("test".into(), 1, 1, -1, 1.0);

        surface.add_pixel(0, 1, WHITE).unwrap();
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), LOWER_HALF);
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(WHITE)
        );
        assert_eq!(cell.attrs().background(), ColorAttribute::Default);
    }

    #[test]
    fn both_pixels_share_a_cell() {
        let mut surface = Surface::new("test".into(), 1, 1, -1, 1.0);

        surface.add_pixel(0, 1, GREY).unwrap();
        surface.add_pixel(0, 0, BLACK).unwrap();
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(cell.str(), UPPER_HALF);
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(BLACK)
        );
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(GREY)
        );

        surface.add_pixel(0, 1, WHITE).unwrap();
        let cell = &surface.surface.screen_cells()[0][0];
        assert_eq!(
            cell.attrs().foreground(),
            Surface::make_colour_attribute(BLACK)
        );
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(WHITE)
        );
    }

    #[test]
    fn vertical_line_covers_whole_cells() {
        let mut surface = Surface::new("test".into(), 3, 3, -1, 1.0);
        surface.stroke_line(glam::Vec2::new(1.0, 0.0), glam::Vec2::new(1.0, 5.0), WHITE);

        for row in 0..3 {
            assert_eq!(glyph_at(&mut surface, 1, row), UPPER_HALF);
            assert_eq!(glyph_at(&mut surface, 0, row), " ");
            let cell = &surface.surface.screen_cells()[row][1];
            assert_eq!(
                cell.attrs().background(),
                Surface::make_colour_attribute(WHITE)
            );
        }
    }

    #[test]
    fn lines_are_clipped() {
        let mut surface = Surface::new("test".into(), 2, 1, -1, 1.0);
        surface.stroke_line(
            glam::Vec2::new(-5.0, -5.0),
            glam::Vec2::new(10.0, 10.0),
            WHITE,
        );
        assert_eq!(glyph_at(&mut surface, 0, 0), UPPER_HALF);
        assert_eq!(glyph_at(&mut surface, 1, 0), LOWER_HALF);
    }

    #[test]
    fn changes_dont_pile_up_over_many_frames() {
        let mut surface = Surface::new("test".into(), 10, 5, -1, 1.0);
        let mut draw_frame = |surface: &mut Surface| {
            surface.clear();
            surface.stroke_line(glam::Vec2::new(2.0, 0.0), glam::Vec2::new(4.0, 8.0), WHITE);
            surface.stroke_line(glam::Vec2::new(7.0, 1.0), glam::Vec2::new(6.0, 9.0), GREY);
        };

        draw_frame(&mut surface);
        let one_frame = surface.surface.get_changes(0).1.len();
        assert!(one_frame > 0);

        for _ in 0..1000 {
            draw_frame(&mut surface);
        }
        assert_eq!(surface.surface.get_changes(0).1.len(), one_frame);
    }

    #[test]
    fn enormous_lines_are_cheap() {
        let mut surface = Surface::new("test".into(), 4, 2, -1, 1.0);
        surface.stroke_line(
            glam::Vec2::new(1.0, 0.0),
            glam::Vec2::new(1.0, 1.0e30),
            WHITE,
        );
        assert!(surface.surface.get_changes(0).1.len() <= 4 * 4 * 2);
        assert_eq!(glyph_at(&mut surface, 1, 0), UPPER_HALF);
    }

    #[test]
    fn clear_and_fill() {
        let mut surface = Surface::new("test".into(), 2, 2, -1, 1.0);
        surface.add_pixel(0, 0, WHITE).unwrap();
        surface.clear();
        assert_eq!(glyph_at(&mut surface, 0, 0), " ");

        surface.fill(GREY);
        let cell = &surface.surface.screen_cells()[1][1];
        assert_eq!(cell.str(), " ");
        assert_eq!(
            cell.attrs().background(),
            Surface::make_colour_attribute(GREY)
        );
    }
}
