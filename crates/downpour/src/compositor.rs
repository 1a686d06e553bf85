//! Composite individual cells into the final renderable frame.

use color_eyre::eyre::{ContextCompat as _, Result};
use palette::Mix as _;
use termwiz::color::ColorAttribute;

use crate::canvas::{Colour, BLACK};

/// Composite cells together, honouring alpha blending, text and pixels.
#[derive(Default)]
pub(crate) struct Compositor;

impl Compositor {
    /// Get a mutable reference to a cell.
    pub fn get_cell_mut<'cell>(
        cells: &'cell mut [&mut [termwiz::cell::Cell]],
        x: usize,
        y: usize,
    ) -> Result<&'cell mut termwiz::cell::Cell> {
        cells
            .get_mut(y)
            .context(format!("No y coord ({y}) for cell"))?
            .get_mut(x)
            .context(format!("No x coord ({x}) for cell"))
    }

    /// Composite every cell of a layer onto the frame below it.
    pub fn composite_surface(
        frame: &mut [&mut [termwiz::cell::Cell]],
        layer: &mut crate::surface::Surface,
    ) -> Result<()> {
        let opacity = layer.opacity;
        let layer_cells = layer.surface.screen_cells();
        for (y, row) in layer_cells.iter().enumerate() {
            for (x, cell_above) in row.iter().enumerate() {
                if y >= frame.len() {
                    return Ok(());
                }
                let Ok(base_cell) = Self::get_cell_mut(frame, x, y) else {
                    break;
                };
                Self::composite_cells(base_cell, cell_above, opacity);
            }
        }

        Ok(())
    }

    /// Composite 2 cells together.
    ///
    /// A glyph above replaces the glyph below, with its colours blended onto the background
    /// below. A blank cell with a background colour tints everything below it.
    pub fn composite_cells(
        base_cell: &mut termwiz::cell::Cell,
        cell_above: &termwiz::cell::Cell,
        opacity: f32,
    ) {
        let base_background = Self::colour_of(base_cell.attrs().background());
        let above_foreground = Self::colour_of(cell_above.attrs().foreground());
        let above_background = Self::colour_of(cell_above.attrs().background());

        let character_above = cell_above.str();
        let is_glyph_above = !character_above.is_empty() && character_above != " ";
        if is_glyph_above {
            let below = base_background.unwrap_or(BLACK);
            let old_background = base_cell.attrs().background();
            *base_cell = cell_above.clone();

            if let Some(foreground) = above_foreground {
                let blended = Self::blend(below, foreground, opacity);
                base_cell
                    .attrs_mut()
                    .set_foreground(crate::surface::Surface::make_colour_attribute(blended));
            }
            let background = above_background.map_or(old_background, |colour| {
                crate::surface::Surface::make_colour_attribute(Self::blend(
                    below, colour, opacity,
                ))
            });
            base_cell.attrs_mut().set_background(background);
            return;
        }

        let Some(tint) = above_background else {
            return;
        };

        let background = Self::blend(base_background.unwrap_or(BLACK), tint, opacity);
        base_cell
            .attrs_mut()
            .set_background(crate::surface::Surface::make_colour_attribute(background));

        if let Some(foreground) = Self::colour_of(base_cell.attrs().foreground()) {
            let tinted = Self::blend(foreground, tint, opacity);
            base_cell
                .attrs_mut()
                .set_foreground(crate::surface::Surface::make_colour_attribute(tinted));
        }
    }

    /// Mix a colour over another one, using the upper colour's alpha and the layer's opacity.
    pub fn blend(below: Colour, above: Colour, opacity: f32) -> Colour {
        let amount = (above.3 * opacity).clamp(0.0, 1.0);
        let below_rgb = palette::Srgb::new(below.0, below.1, below.2);
        let above_rgb = palette::Srgb::new(above.0, above.1, above.2);
        let mixed = below_rgb.mix(above_rgb, amount);
        (mixed.red, mixed.green, mixed.blue, 1.0)
    }

    /// Extract a true colour from a cell attribute. We don't know the true colour of the
    /// terminal's default or palette colours.
    const fn colour_of(attribute: ColorAttribute) -> Option<Colour> {
        match attribute {
            ColorAttribute::TrueColorWithDefaultFallback(colour)
            | ColorAttribute::TrueColorWithPaletteFallback(colour, _) => {
                Some((colour.0, colour.1, colour.2, colour.3))
            }
            ColorAttribute::PaletteIndex(_) | ColorAttribute::Default => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::canvas::WHITE;
    use crate::surface::Surface;

    fn assert_colour(actual: ColorAttribute, expected: Colour) {
        let Some(colour) = Compositor::colour_of(actual) else {
            panic!("Not a true colour: {actual:?}");
        };
        assert!((colour.0 - expected.0).abs() < 0.001, "{colour:?}");
        assert!((colour.1 - expected.1).abs() < 0.001, "{colour:?}");
        assert!((colour.2 - expected.2).abs() < 0.001, "{colour:?}");
    }

    #[test]
    fn blending() {
        let half = Compositor::blend(BLACK, WHITE, 0.5);
        assert!((half.0 - 0.5).abs() < 0.001);
        let none = Compositor::blend(BLACK, (1.0, 1.0, 1.0, 0.0), 1.0);
        assert!(none.0.abs() < 0.001);
    }

    #[test]
    fn translucent_pixel_over_default_background() {
        let mut frame = Surface::new("frame".into(), 1, 1, 0, 1.0);
        let mut rain = Surface::new("rain".into(), 1, 1, -10, 0.5);
        rain.add_pixel(0, 0, WHITE).unwrap();

        let mut cells = frame.surface.screen_cells();
        Compositor::composite_surface(&mut cells, &mut rain).unwrap();
        assert_eq!(cells[0][0].str(), "▀");
        assert_colour(cells[0][0].attrs().foreground(), (0.5, 0.5, 0.5, 1.0));
        assert_eq!(cells[0][0].attrs().background(), ColorAttribute::Default);
    }

    #[test]
    fn tint_lights_up_pixels_below() {
        let mut frame = Surface::new("frame".into(), 1, 1, 0, 1.0);
        let mut rain = Surface::new("rain".into(), 1, 1, -10, 1.0);
        rain.add_pixel(0, 0, (0.0, 0.0, 1.0, 1.0)).unwrap();
        let mut flash = Surface::new("lightning".into(), 1, 1, 50, 0.5);
        flash.fill(WHITE);

        let mut cells = frame.surface.screen_cells();
        Compositor::composite_surface(&mut cells, &mut rain).unwrap();
        Compositor::composite_surface(&mut cells, &mut flash).unwrap();
        assert_eq!(cells[0][0].str(), "▀");
        assert_colour(cells[0][0].attrs().foreground(), (0.5, 0.5, 1.0, 1.0));
        assert_colour(cells[0][0].attrs().background(), (0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn blank_cells_leave_the_frame_alone() {
        let mut frame = Surface::new("frame".into(), 2, 1, 0, 1.0);
        frame.add_text(0, 0, "ab".into(), None, None);
        let mut empty = Surface::new("stats".into(), 2, 1, 100, 1.0);

        let mut cells = frame.surface.screen_cells();
        Compositor::composite_surface(&mut cells, &mut empty).unwrap();
        assert_eq!(cells[0][0].str(), "a");
        assert_eq!(cells[0][1].str(), "b");
    }
}
