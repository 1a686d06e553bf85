//! The drawing primitives that effects render with.

use glam::Vec2;

/// An RGBA colour, each channel from 0.0 to 1.0
pub type Colour = (f32, f32, f32, f32);

/// A default pure white.
pub const WHITE: Colour = (1.0, 1.0, 1.0, 1.0);

/// A default pure black. Also what we assume the terminal's default background to be.
pub const BLACK: Colour = (0.0, 0.0, 0.0, 1.0);

/// A 2D drawing surface measured in pixels.
///
/// Simulations only ever talk to this trait, so they can be driven by a terminal surface in the
/// app and by a recording canvas in tests.
pub trait Canvas {
    /// Wipe everything that has been drawn.
    fn clear(&mut self);

    /// Draw a straight line between 2 points. Any part of the line outside the canvas is
    /// silently clipped.
    fn stroke_line(&mut self, from: Vec2, to: Vec2, colour: Colour);
}
