//! Overlay drawing.
//!
//! Every function returns a guard that draws when dropped, so callers can customize the shape with
//! builder methods first: `draw::line(&mut img, a, b).color(Color::GREEN);`

use std::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    mono_font::{ascii, MonoTextStyle},
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use super::{Color, Image};

/// Guard returned by [`line`][line()]; draws the line when dropped and allows customization.
pub struct DrawLine<'a> {
    image: &'a mut Image,
    start: (i32, i32),
    end: (i32, i32),
    color: Color,
    stroke_width: u32,
}

impl DrawLine<'_> {
    /// Sets the line's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the line's stroke width.
    ///
    /// By default, a stroke width of 1 is used.
    pub fn stroke_width(&mut self, width: u32) -> &mut Self {
        self.stroke_width = width;
        self
    }
}

impl Drop for DrawLine<'_> {
    fn drop(&mut self) {
        let result = Line::new(
            Point::new(self.start.0, self.start.1),
            Point::new(self.end.0, self.end.1),
        )
        .into_styled(PrimitiveStyle::with_stroke(self.color, self.stroke_width))
        .draw(&mut Target(&mut *self.image));
        match result {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`dot`]; draws a filled circle when dropped.
pub struct DrawDot<'a> {
    image: &'a mut Image,
    x: i32,
    y: i32,
    diameter: u32,
    color: Color,
}

impl DrawDot<'_> {
    /// Sets the dot's color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Sets the dot's diameter in pixels.
    ///
    /// The default is 5.
    pub fn diameter(&mut self, diameter: u32) -> &mut Self {
        self.diameter = diameter;
        self
    }
}

impl Drop for DrawDot<'_> {
    fn drop(&mut self) {
        let top_left = Point::new(
            self.x - (self.diameter / 2) as i32,
            self.y - (self.diameter / 2) as i32,
        );
        let style = PrimitiveStyleBuilder::new().fill_color(self.color).build();
        let result = Circle::new(top_left, self.diameter)
            .into_styled(style)
            .draw(&mut Target(&mut *self.image));
        match result {
            Ok(()) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Guard returned by [`text`]; draws the text when dropped and allows customization.
pub struct DrawText<'a> {
    image: &'a mut Image,
    x: i32,
    y: i32,
    text: &'a str,
    color: Color,
    large: bool,
    alignment: Alignment,
    baseline: Baseline,
}

impl DrawText<'_> {
    /// Sets the text color.
    pub fn color(&mut self, color: Color) -> &mut Self {
        self.color = color;
        self
    }

    /// Uses a larger font (10x20 instead of 6x10).
    pub fn large(&mut self) -> &mut Self {
        self.large = true;
        self
    }

    /// Aligns the top of the text with the `y` coordinate.
    pub fn align_top(&mut self) -> &mut Self {
        self.baseline = Baseline::Top;
        self
    }

    /// Aligns the left side of the text with the `x` coordinate.
    pub fn align_left(&mut self) -> &mut Self {
        self.alignment = Alignment::Left;
        self
    }
}

impl Drop for DrawText<'_> {
    fn drop(&mut self) {
        let font = if self.large {
            &ascii::FONT_10X20
        } else {
            &ascii::FONT_6X10
        };
        let character_style = MonoTextStyle::new(font, self.color);
        let text_style = TextStyleBuilder::new()
            .alignment(self.alignment)
            .baseline(self.baseline)
            .build();
        let result = Text::with_text_style(
            self.text,
            Point::new(self.x, self.y),
            character_style,
            text_style,
        )
        .draw(&mut Target(&mut *self.image));
        match result {
            Ok(_) => {}
            Err(infallible) => match infallible {},
        }
    }
}

/// Draws a line onto an image.
pub fn line(image: &mut Image, start: (i32, i32), end: (i32, i32)) -> DrawLine<'_> {
    DrawLine {
        image,
        start,
        end,
        color: Color::from_rgb8(0, 0, 255),
        stroke_width: 1,
    }
}

/// Draws a filled dot centered on `(x, y)`.
///
/// This is used to visualize landmarks.
pub fn dot(image: &mut Image, x: i32, y: i32) -> DrawDot<'_> {
    DrawDot {
        image,
        x,
        y,
        diameter: 5,
        color: Color::RED,
    }
}

/// Draws a text string onto an image.
///
/// By default, the text is drawn centered horizontally and vertically around `x` and `y`.
pub fn text<'a>(image: &'a mut Image, x: i32, y: i32, text: &'a str) -> DrawText<'a> {
    DrawText {
        image,
        x,
        y,
        text,
        color: Color::from_rgb8(255, 0, 0),
        large: false,
        alignment: Alignment::Center,
        baseline: Baseline::Middle,
    }
}

struct Target<'a>(&'a mut Image);

impl Dimensions for Target<'_> {
    fn bounding_box(&self) -> Rectangle {
        Rectangle {
            top_left: Point { x: 0, y: 0 },
            size: Size {
                width: self.0.width(),
                height: self.0.height(),
            },
        }
    }
}

impl DrawTarget for Target<'_> {
    type Color = Color;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let res = self.0.resolution();
        for Pixel(point, color) in pixels {
            if res.contains(point.x, point.y) {
                self.0.set(point.x as u32, point.y as u32, color);
            }
        }

        Ok(())
    }
}
