//! Drawing surfaces
//!
//! Particles and cursors are drawn through the minimal [`DrawSurface`]
//! trait so the trail logic never depends on a concrete canvas. Two
//! implementations ship with the crate:
//!
//! - [`RecordingSurface`] keeps a log of draw calls (tests, instrumentation)
//! - [`PixelSurface`] rasterises into an RGBA buffer that can be saved as PNG

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};

use super::color::Color;
use crate::geometry::Position;

/// 2D drawing target
pub trait DrawSurface {
    /// Set the color used by subsequent fills
    fn set_fill_color(&mut self, color: Color);

    /// Set the opacity applied to subsequent fills (0.0-1.0)
    fn set_global_alpha(&mut self, alpha: f32);

    /// Fill a circle of `radius` pixels centred on `center`
    fn fill_circle(&mut self, center: Position, radius: f32);

    /// Restore full opacity
    fn reset_alpha(&mut self) {
        self.set_global_alpha(1.0);
    }
}

/// A recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// `set_fill_color`
    FillColor(Color),
    /// `set_global_alpha`
    GlobalAlpha(f32),
    /// `fill_circle`
    Circle {
        /// Circle center
        center: Position,
        /// Radius in pixels
        radius: f32,
        /// Opacity in effect when drawn
        alpha: f32,
        /// Fill color in effect when drawn
        color: Color,
    },
    /// `reset_alpha`
    ResetAlpha,
}

/// Surface that records every call instead of drawing
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    commands: Vec<DrawCommand>,
    color: Color,
    alpha: f32,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Create an empty recording
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            color: Color::default(),
            alpha: 1.0,
        }
    }

    /// All recorded calls, in order
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Only the circles that were drawn
    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    /// Number of circles drawn
    pub fn circle_count(&self) -> usize {
        self.circles().count()
    }

    /// Opacity currently in effect
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Forget everything recorded so far
    pub fn clear(&mut self) {
        self.commands.clear();
        self.color = Color::default();
        self.alpha = 1.0;
    }
}

impl DrawSurface for RecordingSurface {
    fn set_fill_color(&mut self, color: Color) {
        self.color = color;
        self.commands.push(DrawCommand::FillColor(color));
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
        self.commands.push(DrawCommand::GlobalAlpha(alpha));
    }

    fn fill_circle(&mut self, center: Position, radius: f32) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            alpha: self.alpha,
            color: self.color,
        });
    }

    fn reset_alpha(&mut self) {
        self.alpha = 1.0;
        self.commands.push(DrawCommand::ResetAlpha);
    }
}

/// Software RGBA raster
pub struct PixelSurface {
    width: u32,
    height: u32,
    /// RGBA8, row-major
    data: Vec<u8>,
    color: Color,
    alpha: f32,
    background: Color,
}

impl PixelSurface {
    /// Create a raster filled with `background`
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        debug!("Creating pixel surface: {}x{}", width, height);

        let mut surface = Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
            color: Color::default(),
            alpha: 1.0,
            background,
        };
        surface.clear();
        surface
    }

    /// Refill with the background color
    pub fn clear(&mut self) {
        let bg = [self.background.r, self.background.g, self.background.b, 255];
        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&bg);
        }
    }

    /// Dimensions in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA value at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.data[offset..offset + 4]);
        Some(out)
    }

    /// Convert into an `image` buffer
    pub fn to_image(&self) -> Result<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .context("Pixel buffer does not match surface dimensions")
    }

    /// Write the raster to a PNG file
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("Failed to write PNG snapshot: {}", path.display()))?;
        info!("Snapshot written to {}", path.display());
        Ok(())
    }

    fn blend(&mut self, x: u32, y: u32, coverage: f32) {
        let a = (self.alpha * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let src = [self.color.r, self.color.g, self.color.b];
        for (channel, &s) in self.data[offset..offset + 3].iter_mut().zip(src.iter()) {
            let d = *channel as f32;
            *channel = (s as f32 * a + d * (1.0 - a)).round() as u8;
        }
        self.data[offset + 3] = 255;
    }
}

impl DrawSurface for PixelSurface {
    fn set_fill_color(&mut self, color: Color) {
        self.color = color;
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.0
        };
    }

    fn fill_circle(&mut self, center: Position, radius: f32) {
        if !center.is_finite() || !(radius > 0.0) || self.width == 0 || self.height == 0 {
            return;
        }

        let min_x = (center.x - radius).floor().max(0.0) as u32;
        let min_y = (center.y - radius).floor().max(0.0) as u32;
        let max_x = (center.x + radius).ceil().min(self.width as f32 - 1.0);
        let max_y = (center.y + radius).ceil().min(self.height as f32 - 1.0);
        if max_x < 0.0 || max_y < 0.0 {
            return;
        }
        let (max_x, max_y) = (max_x as u32, max_y as u32);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let dist = (dx * dx + dy * dy).sqrt();
                // One pixel of edge falloff
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_surface_tracks_state() {
        let mut surface = RecordingSurface::new();
        surface.set_fill_color(Color::rgb(1, 2, 3));
        surface.set_global_alpha(0.25);
        surface.fill_circle(Position::new(5.0, 5.0), 2.0);
        surface.reset_alpha();

        assert_eq!(surface.circle_count(), 1);
        assert_eq!(surface.alpha(), 1.0);
        assert_eq!(
            surface.commands()[2],
            DrawCommand::Circle {
                center: Position::new(5.0, 5.0),
                radius: 2.0,
                alpha: 0.25,
                color: Color::rgb(1, 2, 3),
            }
        );
    }

    #[test]
    fn test_pixel_surface_fills_circle() {
        let mut surface = PixelSurface::new(20, 20, Color::BLACK);
        surface.set_fill_color(Color::rgb(255, 0, 0));
        surface.fill_circle(Position::new(10.0, 10.0), 4.0);

        assert_eq!(surface.pixel(10, 10), Some([255, 0, 0, 255]));
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(surface.pixel(20, 0), None);
    }

    #[test]
    fn test_pixel_surface_blends_alpha() {
        let mut surface = PixelSurface::new(8, 8, Color::BLACK);
        surface.set_fill_color(Color::WHITE);
        surface.set_global_alpha(0.5);
        surface.fill_circle(Position::new(4.0, 4.0), 3.0);

        let [r, g, b, a] = surface.pixel(4, 4).unwrap();
        assert!((127..=128).contains(&r));
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_pixel_surface_clips_offscreen_circles() {
        let mut surface = PixelSurface::new(4, 4, Color::BLACK);
        surface.set_fill_color(Color::WHITE);
        surface.fill_circle(Position::new(-50.0, -50.0), 3.0);
        surface.fill_circle(Position::new(500.0, 2.0), 3.0);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        let mut surface = PixelSurface::new(16, 16, Color::BLACK);
        surface.fill_circle(Position::new(8.0, 8.0), 4.0);
        surface.save_png(&path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.dimensions(), (16, 16));
        assert_eq!(loaded.get_pixel(8, 8).0, [255, 255, 255, 255]);
    }
}
