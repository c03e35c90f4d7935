use macroquad::color::Color;
use macroquad::math::Rect;

use super::TileSurface;
use crate::tileset::{TileSetImage, TileSetRegistry};

/// One recorded tile blit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Registry slot of the tileset.
    pub tileset_index: usize,
    /// Source rectangle in the tileset image.
    pub src: Rect,
    /// Destination in world space.
    pub dest: Rect,
}

/// One recorded solid fill (overlays).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillCommand {
    /// Destination in world space.
    pub dest: Rect,
    /// Fill colour.
    pub color: Color,
}

/// Surface that records instead of drawing.
///
/// A fixed scene can be recorded once and replayed every frame.
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    /// Recorded blits, in draw order.
    pub commands: Vec<DrawCommand>,
    /// Recorded fills, in draw order.
    pub fills: Vec<FillCommand>,
}

impl CommandBuffer {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything recorded.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.fills.clear();
    }

    /// Nothing recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.fills.is_empty()
    }

    /// Send every recorded command to `surface`. Commands whose tileset is gone are dropped.
    pub fn replay<S: TileSurface + ?Sized>(&self, tilesets: &TileSetRegistry, surface: &mut S) {
        for cmd in &self.commands {
            if let Some(reg) = tilesets.get(cmd.tileset_index) {
                surface.blit(cmd.tileset_index, &reg.tileset, cmd.src, cmd.dest);
            }
        }
        for fill in &self.fills {
            surface.fill_rect(fill.dest, fill.color);
        }
    }
}

impl TileSurface for CommandBuffer {
    fn blit(&mut self, slot: usize, _tileset: &TileSetImage, src: Rect, dest: Rect) {
        self.commands.push(DrawCommand {
            tileset_index: slot,
            src,
            dest,
        });
    }

    fn fill_rect(&mut self, dest: Rect, color: Color) {
        self.fills.push(FillCommand { dest, color });
    }
}

/// Half-open rectangle of tile indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileRegion {
    /// First column.
    pub start_x: u32,
    /// First row.
    pub start_y: u32,
    /// Columns covered.
    pub width: u32,
    /// Rows covered.
    pub height: u32,
}

impl TileRegion {
    /// One past the last column.
    pub fn end_x(&self) -> u32 {
        self.start_x + self.width
    }

    /// One past the last row.
    pub fn end_y(&self) -> u32 {
        self.start_y + self.height
    }

    /// Covers no cells.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Cell lies inside the region.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.start_x..self.end_x()).contains(&x) && (self.start_y..self.end_y()).contains(&y)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        let (x0, x1) = (self.start_x, self.end_x());
        (self.start_y..self.end_y()).flat_map(move |y| (x0..x1).map(move |x| (x, y)))
    }
}
