use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use macroquad::color::{Color, BLACK, DARKGRAY, GRAY, LIGHTGRAY, ORANGE};
use macroquad::math::Rect;
use macroquad::texture::Image;

use crate::render::TileSurface;

static NEXT_SHEET_ID: AtomicU64 = AtomicU64::new(1);

fn next_sheet_id() -> u64 {
    NEXT_SHEET_ID.fetch_add(1, Ordering::Relaxed)
}

/// A strip of equally sized tiles cut from one image.
#[derive(Clone)]
pub struct TileSetImage {
    id: u64,
    name: String,
    image: Image,
    tile_w: u32,
    tile_h: u32,
    cols: u32,
    rows: u32,
    placeholder: bool,
}

impl fmt::Debug for TileSetImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileSetImage")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("image", &(self.image.width, self.image.height))
            .field("tile", &(self.tile_w, self.tile_h))
            .field("grid", &(self.cols, self.rows))
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

impl TileSetImage {
    /// Slice `image` into `tile_w x tile_h` cells. Returns `None` for zero tile dimensions.
    pub fn new(name: impl Into<String>, image: Image, tile_w: u32, tile_h: u32) -> Option<Self> {
        if tile_w == 0 || tile_h == 0 {
            return None;
        }
        let cols = image.width as u32 / tile_w;
        let rows = image.height as u32 / tile_h;
        Some(Self {
            id: next_sheet_id(),
            name: name.into(),
            image,
            tile_w,
            tile_h,
            cols,
            rows,
            placeholder: false,
        })
    }

    /// Checkerboard sheet of `cols x rows` cells, used when the real image is missing.
    ///
    /// The generated image is capped at 4096 pixels per side; cells past the cap do not exist.
    pub fn checkerboard(name: impl Into<String>, tile_w: u32, tile_h: u32, cols: u32, rows: u32) -> Self {
        let tile_w = tile_w.max(1);
        let tile_h = tile_h.max(1);
        let image = checkerboard_image(tile_w, tile_h, cols.max(1), rows.max(1));
        Self::from_generated(name.into(), image, tile_w, tile_h)
    }

    /// The 2x2 sheet (light grey, grey, dark grey, orange) used for image-less tilesets.
    pub fn palette(name: impl Into<String>, tile_w: u32, tile_h: u32) -> Self {
        let tile_w = tile_w.max(1);
        let tile_h = tile_h.max(1);
        let image = palette_image(tile_w, tile_h);
        Self::from_generated(name.into(), image, tile_w, tile_h)
    }

    fn from_generated(name: String, image: Image, tile_w: u32, tile_h: u32) -> Self {
        let cols = image.width as u32 / tile_w;
        let rows = image.height as u32 / tile_h;
        Self {
            id: next_sheet_id(),
            name,
            image,
            tile_w,
            tile_h,
            cols,
            rows,
            placeholder: true,
        }
    }

    /// Identity of the pixel data. Clones share it; every constructed sheet gets a new one.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Tileset name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// CPU-side pixels.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Tile size in pixels.
    pub fn tile_size(&self) -> (u32, u32) {
        (self.tile_w, self.tile_h)
    }

    /// Tiles per row.
    pub fn columns(&self) -> u32 {
        self.cols
    }

    /// Tile rows.
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of addressable tiles.
    pub fn tile_count(&self) -> u32 {
        self.cols * self.rows
    }

    /// True when the pixels were generated instead of loaded.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    /// Source rectangle of `local` inside the image, or `None` if it is out of range.
    pub fn source_rect(&self, local: u32) -> Option<Rect> {
        if self.cols == 0 {
            return None;
        }
        let col = local % self.cols;
        let row = local / self.cols;
        if row >= self.rows {
            return None;
        }
        Some(Rect::new(
            (col * self.tile_w) as f32,
            (row * self.tile_h) as f32,
            self.tile_w as f32,
            self.tile_h as f32,
        ))
    }

    /// Blit tile `local` scaled into `dest`. Out-of-range indices draw nothing and return `false`.
    pub fn draw_tile<S: TileSurface + ?Sized>(
        &self,
        surface: &mut S,
        slot: usize,
        local: u32,
        dest: Rect,
    ) -> bool {
        match self.source_rect(local) {
            Some(src) => {
                surface.blit(slot, self, src, dest);
                true
            }
            None => false,
        }
    }
}

// Generated sheets never exceed this many pixels per side.
const MAX_SHEET_DIM: u32 = 4096;

fn dim(v: u32) -> u16 {
    v.clamp(1, MAX_SHEET_DIM) as u16
}

fn outline(image: &mut Image, x0: u32, y0: u32, w: u32, h: u32, color: Color) {
    let (iw, ih) = (image.width as u32, image.height as u32);
    if x0 >= iw || y0 >= ih || w == 0 || h == 0 {
        return;
    }
    let (x1, y1) = (x0.saturating_add(w - 1), y0.saturating_add(h - 1));
    for x in x0..=x1.min(iw - 1) {
        image.set_pixel(x, y0, color);
        if y1 < ih {
            image.set_pixel(x, y1, color);
        }
    }
    for y in y0..=y1.min(ih - 1) {
        image.set_pixel(x0, y, color);
        if x1 < iw {
            image.set_pixel(x1, y, color);
        }
    }
}

fn fill(image: &mut Image, x0: u32, y0: u32, w: u32, h: u32, color: Color) {
    let (iw, ih) = (image.width as u32, image.height as u32);
    for y in y0..y0.saturating_add(h).min(ih) {
        for x in x0..x0.saturating_add(w).min(iw) {
            image.set_pixel(x, y, color);
        }
    }
}

pub(crate) fn checkerboard_image(tile_w: u32, tile_h: u32, cols: u32, rows: u32) -> Image {
    let mut image = Image::gen_image_color(
        dim(tile_w.saturating_mul(cols)),
        dim(tile_h.saturating_mul(rows)),
        LIGHTGRAY,
    );
    // Only cells starting inside the (possibly capped) image are painted
    let cols = cols.min((image.width as u32).div_ceil(tile_w.max(1)));
    let rows = rows.min((image.height as u32).div_ceil(tile_h.max(1)));
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = (col * tile_w, row * tile_h);
            if (col + row) % 2 == 1 {
                fill(&mut image, x, y, tile_w, tile_h, GRAY);
            }
            outline(&mut image, x, y, tile_w, tile_h, DARKGRAY);
        }
    }
    image
}

pub(crate) fn palette_image(tile_w: u32, tile_h: u32) -> Image {
    let mut image = Image::gen_image_color(dim(tile_w.saturating_mul(2)), dim(tile_h.saturating_mul(2)), LIGHTGRAY);
    for (i, color) in [LIGHTGRAY, GRAY, DARKGRAY, ORANGE].into_iter().enumerate() {
        let (x, y) = ((i as u32 % 2) * tile_w, (i as u32 / 2) * tile_h);
        fill(&mut image, x, y, tile_w, tile_h, color);
        outline(&mut image, x, y, tile_w, tile_h, BLACK);
    }
    image
}

/// A tileset bound to the first GID it owns.
#[derive(Debug, Clone)]
pub struct TileSetRegistration {
    /// First GID owned.
    pub first_gid: u32,
    /// The sheet itself.
    pub tileset: TileSetImage,
}

/// Tilesets of one map, ordered ascending by `first_gid`.
#[derive(Debug, Clone, Default)]
pub struct TileSetRegistry {
    entries: Vec<TileSetRegistration>,
}

impl TileSetRegistry {
    /// Registry with no tilesets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tileset, keeping the list sorted. Equal `first_gid`s keep insertion order.
    pub fn register(&mut self, first_gid: u32, tileset: TileSetImage) -> usize {
        let pos = self.entries.partition_point(|e| e.first_gid <= first_gid);
        self.entries.insert(pos, TileSetRegistration { first_gid, tileset });
        pos
    }

    /// Find the tileset owning `gid`: the last registration with `first_gid <= gid`.
    ///
    /// Returns the registration slot, the tileset and the local tile index.
    #[inline]
    pub fn resolve(&self, gid: u32) -> Option<(usize, &TileSetImage, u32)> {
        if gid == 0 {
            return None;
        }
        self.entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, e)| e.first_gid <= gid)
            .map(|(slot, e)| (slot, &e.tileset, gid - e.first_gid))
    }

    /// Registration at `slot`.
    pub fn get(&self, slot: usize) -> Option<&TileSetRegistration> {
        self.entries.get(slot)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no tileset is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registrations in ascending `first_gid` order.
    pub fn iter(&self) -> impl Iterator<Item = &TileSetRegistration> {
        self.entries.iter()
    }
}
