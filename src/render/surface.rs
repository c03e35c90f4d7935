use macroquad::prelude::*;

use super::TileSurface;
use crate::tileset::TileSetImage;
use crate::view::Viewport;

/// Per-slot cache that re-creates an entry when the sheet in that slot changes.
#[derive(Debug)]
pub(crate) struct SlotCache<T> {
    entries: Vec<Option<(u64, T)>>,
}

impl<T> Default for SlotCache<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> SlotCache<T> {
    pub(crate) fn get_or_insert_with(&mut self, slot: usize, sheet_id: u64, make: impl FnOnce() -> T) -> &T {
        if slot >= self.entries.len() {
            self.entries.resize_with(slot + 1, || None);
        }
        let entry = &mut self.entries[slot];
        if entry.as_ref().is_some_and(|(id, _)| *id != sheet_id) {
            *entry = None;
        }
        &entry.get_or_insert_with(|| (sheet_id, make())).1
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Draws through macroquad in screen space.
///
/// Textures are uploaded lazily, one per tileset slot, and re-uploaded when a
/// different sheet shows up in that slot, so one surface can draw several maps.
pub struct MacroquadSurface {
    textures: SlotCache<Texture2D>,
    origin: Vec2,
    scale: f32,
}

impl Default for MacroquadSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MacroquadSurface {
    /// Surface with an empty texture cache and an identity view.
    pub fn new() -> Self {
        Self {
            textures: SlotCache::default(),
            origin: Vec2::ZERO,
            scale: 1.0,
        }
    }

    /// Map world coordinates through `viewport` for the next draws.
    pub fn set_view(&mut self, viewport: &Viewport) {
        let r = viewport.visible_rect();
        self.origin = vec2(r.x, r.y);
        self.scale = viewport.zoom();
    }

    /// Draw world coordinates 1:1 on screen.
    pub fn reset_view(&mut self) {
        self.origin = Vec2::ZERO;
        self.scale = 1.0;
    }

    /// Drop cached textures, e.g. to free GPU memory after leaving a map.
    pub fn invalidate(&mut self) {
        self.textures.clear();
    }

    fn to_screen(&self, r: Rect) -> Rect {
        let p = ((vec2(r.x, r.y) - self.origin) * self.scale).floor();
        Rect::new(p.x, p.y, r.w * self.scale, r.h * self.scale)
    }

    fn texture(&mut self, slot: usize, tileset: &TileSetImage) -> &Texture2D {
        self.textures.get_or_insert_with(slot, tileset.id(), || {
            let tex = Texture2D::from_image(tileset.image());
            tex.set_filter(FilterMode::Nearest);
            tex
        })
    }
}

impl TileSurface for MacroquadSurface {
    fn blit(&mut self, slot: usize, tileset: &TileSetImage, src: Rect, dest: Rect) {
        let dest = self.to_screen(dest);
        let tex = self.texture(slot, tileset);
        draw_texture_ex(
            tex,
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                source: Some(src),
                dest_size: Some(vec2(dest.w, dest.h)),
                ..Default::default()
            },
        );
    }

    fn fill_rect(&mut self, dest: Rect, color: Color) {
        let dest = self.to_screen(dest);
        draw_rectangle(dest.x, dest.y, dest.w, dest.h, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_reuses_entry_for_same_sheet() {
        let sheet = TileSetImage::palette("a", 8, 8);
        let mut cache = SlotCache::default();
        let mut uploads = 0;
        for _ in 0..3 {
            cache.get_or_insert_with(0, sheet.id(), || {
                uploads += 1;
                uploads
            });
        }
        assert_eq!(uploads, 1);
    }

    #[test]
    fn cache_replaces_entry_when_another_map_uses_the_slot() {
        let overworld = TileSetImage::palette("terrain", 8, 8);
        let backdrop = TileSetImage::palette("terrain", 8, 8);
        let mut cache = SlotCache::default();

        assert_eq!(*cache.get_or_insert_with(0, overworld.id(), || "overworld"), "overworld");
        assert_eq!(*cache.get_or_insert_with(0, backdrop.id(), || "backdrop"), "backdrop");
        assert_eq!(*cache.get_or_insert_with(3, backdrop.id(), || "far slot"), "far slot");

        cache.clear();
        assert_eq!(*cache.get_or_insert_with(0, backdrop.id(), || "fresh"), "fresh");
    }
}
