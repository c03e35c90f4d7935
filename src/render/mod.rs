//! Culled drawing of the visible part of a map.

mod command;
mod cull;
pub mod overlay;
mod surface;

pub use command::{CommandBuffer, DrawCommand, FillCommand, TileRegion};
pub use cull::visible_tile_region;
pub use surface::MacroquadSurface;

use macroquad::color::Color;
use macroquad::math::Rect;

use crate::layer::LayerRole;
use crate::map::Map;
use crate::tileset::TileSetImage;
use crate::view::Viewport;

/// Where tile blits go.
pub trait TileSurface {
    /// Draw `src` of `tileset` (registered at `slot`) scaled into world-space `dest`.
    fn blit(&mut self, slot: usize, tileset: &TileSetImage, src: Rect, dest: Rect);

    /// Fill a world-space rectangle. Surfaces that only draw tiles may ignore this.
    fn fill_rect(&mut self, _dest: Rect, _color: Color) {}
}

/// Outcome of one draw pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Tiles handed to the surface.
    pub drawn: usize,
    /// Non-empty cells whose GID had no tileset or an out-of-range index.
    pub skipped: usize,
}

/// Draws ground then decoration layers, visiting only cells near the viewport.
#[derive(Debug, Clone)]
pub struct WorldRenderer {
    roles: Vec<LayerRole>,
}

impl Default for WorldRenderer {
    fn default() -> Self {
        Self {
            roles: LayerRole::DRAWN.to_vec(),
        }
    }
}

impl WorldRenderer {
    /// Renderer for ground and decoration layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict drawing to `roles`. Non-drawable roles are dropped; order is always ground first.
    pub fn with_roles(roles: &[LayerRole]) -> Self {
        let mut roles: Vec<_> = roles.iter().copied().filter(|r| r.is_drawn()).collect();
        roles.sort_unstable();
        roles.dedup();
        Self { roles }
    }

    /// Roles drawn, in order.
    pub fn roles(&self) -> &[LayerRole] {
        &self.roles
    }

    /// Draw the cells of `map` near `viewport` onto `surface`.
    pub fn draw<S: TileSurface + ?Sized>(
        &self,
        map: &Map,
        viewport: Option<&Viewport>,
        surface: &mut S,
    ) -> DrawStats {
        let mut stats = DrawStats::default();
        let region = map.visible_region(viewport);
        if region.is_empty() {
            return stats;
        }

        let (tw, th) = map.tile_size();
        let (tw, th) = (tw as f32, th as f32);
        let tilesets = map.tilesets();

        for &role in &self.roles {
            for layer in map.layers().with_role(role).filter(|l| l.visible) {
                for y in region.start_y..region.end_y() {
                    let row = layer.row(y);
                    let span = &row[region.start_x as usize..region.end_x() as usize];
                    for (dx, &gid) in span.iter().enumerate() {
                        if gid == 0 {
                            continue;
                        }
                        let x = region.start_x + dx as u32;
                        let dest = Rect::new(x as f32 * tw, y as f32 * th, tw, th);
                        let drawn = tilesets
                            .resolve(gid)
                            .is_some_and(|(slot, ts, local)| ts.draw_tile(surface, slot, local, dest));
                        if drawn {
                            stats.drawn += 1;
                        } else {
                            stats.skipped += 1;
                        }
                    }
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use crate::tileset::{TileSetImage, TileSetRegistry};
    use macroquad::math::vec2;
    use std::collections::BTreeSet;

    fn filled_map(cols: u32, rows: u32, gid: u32) -> Map {
        let mut tilesets = TileSetRegistry::new();
        tilesets.register(1, TileSetImage::checkerboard("sheet", 16, 16, 2, 2));
        let mut map = Map::new(16, 16, cols, rows, tilesets);
        let cells = vec![gid; (cols * rows) as usize];
        map.push_layer(Layer::new("ground", LayerRole::Ground, cols, rows, cells));
        map
    }

    fn tile_of(cmd: &DrawCommand) -> (u32, u32) {
        ((cmd.dest.x / 16.0) as u32, (cmd.dest.y / 16.0) as u32)
    }

    #[test]
    fn visits_exactly_the_padded_view() {
        let map = filled_map(100, 100, 1);
        let mut vp = Viewport::new(vec2(160.0, 160.0), map.pixel_size());
        vp.follow(vec2(240.0, 240.0));

        let mut buf = CommandBuffer::new();
        let stats = WorldRenderer::new().draw(&map, Some(&vp), &mut buf);

        let visited: BTreeSet<_> = buf.commands.iter().map(tile_of).collect();
        let expected: BTreeSet<_> = (9..21).flat_map(|y| (9..21).map(move |x| (x, y))).collect();
        assert_eq!(visited, expected);
        assert_eq!(stats.drawn, 144);
        assert_eq!(buf.commands.len(), 144);
    }

    #[test]
    fn no_viewport_draws_whole_map() {
        let map = filled_map(5, 4, 2);
        let mut buf = CommandBuffer::new();
        let stats = WorldRenderer::new().draw(&map, None, &mut buf);
        assert_eq!(stats.drawn, 20);
    }

    #[test]
    fn empty_cells_issue_no_draws() {
        let mut map = filled_map(4, 4, 0);
        let mut deco = Layer::new("deco", LayerRole::Decoration, 4, 4, Vec::new());
        deco.set(1, 2, 3);
        map.push_layer(deco);

        let mut buf = CommandBuffer::new();
        let stats = WorldRenderer::new().draw(&map, None, &mut buf);
        assert_eq!(stats, DrawStats { drawn: 1, skipped: 0 });
        assert_eq!(tile_of(&buf.commands[0]), (1, 2));
        // local index 2 -> column 0, row 1 of a 2x2 sheet
        assert_eq!(buf.commands[0].src, Rect::new(0.0, 16.0, 16.0, 16.0));
    }

    #[test]
    fn ground_draws_before_decoration() {
        let mut map = filled_map(2, 1, 0);
        map.push_layer(Layer::new("deco", LayerRole::Decoration, 2, 1, vec![4, 0]));
        map.push_layer(Layer::new("floor", LayerRole::Ground, 2, 1, vec![1, 1]));

        let mut buf = CommandBuffer::new();
        WorldRenderer::new().draw(&map, None, &mut buf);
        let srcs: Vec<_> = buf.commands.iter().map(|c| c.src.x + c.src.y).collect();
        // floor (local 0) twice, then deco (local 3)
        assert_eq!(srcs, [0.0, 0.0, 32.0]);
    }

    #[test]
    fn collision_zone_and_hidden_layers_are_not_drawn() {
        let mut map = filled_map(3, 3, 0);
        map.push_layer(Layer::new("walls", LayerRole::Collision, 3, 3, vec![1; 9]));
        map.push_layer(Layer::new("zones", LayerRole::Zone, 3, 3, vec![1; 9]));
        map.push_layer(Layer::new("hidden", LayerRole::Decoration, 3, 3, vec![1; 9]));
        assert!(map.set_layer_visible("hidden", false));

        let mut buf = CommandBuffer::new();
        let stats = WorldRenderer::new().draw(&map, None, &mut buf);
        assert_eq!(stats.drawn, 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn unresolvable_gids_are_skipped() {
        let mut map = filled_map(2, 1, 0);
        // gid 5 -> local 4 of a 4-tile sheet
        map.push_layer(Layer::new("bad", LayerRole::Ground, 2, 1, vec![5, 1]));
        let mut buf = CommandBuffer::new();
        let stats = WorldRenderer::new().draw(&map, None, &mut buf);
        assert_eq!(stats, DrawStats { drawn: 1, skipped: 1 });
    }

    #[test]
    fn role_filter_keeps_draw_order() {
        let r = WorldRenderer::with_roles(&[LayerRole::Decoration, LayerRole::Zone, LayerRole::Ground]);
        assert_eq!(r.roles(), &[LayerRole::Ground, LayerRole::Decoration]);
    }

    #[test]
    fn recorded_frame_replays() {
        let map = filled_map(3, 3, 1);
        let mut buf = CommandBuffer::new();
        WorldRenderer::new().draw(&map, None, &mut buf);

        let mut copy = CommandBuffer::new();
        buf.replay(map.tilesets(), &mut copy);
        assert_eq!(copy.commands, buf.commands);
    }
}
