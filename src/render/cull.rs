use macroquad::math::Rect;

use super::TileRegion;

const CULL_MARGIN_TILES: f32 = 1.0;

/// Tiles touched by `view`, padded by one tile on every side and clamped to the map.
///
/// `None` means a fixed, non-scrolling scene: the whole map is visible.
pub fn visible_tile_region(
    cols: u32,
    rows: u32,
    tile_w: u32,
    tile_h: u32,
    view: Option<Rect>,
) -> TileRegion {
    let full = TileRegion {
        start_x: 0,
        start_y: 0,
        width: cols,
        height: rows,
    };
    let Some(view) = view else {
        return full;
    };
    if tile_w == 0 || tile_h == 0 {
        return TileRegion::default();
    }

    let (tw, th) = (tile_w as f32, tile_h as f32);
    let (pw, ph) = (cols as f32 * tw, rows as f32 * th);

    //pad by one tile
    let min_x = (view.x - CULL_MARGIN_TILES * tw).max(0.0);
    let min_y = (view.y - CULL_MARGIN_TILES * th).max(0.0);
    let max_x = (view.x + view.w + CULL_MARGIN_TILES * tw).min(pw);
    let max_y = (view.y + view.h + CULL_MARGIN_TILES * th).min(ph);

    if !(max_x > min_x && max_y > min_y) {
        return TileRegion::default();
    }

    let start_x = ((min_x / tw).floor() as u32).min(cols);
    let start_y = ((min_y / th).floor() as u32).min(rows);
    let end_x = ((max_x / tw).ceil() as u32).min(cols);
    let end_y = ((max_y / th).ceil() as u32).min(rows);

    TileRegion {
        start_x,
        start_y,
        width: end_x.saturating_sub(start_x),
        height: end_y.saturating_sub(start_y),
    }
}
