//! Debug tints for collision and zone layers.

use macroquad::color::Color;
use macroquad::math::Rect;

use super::TileSurface;
use crate::layer::NO_ZONE;
use crate::map::Map;
use crate::view::Viewport;

/// Solid cell tint: red at 50% alpha.
pub const COLLISION_TINT: Color = Color::new(1.0, 0.0, 0.0, 0.5);

/// Overlay colour for a zone id, `None` for [`NO_ZONE`] and unknown zones.
pub fn zone_tint(zone: u32) -> Option<Color> {
    let rgb = match zone {
        NO_ZONE => return None,
        1 => (0, 255, 16),
        2 => (0, 104, 10),
        3 => (255, 144, 0),
        4 => (0, 217, 255),
        _ => return None,
    };
    Some(Color::from_rgba(rgb.0, rgb.1, rgb.2, 128))
}

/// Tint every solid cell in view. Returns the number of cells tinted.
pub fn draw_collision_overlay<S: TileSurface + ?Sized>(
    map: &Map,
    viewport: Option<&Viewport>,
    surface: &mut S,
) -> usize {
    tint_cells(map, viewport, surface, |x, y| {
        map.is_solid(x, y).then_some(COLLISION_TINT)
    })
}

/// Tint every classified zone cell in view. Returns the number of cells tinted.
pub fn draw_zone_overlay<S: TileSurface + ?Sized>(
    map: &Map,
    viewport: Option<&Viewport>,
    surface: &mut S,
) -> usize {
    tint_cells(map, viewport, surface, |x, y| zone_tint(map.zone_at(x, y)))
}

fn tint_cells<S, F>(map: &Map, viewport: Option<&Viewport>, surface: &mut S, tint: F) -> usize
where
    S: TileSurface + ?Sized,
    F: Fn(i32, i32) -> Option<Color>,
{
    let (tw, th) = map.tile_size();
    let mut count = 0;
    for (x, y) in map.visible_region(viewport).cells() {
        if let Some(color) = tint(x as i32, y as i32) {
            let dest = Rect::new(x as f32 * tw as f32, y as f32 * th as f32, tw as f32, th as f32);
            surface.fill_rect(dest, color);
            count += 1;
        }
    }
    count
}
