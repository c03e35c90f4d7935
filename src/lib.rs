#![warn(missing_docs)]

//! Tile-map world for Macroquad: TMX loading, collision and zone queries,
//! a smoothed camera and culled drawing.
//!
//! ```no_run
//! use macroquad_tile_world::{EngineConfig, Map, Viewport};
//!
//! let cfg = EngineConfig::default();
//! let map = Map::load_or_placeholder("assets/world.tmx", &cfg.loader);
//! let mut camera = Viewport::from_config(&cfg.viewport, &map);
//! camera.follow(macroquad::math::vec2(64.0, 64.0));
//! let blocked = map.is_solid_at_pixel(64.0, 64.0);
//! # let _ = blocked;
//! ```

mod config;
mod error;
mod gid;
mod ir_map;
mod layer;
mod loader {
    pub mod cells;
    pub mod tmx_loader;
}
mod map;
/// Drawing: surfaces, culling and overlays.
pub mod render;
mod tileset;
mod view;

pub use config::{DebugConfig, EngineConfig, LoaderConfig, PlaceholderConfig, ViewportConfig};
pub use error::MapError;
pub use gid::{TileId, FLIP_D, FLIP_H, FLIP_V, GID_MASK, ROTATED_HEX};
pub use ir_map::{IrImage, IrLayer, IrMap, IrTileset, Properties, PropertyValue};
pub use layer::{classify_zone, Layer, LayerRole, LayerStore, NO_ZONE};
pub use loader::cells::{decode_csv_cells, DecodedCells};
pub use loader::tmx_loader::{decode_map_file_to_ir, decode_map_str_to_ir, MAX_LAYER_CELLS};
pub use map::{generate_placeholder, Map, PLACEHOLDER_CHECKER_GID, PLACEHOLDER_PALETTE_GID};
pub use render::{
    CommandBuffer, DrawCommand, DrawStats, FillCommand, MacroquadSurface, TileRegion, TileSurface,
    WorldRenderer,
};
pub use tileset::{TileSetImage, TileSetRegistration, TileSetRegistry};
pub use view::Viewport;
